mod common;

use cc_core::backup::{BackupError, BackupManager};
use cc_core::courses::{CourseSource, InMemoryCourses};
use common::*;
use std::sync::Arc;

#[tokio::test]
async fn test_each_backup_call_records_exactly_one_backup() {
    let store = test_store();
    let courses = Arc::new(InMemoryCourses::new(vec![old_course(2), old_course(3)]));
    let manager = BackupManager::new(store, courses.clone());

    assert!(manager.list_backups(None).unwrap().is_empty());

    let record = manager
        .create_course_backup(&old_course(2))
        .await
        .expect("Backup failed");
    let listed = manager.list_backups(None).unwrap();
    assert_eq!(listed, vec![record.clone()]);
    assert_eq!(record.course_id, 2);
    assert_eq!(record.shortname, "C2");

    manager.create_course_backup(&old_course(2)).await.unwrap();
    assert_eq!(manager.list_backups(Some(2)).unwrap().len(), 2);
    assert!(manager.list_backups(Some(3)).unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_creates_new_course() {
    let dir = tempfile::tempdir().unwrap();
    let store = test_store();
    let courses = Arc::new(
        InMemoryCourses::new(vec![old_course(2)]).with_backup_dir(dir.path().join("backups")),
    );
    let manager = BackupManager::new(store, courses.clone());

    let record = manager.create_course_backup(&old_course(2)).await.unwrap();
    let restored = manager.restore_course_backup(record.id).await.unwrap();

    let course = courses.course(restored).unwrap().expect("Restored course missing");
    assert_eq!(course.shortname, "C2");
    assert_eq!(courses.courses().unwrap().len(), 2);
}

#[tokio::test]
async fn test_restore_unknown_backup_fails() {
    let manager = BackupManager::new(test_store(), Arc::new(InMemoryCourses::new(Vec::new())));

    let err = manager.restore_course_backup(42).await.unwrap_err();
    assert!(matches!(err, BackupError::NotFound(42)));
}
