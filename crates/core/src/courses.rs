//! Boundary to the learning platform.
//!
//! The engine reads courses through [`CourseSource`] and asks the platform
//! to back up, restore, duplicate, delete and announce courses through
//! [`CourseBackend`]. How the platform does these things is not this
//! crate's concern; only the outcome is recorded.
//!
//! [`InMemoryCourses`] implements both traits over a course list loaded
//! from YAML. The command line and the tests use it.

use crate::config::CourseList;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use cc_protocol::{BackupRecord, Course, SITE_COURSE_ID};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Read access to the platform's courses.
pub trait CourseSource: Send + Sync {
    /// All courses, in any order.
    fn courses(&self) -> Result<Vec<Course>>;

    /// A single course, or `None` once it is gone.
    fn course(&self, id: i64) -> Result<Option<Course>>;
}

/// Course operations performed by step subplugins.
#[async_trait]
pub trait CourseBackend: Send + Sync {
    /// Produce a backup archive and return its location.
    async fn backup(&self, course: &Course) -> Result<String>;

    /// Restore an archive as a new course and return the new id.
    async fn restore(&self, backup: &BackupRecord) -> Result<i64>;

    /// Copy a course under new names and return the new id.
    async fn duplicate(&self, course: &Course, fullname: &str, shortname: &str) -> Result<i64>;

    /// Remove a course from the platform.
    async fn delete(&self, course_id: i64) -> Result<()>;

    /// Send a message to the course owners; returns how many were notified.
    async fn notify_owners(&self, course: &Course, subject: &str, body: &str) -> Result<usize>;
}

/// A message recorded by [`InMemoryCourses::notify_owners`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub course_id: i64,
    pub subject: String,
    pub body: String,
}

/// Course list held in memory.
///
/// Backups are written as JSON files when a backup directory is set and
/// kept in memory otherwise.
///
/// New courses take ids from a counter that only grows, so the id of a
/// deleted course never comes back and its ledger history stays its own.
pub struct InMemoryCourses {
    courses: RwLock<BTreeMap<i64, Course>>,
    next_id: AtomicI64,
    archives: Mutex<HashMap<String, Course>>,
    sent: Mutex<Vec<SentNotification>>,
    backup_dir: Option<PathBuf>,
}

impl InMemoryCourses {
    pub fn new(courses: Vec<Course>) -> Self {
        Self::from_list(CourseList::new(courses))
    }

    /// Courses plus the persisted id counter. The counter starts above
    /// every listed id even if the file says otherwise.
    pub fn from_list(list: CourseList) -> Self {
        let courses: BTreeMap<i64, Course> =
            list.courses.into_iter().map(|c| (c.id, c)).collect();
        let above_listed = courses.keys().next_back().copied().unwrap_or(SITE_COURSE_ID) + 1;
        let next_id = list.next_id.map_or(above_listed, |n| n.max(above_listed));
        Self {
            courses: RwLock::new(courses),
            next_id: AtomicI64::new(next_id),
            archives: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            backup_dir: None,
        }
    }

    /// Write backup archives into `dir`.
    pub fn with_backup_dir(mut self, dir: PathBuf) -> Self {
        self.backup_dir = Some(dir);
        self
    }

    /// Current course list, ordered by id.
    pub fn snapshot(&self) -> Result<Vec<Course>> {
        let courses = self
            .courses
            .read()
            .map_err(|_| anyhow!("course list lock poisoned"))?;
        Ok(courses.values().cloned().collect())
    }

    /// Courses and id counter, for writing back with `save_courses`.
    pub fn to_list(&self) -> Result<CourseList> {
        Ok(CourseList {
            next_id: Some(self.next_id.load(Ordering::SeqCst)),
            courses: self.snapshot()?,
        })
    }

    /// Notifications sent so far.
    pub fn sent_notifications(&self) -> Vec<SentNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    fn insert_copy(&self, mut course: Course) -> Result<i64> {
        let mut courses = self
            .courses
            .write()
            .map_err(|_| anyhow!("course list lock poisoned"))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        course.id = id;
        courses.insert(id, course);
        Ok(id)
    }
}

impl CourseSource for InMemoryCourses {
    fn courses(&self) -> Result<Vec<Course>> {
        self.snapshot()
    }

    fn course(&self, id: i64) -> Result<Option<Course>> {
        let courses = self
            .courses
            .read()
            .map_err(|_| anyhow!("course list lock poisoned"))?;
        Ok(courses.get(&id).cloned())
    }
}

#[async_trait]
impl CourseBackend for InMemoryCourses {
    async fn backup(&self, course: &Course) -> Result<String> {
        let file_name = format!("backup-{}-{}.json", course.id, Uuid::new_v4());
        let location = match &self.backup_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                let path = dir.join(&file_name);
                tokio::fs::write(&path, serde_json::to_vec_pretty(course)?).await?;
                path.display().to_string()
            }
            None => format!("memory://{file_name}"),
        };
        self.archives
            .lock()
            .map_err(|_| anyhow!("archive lock poisoned"))?
            .insert(location.clone(), course.clone());
        Ok(location)
    }

    async fn restore(&self, backup: &BackupRecord) -> Result<i64> {
        let archived = self
            .archives
            .lock()
            .map_err(|_| anyhow!("archive lock poisoned"))?
            .get(&backup.backup_file)
            .cloned();
        let course = match archived {
            Some(course) => course,
            None if !backup.backup_file.starts_with("memory://") => {
                let raw = tokio::fs::read(&backup.backup_file).await?;
                serde_json::from_slice(&raw)?
            }
            None => return Err(anyhow!("archive {} is gone", backup.backup_file)),
        };
        self.insert_copy(course)
    }

    async fn duplicate(&self, course: &Course, fullname: &str, shortname: &str) -> Result<i64> {
        let mut copy = course.clone();
        copy.fullname = fullname.to_string();
        copy.shortname = shortname.to_string();
        self.insert_copy(copy)
    }

    async fn delete(&self, course_id: i64) -> Result<()> {
        let mut courses = self
            .courses
            .write()
            .map_err(|_| anyhow!("course list lock poisoned"))?;
        courses
            .remove(&course_id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("course {course_id} does not exist"))
    }

    async fn notify_owners(&self, course: &Course, subject: &str, body: &str) -> Result<usize> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("notification lock poisoned"))?
            .push(SentNotification {
                course_id: course.id,
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn course(id: i64) -> Course {
        Course {
            id,
            shortname: format!("C{id}"),
            fullname: format!("Course {id}"),
            category: 1,
            startdate: Utc.with_ymd_and_hms(2020, 9, 1, 0, 0, 0).unwrap(),
            visible: true,
        }
    }

    #[tokio::test]
    async fn test_duplicate_assigns_next_id() {
        let courses = InMemoryCourses::new(vec![course(2), course(5)]);
        let id = courses
            .duplicate(&course(2), "Copy", "C2-copy")
            .await
            .unwrap();
        assert_eq!(id, 6);
        let copy = courses.course(6).unwrap().unwrap();
        assert_eq!(copy.shortname, "C2-copy");
    }

    #[tokio::test]
    async fn test_deleted_ids_are_not_reused() {
        let courses = InMemoryCourses::new(vec![course(2), course(3)]);
        courses.delete(3).await.unwrap();

        let copy = courses.duplicate(&course(2), "Copy", "C2-copy").await.unwrap();
        assert_eq!(copy, 4);

        // The counter outlives a save and reload.
        let list = courses.to_list().unwrap();
        assert_eq!(list.next_id, Some(5));
        courses.delete(4).await.unwrap();
        let reloaded = InMemoryCourses::from_list(courses.to_list().unwrap());
        let copy = reloaded.duplicate(&course(2), "Copy", "C2-copy").await.unwrap();
        assert_eq!(copy, 5);
    }

    #[test]
    fn test_stale_counter_is_raised_above_listed_ids() {
        let courses = InMemoryCourses::from_list(CourseList {
            next_id: Some(2),
            courses: vec![course(2), course(9)],
        });
        assert_eq!(courses.to_list().unwrap().next_id, Some(10));
    }

    #[tokio::test]
    async fn test_delete_missing_course_fails() {
        let courses = InMemoryCourses::new(vec![course(2)]);
        courses.delete(2).await.unwrap();
        assert!(courses.course(2).unwrap().is_none());
        assert!(courses.delete(2).await.is_err());
    }

    #[tokio::test]
    async fn test_backup_to_directory_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let courses =
            InMemoryCourses::new(vec![course(2)]).with_backup_dir(dir.path().to_path_buf());
        let location = courses.backup(&course(2)).await.unwrap();
        assert!(std::path::Path::new(&location).exists());

        let record = BackupRecord {
            id: 1,
            course_id: 2,
            shortname: "C2".into(),
            fullname: "Course 2".into(),
            backup_file: location,
            created_at: Utc::now(),
        };
        let restored = courses.restore(&record).await.unwrap();
        assert_eq!(restored, 3);
        assert_eq!(courses.snapshot().unwrap().len(), 2);
    }
}
