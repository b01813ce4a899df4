//! Archives the course before anything destructive happens.

use crate::backup::BackupManager;
use crate::subplugins::base::{insert_field, Step, StepContext, SubpluginError};
use async_trait::async_trait;
use cc_protocol::{Course, StepOutcome};
use serde_json::Value;

/// Records a backup and advances with `{"backup_id": n}`.
#[derive(Clone)]
pub struct CreateBackupStep {
    backups: BackupManager,
}

impl CreateBackupStep {
    pub const NAME: &'static str = "createbackup";

    pub fn new(backups: BackupManager) -> Self {
        Self { backups }
    }
}

#[async_trait]
impl Step for CreateBackupStep {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn process(
        &self,
        course: &Course,
        _ctx: &StepContext<'_>,
        data: Value,
    ) -> Result<StepOutcome, SubpluginError> {
        let record = self
            .backups
            .create_course_backup(course)
            .await
            .map_err(|e| SubpluginError::Backend(e.into()))?;
        Ok(StepOutcome::Advance(insert_field(data, "backup_id", record.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::InMemoryCourses;
    use crate::store::SqliteStore;
    use crate::subplugins::steps::test_support::course;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_records_backup_id() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let backend = Arc::new(InMemoryCourses::new(vec![course(2)]));
        let backups = BackupManager::new(store, backend);
        let step = CreateBackupStep::new(backups.clone());

        let settings = Value::Null;
        let ctx = StepContext { settings: &settings, now: Utc::now() };
        let outcome = step.process(&course(2), &ctx, json!({})).await.unwrap();

        let listed = backups.list_backups(Some(2)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(outcome, StepOutcome::Advance(json!({"backup_id": listed[0].id})));
    }
}
