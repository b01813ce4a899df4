//! Removes the course from the platform.

use crate::courses::CourseBackend;
use crate::subplugins::base::{Step, StepContext, SubpluginError};
use async_trait::async_trait;
use cc_protocol::{Course, StepOutcome};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct DeleteCourseStep {
    backend: Arc<dyn CourseBackend>,
}

impl DeleteCourseStep {
    pub const NAME: &'static str = "deletecourse";

    pub fn new(backend: Arc<dyn CourseBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Step for DeleteCourseStep {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn process(
        &self,
        course: &Course,
        _ctx: &StepContext<'_>,
        data: Value,
    ) -> Result<StepOutcome, SubpluginError> {
        self.backend.delete(course.id).await?;
        tracing::info!(course_id = course.id, "deleted course");
        Ok(StepOutcome::Advance(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courses::{CourseSource, InMemoryCourses};
    use crate::subplugins::steps::test_support::course;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn test_deletes_course() {
        let courses = Arc::new(InMemoryCourses::new(vec![course(2), course(3)]));
        let step = DeleteCourseStep::new(courses.clone());
        let settings = Value::Null;
        let ctx = StepContext { settings: &settings, now: Utc::now() };

        let outcome = step
            .process(&course(2), &ctx, json!({"backup_id": 1}))
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Advance(json!({"backup_id": 1})));
        assert!(courses.course(2).unwrap().is_none());
        assert!(courses.course(3).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_course_is_an_error() {
        let courses = Arc::new(InMemoryCourses::new(vec![]));
        let step = DeleteCourseStep::new(courses);
        let settings = Value::Null;
        let ctx = StepContext { settings: &settings, now: Utc::now() };
        let result = step.process(&course(9), &ctx, json!({})).await;
        assert!(matches!(result, Err(SubpluginError::Backend(_))));
    }
}
