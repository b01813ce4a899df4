//! Keeps a copy of the course under names chosen by an administrator.
//!
//! The first invocation pauses the entry until the new names arrive through
//! `resume`; the next one asks the platform for the copy.

use crate::courses::CourseBackend;
use crate::subplugins::base::{
    insert_field, merge_input, Step, StepContext, SubpluginError, MESSAGE_KEY,
};
use async_trait::async_trait;
use cc_protocol::{Course, StepOutcome};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub const AWAITING_MESSAGE: &str = "Additional information required";
pub const DONE_MESSAGE: &str = "Duplicated course will be available shortly.";

#[derive(Debug, Deserialize)]
struct Names {
    fullname: String,
    shortname: String,
}

impl Names {
    fn from_input(input: &Value) -> Result<Self, String> {
        let names: Names = serde_json::from_value(input.clone()).map_err(|e| e.to_string())?;
        if names.fullname.trim().is_empty() {
            return Err("fullname must not be empty".to_string());
        }
        if names.shortname.trim().is_empty() {
            return Err("shortname must not be empty".to_string());
        }
        Ok(names)
    }
}

#[derive(Clone)]
pub struct DuplicateStep {
    backend: Arc<dyn CourseBackend>,
}

impl DuplicateStep {
    pub const NAME: &'static str = "duplicate";

    pub fn new(backend: Arc<dyn CourseBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Step for DuplicateStep {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn process(
        &self,
        course: &Course,
        _ctx: &StepContext<'_>,
        data: Value,
    ) -> Result<StepOutcome, SubpluginError> {
        let names = match data.get("input").map(Names::from_input) {
            Some(Ok(names)) => names,
            _ => {
                return Ok(StepOutcome::Await(insert_field(
                    data,
                    MESSAGE_KEY,
                    AWAITING_MESSAGE,
                )))
            }
        };
        let duplicate_id = self
            .backend
            .duplicate(course, &names.fullname, &names.shortname)
            .await?;
        tracing::info!(course_id = course.id, duplicate_id, "duplicated course");
        let data = insert_field(data, "duplicate_id", duplicate_id);
        Ok(StepOutcome::Advance(insert_field(data, MESSAGE_KEY, DONE_MESSAGE)))
    }

    fn resume(&self, data: Value, input: Value) -> Result<Value, SubpluginError> {
        Names::from_input(&input).map_err(|reason| SubpluginError::InvalidInput {
            name: Self::NAME.to_string(),
            reason,
        })?;
        Ok(merge_input(data, input))
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
    async fn test_awaits_until_names_are_given() {
        let courses = Arc::new(InMemoryCourses::new(vec![course(2)]));
        let step = DuplicateStep::new(courses.clone());
        let settings = Value::Null;
        let ctx = StepContext { settings: &settings, now: Utc::now() };

        let outcome = step
            .process(&course(2), &ctx, json!({"backup_id": 1}))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Await(json!({"backup_id": 1, "message": AWAITING_MESSAGE}))
        );

        let data = step
            .resume(json!({"backup_id": 1}), json!({"fullname": "Copy", "shortname": "C2b"}))
            .unwrap();
        let outcome = step.process(&course(2), &ctx, data).await.unwrap();
        match outcome {
            StepOutcome::Advance(data) => {
                assert_eq!(data["duplicate_id"], 3);
                assert_eq!(data["message"], DONE_MESSAGE);
            }
            other => panic!("expected advance, got {other:?}"),
        }
        assert_eq!(courses.course(3).unwrap().unwrap().shortname, "C2b");
    }

    #[test]
    fn test_resume_rejects_incomplete_input() {
        let courses = Arc::new(InMemoryCourses::new(vec![]));
        let step = DuplicateStep::new(courses);
        let missing = step.resume(json!({}), json!({"fullname": "Copy"}));
        assert!(matches!(missing, Err(SubpluginError::InvalidInput { .. })));
        let blank = step.resume(json!({}), json!({"fullname": "Copy", "shortname": " "}));
        assert!(matches!(blank, Err(SubpluginError::InvalidInput { .. })));
    }
}
