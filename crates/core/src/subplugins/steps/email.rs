//! Notifies the course owners.

use crate::courses::CourseBackend;
use crate::subplugins::base::{insert_field, parse_settings, Step, StepContext, SubpluginError};
use async_trait::async_trait;
use cc_protocol::{Course, StepOutcome};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_SUBJECT: &str = "Course {shortname} is scheduled for cleanup";
const DEFAULT_BODY: &str =
    "The course \"{fullname}\" ({shortname}) has been selected for cleanup and will be removed.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    /// Informational; delivery is the platform's concern.
    #[serde(default)]
    sender: Option<String>,

    #[serde(default = "default_subject")]
    subject: String,

    #[serde(default = "default_body")]
    body: String,
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

fn default_body() -> String {
    DEFAULT_BODY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sender: None,
            subject: default_subject(),
            body: default_body(),
        }
    }
}

/// Replace `{fullname}`, `{shortname}` and `{courseid}` in a template.
fn render(template: &str, course: &Course) -> String {
    template
        .replace("{fullname}", &course.fullname)
        .replace("{shortname}", &course.shortname)
        .replace("{courseid}", &course.id.to_string())
}

/// Sends one message to the owners and advances with `{"notified": n}`.
#[derive(Clone)]
pub struct EmailStep {
    backend: Arc<dyn CourseBackend>,
}

impl EmailStep {
    pub const NAME: &'static str = "email";

    pub fn new(backend: Arc<dyn CourseBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Step for EmailStep {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn process(
        &self,
        course: &Course,
        ctx: &StepContext<'_>,
        data: Value,
    ) -> Result<StepOutcome, SubpluginError> {
        let settings: Settings = parse_settings(Self::NAME, ctx.settings)?;
        let subject = render(&settings.subject, course);
        let body = render(&settings.body, course);
        let notified = self.backend.notify_owners(course, &subject, &body).await?;
        tracing::debug!(
            course_id = course.id,
            notified,
            sender = settings.sender.as_deref().unwrap_or("default"),
            "notified course owners"
        );
        Ok(StepOutcome::Advance(insert_field(data, "notified", notified)))
    }
}
