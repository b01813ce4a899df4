//! Course snapshot consumed by triggers and steps.
//!
//! Courses are owned by the learning platform. The engine only reads them,
//! so this is a plain value loaded from a `CourseSource`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the front page course, which is never subject to cleanup.
pub const SITE_COURSE_ID: i64 = 1;

/// A course as seen by the lifecycle engine.
///
/// # Example
///
/// ```yaml
/// - id: 42
///   shortname: "PHY-101"
///   fullname: "Physics 101"
///   category: 3
///   startdate: "2023-10-01T00:00:00Z"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// Platform course id.
    pub id: i64,

    /// Short name, unique on the platform.
    pub shortname: String,

    /// Display name.
    pub fullname: String,

    /// Category id the course lives in.
    #[serde(default)]
    pub category: i64,

    /// Course start date.
    pub startdate: DateTime<Utc>,

    /// Whether students can see the course.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Course {
    /// Whether this is the site course.
    pub fn is_site_course(&self) -> bool {
        self.id == SITE_COURSE_ID
    }
}
