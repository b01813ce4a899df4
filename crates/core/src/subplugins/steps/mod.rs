//! Built-in steps.
//!
//! Each step talks to the platform only through
//! [`CourseBackend`](crate::courses::CourseBackend) or the
//! [`BackupManager`](crate::backup::BackupManager).

pub mod createbackup;
pub mod deletecourse;
pub mod duplicate;
pub mod email;

pub use createbackup::CreateBackupStep;
pub use deletecourse::DeleteCourseStep;
pub use duplicate::DuplicateStep;
pub use email::EmailStep;

#[cfg(test)]
pub(crate) mod test_support {
    use cc_protocol::Course;
    use chrono::{TimeZone, Utc};

    pub fn course(id: i64) -> Course {
        Course {
            id,
            shortname: format!("C{id}"),
            fullname: format!("Course {id}"),
            category: 1,
            startdate: Utc.with_ymd_and_hms(2020, 9, 1, 0, 0, 0).unwrap(),
            visible: true,
        }
    }
}
