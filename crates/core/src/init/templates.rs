//! Files written by `init`.

const CONFIG_TOML: &str = r#"# Cleanup courses configuration.
# Relative paths are resolved against this directory.

database = "cleanupcourses.db"
courses = "courses.yaml"
backup_dir = "backups"

# Entries left running longer than this (e.g. after a crash) are failed.
stale_claim_secs = 3600

[triggers.startdatedelay]
# Seconds after the course start date (180 days).
delay = 15552000

[triggers.categories]
categories = []
# true: skip courses in these categories. false: flag them.
exclude = true

[steps.email]
subject = "Course {shortname} is scheduled for cleanup"
body = "The course \"{fullname}\" ({shortname}) has been selected for cleanup and will be removed."
"#;

const COURSES_YAML: &str = r#"# Courses evaluated by `cleanupcourses evaluate`.
# Course 1 is the site course and is never flagged.
- id: 1
  shortname: site
  fullname: Site home
  startdate: "2015-01-01T00:00:00Z"
"#;

const TEMPLATES: &[(&str, &str)] = &[("config.toml", CONFIG_TOML), ("courses.yaml", COURSES_YAML)];

/// Content of the template at `path`, relative to `.cleanup-courses/`.
pub fn get_template(path: &str) -> Option<&'static str> {
    TEMPLATES
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, content)| *content)
}

/// All template paths.
pub fn list_templates() -> Vec<&'static str> {
    TEMPLATES.iter().map(|(name, _)| *name).collect()
}
