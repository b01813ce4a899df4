//! Test fixtures for creating sample courses, stores and engines.

use cc_core::backup::BackupManager;
use cc_core::courses::InMemoryCourses;
use cc_core::engine::LifecycleEngine;
use cc_core::registry::{SubpluginCatalog, SubpluginRegistry};
use cc_core::store::SqliteStore;
use cc_protocol::{Course, Event, GlobalConfig, SubpluginRecord};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Trigger registered, but not enabled, next to the three test triggers.
#[allow(dead_code)]
pub const EXISTING_TRIGGER: &str = "startdatedelay";

/// The instant every deterministic test evaluates at.
#[allow(dead_code)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn course(id: i64, category: i64, startdate: DateTime<Utc>) -> Course {
    Course {
        id,
        shortname: format!("C{id}"),
        fullname: format!("Course {id}"),
        category,
        startdate,
        visible: true,
    }
}

/// A course that started years before [`fixed_now`].
#[allow(dead_code)]
pub fn old_course(id: i64) -> Course {
    course(id, 1, Utc.with_ymd_and_hms(2020, 9, 1, 0, 0, 0).unwrap())
}

/// A course that started ten days before [`fixed_now`].
#[allow(dead_code)]
pub fn fresh_course(id: i64) -> Course {
    course(id, 1, fixed_now() - Duration::days(10))
}

#[allow(dead_code)]
pub fn test_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().expect("Failed to open in-memory store"))
}

/// Register three enabled test triggers (ids 1..3, sortindex 1..3), then
/// register [`EXISTING_TRIGGER`] without enabling it.
#[allow(dead_code)]
pub fn setup_test_triggers(registry: &SubpluginRegistry) -> SubpluginRecord {
    for name in ["testtrigger1", "testtrigger2", "testtrigger3"] {
        let record = registry.register(name).expect("Failed to register test trigger");
        registry.enable(record.id).expect("Failed to enable test trigger");
    }
    registry
        .register(EXISTING_TRIGGER)
        .expect("Failed to register existing trigger")
}

/// An engine over an in-memory store and course list, with its event receiver.
#[allow(dead_code)]
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub courses: Arc<InMemoryCourses>,
    pub engine: LifecycleEngine,
    pub events_rx: UnboundedReceiver<Event>,
}

#[allow(dead_code)]
impl TestHarness {
    /// Build a harness whose catalog is produced by `build_catalog`.
    pub fn new<F>(courses: Vec<Course>, config: GlobalConfig, build_catalog: F) -> Self
    where
        F: FnOnce(&Arc<SqliteStore>, &Arc<InMemoryCourses>) -> SubpluginCatalog,
    {
        let store = test_store();
        let courses = Arc::new(InMemoryCourses::new(courses));
        let catalog = build_catalog(&store, &courses);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = LifecycleEngine::new(
            Arc::clone(&store),
            catalog,
            courses.clone(),
            config,
            events_tx,
        );
        Self {
            store,
            courses,
            engine,
            events_rx,
        }
    }

    /// Harness with the built-in triggers and steps.
    pub fn builtin(courses: Vec<Course>, config: GlobalConfig) -> Self {
        Self::new(courses, config, |store, courses| {
            SubpluginCatalog::builtin(BackupManager::new(Arc::clone(store), courses.clone()))
        })
    }

    /// Register and enable `names` in order.
    pub fn enable_chain(registry: &SubpluginRegistry, names: &[&str]) {
        for name in names {
            let record = match registry.get_by_name(name).expect("Failed to look up") {
                Some(record) => record,
                None => registry.register(name).expect("Failed to register"),
            };
            if !record.enabled {
                registry.enable(record.id).expect("Failed to enable");
            }
        }
    }

    pub fn enable_triggers(&self, names: &[&str]) {
        Self::enable_chain(self.engine.triggers(), names);
    }

    pub fn enable_steps(&self, names: &[&str]) {
        Self::enable_chain(self.engine.steps(), names);
    }

    /// All events emitted so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Create a temporary project directory with `.cleanup-courses` configuration.
///
/// The course list holds the site course, two old courses (2, 3) and one
/// fresh course (4). Returns a TempDir that must be kept alive for the test
/// duration.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let cc_dir = temp_dir.path().join(".cleanup-courses");
    std::fs::create_dir_all(&cc_dir)?;

    let config_toml = r#"
database = "state/cleanup.db"
backup_dir = "backups"

[triggers.startdatedelay]
delay = 15552000

[steps.email]
subject = "Cleanup of {shortname}"
"#;
    std::fs::write(cc_dir.join("config.toml"), config_toml)?;

    let courses = vec![
        course(1, 0, Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap()),
        old_course(2),
        old_course(3),
        fresh_course(4),
    ];
    let yaml = serde_yaml::to_string(&courses).map_err(std::io::Error::other)?;
    std::fs::write(cc_dir.join("courses.yaml"), yaml)?;

    Ok(temp_dir)
}
