//! Everything a command needs, built from the project's `.cleanup-courses/`.

use std::path::Path;
use std::sync::Arc;

use cc_core::backup::BackupManager;
use cc_core::config::{load_config, load_courses, save_courses, AppConfig};
use cc_core::courses::InMemoryCourses;
use cc_core::engine::LifecycleEngine;
use cc_core::registry::SubpluginCatalog;
use cc_core::store::SqliteStore;
use cc_protocol::Event;
use color_eyre::eyre::{eyre, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::output;

pub struct Context {
    pub config: AppConfig,
    pub engine: LifecycleEngine,
    pub courses: Arc<InMemoryCourses>,
    pub backups: BackupManager,
    events_rx: UnboundedReceiver<Event>,
}

impl Context {
    /// Load configuration and courses, open the store and bring the
    /// registries in line with the installed subplugins.
    ///
    /// Claims abandoned by a crashed run are failed before anything else
    /// happens.
    pub async fn open(root: &Path) -> Result<Self> {
        let config = load_config(root).await?;
        if !config.dir.is_dir() {
            return Err(eyre!(
                "no configuration found at {}; run `cleanupcourses init` first",
                config.dir.display()
            ));
        }

        let store = Arc::new(SqliteStore::open(&config.database_path())?);
        let course_list = load_courses(&config.courses_path()).await?;
        tracing::debug!(courses = course_list.courses.len(), "loaded course list");
        let courses =
            Arc::new(InMemoryCourses::from_list(course_list).with_backup_dir(config.backup_dir()));
        let backups = BackupManager::new(Arc::clone(&store), courses.clone());
        let catalog = SubpluginCatalog::builtin(backups.clone());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = LifecycleEngine::new(
            store,
            catalog,
            courses.clone(),
            config.global.clone(),
            events_tx,
        );

        let (triggers, steps) = engine.sync_installed()?;
        for name in triggers.registered.iter().chain(&steps.registered) {
            tracing::info!(name = %name, "registered installed subplugin");
        }
        for name in triggers.removed.iter().chain(&steps.removed) {
            tracing::warn!(name = %name, "removed uninstalled subplugin");
        }
        let recovered = engine.recover_stale()?;
        if !recovered.is_empty() {
            tracing::warn!(count = recovered.len(), "failed abandoned entries");
        }

        Ok(Self {
            config,
            engine,
            courses,
            backups,
            events_rx,
        })
    }

    /// Write the course list back, including copies and deletions made by steps.
    pub async fn save_courses(&self) -> Result<()> {
        let list = self.courses.to_list().map_err(|e| eyre!(e))?;
        save_courses(&self.config.courses_path(), &list).await?;
        Ok(())
    }

    /// Print the events emitted since the last call.
    pub fn print_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            output::print_event(&event);
        }
    }
}
