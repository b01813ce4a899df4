//! Capability lookup by subplugin name.

use crate::backup::BackupManager;
use crate::subplugins::steps::{CreateBackupStep, DeleteCourseStep, DuplicateStep, EmailStep};
use crate::subplugins::triggers::{CategoriesTrigger, StartDateDelayTrigger};
use crate::subplugins::{Step, Trigger};
use cc_protocol::SubpluginKind;
use std::collections::HashMap;
use std::sync::Arc;

/// The installed trigger and step implementations, keyed by name.
///
/// The registry decides order and enablement; the catalog only answers
/// "what runs under this name". A registered name without an entry here is
/// treated as uninstalled.
#[derive(Clone, Default)]
pub struct SubpluginCatalog {
    triggers: HashMap<String, Arc<dyn Trigger>>,
    steps: HashMap<String, Arc<dyn Step>>,
}

impl SubpluginCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in trigger and step.
    ///
    /// # Arguments
    ///
    /// * `backups` - Backup manager used by `createbackup`; its backend also
    ///   serves `email`, `duplicate` and `deletecourse`
    pub fn builtin(backups: BackupManager) -> Self {
        let backend = backups.backend();
        Self::new()
            .with_trigger(Arc::new(StartDateDelayTrigger))
            .with_trigger(Arc::new(CategoriesTrigger))
            .with_step(Arc::new(CreateBackupStep::new(backups)))
            .with_step(Arc::new(EmailStep::new(Arc::clone(&backend))))
            .with_step(Arc::new(DuplicateStep::new(Arc::clone(&backend))))
            .with_step(Arc::new(DeleteCourseStep::new(backend)))
    }

    /// Install a trigger under its own name, replacing any previous one.
    pub fn with_trigger(mut self, trigger: Arc<dyn Trigger>) -> Self {
        self.triggers.insert(trigger.name().to_string(), trigger);
        self
    }

    /// Install a step under its own name, replacing any previous one.
    pub fn with_step(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.insert(step.name().to_string(), step);
        self
    }

    pub fn trigger(&self, name: &str) -> Option<Arc<dyn Trigger>> {
        self.triggers.get(name).cloned()
    }

    pub fn step(&self, name: &str) -> Option<Arc<dyn Step>> {
        self.steps.get(name).cloned()
    }

    /// Installed names of `kind`, sorted.
    pub fn installed(&self, kind: SubpluginKind) -> Vec<String> {
        let mut names: Vec<String> = match kind {
            SubpluginKind::Trigger => self.triggers.keys().cloned().collect(),
            SubpluginKind::Step => self.steps.keys().cloned().collect(),
        };
        names.sort();
        names
    }
}
