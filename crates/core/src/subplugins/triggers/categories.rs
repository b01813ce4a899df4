//! Excludes (or flags) courses by category.

use crate::subplugins::base::{parse_settings, SubpluginError, Trigger, TriggerContext};
use async_trait::async_trait;
use cc_protocol::{Course, TriggerResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    #[serde(default)]
    categories: Vec<i64>,

    /// `true`: listed categories are excluded. `false`: they are triggered.
    #[serde(default = "default_exclude")]
    exclude: bool,
}

fn default_exclude() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            exclude: true,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CategoriesTrigger;

impl CategoriesTrigger {
    pub const NAME: &'static str = "categories";
}

#[async_trait]
impl Trigger for CategoriesTrigger {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn check(
        &self,
        course: &Course,
        ctx: &TriggerContext<'_>,
    ) -> Result<TriggerResponse, SubpluginError> {
        let settings: Settings = parse_settings(Self::NAME, ctx.settings)?;
        if !settings.categories.contains(&course.category) {
            return Ok(TriggerResponse::Next);
        }
        Ok(if settings.exclude {
            TriggerResponse::Exclude
        } else {
            TriggerResponse::Trigger
        })
    }
}
