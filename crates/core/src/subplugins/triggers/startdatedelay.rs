//! Flags courses that started long enough ago.

use crate::subplugins::base::{parse_settings, SubpluginError, Trigger, TriggerContext};
use async_trait::async_trait;
use cc_protocol::{Course, TriggerResponse};
use chrono::Duration;
use serde::Deserialize;

/// 180 days.
pub const DEFAULT_DELAY_SECS: i64 = 15_552_000;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct Settings {
    /// Seconds after the start date at which the course is flagged.
    #[serde(default = "default_delay")]
    delay: i64,
}

fn default_delay() -> i64 {
    DEFAULT_DELAY_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY_SECS,
        }
    }
}

/// Triggers once `startdate + delay` lies in the past.
#[derive(Debug, Default, Clone, Copy)]
pub struct StartDateDelayTrigger;

impl StartDateDelayTrigger {
    pub const NAME: &'static str = "startdatedelay";
}

#[async_trait]
impl Trigger for StartDateDelayTrigger {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn check(
        &self,
        course: &Course,
        ctx: &TriggerContext<'_>,
    ) -> Result<TriggerResponse, SubpluginError> {
        let settings: Settings = parse_settings(Self::NAME, ctx.settings)?;
        if settings.delay < 0 {
            return Err(SubpluginError::InvalidSettings {
                name: Self::NAME.to_string(),
                reason: format!("delay must not be negative, got {}", settings.delay),
            });
        }
        let due = Duration::try_seconds(settings.delay)
            .and_then(|delay| course.startdate.checked_add_signed(delay))
            .ok_or_else(|| SubpluginError::InvalidSettings {
                name: Self::NAME.to_string(),
                reason: format!("delay of {}s is out of range", settings.delay),
            })?;
        if due < ctx.now {
            Ok(TriggerResponse::Trigger)
        } else {
            Ok(TriggerResponse::Next)
        }
    }
}
