//! Trigger chain evaluation for a single course.

use crate::registry::SubpluginCatalog;
use crate::subplugins::TriggerContext;
use cc_protocol::{Course, GlobalConfig, SubpluginRecord, TriggerResponse};
use chrono::{DateTime, Utc};

/// Outcome of walking the trigger chain for one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainDecision {
    /// `by` answered `trigger`; the course enters the step pipeline.
    Triggered { by: String },

    /// `by` answered `exclude`; the course is left alone this run.
    Excluded { by: String },

    /// Every trigger answered `next`, or the chain is empty.
    NoAction,

    /// `trigger` could not be checked; the course is skipped this run.
    Errored { trigger: String, reason: String },
}

/// Walk `chain` in order until a trigger decides.
///
/// # Arguments
///
/// * `course` - The course to evaluate
/// * `chain` - Enabled trigger records in sortindex order
/// * `catalog` - Installed trigger implementations
/// * `config` - Source of each trigger's settings
/// * `now` - The evaluation instant
pub async fn evaluate_chain(
    course: &Course,
    chain: &[SubpluginRecord],
    catalog: &SubpluginCatalog,
    config: &GlobalConfig,
    now: DateTime<Utc>,
) -> ChainDecision {
    for record in chain {
        let Some(trigger) = catalog.trigger(&record.name) else {
            return ChainDecision::Errored {
                trigger: record.name.clone(),
                reason: "trigger is not installed".to_string(),
            };
        };
        let settings = config.trigger_settings(&record.name);
        let ctx = TriggerContext {
            settings: &settings,
            now,
        };
        match trigger.check(course, &ctx).await {
            Ok(TriggerResponse::Trigger) => {
                return ChainDecision::Triggered {
                    by: record.name.clone(),
                }
            }
            Ok(TriggerResponse::Exclude) => {
                return ChainDecision::Excluded {
                    by: record.name.clone(),
                }
            }
            Ok(TriggerResponse::Next) => {
                tracing::debug!(course_id = course.id, trigger = %record.name, "trigger passed");
            }
            Err(e) => {
                return ChainDecision::Errored {
                    trigger: record.name.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }
    ChainDecision::NoAction
}
