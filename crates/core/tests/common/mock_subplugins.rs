//! Mock trigger and step implementations for deterministic testing.

use async_trait::async_trait;
use cc_core::subplugins::{insert_field, Step, StepContext, SubpluginError, Trigger, TriggerContext};
use cc_protocol::{Course, StepOutcome, TriggerResponse};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A trigger that gives the same answer for every course.
#[allow(dead_code)]
pub struct FixedTrigger {
    name: String,
    response: TriggerResponse,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FixedTrigger {
    pub fn new(name: &str, response: TriggerResponse) -> Self {
        Self {
            name: name.to_string(),
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Trigger for FixedTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(
        &self,
        _course: &Course,
        _ctx: &TriggerContext<'_>,
    ) -> Result<TriggerResponse, SubpluginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response)
    }
}

/// A trigger that answers per course id: listed ids trigger, others pass.
#[allow(dead_code)]
pub struct CourseIdTrigger {
    name: String,
    ids: Vec<i64>,
}

#[allow(dead_code)]
impl CourseIdTrigger {
    pub fn new(name: &str, ids: &[i64]) -> Self {
        Self {
            name: name.to_string(),
            ids: ids.to_vec(),
        }
    }
}

#[async_trait]
impl Trigger for CourseIdTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(
        &self,
        course: &Course,
        _ctx: &TriggerContext<'_>,
    ) -> Result<TriggerResponse, SubpluginError> {
        if self.ids.contains(&course.id) {
            Ok(TriggerResponse::Trigger)
        } else {
            Ok(TriggerResponse::Next)
        }
    }
}

/// A trigger that always fails.
#[allow(dead_code)]
pub struct FailingTrigger {
    name: String,
}

#[allow(dead_code)]
impl FailingTrigger {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Trigger for FailingTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(
        &self,
        _course: &Course,
        _ctx: &TriggerContext<'_>,
    ) -> Result<TriggerResponse, SubpluginError> {
        Err(SubpluginError::Failed("backend unreachable".to_string()))
    }
}

/// What a [`ScriptedStep`] does when processed.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum StepBehaviour {
    /// Advance, marking `<name>_ran` in the data.
    Advance,

    /// Await until the data carries an `input` key, then advance.
    AwaitUntilInput,

    /// Return `StepOutcome::Fail`.
    Fail(String),

    /// Return an error.
    Error(String),
}

/// A step with scripted behaviour that counts its invocations.
#[allow(dead_code)]
pub struct ScriptedStep {
    name: String,
    behaviour: StepBehaviour,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedStep {
    pub fn new(name: &str, behaviour: StepBehaviour) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn advancing(name: &str) -> Self {
        Self::new(name, StepBehaviour::Advance)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Step for ScriptedStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        _course: &Course,
        _ctx: &StepContext<'_>,
        data: Value,
    ) -> Result<StepOutcome, SubpluginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ran = format!("{}_ran", self.name);
        match &self.behaviour {
            StepBehaviour::Advance => Ok(StepOutcome::Advance(insert_field(data, &ran, true))),
            StepBehaviour::AwaitUntilInput => {
                if data.get("input").is_some() {
                    Ok(StepOutcome::Advance(insert_field(data, &ran, true)))
                } else {
                    Ok(StepOutcome::Await(data))
                }
            }
            StepBehaviour::Fail(reason) => Ok(StepOutcome::Fail(reason.clone())),
            StepBehaviour::Error(reason) => Err(SubpluginError::Failed(reason.clone())),
        }
    }
}
