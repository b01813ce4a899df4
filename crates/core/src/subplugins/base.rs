//! Base Trigger and Step traits and supporting types.

use async_trait::async_trait;
use cc_protocol::{Course, StepOutcome, TriggerResponse};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Context passed to a trigger for one check.
///
/// Settings are injected per invocation instead of being read from global
/// state, so the same trigger instance can be checked under different
/// configurations.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext<'a> {
    /// This trigger's table from `config.toml`, or `null`.
    pub settings: &'a Value,

    /// The instant the evaluation run is performed at.
    pub now: DateTime<Utc>,
}

/// Context passed to a step for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// This step's table from `config.toml`, or `null`.
    pub settings: &'a Value,

    /// The instant the advance run is performed at.
    pub now: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum SubpluginError {
    #[error("invalid settings for {name}: {reason}")]
    InvalidSettings { name: String, reason: String },
    #[error("invalid input for {name}: {reason}")]
    InvalidInput { name: String, reason: String },
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// A check deciding whether a course enters the step pipeline.
#[async_trait]
pub trait Trigger: Send + Sync {
    /// Name the trigger is registered under.
    fn name(&self) -> &str;

    async fn check(
        &self,
        course: &Course,
        ctx: &TriggerContext<'_>,
    ) -> Result<TriggerResponse, SubpluginError>;
}

/// A unit of work a flagged course is driven through.
#[async_trait]
pub trait Step: Send + Sync {
    /// Name the step is registered under.
    fn name(&self) -> &str;

    /// Run the step with the data accumulated so far.
    ///
    /// An `Err` is recorded on the entry exactly like `StepOutcome::Fail`.
    async fn process(
        &self,
        course: &Course,
        ctx: &StepContext<'_>,
        data: Value,
    ) -> Result<StepOutcome, SubpluginError>;

    /// Fold externally supplied input into the data of an entry that is
    /// awaiting input. The default stores it under the `"input"` key.
    fn resume(&self, data: Value, input: Value) -> Result<Value, SubpluginError> {
        Ok(merge_input(data, input))
    }
}

/// Key under which a step leaves a message for the administrator.
pub const MESSAGE_KEY: &str = "message";

/// Store `input` under the `"input"` key of `data`, replacing any earlier input.
pub fn merge_input(data: Value, input: Value) -> Value {
    insert_field(data, "input", input)
}

/// Set `key` on `data`, turning non-object data into an object first.
pub fn insert_field(data: Value, key: &str, value: impl Into<Value>) -> Value {
    let mut map = match data {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    map.insert(key.to_string(), value.into());
    Value::Object(map)
}

/// Remove and return the message a step left in `data`.
///
/// Non-string messages are rendered as JSON text; `null` means no message.
pub fn take_message(data: &mut Value) -> Option<String> {
    match data.as_object_mut()?.remove(MESSAGE_KEY)? {
        Value::Null => None,
        Value::String(message) => Some(message),
        other => Some(other.to_string()),
    }
}

/// Deserialize a subplugin's settings, falling back to defaults for `null`.
pub fn parse_settings<T>(name: &str, settings: &Value) -> Result<T, SubpluginError>
where
    T: DeserializeOwned + Default,
{
    if settings.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(settings.clone()).map_err(|e| SubpluginError::InvalidSettings {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    struct EchoStep;

    #[async_trait]
    impl Step for EchoStep {
        fn name(&self) -> &str {
            "echo"
        }

        async fn process(
            &self,
            _course: &Course,
            _ctx: &StepContext<'_>,
            data: Value,
        ) -> Result<StepOutcome, SubpluginError> {
            Ok(StepOutcome::Advance(data))
        }
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct DelaySettings {
        #[serde(default)]
        delay: u64,
    }

    #[test]
    fn test_default_resume_stores_input() {
        let data = EchoStep
            .resume(json!({"backup_id": 3}), json!({"fullname": "Copy"}))
            .unwrap();
        assert_eq!(data, json!({"backup_id": 3, "input": {"fullname": "Copy"}}));
    }

    #[test]
    fn test_merge_input_replaces_non_object() {
        assert_eq!(merge_input(Value::Null, json!(1)), json!({"input": 1}));
    }

    #[test]
    fn test_take_message_removes_key() {
        let mut data = json!({"message": "Additional information required", "input": {}});
        assert_eq!(
            take_message(&mut data).as_deref(),
            Some("Additional information required")
        );
        assert_eq!(data, json!({"input": {}}));
        assert_eq!(take_message(&mut data), None);
    }

    #[test]
    fn test_take_message_renders_structured_message() {
        let mut data = json!({"message": {"missing": ["shortname"]}, "input": {}});
        assert_eq!(
            take_message(&mut data).as_deref(),
            Some(r#"{"missing":["shortname"]}"#)
        );
        assert_eq!(data, json!({"input": {}}));

        let mut data = json!({"message": null});
        assert_eq!(take_message(&mut data), None);
        assert_eq!(data, json!({}));
    }

    #[test]
    fn test_parse_settings_null_uses_default() {
        let parsed: DelaySettings = parse_settings("startdatedelay", &Value::Null).unwrap();
        assert_eq!(parsed, DelaySettings::default());
    }

    #[test]
    fn test_parse_settings_rejects_wrong_type() {
        let result: Result<DelaySettings, _> =
            parse_settings("startdatedelay", &json!({"delay": "soon"}));
        assert!(matches!(result, Err(SubpluginError::InvalidSettings { .. })));
    }
}
