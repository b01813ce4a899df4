use cc_protocol::*;
use serde_json::json;

#[test]
fn test_global_config_from_toml() {
    let toml_str = r#"
database = "state/lifecycle.db"
courses = "courses.yaml"
stale_claim_secs = 600

[triggers.startdatedelay]
delay = 86400

[triggers.categories]
categories = [3, 7]
exclude = true

[steps.email]
sender = "noreply@example.org"
"#;

    let config: GlobalConfig = toml::from_str(toml_str).expect("Failed to deserialize GlobalConfig");

    assert_eq!(config.database.to_str(), Some("state/lifecycle.db"));
    assert_eq!(config.stale_claim_secs, 600);
    assert_eq!(config.backup_dir.to_str(), Some("backups"));
    assert_eq!(config.trigger_settings("startdatedelay"), json!({"delay": 86400}));
    assert_eq!(
        config.trigger_settings("categories"),
        json!({"categories": [3, 7], "exclude": true})
    );
    assert_eq!(config.step_settings("email")["sender"], "noreply@example.org");
    assert!(config.step_settings("duplicate").is_null());
}

#[test]
fn test_global_config_defaults() {
    let config: GlobalConfig = toml::from_str("").expect("Empty config should parse");
    assert_eq!(config, GlobalConfig::default());
}

#[test]
fn test_course_deserialization() {
    let course: Course = serde_json::from_value(json!({
        "id": 42,
        "shortname": "PHY-101",
        "fullname": "Physics 101",
        "category": 3,
        "startdate": "2023-10-01T00:00:00Z"
    }))
    .expect("Failed to deserialize Course");

    assert_eq!(course.id, 42);
    assert!(course.visible, "visible should default to true");
    assert!(!course.is_site_course());
}

#[test]
fn test_event_serialization() {
    let event = Event::EntryStatusUpdate {
        course_id: 42,
        status: EntryStatus::AwaitingInput,
        step: "duplicate".to_string(),
    };

    let value = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(
        value,
        json!({
            "type": "entryStatusUpdate",
            "payload": {"course_id": 42, "status": "awaiting_input", "step": "duplicate"}
        })
    );

    let back: Event = serde_json::from_value(value).expect("Failed to deserialize Event");
    assert_eq!(back, event);
    assert_eq!(back.course_id(), 42);
}

#[test]
fn test_subplugin_record_serialization() {
    let record = SubpluginRecord {
        id: 4,
        name: "startdatedelay".to_string(),
        sortindex: None,
        enabled: false,
    };

    let value = serde_json::to_value(&record).expect("Failed to serialize SubpluginRecord");
    assert_eq!(value["sortindex"], serde_json::Value::Null);
    assert_eq!(serde_json::to_value(SubpluginKind::Trigger).unwrap(), json!("trigger"));
    assert_eq!(serde_json::to_value(TriggerResponse::Exclude).unwrap(), json!("exclude"));
}
