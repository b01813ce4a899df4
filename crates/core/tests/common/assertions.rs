//! Custom assertion helpers for integration tests.

use cc_core::registry::SubpluginRegistry;
use cc_core::state::Ledger;
use cc_protocol::{EntryStatus, Event, SubpluginRecord};

/// Assert that the record with `id` has the given sortindex.
#[allow(dead_code)]
pub fn assert_sortindex(registry: &SubpluginRegistry, id: i64, expected: Option<u32>) {
    let record = registry.get(id).expect("Record should exist");
    assert_eq!(
        record.sortindex, expected,
        "Sortindex of '{}' (id {id}) is wrong",
        record.name
    );
}

/// Assert that enabled records hold exactly the sortindices `1..=k` and
/// disabled records hold none.
#[allow(dead_code)]
pub fn assert_dense(registry: &SubpluginRegistry) {
    let records = registry.list().expect("Failed to list records");
    let mut indices: Vec<u32> = records
        .iter()
        .filter(|r| r.enabled)
        .map(|r| r.sortindex.expect("Enabled record without sortindex"))
        .collect();
    indices.sort_unstable();
    let expected: Vec<u32> = (1..=indices.len() as u32).collect();
    assert_eq!(indices, expected, "Sortindices are not dense: {records:?}");
    for record in records.iter().filter(|r| !r.enabled) {
        assert_eq!(record.sortindex, None, "Disabled record with sortindex: {record:?}");
    }
}

/// Names of the enabled records in chain order.
#[allow(dead_code)]
pub fn chain_names(registry: &SubpluginRegistry) -> Vec<String> {
    registry
        .enabled()
        .expect("Failed to list enabled records")
        .into_iter()
        .map(|r: SubpluginRecord| r.name)
        .collect()
}

/// Assert that the course's live entry is at `step` with `status`.
#[allow(dead_code)]
pub fn assert_entry(ledger: &Ledger, course_id: i64, step: &str, status: EntryStatus) {
    let entry = ledger
        .get(course_id)
        .expect("Failed to read ledger")
        .unwrap_or_else(|| panic!("Course {course_id} has no entry"));
    assert_eq!(entry.current_step, step, "Wrong step for course {course_id}");
    assert_eq!(entry.status, status, "Wrong status for course {course_id}");
}

/// Whether a sequence of events contains an EntryStatusUpdate with `status`.
#[allow(dead_code)]
pub fn has_status_update(events: &[Event], course_id: i64, status: EntryStatus) -> bool {
    events.iter().any(|e| {
        matches!(
            e,
            Event::EntryStatusUpdate {
                course_id: c,
                status: s,
                ..
            } if *c == course_id && *s == status
        )
    })
}

/// Whether a sequence of events contains an EntryCompleted for the course.
#[allow(dead_code)]
pub fn has_completed(events: &[Event], course_id: i64) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::EntryCompleted { course_id: c } if *c == course_id))
}
