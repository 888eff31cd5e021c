//! Record validation for stored subjects

use serde_json::Value;
use tracing::debug;

use super::ValidationMode;
use crate::subject::Subject;

/// Structural check on a raw stored record.
///
/// Requires an object with string `id` and `name`, numeric counters and
/// threshold, and non-null timestamps.
fn has_subject_shape(value: &Value) -> bool {
    let Some(record) = value.as_object() else {
        return false;
    };

    let is_string = |field: &str| record.get(field).is_some_and(Value::is_string);
    let is_number = |field: &str| record.get(field).is_some_and(Value::is_number);
    let is_present = |field: &str| record.get(field).is_some_and(|v| !v.is_null());

    is_string("id")
        && is_string("name")
        && is_number("totalClasses")
        && is_number("attendedClasses")
        && is_number("minimumAttendance")
        && is_present("createdAt")
        && is_present("updatedAt")
}

/// Turn a raw record into a [`Subject`] if it passes validation.
pub fn validate_record(value: Value, mode: ValidationMode) -> Option<Subject> {
    if !has_subject_shape(&value) {
        debug!("dropping record with wrong shape: {}", value);
        return None;
    }

    let subject: Subject = match serde_json::from_value(value) {
        Ok(subject) => subject,
        Err(e) => {
            debug!("dropping unreadable record: {}", e);
            return None;
        }
    };

    if validate_subject(&subject, mode) {
        Some(subject)
    } else {
        debug!("dropping inconsistent subject {}", subject.id);
        None
    }
}

/// Validate every raw record, keeping the ones that pass.
pub fn validate_records(values: Vec<Value>, mode: ValidationMode) -> Vec<Subject> {
    values
        .into_iter()
        .filter_map(|value| validate_record(value, mode))
        .collect()
}

/// Check an already typed subject against the validation mode.
#[must_use]
pub fn validate_subject(subject: &Subject, mode: ValidationMode) -> bool {
    match mode {
        ValidationMode::Strict => subject.is_consistent(),
        ValidationMode::Lenient => true,
    }
}
