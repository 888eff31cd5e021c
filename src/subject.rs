//! Subject records and their mutation flows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Minimum attendance percentage used when the user gives none.
pub const DEFAULT_MINIMUM_ATTENDANCE: u8 = 75;

/// A tracked course with attendance counters and a required threshold.
///
/// Field names on disk are camelCase with ISO-8601 timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Unique opaque identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Classes held so far
    pub total_classes: u32,

    /// Classes attended, never more than `total_classes`
    pub attended_classes: u32,

    /// Required attendance percentage (0-100)
    pub minimum_attendance: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Changes applied by [`Subject::edit`]. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct SubjectEdit {
    pub name: Option<String>,
    pub total_classes: Option<u32>,
    pub attended_classes: Option<u32>,
    pub minimum_attendance: Option<u32>,
}

impl Subject {
    /// Create a new subject with a fresh id and timestamps.
    pub fn new(
        name: &str,
        total_classes: u32,
        attended_classes: u32,
        minimum_attendance: u32,
    ) -> Result<Self> {
        let name = name.trim();
        check_fields(name, total_classes, attended_classes, minimum_attendance)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            total_classes,
            attended_classes,
            minimum_attendance,
            created_at: now,
            updated_at: now,
        })
    }

    /// Classes missed so far
    #[must_use]
    pub const fn missed_classes(&self) -> u32 {
        self.total_classes.saturating_sub(self.attended_classes)
    }

    /// Whether the record satisfies the counter and threshold invariants.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        check_fields(
            &self.name,
            self.total_classes,
            self.attended_classes,
            self.minimum_attendance,
        )
        .is_ok()
    }

    /// Record an attended class.
    pub fn record_attended(&mut self) {
        self.total_classes = self.total_classes.saturating_add(1);
        self.attended_classes = self.attended_classes.saturating_add(1);
        self.touch();
    }

    /// Record a missed class.
    pub fn record_missed(&mut self) {
        self.total_classes = self.total_classes.saturating_add(1);
        self.touch();
    }

    /// Take back one attended class. Returns `false` if there is none.
    pub fn undo_attended(&mut self) -> bool {
        if self.attended_classes == 0 || self.total_classes == 0 {
            return false;
        }
        self.attended_classes -= 1;
        self.total_classes -= 1;
        self.touch();
        true
    }

    /// Take back one missed class. Returns `false` if there is none.
    pub fn undo_missed(&mut self) -> bool {
        if self.missed_classes() == 0 {
            return false;
        }
        self.total_classes -= 1;
        self.touch();
        true
    }

    /// Apply an edit, keeping `id` and `created_at`.
    ///
    /// The subject is left untouched if the result would be invalid.
    pub fn edit(&mut self, edit: SubjectEdit) -> Result<()> {
        let name = edit
            .name
            .as_deref()
            .map_or_else(|| self.name.clone(), |n| n.trim().to_string());
        let total = edit.total_classes.unwrap_or(self.total_classes);
        let attended = edit.attended_classes.unwrap_or(self.attended_classes);
        let minimum = edit.minimum_attendance.unwrap_or(self.minimum_attendance);

        check_fields(&name, total, attended, minimum)?;

        self.name = name;
        self.total_classes = total;
        self.attended_classes = attended;
        self.minimum_attendance = minimum;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn check_fields(name: &str, total: u32, attended: u32, minimum: u32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_subject("name must not be empty"));
    }
    if attended > total {
        return Err(Error::invalid_subject(format!(
            "attended classes ({attended}) exceed total classes ({total})"
        )));
    }
    if minimum > 100 {
        return Err(Error::invalid_subject(format!(
            "minimum attendance must be between 0 and 100, got {minimum}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_stamps() {
        let subject = Subject::new("  Mathematics ", 10, 8, 75).unwrap();
        assert_eq!(subject.name, "Mathematics");
        assert_eq!(subject.created_at, subject.updated_at);
        assert_eq!(subject.id.len(), 32);
        assert_eq!(subject.missed_classes(), 2);
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert!(Subject::new("   ", 0, 0, 75).is_err());
        assert!(Subject::new("Physics", 3, 4, 75).is_err());
        assert!(Subject::new("Physics", 3, 2, 101).is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Subject::new("A", 0, 0, 75).unwrap();
        let b = Subject::new("B", 0, 0, 75).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_record_and_undo() {
        let mut subject = Subject::new("Chemistry", 0, 0, 75).unwrap();
        let created = subject.created_at;

        subject.record_attended();
        subject.record_attended();
        subject.record_missed();
        assert_eq!(subject.total_classes, 3);
        assert_eq!(subject.attended_classes, 2);

        assert!(subject.undo_missed());
        assert!(!subject.undo_missed());
        assert_eq!(subject.total_classes, 2);

        assert!(subject.undo_attended());
        assert!(subject.undo_attended());
        assert!(!subject.undo_attended());
        assert_eq!(subject.total_classes, 0);
        assert_eq!(subject.attended_classes, 0);

        assert_eq!(subject.created_at, created);
        assert!(subject.updated_at >= created);
    }

    #[test]
    fn test_edit_keeps_identity() {
        let mut subject = Subject::new("Biology", 4, 3, 75).unwrap();
        let id = subject.id.clone();
        let created = subject.created_at;

        subject
            .edit(SubjectEdit {
                name: Some(" Advanced Biology ".to_string()),
                minimum_attendance: Some(80),
                ..SubjectEdit::default()
            })
            .unwrap();

        assert_eq!(subject.id, id);
        assert_eq!(subject.created_at, created);
        assert_eq!(subject.name, "Advanced Biology");
        assert_eq!(subject.minimum_attendance, 80);
        assert_eq!(subject.total_classes, 4);
    }

    #[test]
    fn test_invalid_edit_leaves_subject_unchanged() {
        let mut subject = Subject::new("History", 4, 3, 75).unwrap();
        let before = subject.clone();

        let result = subject.edit(SubjectEdit {
            attended_classes: Some(9),
            ..SubjectEdit::default()
        });

        assert!(result.is_err());
        assert_eq!(subject, before);
    }

    #[test]
    fn test_json_field_names() {
        let subject = Subject::new("Art", 2, 1, 60).unwrap();
        let value = serde_json::to_value(&subject).unwrap();
        for field in [
            "id",
            "name",
            "totalClasses",
            "attendedClasses",
            "minimumAttendance",
            "createdAt",
            "updatedAt",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_parses_browser_timestamps() {
        let subject: Subject = serde_json::from_str(
            r#"{
                "id": "k3j9x0a1b",
                "name": "Economics",
                "totalClasses": 12,
                "attendedClasses": 9,
                "minimumAttendance": 75,
                "createdAt": "2024-01-15T09:30:00.000Z",
                "updatedAt": "2024-02-01T10:00:00.000Z"
            }"#,
        )
        .unwrap();
        assert_eq!(subject.id, "k3j9x0a1b");
        assert!(subject.updated_at > subject.created_at);
    }
}
