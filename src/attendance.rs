//! Attendance calculations
//!
//! Derives the attendance percentage of a subject and projects how many
//! classes can still be skipped, or must be attended in a row, to stay at or
//! get back to the required threshold.
//!
//! Threshold comparisons are done on exact integer ratios. The percentage
//! reported in [`AttendanceStats`] is rounded to two decimals for display,
//! so a subject just under its minimum can show the minimum itself while
//! still being at risk: 14999 of 20000 classes shows 75% against a 75%
//! minimum, yet 4 more classes must be attended.

use std::cmp::Ordering;
use std::fmt;

use crate::subject::Subject;

/// A projected number of classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// A finite number of classes
    Classes(u32),
    /// No finite number exists. For skips this means the threshold can never
    /// be undercut; for recovery it means the threshold can never be reached.
    Unbounded,
}

impl Projection {
    /// Whether the projection is more than zero classes
    #[must_use]
    pub const fn is_positive(self) -> bool {
        match self {
            Self::Classes(n) => n > 0,
            Self::Unbounded => true,
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::Classes(0)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classes(n) => write!(f, "{n}"),
            Self::Unbounded => write!(f, "∞"),
        }
    }
}

/// Where a subject stands relative to its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    /// Above the threshold with at least one skip to spare
    Safe,
    /// At the threshold, or above it without room for another skip
    Borderline,
    /// Below the threshold
    AtRisk,
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Safe => "safe",
            Self::Borderline => "borderline",
            Self::AtRisk => "at risk",
        };
        f.write_str(label)
    }
}

/// Derived attendance figures for one subject. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttendanceStats {
    /// Attendance percentage rounded to two decimals (0 with no classes).
    ///
    /// Display only. `is_at_risk` and the projections use the exact ratio and
    /// may disagree with a comparison against this rounded value.
    pub percentage: f64,
    /// Whether attendance is below the subject's minimum
    pub is_at_risk: bool,
    /// Classes that can still be missed without dropping below the minimum
    pub can_bunk: Projection,
    /// Consecutive classes to attend to get back to the minimum
    pub must_attend: Projection,
}

impl AttendanceStats {
    /// Classify these stats
    #[must_use]
    pub const fn status(&self) -> AttendanceStatus {
        if self.is_at_risk {
            AttendanceStatus::AtRisk
        } else if self.can_bunk.is_positive() {
            AttendanceStatus::Safe
        } else {
            AttendanceStatus::Borderline
        }
    }
}

/// Compute attendance stats for a subject.
///
/// Pure and infallible: a subject with no classes has a percentage of 0.
#[must_use]
pub fn compute_stats(subject: &Subject) -> AttendanceStats {
    let attended = u64::from(subject.attended_classes);
    let total = u64::from(subject.total_classes);
    let minimum = u64::from(subject.minimum_attendance);

    let percentage = if total == 0 {
        0.0
    } else {
        round2(attended as f64 / total as f64 * 100.0)
    };

    let against_minimum = if total == 0 {
        0u64.cmp(&minimum)
    } else {
        (100 * attended).cmp(&(minimum * total))
    };

    let can_bunk = match against_minimum {
        Ordering::Greater if minimum == 0 => Projection::Unbounded,
        Ordering::Greater => {
            let max_total = 100 * attended / minimum;
            Projection::Classes(saturate(max_total.saturating_sub(total)))
        }
        Ordering::Equal | Ordering::Less => Projection::Classes(0),
    };

    let must_attend = if against_minimum == Ordering::Less {
        classes_to_recover(attended, total, minimum)
    } else {
        Projection::Classes(0)
    };

    AttendanceStats {
        percentage,
        is_at_risk: against_minimum == Ordering::Less,
        can_bunk,
        must_attend,
    }
}

/// Smallest `x` with `(attended + x) / (total + x) >= minimum / 100`.
fn classes_to_recover(attended: u64, total: u64, minimum: u64) -> Projection {
    let deficit = minimum * total;
    let have = 100 * attended;
    if deficit <= have {
        return Projection::Classes(0);
    }
    let numerator = deficit - have;

    let denominator = 100u64.saturating_sub(minimum);
    if denominator == 0 {
        return Projection::Unbounded;
    }

    Projection::Classes(saturate(numerator.div_ceil(denominator)))
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Human readable advice for the given stats.
#[must_use]
pub fn advisory_message(stats: &AttendanceStats) -> String {
    if stats.is_at_risk && stats.must_attend.is_positive() {
        match stats.must_attend {
            Projection::Classes(n) => format!(
                "You must attend {n} more {} to reach minimum attendance",
                classes_word(n)
            ),
            Projection::Unbounded => "Minimum attendance can no longer be reached".to_string(),
        }
    } else if stats.can_bunk.is_positive() {
        match stats.can_bunk {
            Projection::Classes(n) => format!("You can bunk {n} more {}", classes_word(n)),
            Projection::Unbounded => "You can bunk any number of classes".to_string(),
        }
    } else {
        "Keep attending to maintain your percentage".to_string()
    }
}

const fn classes_word(n: u32) -> &'static str {
    if n == 1 {
        "class"
    } else {
        "classes"
    }
}

/// Attendance totals across every subject
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub subjects: usize,
    pub attended_classes: u64,
    pub total_classes: u64,
    /// Overall percentage rounded to two decimals
    pub percentage: f64,
    /// Number of subjects below their minimum
    pub at_risk: usize,
}

/// Aggregate attendance across subjects.
#[must_use]
pub fn summarize(subjects: &[Subject]) -> Summary {
    let mut summary = Summary {
        subjects: subjects.len(),
        ..Summary::default()
    };

    for subject in subjects {
        summary.attended_classes += u64::from(subject.attended_classes);
        summary.total_classes += u64::from(subject.total_classes);
        if compute_stats(subject).is_at_risk {
            summary.at_risk += 1;
        }
    }

    if summary.total_classes > 0 {
        summary.percentage =
            round2(summary.attended_classes as f64 / summary.total_classes as f64 * 100.0);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(total: u32, attended: u32, minimum: u32) -> Subject {
        let mut s = Subject::new("Test", 0, 0, 75).unwrap();
        s.total_classes = total;
        s.attended_classes = attended;
        s.minimum_attendance = minimum;
        s
    }

    fn exact_percentage(attended: u32, total: u32) -> f64 {
        f64::from(attended) / f64::from(total) * 100.0
    }

    #[test]
    fn test_perfect_attendance() {
        let stats = compute_stats(&subject(20, 20, 75));
        assert!((stats.percentage - 100.0).abs() < f64::EPSILON);
        assert!(!stats.is_at_risk);
        assert_eq!(stats.can_bunk, Projection::Classes(6));
        assert_eq!(stats.must_attend, Projection::Classes(0));
        assert_eq!(stats.status(), AttendanceStatus::Safe);
    }

    #[test]
    fn test_half_attendance() {
        let stats = compute_stats(&subject(10, 5, 75));
        assert!((stats.percentage - 50.0).abs() < f64::EPSILON);
        assert!(stats.is_at_risk);
        assert_eq!(stats.must_attend, Projection::Classes(10));
        assert_eq!(stats.can_bunk, Projection::Classes(0));
        assert_eq!(stats.status(), AttendanceStatus::AtRisk);
    }

    #[test]
    fn test_no_classes() {
        for minimum in [0, 50, 75, 100] {
            let stats = compute_stats(&subject(0, 0, minimum));
            assert!(stats.percentage.abs() < f64::EPSILON);
            assert_eq!(stats.is_at_risk, minimum > 0);
            assert_eq!(stats.can_bunk, Projection::Classes(0));
            assert_eq!(stats.must_attend, Projection::Classes(0));
        }
    }

    #[test]
    fn test_rounded_percentage_does_not_hide_risk() {
        // 74.995% rounds to 75.00 but is still below a 75% minimum
        let stats = compute_stats(&subject(20000, 14999, 75));
        assert!((stats.percentage - 75.0).abs() < f64::EPSILON);
        assert!(stats.is_at_risk);
        assert_eq!(stats.must_attend, Projection::Classes(4));
        assert_eq!(stats.can_bunk, Projection::Classes(0));
        assert_eq!(stats.status(), AttendanceStatus::AtRisk);
    }

    #[test]
    fn test_exact_threshold_cannot_bunk() {
        // 75% exactly
        let stats = compute_stats(&subject(4, 3, 75));
        assert!((stats.percentage - 75.0).abs() < f64::EPSILON);
        assert!(!stats.is_at_risk);
        assert_eq!(stats.can_bunk, Projection::Classes(0));
        assert_eq!(stats.must_attend, Projection::Classes(0));
        assert_eq!(stats.status(), AttendanceStatus::Borderline);
    }

    #[test]
    fn test_rounding() {
        let stats = compute_stats(&subject(3, 2, 50));
        assert!((stats.percentage - 66.67).abs() < 1e-9);
    }

    #[test]
    fn test_can_bunk_is_tight() {
        for total in 1..=40 {
            for attended in 0..=total {
                for minimum in [1, 33, 50, 60, 75, 85, 99] {
                    let stats = compute_stats(&subject(total, attended, minimum));
                    let Projection::Classes(bunk) = stats.can_bunk else {
                        panic!("finite threshold must give finite skips");
                    };
                    if bunk == 0 {
                        continue;
                    }
                    let min = f64::from(minimum);
                    assert!(exact_percentage(attended, total + bunk) >= min - 1e-9);
                    assert!(exact_percentage(attended, total + bunk + 1) < min);
                }
            }
        }
    }

    #[test]
    fn test_must_attend_is_tight() {
        for total in 1..=40 {
            for attended in 0..=total {
                for minimum in [1, 33, 50, 60, 75, 85, 99] {
                    let stats = compute_stats(&subject(total, attended, minimum));
                    if !stats.is_at_risk {
                        assert_eq!(stats.must_attend, Projection::Classes(0));
                        continue;
                    }
                    let Projection::Classes(x) = stats.must_attend else {
                        panic!("threshold below 100 is always reachable");
                    };
                    let min = f64::from(minimum);
                    assert!(exact_percentage(attended + x, total + x) >= min - 1e-9);
                    if x > 0 {
                        assert!(exact_percentage(attended + x - 1, total + x - 1) < min);
                    }
                }
            }
        }
    }

    #[test]
    fn test_full_threshold_unreachable_after_a_miss() {
        let stats = compute_stats(&subject(5, 4, 100));
        assert!(stats.is_at_risk);
        assert_eq!(stats.must_attend, Projection::Unbounded);
        assert_eq!(
            advisory_message(&stats),
            "Minimum attendance can no longer be reached"
        );

        let stats = compute_stats(&subject(5, 5, 100));
        assert!(!stats.is_at_risk);
        assert_eq!(stats.can_bunk, Projection::Classes(0));
    }

    #[test]
    fn test_zero_threshold_unbounded_bunks() {
        let stats = compute_stats(&subject(5, 1, 0));
        assert_eq!(stats.can_bunk, Projection::Unbounded);
        assert_eq!(advisory_message(&stats), "You can bunk any number of classes");

        let stats = compute_stats(&subject(5, 0, 0));
        assert!(!stats.is_at_risk);
        assert_eq!(stats.can_bunk, Projection::Classes(0));
    }

    #[test]
    fn test_advisory_messages() {
        let stats = compute_stats(&subject(10, 5, 75));
        assert_eq!(
            advisory_message(&stats),
            "You must attend 10 more classes to reach minimum attendance"
        );

        // 2/3 against 70%: one more attended gives 3/4
        let stats = compute_stats(&subject(3, 2, 70));
        assert_eq!(
            advisory_message(&stats),
            "You must attend 1 more class to reach minimum attendance"
        );

        let stats = compute_stats(&subject(20, 20, 75));
        assert_eq!(advisory_message(&stats), "You can bunk 6 more classes");

        // 4/4 against 75%: 4/5 is fine, 4/6 is not
        let stats = compute_stats(&subject(4, 4, 75));
        assert_eq!(advisory_message(&stats), "You can bunk 1 more class");

        let stats = compute_stats(&subject(4, 3, 75));
        assert_eq!(
            advisory_message(&stats),
            "Keep attending to maintain your percentage"
        );

        let stats = compute_stats(&subject(0, 0, 75));
        assert_eq!(
            advisory_message(&stats),
            "Keep attending to maintain your percentage"
        );
    }

    #[test]
    fn test_summarize() {
        let subjects = vec![subject(10, 5, 75), subject(20, 20, 75)];
        let summary = summarize(&subjects);
        assert_eq!(summary.subjects, 2);
        assert_eq!(summary.attended_classes, 25);
        assert_eq!(summary.total_classes, 30);
        assert!((summary.percentage - 83.33).abs() < 1e-9);
        assert_eq!(summary.at_risk, 1);

        assert_eq!(summarize(&[]), Summary::default());
    }
}
