//! Display utilities for formatting attendance output.
//!
//! This module provides the formatting functions used by the CLI
//! for showing subjects and their attendance in the terminal.
//!
//! # Functions
//!
//! - [`truncate`] - Truncate strings to a maximum length with ellipsis
//! - [`make_bar`] - Create visual bar charts for percentages
//! - [`format_age`] - Describe how long ago a timestamp was
//! - [`print_section`] / [`print_section_simple`] - Print section headers
//! - [`display_subjects`] / [`display_subject`] / [`display_summary`] - Display formatted stats

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::attendance::{advisory_message, compute_stats, Summary};
use crate::subject::Subject;

/// Truncate a string to a maximum length, adding "..." if truncated.
///
/// Counts characters rather than bytes.
/// For `max_len < 3`, truncates without ellipsis since there's no room for "...".
///
/// # Examples
///
/// ```
/// use bunkmate::display::truncate;
///
/// assert_eq!(truncate("hello", 10), "hello");
/// assert_eq!(truncate("hello world", 8), "hello...");
/// assert_eq!(truncate("hello", 2), "he");
/// ```
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len < 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

/// Create a visual bar for a percentage.
///
/// Values outside 0-100 are clamped.
///
/// # Examples
///
/// ```
/// use bunkmate::display::make_bar;
///
/// assert_eq!(make_bar(50.0, 4), "██░░");
/// assert_eq!(make_bar(0.0, 3), "░░░");
/// ```
pub fn make_bar(percentage: f64, width: usize) -> String {
    let ratio = (percentage / 100.0).clamp(0.0, 1.0);
    let filled = (ratio * width as f64) as usize;
    let empty = width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Describe how long ago `time` was, at the coarsest useful unit.
pub fn format_age(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - time).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let secs = secs.unsigned_abs();
    let unit = match secs {
        0..=3_599 => 60,
        3_600..=86_399 => 3_600,
        _ => 86_400,
    };
    let rounded = Duration::from_secs(secs - secs % unit);
    format!("{} ago", humantime::format_duration(rounded))
}

/// Print a section header with equals signs.
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(50));
    println!("  {title}");
    println!("{}", "=".repeat(50));
}

/// Print a simple section header with dashes.
pub fn print_section_simple(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(30));
}

/// Display all subjects as a table.
pub fn display_subjects(subjects: &[Subject]) {
    for (i, subject) in subjects.iter().enumerate() {
        let stats = compute_stats(subject);
        println!(
            "  {:>2}. {:<24} {} {:>6.2}%  {:>3}/{:<3} min {:>3}%  {}",
            i + 1,
            truncate(&subject.name, 24),
            make_bar(stats.percentage, 20),
            stats.percentage,
            subject.attended_classes,
            subject.total_classes,
            subject.minimum_attendance,
            stats.status(),
        );
        println!("      {}", advisory_message(&stats));
    }
}

/// Display one subject in detail.
pub fn display_subject(subject: &Subject) {
    let stats = compute_stats(subject);
    let now = Utc::now();

    println!("  Name:          {}", subject.name);
    println!("  Id:            {}", subject.id);
    println!(
        "  Attendance:    {:.2}% {}",
        stats.percentage,
        make_bar(stats.percentage, 25)
    );
    println!("  Attended:      {}", subject.attended_classes);
    println!("  Missed:        {}", subject.missed_classes());
    println!("  Total:         {}", subject.total_classes);
    println!("  Minimum:       {}%", subject.minimum_attendance);
    println!("  Status:        {}", stats.status());
    println!("  Can bunk:      {}", stats.can_bunk);
    println!("  Must attend:   {}", stats.must_attend);
    println!("  Created:       {}", format_age(subject.created_at, now));
    println!("  Updated:       {}", format_age(subject.updated_at, now));
    println!("\n  {}", advisory_message(&stats));
}

/// Display the overall summary line.
pub fn display_summary(summary: &Summary) {
    println!(
        "  Overall: {:.2}% ({}/{} classes across {} subject{}), {} at risk",
        summary.percentage,
        summary.attended_classes,
        summary.total_classes,
        summary.subjects,
        if summary.subjects == 1 { "" } else { "s" },
        summary.at_risk,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate("Mathématiques avancées", 10), "Mathéma...");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn test_make_bar_clamps() {
        assert_eq!(make_bar(150.0, 4), "████");
        assert_eq!(make_bar(-5.0, 4), "░░░░");
        assert_eq!(make_bar(75.0, 4), "███░");
    }

    #[test]
    fn test_format_age() {
        let now = Utc::now();
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(
            format_age(now - chrono::Duration::seconds(150), now),
            "2m ago"
        );
        assert_eq!(
            format_age(now - chrono::Duration::minutes(130), now),
            "2h ago"
        );
        assert_eq!(
            format_age(now - chrono::Duration::hours(50), now),
            "2days ago"
        );
        // Clock skew
        assert_eq!(
            format_age(now + chrono::Duration::minutes(5), now),
            "just now"
        );
    }
}
