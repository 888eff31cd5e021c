//! # BunkMate
//!
//! Personal class attendance tracking.
//!
//! This crate provides:
//! - Subjects with attended/missed class counters and a minimum threshold
//! - Attendance percentage and projections: classes you can still skip, or
//!   classes you must attend in a row to get back above the threshold
//! - A local key-value store with validation, one-level backup, and recovery
//! - Snapshot export and import

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod attendance;
pub mod config;
pub mod display;
pub mod error;
pub mod store;
pub mod subject;

pub use attendance::{compute_stats, AttendanceStats, Projection};
pub use config::Config;
pub use error::{Error, Result};
pub use store::{FileStorage, MemoryStorage, Storage, SubjectStore};
pub use subject::Subject;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "bunkmate";
