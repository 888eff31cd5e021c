//! BunkMate - Main entry point
//!
//! Command line front end: loads subjects at startup, shows their
//! attendance, and saves after every change.

use std::path::PathBuf;

use bunkmate::{
    attendance::summarize,
    config::Config,
    display,
    error::{Error, Result},
    store::{FileStorage, SubjectStore},
    subject::{Subject, SubjectEdit},
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bunkmate")]
#[command(author, version, about = "Track class attendance and know how many classes you can bunk")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List subjects with their attendance
    List,

    /// Show detailed stats for one subject
    Show {
        /// Subject id or name
        subject: String,
    },

    /// Add a new subject
    Add {
        /// Subject name
        name: String,

        /// Classes held so far
        #[arg(long, default_value = "0")]
        total: u32,

        /// Classes attended so far
        #[arg(long, default_value = "0")]
        attended: u32,

        /// Minimum attendance percentage (defaults to the configured value)
        #[arg(long)]
        minimum: Option<u32>,
    },

    /// Edit a subject
    Edit {
        /// Subject id or name
        subject: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New total classes
        #[arg(long)]
        total: Option<u32>,

        /// New attended classes
        #[arg(long)]
        attended: Option<u32>,

        /// New minimum attendance percentage
        #[arg(long)]
        minimum: Option<u32>,
    },

    /// Delete a subject
    Remove {
        /// Subject id or name
        subject: String,
    },

    /// Record an attended class
    Attend {
        /// Subject id or name
        subject: String,
    },

    /// Record a missed class
    Miss {
        /// Subject id or name
        subject: String,
    },

    /// Take back the last attended class
    UndoAttend {
        /// Subject id or name
        subject: String,
    },

    /// Take back the last missed class
    UndoMiss {
        /// Subject id or name
        subject: String,
    },

    /// Export subjects and settings as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import subjects from an exported JSON file
    Import {
        /// Snapshot file
        path: PathBuf,
    },

    /// Replace subjects with the backup of the previous save
    Restore,

    /// Delete all stored data
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show or edit configuration
    Config {
        /// Print current configuration
        #[arg(long)]
        show: bool,

        /// Create default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = if let Some(ref path) = cli.config {
        Config::load_from(path)?
    } else {
        Config::load()?
    };
    config.validate()?;

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(config.general.log_level.to_lowercase())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let command = cli.command.unwrap_or(Commands::List);

    if let Commands::Config { show, init } = command {
        return run_config(&config, show, init);
    }

    let mut store = open_store(&config)?;
    let mut subjects = store.load();

    match command {
        Commands::List => list(&subjects),

        Commands::Show { subject } => {
            let index = find_subject(&subjects, &subject)?;
            display::print_section(&subjects[index].name.to_uppercase());
            display::display_subject(&subjects[index]);
        }

        Commands::Add {
            name,
            total,
            attended,
            minimum,
        } => {
            if let Some(cap) = config.limits.subject_cap() {
                if subjects.len() >= cap {
                    return Err(Error::LimitReached(cap));
                }
            }
            let minimum = minimum.unwrap_or_else(|| u32::from(config.attendance.default_minimum));
            let subject = Subject::new(&name, total, attended, minimum)?;
            subjects.push(subject);
            commit(&mut store, &subjects)?;
            show_one(&subjects[subjects.len() - 1]);
        }

        Commands::Edit {
            subject,
            name,
            total,
            attended,
            minimum,
        } => {
            let index = find_subject(&subjects, &subject)?;
            subjects[index].edit(SubjectEdit {
                name,
                total_classes: total,
                attended_classes: attended,
                minimum_attendance: minimum,
            })?;
            commit(&mut store, &subjects)?;
            println!("Updated {}", subjects[index].name);
        }

        Commands::Remove { subject } => {
            let index = find_subject(&subjects, &subject)?;
            let removed = subjects.remove(index);
            commit(&mut store, &subjects)?;
            println!("Removed {}", removed.name);
        }

        Commands::Attend { subject } => {
            let index = find_subject(&subjects, &subject)?;
            subjects[index].record_attended();
            commit(&mut store, &subjects)?;
            show_one(&subjects[index]);
        }

        Commands::Miss { subject } => {
            let index = find_subject(&subjects, &subject)?;
            subjects[index].record_missed();
            commit(&mut store, &subjects)?;
            show_one(&subjects[index]);
        }

        Commands::UndoAttend { subject } => {
            let index = find_subject(&subjects, &subject)?;
            if subjects[index].undo_attended() {
                commit(&mut store, &subjects)?;
            } else {
                println!("No attended classes to take back");
            }
            show_one(&subjects[index]);
        }

        Commands::UndoMiss { subject } => {
            let index = find_subject(&subjects, &subject)?;
            if subjects[index].undo_missed() {
                commit(&mut store, &subjects)?;
            } else {
                println!("No missed classes to take back");
            }
            show_one(&subjects[index]);
        }

        Commands::Export { output } => {
            let text = store.export_snapshot()?;
            if let Some(path) = output {
                std::fs::write(&path, text)?;
                println!("Exported {} subject(s) to {}", subjects.len(), path.display());
            } else {
                println!("{text}");
            }
        }

        Commands::Import { path } => {
            let text = std::fs::read_to_string(&path)?;
            let count = store.try_import(&text)?;
            println!("Imported {count} subject(s) from {}", path.display());
        }

        Commands::Restore => match store.restore_from_backup() {
            Some(restored) => {
                let count = store.try_save(&restored)?;
                println!("Restored {count} subject(s) from backup");
            }
            None => println!("No usable backup found"),
        },

        Commands::Clear { yes } => {
            if yes {
                store.clear_all();
                println!("All data cleared");
            } else {
                println!("This deletes all subjects and the backup. Re-run with --yes to confirm.");
            }
        }

        // Handled before the store is opened
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(config: &Config, show: bool, init: bool) -> Result<()> {
    if init {
        Config::default().save()?;
        println!(
            "Created default configuration at {}",
            Config::config_path()?.display()
        );
    } else if show {
        let contents = toml::to_string_pretty(config)?;
        println!("{contents}");
    } else {
        println!("Configuration path: {}", Config::config_path()?.display());
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<SubjectStore<FileStorage>> {
    let path = config.storage_path()?;
    tracing::debug!("Using storage at {:?}", path);
    let storage = FileStorage::new(path).with_quota(config.storage.quota_bytes);
    Ok(SubjectStore::new(storage, config.storage.store_options()))
}

/// Save after a change. On failure the change must not be reported as applied.
fn commit(store: &mut SubjectStore<FileStorage>, subjects: &[Subject]) -> Result<()> {
    store.try_save(subjects).map(|_| ())
}

/// Find a subject by exact id, or by case-insensitive name.
fn find_subject(subjects: &[Subject], key: &str) -> Result<usize> {
    if let Some(index) = subjects.iter().position(|s| s.id == key) {
        return Ok(index);
    }
    let wanted = key.trim().to_lowercase();
    subjects
        .iter()
        .position(|s| s.name.to_lowercase() == wanted)
        .ok_or_else(|| Error::SubjectNotFound(key.to_string()))
}

fn list(subjects: &[Subject]) {
    display::print_section("ATTENDANCE");

    if subjects.is_empty() {
        println!("No subjects yet.");
        println!("Add one with: bunkmate add \"Mathematics\" --minimum 75");
        return;
    }

    display::display_subjects(subjects);
    println!();
    display::display_summary(&summarize(subjects));
}

fn show_one(subject: &Subject) {
    display::print_section_simple(&subject.name);
    display::display_subject(subject);
}
