//! Event timing for fMRI first-level models.
//!
//! Reads BIDS `*_events.tsv` files, groups onsets by trial-type column,
//! condition and run, and writes one AFNI timing file per condition under
//! `derivatives/timing`.

mod events;
mod extractor;
mod writer;

pub use events::EventTable;
pub use extractor::{
    discover, extract, run_number, ConditionTiming, EventFile, SubjectTiming, TimedEvent,
    TimingRequest, TrialTypeTiming,
};
pub use writer::{
    check_label, render_condition, timing_dir, timing_file_name, write_timing_files, EMPTY_RUN,
    SKIPPED_COLUMN,
};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TimingError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read events file {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("{} has no '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{} row {row}: '{value}' in column '{column}' is not a number", path.display())]
    InvalidNumber {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error("label '{label}' cannot be used as part of a timing file path")]
    UnsafeLabel { label: String },
    #[error("subject '{subject}' has no data for task '{task}'")]
    UnknownSubject { subject: String, task: String },
}
