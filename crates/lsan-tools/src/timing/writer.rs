use super::extractor::{ConditionTiming, SubjectTiming};
use super::TimingError;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reaction times are not condition labels and are never written.
pub const SKIPPED_COLUMN: &str = "response_time";

/// AFNI's marker for a run without events.
pub const EMPTY_RUN: &str = "*";

/// `<root>/derivatives/timing/sub-<id>/<column>`
pub fn timing_dir(root: &Path, subject: &str, column: &str) -> PathBuf {
    root.join("derivatives")
        .join("timing")
        .join(format!("sub-{subject}"))
        .join(column)
}

pub fn timing_file_name(subject: &str, task: &str, condition: &str) -> String {
    format!("sub-{subject}_task-{task}_timing-{condition}.txt")
}

/// Trial-type columns and condition labels come straight from the events
/// files and become path components, so they must name a single entry.
pub fn check_label(label: &str) -> Result<&str, TimingError> {
    let unsafe_label = label.is_empty()
        || label == "."
        || label == ".."
        || label.contains(['/', '\\', '\0']);
    if unsafe_label {
        return Err(TimingError::UnsafeLabel {
            label: label.to_string(),
        });
    }
    Ok(label)
}

/// One line per run of `onset:duration` pairs, each followed by a tab.
pub fn render_condition(timing: &ConditionTiming) -> String {
    let mut rendered = String::new();
    for run in &timing.runs {
        if run.is_empty() {
            rendered.push_str(EMPTY_RUN);
        }
        for event in run {
            // Writing into a String cannot fail.
            let _ = write!(rendered, "{:.6}:{:.6}\t", event.onset, event.duration);
        }
        rendered.push('\n');
    }
    rendered
}

/// Write AFNI-style timing files for every subject and return the paths written.
pub fn write_timing_files(
    root: &Path,
    task: &str,
    timings: &[SubjectTiming],
) -> Result<Vec<PathBuf>, TimingError> {
    for subject in timings {
        check_label(&subject.subject)?;
        for trial_type in &subject.trial_types {
            check_label(&trial_type.column)?;
            for condition in &trial_type.conditions {
                check_label(&condition.condition)?;
            }
        }
    }

    let mut written = Vec::new();
    for subject in timings {
        for trial_type in &subject.trial_types {
            if trial_type.column == SKIPPED_COLUMN {
                debug!(subject = %subject.subject, "skipping response_time column");
                continue;
            }

            let dir = timing_dir(root, &subject.subject, &trial_type.column);
            fs::create_dir_all(&dir).map_err(|source| TimingError::Io {
                path: dir.clone(),
                source,
            })?;

            for condition in &trial_type.conditions {
                let path = dir.join(timing_file_name(
                    &subject.subject,
                    task,
                    &condition.condition,
                ));
                fs::write(&path, render_condition(condition)).map_err(|source| {
                    TimingError::Io {
                        path: path.clone(),
                        source,
                    }
                })?;
                written.push(path);
            }
        }
    }

    info!(task, files = written.len(), "wrote timing files");
    Ok(written)
}
