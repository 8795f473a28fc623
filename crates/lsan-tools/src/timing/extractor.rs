use super::events::EventTable;
use super::TimingError;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SUBJECT_PREFIX: &str = "sub-";

/// One events file belonging to a subject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventFile {
    pub run: u32,
    pub path: PathBuf,
}

/// What to extract from a BIDS dataset.
#[derive(Debug, Clone)]
pub struct TimingRequest {
    pub task: String,
    /// Subject labels with or without the `sub-` prefix. Empty means every
    /// subject found under the dataset root.
    pub subjects: Vec<String>,
    /// Trial-type columns. Empty means every column after `onset` and `duration`.
    pub trial_types: Vec<String>,
    pub trim_seconds: f64,
}

impl TimingRequest {
    pub fn new(task: impl Into<String>, trim_seconds: f64) -> Self {
        Self {
            task: task.into(),
            subjects: Vec::new(),
            trial_types: Vec::new(),
            trim_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub onset: f64,
    pub duration: f64,
}

/// Events of one condition, one entry per run in [`SubjectTiming::runs`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionTiming {
    pub condition: String,
    pub runs: Vec<Vec<TimedEvent>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialTypeTiming {
    pub column: String,
    /// Sorted by condition label.
    pub conditions: Vec<ConditionTiming>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTiming {
    /// Label without the `sub-` prefix.
    pub subject: String,
    pub runs: Vec<u32>,
    pub trial_types: Vec<TrialTypeTiming>,
}

impl SubjectTiming {
    pub fn trial_type(&self, column: &str) -> Option<&TrialTypeTiming> {
        self.trial_types.iter().find(|timing| timing.column == column)
    }
}

impl TrialTypeTiming {
    pub fn condition(&self, condition: &str) -> Option<&ConditionTiming> {
        self.conditions
            .iter()
            .find(|timing| timing.condition == condition)
    }
}

/// Map every `sub-<id>` directory under `root` to its events files for `task`,
/// sorted by run.
pub fn discover(
    root: &Path,
    task: &str,
) -> Result<BTreeMap<String, Vec<EventFile>>, TimingError> {
    let entries = read_dir(root)?;
    let mut layout = BTreeMap::new();

    for path in entries {
        if !path.is_dir() {
            continue;
        }
        let Some(subject) = file_name(&path).and_then(|name| name.strip_prefix(SUBJECT_PREFIX))
        else {
            continue;
        };

        let mut files = Vec::new();
        collect_event_files(&path, task, &mut files)?;
        files.sort();
        debug!(subject, files = files.len(), "discovered events files");
        layout.insert(subject.to_string(), files);
    }

    Ok(layout)
}

fn collect_event_files(
    dir: &Path,
    task: &str,
    files: &mut Vec<EventFile>,
) -> Result<(), TimingError> {
    let task_entity = format!("_task-{task}_");
    for path in read_dir(dir)? {
        if path.is_dir() {
            collect_event_files(&path, task, files)?;
            continue;
        }
        let Some(name) = file_name(&path) else {
            continue;
        };
        if name.contains(&task_entity) && name.ends_with("events.tsv") {
            files.push(EventFile {
                run: run_number(name),
                path,
            });
        }
    }
    Ok(())
}

/// `run-<n>` entity of a BIDS file name; files without one are run 1.
pub fn run_number(file_name: &str) -> u32 {
    file_name
        .split('_')
        .find_map(|entity| entity.strip_prefix("run-"))
        .and_then(|run| run.parse().ok())
        .unwrap_or(1)
}

fn read_dir(dir: &Path) -> Result<Vec<PathBuf>, TimingError> {
    let io_error = |source| TimingError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        paths.push(entry.map_err(io_error)?.path());
    }
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// Collect onsets and durations per subject, trial-type column, condition and run.
pub fn extract(root: &Path, request: &TimingRequest) -> Result<Vec<SubjectTiming>, TimingError> {
    let mut layout = discover(root, &request.task)?;

    let subjects: Vec<String> = if request.subjects.is_empty() {
        layout.keys().cloned().collect()
    } else {
        request
            .subjects
            .iter()
            .map(|subject| {
                let label = subject.strip_prefix(SUBJECT_PREFIX).unwrap_or(subject);
                if layout.contains_key(label) {
                    Ok(label.to_string())
                } else {
                    Err(TimingError::UnknownSubject {
                        subject: label.to_string(),
                        task: request.task.clone(),
                    })
                }
            })
            .collect::<Result<_, _>>()?
    };

    info!(
        task = %request.task,
        subjects = subjects.len(),
        "extracting event timing"
    );

    let mut timings = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let files = layout.remove(&subject).unwrap_or_default();
        if files.is_empty() {
            warn!(subject = %subject, task = %request.task, "no events files; skipping subject");
            continue;
        }
        timings.push(extract_subject(subject, &files, request)?);
    }

    Ok(timings)
}

fn extract_subject(
    subject: String,
    files: &[EventFile],
    request: &TimingRequest,
) -> Result<SubjectTiming, TimingError> {
    let tables = files
        .iter()
        .map(|file| EventTable::from_path(&file.path))
        .collect::<Result<Vec<_>, _>>()?;

    let columns: Vec<String> = if request.trial_types.is_empty() {
        let mut seen = BTreeSet::new();
        tables
            .iter()
            .flat_map(EventTable::trial_type_columns)
            .filter(|column| seen.insert(column.to_string()))
            .map(str::to_string)
            .collect()
    } else {
        for table in &tables {
            for column in &request.trial_types {
                if table.trial_type(column).is_none() {
                    return Err(TimingError::MissingColumn {
                        path: table.source().to_path_buf(),
                        column: column.clone(),
                    });
                }
            }
        }
        request.trial_types.clone()
    };

    let trial_types = columns
        .into_iter()
        .map(|column| trial_type_timing(column, &tables, request.trim_seconds))
        .collect();

    Ok(SubjectTiming {
        subject,
        runs: files.iter().map(|file| file.run).collect(),
        trial_types,
    })
}

fn trial_type_timing(
    column: String,
    tables: &[EventTable],
    trim_seconds: f64,
) -> TrialTypeTiming {
    let conditions: BTreeSet<&str> = tables
        .iter()
        .filter_map(|table| table.trial_type(&column))
        .flat_map(|values| values.iter().flatten().map(String::as_str))
        .collect();

    let conditions = conditions
        .into_iter()
        .map(|condition| ConditionTiming {
            condition: condition.to_string(),
            runs: tables
                .iter()
                .map(|table| run_events(table, &column, condition, trim_seconds))
                .collect(),
        })
        .collect();

    TrialTypeTiming { column, conditions }
}

fn run_events(
    table: &EventTable,
    column: &str,
    condition: &str,
    trim_seconds: f64,
) -> Vec<TimedEvent> {
    let Some(values) = table.trial_type(column) else {
        return Vec::new();
    };
    values
        .iter()
        .zip(table.onsets().iter().zip(table.durations()))
        .filter(|(value, _)| value.as_deref() == Some(condition))
        .map(|(_, (onset, duration))| TimedEvent {
            onset: onset - trim_seconds,
            duration: *duration,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_number_defaults_to_one() {
        assert_eq!(run_number("sub-01_task-ug_run-02_events.tsv"), 2);
        assert_eq!(run_number("sub-01_task-ug_events.tsv"), 1);
        assert_eq!(run_number("sub-01_task-ug_run-x_events.tsv"), 1);
    }
}
