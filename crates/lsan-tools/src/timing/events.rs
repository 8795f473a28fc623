use super::TimingError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// BIDS placeholder for a cell with no value.
const NOT_AVAILABLE: &str = "n/a";

/// Contents of one `*_events.tsv` file.
///
/// The first two columns are `onset` and `duration`; every later column is
/// a candidate trial-type column.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTable {
    source: PathBuf,
    onsets: Vec<f64>,
    durations: Vec<f64>,
    trial_types: Vec<(String, Vec<Option<String>>)>,
}

impl EventTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TimingError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TimingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, path)
    }

    /// `source` is only used for error messages.
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self, TimingError> {
        let csv_error = |err: csv::Error| TimingError::Csv {
            path: source.to_path_buf(),
            source: err,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let onset_at = position(&headers, "onset", source)?;
        let duration_at = position(&headers, "duration", source)?;
        let mut trial_types: Vec<(String, Vec<Option<String>>)> = headers
            .iter()
            .skip(2)
            .map(|name| (name.clone(), Vec::new()))
            .collect();

        let mut onsets = Vec::new();
        let mut durations = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_error)?;
            let number = |at: usize, column: &str| -> Result<f64, TimingError> {
                let raw = record.get(at).unwrap_or_default();
                raw.parse::<f64>().map_err(|_| TimingError::InvalidNumber {
                    path: source.to_path_buf(),
                    row: row + 1,
                    column: column.to_string(),
                    value: raw.to_string(),
                })
            };
            onsets.push(number(onset_at, "onset")?);
            durations.push(number(duration_at, "duration")?);

            for (offset, (_, values)) in trial_types.iter_mut().enumerate() {
                let cell = record
                    .get(offset + 2)
                    .filter(|value| !value.is_empty() && *value != NOT_AVAILABLE)
                    .map(str::to_string);
                values.push(cell);
            }
        }

        Ok(Self {
            source: source.to_path_buf(),
            onsets,
            durations,
            trial_types,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    pub fn onsets(&self) -> &[f64] {
        &self.onsets
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    /// Columns after `onset` and `duration`, in file order.
    pub fn trial_type_columns(&self) -> impl Iterator<Item = &str> {
        self.trial_types.iter().map(|(name, _)| name.as_str())
    }

    pub fn trial_type(&self, column: &str) -> Option<&[Option<String>]> {
        self.trial_types
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.as_slice())
    }
}

fn position(headers: &[String], column: &str, source: &Path) -> Result<usize, TimingError> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| TimingError::MissingColumn {
            path: source.to_path_buf(),
            column: column.to_string(),
        })
}
