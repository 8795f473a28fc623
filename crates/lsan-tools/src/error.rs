use crate::config::ConfigError;
use crate::maths::MathsError;
use crate::survey::{DefinitionError, ScoringError, SelectionError, SpreadsheetError, TableError};
use crate::telemetry::TelemetryError;
use crate::timing::TimingError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Table(TableError),
    Definition(DefinitionError),
    Scoring(ScoringError),
    Selection(SelectionError),
    Timing(TimingError),
    Maths(MathsError),
    Output(csv::Error),
    Spreadsheet(SpreadsheetError),
    Json(serde_json::Error),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Table(err) => write!(f, "table error: {}", err),
            AppError::Definition(err) => write!(f, "definition error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring error: {}", err),
            AppError::Selection(err) => write!(f, "selection error: {}", err),
            AppError::Timing(err) => write!(f, "timing error: {}", err),
            AppError::Maths(err) => write!(f, "maths error: {}", err),
            AppError::Output(err) => write!(f, "output error: {}", err),
            AppError::Spreadsheet(err) => write!(f, "spreadsheet error: {}", err),
            AppError::Json(err) => write!(f, "json error: {}", err),
            AppError::Usage(message) => write!(f, "usage error: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Table(err) => Some(err),
            AppError::Definition(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Selection(err) => Some(err),
            AppError::Timing(err) => Some(err),
            AppError::Maths(err) => Some(err),
            AppError::Output(err) => Some(err),
            AppError::Spreadsheet(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<TableError> for AppError {
    fn from(value: TableError) -> Self {
        Self::Table(value)
    }
}

impl From<DefinitionError> for AppError {
    fn from(value: DefinitionError) -> Self {
        Self::Definition(value)
    }
}

impl From<ScoringError> for AppError {
    fn from(value: ScoringError) -> Self {
        Self::Scoring(value)
    }
}

impl From<SelectionError> for AppError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

impl From<TimingError> for AppError {
    fn from(value: TimingError) -> Self {
        Self::Timing(value)
    }
}

impl From<MathsError> for AppError {
    fn from(value: MathsError) -> Self {
        Self::Maths(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Output(value)
    }
}

impl From<SpreadsheetError> for AppError {
    fn from(value: SpreadsheetError) -> Self {
        Self::Spreadsheet(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
