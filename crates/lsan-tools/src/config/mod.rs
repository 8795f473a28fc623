use crate::survey::BoundsPolicy;
use std::env;
use std::fmt;

/// Distinguishes runtime behavior for different stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the toolkit.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub survey: SurveyConfig,
    pub timing: TimingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("LSAN_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("LSAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let index_column =
            env::var("LSAN_INDEX_COLUMN").unwrap_or_else(|_| "subject_id".to_string());
        if index_column.trim().is_empty() {
            return Err(ConfigError::EmptyIndexColumn);
        }

        let separator = parse_separator(
            &env::var("LSAN_SEPARATOR").unwrap_or_else(|_| ",".to_string()),
        )?;

        let bounds_raw = env::var("LSAN_BOUNDS_POLICY").unwrap_or_else(|_| "strict".to_string());
        let bounds = BoundsPolicy::parse(&bounds_raw)
            .ok_or(ConfigError::InvalidBoundsPolicy { value: bounds_raw })?;

        let trim_seconds = env::var("LSAN_TRIM_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .ok_or(ConfigError::InvalidTrimSeconds)?;

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            survey: SurveyConfig {
                index_column: index_column.trim().to_string(),
                separator,
                bounds,
            },
            timing: TimingConfig { trim_seconds },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Defaults for reading and writing survey tables.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub index_column: String,
    pub separator: u8,
    pub bounds: BoundsPolicy,
}

#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Seconds of dummy scans removed from every onset.
    pub trim_seconds: f64,
}

/// Accepts a single ASCII character, or `\t` / `tab` for tab-separated files.
pub fn parse_separator(value: &str) -> Result<u8, ConfigError> {
    match value {
        "\\t" | "\t" | "tab" | "TAB" => return Ok(b'\t'),
        _ => {}
    }

    match value.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'\n' && *byte != b'"' => Ok(*byte),
        _ => Err(ConfigError::InvalidSeparator {
            value: value.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyIndexColumn,
    InvalidSeparator { value: String },
    InvalidBoundsPolicy { value: String },
    InvalidTrimSeconds,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyIndexColumn => write!(f, "LSAN_INDEX_COLUMN must not be empty"),
            ConfigError::InvalidSeparator { value } => write!(
                f,
                "separator '{}' must be a single ASCII character or \\t",
                value.escape_debug()
            ),
            ConfigError::InvalidBoundsPolicy { value } => write!(
                f,
                "LSAN_BOUNDS_POLICY '{}' must be 'strict' or 'unchecked'",
                value
            ),
            ConfigError::InvalidTrimSeconds => {
                write!(f, "LSAN_TRIM_SECONDS must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
