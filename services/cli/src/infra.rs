use crate::cli::OutputFormat;
use lsan_tools::config::{self, AppConfig};
use lsan_tools::error::AppError;
use lsan_tools::survey::{
    default_sheet_name, is_spreadsheet, BoundsPolicy, Instrument, JoinedResult, ResponseTable,
    SubjectSelector,
};
use lsan_tools::telemetry;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Load configuration and install tracing before any command runs.
pub(crate) fn bootstrap() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(environment = ?config.environment, "configuration loaded");
    Ok(config)
}

pub(crate) fn parse_instrument(raw: &str) -> Result<Instrument, String> {
    Instrument::from_name(raw).ok_or_else(|| {
        let known: Vec<&str> = Instrument::ALL
            .iter()
            .map(|instrument| instrument.default_scale_name())
            .collect();
        format!("unknown instrument (expected one of {})", known.join(", "))
    })
}

/// `<instrument>=<column prefix>`
pub(crate) fn parse_scale_name(raw: &str) -> Result<(Instrument, String), String> {
    let (instrument, prefix) = raw
        .split_once('=')
        .ok_or_else(|| "expected <instrument>=<column prefix>".to_string())?;
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err("column prefix must not be empty".to_string());
    }
    Ok((parse_instrument(instrument)?, prefix.to_string()))
}

pub(crate) fn parse_separator(raw: &str) -> Result<u8, String> {
    config::parse_separator(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_bounds(raw: &str) -> Result<BoundsPolicy, String> {
    BoundsPolicy::parse(raw).ok_or_else(|| "expected 'strict' or 'unchecked'".to_string())
}

/// Load a survey export, choosing the reader from the file extension. `sheet`
/// is ignored for delimited input.
pub(crate) fn read_responses(
    input: &Path,
    sheet: Option<&str>,
    index_column: &str,
    separator: u8,
) -> Result<ResponseTable, AppError> {
    let responses = if is_spreadsheet(input) {
        ResponseTable::from_xlsx(input, sheet, index_column)?
    } else {
        ResponseTable::from_path(input, index_column, separator)?
    };
    info!(
        path = %input.display(),
        subjects = responses.n_subjects(),
        columns = responses.column_names().len(),
        "loaded survey responses"
    );
    Ok(responses)
}

/// `--subjects` goes through [`SubjectSelector::parse`]; `--subjects-file` is
/// always read as an ID file.
pub(crate) fn subject_selector(
    subjects: Option<&str>,
    subjects_file: Option<&Path>,
) -> Result<Option<SubjectSelector>, AppError> {
    match (subjects, subjects_file) {
        (Some(raw), _) => Ok(Some(SubjectSelector::parse(raw)?)),
        (None, Some(path)) => Ok(Some(SubjectSelector::File(path.to_path_buf()))),
        (None, None) => Ok(None),
    }
}

/// An explicit `--format` wins; otherwise an `.xlsx` destination picks xlsx.
pub(crate) fn resolve_format(format: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    match (format, output) {
        (Some(format), _) => format,
        (None, Some(path)) if is_spreadsheet(path) => OutputFormat::Xlsx,
        (None, _) => OutputFormat::Csv,
    }
}

/// Write a joined result to `output`, or to stdout when no path is given.
pub(crate) fn write_joined(
    joined: &JoinedResult,
    output: Option<&Path>,
    format: OutputFormat,
    separator: u8,
    sheet: Option<&str>,
) -> Result<(), AppError> {
    match (output, format) {
        (None, OutputFormat::Xlsx) => Err(AppError::Usage(
            "--format xlsx needs an --output path".to_string(),
        )),
        (Some(path), OutputFormat::Xlsx) => {
            let sheet = sheet.map_or_else(|| default_sheet_name(path), str::to_string);
            joined.write_xlsx(path, &sheet)?;
            info!(
                path = %path.display(),
                sheet = %sheet,
                rows = joined.n_rows(),
                "wrote scored workbook"
            );
            Ok(())
        }
        (Some(path), _) => {
            let mut writer = BufWriter::new(File::create(path)?);
            render_joined(joined, &mut writer, format, separator)?;
            writer.flush()?;
            info!(path = %path.display(), rows = joined.n_rows(), "wrote scored output");
            Ok(())
        }
        (None, _) => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            render_joined(joined, &mut writer, format, separator)?;
            writer.flush()?;
            Ok(())
        }
    }
}

fn render_joined<W: Write>(
    joined: &JoinedResult,
    writer: &mut W,
    format: OutputFormat,
    separator: u8,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Csv => joined.write_delimited(writer, separator)?,
        OutputFormat::Json => {
            writer.write_all(joined.to_json()?.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        OutputFormat::Xlsx => {
            return Err(AppError::Usage(
                "xlsx output is written to a file, not a stream".to_string(),
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_joined() -> JoinedResult {
        let table = ResponseTable::from_reader(
            std::io::Cursor::new("subject_id,age\n101,24\n"),
            "subject_id",
            b',',
        )
        .expect("table parses");
        let mut engine = lsan_tools::survey::ScoringEngine::new(table);
        engine.retain_items(None).expect("retains");
        engine.join().expect("joins")
    }

    #[test]
    fn scale_name_splits_on_equals() {
        assert_eq!(
            parse_scale_name("iri = iri_followup").expect("parses"),
            (Instrument::Iri, "iri_followup".to_string())
        );
        assert!(parse_scale_name("iri=").is_err());
    }

    #[test]
    fn output_extension_picks_workbook_format() {
        let workbook = Path::new("scores.xlsx");
        assert_eq!(resolve_format(None, Some(workbook)), OutputFormat::Xlsx);
        assert_eq!(resolve_format(None, Some(Path::new("scores.tsv"))), OutputFormat::Csv);
        assert_eq!(resolve_format(None, None), OutputFormat::Csv);
        assert_eq!(
            resolve_format(Some(OutputFormat::Json), Some(workbook)),
            OutputFormat::Json
        );
    }

    #[test]
    fn workbook_output_needs_a_path() {
        let joined = sample_joined();
        assert!(matches!(
            write_joined(&joined, None, OutputFormat::Xlsx, b',', None),
            Err(AppError::Usage(_))
        ));
    }

    #[test]
    fn bare_subject_id_is_not_read_as_a_file() {
        let selector = subject_selector(Some("101"), None).expect("parses");
        assert_eq!(selector, Some(SubjectSelector::Ids(vec!["101".into()])));
        let from_file =
            subject_selector(None, Some(Path::new("101"))).expect("file selector");
        assert_eq!(from_file, Some(SubjectSelector::File(PathBuf::from("101"))));
    }

    #[test]
    fn bounds_accepts_known_policies() {
        assert_eq!(parse_bounds("Unchecked"), Ok(BoundsPolicy::Unchecked));
        assert!(parse_bounds("loose").is_err());
    }
}
