//! `.xlsx` workbooks as an alternative to delimited text.
//!
//! Reading goes through `calamine`, writing through `rust_xlsxwriter`. Cells
//! cross the boundary as text on the way in, so a workbook and the CSV export
//! of the same sheet load into identical response tables.

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether `path` names a workbook rather than delimited text.
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("xlsx"))
}

/// Default sheet name for an output workbook: the file stem, as Excel caps
/// sheet names at 31 characters.
pub fn default_sheet_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem.chars().take(31).collect();
    if name.is_empty() {
        "Sheet1".to_string()
    } else {
        name
    }
}

#[derive(Debug)]
pub(crate) struct SheetContents {
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<Vec<Option<String>>>,
}

/// First row of the sheet is the header; `sheet: None` reads the first sheet.
pub(crate) fn read_sheet(
    path: &Path,
    sheet: Option<&str>,
) -> Result<SheetContents, SpreadsheetError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| SpreadsheetError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let names = workbook.sheet_names();
    let sheet = match sheet {
        Some(wanted) if names.iter().any(|name| name == wanted) => wanted.to_string(),
        Some(wanted) => {
            return Err(SpreadsheetError::MissingSheet {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })
        }
        None => names
            .first()
            .cloned()
            .ok_or_else(|| SpreadsheetError::NoSheets {
                path: path.to_path_buf(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|source| SpreadsheetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| SpreadsheetError::EmptySheet {
            path: path.to_path_buf(),
            sheet: sheet.clone(),
        })?
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    let rows: Vec<Vec<Option<String>>> = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    debug!(path = %path.display(), sheet = %sheet, rows = rows.len(), "read worksheet");
    Ok(SheetContents { header, rows })
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(text) => text.trim().to_string(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// One cell of an output sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SheetValue<'a> {
    Number(f64),
    Text(&'a str),
    Empty,
}

/// Write a single-sheet workbook: `header` on the first row, then `rows`.
pub(crate) fn write_sheet<'a>(
    path: &Path,
    sheet: &str,
    header: &[&str],
    rows: impl IntoIterator<Item = Vec<SheetValue<'a>>>,
) -> Result<(), SpreadsheetError> {
    let write_error = |source| SpreadsheetError::Write {
        path: path.to_path_buf(),
        source,
    };
    let too_large = || SpreadsheetError::TooLarge {
        path: path.to_path_buf(),
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).map_err(write_error)?;

    for (col, name) in header.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| too_large())?;
        worksheet.write_string(0, col, *name).map_err(write_error)?;
    }

    for (index, values) in rows.into_iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| too_large())?;
        for (col, value) in values.into_iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| too_large())?;
            match value {
                SheetValue::Number(number) => {
                    worksheet.write_number(row, col, number).map_err(write_error)?;
                }
                SheetValue::Text(text) => {
                    worksheet.write_string(row, col, text).map_err(write_error)?;
                }
                SheetValue::Empty => {}
            }
        }
    }

    workbook.save(path).map_err(write_error)?;
    debug!(path = %path.display(), sheet, "wrote worksheet");
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("failed to read workbook {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: calamine::XlsxError,
    },
    #[error("workbook {} has no sheet named '{sheet}'", path.display())]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("workbook {} contains no sheets", path.display())]
    NoSheets { path: PathBuf },
    #[error("sheet '{sheet}' of {} has no header row", path.display())]
    EmptySheet { path: PathBuf, sheet: String },
    #[error("failed to write workbook {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: rust_xlsxwriter::XlsxError,
    },
    #[error("table is too large for a worksheet in {}", path.display())]
    TooLarge { path: PathBuf },
}
