use super::spreadsheet::{self, SheetValue, SpreadsheetError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Row key of a response table. Numeric IDs are kept in their textual form so
/// `0101` and `101` stay distinct subjects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u32> for SubjectId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

/// Subject-by-column table of raw survey answers.
///
/// Cells are stored as trimmed text with empty cells as `None`; item columns
/// are parsed to numbers only when an instrument is scored, so demographic or
/// free-text columns can travel alongside the items.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTable {
    index_name: String,
    subjects: Vec<SubjectId>,
    columns: Vec<String>,
    cells: Vec<Vec<Option<String>>>,
    positions: HashMap<String, usize>,
}

impl ResponseTable {
    pub fn new<N>(
        index_name: impl Into<String>,
        subjects: Vec<SubjectId>,
        columns: impl IntoIterator<Item = (N, Vec<Option<String>>)>,
    ) -> Result<Self, TableError>
    where
        N: Into<String>,
    {
        let mut seen = HashSet::with_capacity(subjects.len());
        for subject in &subjects {
            if !seen.insert(subject) {
                return Err(TableError::DuplicateSubject(subject.clone()));
            }
        }

        let mut names = Vec::new();
        let mut cells = Vec::new();
        let mut positions = HashMap::new();
        for (name, values) in columns {
            let name = name.into();
            if values.len() != subjects.len() {
                return Err(TableError::RaggedColumn {
                    column: name,
                    expected: subjects.len(),
                    actual: values.len(),
                });
            }
            if positions.insert(name.clone(), names.len()).is_some() {
                return Err(TableError::DuplicateColumn(name));
            }
            names.push(name);
            cells.push(values);
        }

        Ok(Self {
            index_name: index_name.into(),
            subjects,
            columns: names,
            cells,
            positions,
        })
    }

    /// Read a delimited table, using `index_column` as the subject key.
    pub fn from_reader<R: Read>(
        reader: R,
        index_column: &str,
        delimiter: u8,
    ) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_string()))
                    .collect(),
            );
        }

        Self::from_rows(index_column, header, rows)
    }

    /// Read one worksheet of an `.xlsx` workbook; `sheet: None` takes the
    /// first sheet. The first row is the header, as in a delimited export.
    pub fn from_xlsx(
        path: impl AsRef<Path>,
        sheet: Option<&str>,
        index_column: &str,
    ) -> Result<Self, TableError> {
        let contents = spreadsheet::read_sheet(path.as_ref(), sheet)?;
        Self::from_rows(index_column, contents.header, contents.rows)
    }

    fn from_rows(
        index_column: &str,
        header: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, TableError> {
        let index_position = header
            .iter()
            .position(|name| name == index_column)
            .ok_or_else(|| TableError::MissingIndexColumn {
                column: index_column.to_string(),
            })?;

        let mut subjects = Vec::with_capacity(rows.len());
        let mut values: Vec<Vec<Option<String>>> =
            vec![Vec::with_capacity(rows.len()); header.len()];

        for (row, mut fields) in rows.into_iter().enumerate() {
            fields.resize(header.len(), None);
            let subject = fields[index_position]
                .take()
                .ok_or(TableError::EmptySubjectId { row: row + 1 })?;
            subjects.push(SubjectId::new(subject));

            for (position, field) in fields.into_iter().enumerate() {
                if position != index_position {
                    values[position].push(field);
                }
            }
        }

        let columns = header
            .into_iter()
            .zip(values)
            .enumerate()
            .filter(|(position, _)| *position != index_position)
            .map(|(_, column)| column);

        Self::new(index_column, subjects, columns)
    }

    pub fn from_path(
        path: impl AsRef<Path>,
        index_column: &str,
        delimiter: u8,
    ) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, index_column, delimiter)
    }

    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<(), TableError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_name.as_str());
        header.extend(self.columns.iter().map(String::as_str));
        csv_writer.write_record(&header)?;

        for (row, subject) in self.subjects.iter().enumerate() {
            let mut record = Vec::with_capacity(self.columns.len() + 1);
            record.push(subject.as_str());
            record.extend(
                self.cells
                    .iter()
                    .map(|column| column[row].as_deref().unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table as a single-sheet workbook.
    pub fn write_xlsx(&self, path: impl AsRef<Path>, sheet: &str) -> Result<(), TableError> {
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_name.as_str());
        header.extend(self.columns.iter().map(String::as_str));

        let rows = self.subjects.iter().enumerate().map(|(row, subject)| {
            let mut values = Vec::with_capacity(self.columns.len() + 1);
            values.push(SheetValue::Text(subject.as_str()));
            values.extend(self.cells.iter().map(|column| match column[row].as_deref() {
                Some(text) => SheetValue::Text(text),
                None => SheetValue::Empty,
            }));
            values
        });

        spreadsheet::write_sheet(path.as_ref(), sheet, &header, rows)?;
        Ok(())
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn subjects(&self) -> &[SubjectId] {
        &self.subjects
    }

    pub fn n_subjects(&self) -> usize {
        self.subjects.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn column(&self, column: &str) -> Option<&[Option<String>]> {
        self.position(column).map(|position| self.column_at(position))
    }

    pub fn column_at(&self, position: usize) -> &[Option<String>] {
        &self.cells[position]
    }

    pub fn row_of(&self, subject: &SubjectId) -> Option<usize> {
        self.subjects.iter().position(|candidate| candidate == subject)
    }

    /// Columns whose name starts with `prefix`, in table order.
    pub fn columns_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, name)| name.starts_with(prefix))
            .map(|(position, name)| (position, name.as_str()))
    }

    /// Copy of the table restricted to `rows`, in the given order.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Self {
        let subjects = rows.iter().map(|&row| self.subjects[row].clone()).collect();
        let cells = self
            .cells
            .iter()
            .map(|column| rows.iter().map(|&row| column[row].clone()).collect())
            .collect();

        Self {
            index_name: self.index_name.clone(),
            subjects,
            columns: self.columns.clone(),
            cells,
            positions: self.positions.clone(),
        }
    }

    /// Same rows under a new set of subject labels.
    pub(crate) fn relabel(&self, subjects: Vec<SubjectId>) -> Self {
        debug_assert_eq!(subjects.len(), self.subjects.len());
        Self {
            subjects,
            ..self.clone()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid delimited data: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write table: {0}")]
    Write(#[from] std::io::Error),
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
    #[error("index column '{column}' not found in header")]
    MissingIndexColumn { column: String },
    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),
    #[error("subject '{0}' appears more than once")]
    DuplicateSubject(SubjectId),
    #[error("data row {row} has an empty subject identifier")]
    EmptySubjectId { row: usize },
    #[error("column '{column}' has {actual} values but the table has {expected} subjects")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
}
