use super::spreadsheet::{self, SheetValue, SpreadsheetError};
use super::table::SubjectId;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

/// One value of a scored or retained column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Text written to a delimited file; missing values become empty fields.
    pub fn to_field(&self) -> Cow<'_, str> {
        match self {
            Cell::Number(value) => Cow::Owned(value.to_string()),
            Cell::Text(text) => Cow::Borrowed(text),
            Cell::Missing => Cow::Borrowed(""),
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::Number)
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Cell::Missing, |text| Cell::Text(text.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputColumn {
    pub name: String,
    pub values: Vec<Cell>,
}

impl OutputColumn {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Cell::from).collect(),
        }
    }

    pub fn numbers(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Cell::as_number).collect()
    }
}

/// Columns produced by one scoring (or retain) call, row-aligned with the
/// engine's response table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTable {
    pub key: String,
    pub columns: Vec<OutputColumn>,
}

impl ScoredTable {
    pub fn new(key: impl Into<String>, columns: Vec<OutputColumn>) -> Self {
        Self {
            key: key.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&OutputColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}

/// Scored tables keyed by scale name, in first-insertion order. Replacing an
/// entry keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredAccumulator {
    entries: Vec<ScoredTable>,
}

impl ScoredAccumulator {
    pub fn insert(&mut self, table: ScoredTable) -> &ScoredTable {
        let position = match self.entries.iter().position(|entry| entry.key == table.key) {
            Some(position) => {
                self.entries[position] = table;
                position
            }
            None => {
                self.entries.push(table);
                self.entries.len() - 1
            }
        };
        &self.entries[position]
    }

    pub fn get(&self, key: &str) -> Option<&ScoredTable> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredTable> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All accumulated columns side by side, one row per subject.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedResult {
    index_name: String,
    subjects: Vec<SubjectId>,
    columns: Vec<OutputColumn>,
}

impl JoinedResult {
    pub(crate) fn new(
        index_name: String,
        subjects: Vec<SubjectId>,
        columns: Vec<OutputColumn>,
    ) -> Self {
        Self {
            index_name,
            subjects,
            columns,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn subjects(&self) -> &[SubjectId] {
        &self.subjects
    }

    pub fn n_rows(&self) -> usize {
        self.subjects.len()
    }

    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&OutputColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn value(&self, subject: &SubjectId, column: &str) -> Option<&Cell> {
        let row = self.subjects.iter().position(|candidate| candidate == subject)?;
        self.column(column).map(|column| &column.values[row])
    }

    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_name.as_str());
        header.extend(self.columns.iter().map(|column| column.name.as_str()));
        csv_writer.write_record(&header)?;

        for (row, subject) in self.subjects.iter().enumerate() {
            let mut record: Vec<Cow<'_, str>> = Vec::with_capacity(self.columns.len() + 1);
            record.push(Cow::Borrowed(subject.as_str()));
            record.extend(self.columns.iter().map(|column| column.values[row].to_field()));
            csv_writer.write_record(record.iter().map(|field| field.as_bytes()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write a single-sheet workbook. Scores are stored as numeric cells and
    /// missing values as blank cells.
    pub fn write_xlsx(&self, path: impl AsRef<Path>, sheet: &str) -> Result<(), SpreadsheetError> {
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_name.as_str());
        header.extend(self.columns.iter().map(|column| column.name.as_str()));

        let rows = self.subjects.iter().enumerate().map(|(row, subject)| {
            let mut values = Vec::with_capacity(self.columns.len() + 1);
            values.push(SheetValue::Text(subject.as_str()));
            values.extend(self.columns.iter().map(|column| match &column.values[row] {
                Cell::Number(value) => SheetValue::Number(*value),
                Cell::Text(text) => SheetValue::Text(text),
                Cell::Missing => SheetValue::Empty,
            }));
            values
        });

        spreadsheet::write_sheet(path.as_ref(), sheet, &header, rows)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

struct RowView<'a> {
    result: &'a JoinedResult,
    row: usize,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.result.columns.len() + 1))?;
        map.serialize_entry(&self.result.index_name, &self.result.subjects[self.row])?;
        for column in &self.result.columns {
            map.serialize_entry(&column.name, &column.values[self.row])?;
        }
        map.end()
    }
}

impl Serialize for JoinedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<RowView<'_>> = (0..self.subjects.len())
            .map(|row| RowView { result: self, row })
            .collect();

        let mut state = serializer.serialize_struct("JoinedResult", 3)?;
        state.serialize_field("index", &self.index_name)?;
        state.serialize_field("columns", &self.column_names())?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
