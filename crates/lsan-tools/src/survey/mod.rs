//! Questionnaire scoring.
//!
//! A [`ScaleDefinition`] describes one instrument (item count, response
//! bounds, reverse-coded items and subscale item lists). The
//! [`ScoringEngine`] binds definitions against a [`ResponseTable`] whose item
//! columns follow the `{scale_name}_{item}` convention, reverse-codes,
//! aggregates each subscale, and accumulates one table per instrument until
//! [`ScoringEngine::join`] lines them up on the subject index. Response
//! tables and joined results travel as delimited text or `.xlsx` workbooks.

mod binding;
pub mod definition;
mod engine;
pub mod instruments;
pub mod output;
pub mod selection;
pub mod spreadsheet;
pub mod table;

#[cfg(test)]
mod tests;

pub use binding::{validate_item_count, ItemTable, ScaleBinding};
pub use definition::{
    load_definitions, parse_definitions, Aggregation, DefinitionError, ItemNumber,
    ScaleDefinition, Subscale,
};
pub use engine::{
    aggregate_subscale, reverse_code, BoundsPolicy, ScoringEngine, ScoringError, ScoringOptions,
    RETAINED_KEY,
};
pub use instruments::Instrument;
pub use output::{Cell, JoinedResult, OutputColumn, ScoredAccumulator, ScoredTable};
pub use selection::{SelectionError, SubjectSelector};
pub use spreadsheet::{default_sheet_name, is_spreadsheet, SpreadsheetError};
pub use table::{ResponseTable, SubjectId, TableError};
