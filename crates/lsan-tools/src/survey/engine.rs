use super::binding::{self, ItemTable, ScaleBinding};
use super::definition::{Aggregation, DefinitionError, ItemNumber, ScaleDefinition};
use super::instruments::Instrument;
use super::output::{Cell, JoinedResult, OutputColumn, ScoredAccumulator, ScoredTable};
use super::table::{ResponseTable, SubjectId};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Accumulator key under which [`ScoringEngine::retain_items`] stores raw
/// passthrough columns.
pub const RETAINED_KEY: &str = "other";

/// Whether item responses must lie inside the instrument's declared bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsPolicy {
    /// Reject out-of-range responses with [`ScoringError::OutOfRange`].
    #[default]
    Strict,
    /// Score whatever is present.
    Unchecked,
}

impl BoundsPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "unchecked" | "off" | "none" => Some(Self::Unchecked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringOptions {
    pub bounds: BoundsPolicy,
}

/// Scores instruments against one response table and keeps the results.
///
/// Each successful [`score_instrument`](Self::score_instrument) call adds or
/// replaces one accumulator entry; a failed call leaves the accumulator as it
/// was. [`join`](Self::join) concatenates the entries on the subject index.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    responses: ResponseTable,
    options: ScoringOptions,
    accumulator: ScoredAccumulator,
}

impl ScoringEngine {
    pub fn new(responses: ResponseTable) -> Self {
        Self::with_options(responses, ScoringOptions::default())
    }

    pub fn with_options(responses: ResponseTable, options: ScoringOptions) -> Self {
        Self {
            responses,
            options,
            accumulator: ScoredAccumulator::default(),
        }
    }

    pub fn responses(&self) -> &ResponseTable {
        &self.responses
    }

    pub fn options(&self) -> ScoringOptions {
        self.options
    }

    pub fn accumulator(&self) -> &ScoredAccumulator {
        &self.accumulator
    }

    pub fn into_accumulator(self) -> ScoredAccumulator {
        self.accumulator
    }

    pub fn validate_item_count(
        &self,
        scale_name: &str,
        expected_total: usize,
    ) -> Result<(), ScoringError> {
        binding::validate_item_count(&self.responses, scale_name, expected_total)
    }

    pub fn score(&mut self, instrument: Instrument) -> Result<&ScoredTable, ScoringError> {
        self.score_instrument(&instrument.definition())
    }

    pub fn score_instrument(
        &mut self,
        definition: &ScaleDefinition,
    ) -> Result<&ScoredTable, ScoringError> {
        definition.validate()?;

        let binding = ScaleBinding::bind(&self.responses, definition)?;
        let items = ItemTable::load(&self.responses, &binding, self.options.bounds)?;
        let items = reverse_code(
            &items,
            definition.reversed_items.iter().copied(),
            definition.min_scale,
            definition.max_scale,
        )?;

        let mut columns = Vec::with_capacity(definition.subscales.len());
        for subscale in &definition.subscales {
            let scores = aggregate_subscale(&items, &subscale.items, definition.aggregation)?;
            debug!(
                scale = %definition.scale_name,
                subscale = %subscale.name,
                references = subscale.items.len(),
                "aggregated subscale"
            );
            columns.push(OutputColumn::numeric(
                definition.subscale_column(subscale),
                scores,
            ));
        }

        info!(
            scale = %definition.scale_name,
            subjects = self.responses.n_subjects(),
            subscales = columns.len(),
            "scored instrument"
        );

        let table = ScoredTable::new(definition.scale_name.clone(), columns);
        Ok(self.accumulator.insert(table))
    }

    /// Score each definition in order, stopping at the first failure. Entries
    /// stored before the failure stay in the accumulator.
    pub fn score_all<'d>(
        &mut self,
        definitions: impl IntoIterator<Item = &'d ScaleDefinition>,
    ) -> Result<(), ScoringError> {
        for definition in definitions {
            self.score_instrument(definition)?;
        }
        Ok(())
    }

    /// Carry raw columns into the joined output under the `other` key: every
    /// column when `columns` is `None`, otherwise the named ones.
    pub fn retain_items(
        &mut self,
        columns: Option<&[String]>,
    ) -> Result<&ScoredTable, ScoringError> {
        let names: Vec<&str> = match columns {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => self.responses.column_names().iter().map(String::as_str).collect(),
        };

        let mut retained = Vec::with_capacity(names.len());
        for name in names {
            let values = self
                .responses
                .column(name)
                .ok_or_else(|| ScoringError::UnknownColumn {
                    scale: RETAINED_KEY.to_string(),
                    column: name.to_string(),
                })?;
            retained.push(OutputColumn {
                name: name.to_string(),
                values: values.iter().map(|cell| Cell::from(cell.as_deref())).collect(),
            });
        }

        info!(columns = retained.len(), "retained raw columns");
        Ok(self
            .accumulator
            .insert(ScoredTable::new(RETAINED_KEY, retained)))
    }

    pub fn join(&self) -> Result<JoinedResult, ScoringError> {
        if self.accumulator.is_empty() {
            return Err(ScoringError::NoScoredData);
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for entry in self.accumulator.iter() {
            for column in &entry.columns {
                if !seen.insert(column.name.as_str()) {
                    return Err(ScoringError::DuplicateOutputColumn {
                        column: column.name.clone(),
                    });
                }
                columns.push(column.clone());
            }
        }

        Ok(JoinedResult::new(
            self.responses.index_name().to_string(),
            self.responses.subjects().to_vec(),
            columns,
        ))
    }
}

/// Flip the listed items to `(max + min) - v`. Returns a new table; items not
/// listed are copied unchanged and missing values stay missing.
pub fn reverse_code(
    items: &ItemTable,
    reversed_items: impl IntoIterator<Item = ItemNumber>,
    min_scale: i32,
    max_scale: i32,
) -> Result<ItemTable, ScoringError> {
    let pivot = f64::from(max_scale) + f64::from(min_scale);
    let reversed: BTreeSet<ItemNumber> = reversed_items.into_iter().collect();
    let mut flipped = items.clone();

    for item in reversed {
        let column = flipped
            .values_mut(item)
            .ok_or_else(|| ScoringError::UnknownColumn {
                scale: items.scale_name().to_string(),
                column: items.column_name(item),
            })?;
        for value in column.iter_mut().flatten() {
            *value = pivot - *value;
        }
    }

    Ok(flipped)
}

/// Row-wise sum (or mean) over `subscale_items`. Repeated item numbers count
/// once per reference. A subject missing any referenced item gets a missing
/// score.
pub fn aggregate_subscale(
    items: &ItemTable,
    subscale_items: &[ItemNumber],
    aggregation: Aggregation,
) -> Result<Vec<Option<f64>>, ScoringError> {
    if subscale_items.is_empty() {
        return Err(ScoringError::EmptySubscale {
            scale: items.scale_name().to_string(),
        });
    }

    let columns = subscale_items
        .iter()
        .map(|&item| {
            items.values(item).ok_or_else(|| ScoringError::UnknownColumn {
                scale: items.scale_name().to_string(),
                column: items.column_name(item),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let references = subscale_items.len() as f64;
    let scores = (0..items.subjects().len())
        .map(|row| {
            let sum = columns
                .iter()
                .map(|column| column[row])
                .sum::<Option<f64>>()?;
            Some(if aggregation.calc_mean() {
                sum / references
            } else {
                sum
            })
        })
        .collect();

    Ok(scores)
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("scale '{scale}' expects {expected} item columns but the data has {actual}")]
    SchemaMismatch {
        scale: String,
        expected: usize,
        actual: usize,
    },
    #[error("scale '{scale}' references column '{column}', which is not in the data")]
    UnknownColumn { scale: String, column: String },
    #[error("no instruments have been scored; score at least one before joining")]
    NoScoredData,
    #[error("subject '{subject}' has non-numeric response '{value}' in column '{column}' of scale '{scale}'")]
    InvalidResponse {
        scale: String,
        column: String,
        subject: SubjectId,
        value: String,
    },
    #[error("subject '{subject}' has response {value} in column '{column}', outside {min}..={max} for scale '{scale}'")]
    OutOfRange {
        scale: String,
        column: String,
        subject: SubjectId,
        value: f64,
        min: i32,
        max: i32,
    },
    #[error("scale '{scale}' has a subscale with no items")]
    EmptySubscale { scale: String },
    #[error("column '{column}' would appear twice in the joined output")]
    DuplicateOutputColumn { column: String },
    #[error(transparent)]
    InvalidDefinition(#[from] DefinitionError),
}
