use super::definition::{ItemNumber, ScaleDefinition};
use super::engine::{BoundsPolicy, ScoringError};
use super::table::{ResponseTable, SubjectId};
use std::collections::BTreeMap;

/// Count the columns carrying the `{scale_name}_` prefix and compare against
/// the declared item total.
pub fn validate_item_count(
    table: &ResponseTable,
    scale_name: &str,
    expected_total: usize,
) -> Result<(), ScoringError> {
    let prefix = format!("{scale_name}_");
    let actual = table.columns_with_prefix(&prefix).count();
    if actual != expected_total {
        return Err(ScoringError::SchemaMismatch {
            scale: scale_name.to_string(),
            expected: expected_total,
            actual,
        });
    }
    Ok(())
}

/// Resolved association from item numbers to table columns for one
/// definition. Building a binding runs the item-count check and proves every
/// item the definition references exists, so later lookups cannot miss.
#[derive(Debug, Clone)]
pub struct ScaleBinding<'a> {
    definition: &'a ScaleDefinition,
    columns: BTreeMap<ItemNumber, usize>,
}

impl<'a> ScaleBinding<'a> {
    pub fn bind(
        table: &ResponseTable,
        definition: &'a ScaleDefinition,
    ) -> Result<Self, ScoringError> {
        validate_item_count(table, &definition.scale_name, definition.total_items)?;

        let prefix = definition.prefix();
        let columns: BTreeMap<ItemNumber, usize> = table
            .columns_with_prefix(&prefix)
            .filter_map(|(position, name)| {
                let suffix = &name[prefix.len()..];
                let item = suffix.parse::<ItemNumber>().ok()?;
                // `hexaco_07` is not item 7.
                (item > 0 && item.to_string() == suffix).then_some((item, position))
            })
            .collect();

        if let Some(missing) = definition
            .referenced_items()
            .into_iter()
            .find(|item| !columns.contains_key(item))
        {
            return Err(ScoringError::UnknownColumn {
                scale: definition.scale_name.clone(),
                column: definition.item_column(missing),
            });
        }

        Ok(Self {
            definition,
            columns,
        })
    }

    pub fn definition(&self) -> &ScaleDefinition {
        self.definition
    }

    pub fn column(&self, item: ItemNumber) -> Option<usize> {
        self.columns.get(&item).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemNumber, usize)> + '_ {
        self.columns.iter().map(|(&item, &position)| (item, position))
    }
}

/// Numeric working copy of one instrument's items, row-aligned with the
/// response table it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTable {
    scale_name: String,
    subjects: Vec<SubjectId>,
    items: BTreeMap<ItemNumber, Vec<Option<f64>>>,
}

impl ItemTable {
    pub fn new(
        scale_name: impl Into<String>,
        subjects: Vec<SubjectId>,
        items: BTreeMap<ItemNumber, Vec<Option<f64>>>,
    ) -> Self {
        Self {
            scale_name: scale_name.into(),
            subjects,
            items,
        }
    }

    /// Parse the bound columns. Empty cells and `NaN` become missing values;
    /// infinities and anything else that is not a number are rejected.
    pub fn load(
        table: &ResponseTable,
        binding: &ScaleBinding<'_>,
        bounds: BoundsPolicy,
    ) -> Result<Self, ScoringError> {
        let definition = binding.definition();
        let min = f64::from(definition.min_scale);
        let max = f64::from(definition.max_scale);
        let mut items = BTreeMap::new();

        for (item, position) in binding.items() {
            let column_name = &table.column_names()[position];
            let mut values = Vec::with_capacity(table.n_subjects());

            for (row, cell) in table.column_at(position).iter().enumerate() {
                let value = match cell.as_deref() {
                    None => None,
                    Some(raw) => {
                        let invalid = || ScoringError::InvalidResponse {
                            scale: definition.scale_name.clone(),
                            column: column_name.clone(),
                            subject: table.subjects()[row].clone(),
                            value: raw.to_string(),
                        };
                        let parsed = raw.parse::<f64>().map_err(|_| invalid())?;
                        if parsed.is_infinite() {
                            return Err(invalid());
                        }
                        (!parsed.is_nan()).then_some(parsed)
                    }
                };

                if let (Some(value), BoundsPolicy::Strict) = (value, bounds) {
                    if !(min..=max).contains(&value) {
                        return Err(ScoringError::OutOfRange {
                            scale: definition.scale_name.clone(),
                            column: column_name.clone(),
                            subject: table.subjects()[row].clone(),
                            value,
                            min: definition.min_scale,
                            max: definition.max_scale,
                        });
                    }
                }

                values.push(value);
            }

            items.insert(item, values);
        }

        Ok(Self {
            scale_name: definition.scale_name.clone(),
            subjects: table.subjects().to_vec(),
            items,
        })
    }

    pub fn scale_name(&self) -> &str {
        &self.scale_name
    }

    pub fn subjects(&self) -> &[SubjectId] {
        &self.subjects
    }

    pub fn values(&self, item: ItemNumber) -> Option<&[Option<f64>]> {
        self.items.get(&item).map(Vec::as_slice)
    }

    pub(crate) fn values_mut(&mut self, item: ItemNumber) -> Option<&mut Vec<Option<f64>>> {
        self.items.get_mut(&item)
    }

    pub fn item_numbers(&self) -> impl Iterator<Item = ItemNumber> + '_ {
        self.items.keys().copied()
    }

    pub(crate) fn column_name(&self, item: ItemNumber) -> String {
        format!("{}_{}", self.scale_name, item)
    }
}
