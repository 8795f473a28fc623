use super::engine::RETAINED_KEY;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// One-based question number within an instrument.
pub type ItemNumber = u32;

/// How the items of a subscale collapse into a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Aggregation {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
        }
    }

    pub const fn calc_mean(self) -> bool {
        matches!(self, Self::Mean)
    }
}

/// Named group of item references. Items may repeat, both here and across
/// subscales of the same instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscale {
    pub name: String,
    pub items: Vec<ItemNumber>,
}

impl Subscale {
    pub fn new(name: impl Into<String>, items: impl Into<Vec<ItemNumber>>) -> Self {
        Self {
            name: name.into(),
            items: items.into(),
        }
    }
}

/// Declarative scoring key for one questionnaire.
///
/// Definitions carry no behavior of their own; [`crate::survey::ScoringEngine`]
/// interprets them. Built-in keys live in [`crate::survey::Instrument`], and
/// custom keys can be read from JSON with [`load_definitions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDefinition {
    /// Column prefix (`{scale_name}_{item}`) and accumulator key.
    pub scale_name: String,
    pub total_items: usize,
    pub min_scale: i32,
    pub max_scale: i32,
    #[serde(default)]
    pub reversed_items: BTreeSet<ItemNumber>,
    pub subscales: Vec<Subscale>,
    pub aggregation: Aggregation,
}

impl ScaleDefinition {
    pub fn new(
        scale_name: impl Into<String>,
        total_items: usize,
        (min_scale, max_scale): (i32, i32),
        aggregation: Aggregation,
    ) -> Self {
        Self {
            scale_name: scale_name.into(),
            total_items,
            min_scale,
            max_scale,
            reversed_items: BTreeSet::new(),
            subscales: Vec::new(),
            aggregation,
        }
    }

    pub fn reversed(mut self, items: impl IntoIterator<Item = ItemNumber>) -> Self {
        self.reversed_items.extend(items);
        self
    }

    pub fn subscale(mut self, name: &str, items: impl Into<Vec<ItemNumber>>) -> Self {
        self.subscales.push(Subscale::new(name, items));
        self
    }

    /// Same scoring key, read from columns named `{scale_name}_{item}`.
    pub fn with_scale_name(mut self, scale_name: impl Into<String>) -> Self {
        self.scale_name = scale_name.into();
        self
    }

    pub fn prefix(&self) -> String {
        format!("{}_", self.scale_name)
    }

    pub fn item_column(&self, item: ItemNumber) -> String {
        format!("{}_{}", self.scale_name, item)
    }

    pub fn subscale_column(&self, subscale: &Subscale) -> String {
        format!("{}_{}", self.scale_name, subscale.name)
    }

    pub fn subscale_named(&self, name: &str) -> Option<&Subscale> {
        self.subscales.iter().find(|subscale| subscale.name == name)
    }

    /// Every item number the key touches, reversed items included.
    pub fn referenced_items(&self) -> BTreeSet<ItemNumber> {
        self.subscales
            .iter()
            .flat_map(|subscale| subscale.items.iter().copied())
            .chain(self.reversed_items.iter().copied())
            .collect()
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.scale_name.trim().is_empty() {
            return Err(DefinitionError::EmptyScaleName);
        }
        if self.scale_name == RETAINED_KEY {
            return Err(DefinitionError::ReservedScaleName {
                scale: self.scale_name.clone(),
            });
        }
        if self.total_items == 0 {
            return Err(DefinitionError::NoItems {
                scale: self.scale_name.clone(),
            });
        }
        if self.min_scale >= self.max_scale {
            return Err(DefinitionError::InvalidBounds {
                scale: self.scale_name.clone(),
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        if self.referenced_items().contains(&0) {
            return Err(DefinitionError::ZeroItemNumber {
                scale: self.scale_name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for subscale in &self.subscales {
            if subscale.items.is_empty() {
                return Err(DefinitionError::EmptySubscale {
                    scale: self.scale_name.clone(),
                    subscale: subscale.name.clone(),
                });
            }
            if !seen.insert(subscale.name.as_str()) {
                return Err(DefinitionError::DuplicateSubscale {
                    scale: self.scale_name.clone(),
                    subscale: subscale.name.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    One(ScaleDefinition),
    Many(Vec<ScaleDefinition>),
}

/// Parse a JSON document holding one definition or an array of them. Every
/// parsed definition is validated before it is returned.
pub fn parse_definitions(json: &str) -> Result<Vec<ScaleDefinition>, DefinitionError> {
    let definitions = match serde_json::from_str::<DefinitionFile>(json)? {
        DefinitionFile::One(definition) => vec![definition],
        DefinitionFile::Many(definitions) => definitions,
    };

    for definition in &definitions {
        definition.validate()?;
    }

    Ok(definitions)
}

pub fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<ScaleDefinition>, DefinitionError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_definitions(&raw)
}

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("scale definition has an empty scale name")]
    EmptyScaleName,
    #[error("scale name '{scale}' is reserved for retained raw columns")]
    ReservedScaleName { scale: String },
    #[error("scale '{scale}' declares zero items")]
    NoItems { scale: String },
    #[error("scale '{scale}' has invalid response bounds {min}..={max}")]
    InvalidBounds { scale: String, min: i32, max: i32 },
    #[error("scale '{scale}' references item 0; item numbers start at 1")]
    ZeroItemNumber { scale: String },
    #[error("subscale '{subscale}' of scale '{scale}' lists no items")]
    EmptySubscale { scale: String, subscale: String },
    #[error("scale '{scale}' declares subscale '{subscale}' more than once")]
    DuplicateSubscale { scale: String, subscale: String },
    #[error("failed to read scale definitions from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid scale definition JSON: {0}")]
    Json(#[from] serde_json::Error),
}
