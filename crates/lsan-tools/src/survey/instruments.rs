use super::definition::{Aggregation, ItemNumber, ScaleDefinition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Questionnaires with a built-in scoring key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Hexaco,
    RelationalMobility,
    Isel,
    Dospert,
    Stab,
    Iri,
    PpiShort,
    PpiLong,
}

impl Instrument {
    pub const ALL: [Self; 8] = [
        Self::Hexaco,
        Self::RelationalMobility,
        Self::Isel,
        Self::Dospert,
        Self::Stab,
        Self::Iri,
        Self::PpiShort,
        Self::PpiLong,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hexaco => "HEXACO-60",
            Self::RelationalMobility => "Relational Mobility Scale",
            Self::Isel => "Interpersonal Support Evaluation List (40-item)",
            Self::Dospert => "Domain-Specific Risk-Taking (DOSPERT)",
            Self::Stab => "Subtypes of Antisocial Behavior (STAB)",
            Self::Iri => "Interpersonal Reactivity Index",
            Self::PpiShort => "Psychopathic Personality Inventory (short)",
            Self::PpiLong => "Psychopathic Personality Inventory (long)",
        }
    }

    /// Column prefix the instrument is scored from unless overridden.
    pub const fn default_scale_name(self) -> &'static str {
        match self {
            Self::Hexaco => "hexaco",
            Self::RelationalMobility => "relational_mobility",
            Self::Isel => "isel",
            Self::Dospert => "dospert",
            Self::Stab => "STAB",
            Self::Iri => "iri",
            Self::PpiShort => "ppi_short",
            Self::PpiLong => "ppi_long",
        }
    }

    /// Resolve a user-facing name. Accepts the default scale name in any case
    /// and a few common spellings (`rel_mobility`, `ppi-short`, ...).
    pub fn from_name(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        let instrument = match normalized.as_str() {
            "hexaco" | "hexaco_60" => Self::Hexaco,
            "relational_mobility" | "rel_mobility" => Self::RelationalMobility,
            "isel" | "isel_40" => Self::Isel,
            "dospert" => Self::Dospert,
            "stab" => Self::Stab,
            "iri" => Self::Iri,
            "ppi_short" | "ppi_sf" => Self::PpiShort,
            "ppi_long" | "ppi" => Self::PpiLong,
            _ => return None,
        };
        Some(instrument)
    }

    pub fn definition(self) -> ScaleDefinition {
        match self {
            Self::Hexaco => hexaco(),
            Self::RelationalMobility => relational_mobility(),
            Self::Isel => isel(),
            Self::Dospert => dospert(),
            Self::Stab => stab(),
            Self::Iri => iri(),
            Self::PpiShort => ppi_short(),
            Self::PpiLong => ppi_long(),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_scale_name())
    }
}

fn items(range: std::ops::RangeInclusive<ItemNumber>) -> Vec<ItemNumber> {
    range.collect()
}

fn hexaco() -> ScaleDefinition {
    ScaleDefinition::new("hexaco", 60, (1, 5), Aggregation::Mean)
        .reversed([
            30, 12, 60, 42, 24, 48, 53, 35, 41, 59, 28, 52, 10, 46, 9, 15, 57, 21, 26, 32, 14, 20,
            44, 56, 1, 31, 49, 19, 55,
        ])
        .subscale("honestyhumility", [6, 30, 54, 12, 36, 60, 18, 42, 24, 48])
        .subscale("emotionality", [5, 29, 53, 11, 35, 17, 41, 23, 47, 59])
        .subscale("extraversion", [4, 28, 52, 10, 34, 58, 16, 40, 22, 46])
        .subscale("agreeableness", [3, 27, 9, 33, 51, 15, 39, 57, 21, 45])
        .subscale("conscientiousness", [2, 26, 8, 32, 14, 38, 50, 20, 44, 56])
        .subscale("openness", [1, 25, 7, 31, 13, 37, 49, 19, 43, 55])
}

fn relational_mobility() -> ScaleDefinition {
    ScaleDefinition::new("relational_mobility", 12, (1, 6), Aggregation::Mean)
        .reversed([4, 5, 7, 9, 11, 12])
        .subscale("relational_mobility", items(1..=12))
}

fn isel() -> ScaleDefinition {
    ScaleDefinition::new("isel", 40, (0, 4), Aggregation::Sum)
        .reversed([
            3, 6, 9, 10, 11, 13, 14, 15, 17, 24, 25, 27, 28, 29, 30, 34, 35, 36, 39, 40,
        ])
        .subscale("appraisal", [1, 6, 11, 17, 19, 22, 26, 30, 36, 38])
        .subscale("tangible", [2, 9, 14, 16, 18, 23, 29, 33, 35, 39])
        .subscale("selfesteem", [3, 4, 8, 13, 20, 24, 28, 32, 37, 40])
        .subscale("belonging", [5, 7, 10, 12, 15, 21, 25, 27, 31, 34])
}

fn dospert() -> ScaleDefinition {
    ScaleDefinition::new("dospert", 60, (1, 7), Aggregation::Mean)
        .subscale("risk_taking_ethical", [6, 9, 10, 16, 29, 30])
        .subscale("risk_taking_financial", [3, 4, 8, 12, 14, 18])
        .subscale("risk_taking_health_safety", [5, 15, 17, 20, 23, 26])
        .subscale("risk_taking_recreational", [2, 11, 13, 19, 24, 25])
        .subscale("risk_taking_social", [1, 7, 21, 22, 27, 28])
        .subscale("risk_perception_ethical", [36, 39, 40, 46, 59, 60])
        .subscale("risk_perception_financial", [33, 34, 38, 42, 44, 48])
        .subscale("risk_perception_health_safety", [35, 45, 47, 50, 53, 56])
        .subscale("risk_perception_recreational", [32, 41, 43, 49, 54, 55])
        .subscale("risk_perception_social", [31, 37, 51, 52, 57, 58])
}

fn stab() -> ScaleDefinition {
    ScaleDefinition::new("STAB", 33, (1, 3), Aggregation::Mean)
        .subscale("phys", [2, 5, 8, 11, 14, 17, 20, 23, 26, 29])
        .subscale("soc", [4, 7, 10, 13, 16, 19, 22, 25, 28, 31, 33])
        .subscale("rule", [3, 6, 9, 12, 15, 18, 21, 24, 27, 30, 32])
}

fn iri() -> ScaleDefinition {
    ScaleDefinition::new("iri", 28, (1, 5), Aggregation::Sum)
        .reversed([3, 4, 7, 12, 13, 14, 15, 18, 19])
        .subscale("perspective_taking", [3, 8, 11, 15, 21, 25, 28])
        .subscale("fantasy", [1, 5, 7, 12, 16, 23, 26])
        .subscale("empathic_concern", [2, 4, 9, 14, 18, 20, 22])
        .subscale("personal_distress", [6, 10, 13, 17, 19, 24, 27])
}

const PPI_SHORT_MACHIAVELLIAN: [ItemNumber; 7] = [7, 14, 23, 35, 43, 46, 56];
const PPI_SHORT_SOCIAL_INFLUENCE: [ItemNumber; 7] = [8, 15, 17, 18, 21, 29, 32];
const PPI_SHORT_FEARLESSNESS: [ItemNumber; 7] = [1, 4, 9, 19, 22, 38, 52];
const PPI_SHORT_REBELLIOUS: [ItemNumber; 7] = [2, 5, 16, 30, 36, 47, 53];
const PPI_SHORT_BLAME: [ItemNumber; 7] = [6, 24, 31, 34, 41, 44, 50];
const PPI_SHORT_CAREFREE: [ItemNumber; 7] = [20, 33, 40, 42, 49, 51, 54];
const PPI_SHORT_STRESS: [ItemNumber; 7] = [3, 11, 13, 26, 28, 39, 48];

fn ppi_short() -> ScaleDefinition {
    ScaleDefinition::new("ppi_short", 56, (1, 4), Aggregation::Sum)
        .reversed([
            1, 3, 8, 10, 11, 12, 19, 20, 25, 26, 27, 28, 32, 33, 37, 39, 40, 42, 45, 48, 49, 51,
            54, 55,
        ])
        .subscale("machievellian_egocentricity", PPI_SHORT_MACHIAVELLIAN)
        .subscale("social_influence", PPI_SHORT_SOCIAL_INFLUENCE)
        .subscale("fearlessness", PPI_SHORT_FEARLESSNESS)
        .subscale("rebellious_nonconformity", PPI_SHORT_REBELLIOUS)
        .subscale("blame_externalization", PPI_SHORT_BLAME)
        .subscale("carefree_nonplanfulness", PPI_SHORT_CAREFREE)
        .subscale("stress_immunity", PPI_SHORT_STRESS)
        .subscale("coldheartedness", [10, 12, 25, 27, 37, 45, 55])
        .subscale(
            "selfcentered_impulsivity",
            [
                &PPI_SHORT_MACHIAVELLIAN[..],
                &PPI_SHORT_REBELLIOUS,
                &PPI_SHORT_BLAME,
                &PPI_SHORT_CAREFREE,
            ]
            .concat(),
        )
        .subscale(
            "fearless_dominance",
            [
                &PPI_SHORT_SOCIAL_INFLUENCE[..],
                &PPI_SHORT_FEARLESSNESS,
                &PPI_SHORT_STRESS,
            ]
            .concat(),
        )
        // Items 1-55; item 56 is not part of the reference total.
        .subscale("total", items(1..=55))
}

const PPI_LONG_MACHIAVELLIAN: [ItemNumber; 20] = [
    1, 11, 17, 23, 33, 39, 45, 55, 61, 67, 77, 83, 92, 103, 114, 125, 132, 136, 147, 154,
];
const PPI_LONG_SOCIAL_INFLUENCE: [ItemNumber; 18] = [
    2, 21, 22, 24, 34, 41, 43, 46, 56, 63, 65, 68, 78, 85, 87, 91, 113, 135,
];
const PPI_LONG_FEARLESSNESS: [ItemNumber; 14] =
    [3, 12, 13, 25, 35, 47, 57, 69, 79, 93, 115, 126, 137, 148];
const PPI_LONG_REBELLIOUS: [ItemNumber; 16] = [
    4, 14, 15, 26, 36, 48, 58, 70, 80, 94, 104, 105, 116, 127, 138, 149,
];
const PPI_LONG_BLAME: [ItemNumber; 15] = [
    16, 18, 19, 38, 40, 60, 62, 82, 84, 90, 100, 112, 122, 134, 144,
];
const PPI_LONG_CAREFREE: [ItemNumber; 19] = [
    7, 29, 44, 51, 66, 73, 88, 89, 99, 101, 108, 111, 121, 123, 130, 133, 143, 145, 152,
];
const PPI_LONG_STRESS: [ItemNumber; 13] =
    [6, 10, 28, 32, 50, 54, 72, 76, 96, 118, 119, 140, 141];

fn ppi_long() -> ScaleDefinition {
    ScaleDefinition::new("ppi_long", 154, (1, 4), Aggregation::Sum)
        .reversed([
            3, 5, 6, 9, 10, 17, 21, 22, 24, 27, 28, 30, 31, 38, 44, 47, 50, 51, 53, 59, 65, 68, 69,
            71, 72, 73, 74, 75, 76, 79, 82, 83, 86, 87, 88, 89, 97, 98, 99, 100, 101, 106, 108,
            109, 110, 113, 117, 119, 120, 121, 123, 124, 128, 129, 130, 133, 135, 141, 142, 143,
            145, 146, 152, 153,
        ])
        .subscale("machievellian_egocentricity", PPI_LONG_MACHIAVELLIAN)
        .subscale("social_influence", PPI_LONG_SOCIAL_INFLUENCE)
        .subscale("fearlessness", PPI_LONG_FEARLESSNESS)
        .subscale("rebellious_nonconformity", PPI_LONG_REBELLIOUS)
        .subscale("blame_externalization", PPI_LONG_BLAME)
        .subscale("carefree_nonplanfulness", PPI_LONG_CAREFREE)
        .subscale("stress_immunity", PPI_LONG_STRESS)
        .subscale(
            "deviant_responding",
            [8, 30, 52, 74, 102, 107, 124, 129, 146, 151],
        )
        .subscale(
            "virtuous_responding",
            [20, 37, 42, 59, 64, 81, 86, 95, 106, 117, 128, 139, 150],
        )
        .subscale(
            "coldheartedness",
            [
                5, 9, 27, 31, 49, 53, 71, 75, 97, 98, 109, 110, 120, 131, 142, 153,
            ],
        )
        .subscale(
            "selfcentered_impulsivity",
            [
                &PPI_LONG_MACHIAVELLIAN[..],
                &PPI_LONG_REBELLIOUS,
                &PPI_LONG_BLAME,
                &PPI_LONG_CAREFREE,
            ]
            .concat(),
        )
        .subscale(
            "fearless_dominance",
            [
                &PPI_LONG_SOCIAL_INFLUENCE[..],
                &PPI_LONG_FEARLESSNESS,
                &PPI_LONG_STRESS,
            ]
            .concat(),
        )
        // Items 1-153; item 154 is not part of the reference total.
        .subscale("total", items(1..=153))
}
