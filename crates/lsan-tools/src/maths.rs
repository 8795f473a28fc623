//! Numeric helpers for inter-subject analyses of scored questionnaires.

use crate::survey::{Cell, JoinedResult, OutputColumn, ResponseTable, SubjectId};
use rand::seq::SliceRandom;
use rand::Rng;

/// Rescale `values` so the smallest maps to 0 and the largest to 1.
pub fn normalize_unit_range(values: &[f64]) -> Result<Vec<f64>, MathsError> {
    let (min, max) = min_max(values).ok_or(MathsError::Empty)?;
    let range = max - min;
    if range == 0.0 {
        return Err(MathsError::ZeroRange);
    }
    Ok(values.iter().map(|value| (value - min) / range).collect())
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(min, max), &value| {
                (min.min(value), max.max(value))
            }),
    )
}

/// How a pair of subject scores becomes one similarity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairwiseKind {
    /// `max(a, b)`: low scorers resemble each other.
    LowAlike,
    /// `1 - min(a, b)`: high scorers resemble each other.
    HighAlike,
    Average,
    AbsoluteDistance,
}

impl PairwiseKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "low-alike" => Some(Self::LowAlike),
            "high-alike" => Some(Self::HighAlike),
            "average" | "mean" => Some(Self::Average),
            "absolute-dist" | "absolute-distance" => Some(Self::AbsoluteDistance),
            _ => None,
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::LowAlike => a.max(b),
            Self::HighAlike => 1.0 - a.min(b),
            Self::Average => (a + b) / 2.0,
            Self::AbsoluteDistance => (a - b).abs(),
        }
    }
}

/// Square subject-by-subject matrix and its upper triangle (diagonal
/// excluded, row-major).
pub fn pairwise(
    values: &[f64],
    kind: PairwiseKind,
    normalize: bool,
) -> Result<(Vec<f64>, Vec<Vec<f64>>), MathsError> {
    if values.is_empty() {
        return Err(MathsError::Empty);
    }
    let values = if normalize {
        normalize_unit_range(values)?
    } else {
        values.to_vec()
    };

    let matrix: Vec<Vec<f64>> = values
        .iter()
        .map(|&a| values.iter().map(|&b| kind.apply(a, b)).collect())
        .collect();

    let upper = matrix
        .iter()
        .enumerate()
        .flat_map(|(row, cells)| cells[row + 1..].iter().copied())
        .collect();

    Ok((upper, matrix))
}

/// Randomly permute subject labels while every row keeps its answers.
pub fn shuffle_subjects<R: Rng + ?Sized>(table: &ResponseTable, rng: &mut R) -> ResponseTable {
    let mut subjects: Vec<SubjectId> = table.subjects().to_vec();
    subjects.shuffle(rng);
    table.relabel(subjects)
}

/// Population z-scores (ddof 0). Constant input maps to zeros.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    values
        .iter()
        .map(|value| if std == 0.0 { 0.0 } else { (value - mean) / std })
        .collect()
}

/// Z-score each named column of a joined result independently.
pub fn zscore_columns(
    result: &JoinedResult,
    columns: &[&str],
) -> Result<Vec<OutputColumn>, MathsError> {
    columns
        .iter()
        .map(|&name| {
            let column = result
                .column(name)
                .ok_or_else(|| MathsError::MissingColumn(name.to_string()))?;
            let values = column
                .values
                .iter()
                .zip(result.subjects())
                .map(|(cell, subject)| match cell {
                    Cell::Number(value) => Ok(*value),
                    Cell::Missing => Err(MathsError::MissingValue {
                        column: name.to_string(),
                        subject: subject.clone(),
                    }),
                    Cell::Text(value) => {
                        value.parse::<f64>().map_err(|_| MathsError::NonNumeric {
                            column: name.to_string(),
                            subject: subject.clone(),
                            value: value.clone(),
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;

            let scores = zscore(&values).into_iter().map(Some).collect();
            Ok(OutputColumn::numeric(name, scores))
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum MathsError {
    #[error("cannot compute over an empty set of values")]
    Empty,
    #[error("all values are equal; unit-range normalization is undefined")]
    ZeroRange,
    #[error("column '{0}' is not in the result")]
    MissingColumn(String),
    #[error("column '{column}' has no value for subject '{subject}'")]
    MissingValue { column: String, subject: SubjectId },
    #[error("column '{column}' has non-numeric value '{value}' for subject '{subject}'")]
    NonNumeric {
        column: String,
        subject: SubjectId,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{Instrument, ScoringEngine};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn normalizes_to_unit_range() {
        let normalized = normalize_unit_range(&[2.0, 4.0, 6.0]).expect("normalizes");
        assert_all_close(&normalized, &[0.0, 0.5, 1.0]);
        assert!(matches!(
            normalize_unit_range(&[3.0, 3.0]),
            Err(MathsError::ZeroRange)
        ));
        assert!(matches!(normalize_unit_range(&[]), Err(MathsError::Empty)));
    }

    #[test]
    fn pairwise_upper_triangle_is_row_major() {
        let (upper, matrix) =
            pairwise(&[0.0, 0.5, 1.0], PairwiseKind::AbsoluteDistance, false).expect("pairwise");
        assert_all_close(&upper, &[0.5, 1.0, 0.5]);
        assert_eq!(matrix.len(), 3);
        assert_all_close(&matrix[1], &[0.5, 0.0, 0.5]);
    }

    #[test]
    fn pairwise_kinds_follow_their_formulas() {
        let values = [0.2, 0.8];
        let upper = |kind| pairwise(&values, kind, false).expect("pairwise").0;
        assert_all_close(&upper(PairwiseKind::LowAlike), &[0.8]);
        assert_all_close(&upper(PairwiseKind::HighAlike), &[0.8]);
        assert_all_close(&upper(PairwiseKind::Average), &[0.5]);
        assert_all_close(&upper(PairwiseKind::AbsoluteDistance), &[0.6]);

        let (normalized, _) =
            pairwise(&[10.0, 20.0], PairwiseKind::Average, true).expect("pairwise");
        assert_all_close(&normalized, &[0.5]);
        assert_eq!(PairwiseKind::parse("high_alike"), Some(PairwiseKind::HighAlike));
    }

    #[test]
    fn shuffle_permutes_labels_but_keeps_rows() {
        let csv = "subject_id,age\na,1\nb,2\nc,3\nd,4\ne,5\n";
        let table =
            ResponseTable::from_reader(Cursor::new(csv), "subject_id", b',').expect("table");

        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = shuffle_subjects(&table, &mut rng);

        let mut labels: Vec<&str> = shuffled.subjects().iter().map(SubjectId::as_str).collect();
        labels.sort_unstable();
        assert_eq!(labels, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(shuffled.column("age"), table.column("age"));

        let mut again = StdRng::seed_from_u64(7);
        assert_eq!(shuffle_subjects(&table, &mut again), shuffled);
    }

    #[test]
    fn zscore_uses_population_deviation() {
        let spread = 1.5_f64.sqrt();
        assert_all_close(&zscore(&[1.0, 2.0, 3.0]), &[-spread, 0.0, spread]);
        assert_all_close(&zscore(&[4.0, 4.0]), &[0.0, 0.0]);
    }

    #[test]
    fn zscore_columns_reads_joined_scores() {
        let header: Vec<String> = (1..=33).map(|item| format!("STAB_{item}")).collect();
        let csv = format!(
            "subject_id,{}\na,{}\nb,{}\n",
            header.join(","),
            ["1"; 33].join(","),
            ["3"; 33].join(",")
        );
        let table =
            ResponseTable::from_reader(Cursor::new(csv), "subject_id", b',').expect("table");
        let mut engine = ScoringEngine::new(table);
        engine.score(Instrument::Stab).expect("stab scores");
        let joined = engine.join().expect("joins");

        let scores = zscore_columns(&joined, &["STAB_phys", "STAB_rule"]).expect("zscores");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].numbers(), vec![Some(-1.0), Some(1.0)]);

        match zscore_columns(&joined, &["STAB_total"]) {
            Err(MathsError::MissingColumn(name)) => assert_eq!(name, "STAB_total"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }
}
