use crate::survey::{ItemNumber, ResponseTable, ScaleDefinition, SubjectId};

pub(super) const INDEX: &str = "subject_id";

pub(super) fn subjects(count: usize) -> Vec<SubjectId> {
    (1..=count).map(|n| SubjectId::new(format!("sub-{n:03}"))).collect()
}

fn format_value(value: f64) -> Option<String> {
    Some(value.to_string())
}

/// Table with `n_items` columns `{scale}_1..` where every answer is `value`.
pub(super) fn uniform_table(
    scale: &str,
    n_items: ItemNumber,
    value: f64,
    n_subjects: usize,
) -> ResponseTable {
    let columns = (1..=n_items).map(|item| {
        (
            format!("{scale}_{item}"),
            vec![format_value(value); n_subjects],
        )
    });
    ResponseTable::new(INDEX, subjects(n_subjects), columns).expect("uniform table builds")
}

/// Deterministic in-range answers spread over the whole response scale.
pub(super) fn patterned_value(definition: &ScaleDefinition, row: usize, item: ItemNumber) -> f64 {
    let span = (definition.max_scale - definition.min_scale + 1) as usize;
    let step = (row * 7 + item as usize * 3) % span;
    f64::from(definition.min_scale) + step as f64
}

pub(super) fn patterned_table(definition: &ScaleDefinition, n_subjects: usize) -> ResponseTable {
    let total = definition.total_items as ItemNumber;
    let columns = (1..=total).map(|item| {
        let values = (0..n_subjects)
            .map(|row| format_value(patterned_value(definition, row, item)))
            .collect();
        (definition.item_column(item), values)
    });
    ResponseTable::new(INDEX, subjects(n_subjects), columns).expect("patterned table builds")
}

/// Several instruments side by side plus a demographic column.
pub(super) fn combined_table(definitions: &[ScaleDefinition], n_subjects: usize) -> ResponseTable {
    let mut columns: Vec<(String, Vec<Option<String>>)> = vec![(
        "age".to_string(),
        (0..n_subjects).map(|row| Some((20 + row).to_string())).collect(),
    )];

    for definition in definitions {
        let total = definition.total_items as ItemNumber;
        for item in 1..=total {
            let values = (0..n_subjects)
                .map(|row| format_value(patterned_value(definition, row, item)))
                .collect();
            columns.push((definition.item_column(item), values));
        }
    }

    ResponseTable::new(INDEX, subjects(n_subjects), columns).expect("combined table builds")
}

/// Replace one cell of an otherwise valid table.
pub(super) fn with_cell(
    table: &ResponseTable,
    column: &str,
    row: usize,
    value: Option<&str>,
) -> ResponseTable {
    let columns = table.column_names().iter().map(|name| {
        let mut values = table.column(name).expect("column present").to_vec();
        if name == column {
            values[row] = value.map(str::to_string);
        }
        (name.clone(), values)
    });
    ResponseTable::new(INDEX, table.subjects().to_vec(), columns).expect("table rebuilds")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
