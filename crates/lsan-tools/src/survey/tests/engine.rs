use super::common::*;
use crate::survey::{
    reverse_code, Aggregation, BoundsPolicy, Cell, DefinitionError, Instrument, ItemTable,
    ResponseTable, ScaleBinding, ScaleDefinition, ScoringEngine, ScoringError, ScoringOptions,
    SubjectId, RETAINED_KEY,
};

#[test]
fn item_count_passes_with_exactly_sixty_hexaco_columns() {
    let engine = ScoringEngine::new(uniform_table("hexaco", 60, 3.0, 2));
    engine
        .validate_item_count("hexaco", 60)
        .expect("60 columns match");
}

#[test]
fn item_count_reports_missing_and_extra_columns() {
    for (present, actual) in [(59, 59), (61, 61)] {
        let engine = ScoringEngine::new(uniform_table("hexaco", present, 3.0, 2));
        match engine.validate_item_count("hexaco", 60) {
            Err(ScoringError::SchemaMismatch {
                scale,
                expected,
                actual: reported,
            }) => {
                assert_eq!(scale, "hexaco");
                assert_eq!(expected, 60);
                assert_eq!(reported, actual);
            }
            other => panic!("expected schema mismatch for {present} columns, got {other:?}"),
        }
    }
}

#[test]
fn scoring_refuses_incomplete_instrument() {
    let mut engine = ScoringEngine::new(uniform_table("hexaco", 59, 3.0, 2));
    assert!(matches!(
        engine.score(Instrument::Hexaco),
        Err(ScoringError::SchemaMismatch {
            expected: 60,
            actual: 59,
            ..
        })
    ));
    assert!(engine.accumulator().is_empty());
}

#[test]
fn hexaco_midpoint_answers_score_three_everywhere() {
    let mut engine = ScoringEngine::new(uniform_table("hexaco", 60, 3.0, 4));
    let scored = engine.score(Instrument::Hexaco).expect("hexaco scores");

    assert_eq!(scored.columns.len(), 6);
    for column in &scored.columns {
        for value in column.numbers() {
            assert_eq!(value, Some(3.0), "column {}", column.name);
        }
    }
}

#[test]
fn coldheartedness_sums_seven_minimum_answers_without_reversal() {
    let mut definition = Instrument::PpiShort.definition();
    definition.reversed_items.clear();

    let mut engine = ScoringEngine::new(uniform_table("ppi_short", 56, 1.0, 3));
    let scored = engine.score_instrument(&definition).expect("ppi short scores");
    let coldheartedness = scored
        .column("ppi_short_coldheartedness")
        .expect("coldheartedness column");

    assert!(coldheartedness.numbers().iter().all(|value| *value == Some(7.0)));
}

#[test]
fn coldheartedness_items_are_reverse_keyed_in_the_reference_key() {
    let mut engine = ScoringEngine::new(uniform_table("ppi_short", 56, 1.0, 2));
    let scored = engine.score(Instrument::PpiShort).expect("ppi short scores");
    let coldheartedness = scored
        .column("ppi_short_coldheartedness")
        .expect("coldheartedness column");

    // All seven items flip 1 -> 4.
    assert!(coldheartedness.numbers().iter().all(|value| *value == Some(28.0)));
}

#[test]
fn dospert_reverse_coding_is_a_no_op() {
    let definition = Instrument::Dospert.definition();
    let table = patterned_table(&definition, 5);
    let binding = ScaleBinding::bind(&table, &definition).expect("binds");
    let items = ItemTable::load(&table, &binding, BoundsPolicy::Strict).expect("loads");

    let reversed = reverse_code(
        &items,
        definition.reversed_items.iter().copied(),
        definition.min_scale,
        definition.max_scale,
    )
    .expect("reverse codes");

    assert!(definition.reversed_items.is_empty());
    assert_eq!(reversed, items);
}

#[test]
fn reverse_code_flips_only_listed_items() {
    let definition = Instrument::Iri.definition();
    let table = uniform_table("iri", 28, 2.0, 2);
    let binding = ScaleBinding::bind(&table, &definition).expect("binds");
    let items = ItemTable::load(&table, &binding, BoundsPolicy::Strict).expect("loads");

    let reversed = reverse_code(&items, [3, 4], 1, 5).expect("reverse codes");
    assert_eq!(reversed.values(3), Some(&[Some(4.0), Some(4.0)][..]));
    assert_eq!(reversed.values(4), Some(&[Some(4.0), Some(4.0)][..]));
    assert_eq!(reversed.values(5), Some(&[Some(2.0), Some(2.0)][..]));
    assert_eq!(items.values(3), Some(&[Some(2.0), Some(2.0)][..]));
}

#[test]
fn join_requires_scored_data() {
    let engine = ScoringEngine::new(uniform_table("iri", 28, 2.0, 3));
    assert!(matches!(engine.join(), Err(ScoringError::NoScoredData)));
}

#[test]
fn join_after_one_instrument_keeps_subject_index() {
    let definition = Instrument::Iri.definition();
    let table = patterned_table(&definition, 6);
    let expected_subjects = table.subjects().to_vec();

    let mut engine = ScoringEngine::new(table);
    engine.score(Instrument::Iri).expect("iri scores");
    let joined = engine.join().expect("joins");

    assert_eq!(joined.n_rows(), 6);
    assert_eq!(joined.subjects(), expected_subjects.as_slice());
    assert_eq!(joined.index_name(), INDEX);
    assert_eq!(
        joined.column_names(),
        vec![
            "iri_perspective_taking",
            "iri_fantasy",
            "iri_empathic_concern",
            "iri_personal_distress"
        ]
    );
}

#[test]
fn join_concatenates_instruments_in_scoring_order() {
    let definitions = [
        Instrument::Stab.definition(),
        Instrument::RelationalMobility.definition(),
    ];
    let mut engine = ScoringEngine::new(combined_table(&definitions, 3));
    engine.score_all(definitions.iter()).expect("scores");

    let joined = engine.join().expect("joins");
    assert_eq!(
        joined.column_names(),
        vec![
            "STAB_phys",
            "STAB_soc",
            "STAB_rule",
            "relational_mobility_relational_mobility"
        ]
    );
}

#[test]
fn rescoring_is_idempotent() {
    let definition = Instrument::Isel.definition();
    let mut once = ScoringEngine::new(patterned_table(&definition, 5));
    once.score(Instrument::Isel).expect("scores");

    let mut twice = ScoringEngine::new(patterned_table(&definition, 5));
    twice.score(Instrument::Isel).expect("scores");
    twice.score(Instrument::Isel).expect("scores again");

    assert_eq!(once.accumulator(), twice.accumulator());
    assert_eq!(twice.accumulator().len(), 1);

    let mut first = Vec::new();
    let mut second = Vec::new();
    once.join()
        .expect("joins")
        .write_delimited(&mut first, b',')
        .expect("writes");
    twice
        .join()
        .expect("joins")
        .write_delimited(&mut second, b',')
        .expect("writes");
    assert_eq!(first, second);
}

#[test]
fn unknown_item_reference_is_surfaced() {
    let definition = ScaleDefinition::new("hexaco", 60, (1, 5), Aggregation::Mean)
        .subscale("openness", [1, 25, 61]);
    let mut engine = ScoringEngine::new(uniform_table("hexaco", 60, 3.0, 2));

    match engine.score_instrument(&definition) {
        Err(ScoringError::UnknownColumn { scale, column }) => {
            assert_eq!(scale, "hexaco");
            assert_eq!(column, "hexaco_61");
        }
        other => panic!("expected unknown column, got {other:?}"),
    }
}

#[test]
fn unknown_reversed_item_is_surfaced() {
    let definition = Instrument::Iri.definition().reversed([29]);
    let mut engine = ScoringEngine::new(uniform_table("iri", 28, 2.0, 2));
    assert!(matches!(
        engine.score_instrument(&definition),
        Err(ScoringError::UnknownColumn { column, .. }) if column == "iri_29"
    ));
}

#[test]
fn failed_scoring_leaves_accumulator_untouched() {
    let iri = Instrument::Iri.definition();
    let table = patterned_table(&iri, 3);
    let mut engine = ScoringEngine::new(table);
    engine.score(Instrument::Iri).expect("iri scores");
    let before = engine.accumulator().clone();

    let broken = iri.clone().subscale("extra", [99]);
    assert!(engine.score_instrument(&broken).is_err());
    assert_eq!(engine.accumulator(), &before);

    let out_of_range = with_cell(engine.responses(), "iri_5", 1, Some("9"));
    let mut strict = ScoringEngine::new(out_of_range);
    strict.score(Instrument::Iri).expect_err("out of range rejected");
    assert!(strict.accumulator().is_empty());
}

#[test]
fn missing_answer_propagates_to_affected_subscales_only() {
    let definition = Instrument::Iri.definition();
    let table = with_cell(&uniform_table("iri", 28, 2.0, 3), "iri_3", 1, None);
    let mut engine = ScoringEngine::new(table);
    let scored = engine.score_instrument(&definition).expect("scores");

    let perspective = scored
        .column("iri_perspective_taking")
        .expect("perspective taking");
    assert_eq!(perspective.values[1], Cell::Missing);
    assert!(perspective.values[0].as_number().is_some());

    let fantasy = scored.column("iri_fantasy").expect("fantasy");
    assert!(fantasy.values.iter().all(|cell| !cell.is_missing()));
}

#[test]
fn strict_bounds_reject_out_of_range_answers() {
    let table = with_cell(&uniform_table("hexaco", 60, 3.0, 2), "hexaco_7", 0, Some("6"));
    let mut engine = ScoringEngine::new(table);

    match engine.score(Instrument::Hexaco) {
        Err(ScoringError::OutOfRange {
            column,
            subject,
            value,
            min,
            max,
            ..
        }) => {
            assert_eq!(column, "hexaco_7");
            assert_eq!(subject, SubjectId::from("sub-001"));
            assert_close(value, 6.0);
            assert_eq!((min, max), (1, 5));
        }
        other => panic!("expected out of range, got {other:?}"),
    }
}

#[test]
fn unchecked_bounds_score_out_of_range_answers() {
    let table = with_cell(&uniform_table("hexaco", 60, 3.0, 2), "hexaco_7", 0, Some("6"));
    let options = ScoringOptions {
        bounds: BoundsPolicy::Unchecked,
    };
    let mut engine = ScoringEngine::with_options(table, options);
    let scored = engine.score(Instrument::Hexaco).expect("scores");

    // Item 7 is an openness item and is not reverse keyed.
    let openness = scored.column("hexaco_openness").expect("openness").numbers();
    assert_close(openness[0].expect("score"), (9.0 * 3.0 + 6.0) / 10.0);
    assert_close(openness[1].expect("score"), 3.0);
}

#[test]
fn infinite_answers_are_rejected_even_when_unchecked() {
    let table = with_cell(&uniform_table("iri", 28, 2.0, 2), "iri_3", 0, Some("inf"));
    let options = ScoringOptions {
        bounds: BoundsPolicy::Unchecked,
    };
    let mut engine = ScoringEngine::with_options(table, options);

    match engine.score(Instrument::Iri) {
        Err(ScoringError::InvalidResponse { column, value, .. }) => {
            assert_eq!(column, "iri_3");
            assert_eq!(value, "inf");
        }
        other => panic!("expected invalid response, got {other:?}"),
    }
    assert!(engine.accumulator().is_empty());
}

#[test]
fn non_numeric_answers_are_rejected() {
    let table = with_cell(&uniform_table("iri", 28, 2.0, 2), "iri_10", 1, Some("often"));
    let mut engine = ScoringEngine::new(table);

    match engine.score(Instrument::Iri) {
        Err(ScoringError::InvalidResponse {
            column, value, subject, ..
        }) => {
            assert_eq!(column, "iri_10");
            assert_eq!(value, "often");
            assert_eq!(subject, SubjectId::from("sub-002"));
        }
        other => panic!("expected invalid response, got {other:?}"),
    }
}

#[test]
fn renamed_scale_reads_and_writes_new_prefix() {
    let definition = Instrument::Hexaco.definition().with_scale_name("hexaco_t2");
    let mut engine = ScoringEngine::new(uniform_table("hexaco_t2", 60, 3.0, 2));
    engine.score_instrument(&definition).expect("scores");

    let joined = engine.join().expect("joins");
    assert!(joined.column("hexaco_t2_openness").is_some());
    assert_eq!(engine.accumulator().keys().collect::<Vec<_>>(), vec!["hexaco_t2"]);
}

#[test]
fn retained_columns_join_after_scores() {
    let definitions = [Instrument::Iri.definition()];
    let mut engine = ScoringEngine::new(combined_table(&definitions, 2));
    engine.score(Instrument::Iri).expect("scores");
    engine
        .retain_items(Some(&["age".to_string()][..]))
        .expect("retains age");

    let joined = engine.join().expect("joins");
    let names = joined.column_names();
    assert_eq!(names.last(), Some(&"age"));
    assert_eq!(
        joined.value(&SubjectId::from("sub-002"), "age"),
        Some(&Cell::Text("21".to_string()))
    );
    assert!(engine.accumulator().get(RETAINED_KEY).is_some());
}

#[test]
fn custom_scale_cannot_take_the_retained_key() {
    let table = ResponseTable::from_reader(
        std::io::Cursor::new("id,age,other_1,other_2\nA,30,2,4\nB,41,5,1\n"),
        "id",
        b',',
    )
    .expect("table parses");
    let mut engine = ScoringEngine::new(table);
    let clash = ScaleDefinition::new(RETAINED_KEY, 2, (1, 5), Aggregation::Sum)
        .subscale("total", [1, 2]);

    assert!(matches!(
        engine.score_instrument(&clash),
        Err(ScoringError::InvalidDefinition(
            DefinitionError::ReservedScaleName { .. }
        ))
    ));
    assert!(engine.accumulator().is_empty());

    engine
        .retain_items(Some(&["age".to_string()][..]))
        .expect("retains age");
    assert_eq!(engine.join().expect("joins").column_names(), vec!["age"]);
}

#[test]
fn retaining_everything_copies_every_raw_column() {
    let table: ResponseTable = uniform_table("iri", 28, 2.0, 2);
    let mut engine = ScoringEngine::new(table);
    let retained = engine.retain_items(None).expect("retains");
    assert_eq!(retained.columns.len(), 28);
}

#[test]
fn retaining_unknown_column_fails() {
    let mut engine = ScoringEngine::new(uniform_table("iri", 28, 2.0, 2));
    match engine.retain_items(Some(&["handedness".to_string()][..])) {
        Err(ScoringError::UnknownColumn { scale, column }) => {
            assert_eq!(scale, RETAINED_KEY);
            assert_eq!(column, "handedness");
        }
        other => panic!("expected unknown column, got {other:?}"),
    }
}
