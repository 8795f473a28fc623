use super::common::*;
use crate::survey::{
    aggregate_subscale, reverse_code, Aggregation, BoundsPolicy, Instrument, ItemTable,
    ScaleBinding, ScoringEngine,
};

#[test]
fn subscale_scores_stay_within_scaled_bounds_for_every_instrument() {
    for instrument in Instrument::ALL {
        let definition = instrument.definition();
        let mut engine = ScoringEngine::new(patterned_table(&definition, 9));
        let scored = engine.score(instrument).expect("instrument scores");

        let min = f64::from(definition.min_scale);
        let max = f64::from(definition.max_scale);

        for subscale in &definition.subscales {
            let column = scored
                .column(&definition.subscale_column(subscale))
                .expect("subscale column present");
            let references = subscale.items.len() as f64;
            let (low, high) = match definition.aggregation {
                Aggregation::Sum => (min * references, max * references),
                Aggregation::Mean => (min, max),
            };

            for value in column.numbers() {
                let value = value.expect("complete data scores");
                assert!(
                    (low..=high).contains(&value),
                    "{} {} = {value} outside {low}..={high}",
                    definition.scale_name,
                    subscale.name
                );
            }
        }
    }
}

#[test]
fn reverse_coding_twice_restores_the_original_answers() {
    for instrument in [Instrument::Hexaco, Instrument::Isel, Instrument::PpiLong] {
        let definition = instrument.definition();
        let table = patterned_table(&definition, 6);
        let binding = ScaleBinding::bind(&table, &definition).expect("binds");
        let items = ItemTable::load(&table, &binding, BoundsPolicy::Strict).expect("loads");

        let reversed_items = || definition.reversed_items.iter().copied();
        let once = reverse_code(
            &items,
            reversed_items(),
            definition.min_scale,
            definition.max_scale,
        )
        .expect("first pass");
        let twice = reverse_code(
            &once,
            reversed_items(),
            definition.min_scale,
            definition.max_scale,
        )
        .expect("second pass");

        assert_ne!(once, items, "{} has reversed items", definition.scale_name);
        assert_eq!(twice, items);
    }
}

#[test]
fn mean_equals_sum_divided_by_reference_count() {
    let definition = Instrument::PpiShort.definition();
    let table = patterned_table(&definition, 7);
    let binding = ScaleBinding::bind(&table, &definition).expect("binds");
    let items = ItemTable::load(&table, &binding, BoundsPolicy::Strict).expect("loads");

    for subscale in &definition.subscales {
        let sums = aggregate_subscale(&items, &subscale.items, Aggregation::Sum).expect("sum");
        let means = aggregate_subscale(&items, &subscale.items, Aggregation::Mean).expect("mean");
        let references = subscale.items.len() as f64;

        for (sum, mean) in sums.iter().zip(&means) {
            assert_close(
                mean.expect("mean present"),
                sum.expect("sum present") / references,
            );
        }
    }
}

#[test]
fn repeated_item_references_count_each_time() {
    let definition = Instrument::Iri.definition();
    let table = uniform_table("iri", 28, 2.0, 2);
    let binding = ScaleBinding::bind(&table, &definition).expect("binds");
    let items = ItemTable::load(&table, &binding, BoundsPolicy::Strict).expect("loads");

    let sums = aggregate_subscale(&items, &[1, 1, 2], Aggregation::Sum).expect("sum");
    assert_eq!(sums, vec![Some(6.0), Some(6.0)]);

    let means = aggregate_subscale(&items, &[1, 1, 2], Aggregation::Mean).expect("mean");
    assert_eq!(means, vec![Some(2.0), Some(2.0)]);
}

#[test]
fn composite_subscales_equal_the_sum_of_their_facets() {
    let definition = Instrument::PpiLong.definition();
    let mut engine = ScoringEngine::new(patterned_table(&definition, 4));
    let scored = engine.score(Instrument::PpiLong).expect("ppi long scores");

    let column = |name: &str| {
        scored
            .column(&format!("ppi_long_{name}"))
            .expect("column present")
            .numbers()
    };

    let composite = column("fearless_dominance");
    let facets = [
        column("social_influence"),
        column("fearlessness"),
        column("stress_immunity"),
    ];

    for (row, value) in composite.iter().enumerate() {
        let expected: f64 = facets
            .iter()
            .map(|facet| facet[row].expect("facet score"))
            .sum();
        assert_close(value.expect("composite score"), expected);
    }
}
