use crate::cli::{InstrumentsArgs, ScoreArgs, SelectArgs};
use crate::infra::{bootstrap, read_responses, resolve_format, subject_selector, write_joined};
use lsan_tools::error::AppError;
use lsan_tools::survey::{
    default_sheet_name, is_spreadsheet, load_definitions, Instrument, ScaleDefinition,
    ScoringEngine, ScoringOptions,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = bootstrap()?;
    let index_column = args
        .index_column
        .clone()
        .unwrap_or(config.survey.index_column);
    let separator = args.separator.unwrap_or(config.survey.separator);
    let bounds = args.bounds.unwrap_or(config.survey.bounds);

    let definitions = collect_definitions(&args)?;
    if definitions.is_empty() && args.retain.is_empty() && !args.retain_all {
        return Err(AppError::Usage(
            "nothing to score: pass --instrument, --all-instruments or --definition".to_string(),
        ));
    }

    let sheet = args.sheet.as_deref();
    let mut responses = read_responses(&args.input, sheet, &index_column, separator)?;
    let selector = subject_selector(args.subjects.as_deref(), args.subjects_file.as_deref())?;
    if let Some(selector) = selector {
        responses = responses.select(&selector)?;
    }

    let mut engine = ScoringEngine::with_options(responses, ScoringOptions { bounds });
    engine.score_all(&definitions)?;

    if args.retain_all {
        engine.retain_items(None)?;
    } else if !args.retain.is_empty() {
        engine.retain_items(Some(args.retain.as_slice()))?;
    }

    let joined = engine.join()?;
    let output = args.output.as_deref();
    let format = resolve_format(args.format, output);
    write_joined(&joined, output, format, separator, sheet)
}

/// Built-in instruments first (with any prefix overrides applied), then
/// definitions read from JSON files, in the order given.
fn collect_definitions(args: &ScoreArgs) -> Result<Vec<ScaleDefinition>, AppError> {
    let instruments: Vec<Instrument> = if args.all_instruments {
        Instrument::ALL.to_vec()
    } else {
        args.instruments.clone()
    };

    for (instrument, _) in &args.scale_names {
        if !instruments.contains(instrument) {
            return Err(AppError::Usage(format!(
                "--scale-name given for '{instrument}', which is not being scored"
            )));
        }
    }

    let mut definitions: Vec<ScaleDefinition> = instruments
        .iter()
        .map(|&instrument| {
            let definition = instrument.definition();
            match args
                .scale_names
                .iter()
                .rev()
                .find(|(candidate, _)| *candidate == instrument)
            {
                Some((_, prefix)) => definition.with_scale_name(prefix.clone()),
                None => definition,
            }
        })
        .collect();

    for path in &args.definitions {
        let loaded = load_definitions(path)?;
        info!(
            path = %path.display(),
            definitions = loaded.len(),
            "loaded custom scale definitions"
        );
        definitions.extend(loaded);
    }

    Ok(definitions)
}

pub(crate) fn run_select(args: SelectArgs) -> Result<(), AppError> {
    let config = bootstrap()?;
    let index_column = args.index_column.unwrap_or(config.survey.index_column);
    let separator = args.separator.unwrap_or(config.survey.separator);

    let sheet = args.sheet.as_deref();
    let responses = read_responses(&args.input, sheet, &index_column, separator)?;
    let selector = subject_selector(args.subjects.as_deref(), args.subjects_file.as_deref())?
        .ok_or_else(|| AppError::Usage("pass --subjects or --subjects-file".to_string()))?;
    let selected = responses.select(&selector)?;

    if is_spreadsheet(&args.output) {
        let sheet = sheet.map_or_else(|| default_sheet_name(&args.output), str::to_string);
        selected.write_xlsx(&args.output, &sheet)?;
    } else {
        let writer = BufWriter::new(File::create(&args.output)?);
        selected.write_delimited(writer, separator)?;
    }
    info!(
        path = %args.output.display(),
        subjects = selected.n_subjects(),
        "wrote selected responses"
    );
    Ok(())
}

#[derive(Serialize)]
struct InstrumentSummary {
    instrument: Instrument,
    label: &'static str,
    #[serde(flatten)]
    definition: ScaleDefinition,
}

pub(crate) fn run_instruments(args: InstrumentsArgs) -> Result<(), AppError> {
    if args.json {
        let summaries: Vec<InstrumentSummary> = Instrument::ALL
            .iter()
            .map(|&instrument| InstrumentSummary {
                instrument,
                label: instrument.label(),
                definition: instrument.definition(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for instrument in Instrument::ALL {
        let definition = instrument.definition();
        println!("{} ({})", definition.scale_name, instrument.label());
        println!(
            "  items: {}  responses: {}..={}  aggregation: {}  reversed: {}",
            definition.total_items,
            definition.min_scale,
            definition.max_scale,
            definition.aggregation.label(),
            definition.reversed_items.len()
        );
        for subscale in &definition.subscales {
            println!(
                "  - {} ({} items)",
                definition.subscale_column(subscale),
                subscale.items.len()
            );
        }
    }
    Ok(())
}
