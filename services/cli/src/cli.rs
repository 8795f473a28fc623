use crate::infra::{parse_bounds, parse_instrument, parse_scale_name, parse_separator};
use crate::survey::{run_instruments, run_score, run_select};
use crate::timing::run_timing;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lsan_tools::error::AppError;
use lsan_tools::survey::{BoundsPolicy, Instrument};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "lsan",
    about = "Score questionnaires and prepare fMRI event timing for lab studies",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score questionnaires from a survey export and join the results per subject
    Score(ScoreArgs),
    /// Keep only selected subjects from a survey export
    Select(SelectArgs),
    /// Write AFNI timing files from BIDS events
    Timing(TimingArgs),
    /// List the built-in instruments and their scoring keys
    Instruments(InstrumentsArgs),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Survey export with one row per subject: delimited text or .xlsx
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Worksheet to read from an .xlsx input and to name in an .xlsx output
    #[arg(long)]
    pub(crate) sheet: Option<String>,
    /// Subject identifier column (defaults to LSAN_INDEX_COLUMN)
    #[arg(long)]
    pub(crate) index_column: Option<String>,
    /// Built-in instrument to score; repeat for several
    #[arg(long = "instrument", value_parser = parse_instrument)]
    pub(crate) instruments: Vec<Instrument>,
    /// Score every built-in instrument
    #[arg(long, conflicts_with = "instruments")]
    pub(crate) all_instruments: bool,
    /// JSON file with one or more custom scale definitions
    #[arg(long = "definition")]
    pub(crate) definitions: Vec<PathBuf>,
    /// Read an instrument from a different column prefix, e.g. hexaco=hexaco_t2
    #[arg(long = "scale-name", value_parser = parse_scale_name)]
    pub(crate) scale_names: Vec<(Instrument, String)>,
    /// Comma-separated subject IDs or a path to a file with one ID per line
    #[arg(long, conflicts_with = "subjects_file")]
    pub(crate) subjects: Option<String>,
    /// File with one subject ID per line
    #[arg(long)]
    pub(crate) subjects_file: Option<PathBuf>,
    /// Raw column to carry into the output; repeat for several
    #[arg(long)]
    pub(crate) retain: Vec<String>,
    /// Carry every raw column into the output
    #[arg(long, conflicts_with = "retain")]
    pub(crate) retain_all: bool,
    /// Destination file (defaults to stdout)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Output format; defaults to xlsx for an .xlsx output path, csv otherwise
    #[arg(long, value_enum)]
    pub(crate) format: Option<OutputFormat>,
    /// Field delimiter for input and output, e.g. ',' or '\t'
    #[arg(long, value_parser = parse_separator)]
    pub(crate) separator: Option<u8>,
    /// Response bounds policy: strict or unchecked
    #[arg(long, value_parser = parse_bounds)]
    pub(crate) bounds: Option<BoundsPolicy>,
}

#[derive(Args, Debug)]
pub(crate) struct SelectArgs {
    /// Survey export: delimited text or .xlsx
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Worksheet to read from an .xlsx input and to name in an .xlsx output
    #[arg(long)]
    pub(crate) sheet: Option<String>,
    #[arg(long)]
    pub(crate) index_column: Option<String>,
    /// Comma-separated subject IDs or a path to a file with one ID per line
    #[arg(long, required_unless_present = "subjects_file", conflicts_with = "subjects_file")]
    pub(crate) subjects: Option<String>,
    /// File with one subject ID per line
    #[arg(long)]
    pub(crate) subjects_file: Option<PathBuf>,
    /// Destination; an .xlsx extension writes a workbook
    #[arg(long)]
    pub(crate) output: PathBuf,
    #[arg(long, value_parser = parse_separator)]
    pub(crate) separator: Option<u8>,
}

#[derive(Args, Debug)]
pub(crate) struct TimingArgs {
    /// BIDS dataset root
    #[arg(long)]
    pub(crate) bids_dir: PathBuf,
    /// Task label as used in `task-<label>`
    #[arg(long)]
    pub(crate) task: String,
    /// Trial-type column; defaults to every column after onset and duration
    #[arg(long = "trial-type")]
    pub(crate) trial_types: Vec<String>,
    /// Subject label, with or without `sub-`; defaults to every subject
    #[arg(long = "subject")]
    pub(crate) subjects: Vec<String>,
    /// Seconds removed from every onset (defaults to LSAN_TRIM_SECONDS)
    #[arg(long)]
    pub(crate) trim: Option<f64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct InstrumentsArgs {
    /// Print the full scoring keys as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Score(args) => run_score(args),
        Command::Select(args) => run_select(args),
        Command::Timing(args) => run_timing(args),
        Command::Instruments(args) => run_instruments(args),
    }
}
