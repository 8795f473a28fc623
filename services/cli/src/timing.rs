use crate::cli::TimingArgs;
use crate::infra::bootstrap;
use lsan_tools::error::AppError;
use lsan_tools::timing::{extract, write_timing_files, TimingRequest};

pub(crate) fn run_timing(args: TimingArgs) -> Result<(), AppError> {
    let config = bootstrap()?;
    let trim_seconds = args.trim.unwrap_or(config.timing.trim_seconds);
    if !trim_seconds.is_finite() || trim_seconds < 0.0 {
        return Err(AppError::Usage(
            "--trim must be a non-negative number of seconds".to_string(),
        ));
    }

    let request = TimingRequest {
        subjects: args.subjects,
        trial_types: args.trial_types,
        ..TimingRequest::new(args.task, trim_seconds)
    };

    let timings = extract(&args.bids_dir, &request)?;
    let written = write_timing_files(&args.bids_dir, &request.task, &timings)?;

    println!(
        "wrote {} timing files for {} subjects (task '{}')",
        written.len(),
        timings.len(),
        request.task
    );
    Ok(())
}
