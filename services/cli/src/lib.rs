mod cli;
mod infra;
mod survey;
mod timing;

use lsan_tools::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
