//! Survey Insights - command line entry point.

use clap::Parser;
use survey_insights::cli::{self, Cli};
use survey_insights::logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_config())?;
    cli::run(&cli)
}
