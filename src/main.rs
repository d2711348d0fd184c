mod cli;
mod commands;
mod logging;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = storage::load_config()?;
    let level = args.log_level.as_deref().unwrap_or(config.log_level.as_str());
    logging::init_logging(level, &storage::log_dir()?)?;

    let command = args.command.unwrap_or(cli::Command::Tui {
        source: cli::Source::default(),
        date: None,
    });
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Merge { source, date } => commands::merge(&source, date),
        cli::Command::Day {
            source,
            date,
            px_per_hour,
            yaml,
        } => commands::day(&config, &source, date, px_per_hour, yaml),
        cli::Command::Week {
            source,
            date,
            px_per_hour,
        } => commands::week(&config, &source, date, px_per_hour),
        cli::Command::Check { source } => commands::check(&source),
        cli::Command::Tui { source, date } => commands::tui(config, &source, date),
    }
}
