use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "daygrid",
    version,
    about = "Merged multi-account calendar timelines in the terminal"
)]
pub struct Cli {
    /// Log level written to the log file (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Source {
    /// Events file (YAML or JSON); defaults to .daygrid/events.yml lookup
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
    /// Only include events from this account (repeatable)
    #[arg(long = "account", short = 'a')]
    pub accounts: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty events file in the current directory
    Init,
    /// Print a date's events after merging cross-account duplicates
    Merge {
        #[command(flatten)]
        source: Source,
        /// Date in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
    /// Print the timeline layout of a single day
    Day {
        #[command(flatten)]
        source: Source,
        /// Date in YYYY-MM-DD format (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
        /// Vertical scale override
        #[arg(long)]
        px_per_hour: Option<f64>,
        /// Emit the layout as YAML instead of a table
        #[arg(long)]
        yaml: bool,
    },
    /// Print the timeline layout of the week containing a date
    Week {
        #[command(flatten)]
        source: Source,
        /// Any date in the week, YYYY-MM-DD (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
        /// Vertical scale override
        #[arg(long)]
        px_per_hour: Option<f64>,
    },
    /// Report events that cannot be placed on the timeline
    Check {
        #[command(flatten)]
        source: Source,
    },
    /// Launch the interactive timeline
    Tui {
        #[command(flatten)]
        source: Source,
        /// Date to open on, YYYY-MM-DD (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },
}
