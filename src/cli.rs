use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "menuwatch")]
#[command(about = "Monitors a menu catalog for items that went off or disappeared")]
#[command(version)]
pub struct Cli {
    /// What to run
    #[arg(long, value_enum, default_value_t = Mode::Monitor)]
    pub mode: Mode,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Diff the feed against the last snapshot, update history and publish
    Monitor,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Directory holding the state, history and report files (defaults to cwd)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Item feed to read, relative to the root
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Skip remote sync and chat alerts
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Print the run outcome as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Debug logging and extra run details
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}
