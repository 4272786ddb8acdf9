//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

/// Loop system-wide mouse and keyboard input back through the OS
#[derive(Parser, Debug)]
#[command(name = "inputloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (defaults to ./inputloop.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Start with throughput reporting enabled
    #[arg(short, long)]
    pub profile: bool,

    /// Start with capture blocked
    #[arg(short, long)]
    pub blocked: bool,
}

impl Cli {
    /// Parse process arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
