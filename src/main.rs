//! # Report-card portal entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Load config, apply --data-dir / --bind overrides
//!   ├─> Initialize logging
//!   └─> Run the command on a Tokio runtime (serve when none is given)
//! ```
//!
//! ```bash
//! reportcard --data-dir /srv/school serve --bind 0.0.0.0:3000
//! reportcard validate --pin 1234 --name john --class 5a --session 2023 --term 1
//! reportcard show
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Command output goes to stdout

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.load_config()?;

    reportcard::logging::init(config.log_dir.as_deref())?;

    let command = cli
        .command
        .unwrap_or(cli::Commands::Serve { bind: None });

    tokio::runtime::Runtime::new()
        .context("Failed to start async runtime")?
        .block_on(cli::run_command(command, config))
}
