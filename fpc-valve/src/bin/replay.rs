//! Valve replay tool (fpc-replay)
//!
//! Feeds a command script through a comparison valve and prints every
//! emitted value as a JSON line on stdout. Logs go to stderr.
//!
//! **Usage:**
//! ```bash
//! fpc-replay [--config <file>] [--initial-mode passthrough] [--via-bus] <script|->
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fpc_common::config::{ConfigResolver, TomlConfig};
use fpc_common::ValveMode;
use fpc_valve::replay::Replay;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for fpc-replay
#[derive(Parser, Debug)]
#[command(name = "fpc-replay")]
#[command(about = "Replay a command script through a merge/passthrough valve")]
#[command(version)]
struct Args {
    /// Config file (overrides FPC_CONFIG and the platform default)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Mode the valve starts in (overrides the config file)
    #[arg(long, value_name = "MODE")]
    initial_mode: Option<ValveMode>,

    /// Deliver commands through the event bus (sized by valve.bus_capacity)
    #[arg(long)]
    via_bus: bool,

    /// Script to replay, or "-" for stdin
    script: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = ConfigResolver::new(args.config.clone()).resolve();
    let config = TomlConfig::load_or_default(config_path.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fpc_valve={0},fpc_replay={0}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mode = args.initial_mode.unwrap_or(config.valve.initial_mode);
    info!("Starting fpc-replay in {} mode", mode);

    let mut replay = if args.via_bus {
        info!("Routing commands through event bus (capacity {})", config.valve.bus_capacity);
        Replay::with_bus(mode, config.valve.bus_capacity).context("Failed to create event bus")?
    } else {
        Replay::new(mode)
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = if args.script == "-" {
        replay.run(io::stdin().lock(), &mut out)
    } else {
        let file = File::open(&args.script).with_context(|| format!("Failed to open script {}", args.script))?;
        replay.run(BufReader::new(file), &mut out)
    }
    .context("Replay failed")?;

    info!(
        "Replayed {} commands, {} records written",
        summary.commands, summary.records
    );
    Ok(())
}
