// SPDX-License-Identifier: MIT OR Apache-2.0
//! `flowdeck` - command line host for the flow graph model.
//!
//! Loads a flow document and either renders it to the node/edge JSON a
//! rendering surface consumes, validates its wiring, or replays a scripted
//! simulation against it. Logs go to stderr; command output to stdout.

mod commands;
mod error;
mod simulate;

use clap::{Parser, Subcommand};
use error::{read_file, CliError, Result};
use flowdeck_graph::NodeRegistry;
use flowdeck_store::StoreConfig;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "warn,flowdeck_cli=info,flowdeck_store=info,flowdeck_graph=info";

/// Render, validate and simulate monitoring flows
#[derive(Parser, Debug)]
#[command(name = "flowdeck", version, about, long_about = None)]
struct Cli {
    /// Store configuration file (RON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in node palette
    Types,

    /// Print the render graph of a flow as JSON
    Render {
        /// Flow JSON file
        flow: PathBuf,
        /// Node IDs to mark active
        #[arg(short, long, value_delimiter = ',')]
        active: Vec<String>,
    },

    /// Report structural problems in a flow
    Validate {
        /// Flow JSON file
        flow: PathBuf,
    },

    /// Replay a scripted simulation against a flow
    Simulate {
        /// Flow JSON file
        flow: PathBuf,
        /// Script JSON file: `[{"node": "id", "delay_ms": 100, "message": {...}}]`
        script: PathBuf,
        /// Eviction tick interval in milliseconds
        #[arg(long, default_value_t = 50)]
        tick_ms: u64,
    },
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("warn,flowdeck_cli=debug,flowdeck_store=debug,flowdeck_graph=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<StoreConfig> {
    match path {
        Some(path) => Ok(StoreConfig::load(path)?),
        None => Ok(StoreConfig::default()),
    }
}

fn run_simulation(flow: &Path, script: &Path, tick_ms: u64, config: StoreConfig) -> Result<()> {
    let mut store = commands::load_store(flow, config)?;
    let steps = simulate::parse_script(&read_file(script)?).map_err(CliError::Script)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(CliError::Runtime)?;
    let report = runtime.block_on(simulate::run(&mut store, steps, Duration::from_millis(tick_ms)));

    let simulation = store.simulation();
    tracing::info!(
        activations = report.activations.len(),
        evictions = report.evictions.len(),
        logged = simulation.event_count(),
        capacity = simulation.capacity(),
        window_ms = simulation.active().window().as_millis() as u64,
        "Simulation finished"
    );
    let events: Vec<_> = simulation.events().collect();
    println!("{}", commands::to_json(&events)?);
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    let registry = NodeRegistry::builtin();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Types => {
            print!("{}", commands::describe_types(&registry));
        }
        Command::Render { flow, active } => {
            let graph = commands::render(&flow, &active, &registry, config)?;
            println!("{}", commands::to_json(&graph)?);
        }
        Command::Validate { flow } => {
            let issues = commands::validate(&flow, &registry, config)?;
            print!("{}", commands::format_issues(&issues));
            if flowdeck_graph::validate::has_errors(&issues) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Simulate {
            flow,
            script,
            tick_ms,
        } => run_simulation(&flow, &script, tick_ms.max(1), config)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::debug!("Starting flowdeck v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
