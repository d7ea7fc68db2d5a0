//! # Sorter Node Binary
//!
//! One process per belt half. Both processes share a service directory in
//! which each attaches its own endpoint and connects to the peer's.
//!
//! # Usage
//!
//! ```bash
//! # Master with defaults
//! sorter --role master
//!
//! # Slave with a pusher, custom endpoint directory, verbose logging
//! sorter --role slave --pusher --service-dir /run/sorter -v
//!
//! # From a node config file, JSON logs
//! sorter --config /etc/sorter/node.toml --json
//! ```

#![deny(warnings)]

use clap::Parser;
use sorter::Node;
use sorter_common::config::{ConfigLoader, LogLevel, NodeConfig};
use sorter_common::role::Role;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Sorter node - event bus, peer bridge, mode machine and heartbeat watchdog
#[derive(Parser, Debug)]
#[command(name = "sorter")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Conveyor sorting node (master or slave)")]
#[command(long_about = None)]
struct Args {
    /// Node configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Node role; overrides the config file
    #[arg(short, long)]
    role: Option<Role>,

    /// This belt has a pusher instead of a switch
    #[arg(short, long)]
    pusher: bool,

    /// Directory holding both nodes' service endpoints; overrides the config file
    #[arg(long, value_name = "DIR")]
    service_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Node startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);
    let config = config?;

    info!("Sorter node v{} starting...", env!("CARGO_PKG_VERSION"));

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let mut node = Node::start(&config)?;
    node.run(&running);
    node.shutdown();

    info!("Sorter node shutdown complete");
    Ok(())
}

/// Config file (or defaults) with CLI overrides applied.
fn load_config(args: &Args) -> Result<NodeConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::with_role(args.role.unwrap_or_default()),
    };
    if let Some(role) = args.role {
        config.node.role = role;
    }
    if args.pusher {
        config.node.pusher_mounted = true;
    }
    if let Some(dir) = &args.service_dir {
        config.node.service_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber. `RUST_LOG` wins over `-v`, which wins over the
/// configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
