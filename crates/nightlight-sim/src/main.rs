// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Nightlight network simulator
//!
//! Runs a handful of standard nodes on one in-memory ether. Console lines
//! typed on stdin go to node 0 (`20 controller`, then `10` to send a beat);
//! every node's console output is echoed with its offset in front.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use nightlight_behaviors::{standard_node, StandardNode, StandardStates};
use nightlight_config::{find_config_file, load_config, validate_config, ConfigError, NightlightConfig};
use nightlight_hal::{
    EntropySource, Ether, FixedEntropy, OsEntropy, SerialIO, SimGpio, SimRadio, SimSerial, StdioSerial,
    SystemClock, TimeProvider,
};
use nightlight_observability::{debug_flags_help, CrateDebugFlags, LoggingSettings, DEBUG_ENV_VAR};

/// Simulated nightlight network with an operator console on stdin
#[derive(Parser, Debug)]
#[command(name = "nightlight-sim", version, author, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Number of nodes on the ether
    #[arg(short, long, default_value_t = 3)]
    nodes: usize,

    /// Path to nightlight.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scheduler period in milliseconds
    #[arg(long, default_value_t = 10)]
    tick_ms: u32,

    /// Base entropy seed; node i boots with seed + i (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

struct SimNode {
    node: StandardNode<SimRadio, SimSerial, SystemClock, SimGpio>,
    serial: SimSerial,
}

/// Split `--debug-*` flags from the arguments clap understands
fn split_debug_flags(args: impl IntoIterator<Item = String>) -> (Vec<String>, Vec<String>) {
    args.into_iter().partition(|arg| !arg.starts_with("--debug-"))
}

fn load(path: Option<&PathBuf>) -> Result<NightlightConfig> {
    let config = match path {
        Some(path) => load_config(Some(path.as_path()), None).with_context(|| format!("loading {}", path.display()))?,
        None => match find_config_file() {
            Ok(found) => load_config(Some(found.as_path()), None).with_context(|| format!("loading {}", found.display()))?,
            Err(ConfigError::FileNotFound(_)) => NightlightConfig::default(),
            Err(e) => return Err(e.into()),
        },
    };
    validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

fn spawn_nodes(args: &Args, config: &NightlightConfig) -> Result<Vec<SimNode>> {
    let ether = Ether::new();
    let clock = SystemClock::new();
    let mut nodes = Vec::with_capacity(args.nodes);

    let mut config = config.clone();
    if args.nodes > 1 && config.node.personal_offset.take().is_some() {
        warn!("node.personal_offset ignored, every simulated node picks its own");
    }

    for index in 0..args.nodes {
        let seed = match args.seed {
            Some(base) => base.wrapping_add(index as u64),
            None => OsEntropy.seed(),
        };
        let serial = SimSerial::new();
        let (node, states, _): (_, StandardStates, _) = standard_node(
            ether.radio(),
            serial.clone(),
            clock,
            SimGpio::new(),
            &mut FixedEntropy(seed),
            &config,
        )
        .with_context(|| format!("booting node {}", index))?;

        let offset = node.identity().personal_offset();
        if nodes.iter().any(|other: &SimNode| other.node.identity().personal_offset() == offset) {
            warn!(offset, "offset collision, both nodes share an address");
        }
        info!(index, offset, stack = ?node.engine().stack_names(), states = ?states, "node up");
        nodes.push(SimNode { node, serial });
    }
    Ok(nodes)
}

fn run(args: &Args, config: &NightlightConfig, running: Arc<AtomicBool>) -> Result<()> {
    let mut nodes = spawn_nodes(args, config)?;
    let mut console = StdioSerial::spawn().context("starting stdin reader")?;
    let clock = SystemClock::new();

    info!(nodes = nodes.len(), tick_ms = args.tick_ms, "simulation running (Ctrl+C to stop)");

    while running.load(Ordering::SeqCst) {
        if let Some(operator) = nodes.first() {
            while let Some(line) = console.read_line() {
                operator.serial.push_line(line);
            }
        }

        for sim in nodes.iter_mut() {
            let offset = sim.node.identity().personal_offset();
            sim.node
                .tick()
                .with_context(|| format!("node {:02X} faulted", offset))?;
            for line in sim.serial.take_output() {
                println!("[{:02X}] {}", offset, line);
            }
        }

        clock.delay_ms(args.tick_ms);
    }

    info!("simulation stopped");
    Ok(())
}

fn main() -> Result<()> {
    let (cli_args, debug_args) = split_debug_flags(std::env::args());
    let args = Args::parse_from(cli_args);

    let mut debug_flags = CrateDebugFlags::from_args(debug_args);
    if let Ok(value) = std::env::var(DEBUG_ENV_VAR) {
        debug_flags.merge_env_value(&value);
    }

    // Logging settings live in the config, so a bad file is reported before
    // the subscriber exists
    let config = load(args.config.as_ref())?;
    let settings = LoggingSettings {
        level: config.logging.level.clone(),
        file: config.logging.file.as_ref().map(PathBuf::from),
    };
    let _logging = nightlight_observability::init_logging(&debug_flags, &settings)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl+C handler")?;

    run(&args, &config, running)
}
