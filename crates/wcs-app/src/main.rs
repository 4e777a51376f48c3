//! Weapon control system binary.
//!
//! Wires the configuration, persistence services and the weapon-control
//! service together, spawns the control loops, and pumps JSON-framed
//! commands from stdin (the stand-in for the external wire transport:
//! one `WcsCommand` per line).

mod runtime;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use wcs_core::commands::WcsCommand;
use wcs_core::config::WcsConfig;
use wcs_core::constants::TARGET_MAX_AGE;
use wcs_launch::WeaponControlService;
use wcs_store::{MinePlanStore, TargetRegistry};

#[derive(Parser, Debug)]
#[command(name = "wcs", about = "Shipboard weapon control system core")]
struct Args {
    /// INI configuration file. Defaults apply when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => match WcsConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!(%err, "failed to load configuration");
                std::process::exit(1);
            }
        },
        None => WcsConfig::default(),
    };

    let plans = Arc::new(MinePlanStore::new(
        config.paths.mine_data_path.clone(),
        config.mine_plan.max_plan_lists,
        config.mine_plan.max_plans_per_list,
    ));
    let targets = Arc::new(TargetRegistry::new(TARGET_MAX_AGE));
    let service = Arc::new(WeaponControlService::new(config.clone(), plans, targets));

    if let Err(err) = service.initialize() {
        error!(%err, "service initialization failed");
        std::process::exit(1);
    }

    // The outward reporting surface: every event goes to the log stream.
    service.set_event_callback(Box::new(|event| {
        info!(event = ?event, "report");
    }));

    let runtime = runtime::spawn_runtime(Arc::clone(&service), &config);
    info!("wcs running, reading commands from stdin");

    // One JSON command per line until EOF or an explicit Shutdown.
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(%err, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WcsCommand>(&line) {
            Ok(WcsCommand::Shutdown) => {
                runtime.submit(WcsCommand::Shutdown);
                break;
            }
            Ok(command) => runtime.submit(command),
            Err(err) => warn!(%err, line = %line, "unparseable command"),
        }
    }

    runtime.shutdown();
    service.shutdown();
    info!("wcs stopped");
}
