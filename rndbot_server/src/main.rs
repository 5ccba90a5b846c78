//! Standalone random bot population server.
//!
//! Owns one scheduler driven by a `SchedulerActor`, serves the remote text
//! protocol over TCP and exports population metrics.

mod config;
mod logging;
mod metrics;
mod remote;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rndbot::{
    RandomBotManager, SchedulerActor,
    db::Database,
    host::{SimulatedWorld, SystemClock},
    scheduler::{TickReport, spawn_stats_reporter},
};
use tokio::sync::{mpsc, watch};

use crate::config::{Overrides, ServerConfig, StorageMode};

const HELP: &str = "\
Run the random bot population server

USAGE:
  rndbot_server [OPTIONS]

OPTIONS:
  --bind-remote  IP:PORT   Remote command bind address    [default: env RNDBOT_REMOTE_BIND or 127.0.0.1:7878]
  --metrics      IP:PORT   Prometheus exporter address    [default: env RNDBOT_METRICS_BIND, disabled when unset]
  --storage      MODE      postgres or memory             [default: env RNDBOT_STORAGE or postgres]
  --roster       N         Bot accounts seeded in memory mode

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string (postgres mode)
  RNDBOT_MIN_BOTS          Lower bound of the online bot target
  RNDBOT_MAX_BOTS          Upper bound of the online bot target
  (See .env.example for all configuration options)
";

struct Args {
    remote_bind: Option<SocketAddr>,
    metrics_bind: Option<SocketAddr>,
    storage: Option<StorageMode>,
    roster_accounts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        remote_bind: pargs.opt_value_from_str("--bind-remote")?,
        metrics_bind: pargs.opt_value_from_str("--metrics")?,
        storage: pargs.opt_value_from_str("--storage")?,
        roster_accounts: pargs.opt_value_from_str("--roster")?,
    };

    logging::init();

    let config = ServerConfig::from_env(Overrides {
        remote_bind: args.remote_bind,
        metrics_bind: args.metrics_bind,
        storage: args.storage,
        roster_accounts: args.roster_accounts,
    })?;
    config.validate()?;

    info!(
        "Starting random bot server ({} storage, {}-{} bots)",
        config.storage, config.bots.min_random_bots, config.bots.max_random_bots
    );

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Metrics exported at http://{}/metrics", addr);
    }

    // Catching signals for graceful shutdown.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    let mut database = None;
    let (repos, world) = match config.storage {
        StorageMode::Postgres => {
            let db_config = config
                .database
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Database configuration missing in postgres mode"))?;
            let db = Database::new(&db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            info!("Database connected successfully");

            let repos = db.repositories();
            let mut world = SimulatedWorld::new();
            let loaded = seed::load_roster(&repos, &config.bots, &mut world).await?;
            info!("Loaded {} bot characters", loaded);
            database = Some(db);
            (repos, world)
        }
        StorageMode::Memory => {
            let roster = seed::memory_roster(&config.bots, config.roster_accounts, &mut rand::rng());
            info!(
                "Seeded {} bot characters on {} accounts",
                roster.characters, config.roster_accounts
            );
            (roster.repos, roster.world)
        }
    };

    let (stats_tx, stats_rx) = mpsc::channel(16);
    let mut manager = RandomBotManager::new(
        config.bots.clone(),
        world,
        repos,
        Arc::new(SystemClock),
        StdRng::from_os_rng(),
    )
    .with_stats_channel(stats_tx);

    let report = manager.init().await?;
    info!(
        "Accounts ready: {} general, {} class coverage",
        report.general_total, report.class_total
    );

    let reporter = spawn_stats_reporter(stats_rx, |stats| {
        metrics::record_stats(stats);
        logging::log_stats_json(stats);
    });

    let (actor, handle) = SchedulerActor::new(manager);
    let actor = actor.with_tick_observer(Box::new(|tick: &TickReport, elapsed: Duration| {
        logging::log_tick(tick, elapsed);
        metrics::record_tick(tick, elapsed);
    }));
    let scheduler = tokio::spawn(actor.run());

    let listener = tokio::net::TcpListener::bind(config.remote_bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.remote_bind, e))?;
    info!(
        "Remote commands accepted on {}. Press Ctrl+C to stop.",
        config.remote_bind
    );
    let mut remote_server = tokio::spawn(remote::serve(listener, handle.clone()));

    tokio::select! {
        _ = shutdown_rx.changed() => {}
        result = &mut remote_server => {
            match result {
                Ok(Err(e)) => log::error!("Remote server failed: {}", e),
                Err(e) => log::error!("Remote server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
    }

    info!("Shutting down server...");
    remote_server.abort();
    if let Err(e) = handle.shutdown().await {
        log::warn!("{}", e);
    }
    drop(handle);

    let manager = scheduler.await?;
    info!("Scheduler stopped with {} tracked bots", manager.current_bots().len());

    // The reporter ends once the manager's stats sender is gone
    drop(manager);
    let _ = reporter.await;

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}
