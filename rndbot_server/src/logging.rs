//! Structured logging configuration.
//!
//! The library logs through the `log` facade; the subscriber installed here
//! picks those records up alongside native `tracing` events.

use rndbot::scheduler::{StatsReport, TickReport};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Ticks slower than this are reported at warn level
const SLOW_TICK: Duration = Duration::from_millis(500);

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// // in main()
/// logging::init();
/// tracing::info!("Server starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log one scheduler tick
///
/// # Arguments
///
/// * `report` - What the tick did
/// * `elapsed` - Wall time spent in the tick
pub fn log_tick(report: &TickReport, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    if elapsed > SLOW_TICK {
        tracing::warn!(
            online = report.online,
            target = report.target,
            added = report.added,
            updated = report.updated,
            logged_in = report.logged_in,
            elapsed_ms = elapsed_ms,
            "PERFORMANCE: Slow scheduler tick"
        );
    } else {
        tracing::debug!(
            online = report.online,
            target = report.target,
            added = report.added,
            updated = report.updated,
            logged_in = report.logged_in,
            elapsed_ms = elapsed_ms,
            "Scheduler tick"
        );
    }
}

/// Log a remote or console command and its reply
///
/// # Arguments
///
/// * `source` - Peer address or `console`
/// * `command` - Raw request line
/// * `reply` - Line sent back
pub fn log_command(source: &str, command: &str, reply: &str) {
    tracing::info!(source = source, command = command, reply = reply, "Command handled");
}

/// Dump a stats report as one JSON record at debug level
pub fn log_stats_json(report: &StatsReport) {
    match serde_json::to_string(report) {
        Ok(json) => tracing::debug!(stats = %json, "Stats snapshot"),
        Err(e) => tracing::warn!("Failed to serialize stats snapshot: {}", e),
    }
}
