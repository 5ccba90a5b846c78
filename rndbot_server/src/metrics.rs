//! Prometheus metrics for monitoring the bot population.
//!
//! Metrics are exposed in Prometheus text format for scraping by monitoring systems.
//!
//! # Metrics Categories
//!
//! - **Scheduler Metrics**: Tick counts and duration, logins, additions
//! - **Population Metrics**: Online bots per faction and activity, due transitions
//! - **Command Metrics**: Remote and console requests

use metrics_exporter_prometheus::PrometheusBuilder;
use rndbot::scheduler::{StatsReport, TickReport};
use std::net::SocketAddr;
use std::time::Duration;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Scheduler Metrics
// ============================================================================

/// Record one scheduler tick.
pub fn record_tick(report: &TickReport, elapsed: Duration) {
    metrics::counter!("rndbot_ticks_total").increment(1);
    metrics::histogram!("rndbot_tick_duration_ms").record(elapsed.as_secs_f64() * 1000.0);
    metrics::counter!("rndbot_bots_added_total").increment(u64::from(report.added));
    metrics::counter!("rndbot_bots_logged_in_total").increment(u64::from(report.logged_in));
    metrics::counter!("rndbot_bots_updated_total").increment(u64::from(report.updated));
    metrics::gauge!("rndbot_target_bots").set(f64::from(report.target));
}

// ============================================================================
// Population Metrics
// ============================================================================

/// Publish a stats snapshot as gauges.
pub fn record_stats(report: &StatsReport) {
    metrics::gauge!("rndbot_online_bots").set(f64::from(report.online));
    metrics::gauge!("rndbot_tracked_bots").set(f64::from(report.tracked));
    metrics::gauge!("rndbot_faction_bots", "faction" => "alliance").set(f64::from(report.alliance));
    metrics::gauge!("rndbot_faction_bots", "faction" => "horde").set(f64::from(report.horde));

    for (state, count) in [
        ("dead", report.dead),
        ("in_combat", report.in_combat),
        ("moving", report.moving),
        ("in_flight", report.in_flight),
        ("mounted", report.mounted),
        ("in_battleground", report.in_battleground),
    ] {
        metrics::gauge!("rndbot_activity_bots", "state" => state).set(f64::from(count));
    }

    for (transition, count) in [
        ("randomize", report.randomize_due),
        ("teleport", report.teleport_due),
        ("change_strategy", report.change_strategy_due),
    ] {
        metrics::gauge!("rndbot_due_bots", "transition" => transition).set(f64::from(count));
    }

    for (class, stat) in &report.per_class {
        metrics::gauge!("rndbot_class_bots", "class" => class.to_string()).set(f64::from(stat.count));
    }
}

// ============================================================================
// Command Metrics
// ============================================================================

/// Increment handled command counter.
pub fn commands_total(kind: &'static str, success: bool) {
    metrics::counter!("rndbot_commands_total",
        "kind" => kind,
        "success" => success.to_string()
    )
    .increment(1);
}

/// Set current remote protocol connections count.
pub fn remote_connections_active(count: usize) {
    metrics::gauge!("rndbot_remote_connections_active").set(count as f64);
}
