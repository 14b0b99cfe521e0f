//! Prometheus metrics for the sync engine
//!
//! Counters for every remote call and decision the engine makes, plus a
//! health gauge for the running engine.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Encoder, Gauge,
    TextEncoder,
};

lazy_static! {
    /// Counter: gateway calls by operation and outcome
    pub static ref GATEWAY_CALLS: CounterVec = register_counter_vec!(
        "jirasync_gateway_calls_total",
        "Remote gateway calls by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("Failed to create gateway_calls metric");

    /// Counter: polling loop ticks
    pub static ref POLL_TICKS: CounterVec = register_counter_vec!(
        "jirasync_poll_ticks_total",
        "Polling loop ticks by loop",
        &["loop"]
    )
    .expect("Failed to create poll_ticks metric");

    /// Counter: tasks created by backlog import
    pub static ref ISSUES_IMPORTED: Counter = register_counter!(
        "jirasync_issues_imported_total",
        "Issues imported into the backlog"
    )
    .expect("Failed to create issues_imported metric");

    /// Counter: transition reconciler outcomes
    pub static ref TRANSITIONS: CounterVec = register_counter_vec!(
        "jirasync_transitions_total",
        "Transition decisions by outcome",
        &["outcome"]
    )
    .expect("Failed to create transitions metric");

    /// Counter: reassignment prompts by answer
    pub static ref REASSIGN_PROMPTS: CounterVec = register_counter_vec!(
        "jirasync_reassign_prompts_total",
        "Reassignment confirmations by answer",
        &["answer"]
    )
    .expect("Failed to create reassign_prompts metric");

    /// Gauge: engine health status (1 = running, 0 = stopped)
    pub static ref HEALTH_STATUS: Gauge = register_gauge!(
        "jirasync_health_status",
        "Engine health status (1 = running, 0 = stopped)"
    )
    .expect("Failed to create health_status metric");
}

/// Record a gateway call
pub fn record_gateway_call(operation: &str, outcome: &str) {
    GATEWAY_CALLS
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Record a polling loop tick
pub fn record_poll_tick(loop_name: &str) {
    POLL_TICKS.with_label_values(&[loop_name]).inc();
}

pub fn record_issues_imported(count: usize) {
    ISSUES_IMPORTED.inc_by(count as f64);
}

pub fn record_transition(outcome: &str) {
    TRANSITIONS.with_label_values(&[outcome]).inc();
}

pub fn record_reassign_prompt(confirmed: bool) {
    let answer = if confirmed { "confirmed" } else { "declined" };
    REASSIGN_PROMPTS.with_label_values(&[answer]).inc();
}

/// Set health status
pub fn set_health_status(healthy: bool) {
    HEALTH_STATUS.set(if healthy { 1.0 } else { 0.0 });
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
