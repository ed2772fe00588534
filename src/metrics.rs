use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::net::SocketAddr;

use crate::error::SessionError;
use tracing::info;
use warp::Filter;

lazy_static! {
    pub static ref CLIENT_ACTIVE_SESSIONS: IntGauge = register_int_gauge!(
        "client_active_sessions",
        "Number of sessions currently held in the registry"
    )
    .unwrap();
    pub static ref CLIENT_NEGOTIATIONS_STARTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "client_negotiations_started_total",
        "Total number of negotiations started",
        &["role"] // "publisher" or "viewer"
    )
    .unwrap();
    pub static ref CLIENT_NEGOTIATION_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "client_negotiation_failures_total",
        "Total number of negotiations that stopped with an error",
        &["kind"] // SessionError::kind()
    )
    .unwrap();
    pub static ref CLIENT_SESSIONS_CONNECTED_TOTAL: IntCounter = register_int_counter!(
        "client_sessions_connected_total",
        "Total number of negotiations that applied a remote answer"
    )
    .unwrap();
    pub static ref CLIENT_CONNECTIVITY_TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "client_connectivity_transitions_total",
        "Total number of connectivity state transitions observed",
        &["state"]
    )
    .unwrap();
}

pub fn register_metrics() {
    // Force initialization of lazy_statics
    let _ = CLIENT_ACTIVE_SESSIONS.get();
    let _ = CLIENT_NEGOTIATIONS_STARTED_TOTAL
        .with_label_values(&["viewer"])
        .get();
    let _ = CLIENT_NEGOTIATION_FAILURES_TOTAL
        .with_label_values(&[SessionError::Cancelled.kind()])
        .get();
    let _ = CLIENT_SESSIONS_CONNECTED_TOTAL.get();
    let _ = CLIENT_CONNECTIVITY_TRANSITIONS_TOTAL
        .with_label_values(&["new"])
        .get();
}

/// Renders the default registry in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Serves `GET /metrics` until the process exits.
pub async fn serve(addr: SocketAddr) {
    let route = warp::path("metrics")
        .and(warp::get())
        .map(|| warp::reply::with_header(render(), "content-type", "text/plain; version=0.0.4"));

    info!(%addr, "Metrics endpoint listening");
    warp::serve(route).run(addr).await;
}
