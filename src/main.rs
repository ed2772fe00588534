use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use sfu_client::config::{validate_env, validate_run_env};
use sfu_client::id_types::SessionId;
use sfu_client::logging::{self, TracingLogSink};
use sfu_client::metrics;
use sfu_client::sink::ConsoleVideoSink;
use sfu_client::types::OnConnected;
use sfu_client::{Role, SessionManager, SessionRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = validate_env()?;
    let run = validate_run_env()?;

    logging::init(&config.rust_log);
    metrics::register_metrics();

    if let Some(port) = run.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        tokio::spawn(metrics::serve(addr));
    }

    let registry = SessionRegistry::new();
    let session_id = SessionId::generate();
    let on_connected: OnConnected = Arc::new(|id: &SessionId| {
        info!(session_id = %id, "[Client] Remote description applied, media can flow");
    });

    let manager = SessionManager::connect(
        &config,
        session_id.clone(),
        Arc::new(ConsoleVideoSink::new()),
        Arc::new(TracingLogSink::new(session_id)),
        Some(on_connected),
        Some(registry.clone()),
    )
    .await?;

    info!(
        session_id = %manager.id(),
        mode = %run.mode,
        publisher_key = %run.publisher_key,
        endpoint = %config.signaling_url,
        "[Client] Starting negotiation"
    );

    let outcome = match run.mode {
        Role::Publisher => manager.broadcast(run.publisher_key.as_str()).await,
        Role::Viewer => manager.watch(run.publisher_key.as_str()).await,
    };
    if let Err(e) = &outcome {
        error!(session_id = %manager.id(), error = %e, "[Client] Negotiation did not complete");
    }

    if outcome.is_ok() {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
    }

    let closed = registry.close_all().await;
    info!(closed, "Shutdown complete");
    Ok(())
}
