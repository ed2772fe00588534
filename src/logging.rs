use crate::id_types::SessionId;
use crate::sink::LogSink;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with JSON formatter for production
pub fn init(rust_log: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(rust_log));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Log sink that forwards lines and alerts into tracing.
/// Used by the binary where there is no UI to write to.
#[derive(Debug, Clone)]
pub struct TracingLogSink {
    session_id: SessionId,
}

impl TracingLogSink {
    pub fn new(session_id: SessionId) -> Self {
        TracingLogSink { session_id }
    }
}

impl LogSink for TracingLogSink {
    fn append(&self, line: &str) {
        info!(session_id = %self.session_id, line = %line, "[Client] log");
    }

    fn alert(&self, message: &str) {
        warn!(session_id = %self.session_id, alert = %message, "[Client] alert");
    }
}
