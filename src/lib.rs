pub mod config;
pub mod error;
pub mod id_types;
pub mod logging;
pub mod manager;
pub mod media;
pub mod media_setup;
pub mod metrics;
pub mod registry;
pub mod session;
pub mod signaling;
mod signaling_handler;
pub mod sink;
pub mod track_handler;
pub mod transport;
pub mod types;

pub use error::SessionError;
pub use manager::{NegotiationOptions, SessionManager};
pub use media_setup::MediaSetup;
pub use registry::SessionRegistry;
pub use session::PeerSession;
pub use types::{ConnectivityState, Role};

#[cfg(test)]
mod tests;
