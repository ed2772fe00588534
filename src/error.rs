use std::time::Duration;
use thiserror::Error;

/// Why a negotiation attempt stopped. Every variant is terminal for the
/// attempt; recovery means a fresh `broadcast`/`watch`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to acquire local video: {0}")]
    MediaAcquisition(String),

    #[error("Failed to attach local stream: {0}")]
    AttachStream(String),

    #[error("Failed to add video transceiver: {0}")]
    Transceiver(String),

    #[error("Failed to create offer: {0}")]
    OfferCreation(String),

    #[error("Failed to set local description: {0}")]
    LocalDescription(String),

    #[error("ICE gathering did not complete within {0:?}")]
    GatheringTimeout(Duration),

    #[error("Signaling request failed: {0}")]
    SignalingTransport(String),

    #[error("Signaling endpoint did not answer within {0:?}")]
    SignalingTimeout(Duration),

    #[error("Error connecting: {0}")]
    SignalingRejection(String),

    #[error("Session Description must not be empty")]
    EmptyDescription,

    #[error("Failed to set remote description: {0}")]
    RemoteDescription(String),

    #[error("Negotiation cancelled")]
    Cancelled,

    #[error("Session is closed")]
    Closed,
}

/// Where an error is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Blocking, user-facing alert.
    Alert,
    /// Appended to the session's log sink.
    LogSink,
    /// Tracing only.
    Console,
}

impl SessionError {
    pub fn surface(&self) -> Surface {
        match self {
            SessionError::SignalingRejection(_)
            | SessionError::EmptyDescription
            | SessionError::RemoteDescription(_) => Surface::Alert,
            SessionError::MediaAcquisition(_)
            | SessionError::AttachStream(_)
            | SessionError::Transceiver(_)
            | SessionError::OfferCreation(_)
            | SessionError::LocalDescription(_)
            | SessionError::GatheringTimeout(_) => Surface::LogSink,
            SessionError::SignalingTransport(_)
            | SessionError::SignalingTimeout(_)
            | SessionError::Cancelled
            | SessionError::Closed => Surface::Console,
        }
    }

    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::MediaAcquisition(_) => "media_acquisition",
            SessionError::AttachStream(_) => "attach_stream",
            SessionError::Transceiver(_) => "transceiver",
            SessionError::OfferCreation(_) => "offer_creation",
            SessionError::LocalDescription(_) => "local_description",
            SessionError::GatheringTimeout(_) => "gathering_timeout",
            SessionError::SignalingTransport(_) => "signaling_transport",
            SessionError::SignalingTimeout(_) => "signaling_timeout",
            SessionError::SignalingRejection(_) => "signaling_rejection",
            SessionError::EmptyDescription => "empty_description",
            SessionError::RemoteDescription(_) => "remote_description",
            SessionError::Cancelled => "cancelled",
            SessionError::Closed => "closed",
        }
    }
}
