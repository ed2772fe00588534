use crate::id_types::SessionId;
use crate::media::MediaStream;
use crate::session::PeerSession;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;

/// Which side of the one-way stream this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Publisher,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Publisher => "publisher",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "publisher" => Ok(Role::Publisher),
            "viewer" => Ok(Role::Viewer),
            other => Err(other.to_string()),
        }
    }
}

/// Connectivity state mirrored from the transport's ICE connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectivityState {
    #[default]
    New,
    Checking,
    Connected,
    Completed,
    Failed,
    Disconnected,
    Closed,
}

impl ConnectivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::New => "new",
            ConnectivityState::Checking => "checking",
            ConnectivityState::Connected => "connected",
            ConnectivityState::Completed => "completed",
            ConnectivityState::Failed => "failed",
            ConnectivityState::Disconnected => "disconnected",
            ConnectivityState::Closed => "closed",
        }
    }

    /// `connected` or `completed`.
    pub fn is_established(&self) -> bool {
        matches!(
            self,
            ConnectivityState::Connected | ConnectivityState::Completed
        )
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RTCIceConnectionState> for ConnectivityState {
    fn from(state: RTCIceConnectionState) -> Self {
        match state {
            RTCIceConnectionState::Unspecified | RTCIceConnectionState::New => {
                ConnectivityState::New
            }
            RTCIceConnectionState::Checking => ConnectivityState::Checking,
            RTCIceConnectionState::Connected => ConnectivityState::Connected,
            RTCIceConnectionState::Completed => ConnectivityState::Completed,
            RTCIceConnectionState::Failed => ConnectivityState::Failed,
            RTCIceConnectionState::Disconnected => ConnectivityState::Disconnected,
            RTCIceConnectionState::Closed => ConnectivityState::Closed,
        }
    }
}

/// How a video sink should present a bound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Playback {
    pub autoplay: bool,
    pub controls: bool,
}

impl Playback {
    /// Inbound streams play immediately with user controls.
    pub fn remote() -> Self {
        Playback {
            autoplay: true,
            controls: true,
        }
    }

    /// Local camera preview.
    pub fn preview() -> Self {
        Playback {
            autoplay: true,
            controls: false,
        }
    }
}

/// Observer for connectivity transitions. Runs on transport tasks.
pub type ConnectivityHandler = Box<dyn Fn(ConnectivityState) + Send + Sync>;

/// Observer for inbound track events.
pub type TrackHandler = Box<dyn Fn(MediaStream) + Send + Sync>;

/// Fired once the answer has been applied.
pub type OnConnected = Arc<dyn Fn(&SessionId) + Send + Sync>;

/// Thread-safe map of open sessions
pub type SessionMap = Arc<DashMap<SessionId, Arc<PeerSession>>>;
