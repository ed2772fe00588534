use crate::error::SessionError;
use crate::id_types::PublisherKey;
use crate::types::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Body POSTed to the signaling endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingRequest {
    pub sdp: RTCSessionDescription,
    pub mode: Role,
    #[serde(rename = "publisherKey")]
    pub publisher_key: String,
}

impl SignalingRequest {
    pub fn new(sdp: RTCSessionDescription, mode: Role, publisher_key: &PublisherKey) -> Self {
        SignalingRequest {
            sdp,
            mode,
            publisher_key: publisher_key.to_string(),
        }
    }
}

/// Endpoint reply. `success` alone decides which of `sdp`/`error` matters;
/// the other may be absent or zero-valued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignalingResponse {
    pub fn answer(sdp: &RTCSessionDescription) -> Self {
        SignalingResponse {
            success: true,
            sdp: Some(serde_json::json!({
                "type": sdp.sdp_type.to_string(),
                "sdp": sdp.sdp,
            })),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        SignalingResponse {
            success: false,
            sdp: None,
            error: Some(error.into()),
        }
    }

    /// Turns the reply into the remote description to apply.
    ///
    /// The `sdp` value is decoded as-is; nothing in it is rewritten.
    pub fn into_answer(self) -> Result<RTCSessionDescription, SessionError> {
        if !self.success {
            return Err(SessionError::SignalingRejection(
                self.error.unwrap_or_default(),
            ));
        }
        let value = match self.sdp {
            None | Some(serde_json::Value::Null) => return Err(SessionError::EmptyDescription),
            Some(value) => value,
        };
        let answer: RTCSessionDescription = serde_json::from_value(value)
            .map_err(|e| SessionError::RemoteDescription(e.to_string()))?;
        if answer.sdp.trim().is_empty() {
            return Err(SessionError::EmptyDescription);
        }
        Ok(answer)
    }
}

/// One request/response exchange with the signaling endpoint.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    async fn exchange(&self, request: &SignalingRequest)
        -> Result<SignalingResponse, SessionError>;
}

/// `SignalingChannel` over HTTP: POST JSON, read JSON.
#[derive(Debug, Clone)]
pub struct HttpSignaling {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSignaling {
    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpSignaling {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Adds a per-request timeout on the HTTP client itself.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpSignaling {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SignalingChannel for HttpSignaling {
    async fn exchange(
        &self,
        request: &SignalingRequest,
    ) -> Result<SignalingResponse, SessionError> {
        info!(
            endpoint = %self.endpoint,
            mode = %request.mode,
            publisher_key = %request.publisher_key,
            sdp_length = request.sdp.sdp.len(),
            "[Client] Posting offer"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| SessionError::SignalingTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::SignalingTransport(format!(
                "endpoint returned {}: {}",
                status,
                body.trim()
            )));
        }

        let reply: SignalingResponse = response
            .json()
            .await
            .map_err(|e| SessionError::SignalingTransport(e.to_string()))?;
        debug!(success = reply.success, "[Client] Signaling response received");
        Ok(reply)
    }
}
