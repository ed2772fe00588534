use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

use crate::error::SessionError;
use crate::signaling::{SignalingChannel, SignalingRequest};
use crate::transport::PeerTransport;

/// Runs one step of the negotiation chain unless the session is cancelled first.
pub(crate) async fn guarded<T, F>(cancel: &watch::Sender<bool>, step: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    let mut cancelled = cancel.subscribe();
    tokio::select! {
        biased;
        _ = cancelled.wait_for(|c| *c) => Err(SessionError::Cancelled),
        res = step => res,
    }
}

/// Creates the offer, applies it locally and waits for ICE gathering to finish.
///
/// Returns the transport's current local description, which by then carries
/// every gathered candidate. Gathering that outlives `gather_timeout` fails
/// the attempt instead of yielding a partial description.
pub(crate) async fn create_and_gather_offer(
    transport: &Arc<dyn PeerTransport>,
    cancel: &watch::Sender<bool>,
    gather_timeout: Duration,
) -> Result<RTCSessionDescription, SessionError> {
    let offer = guarded(cancel, async {
        transport
            .create_offer()
            .await
            .map_err(|e| SessionError::OfferCreation(format!("{:#}", e)))
    })
    .await?;

    guarded(cancel, async {
        transport
            .set_local_description(offer)
            .await
            .map_err(|e| SessionError::LocalDescription(format!("{:#}", e)))
    })
    .await?;

    info!("[Client] Waiting for ICE gathering");
    guarded(cancel, async {
        tokio::time::timeout(gather_timeout, transport.gathering_complete())
            .await
            .map_err(|_| SessionError::GatheringTimeout(gather_timeout))
    })
    .await?;

    let local = transport.local_description().await.ok_or_else(|| {
        SessionError::OfferCreation("no local description after ICE gathering".to_string())
    })?;
    debug!(sdp_length = local.sdp.len(), "[Client] ICE gathering complete");
    Ok(local)
}

/// Sends the offer and turns the reply into the answer to apply.
pub(crate) async fn exchange_offer(
    signaling: &Arc<dyn SignalingChannel>,
    request: &SignalingRequest,
    cancel: &watch::Sender<bool>,
    signaling_timeout: Duration,
) -> Result<RTCSessionDescription, SessionError> {
    let reply = guarded(cancel, async {
        tokio::time::timeout(signaling_timeout, signaling.exchange(request))
            .await
            .map_err(|_| SessionError::SignalingTimeout(signaling_timeout))?
    })
    .await?;

    reply.into_answer()
}
