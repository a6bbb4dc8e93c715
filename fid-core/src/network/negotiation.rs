//! Peer-connection negotiation primitive
//!
//! Discovery only needs a small slice of a peer connection: open a session
//! with no signalling servers, add a data channel, produce and apply an offer,
//! then watch local candidates stream in. Hosts plug in through
//! [`PeerNegotiator`].

use std::sync::Arc;

use async_trait::async_trait;
use fid_error::Result;
use tokio::sync::mpsc;

/// Session options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// STUN/TURN servers. Empty: gather local candidates only.
    pub ice_servers: Vec<String>,
}

impl SessionConfig {
    pub fn local_only() -> Self {
        Self::default()
    }
}

/// SDP session description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub sdp: String,
}

impl SessionDescription {
    pub fn new(sdp: impl Into<String>) -> Self {
        Self { sdp: sdp.into() }
    }
}

/// Asynchronous notifications from a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationEvent {
    /// One candidate descriptor, e.g. `candidate:1 1 udp 2122260223 10.0.0.2 5000 typ host`
    Candidate(String),
    /// No further candidates will arrive
    GatheringComplete,
}

/// One negotiation session. Methods take `&self`; implementations use interior
/// mutability so events can be handled while the offer is still in flight.
#[async_trait]
pub trait NegotiationSession: Send + Sync {
    fn create_data_channel(&self, label: &str) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Applying the local description starts candidate gathering
    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    /// Current local description, including candidates gathered so far
    fn local_description(&self) -> Option<SessionDescription>;

    /// Releases the session. Must tolerate being called on a closed session.
    fn close(&self);
}

/// A freshly opened session and its event stream
pub struct OpenedSession {
    pub session: Arc<dyn NegotiationSession>,
    pub events: mpsc::UnboundedReceiver<NegotiationEvent>,
}

/// Factory for negotiation sessions
pub trait PeerNegotiator: Send + Sync {
    fn open(&self, config: &SessionConfig) -> Result<OpenedSession>;
}
