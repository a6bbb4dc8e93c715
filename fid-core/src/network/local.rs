//! Native negotiation primitive
//!
//! Outside a browser there is no peer-connection stack to drive, but the
//! interesting part (which local address would a host candidate carry) is
//! cheap to get: "connect" an unbound UDP socket and read back the address
//! the OS routing table chose. Nothing is sent on the wire.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fid_error::{FortressError, Result};
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::debug;

use super::negotiation::{
    NegotiationEvent, NegotiationSession, OpenedSession, PeerNegotiator, SessionConfig,
    SessionDescription,
};
use crate::constants::discovery::ROUTE_PROBE_ADDR;

/// Priority a browser assigns to a UDP host candidate
const HOST_CANDIDATE_PRIORITY: u32 = 2_122_260_223;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Gathers host candidates from the OS routing decision
#[derive(Debug, Clone)]
pub struct LocalInterfaceNegotiator {
    probe_addr: String,
}

impl Default for LocalInterfaceNegotiator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalInterfaceNegotiator {
    pub fn new() -> Self {
        Self::with_probe_addr(ROUTE_PROBE_ADDR)
    }

    /// Destination used to select the outbound interface
    pub fn with_probe_addr(addr: impl Into<String>) -> Self {
        Self { probe_addr: addr.into() }
    }
}

impl PeerNegotiator for LocalInterfaceNegotiator {
    fn open(&self, config: &SessionConfig) -> Result<OpenedSession> {
        if !config.ice_servers.is_empty() {
            return Err(FortressError::NotSupported(
                "local negotiator cannot reach ICE servers".into(),
            ));
        }
        let (events_tx, events) = mpsc::unbounded_channel();
        let session = Arc::new(LocalSession {
            id: SESSION_COUNTER.fetch_add(1, Ordering::Relaxed),
            probe_addr: self.probe_addr.clone(),
            events_tx,
            state: Mutex::new(LocalState::default()),
        });
        Ok(OpenedSession { session, events })
    }
}

#[derive(Debug, Default)]
struct LocalState {
    data_channel: bool,
    local_description: Option<SessionDescription>,
    closed: bool,
}

struct LocalSession {
    id: u64,
    probe_addr: String,
    events_tx: mpsc::UnboundedSender<NegotiationEvent>,
    state: Mutex<LocalState>,
}

impl LocalSession {
    fn ensure_open(&self) -> Result<()> {
        if self.state.lock().closed {
            return Err(FortressError::SessionClosed);
        }
        Ok(())
    }

    async fn route_local_addr(&self) -> Result<SocketAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(&self.probe_addr).await?;
        Ok(socket.local_addr()?)
    }

    fn emit(&self, event: NegotiationEvent) {
        if self.state.lock().closed {
            return;
        }
        // Receiver gone means discovery already resolved
        let _ = self.events_tx.send(event);
    }
}

#[async_trait]
impl NegotiationSession for LocalSession {
    fn create_data_channel(&self, _label: &str) -> Result<()> {
        self.ensure_open()?;
        self.state.lock().data_channel = true;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_open()?;
        let mut sdp = format!(
            "v=0\r\no=- {} 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n",
            self.id
        );
        if self.state.lock().data_channel {
            sdp.push_str("m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\n");
            sdp.push_str("c=IN IP4 0.0.0.0\r\na=mid:0\r\na=sctp-port:5000\r\n");
        }
        Ok(SessionDescription::new(sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let gather = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(FortressError::SessionClosed);
            }
            state.local_description = Some(description);
            state.data_channel
        };

        // Without a media section there is nothing to gather for
        if gather {
            match self.route_local_addr().await {
                Ok(addr) if is_usable(addr.ip()) => {
                    let candidate = format!(
                        "candidate:1 1 udp {} {} {} typ host generation 0",
                        HOST_CANDIDATE_PRIORITY,
                        addr.ip(),
                        addr.port()
                    );
                    if let Some(desc) = self.state.lock().local_description.as_mut() {
                        desc.sdp.push_str(&format!("a={}\r\n", candidate));
                    }
                    self.emit(NegotiationEvent::Candidate(candidate));
                }
                Ok(addr) => debug!("Route probe chose unusable address {}", addr),
                Err(e) => debug!("Route probe failed: {}", e),
            }
        }

        self.emit(NegotiationEvent::GatheringComplete);
        Ok(())
    }

    fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().local_description.clone()
    }

    fn close(&self) {
        self.state.lock().closed = true;
    }
}

fn is_usable(ip: IpAddr) -> bool {
    !(ip.is_unspecified() || ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offer_and_gathering_events() {
        let negotiator = LocalInterfaceNegotiator::with_probe_addr("127.0.0.1:9");
        let OpenedSession { session, mut events } =
            negotiator.open(&SessionConfig::local_only()).unwrap();

        session.create_data_channel("").unwrap();
        let offer = session.create_offer().await.unwrap();
        assert!(offer.sdp.contains("webrtc-datachannel"));
        session.set_local_description(offer).await.unwrap();

        // Loopback route is not a usable host candidate, so only completion arrives
        assert_eq!(events.recv().await, Some(NegotiationEvent::GatheringComplete));
        assert!(session.local_description().is_some());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_offer() {
        let negotiator = LocalInterfaceNegotiator::new();
        let opened = negotiator.open(&SessionConfig::local_only()).unwrap();
        opened.session.close();
        opened.session.close();
        assert!(matches!(
            opened.session.create_offer().await,
            Err(FortressError::SessionClosed)
        ));
    }

    #[test]
    fn test_ice_servers_not_supported() {
        let negotiator = LocalInterfaceNegotiator::new();
        let config = SessionConfig { ice_servers: vec!["stun:stun.example.org".into()] };
        assert!(negotiator.open(&config).is_err());
    }

    #[test]
    fn test_usable_addresses() {
        assert!(is_usable("192.168.1.4".parse().unwrap()));
        assert!(!is_usable("127.0.0.1".parse().unwrap()));
        assert!(!is_usable("0.0.0.0".parse().unwrap()));
    }
}
