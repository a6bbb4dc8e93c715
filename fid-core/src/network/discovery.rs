//! Private address discovery
//!
//! Drives one negotiation session purely to observe its local candidates.
//!
//! ```text
//!   Init ──description set──▶ Negotiating
//!     │                           │
//!     │  private local candidate  │  gathering complete (fallback scan)
//!     │  negotiation failure      │  timer
//!     ▼                           ▼
//!   Resolved(Some(addr) | None)  ◀┘
//! ```
//!
//! Candidate events, gathering completion and the timer all race to resolve.
//! [`DiscoveryAttempt::resolve`] is the only way into `Resolved`; it acts on
//! the first call, closes the session exactly once, and ignores the rest.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace};

use super::address::{scan_description, Candidate};
use super::local::LocalInterfaceNegotiator;
use super::negotiation::{
    NegotiationEvent, NegotiationSession, OpenedSession, PeerNegotiator, SessionConfig,
    SessionDescription,
};
use crate::constants::discovery::DATA_CHANNEL_LABEL;

/// Where a discovery attempt stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    Init,
    Negotiating,
    /// Terminal. `None` means no private address was found.
    Resolved(Option<Ipv4Addr>),
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoverySignal {
    /// Local description applied; candidates may now arrive
    DescriptionSet,
    Candidate(String),
    /// Carries the local description for the fallback scan
    GatheringComplete(Option<SessionDescription>),
    NegotiationFailed,
    TimerFired,
}

/// One discovery attempt and the session it owns
pub struct DiscoveryAttempt {
    state: DiscoveryState,
    session: Arc<dyn NegotiationSession>,
}

impl DiscoveryAttempt {
    pub fn new(session: Arc<dyn NegotiationSession>) -> Self {
        Self {
            state: DiscoveryState::Init,
            session,
        }
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, DiscoveryState::Resolved(_))
    }

    /// `Some(result)` once resolved
    pub fn outcome(&self) -> Option<Option<Ipv4Addr>> {
        match self.state {
            DiscoveryState::Resolved(result) => Some(result),
            _ => None,
        }
    }

    /// Feeds one signal. Returns true if this signal resolved the attempt.
    pub fn handle(&mut self, signal: DiscoverySignal) -> bool {
        if self.is_resolved() {
            trace!(?signal, "Discovery already resolved, signal ignored");
            return false;
        }

        match signal {
            DiscoverySignal::DescriptionSet => {
                self.state = DiscoveryState::Negotiating;
                false
            }
            DiscoverySignal::Candidate(line) => {
                match Candidate::parse(&line).and_then(|c| c.local_private_address()) {
                    Some(address) => self.resolve(Some(address)),
                    None => {
                        trace!("Candidate skipped: {}", line);
                        false
                    }
                }
            }
            DiscoverySignal::GatheringComplete(description) => {
                let found = description.and_then(|d| scan_description(&d.sdp));
                self.resolve(found)
            }
            DiscoverySignal::NegotiationFailed | DiscoverySignal::TimerFired => self.resolve(None),
        }
    }

    /// The single terminal transition. Only the first call has any effect.
    pub fn resolve(&mut self, outcome: Option<Ipv4Addr>) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.state = DiscoveryState::Resolved(outcome);
        self.session.close();
        true
    }
}

/// Runs discovery attempts against a negotiation primitive
#[derive(Clone)]
pub struct PrivateAddressDiscovery {
    negotiator: Option<Arc<dyn PeerNegotiator>>,
}

impl PrivateAddressDiscovery {
    /// `None` means the host has no negotiation primitive
    pub fn new(negotiator: Option<Arc<dyn PeerNegotiator>>) -> Self {
        Self { negotiator }
    }

    /// Uses [`LocalInterfaceNegotiator`]
    pub fn native() -> Self {
        Self::new(Some(Arc::new(LocalInterfaceNegotiator::new())))
    }

    pub fn is_supported(&self) -> bool {
        self.negotiator.is_some()
    }

    /// Resolves exactly once, within `timeout` plus scheduling latency.
    ///
    /// Each call runs its own session and is independent of other calls.
    pub async fn discover(&self, timeout: Duration) -> Option<Ipv4Addr> {
        let Some(negotiator) = &self.negotiator else {
            debug!("Negotiation primitive unsupported, private address unavailable");
            return None;
        };

        // Timer starts at INIT, independent of negotiation progress
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let OpenedSession { session, mut events } = match negotiator.open(&SessionConfig::local_only()) {
            Ok(opened) => opened,
            Err(e) => {
                debug!("Could not open negotiation session: {}", e);
                return None;
            }
        };
        let mut attempt = DiscoveryAttempt::new(Arc::clone(&session));

        if let Err(e) = session.create_data_channel(DATA_CHANNEL_LABEL) {
            debug!("Data channel creation failed: {}", e);
            attempt.handle(DiscoverySignal::NegotiationFailed);
            return attempt.outcome().flatten();
        }

        let negotiation = async {
            let offer = session.create_offer().await?;
            session.set_local_description(offer).await
        };
        tokio::pin!(negotiation);

        let mut negotiation_pending = true;
        let mut events_open = true;

        while !attempt.is_resolved() {
            tokio::select! {
                result = &mut negotiation, if negotiation_pending => {
                    negotiation_pending = false;
                    match result {
                        Ok(()) => attempt.handle(DiscoverySignal::DescriptionSet),
                        Err(e) => {
                            debug!("Offer negotiation failed: {}", e);
                            attempt.handle(DiscoverySignal::NegotiationFailed)
                        }
                    };
                }
                event = events.recv(), if events_open => {
                    match event {
                        Some(NegotiationEvent::Candidate(line)) => {
                            attempt.handle(DiscoverySignal::Candidate(line));
                        }
                        Some(NegotiationEvent::GatheringComplete) => {
                            attempt.handle(DiscoverySignal::GatheringComplete(session.local_description()));
                        }
                        None => {
                            // Event source gone: nothing more will arrive
                            events_open = false;
                            attempt.handle(DiscoverySignal::GatheringComplete(session.local_description()));
                        }
                    }
                }
                _ = &mut deadline => {
                    debug!("Private address discovery timed out after {:?}", timeout);
                    attempt.handle(DiscoverySignal::TimerFired);
                }
            }
        }

        let outcome = attempt.outcome().flatten();
        match outcome {
            Some(address) => info!("Private address discovered: {}", address),
            None => info!("No private address discovered"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fid_error::{FortressError, Result};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    const HOST_192: &str = "candidate:1 1 udp 2122260223 192.168.1.20 50000 typ host generation 0";
    const HOST_10: &str = "candidate:2 1 udp 2122260223 10.0.0.7 50001 typ host generation 0";
    const RELAY_10: &str = "candidate:3 1 udp 41885439 10.9.9.9 3478 typ relay";
    const PUBLIC_HOST: &str = "candidate:4 1 udp 2122260223 8.8.8.8 50002 typ host";

    /// What the scripted session does once its local description is applied
    #[derive(Clone, Default)]
    struct Script {
        events: Vec<NegotiationEvent>,
        sdp_candidates: Vec<&'static str>,
        fail_offer: bool,
        silent: bool,
    }

    struct ScriptedSession {
        script: Script,
        tx: Mutex<Option<mpsc::UnboundedSender<NegotiationEvent>>>,
        description: Mutex<Option<SessionDescription>>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl NegotiationSession for ScriptedSession {
        fn create_data_channel(&self, _label: &str) -> Result<()> {
            Ok(())
        }

        async fn create_offer(&self) -> Result<SessionDescription> {
            if self.script.fail_offer {
                return Err(FortressError::negotiation("offer rejected"));
            }
            if self.script.silent {
                std::future::pending::<()>().await;
            }
            Ok(SessionDescription::new("v=0\r\n"))
        }

        async fn set_local_description(&self, mut description: SessionDescription) -> Result<()> {
            for line in &self.script.sdp_candidates {
                description.sdp.push_str(&format!("a={}\r\n", line));
            }
            *self.description.lock() = Some(description);
            let tx = self.tx.lock().clone();
            if let Some(tx) = tx {
                for event in &self.script.events {
                    let _ = tx.send(event.clone());
                }
            }
            Ok(())
        }

        fn local_description(&self) -> Option<SessionDescription> {
            self.description.lock().clone()
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ScriptedNegotiator {
        script: Script,
        closes: Arc<AtomicUsize>,
        // Silent sessions keep their sender here so the channel never closes
        parked: Mutex<Vec<mpsc::UnboundedSender<NegotiationEvent>>>,
    }

    impl ScriptedNegotiator {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                closes: Arc::new(AtomicUsize::new(0)),
                parked: Mutex::new(Vec::new()),
            })
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    impl PeerNegotiator for ScriptedNegotiator {
        fn open(&self, _config: &SessionConfig) -> Result<OpenedSession> {
            let (tx, events) = mpsc::unbounded_channel();
            self.parked.lock().push(tx.clone());
            let session = Arc::new(ScriptedSession {
                script: self.script.clone(),
                tx: Mutex::new(Some(tx)),
                description: Mutex::new(None),
                closes: Arc::clone(&self.closes),
            });
            Ok(OpenedSession { session, events })
        }
    }

    struct CountingSession(Arc<AtomicUsize>);

    #[async_trait]
    impl NegotiationSession for CountingSession {
        fn create_data_channel(&self, _label: &str) -> Result<()> {
            Ok(())
        }
        async fn create_offer(&self) -> Result<SessionDescription> {
            Ok(SessionDescription::new(""))
        }
        async fn set_local_description(&self, _d: SessionDescription) -> Result<()> {
            Ok(())
        }
        fn local_description(&self) -> Option<SessionDescription> {
            None
        }
        fn close(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn discovery(negotiator: &Arc<ScriptedNegotiator>) -> PrivateAddressDiscovery {
        PrivateAddressDiscovery::new(Some(negotiator.clone() as Arc<dyn PeerNegotiator>))
    }

    #[test]
    fn test_first_resolution_wins_and_closes_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut attempt = DiscoveryAttempt::new(Arc::new(CountingSession(closes.clone())));

        assert!(attempt.handle(DiscoverySignal::Candidate(HOST_192.into())));
        let fallback = SessionDescription::new(format!("a={}\r\n", HOST_10));
        assert!(!attempt.handle(DiscoverySignal::GatheringComplete(Some(fallback))));
        assert!(!attempt.handle(DiscoverySignal::TimerFired));
        assert!(!attempt.handle(DiscoverySignal::TimerFired));

        assert_eq!(
            attempt.state(),
            DiscoveryState::Resolved(Some(Ipv4Addr::new(192, 168, 1, 20)))
        );
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_progression() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut attempt = DiscoveryAttempt::new(Arc::new(CountingSession(closes.clone())));
        assert_eq!(attempt.state(), DiscoveryState::Init);
        assert!(!attempt.handle(DiscoverySignal::DescriptionSet));
        assert_eq!(attempt.state(), DiscoveryState::Negotiating);
        assert!(!attempt.handle(DiscoverySignal::Candidate(RELAY_10.into())));
        assert!(!attempt.handle(DiscoverySignal::Candidate(PUBLIC_HOST.into())));
        assert_eq!(attempt.outcome(), None);
        assert!(attempt.handle(DiscoverySignal::GatheringComplete(None)));
        assert_eq!(attempt.outcome(), Some(None));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_negotiation_failure_resolves_none() {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut attempt = DiscoveryAttempt::new(Arc::new(CountingSession(closes.clone())));
        assert!(attempt.handle(DiscoverySignal::NegotiationFailed));
        assert_eq!(attempt.outcome(), Some(None));
        assert!(!attempt.resolve(Some(Ipv4Addr::new(10, 0, 0, 1))));
        assert_eq!(attempt.outcome(), Some(None));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_host_returns_none() {
        let discovery = PrivateAddressDiscovery::new(None);
        assert!(!discovery.is_supported());
        assert_eq!(discovery.discover(Duration::from_millis(10)).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_streaming_candidate_resolves() {
        let negotiator = ScriptedNegotiator::new(Script {
            events: vec![
                NegotiationEvent::Candidate(RELAY_10.into()),
                NegotiationEvent::Candidate(HOST_10.into()),
                NegotiationEvent::Candidate(HOST_192.into()),
                NegotiationEvent::GatheringComplete,
            ],
            ..Default::default()
        });
        let result = discovery(&negotiator).discover(Duration::from_millis(1500)).await;
        assert_eq!(result, Some(Ipv4Addr::new(10, 0, 0, 7)));
        assert_eq!(negotiator.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_scan_on_gathering_complete() {
        let negotiator = ScriptedNegotiator::new(Script {
            events: vec![
                NegotiationEvent::Candidate(PUBLIC_HOST.into()),
                NegotiationEvent::GatheringComplete,
            ],
            sdp_candidates: vec![PUBLIC_HOST, RELAY_10],
            ..Default::default()
        });
        let result = discovery(&negotiator).discover(Duration::from_millis(1500)).await;
        // The description scan does not filter by candidate type
        assert_eq!(result, Some(Ipv4Addr::new(10, 9, 9, 9)));
        assert_eq!(negotiator.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gathering_complete_without_match() {
        let negotiator = ScriptedNegotiator::new(Script {
            events: vec![NegotiationEvent::GatheringComplete],
            sdp_candidates: vec![PUBLIC_HOST],
            ..Default::default()
        });
        assert_eq!(discovery(&negotiator).discover(Duration::from_secs(5)).await, None);
        assert_eq!(negotiator.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offer_failure_resolves_none() {
        let negotiator = ScriptedNegotiator::new(Script {
            fail_offer: true,
            ..Default::default()
        });
        assert_eq!(discovery(&negotiator).discover(Duration::from_secs(5)).await, None);
        assert_eq!(negotiator.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_negotiator_times_out() {
        let negotiator = ScriptedNegotiator::new(Script {
            silent: true,
            ..Default::default()
        });
        let timeout = Duration::from_millis(1500);
        let started = tokio::time::Instant::now();
        let result = discovery(&negotiator).discover(timeout).await;
        let elapsed = started.elapsed();

        assert_eq!(result, None);
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(50));
        assert_eq!(negotiator.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_attempts_are_independent() {
        let negotiator = ScriptedNegotiator::new(Script {
            events: vec![NegotiationEvent::Candidate(HOST_192.into())],
            ..Default::default()
        });
        let d = discovery(&negotiator);
        let (a, b) = tokio::join!(
            d.discover(Duration::from_millis(100)),
            d.discover(Duration::from_millis(100))
        );
        assert_eq!(a, Some(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(b, a);
        assert_eq!(negotiator.closes(), 2);
    }
}
