//! Network identity producers
//!
//! - `address` - candidate parsing and private range checks
//! - `negotiation` - the injectable peer-connection primitive
//! - `local` - native primitive backed by the OS routing table
//! - `discovery` - private address discovery state machine
//! - `public_ip` - public address via an HTTP echo service

pub mod address;
pub mod discovery;
pub mod local;
pub mod negotiation;
pub mod public_ip;

pub use address::{extract_ipv4, is_private, scan_description, Candidate, CandidateType};
pub use discovery::{DiscoveryAttempt, DiscoverySignal, DiscoveryState, PrivateAddressDiscovery};
pub use local::LocalInterfaceNegotiator;
pub use negotiation::{
    NegotiationEvent, NegotiationSession, OpenedSession, PeerNegotiator, SessionConfig,
    SessionDescription,
};
pub use public_ip::PublicIpLookup;
