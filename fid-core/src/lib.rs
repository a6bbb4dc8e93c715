//! Fortress ID Core Library
//!
//! Device fingerprinting and network identity for a single host.
//!
//! # Features
//!
//! - **Fingerprint Collection**: Reads a fixed set of platform capabilities into
//!   a [`FingerprintRecord`], tolerating any capability being missing
//! - **Canonical Hashing**: Order-independent, null-normalized device IDs, tagged
//!   with the digest algorithm that produced them
//! - **Private Address Discovery**: Races candidate events, gathering completion
//!   and a timer over a local-only negotiation session
//! - **Public Address Lookup**: One request to a JSON echo service
//!
//! # Module Structure
//!
//! - `platform/` - capability provider seam and native implementation
//! - `fingerprint/` - record, collector, hasher
//! - `network/` - discovery state machine and public IP lookup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fid_core::{FingerprintCollector, NativeProvider};
//!
//! # async fn run() {
//! let collector = FingerprintCollector::from_provider(Arc::new(NativeProvider::new()));
//! if let Some(record) = collector.collect().await {
//!     let id = collector.hasher().hash(&record).await;
//!     println!("{} ({})", id, id.algorithm);
//! }
//! # }
//! ```

// Grouped modules
pub mod fingerprint;
pub mod network;
pub mod platform;

// Standalone modules
pub mod constants;
pub mod settings;

pub use fid_error::{FortressError, Result};

// Re-export fingerprint types
pub use fingerprint::{
    rolling_hash, CanonicalHash, CanonicalHasher, DoNotTrack, FingerprintCollector,
    FingerprintRecord, FIELD_COUNT, FIELD_ORDER, SCHEMA_VERSION,
};

// Re-export platform types
pub use platform::{
    CapabilityProvider, DigestBackend, DrawOp, DrawingSurface, GpuIdentity, HashAlgorithm,
    NativeProvider, Paint, ScreenInfo, Sha256Backend, TextBaseline, CANVAS_SCRIPT,
};

// Re-export network types
pub use network::{
    is_private, Candidate, CandidateType, DiscoveryAttempt, DiscoverySignal, DiscoveryState,
    LocalInterfaceNegotiator, NegotiationEvent, NegotiationSession, OpenedSession,
    PeerNegotiator, PrivateAddressDiscovery, PublicIpLookup, SessionConfig, SessionDescription,
};

// Re-export settings
pub use settings::{
    get_settings_path, load_settings, load_settings_from, save_settings, save_settings_to,
    Settings,
};
