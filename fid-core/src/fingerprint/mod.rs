//! Device fingerprinting
//!
//! - `record` - fixed-schema [`FingerprintRecord`] and its canonical field order
//! - `collector` - reads a [`CapabilityProvider`](crate::platform::CapabilityProvider) into a record
//! - `hasher` - reduces a record to one opaque [`CanonicalHash`]

pub mod collector;
pub mod hasher;
pub mod record;

pub use collector::FingerprintCollector;
pub use hasher::{rolling_hash, CanonicalHash, CanonicalHasher};
pub use record::{DoNotTrack, FingerprintRecord, FIELD_COUNT, FIELD_ORDER, SCHEMA_VERSION};
