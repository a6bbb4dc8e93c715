//! Canonical hashing of fingerprint records
//!
//! 1. Tokens in [`FIELD_ORDER`](super::record::FIELD_ORDER), null/absent as `"null"`
//! 2. Joined with `|`
//! 3. Digested with the host's cryptographic backend, or with the 32-bit
//!    rolling hash when the host has none
//!
//! A hasher picks its backend once at construction. The first backend failure
//! latches it (and every clone) onto the rolling hash for good, so a canvas
//! token and the record hash that contains it never mix algorithms. Every value
//! is tagged with the algorithm used, so degraded output is never silent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::record::FingerprintRecord;
use crate::constants::schema::TOKEN_SEPARATOR;
use crate::platform::{CapabilityProvider, DigestBackend, HashAlgorithm, Sha256Backend};

/// Opaque device identifier derived from a fingerprint record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalHash {
    pub value: String,
    pub algorithm: HashAlgorithm,
}

impl CanonicalHash {
    /// False for the rolling-hash fallback, which is not collision resistant
    pub fn is_cryptographic(&self) -> bool {
        self.algorithm.is_cryptographic()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for CanonicalHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// Maps records (and arbitrary text) to [`CanonicalHash`] values
#[derive(Clone)]
pub struct CanonicalHasher {
    backend: Option<Arc<dyn DigestBackend>>,
    /// Set on the first backend failure; shared by clones
    degraded: Arc<AtomicBool>,
}

impl std::fmt::Debug for CanonicalHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalHasher")
            .field("algorithm", &self.algorithm())
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

impl CanonicalHasher {
    /// `None` selects the rolling-hash fallback
    pub fn new(backend: Option<Arc<dyn DigestBackend>>) -> Self {
        Self {
            backend,
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    /// In-process SHA-256
    pub fn sha256() -> Self {
        Self::new(Some(Arc::new(Sha256Backend)))
    }

    /// Uses whatever digest the provider exposes
    pub fn from_provider(provider: &dyn CapabilityProvider) -> Self {
        let backend = provider.digest_backend();
        if backend.is_none() {
            warn!("No cryptographic digest available; device IDs use the weak rolling hash");
        }
        Self::new(backend)
    }

    /// Algorithm of the next value this hasher produces
    pub fn algorithm(&self) -> HashAlgorithm {
        match self.healthy_backend() {
            Some(backend) => backend.algorithm(),
            None => HashAlgorithm::Rolling32,
        }
    }

    /// True once a backend failure has forced the rolling hash
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    fn healthy_backend(&self) -> Option<&Arc<dyn DigestBackend>> {
        self.backend.as_ref().filter(|_| !self.is_degraded())
    }

    /// The `|`-joined canonical representation of `record`
    pub fn canonical_string(record: &FingerprintRecord) -> String {
        record.canonical_tokens().join(TOKEN_SEPARATOR)
    }

    pub async fn hash(&self, record: &FingerprintRecord) -> CanonicalHash {
        self.digest_text(&Self::canonical_string(record)).await
    }

    /// `None` only when there is no record to hash
    pub async fn hash_optional(&self, record: Option<&FingerprintRecord>) -> Option<CanonicalHash> {
        match record {
            Some(record) => Some(self.hash(record).await),
            None => None,
        }
    }

    /// Digests arbitrary text with this hasher's algorithm
    pub async fn digest_text(&self, text: &str) -> CanonicalHash {
        let Some(backend) = self.healthy_backend() else {
            return CanonicalHash {
                value: rolling_hash(text),
                algorithm: HashAlgorithm::Rolling32,
            };
        };

        match backend.digest(text.as_bytes()).await {
            Ok(bytes) => CanonicalHash {
                value: hex::encode(bytes),
                algorithm: backend.algorithm(),
            },
            Err(e) => {
                self.degraded.store(true, Ordering::Release);
                warn!("Digest backend failed ({}); using rolling hash from now on", e);
                CanonicalHash {
                    value: rolling_hash(text),
                    algorithm: HashAlgorithm::Rolling32,
                }
            }
        }
    }
}

/// 32-bit rolling hash (`h = h * 31 + unit` over UTF-16 code units).
///
/// Rendered as signed hexadecimal: `"0"` for empty input, a leading `-` for
/// negative values. The domain is 2^32 values; collisions are easy to find.
pub fn rolling_hash(text: &str) -> String {
    let hash = text
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));
    let hash = hash as i64;
    if hash < 0 {
        format!("-{:x}", -hash)
    } else {
        format!("{:x}", hash)
    }
}
