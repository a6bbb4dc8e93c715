//! Digest backends
//!
//! The canonical hasher prefers a cryptographic digest supplied by the host.
//! [`Sha256Backend`] is the native one.

use async_trait::async_trait;
use fid_error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Algorithm that produced a hash value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    /// 256-bit SHA-2, rendered as 64 lowercase hex chars
    Sha256,
    /// Degraded mode: 32-bit rolling hash, not collision resistant
    Rolling32,
}

impl HashAlgorithm {
    pub fn is_cryptographic(self) -> bool {
        matches!(self, Self::Sha256)
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "SHA-256"),
            HashAlgorithm::Rolling32 => write!(f, "rolling-32 (weak)"),
        }
    }
}

/// Host digest function. May suspend (e.g. a host crypto API returning a promise).
#[async_trait]
pub trait DigestBackend: Send + Sync {
    fn algorithm(&self) -> HashAlgorithm;

    async fn digest(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// In-process SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Backend;

#[async_trait]
impl DigestBackend for Sha256Backend {
    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    async fn digest(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(Sha256::digest(data).to_vec())
    }
}
