//! Platform capability surface
//!
//! Everything the fingerprint pipeline reads from the host goes through
//! [`CapabilityProvider`]. There are no ambient globals: the collector is handed
//! a provider, and tests hand it a fabricated one.
//!
//! Each query answers independently:
//!
//! - `Ok(Some(value))` - capability present
//! - `Ok(None)` - capability absent or blocked by the host (expected, not an error)
//! - `Err(_)` - capability present but failed while being read
//!
//! The collector maps both `Ok(None)` and `Err(_)` to the field's null form.

pub mod canvas;
pub mod digest;
pub mod gpu;
pub mod native;

use std::sync::Arc;

use fid_error::{FortressError, Result};
use serde::{Deserialize, Serialize};

pub use canvas::{DrawOp, DrawingSurface, Paint, TextBaseline, CANVAS_SCRIPT};
pub use digest::{DigestBackend, HashAlgorithm, Sha256Backend};
pub use native::NativeProvider;

/// Screen geometry as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    /// Bits per pixel
    pub color_depth: u32,
}

impl ScreenInfo {
    /// "WxH" form used by the fingerprint record
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for ScreenInfo {
    type Err = FortressError;

    /// Parses "WxH@D", or "WxH" with a 24-bit default depth
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FortressError::invalid_config("screen", format!("expected WxH[@D], got {:?}", s));
        let (size, depth) = match s.trim().split_once('@') {
            Some((size, depth)) => (size, depth.parse().map_err(|_| invalid())?),
            None => (s.trim(), 24),
        };
        let (width, height) = size.split_once(['x', 'X']).ok_or_else(invalid)?;
        Ok(Self {
            width: width.parse().map_err(|_| invalid())?,
            height: height.parse().map_err(|_| invalid())?,
            color_depth: depth,
        })
    }
}

/// Unmasked GPU identification strings
///
/// Many hosts hide these for privacy; both fields may be `None` even when the
/// query itself succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuIdentity {
    pub vendor: Option<String>,
    pub renderer: Option<String>,
}

/// Minimal platform surface consumed by the fingerprint collector
pub trait CapabilityProvider: Send + Sync {
    /// Whether the host exposes the window/navigator/document equivalents at all.
    ///
    /// When this is false collection cannot begin.
    fn has_minimal_context(&self) -> bool;

    fn screen(&self) -> Result<Option<ScreenInfo>>;

    /// IANA timezone name, e.g. "Europe/Berlin"
    fn timezone(&self) -> Result<Option<String>>;

    /// BCP 47 language tag, e.g. "en-US"
    fn language(&self) -> Result<Option<String>>;

    fn user_agent(&self) -> Result<Option<String>>;

    fn platform(&self) -> Result<Option<String>>;

    fn cookies_enabled(&self) -> Result<Option<bool>>;

    /// Raw do-not-track flag as exposed by the host ("1", "0", anything else)
    fn do_not_track(&self) -> Result<Option<String>>;

    /// Logical CPU count
    fn hardware_concurrency(&self) -> Result<Option<u32>>;

    /// Approximate device memory in gigabytes
    fn device_memory_gb(&self) -> Result<Option<f64>>;

    /// Offscreen 2D drawing surface of the given size
    fn drawing_surface(&self, width: u32, height: u32) -> Result<Option<Box<dyn DrawingSurface>>>;

    /// Renderer/vendor identification extension
    fn gpu_identity(&self) -> Result<Option<GpuIdentity>>;

    /// Cryptographic digest function, if the host has one
    fn digest_backend(&self) -> Option<Arc<dyn DigestBackend>>;
}
