//! Fingerprint collection
//!
//! Reads every capability exactly once. A missing or failing capability only
//! nulls its own field; collection of the others carries on.

use std::sync::Arc;

use fid_error::Result;
use tracing::{debug, trace};

use super::hasher::CanonicalHasher;
use super::record::{DoNotTrack, FingerprintRecord};
use crate::constants::canvas::{HEIGHT, WIDTH};
use crate::constants::schema::NOT_AVAILABLE;
use crate::platform::canvas::render_signature_source;
use crate::platform::CapabilityProvider;

/// Assembles [`FingerprintRecord`]s from a capability provider
#[derive(Clone)]
pub struct FingerprintCollector {
    provider: Arc<dyn CapabilityProvider>,
    hasher: CanonicalHasher,
}

impl FingerprintCollector {
    /// `hasher` also digests the canvas signature
    pub fn new(provider: Arc<dyn CapabilityProvider>, hasher: CanonicalHasher) -> Self {
        Self { provider, hasher }
    }

    /// Uses the provider's own digest backend for the canvas signature
    pub fn from_provider(provider: Arc<dyn CapabilityProvider>) -> Self {
        let hasher = CanonicalHasher::from_provider(provider.as_ref());
        Self::new(provider, hasher)
    }

    pub fn hasher(&self) -> &CanonicalHasher {
        &self.hasher
    }

    /// Collects one record.
    ///
    /// Returns `None` only when the host has no minimal context at all.
    pub async fn collect(&self) -> Option<FingerprintRecord> {
        if !self.provider.has_minimal_context() {
            debug!("Minimal platform context absent, fingerprint unavailable");
            return None;
        }

        let provider = self.provider.as_ref();

        let screen = probe("screen", provider.screen());
        let timezone = probe("timezone", provider.timezone());
        let language = probe("language", provider.language());
        let canvas_fingerprint = self.canvas_signature().await;
        // Blocked debug-renderer info is the common case, not an error
        let gpu = probe("gpu identity", provider.gpu_identity()).unwrap_or_default();
        let user_agent = probe("user agent", provider.user_agent());
        let platform = probe("platform", provider.platform());
        let cookies_enabled = probe("cookies", provider.cookies_enabled());
        let do_not_track = probe("do-not-track", provider.do_not_track());
        let cpu_cores = probe("hardware concurrency", provider.hardware_concurrency());
        let device_memory = probe("device memory", provider.device_memory_gb());

        let record = FingerprintRecord {
            screen_resolution: screen
                .map(|s| s.resolution())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            color_depth: screen.map(|s| s.color_depth).unwrap_or(0),
            timezone: timezone.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            language: language.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            canvas_fingerprint,
            gpu_vendor: gpu.vendor,
            gpu_renderer: gpu.renderer,
            user_agent: user_agent.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            platform: platform.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            cookies_enabled: cookies_enabled.unwrap_or(false),
            do_not_track: DoNotTrack::from_raw(do_not_track.as_deref()),
            cpu_cores,
            device_memory,
        };

        trace!(?record, "Fingerprint collected");
        Some(record)
    }

    /// Digest of the fixed canvas script as rendered by this host
    async fn canvas_signature(&self) -> Option<String> {
        // The surface is dropped before the digest await point
        let encoded = {
            let mut surface = probe("drawing surface", self.provider.drawing_surface(WIDTH, HEIGHT))?;
            match render_signature_source(surface.as_mut()) {
                Ok(encoded) => encoded,
                Err(e) => {
                    debug!("Canvas rendering failed: {}", e);
                    return None;
                }
            }
        };
        Some(self.hasher.digest_text(&encoded).await.value)
    }
}

/// Collapses a capability query to present/absent
fn probe<T>(name: &str, result: Result<Option<T>>) -> Option<T> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            trace!("Capability {} absent", name);
            None
        }
        Err(e) => {
            debug!("Capability {} failed: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{
        DigestBackend, DrawOp, DrawingSurface, GpuIdentity, HashAlgorithm, ScreenInfo,
        Sha256Backend,
    };
    use async_trait::async_trait;
    use fid_error::FortressError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// SHA-256 that fails only its first call
    #[derive(Default)]
    struct FirstCallFails {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DigestBackend for FirstCallFails {
        fn algorithm(&self) -> HashAlgorithm {
            HashAlgorithm::Sha256
        }

        async fn digest(&self, data: &[u8]) -> Result<Vec<u8>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(FortressError::Digest("engine busy".into()));
            }
            Sha256Backend.digest(data).await
        }
    }

    /// Provider where every capability can be switched between present, absent and failing
    #[derive(Default)]
    struct FakeProvider {
        no_context: bool,
        fail_all: bool,
        canvas: bool,
        canvas_fails: bool,
    }

    impl FakeProvider {
        fn answer<T>(&self, value: T) -> Result<Option<T>> {
            if self.fail_all {
                Err(FortressError::capability("fake", "blocked"))
            } else {
                Ok(Some(value))
            }
        }
    }

    struct FakeSurface {
        fail: bool,
        ops: usize,
    }

    impl DrawingSurface for FakeSurface {
        fn draw(&mut self, _op: &DrawOp) -> Result<()> {
            if self.fail {
                return Err(FortressError::Drawing("security error".into()));
            }
            self.ops += 1;
            Ok(())
        }

        fn encode(&self) -> Result<String> {
            Ok(format!("data:image/png;base64,ops{}", self.ops))
        }
    }

    impl CapabilityProvider for FakeProvider {
        fn has_minimal_context(&self) -> bool {
            !self.no_context
        }
        fn screen(&self) -> Result<Option<ScreenInfo>> {
            self.answer(ScreenInfo { width: 1920, height: 1080, color_depth: 24 })
        }
        fn timezone(&self) -> Result<Option<String>> {
            self.answer("UTC".to_string())
        }
        fn language(&self) -> Result<Option<String>> {
            self.answer("en-US".to_string())
        }
        fn user_agent(&self) -> Result<Option<String>> {
            self.answer("Test/1.0".to_string())
        }
        fn platform(&self) -> Result<Option<String>> {
            self.answer("TestOS".to_string())
        }
        fn cookies_enabled(&self) -> Result<Option<bool>> {
            self.answer(true)
        }
        fn do_not_track(&self) -> Result<Option<String>> {
            self.answer("1".to_string())
        }
        fn hardware_concurrency(&self) -> Result<Option<u32>> {
            self.answer(8)
        }
        fn device_memory_gb(&self) -> Result<Option<f64>> {
            Ok(None)
        }
        fn drawing_surface(&self, _w: u32, _h: u32) -> Result<Option<Box<dyn DrawingSurface>>> {
            if !self.canvas {
                return Ok(None);
            }
            Ok(Some(Box::new(FakeSurface { fail: self.canvas_fails, ops: 0 })))
        }
        fn gpu_identity(&self) -> Result<Option<GpuIdentity>> {
            // Privacy-blocked: query works but exposes nothing
            Ok(Some(GpuIdentity::default()))
        }
        fn digest_backend(&self) -> Option<Arc<dyn DigestBackend>> {
            None
        }
    }

    fn collector(provider: FakeProvider) -> FingerprintCollector {
        FingerprintCollector::new(Arc::new(provider), CanonicalHasher::sha256())
    }

    #[tokio::test]
    async fn test_no_minimal_context_yields_none() {
        let c = collector(FakeProvider { no_context: true, canvas: true, ..Default::default() });
        assert!(c.collect().await.is_none());
    }

    #[tokio::test]
    async fn test_full_collection() {
        let c = collector(FakeProvider { canvas: true, ..Default::default() });
        let record = c.collect().await.unwrap();
        assert_eq!(record.screen_resolution, "1920x1080");
        assert_eq!(record.color_depth, 24);
        assert_eq!(record.do_not_track, DoNotTrack::Enabled);
        assert_eq!(record.cpu_cores, Some(8));
        assert_eq!(record.device_memory, None);
        assert_eq!(record.gpu_vendor, None);
        assert_eq!(record.gpu_renderer, None);
        let canvas = record.canvas_fingerprint.unwrap();
        assert_eq!(canvas.len(), 64);
    }

    #[tokio::test]
    async fn test_canvas_signature_is_deterministic() {
        let c = collector(FakeProvider { canvas: true, ..Default::default() });
        let a = c.collect().await.unwrap().canvas_fingerprint;
        let b = c.collect().await.unwrap().canvas_fingerprint;
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_canvas_failure_only_nulls_canvas() {
        let c = collector(FakeProvider { canvas: true, canvas_fails: true, ..Default::default() });
        let record = c.collect().await.unwrap();
        assert_eq!(record.canvas_fingerprint, None);
        assert_eq!(record.timezone, "UTC");
    }

    #[tokio::test]
    async fn test_every_capability_failing_still_yields_record() {
        let c = collector(FakeProvider { fail_all: true, ..Default::default() });
        let record = c.collect().await.unwrap();
        assert_eq!(record.screen_resolution, NOT_AVAILABLE);
        assert_eq!(record.color_depth, 0);
        assert_eq!(record.timezone, NOT_AVAILABLE);
        assert!(!record.cookies_enabled);
        assert_eq!(record.do_not_track, DoNotTrack::Unspecified);
        assert_eq!(record.cpu_cores, None);
        assert_eq!(record.canvas_fingerprint, None);
    }

    #[tokio::test]
    async fn test_from_provider_without_digest_uses_fallback() {
        let c = FingerprintCollector::from_provider(Arc::new(FakeProvider {
            canvas: true,
            ..Default::default()
        }));
        assert!(!c.hasher().algorithm().is_cryptographic());
        let record = c.collect().await.unwrap();
        // Rolling hash output is short signed hex, not 64 chars
        assert!(record.canvas_fingerprint.unwrap().len() <= 9);
    }

    #[tokio::test]
    async fn test_failed_canvas_digest_downgrades_device_id() {
        let hasher = CanonicalHasher::new(Some(Arc::new(FirstCallFails::default())));
        let c = FingerprintCollector::new(
            Arc::new(FakeProvider { canvas: true, ..Default::default() }),
            hasher,
        );
        let record = c.collect().await.unwrap();
        assert!(record.canvas_fingerprint.as_ref().unwrap().len() <= 9);

        let id = c.hasher().hash(&record).await;
        assert_eq!(id.algorithm, HashAlgorithm::Rolling32);
        assert!(!id.is_cryptographic());
    }
}
