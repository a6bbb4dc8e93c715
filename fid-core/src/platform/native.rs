//! Capability provider for a native (non-browser) host
//!
//! Linux-first: reads /proc and /sys, plus the usual locale and timezone
//! environment. Capabilities a native host has no portable answer for
//! (screen, drawing surface, do-not-track) report absent.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fid_error::Result;
use tracing::debug;

use super::{
    gpu, CapabilityProvider, DigestBackend, DrawingSurface, GpuIdentity, ScreenInfo,
    Sha256Backend,
};
use crate::constants::native::{
    DRM_PATH, KB_PER_GB, LOCALTIME_LINK, MAX_DEVICE_MEMORY_GB, MEMINFO_PATH,
    MIN_DEVICE_MEMORY_GB, TIMEZONE_FILE,
};

/// Provider backed by the local operating system
#[derive(Debug, Clone)]
pub struct NativeProvider {
    drm_path: PathBuf,
    meminfo_path: PathBuf,
    screen: Option<ScreenInfo>,
}

impl Default for NativeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeProvider {
    pub fn new() -> Self {
        Self {
            drm_path: PathBuf::from(DRM_PATH),
            meminfo_path: PathBuf::from(MEMINFO_PATH),
            screen: None,
        }
    }

    /// Native hosts have no portable screen query; callers may supply one.
    pub fn with_screen(mut self, screen: Option<ScreenInfo>) -> Self {
        self.screen = screen;
        self
    }

    /// Point sysfs/procfs lookups somewhere else (tests, containers)
    pub fn with_roots(mut self, drm_path: impl Into<PathBuf>, meminfo_path: impl Into<PathBuf>) -> Self {
        self.drm_path = drm_path.into();
        self.meminfo_path = meminfo_path.into();
        self
    }
}

impl CapabilityProvider for NativeProvider {
    fn has_minimal_context(&self) -> bool {
        true
    }

    fn screen(&self) -> Result<Option<ScreenInfo>> {
        Ok(self.screen)
    }

    fn timezone(&self) -> Result<Option<String>> {
        if let Ok(tz) = env::var("TZ") {
            let tz = tz.trim_start_matches(':').trim();
            if !tz.is_empty() {
                return Ok(Some(tz.to_string()));
            }
        }

        if let Ok(content) = fs::read_to_string(TIMEZONE_FILE) {
            let tz = content.trim();
            if !tz.is_empty() {
                return Ok(Some(tz.to_string()));
            }
        }

        Ok(timezone_from_link(Path::new(LOCALTIME_LINK)))
    }

    fn language(&self) -> Result<Option<String>> {
        let raw = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .find(|value| !value.is_empty());
        Ok(raw.as_deref().and_then(normalize_locale))
    }

    fn user_agent(&self) -> Result<Option<String>> {
        Ok(Some(format!(
            "fortress-id/{} ({}; {})",
            env!("CARGO_PKG_VERSION"),
            env::consts::OS,
            env::consts::ARCH
        )))
    }

    fn platform(&self) -> Result<Option<String>> {
        Ok(Some(format!("{} {}", env::consts::OS, env::consts::ARCH)))
    }

    fn cookies_enabled(&self) -> Result<Option<bool>> {
        // No cookie jar outside a browser
        Ok(Some(false))
    }

    fn do_not_track(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn hardware_concurrency(&self) -> Result<Option<u32>> {
        Ok(std::thread::available_parallelism()
            .ok()
            .map(|n| n.get() as u32))
    }

    fn device_memory_gb(&self) -> Result<Option<f64>> {
        let content = match fs::read_to_string(&self.meminfo_path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Cannot read {}: {}", self.meminfo_path.display(), e);
                return Ok(None);
            }
        };
        Ok(parse_meminfo_total_kb(&content).map(bucket_device_memory))
    }

    fn drawing_surface(&self, _width: u32, _height: u32) -> Result<Option<Box<dyn DrawingSurface>>> {
        Ok(None)
    }

    fn gpu_identity(&self) -> Result<Option<GpuIdentity>> {
        gpu::read_gpu_identity(&self.drm_path)
    }

    fn digest_backend(&self) -> Option<Arc<dyn DigestBackend>> {
        Some(Arc::new(Sha256Backend))
    }
}

/// "en_US.UTF-8" -> "en-US"; "C" and "POSIX" carry no language
fn normalize_locale(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

fn timezone_from_link(link: &Path) -> Option<String> {
    let target = fs::read_link(link).ok()?;
    let target = target.to_string_lossy();
    target
        .split_once("zoneinfo/")
        .map(|(_, zone)| zone.to_string())
        .filter(|zone| !zone.is_empty())
}

fn parse_meminfo_total_kb(content: &str) -> Option<u64> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

/// Rounds to the nearest power of two GB and clamps like browsers do
fn bucket_device_memory(total_kb: u64) -> f64 {
    let gb = total_kb as f64 / KB_PER_GB;
    if gb <= 0.0 {
        return MIN_DEVICE_MEMORY_GB;
    }
    2f64.powf(gb.log2().round())
        .clamp(MIN_DEVICE_MEMORY_GB, MAX_DEVICE_MEMORY_GB)
}
