//! GPU identification on native hosts
//!
//! Walks DRM cards under sysfs and reports the first one with a known PCI
//! vendor. This is the native counterpart of the unmasked vendor/renderer
//! strings a browser exposes through its debug renderer extension.

use std::fs;
use std::path::Path;

use fid_error::Result;
use tracing::debug;

use super::GpuIdentity;
use crate::constants::native::{AMD_VENDOR_ID, INTEL_VENDOR_ID, NVIDIA_VENDOR_ID};

/// Reads the GPU identity from a DRM class directory (normally `/sys/class/drm`).
///
/// Returns `Ok(None)` when the directory is missing or no card has a known vendor.
pub fn read_gpu_identity(drm_path: &Path) -> Result<Option<GpuIdentity>> {
    if !drm_path.exists() {
        debug!("DRM path {} not found, GPU identity unavailable", drm_path.display());
        return Ok(None);
    }

    let mut cards: Vec<_> = fs::read_dir(drm_path)?
        .flatten()
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            // card0, card1 ... but not connector nodes like card0-HDMI-A-1
            name.starts_with("card") && !name.contains('-')
        })
        .map(|entry| entry.path())
        .collect();
    cards.sort();

    for card in cards {
        let device_path = card.join("device");
        let Some(vendor) = vendor_name(&device_path) else {
            continue;
        };
        let renderer = read_renderer(&device_path, vendor);
        return Ok(Some(GpuIdentity {
            vendor: Some(vendor.to_string()),
            renderer,
        }));
    }

    Ok(None)
}

fn vendor_name(device_path: &Path) -> Option<&'static str> {
    let vendor_id = fs::read_to_string(device_path.join("vendor")).ok()?;
    match vendor_id.trim() {
        NVIDIA_VENDOR_ID => Some("NVIDIA Corporation"),
        AMD_VENDOR_ID => Some("AMD"),
        INTEL_VENDOR_ID => Some("Intel"),
        _ => None,
    }
}

fn read_renderer(device_path: &Path, vendor: &str) -> Option<String> {
    let uevent = fs::read_to_string(device_path.join("uevent")).ok()?;
    uevent
        .lines()
        .find_map(|line| line.strip_prefix("DRIVER="))
        .map(|driver| format!("{} {} Graphics", vendor, driver.trim().to_uppercase()))
}
