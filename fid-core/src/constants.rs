//! Constants and configuration values for Fortress ID
//!
//! Centralizes the magic numbers used by the collector, the hasher and the
//! network producers. Add new values here rather than inline.

use std::time::Duration;

/// Fingerprint schema identification
pub mod schema {
    /// Version of the fingerprint field set.
    ///
    /// Bump whenever a field is added, removed or reordered: every change moves
    /// the hash space.
    pub const SCHEMA_VERSION: u32 = 1;

    /// Separator between canonical tokens. Values are not escaped.
    pub const TOKEN_SEPARATOR: &str = "|";

    /// Token written for null or absent fields
    pub const NULL_TOKEN: &str = "null";

    /// Fallback value for non-optional string fields whose capability is missing
    pub const NOT_AVAILABLE: &str = "N/A";
}

/// Canvas signature drawing parameters
pub mod canvas {
    /// Offscreen surface width in pixels
    pub const WIDTH: u32 = 200;

    /// Offscreen surface height in pixels
    pub const HEIGHT: u32 = 60;

    /// Primary text drawn on the surface (includes an emoji to exercise glyph fallback)
    pub const PRIMARY_TEXT: &str = "BrowserCanvasTest! \u{1F3A8}";

    /// Second text pass, drawn with the gradient fill
    pub const GRADIENT_TEXT: &str = "More text for fingerprinting.";

    /// Font used for both text passes
    pub const FONT: &str = "16pt \"Arial\"";
}

/// Private address discovery timing
pub mod discovery {
    use super::Duration;

    /// Default upper bound for a discovery attempt
    pub const DEFAULT_TIMEOUT_MS: u64 = 1500;

    /// Default timeout as a Duration
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TIMEOUT_MS);

    /// Label of the throwaway data channel that triggers candidate gathering
    pub const DATA_CHANNEL_LABEL: &str = "";

    /// Address used to make the OS pick an outbound interface. No packet is sent.
    pub const ROUTE_PROBE_ADDR: &str = "192.0.2.1:9";
}

/// Public IP echo service
pub mod public_ip {
    /// JSON echo endpoint returning `{ "ip": "..." }`
    pub const DEFAULT_ENDPOINT: &str = "https://api.ipify.org?format=json";

    /// Request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
}

/// Native host probing
pub mod native {
    /// Path to DRM (Direct Rendering Manager) devices
    pub const DRM_PATH: &str = "/sys/class/drm";

    /// Kernel memory summary
    pub const MEMINFO_PATH: &str = "/proc/meminfo";

    /// Debian-style timezone file
    pub const TIMEZONE_FILE: &str = "/etc/timezone";

    /// Symlink into the zoneinfo database
    pub const LOCALTIME_LINK: &str = "/etc/localtime";

    /// PCI vendor ID for NVIDIA GPUs
    pub const NVIDIA_VENDOR_ID: &str = "0x10de";

    /// PCI vendor ID for AMD GPUs
    pub const AMD_VENDOR_ID: &str = "0x1002";

    /// PCI vendor ID for Intel GPUs
    pub const INTEL_VENDOR_ID: &str = "0x8086";

    /// Kilobytes per gigabyte for memory conversion
    pub const KB_PER_GB: f64 = 1024.0 * 1024.0;

    /// Largest device memory value reported, matching browser bucketing
    pub const MAX_DEVICE_MEMORY_GB: f64 = 8.0;

    /// Smallest device memory value reported
    pub const MIN_DEVICE_MEMORY_GB: f64 = 0.25;
}

/// Settings file location
pub mod paths {
    /// Directory name under the user config dir
    pub const APP_DIR: &str = "fortress-id";

    /// Settings file name
    pub const SETTINGS_FILE: &str = "settings.json";
}
