//! Fingerprint record schema
//!
//! The record is a fixed set of named fields. Their order is declared once in
//! [`FIELD_ORDER`] and the canonical token list is produced by exhaustively
//! destructuring the struct, so adding or removing a field does not compile
//! until both are updated (and [`SCHEMA_VERSION`] bumped).

use serde::{Deserialize, Serialize};

pub use crate::constants::schema::SCHEMA_VERSION;
use crate::constants::schema::NULL_TOKEN;

/// Number of fields in the schema
pub const FIELD_COUNT: usize = 13;

/// Canonical field order. Hashing follows this order, never struct or map order.
pub const FIELD_ORDER: [&str; FIELD_COUNT] = [
    "ScreenResolution",
    "ColorDepth",
    "Timezone",
    "Language",
    "CanvasFingerprint",
    "WebGLVendor",
    "WebGLRenderer",
    "UserAgent",
    "Platform",
    "CookiesEnabled",
    "DoNotTrack",
    "CpuCores",
    "DeviceMemory",
];

/// Do-not-track preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DoNotTrack {
    Enabled,
    Disabled,
    #[default]
    Unspecified,
}

impl DoNotTrack {
    /// Maps the raw host flag: "1" enabled, "0" disabled, anything else unspecified
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("1") => Self::Enabled,
            Some("0") => Self::Disabled,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DoNotTrack::Enabled => "Enabled",
            DoNotTrack::Disabled => "Disabled",
            DoNotTrack::Unspecified => "Unspecified",
        }
    }
}

impl std::fmt::Display for DoNotTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of observable platform signals, collected at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FingerprintRecord {
    /// "WxH"
    pub screen_resolution: String,
    /// Bits per pixel
    pub color_depth: u32,
    pub timezone: String,
    pub language: String,
    /// Digest of the rendered canvas script, `None` if drawing failed or is unsupported
    pub canvas_fingerprint: Option<String>,
    #[serde(rename = "WebGLVendor")]
    pub gpu_vendor: Option<String>,
    #[serde(rename = "WebGLRenderer")]
    pub gpu_renderer: Option<String>,
    pub user_agent: String,
    pub platform: String,
    pub cookies_enabled: bool,
    pub do_not_track: DoNotTrack,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,
    /// Gigabytes; may be fractional on low-memory devices (0.25, 0.5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_memory: Option<f64>,
}

impl FingerprintRecord {
    /// Field values in [`FIELD_ORDER`], `None` for null or absent fields
    pub fn field_values(&self) -> [(&'static str, Option<String>); FIELD_COUNT] {
        // No `..`: a new field must be placed here explicitly.
        let FingerprintRecord {
            screen_resolution,
            color_depth,
            timezone,
            language,
            canvas_fingerprint,
            gpu_vendor,
            gpu_renderer,
            user_agent,
            platform,
            cookies_enabled,
            do_not_track,
            cpu_cores,
            device_memory,
        } = self;

        let values = [
            Some(screen_resolution.clone()),
            Some(color_depth.to_string()),
            Some(timezone.clone()),
            Some(language.clone()),
            canvas_fingerprint.clone(),
            gpu_vendor.clone(),
            gpu_renderer.clone(),
            Some(user_agent.clone()),
            Some(platform.clone()),
            Some(cookies_enabled.to_string()),
            Some(do_not_track.to_string()),
            cpu_cores.map(|c| c.to_string()),
            device_memory.map(|m| m.to_string()),
        ];

        let mut i = 0;
        values.map(|value| {
            let name = FIELD_ORDER[i];
            i += 1;
            (name, value)
        })
    }

    /// Canonical tokens: field values in schema order with null/absent as `"null"`
    pub fn canonical_tokens(&self) -> [String; FIELD_COUNT] {
        self.field_values()
            .map(|(_, value)| value.unwrap_or_else(|| NULL_TOKEN.to_string()))
    }
}
