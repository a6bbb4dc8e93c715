//! Application Settings
//!
//! Persistent settings stored as JSON in ~/.config/fortress-id/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fid_error::{FortressError, Result};
use tracing::warn;

use crate::constants::{discovery, paths, public_ip};
use crate::platform::ScreenInfo;

/// Longest discovery timeout accepted from the settings file
const MAX_DISCOVERY_TIMEOUT_MS: u64 = 60_000;

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound for one private address discovery attempt
    pub discovery_timeout_ms: u64,

    /// JSON echo service queried for the public address
    pub public_ip_endpoint: String,

    pub public_ip_timeout_secs: u64,

    /// Default log filter when FORTRESS_ID_LOG is unset
    pub log_level: String,

    /// Screen reported by the native provider, "WxH@D". Headless hosts have no screen.
    pub screen_override: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: discovery::DEFAULT_TIMEOUT_MS,
            public_ip_endpoint: public_ip::DEFAULT_ENDPOINT.to_string(),
            public_ip_timeout_secs: public_ip::DEFAULT_TIMEOUT_SECS,
            log_level: "warn".to_string(),
            screen_override: None,
        }
    }
}

impl Settings {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn public_ip_timeout(&self) -> Duration {
        Duration::from_secs(self.public_ip_timeout_secs)
    }

    /// Parsed screen override. A malformed value is logged and ignored.
    pub fn screen(&self) -> Option<ScreenInfo> {
        let raw = self.screen_override.as_deref()?;
        match raw.parse() {
            Ok(screen) => Some(screen),
            Err(e) => {
                warn!("Ignoring screen override: {}", e);
                None
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.discovery_timeout_ms == 0 || self.discovery_timeout_ms > MAX_DISCOVERY_TIMEOUT_MS {
            return Err(FortressError::invalid_config(
                "discovery_timeout_ms",
                format!("must be between 1 and {}", MAX_DISCOVERY_TIMEOUT_MS),
            ));
        }
        if self.public_ip_timeout_secs == 0 {
            return Err(FortressError::invalid_config("public_ip_timeout_secs", "must be positive"));
        }
        if !(self.public_ip_endpoint.starts_with("http://") || self.public_ip_endpoint.starts_with("https://")) {
            return Err(FortressError::invalid_config(
                "public_ip_endpoint",
                "must be an http or https URL",
            ));
        }
        if let Some(raw) = &self.screen_override {
            raw.parse::<ScreenInfo>()?;
        }
        Ok(())
    }
}

/// Get the settings file path, creating its directory if needed
///
/// Honours XDG_CONFIG_HOME through `dirs::config_dir`.
pub fn get_settings_path() -> Result<PathBuf> {
    let app_dir = dirs::config_dir()
        .ok_or_else(|| FortressError::config("Could not determine config directory"))?
        .join(paths::APP_DIR);

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir).map_err(|e| {
            FortressError::config(format!("Failed to create config directory: {}", e))
        })?;
    }

    Ok(app_dir.join(paths::SETTINGS_FILE))
}

/// Load settings from the default location
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load settings from `path`. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path).map_err(|source| FortressError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let settings: Settings = serde_json::from_str(&content)?;

    settings.validate()?;
    Ok(settings)
}

/// Save settings to the default location
pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&get_settings_path()?, settings)
}

/// Save settings to `path` atomically (temp file + rename)
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;

    let json = serde_json::to_string_pretty(settings).map_err(|e| {
        FortressError::config(format!("Failed to serialize settings: {}", e))
    })?;

    let temp_path = path.with_extension("json.tmp");
    let write_err = |source: std::io::Error| FortressError::FileWrite {
        path: temp_path.clone(),
        source,
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(json.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|source| FortressError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.discovery_timeout(), Duration::from_millis(1500));
        assert_eq!(settings.public_ip_timeout(), Duration::from_secs(5));
        assert_eq!(settings.public_ip_endpoint, "https://api.ipify.org?format=json");
        assert!(settings.screen().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            discovery_timeout_ms: 500,
            screen_override: Some("2560x1440@30".to_string()),
            ..Default::default()
        };

        save_settings_to(&path, &settings).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(
            loaded.screen(),
            Some(ScreenInfo { width: 2560, height: 1440, color_depth: 30 })
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "log_level": "debug" }"#).unwrap();

        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.discovery_timeout_ms, 1500);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_settings_from(&path), Err(FortressError::JsonParse(_))));
    }

    #[test]
    fn test_unreadable_file_reports_its_path() {
        let dir = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file
        let path = dir.path().join("settings.json");
        fs::create_dir(&path).unwrap();

        match load_settings_from(&path) {
            Err(FortressError::FileRead { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected FileRead, got {:?}", other),
        }
    }

    #[test]
    fn test_save_into_missing_directory_reports_file_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("settings.json");

        match save_settings_to(&path, &Settings::default()) {
            Err(FortressError::FileWrite { path: failed, .. }) => {
                assert_eq!(failed, path.with_extension("json.tmp"))
            }
            other => panic!("expected FileWrite, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_validation() {
        let zero = Settings { discovery_timeout_ms: 0, ..Default::default() };
        assert!(zero.validate().is_err());

        let endpoint = Settings { public_ip_endpoint: "ftp://x".into(), ..Default::default() };
        assert!(endpoint.validate().is_err());

        let screen = Settings { screen_override: Some("wide".into()), ..Default::default() };
        assert!(screen.validate().is_err());
        assert!(screen.screen().is_none());
    }
}
