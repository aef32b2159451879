//! TOML configuration for the `dsi` library and binary.
//!
//! Reads and writes [`DsiConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\DisplayServerInteractions\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/dsi/config.toml` (or `~/.config/dsi/`)
//! - macOS:    `~/Library/Application Support/DisplayServerInteractions/config.toml`
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [x11]
//! display = ":1"
//! report_protocol_errors = true
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section and
//! a missing key all fall back to the same values as [`DsiConfig::default`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dsi_core::{ErrorSink, ProtocolError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::x11::X11Options;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DsiConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub x11: X11Config,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct X11Config {
    /// Display to open instead of `$DISPLAY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Forward X protocol errors to a `warn`-level sink.  They are always
    /// logged at `debug`.
    #[serde(default)]
    pub report_protocol_errors: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DsiConfig {
    /// Connection options for the X11 backend.
    pub fn x11_options(&self) -> X11Options {
        let error_sink = self.x11.report_protocol_errors.then(|| {
            let sink: ErrorSink = Arc::new(|err: &ProtocolError| {
                tracing::warn!(%err, "X protocol error");
            });
            sink
        });
        X11Options {
            display: self.x11.display.clone(),
            error_sink,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the platform location, or defaults if absent.
pub fn load_config() -> Result<DsiConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config from `path`, or defaults if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<DsiConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DsiConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes the config to the platform location, creating the directory.
pub fn save_config(config: &DsiConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

pub fn save_config_to(config: &DsiConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DisplayServerInteractions"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("dsi"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DisplayServerInteractions")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("dsi-config-{tag}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn test_default_log_level_is_info() {
        assert_eq!(DsiConfig::default().general.log_level, "info");
    }

    #[test]
    fn test_default_x11_uses_env_display_and_no_sink() {
        let opts = DsiConfig::default().x11_options();
        assert!(opts.display.is_none());
        assert!(opts.error_sink.is_none());
    }

    #[test]
    fn test_report_protocol_errors_installs_sink() {
        let mut cfg = DsiConfig::default();
        cfg.x11.report_protocol_errors = true;
        assert!(cfg.x11_options().error_sink.is_some());
    }

    #[test]
    fn test_partial_toml_fills_missing_fields_with_defaults() {
        // Arrange
        let text = "[x11]\ndisplay = \":1\"\n";

        // Act
        let cfg: DsiConfig = toml::from_str(text).expect("parse");

        // Assert
        assert_eq!(cfg.x11.display.as_deref(), Some(":1"));
        assert!(!cfg.x11.report_protocol_errors);
        assert_eq!(cfg.general.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = scratch_dir("invalid");
        let path = dir.join("config.toml");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(&path, "[general\nlog_level = 3").expect("write");

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = scratch_dir("missing").join("config.toml");
        assert_eq!(load_config_from(&path).expect("load"), DsiConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        // Arrange
        let dir = scratch_dir("save");
        let path = dir.join("nested").join("config.toml");
        let mut cfg = DsiConfig::default();
        cfg.general.log_level = "debug".to_string();
        cfg.x11.display = Some(":2".to_string());

        // Act
        save_config_to(&cfg, &path).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
