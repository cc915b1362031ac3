//! Tool configuration: logging, capture timing and the default output directory.

use crate::capture::prepare::SORT_FALLBACK_TIMEOUT;
use crate::foundation::error::{CaptureError, CaptureResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration, read from JSON. Every field has a default.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewcapConfig {
    /// Logging setup.
    pub logging: LoggingConfig,
    /// Capture pipeline tuning.
    pub capture: CaptureOptions,
    /// Directory exports are written to when no output is given.
    pub output_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive such as `"info"` or `"viewcap=debug,warn"`. `RUST_LOG` takes precedence.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

/// Capture pipeline tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureOptions {
    /// How long to wait for a sort-complete signal before moving on.
    pub sort_timeout_ms: u64,
}

impl Default for ViewcapConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            capture: CaptureOptions::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            sort_timeout_ms: SORT_FALLBACK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl CaptureOptions {
    /// Sort fallback timeout as a [`Duration`].
    pub fn sort_timeout(&self) -> Duration {
        Duration::from_millis(self.sort_timeout_ms)
    }
}

impl ViewcapConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist and parse. Without one, the standard location is used when
    /// present; unreadable or malformed files there fall back to defaults with a warning.
    pub fn load(path: Option<&Path>) -> CaptureResult<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let standard = config_file_path();
        if !standard.exists() {
            return Ok(Self::default());
        }
        match Self::from_file(&standard) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                tracing::warn!(path = %standard.display(), error = %e, "ignoring config file");
                Ok(Self::default())
            }
        }
    }

    /// Parse a JSON config file.
    pub fn from_file(path: &Path) -> CaptureResult<Self> {
        use anyhow::Context as _;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str(&content).map_err(|e| {
            CaptureError::validation(format!("invalid config '{}': {e}", path.display()))
        })
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("viewcap").join("config.json")
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
