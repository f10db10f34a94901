use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, ScopeError, DEFAULT_HISTORY_LEN};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Reads a JSON config file; missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.history_len == 0 {
            return Err(ScopeError::InvalidConfig("history_len must be at least 1"));
        }
        if self.display.tick_interval_ms == 0 {
            return Err(ScopeError::InvalidConfig("tick_interval_ms must be non-zero"));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ScopeError::InvalidConfig("display size must be non-zero"));
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Configuration specific to the capture path and the audio engine boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Number of sample pairs kept in the ring.
    pub history_len: usize,
    /// Input device name; `None` picks the host default.
    pub device: Option<String>,
    /// Input channel wired to the "Reference" endpoint.
    pub reference_channel: u16,
    /// Input channel wired to the "Effect" endpoint.
    pub effect_channel: u16,
}

impl CaptureConfig {
    pub fn history(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.history_len)
            .ok_or(ScopeError::InvalidConfig("history_len must be at least 1"))
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            device: None,
            reference_channel: 0,
            effect_channel: 1,
        }
    }
}

/// Configuration for the render cadence and the display surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub tick_interval_ms: u64,
    pub width: u32,
    pub height: u32,
}

impl DisplayConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 20,
            width: 512,
            height: 512,
        }
    }
}
