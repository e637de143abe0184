//! Loading timing configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Fade-out time added after the minimum loading duration (ms).
pub const FADE_OUT_DELAY: u64 = 300;

/// Minimum time the loading visual stays on screen (ms).
pub const MIN_LOADING: u64 = 800;

/// Timing configuration of a loading scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadingConfig {
    /// Settle time after the minimum loading duration, in ms
    pub delay: u64,

    /// Minimum visible loading time, in ms
    pub min_loading: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            delay: FADE_OUT_DELAY,
            min_loading: MIN_LOADING,
        }
    }
}

impl LoadingConfig {
    /// Create a configuration.
    pub fn new(delay: u64, min_loading: u64) -> Self {
        Self { delay, min_loading }
    }

    /// No minimum and no delay: completion mounts immediately.
    pub fn immediate() -> Self {
        Self::new(0, 0)
    }

    /// Read a configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(ConfigError::Invalid(
                "loading configuration must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Shallow merge: only keys present in the patch change.
    pub fn merge(&mut self, patch: &LoadingConfigPatch) {
        if let Some(delay) = patch.delay {
            self.delay = delay;
        }
        if let Some(min_loading) = patch.min_loading {
            self.min_loading = min_loading;
        }
    }

    /// Merged copy.
    pub fn merged(mut self, patch: &LoadingConfigPatch) -> Self {
        self.merge(patch);
        self
    }

    /// Fixed delay as a duration.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    /// Minimum loading time as a duration.
    pub fn min_loading(&self) -> Duration {
        Duration::from_millis(self.min_loading)
    }

    /// `max(min_loading - elapsed, 0) + delay`
    pub fn mounting_delay(&self, elapsed: Duration) -> Duration {
        self.min_loading().saturating_sub(elapsed) + self.delay()
    }
}

/// Partial configuration passed to `loading()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingConfigPatch {
    /// New delay, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,

    /// New minimum loading time, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_loading: Option<u64>,
}

impl LoadingConfigPatch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay.
    pub fn delay(mut self, delay: u64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the minimum loading time.
    pub fn min_loading(mut self, min_loading: u64) -> Self {
        self.min_loading = Some(min_loading);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.delay.is_none() && self.min_loading.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoadingConfig::default();
        assert_eq!(config.delay, FADE_OUT_DELAY);
        assert_eq!(config.min_loading, MIN_LOADING);
    }

    #[test]
    fn test_merge_only_changes_present_keys() {
        let mut config = LoadingConfig::new(50, 200);
        config.merge(&LoadingConfigPatch::new().min_loading(1000));
        assert_eq!(config, LoadingConfig::new(50, 1000));

        config.merge(&LoadingConfigPatch::new());
        assert_eq!(config, LoadingConfig::new(50, 1000));
    }

    #[test]
    fn test_mounting_delay() {
        let config = LoadingConfig::new(50, 200);
        assert_eq!(
            config.mounting_delay(Duration::from_millis(120)),
            Duration::from_millis(130)
        );
        // past the minimum only the delay remains
        assert_eq!(
            config.mounting_delay(Duration::from_millis(500)),
            Duration::from_millis(50)
        );
        assert_eq!(
            LoadingConfig::immediate().mounting_delay(Duration::ZERO),
            Duration::ZERO
        );
    }

    #[test]
    fn test_from_json_partial() {
        let config = LoadingConfig::from_json(r#"{"minLoading": 1000}"#).unwrap();
        assert_eq!(config, LoadingConfig::new(FADE_OUT_DELAY, 1000));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(matches!(
            LoadingConfig::from_json("[1, 2]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LoadingConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            LoadingConfig::from_json(r#"{"delay": -5}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_patch_from_json() {
        let patch: LoadingConfigPatch = serde_json::from_str(r#"{"delay": 10}"#).unwrap();
        assert_eq!(patch, LoadingConfigPatch::new().delay(10));
        assert!(!patch.is_empty());
    }
}
