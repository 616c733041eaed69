use crate::debounce::DEFAULT_WINDOW;
use crate::error::{Error, Result};
use crate::fuzzy::DEFAULT_THRESHOLD;
use crate::ngram::{DEFAULT_MAX_PREDICTIONS, DEFAULT_ORDER, DEFAULT_SMOOTHING_ALPHA};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window size of the n-gram model, predicted word included.
    pub ngram_order: usize,
    pub smoothing_alpha: f64,
    /// Fuzzy matches must score strictly above this.
    pub fuzzy_threshold: f64,
    pub debounce_ms: u64,
    pub max_predictions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            ngram_order: DEFAULT_ORDER,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            fuzzy_threshold: DEFAULT_THRESHOLD,
            debounce_ms: DEFAULT_WINDOW.as_millis() as u64,
            max_predictions: DEFAULT_MAX_PREDICTIONS,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: EngineConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.ngram_order = config.ngram_order.max(1);
        Ok(config)
    }

    /// Missing file means defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ngram_order, 3);
        assert_eq!(config.smoothing_alpha, 0.1);
        assert_eq!(config.fuzzy_threshold, 0.3);
        assert_eq!(config.debounce(), Duration::from_millis(150));
        assert_eq!(config.max_predictions, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str("ngram_order = 0\nfuzzy_threshold = 0.5\n").unwrap();
        assert_eq!(config.ngram_order, 1);
        assert_eq!(config.fuzzy_threshold, 0.5);
        assert_eq!(config.max_predictions, 3);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let result = EngineConfig::from_toml_str("ngram_order = \"three\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path().join("engine.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());

        let path = dir.path().join("custom.toml");
        fs::write(&path, "debounce_ms = 50").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().debounce_ms, 50);
    }
}
