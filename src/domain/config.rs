use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::error::SolverError;
use crate::domain::model::{ModelDescriptor, ModelSource};

/// Solver configuration.
///
/// Every field has a sensible default, so `SolverConfig::default()` works for
/// the common case. Harnesses that keep settings in TOML can round-trip the
/// whole struct with [`SolverConfig::from_toml`] / [`SolverConfig::to_toml`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Upper bound in milliseconds for every DOM wait.
    pub timeout_ms: u64,
    /// Pause after switching to audio mode, before the audio source is
    /// polled. The audio element needs a moment to attach.
    pub settle_delay_ms: u64,
    /// Where the recognizer model archive comes from.
    pub model_source: ModelSource,
    /// Override for the unpacked model directory. Defaults to a directory
    /// under the per-user cache dir derived from the archive name.
    pub model_dir: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            settle_delay_ms: 500,
            model_source: ModelSource::default(),
            model_dir: None,
        }
    }
}

impl SolverConfig {
    /// Resolve the model descriptor this configuration describes.
    pub fn model_descriptor(&self) -> ModelDescriptor {
        match &self.model_dir {
            Some(dir) => ModelDescriptor::new(self.model_source.clone(), dir.clone()),
            None => ModelDescriptor::with_default_dir(self.model_source.clone()),
        }
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, SolverError> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> Result<String, SolverError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DEFAULT_MODEL_URL;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.timeout_ms, 15_000);
        assert_eq!(config.settle_delay_ms, 500);
        assert_eq!(
            config.model_source,
            ModelSource::Url(DEFAULT_MODEL_URL.to_string())
        );
        assert!(config.model_dir.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SolverConfig::default();
        config.timeout_ms = 30_000;
        config.model_source = ModelSource::Archive(PathBuf::from("/srv/models/en.zip"));

        let text = config.to_toml().unwrap();
        let parsed = SolverConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.timeout_ms, 30_000);
        assert_eq!(parsed.model_source, config.model_source);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = SolverConfig::from_toml("timeout_ms = 5000\n").unwrap();
        assert_eq!(parsed.timeout_ms, 5_000);
        assert_eq!(parsed.settle_delay_ms, 500);
    }

    #[test]
    fn test_model_descriptor_honors_override() {
        let mut config = SolverConfig::default();
        config.model_dir = Some(PathBuf::from("/opt/models/en"));
        let descriptor = config.model_descriptor();
        assert_eq!(descriptor.target_dir, PathBuf::from("/opt/models/en"));
    }
}
