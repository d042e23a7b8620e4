use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default published archive for the small English recognizer model.
pub const DEFAULT_MODEL_URL: &str =
    "https://alphacephei.com/vosk/models/vosk-model-small-en-us-0.15.zip";

/// Files that must exist under the model directory for it to be usable.
/// Their joint presence is the sole readiness check; no checksums are kept.
pub const REQUIRED_MODEL_FILES: [&str; 4] = [
    "am/final.mdl",
    "graph/HCLr.fst",
    "graph/Gr.fst",
    "ivector/final.dubm",
];

/// Where the packaged model archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Download the archive from a URL.
    Url(String),
    /// Unpack a local archive file (air-gapped setups, hermetic tests).
    Archive(PathBuf),
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::Url(DEFAULT_MODEL_URL.to_string())
    }
}

impl ModelSource {
    /// Directory-friendly name derived from the archive file name.
    pub fn stem(&self) -> String {
        let name = match self {
            ModelSource::Url(url) => url::Url::parse(url)
                .ok()
                .and_then(|u| {
                    u.path_segments()
                        .and_then(|mut s| s.next_back().map(str::to_string))
                })
                .unwrap_or_default(),
            ModelSource::Archive(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let stem = name.trim_end_matches(".zip");
        if stem.is_empty() {
            "model".to_string()
        } else {
            stem.to_string()
        }
    }
}

/// A recognizer model: where it comes from and where it lives on disk.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    /// Archive source, fetched only when the directory is not ready.
    pub source: ModelSource,
    /// Unpacked model directory.
    pub target_dir: PathBuf,
}

impl ModelDescriptor {
    pub fn new(source: ModelSource, target_dir: PathBuf) -> Self {
        Self { source, target_dir }
    }

    /// Place the model under the per-user cache directory.
    pub fn with_default_dir(source: ModelSource) -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        let target_dir = base.join("hearsay").join("models").join(source.stem());
        Self { source, target_dir }
    }

    /// True when every required model file is present.
    pub fn is_ready(&self) -> bool {
        Self::dir_is_ready(&self.target_dir)
    }

    /// Readiness check for an arbitrary directory.
    pub fn dir_is_ready(dir: &Path) -> bool {
        REQUIRED_MODEL_FILES.iter().all(|f| dir.join(f).is_file())
    }

    /// Required files that are currently missing.
    pub fn missing_files(&self) -> Vec<&'static str> {
        REQUIRED_MODEL_FILES
            .iter()
            .copied()
            .filter(|f| !self.target_dir.join(f).is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_source_stem_from_url() {
        let source = ModelSource::default();
        assert_eq!(source.stem(), "vosk-model-small-en-us-0.15");
    }

    #[test]
    fn test_source_stem_from_archive_path() {
        let source = ModelSource::Archive(PathBuf::from("/tmp/bundles/model-en.zip"));
        assert_eq!(source.stem(), "model-en");
    }

    #[test]
    fn test_source_stem_fallback() {
        let source = ModelSource::Url("not a url".to_string());
        assert_eq!(source.stem(), "model");
    }

    #[test]
    fn test_readiness_requires_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor =
            ModelDescriptor::new(ModelSource::default(), dir.path().to_path_buf());
        assert!(!descriptor.is_ready());
        assert_eq!(descriptor.missing_files().len(), 4);

        // Three of four files is still not ready.
        for file in REQUIRED_MODEL_FILES.iter().take(3) {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"stub").unwrap();
        }
        assert!(!descriptor.is_ready());
        assert_eq!(descriptor.missing_files(), vec!["ivector/final.dubm"]);

        let last = dir.path().join(REQUIRED_MODEL_FILES[3]);
        fs::create_dir_all(last.parent().unwrap()).unwrap();
        fs::write(&last, b"stub").unwrap();
        assert!(descriptor.is_ready());
        assert!(descriptor.missing_files().is_empty());
    }
}
