use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::domain::{ModelDescriptor, ModelSource, SolverError};
use crate::ports::{HttpClient, Provisioner};

/// Fetches and unpacks the recognizer model archive.
///
/// The archive is staged into a scratch directory next to the target, so the
/// final rename stays on one filesystem and the target directory is either
/// absent or complete. Readiness is re-checked after unpacking; an archive
/// missing required files fails provisioning rather than leaving a broken
/// install behind.
pub struct ModelProvisioner {
    http: Arc<dyn HttpClient>,
}

impl ModelProvisioner {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    async fn stage_archive(
        &self,
        source: &ModelSource,
        archive: &Path,
    ) -> Result<(), SolverError> {
        match source {
            ModelSource::Url(url) => {
                info!(url, "downloading model archive");
                self.http.download_file(url, archive).await
            }
            ModelSource::Archive(path) => {
                debug!(path = %path.display(), "copying local model archive");
                tokio::fs::copy(path, archive).await?;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Provisioner for ModelProvisioner {
    #[instrument(skip(self, descriptor), fields(dir = %descriptor.target_dir.display()))]
    async fn ensure_model(&self, descriptor: &ModelDescriptor) -> Result<(), SolverError> {
        if descriptor.is_ready() {
            debug!("model already provisioned");
            return Ok(());
        }

        let parent = descriptor
            .target_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        tokio::fs::create_dir_all(&parent).await?;
        let staging = tempfile::tempdir_in(&parent)?;

        let archive = staging.path().join("model.zip");
        self.stage_archive(&descriptor.source, &archive).await?;

        let unpack_dir = staging.path().join("unpacked");
        let root = {
            let unpack_dir = unpack_dir.clone();
            tokio::task::spawn_blocking(move || unpack_archive(&archive, &unpack_dir))
                .await
                .map_err(|e| SolverError::Provisioning(format!("unpack task failed: {e}")))??
        };

        if !ModelDescriptor::dir_is_ready(&root) {
            return Err(SolverError::Provisioning(format!(
                "archive is missing required model files under {}",
                root.display()
            )));
        }

        if tokio::fs::metadata(&descriptor.target_dir).await.is_ok() {
            tokio::fs::remove_dir_all(&descriptor.target_dir).await?;
        }
        tokio::fs::rename(&root, &descriptor.target_dir).await?;
        info!("model provisioned");
        Ok(())
    }
}

fn unpack_archive(archive: &Path, unpack_dir: &Path) -> Result<PathBuf, SolverError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| SolverError::Provisioning(format!("unreadable archive: {e}")))?;
    zip.extract(unpack_dir)
        .map_err(|e| SolverError::Provisioning(format!("extraction failed: {e}")))?;
    Ok(resolve_model_root(unpack_dir))
}

/// Published model archives wrap their content in a single versioned top-level
/// directory. Descend into it when that is the only entry; otherwise the
/// unpack directory itself is the model root.
fn resolve_model_root(unpack_dir: &Path) -> PathBuf {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(unpack_dir) {
        Ok(iter) => iter.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(_) => return unpack_dir.to_path_buf(),
    };
    if entries.len() == 1 {
        let only = entries.remove(0);
        if only.is_dir() {
            return only;
        }
    }
    unpack_dir.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::REQUIRED_MODEL_FILES;
    use std::io::{Cursor, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zip::write::SimpleFileOptions;

    fn model_zip(prefix: &str, files: &[&str]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();
        for file in files {
            let name = if prefix.is_empty() {
                file.to_string()
            } else {
                format!("{prefix}/{file}")
            };
            zip.start_file(name, options).unwrap();
            zip.write_all(b"stub").unwrap();
        }
        zip.finish().unwrap();
        cursor.into_inner()
    }

    struct ServeArchive {
        bytes: Vec<u8>,
        downloads: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for ServeArchive {
        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, SolverError> {
            Err(SolverError::Http(format!("unexpected GET {url}")))
        }

        async fn download_file(&self, _url: &str, path: &Path) -> Result<(), SolverError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(path, &self.bytes).await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn provisions_from_url_and_is_idempotent() {
        let home = tempfile::tempdir().unwrap();
        let http = Arc::new(ServeArchive {
            bytes: model_zip("vosk-model-small-en-us-0.15", &REQUIRED_MODEL_FILES),
            downloads: AtomicUsize::new(0),
        });
        let descriptor = ModelDescriptor::new(
            ModelSource::Url("https://models.example/model.zip".to_string()),
            home.path().join("models").join("en"),
        );

        let provisioner = ModelProvisioner::new(http.clone());
        provisioner.ensure_model(&descriptor).await.unwrap();
        assert!(descriptor.is_ready());
        assert_eq!(http.downloads.load(Ordering::SeqCst), 1);

        // Second call finds the directory ready and does no network I/O.
        provisioner.ensure_model(&descriptor).await.unwrap();
        assert_eq!(http.downloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provisions_from_local_archive_without_root_dir() {
        let home = tempfile::tempdir().unwrap();
        let archive_path = home.path().join("bundle.zip");
        std::fs::write(&archive_path, model_zip("", &REQUIRED_MODEL_FILES)).unwrap();

        let descriptor = ModelDescriptor::new(
            ModelSource::Archive(archive_path),
            home.path().join("models").join("bundle"),
        );
        let http = Arc::new(ServeArchive {
            bytes: Vec::new(),
            downloads: AtomicUsize::new(0),
        });

        ModelProvisioner::new(http.clone())
            .ensure_model(&descriptor)
            .await
            .unwrap();
        assert!(descriptor.is_ready());
        assert_eq!(http.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn incomplete_archive_fails_and_leaves_no_target() {
        let home = tempfile::tempdir().unwrap();
        let archive_path = home.path().join("bad.zip");
        std::fs::write(
            &archive_path,
            model_zip("model", &REQUIRED_MODEL_FILES[..2]),
        )
        .unwrap();

        let target = home.path().join("models").join("bad");
        let descriptor = ModelDescriptor::new(ModelSource::Archive(archive_path), target.clone());
        let http = Arc::new(ServeArchive {
            bytes: Vec::new(),
            downloads: AtomicUsize::new(0),
        });

        let err = ModelProvisioner::new(http)
            .ensure_model(&descriptor)
            .await
            .unwrap_err();
        assert!(matches!(err, SolverError::Provisioning(_)));
        assert!(!target.exists());
    }
}
