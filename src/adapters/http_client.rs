use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::domain::SolverError;
use crate::ports::HttpClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

static SHARED: Lazy<Arc<HttpFetcher>> = Lazy::new(|| Arc::new(HttpFetcher::new()));

/// reqwest-backed [`HttpClient`].
///
/// One fetcher holds one connection pool; [`HttpFetcher::shared`] hands out
/// the process-wide instance so the audio download and the model download
/// reuse connections.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("hearsay/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, SolverError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SolverError::Http(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SolverError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for HttpFetcher {
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, SolverError> {
        let response = self.send(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SolverError::Http(e.to_string()))?;
        debug!(url, len = bytes.len(), "fetched resource");
        Ok(bytes.to_vec())
    }

    async fn download_file(&self, url: &str, path: &Path) -> Result<(), SolverError> {
        let response = self.send(url).await?;
        let total = response.content_length();

        // Stream into a sibling temp file, then rename. A crashed download
        // never leaves a half-written file at the final path.
        let tmp_path = path.with_extension("part");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&tmp_path).await?;

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SolverError::Http(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        if let Some(expected) = total {
            if written != expected {
                let _ = tokio::fs::remove_file(&tmp_path).await;
                warn!(url, written, expected, "download truncated");
                return Err(SolverError::Http(format!(
                    "truncated download: got {written} of {expected} bytes"
                )));
            }
        }

        tokio::fs::rename(&tmp_path, path).await?;
        debug!(url, written, path = %path.display(), "download complete");
        Ok(())
    }
}
