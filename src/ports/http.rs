use std::path::Path;

use async_trait::async_trait;

use crate::domain::SolverError;

/// HTTP client port. All network traffic goes through this interface, which
/// keeps the pipeline testable without sockets.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a resource fully into memory.
    ///
    /// Non-2xx responses fail with [`SolverError::HttpStatus`] so callers can
    /// react to the status code.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, SolverError>;

    /// Download a resource to a file on disk, replacing any existing file.
    async fn download_file(&self, url: &str, path: &Path) -> Result<(), SolverError>;
}
