use async_trait::async_trait;

use crate::domain::{ModelDescriptor, SolverError};

/// Port for recognizer-model provisioning.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Make sure the model directory is ready, fetching and unpacking the
    /// archive when it is not. Idempotent: a ready directory performs no I/O.
    async fn ensure_model(&self, descriptor: &ModelDescriptor) -> Result<(), SolverError>;
}
