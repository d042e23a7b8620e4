use async_trait::async_trait;

use crate::domain::{SolverError, Waveform};

/// Port for speech-to-text over a prepared waveform.
///
/// An empty transcript is a valid outcome (silence, or speech the recognizer
/// could not resolve) and is still submitted verbatim.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Stream the waveform through the recognizer and return the final text.
    async fn transcribe(&self, waveform: &Waveform) -> Result<String, SolverError>;
}
