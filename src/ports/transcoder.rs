use async_trait::async_trait;

use crate::domain::{AudioClip, SolverError, Waveform};

/// Port for audio format conversion.
///
/// Implementations take an arbitrary input clip and produce a mono 16 kHz
/// integer-PCM WAV container. Conversion failure is fatal for the challenge
/// attempt; no retry or fallback codec is attempted.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Convert the clip. The clip is consumed; it is used exactly once.
    async fn transcode(&self, clip: AudioClip) -> Result<Waveform, SolverError>;
}
