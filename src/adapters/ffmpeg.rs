use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::{AudioClip, SolverError, Waveform, TARGET_SAMPLE_RATE};
use crate::ports::Transcoder;

/// Transcoder that shells out to the system `ffmpeg` binary.
///
/// The clip is written to a scratch directory, converted to mono 16 kHz
/// signed 16-bit PCM WAV, and read back. The scratch directory is removed
/// when the conversion finishes, success or not.
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    /// Use a specific ffmpeg executable instead of whatever `PATH` resolves.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[instrument(skip(self, clip), fields(codec = ?clip.codec(), len = clip.len()))]
    async fn transcode(&self, clip: AudioClip) -> Result<Waveform, SolverError> {
        let scratch = tempfile::tempdir()?;
        let input = scratch
            .path()
            .join(format!("clip.{}", clip.codec().extension()));
        let output = scratch.path().join("clip.wav");

        tokio::fs::write(&input, clip.bytes()).await?;

        let status = Command::new(&self.binary)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(&input)
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg(TARGET_SAMPLE_RATE.to_string())
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg(&output)
            .output()
            .await
            .map_err(|e| SolverError::Transcode(format!("failed to launch ffmpeg: {e}")))?;

        if !status.status.success() {
            let stderr = String::from_utf8_lossy(&status.stderr);
            return Err(SolverError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                status.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&output).await?;
        debug!(len = bytes.len(), "transcode finished");

        let waveform = Waveform::new(bytes);
        waveform.validate_mono_pcm()?;
        Ok(waveform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AudioCodec;

    // Requires a system ffmpeg; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn converts_wav_input_to_mono_16k() {
        let stereo = crate::domain::audio::wav_bytes(2, 44_100, &[0, 1, 2, 3]);
        let clip = AudioClip::new(stereo, AudioCodec::Wav);
        let waveform = FfmpegTranscoder::new().transcode(clip).await.unwrap();
        let spec = waveform.spec().unwrap();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, TARGET_SAMPLE_RATE);
    }

    #[tokio::test]
    async fn missing_binary_is_a_transcode_error() {
        let clip = AudioClip::new(vec![0u8; 16], AudioCodec::Mp3);
        let err = FfmpegTranscoder::with_binary("hearsay-no-such-ffmpeg")
            .transcode(clip)
            .await
            .unwrap_err();
        assert!(matches!(err, SolverError::Transcode(_)));
    }
}
