use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};
use vosk::{DecodingState, Model, Recognizer};

use crate::domain::{SolverError, Waveform, TARGET_SAMPLE_RATE};
use crate::ports::Transcriber;

/// Samples fed to the recognizer per call, a quarter second at 16 kHz.
const CHUNK_SAMPLES: usize = 4_000;

/// Vosk-backed [`Transcriber`].
///
/// The model is loaded from the provisioned directory for each transcription
/// and the whole recognition runs on the blocking pool; libvosk is
/// synchronous and a challenge clip is only a few seconds of audio.
pub struct VoskTranscriber {
    model_dir: PathBuf,
}

impl VoskTranscriber {
    pub fn new(model_dir: PathBuf) -> Self {
        Self { model_dir }
    }
}

#[async_trait]
impl Transcriber for VoskTranscriber {
    #[instrument(skip(self, waveform), fields(model = %self.model_dir.display()))]
    async fn transcribe(&self, waveform: &Waveform) -> Result<String, SolverError> {
        waveform.validate_mono_pcm()?;
        let samples = decode_samples(waveform)?;
        let model_dir = self.model_dir.clone();

        let text = tokio::task::spawn_blocking(move || recognize(&model_dir, &samples))
            .await
            .map_err(|e| SolverError::Transcription(format!("recognition task failed: {e}")))??;

        debug!(len = text.len(), "transcription finished");
        Ok(text)
    }
}

fn decode_samples(waveform: &Waveform) -> Result<Vec<i16>, SolverError> {
    let mut reader = hound::WavReader::new(Cursor::new(waveform.bytes()))
        .map_err(|e| SolverError::UnsupportedAudioFormat(e.to_string()))?;
    reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SolverError::UnsupportedAudioFormat(e.to_string()))
}

fn recognize(model_dir: &std::path::Path, samples: &[i16]) -> Result<String, SolverError> {
    let model_path = model_dir.to_string_lossy().into_owned();
    let model = Model::new(&model_path).ok_or_else(|| {
        SolverError::Transcription(format!("failed to load model from {model_path}"))
    })?;
    let mut recognizer = Recognizer::new(&model, TARGET_SAMPLE_RATE as f32)
        .ok_or_else(|| SolverError::Transcription("failed to create recognizer".to_string()))?;

    for chunk in samples.chunks(CHUNK_SAMPLES) {
        match recognizer.accept_waveform(chunk) {
            Ok(DecodingState::Finalized) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(SolverError::Transcription(format!(
                    "recognizer rejected audio: {e}"
                )))
            }
        }
    }

    let text = recognizer
        .final_result()
        .single()
        .map(|r| r.text.to_string())
        .unwrap_or_default();
    Ok(text)
}
