use std::io::Cursor;

use hound::{SampleFormat, WavSpec};
use serde::{Deserialize, Serialize};

use crate::domain::error::SolverError;

/// Sample rate the recognizer expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Input codec of a downloaded challenge clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    Ogg,
    Wav,
}

impl AudioCodec {
    /// File extension used when spooling the clip to disk for conversion.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Ogg => "ogg",
            AudioCodec::Wav => "wav",
        }
    }

    /// Guess the codec from a URL or file path, looking at the extension of
    /// the final path segment. Query strings are ignored.
    pub fn from_path_hint(hint: &str) -> Option<Self> {
        let path = url::Url::parse(hint)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| hint.to_string());
        match path.rsplit('.').next()?.to_ascii_lowercase().as_str() {
            "mp3" => Some(AudioCodec::Mp3),
            "ogg" | "oga" => Some(AudioCodec::Ogg),
            "wav" => Some(AudioCodec::Wav),
            _ => None,
        }
    }
}

/// A downloaded challenge clip: raw bytes tagged with their codec.
/// Produced by the network fetch and consumed exactly once by the transcoder.
#[derive(Debug, Clone)]
pub struct AudioClip {
    bytes: Vec<u8>,
    codec: AudioCodec,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, codec: AudioCodec) -> Self {
        Self { bytes, codec }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn codec(&self) -> AudioCodec {
        self.codec
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A WAV container holding the transcoded challenge audio.
///
/// The recognizer contract requires exactly one channel and 16-bit integer
/// PCM; [`Waveform::validate_mono_pcm`] enforces that invariant. Violations
/// are hard errors, never silently resampled.
#[derive(Debug, Clone)]
pub struct Waveform {
    bytes: Vec<u8>,
}

impl Waveform {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parse the container header.
    pub fn spec(&self) -> Result<WavSpec, SolverError> {
        let reader = hound::WavReader::new(Cursor::new(&self.bytes))
            .map_err(|e| SolverError::UnsupportedAudioFormat(e.to_string()))?;
        Ok(reader.spec())
    }

    /// Assert the mono 16-bit integer PCM invariant, returning the parsed
    /// header on success.
    pub fn validate_mono_pcm(&self) -> Result<WavSpec, SolverError> {
        let spec = self.spec()?;
        if spec.channels != 1 {
            return Err(SolverError::UnsupportedAudioFormat(format!(
                "expected 1 channel, got {}",
                spec.channels
            )));
        }
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(SolverError::UnsupportedAudioFormat(format!(
                "expected 16-bit integer PCM, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            )));
        }
        Ok(spec)
    }
}

/// Build an in-memory WAV for tests across the crate.
#[cfg(test)]
pub(crate) fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}
