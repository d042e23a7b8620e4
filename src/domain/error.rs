use thiserror::Error;

/// Domain-level errors for Hearsay.
///
/// The first group mirrors the fatal outcomes of the solve pipeline; the
/// rest are carriers for I/O, HTTP and configuration failures.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Challenge widget frame not found on the page")]
    ElementNotFound,

    #[error("Could not enter the challenge widget frame")]
    FrameNotFound,

    #[error("Audio challenge frame not found")]
    ChallengeNotFound,

    #[error("Could not enter the audio challenge frame")]
    ChallengeFrameNotFound,

    #[error("Audio clip download failed with HTTP status {status}")]
    AudioDownloadFailed { status: u16 },

    #[error("Unsupported audio format: {0}")]
    UnsupportedAudioFormat(String),

    #[error("Model provisioning failed: {0}")]
    Provisioning(String),

    #[error("Audio transcoding failed: {0}")]
    Transcode(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Automation backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SolverError {
    fn from(err: std::io::Error) -> Self {
        SolverError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SolverError {
    fn from(err: toml::de::Error) -> Self {
        SolverError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SolverError {
    fn from(err: toml::ser::Error) -> Self {
        SolverError::Config(err.to_string())
    }
}
