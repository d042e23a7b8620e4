pub mod audio;
pub mod config;
pub mod error;
pub mod model;

pub use audio::{AudioClip, AudioCodec, Waveform, TARGET_SAMPLE_RATE};
pub use config::SolverConfig;
pub use error::SolverError;
pub use model::{ModelDescriptor, ModelSource, DEFAULT_MODEL_URL, REQUIRED_MODEL_FILES};
