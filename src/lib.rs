//! Hearsay solves audio challenge-response puzzles on pages you control.
//!
//! Hand it a live browser session (a `chromiumoxide` page or a `fantoccini`
//! client), and one [`ChallengeSolver::solve`] call walks the nested
//! challenge frames, downloads the audio clip, converts it to mono 16 kHz
//! PCM with ffmpeg, transcribes it offline with Vosk, and types the
//! transcript back into the page.
//!
//! The recognizer lives behind the `vosk` cargo feature because libvosk is a
//! system library. Without it, build a solver through
//! [`ChallengeSolver::with_components`] with your own
//! [`Transcriber`](ports::Transcriber) implementation.
//!
//! ```no_run
//! # #[cfg(feature = "vosk")]
//! # async fn demo(page: chromiumoxide::Page) -> Result<(), hearsay::SolverError> {
//! use hearsay::{ChallengeSolver, SessionHandle, SolverConfig};
//!
//! let solver = ChallengeSolver::new(SessionHandle::Cdp(page), SolverConfig::default());
//! solver.solve().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::ChallengeSolver;
pub use domain::{
    AudioClip, AudioCodec, ModelDescriptor, ModelSource, SolverConfig, SolverError, Waveform,
    DEFAULT_MODEL_URL,
};
pub use infrastructure::init_logging;
pub use ports::{Automation, ElementRef, FrameRef, SessionHandle};
