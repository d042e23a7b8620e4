use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};
#[cfg(feature = "vosk")]
use tracing::warn;

#[cfg(feature = "vosk")]
use crate::adapters;
#[cfg(feature = "vosk")]
use crate::domain::ModelDescriptor;
use crate::domain::{AudioClip, AudioCodec, SolverConfig, SolverError};
#[cfg(feature = "vosk")]
use crate::ports::SessionHandle;
use crate::ports::{Automation, FrameRef, HttpClient, Provisioner, Transcoder, Transcriber};

/// Outer widget iframe, matched by its source URL.
const WIDGET_FRAME_SELECTOR: &str = "iframe[src*=\"api2/anchor\"]";
/// Consent checkbox inside the widget frame.
const CONSENT_SELECTOR: &str = "#recaptcha-anchor";
/// Inner challenge iframe, matched by its source URL.
const CHALLENGE_FRAME_SELECTOR: &str = "iframe[src*=\"api2/bframe\"]";
/// Audio-mode toggle inside the challenge frame.
const AUDIO_TOGGLE_SELECTOR: &str = "#recaptcha-audio-button";
/// Audio element carrying the challenge clip URL.
const AUDIO_SOURCE_SELECTOR: &str = "#audio-source";
/// Text field the transcript goes into.
const RESPONSE_FIELD_SELECTOR: &str = "#audio-response";
/// Submit control.
const VERIFY_SELECTOR: &str = "#recaptcha-verify-button";

/// Cap for the waits around best-effort controls. Their absence is tolerated,
/// so there is no point burning the full DOM timeout on them.
const BEST_EFFORT_WAIT_MS: u64 = 3_000;
/// Interval between reads of the audio element's source attribute.
const SOURCE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Solves one audio challenge on a caller-supplied browser session.
///
/// A solver instance runs a single sequential pass per [`solve`] call: locate
/// and enter the widget frame, accept consent, enter the challenge frame,
/// switch to audio mode, pull the clip, transcode and transcribe it, and
/// submit the transcript. There are no retries and no backward transitions;
/// the first fatal error unwinds the pass. Retry policy belongs to the
/// caller.
///
/// [`solve`]: ChallengeSolver::solve
pub struct ChallengeSolver {
    automation: Arc<dyn Automation>,
    http: Arc<dyn HttpClient>,
    transcoder: Arc<dyn Transcoder>,
    transcriber: Arc<dyn Transcriber>,
    provisioner: Arc<dyn Provisioner>,
    config: SolverConfig,
}

impl ChallengeSolver {
    /// Build a solver with the stock pipeline: ffmpeg transcoding, Vosk
    /// recognition and the shared HTTP client. Kicks off a best-effort model
    /// warm-up in the background; its failure is logged and dropped, and the
    /// blocking provisioning pass before transcription remains authoritative.
    #[cfg(feature = "vosk")]
    pub fn new(session: SessionHandle, config: SolverConfig) -> Self {
        let http: Arc<dyn HttpClient> = adapters::HttpFetcher::shared();
        let descriptor = config.model_descriptor();
        let provisioner: Arc<dyn Provisioner> =
            Arc::new(adapters::ModelProvisioner::new(Arc::clone(&http)));
        spawn_warmup(Arc::clone(&provisioner), descriptor.clone());

        Self {
            automation: adapters::automation_for(&session),
            http,
            transcoder: Arc::new(adapters::FfmpegTranscoder::new()),
            transcriber: Arc::new(adapters::VoskTranscriber::new(descriptor.target_dir)),
            provisioner,
            config,
        }
    }

    /// Build a solver from explicit components. No background warm-up is
    /// spawned; the caller controls provisioning entirely.
    pub fn with_components(
        automation: Arc<dyn Automation>,
        http: Arc<dyn HttpClient>,
        transcoder: Arc<dyn Transcoder>,
        transcriber: Arc<dyn Transcriber>,
        provisioner: Arc<dyn Provisioner>,
        config: SolverConfig,
    ) -> Self {
        Self {
            automation,
            http,
            transcoder,
            transcriber,
            provisioner,
            config,
        }
    }

    fn dom_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    fn best_effort_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms.min(BEST_EFFORT_WAIT_MS))
    }

    /// Run one solve pass.
    ///
    /// Returns `Ok(())` both when a transcript was submitted and when no
    /// audio challenge turned out to be present; fatal failures surface as
    /// the corresponding [`SolverError`].
    #[instrument(skip(self))]
    pub async fn solve(&self) -> Result<(), SolverError> {
        let widget_frame = self.enter_widget().await?;
        self.accept_consent(&widget_frame).await?;
        let challenge_frame = self.enter_challenge().await?;
        self.switch_to_audio(&challenge_frame).await?;

        let source = match self.poll_audio_source(&challenge_frame).await? {
            Some(source) => source,
            None => {
                info!("no audio challenge present, nothing to submit");
                return Ok(());
            }
        };

        let transcript = self.resolve_audio(&source).await?;
        self.submit(&challenge_frame, &transcript).await?;
        info!("challenge pass complete");
        Ok(())
    }

    async fn enter_widget(&self) -> Result<FrameRef, SolverError> {
        let element = self
            .automation
            .wait_for_element(&FrameRef::Root, WIDGET_FRAME_SELECTOR, self.dom_timeout())
            .await?
            .ok_or(SolverError::ElementNotFound)?;
        debug!("widget iframe located");
        self.automation
            .descend_into_frame(&element)
            .await?
            .ok_or(SolverError::FrameNotFound)
    }

    async fn accept_consent(&self, widget_frame: &FrameRef) -> Result<(), SolverError> {
        match self
            .automation
            .wait_for_element(widget_frame, CONSENT_SELECTOR, self.best_effort_timeout())
            .await?
        {
            Some(consent) => {
                debug!("clicking consent control");
                self.automation.click(&consent).await
            }
            None => {
                debug!("consent control absent, continuing");
                Ok(())
            }
        }
    }

    async fn enter_challenge(&self) -> Result<FrameRef, SolverError> {
        let element = self
            .automation
            .wait_for_element(&FrameRef::Root, CHALLENGE_FRAME_SELECTOR, self.dom_timeout())
            .await?
            .ok_or(SolverError::ChallengeNotFound)?;
        debug!("challenge iframe located");
        self.automation
            .descend_into_frame(&element)
            .await?
            .ok_or(SolverError::ChallengeFrameNotFound)
    }

    async fn switch_to_audio(&self, challenge_frame: &FrameRef) -> Result<(), SolverError> {
        match self
            .automation
            .wait_for_element(
                challenge_frame,
                AUDIO_TOGGLE_SELECTOR,
                self.best_effort_timeout(),
            )
            .await?
        {
            Some(toggle) => {
                debug!("switching to audio mode");
                self.automation.click(&toggle).await
            }
            None => {
                debug!("audio toggle absent, continuing");
                Ok(())
            }
        }
    }

    /// Let the audio element attach after the mode switch, then poll its
    /// `src` attribute until it resolves or the DOM timeout passes. An empty
    /// result means no audio challenge is being presented.
    async fn poll_audio_source(
        &self,
        challenge_frame: &FrameRef,
    ) -> Result<Option<String>, SolverError> {
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let deadline = tokio::time::Instant::now() + self.dom_timeout();
        loop {
            let source = self
                .automation
                .attribute(challenge_frame, AUDIO_SOURCE_SELECTOR, "src")
                .await?
                .filter(|s| !s.is_empty());
            if source.is_some() {
                return Ok(source);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(SOURCE_POLL_INTERVAL).await;
        }
    }

    async fn resolve_audio(&self, source: &str) -> Result<String, SolverError> {
        info!(source, "downloading challenge clip");
        let bytes = self.http.get_bytes(source).await.map_err(|err| match err {
            SolverError::HttpStatus { status, .. } => SolverError::AudioDownloadFailed { status },
            other => other,
        })?;

        let codec = AudioCodec::from_path_hint(source).unwrap_or(AudioCodec::Mp3);
        let clip = AudioClip::new(bytes, codec);
        let waveform = self.transcoder.transcode(clip).await?;

        self.provisioner
            .ensure_model(&self.config.model_descriptor())
            .await?;
        let transcript = self.transcriber.transcribe(&waveform).await?;
        info!(len = transcript.len(), "transcription obtained");
        Ok(transcript)
    }

    async fn submit(
        &self,
        challenge_frame: &FrameRef,
        transcript: &str,
    ) -> Result<(), SolverError> {
        match self
            .automation
            .wait_for_element(
                challenge_frame,
                RESPONSE_FIELD_SELECTOR,
                self.best_effort_timeout(),
            )
            .await?
        {
            Some(field) => self.automation.fill(&field, transcript).await?,
            None => debug!("response field absent, skipping fill"),
        }

        match self
            .automation
            .wait_for_element(challenge_frame, VERIFY_SELECTOR, self.best_effort_timeout())
            .await?
        {
            Some(verify) => self.automation.click(&verify).await?,
            None => debug!("verify control absent, skipping click"),
        }
        Ok(())
    }
}

/// Background model warm-up at construction. A missing runtime (solver built
/// outside tokio) just skips the warm-up; the pre-transcription provisioning
/// call still covers correctness.
#[cfg(feature = "vosk")]
fn spawn_warmup(provisioner: Arc<dyn Provisioner>, descriptor: ModelDescriptor) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(err) = provisioner.ensure_model(&descriptor).await {
                    warn!(%err, "model warm-up failed");
                }
            });
        }
        Err(_) => debug!("no async runtime at construction, skipping model warm-up"),
    }
}
