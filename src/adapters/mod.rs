pub mod cdp;
pub mod ffmpeg;
pub mod http_client;
pub mod provisioner;
pub mod webdriver;

#[cfg(feature = "vosk")]
pub mod vosk;

pub use cdp::CdpAutomation;
pub use ffmpeg::FfmpegTranscoder;
pub use http_client::HttpFetcher;
pub use provisioner::ModelProvisioner;
pub use webdriver::WebDriverAutomation;

#[cfg(feature = "vosk")]
pub use vosk::VoskTranscriber;

use std::sync::Arc;

use crate::ports::{Automation, SessionHandle};

/// Pick the automation backend that matches the session handle.
pub fn automation_for(session: &SessionHandle) -> Arc<dyn Automation> {
    match session {
        SessionHandle::Cdp(page) => Arc::new(CdpAutomation::new(page.clone())),
        SessionHandle::WebDriver(client) => Arc::new(WebDriverAutomation::new(client.clone())),
    }
}
