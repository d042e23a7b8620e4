use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::{Client, Locator};
use tracing::trace;

use crate::domain::SolverError;
use crate::ports::{Automation, ElementRef, FrameRef};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which browsing context a frame reference asks the session to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTarget {
    /// The top-level document.
    Top,
    /// Wherever the session currently is.
    Current,
}

/// Resolve a frame reference for this backend. `None` for handles minted by
/// another backend, which read as "not there" rather than an error.
fn session_target(frame: &FrameRef) -> Option<SessionTarget> {
    match frame {
        FrameRef::Root => Some(SessionTarget::Top),
        FrameRef::WebDriverCurrent => Some(SessionTarget::Current),
        _ => None,
    }
}

/// Extract this backend's element handle, `None` for foreign handles.
fn session_element(element: &ElementRef) -> Option<&fantoccini::elements::Element> {
    match element {
        ElementRef::WebDriver(el) => Some(el),
        _ => None,
    }
}

/// Levels the session has descended below the top document. WebDriver keeps
/// the browsing context on the session itself, so the adapter has to remember
/// the depth in order to climb back out when an operation targets the top.
#[derive(Default)]
struct FrameDepth(AtomicU32);

impl FrameDepth {
    fn descend(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Levels to climb to reach the top; resets the counter.
    fn take(&self) -> u32 {
        self.0.swap(0, Ordering::SeqCst)
    }
}

/// Automation over a WebDriver session.
///
/// WebDriver switches frames on the session rather than handing out frame
/// handles, so descent moves the whole session and the adapter tracks how
/// deep it is. Operations targeting [`FrameRef::Root`] first walk the session
/// back up to the top document; [`FrameRef::WebDriverCurrent`] operations run
/// wherever the session currently sits.
pub struct WebDriverAutomation {
    client: Client,
    depth: FrameDepth,
}

impl WebDriverAutomation {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            depth: FrameDepth::default(),
        }
    }

    /// Put the session into the context the frame reference names.
    async fn align_context(&self, target: SessionTarget) -> Result<(), SolverError> {
        if target == SessionTarget::Top {
            for _ in 0..self.depth.take() {
                self.client
                    .clone()
                    .enter_parent_frame()
                    .await
                    .map_err(|e| SolverError::Backend(e.to_string()))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Automation for WebDriverAutomation {
    async fn wait_for_element(
        &self,
        frame: &FrameRef,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementRef>, SolverError> {
        let target = match session_target(frame) {
            Some(target) => target,
            None => return Ok(None),
        };
        self.align_context(target).await?;
        let found = self
            .client
            .wait()
            .at_most(timeout)
            .every(POLL_INTERVAL)
            .for_element(Locator::Css(selector))
            .await;
        match found {
            Ok(element) => Ok(Some(ElementRef::WebDriver(element))),
            // Timeouts and stale-context races both read as "not there".
            Err(err) => {
                trace!(selector, %err, "element wait came up empty");
                Ok(None)
            }
        }
    }

    async fn descend_into_frame(
        &self,
        element: &ElementRef,
    ) -> Result<Option<FrameRef>, SolverError> {
        let element = match session_element(element) {
            Some(el) => el.clone(),
            None => return Ok(None),
        };
        element
            .enter_frame()
            .await
            .map_err(|e| SolverError::Backend(e.to_string()))?;
        self.depth.descend();
        Ok(Some(FrameRef::WebDriverCurrent))
    }

    async fn attribute(
        &self,
        frame: &FrameRef,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, SolverError> {
        let target = match session_target(frame) {
            Some(target) => target,
            None => return Ok(None),
        };
        self.align_context(target).await?;
        let element = match self.client.find(Locator::Css(selector)).await {
            Ok(element) => element,
            Err(err) => {
                trace!(selector, %err, "attribute target not found");
                return Ok(None);
            }
        };
        element
            .attr(name)
            .await
            .map_err(|e| SolverError::Backend(e.to_string()))
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), SolverError> {
        let element = match session_element(element) {
            Some(el) => el.clone(),
            None => return Ok(()),
        };
        element
            .clear()
            .await
            .map_err(|e| SolverError::Backend(e.to_string()))?;
        element
            .send_keys(text)
            .await
            .map_err(|e| SolverError::Backend(e.to_string()))
    }

    async fn click(&self, element: &ElementRef) -> Result<(), SolverError> {
        let element = match session_element(element) {
            Some(el) => el.clone(),
            None => return Ok(()),
        };
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| SolverError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_targets_top_and_current_stays_put() {
        assert_eq!(session_target(&FrameRef::Root), Some(SessionTarget::Top));
        assert_eq!(
            session_target(&FrameRef::WebDriverCurrent),
            Some(SessionTarget::Current)
        );
    }

    #[test]
    fn test_foreign_frame_handles_resolve_to_none() {
        assert_eq!(session_target(&FrameRef::Custom(7)), None);
    }

    #[test]
    fn test_foreign_element_handles_resolve_to_none() {
        assert!(session_element(&ElementRef::Custom(7)).is_none());
    }

    #[test]
    fn test_depth_counts_descents_and_resets_on_take() {
        let depth = FrameDepth::default();
        assert_eq!(depth.take(), 0);

        depth.descend();
        assert_eq!(depth.take(), 1);
        // Climbing out clears the count, a second climb is a no-op.
        assert_eq!(depth.take(), 0);

        depth.descend();
        depth.descend();
        assert_eq!(depth.take(), 2);
    }
}
