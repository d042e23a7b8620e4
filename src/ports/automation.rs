use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::js_protocol::runtime::{ExecutionContextId, RemoteObjectId};

use crate::domain::SolverError;

/// A live browser page supplied by the caller.
///
/// The caller owns the underlying session: the crate never navigates away
/// from it and never closes it. One handle serves one solver instance.
#[derive(Debug, Clone)]
pub enum SessionHandle {
    /// Chrome DevTools Protocol page (chromiumoxide).
    Cdp(chromiumoxide::Page),
    /// WebDriver session (fantoccini).
    WebDriver(fantoccini::Client),
}

/// A document context: the top page or a nested iframe document.
///
/// Frame references are transient. They are re-acquired on every solve pass
/// because the challenge DOM can be replaced between checks.
#[derive(Debug, Clone)]
pub enum FrameRef {
    /// The top-level document.
    Root,
    /// An isolated-world execution context inside a CDP frame.
    CdpContext(ExecutionContextId),
    /// The WebDriver session's current browsing context. WebDriver switches
    /// frame state on the session itself, so descent mutates the session and
    /// this variant simply tags "wherever the session currently is".
    WebDriverCurrent,
    /// Opaque token for out-of-tree [`Automation`] implementations.
    Custom(u64),
}

/// A single DOM node located by a selector within a frame. Used immediately
/// after acquisition and discarded; never persisted across operations.
#[derive(Debug, Clone)]
pub enum ElementRef {
    /// Remote object handle inside a CDP execution context.
    Cdp(RemoteObjectId),
    /// WebDriver element handle.
    WebDriver(fantoccini::elements::Element),
    /// Opaque token for out-of-tree [`Automation`] implementations.
    Custom(u64),
}

/// Uniform DOM operations over structurally different automation backends.
///
/// Absence is not an error at this layer: a missing element or detached frame
/// comes back as `Ok(None)`, and handles minted by a different backend yield
/// `None`/no-op instead of panicking. The orchestrator decides where absence
/// is fatal.
#[async_trait]
pub trait Automation: Send + Sync {
    /// Poll for a node matching `selector` inside `frame` until `timeout`
    /// elapses. `None` means the deadline passed without a match.
    async fn wait_for_element(
        &self,
        frame: &FrameRef,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementRef>, SolverError>;

    /// Resolve the nested document hosted by a frame-owning element.
    /// `None` when the element hosts no frame or the frame has not attached.
    async fn descend_into_frame(
        &self,
        element: &ElementRef,
    ) -> Result<Option<FrameRef>, SolverError>;

    /// Read an attribute of the first node matching `selector`, if any.
    async fn attribute(
        &self,
        frame: &FrameRef,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, SolverError>;

    /// Set the element's text using whichever primitive the backend exposes
    /// for form input (value assignment vs. simulated keystrokes).
    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), SolverError>;

    /// Click the element.
    async fn click(&self, element: &ElementRef) -> Result<(), SolverError>;
}
