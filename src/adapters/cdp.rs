use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::DescribeNodeParams;
use chromiumoxide::cdp::browser_protocol::page::CreateIsolatedWorldParams;
use chromiumoxide::cdp::js_protocol::runtime::{
    CallFunctionOnParams, EvaluateParams, ExecutionContextId, RemoteObjectId,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use tracing::trace;

use crate::domain::SolverError;
use crate::ports::{Automation, ElementRef, FrameRef};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Execution context a frame reference maps to on this backend.
#[derive(Debug, Clone, PartialEq)]
enum EvalContext<'a> {
    /// The page's default context.
    Top,
    /// An isolated world minted for a nested frame.
    Isolated(&'a ExecutionContextId),
}

/// Resolve a frame reference for this backend. `None` for handles minted by
/// another backend, which read as "not there" rather than an error.
fn eval_context(frame: &FrameRef) -> Option<EvalContext<'_>> {
    match frame {
        FrameRef::Root => Some(EvalContext::Top),
        FrameRef::CdpContext(ctx) => Some(EvalContext::Isolated(ctx)),
        _ => None,
    }
}

/// Extract this backend's remote object handle, `None` for foreign handles.
fn remote_object(element: &ElementRef) -> Option<&RemoteObjectId> {
    match element {
        ElementRef::Cdp(id) => Some(id),
        _ => None,
    }
}

/// Automation over a Chrome DevTools Protocol page.
///
/// Frames are entered by resolving the iframe element's frame id and minting
/// an isolated world in it; subsequent selector queries evaluate inside that
/// execution context. Clicks and fills run as `Runtime.callFunctionOn`
/// against the element's remote object, so they work regardless of which
/// frame the element lives in.
pub struct CdpAutomation {
    page: Page,
}

impl CdpAutomation {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    fn js_string(text: &str) -> Result<String, SolverError> {
        serde_json::to_string(text).map_err(|e| SolverError::Backend(e.to_string()))
    }

    async fn evaluate_in(
        &self,
        context: &EvalContext<'_>,
        expression: String,
    ) -> Result<chromiumoxide::js::EvaluationResult, SolverError> {
        let builder = EvaluateParams::builder().expression(expression);
        let builder = match context {
            EvalContext::Isolated(ctx) => builder.context_id((*ctx).clone()),
            EvalContext::Top => builder,
        };
        let params = builder
            .build()
            .map_err(SolverError::Backend)?;
        self.page.evaluate(params).await.map_err(cdp_err)
    }

    async fn query_selector(
        &self,
        context: &EvalContext<'_>,
        selector: &str,
    ) -> Result<Option<RemoteObjectId>, SolverError> {
        let sel = Self::js_string(selector)?;
        let result = self
            .evaluate_in(context, format!("document.querySelector({sel})"))
            .await?;
        Ok(result.object().object_id.clone())
    }

    async fn call_on(
        &self,
        object_id: &RemoteObjectId,
        declaration: String,
    ) -> Result<chromiumoxide::js::EvaluationResult, SolverError> {
        let params = CallFunctionOnParams::builder()
            .object_id(object_id.clone())
            .function_declaration(declaration)
            .build()
            .map_err(SolverError::Backend)?;
        self.page.evaluate_function(params).await.map_err(cdp_err)
    }
}

fn cdp_err(err: CdpError) -> SolverError {
    SolverError::Backend(err.to_string())
}

#[async_trait]
impl Automation for CdpAutomation {
    async fn wait_for_element(
        &self,
        frame: &FrameRef,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementRef>, SolverError> {
        let context = match eval_context(frame) {
            Some(context) => context,
            None => return Ok(None),
        };
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(object_id) = self.query_selector(&context, selector).await? {
                trace!(selector, "element found");
                return Ok(Some(ElementRef::Cdp(object_id)));
            }
            if tokio::time::Instant::now() >= deadline {
                trace!(selector, "element wait timed out");
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn descend_into_frame(
        &self,
        element: &ElementRef,
    ) -> Result<Option<FrameRef>, SolverError> {
        let object_id = match remote_object(element) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };

        let describe = DescribeNodeParams {
            object_id: Some(object_id),
            ..Default::default()
        };
        let node = self
            .page
            .execute(describe)
            .await
            .map_err(cdp_err)?
            .result
            .node;
        let frame_id = match node.frame_id {
            Some(id) => id,
            // The element hosts no document (or it has not attached yet).
            None => return Ok(None),
        };

        let world = CreateIsolatedWorldParams::builder()
            .frame_id(frame_id)
            .world_name("hearsay")
            .grant_univeral_access(true)
            .build()
            .map_err(SolverError::Backend)?;
        let response = self.page.execute(world).await.map_err(cdp_err)?;
        Ok(Some(FrameRef::CdpContext(
            response.result.execution_context_id,
        )))
    }

    async fn attribute(
        &self,
        frame: &FrameRef,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, SolverError> {
        let context = match eval_context(frame) {
            Some(context) => context,
            None => return Ok(None),
        };
        let sel = Self::js_string(selector)?;
        let attr = Self::js_string(name)?;
        let result = self
            .evaluate_in(
                &context,
                format!(
                    "(() => {{ const el = document.querySelector({sel}); \
                     return el ? el.getAttribute({attr}) : null; }})()"
                ),
            )
            .await?;
        Ok(result
            .value()
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), SolverError> {
        let object_id = match remote_object(element) {
            Some(id) => id,
            None => return Ok(()),
        };
        let value = Self::js_string(text)?;
        // Assign the value, then raise the events frameworks listen for.
        self.call_on(
            object_id,
            format!(
                "(function() {{ this.value = {value}; \
                 this.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 this.dispatchEvent(new Event('change', {{ bubbles: true }})); }})"
            ),
        )
        .await?;
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), SolverError> {
        let object_id = match remote_object(element) {
            Some(id) => id,
            None => return Ok(()),
        };
        self.call_on(object_id, "(function() { this.click(); })".to_string())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_frame_maps_to_top_context() {
        assert_eq!(eval_context(&FrameRef::Root), Some(EvalContext::Top));
    }

    #[test]
    fn test_foreign_frame_handles_resolve_to_none() {
        assert_eq!(eval_context(&FrameRef::WebDriverCurrent), None);
        assert_eq!(eval_context(&FrameRef::Custom(7)), None);
    }

    #[test]
    fn test_foreign_element_handles_resolve_to_none() {
        assert!(remote_object(&ElementRef::Custom(7)).is_none());
    }
}
