//! The interceptor pipeline: request fold, exchange, response fold.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::{RequestError, Result};
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::request::OutboundRequest;
use crate::response::Response;
use crate::transport::Transport;

/// Per-dispatch snapshot of the transport and both interceptor chains.
///
/// Taking a snapshot keeps the registries read-only for the duration of a
/// call: interceptors attached mid-flight apply to the next call.
pub(crate) struct Pipeline {
    transport: Arc<dyn Transport>,
    request_chain: Vec<Arc<dyn RequestInterceptor>>,
    response_chain: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Pipeline {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        request_chain: Vec<Arc<dyn RequestInterceptor>>,
        response_chain: Vec<Arc<dyn ResponseInterceptor>>,
    ) -> Self {
        Self {
            transport,
            request_chain,
            response_chain,
        }
    }

    /// Run the full pipeline for one outbound request.
    ///
    /// Returns `Ok(None)` without touching the network when the request's
    /// cancellation signal is already set at entry; the caller that cancelled
    /// has already settled the call.
    ///
    /// Boxed so failure hooks can re-enter it recursively via
    /// [`ErrorContext::resend`]; recursion depth is bounded only by the
    /// interceptors that re-enter.
    pub(crate) fn dispatch(
        &self,
        request: OutboundRequest,
    ) -> BoxFuture<'_, Result<Option<Response>>> {
        Box::pin(async move {
            if request.cancel.is_cancelled() {
                debug!(url = %request.url, "dispatch skipped, cancellation already signalled");
                return Ok(None);
            }

            // Fast path: nothing attached, one raw exchange.
            if self.request_chain.is_empty() && self.response_chain.is_empty() {
                return self.exchange(&request).await.map(Some);
            }

            // Sequential fold: each interceptor's output feeds the next, and a
            // failure anywhere (including the exchange) enters the response
            // chain's failure hooks.
            let mut outcome = async {
                let mut current = request.clone();
                for interceptor in &self.request_chain {
                    current = interceptor.intercept(current).await?;
                }
                self.exchange(&current).await
            }
            .await;

            let context = ErrorContext {
                request: &request,
                pipeline: self,
            };
            for interceptor in &self.response_chain {
                outcome = match outcome {
                    Ok(response) => interceptor.on_response(response).await,
                    Err(error) => interceptor.on_error(error, &context).await,
                };
            }

            outcome.map(Some)
        })
    }

    /// One transport exchange plus outcome classification.
    ///
    /// A status in `[200, 300)` is success; any other status and any
    /// transport-level failure become a tagged error. This is the only place
    /// raw outcomes are classified.
    async fn exchange(&self, request: &OutboundRequest) -> Result<Response> {
        match self.transport.exchange(request).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(response.into_status_error()),
            Err(source) => Err(RequestError::Transport { source }),
        }
    }
}

/// What a failure hook gets to work with: the original outbound request and a
/// way to re-dispatch it.
pub struct ErrorContext<'a> {
    request: &'a OutboundRequest,
    pipeline: &'a Pipeline,
}

impl ErrorContext<'_> {
    /// The outbound request as originally dispatched, before any request
    /// interceptor rewrote it.
    pub fn request(&self) -> &OutboundRequest {
        self.request
    }

    /// Re-invoke the full pipeline with the original request.
    ///
    /// Request interceptors run again, the exchange is performed again, and
    /// this interceptor's own hooks run again for the new outcome — the
    /// pipeline imposes no re-entry bound, so a recovering interceptor must
    /// bound its own retries. A re-dispatch after the call's deadline has
    /// already fired skips the network and reports [`RequestError::Timeout`].
    pub async fn resend(&self) -> Result<Response> {
        match self.pipeline.dispatch(self.request.clone()).await? {
            Some(response) => Ok(response),
            None => Err(RequestError::Timeout),
        }
    }
}
