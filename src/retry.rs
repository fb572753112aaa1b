//! Sample retry interceptor.
//!
//! Demonstrates the failure-hook contract: recover from server errors by
//! re-entering the pipeline, bounded by a per-target attempt count. Retrying
//! is entirely an interceptor-level opt-in; nothing in the client retries on
//! its own.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{RequestError, Result};
use crate::interceptor::ResponseInterceptor;
use crate::pipeline::ErrorContext;
use crate::response::Response;

/// Retries server errors (status >= 500) up to `retry_times` per target URL.
///
/// Attempt counts are keyed by the outbound URL, so concurrent calls to the
/// same target share a budget. Once the budget is exhausted the count is
/// cleared and the error is re-rejected, which arms the next call to the same
/// target with a fresh budget.
pub struct RetryInterceptor {
    retry_times: u32,
    attempts: Mutex<HashMap<String, u32>>,
}

impl RetryInterceptor {
    /// Create a retry interceptor with a mandatory attempt bound.
    pub fn new(retry_times: u32) -> Self {
        Self {
            retry_times,
            attempts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ResponseInterceptor for RetryInterceptor {
    async fn on_error(&self, error: RequestError, context: &ErrorContext<'_>) -> Result<Response> {
        let target = context.request().url.to_string();
        let count = self.attempts.lock().get(&target).copied().unwrap_or(0);

        if count >= self.retry_times {
            self.attempts.lock().remove(&target);
            return Err(error);
        }

        if error.status_code().is_some_and(|status| status >= 500) {
            self.attempts.lock().insert(target.clone(), count + 1);
            debug!(
                url = %target,
                attempt = count + 1,
                "retrying request after server error"
            );
            return context.resend().await;
        }

        Err(error)
    }
}
