//! Request and response interceptors.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{RequestError, Result};
use crate::pipeline::ErrorContext;
use crate::request::OutboundRequest;
use crate::response::Response;

/// Transforms the outbound request before the exchange.
///
/// Interceptors run in a strict sequence, most recently attached first; each
/// one receives the previous stage's output and may suspend (for example to
/// refresh a credential) before producing its replacement.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Intercept and optionally replace the outbound request.
    async fn intercept(&self, request: OutboundRequest) -> Result<OutboundRequest>;
}

/// Transforms the classified outcome after the exchange.
///
/// Both hooks are optional: an interceptor that defines neither passes
/// success and failure through unchanged.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Intercept a successful response; default is pass-through.
    async fn on_response(&self, response: Response) -> Result<Response> {
        Ok(response)
    }

    /// Intercept a failure; default re-rejects with the same error.
    ///
    /// The context carries the original outbound request and
    /// [`resend`](ErrorContext::resend) for recovery by re-dispatch.
    async fn on_error(&self, error: RequestError, _context: &ErrorContext<'_>) -> Result<Response> {
        Err(error)
    }
}

/// Ordered interceptor collections with prepend-only attachment, so the
/// most-recent-first dispatch order is the structure's contract rather than a
/// call-site convention.
#[derive(Default)]
pub(crate) struct InterceptorRegistry {
    request: VecDeque<Arc<dyn RequestInterceptor>>,
    response: VecDeque<Arc<dyn ResponseInterceptor>>,
}

impl InterceptorRegistry {
    pub(crate) fn attach_request(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request.push_front(interceptor);
    }

    pub(crate) fn attach_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response.push_front(interceptor);
    }

    /// Dispatch-order snapshot of the request chain.
    pub(crate) fn request_chain(&self) -> Vec<Arc<dyn RequestInterceptor>> {
        self.request.iter().cloned().collect()
    }

    /// Dispatch-order snapshot of the response chain.
    pub(crate) fn response_chain(&self) -> Vec<Arc<dyn ResponseInterceptor>> {
        self.response.iter().cloned().collect()
    }
}

/// Logs requests and responses.
pub struct LoggingInterceptor {
    log_headers: bool,
}

impl LoggingInterceptor {
    /// Create a new logging interceptor.
    pub fn new() -> Self {
        Self { log_headers: false }
    }

    /// Enable logging of headers.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestInterceptor for LoggingInterceptor {
    async fn intercept(&self, request: OutboundRequest) -> Result<OutboundRequest> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "Sending HTTP request"
        );

        if self.log_headers {
            for (name, value) in request.headers.iter() {
                tracing::trace!(
                    header = %name,
                    value = ?value,
                    "Request header"
                );
            }
        }

        Ok(request)
    }
}

#[async_trait]
impl ResponseInterceptor for LoggingInterceptor {
    async fn on_response(&self, response: Response) -> Result<Response> {
        tracing::debug!(
            status = %response.status(),
            "Received HTTP response"
        );

        if self.log_headers {
            for (name, value) in response.headers().iter() {
                tracing::trace!(
                    header = %name,
                    value = ?value,
                    "Response header"
                );
            }
        }

        Ok(response)
    }
}

/// Adds auth headers to every request.
pub struct AuthInterceptor {
    auth_type: AuthType,
}

enum AuthType {
    Bearer(String),
    Basic { username: String, password: String },
    ApiKey { header: String, key: String },
}

impl AuthInterceptor {
    /// Create a bearer token interceptor.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Bearer(token.into()),
        }
    }

    /// Create a basic auth interceptor.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::Basic {
                username: username.into(),
                password: password.into(),
            },
        }
    }

    /// Create an API key interceptor.
    pub fn api_key(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            auth_type: AuthType::ApiKey {
                header: header.into(),
                key: key.into(),
            },
        }
    }
}

#[async_trait]
impl RequestInterceptor for AuthInterceptor {
    async fn intercept(&self, mut request: OutboundRequest) -> Result<OutboundRequest> {
        match &self.auth_type {
            AuthType::Bearer(token) => {
                let value = format!("Bearer {token}")
                    .parse()
                    .map_err(|_| RequestError::Interceptor("invalid bearer token".to_owned()))?;
                request.headers.insert(http::header::AUTHORIZATION, value);
            }
            AuthType::Basic { username, password } => {
                use base64::Engine;
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                let value = format!("Basic {credentials}")
                    .parse()
                    .map_err(|_| RequestError::Interceptor("invalid credentials".to_owned()))?;
                request.headers.insert(http::header::AUTHORIZATION, value);
            }
            AuthType::ApiKey { header, key } => {
                let name = http::HeaderName::from_bytes(header.as_bytes())
                    .map_err(|_| RequestError::Interceptor(format!("invalid header: {header}")))?;
                let value = key
                    .parse()
                    .map_err(|_| RequestError::Interceptor("invalid API key".to_owned()))?;
                request.headers.insert(name, value);
            }
        }

        Ok(request)
    }
}
