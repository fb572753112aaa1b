//! Transport boundary: the one raw network exchange.

use async_trait::async_trait;
use thiserror::Error;

use crate::request::OutboundRequest;
use crate::response::Response;

/// Failures below the HTTP layer: no response object was obtainable at all.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request's cancellation signal was set while the exchange was in
    /// flight.
    #[error("request aborted by cancellation")]
    Aborted,

    /// The exchange failed before a response arrived.
    #[error("connection error: {0}")]
    Connection(String),

    /// Underlying HTTP client error.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A fetch-style exchange primitive.
///
/// Implementations perform exactly one raw exchange for the given request and
/// must observe `request.cancel` while in flight. Everything above this seam
/// (status classification, interceptors, timeouts) belongs to the client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange.
    async fn exchange(
        &self,
        request: &OutboundRequest,
    ) -> std::result::Result<Response, TransportError>;
}

/// Default transport backed by a pooled [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the transport with the given user agent.
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn exchange(
        &self,
        request: &OutboundRequest,
    ) -> std::result::Result<Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let attempt = async move {
            let response = builder.send().await.map_err(TransportError::from)?;
            Ok::<_, TransportError>(Response::from_reqwest(response).await)
        };

        tokio::select! {
            _ = request.cancel.cancelled() => Err(TransportError::Aborted),
            outcome = attempt => outcome,
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport used across the unit tests.

    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use http::{HeaderMap, StatusCode};
    use parking_lot::Mutex;

    use super::{Transport, TransportError};
    use crate::request::OutboundRequest;
    use crate::response::Response;

    /// One scripted exchange outcome, consumed in order.
    pub(crate) enum Script {
        Respond { status: u16, body: &'static str },
        Fail(&'static str),
        Hang,
    }

    pub(crate) struct MockTransport {
        script: Mutex<VecDeque<Script>>,
        /// Every request the transport was asked to perform, in order.
        pub(crate) seen: Mutex<Vec<OutboundRequest>>,
    }

    impl MockTransport {
        pub(crate) fn new(script: impl IntoIterator<Item = Script>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn respond_with(status: u16, body: &'static str) -> Arc<Self> {
            Self::new([Script::Respond { status, body }])
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn exchange(
            &self,
            request: &OutboundRequest,
        ) -> std::result::Result<Response, TransportError> {
            self.seen.lock().push(request.clone());
            let step = self.script.lock().pop_front();
            match step {
                Some(Script::Respond { status, body }) => Ok(Response::new(
                    StatusCode::from_u16(status).unwrap(),
                    HeaderMap::new(),
                    body,
                    request.url.clone(),
                )),
                Some(Script::Fail(message)) => Err(TransportError::Connection(message.to_owned())),
                Some(Script::Hang) => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                None => Err(TransportError::Connection("mock script exhausted".to_owned())),
            }
        }
    }
}
