//! HTTP client implementation.

use std::sync::Arc;
use std::time::Duration;

use http::Method;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{RequestError, Result};
use crate::interceptor::{InterceptorRegistry, RequestInterceptor, ResponseInterceptor};
use crate::pipeline::Pipeline;
use crate::request::{OutboundRequest, RequestBuilder};
use crate::response::ResponsePayload;
use crate::transport::{ReqwestTransport, Transport};

/// HTTP client with a base URL, default headers, an interceptor pipeline, and
/// abort-on-timeout.
///
/// Cloning is cheap; clones share the configuration and the interceptor
/// registries.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    interceptors: Arc<RwLock<InterceptorRegistry>>,
}

impl HttpClient {
    /// Create a client over the default reqwest-backed transport.
    pub fn new(config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(&config.user_agent));
        Self::with_transport(config, transport)
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            interceptors: Arc::new(RwLock::new(InterceptorRegistry::default())),
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, url.into())
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, url.into())
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PUT, url.into())
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::PATCH, url.into())
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, url.into())
    }

    /// Attach a request interceptor.
    ///
    /// The most recently attached interceptor runs first.
    pub fn attach_request_interceptor(&self, interceptor: impl RequestInterceptor + 'static) {
        self.interceptors.write().attach_request(Arc::new(interceptor));
    }

    /// Attach a response interceptor.
    ///
    /// The most recently attached interceptor runs first.
    pub fn attach_response_interceptor(&self, interceptor: impl ResponseInterceptor + 'static) {
        self.interceptors.write().attach_response(Arc::new(interceptor));
    }

    /// Snapshot the registries for one dispatch.
    fn pipeline(&self) -> Pipeline {
        let registry = self.interceptors.read();
        Pipeline::new(
            self.transport.clone(),
            registry.request_chain(),
            registry.response_chain(),
        )
    }

    /// Race the pipeline against the call's timeout and shape the outcome.
    pub(crate) async fn perform(
        &self,
        request: OutboundRequest,
        timeout: Duration,
    ) -> Result<ResponsePayload> {
        let pipeline = self.pipeline();

        debug!(method = %request.method, url = %request.url, "dispatching request");

        match tokio::time::timeout(timeout, pipeline.dispatch(request.clone())).await {
            Err(_elapsed) => {
                request.cancel.cancel();
                warn!(url = %request.url, ?timeout, "request timed out");
                Err(RequestError::Timeout)
            }
            Ok(outcome) => match outcome? {
                // A recovered response still gets its status classified; only
                // errors produced by interceptors pass through unclassified.
                Some(response) if response.is_success() => {
                    Ok(ResponsePayload::new(response, request))
                }
                Some(response) => Err(response.into_status_error()),
                // Pre-cancelled dispatch: the deadline owns settlement.
                None => Err(RequestError::Timeout),
            },
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ErrorContext;
    use crate::response::Response;
    use crate::transport::mock::{MockTransport, Script};
    use async_trait::async_trait;
    use http::{HeaderMap, StatusCode};
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    fn client(transport: Arc<MockTransport>) -> HttpClient {
        let config = ClientConfig::builder().base_url("https://api.test").build();
        HttpClient::with_transport(config, transport)
    }

    #[tokio::test]
    async fn success_resolves_with_the_parsed_payload() {
        let transport = MockTransport::respond_with(200, r#"{"ok":true}"#);
        let payload = client(transport).get("/things").send().await.unwrap();

        assert_eq!(payload.data, json!({"ok": true}));
        assert_eq!(payload.status, StatusCode::OK);
        assert_eq!(payload.status_text, "OK");
        assert_eq!(payload.url.as_str(), "https://api.test/things");
        assert_eq!(payload.request.method, Method::GET);
    }

    #[tokio::test]
    async fn non_json_bodies_resolve_as_raw_text() {
        let transport = MockTransport::respond_with(200, "hello");
        let payload = client(transport).get("/things").send().await.unwrap();

        assert_eq!(payload.data, Value::String("hello".to_string()));
    }

    #[tokio::test]
    async fn http_errors_reject_with_status_and_decoded_body() {
        let transport = MockTransport::respond_with(503, r#"{"err":"busy"}"#);
        let error = client(transport).get("/things").send().await.unwrap_err();

        match error {
            RequestError::HttpStatus {
                status,
                status_text,
                error,
            } => {
                assert_eq!(status, 503);
                assert_eq!(status_text, "Service Unavailable");
                assert_eq!(error, json!({"err": "busy"}));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failures_reject_with_fetch_failed() {
        let transport = MockTransport::new([Script::Fail("connection refused")]);
        let error = client(transport).get("/things").send().await.unwrap_err();

        assert_eq!(error.to_string(), "Fetch failed");
        assert!(matches!(error, RequestError::Transport { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_and_cancels_the_in_flight_attempt() {
        let transport = MockTransport::new([Script::Hang]);
        let config = ClientConfig::builder()
            .base_url("https://api.test")
            .timeout(Duration::from_millis(50))
            .build();
        let client = HttpClient::with_transport(config, transport.clone());

        let started = tokio::time::Instant::now();
        let error = client.get("/slow").send().await.unwrap_err();

        assert!(error.is_timeout());
        assert_eq!(error.to_string(), "Request timed-out");
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_millis(60));

        let seen = transport.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn per_call_timeout_overrides_the_configured_one() {
        let transport = MockTransport::new([Script::Hang]);
        let client = client(transport);

        let started = tokio::time::Instant::now();
        let error = client
            .get("/slow")
            .timeout(Duration::from_millis(10))
            .send()
            .await
            .unwrap_err();

        assert!(error.is_timeout());
        assert!(started.elapsed() < Duration::from_millis(20));
    }

    struct Tag {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl RequestInterceptor for Tag {
        async fn intercept(&self, request: OutboundRequest) -> Result<OutboundRequest> {
            // Suspend first so ordering reflects the fold, not scheduling.
            tokio::task::yield_now().await;
            self.log.lock().push(self.label);
            Ok(request)
        }
    }

    #[async_trait]
    impl ResponseInterceptor for Tag {
        async fn on_response(&self, response: Response) -> Result<Response> {
            tokio::task::yield_now().await;
            self.log.lock().push(self.label);
            Ok(response)
        }
    }

    #[tokio::test]
    async fn most_recently_attached_interceptors_run_first() {
        let transport = MockTransport::respond_with(200, "{}");
        let client = client(transport);
        let log = Arc::new(Mutex::new(Vec::new()));

        client.attach_request_interceptor(Tag {
            label: "request-a",
            log: log.clone(),
        });
        client.attach_request_interceptor(Tag {
            label: "request-b",
            log: log.clone(),
        });
        client.attach_response_interceptor(Tag {
            label: "response-a",
            log: log.clone(),
        });
        client.attach_response_interceptor(Tag {
            label: "response-b",
            log: log.clone(),
        });

        client.get("/things").send().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["request-b", "request-a", "response-b", "response-a"]
        );
    }

    struct Identity;

    #[async_trait]
    impl RequestInterceptor for Identity {
        async fn intercept(&self, request: OutboundRequest) -> Result<OutboundRequest> {
            Ok(request)
        }
    }

    #[async_trait]
    impl ResponseInterceptor for Identity {}

    #[tokio::test]
    async fn identity_interceptors_leave_the_outbound_request_untouched() {
        let bare_transport = MockTransport::respond_with(200, "{}");
        let bare = client(bare_transport.clone());
        bare.get("/things")
            .query("q", "a b")
            .header("x-tag", "1")
            .send()
            .await
            .unwrap();

        let wrapped_transport = MockTransport::respond_with(200, "{}");
        let wrapped = client(wrapped_transport.clone());
        wrapped.attach_request_interceptor(Identity);
        wrapped.attach_response_interceptor(Identity);
        wrapped
            .get("/things")
            .query("q", "a b")
            .header("x-tag", "1")
            .send()
            .await
            .unwrap();

        let bare_seen = bare_transport.seen.lock();
        let wrapped_seen = wrapped_transport.seen.lock();
        assert_eq!(bare_seen[0].url, wrapped_seen[0].url);
        assert_eq!(bare_seen[0].method, wrapped_seen[0].method);
        assert_eq!(bare_seen[0].headers, wrapped_seen[0].headers);
        assert_eq!(bare_seen[0].body, wrapped_seen[0].body);
    }

    #[tokio::test]
    async fn per_call_headers_override_defaults() {
        let transport = MockTransport::respond_with(200, "{}");
        let config = ClientConfig::builder()
            .base_url("https://api.test")
            .default_header("x-api-key", "default")
            .default_header("x-client", "tether")
            .build();
        let client = HttpClient::with_transport(config, transport.clone());

        client
            .get("/things")
            .header("x-api-key", "override")
            .send()
            .await
            .unwrap();

        let seen = transport.seen.lock();
        assert_eq!(seen[0].headers.get("x-api-key").unwrap(), "override");
        assert_eq!(seen[0].headers.get("x-client").unwrap(), "tether");
    }

    #[tokio::test]
    async fn json_bodies_are_serialized_with_a_content_type() {
        let transport = MockTransport::respond_with(200, "{}");
        let client = client(transport.clone());

        client
            .post("/things")
            .json(&json!({"name": "widget"}))
            .send()
            .await
            .unwrap();

        let seen = transport.seen.lock();
        assert_eq!(seen[0].body.as_deref(), Some(r#"{"name":"widget"}"#));
        assert_eq!(
            seen[0].headers.get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn get_and_delete_ignore_bodies() {
        let transport = MockTransport::new([
            Script::Respond {
                status: 200,
                body: "{}",
            },
            Script::Respond {
                status: 200,
                body: "{}",
            },
        ]);
        let client = client(transport.clone());

        client
            .get("/things")
            .json(&json!({"ignored": true}))
            .send()
            .await
            .unwrap();
        client
            .delete("/things/1")
            .json(&json!({"ignored": true}))
            .send()
            .await
            .unwrap();

        let seen = transport.seen.lock();
        assert_eq!(seen[0].body, None);
        assert_eq!(seen[1].body, None);
    }

    #[tokio::test]
    async fn unserializable_bodies_surface_an_encode_error() {
        let transport = MockTransport::respond_with(200, "{}");
        let client = client(transport.clone());

        // Non-string map keys cannot be encoded as JSON.
        let mut body = std::collections::HashMap::new();
        body.insert((1u8, 2u8), "x");

        let error = client.post("/things").json(&body).send().await.unwrap_err();
        assert!(matches!(error, RequestError::BodyEncode(_)));
        assert!(transport.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn absolute_targets_bypass_the_base_url() {
        let transport = MockTransport::respond_with(200, "{}");
        let client = client(transport.clone());

        client
            .get("https://elsewhere.test/ping")
            .send()
            .await
            .unwrap();

        assert_eq!(
            transport.seen.lock()[0].url.as_str(),
            "https://elsewhere.test/ping"
        );
    }

    #[tokio::test]
    async fn recovered_responses_still_get_status_classified() {
        struct RecoverWithError;

        #[async_trait]
        impl ResponseInterceptor for RecoverWithError {
            async fn on_error(
                &self,
                _error: RequestError,
                context: &ErrorContext<'_>,
            ) -> Result<Response> {
                Ok(Response::new(
                    StatusCode::BAD_GATEWAY,
                    HeaderMap::new(),
                    "still broken",
                    context.request().url.clone(),
                ))
            }
        }

        let transport = MockTransport::respond_with(503, "{}");
        let client = client(transport);
        client.attach_response_interceptor(RecoverWithError);

        let error = client.get("/things").send().await.unwrap_err();
        assert_eq!(error.status_code(), Some(502));
    }
}
