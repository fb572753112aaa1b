//! Outbound request value type and the per-call request builder.

use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use url::Url;

use crate::cancel::CancelSignal;
use crate::client::HttpClient;
use crate::error::{RequestError, Result};
use crate::response::ResponsePayload;

/// The value threaded through the request-interceptor chain.
///
/// Each request interceptor receives the current request by value and returns
/// the replacement handed to the next stage; the final stage's output is what
/// the transport performs.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully built target URL, query string included.
    pub url: Url,
    /// Merged headers (defaults, content type, per-call overrides).
    pub headers: HeaderMap,
    /// Serialized body, if any.
    pub body: Option<String>,
    /// Cancellation signal for this call; set only on timeout expiry.
    pub cancel: CancelSignal,
}

/// Build the absolute URL for a call.
///
/// A target that already starts with `http` is taken as-is; anything else is
/// appended to the base URL by plain concatenation (so a base with a path
/// prefix keeps that prefix). Query pairs are appended percent-encoded.
pub(crate) fn build_url(base: &str, target: &str, query: &[(String, String)]) -> Result<Url> {
    let absolute = if target.starts_with("http") {
        target.to_owned()
    } else {
        format!("{base}{target}")
    };

    let mut url =
        Url::parse(&absolute).map_err(|e| RequestError::InvalidUrl(format!("{absolute}: {e}")))?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

/// Per-call request builder, consumed by [`send`](RequestBuilder::send).
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<String>,
    encode_error: Option<String>,
    timeout: Option<Duration>,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(client: &'a HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            encode_error: None,
            timeout: None,
        }
    }

    /// Add a header, overriding any default header of the same name.
    ///
    /// Invalid header names or values are silently dropped.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self.query.push((key.into(), value.into()));
        }
        self
    }

    /// Set the request body as JSON.
    ///
    /// Serialization failures surface from [`send`](RequestBuilder::send).
    /// The body is ignored for GET and DELETE requests.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(encoded) => self.body = Some(encoded),
            Err(e) => self.encode_error = Some(e.to_string()),
        }
        self
    }

    /// Override the configured timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the outbound request and perform it.
    pub async fn send(self) -> Result<ResponsePayload> {
        if let Some(message) = self.encode_error {
            return Err(RequestError::BodyEncode(message));
        }

        let config = self.client.config();
        let url = build_url(&config.base_url, &self.url, &self.query)?;

        let body = if self.method == Method::GET || self.method == Method::DELETE {
            None
        } else {
            self.body
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }
        if body.is_some() {
            headers.insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        for (name, value) in self.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        let request = OutboundRequest {
            method: self.method,
            url,
            headers,
            body,
            cancel: CancelSignal::new(),
        };
        let timeout = self.timeout.unwrap_or(config.timeout);

        self.client.perform(request, timeout).await
    }
}
