//! Response wrappers and body decoding.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::RequestError;
use crate::request::OutboundRequest;

/// Decode a response body without knowing its content type up front.
///
/// The text is speculatively parsed as JSON; anything that does not parse is
/// returned as-is as a [`Value::String`]. Applied uniformly to success and
/// error bodies.
pub fn decode_body_best_effort(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

/// A fully buffered raw response, as produced by a [`Transport`].
///
/// [`Transport`]: crate::transport::Transport
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
}

impl Response {
    /// Create a response from its parts.
    ///
    /// Custom transports (and tests) use this; the reqwest transport goes
    /// through [`from_reqwest`](Response::from_reqwest).
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>, url: Url) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            url,
        }
    }

    /// Create a response from a reqwest response, buffering the body.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await.unwrap_or_default();

        Self {
            status,
            headers,
            body,
            url,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Canonical reason phrase for the status code.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Check if the response was successful (status in `[200, 300)`).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|value| value.to_str().ok())
    }

    /// Get the response URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-success response into the error callers see.
    ///
    /// The body is decoded best-effort so error payloads keep whatever
    /// structure the server sent.
    pub fn into_status_error(self) -> RequestError {
        let text = self.text();
        RequestError::HttpStatus {
            status: self.status.as_u16(),
            status_text: self.status_text().to_owned(),
            error: decode_body_best_effort(&text),
        }
    }
}

/// The resolved value of a successful call.
#[derive(Debug)]
pub struct ResponsePayload {
    /// Response body, decoded best-effort (JSON value or raw text).
    pub data: Value,
    /// HTTP status code.
    pub status: StatusCode,
    /// Canonical reason phrase for the status.
    pub status_text: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final response URL.
    pub url: Url,
    /// The outbound request that produced this response, as originally built
    /// by the client (before any interceptor rewrites).
    pub request: OutboundRequest,
}

impl ResponsePayload {
    pub(crate) fn new(response: Response, request: OutboundRequest) -> Self {
        let text = response.text();
        Self {
            data: decode_body_best_effort(&text),
            status: response.status(),
            status_text: response.status_text().to_owned(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            request,
        }
    }

    /// Deserialize the decoded body into a concrete type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}
