//! # Tether
//!
//! A small async HTTP client: a base URL, default headers, a chainable
//! request/response interceptor pipeline, and automatic abort-on-timeout over
//! a pluggable transport.
//!
//! ## Features
//!
//! - **Interceptors**: ordered request/response transformation chains; the
//!   most recently attached interceptor runs first, and failure hooks may
//!   recover by re-entering the pipeline
//! - **Timeouts**: one cancellation signal per call, set on expiry and
//!   observed by the in-flight transport attempt
//! - **Base URL and defaults**: relative targets are prefixed, default
//!   headers merged under per-call overrides
//! - **Best-effort bodies**: responses are speculatively parsed as JSON and
//!   fall back to raw text
//! - **Pluggable transport**: the default is backed by `reqwest`; tests can
//!   swap in their own exchange primitive
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tether::{ClientConfig, HttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(
//!         ClientConfig::builder()
//!             .base_url("https://api.example.com")
//!             .build(),
//!     );
//!
//!     let user = client.get("/users/42").send().await?;
//!     println!("status: {} data: {}", user.status, user.data);
//!     Ok(())
//! }
//! ```
//!
//! ## With Interceptors
//!
//! ```rust,no_run
//! use tether::{AuthInterceptor, ClientConfig, HttpClient, RetryInterceptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(
//!         ClientConfig::builder()
//!             .base_url("https://api.example.com")
//!             .build(),
//!     );
//!
//!     client.attach_request_interceptor(AuthInterceptor::bearer("token"));
//!     client.attach_response_interceptor(RetryInterceptor::new(2));
//!
//!     let order = client
//!         .post("/orders")
//!         .json(&serde_json::json!({"item": "widget", "quantity": 5}))
//!         .send()
//!         .await?;
//!
//!     println!("created: {}", order.data);
//!     Ok(())
//! }
//! ```

mod cancel;
mod client;
mod config;
mod error;
mod interceptor;
mod pipeline;
mod request;
mod response;
mod retry;
mod transport;

pub use cancel::CancelSignal;
pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{RequestError, Result};
pub use interceptor::{AuthInterceptor, LoggingInterceptor, RequestInterceptor, ResponseInterceptor};
pub use pipeline::ErrorContext;
pub use request::{OutboundRequest, RequestBuilder};
pub use response::{Response, ResponsePayload, decode_body_best_effort};
pub use retry::RetryInterceptor;
pub use transport::{ReqwestTransport, Transport, TransportError};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use tether::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cancel::CancelSignal;
    pub use crate::client::HttpClient;
    pub use crate::config::{ClientConfig, ClientConfigBuilder};
    pub use crate::error::{RequestError, Result};
    pub use crate::interceptor::{
        AuthInterceptor, LoggingInterceptor, RequestInterceptor, ResponseInterceptor,
    };
    pub use crate::pipeline::ErrorContext;
    pub use crate::request::{OutboundRequest, RequestBuilder};
    pub use crate::response::{Response, ResponsePayload};
    pub use crate::retry::RetryInterceptor;
    pub use crate::transport::{ReqwestTransport, Transport, TransportError};
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
