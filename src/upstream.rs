//! Forwarding of authorized requests to the DNS provider.

use crate::error::Error;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// The provider's header carrying the account key.
pub const ACCESS_KEY_HEADER: &str = "AccessKey";

/// An authorized request, ready to be sent with the upstream account key.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// The request path and query string, e.g. `/dnszone/7/records?page=2`.
    pub path_and_query: String,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// The provider's reply, relayed to the client as-is.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        match self.content_type {
            Some(content_type) => response.headers_mut().insert(CONTENT_TYPE, content_type),
            None => response.headers_mut().remove(CONTENT_TYPE),
        };
        response
    }
}

#[async_trait::async_trait]
pub trait Upstream {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, Error>;
}

pub type DynUpstream = Arc<dyn Upstream + Send + Sync>;

/// Forwards requests over HTTPS with `reqwest`.
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: String,
    access_key: HeaderValue,
}

impl HttpUpstream {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the account key isn't a valid header value, and
    /// [`Error::Upstream`] if the HTTP client can't be built.
    pub fn new(base_url: &str, access_key: &str, timeout: Duration) -> Result<Self, Error> {
        let mut access_key = HeaderValue::from_str(access_key)
            .map_err(|_| Error::InvalidConfig("master_api_key isn't a valid header value".into()))?;
        access_key.set_sensitive(true);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
        })
    }
}

#[async_trait::async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, request: UpstreamRequest) -> Result<UpstreamResponse, Error> {
        let url = format!("{}{}", self.base_url, request.path_and_query);
        tracing::debug!("forwarding {} {url}", request.method);

        let mut outbound = self
            .client
            .request(request.method, url)
            .header(ACCESS_KEY_HEADER, self.access_key.clone())
            .body(request.body);
        if let Some(content_type) = request.content_type {
            outbound = outbound.header(CONTENT_TYPE, content_type);
        }

        let response = outbound.send().await?;
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?;
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
