//! `reqwest`-backed transport.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::{instrument, trace};

use super::{HttpBody, HttpRequest, HttpResponse, Transport};
use crate::error::TransportError;

/// The default transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ckws/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    /// Wrap an already configured client (proxies, timeouts, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            HttpBody::Empty => builder,
            HttpBody::Json(bytes) => builder.header(CONTENT_TYPE, "application/json").body(bytes),
            HttpBody::Multipart {
                field_name,
                file_name,
                bytes,
            } => {
                let part = Part::bytes(bytes).file_name(file_name);
                builder.multipart(Form::new().part(field_name, part))
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        trace!(status, len = body.len(), "response received");

        Ok(HttpResponse { status, body })
    }
}
