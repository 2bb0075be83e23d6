//! Pluggable HTTP transport.
//!
//! The client hands a fully built request to a [`Transport`] and gets the
//! status and body back. Signing, error classification, and decoding all
//! happen above this layer, so a transport only moves bytes.

mod http;

use async_trait::async_trait;

use crate::error::TransportError;

pub use http::ReqwestTransport;

/// Request body variants the web service uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HttpBody {
    Empty,
    /// Pre-serialized JSON. These are the exact bytes that were signed.
    Json(Vec<u8>),
    /// A single-file `multipart/form-data` upload.
    Multipart {
        field_name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// An outgoing request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: HttpBody,
}

impl HttpRequest {
    /// A JSON `POST`.
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: reqwest::Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: HttpBody::Json(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A received response.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The body as text, for diagnostics.
    pub fn text(&self) -> Option<String> {
        if self.body.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.body).into_owned())
        }
    }
}

/// Sends one HTTP request.
///
/// Implementations must report DNS, connection, and timeout failures as
/// [`TransportError`]; any response that arrives, whatever its status, is
/// returned as an [`HttpResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_collects_headers() {
        let request = HttpRequest::post_json("https://h/p", b"{}".to_vec())
            .header("A", "1")
            .header("B", "2");
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.body, HttpBody::Json(b"{}".to_vec()));
    }

    #[test]
    fn response_text_is_none_when_empty() {
        let empty = HttpResponse {
            status: 500,
            body: Vec::new(),
        };
        assert_eq!(empty.text(), None);
    }
}
