//! Signed web service client.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

use super::endpoints::{AssetUploadResponse, UPLOAD_FIELD_NAME};
use super::errors;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{DecodeError, EncodeError, Error, TransportError};
use crate::transport::{HttpBody, HttpRequest, ReqwestTransport, Transport};
use crate::types::Scope;
use crate::value::AssetDescriptor;

/// Sends signed requests for one container.
///
/// Holds only read-only state, so one client serves any number of
/// concurrent operations.
#[derive(Clone)]
pub struct WsClient {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl WsClient {
    /// A client using `reqwest` and the system clock.
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()), Arc::new(SystemClock))
    }

    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            clock,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// POST a signed JSON body to a database operation.
    #[instrument(skip(self, body), fields(container = %self.config.container(), scope = %scope))]
    pub async fn post<B, R>(&self, scope: Scope, operation: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let config = &self.config;
        let path = config
            .host()
            .database_path(config.container(), config.environment(), scope, operation);
        let bytes = serde_json::to_vec(body).map_err(EncodeError::from)?;
        let headers = config.signer().headers(&bytes, self.clock.now(), &path)?;
        debug!(%path, date = %headers.date, "signed request");

        let mut request = HttpRequest::post_json(config.host().url_for(&path), bytes);
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }

        let response = self.transport.send(request).await?;
        trace!(status = response.status, "response");

        let body = errors::check_response(response)?;
        let parsed = serde_json::from_slice(&body).map_err(DecodeError::from)?;
        Ok(parsed)
    }

    /// Upload one file to a token URL.
    ///
    /// Upload URLs are pre-authorized, so the request is not signed.
    #[instrument(skip(self, url, bytes), fields(file = %path.display(), len = bytes.len()))]
    pub async fn upload(&self, url: &str, path: &Path, bytes: Vec<u8>) -> Result<AssetDescriptor, Error> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "asset".to_string());

        let request = HttpRequest {
            method: reqwest::Method::POST,
            url: url.to_string(),
            headers: Vec::new(),
            body: HttpBody::Multipart {
                field_name: UPLOAD_FIELD_NAME.to_string(),
                file_name,
                bytes,
            },
        };

        let response = self.transport.send(request).await?;
        trace!(status = response.status, "upload response");

        let body = errors::check_response(response)?;
        let parsed: AssetUploadResponse = serde_json::from_slice(&body).map_err(DecodeError::from)?;
        Ok(parsed.single_file)
    }

    /// Read a staged asset file.
    pub(crate) async fn read_asset(&self, path: &Path) -> Result<Vec<u8>, Error> {
        tokio::fs::read(path).await.map_err(|source| {
            Error::Transport(TransportError::Io {
                path: path.display().to_string(),
                source,
            })
        })
    }
}

impl fmt::Debug for WsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{DATE_HEADER, KEY_ID_HEADER, PrivateKey, SIGNATURE_HEADER, sign};
    use crate::clock::FixedClock;
    use crate::error::ServerError;
    use crate::transport::HttpResponse;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    const PEM: &str = include_str!("../../tests/fixtures/eckey.pem");

    /// Records requests and replays a canned response.
    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                body: self.body.as_bytes().to_vec(),
            })
        }
    }

    fn client(status: u16, body: &'static str) -> (WsClient, Arc<Canned>) {
        let transport = Arc::new(Canned {
            status,
            body,
            seen: Mutex::new(Vec::new()),
        });
        let key = PrivateKey::from_pem(PEM).unwrap();
        let clock = FixedClock(Utc.timestamp_opt(1_608_638_400, 0).unwrap());
        let client = WsClient::with_transport(
            Config::new("iCloud.com.example", "1234567890", key),
            transport.clone(),
            Arc::new(clock),
        );
        (client, transport)
    }

    #[tokio::test]
    async fn post_signs_the_exact_body_and_path() {
        let (client, transport) = client(200, r#"{"records":[]}"#);
        let _: serde_json::Value = client
            .post(Scope::Public, "records/lookup", &serde_json::json!({"records": []}))
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(
            request.url,
            "https://api.apple-cloudkit.com/database/1/iCloud.com.example/development/public/records/lookup"
        );
        let header = |name: &str| {
            request
                .headers
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(header(KEY_ID_HEADER), "1234567890");
        assert_eq!(header(DATE_HEADER), "2020-12-22T12:00:00Z");

        let HttpBody::Json(body) = &request.body else {
            panic!("expected a JSON body");
        };
        let expected = sign(
            body,
            Utc.timestamp_opt(1_608_638_400, 0).unwrap(),
            "/database/1/iCloud.com.example/development/public/records/lookup",
            &PrivateKey::from_pem(PEM).unwrap(),
        )
        .unwrap();
        assert_eq!(header(SIGNATURE_HEADER), expected);
    }

    #[tokio::test]
    async fn server_envelope_becomes_server_error() {
        let (client, _) = client(
            400,
            r#"{"uuid":"u","serverErrorCode":"BAD_REQUEST","reason":"Queried type is not marked indexable"}"#,
        );
        let err = client
            .post::<_, serde_json::Value>(Scope::Public, "records/query", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Server(ServerError::InvalidArguments(ref reason)) if reason.contains("indexable")
        ));
    }

    #[tokio::test]
    async fn missing_asset_file_is_an_io_error() {
        let (client, _) = client(200, "{}");
        let err = client
            .read_asset(Path::new("/nonexistent/photo.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Io { .. })));
    }
}
