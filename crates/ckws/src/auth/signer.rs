//! Request signing.
//!
//! Every request to the database endpoints carries three headers: the key
//! id, the request date, and an ECDSA P-256 signature over
//! `"{date}:{base64(sha256(body))}:{path}"`. The date in the header must be
//! the exact string that was signed.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, SecondsFormat, Utc};
use p256::ecdsa::Signature;
use p256::ecdsa::signature::Signer;
use sha2::{Digest, Sha256};
use std::fmt;

use super::PrivateKey;
use crate::error::SignError;

/// Header carrying the server-to-server key id.
pub const KEY_ID_HEADER: &str = "X-Apple-CloudKit-Request-KeyID";
/// Header carrying the signed ISO-8601 date.
pub const DATE_HEADER: &str = "X-Apple-CloudKit-Request-ISO8601Date";
/// Header carrying the base64 DER signature.
pub const SIGNATURE_HEADER: &str = "X-Apple-CloudKit-Request-SignatureV1";

/// Format a timestamp the way it is signed and sent: `2020-12-22T12:00:00Z`.
pub fn iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build the exact string that gets signed.
pub fn canonical_payload(body: &[u8], timestamp: DateTime<Utc>, path: &str) -> String {
    let body_hash = BASE64.encode(Sha256::digest(body));
    format!("{}:{}:{}", iso8601(timestamp), body_hash, path)
}

/// Sign a request, returning the base64 DER signature.
///
/// P-256 signing here is deterministic (RFC 6979), so the same inputs
/// always produce the same signature.
pub fn sign(
    body: &[u8],
    timestamp: DateTime<Utc>,
    path: &str,
    key: &PrivateKey,
) -> Result<String, SignError> {
    let payload = canonical_payload(body, timestamp, path);
    let signature: Signature =
        key.signing_key()
            .try_sign(payload.as_bytes())
            .map_err(|e| SignError::SigningFailed {
                reason: e.to_string(),
            })?;
    Ok(BASE64.encode(signature.to_der().as_bytes()))
}

/// The three authentication headers of a signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub key_id: String,
    pub date: String,
    pub signature: String,
}

impl SignatureHeaders {
    /// Header name/value pairs, in a fixed order.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (KEY_ID_HEADER, self.key_id.as_str()),
            (DATE_HEADER, self.date.as_str()),
            (SIGNATURE_HEADER, self.signature.as_str()),
        ]
    }
}

/// A key id bound to its private key.
///
/// Cheap to clone and safe to share between concurrent requests; signing
/// holds no mutable state.
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    key: PrivateKey,
}

impl RequestSigner {
    pub fn new(key_id: impl Into<String>, key: PrivateKey) -> Self {
        Self {
            key_id: key_id.into(),
            key,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    /// Produce the authentication headers for one request.
    pub fn headers(
        &self,
        body: &[u8],
        timestamp: DateTime<Utc>,
        path: &str,
    ) -> Result<SignatureHeaders, SignError> {
        Ok(SignatureHeaders {
            key_id: self.key_id.clone(),
            date: iso8601(timestamp),
            signature: sign(body, timestamp, path, &self.key)?,
        })
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use p256::ecdsa::signature::Verifier;

    const PEM: &str = include_str!("../../tests/fixtures/eckey.pem");
    const PATH: &str = "/database/1/iCloud.com.example/development/public/records/modify";

    fn key() -> PrivateKey {
        PrivateKey::from_pem(PEM).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn date_is_second_precision_utc() {
        assert_eq!(iso8601(at(1_608_638_400)), "2020-12-22T12:00:00Z");
    }

    #[test]
    fn canonical_payload_layout() {
        let payload = canonical_payload(b"", at(1_608_638_400), "/p");
        // sha256 of the empty string
        assert_eq!(
            payload,
            "2020-12-22T12:00:00Z:47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=:/p"
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let body = br#"{"operations":[]}"#;
        let a = sign(body, at(1_608_638_400), PATH, &key()).unwrap();
        let b = sign(body, at(1_608_638_400), PATH, &key()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_input_changes_the_signature() {
        let body = br#"{"operations":[]}"#;
        let base = sign(body, at(1_608_638_400), PATH, &key()).unwrap();
        assert_ne!(base, sign(b"{}", at(1_608_638_400), PATH, &key()).unwrap());
        assert_ne!(base, sign(body, at(1_608_638_401), PATH, &key()).unwrap());
        assert_ne!(base, sign(body, at(1_608_638_400), "/other", &key()).unwrap());
    }

    #[test]
    fn signature_verifies_against_the_public_key() {
        let body = b"hello";
        let when = at(1_608_638_400);
        let encoded = sign(body, when, PATH, &key()).unwrap();
        let der = BASE64.decode(encoded).unwrap();
        let signature = Signature::from_der(&der).unwrap();

        let payload = canonical_payload(body, when, PATH);
        assert!(
            key()
                .verifying_key()
                .verify(payload.as_bytes(), &signature)
                .is_ok()
        );
    }

    #[test]
    fn headers_carry_the_signed_date() {
        let signer = RequestSigner::new("1234567890", key());
        let headers = signer.headers(b"{}", at(1_608_638_400), PATH).unwrap();
        assert_eq!(headers.key_id, "1234567890");
        assert_eq!(headers.date, "2020-12-22T12:00:00Z");
        assert_eq!(headers.pairs()[2].0, SIGNATURE_HEADER);
        assert!(format!("{:?}", signer).contains("[REDACTED]"));
    }
}
