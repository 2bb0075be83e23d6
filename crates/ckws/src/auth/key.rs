//! Server-to-server signing key.

use p256::SecretKey;
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use std::fmt;
use std::path::Path;

use crate::error::SignError;

/// A P-256 private key used to sign requests.
///
/// Accepts the SEC1 `EC PRIVATE KEY` PEM that `openssl ecparam -genkey`
/// produces as well as PKCS#8 `PRIVATE KEY` PEM or DER.
///
/// # Security
///
/// The key material is never shown in Debug output.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Parse a PEM-encoded key.
    pub fn from_pem(pem: &str) -> Result<Self, SignError> {
        let pem = pem.trim();
        let secret = SecretKey::from_sec1_pem(pem)
            .or_else(|_| SecretKey::from_pkcs8_pem(pem))
            .map_err(|e| SignError::InvalidKey {
                reason: format!("not a P-256 SEC1 or PKCS#8 PEM key: {}", e),
            })?;
        Ok(Self::from_secret(secret))
    }

    /// Parse a DER-encoded key.
    pub fn from_der(der: &[u8]) -> Result<Self, SignError> {
        let secret = SecretKey::from_sec1_der(der)
            .or_else(|_| SecretKey::from_pkcs8_der(der))
            .map_err(|e| SignError::InvalidKey {
                reason: format!("not a P-256 SEC1 or PKCS#8 DER key: {}", e),
            })?;
        Ok(Self::from_secret(secret))
    }

    /// Parse key file contents, PEM if it looks like text, DER otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignError> {
        match std::str::from_utf8(bytes) {
            Ok(text) if text.contains("-----BEGIN") => Self::from_pem(text),
            _ => Self::from_der(bytes),
        }
    }

    /// Read and parse a key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SignError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| SignError::InvalidKey {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Returns the public half, as registered with the service.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey::from(&self.signing_key)
    }

    fn from_secret(secret: SecretKey) -> Self {
        Self {
            signing_key: SigningKey::from(secret),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
