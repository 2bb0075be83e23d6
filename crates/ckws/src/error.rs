//! Error types for the ckws library.
//!
//! This module provides a unified error type with explicit variants for
//! transport, server, codec, signing, and input validation errors.
//! Local construction failures (compile, decode, encode, sign) surface
//! synchronously; server and transport failures arrive through the same
//! `Result` as a successful response.

use thiserror::Error;

/// The unified error type for ckws operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, HTTP).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Errors reported by the web service.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// Predicate compilation errors.
    #[error("predicate error: {0}")]
    Compile(#[from] CompileError),

    /// Wire decoding errors.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Wire encoding errors.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Key loading and request signing errors.
    #[error("signing error: {0}")]
    Sign(#[from] SignError),

    /// Input validation errors.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// A staged asset file could not be read.
    #[error("failed to read staged asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Errors reported by the web service, classified from the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The request was rejected as malformed (`BAD_REQUEST`).
    ///
    /// Carries the server's human-readable reason, e.g. that a queried
    /// type is not marked indexable, or that a `recordChangeTag` is stale
    /// or missing.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Any other server error code.
    #[error("internal error [{code}]: {reason}")]
    InternalError { code: String, reason: String },

    /// The addressed record does not exist (`NOT_FOUND`).
    #[error("unknown item: {record_name}")]
    UnknownItem { record_name: String },

    /// A non-200 status whose body is not an error envelope.
    #[error("HTTP {status}")]
    Status { status: u16, body: Option<String> },
}

/// Predicate compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The predicate does not fit the supported grammar.
    #[error("malformed predicate '{predicate}': {reason}")]
    Malformed { predicate: String, reason: String },

    /// `FALSEPREDICATE` has no wire representation.
    #[error("FALSEPREDICATE cannot be expressed as a filter")]
    AlwaysFalse,
}

impl CompileError {
    pub(crate) fn malformed(predicate: &str, reason: impl Into<String>) -> Self {
        CompileError::Malformed {
            predicate: predicate.to_string(),
            reason: reason.into(),
        }
    }
}

/// Wire decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A wire value does not have the shape its tag (or sniffing) requires.
    #[error("invalid shape for {expected}: {found}")]
    InvalidShape { expected: String, found: String },

    /// A `BYTES` value is not valid base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// A record in a response lacks a field the operation requires.
    #[error("record '{record_name}' is missing '{missing}'")]
    IncompleteRecord {
        record_name: String,
        missing: &'static str,
    },
}

impl DecodeError {
    pub(crate) fn shape(expected: impl Into<String>, found: impl ToString) -> Self {
        DecodeError::InvalidShape {
            expected: expected.into(),
            found: found.to_string(),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::shape("response body", err)
    }
}

/// Wire encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A locally staged asset was encoded before it was uploaded.
    #[error("asset in field '{field}' has not been uploaded")]
    UnuploadedAsset { field: String },

    /// The request body could not be serialized.
    #[error("failed to serialize request: {0}")]
    Json(String),
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Json(err.to_string())
    }
}

/// Key loading and signing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The private key material could not be read or parsed.
    #[error("invalid private key: {reason}")]
    InvalidKey { reason: String },

    /// The signature could not be produced.
    #[error("signing failed: {reason}")]
    SigningFailed { reason: String },
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// Invalid service URL.
    #[error("invalid service URL '{value}': {reason}")]
    ServiceUrl { value: String, reason: String },

    /// Invalid environment name.
    #[error("invalid environment '{value}'")]
    Environment { value: String },

    /// Invalid database scope name.
    #[error("invalid database scope '{value}'")]
    Scope { value: String },

    /// An asset field had no successful upload at finalize time.
    #[error("no upload response for asset field '{field}'")]
    MissingUpload { field: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
