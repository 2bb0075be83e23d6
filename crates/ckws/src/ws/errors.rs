//! Classification of web service failures.
//!
//! A response passes through here before anything decodes it. Errors can
//! arrive three ways: a non-200 status, an error envelope in a 200 body,
//! or a per-record `serverErrorCode` inside an otherwise successful
//! `records` list. All three map onto [`ServerError`].

use tracing::debug;

use super::endpoints::ErrorEnvelope;
use crate::error::ServerError;
use crate::record::RecordWire;
use crate::transport::HttpResponse;

const BAD_REQUEST: &str = "BAD_REQUEST";
const NOT_FOUND: &str = "NOT_FOUND";

/// Check a response, returning its body when it carries no error.
pub fn check_response(response: HttpResponse) -> Result<Vec<u8>, ServerError> {
    let envelope = serde_json::from_slice::<ErrorEnvelope>(&response.body).ok();

    match (response.status, envelope) {
        (_, Some(envelope)) => {
            debug!(
                status = response.status,
                code = %envelope.server_error_code,
                uuid = envelope.uuid.as_deref().unwrap_or(""),
                "server error envelope"
            );
            Err(from_envelope(&envelope))
        }
        (200, None) => Ok(response.body),
        (status, None) => Err(ServerError::Status {
            status,
            body: response.text(),
        }),
    }
}

/// Classify a request-level error envelope.
pub fn from_envelope(envelope: &ErrorEnvelope) -> ServerError {
    match envelope.server_error_code.as_str() {
        BAD_REQUEST => ServerError::InvalidArguments(reason_text(envelope.reason.as_deref())),
        code => ServerError::InternalError {
            code: code.to_string(),
            reason: envelope.reason.clone().unwrap_or_default(),
        },
    }
}

/// Classify a per-record error, if the record carries one.
pub fn record_error(record: &RecordWire) -> Option<ServerError> {
    let code = record.server_error_code.as_deref()?;
    let error = match code {
        NOT_FOUND => ServerError::UnknownItem {
            record_name: record.record_name.clone().unwrap_or_default(),
        },
        BAD_REQUEST => ServerError::InvalidArguments(reason_text(record.reason.as_deref())),
        code => ServerError::InternalError {
            code: code.to_string(),
            reason: record.reason.clone().unwrap_or_default(),
        },
    };
    Some(error)
}

/// The human-readable part of a reason, without a leading
/// `SomethingException: ` prefix.
fn reason_text(reason: Option<&str>) -> String {
    let reason = reason.unwrap_or_default().trim();
    match reason.split_once(": ") {
        Some((prefix, rest)) if prefix.ends_with("Exception") && !prefix.contains(' ') => {
            rest.to_string()
        }
        _ => reason.to_string(),
    }
}
