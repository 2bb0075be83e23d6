//! Server-to-server authentication.

mod key;
mod signer;

pub use key::PrivateKey;
pub use signer::{
    DATE_HEADER, KEY_ID_HEADER, RequestSigner, SIGNATURE_HEADER, SignatureHeaders,
    canonical_payload, iso8601, sign,
};
