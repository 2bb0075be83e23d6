//! Core identifier and addressing types.
//!
//! These types enforce protocol invariants at construction time,
//! ensuring invalid states are unrepresentable.

mod record_id;
mod scope;
mod service_url;

pub use record_id::{DEFAULT_OWNER_NAME, DEFAULT_ZONE_NAME, RecordId, ZoneId};
pub use scope::{Environment, Scope};
pub use service_url::{DEFAULT_HOST, ServiceUrl};
