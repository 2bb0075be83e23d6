//! Record and zone identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the zone every database starts with.
pub const DEFAULT_ZONE_NAME: &str = "_defaultZone";

/// Owner name standing in for the current user.
pub const DEFAULT_OWNER_NAME: &str = "__defaultOwner__";

/// Identity of a record. Two ids are equal when their names are.
///
/// # Example
///
/// ```
/// use ckws::RecordId;
///
/// let id = RecordId::new("E621E1F8-C36C-495A-93FC-0C247A3E6E5F");
/// assert_eq!(id.name(), "E621E1F8-C36C-495A-93FC-0C247A3E6E5F");
/// assert_ne!(RecordId::generate(), RecordId::generate());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId {
    name: String,
}

impl RecordId {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Create an id with a fresh uppercase UUID name.
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string().to_uppercase())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identity of a record zone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneId {
    pub zone_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

impl ZoneId {
    pub fn new(zone_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            owner_name: None,
        }
    }

    pub fn with_owner(zone_name: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            owner_name: Some(owner_name.into()),
        }
    }

    pub fn is_default(&self) -> bool {
        self.zone_name == DEFAULT_ZONE_NAME
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::with_owner(DEFAULT_ZONE_NAME, DEFAULT_OWNER_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_uppercase_uuids() {
        let id = RecordId::generate();
        assert_eq!(id.name().len(), 36);
        assert_eq!(id.name(), id.name().to_uppercase());
    }

    #[test]
    fn equality_is_by_name() {
        assert_eq!(RecordId::new("a"), RecordId::new("a"));
        assert_ne!(RecordId::new("a"), RecordId::new("b"));
    }

    #[test]
    fn zone_serializes_camel_case() {
        let zone = ZoneId::new("photos");
        assert_eq!(
            serde_json::to_value(&zone).unwrap(),
            serde_json::json!({"zoneName": "photos"})
        );
        assert!(ZoneId::default().is_default());
    }
}
