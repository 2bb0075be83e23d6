//! Record references.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{RecordId, ZoneId};

/// What the server does to the owning record when the target is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReferenceAction {
    #[default]
    None,
    DeleteSelf,
}

impl ReferenceAction {
    /// Returns the wire string for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceAction::None => "NONE",
            ReferenceAction::DeleteSelf => "DELETE_SELF",
        }
    }

    /// Parse a wire string. Anything unrecognized is [`ReferenceAction::None`].
    pub fn from_wire(s: &str) -> Self {
        match s {
            "DELETE_SELF" => ReferenceAction::DeleteSelf,
            _ => ReferenceAction::None,
        }
    }
}

/// A pointer from one record to another.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    record_id: RecordId,
    action: ReferenceAction,
}

impl Reference {
    pub fn new(record_id: RecordId, action: ReferenceAction) -> Self {
        Self { record_id, action }
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn action(&self) -> ReferenceAction {
        self.action
    }
}

/// Renders the form the predicate compiler recognizes as a reference literal.
impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<CKReference: action={}; recordName={}>",
            self.action.as_str(),
            self.record_id.name()
        )
    }
}

/// Wire form of a reference: `{recordName, action, zoneID?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReferenceWire {
    pub record_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(rename = "zoneID", default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
}

impl From<&Reference> for ReferenceWire {
    fn from(reference: &Reference) -> Self {
        Self {
            record_name: reference.record_id.name().to_string(),
            action: Some(reference.action.as_str().to_string()),
            zone_id: None,
        }
    }
}

impl From<ReferenceWire> for Reference {
    fn from(wire: ReferenceWire) -> Self {
        let action = wire
            .action
            .as_deref()
            .map(ReferenceAction::from_wire)
            .unwrap_or_default();
        Reference::new(RecordId::new(wire.record_name), action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_is_lenient() {
        assert_eq!(ReferenceAction::from_wire("VALIDATE"), ReferenceAction::None);
        assert_eq!(ReferenceAction::from_wire("DELETE_SELF"), ReferenceAction::DeleteSelf);
    }

    #[test]
    fn missing_action_defaults_to_none() {
        let wire: ReferenceWire = serde_json::from_str(r#"{"recordName": "abc"}"#).unwrap();
        let reference = Reference::from(wire);
        assert_eq!(reference.action(), ReferenceAction::None);
        assert_eq!(reference.record_id().name(), "abc");
    }

    #[test]
    fn display_embeds_record_name() {
        let reference = Reference::new(RecordId::new("emp-1"), ReferenceAction::DeleteSelf);
        assert_eq!(
            reference.to_string(),
            "<CKReference: action=DELETE_SELF; recordName=emp-1>"
        );
    }
}
