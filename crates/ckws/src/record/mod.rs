//! Records and their wire codec.

pub mod codec;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::types::RecordId;
use crate::value::FieldValue;

pub use codec::{Completeness, RecordWire, TimestampWire};

/// A typed, keyed bag of fields representing one stored entity.
///
/// A record is created locally, filled in with [`Record::set`], and
/// becomes persisted once a save response supplies its creation time and
/// change tag. The change tag is echoed back on later updates and deletes
/// so the server can detect conflicting writes.
///
/// # Example
///
/// ```
/// use ckws::{FieldValue, Record};
///
/// let mut record = Record::new("Users");
/// record.set("firstName", "Mei");
/// record.set("width", 18_i64);
///
/// assert!(!record.is_persisted());
/// assert_eq!(record.get("width"), Some(&FieldValue::Integer(18)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    id: RecordId,
    record_type: String,
    change_tag: Option<String>,
    created_at: Option<DateTime<Utc>>,
    modified_at: Option<DateTime<Utc>>,
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an unsaved record with a generated id.
    pub fn new(record_type: impl Into<String>) -> Self {
        Self::with_id(record_type, RecordId::generate())
    }

    /// Create an unsaved record with a caller-chosen id.
    pub fn with_id(record_type: impl Into<String>, id: RecordId) -> Self {
        Self {
            id,
            record_type: record_type.into(),
            change_tag: None,
            created_at: None,
            modified_at: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Server-issued version token, present once the record is saved.
    pub fn change_tag(&self) -> Option<&str> {
        self.change_tag.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    /// A record is persisted once the server has reported its creation.
    pub fn is_persisted(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// Fields in name order.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Returns true if any field holds an asset that still needs uploading.
    pub fn has_local_assets(&self) -> bool {
        self.fields.values().any(FieldValue::has_local_assets)
    }
}
