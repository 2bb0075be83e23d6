//! Record field values.
//!
//! [`FieldValue`] is the closed set of values a record field can hold.
//! The [`codec`] submodule maps it to and from the tagged wire form.

mod asset;
pub mod codec;
mod reference;

use chrono::{DateTime, TimeZone, Utc};

pub use asset::{Asset, AssetDescriptor, CHECKSUM_PLACEHOLDER};
pub use codec::{WireField, WireType};
pub use reference::{Reference, ReferenceAction};

/// A record field value. Exactly one variant is active.
///
/// Comparisons across variants are always unequal.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    String(String),
    StringList(Vec<String>),
    Integer(i64),
    Double(f64),
    Bytes(Vec<u8>),
    BytesList(Vec<Vec<u8>>),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
    Reference(Reference),
    ReferenceList(Vec<Reference>),
    Asset(Asset),
    AssetList(Vec<Asset>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(ms) => Utc.timestamp_millis_opt(*ms).single(),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            FieldValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            FieldValue::Asset(a) => Some(a),
            _ => None,
        }
    }

    /// Returns every asset held by this value, in list order.
    pub fn assets(&self) -> &[Asset] {
        match self {
            FieldValue::Asset(a) => std::slice::from_ref(a),
            FieldValue::AssetList(list) => list,
            _ => &[],
        }
    }

    /// Returns true if any asset in this value still needs uploading.
    pub fn has_local_assets(&self) -> bool {
        self.assets().iter().any(Asset::is_local)
    }

    /// Whether this value is list-shaped on the wire.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            FieldValue::StringList(_)
                | FieldValue::BytesList(_)
                | FieldValue::ReferenceList(_)
                | FieldValue::AssetList(_)
        )
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::StringList(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value.timestamp_millis())
    }
}

impl From<Reference> for FieldValue {
    fn from(value: Reference) -> Self {
        FieldValue::Reference(value)
    }
}

impl From<Vec<Reference>> for FieldValue {
    fn from(value: Vec<Reference>) -> Self {
        FieldValue::ReferenceList(value)
    }
}

impl From<Asset> for FieldValue {
    fn from(value: Asset) -> Self {
        FieldValue::Asset(value)
    }
}

impl From<Vec<Asset>> for FieldValue {
    fn from(value: Vec<Asset>) -> Self {
        FieldValue::AssetList(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_variant_values_are_unequal() {
        assert_ne!(FieldValue::Integer(1), FieldValue::Double(1.0));
        assert_ne!(FieldValue::Integer(1), FieldValue::DateTime(1));
        assert_ne!(
            FieldValue::String("a".into()),
            FieldValue::StringList(vec!["a".into()])
        );
    }

    #[test]
    fn date_time_keeps_millisecond_precision() {
        let when = Utc.timestamp_millis_opt(1_608_638_400_123).unwrap();
        let value = FieldValue::from(when);
        assert_eq!(value, FieldValue::DateTime(1_608_638_400_123));
        assert_eq!(value.as_date_time(), Some(when));
    }

    #[test]
    fn assets_cover_single_and_list_values() {
        let single = FieldValue::from(Asset::from_file("/tmp/a"));
        assert_eq!(single.assets().len(), 1);
        assert!(single.has_local_assets());

        let list = FieldValue::from(vec![Asset::from_file("/tmp/a"), Asset::from_file("/tmp/b")]);
        assert_eq!(list.assets().len(), 2);
        assert!(FieldValue::Integer(3).assets().is_empty());
    }
}
