//! Record wire codec.
//!
//! Maps a [`Record`] to and from the record dictionary exchanged with the
//! `records/*` endpoints.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Record;
use crate::error::{DecodeError, EncodeError};
use crate::types::{RecordId, ZoneId};
use crate::value::codec::{self, WireField};

/// `{timestamp, userRecordName?, deviceID?}` as found in `created`/`modified`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampWire {
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_record_name: Option<String>,
    #[serde(rename = "deviceID", default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// A record dictionary.
///
/// Responses may carry a per-record `serverErrorCode` and `reason` in
/// place of a record; those are classified before decoding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_change_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, WireField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<TimestampWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<TimestampWire>,
    #[serde(rename = "zoneID", default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RecordWire {
    /// A bare `{recordName, recordChangeTag?}` dictionary, as used by deletes.
    pub fn reference_only(id: &RecordId, change_tag: Option<&str>) -> Self {
        Self {
            record_name: Some(id.name().to_string()),
            record_change_tag: change_tag.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Which fields a decoded record must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completeness {
    /// Name only (delete responses).
    Name,
    /// Name and type (lookups and queries).
    Typed,
    /// Name, type, creation time, and change tag (save responses).
    Saved,
}

/// Encode a record for a modify operation.
///
/// # Errors
///
/// Fails if any field still holds a locally staged asset.
pub fn encode_record(record: &Record) -> Result<RecordWire, EncodeError> {
    let fields = record
        .fields()
        .iter()
        .map(|(name, value)| Ok((name.clone(), codec::encode(name, value)?)))
        .collect::<Result<BTreeMap<_, _>, EncodeError>>()?;

    Ok(RecordWire {
        record_name: Some(record.id().name().to_string()),
        record_type: Some(record.record_type().to_string()),
        record_change_tag: record.change_tag().map(str::to_string),
        fields: Some(fields),
        ..RecordWire::default()
    })
}

/// Decode a record dictionary, checking it carries what `completeness` needs.
pub fn decode_record(wire: RecordWire, completeness: Completeness) -> Result<Record, DecodeError> {
    let record_name = wire.record_name.ok_or(DecodeError::IncompleteRecord {
        record_name: String::new(),
        missing: "recordName",
    })?;
    let missing = |field: &'static str| DecodeError::IncompleteRecord {
        record_name: record_name.clone(),
        missing: field,
    };

    let record_type = match (wire.record_type, completeness) {
        (Some(t), _) => t,
        (None, Completeness::Name) => String::new(),
        (None, _) => return Err(missing("recordType")),
    };

    if completeness == Completeness::Saved {
        if wire.created.is_none() {
            return Err(missing("created"));
        }
        if wire.record_change_tag.is_none() {
            return Err(missing("recordChangeTag"));
        }
    }

    let mut record = Record::with_id(record_type, RecordId::new(record_name.clone()));
    record.change_tag = wire.record_change_tag;
    record.created_at = wire.created.as_ref().map(timestamp).transpose()?;
    record.modified_at = wire.modified.as_ref().map(timestamp).transpose()?;

    for (name, field) in wire.fields.unwrap_or_default() {
        let value = codec::decode_field(&field)?;
        record.fields.insert(name, value);
    }

    Ok(record)
}

fn timestamp(wire: &TimestampWire) -> Result<DateTime<Utc>, DecodeError> {
    Utc.timestamp_millis_opt(wire.timestamp)
        .single()
        .ok_or_else(|| DecodeError::shape("a millisecond timestamp", wire.timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Asset, FieldValue};
    use serde_json::json;

    fn saved_user() -> RecordWire {
        serde_json::from_value(json!({
            "recordName": "E621E1F8-C36C-495A-93FC-0C247A3E6E5F",
            "recordType": "Users",
            "recordChangeTag": "kf2jd7",
            "created": {"timestamp": 1608638400000i64},
            "fields": {
                "firstName": {"value": "Mei"},
                "lastName": {"value": "Chen"},
                "width": {"value": 18},
                "height": {"value": 24, "type": "INT64"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn decodes_saved_record() {
        let record = decode_record(saved_user(), Completeness::Saved).unwrap();
        assert_eq!(record.id().name(), "E621E1F8-C36C-495A-93FC-0C247A3E6E5F");
        assert_eq!(record.record_type(), "Users");
        assert_eq!(record.change_tag(), Some("kf2jd7"));
        assert!(record.is_persisted());
        assert_eq!(record.get("firstName"), Some(&FieldValue::from("Mei")));
        assert_eq!(record.get("height"), Some(&FieldValue::Integer(24)));
    }

    #[test]
    fn saved_record_without_change_tag_is_incomplete() {
        let mut wire = saved_user();
        wire.record_change_tag = None;
        assert!(matches!(
            decode_record(wire, Completeness::Saved),
            Err(DecodeError::IncompleteRecord {
                missing: "recordChangeTag",
                ..
            })
        ));
    }

    #[test]
    fn saved_record_without_created_is_incomplete() {
        let mut wire = saved_user();
        wire.created = None;
        assert!(matches!(
            decode_record(wire, Completeness::Saved),
            Err(DecodeError::IncompleteRecord { missing: "created", .. })
        ));
    }

    #[test]
    fn name_only_records_decode_for_deletes() {
        let wire: RecordWire = serde_json::from_value(json!({"recordName": "gone"})).unwrap();
        let record = decode_record(wire.clone(), Completeness::Name).unwrap();
        assert_eq!(record.id().name(), "gone");
        assert!(decode_record(wire, Completeness::Typed).is_err());
    }

    #[test]
    fn encodes_fields_and_change_tag() {
        let mut record = decode_record(saved_user(), Completeness::Saved).unwrap();
        record.set("tags", vec!["a".to_string()]);
        let wire = serde_json::to_value(encode_record(&record).unwrap()).unwrap();
        assert_eq!(wire["recordChangeTag"], "kf2jd7");
        assert_eq!(wire["fields"]["firstName"], json!({"value": "Mei"}));
        assert_eq!(wire["fields"]["tags"], json!({"value": ["a"], "type": "STRING_LIST"}));
        assert!(wire.get("created").is_none());
    }

    #[test]
    fn encoding_local_asset_fails_with_field_name() {
        let mut record = Record::new("Photos");
        record.set("image", Asset::from_file("/tmp/x.png"));
        assert_eq!(
            encode_record(&record).unwrap_err(),
            EncodeError::UnuploadedAsset {
                field: "image".into()
            }
        );
    }
}
