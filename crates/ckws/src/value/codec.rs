//! Field value wire codec.
//!
//! On the wire a field value is `{"value": <json>, "type": <tag>?}`.
//! Decoding follows the tag when one is present. Without a tag the shape
//! is sniffed in a fixed order: string, integer, asset object, asset list,
//! reference object, reference list. The first shape that parses wins.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::asset::{Asset, AssetDescriptor};
use super::reference::{Reference, ReferenceWire};
use super::FieldValue;
use crate::error::{DecodeError, EncodeError};

/// Type tags understood by the codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    String,
    Int64,
    Double,
    Bytes,
    Timestamp,
    Reference,
    Asset,
    AssetId,
    StringList,
    BytesList,
    ReferenceList,
    AssetList,
    AssetIdList,
}

impl WireType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::String => "STRING",
            WireType::Int64 => "INT64",
            WireType::Double => "DOUBLE",
            WireType::Bytes => "BYTES",
            WireType::Timestamp => "TIMESTAMP",
            WireType::Reference => "REFERENCE",
            WireType::Asset => "ASSET",
            WireType::AssetId => "ASSETID",
            WireType::StringList => "STRING_LIST",
            WireType::BytesList => "BYTES_LIST",
            WireType::ReferenceList => "REFERENCE_LIST",
            WireType::AssetList => "ASSET_LIST",
            WireType::AssetIdList => "ASSETID_LIST",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s {
            "STRING" => WireType::String,
            "INT64" => WireType::Int64,
            "DOUBLE" => WireType::Double,
            "BYTES" => WireType::Bytes,
            "TIMESTAMP" => WireType::Timestamp,
            "REFERENCE" => WireType::Reference,
            "ASSET" => WireType::Asset,
            "ASSETID" => WireType::AssetId,
            "STRING_LIST" => WireType::StringList,
            "BYTES_LIST" => WireType::BytesList,
            "REFERENCE_LIST" => WireType::ReferenceList,
            "ASSET_LIST" => WireType::AssetList,
            "ASSETID_LIST" => WireType::AssetIdList,
            other => return Err(DecodeError::shape("a known type tag", other)),
        };
        Ok(tag)
    }
}

/// A field value as it appears on the wire.
///
/// The tag is kept as a string so unknown tags reach [`decode`] and fail
/// there rather than failing the surrounding document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireField {
    pub value: Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
}

impl WireField {
    pub fn new(value: Value, tag: Option<WireType>) -> Self {
        Self {
            value,
            type_tag: tag.map(|t| t.as_str().to_string()),
        }
    }
}

/// Decode a wire field into a [`FieldValue`].
pub fn decode_field(field: &WireField) -> Result<FieldValue, DecodeError> {
    let tag = field
        .type_tag
        .as_deref()
        .map(WireType::from_str)
        .transpose()?;
    decode(tag, &field.value)
}

/// Decode a raw JSON value, directed by `tag` when present.
pub fn decode(tag: Option<WireType>, raw: &Value) -> Result<FieldValue, DecodeError> {
    match tag {
        Some(tag) => decode_tagged(tag, raw),
        None => sniff(raw),
    }
}

fn decode_tagged(tag: WireType, raw: &Value) -> Result<FieldValue, DecodeError> {
    let value = match tag {
        WireType::String => FieldValue::String(string(raw, tag)?),
        WireType::Int64 => FieldValue::Integer(integer(raw, tag)?),
        WireType::Double => FieldValue::Double(
            raw.as_f64()
                .ok_or_else(|| DecodeError::shape(tag.as_str(), raw))?,
        ),
        WireType::Bytes => FieldValue::Bytes(bytes(raw, tag)?),
        WireType::Timestamp => FieldValue::DateTime(integer(raw, tag)?),
        WireType::Reference => FieldValue::Reference(reference(raw, tag)?),
        WireType::Asset | WireType::AssetId => FieldValue::Asset(asset(raw, tag)?),
        WireType::StringList => FieldValue::StringList(
            list(raw, tag)?
                .iter()
                .map(|item| string(item, tag))
                .collect::<Result<_, _>>()?,
        ),
        WireType::BytesList => FieldValue::BytesList(
            list(raw, tag)?
                .iter()
                .map(|item| bytes(item, tag))
                .collect::<Result<_, _>>()?,
        ),
        WireType::ReferenceList => FieldValue::ReferenceList(
            list(raw, tag)?
                .iter()
                .map(|item| reference(item, tag))
                .collect::<Result<_, _>>()?,
        ),
        WireType::AssetList | WireType::AssetIdList => FieldValue::AssetList(
            list(raw, tag)?
                .iter()
                .map(|item| asset(item, tag))
                .collect::<Result<_, _>>()?,
        ),
    };
    Ok(value)
}

fn sniff(raw: &Value) -> Result<FieldValue, DecodeError> {
    if let Some(s) = raw.as_str() {
        return Ok(FieldValue::String(s.to_string()));
    }
    if let Some(n) = raw.as_i64() {
        return Ok(FieldValue::Integer(n));
    }
    if let Some(descriptor) = object::<AssetDescriptor>(raw) {
        return Ok(FieldValue::Asset(Asset::Remote(descriptor)));
    }
    if let Some(descriptors) = objects::<AssetDescriptor>(raw) {
        return Ok(FieldValue::AssetList(
            descriptors.into_iter().map(Asset::Remote).collect(),
        ));
    }
    if let Some(wire) = object::<ReferenceWire>(raw) {
        return Ok(FieldValue::Reference(wire.into()));
    }
    if let Some(wires) = objects::<ReferenceWire>(raw) {
        return Ok(FieldValue::ReferenceList(
            wires.into_iter().map(Reference::from).collect(),
        ));
    }
    Err(DecodeError::shape("an untagged field value", raw))
}

/// Parse a JSON object as `T`. Arrays are refused even though derived
/// structs would accept them positionally.
fn object<T: DeserializeOwned>(raw: &Value) -> Option<T> {
    if raw.is_object() {
        T::deserialize(raw).ok()
    } else {
        None
    }
}

fn objects<T: DeserializeOwned>(raw: &Value) -> Option<Vec<T>> {
    raw.as_array()?.iter().map(object).collect()
}

fn string(raw: &Value, tag: WireType) -> Result<String, DecodeError> {
    raw.as_str()
        .map(str::to_string)
        .ok_or_else(|| DecodeError::shape(tag.as_str(), raw))
}

fn integer(raw: &Value, tag: WireType) -> Result<i64, DecodeError> {
    raw.as_i64()
        .ok_or_else(|| DecodeError::shape(tag.as_str(), raw))
}

fn bytes(raw: &Value, tag: WireType) -> Result<Vec<u8>, DecodeError> {
    let encoded = raw
        .as_str()
        .ok_or_else(|| DecodeError::shape(tag.as_str(), raw))?;
    Ok(BASE64.decode(encoded)?)
}

fn list(raw: &Value, tag: WireType) -> Result<&Vec<Value>, DecodeError> {
    raw.as_array()
        .ok_or_else(|| DecodeError::shape(tag.as_str(), raw))
}

fn reference(raw: &Value, tag: WireType) -> Result<Reference, DecodeError> {
    object::<ReferenceWire>(raw)
        .map(Reference::from)
        .ok_or_else(|| DecodeError::shape(tag.as_str(), raw))
}

fn asset(raw: &Value, tag: WireType) -> Result<Asset, DecodeError> {
    object::<AssetDescriptor>(raw)
        .map(Asset::Remote)
        .ok_or_else(|| DecodeError::shape(tag.as_str(), raw))
}

/// Encode a field value for the wire.
///
/// Strings and integers go untagged since sniffing recovers them; every
/// other variant carries its tag. `field` names the value in errors.
///
/// # Errors
///
/// Fails for a [`Asset::Local`] value, which must be uploaded first, and
/// for non-finite doubles, which JSON cannot carry.
pub fn encode(field: &str, value: &FieldValue) -> Result<WireField, EncodeError> {
    let (raw, tag) = match value {
        FieldValue::String(s) => (Value::String(s.clone()), None),
        FieldValue::Integer(n) => (Value::from(*n), None),
        FieldValue::Double(d) => {
            let number = serde_json::Number::from_f64(*d).ok_or_else(|| {
                EncodeError::Json(format!("field '{}' holds a non-finite double", field))
            })?;
            (Value::Number(number), Some(WireType::Double))
        }
        FieldValue::Bytes(b) => (Value::String(BASE64.encode(b)), Some(WireType::Bytes)),
        FieldValue::DateTime(ms) => (Value::from(*ms), Some(WireType::Timestamp)),
        FieldValue::Reference(r) => (
            serde_json::to_value(ReferenceWire::from(r))?,
            Some(WireType::Reference),
        ),
        FieldValue::Asset(a) => (encode_asset(field, a)?, Some(WireType::AssetId)),
        FieldValue::StringList(items) => (
            Value::Array(items.iter().cloned().map(Value::String).collect()),
            Some(WireType::StringList),
        ),
        FieldValue::BytesList(items) => (
            Value::Array(
                items
                    .iter()
                    .map(|b| Value::String(BASE64.encode(b)))
                    .collect(),
            ),
            Some(WireType::BytesList),
        ),
        FieldValue::ReferenceList(items) => (
            Value::Array(
                items
                    .iter()
                    .map(|r| serde_json::to_value(ReferenceWire::from(r)))
                    .collect::<Result<_, _>>()?,
            ),
            Some(WireType::ReferenceList),
        ),
        FieldValue::AssetList(items) => (
            Value::Array(
                items
                    .iter()
                    .map(|a| encode_asset(field, a))
                    .collect::<Result<_, _>>()?,
            ),
            Some(WireType::AssetIdList),
        ),
    };
    Ok(WireField::new(raw, tag))
}

fn encode_asset(field: &str, asset: &Asset) -> Result<Value, EncodeError> {
    match asset {
        Asset::Remote(descriptor) => Ok(serde_json::to_value(descriptor)?),
        Asset::Local(_) => Err(EncodeError::UnuploadedAsset {
            field: field.to_string(),
        }),
    }
}
