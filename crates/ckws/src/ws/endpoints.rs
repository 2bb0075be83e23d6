//! Web service operations and their request/response bodies.

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::query::{Comparator, Filter, Query, SortDescriptor};
use crate::record::RecordWire;
use crate::types::ZoneId;
use crate::value::AssetDescriptor;
use crate::value::codec::{self, WireField};

// Database operations, appended to `/database/1/{container}/{env}/{scope}/`.
pub const RECORDS_MODIFY: &str = "records/modify";
pub const RECORDS_LOOKUP: &str = "records/lookup";
pub const RECORDS_QUERY: &str = "records/query";
pub const ASSETS_UPLOAD: &str = "assets/upload";

/// Multipart form field carrying the uploaded file.
pub const UPLOAD_FIELD_NAME: &str = "file";

// ============================================================================
// records/modify
// ============================================================================

/// How a modify operation treats the server's copy of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationType {
    Create,
    Update,
    ForceUpdate,
    Replace,
    ForceReplace,
    Delete,
    ForceDelete,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOperation {
    pub operation_type: OperationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_keys: Option<Vec<String>>,
    pub record: RecordWire,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    pub operations: Vec<RecordOperation>,
    #[serde(rename = "zoneID", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
}

/// Response shared by modify and lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<RecordWire>,
}

// ============================================================================
// records/lookup
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordLookup {
    pub record_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub records: Vec<RecordLookup>,
    #[serde(rename = "zoneID", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
}

// ============================================================================
// records/query
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterWire {
    pub comparator: Comparator,
    pub field_name: String,
    pub field_value: WireField,
}

impl FilterWire {
    pub fn from_filter(filter: &Filter) -> Result<Self, EncodeError> {
        Ok(Self {
            comparator: filter.comparator,
            field_name: filter.field_name.clone(),
            field_value: codec::encode(&filter.field_name, &filter.value)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortWire {
    pub field_name: String,
    pub ascending: bool,
}

impl From<&SortDescriptor> for SortWire {
    fn from(sort: &SortDescriptor) -> Self {
        Self {
            field_name: sort.field_name.clone(),
            ascending: sort.ascending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryWire {
    pub record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<Vec<FilterWire>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<Vec<SortWire>>,
}

impl QueryWire {
    pub fn from_query(query: &Query) -> Result<Self, EncodeError> {
        let filters = query
            .filters
            .iter()
            .map(FilterWire::from_filter)
            .collect::<Result<Vec<_>, _>>()?;
        let sorts: Vec<SortWire> = query.sort.iter().map(SortWire::from).collect();

        Ok(Self {
            record_type: query.record_type.clone(),
            filter_by: (!filters.is_empty()).then_some(filters),
            sort_by: (!sorts.is_empty()).then_some(sorts),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(rename = "zoneID", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_marker: Option<String>,
    pub query: QueryWire,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub records: Vec<RecordWire>,
    #[serde(default)]
    pub continuation_marker: Option<String>,
}

// ============================================================================
// assets/upload
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTokenEntry {
    pub record_name: String,
    pub record_type: String,
    pub field_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTokenRequest {
    pub tokens: Vec<AssetTokenEntry>,
    #[serde(rename = "zoneID", skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
}

/// A one-time upload URL for one asset of one field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUploadToken {
    pub record_name: String,
    pub field_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetTokenResponse {
    #[serde(default)]
    pub tokens: Vec<AssetUploadToken>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUploadResponse {
    pub single_file: AssetDescriptor,
}

// ============================================================================
// Errors
// ============================================================================

/// Error envelope returned in place of a response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub uuid: Option<String>,
    pub server_error_code: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile;
    use serde_json::json;

    #[test]
    fn operation_types_are_camel_case() {
        assert_eq!(serde_json::to_value(OperationType::ForceDelete).unwrap(), "forceDelete");
        assert_eq!(serde_json::to_value(OperationType::Create).unwrap(), "create");
    }

    #[test]
    fn query_body_shape() {
        let query = Query::with_filters("Users", compile("favoriteColor IN {'red','green'}").unwrap())
            .sorted_by("lastName", false);
        let body = QueryRequest {
            zone_id: None,
            results_limit: Some(10),
            continuation_marker: None,
            query: QueryWire::from_query(&query).unwrap(),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "resultsLimit": 10,
                "query": {
                    "recordType": "Users",
                    "filterBy": [{
                        "comparator": "IN",
                        "fieldName": "favoriteColor",
                        "fieldValue": {"value": ["red", "green"], "type": "STRING_LIST"}
                    }],
                    "sortBy": [{"fieldName": "lastName", "ascending": false}]
                }
            })
        );
    }

    #[test]
    fn match_all_query_omits_filters() {
        let query = Query::with_filters("Users", vec![]);
        let wire = serde_json::to_value(QueryWire::from_query(&query).unwrap()).unwrap();
        assert_eq!(wire, json!({"recordType": "Users"}));
    }

    #[test]
    fn error_envelope_tolerates_missing_uuid() {
        let envelope: ErrorEnvelope =
            serde_json::from_value(json!({"serverErrorCode": "BAD_REQUEST", "reason": "x"})).unwrap();
        assert_eq!(envelope.server_error_code, "BAD_REQUEST");
        assert_eq!(envelope.uuid, None);
    }
}
