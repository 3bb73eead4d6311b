//! OData encoding and decoding for Table service queries

use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use stirling_common::StoreError;

use crate::client::ContinuationToken;
use crate::entity::{RawEntity, RawValue};
use crate::query::RowKeyBound;

/// Response headers carrying the continuation, and the query parameter names
/// each one is echoed back as.
const CONTINUATION_HEADERS: &[(&str, &str)] = &[
    ("x-ms-continuation-NextPartitionKey", "NextPartitionKey"),
    ("x-ms-continuation-NextRowKey", "NextRowKey"),
];

/// `$filter` expression for a RowKey bound
#[must_use]
pub fn filter_expression(bound: &RowKeyBound) -> String {
    match bound {
        RowKeyBound::AtLeast(low) => format!("RowKey ge {}", string_literal(low)),
        RowKeyBound::AtMost(high) => format!("RowKey le {}", string_literal(high)),
    }
}

/// `$select` expression
#[must_use]
pub fn select_expression(columns: &[String]) -> String {
    columns.join(",")
}

fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    value: Vec<Map<String, JsonValue>>,
}

/// Decode a `application/json;odata=nometadata` query response body
pub fn decode_entities(body: &[u8]) -> Result<Vec<RawEntity>, StoreError> {
    let response: QueryResponse =
        serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))?;

    response.value.into_iter().map(decode_entity).collect()
}

fn decode_entity(mut properties: Map<String, JsonValue>) -> Result<RawEntity, StoreError> {
    let row_key = match properties.remove("RowKey") {
        Some(JsonValue::String(row_key)) => row_key,
        _ => return Err(StoreError::Decode("entity without a string RowKey".to_string())),
    };
    // Not selected by fix queries, so usually absent
    let partition_key = match properties.remove("PartitionKey") {
        Some(JsonValue::String(partition_key)) => partition_key,
        _ => String::new(),
    };

    let mut entity = RawEntity::new(partition_key, row_key);
    for (name, value) in properties {
        if name.contains("@odata.") {
            continue;
        }

        let value = match value {
            JsonValue::String(s) if name == "Timestamp" => RawValue::Timestamp(s),
            JsonValue::String(s) => RawValue::Number(s),
            JsonValue::Number(n) => RawValue::Number(n.to_string()),
            JsonValue::Bool(b) => RawValue::Number(b.to_string()),
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => continue,
        };
        entity.insert(name, value);
    }

    Ok(entity)
}

/// Continuation token from response headers, if the page was truncated
#[must_use]
pub fn continuation_from_headers(headers: &HeaderMap) -> Option<ContinuationToken> {
    let parts: Vec<(String, String)> = CONTINUATION_HEADERS
        .iter()
        .filter_map(|(header, param)| {
            headers
                .get(*header)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(|v| ((*param).to_string(), v.to_string()))
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(ContinuationToken::new(parts))
    }
}

/// Human-readable message from an error response body
#[must_use]
pub fn error_message(body: &[u8]) -> String {
    let parsed: Option<JsonValue> = serde_json::from_slice(body).ok();
    let error = parsed
        .as_ref()
        .and_then(|v| v.get("odata.error").or_else(|| v.get("error")));

    if let Some(error) = error {
        let code = error.get("code").and_then(JsonValue::as_str).unwrap_or("Unknown");
        let message = error
            .get("message")
            .and_then(|m| m.get("value").or(Some(m)))
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        return format!("{}: {}", code, message).trim_end_matches(": ").to_string();
    }

    String::from_utf8_lossy(body).trim().to_string()
}
