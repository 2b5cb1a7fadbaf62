//! Request and response envelopes for the three table operations in use.

use crate::native::attribute::NativeItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error type reported when request input is malformed.
pub const VALIDATION_EXCEPTION: &str = "com.amazonaws.dynamodb.v20120810#ValidationException";
/// Error type reported when the table itself does not exist.
pub const RESOURCE_NOT_FOUND_EXCEPTION: &str =
    "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException";
/// Error type reported for any server-side failure.
pub const INTERNAL_SERVER_ERROR: &str = "com.amazonaws.dynamodb.v20120810#InternalServerError";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemRequest {
    pub table_name: String,
    pub item: NativeItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanRequest {
    pub table_name: String,
}

/// Which prior attributes a delete should hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnValues {
    #[default]
    None,
    AllOld,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemRequest {
    pub table_name: String,
    pub key: NativeItem,
    #[serde(default)]
    pub return_values: ReturnValues,
}

/// One native request, tagged by operation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeRequest {
    PutItem(PutItemRequest),
    Scan(ScanRequest),
    DeleteItem(DeleteItemRequest),
}

impl NativeRequest {
    /// Operation name as used in integration URIs (`PutItem`, `Scan`, ...).
    pub fn operation(&self) -> &'static str {
        match self {
            Self::PutItem(_) => "PutItem",
            Self::Scan(_) => "Scan",
            Self::DeleteItem(_) => "DeleteItem",
        }
    }

    /// Renders the request body the gateway would send to the table service.
    pub fn to_json(&self) -> Value {
        let rendered = match self {
            Self::PutItem(request) => serde_json::to_value(request),
            Self::Scan(request) => serde_json::to_value(request),
            Self::DeleteItem(request) => serde_json::to_value(request),
        };
        // Envelopes contain only strings and maps; serialization cannot fail.
        rendered.unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutItemOutput {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanOutput {
    pub items: Vec<NativeItem>,
    pub count: usize,
    pub scanned_count: usize,
}

impl ScanOutput {
    pub fn from_items(items: Vec<NativeItem>) -> Self {
        let count = items.len();
        Self {
            items,
            count,
            scanned_count: count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<NativeItem>,
}

/// Error body returned by the table service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeError {
    #[serde(rename = "__type")]
    pub kind: String,
    pub message: String,
}

/// Raw response handed from the table service to the gateway.
///
/// `status` is the status indicator that selection patterns inspect.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeResponse {
    pub status: u16,
    pub body: Value,
}

impl NativeResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, kind: &str, message: impl Into<String>) -> Self {
        let error = NativeError {
            kind: kind.to_string(),
            message: message.into(),
        };
        Self {
            status,
            body: serde_json::to_value(error).unwrap_or(Value::Null),
        }
    }
}
