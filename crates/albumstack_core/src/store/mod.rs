//! Keyed table contract and the local emulator behind it.
//!
//! # Responsibility
//! - Define the native put/scan/delete contract the gateway integrates with.
//! - Translate store failures into native status indicators.
//!
//! # Invariants
//! - Every stored item carries both key attributes as non-empty `S` values.
//! - `(partition key, sort key)` identifies at most one item per table.
//! - Validation faults surface as status `400`, storage faults as `500`.

mod sqlite;

use crate::db::DbError;
use crate::native::operation::{
    INTERNAL_SERVER_ERROR, RESOURCE_NOT_FOUND_EXCEPTION, VALIDATION_EXCEPTION,
};
use crate::native::{
    AttributeValue, DeleteItemOutput, DeleteItemRequest, NativeItem, NativeRequest,
    NativeResponse, PutItemOutput, PutItemRequest, ScanOutput, ScanRequest,
};
use log::{error, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use sqlite::SqliteTableStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Table name plus the two key attribute names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableKeySchema {
    pub table_name: String,
    pub partition_key: String,
    pub sort_key: String,
}

impl TableKeySchema {
    pub fn new(
        table_name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }

    /// Fails with `ResourceNotFound` unless `table_name` is this table.
    pub fn check_table(&self, table_name: &str) -> StoreResult<()> {
        if table_name != self.table_name {
            return Err(StoreError::ResourceNotFound(table_name.to_string()));
        }
        Ok(())
    }

    /// Extracts `(pk, sk)` from an item or key map.
    ///
    /// With `exact = true` the map must contain nothing but the key
    /// attributes, which is what delete requests require.
    pub fn extract_key(&self, item: &NativeItem, exact: bool) -> StoreResult<(String, String)> {
        let pk = self.key_part(item, &self.partition_key)?;
        let sk = self.key_part(item, &self.sort_key)?;
        if exact && item.len() != 2 {
            return Err(StoreError::Validation(
                "The provided key element does not match the schema".to_string(),
            ));
        }
        Ok((pk, sk))
    }

    fn key_part(&self, item: &NativeItem, name: &str) -> StoreResult<String> {
        match item.get(name) {
            Some(AttributeValue::S(value)) if !value.is_empty() => Ok(value.clone()),
            Some(AttributeValue::S(_)) => Err(StoreError::Validation(format!(
                "One or more parameter values are not valid. The AttributeValue for a key attribute cannot contain an empty string value. Key: {name}"
            ))),
            Some(other) => Err(StoreError::Validation(format!(
                "One or more parameter values were invalid: Type mismatch for key {name} expected: S actual: {}",
                other.type_descriptor()
            ))),
            None => Err(StoreError::Validation(format!(
                "One or more parameter values were invalid: Missing the key {name} in the item"
            ))),
        }
    }
}

/// Store-level failure.
#[derive(Debug)]
pub enum StoreError {
    /// Malformed request: missing or mistyped key attributes.
    Validation(String),
    /// Request names a table this store does not hold.
    ResourceNotFound(String),
    Db(DbError),
    /// A persisted item could not be decoded.
    InvalidData(String),
}

impl StoreError {
    /// Native status indicator for this failure.
    pub fn native_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::ResourceNotFound(_) => 400,
            Self::Db(_) | Self::InvalidData(_) => 500,
        }
    }

    /// Native `__type` for this failure.
    pub fn native_kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => VALIDATION_EXCEPTION,
            Self::ResourceNotFound(_) => RESOURCE_NOT_FOUND_EXCEPTION,
            Self::Db(_) | Self::InvalidData(_) => INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::ResourceNotFound(table) => {
                write!(f, "Requested resource not found: Table: {table} not found")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Native keyed-table operations.
pub trait TableStore {
    fn put_item(&self, request: &PutItemRequest) -> StoreResult<PutItemOutput>;
    fn scan(&self, request: &ScanRequest) -> StoreResult<ScanOutput>;
    fn delete_item(&self, request: &DeleteItemRequest) -> StoreResult<DeleteItemOutput>;

    /// Runs one native request and folds the outcome into a native response.
    fn execute(&self, request: &NativeRequest) -> NativeResponse {
        let outcome = match request {
            NativeRequest::PutItem(put) => self.put_item(put).and_then(to_body),
            NativeRequest::Scan(scan) => self.scan(scan).and_then(to_body),
            NativeRequest::DeleteItem(delete) => self.delete_item(delete).and_then(to_body),
        };

        match outcome {
            Ok(body) => NativeResponse::ok(body),
            Err(err) => {
                let status = err.native_status();
                if status >= 500 {
                    error!(
                        "event=store_execute module=store status=error operation={} native_status={status} error={err}",
                        request.operation()
                    );
                } else {
                    warn!(
                        "event=store_execute module=store status=rejected operation={} native_status={status} error={err}",
                        request.operation()
                    );
                }
                NativeResponse::error(status, err.native_kind(), err.to_string())
            }
        }
    }
}

fn to_body<T: Serialize>(output: T) -> StoreResult<serde_json::Value> {
    serde_json::to_value(output).map_err(|err| StoreError::InvalidData(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{StoreError, TableKeySchema};
    use crate::native::{AttributeValue, NativeItem};

    fn schema() -> TableKeySchema {
        TableKeySchema::new("AlbumTable", "artist", "album")
    }

    fn key(artist: AttributeValue, album: AttributeValue) -> NativeItem {
        let mut item = NativeItem::new();
        item.insert("artist".to_string(), artist);
        item.insert("album".to_string(), album);
        item
    }

    #[test]
    fn extracts_string_keys() {
        let item = key(AttributeValue::s("Pink Floyd"), AttributeValue::s("Animals"));
        let (pk, sk) = schema().extract_key(&item, true).unwrap();
        assert_eq!(pk, "Pink Floyd");
        assert_eq!(sk, "Animals");
    }

    #[test]
    fn rejects_mistyped_empty_or_extra_key_attributes() {
        let schema = schema();

        let mistyped = key(AttributeValue::N("1".to_string()), AttributeValue::s("x"));
        assert!(matches!(
            schema.extract_key(&mistyped, false),
            Err(StoreError::Validation(message)) if message.contains("Type mismatch")
        ));

        let empty = key(AttributeValue::s(""), AttributeValue::s("x"));
        assert!(schema.extract_key(&empty, false).is_err());

        let mut extra = key(AttributeValue::s("a"), AttributeValue::s("b"));
        extra.insert("tracks".to_string(), AttributeValue::L(Vec::new()));
        assert!(schema.extract_key(&extra, false).is_ok());
        assert!(schema.extract_key(&extra, true).is_err());
    }

    #[test]
    fn maps_errors_to_native_status() {
        assert_eq!(StoreError::Validation("x".into()).native_status(), 400);
        assert_eq!(StoreError::ResourceNotFound("t".into()).native_status(), 400);
        assert_eq!(StoreError::InvalidData("x".into()).native_status(), 500);
        assert!(schema().check_table("Other").is_err());
    }
}
