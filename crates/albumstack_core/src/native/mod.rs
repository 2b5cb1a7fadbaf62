//! Native wire shapes of the keyed table service.
//!
//! # Responsibility
//! - Model the table's tagged attribute values and item maps.
//! - Model the put/scan/delete request and response envelopes.
//!
//! # Invariants
//! - Serialized JSON matches the table service's published wire format
//!   (`{"S": "..."}`, `TableName`, `ReturnValues`, `__type`).

pub mod attribute;
pub mod operation;

pub use attribute::{AttributeValue, NativeItem};
pub use operation::{
    DeleteItemOutput, DeleteItemRequest, NativeError, NativeRequest, NativeResponse,
    PutItemOutput, PutItemRequest, ReturnValues, ScanOutput, ScanRequest,
};
