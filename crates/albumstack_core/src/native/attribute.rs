//! Tagged attribute values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored item: attribute name to tagged value.
pub type NativeItem = BTreeMap<String, AttributeValue>;

/// Tagged attribute value as the table service encodes it.
///
/// Serialized externally tagged, so `S("x")` becomes `{"S": "x"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as decimal strings.
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    L(Vec<AttributeValue>),
    M(NativeItem),
}

impl AttributeValue {
    pub fn s(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::L(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&NativeItem> {
        match self {
            Self::M(map) => Some(map),
            _ => None,
        }
    }

    /// Short type descriptor used in key schema checks (`S`, `N`, ...).
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }
}
