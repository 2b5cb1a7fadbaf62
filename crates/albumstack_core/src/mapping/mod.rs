//! Request/response templates between the public and native shapes.
//!
//! # Responsibility
//! - Rewrite validated public requests into native table requests.
//! - Rewrite native table responses into public responses.
//! - Pick the response template for a native response by status pattern.
//!
//! # Invariants
//! - Templates are pure: same input, same output, no I/O.
//! - Error templates never echo store-side error detail.
//! - Scan output order is the native order; nothing is re-sorted.

pub mod codec;
pub mod selection;
pub mod templates;

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use codec::{decode_album, decode_album_key, encode_album, encode_album_key};
pub use selection::{select_integration_response, IntegrationResponse, SelectionPattern};
pub use templates::{RenderedResponse, RequestTemplate, ResponseTemplate};

/// Fixed message of the client-input error template.
pub const BAD_INPUT_MESSAGE: &str = "Bad input";
/// Fixed message of the server-side error template.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

/// Per-request values visible to templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    /// Parsed request body, when the route accepts one.
    pub body: Option<serde_json::Value>,
    /// Percent-decoded path parameters.
    pub path_params: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn with_body(body: serde_json::Value) -> Self {
        Self {
            body: Some(body),
            path_params: BTreeMap::new(),
        }
    }

    pub fn with_path_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            body: None,
            path_params: params
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Returns a path parameter, or an empty string when absent.
    pub fn path_param(&self, name: &str) -> &str {
        self.path_params.get(name).map_or("", String::as_str)
    }
}

/// Template evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Public input does not have the shape a request template needs.
    InvalidInput(String),
    /// A native item is missing an attribute or has the wrong tag.
    InvalidNativeItem(String),
    /// A native response body does not match the operation's output shape.
    InvalidNativeBody(String),
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid template input: {message}"),
            Self::InvalidNativeItem(message) => write!(f, "invalid native item: {message}"),
            Self::InvalidNativeBody(message) => write!(f, "invalid native response: {message}"),
        }
    }
}

impl Error for MappingError {}
