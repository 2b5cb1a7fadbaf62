//! Integration response selection by native status pattern.
//!
//! A route declares its success response first (no pattern, the default)
//! followed by the shared error responses. The first patterned entry whose
//! pattern fully matches the native status wins; otherwise the default does.

use super::templates::ResponseTemplate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pattern of the client-input error template.
pub const CLIENT_ERROR_PATTERN: &str = "400";
/// Pattern of the server-side error template.
pub const SERVER_ERROR_PATTERN: &str = r"5\d{2}";

static SERVER_ERROR_RE: Lazy<SelectionPattern> = Lazy::new(|| {
    SelectionPattern::new(SERVER_ERROR_PATTERN).expect("valid server error pattern")
});

/// Status-matching rule, anchored at both ends.
#[derive(Debug, Clone)]
pub struct SelectionPattern {
    raw: String,
    compiled: Regex,
}

impl SelectionPattern {
    pub fn new(raw: &str) -> Result<Self, regex::Error> {
        let compiled = Regex::new(&format!("^(?:{raw})$"))?;
        Ok(Self {
            raw: raw.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    pub fn matches(&self, status: u16) -> bool {
        self.compiled.is_match(&status.to_string())
    }
}

impl PartialEq for SelectionPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for SelectionPattern {}

impl Serialize for SelectionPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for SelectionPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(D::Error::custom)
    }
}

/// One declared integration response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponse {
    /// `None` marks the default response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_pattern: Option<SelectionPattern>,
    pub status_code: u16,
    pub template: ResponseTemplate,
}

impl IntegrationResponse {
    pub fn success(status_code: u16, template: ResponseTemplate) -> Self {
        Self {
            selection_pattern: None,
            status_code,
            template,
        }
    }

    /// `400` literal -> fixed "bad input" body.
    pub fn bad_input() -> Self {
        Self {
            selection_pattern: SelectionPattern::new(CLIENT_ERROR_PATTERN).ok(),
            status_code: 400,
            template: ResponseTemplate::BadInput,
        }
    }

    /// Any `5xx` -> fixed "internal error" body.
    pub fn internal_error() -> Self {
        Self {
            selection_pattern: Some(SERVER_ERROR_RE.clone()),
            status_code: 500,
            template: ResponseTemplate::InternalError,
        }
    }

    /// Success response followed by both shared error responses.
    pub fn route_set(status_code: u16, template: ResponseTemplate) -> Vec<Self> {
        vec![
            Self::success(status_code, template),
            Self::bad_input(),
            Self::internal_error(),
        ]
    }

    pub fn is_default(&self) -> bool {
        self.selection_pattern.is_none()
    }
}

/// Picks the integration response for a native status.
pub fn select_integration_response(
    responses: &[IntegrationResponse],
    native_status: u16,
) -> Option<&IntegrationResponse> {
    responses
        .iter()
        .find(|response| {
            response
                .selection_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.matches(native_status))
        })
        .or_else(|| responses.iter().find(|response| response.is_default()))
}

#[cfg(test)]
mod tests {
    use super::{select_integration_response, IntegrationResponse, SelectionPattern};
    use crate::mapping::ResponseTemplate;

    #[test]
    fn patterns_are_anchored() {
        let pattern = SelectionPattern::new("400").unwrap();
        assert!(pattern.matches(400));
        assert!(!pattern.matches(4000));

        let server = SelectionPattern::new(r"5\d{2}").unwrap();
        assert!(server.matches(500));
        assert!(server.matches(503));
        assert!(!server.matches(404));
    }

    #[test]
    fn selects_by_status_and_falls_back_to_default() {
        let responses = IntegrationResponse::route_set(200, ResponseTemplate::ScanAlbums);

        let chosen = select_integration_response(&responses, 200).unwrap();
        assert_eq!(chosen.template, ResponseTemplate::ScanAlbums);

        let chosen = select_integration_response(&responses, 400).unwrap();
        assert_eq!(chosen.template, ResponseTemplate::BadInput);

        let chosen = select_integration_response(&responses, 502).unwrap();
        assert_eq!(chosen.template, ResponseTemplate::InternalError);

        // Unmatched client errors other than 400 go to the default entry.
        let chosen = select_integration_response(&responses, 413).unwrap();
        assert_eq!(chosen.template, ResponseTemplate::ScanAlbums);
    }

    #[test]
    fn pattern_serializes_as_raw_string() {
        let json = serde_json::to_value(IntegrationResponse::internal_error()).unwrap();
        assert_eq!(json["selectionPattern"], r"5\d{2}");
        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["template"], "internal_error");

        let back: IntegrationResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, IntegrationResponse::internal_error());
    }
}
