//! Typed album use-cases over the public gateway contract.
//!
//! # Responsibility
//! - Build public requests (JSON bodies, percent-encoded paths).
//! - Translate public responses back into typed results and errors.
//!
//! # Invariants
//! - Every call goes through `Gateway::handle`; the table is never
//!   touched directly, so the validation gate and templates always apply.

use crate::gateway::telemetry::TelemetrySink;
use crate::gateway::{Gateway, GatewayRequest, GatewayResponse, REQUEST_ID_HEADER};
use crate::model::album::{Album, AlbumKey, AlbumValidationError};
use crate::store::TableStore;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Characters escaped inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumServiceError {
    /// Rejected locally; no request was sent.
    InvalidAlbum(AlbumValidationError),
    /// Gateway rejected the input (`400`).
    BadInput(String),
    /// Delete target does not exist (`404`).
    NotFound(String),
    /// Server-side failure (`5xx`).
    Internal(String),
    UnexpectedStatus(u16),
    /// Response body does not match the public shape.
    Decode(String),
}

impl Display for AlbumServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAlbum(err) => write!(f, "invalid album: {err}"),
            Self::BadInput(message) => write!(f, "bad input: {message}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
            Self::UnexpectedStatus(status) => write!(f, "unexpected response status {status}"),
            Self::Decode(message) => write!(f, "invalid response body: {message}"),
        }
    }
}

impl Error for AlbumServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAlbum(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AlbumValidationError> for AlbumServiceError {
    fn from(value: AlbumValidationError) -> Self {
        Self::InvalidAlbum(value)
    }
}

pub type AlbumServiceResult<T> = Result<T, AlbumServiceError>;

/// Album use-cases driven through a gateway.
pub struct AlbumService<S: TableStore, T: TelemetrySink> {
    gateway: Gateway<S, T>,
}

impl<S: TableStore, T: TelemetrySink> AlbumService<S, T> {
    pub fn new(gateway: Gateway<S, T>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway<S, T> {
        &self.gateway
    }

    /// Stores one album; returns the gateway request id.
    ///
    /// Blank identifiers are rejected before any request is sent.
    pub fn create_album(&self, album: &Album) -> AlbumServiceResult<String> {
        album.validate()?;
        let body = serde_json::to_string(album)
            .map_err(|err| AlbumServiceError::Decode(err.to_string()))?;
        let response = self
            .gateway
            .handle(&GatewayRequest::new("POST", "/create-album").with_body(body));
        expect_status(&response, 204)?;
        Ok(response
            .header(REQUEST_ID_HEADER)
            .unwrap_or_default()
            .to_string())
    }

    /// Lists every album in table order.
    pub fn list_albums(&self) -> AlbumServiceResult<Vec<Album>> {
        let response = self.gateway.handle(&GatewayRequest::new("GET", "/"));
        expect_status(&response, 200)?;
        let body = response.body.unwrap_or(Value::Array(Vec::new()));
        serde_json::from_value(body).map_err(|err| AlbumServiceError::Decode(err.to_string()))
    }

    /// Deletes one album; returns the key of the removed record.
    pub fn delete_album(&self, artist: &str, album: &str) -> AlbumServiceResult<AlbumKey> {
        AlbumKey::new(artist, album).validate()?;
        let path = album_path(artist, album);
        let response = self.gateway.handle(&GatewayRequest::new("DELETE", path));
        expect_status(&response, 200)?;
        let body = response
            .body
            .ok_or_else(|| AlbumServiceError::Decode("missing body".to_string()))?;
        serde_json::from_value(body).map_err(|err| AlbumServiceError::Decode(err.to_string()))
    }
}

/// Delete route path with both identifiers percent-encoded.
pub fn album_path(artist: &str, album: &str) -> String {
    format!(
        "/delete-album/{}/{}",
        utf8_percent_encode(artist, PATH_SEGMENT),
        utf8_percent_encode(album, PATH_SEGMENT)
    )
}

fn expect_status(response: &GatewayResponse, expected: u16) -> AlbumServiceResult<()> {
    if response.status == expected {
        return Ok(());
    }
    let message = response
        .body
        .as_ref()
        .and_then(|body| body.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(match response.status {
        400 => AlbumServiceError::BadInput(message),
        404 => AlbumServiceError::NotFound(message),
        500..=599 => AlbumServiceError::Internal(message),
        other => AlbumServiceError::UnexpectedStatus(other),
    })
}

#[cfg(test)]
mod tests {
    use super::album_path;
    use crate::gateway::match_path;

    #[test]
    fn album_path_round_trips_through_route_matching() {
        let path = album_path("AC/DC", "Back in Black?");
        assert_eq!(path, "/delete-album/AC%2FDC/Back%20in%20Black%3F");

        let params = match_path("/delete-album/{artist}/{album}", &path)
            .expect("encoded path should match the delete route");
        assert_eq!(params["artist"], "AC/DC");
        assert_eq!(params["album"], "Back in Black?");
    }
}
