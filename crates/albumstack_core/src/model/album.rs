//! Album domain model.
//!
//! # Responsibility
//! - Define the public record exposed by the album API.
//! - Provide the composite key that identifies one stored album.
//!
//! # Invariants
//! - `(artist, album)` uniquely identifies a record; the table key enforces it.
//! - Both identifiers are non-empty text.
//! - `tracks` order is caller order and is never re-sorted.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One entry of an album track list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    /// Free-form duration text, e.g. `6:23`.
    pub length: String,
}

impl Track {
    pub fn new(title: impl Into<String>, length: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            length: length.into(),
        }
    }
}

/// Public album record.
///
/// `tracks` is optional on input. The scan projection always renders it
/// (empty list when the stored item has none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Partition key.
    pub artist: String,
    /// Sort key.
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<Track>>,
}

impl Album {
    /// Creates an album without a track list.
    pub fn new(artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
            tracks: None,
        }
    }

    /// Builder-style helper that attaches a track list.
    pub fn with_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = Some(tracks);
        self
    }

    /// Returns the composite key of this album.
    pub fn key(&self) -> AlbumKey {
        AlbumKey::new(self.artist.clone(), self.album.clone())
    }

    /// Returns tracks, treating an absent list as empty.
    pub fn track_list(&self) -> &[Track] {
        self.tracks.as_deref().unwrap_or(&[])
    }

    /// Validates identifier invariants.
    ///
    /// # Errors
    /// - `EmptyArtist` when `artist` is blank.
    /// - `EmptyAlbum` when `album` is blank.
    pub fn validate(&self) -> Result<(), AlbumValidationError> {
        self.key().validate()
    }
}

/// Composite `(artist, album)` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlbumKey {
    pub artist: String,
    pub album: String,
}

impl AlbumKey {
    pub fn new(artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AlbumValidationError> {
        if self.artist.trim().is_empty() {
            return Err(AlbumValidationError::EmptyArtist);
        }
        if self.album.trim().is_empty() {
            return Err(AlbumValidationError::EmptyAlbum);
        }
        Ok(())
    }
}

impl Display for AlbumKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.artist, self.album)
    }
}

/// Identifier validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumValidationError {
    EmptyArtist,
    EmptyAlbum,
}

impl Display for AlbumValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyArtist => write!(f, "album artist must not be empty"),
            Self::EmptyAlbum => write!(f, "album title must not be empty"),
        }
    }
}

impl Error for AlbumValidationError {}

#[cfg(test)]
mod tests {
    use super::{Album, AlbumValidationError, Track};

    #[test]
    fn validate_rejects_blank_identifiers() {
        assert_eq!(
            Album::new("  ", "Animals").validate(),
            Err(AlbumValidationError::EmptyArtist)
        );
        assert_eq!(
            Album::new("Pink Floyd", "").validate(),
            Err(AlbumValidationError::EmptyAlbum)
        );
        assert!(Album::new("Pink Floyd", "Animals").validate().is_ok());
    }

    #[test]
    fn absent_tracks_are_not_serialized() {
        let json = serde_json::to_value(Album::new("Pink Floyd", "Animals")).unwrap();
        assert!(json.get("tracks").is_none());

        let with_tracks = Album::new("Pink Floyd", "Animals")
            .with_tracks(vec![Track::new("Dogs", "17:04")]);
        let json = serde_json::to_value(with_tracks).unwrap();
        assert_eq!(json["tracks"][0]["title"], "Dogs");
    }

    #[test]
    fn track_list_defaults_to_empty() {
        let album = Album::new("Pink Floyd", "Meddle");
        assert!(album.track_list().is_empty());
        assert_eq!(album.key().to_string(), "Pink Floyd/Meddle");
    }
}
