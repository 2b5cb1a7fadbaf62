//! Album <-> native item encoding.

use super::MappingError;
use crate::model::album::{Album, AlbumKey, Track};
use crate::native::{AttributeValue, NativeItem};

pub const ARTIST_ATTRIBUTE: &str = "artist";
pub const ALBUM_ATTRIBUTE: &str = "album";
pub const TRACKS_ATTRIBUTE: &str = "tracks";
pub const TRACK_TITLE_ATTRIBUTE: &str = "title";
pub const TRACK_LENGTH_ATTRIBUTE: &str = "length";

/// Encodes the key attributes only.
pub fn encode_album_key(key: &AlbumKey) -> NativeItem {
    let mut item = NativeItem::new();
    item.insert(ARTIST_ATTRIBUTE.to_string(), AttributeValue::s(&key.artist));
    item.insert(ALBUM_ATTRIBUTE.to_string(), AttributeValue::s(&key.album));
    item
}

/// Encodes a full album.
///
/// `tracks` is omitted entirely when absent or empty.
pub fn encode_album(album: &Album) -> NativeItem {
    let mut item = encode_album_key(&album.key());
    let tracks = album.track_list();
    if !tracks.is_empty() {
        let encoded = tracks.iter().map(encode_track).collect();
        item.insert(TRACKS_ATTRIBUTE.to_string(), AttributeValue::L(encoded));
    }
    item
}

fn encode_track(track: &Track) -> AttributeValue {
    let mut map = NativeItem::new();
    map.insert(
        TRACK_TITLE_ATTRIBUTE.to_string(),
        AttributeValue::s(&track.title),
    );
    map.insert(
        TRACK_LENGTH_ATTRIBUTE.to_string(),
        AttributeValue::s(&track.length),
    );
    AttributeValue::M(map)
}

pub fn decode_album_key(item: &NativeItem) -> Result<AlbumKey, MappingError> {
    Ok(AlbumKey::new(
        required_string(item, ARTIST_ATTRIBUTE)?,
        required_string(item, ALBUM_ATTRIBUTE)?,
    ))
}

/// Decodes a stored item into the public shape.
///
/// The result always carries `Some(tracks)`: an item without the attribute
/// decodes to an empty list.
pub fn decode_album(item: &NativeItem) -> Result<Album, MappingError> {
    let key = decode_album_key(item)?;
    let tracks = match item.get(TRACKS_ATTRIBUTE) {
        None => Vec::new(),
        Some(value) => {
            let entries = value.as_l().ok_or_else(|| {
                MappingError::InvalidNativeItem(format!(
                    "`{TRACKS_ATTRIBUTE}` must be L, got {}",
                    value.type_descriptor()
                ))
            })?;
            entries
                .iter()
                .enumerate()
                .map(|(index, entry)| decode_track(index, entry))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(Album {
        artist: key.artist,
        album: key.album,
        tracks: Some(tracks),
    })
}

fn decode_track(index: usize, value: &AttributeValue) -> Result<Track, MappingError> {
    let map = value.as_m().ok_or_else(|| {
        MappingError::InvalidNativeItem(format!(
            "`{TRACKS_ATTRIBUTE}[{index}]` must be M, got {}",
            value.type_descriptor()
        ))
    })?;
    Ok(Track {
        title: required_string(map, TRACK_TITLE_ATTRIBUTE)?,
        length: required_string(map, TRACK_LENGTH_ATTRIBUTE)?,
    })
}

fn required_string(item: &NativeItem, name: &str) -> Result<String, MappingError> {
    match item.get(name) {
        Some(AttributeValue::S(value)) => Ok(value.clone()),
        Some(other) => Err(MappingError::InvalidNativeItem(format!(
            "`{name}` must be S, got {}",
            other.type_descriptor()
        ))),
        None => Err(MappingError::InvalidNativeItem(format!(
            "missing attribute `{name}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_album, encode_album, TRACKS_ATTRIBUTE};
    use crate::mapping::MappingError;
    use crate::model::album::{Album, Track};
    use crate::native::{AttributeValue, NativeItem};
    use serde_json::json;

    #[test]
    fn empty_track_list_is_omitted() {
        let album = Album::new("Pink Floyd", "Animals").with_tracks(Vec::new());
        let item = encode_album(&album);
        assert!(!item.contains_key(TRACKS_ATTRIBUTE));
        assert_eq!(item.len(), 2);
    }

    #[test]
    fn tracks_are_nested_as_maps_in_order() {
        let album = Album::new("Pink Floyd", "Wish You Were Here").with_tracks(vec![
            Track::new("Shine On You Crazy Diamond (Parts I-V)", "13:38"),
            Track::new("Welcome to the Machine", "7:30"),
        ]);
        let json = serde_json::to_value(encode_album(&album)).unwrap();
        assert_eq!(
            json["tracks"]["L"][1],
            json!({"M": {"title": {"S": "Welcome to the Machine"}, "length": {"S": "7:30"}}})
        );
    }

    #[test]
    fn decode_defaults_missing_tracks_to_empty_list() {
        let item = encode_album(&Album::new("Pink Floyd", "Meddle"));
        let decoded = decode_album(&item).unwrap();
        assert_eq!(decoded.tracks, Some(Vec::new()));
    }

    #[test]
    fn decode_rejects_wrongly_tagged_attributes() {
        let mut item = NativeItem::new();
        item.insert("artist".to_string(), AttributeValue::N("1".to_string()));
        item.insert("album".to_string(), AttributeValue::s("x"));
        let err = decode_album(&item).expect_err("numeric artist should be rejected");
        assert!(matches!(
            err,
            MappingError::InvalidNativeItem(message) if message.contains("artist")
        ));
    }
}
