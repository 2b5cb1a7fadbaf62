//! Route templates.
//!
//! Each route owns one request template and one success response template.
//! The two error templates are shared by every route.

use super::codec::{decode_album, decode_album_key, encode_album, encode_album_key};
use super::{MappingError, TemplateContext, BAD_INPUT_MESSAGE, INTERNAL_ERROR_MESSAGE};
use crate::model::album::{Album, AlbumKey};
use crate::native::{
    DeleteItemOutput, DeleteItemRequest, NativeRequest, NativeResponse, PutItemRequest,
    ReturnValues, ScanOutput, ScanRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const ARTIST_PARAM: &str = "artist";
pub const ALBUM_PARAM: &str = "album";
pub const NOT_FOUND_STATUS: u16 = 404;

/// Public -> native rewrite, one per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestTemplate {
    PutAlbum,
    ScanAlbums,
    DeleteAlbum,
}

impl RequestTemplate {
    /// Renders the native request for `table_name`.
    ///
    /// # Errors
    /// - `InvalidInput` when the body or path parameters do not have the
    ///   shape the template reads. The validation gate runs first, so this
    ///   only fires when a template is driven directly.
    pub fn render(
        &self,
        table_name: &str,
        ctx: &TemplateContext,
    ) -> Result<NativeRequest, MappingError> {
        match self {
            Self::PutAlbum => {
                let body = ctx
                    .body
                    .clone()
                    .ok_or_else(|| MappingError::InvalidInput("missing request body".to_string()))?;
                let album: Album = serde_json::from_value(body)
                    .map_err(|err| MappingError::InvalidInput(err.to_string()))?;
                Ok(NativeRequest::PutItem(PutItemRequest {
                    table_name: table_name.to_string(),
                    item: encode_album(&album),
                }))
            }
            Self::ScanAlbums => Ok(NativeRequest::Scan(ScanRequest {
                table_name: table_name.to_string(),
            })),
            Self::DeleteAlbum => {
                let key = AlbumKey::new(ctx.path_param(ARTIST_PARAM), ctx.path_param(ALBUM_PARAM));
                Ok(NativeRequest::DeleteItem(DeleteItemRequest {
                    table_name: table_name.to_string(),
                    key: encode_album_key(&key),
                    return_values: ReturnValues::AllOld,
                }))
            }
        }
    }
}

/// Native -> public rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTemplate {
    /// Empty body.
    PutAlbum,
    ScanAlbums,
    DeleteAlbum,
    BadInput,
    InternalError,
}

/// Output of a response template.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResponse {
    /// Replaces the integration response status when set.
    pub status_override: Option<u16>,
    pub body: Option<Value>,
}

impl RenderedResponse {
    fn body(body: Value) -> Self {
        Self {
            status_override: None,
            body: Some(body),
        }
    }
}

impl ResponseTemplate {
    pub fn render(
        &self,
        native: &NativeResponse,
        ctx: &TemplateContext,
    ) -> Result<RenderedResponse, MappingError> {
        match self {
            Self::PutAlbum => Ok(RenderedResponse {
                status_override: None,
                body: None,
            }),
            Self::ScanAlbums => {
                let output: ScanOutput = decode_body(native)?;
                let albums = output
                    .items
                    .iter()
                    .map(decode_album)
                    .collect::<Result<Vec<_>, _>>()?;
                let rendered = albums
                    .into_iter()
                    .map(|album| {
                        json!({
                            "artist": album.artist,
                            "album": album.album,
                            "tracks": album.tracks.unwrap_or_default(),
                        })
                    })
                    .collect();
                Ok(RenderedResponse::body(Value::Array(rendered)))
            }
            Self::DeleteAlbum => {
                let output: DeleteItemOutput = decode_body(native)?;
                match output.attributes {
                    Some(previous) => {
                        let key = decode_album_key(&previous)?;
                        Ok(RenderedResponse::body(json!({
                            "artist": key.artist,
                            "album": key.album,
                        })))
                    }
                    None => Ok(RenderedResponse {
                        status_override: Some(NOT_FOUND_STATUS),
                        body: Some(not_found_body(
                            ctx.path_param(ARTIST_PARAM),
                            ctx.path_param(ALBUM_PARAM),
                        )),
                    }),
                }
            }
            Self::BadInput => Ok(RenderedResponse::body(json!({ "message": BAD_INPUT_MESSAGE }))),
            Self::InternalError => Ok(RenderedResponse::body(
                json!({ "message": INTERNAL_ERROR_MESSAGE }),
            )),
        }
    }
}

/// Body returned when a delete finds no prior item.
pub fn not_found_body(artist: &str, album: &str) -> Value {
    json!({
        "error": "Not Found",
        "message": format!("Album '{album}' by '{artist}' was not found"),
    })
}

fn decode_body<T: for<'de> Deserialize<'de>>(native: &NativeResponse) -> Result<T, MappingError> {
    serde_json::from_value(native.body.clone())
        .map_err(|err| MappingError::InvalidNativeBody(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{RequestTemplate, ResponseTemplate};
    use crate::mapping::{MappingError, TemplateContext};
    use crate::native::{NativeRequest, NativeResponse, ReturnValues};
    use serde_json::json;

    fn delete_ctx() -> TemplateContext {
        TemplateContext::with_path_params([("artist", "Pink Floyd"), ("album", "Animals")])
    }

    #[test]
    fn put_template_embeds_fields_and_omits_missing_tracks() {
        let ctx = TemplateContext::with_body(json!({"artist": "Pink Floyd", "album": "Animals"}));
        let request = RequestTemplate::PutAlbum.render("AlbumTable", &ctx).unwrap();
        assert_eq!(
            request.to_json(),
            json!({
                "TableName": "AlbumTable",
                "Item": {"artist": {"S": "Pink Floyd"}, "album": {"S": "Animals"}}
            })
        );
    }

    #[test]
    fn put_template_requires_a_body() {
        let err = RequestTemplate::PutAlbum
            .render("AlbumTable", &TemplateContext::default())
            .unwrap_err();
        assert!(matches!(err, MappingError::InvalidInput(_)));
    }

    #[test]
    fn delete_template_asks_for_prior_value() {
        let request = RequestTemplate::DeleteAlbum
            .render("AlbumTable", &delete_ctx())
            .unwrap();
        match request {
            NativeRequest::DeleteItem(delete) => {
                assert_eq!(delete.return_values, ReturnValues::AllOld);
                assert_eq!(delete.key.len(), 2);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn scan_template_renders_empty_tracks_and_keeps_order() {
        let native = NativeResponse::ok(json!({
            "Items": [
                {"artist": {"S": "B"}, "album": {"S": "Second"}},
                {"artist": {"S": "A"}, "album": {"S": "First"},
                 "tracks": {"L": [{"M": {"title": {"S": "t"}, "length": {"S": "1:00"}}}]}}
            ],
            "Count": 2,
            "ScannedCount": 2
        }));
        let rendered = ResponseTemplate::ScanAlbums
            .render(&native, &TemplateContext::default())
            .unwrap();
        assert_eq!(
            rendered.body,
            Some(json!([
                {"artist": "B", "album": "Second", "tracks": []},
                {"artist": "A", "album": "First", "tracks": [{"title": "t", "length": "1:00"}]}
            ]))
        );
    }

    #[test]
    fn delete_template_overrides_status_when_nothing_was_deleted() {
        let native = NativeResponse::ok(json!({}));
        let rendered = ResponseTemplate::DeleteAlbum
            .render(&native, &delete_ctx())
            .unwrap();
        assert_eq!(rendered.status_override, Some(404));
        let body = rendered.body.unwrap();
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Album 'Animals' by 'Pink Floyd' was not found");
    }

    #[test]
    fn delete_template_maps_prior_value_to_key() {
        let native = NativeResponse::ok(json!({
            "Attributes": {"artist": {"S": "Pink Floyd"}, "album": {"S": "Animals"},
                           "tracks": {"L": []}}
        }));
        let rendered = ResponseTemplate::DeleteAlbum
            .render(&native, &delete_ctx())
            .unwrap();
        assert_eq!(rendered.status_override, None);
        assert_eq!(
            rendered.body,
            Some(json!({"artist": "Pink Floyd", "album": "Animals"}))
        );
    }

    #[test]
    fn error_templates_hide_native_detail() {
        let native = NativeResponse::error(400, "ValidationException", "secret detail");
        let rendered = ResponseTemplate::BadInput
            .render(&native, &TemplateContext::default())
            .unwrap();
        assert_eq!(rendered.body, Some(json!({"message": "Bad input"})));
        assert!(!rendered.body.unwrap().to_string().contains("secret"));
    }
}
