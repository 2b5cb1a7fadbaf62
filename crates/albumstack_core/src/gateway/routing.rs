//! Resource path matching.

use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

/// Matches a request path against a resource path template.
///
/// Returns percent-decoded `{param}` captures on a match. Query strings and
/// one trailing slash are ignored. A parameter segment may be empty; the
/// validation gate decides whether that is acceptable.
pub fn match_path(template: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let path = path.split('?').next().unwrap_or_default();
    let template_segments = segments(template);
    let path_segments = segments(path);
    if template_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (expected, actual) in template_segments.iter().zip(path_segments.iter()) {
        match expected
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(name) => {
                let decoded = percent_decode_str(actual).decode_utf8_lossy();
                params.insert(name.to_string(), decoded.into_owned());
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

fn segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = if trimmed.len() > 1 {
        trimmed.strip_suffix('/').unwrap_or(trimmed)
    } else {
        trimmed
    };
    trimmed.split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::match_path;

    #[test]
    fn matches_root_and_static_paths() {
        assert!(match_path("/", "/").unwrap().is_empty());
        assert!(match_path("/create-album", "/create-album").is_some());
        assert!(match_path("/create-album", "/create-album/").is_some());
        assert!(match_path("/create-album", "/").is_none());
        assert!(match_path("/", "/create-album").is_none());
    }

    #[test]
    fn decodes_path_parameters() {
        let params = match_path(
            "/delete-album/{artist}/{album}",
            "/delete-album/Pink%20Floyd/The%20Dark%20Side%20of%20the%20Moon?x=1",
        )
        .unwrap();
        assert_eq!(params["artist"], "Pink Floyd");
        assert_eq!(params["album"], "The Dark Side of the Moon");
    }

    #[test]
    fn keeps_empty_parameter_segments() {
        let params = match_path("/delete-album/{artist}/{album}", "/delete-album//Animals")
            .expect("empty segment should still match");
        assert_eq!(params["artist"], "");
        assert!(match_path("/delete-album/{artist}/{album}", "/delete-album/Pink").is_none());
    }
}
