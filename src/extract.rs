//! Text Extraction
//!
//! Pulls a field out of a nested JSON response using dotted-path notation
//! (`data.articles.0.title`).

use serde_json::Value;

/// Return the value at `path`, or `default` when any segment misses.
///
/// The walk starts only from a mapping; an empty path or a non-mapping
/// document yields `default`. The found value is returned unconverted.
pub fn extract<'a>(document: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    lookup(document, path).unwrap_or(default)
}

/// Walk `path` through `document`, returning `None` on the first miss.
///
/// Each segment is a key lookup into the current mapping. A segment made only
/// of ASCII digits may also index into a sequence.
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() || !document.is_object() {
        return None;
    }

    path.split('.').try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    })
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Depth-first search for the first occurrence of `key` in nested mappings.
pub fn find_key<'a>(document: &'a Value, key: &str) -> Option<&'a Value> {
    match document {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// Coerce an extracted value into speakable text.
///
/// Strings pass through, numbers and booleans are formatted, and sequences
/// join their scalar items with a space. Null and mappings have no text.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|v| !v.is_array())
                .filter_map(text_of)
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_leaf_is_returned() {
        let doc = json!({"data": {"content": "Hello world"}});
        let default = json!("");
        assert_eq!(extract(&doc, "data.content", &default), &json!("Hello world"));
    }

    #[test]
    fn test_missing_segment_returns_default() {
        let doc = json!({"data": {}});
        let default = json!("");
        assert_eq!(extract(&doc, "data.content", &default), &default);
    }

    #[test]
    fn test_scalar_intermediate_returns_default() {
        let doc = json!({"data": "not a map"});
        let default = json!("fallback");
        assert_eq!(extract(&doc, "data.content", &default), &default);
    }

    #[test]
    fn test_empty_path_and_non_mapping_document() {
        let default = json!(null);
        assert_eq!(extract(&json!({"a": 1}), "", &default), &default);
        assert_eq!(extract(&json!("text"), "a", &default), &default);
        assert_eq!(extract(&json!([{"a": 1}]), "0.a", &default), &default);
    }

    #[test]
    fn test_leaf_is_not_converted() {
        let doc = json!({"stats": {"count": 42, "tags": ["a", "b"]}});
        let default = json!(null);
        assert_eq!(extract(&doc, "stats.count", &default), &json!(42));
        assert_eq!(extract(&doc, "stats.tags", &default), &json!(["a", "b"]));
    }

    #[test]
    fn test_numeric_segment_indexes_sequences() {
        let doc = json!({"data": [{"title": "First"}, {"title": "Second"}]});
        assert_eq!(lookup(&doc, "data.1.title"), Some(&json!("Second")));
        assert_eq!(lookup(&doc, "data.2.title"), None);
        assert_eq!(lookup(&doc, "data.first.title"), None);
        assert_eq!(lookup(&doc, "data.-1.title"), None);
    }

    #[test]
    fn test_numeric_segment_is_a_key_on_mappings() {
        let doc = json!({"data": {"0": "zero"}});
        assert_eq!(lookup(&doc, "data.0"), Some(&json!("zero")));
    }

    #[test]
    fn test_trailing_dot_misses() {
        let doc = json!({"data": {"content": "x"}});
        assert_eq!(lookup(&doc, "data.content."), None);
    }

    #[test]
    fn test_find_key_searches_depth_first() {
        let doc = json!({
            "meta": {"page": 1},
            "items": [{"id": 1}, {"id": 2, "body": "found me"}]
        });
        assert_eq!(find_key(&doc, "body"), Some(&json!("found me")));
        assert_eq!(find_key(&doc, "missing"), None);
    }

    #[test]
    fn test_text_of_coercions() {
        assert_eq!(text_of(&json!("hi")), Some("hi".to_string()));
        assert_eq!(text_of(&json!(3.5)), Some("3.5".to_string()));
        assert_eq!(text_of(&json!(true)), Some("true".to_string()));
        assert_eq!(
            text_of(&json!(["one", 2, {"x": 1}, null])),
            Some("one 2".to_string())
        );
        assert_eq!(text_of(&json!(null)), None);
        assert_eq!(text_of(&json!({"a": "b"})), None);
        assert_eq!(text_of(&json!([])), None);
    }
}
