//! Depth-first key lookup over decoded response trees.
//!
//! Responses from the lookup service nest the same field at different depths
//! depending on customer type, so normalization searches by key instead of path.

use serde_json::Value;

/// Returns the first value stored under `key` anywhere in `source`.
///
/// Keys of a mapping are checked before descending, then each child is searched in
/// the mapping's own order. Sequences are searched element by element. Scalars and
/// empty structures yield `None`.
pub fn deep_find<'a>(source: &'a Value, key: &str) -> Option<&'a Value> {
    match source {
        Value::Object(map) => {
            if let Some(found) = map.get(key) {
                return Some(found);
            }
            map.values().find_map(|child| deep_find(child, key))
        }
        Value::Array(items) => items.iter().find_map(|item| deep_find(item, key)),
        _ => None,
    }
}

/// Like [`deep_find`], but only yields non-empty text.
pub fn deep_find_str<'a>(source: &'a Value, key: &str) -> Option<&'a str> {
    deep_find(source, key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Views a value that may be a single entry or a sequence as a slice of entries.
pub fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finds_top_level_key() {
        let tree = json!({"a": "1", "b": {"a": "2"}});
        assert_eq!(deep_find(&tree, "a"), Some(&json!("1")));
    }

    #[test]
    fn test_first_match_follows_key_order() {
        let tree = json!({
            "first": {"meternumber": "111"},
            "second": {"meternumber": "222"}
        });
        assert_eq!(deep_find_str(&tree, "meternumber"), Some("111"));
    }

    #[test]
    fn test_searches_inside_sequences() {
        let tree = json!({"customers": [{"x": "1"}, {"inner": {"postcode": "0150"}}]});
        assert_eq!(deep_find_str(&tree, "postcode"), Some("0150"));
    }

    #[test]
    fn test_missing_and_non_structured() {
        assert_eq!(deep_find(&json!({}), "a"), None);
        assert_eq!(deep_find(&json!("scalar"), "a"), None);
        assert_eq!(deep_find(&Value::Null, "a"), None);
        assert_eq!(deep_find(&json!({"b": {"c": []}}), "a"), None);
    }

    #[test]
    fn test_empty_text_is_not_a_value() {
        let tree = json!({"description": ""});
        assert!(deep_find(&tree, "description").is_some());
        assert_eq!(deep_find_str(&tree, "description"), None);
    }

    #[test]
    fn test_as_list_shapes() {
        assert_eq!(as_list(&json!({"a": 1})).len(), 1);
        assert_eq!(as_list(&json!([1, 2, 3])).len(), 3);
        assert!(as_list(&Value::Null).is_empty());
    }
}
