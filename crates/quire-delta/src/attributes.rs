//! Per-run formatting attributes.
//!
//! A value of `null` or `false` marks the key for removal when composed onto
//! existing formatting.

use std::collections::BTreeMap;

use serde_json::Value;
use smol_str::SmolStr;

/// Formatting key to value. Ordered so serialization is deterministic.
pub type AttributeMap = BTreeMap<SmolStr, Value>;

/// Whether a value removes its key rather than setting it.
pub fn is_removal(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// Normalise an attribute map into an `Option`, dropping empty maps.
pub fn non_empty(map: AttributeMap) -> Option<AttributeMap> {
    if map.is_empty() { None } else { Some(map) }
}

/// Compose `b` over `a`, last writer wins per key.
///
/// With `keep_removals` the removal markers from `b` survive in the result,
/// which is what a retain needs so the removal still reaches the content it
/// is later composed onto. Inserts pass `false` and simply drop the key.
pub fn compose(
    a: Option<&AttributeMap>,
    b: Option<&AttributeMap>,
    keep_removals: bool,
) -> Option<AttributeMap> {
    let mut out = AttributeMap::new();
    if let Some(b) = b {
        for (key, value) in b {
            if keep_removals || !is_removal(value) {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(a) = a {
        for (key, value) in a {
            if !b.is_some_and(|b| b.contains_key(key)) {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    non_empty(out)
}

/// Strip removal markers, leaving only keys that are actually set.
pub fn without_removals(map: Option<&AttributeMap>) -> Option<AttributeMap> {
    let map = map?;
    non_empty(
        map.iter()
            .filter(|(_, v)| !is_removal(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

/// Whether the attribute `key` is set to a truthy value.
pub fn is_set(map: Option<&AttributeMap>, key: &str) -> bool {
    map.and_then(|m| m.get(key)).is_some_and(|v| !is_removal(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(v: Value) -> AttributeMap {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_compose_last_writer_wins() {
        let a = attrs(json!({"bold": true, "color": "red"}));
        let b = attrs(json!({"color": "blue"}));
        let out = compose(Some(&a), Some(&b), false).unwrap();
        assert_eq!(out, attrs(json!({"bold": true, "color": "blue"})));
    }

    #[test]
    fn test_compose_removal_drops_key() {
        let a = attrs(json!({"bold": true, "readonly": true}));
        let b = attrs(json!({"readonly": false}));
        let out = compose(Some(&a), Some(&b), false).unwrap();
        assert_eq!(out, attrs(json!({"bold": true})));
    }

    #[test]
    fn test_compose_keeps_removals_for_retain() {
        let b = attrs(json!({"bold": null}));
        let out = compose(None, Some(&b), true).unwrap();
        assert_eq!(out, attrs(json!({"bold": null})));
        // Nothing left when removals are not kept
        assert!(compose(None, Some(&b), false).is_none());
    }

    #[test]
    fn test_is_set() {
        let a = attrs(json!({"readonly": true, "bold": false}));
        assert!(is_set(Some(&a), "readonly"));
        assert!(!is_set(Some(&a), "bold"));
        assert!(!is_set(Some(&a), "italic"));
        assert!(!is_set(None, "readonly"));
    }
}
