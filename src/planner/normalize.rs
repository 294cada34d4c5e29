//! Record normalization before diffing.
//!
//! Every function here returns new mappings; callers keep their originals for
//! reporting.

use serde_json::{Map, Value};

use crate::resource::ResourceKind;

use super::diff::values_equal;

/// Returns the desired attribute mapping without the remote `id`.
#[must_use]
pub fn canonicalize(attributes: &Map<String, Value>) -> Map<String, Value> {
    let mut canonical = attributes.clone();
    canonical.remove("id");
    canonical
}

/// Returns the actual attribute mapping without server-assigned attributes.
#[must_use]
pub fn normalize(kind: ResourceKind, actual: &Map<String, Value>) -> Map<String, Value> {
    actual
        .iter()
        .filter(|(key, _)| !kind.is_readonly(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Drops every defaulted key that both sides leave absent or set to its
/// default.
///
/// If either side holds a non-default value the key stays on both sides.
#[must_use]
pub fn suppress_defaults(
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
    defaults: &Map<String, Value>,
) -> (Map<String, Value>, Map<String, Value>) {
    let mut expected = expected.clone();
    let mut actual = actual.clone();
    for (key, default) in defaults {
        let is_default = |side: &Map<String, Value>| {
            side.get(key).is_none_or(|v| values_equal(v, default))
        };
        if is_default(&expected) && is_default(&actual) {
            expected.remove(key);
            actual.remove(key);
        }
    }
    (expected, actual)
}

/// Applies every default scope of `kind`, top-level and nested.
#[must_use]
pub fn suppress_kind_defaults(
    kind: ResourceKind,
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
) -> (Map<String, Value>, Map<String, Value>) {
    let mut sides = (expected.clone(), actual.clone());
    for scope in kind.default_scopes() {
        sides = match scope.path {
            None => suppress_defaults(&sides.0, &sides.1, &scope.defaults),
            Some(key) => suppress_nested(key, &sides.0, &sides.1, &scope.defaults),
        };
    }
    sides
}

fn suppress_nested(
    key: &str,
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
    defaults: &Map<String, Value>,
) -> (Map<String, Value>, Map<String, Value>) {
    let empty = Map::new();
    let nested = |side: &Map<String, Value>| match side.get(key) {
        None => Some(None),
        Some(Value::Object(inner)) => Some(Some(inner.clone())),
        Some(_) => None,
    };
    let (Some(want), Some(have)) = (nested(expected), nested(actual)) else {
        return (expected.clone(), actual.clone());
    };

    let (want_inner, have_inner) = suppress_defaults(
        want.as_ref().unwrap_or(&empty),
        have.as_ref().unwrap_or(&empty),
        defaults,
    );

    // An object emptied by suppression matches an absent one.
    let keep_want = want.is_some() && !(want_inner.is_empty() && have.is_none());
    let keep_have = have.is_some() && !(have_inner.is_empty() && want.is_none());

    let rebuild = |side: &Map<String, Value>, keep: bool, inner: Map<String, Value>| {
        let mut side = side.clone();
        if keep {
            side.insert(key.to_string(), Value::Object(inner));
        } else {
            side.remove(key);
        }
        side
    };
    (
        rebuild(expected, keep_want, want_inner),
        rebuild(actual, keep_have, have_inner),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_canonicalize_removes_id() {
        let attrs = map(json!({ "id": 1, "name": "x" }));
        let canonical = canonicalize(&attrs);
        assert_eq!(canonical, map(json!({ "name": "x" })));
        assert!(attrs.contains_key("id"));
    }

    #[test]
    fn test_normalize_removes_every_readonly_key() {
        let actual = map(json!({
            "id": 1, "created": "t", "created_at": "t", "creator": {}, "deleted": null,
            "org_id": 2, "modified": "t", "modified_at": "t", "api_resource": "monitor",
            "overall_state": "OK", "name": "x",
        }));
        let normalized = normalize(ResourceKind::Monitor, &actual);
        assert_eq!(normalized, map(json!({ "name": "x" })));
        assert_eq!(actual.len(), 11);
    }

    #[test]
    fn test_suppress_defaults_drops_when_both_default_or_absent() {
        let defaults = map(json!({ "timeout_h": 0, "notify_audit": false }));
        let expected = map(json!({ "timeout_h": 0, "name": "x" }));
        let actual = map(json!({ "name": "x" }));
        let (e, a) = suppress_defaults(&expected, &actual, &defaults);
        assert_eq!(e, map(json!({ "name": "x" })));
        assert_eq!(a, map(json!({ "name": "x" })));
    }

    #[test]
    fn test_suppress_defaults_compares_numbers_by_value() {
        let defaults = map(json!({ "timeout_h": 0 }));
        let expected = map(json!({ "timeout_h": 0.0, "name": "x" }));
        let actual = map(json!({ "timeout_h": 0, "name": "x" }));
        let (e, a) = suppress_defaults(&expected, &actual, &defaults);
        assert!(!e.contains_key("timeout_h"));
        assert!(!a.contains_key("timeout_h"));
    }

    #[test]
    fn test_suppress_defaults_is_symmetric() {
        let defaults = map(json!({ "timeout_h": 0 }));
        let expected = map(json!({ "timeout_h": 0 }));
        let actual = map(json!({ "timeout_h": 5 }));

        let (e, a) = suppress_defaults(&expected, &actual, &defaults);
        assert_eq!(e["timeout_h"], json!(0));
        assert_eq!(a["timeout_h"], json!(5));

        let (a2, e2) = suppress_defaults(&actual, &expected, &defaults);
        assert_eq!(a2, a);
        assert_eq!(e2, e);
    }

    #[test]
    fn test_kind_defaults_reach_nested_options() {
        let expected = map(json!({ "options": { "timeout_h": 0, "thresholds": { "critical": 1 } } }));
        let actual = map(json!({ "options": { "thresholds": { "critical": 1 } } }));
        let (e, a) = suppress_kind_defaults(ResourceKind::Monitor, &expected, &actual);
        assert_eq!(e, a);
    }

    #[test]
    fn test_kind_defaults_keep_options_absent_when_emptied() {
        let expected = map(json!({ "options": { "notify_audit": false } }));
        let actual = map(json!({}));
        let (e, a) = suppress_kind_defaults(ResourceKind::Monitor, &expected, &actual);
        assert_eq!(e, map(json!({})));
        assert_eq!(a, map(json!({})));
    }
}
