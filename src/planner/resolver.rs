//! Tracking-id resolution.
//!
//! Definitions reference other resources by tracking id (`"project:part"`).
//! Before a record is diffed or sent to the API those references are replaced
//! with concrete remote ids looked up in a [`TrackingMap`].
//!
//! A reference to a resource that is only created later in the same run can
//! be soft or hard. Soft references get [`MISSING_ID`] and are fixed by the
//! next run; hard references fail.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ValidationError;
use crate::resource::{Record, RemoteId, ResourceKind};

/// Placeholder id used for soft references to resources not created yet.
pub const MISSING_ID: &str = "1";

/// State of a tracking id within the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingEntry {
    /// The resource exists remotely.
    Existing(RemoteId),
    /// The resource is created later in this run.
    New,
}

/// Tracking id to remote id, built fresh for every run.
#[derive(Debug, Clone, Default)]
pub struct TrackingMap {
    entries: HashMap<String, TrackingEntry>,
}

impl TrackingMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an existing remote resource.
    pub fn insert_existing(&mut self, tracking_id: impl Into<String>, id: RemoteId) {
        self.entries
            .insert(tracking_id.into(), TrackingEntry::Existing(id));
    }

    /// Records a resource that will be created in this run.
    pub fn insert_new(&mut self, tracking_id: impl Into<String>) {
        self.entries.insert(tracking_id.into(), TrackingEntry::New);
    }

    /// Installs the id returned by a successful create.
    pub fn mark_created(&mut self, tracking_id: &str, id: RemoteId) {
        self.insert_existing(tracking_id, id);
    }

    /// Looks up a tracking id.
    #[must_use]
    pub fn get(&self, tracking_id: &str) -> Option<&TrackingEntry> {
        self.entries.get(tracking_id)
    }

    /// Number of known tracking ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves `referenced` on behalf of the record `owner`.
///
/// # Errors
///
/// Returns an error if the reference is unknown, or if it points at a
/// resource created later in this run and `force` is set.
pub fn resolve(
    owner: &str,
    referenced: &str,
    map: &TrackingMap,
    force: bool,
) -> Result<RemoteId, ValidationError> {
    match map.get(referenced) {
        Some(TrackingEntry::Existing(id)) => Ok(id.clone()),
        Some(TrackingEntry::New) if force => Err(ValidationError::ForcedNewReference {
            tracking_id: owner.to_string(),
            referenced: referenced.to_string(),
        }),
        Some(TrackingEntry::New) => {
            warn!(
                "{owner} references {referenced}, which is created in this run; using placeholder id {MISSING_ID} until the next run"
            );
            Ok(RemoteId::new(MISSING_ID))
        }
        None => Err(ValidationError::UnknownReference {
            tracking_id: owner.to_string(),
            referenced: referenced.to_string(),
        }),
    }
}

/// Returns the record's attributes with every embedded reference replaced.
///
/// # Errors
///
/// Returns the first reference that cannot be resolved.
pub fn resolve_references(
    record: &Record,
    map: &TrackingMap,
) -> Result<Map<String, Value>, ValidationError> {
    let owner = record.tracking_id();
    let mut attributes = record.attributes().clone();
    match record.kind() {
        ResourceKind::Monitor => {
            let is_composite = attributes.get("type").and_then(Value::as_str) == Some("composite");
            if is_composite
                && let Some(Value::String(query)) = attributes.get("query")
            {
                let query = resolve_query(owner, query, map)?;
                attributes.insert(String::from("query"), Value::String(query));
            }
        }
        ResourceKind::Dashboard => {
            if let Some(Value::Array(widgets)) = attributes.get_mut("widgets") {
                resolve_widgets(owner, widgets, map)?;
            }
        }
        ResourceKind::Slo => {
            if let Some(Value::Array(ids)) = attributes.get_mut("monitor_ids") {
                for id in ids.iter_mut() {
                    if let Some(referenced) = id.as_str().filter(|s| is_tracking_id(s)) {
                        *id = resolve(owner, referenced, map, true)?.to_value();
                    }
                }
            }
        }
    }
    Ok(attributes)
}

/// Replaces `%{project:part}` placeholders in a composite monitor query.
fn resolve_query(owner: &str, query: &str, map: &TrackingMap) -> Result<String, ValidationError> {
    let mut resolved = String::with_capacity(query.len());
    let mut rest = query;
    while let Some(start) = rest.find("%{") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let referenced = &rest[start + 2..start + 2 + len];
        resolved.push_str(&rest[..start]);
        if is_tracking_id(referenced) {
            resolved.push_str(resolve(owner, referenced, map, false)?.as_str());
        } else {
            resolved.push_str(&rest[start..start + 3 + len]);
        }
        rest = &rest[start + 3 + len..];
    }
    resolved.push_str(rest);
    Ok(resolved)
}

fn resolve_widgets(
    owner: &str,
    widgets: &mut [Value],
    map: &TrackingMap,
) -> Result<(), ValidationError> {
    for widget in widgets {
        let Some(Value::Object(definition)) = widget.get_mut("definition") else {
            continue;
        };
        for key in ["alert_id", "slo_id"] {
            if let Some(Value::String(referenced)) = definition.get(key)
                && is_tracking_id(referenced)
            {
                let id = resolve(owner, referenced, map, false)?;
                definition.insert(key.to_string(), Value::String(id.to_string()));
            }
        }
        if let Some(Value::Array(nested)) = definition.get_mut("widgets") {
            resolve_widgets(owner, nested, map)?;
        }
    }
    Ok(())
}

fn is_tracking_id(value: &str) -> bool {
    value
        .split_once(':')
        .is_some_and(|(project, part)| !project.is_empty() && !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kind: ResourceKind, attributes: Value) -> Record {
        Record::new(
            kind,
            "p",
            "owner",
            attributes.as_object().cloned().unwrap_or_default(),
        )
    }

    #[test]
    fn test_resolve_existing() {
        let mut map = TrackingMap::new();
        map.insert_existing("a:b", RemoteId::from("42"));
        let id = resolve("p:owner", "a:b", &map, true).expect("resolves");
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn test_resolve_new_without_force_uses_placeholder() {
        let mut map = TrackingMap::new();
        map.insert_new("a:b");
        let id = resolve("p:owner", "a:b", &map, false).expect("soft reference");
        assert_eq!(id.as_str(), MISSING_ID);
    }

    #[test]
    fn test_resolve_new_with_force_fails() {
        let mut map = TrackingMap::new();
        map.insert_new("a:b");
        let err = resolve("p:owner", "a:b", &map, true).unwrap_err();
        assert!(matches!(err, ValidationError::ForcedNewReference { .. }));
        assert!(err.to_string().starts_with("p:owner"));
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let err = resolve("p:owner", "a:b", &TrackingMap::new(), false).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownReference { .. }));
    }

    #[test]
    fn test_mark_created_replaces_new() {
        let mut map = TrackingMap::new();
        map.insert_new("a:b");
        map.mark_created("a:b", RemoteId::from("9"));
        assert_eq!(
            map.get("a:b"),
            Some(&TrackingEntry::Existing(RemoteId::from("9")))
        );
    }

    #[test]
    fn test_composite_query() {
        let mut map = TrackingMap::new();
        map.insert_existing("a:one", RemoteId::from("11"));
        map.insert_new("a:two");
        let rec = record(
            ResourceKind::Monitor,
            json!({ "type": "composite", "query": "%{a:one} && %{a:two} || %{literal}" }),
        );
        let resolved = resolve_references(&rec, &map).expect("resolves");
        assert_eq!(resolved["query"], json!("11 && 1 || %{literal}"));
        assert_eq!(
            rec.attributes()["query"],
            json!("%{a:one} && %{a:two} || %{literal}")
        );
    }

    #[test]
    fn test_plain_monitor_query_untouched() {
        let rec = record(
            ResourceKind::Monitor,
            json!({ "type": "metric alert", "query": "avg(last_5m):%{a:b} > 1" }),
        );
        let resolved = resolve_references(&rec, &TrackingMap::new()).expect("untouched");
        assert_eq!(resolved, *rec.attributes());
    }

    #[test]
    fn test_dashboard_nested_widgets() {
        let mut map = TrackingMap::new();
        map.insert_existing("a:mon", RemoteId::from("5"));
        map.insert_existing("a:slo", RemoteId::from("abc"));
        let rec = record(
            ResourceKind::Dashboard,
            json!({ "widgets": [
                { "definition": { "type": "alert_graph", "alert_id": "a:mon" } },
                { "definition": { "type": "group", "widgets": [
                    { "definition": { "type": "slo", "slo_id": "a:slo" } }
                ] } }
            ] }),
        );
        let resolved = resolve_references(&rec, &map).expect("resolves");
        assert_eq!(resolved["widgets"][0]["definition"]["alert_id"], json!("5"));
        assert_eq!(
            resolved["widgets"][1]["definition"]["widgets"][0]["definition"]["slo_id"],
            json!("abc")
        );
    }

    #[test]
    fn test_slo_monitor_ids_are_forced() {
        let mut map = TrackingMap::new();
        map.insert_existing("a:mon", RemoteId::from("5"));
        map.insert_new("a:later");

        let rec = record(ResourceKind::Slo, json!({ "monitor_ids": ["a:mon", 7] }));
        let resolved = resolve_references(&rec, &map).expect("resolves");
        assert_eq!(resolved["monitor_ids"], json!([5, 7]));

        let rec = record(ResourceKind::Slo, json!({ "monitor_ids": ["a:later"] }));
        assert!(matches!(
            resolve_references(&rec, &map),
            Err(ValidationError::ForcedNewReference { .. })
        ));
    }
}
