//! Plan types and construction.
//!
//! A plan pairs every desired record with at most one remote resource and
//! classifies the pair. Actions follow definition order, deletes come last.
//! Nothing is reordered by dependency: the API enforces referential
//! integrity and a rejected call is fatal.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Map;
use tracing::debug;

use crate::config::{DefinitionHasher, ProjectFilter};
use crate::error::{Result, ValidationError};
use crate::resource::{ActualRecord, Record, RemoteId, ResourceKind};

use super::diff::{Diff, diff};
use super::normalize::{canonicalize, normalize, suppress_kind_defaults};
use super::resolver::{TrackingMap, resolve_references};

/// A complete plan for one run.
#[derive(Debug)]
pub struct Plan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Fingerprint of the desired records this plan is based on.
    pub fingerprint: String,
    /// Planned actions in execution order.
    pub actions: Vec<PlannedAction>,
    /// Tracking ids known when planning, `New` for pending creates.
    tracking: TrackingMap,
}

/// A single planned action.
#[derive(Debug, Clone)]
pub struct PlannedAction {
    /// Action type.
    pub action_type: ActionType,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Tracking id of the record or remote resource.
    pub tracking_id: String,
    /// Remote id for updates, deletes and no-ops.
    pub remote_id: Option<RemoteId>,
    /// Desired record for creates, updates and no-ops.
    pub record: Option<Record>,
    /// Differences that justify an update.
    pub diff: Diff,
}

/// Types of actions in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Create a new resource.
    Create,
    /// Update an existing resource.
    Update,
    /// Delete a resource no longer defined.
    Delete,
    /// Resource is up to date.
    Noop,
}

impl Plan {
    /// Builds a plan from desired and actual records.
    ///
    /// `desired` must already be restricted to the selected projects; the
    /// filter decides which unmatched remote resources may be deleted.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a reference cannot be resolved or a
    /// record takes over a remote id that does not exist.
    pub fn build(desired: &[Record], actual: &[ActualRecord], filter: &ProjectFilter) -> Result<Self> {
        let by_tracking: HashMap<(ResourceKind, &str), usize> = actual
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.tracking_id.as_deref().map(|t| ((a.kind, t), i)))
            .collect();
        let by_id: HashMap<(ResourceKind, &RemoteId), usize> = actual
            .iter()
            .enumerate()
            .map(|(i, a)| ((a.kind, &a.id), i))
            .collect();

        let mut matches = Vec::with_capacity(desired.len());
        for record in desired {
            let matched = match record.id() {
                Some(id) => Some(*by_id.get(&(record.kind(), &id)).ok_or_else(|| {
                    ValidationError::MissingTakeover {
                        tracking_id: record.tracking_id().to_string(),
                        kind: record.kind().to_string(),
                        id: id.to_string(),
                    }
                })?),
                None => by_tracking
                    .get(&(record.kind(), record.tracking_id()))
                    .copied(),
            };
            matches.push(matched);
        }

        let tracking = Self::tracking_map(desired, actual, &matches);

        let mut actions = Vec::with_capacity(desired.len());
        for (record, matched) in desired.iter().zip(&matches) {
            let resolved = resolve_references(record, &tracking)?;
            let action = match matched.map(|i| &actual[i]) {
                None => {
                    debug!("{} needs to be created", record.tracking_id());
                    PlannedAction::for_record(ActionType::Create, record, None, Diff::default())
                }
                Some(remote) => {
                    let expected = canonicalize(&resolved);
                    let have = normalize(remote.kind, &remote.attributes);
                    let (expected, have) = suppress_kind_defaults(remote.kind, &expected, &have);
                    let changes = diff(&expected, &have);
                    let action_type = if changes.is_empty() {
                        ActionType::Noop
                    } else {
                        ActionType::Update
                    };
                    debug!("{} is {action_type}", record.tracking_id());
                    PlannedAction::for_record(action_type, record, Some(remote.id.clone()), changes)
                }
            };
            actions.push(action);
        }

        for (i, remote) in actual.iter().enumerate() {
            let Some(tracking_id) = remote.tracking_id.as_deref() else {
                continue;
            };
            if matches.contains(&Some(i)) || !filter.matches(crate::resource::project_of(tracking_id)) {
                continue;
            }
            debug!("{tracking_id} is no longer defined");
            actions.push(PlannedAction {
                action_type: ActionType::Delete,
                kind: remote.kind,
                tracking_id: tracking_id.to_string(),
                remote_id: Some(remote.id.clone()),
                record: None,
                diff: Diff::default(),
            });
        }

        Ok(Self {
            created_at: Utc::now(),
            fingerprint: DefinitionHasher::new().hash_records(desired),
            actions,
            tracking,
        })
    }

    /// Tracking ids of managed remote resources, overridden by the desired
    /// records: matched ones resolve to their remote id, the rest are `New`.
    fn tracking_map(desired: &[Record], actual: &[ActualRecord], matches: &[Option<usize>]) -> TrackingMap {
        let mut tracking = TrackingMap::new();
        for remote in actual {
            if let Some(tracking_id) = &remote.tracking_id {
                tracking.insert_existing(tracking_id.clone(), remote.id.clone());
            }
        }
        for (record, matched) in desired.iter().zip(matches) {
            match matched {
                Some(i) => tracking.insert_existing(record.tracking_id(), actual[*i].id.clone()),
                None => tracking.insert_new(record.tracking_id()),
            }
        }
        tracking
    }

    /// Tracking ids as known when the plan was built.
    #[must_use]
    pub const fn tracking(&self) -> &TrackingMap {
        &self.tracking
    }

    /// Returns true if applying the plan would not call the API.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes().next().is_none()
    }

    /// Actions that mutate remote state.
    pub fn changes(&self) -> impl Iterator<Item = &PlannedAction> {
        self.actions
            .iter()
            .filter(|a| a.action_type != ActionType::Noop)
    }

    /// Returns the number of actions of one type.
    #[must_use]
    pub fn count(&self, action_type: ActionType) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .count()
    }
}

impl PlannedAction {
    fn for_record(
        action_type: ActionType,
        record: &Record,
        remote_id: Option<RemoteId>,
        diff: Diff,
    ) -> Self {
        Self {
            action_type,
            kind: record.kind(),
            tracking_id: record.tracking_id().to_string(),
            remote_id,
            record: Some(record.clone()),
            diff,
        }
    }

    /// Returns a human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self.action_type {
            ActionType::Create => format!("Create {} {}", self.kind, self.tracking_id),
            ActionType::Update => format!("Update {} {}", self.kind, self.tracking_id),
            ActionType::Delete => format!("Delete {} {}", self.kind, self.tracking_id),
            ActionType::Noop => format!("No change for {} {}", self.kind, self.tracking_id),
        }
    }

    /// Desired attributes of the record, empty for deletes.
    #[must_use]
    pub fn attributes(&self) -> Map<String, serde_json::Value> {
        self.record
            .as_ref()
            .map(|r| r.attributes().clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Noop => "noop",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.action_type, self.kind, self.tracking_id)?;
        if let Some(id) = &self.remote_id {
            write!(f, " ({id})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::marker;
    use serde_json::{Value, json};

    fn desired(kind: ResourceKind, project: &str, kennel_id: &str, attributes: Value) -> Record {
        Record::new(
            kind,
            project,
            kennel_id,
            attributes.as_object().cloned().unwrap_or_default(),
        )
    }

    fn remote(kind: ResourceKind, attributes: Value) -> ActualRecord {
        ActualRecord::from_api(kind, attributes.as_object().cloned().unwrap_or_default())
            .expect("has id")
    }

    fn monitor_message(tracking_id: &str) -> String {
        format!("Alert\n\n{}", marker(tracking_id))
    }

    #[test]
    fn test_create_when_nothing_exists() {
        let records = vec![desired(
            ResourceKind::Monitor,
            "p",
            "m",
            json!({ "query": "avg(last_5m) > 1" }),
        )];
        let plan = Plan::build(&records, &[], &ProjectFilter::All).expect("plan");
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].action_type, ActionType::Create);
        assert_eq!(plan.count(ActionType::Create), 1);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_noop_ignores_readonly_and_defaults() {
        let message = monitor_message("p:m");
        let records = vec![desired(
            ResourceKind::Monitor,
            "p",
            "m",
            json!({
                "query": "avg(last_5m) > 1",
                "message": message,
                "options": { "timeout_h": 0, "thresholds": { "critical": 1 } },
            }),
        )];
        let actual = vec![remote(
            ResourceKind::Monitor,
            json!({
                "id": 10,
                "created": "2020-01-01",
                "overall_state": "OK",
                "query": "avg(last_5m) > 1",
                "message": message,
                "options": { "thresholds": { "critical": 1.0 }, "notify_audit": false },
            }),
        )];
        let plan = Plan::build(&records, &actual, &ProjectFilter::All).expect("plan");
        assert_eq!(plan.actions[0].action_type, ActionType::Noop);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_update_carries_diff() {
        let message = monitor_message("p:m");
        let records = vec![desired(
            ResourceKind::Monitor,
            "p",
            "m",
            json!({ "query": "avg(last_5m) > 2", "message": message }),
        )];
        let actual = vec![remote(
            ResourceKind::Monitor,
            json!({ "id": 10, "query": "avg(last_5m) > 1", "message": message }),
        )];
        let plan = Plan::build(&records, &actual, &ProjectFilter::All).expect("plan");
        let action = &plan.actions[0];
        assert_eq!(action.action_type, ActionType::Update);
        assert_eq!(action.remote_id, Some(RemoteId::from("10")));
        assert_eq!(action.diff.len(), 1);
        assert_eq!(action.diff.entries()[0].path(), "query");
    }

    #[test]
    fn test_deletes_come_last_and_respect_filter() {
        let records = vec![desired(ResourceKind::Monitor, "p", "keep", json!({}))];
        let actual = vec![
            remote(ResourceKind::Monitor, json!({ "id": 1, "message": marker("p:gone") })),
            remote(ResourceKind::Monitor, json!({ "id": 2, "message": marker("other:gone") })),
            remote(ResourceKind::Monitor, json!({ "id": 3, "message": "unmanaged" })),
        ];

        let filter = ProjectFilter::parse(Some("p"));
        let plan = Plan::build(&records, &actual, &filter).expect("plan");
        let kinds: Vec<_> = plan.actions.iter().map(|a| a.action_type).collect();
        assert_eq!(kinds, vec![ActionType::Create, ActionType::Delete]);
        assert_eq!(plan.actions[1].tracking_id, "p:gone");

        let plan = Plan::build(&records, &actual, &ProjectFilter::All).expect("plan");
        assert_eq!(plan.count(ActionType::Delete), 2);
    }

    #[test]
    fn test_takeover_matches_by_id() {
        let records = vec![desired(
            ResourceKind::Dashboard,
            "p",
            "d",
            json!({ "id": "abc", "title": "t" }),
        )];
        let actual = vec![remote(ResourceKind::Dashboard, json!({ "id": "abc", "title": "old" }))];
        let plan = Plan::build(&records, &actual, &ProjectFilter::All).expect("plan");
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].action_type, ActionType::Update);
    }

    #[test]
    fn test_takeover_of_missing_id_fails() {
        let records = vec![desired(ResourceKind::Monitor, "p", "m", json!({ "id": 5 }))];
        let err = Plan::build(&records, &[], &ProjectFilter::All).unwrap_err();
        assert!(err.to_string().contains("p:m takes over monitor 5"));
    }

    #[test]
    fn test_reference_to_new_record_is_tracked() {
        let records = vec![
            desired(ResourceKind::Monitor, "p", "m", json!({})),
            desired(
                ResourceKind::Dashboard,
                "p",
                "d",
                json!({ "widgets": [{ "definition": { "alert_id": "p:m" } }] }),
            ),
        ];
        let plan = Plan::build(&records, &[], &ProjectFilter::All).expect("plan");
        assert_eq!(plan.count(ActionType::Create), 2);
        assert_eq!(
            plan.tracking().get("p:m"),
            Some(&crate::planner::TrackingEntry::New)
        );
    }

    #[test]
    fn test_unknown_reference_fails() {
        let records = vec![desired(
            ResourceKind::Slo,
            "p",
            "s",
            json!({ "monitor_ids": ["p:nope"] }),
        )];
        let err = Plan::build(&records, &[], &ProjectFilter::All).unwrap_err();
        assert!(err.to_string().contains("neither exists remotely"));
    }
}
