//! Monitoring API trait definition.
//!
//! This module defines the interface the planner and executor use to read
//! and mutate remote resources.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::resource::{ActualRecord, Record, RemoteId, ResourceKind};

/// Capabilities kennel needs from the remote monitoring service.
///
/// Calls are issued one at a time; failures are reported, never retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// Lists every resource of a kind, managed or not.
    async fn list(&self, kind: ResourceKind) -> Result<Vec<ActualRecord>>;

    /// Reads one resource in full.
    async fn get(&self, kind: ResourceKind, id: &RemoteId) -> Result<ActualRecord>;

    /// Creates a resource and returns its new id.
    async fn create(&self, kind: ResourceKind, attributes: &Map<String, Value>)
    -> Result<RemoteId>;

    /// Replaces the attributes of an existing resource.
    async fn update(
        &self,
        kind: ResourceKind,
        id: &RemoteId,
        attributes: &Map<String, Value>,
    ) -> Result<()>;

    /// Deletes a resource.
    async fn delete(&self, kind: ResourceKind, id: &RemoteId) -> Result<()>;
}

/// Lists every kind, finishing all reads before returning.
///
/// # Errors
///
/// Returns the first failed list call.
pub async fn list_all<A: MonitoringApi + ?Sized>(api: &A) -> Result<Vec<ActualRecord>> {
    let mut actual = Vec::new();
    for kind in ResourceKind::ALL {
        actual.extend(api.list(kind).await?);
    }
    Ok(actual)
}

/// Replaces the list summaries of unmanaged resources that `records` take
/// over by id with their full bodies.
///
/// Managed resources are already read in full while listing.
///
/// # Errors
///
/// Returns the first failed read.
pub async fn fetch_takeovers<A: MonitoringApi + ?Sized>(
    api: &A,
    records: &[Record],
    actual: &mut [ActualRecord],
) -> Result<()> {
    for record in records.iter().filter(|r| r.kind().lists_summaries()) {
        let Some(id) = record.id() else {
            continue;
        };
        let summary = actual
            .iter_mut()
            .find(|a| a.kind == record.kind() && a.id == id && a.tracking_id.is_none());
        if let Some(summary) = summary {
            debug!("Reading {} {id} taken over by {}", record.kind(), record.tracking_id());
            *summary = api.get(record.kind(), &id).await?;
        }
    }
    Ok(())
}
