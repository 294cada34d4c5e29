//! Resource model shared by definitions, the API client and the planner.

mod kind;
mod record;

pub use kind::{DefaultScope, READONLY_ATTRIBUTES, ResourceKind};
pub use record::{
    ActualRecord, MANAGED_MARKER, Record, RemoteId, marker, parse_marker, project_of,
    tracking_id,
};
