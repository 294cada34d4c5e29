//! Desired and actual resource records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kind::ResourceKind;

/// Prefix of the marker kennel appends to a resource's text field.
pub const MANAGED_MARKER: &str = "-- Managed by kennel";

/// A concrete identifier assigned by the monitoring API.
///
/// Monitors use integer ids while dashboards and SLOs use strings; both are
/// kept as text and converted back to JSON numbers when they look numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    /// Creates an id from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an id from a JSON number or string.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            _ => None,
        }
    }

    /// Converts back to JSON, as a number when the id is numeric.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.0
            .parse::<u64>()
            .map_or_else(|_| Value::String(self.0.clone()), Value::from)
    }

    /// The id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A desired-state record produced from the definitions.
///
/// The attribute mapping is fully resolved: templates, project defaults and
/// markers have been applied. `id` is only present when the record takes over
/// an existing remote resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: ResourceKind,
    project_id: String,
    kennel_id: String,
    tracking_id: String,
    attributes: Map<String, Value>,
}

impl Record {
    /// Creates a record; the tracking id is derived from both kennel ids.
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        project_id: impl Into<String>,
        kennel_id: impl Into<String>,
        attributes: Map<String, Value>,
    ) -> Self {
        let project_id = project_id.into();
        let kennel_id = kennel_id.into();
        let tracking_id = tracking_id(&project_id, &kennel_id);
        Self {
            kind,
            project_id,
            kennel_id,
            tracking_id,
            attributes,
        }
    }

    /// Resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Kennel id of the owning project.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Kennel id of the record within its project.
    #[must_use]
    pub fn kennel_id(&self) -> &str {
        &self.kennel_id
    }

    /// `"<project>:<record>"`.
    #[must_use]
    pub fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    /// Remote id this record takes over, if any.
    #[must_use]
    pub fn id(&self) -> Option<RemoteId> {
        self.attributes.get("id").and_then(RemoteId::from_value)
    }

    /// The resolved attribute mapping.
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

/// A resource as reported by the monitoring API.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualRecord {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Remote id.
    pub id: RemoteId,
    /// Tracking id recovered from the marker, `None` for unmanaged resources.
    pub tracking_id: Option<String>,
    /// Attributes exactly as returned, readonly fields included.
    pub attributes: Map<String, Value>,
}

impl ActualRecord {
    /// Builds a record from an API object; `None` when it carries no id.
    #[must_use]
    pub fn from_api(kind: ResourceKind, mut attributes: Map<String, Value>) -> Option<Self> {
        let id = attributes.get("id").and_then(RemoteId::from_value)?;
        let tracking_id = attributes
            .get(kind.text_field())
            .and_then(Value::as_str)
            .and_then(parse_marker);
        attributes.insert(
            String::from("api_resource"),
            Value::from(kind.api_resource()),
        );
        Some(Self {
            kind,
            id,
            tracking_id,
            attributes,
        })
    }

    /// Kennel id of the project that manages this resource.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.tracking_id.as_deref().map(project_of)
    }
}

/// Joins a project and record kennel id into a tracking id.
#[must_use]
pub fn tracking_id(project_id: &str, kennel_id: &str) -> String {
    format!("{project_id}:{kennel_id}")
}

/// Project part of a tracking id.
#[must_use]
pub fn project_of(tracking_id: &str) -> &str {
    tracking_id.split_once(':').map_or(tracking_id, |(p, _)| p)
}

/// Marker line identifying the record that manages a resource.
#[must_use]
pub fn marker(tracking_id: &str) -> String {
    format!("{MANAGED_MARKER} {tracking_id}")
}

/// Extracts the tracking id from a text field carrying a marker.
#[must_use]
pub fn parse_marker(text: &str) -> Option<String> {
    let (_, rest) = text.rsplit_once(MANAGED_MARKER)?;
    let candidate = rest.split_whitespace().next()?;
    let candidate = candidate.trim_end_matches(',');
    match candidate.split_once(':') {
        Some((project, part)) if !project.is_empty() && !part.is_empty() => {
            Some(candidate.to_string())
        }
        _ => None,
    }
}
