//! Response envelopes of the Datadog API.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Body of `GET /api/v1/dashboard`.
#[derive(Debug, Deserialize)]
pub struct DashboardList {
    /// Dashboard summaries, without widgets.
    #[serde(default)]
    pub dashboards: Vec<Map<String, Value>>,
}

/// The `data` envelope used by the SLO endpoints.
#[derive(Debug, Deserialize)]
pub struct SloEnvelope {
    /// SLO objects.
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,
}

/// The `data` envelope of a single SLO.
#[derive(Debug, Deserialize)]
pub struct SloItem {
    /// The SLO object.
    pub data: Map<String, Value>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Error messages.
    #[serde(default)]
    pub errors: Vec<String>,
}
