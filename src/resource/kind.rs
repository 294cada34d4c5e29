//! Resource kinds managed by kennel.
//!
//! Every per-kind constant lives here: the API path segment, the text field
//! carrying the managed-by marker, server-assigned attributes and the values
//! the API omits when they equal their default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Attributes set by the remote system for every kind; never diffed.
pub const READONLY_ATTRIBUTES: &[&str] = &[
    "deleted",
    "id",
    "created",
    "created_at",
    "creator",
    "org_id",
    "modified",
    "modified_at",
    "api_resource",
];

const MONITOR_READONLY: &[&str] = &[
    "overall_state",
    "overall_state_modified",
    "matching_downtimes",
    "multi",
];

const DASHBOARD_READONLY: &[&str] = &["author_handle", "author_name", "url"];

const SLO_READONLY: &[&str] = &["type_id"];

/// A kind of remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Alerting monitor.
    Monitor,
    /// Dashboard.
    Dashboard,
    /// Service level objective.
    Slo,
}

/// Default values the API may omit, scoped to a nested object.
#[derive(Debug, Clone)]
pub struct DefaultScope {
    /// Key of the nested object, `None` for top-level attributes.
    pub path: Option<&'static str>,
    /// Attribute name to default value.
    pub defaults: Map<String, Value>,
}

impl ResourceKind {
    /// All kinds, in the order they are listed from the API.
    pub const ALL: [Self; 3] = [Self::Monitor, Self::Dashboard, Self::Slo];

    /// API path segment and the value reported as `api_resource`.
    #[must_use]
    pub const fn api_resource(self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Dashboard => "dashboard",
            Self::Slo => "slo",
        }
    }

    /// Whether listing this kind returns summaries instead of full bodies.
    #[must_use]
    pub const fn lists_summaries(self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Free-text attribute that carries the managed-by marker.
    #[must_use]
    pub const fn text_field(self) -> &'static str {
        match self {
            Self::Monitor => "message",
            Self::Dashboard | Self::Slo => "description",
        }
    }

    /// Whether `name` is assigned by the remote system for this kind.
    #[must_use]
    pub fn is_readonly(self, name: &str) -> bool {
        let extra = match self {
            Self::Monitor => MONITOR_READONLY,
            Self::Dashboard => DASHBOARD_READONLY,
            Self::Slo => SLO_READONLY,
        };
        READONLY_ATTRIBUTES.contains(&name) || extra.contains(&name)
    }

    /// Values the API leaves out when they equal their default.
    #[must_use]
    pub fn default_scopes(self) -> Vec<DefaultScope> {
        match self {
            Self::Monitor => vec![
                DefaultScope {
                    path: None,
                    defaults: object(json!({ "priority": null, "restricted_roles": null })),
                },
                DefaultScope {
                    path: Some("options"),
                    defaults: object(json!({
                        "evaluation_delay": null,
                        "new_group_delay": null,
                        "new_host_delay": 300,
                        "no_data_timeframe": null,
                        "notify_audit": false,
                        "notify_no_data": false,
                        "renotify_interval": 0,
                        "timeout_h": 0,
                        "escalation_message": "",
                        "include_tags": true,
                        "silenced": {},
                        "locked": false,
                    })),
                },
            ],
            Self::Dashboard => vec![DefaultScope {
                path: None,
                defaults: object(json!({
                    "template_variables": [],
                    "template_variable_presets": [],
                    "notify_list": [],
                    "reflow_type": null,
                    "is_read_only": false,
                })),
            }],
            Self::Slo => vec![DefaultScope {
                path: None,
                defaults: object(json!({ "groups": [], "tags": [] })),
            }],
        }
    }

    /// Attributes every record of this kind starts from before templates,
    /// project defaults and part attributes are layered on top.
    #[must_use]
    pub fn base_attributes(self) -> Map<String, Value> {
        match self {
            Self::Monitor => object(json!({
                "tags": [],
                "options": {
                    "notify_no_data": false,
                    "notify_audit": false,
                    "include_tags": true,
                    "renotify_interval": 0,
                    "timeout_h": 0,
                },
            })),
            Self::Dashboard => object(json!({
                "layout_type": "ordered",
                "template_variables": [],
                "widgets": [],
            })),
            Self::Slo => object(json!({ "tags": [], "thresholds": [] })),
        }
    }

    /// Web URL of a resource with the given id.
    #[must_use]
    pub fn url(self, app_url: &str, id: &str) -> String {
        let app_url = app_url.trim_end_matches('/');
        match self {
            Self::Monitor => format!("{app_url}/monitors/{id}"),
            Self::Dashboard => format!("{app_url}/dashboard/{id}"),
            Self::Slo => format!("{app_url}/slo?slo_id={id}"),
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_resource())
    }
}
