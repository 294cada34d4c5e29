//! Definition and settings types.
//!
//! This module defines the structs that map to `kennel.yaml`, to project
//! files under `projects/` and to template files under `templates/`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::api::DEFAULT_API_URL;
use crate::resource::ResourceKind;

/// Default web UI URL used to link resources.
pub const DEFAULT_APP_URL: &str = "https://app.datadoghq.com";

/// Workspace settings from `kennel.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding project files.
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,
    /// Directory holding template files.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    /// Directory snapshots are written to.
    #[serde(default = "default_generated_dir")]
    pub generated_dir: PathBuf,
    /// Monitoring API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Web UI base URL.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            templates_dir: default_templates_dir(),
            generated_dir: default_generated_dir(),
            api_url: default_api_url(),
            app_url: default_app_url(),
        }
    }
}

impl Settings {
    /// Resolves every relative directory against `root`.
    #[must_use]
    pub fn rooted_at(mut self, root: &std::path::Path) -> Self {
        for dir in [
            &mut self.projects_dir,
            &mut self.templates_dir,
            &mut self.generated_dir,
        ] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        self
    }
}

/// One project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectFile {
    /// Project-level settings.
    pub project: ProjectSpec,
    /// Records owned by the project, in definition order.
    #[serde(default)]
    pub parts: Vec<PartSpec>,
}

/// Project-level settings shared by every part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSpec {
    /// Project kennel id, the first half of every tracking id.
    pub kennel_id: String,
    /// Owning team, added to tags as `team:<team>`.
    #[serde(default)]
    pub team: Option<String>,
    /// Notification handle appended to monitor messages.
    #[serde(default)]
    pub mention: Option<String>,
    /// Tags added to every monitor and SLO.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Attribute defaults per kind, layered under part attributes.
    #[serde(default)]
    pub defaults: BTreeMap<ResourceKind, Map<String, Value>>,
}

/// One record definition inside a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartSpec {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Record kennel id, unique within the project.
    pub kennel_id: String,
    /// Logical name of the template to start from.
    #[serde(default)]
    pub template: Option<String>,
    /// Remote id of an existing resource to take over.
    #[serde(default)]
    pub id: Option<Value>,
    /// Part attributes, the last layer.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// One template file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateFile {
    /// Kind of record the template applies to.
    pub kind: ResourceKind,
    /// Logical name of the parent template.
    #[serde(default)]
    pub extends: Option<String>,
    /// Attributes this template contributes.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

fn default_projects_dir() -> PathBuf {
    PathBuf::from("projects")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_generated_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_api_url() -> String {
    String::from(DEFAULT_API_URL)
}

fn default_app_url() -> String {
    String::from(DEFAULT_APP_URL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.generated_dir, PathBuf::from("generated"));
    }

    #[test]
    fn test_rooted_at_keeps_absolute_dirs() {
        let settings = Settings {
            generated_dir: PathBuf::from("/tmp/out"),
            ..Settings::default()
        }
        .rooted_at(std::path::Path::new("/work"));
        assert_eq!(settings.projects_dir, PathBuf::from("/work/projects"));
        assert_eq!(settings.generated_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_parse_project_file() {
        let yaml = r#"
project:
  kennel_id: payments
  team: billing
  mention: "@slack-billing"
  tags: ["service:payments"]
  defaults:
    monitor:
      options:
        renotify_interval: 120
parts:
  - kind: monitor
    kennel_id: error_rate
    template: monitors/error_rate
    attributes:
      name: Error rate
      query: "avg(last_5m):sum:errors{*} > 5"
  - kind: dashboard
    kennel_id: overview
    id: abc-def-ghi
"#;
        let file: ProjectFile = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(file.project.kennel_id, "payments");
        assert_eq!(file.parts.len(), 2);
        assert_eq!(file.parts[0].kind, ResourceKind::Monitor);
        assert_eq!(
            file.parts[0].template.as_deref(),
            Some("monitors/error_rate")
        );
        assert_eq!(
            file.project.defaults[&ResourceKind::Monitor]["options"]["renotify_interval"],
            Value::from(120)
        );
        assert_eq!(file.parts[1].id, Some(Value::from("abc-def-ghi")));
        assert!(file.parts[1].attributes.is_empty());
    }

    #[test]
    fn test_parse_template_file() {
        let yaml = r"
kind: slo
extends: slos/base
attributes:
  type: metric
";
        let template: TemplateFile = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(template.kind, ResourceKind::Slo);
        assert_eq!(template.extends.as_deref(), Some("slos/base"));
    }
}
