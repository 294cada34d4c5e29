//! Definition loading.
//!
//! Turns every project file into records, in file order and then part order.
//! That order is the definition order the planner and generator keep.

use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::resource::Record;

use super::filter::ProjectFilter;
use super::layers::RecordBuilder;
use super::parser::{collect_yaml_files, read_yaml};
use super::registry::TemplateRegistry;
use super::spec::{ProjectFile, Settings};
use super::validator::DefinitionValidator;

/// Records of the selected projects.
#[derive(Debug, Default)]
pub struct Definitions {
    /// Records of the selected projects, in definition order.
    pub records: Vec<Record>,
    /// Every project id found, selected or not.
    pub project_ids: Vec<String>,
}

/// Loads project files into records.
#[derive(Debug)]
pub struct DefinitionLoader<'a> {
    settings: &'a Settings,
    validator: DefinitionValidator,
}

impl<'a> DefinitionLoader<'a> {
    /// Creates a loader for the directories in `settings`.
    #[must_use]
    pub const fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            validator: DefinitionValidator::new(),
        }
    }

    /// Loads the records of every project selected by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the projects directory is missing, a file is
    /// invalid, a template cannot be resolved or the filter selects nothing.
    pub fn load(&self, filter: &ProjectFilter) -> Result<Definitions> {
        let dir = &self.settings.projects_dir;
        if !dir.is_dir() {
            return Err(ConfigError::FileNotFound { path: dir.clone() }.into());
        }

        let registry = TemplateRegistry::load(&self.settings.templates_dir)?;
        debug!("Loaded {} templates", registry.len());
        let builder = RecordBuilder::new(&registry);

        let mut definitions = Definitions::default();
        for path in collect_yaml_files(dir)? {
            let file: ProjectFile = read_yaml(&path)?;
            self.validator.validate_project(&file)?;

            let project_id = file.project.kennel_id.clone();
            definitions.project_ids.push(project_id.clone());
            if !filter.matches(&project_id) {
                debug!("Skipping project {project_id}");
                continue;
            }

            for part in &file.parts {
                let record = builder.build(&file.project, part)?;
                self.validator.validate_record(&record)?;
                definitions.records.push(record);
            }
        }

        filter.ensure_matches(definitions.project_ids.iter().map(String::as_str))?;

        info!(
            "Loaded {} records from {} projects",
            definitions.records.len(),
            definitions.project_ids.len()
        );
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KennelError;
    use crate::resource::ResourceKind;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    fn workspace() -> (tempfile::TempDir, Settings) {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "templates/monitors/metric.yaml",
            "kind: monitor\nattributes:\n  type: metric alert\n",
        );
        write(
            dir.path(),
            "projects/alpha.yaml",
            r#"
project:
  kennel_id: alpha
  team: core
parts:
  - kind: monitor
    kennel_id: cpu
    template: monitors/metric
    attributes:
      name: CPU
      query: "avg(last_5m):avg:system.cpu.user{*} > 90"
  - kind: dashboard
    kennel_id: overview
    attributes:
      title: Overview
"#,
        );
        write(
            dir.path(),
            "projects/beta.yaml",
            r#"
project:
  kennel_id: beta
parts:
  - kind: slo
    kennel_id: uptime
    attributes:
      name: Uptime
      type: monitor
      monitor_ids: ["alpha:cpu"]
      thresholds: [{ timeframe: 7d, target: 99.9 }]
"#,
        );
        let settings = Settings::default().rooted_at(dir.path());
        (dir, settings)
    }

    #[test]
    fn test_loads_all_projects_in_order() {
        let (_dir, settings) = workspace();
        let definitions = DefinitionLoader::new(&settings)
            .load(&ProjectFilter::All)
            .expect("load");

        let ids: Vec<_> = definitions.records.iter().map(Record::tracking_id).collect();
        assert_eq!(ids, vec!["alpha:cpu", "alpha:overview", "beta:uptime"]);
        assert_eq!(definitions.project_ids, vec!["alpha", "beta"]);
        assert_eq!(definitions.records[0].kind(), ResourceKind::Monitor);
        assert_eq!(
            definitions.records[0].attributes()["type"],
            serde_json::json!("metric alert")
        );
    }

    #[test]
    fn test_filter_selects_projects() {
        let (_dir, settings) = workspace();
        let definitions = DefinitionLoader::new(&settings)
            .load(&ProjectFilter::parse(Some("beta")))
            .expect("load");
        assert_eq!(definitions.records.len(), 1);
        assert_eq!(definitions.project_ids.len(), 2);
    }

    #[test]
    fn test_filter_matching_nothing_lists_projects() {
        let (_dir, settings) = workspace();
        let err = DefinitionLoader::new(&settings)
            .load(&ProjectFilter::parse(Some("gamma")))
            .unwrap_err();
        assert!(err.to_string().ends_with("available projects: alpha, beta"));
    }

    #[test]
    fn test_unknown_template_fails() {
        let (dir, settings) = workspace();
        write(
            dir.path(),
            "projects/gamma.yaml",
            "project:\n  kennel_id: gamma\nparts:\n  - kind: monitor\n    kennel_id: m\n    template: nope\n",
        );
        let err = DefinitionLoader::new(&settings)
            .load(&ProjectFilter::All)
            .unwrap_err();
        assert!(matches!(
            err,
            KennelError::Config(ConfigError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn test_missing_projects_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::default().rooted_at(dir.path());
        let err = DefinitionLoader::new(&settings)
            .load(&ProjectFilter::All)
            .unwrap_err();
        assert!(matches!(err, KennelError::Config(ConfigError::FileNotFound { .. })));
    }
}
