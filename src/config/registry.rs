//! Template registry.
//!
//! Templates are discovered by walking the templates directory once. A
//! template's logical name is its path relative to that directory without
//! the extension, always with `/` separators.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::parser::{collect_yaml_files, read_yaml};
use super::spec::TemplateFile;

/// Every template found under one directory.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    dir: PathBuf,
    templates: HashMap<String, TemplateFile>,
}

impl TemplateRegistry {
    /// Loads every `*.yaml` file below `dir`.
    ///
    /// A missing directory yields an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a template cannot be read or parsed.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let mut templates = HashMap::new();

        if dir.is_dir() {
            for path in collect_yaml_files(&dir)? {
                let name = logical_name(&dir, &path);
                let template: TemplateFile = read_yaml(&path)?;
                debug!("Registered template {name}");
                templates.insert(name, template);
            }
        } else {
            debug!("Template directory {} not found", dir.display());
        }

        Ok(Self { dir, templates })
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no template was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Looks up a template by logical name.
    ///
    /// # Errors
    ///
    /// Returns an error naming the file the template was expected in.
    pub fn get(&self, name: &str) -> Result<&TemplateFile> {
        self.templates.get(name).ok_or_else(|| {
            ConfigError::UnknownTemplate {
                name: name.to_string(),
                expected_path: self.dir.join(format!("{name}.yaml")),
            }
            .into()
        })
    }

    /// Returns the inheritance chain of `name`, root first.
    ///
    /// # Errors
    ///
    /// Returns an error if a template in the chain is unknown or the chain
    /// loops.
    pub fn chain(&self, name: &str) -> Result<Vec<&TemplateFile>> {
        let mut names: Vec<&str> = Vec::new();
        let mut chain = Vec::new();
        let mut current = Some(name);

        while let Some(name) = current {
            if names.contains(&name) {
                names.push(name);
                return Err(ConfigError::CircularTemplate {
                    cycle: names.join(" -> "),
                }
                .into());
            }
            let template = self.get(name)?;
            names.push(name);
            chain.push(template);
            current = template.extends.as_deref();
        }

        chain.reverse();
        Ok(chain)
    }
}

fn logical_name(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KennelError;
    use crate::resource::ResourceKind;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    #[test]
    fn test_names_are_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "monitors/base.yaml", "kind: monitor\n");
        write(dir.path(), "monitors/http/latency.yaml", "kind: monitor\nextends: monitors/base\n");
        write(dir.path(), "README.md", "ignored");

        let registry = TemplateRegistry::load(dir.path()).expect("load");
        assert_eq!(registry.len(), 2);
        let template = registry.get("monitors/http/latency").expect("registered");
        assert_eq!(template.kind, ResourceKind::Monitor);
    }

    #[test]
    fn test_chain_is_root_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.yaml", "kind: slo\nattributes:\n  name: a\n");
        write(dir.path(), "b.yaml", "kind: slo\nextends: a\nattributes:\n  name: b\n");
        write(dir.path(), "c.yaml", "kind: slo\nextends: b\nattributes:\n  name: c\n");

        let registry = TemplateRegistry::load(dir.path()).expect("load");
        let names: Vec<_> = registry
            .chain("c")
            .expect("chain")
            .iter()
            .map(|t| t.attributes["name"].clone())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_template_names_expected_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = TemplateRegistry::load(dir.path()).expect("load");
        let err = registry.get("monitors/missing").unwrap_err();
        let KennelError::Config(ConfigError::UnknownTemplate { name, expected_path }) = err else {
            panic!("unexpected error");
        };
        assert_eq!(name, "monitors/missing");
        assert_eq!(expected_path, dir.path().join("monitors/missing.yaml"));
    }

    #[test]
    fn test_cycle_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.yaml", "kind: monitor\nextends: b\n");
        write(dir.path(), "b.yaml", "kind: monitor\nextends: a\n");

        let registry = TemplateRegistry::load(dir.path()).expect("load");
        let err = registry.chain("a").unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let registry = TemplateRegistry::load("/nonexistent/kennel/templates").expect("load");
        assert!(registry.is_empty());
    }
}
