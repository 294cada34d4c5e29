//! Settings parser and YAML helpers.
//!
//! This module loads `kennel.yaml` and the process environment, with
//! environment variables taking precedence over the file.

use crate::error::{ConfigError, KennelError, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::spec::Settings;

/// Settings file name looked up in the workspace root.
pub const SETTINGS_FILE: &str = "kennel.yaml";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "DATADOG_API_KEY";

/// Environment variable holding the application key.
pub const APP_KEY_VAR: &str = "DATADOG_APP_KEY";

/// Parser for workspace settings.
#[derive(Debug)]
pub struct ConfigParser {
    /// Workspace root, relative directories are resolved against it.
    root: PathBuf,
}

impl ConfigParser {
    /// Creates a parser for the workspace at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loads `kennel.yaml` if present, applies environment overrides and
    /// resolves directories against the workspace root.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be parsed.
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.root.join(SETTINGS_FILE);
        let mut settings = if path.exists() {
            info!("Loading settings from: {}", path.display());
            read_yaml(&path)?
        } else {
            debug!("{} not found, using defaults", path.display());
            Settings::default()
        };

        Self::apply_env_overrides(&mut settings);
        Ok(settings.rooted_at(&self.root))
    }

    /// Applies environment variable overrides to the settings.
    fn apply_env_overrides(settings: &mut Settings) {
        if let Ok(dir) = std::env::var("KENNEL_PROJECTS_DIR") {
            debug!("Overriding projects_dir from environment");
            settings.projects_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("KENNEL_GENERATED_DIR") {
            debug!("Overriding generated_dir from environment");
            settings.generated_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("DATADOG_API_URL") {
            debug!("Overriding api_url from environment");
            settings.api_url = url;
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self.root.join(".env");

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ConfigError::parse(
                    format!("Failed to load .env file: {e}"),
                    env_path.display().to_string(),
                )
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Gets the API and application keys from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing variable.
    pub fn credentials() -> Result<(String, String)> {
        Ok((required_env(API_KEY_VAR)?, required_env(APP_KEY_VAR)?))
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            KennelError::Config(ConfigError::MissingEnvVar {
                name: name.to_string(),
            })
        })
}

/// Reads and deserializes one YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::parse(
            format!("Failed to read file: {e}"),
            path.display().to_string(),
        )
    })?;

    serde_yaml::from_str(&content).map_err(|e| {
        ConfigError::parse(format!("YAML parse error: {e}"), path.display().to_string()).into()
    })
}

/// Lists every `*.yaml`/`*.yml` file below `dir`, sorted.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked.
pub fn collect_yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if matches!(path.extension().and_then(|s| s.to_str()), Some("yaml" | "yml")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_settings_use_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ConfigParser::new(dir.path()).load_settings().expect("settings");
        assert_eq!(settings.templates_dir, dir.path().join("templates"));
    }

    #[test]
    fn test_settings_file_is_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "templates_dir: defs/templates\napp_url: https://app.datadoghq.eu\n",
        )
        .expect("write");

        let settings = ConfigParser::new(dir.path()).load_settings().expect("settings");
        assert_eq!(settings.templates_dir, dir.path().join("defs/templates"));
        assert_eq!(settings.app_url, "https://app.datadoghq.eu");
    }

    #[test]
    fn test_invalid_settings_name_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILE), "projects_dir: [").expect("write");

        let err = ConfigParser::new(dir.path()).load_settings().unwrap_err();
        assert!(err.to_string().contains(SETTINGS_FILE));
    }

    #[test]
    fn test_collect_yaml_files_is_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("b")).expect("mkdir");
        fs::write(dir.path().join("b/x.yml"), "").expect("write");
        fs::write(dir.path().join("a.yaml"), "").expect("write");
        fs::write(dir.path().join("c.json"), "").expect("write");

        let files = collect_yaml_files(dir.path()).expect("walk");
        assert_eq!(
            files,
            vec![dir.path().join("a.yaml"), dir.path().join("b/x.yml")]
        );
    }
}
