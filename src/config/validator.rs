//! Definition validation.
//!
//! Checks kennel ids before records are built and required attributes once
//! they are. Duplicate tracking ids are left to the generator, which sees
//! every project of a run at once.

use crate::error::{ConfigError, Result};
use crate::resource::{Record, ResourceKind};
use tracing::{debug, warn};

use super::spec::ProjectFile;

/// Validator for project definitions.
#[derive(Debug, Default)]
pub struct DefinitionValidator;

/// Validation result containing all issues found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<Issue>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct Issue {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl DefinitionValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates the ids of a project file.
    ///
    /// # Errors
    ///
    /// Returns the first invalid kennel id.
    pub fn validate_project(&self, file: &ProjectFile) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        check_kennel_id("project.kennel_id", &file.project.kennel_id, &mut result);
        if file.parts.is_empty() {
            result
                .warnings
                .push(format!("Project {} defines no parts", file.project.kennel_id));
        }
        for (i, part) in file.parts.iter().enumerate() {
            check_kennel_id(&format!("parts[{i}].kennel_id"), &part.kennel_id, &mut result);
        }

        finish(result)
    }

    /// Validates the attributes of a built record.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute the API requires is missing.
    pub fn validate_record(&self, record: &Record) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();
        let required: &[&str] = match record.kind() {
            ResourceKind::Monitor => &["name", "type", "query"],
            ResourceKind::Dashboard => &["title", "layout_type"],
            ResourceKind::Slo => &["name", "type", "thresholds"],
        };
        for key in required {
            let present = record
                .attributes()
                .get(*key)
                .is_some_and(|v| !v.is_null());
            if !present {
                result.errors.push(Issue {
                    field: format!("{}.{key}", record.tracking_id()),
                    message: format!("{} is missing required attribute {key}", record.tracking_id()),
                });
            }
        }

        finish(result)
    }
}

fn check_kennel_id(field: &str, id: &str, result: &mut ValidationResult) {
    if !is_valid_kennel_id(id) {
        result.errors.push(Issue {
            field: field.to_string(),
            message: format!(
                "kennel_id '{id}' is invalid. Must start with a lowercase letter or digit, followed by lowercase alphanumerics, `_`, `.` or `-`."
            ),
        });
    }
}

fn finish(result: ValidationResult) -> Result<ValidationResult> {
    for warning in &result.warnings {
        warn!("{warning}");
    }
    match result.errors.first() {
        None => {
            debug!("Definition validation passed");
            Ok(result)
        }
        Some(first) => Err(ConfigError::invalid(first.message.clone(), first.field.clone()).into()),
    }
}

/// Checks that a kennel id matches `[a-z0-9][a-z0-9_.-]*`.
///
/// Ids name snapshot directories and files, so `.` and `..` never pass.
#[must_use]
pub fn is_valid_kennel_id(id: &str) -> bool {
    id.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
}
