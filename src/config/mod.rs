//! Configuration module for kennel.
//!
//! This module handles all definition-related functionality:
//! - Loading `kennel.yaml`, `.env` and environment overrides
//! - Discovering templates and layering attributes into records
//! - Validation of kennel ids and required attributes
//! - Project selection and definition fingerprints

mod filter;
mod hash;
mod layers;
mod loader;
mod parser;
mod registry;
mod spec;
mod validator;

pub use filter::ProjectFilter;
pub use hash::DefinitionHasher;
pub use layers::{RecordBuilder, SUPER, merge_layer};
pub use loader::{DefinitionLoader, Definitions};
pub use parser::{API_KEY_VAR, APP_KEY_VAR, ConfigParser, SETTINGS_FILE};
pub use registry::TemplateRegistry;
pub use spec::{DEFAULT_APP_URL, PartSpec, ProjectFile, ProjectSpec, Settings, TemplateFile};
pub use validator::{DefinitionValidator, Issue, ValidationResult, is_valid_kennel_id};
