//! Error types for kennel.
//!
//! This module provides the error hierarchy for every stage of a run:
//! loading definitions, resolving tracking ids, talking to the monitoring
//! API, planning, applying and generating snapshots.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for kennel.
#[derive(Debug, Error)]
pub enum KennelError {
    /// Definition and configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unresolvable or unsafely forced cross-resource references.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Monitoring API errors.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Planning and apply errors.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Snapshot generation errors.
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Definition and configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file or directory that was required does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A definition or settings file could not be parsed.
    #[error("Failed to parse {location}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// File the error originated from.
        location: String,
    },

    /// A definition failed validation.
    #[error("{message}")]
    Invalid {
        /// Description of the problem.
        message: String,
        /// Offending field, when known.
        field: Option<String>,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// A part references a template nobody registered.
    #[error("Unknown template `{name}`, expected it to be defined in {expected_path}")]
    UnknownTemplate {
        /// Logical template name that was referenced.
        name: String,
        /// File the template would have to live in.
        expected_path: PathBuf,
    },

    /// Templates extend each other in a loop.
    #[error("Circular template inheritance: {cycle}")]
    CircularTemplate {
        /// The chain of template names forming the loop.
        cycle: String,
    },

    /// Two records share one tracking id.
    #[error("{tracking_id} is defined {}, use a different kennel_id", times(*.count))]
    DuplicateTrackingId {
        /// The conflicting tracking id.
        tracking_id: String,
        /// How many definitions produce it.
        count: usize,
    },

    /// The project filter matched no project.
    #[error("Project filter `{filter}` matched nothing, available projects: {}", .available.join(", "))]
    FilterMatchedNothing {
        /// The filter as given by the operator.
        filter: String,
        /// Every project id that could have been selected.
        available: Vec<String>,
    },
}

/// Cross-resource reference errors, reported with the referencing record.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The referenced resource is created later in this run and the
    /// reference cannot wait for it.
    #[error(
        "{tracking_id} references {referenced}, which will only exist after this run completes and cannot be force-referenced yet; run again once it was created"
    )]
    ForcedNewReference {
        /// Tracking id of the referencing record.
        tracking_id: String,
        /// Tracking id that was referenced.
        referenced: String,
    },

    /// The referenced resource is unknown.
    #[error(
        "{tracking_id} references {referenced}, which neither exists remotely nor is scheduled for creation in this run"
    )]
    UnknownReference {
        /// Tracking id of the referencing record.
        tracking_id: String,
        /// Tracking id that was referenced.
        referenced: String,
    },

    /// A record claims an existing remote id that the API does not know.
    #[error("{tracking_id} takes over {kind} {id}, which does not exist remotely")]
    MissingTakeover {
        /// Tracking id of the record.
        tracking_id: String,
        /// Resource kind of the record.
        kind: String,
        /// The remote id it claims.
        id: String,
    },
}

/// Monitoring API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// API request returned a non-success status.
    #[error("API request failed: {status} - {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Authentication failed.
    #[error("API authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// Network error.
    #[error("Network error communicating with the API: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from API.
    #[error("Invalid response from the API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Planning and apply errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A mutating call failed while applying the plan.
    #[error("Failed to {action} {tracking_id}: {reason}")]
    MutationFailed {
        /// Action that was being applied.
        action: String,
        /// Tracking id of the affected record.
        tracking_id: String,
        /// Underlying failure.
        reason: String,
    },
}

/// Snapshot generation errors.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A snapshot could not be serialized.
    #[error("Failed to serialize {tracking_id}: {message}")]
    Serialization {
        /// Tracking id of the record.
        tracking_id: String,
        /// Serializer message.
        message: String,
    },

    /// A snapshot file could not be written or removed.
    #[error("Failed to {operation} {}: {message}", .path.display())]
    FileSystem {
        /// What was attempted.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO message.
        message: String,
    },

    /// A project or kennel id would place a path outside the snapshot directory.
    #[error("Refusing to use '{segment}' as a snapshot path below {}", .root.display())]
    OutsideRoot {
        /// Offending id.
        segment: String,
        /// Snapshot directory.
        root: PathBuf,
    },
}

/// Result type alias for kennel operations.
pub type Result<T> = std::result::Result<T, KennelError>;

fn times(count: usize) -> String {
    match count {
        2 => String::from("twice"),
        n => format!("{n} times"),
    }
}

impl KennelError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn invalid(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a parse error for the given file.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: location.into(),
        }
    }
}

impl ApiError {
    /// Creates an API request error.
    #[must_use]
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

impl GenerateError {
    /// Creates a file system error for the given path.
    #[must_use]
    pub fn fs(operation: &'static str, path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::FileSystem {
            operation,
            path: path.into(),
            message: err.to_string(),
        }
    }
}
