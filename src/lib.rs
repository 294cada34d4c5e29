// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Kennel
//!
//! Declarative, idempotent management of monitors, dashboards and service
//! level objectives.
//!
//! ## Overview
//!
//! Resources are defined in YAML project files, optionally built from shared
//! templates. Kennel turns every definition into a record, writes a snapshot
//! of it, compares it with what the monitoring service holds and applies the
//! difference once confirmed.
//!
//! Every managed resource carries a marker naming its tracking id,
//! `"<project>:<part>"`. Resources without one are never touched.
//!
//! ## Architecture
//!
//! 1. **Desired State**: records built from `projects/` and `templates/`
//! 2. **Observed State**: every resource listed from the API
//! 3. **Plan**: create, update, delete or nothing per tracking id
//! 4. **Apply**: one call per change, ids from creates feed later references
//!
//! References between resources use tracking ids. A reference to a resource
//! created in the same run gets a placeholder id when it can wait for the
//! next run, and fails when it cannot.
//!
//! ## Modules
//!
//! - [`config`]: Settings, templates and definition loading
//! - [`resource`]: Records and resource kinds
//! - [`api`]: Monitoring API trait and HTTP client
//! - [`planner`]: Normalization, diffing, reference resolution and plans
//! - [`generator`]: Snapshot files
//! - [`reconciler`]: The plan and apply pipeline
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! project:
//!   kennel_id: payments
//!   team: billing
//!   mention: "@slack-billing"
//!
//! parts:
//!   - kind: monitor
//!     kennel_id: error_rate
//!     template: monitors/error_rate
//!     attributes:
//!       name: Payments error rate
//!       query: "sum(last_5m):sum:payments.errors{*}.as_count() > 10"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod planner;
pub mod reconciler;
pub mod resource;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{DatadogClient, MonitoringApi};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, DefinitionLoader, ProjectFilter, Settings};
pub use error::{KennelError, Result};
pub use generator::SnapshotGenerator;
pub use planner::{Plan, PlanExecutor};
pub use reconciler::{SyncOutcome, Syncer};
pub use resource::{ActualRecord, Record, ResourceKind};
