//! Planning module for reconciliation.
//!
//! This module compares desired records with the remote resources, resolves
//! tracking ids into remote ids and builds the plan the executor applies.

mod confirm;
mod diff;
mod executor;
mod normalize;
mod plan;
mod resolver;

pub use confirm::{AutoApprove, Confirmation, PromptConfirmation};
pub use diff::{Diff, DiffEntry, diff, values_equal};
pub use executor::{ActionResult, ExecutionResult, PlanExecutor};
pub use normalize::{canonicalize, normalize, suppress_defaults, suppress_kind_defaults};
pub use plan::{ActionType, Plan, PlannedAction};
pub use resolver::{MISSING_ID, TrackingEntry, TrackingMap, resolve, resolve_references};
