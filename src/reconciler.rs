//! Reconciler tying the pipeline together.
//!
//! A run generates snapshots, reads every remote resource, builds a plan and,
//! for `update`, applies it once the operator confirmed. Rendering stays with
//! the caller so the plan can be shown before the confirmation prompt.

use tracing::{info, warn};

use crate::api::{MonitoringApi, fetch_takeovers, list_all};
use crate::config::ProjectFilter;
use crate::error::Result;
use crate::generator::{GenerateResult, SnapshotGenerator};
use crate::planner::{Confirmation, ExecutionResult, Plan, PlanExecutor};
use crate::resource::Record;

/// Prompt shown before a plan is applied.
pub const CONFIRM_PROMPT: &str = "Execute Plan?";

/// Reconciler for one run.
pub struct Syncer<'a, A: MonitoringApi + ?Sized> {
    /// Remote API.
    api: &'a A,
    /// Snapshot writer.
    generator: SnapshotGenerator,
    /// Selected projects.
    filter: &'a ProjectFilter,
    /// Web UI base URL.
    app_url: &'a str,
}

/// Result of an apply attempt.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The plan had no mutating action.
    NoChanges,
    /// The operator declined; nothing was changed.
    Declined,
    /// The plan was applied.
    Applied(ExecutionResult),
}

impl<'a, A: MonitoringApi + ?Sized> Syncer<'a, A> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(
        api: &'a A,
        generator: SnapshotGenerator,
        filter: &'a ProjectFilter,
        app_url: &'a str,
    ) -> Self {
        Self {
            api,
            generator,
            filter,
            app_url,
        }
    }

    /// Writes snapshots for `records`.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate tracking ids or file system failures.
    pub fn generate(&self, records: &[Record]) -> Result<GenerateResult> {
        self.generator.generate(records, self.filter)
    }

    /// Generates snapshots, reads the remote state and builds a plan.
    ///
    /// Resources taken over by id are read in full before diffing.
    ///
    /// No remote resource is modified.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails, a list call fails or a reference
    /// cannot be resolved.
    pub async fn plan(&self, records: &[Record]) -> Result<Plan> {
        self.generate(records)?;

        let mut actual = list_all(self.api).await?;
        fetch_takeovers(self.api, records, &mut actual).await?;
        info!("Found {} remote resources", actual.len());

        let plan = Plan::build(records, &actual, self.filter)?;
        info!(
            "Plan has {} changes for {} records",
            plan.changes().count(),
            records.len()
        );
        Ok(plan)
    }

    /// Applies `plan` once `confirmation` approves it.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be asked or a mutation fails.
    pub async fn apply(
        &self,
        plan: &Plan,
        confirmation: &mut dyn Confirmation,
    ) -> Result<SyncOutcome> {
        if plan.is_empty() {
            return Ok(SyncOutcome::NoChanges);
        }

        if !confirmation.confirm(CONFIRM_PROMPT)? {
            warn!("Plan was not confirmed, nothing changed");
            return Ok(SyncOutcome::Declined);
        }

        let result = PlanExecutor::new(self.api, self.app_url).execute(plan).await?;
        Ok(SyncOutcome::Applied(result))
    }
}
