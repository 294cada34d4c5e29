//! Plan executor for applying plans.
//!
//! Actions run one at a time in plan order. References are resolved again
//! right before each call, so ids returned by earlier creates in the same run
//! replace the placeholders the plan was computed with. The first failure
//! stops the run; nothing is retried or rolled back.

use tracing::{debug, info};

use crate::api::MonitoringApi;
use crate::error::{KennelError, PlanError, Result};
use crate::resource::{RemoteId, ResourceKind};

use super::normalize::canonicalize;
use super::plan::{ActionType, Plan, PlannedAction};
use super::resolver::resolve_references;

/// Executor for plans.
pub struct PlanExecutor<'a, A: MonitoringApi + ?Sized> {
    /// Remote API.
    api: &'a A,
    /// Web UI base URL used to link changed resources.
    app_url: &'a str,
}

/// Result of executing a single action.
#[derive(Debug, Clone)]
pub struct ActionResult {
    /// Action type that was applied.
    pub action_type: ActionType,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Tracking id of the affected record.
    pub tracking_id: String,
    /// Remote id, newly assigned for creates.
    pub remote_id: Option<RemoteId>,
    /// Link to the resource, absent for deletes.
    pub url: Option<String>,
}

/// Result of executing the entire plan.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// Individual action results, in execution order.
    pub results: Vec<ActionResult>,
}

impl<'a, A: MonitoringApi + ?Sized> PlanExecutor<'a, A> {
    /// Creates a new plan executor.
    #[must_use]
    pub const fn new(api: &'a A, app_url: &'a str) -> Self {
        Self { api, app_url }
    }

    /// Applies every change of `plan`.
    ///
    /// # Errors
    ///
    /// Returns the first failed mutation or unresolvable reference. Actions
    /// applied before it stay applied.
    pub async fn execute(&self, plan: &Plan) -> Result<ExecutionResult> {
        info!("Executing plan with {} changes", plan.changes().count());

        let mut tracking = plan.tracking().clone();
        let mut result = ExecutionResult::default();

        for action in plan.changes() {
            info!("{}", action.description());
            let applied = match action.action_type {
                ActionType::Create => {
                    let record = Self::record_of(action)?;
                    let attributes = canonicalize(&resolve_references(record, &tracking)?);
                    let id = self
                        .api
                        .create(action.kind, &attributes)
                        .await
                        .map_err(|e| mutation_failed(action, &e))?;
                    debug!("{} created as {id}", action.tracking_id);
                    tracking.mark_created(&action.tracking_id, id.clone());
                    self.applied(action, Some(id))
                }
                ActionType::Update => {
                    let record = Self::record_of(action)?;
                    let id = Self::remote_id_of(action)?;
                    let attributes = canonicalize(&resolve_references(record, &tracking)?);
                    self.api
                        .update(action.kind, id, &attributes)
                        .await
                        .map_err(|e| mutation_failed(action, &e))?;
                    self.applied(action, Some(id.clone()))
                }
                ActionType::Delete => {
                    let id = Self::remote_id_of(action)?;
                    self.api
                        .delete(action.kind, id)
                        .await
                        .map_err(|e| mutation_failed(action, &e))?;
                    ActionResult {
                        action_type: action.action_type,
                        kind: action.kind,
                        tracking_id: action.tracking_id.clone(),
                        remote_id: Some(id.clone()),
                        url: None,
                    }
                }
                ActionType::Noop => continue,
            };
            result.results.push(applied);
        }

        info!("Applied {} changes", result.results.len());
        Ok(result)
    }

    fn applied(&self, action: &PlannedAction, id: Option<RemoteId>) -> ActionResult {
        ActionResult {
            action_type: action.action_type,
            kind: action.kind,
            tracking_id: action.tracking_id.clone(),
            url: id.as_ref().map(|id| action.kind.url(self.app_url, id.as_str())),
            remote_id: id,
        }
    }

    fn record_of(action: &PlannedAction) -> Result<&crate::resource::Record> {
        action
            .record
            .as_ref()
            .ok_or_else(|| KennelError::internal(format!("{action} has no record")))
    }

    fn remote_id_of(action: &PlannedAction) -> Result<&RemoteId> {
        action
            .remote_id
            .as_ref()
            .ok_or_else(|| KennelError::internal(format!("{action} has no remote id")))
    }
}

fn mutation_failed(action: &PlannedAction, error: &KennelError) -> KennelError {
    KennelError::Plan(PlanError::MutationFailed {
        action: action.action_type.to_string(),
        tracking_id: action.tracking_id.clone(),
        reason: error.to_string(),
    })
}

impl ExecutionResult {
    /// Returns the number of applied actions of one type.
    #[must_use]
    pub fn count(&self, action_type: ActionType) -> usize {
        self.results
            .iter()
            .filter(|r| r.action_type == action_type)
            .count()
    }

    /// Results of applied creates.
    pub fn created(&self) -> impl Iterator<Item = &ActionResult> {
        self.results
            .iter()
            .filter(|r| r.action_type == ActionType::Create)
    }
}
