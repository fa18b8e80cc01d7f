//! Convergence engine: reads the target state, plans the difference to the desired state and
//! applies it through a [PackageBackend].

pub mod cache_gate;
pub mod executor;
pub mod plan;
pub mod planner;
pub mod snapshot;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::backend::{BackendError, PackageBackend};
use crate::desired::DesiredState;
pub use executor::{ExecutionReport, Executor, RunState};
pub use plan::{OperationPlan, Step};
pub use planner::{Planner, PlannerOptions};
pub use snapshot::StateSnapshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvergeError {
    #[error("could not read the system state: `{0}`")]
    Snapshot(#[from] BackendError),
}

/// Runs convergence for a single target. The backend state is re-read on every call, so
/// re-running after a failure starts from whatever the previous run left behind.
pub struct Converger<B> {
    backend: B,
    planner: Planner,
    executor: Executor,
}

impl<B: PackageBackend> Converger<B> {
    pub fn new(backend: B, options: PlannerOptions) -> Self {
        Self {
            backend,
            planner: Planner::new(options),
            executor: Executor,
        }
    }

    /// Computes the plan without applying it.
    pub fn plan_only(
        &self,
        desired: &DesiredState,
        now: DateTime<Utc>,
    ) -> Result<OperationPlan, ConvergeError> {
        let snapshot = StateSnapshot::read(&self.backend)?;
        Ok(self.planner.plan(&snapshot, desired, now))
    }

    pub fn converge(
        &mut self,
        desired: &DesiredState,
        now: DateTime<Utc>,
    ) -> Result<ExecutionReport, ConvergeError> {
        let plan = self.plan_only(desired, now)?;
        info!(steps = plan.len(), "executing plan");
        Ok(self.executor.execute(plan, &mut self.backend))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}
