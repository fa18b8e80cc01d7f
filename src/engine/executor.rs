//! Applies a plan step by step, stopping at the first failure.
//!
//! Package operations are not transactional, so steps already applied are never rolled back;
//! the report keeps them so the caller knows exactly where the run stopped.

use std::fmt::Display;

use tracing::{error, info};

use super::plan::{OperationPlan, Step};
use crate::backend::{BackendError, Outcome, PackageBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed { step_index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedStep {
    pub index: usize,
    pub step: Step,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedStep {
    pub index: usize,
    pub step: Step,
    pub error: BackendError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    state: RunState,
    completed: Vec<CompletedStep>,
    failed: Option<FailedStep>,
    not_attempted: Vec<Step>,
}

impl Default for ExecutionReport {
    fn default() -> Self {
        Self {
            state: RunState::Pending,
            completed: Vec::new(),
            failed: None,
            not_attempted: Vec::new(),
        }
    }
}

impl ExecutionReport {
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn completed(&self) -> &[CompletedStep] {
        &self.completed
    }

    pub fn failed(&self) -> Option<&FailedStep> {
        self.failed.as_ref()
    }

    /// Steps after the failing one, which were never issued.
    pub fn not_attempted(&self) -> &[Step] {
        &self.not_attempted
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Succeeded
    }

    /// Whether any completed step changed the system.
    pub fn changed(&self) -> bool {
        self.completed.iter().any(|s| s.outcome.changed)
    }
}

impl Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for completed in &self.completed {
            writeln!(f, "[ok] {}: {}", completed.step, completed.outcome)?;
        }
        if let Some(failed) = &self.failed {
            writeln!(f, "[failed] {}: {}", failed.step, failed.error)?;
        }
        for step in &self.not_attempted {
            writeln!(f, "[skipped] {}", step)?;
        }
        match self.state {
            RunState::Succeeded if self.completed.is_empty() => {
                writeln!(f, "already converged, nothing to do")
            }
            RunState::Succeeded => writeln!(f, "converged in {} steps", self.completed.len()),
            RunState::Failed { step_index } => writeln!(
                f,
                "failed at step {} of {}",
                step_index + 1,
                self.completed.len() + 1 + self.not_attempted.len()
            ),
            RunState::Pending | RunState::Running => writeln!(f, "not finished"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    pub fn execute<B: PackageBackend + ?Sized>(
        &self,
        plan: OperationPlan,
        backend: &mut B,
    ) -> ExecutionReport {
        let mut report = ExecutionReport {
            state: RunState::Running,
            ..Default::default()
        };

        let mut steps = plan.into_iter().enumerate();
        for (index, step) in steps.by_ref() {
            info!(index, step = %step, "applying step");
            match apply(&step, backend) {
                Ok(outcome) => {
                    info!(index, step = %step, changed = outcome.changed, "{}", outcome);
                    report.completed.push(CompletedStep {
                        index,
                        step,
                        outcome,
                    });
                }
                Err(err) => {
                    error!(index, step = %step, "step failed: {}", err);
                    report.state = RunState::Failed { step_index: index };
                    report.failed = Some(FailedStep {
                        index,
                        step,
                        error: err,
                    });
                    break;
                }
            }
        }

        report.not_attempted = steps.map(|(_, step)| step).collect();
        if report.state == RunState::Running {
            report.state = RunState::Succeeded;
        }
        report
    }
}

fn apply<B: PackageBackend + ?Sized>(step: &Step, backend: &mut B) -> Result<Outcome, BackendError> {
    match step {
        Step::RegisterRepo(identifier) => backend.register_repo(identifier),
        Step::DeregisterRepo(identifier) => backend.deregister_repo(identifier),
        Step::RefreshMetadata => backend.refresh_metadata(),
        Step::InstallPackages(packages) => backend.install_packages(packages),
        Step::RemovePackages(packages) => backend.remove_packages(packages),
        Step::UpgradePackages(packages) => backend.upgrade_packages(packages),
        Step::UpgradeAll => backend.upgrade_all(),
    }
}
