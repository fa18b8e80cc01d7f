use std::fmt::Display;

use crate::desired::{PackageRef, RepoIdentifier};

/// One concrete operation against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    RegisterRepo(RepoIdentifier),
    DeregisterRepo(RepoIdentifier),
    RefreshMetadata,
    InstallPackages(Vec<PackageRef>),
    RemovePackages(Vec<PackageRef>),
    UpgradePackages(Vec<PackageRef>),
    UpgradeAll,
}

impl Step {
    /// Position of the step kind in a plan. Sources are registered first, packages are removed
    /// while their sources still exist, and nothing is installed before the metadata refresh.
    fn rank(&self) -> u8 {
        match self {
            Step::RegisterRepo(_) => 0,
            Step::RemovePackages(_) => 1,
            Step::DeregisterRepo(_) => 2,
            Step::RefreshMetadata => 3,
            Step::InstallPackages(_) => 4,
            Step::UpgradePackages(_) => 5,
            Step::UpgradeAll => 6,
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |packages: &[PackageRef]| {
            packages
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };
        match self {
            Step::RegisterRepo(id) => write!(f, "register repo {}", id),
            Step::DeregisterRepo(id) => write!(f, "deregister repo {}", id),
            Step::RefreshMetadata => write!(f, "refresh metadata"),
            Step::InstallPackages(packages) => write!(f, "install {}", join(packages)),
            Step::RemovePackages(packages) => write!(f, "remove {}", join(packages)),
            Step::UpgradePackages(packages) => write!(f, "upgrade {}", join(packages)),
            Step::UpgradeAll => write!(f, "upgrade all packages"),
        }
    }
}

/// Ordered steps that bring the target to the desired state. Consumed once by the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationPlan {
    steps: Vec<Step>,
}

impl OperationPlan {
    /// Orders the steps by kind, keeping the relative order of steps of the same kind.
    pub fn ordered(mut steps: Vec<Step>) -> Self {
        steps.sort_by_key(Step::rank);
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl IntoIterator for OperationPlan {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl Display for OperationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.steps.is_empty() {
            return writeln!(f, "nothing to do");
        }
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "{}. {}", index + 1, step)?;
        }
        Ok(())
    }
}
