//! Computes the steps that move a target from its observed state to the desired one.
//!
//! Planning is pure: the same snapshot and desired state always give the same plan, and a
//! snapshot that already satisfies the desired state gives an empty plan.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::cache_gate::should_refresh;
use super::plan::{OperationPlan, Step};
use super::snapshot::StateSnapshot;
use crate::desired::{DesiredState, PackageRef, PackageSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PlannerOptions {
    /// Also force a metadata refresh after deregistering a source.
    pub refresh_on_deregister: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Planner {
    options: PlannerOptions,
}

impl Planner {
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    pub fn plan(
        &self,
        snapshot: &StateSnapshot,
        desired: &DesiredState,
        now: DateTime<Utc>,
    ) -> OperationPlan {
        let mut steps = Vec::new();
        let mut registered = false;
        let mut deregistered = false;

        for repo in desired.repos() {
            match (repo.present, snapshot.is_registered(&repo.identifier)) {
                (true, false) => {
                    registered = true;
                    steps.push(Step::RegisterRepo(repo.identifier.clone()));
                }
                (false, true) => {
                    deregistered = true;
                    steps.push(Step::DeregisterRepo(repo.identifier.clone()));
                }
                _ => {}
            }
        }

        let directive = desired.refresh();
        // new sources must be indexed before packages reference them, whatever the cache says
        let forced = registered
            || (deregistered && self.options.refresh_on_deregister)
            || directive.upgrade;
        if forced || should_refresh(snapshot.last_refresh_at, directive, now) {
            steps.push(Step::RefreshMetadata);
        }
        if directive.upgrade {
            steps.push(Step::UpgradeAll);
        }

        for spec in desired.packages() {
            steps.extend(package_steps(snapshot, spec));
        }

        let plan = OperationPlan::ordered(steps);
        for (index, step) in plan.steps().iter().enumerate() {
            debug!(index, step = %step, "planned step");
        }
        plan
    }
}

fn package_steps(snapshot: &StateSnapshot, spec: &PackageSpec) -> Vec<Step> {
    let mut steps = Vec::new();
    if spec.present {
        let missing = select(spec, |p| !snapshot.has_installed(p));
        if !missing.is_empty() {
            steps.push(Step::InstallPackages(missing));
        }
        if spec.latest {
            let upgradable = select(spec, |p| !p.is_pinned() && snapshot.has_installed(p));
            if !upgradable.is_empty() {
                steps.push(Step::UpgradePackages(upgradable));
            }
        }
    } else {
        let installed = select(spec, |p| snapshot.has_installed(p));
        if !installed.is_empty() {
            steps.push(Step::RemovePackages(installed));
        }
    }
    steps
}

fn select<F>(spec: &PackageSpec, predicate: F) -> Vec<PackageRef>
where
    F: Fn(&PackageRef) -> bool,
{
    spec.names
        .iter()
        .filter(|package| predicate(*package))
        .cloned()
        .collect()
}
