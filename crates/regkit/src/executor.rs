//! Execution engine - converges resources in dependency order with parallelism
//!
//! Resources are grouped into levels: a resource lands in the first level
//! after all of its dependencies. Each level runs on a thread pool. State is
//! read again right before acting, so work done by an earlier level (a key
//! delete taking its values with it) is never repeated.

use crate::converge::Action;
use crate::path::RegistryPath;
use crate::plan::{PlanOutcome, plan_entry};
use crate::provider::Provider;
use crate::resolve::Edge;
use crate::resource::{Resource, ResourceId};
use anyhow::{Result, anyhow, bail};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Result of converging one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Already in the desired state
    NoChange,
    Created,
    Modified,
    Removed,
    Failed { error: String },
    Skipped { reason: String },
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }

    fn from_action(action: Action) -> Self {
        match action {
            Action::Noop => Self::NoChange,
            Action::Create => Self::Created,
            Action::Update => Self::Modified,
            Action::Delete => Self::Removed,
        }
    }
}

/// Counts of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn total(&self) -> usize {
        self.created + self.modified + self.removed + self.skipped + self.failed + self.no_change
    }

    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.removed += other.removed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.no_change += other.no_change;
    }

    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Decide but never write
    pub dry_run: bool,
    /// Worker threads per level
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
        }
    }
}

/// Progress callback for execution.
pub trait ProgressCallback: Send {
    /// Called before a dependency level starts
    fn on_level_start(&mut self, level: usize, count: usize);

    /// Called once per resource, in declaration order within a level
    fn on_resource_complete(&mut self, id: &ResourceId, result: &ApplyResult);

    fn on_level_complete(&mut self, _level: usize) {}
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_level_start(&mut self, _level: usize, _count: usize) {}
    fn on_resource_complete(&mut self, _id: &ResourceId, _result: &ApplyResult) {}
}

/// Group resource indices into dependency levels.
///
/// Edges naming unknown resources are ignored. Resources managing the same
/// path run one after another in declaration order, so the last declaration
/// wins. Fails on a cycle.
pub fn levels(resources: &[Resource], edges: &[Edge]) -> Result<Vec<Vec<usize>>> {
    let mut by_id: HashMap<&ResourceId, Vec<usize>> = HashMap::new();
    for (index, resource) in resources.iter().enumerate() {
        by_id.entry(resource.id()).or_default().push(index);
    }

    let mut dependencies: Vec<HashSet<usize>> = vec![HashSet::new(); resources.len()];
    let mut last_at: HashMap<&RegistryPath, usize> = HashMap::new();
    for (index, resource) in resources.iter().enumerate() {
        if let Some(previous) = last_at.insert(resource.path(), index) {
            dependencies[index].insert(previous);
        }
    }
    for edge in edges {
        let (Some(dependents), Some(targets)) = (by_id.get(&edge.dependent), by_id.get(&edge.dependency))
        else {
            continue;
        };
        for &dependent in dependents {
            dependencies[dependent].extend(targets.iter().filter(|&&t| t != dependent));
        }
    }

    let mut placed = vec![false; resources.len()];
    let mut remaining = resources.len();
    let mut levels = Vec::new();
    while remaining > 0 {
        let level: Vec<usize> = (0..resources.len())
            .filter(|&i| !placed[i] && dependencies[i].iter().all(|&d| placed[d]))
            .collect();
        if level.is_empty() {
            let stuck: Vec<String> = (0..resources.len())
                .filter(|&i| !placed[i])
                .map(|i| resources[i].id().to_string())
                .collect();
            bail!("dependency cycle among {}", stuck.join(", "));
        }
        for &i in &level {
            placed[i] = true;
        }
        remaining -= level.len();
        levels.push(level);
    }
    Ok(levels)
}

/// Converge every resource against `provider`.
///
/// Dependents of a resource that failed (or was skipped for that reason) are
/// skipped.
pub fn execute<P, C>(
    resources: &[Resource],
    edges: &[Edge],
    provider: &P,
    opts: &ExecuteOptions,
    progress: &mut C,
) -> Result<ExecuteSummary>
where
    P: Provider + ?Sized,
    C: ProgressCallback,
{
    let levels = levels(resources, edges)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .map_err(|e| anyhow!("Failed to create thread pool: {}", e))?;

    let mut dependencies: HashMap<&ResourceId, Vec<&ResourceId>> = HashMap::new();
    for edge in edges {
        dependencies
            .entry(&edge.dependent)
            .or_default()
            .push(&edge.dependency);
    }

    let mut broken: HashSet<&ResourceId> = HashSet::new();
    let mut summary = ExecuteSummary::default();

    for (number, level) in levels.iter().enumerate() {
        progress.on_level_start(number, level.len());

        let results: Arc<Mutex<Vec<(usize, ApplyResult)>>> = Arc::new(Mutex::new(Vec::new()));
        pool.install(|| {
            level.par_iter().for_each(|&index| {
                let resource = &resources[index];
                let blocked = dependencies
                    .get(resource.id())
                    .and_then(|deps| deps.iter().find(|d| broken.contains(*d)));
                let result = match blocked {
                    Some(dependency) => ApplyResult::Skipped {
                        reason: format!("dependency {dependency} did not converge"),
                    },
                    None => converge_one(resource, provider, opts.dry_run),
                };
                let mut guard = match results.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                guard.push((index, result));
            });
        });

        let mut results = match Arc::try_unwrap(results) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|p| p.into_inner()),
            Err(_) => bail!("Failed to unwrap results"),
        };
        results.sort_by_key(|(index, _)| *index);

        for (index, result) in &results {
            let id = resources[*index].id();
            let failed = matches!(result, ApplyResult::Failed { .. })
                || (matches!(result, ApplyResult::Skipped { .. }) && !opts.dry_run);
            if failed {
                broken.insert(id);
            }
            summary.add_result(result);
            progress.on_resource_complete(id, result);
        }
        progress.on_level_complete(number);
    }

    Ok(summary)
}

fn converge_one<P>(resource: &Resource, provider: &P, dry_run: bool) -> ApplyResult
where
    P: Provider + ?Sized,
{
    let entry = plan_entry(resource, provider);
    let decision = match entry.outcome {
        PlanOutcome::Decided(decision) => decision,
        PlanOutcome::Failed { error } => return ApplyResult::Failed { error },
    };
    if !decision.action.is_change() {
        return ApplyResult::NoChange;
    }
    if dry_run {
        return ApplyResult::Skipped {
            reason: format!("dry run: would {}", decision.action),
        };
    }
    match provider.apply(resource, decision.action) {
        Ok(()) => ApplyResult::from_action(decision.action),
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}
