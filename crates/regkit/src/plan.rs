//! Planning - what every resource would do against the current provider state

use crate::converge::{self, Action, Decision};
use crate::path::RegistryPath;
use crate::provider::Provider;
use crate::resource::{Ensure, Resource, ResourceId};
use anyhow::{Result, anyhow};
use rayon::prelude::*;
use serde::Serialize;

/// Planned outcome for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    Decided(Decision),
    /// The provider could not read the current state
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub id: ResourceId,
    pub path: RegistryPath,
    pub ensure: Ensure,
    pub outcome: PlanOutcome,
}

impl PlanEntry {
    /// The decided action, if the state could be read.
    pub fn action(&self) -> Option<Action> {
        match &self.outcome {
            PlanOutcome::Decided(decision) => Some(decision.action),
            PlanOutcome::Failed { .. } => None,
        }
    }

    pub fn is_change(&self) -> bool {
        self.action().is_some_and(|a| a.is_change())
    }
}

/// Plan for a resource set, in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    /// Entries that would change something.
    pub fn changes(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| e.is_change())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, PlanOutcome::Failed { .. }))
    }

    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some()
    }

    /// Number of entries per action.
    pub fn count(&self, action: Action) -> usize {
        self.entries
            .iter()
            .filter(|e| e.action() == Some(action))
            .count()
    }
}

/// Observe every resource and decide what it needs.
///
/// Reads run on a pool of `jobs` threads. A failed read fails only its own
/// entry.
pub fn compute_plan<P>(resources: &[Resource], provider: &P, jobs: usize) -> Result<Plan>
where
    P: Provider + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| anyhow!("Failed to create thread pool: {}", e))?;

    let entries = pool.install(|| {
        resources
            .par_iter()
            .map(|resource| plan_entry(resource, provider))
            .collect()
    });
    Ok(Plan { entries })
}

pub(crate) fn plan_entry<P>(resource: &Resource, provider: &P) -> PlanEntry
where
    P: Provider + ?Sized,
{
    let outcome = match provider.read(resource.path()) {
        Ok(observed) => PlanOutcome::Decided(converge::evaluate(
            resource.ensure(),
            resource.desired(),
            &observed,
        )),
        Err(e) => PlanOutcome::Failed {
            error: format!("{e:#}"),
        },
    };
    PlanEntry {
        id: resource.id().clone(),
        path: resource.path().clone(),
        ensure: resource.ensure(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converge::Observed;
    use crate::path::{KeyPath, ValuePath};
    use crate::provider::MemoryProvider;
    use crate::resource::{Declaration, validate_all};
    use crate::value::{ValueData, ValueType};

    fn resources(declarations: &[Declaration]) -> Vec<Resource> {
        validate_all(declarations).resources
    }

    struct BrokenProvider;

    impl Provider for BrokenProvider {
        fn read(&self, _path: &RegistryPath) -> Result<Observed> {
            anyhow::bail!("access denied")
        }
        fn create_key(&self, _path: &KeyPath) -> Result<()> {
            Ok(())
        }
        fn write_value(&self, _path: &ValuePath, _data: &ValueData) -> Result<()> {
            Ok(())
        }
        fn delete(&self, _path: &RegistryPath) -> Result<()> {
            Ok(())
        }
        fn list_child_keys(&self, _path: &KeyPath) -> Result<Vec<KeyPath>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_plan_against_empty_registry() {
        let resources = resources(&[
            Declaration::key("HKLM\\Software\\Vendor"),
            Declaration::value("HKLM\\Software\\Vendor\\Name", ValueType::String, "x"),
            Declaration::key("HKLM\\Software\\Gone").with_ensure(Ensure::Absent),
        ]);
        let plan = compute_plan(&resources, &MemoryProvider::new(), 2).unwrap();
        let actions: Vec<_> = plan.entries.iter().map(PlanEntry::action).collect();
        assert_eq!(
            actions,
            vec![Some(Action::Create), Some(Action::Create), Some(Action::Noop)]
        );
        assert_eq!(plan.count(Action::Create), 2);
        assert!(plan.has_changes());
    }

    #[test]
    fn test_plan_reports_property_changes() {
        let provider = MemoryProvider::new();
        provider.create_key(&KeyPath::parse("HKCU\\Software").unwrap()).unwrap();
        provider
            .write_value(
                &ValuePath::parse("HKCU\\Software\\Count").unwrap(),
                &ValueData::Dword(1),
            )
            .unwrap();
        let resources = resources(&[Declaration::value(
            "HKCU\\Software\\Count",
            ValueType::Dword,
            "2",
        )]);
        let plan = compute_plan(&resources, &provider, 1).unwrap();
        let PlanOutcome::Decided(decision) = &plan.entries[0].outcome else {
            panic!("expected a decision");
        };
        assert_eq!(decision.action, Action::Update);
        assert_eq!(decision.changes[0].to_string(), "data changed '1' to '2'");
    }

    #[test]
    fn test_read_failures_stay_per_entry() {
        let resources = resources(&[
            Declaration::key("HKLM\\Software\\A"),
            Declaration::key("HKLM\\Software\\B"),
        ]);
        let plan = compute_plan(&resources, &BrokenProvider, 4).unwrap();
        assert_eq!(plan.failures().count(), 2);
        assert!(!plan.has_changes());
        assert!(matches!(
            &plan.entries[0].outcome,
            PlanOutcome::Failed { error } if error == "access denied"
        ));
    }

    #[test]
    fn test_plan_keeps_declaration_order() {
        let declarations: Vec<Declaration> = (0..32)
            .map(|i| Declaration::key(format!("HKLM\\Software\\K{i}")))
            .collect();
        let resources = resources(&declarations);
        let plan = compute_plan(&resources, &MemoryProvider::new(), 8).unwrap();
        for (entry, resource) in plan.entries.iter().zip(&resources) {
            assert_eq!(&entry.id, resource.id());
        }
    }
}
