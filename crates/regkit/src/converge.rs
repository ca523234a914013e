//! Convergence decisions: what to do with one resource given what is observed.

use crate::resource::Ensure;
use crate::value::{self, ValueData};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a path as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// Nothing exists at the path
    NotFound,
    /// The path exists; values carry their current data, keys carry `None`
    Present(Option<ValueData>),
}

impl Observed {
    pub fn key() -> Self {
        Observed::Present(None)
    }

    pub fn value(data: ValueData) -> Self {
        Observed::Present(Some(data))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Observed::Present(_))
    }

    /// Observed data, if a value is present.
    pub fn data(&self) -> Option<&ValueData> {
        match self {
            Observed::Present(data) => data.as_ref(),
            Observed::NotFound => None,
        }
    }
}

/// What has to happen to converge a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Noop,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_change(&self) -> bool {
        !matches!(self, Action::Noop)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Noop => "noop",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        })
    }
}

/// A managed property of a value resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    Type,
    Data,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Property::Type => "type",
            Property::Data => "data",
        })
    }
}

/// A property whose observed value differs from the desired one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub property: Property,
    /// Observed value, `None` if there is none
    pub from: Option<String>,
    pub to: String,
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.from {
            Some(from) => write!(f, "{} changed '{}' to '{}'", self.property, from, self.to),
            None => write!(f, "{} defined as '{}'", self.property, self.to),
        }
    }
}

/// An action together with the property changes that motivate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub changes: Vec<PropertyChange>,
}

impl Decision {
    fn bare(action: Action) -> Self {
        Self {
            action,
            changes: Vec::new(),
        }
    }
}

/// Decide the action for one resource.
///
/// `desired` is `None` for keys, which have no properties beyond existing.
pub fn decide(ensure: Ensure, desired: Option<&ValueData>, observed: &Observed) -> Action {
    evaluate(ensure, desired, observed).action
}

/// Decide the action for one resource and report mismatched properties.
pub fn evaluate(ensure: Ensure, desired: Option<&ValueData>, observed: &Observed) -> Decision {
    match (ensure, observed) {
        (Ensure::Absent, Observed::NotFound) => Decision::bare(Action::Noop),
        (Ensure::Absent, Observed::Present(_)) => Decision::bare(Action::Delete),
        (Ensure::Present, Observed::NotFound) => Decision::bare(Action::Create),
        (Ensure::Present, Observed::Present(current)) => {
            let changes = property_changes(desired, current.as_ref());
            let action = if changes.is_empty() {
                Action::Noop
            } else {
                Action::Update
            };
            Decision { action, changes }
        }
    }
}

fn property_changes(desired: Option<&ValueData>, current: Option<&ValueData>) -> Vec<PropertyChange> {
    let Some(desired) = desired else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    let value_type = desired.value_type();
    let current_type = current.map(ValueData::value_type);
    if current_type != Some(value_type) {
        changes.push(PropertyChange {
            property: Property::Type,
            from: current_type.map(|t| t.to_string()),
            to: value_type.to_string(),
        });
    }
    if !value::property_matches(value_type, current, desired) {
        changes.push(PropertyChange {
            property: Property::Data,
            from: current.map(ToString::to_string),
            to: desired.to_string(),
        });
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> ValueData {
        ValueData::String(s.to_string())
    }

    #[test]
    fn test_absent_transitions() {
        assert_eq!(decide(Ensure::Absent, None, &Observed::NotFound), Action::Noop);
        assert_eq!(decide(Ensure::Absent, None, &Observed::key()), Action::Delete);
        assert_eq!(
            decide(Ensure::Absent, Some(&string("x")), &Observed::value(string("y"))),
            Action::Delete
        );
    }

    #[test]
    fn test_present_transitions() {
        assert_eq!(decide(Ensure::Present, None, &Observed::NotFound), Action::Create);
        assert_eq!(decide(Ensure::Present, None, &Observed::key()), Action::Noop);
        assert_eq!(
            decide(Ensure::Present, Some(&string("x")), &Observed::value(string("y"))),
            Action::Update
        );
    }

    #[test]
    fn test_create_then_noop() {
        let desired = string("x");
        assert_eq!(
            decide(Ensure::Present, Some(&desired), &Observed::NotFound),
            Action::Create
        );
        // After the create, the store holds exactly the desired data.
        assert_eq!(
            decide(Ensure::Present, Some(&desired), &Observed::value(string("x"))),
            Action::Noop
        );
    }

    #[test]
    fn test_type_mismatch_is_an_update() {
        let decision = evaluate(
            Ensure::Present,
            Some(&ValueData::Expand("x".into())),
            &Observed::value(string("x")),
        );
        assert_eq!(decision.action, Action::Update);
        assert_eq!(decision.changes[0].property, Property::Type);
        assert_eq!(decision.changes[0].to_string(), "type changed 'string' to 'expand'");
    }

    #[test]
    fn test_binary_compares_case_insensitively() {
        let desired = ValueData::Binary("ca fe".into());
        let observed = Observed::value(ValueData::Binary("CA FE".into()));
        assert_eq!(decide(Ensure::Present, Some(&desired), &observed), Action::Noop);
    }

    #[test]
    fn test_array_change_is_rendered_joined() {
        let decision = evaluate(
            Ensure::Present,
            Some(&ValueData::Array(vec!["a".into(), "b".into()])),
            &Observed::value(ValueData::Array(vec!["b".into(), "a".into()])),
        );
        assert_eq!(decision.action, Action::Update);
        assert_eq!(decision.changes.len(), 1);
        assert_eq!(decision.changes[0].to_string(), "data changed 'b,a' to 'a,b'");
    }

    #[test]
    fn test_value_reported_without_data() {
        let decision = evaluate(Ensure::Present, Some(&ValueData::Dword(1)), &Observed::key());
        assert_eq!(decision.action, Action::Update);
        assert_eq!(decision.changes.len(), 2);
        assert_eq!(decision.changes[1].to_string(), "data defined as '1'");
    }

    #[test]
    fn test_every_change_converges() {
        let desired = [
            string("x"),
            ValueData::Array(vec!["a".into()]),
            ValueData::Dword(-1),
            ValueData::Qword(1 << 40),
            ValueData::Binary("00 ff".into()),
        ];
        for data in desired {
            let before = [Observed::NotFound, Observed::value(string("other"))];
            for observed in before {
                assert!(decide(Ensure::Present, Some(&data), &observed).is_change());
                let after = Observed::value(data.clone());
                assert_eq!(decide(Ensure::Present, Some(&data), &after), Action::Noop);
            }
        }
    }
}
