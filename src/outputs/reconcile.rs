//! Output Set Reconciler
//!
//! Decides whether a host-built output structure still matches the outputs the
//! controller produces. The decision is plain set equality over names: any
//! added or removed output invalidates the whole structure, which is then
//! rebuilt from scratch. Nothing is patched incrementally.

use crate::controller::sample::{OutputName, CONTROLLER_PREFIX};
use crate::outputs::property::PropertyValue;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Unordered, duplicate-free set of output names
pub type OutputSet = BTreeSet<OutputName>;

/// Names of all scalar `controller_` entries of a property store
pub fn compute_desired_set<'a, I>(properties: I) -> OutputSet
where
    I: IntoIterator<Item = (&'a str, &'a PropertyValue)>,
{
    properties
        .into_iter()
        .filter(|(name, value)| name.starts_with(CONTROLLER_PREFIX) && value.is_scalar())
        .map(|(name, _)| OutputName::from(name))
        .collect()
}

/// True when the existing structure no longer matches the desired outputs
pub fn is_stale(existing: &OutputSet, desired: &OutputSet) -> bool {
    existing != desired
}

/// Host structure that exposes named output slots
///
/// Implemented by the host; the reconciler only reads it and drives a
/// [`RebuildPlan`] through it.
pub trait OutputStructure {
    /// Names of the slots the structure currently exposes
    fn output_names(&self) -> OutputSet;

    /// Destroys every slot
    fn clear(&mut self);

    /// Creates one slot
    fn add_output(&mut self, name: &OutputName);

    /// Binds a slot to the property entry of the same name
    fn bind_output(&mut self, name: &OutputName);
}

/// Full rebuild of an output structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildPlan {
    removed: OutputSet,
    added: OutputSet,
    outputs: OutputSet,
}

impl RebuildPlan {
    /// Returns a plan when `existing` is stale against `desired`
    pub fn for_sets(existing: &OutputSet, desired: &OutputSet) -> Option<Self> {
        if !is_stale(existing, desired) {
            return None;
        }

        Some(Self {
            removed: existing.difference(desired).cloned().collect(),
            added: desired.difference(existing).cloned().collect(),
            outputs: desired.clone(),
        })
    }

    /// Reads the structure's current outputs and plans against `desired`
    pub fn for_structure<S: OutputStructure + ?Sized>(
        structure: &S,
        desired: &OutputSet,
    ) -> Option<Self> {
        Self::for_sets(&structure.output_names(), desired)
    }

    /// Every output the rebuilt structure will have
    pub fn outputs(&self) -> &OutputSet {
        &self.outputs
    }

    /// Outputs that triggered the rebuild by disappearing
    pub fn removed(&self) -> &OutputSet {
        &self.removed
    }

    /// Outputs that triggered the rebuild by appearing
    pub fn added(&self) -> &OutputSet {
        &self.added
    }

    /// Discards the whole structure and recreates one bound slot per output
    pub fn apply<S: OutputStructure + ?Sized>(self, structure: &mut S) {
        info!(
            "Rebuilding outputs: {} total, +{} -{}",
            self.outputs.len(),
            self.added.len(),
            self.removed.len()
        );

        structure.clear();
        for name in &self.outputs {
            structure.add_output(name);
            structure.bind_output(name);
            debug!("Rebuilt output {}", name);
        }
    }
}

/// Rebuilds `structure` if it is stale against `desired`
///
/// Returns whether a rebuild happened.
pub fn reconcile<S: OutputStructure + ?Sized>(structure: &mut S, desired: &OutputSet) -> bool {
    match RebuildPlan::for_structure(structure, desired) {
        Some(plan) => {
            plan.apply(structure);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::property::PropertyBag;

    fn set(names: &[&str]) -> OutputSet {
        names.iter().map(|name| OutputName::from(*name)).collect()
    }

    #[test]
    fn identical_sets_are_not_stale() {
        let outputs = set(&["a", "b"]);
        assert!(!is_stale(&outputs, &outputs));
        assert!(!is_stale(&OutputSet::new(), &OutputSet::new()));
    }

    #[test]
    fn additions_and_removals_are_stale() {
        assert!(is_stale(&set(&["a", "b"]), &set(&["a", "b", "c"])));
        assert!(is_stale(&set(&["a", "b", "c"]), &set(&["a", "b"])));
        assert!(is_stale(&set(&["a"]), &set(&["b"])));
    }

    #[test]
    fn staleness_ignores_order() {
        assert!(!is_stale(&set(&["c", "a", "b"]), &set(&["b", "c", "a"])));
    }

    #[test]
    fn desired_set_filters_prefix_and_kind() {
        let mut bag = PropertyBag::new();
        bag.insert("controller_axis_leftx", PropertyValue::Float(0.5));
        bag.insert("controller_button_a", PropertyValue::Bool(true));
        bag.insert("controller_count", PropertyValue::Int(2));
        bag.insert("controller_label", PropertyValue::Text("pad".into()));
        bag.insert("controller_history", PropertyValue::List(Vec::new()));
        bag.insert("location", PropertyValue::Float(1.0));
        bag.insert("axis_controller_x", PropertyValue::Float(1.0));

        assert_eq!(
            compute_desired_set(&bag),
            set(&[
                "controller_axis_leftx",
                "controller_button_a",
                "controller_count"
            ])
        );
    }

    #[test]
    fn plan_lists_differences() {
        let plan = RebuildPlan::for_sets(&set(&["a", "b"]), &set(&["b", "c"])).unwrap();
        assert_eq!(plan.removed(), &set(&["a"]));
        assert_eq!(plan.added(), &set(&["c"]));
        assert_eq!(plan.outputs(), &set(&["b", "c"]));
        assert!(RebuildPlan::for_sets(&set(&["a"]), &set(&["a"])).is_none());
    }

    #[derive(Default)]
    struct Recorder {
        slots: Vec<String>,
        calls: Vec<String>,
    }

    impl OutputStructure for Recorder {
        fn output_names(&self) -> OutputSet {
            self.slots.iter().map(|s| OutputName::from(s.as_str())).collect()
        }

        fn clear(&mut self) {
            self.slots.clear();
            self.calls.push("clear".to_string());
        }

        fn add_output(&mut self, name: &OutputName) {
            self.slots.push(name.to_string());
            self.calls.push(format!("add {}", name));
        }

        fn bind_output(&mut self, name: &OutputName) {
            self.calls.push(format!("bind {}", name));
        }
    }

    #[test]
    fn rebuild_discards_everything_first() {
        let mut structure = Recorder {
            slots: vec!["controller_axis_x".into(), "controller_axis_y".into()],
            calls: Vec::new(),
        };

        assert!(reconcile(&mut structure, &set(&["controller_axis_x"])));
        assert_eq!(
            structure.calls,
            vec!["clear", "add controller_axis_x", "bind controller_axis_x"]
        );
        assert_eq!(structure.output_names(), set(&["controller_axis_x"]));
    }

    #[test]
    fn matching_structure_is_left_alone() {
        let mut structure = Recorder {
            slots: vec!["a".into()],
            calls: Vec::new(),
        };
        assert!(!reconcile(&mut structure, &set(&["a"])));
        assert!(structure.calls.is_empty());
    }
}
