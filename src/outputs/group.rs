//! In-memory output structure
//!
//! [`OutputGroup`] is a named-slot collection implementing [`OutputStructure`].
//! Each slot is bound to the property entry of the same name. Binding objects
//! are cached per name and outlive rebuilds, so a slot that reappears after a
//! rebuild gets its previous binding back.

use crate::controller::sample::OutputName;
use crate::outputs::property::PropertyBag;
use crate::outputs::reconcile::{OutputSet, OutputStructure};
use std::collections::HashMap;
use tracing::debug;

/// Identifier of a live binding `output = lookup(sink, source)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub id: BindingId,
    /// Property entry the binding reads
    pub source: OutputName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSlot {
    pub name: OutputName,
    pub binding: Option<BindingId>,
}

#[derive(Debug, Default)]
pub struct OutputGroup {
    slots: Vec<OutputSlot>,
    bindings: HashMap<OutputName, Binding>,
    next_binding: u64,
    rebuilds: u64,
}

impl OutputGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[OutputSlot] {
        &self.slots
    }

    pub fn binding(&self, name: &OutputName) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Number of times the group was cleared
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Evaluates every slot's binding against `bag`
    ///
    /// Unbound slots and missing or non-scalar entries resolve to `None`.
    pub fn resolve(&self, bag: &PropertyBag) -> Vec<(OutputName, Option<f64>)> {
        self.slots
            .iter()
            .map(|slot| {
                let value = slot
                    .binding
                    .and_then(|id| self.bindings.values().find(|b| b.id == id))
                    .and_then(|binding| bag.get(binding.source.as_str()))
                    .and_then(|value| value.as_f64());
                (slot.name.clone(), value)
            })
            .collect()
    }
}

impl OutputStructure for OutputGroup {
    fn output_names(&self) -> OutputSet {
        self.slots.iter().map(|slot| slot.name.clone()).collect()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.rebuilds += 1;
    }

    fn add_output(&mut self, name: &OutputName) {
        if self.slots.iter().any(|slot| &slot.name == name) {
            return;
        }
        self.slots.push(OutputSlot {
            name: name.clone(),
            binding: None,
        });
    }

    fn bind_output(&mut self, name: &OutputName) {
        let binding = match self.bindings.get(name) {
            Some(binding) => {
                debug!("Reusing binding {:?} for {}", binding.id, name);
                binding.id
            }
            None => {
                let id = BindingId(self.next_binding);
                self.next_binding += 1;
                self.bindings.insert(
                    name.clone(),
                    Binding {
                        id,
                        source: name.clone(),
                    },
                );
                id
            }
        };

        if let Some(slot) = self.slots.iter_mut().find(|slot| &slot.name == name) {
            slot.binding = Some(binding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::property::PropertyValue;
    use crate::outputs::reconcile::reconcile;

    fn set(names: &[&str]) -> OutputSet {
        names.iter().map(|name| OutputName::from(*name)).collect()
    }

    #[test]
    fn rebuild_leaves_exactly_the_desired_slots() {
        let mut group = OutputGroup::new();
        reconcile(&mut group, &set(&["controller_axis_a", "controller_axis_b"]));

        assert!(reconcile(&mut group, &set(&["controller_axis_x"])));
        let names: Vec<_> = group.slots().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["controller_axis_x"]);
        assert!(group.slots()[0].binding.is_some());
    }

    #[test]
    fn bindings_survive_rebuilds() {
        let mut group = OutputGroup::new();
        let a = OutputName::from("controller_axis_a");

        reconcile(&mut group, &set(&["controller_axis_a"]));
        let first = group.binding(&a).unwrap().id;

        reconcile(&mut group, &set(&["controller_axis_a", "controller_axis_b"]));
        assert_eq!(group.rebuilds(), 2);
        assert_eq!(group.binding(&a).unwrap().id, first);
        assert_ne!(
            group.binding(&OutputName::from("controller_axis_b")).unwrap().id,
            first
        );
    }

    #[test]
    fn resolve_reads_bound_properties() {
        let mut group = OutputGroup::new();
        reconcile(
            &mut group,
            &set(&["controller_axis_x", "controller_button_a", "controller_axis_gone"]),
        );

        let mut bag = PropertyBag::new();
        bag.insert("controller_axis_x", PropertyValue::Float(0.25));
        bag.insert("controller_button_a", PropertyValue::Bool(true));

        let resolved = group.resolve(&bag);
        assert_eq!(
            resolved,
            vec![
                (OutputName::from("controller_axis_gone"), None),
                (OutputName::from("controller_axis_x"), Some(0.25)),
                (OutputName::from("controller_button_a"), Some(1.0)),
            ]
        );
    }

    #[test]
    fn duplicate_slots_are_ignored() {
        let mut group = OutputGroup::new();
        let name = OutputName::from("controller_axis_x");
        group.add_output(&name);
        group.add_output(&name);
        assert_eq!(group.slots().len(), 1);
        assert!(group.slots()[0].binding.is_none());
    }
}
