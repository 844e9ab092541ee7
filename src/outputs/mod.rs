//! Host-facing outputs: property storage and structure reconciliation

pub mod group;
pub mod property;
pub mod reconcile;

pub use group::{Binding, BindingId, OutputGroup, OutputSlot};
pub use property::{apply_samples, PropertyBag, PropertySink, PropertyValue};
pub use reconcile::{
    compute_desired_set, is_stale, reconcile, OutputSet, OutputStructure, RebuildPlan,
};
