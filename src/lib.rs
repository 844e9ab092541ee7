//! Game controller input as named, normalized scalar values
//!
//! A [`DeviceSession`] owns one input device and turns each poll into a set of
//! `controller_axis_*` / `controller_button_*` samples. The host stores those in
//! a property bag; the reconciler then decides whether any structure built over
//! those names has gone stale and must be rebuilt.

pub mod config;
pub mod controller;
pub mod link;
pub mod outputs;

pub use config::LinkConfig;
pub use controller::{DeviceKind, DevicePreference, DeviceSession, InputSample, OutputName};
pub use link::{LinkSnapshot, LiveLink, TickReport};
pub use outputs::{compute_desired_set, is_stale, OutputGroup, PropertyBag, PropertyValue};
