//! Host property storage
//!
//! Poll results are written into a host-owned key/value store. The store may
//! hold unrelated entries of any kind; only scalar `controller_` entries take
//! part in output reconciliation.

use crate::controller::sample::{InputSample, OutputName, SampleValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value kinds a host property can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Numeric or boolean, i.e. usable as a driver input
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            PropertyValue::Bool(_) | PropertyValue::Int(_) | PropertyValue::Float(_)
        )
    }

    /// Scalar value as a float, booleans reading as 0.0 / 1.0
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            PropertyValue::Int(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Text(_) | PropertyValue::List(_) => None,
        }
    }
}

impl From<SampleValue> for PropertyValue {
    fn from(value: SampleValue) -> Self {
        match value {
            SampleValue::Axis(v) => PropertyValue::Float(f64::from(v)),
            SampleValue::Button(pressed) => PropertyValue::Bool(pressed),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", if *b { "on" } else { "off" }),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(v) => write!(f, "{:.3}", v),
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::List(items) => write!(f, "[{} items]", items.len()),
        }
    }
}

/// Write side of a host property store
pub trait PropertySink {
    fn set(&mut self, name: &OutputName, value: PropertyValue);
}

/// In-memory property store keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.entries.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Entries whose name starts with `prefix`, in name order
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a PropertyValue)> + 'a {
        self.iter().filter(move |(name, _)| name.starts_with(prefix))
    }
}

impl PropertySink for PropertyBag {
    fn set(&mut self, name: &OutputName, value: PropertyValue) {
        self.entries.insert(name.as_str().to_string(), value);
    }
}

impl<'a> IntoIterator for &'a PropertyBag {
    type Item = (&'a str, &'a PropertyValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a PropertyValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Writes one entry per sample, overwriting earlier values of the same name
pub fn apply_samples<S: PropertySink + ?Sized>(sink: &mut S, samples: &[InputSample]) {
    for sample in samples {
        sink.set(&sample.name, sample.value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_overwrite_previous_values() {
        let mut bag = PropertyBag::new();
        let name = OutputName::axis("leftx");

        apply_samples(&mut bag, &[InputSample::axis(name.clone(), 0.5)]);
        apply_samples(&mut bag, &[InputSample::axis(name.clone(), -0.25)]);

        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get(name.as_str()), Some(&PropertyValue::Float(-0.25)));
    }

    #[test]
    fn buttons_become_bools() {
        let mut bag = PropertyBag::new();
        apply_samples(&mut bag, &[InputSample::button(OutputName::button("a"), true)]);
        assert_eq!(bag.get("controller_button_a"), Some(&PropertyValue::Bool(true)));
    }

    #[test]
    fn scalar_classification() {
        assert!(PropertyValue::Float(0.1).is_scalar());
        assert!(PropertyValue::Int(3).is_scalar());
        assert!(PropertyValue::Bool(false).is_scalar());
        assert!(!PropertyValue::Text("x".into()).is_scalar());
        assert!(!PropertyValue::List(vec![PropertyValue::Int(1)]).is_scalar());
        assert_eq!(PropertyValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(PropertyValue::Text("1".into()).as_f64(), None);
    }

    #[test]
    fn prefix_filter_keeps_order() {
        let mut bag = PropertyBag::new();
        bag.insert("controller_axis_b", PropertyValue::Float(0.0));
        bag.insert("controller_axis_a", PropertyValue::Float(0.0));
        bag.insert("location", PropertyValue::Float(0.0));

        let names: Vec<_> = bag.with_prefix("controller_axis_").map(|(n, _)| n).collect();
        assert_eq!(names, vec!["controller_axis_a", "controller_axis_b"]);
    }

    #[test]
    fn display_formats_values() {
        assert_eq!(PropertyValue::Float(0.12345).to_string(), "0.123");
        assert_eq!(PropertyValue::Bool(false).to_string(), "off");
    }
}
