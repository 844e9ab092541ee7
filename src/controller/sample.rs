//! Polled input samples and their output names

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Namespace shared by every output this crate produces
pub const CONTROLLER_PREFIX: &str = "controller_";
pub const AXIS_PREFIX: &str = "controller_axis_";
pub const BUTTON_PREFIX: &str = "controller_button_";

/// Full-scale value of a raw signed 16-bit axis reading
pub const AXIS_FULL_SCALE: f32 = 32767.0;

/// Normalizes a raw signed 16-bit axis reading into `[-1.0, 1.0]`
///
/// The divisor is 32767, not 32768: positive full scale maps to exactly 1.0
/// and `i16::MIN` lands slightly below -1.0 before the clamp pulls it back.
pub fn normalize_axis(raw: i16) -> f32 {
    (f32::from(raw) / AXIS_FULL_SCALE).clamp(-1.0, 1.0)
}

/// Key correlating a sample with a host property and, downstream, an output slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputName(String);

impl OutputName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `controller_axis_<name>`
    pub fn axis(name: impl fmt::Display) -> Self {
        Self(format!("{AXIS_PREFIX}{name}"))
    }

    /// `controller_button_<name>`
    pub fn button(name: impl fmt::Display) -> Self {
        Self(format!("{BUTTON_PREFIX}{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_controller(&self) -> bool {
        self.0.starts_with(CONTROLLER_PREFIX)
    }

    pub fn is_axis(&self) -> bool {
        self.0.starts_with(AXIS_PREFIX)
    }

    pub fn is_button(&self) -> bool {
        self.0.starts_with(BUTTON_PREFIX)
    }

    /// Human readable label: prefix stripped, first letter capitalized
    pub fn label(&self) -> String {
        let short = self
            .0
            .strip_prefix(AXIS_PREFIX)
            .or_else(|| self.0.strip_prefix(BUTTON_PREFIX))
            .unwrap_or(&self.0);

        let mut chars = short.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for OutputName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OutputName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for OutputName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Value carried by a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    /// Normalized axis position in `[-1.0, 1.0]`
    Axis(f32),
    /// Button pressed state
    Button(bool),
}

/// One named reading produced by a poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    pub name: OutputName,
    pub value: SampleValue,
}

impl InputSample {
    pub fn axis(name: OutputName, value: f32) -> Self {
        Self {
            name,
            value: SampleValue::Axis(value),
        }
    }

    pub fn button(name: OutputName, pressed: bool) -> Self {
        Self {
            name,
            value: SampleValue::Button(pressed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalization_extremes() {
        assert_eq!(normalize_axis(i16::MIN), -1.0);
        assert_eq!(normalize_axis(i16::MAX), 1.0);
        assert_eq!(normalize_axis(0), 0.0);
        assert_eq!(normalize_axis(-32767), -1.0);
    }

    #[test]
    fn normalization_stays_in_range_for_every_reading() {
        for raw in i16::MIN..=i16::MAX {
            let value = normalize_axis(raw);
            assert!((-1.0..=1.0).contains(&value), "{raw} -> {value}");
        }
    }

    proptest! {
        #[test]
        fn normalization_preserves_sign(raw in any::<i16>()) {
            let value = normalize_axis(raw);
            prop_assert_eq!(value == 0.0, raw == 0);
            prop_assert_eq!(value < 0.0, raw < 0);
        }
    }

    #[test]
    fn output_names_are_namespaced() {
        let axis = OutputName::axis("leftx");
        let button = OutputName::button(3);
        assert_eq!(axis.as_str(), "controller_axis_leftx");
        assert_eq!(button.as_str(), "controller_button_3");
        assert!(axis.is_controller() && axis.is_axis() && !axis.is_button());
        assert!(button.is_controller() && button.is_button());
        assert!(!OutputName::from("location").is_controller());
    }

    #[test]
    fn labels_strip_prefix_and_capitalize() {
        assert_eq!(OutputName::axis("leftx").label(), "Leftx");
        assert_eq!(OutputName::button("dpup").label(), "Dpup");
        assert_eq!(OutputName::button(0).label(), "0");
        assert_eq!(OutputName::from("controller_axis_").label(), "");
    }
}
