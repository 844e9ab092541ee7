//! Semantic layout of a mapped game controller
//!
//! Axes and buttons of a standardized controller are addressed by a fixed
//! vocabulary of string names (`leftx`, `a`, `dpup`, ...). These names end up
//! in every [`OutputName`](super::sample::OutputName) a mapped device produces,
//! so they must stay stable across backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axes of a standardized controller, in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControllerAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    TriggerLeft,
    TriggerRight,
}

impl ControllerAxis {
    pub const ALL: [ControllerAxis; 6] = [
        ControllerAxis::LeftX,
        ControllerAxis::LeftY,
        ControllerAxis::RightX,
        ControllerAxis::RightY,
        ControllerAxis::TriggerLeft,
        ControllerAxis::TriggerRight,
    ];

    /// Standardized string name of the axis
    pub fn name(self) -> &'static str {
        match self {
            ControllerAxis::LeftX => "leftx",
            ControllerAxis::LeftY => "lefty",
            ControllerAxis::RightX => "rightx",
            ControllerAxis::RightY => "righty",
            ControllerAxis::TriggerLeft => "lefttrigger",
            ControllerAxis::TriggerRight => "righttrigger",
        }
    }

    /// Looks an axis up by its standardized name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.name() == name)
    }

    pub fn is_trigger(self) -> bool {
        matches!(self, ControllerAxis::TriggerLeft | ControllerAxis::TriggerRight)
    }
}

impl fmt::Display for ControllerAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Buttons of a standardized controller, in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControllerButton {
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

impl ControllerButton {
    pub const ALL: [ControllerButton; 15] = [
        ControllerButton::A,
        ControllerButton::B,
        ControllerButton::X,
        ControllerButton::Y,
        ControllerButton::Back,
        ControllerButton::Guide,
        ControllerButton::Start,
        ControllerButton::LeftStick,
        ControllerButton::RightStick,
        ControllerButton::LeftShoulder,
        ControllerButton::RightShoulder,
        ControllerButton::DPadUp,
        ControllerButton::DPadDown,
        ControllerButton::DPadLeft,
        ControllerButton::DPadRight,
    ];

    /// Standardized string name of the button
    pub fn name(self) -> &'static str {
        match self {
            ControllerButton::A => "a",
            ControllerButton::B => "b",
            ControllerButton::X => "x",
            ControllerButton::Y => "y",
            ControllerButton::Back => "back",
            ControllerButton::Guide => "guide",
            ControllerButton::Start => "start",
            ControllerButton::LeftStick => "leftstick",
            ControllerButton::RightStick => "rightstick",
            ControllerButton::LeftShoulder => "leftshoulder",
            ControllerButton::RightShoulder => "rightshoulder",
            ControllerButton::DPadUp => "dpup",
            ControllerButton::DPadDown => "dpdown",
            ControllerButton::DPadLeft => "dpleft",
            ControllerButton::DPadRight => "dpright",
        }
    }

    /// Looks a button up by its standardized name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|button| button.name() == name)
    }
}

impl fmt::Display for ControllerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
