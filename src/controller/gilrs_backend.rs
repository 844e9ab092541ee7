//! gilrs implementation of [`DeviceBackend`]
//!
//! gilrs reports axes as `f32` in `[-1.0, 1.0]` with Y pointing up. Readings are
//! converted back to the signed 16-bit, Y-down convention of standardized
//! controller mappings so both backends feed the same normalization.
//!
//! Raw joystick reads go through a second, unmapped `gilrs_core` context. Its
//! gamepads list every axis and button code up front, so a raw device's index
//! table is fixed when it is opened and never depends on which controls have
//! moved.

use super::backend::{DeviceBackend, DeviceError, DeviceHandle};
use super::layout::{ControllerAxis, ControllerButton};
use super::sample::AXIS_FULL_SCALE;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs, MappingSource};
use gilrs_core::EventType as RawEventType;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

pub struct GilrsBackend {
    gilrs: Gilrs,
    // None when the platform offers no unmapped view, raw reads then report nothing
    core: Option<gilrs_core::Gilrs>,
    // Enumeration index -> gamepad held open under it
    open: HashMap<usize, OpenGamepad>,
}

struct OpenGamepad {
    id: GamepadId,
    raw: Option<RawLayout>,
}

impl GilrsBackend {
    /// Initializes the gilrs context
    pub fn new() -> Result<Self, DeviceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(DeviceError::BackendUnavailable(e.to_string()));
            }
        };

        for (idx, (id, gamepad)) in gilrs.gamepads().enumerate() {
            info!(
                "  [{}] ID: {}, Name: {}, Mapping: {:?}",
                idx,
                id,
                gamepad.name(),
                gamepad.mapping_source()
            );
        }

        let core = match gilrs_core::Gilrs::new() {
            Ok(core) => Some(core),
            Err(e) => {
                warn!("Raw joystick access unavailable: {}", e);
                None
            }
        };

        Ok(Self {
            gilrs,
            core,
            open: HashMap::new(),
        })
    }

    fn id_at(&self, index: usize) -> Option<GamepadId> {
        self.gilrs.gamepads().nth(index).map(|(id, _)| id)
    }

    fn gamepad(&self, handle: &DeviceHandle) -> Option<Gamepad<'_>> {
        let open = self.open.get(&handle.index())?;
        self.gilrs.connected_gamepad(open.id)
    }

    fn raw_layout(&self, handle: &DeviceHandle) -> Option<&RawLayout> {
        self.gamepad(handle)?;
        self.open.get(&handle.index())?.raw.as_ref()
    }

    // Finds the unmapped twin of a gilrs gamepad that no open handle holds yet
    fn raw_layout_for(&self, id: GamepadId) -> Option<RawLayout> {
        let core = self.core.as_ref()?;
        let gamepad = self.gilrs.connected_gamepad(id)?;
        let taken: Vec<usize> = self
            .open
            .values()
            .filter_map(|open| open.raw.as_ref().map(|raw| raw.core_id))
            .collect();

        let core_id = (0..core.last_gamepad_hint()).find(|core_id| {
            !taken.contains(core_id)
                && core.gamepad(*core_id).is_some_and(|raw| {
                    raw.is_connected()
                        && raw.uuid() == gamepad.uuid()
                        && raw.name() == gamepad.os_name()
                })
        })?;
        let raw = core.gamepad(core_id)?;

        let layout = RawLayout::new(
            core_id,
            raw.axes().iter().map(|code| {
                let range = raw.axis_info(*code).map(|info| (info.min, info.max));
                (code.into_u32(), range)
            }),
            raw.buttons().iter().map(|code| code.into_u32()),
        );
        debug!(
            "Raw layout of gamepad {}: {} axes, {} buttons",
            id,
            layout.axes.len(),
            layout.buttons.len()
        );
        Some(layout)
    }
}

impl DeviceBackend for GilrsBackend {
    fn refresh(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Controller {} connected", id),
                EventType::Disconnected => {
                    if self.open.values().any(|open| open.id == id) {
                        warn!("Active controller {} disconnected", id);
                    } else {
                        debug!("Controller {} disconnected", id);
                    }
                }
                _ => {}
            }
        }

        if let Some(core) = self.core.as_mut() {
            while let Some(event) = core.next_event() {
                let Some(layout) = self
                    .open
                    .values_mut()
                    .filter_map(|open| open.raw.as_mut())
                    .find(|raw| raw.core_id == event.id)
                else {
                    continue;
                };
                match event.event {
                    RawEventType::AxisValueChanged(value, code) => {
                        layout.record_axis(code.into_u32(), value)
                    }
                    RawEventType::ButtonPressed(code) => layout.record_button(code.into_u32(), true),
                    RawEventType::ButtonReleased(code) => {
                        layout.record_button(code.into_u32(), false)
                    }
                    _ => {}
                }
            }
        }
    }

    fn count(&self) -> usize {
        self.gilrs.gamepads().count()
    }

    fn is_standard_controller_at(&self, index: usize) -> bool {
        self.gilrs
            .gamepads()
            .nth(index)
            .is_some_and(|(_, gamepad)| gamepad.mapping_source() != MappingSource::None)
    }

    fn open(&mut self, index: usize) -> Result<DeviceHandle, DeviceError> {
        let Some(id) = self.id_at(index) else {
            return Err(DeviceError::DeviceOpenFailed {
                index,
                reason: "no gamepad at this index".to_string(),
            });
        };
        if self.open.contains_key(&index) {
            return Err(DeviceError::DeviceOpenFailed {
                index,
                reason: "gamepad already open".to_string(),
            });
        }

        let raw = self.raw_layout_for(id);
        self.open.insert(index, OpenGamepad { id, raw });
        debug!("Opened gamepad {} at index {}", id, index);
        Ok(DeviceHandle::new(index))
    }

    fn close(&mut self, handle: DeviceHandle) {
        if let Some(open) = self.open.remove(&handle.index()) {
            debug!("Closed gamepad {}", open.id);
        }
    }

    fn device_name(&self, handle: &DeviceHandle) -> Option<String> {
        self.gamepad(handle).map(|gamepad| gamepad.name().to_string())
    }

    fn has_axis(&self, handle: &DeviceHandle, axis: ControllerAxis) -> bool {
        self.gamepad(handle)
            .is_some_and(|gamepad| match map_axis(axis) {
                MappedAxis::Stick(stick, _) => gamepad.axis_code(stick).is_some(),
                MappedAxis::Trigger(button, fallback) => {
                    gamepad.button_code(button).is_some() || gamepad.axis_code(fallback).is_some()
                }
            })
    }

    fn has_button(&self, handle: &DeviceHandle, button: ControllerButton) -> bool {
        self.gamepad(handle)
            .is_some_and(|gamepad| gamepad.button_code(map_button(button)).is_some())
    }

    fn axis_value(&self, handle: &DeviceHandle, axis: ControllerAxis) -> Result<i16, DeviceError> {
        let gamepad = self
            .gamepad(handle)
            .ok_or_else(|| DeviceError::CapabilityQueryUnsupported(format!("axis {}", axis)))?;

        let value = match map_axis(axis) {
            MappedAxis::Stick(stick, inverted) => {
                let value = gamepad.value(stick);
                if inverted {
                    -value
                } else {
                    value
                }
            }
            MappedAxis::Trigger(button, fallback) => {
                if gamepad.button_code(button).is_some() {
                    gamepad.button_data(button).map(|data| data.value()).unwrap_or(0.0)
                } else if gamepad.axis_code(fallback).is_some() {
                    gamepad.value(fallback)
                } else {
                    return Err(DeviceError::CapabilityQueryUnsupported(format!("axis {}", axis)));
                }
            }
        };

        Ok(to_raw(value))
    }

    fn button_pressed(
        &self,
        handle: &DeviceHandle,
        button: ControllerButton,
    ) -> Result<bool, DeviceError> {
        self.gamepad(handle)
            .map(|gamepad| gamepad.is_pressed(map_button(button)))
            .ok_or_else(|| DeviceError::CapabilityQueryUnsupported(format!("button {}", button)))
    }

    fn raw_axis_count(&self, handle: &DeviceHandle) -> usize {
        self.raw_layout(handle).map_or(0, |raw| raw.axes.len())
    }

    fn raw_button_count(&self, handle: &DeviceHandle) -> usize {
        self.raw_layout(handle).map_or(0, |raw| raw.buttons.len())
    }

    fn raw_axis_value(&self, handle: &DeviceHandle, index: usize) -> Result<i16, DeviceError> {
        self.raw_layout(handle)
            .and_then(|raw| raw.axis(index))
            .ok_or_else(|| DeviceError::CapabilityQueryUnsupported(format!("raw axis {}", index)))
    }

    fn raw_button_pressed(
        &self,
        handle: &DeviceHandle,
        index: usize,
    ) -> Result<bool, DeviceError> {
        self.raw_layout(handle)
            .and_then(|raw| raw.button(index))
            .ok_or_else(|| {
                DeviceError::CapabilityQueryUnsupported(format!("raw button {}", index))
            })
    }
}

/// Index table of a raw device, in the order the device lists its codes
///
/// Values start at rest (centered, released) and follow the device's events.
#[derive(Debug)]
struct RawLayout {
    core_id: usize,
    axes: Vec<RawAxis>,
    buttons: Vec<RawButton>,
}

#[derive(Debug)]
struct RawAxis {
    code: u32,
    range: Option<(i32, i32)>,
    value: i16,
}

#[derive(Debug)]
struct RawButton {
    code: u32,
    pressed: bool,
}

impl RawLayout {
    fn new(
        core_id: usize,
        axes: impl IntoIterator<Item = (u32, Option<(i32, i32)>)>,
        buttons: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            core_id,
            axes: axes
                .into_iter()
                .map(|(code, range)| RawAxis {
                    code,
                    range,
                    value: 0,
                })
                .collect(),
            buttons: buttons
                .into_iter()
                .map(|code| RawButton {
                    code,
                    pressed: false,
                })
                .collect(),
        }
    }

    fn record_axis(&mut self, code: u32, value: i32) {
        match self.axes.iter_mut().find(|axis| axis.code == code) {
            Some(axis) => axis.value = scale_axis(value, axis.range),
            None => debug!("Ignoring unlisted raw axis code {}", code),
        }
    }

    fn record_button(&mut self, code: u32, pressed: bool) {
        match self.buttons.iter_mut().find(|button| button.code == code) {
            Some(button) => button.pressed = pressed,
            None => debug!("Ignoring unlisted raw button code {}", code),
        }
    }

    fn axis(&self, index: usize) -> Option<i16> {
        self.axes.get(index).map(|axis| axis.value)
    }

    fn button(&self, index: usize) -> Option<bool> {
        self.buttons.get(index).map(|button| button.pressed)
    }
}

// Maps a device reading from its reported range onto the signed 16-bit range
fn scale_axis(value: i32, range: Option<(i32, i32)>) -> i16 {
    match range {
        Some((min, max)) if max > min => {
            let unit = (f64::from(value) - f64::from(min)) / (f64::from(max) - f64::from(min));
            to_raw((unit * 2.0 - 1.0) as f32)
        }
        _ => value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
    }
}

enum MappedAxis {
    // gilrs axis, whether its direction is flipped against the standard layout
    Stick(Axis, bool),
    // Analog trigger button, with the Z axis some drivers report instead
    Trigger(Button, Axis),
}

fn map_axis(axis: ControllerAxis) -> MappedAxis {
    match axis {
        ControllerAxis::LeftX => MappedAxis::Stick(Axis::LeftStickX, false),
        ControllerAxis::LeftY => MappedAxis::Stick(Axis::LeftStickY, true),
        ControllerAxis::RightX => MappedAxis::Stick(Axis::RightStickX, false),
        ControllerAxis::RightY => MappedAxis::Stick(Axis::RightStickY, true),
        ControllerAxis::TriggerLeft => MappedAxis::Trigger(Button::LeftTrigger2, Axis::LeftZ),
        ControllerAxis::TriggerRight => MappedAxis::Trigger(Button::RightTrigger2, Axis::RightZ),
    }
}

fn map_button(button: ControllerButton) -> Button {
    match button {
        ControllerButton::A => Button::South,
        ControllerButton::B => Button::East,
        ControllerButton::X => Button::West,
        ControllerButton::Y => Button::North,
        ControllerButton::Back => Button::Select,
        ControllerButton::Guide => Button::Mode,
        ControllerButton::Start => Button::Start,
        ControllerButton::LeftStick => Button::LeftThumb,
        ControllerButton::RightStick => Button::RightThumb,
        ControllerButton::LeftShoulder => Button::LeftTrigger,
        ControllerButton::RightShoulder => Button::RightTrigger,
        ControllerButton::DPadUp => Button::DPadUp,
        ControllerButton::DPadDown => Button::DPadDown,
        ControllerButton::DPadLeft => Button::DPadLeft,
        ControllerButton::DPadRight => Button::DPadRight,
    }
}

// Scales a gilrs reading back onto the signed 16-bit range
fn to_raw(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * AXIS_FULL_SCALE).round() as i16
}
