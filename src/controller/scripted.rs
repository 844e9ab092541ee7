//! Scripted virtual devices
//!
//! [`ScriptedBackend`] implements [`DeviceBackend`] over an in-memory list of
//! devices. Hosts use it to drive a session without hardware; the paired
//! [`ScriptedControls`] move sticks and press buttons while the session runs.

use super::backend::{DeviceBackend, DeviceError, DeviceHandle};
use super::layout::{ControllerAxis, ControllerButton};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// One virtual device
#[derive(Debug, Clone, Default)]
pub struct ScriptedDevice {
    pub name: String,
    /// Has a standardized controller mapping
    pub standard: bool,
    pub openable: bool,
    /// `None` marks a capability that is reported but cannot be read
    pub axes: BTreeMap<ControllerAxis, Option<i16>>,
    pub buttons: BTreeMap<ControllerButton, bool>,
    pub raw_axes: Vec<i16>,
    pub raw_buttons: Vec<bool>,
}

impl ScriptedDevice {
    /// A device with a standardized controller mapping
    pub fn controller(name: &str) -> Self {
        Self {
            name: name.to_string(),
            standard: true,
            openable: true,
            ..Default::default()
        }
    }

    /// A device without a controller mapping
    pub fn joystick(name: &str) -> Self {
        Self {
            name: name.to_string(),
            standard: false,
            openable: true,
            ..Default::default()
        }
    }

    pub fn with_axis(mut self, axis: ControllerAxis, raw: i16) -> Self {
        self.axes.insert(axis, Some(raw));
        self
    }

    pub fn with_unreadable_axis(mut self, axis: ControllerAxis) -> Self {
        self.axes.insert(axis, None);
        self
    }

    pub fn with_button(mut self, button: ControllerButton, pressed: bool) -> Self {
        self.buttons.insert(button, pressed);
        self
    }

    pub fn with_raw_axes(mut self, raw_axes: Vec<i16>) -> Self {
        self.raw_axes = raw_axes;
        self
    }

    pub fn with_raw_buttons(mut self, raw_buttons: Vec<bool>) -> Self {
        self.raw_buttons = raw_buttons;
        self
    }

    pub fn unopenable(mut self) -> Self {
        self.openable = false;
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    devices: Vec<ScriptedDevice>,
    open: BTreeSet<usize>,
    refreshes: u64,
}

/// In-memory [`DeviceBackend`]
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
}

/// Shared handle for changing device state from outside the session
#[derive(Debug, Clone)]
pub struct ScriptedControls {
    state: Arc<Mutex<ScriptState>>,
}

fn lock(state: &Mutex<ScriptState>) -> MutexGuard<'_, ScriptState> {
    // A panicking test thread must not hide the script from the others
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedBackend {
    pub fn new(devices: Vec<ScriptedDevice>) -> Self {
        debug!("Creating scripted backend with {} devices", devices.len());
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                devices,
                ..Default::default()
            })),
        }
    }

    pub fn controls(&self) -> ScriptedControls {
        ScriptedControls {
            state: Arc::clone(&self.state),
        }
    }

    fn read<T>(&self, handle: &DeviceHandle, f: impl FnOnce(&ScriptedDevice) -> T) -> Option<T> {
        let state = lock(&self.state);
        if !state.open.contains(&handle.index()) {
            return None;
        }
        state.devices.get(handle.index()).map(f)
    }
}

impl ScriptedControls {
    fn update(&self, index: usize, f: impl FnOnce(&mut ScriptedDevice)) {
        if let Some(device) = lock(&self.state).devices.get_mut(index) {
            f(device);
        }
    }

    pub fn set_axis(&self, index: usize, axis: ControllerAxis, raw: i16) {
        self.update(index, |device| {
            device.axes.insert(axis, Some(raw));
        });
    }

    pub fn remove_axis(&self, index: usize, axis: ControllerAxis) {
        self.update(index, |device| {
            device.axes.remove(&axis);
        });
    }

    pub fn set_button(&self, index: usize, button: ControllerButton, pressed: bool) {
        self.update(index, |device| {
            device.buttons.insert(button, pressed);
        });
    }

    pub fn set_raw_axis(&self, index: usize, axis: usize, raw: i16) {
        self.update(index, |device| {
            if device.raw_axes.len() <= axis {
                device.raw_axes.resize(axis + 1, 0);
            }
            device.raw_axes[axis] = raw;
        });
    }

    pub fn set_raw_button(&self, index: usize, button: usize, pressed: bool) {
        self.update(index, |device| {
            if device.raw_buttons.len() <= button {
                device.raw_buttons.resize(button + 1, false);
            }
            device.raw_buttons[button] = pressed;
        });
    }

    /// Enumeration indices currently held open
    pub fn open_devices(&self) -> Vec<usize> {
        lock(&self.state).open.iter().copied().collect()
    }

    /// How often the backend was asked to pump events
    pub fn refreshes(&self) -> u64 {
        lock(&self.state).refreshes
    }
}

impl DeviceBackend for ScriptedBackend {
    fn refresh(&mut self) {
        lock(&self.state).refreshes += 1;
    }

    fn count(&self) -> usize {
        lock(&self.state).devices.len()
    }

    fn is_standard_controller_at(&self, index: usize) -> bool {
        lock(&self.state)
            .devices
            .get(index)
            .is_some_and(|device| device.standard)
    }

    fn open(&mut self, index: usize) -> Result<DeviceHandle, DeviceError> {
        let mut state = lock(&self.state);
        let openable = match state.devices.get(index) {
            Some(device) => device.openable,
            None => {
                return Err(DeviceError::DeviceOpenFailed {
                    index,
                    reason: "no such device".to_string(),
                })
            }
        };

        if !openable {
            return Err(DeviceError::DeviceOpenFailed {
                index,
                reason: "device refused to open".to_string(),
            });
        }
        if !state.open.insert(index) {
            return Err(DeviceError::DeviceOpenFailed {
                index,
                reason: "device already open".to_string(),
            });
        }
        Ok(DeviceHandle::new(index))
    }

    fn close(&mut self, handle: DeviceHandle) {
        lock(&self.state).open.remove(&handle.index());
    }

    fn device_name(&self, handle: &DeviceHandle) -> Option<String> {
        self.read(handle, |device| device.name.clone())
    }

    fn has_axis(&self, handle: &DeviceHandle, axis: ControllerAxis) -> bool {
        self.read(handle, |device| device.axes.contains_key(&axis))
            .unwrap_or(false)
    }

    fn has_button(&self, handle: &DeviceHandle, button: ControllerButton) -> bool {
        self.read(handle, |device| device.buttons.contains_key(&button))
            .unwrap_or(false)
    }

    fn axis_value(&self, handle: &DeviceHandle, axis: ControllerAxis) -> Result<i16, DeviceError> {
        self.read(handle, |device| device.axes.get(&axis).copied().flatten())
            .flatten()
            .ok_or_else(|| DeviceError::CapabilityQueryUnsupported(format!("axis {}", axis)))
    }

    fn button_pressed(
        &self,
        handle: &DeviceHandle,
        button: ControllerButton,
    ) -> Result<bool, DeviceError> {
        self.read(handle, |device| device.buttons.get(&button).copied())
            .flatten()
            .ok_or_else(|| DeviceError::CapabilityQueryUnsupported(format!("button {}", button)))
    }

    fn raw_axis_count(&self, handle: &DeviceHandle) -> usize {
        self.read(handle, |device| device.raw_axes.len()).unwrap_or(0)
    }

    fn raw_button_count(&self, handle: &DeviceHandle) -> usize {
        self.read(handle, |device| device.raw_buttons.len())
            .unwrap_or(0)
    }

    fn raw_axis_value(&self, handle: &DeviceHandle, index: usize) -> Result<i16, DeviceError> {
        self.read(handle, |device| device.raw_axes.get(index).copied())
            .flatten()
            .ok_or_else(|| DeviceError::CapabilityQueryUnsupported(format!("raw axis {}", index)))
    }

    fn raw_button_pressed(
        &self,
        handle: &DeviceHandle,
        index: usize,
    ) -> Result<bool, DeviceError> {
        self.read(handle, |device| device.raw_buttons.get(index).copied())
            .flatten()
            .ok_or_else(|| {
                DeviceError::CapabilityQueryUnsupported(format!("raw button {}", index))
            })
    }
}
