//! Device Session - ownership and polling of one input device
//!
//! A session picks a device once, at discovery time, and keeps it until it is
//! stopped. Discovery prefers a device with a standardized controller mapping
//! and falls back to the raw joystick at enumeration index 0. When nothing
//! usable is found the session still goes live, it simply polls nothing.
//!
//! # State Machine
//!
//! ```text
//! Discovering ──discover()──► Live ──stop()──► (device released)
//! ```

use super::backend::{DeviceBackend, DeviceError, DeviceHandle};
use super::layout::{ControllerAxis, ControllerButton};
use super::sample::{normalize_axis, InputSample, OutputName};
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use std::fmt;
use tracing::{debug, info, warn};

/// Representation the active device is read through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Axes and buttons addressed by standardized semantic names
    MappedController,
    /// Axes and buttons addressed by numeric index only
    RawJoystick,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::MappedController => write!(f, "Game Controller"),
            DeviceKind::RawJoystick => write!(f, "Joystick"),
        }
    }
}

/// Which device kinds discovery may select
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePreference {
    /// First mapped controller, otherwise the raw device at index 0
    #[default]
    Auto,
    /// First mapped controller only, never fall back
    MappedOnly,
    /// Raw device at index 0, ignoring controller mappings
    RawOnly,
}

/// What a host should show about the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Connected { name: String, kind: DeviceKind },
    NoController,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Connected { name, .. } => write!(f, "Controller: {}", name),
            SessionStatus::NoController => write!(f, "No controller detected."),
        }
    }
}

/// Device held by a session, in the representation chosen at discovery
///
/// The kind never changes for the lifetime of the session.
#[derive(Debug)]
pub enum ActiveDevice {
    Mapped(DeviceHandle),
    Raw(DeviceHandle),
}

impl ActiveDevice {
    fn kind(&self) -> DeviceKind {
        match self {
            ActiveDevice::Mapped(_) => DeviceKind::MappedController,
            ActiveDevice::Raw(_) => DeviceKind::RawJoystick,
        }
    }

    fn handle(&self) -> &DeviceHandle {
        match self {
            ActiveDevice::Mapped(handle) | ActiveDevice::Raw(handle) => handle,
        }
    }

    fn into_handle(self) -> DeviceHandle {
        match self {
            ActiveDevice::Mapped(handle) | ActiveDevice::Raw(handle) => handle,
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    Discovering,
    Live,
}

#[machine]
pub struct DeviceSession<S: SessionState> {
    // None when the input backend could not be initialized at all
    backend: Option<Box<dyn DeviceBackend>>,
    preference: DevicePreference,
    active: Option<ActiveDevice>,
    device_name: Option<String>,
}

impl<S: SessionState> DeviceSession<S> {
    pub fn preference(&self) -> DevicePreference {
        self.preference
    }
}

impl DeviceSession<Discovering> {
    /// Creates a session over an initialized backend
    pub fn create(backend: Box<dyn DeviceBackend>, preference: DevicePreference) -> Self {
        debug!("Creating device session with preference {:?}", preference);
        Self::new(Some(backend), preference, None, None)
    }

    /// Creates a session without any backend, it will discover nothing
    pub fn detached() -> Self {
        debug!("Creating detached device session");
        Self::new(None, DevicePreference::default(), None, None)
    }

    /// Selects a device and transitions to the Live state
    pub fn discover(mut self) -> DeviceSession<Live> {
        let preference = self.preference;

        match self.backend.as_mut() {
            Some(backend) => {
                backend.refresh();
                let active = select_device(&mut **backend, preference);

                if let Some(device) = &active {
                    let name = backend
                        .device_name(device.handle())
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| "Unknown".to_string());
                    info!(
                        "Selected {} '{}' ({})",
                        device.kind(),
                        name,
                        device.handle()
                    );
                    self.device_name = Some(name);
                }
                self.active = active;
            }
            None => warn!("No input backend available, session will not poll"),
        }

        self.transition()
    }
}

impl DeviceSession<Live> {
    /// Creates a session and runs discovery in one step
    pub fn start(backend: Box<dyn DeviceBackend>, preference: DevicePreference) -> Self {
        DeviceSession::create(backend, preference).discover()
    }

    pub fn has_device(&self) -> bool {
        self.active.is_some()
    }

    pub fn kind(&self) -> Option<DeviceKind> {
        self.active.as_ref().map(ActiveDevice::kind)
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        match (&self.active, &self.device_name) {
            (Some(device), Some(name)) => SessionStatus::Connected {
                name: name.clone(),
                kind: device.kind(),
            },
            _ => SessionStatus::NoController,
        }
    }

    /// Reads the current state of the device
    ///
    /// Returns one sample per axis and button the device reports. Without a
    /// device this is an empty no-op.
    pub fn poll(&mut self) -> Vec<InputSample> {
        let (Some(backend), Some(device)) = (self.backend.as_mut(), self.active.as_ref()) else {
            return Vec::new();
        };

        backend.refresh();
        let samples = match device {
            ActiveDevice::Mapped(handle) => poll_mapped(&**backend, handle),
            ActiveDevice::Raw(handle) => poll_raw(&**backend, handle),
        };
        debug!("Polled {} samples from {}", samples.len(), device.handle());
        samples
    }

    /// Releases the device and discards the session
    pub fn stop(mut self) {
        if let (Some(backend), Some(device)) = (self.backend.as_mut(), self.active.take()) {
            let handle = device.into_handle();
            info!("Releasing {}", handle);
            backend.close(handle);
        }
        debug!("Device session stopped");
    }
}

fn select_device(
    backend: &mut dyn DeviceBackend,
    preference: DevicePreference,
) -> Option<ActiveDevice> {
    let count = backend.count();
    info!("Found {} input devices", count);

    if preference != DevicePreference::RawOnly {
        if let Some(index) = (0..count).find(|&index| backend.is_standard_controller_at(index)) {
            return match backend.open(index) {
                Ok(handle) => Some(ActiveDevice::Mapped(handle)),
                Err(e) => {
                    warn!("{}, continuing without a controller", e);
                    None
                }
            };
        }

        if preference == DevicePreference::MappedOnly {
            warn!("{}: no game controller found", DeviceError::NoDeviceFound);
            return None;
        }
    }

    if count == 0 {
        warn!("{}: no joystick found", DeviceError::NoDeviceFound);
        return None;
    }

    match backend.open(0) {
        Ok(handle) => Some(ActiveDevice::Raw(handle)),
        Err(e) => {
            warn!("{}, no joystick found", e);
            None
        }
    }
}

fn poll_mapped(backend: &dyn DeviceBackend, handle: &DeviceHandle) -> Vec<InputSample> {
    let mut samples = Vec::new();

    for axis in ControllerAxis::ALL {
        if !backend.has_axis(handle, axis) {
            continue;
        }
        match backend.axis_value(handle, axis) {
            Ok(raw) => samples.push(InputSample::axis(
                OutputName::axis(axis.name()),
                normalize_axis(raw),
            )),
            Err(e) => debug!("Skipping axis {}: {}", axis, e),
        }
    }

    for button in ControllerButton::ALL {
        if !backend.has_button(handle, button) {
            continue;
        }
        match backend.button_pressed(handle, button) {
            Ok(pressed) => samples.push(InputSample::button(
                OutputName::button(button.name()),
                pressed,
            )),
            Err(e) => debug!("Skipping button {}: {}", button, e),
        }
    }

    samples
}

fn poll_raw(backend: &dyn DeviceBackend, handle: &DeviceHandle) -> Vec<InputSample> {
    let axis_count = backend.raw_axis_count(handle);
    let button_count = backend.raw_button_count(handle);
    let mut samples = Vec::with_capacity(axis_count + button_count);

    for index in 0..axis_count {
        match backend.raw_axis_value(handle, index) {
            Ok(raw) => samples.push(InputSample::axis(OutputName::axis(index), normalize_axis(raw))),
            Err(e) => debug!("Skipping raw axis {}: {}", index, e),
        }
    }

    for index in 0..button_count {
        match backend.raw_button_pressed(handle, index) {
            Ok(pressed) => samples.push(InputSample::button(OutputName::button(index), pressed)),
            Err(e) => debug!("Skipping raw button {}: {}", index, e),
        }
    }

    samples
}
