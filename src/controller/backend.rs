//! Platform device API consumed by [`DeviceSession`](super::session::DeviceSession)
//!
//! A backend enumerates input devices, opens one of them and answers capability
//! and value queries. Devices are addressed by their position in the platform
//! enumeration order; an opened device is referenced through a [`DeviceHandle`].

use super::layout::{ControllerAxis, ControllerButton};
use std::fmt;

/// Opaque reference to an opened input device
///
/// Handles are issued by [`DeviceBackend::open`] and must be returned through
/// [`DeviceBackend::close`]. They are deliberately not `Clone`, so only one owner
/// can hold a given device at a time.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    index: usize,
}

impl DeviceHandle {
    /// Issues a handle for the device at `index`. Only backends should call this.
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Enumeration index the handle was opened from
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.index)
    }
}

/// Failures a backend can report
///
/// None of these escape a session. They degrade to "no device" or to a
/// missing sample.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("No input device found")]
    NoDeviceFound,

    #[error("Failed to open device {index}: {reason}")]
    DeviceOpenFailed { index: usize, reason: String },

    #[error("Capability query unsupported: {0}")]
    CapabilityQueryUnsupported(String),

    #[error("Input backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Device enumeration, capability and value API of an input platform
pub trait DeviceBackend {
    /// Pumps pending platform events so subsequent reads see fresh state
    fn refresh(&mut self) {}

    /// Number of enumerated devices
    fn count(&self) -> usize;

    /// Whether the device at `index` has a standardized controller mapping
    fn is_standard_controller_at(&self, index: usize) -> bool;

    fn open(&mut self, index: usize) -> Result<DeviceHandle, DeviceError>;

    /// Releases a handle. The device may be opened again afterwards.
    fn close(&mut self, handle: DeviceHandle);

    fn device_name(&self, handle: &DeviceHandle) -> Option<String>;

    fn has_axis(&self, handle: &DeviceHandle, axis: ControllerAxis) -> bool;

    fn has_button(&self, handle: &DeviceHandle, button: ControllerButton) -> bool;

    /// Raw signed 16-bit reading of a semantic axis
    fn axis_value(&self, handle: &DeviceHandle, axis: ControllerAxis) -> Result<i16, DeviceError>;

    fn button_pressed(
        &self,
        handle: &DeviceHandle,
        button: ControllerButton,
    ) -> Result<bool, DeviceError>;

    /// Number of axes the device currently reports in raw mode
    fn raw_axis_count(&self, handle: &DeviceHandle) -> usize;

    /// Number of buttons the device currently reports in raw mode
    fn raw_button_count(&self, handle: &DeviceHandle) -> usize;

    fn raw_axis_value(&self, handle: &DeviceHandle, index: usize) -> Result<i16, DeviceError>;

    fn raw_button_pressed(&self, handle: &DeviceHandle, index: usize)
        -> Result<bool, DeviceError>;
}
