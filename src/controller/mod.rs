//! Controller subsystem for device discovery and polling
//!
//! 1. [`backend`] - Platform device API ([`gilrs_backend`] in production,
//!    [`scripted`] for virtual devices)
//! 2. [`session`] - Device selection and per-tick polling
//! 3. [`sample`] - Named, normalized readings handed to the host
//!
//! # Architecture
//!
//! ```text
//! DeviceBackend ──► DeviceSession ──► Vec<InputSample>
//!  (enumerate,       (mapped or raw,    (controller_axis_*,
//!   open, read)       fixed per run)     controller_button_*)
//! ```

pub mod backend;
pub mod gilrs_backend;
pub mod layout;
pub mod sample;
pub mod scripted;
pub mod session;

pub use backend::{DeviceBackend, DeviceError, DeviceHandle};
pub use gilrs_backend::GilrsBackend;
pub use layout::{ControllerAxis, ControllerButton};
pub use sample::{normalize_axis, InputSample, OutputName, SampleValue};
pub use scripted::{ScriptedBackend, ScriptedControls, ScriptedDevice};
pub use session::{DeviceKind, DevicePreference, DeviceSession, SessionStatus};
