//! Game-controller camera control for a CAD viewport.
//!
//! A polling thread reads the controller, shapes the stick and publishes
//! the newest sample into a lock-free mailbox. The host's UI thread
//! ticks [`CameraUpdateLoop`], which drains that sample, orbits the
//! camera with quaternions and fires preset views on button edges.
//! [`JoystickAddIn`] wires the pieces together.

pub mod addin;
pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod math;

pub use addin::{JoystickAddIn, StartReport};
pub use camera::{
  CameraPose, CameraUpdateLoop, PresetCameraOps, SimulatedViewport, TickReport, Viewport,
};
pub use config::{CameraFunction, ConfigHandle, RuntimeConfig, SettingsFile};
pub use error::{ConfigError, DeviceError, ViewportError};
pub use input::{DeviceManager, InputBackend, PollingWorker, ScriptedBackend, SharedInputState};
pub use math::Quaternion;
