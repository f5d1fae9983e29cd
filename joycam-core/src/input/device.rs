use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::config::RuntimeConfig;
use crate::error::DeviceError;
use crate::input::mailbox::DpadState;

//
// ──────────────────────────────────────────────────────────────
//   Back-end seam
//
//   A controller library (SDL, gilrs, XInput, ...) sits behind this
//   trait. It must survive repeated initialize/shutdown cycles.
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo
{
  pub name: String,
  pub axis_count: usize,
  pub button_count: usize,
  pub hat_count: usize,
}

pub trait InputBackend: Send
{
  fn initialize(&mut self) -> Result<(), DeviceError>;

  fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>, DeviceError>;

  /// Axis values in `[-1, 1]`.
  fn poll_axes(&mut self, device: usize) -> Result<Vec<f64>, DeviceError>;

  fn poll_buttons(&mut self, device: usize) -> Result<Vec<bool>, DeviceError>;

  /// Hat positions as `(x, y)` with components in `{-1, 0, 1}`.
  fn poll_hats(&mut self, device: usize) -> Result<Vec<(i8, i8)>, DeviceError>;

  fn shutdown(&mut self);
}

/// One raw sample of the configured stick plus all buttons and the
/// first hat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame
{
  pub x: f64,
  pub y: f64,
  pub buttons: Vec<bool>,
  pub dpad: DpadState,
}

//
// ──────────────────────────────────────────────────────────────
//   DeviceManager
// ──────────────────────────────────────────────────────────────
//

pub struct DeviceManager
{
  backend: Box<dyn InputBackend>,
  initialized: bool,
  devices: Vec<DeviceInfo>,
  active: Option<usize>,
}

impl DeviceManager
{
  pub fn new(backend: Box<dyn InputBackend>) -> Self
  {
    Self { backend, initialized: false, devices: Vec::new(), active: None }
  }

  pub fn initialize(&mut self) -> Result<(), DeviceError>
  {
    self.backend.initialize()?;
    self.initialized = true;
    self.devices = self.backend.enumerate_devices()?;
    info!("input subsystem ready, {} device(s) found", self.devices.len());
    Ok(())
  }

  pub fn is_initialized(&self) -> bool
  {
    self.initialized
  }

  pub fn devices(&self) -> &[DeviceInfo]
  {
    &self.devices
  }

  /// Select `selected`, or the first device when that index does not
  /// exist. Returns the connected index, `None` without any device.
  pub fn connect(&mut self, selected: usize) -> Option<usize>
  {
    self.active = match self.devices.len()
    {
      0 => None,
      n if selected < n => Some(selected),
      _ =>
      {
        warn!("joystick {selected} not present, falling back to joystick 0");
        Some(0)
      }
    };

    match self.active
    {
      Some(i) => info!("connected to {} (joystick {i})", self.devices[i].name),
      None => warn!("no joystick connected"),
    }
    self.active
  }

  pub fn active_device(&self) -> Option<&DeviceInfo>
  {
    self.active.and_then(|i| self.devices.get(i))
  }

  pub fn is_connected(&self) -> bool
  {
    self.active.is_some()
  }

  /// Read the configured axes, all buttons and the first hat.
  ///
  /// Axis indices past the device's axis count fall back to 0 and 1.
  /// `Ok(None)` when no device is connected.
  pub fn read_frame(&mut self, config: &RuntimeConfig) -> Result<Option<RawFrame>, DeviceError>
  {
    if !self.initialized
    {
      return Err(DeviceError::NotInitialized);
    }
    let Some(device) = self.active
    else
    {
      return Ok(None);
    };

    let axes = self.backend.poll_axes(device)?;
    let buttons = self.backend.poll_buttons(device)?;
    let hats = self.backend.poll_hats(device)?;

    let (ix, iy) = if config.axis_x < axes.len() && config.axis_y < axes.len()
    {
      (config.axis_x, config.axis_y)
    }
    else
    {
      (0, 1)
    };
    let axis = |i: usize| axes.get(i).copied().unwrap_or(0.0);

    Ok(Some(RawFrame {
      x: axis(ix),
      y: axis(iy),
      buttons,
      dpad: hats.first().copied().map(DpadState::from_hat).unwrap_or_default(),
    }))
  }

  /// Tear down, wait for the OS to release the handle, bring the
  /// subsystem back and reconnect.
  pub fn reinitialize(
    &mut self,
    selected: usize,
    delay: Duration,
  ) -> Result<Option<usize>, DeviceError>
  {
    info!("reinitializing input subsystem");
    self.shutdown();
    thread::sleep(delay);
    self.initialize()?;
    Ok(self.connect(selected))
  }

  pub fn shutdown(&mut self)
  {
    if self.initialized
    {
      self.backend.shutdown();
    }
    self.initialized = false;
    self.devices.clear();
    self.active = None;
  }

  /// Labels for an axis picker, e.g. `"Axis 0"`.
  pub fn axis_names(&self) -> Vec<String>
  {
    let count = self.active_device().map(|d| d.axis_count).unwrap_or(0);
    (0..count).map(|i| format!("Axis {i}")).collect()
  }
}

impl Drop for DeviceManager
{
  fn drop(&mut self)
  {
    self.shutdown();
  }
}

#[cfg(test)]
mod tests
{
  use super::*;
  use crate::input::mailbox::DpadDirection;
  use crate::input::scripted::{ScriptedBackend, ScriptedFrame};

  fn manager(backend: &ScriptedBackend) -> DeviceManager
  {
    DeviceManager::new(Box::new(backend.clone()))
  }

  #[test]
  fn read_requires_initialize()
  {
    let backend = ScriptedBackend::with_gamepad();
    let mut devices = manager(&backend);
    let err = devices.read_frame(&RuntimeConfig::default()).unwrap_err();
    assert!(err.needs_reinit());
  }

  #[test]
  fn no_device_reads_nothing()
  {
    let backend = ScriptedBackend::new(Vec::new());
    let mut devices = manager(&backend);
    devices.initialize().unwrap();
    assert_eq!(devices.connect(0), None);
    assert_eq!(devices.read_frame(&RuntimeConfig::default()).unwrap(), None);
    assert!(devices.axis_names().is_empty());
  }

  #[test]
  fn out_of_range_joystick_falls_back_to_first()
  {
    let backend = ScriptedBackend::with_gamepad();
    let mut devices = manager(&backend);
    devices.initialize().unwrap();
    assert_eq!(devices.connect(3), Some(0));
    assert_eq!(devices.axis_names(), vec!["Axis 0", "Axis 1", "Axis 2", "Axis 3"]);
  }

  #[test]
  fn frame_selects_configured_axes_and_first_hat()
  {
    let backend = ScriptedBackend::with_gamepad();
    backend.set_frame(ScriptedFrame {
      axes: vec![0.1, 0.2, 0.3, 0.4],
      buttons: vec![true, false],
      hats: vec![(0, 1), (1, 0)],
    });

    let mut devices = manager(&backend);
    devices.initialize().unwrap();
    devices.connect(0);

    let config = RuntimeConfig { axis_x: 2, axis_y: 3, ..RuntimeConfig::default() };
    let frame = devices.read_frame(&config).unwrap().unwrap();
    assert_eq!((frame.x, frame.y), (0.3, 0.4));
    assert_eq!(frame.buttons, vec![true, false]);
    assert!(frame.dpad.is_pressed(DpadDirection::Up));
    assert!(!frame.dpad.is_pressed(DpadDirection::Right));

    let config = RuntimeConfig { axis_x: 9, ..RuntimeConfig::default() };
    let frame = devices.read_frame(&config).unwrap().unwrap();
    assert_eq!((frame.x, frame.y), (0.1, 0.2));
  }

  #[test]
  fn reinitialize_cycles_backend()
  {
    let backend = ScriptedBackend::with_gamepad();
    let mut devices = manager(&backend);
    devices.initialize().unwrap();
    devices.connect(0);

    assert_eq!(devices.reinitialize(0, Duration::ZERO).unwrap(), Some(0));
    assert_eq!(backend.init_count(), 2);
    assert_eq!(backend.shutdown_count(), 1);
    assert!(devices.is_connected());
  }
}
