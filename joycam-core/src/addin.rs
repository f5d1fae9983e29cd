use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Instant;

use log::{error, info, warn};

use crate::camera::presets::PresetCameraOps;
use crate::camera::update_loop::{CameraUpdateLoop, TickReport};
use crate::camera::viewport::Viewport;
use crate::config::{CameraFunction, ConfigHandle, RuntimeConfig, SettingsFile};
use crate::error::{panic_message, ConfigError, DeviceError, ViewportError};
use crate::input::device::{DeviceInfo, DeviceManager, InputBackend};
use crate::input::mailbox::SharedInputState;
use crate::input::worker::{PollLoop, PollingWorker, StopOutcome};

/// Outcome of [`JoystickAddIn::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport
{
  pub device: Option<DeviceInfo>,
  /// No device was found and the user wants to be told about it.
  pub show_no_device_notice: bool,
}

/// Everything the add-in owns between start and stop.
pub struct JoystickAddIn
{
  config: ConfigHandle,
  mailbox: Arc<SharedInputState>,
  devices: Arc<Mutex<DeviceManager>>,
  worker: Option<PollingWorker>,
  update_loop: CameraUpdateLoop,
  presets: PresetCameraOps,
}

impl JoystickAddIn
{
  pub fn new(backend: Box<dyn InputBackend>, config: RuntimeConfig, now: Instant) -> Self
  {
    let config = ConfigHandle::new(config);
    let presets = config.read(PresetCameraOps::from_config);

    Self {
      config,
      mailbox: Arc::new(SharedInputState::new()),
      devices: Arc::new(Mutex::new(DeviceManager::new(backend))),
      worker: None,
      update_loop: CameraUpdateLoop::new(now),
      presets,
    }
  }

  pub fn config(&self) -> &ConfigHandle
  {
    &self.config
  }

  pub fn mailbox(&self) -> &Arc<SharedInputState>
  {
    &self.mailbox
  }

  pub fn is_polling(&self) -> bool
  {
    self.worker.as_ref().is_some_and(PollingWorker::is_running)
  }

  pub fn active_device(&self) -> Option<DeviceInfo>
  {
    self.lock_devices().active_device().cloned()
  }

  pub fn axis_names(&self) -> Vec<String>
  {
    self.lock_devices().axis_names()
  }

  fn lock_devices(&self) -> MutexGuard<'_, DeviceManager>
  {
    self.devices.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Bring up the device subsystem and, when a device is connected,
  /// the polling thread. Device failures leave the add-in loaded but idle.
  pub fn start(&mut self) -> StartReport
  {
    let (selected, notify) = self.config.read(|c| (c.selected_joystick, c.show_welcome_message));

    let device = {
      let mut devices = self.lock_devices();
      match devices.initialize()
      {
        Ok(()) => devices.connect(selected).and_then(|_| devices.active_device().cloned()),
        Err(e) =>
        {
          warn!("input subsystem unavailable: {e}");
          None
        }
      }
    };

    if device.is_some()
    {
      self.spawn_worker();
    }
    else
    {
      info!("no joystick found, camera control stays idle until a reset");
    }

    StartReport { show_no_device_notice: device.is_none() && notify, device }
  }

  /// One UI-thread tick. A panic inside the loop is logged and the tick
  /// reported as empty; a due auto-reset runs here.
  pub fn tick(&mut self, viewport: &mut dyn Viewport, now: Instant) -> TickReport
  {
    let config = self.config.snapshot();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
      self.update_loop.tick(now, &config, &self.mailbox, viewport, &self.presets)
    }));

    match result
    {
      Ok(report) =>
      {
        if report.auto_reset_due
        {
          info!("auto-reset interval elapsed, resetting joystick");
          if let Err(e) = self.reset_devices()
          {
            warn!("auto-reset failed: {e}");
          }
        }
        report
      }
      Err(payload) =>
      {
        error!("camera update panicked: {}", panic_message(payload.as_ref()));
        TickReport::default()
      }
    }
  }

  /// Run a camera function directly, e.g. from a UI command.
  pub fn execute(
    &self,
    function: CameraFunction,
    viewport: &mut dyn Viewport,
  ) -> Result<(), ViewportError>
  {
    self.presets.execute(function, viewport)
  }

  /// Stop the worker, tear the device subsystem down and bring it back,
  /// then restart the worker if a device reconnected.
  pub fn reset_devices(&mut self) -> Result<Option<DeviceInfo>, DeviceError>
  {
    // buttons stay as last seen so a press held across the reset
    // does not read as a new edge once polling resumes
    self.stop_worker();
    self.mailbox.clear_axes();

    let (selected, delay) = self.config.read(|c| (c.selected_joystick, c.polling.reinit_delay()));
    let device = {
      let mut devices = self.lock_devices();
      devices.reinitialize(selected, delay).map(|_| devices.active_device().cloned())
    };
    let device = device.inspect_err(|_| self.clear_mailbox())?;

    match &device
    {
      Some(info) =>
      {
        info!("joystick reset, using {}", info.name);
        self.spawn_worker();
      }
      None =>
      {
        warn!("joystick reset found no device");
        self.clear_mailbox();
      }
    }
    Ok(device)
  }

  /// Apply edited settings. Memory is updated even when saving fails.
  pub fn commit_settings(
    &mut self,
    config: RuntimeConfig,
    file: &SettingsFile,
  ) -> Result<(), ConfigError>
  {
    let previous = self.config.read(|c| c.selected_joystick);
    let saved = self.config.commit(config, file);

    let current = self.config.snapshot();
    self.presets = PresetCameraOps::from_config(&current);
    if current.selected_joystick != previous
    {
      let mut devices = self.lock_devices();
      if devices.is_initialized()
      {
        devices.connect(current.selected_joystick);
      }
    }

    saved
  }

  /// Restore the shipped defaults in memory and on disk.
  pub fn reset_settings(&mut self, file: &SettingsFile) -> Result<(), ConfigError>
  {
    info!("restoring default settings");
    self.commit_settings(RuntimeConfig::default(), file)
  }

  /// Stop polling and release the device. Safe to call twice.
  pub fn stop(&mut self)
  {
    self.stop_worker();
    self.clear_mailbox();

    // a detached polling thread may still hold the device
    match self.devices.try_lock()
    {
      Ok(mut devices) => devices.shutdown(),
      Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().shutdown(),
      Err(TryLockError::WouldBlock) => warn!("device busy in polling thread, skipping shutdown"),
    }
    info!("joystick add-in stopped");
  }

  fn spawn_worker(&mut self)
  {
    let poll =
      PollLoop::new(Arc::clone(&self.devices), Arc::clone(&self.mailbox), self.config.clone());
    match PollingWorker::spawn(poll)
    {
      Ok(worker) => self.worker = Some(worker),
      Err(e) => error!("cannot start polling thread: {e}"),
    }
  }

  fn stop_worker(&mut self)
  {
    let Some(mut worker) = self.worker.take()
    else
    {
      return;
    };

    let timeout = self.config.read(|c| c.polling.stop_timeout());
    if worker.stop(timeout) == StopOutcome::TimedOut
    {
      warn!("continuing without waiting for the polling thread");
    }
  }

  fn clear_mailbox(&self)
  {
    self.mailbox.clear_axes();
    self.mailbox.set_buttons(&[]);
    self.mailbox.set_dpad(Default::default());
  }
}

impl Drop for JoystickAddIn
{
  fn drop(&mut self)
  {
    self.stop_worker();
  }
}
