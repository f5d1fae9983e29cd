use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::error::DeviceError;
use crate::input::device::{DeviceInfo, InputBackend};

/// In-memory controller used by tests and the headless harness.
///
/// Clones share state, so a test keeps one handle to feed frames while
/// the `DeviceManager` owns another. Each `poll_axes` call consumes the
/// next queued step; when the queue is empty the last frame repeats.
#[derive(Clone)]
pub struct ScriptedBackend
{
  state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedFrame
{
  pub axes: Vec<f64>,
  pub buttons: Vec<bool>,
  pub hats: Vec<(i8, i8)>,
}

impl ScriptedFrame
{
  /// Two-stick pad at rest: 4 axes, 10 buttons, one hat.
  pub fn idle() -> Self
  {
    Self { axes: vec![0.0; 4], buttons: vec![false; 10], hats: vec![(0, 0)] }
  }

  pub fn stick(x: f64, y: f64) -> Self
  {
    let mut frame = Self::idle();
    frame.axes[0] = x;
    frame.axes[1] = y;
    frame
  }

  pub fn with_button(mut self, index: usize) -> Self
  {
    if index >= self.buttons.len()
    {
      self.buttons.resize(index + 1, false);
    }
    self.buttons[index] = true;
    self
  }

  pub fn with_hat(mut self, hat: (i8, i8)) -> Self
  {
    self.hats = vec![hat];
    self
  }
}

enum Step
{
  Frame(ScriptedFrame),
  Fail(DeviceError),
  Panic(String),
  Stall(Duration),
}

struct ScriptState
{
  devices: Vec<DeviceInfo>,
  current: ScriptedFrame,
  queue: VecDeque<Step>,
  initialized: bool,
  init_count: usize,
  shutdown_count: usize,
  poll_count: usize,
}

impl ScriptedBackend
{
  pub fn new(devices: Vec<DeviceInfo>) -> Self
  {
    let state = ScriptState {
      devices,
      current: ScriptedFrame::idle(),
      queue: VecDeque::new(),
      initialized: false,
      init_count: 0,
      shutdown_count: 0,
      poll_count: 0,
    };
    Self { state: Arc::new(Mutex::new(state)) }
  }

  pub fn with_gamepad() -> Self
  {
    Self::new(vec![Self::gamepad_info()])
  }

  /// The device [`ScriptedBackend::with_gamepad`] reports.
  pub fn gamepad_info() -> DeviceInfo
  {
    DeviceInfo { name: "Scripted Gamepad".to_string(), axis_count: 4, button_count: 10, hat_count: 1 }
  }

  fn lock(&self) -> MutexGuard<'_, ScriptState>
  {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Replace the repeating frame and drop anything queued.
  pub fn set_frame(&self, frame: ScriptedFrame)
  {
    let mut s = self.lock();
    s.queue.clear();
    s.current = frame;
  }

  pub fn push_frame(&self, frame: ScriptedFrame)
  {
    self.lock().queue.push_back(Step::Frame(frame));
  }

  pub fn push_error(&self, error: DeviceError)
  {
    self.lock().queue.push_back(Step::Fail(error));
  }

  /// The next poll panics with `message`, as a misbehaving driver would.
  pub fn push_panic(&self, message: &str)
  {
    self.lock().queue.push_back(Step::Panic(message.to_string()));
  }

  /// The next poll blocks for `duration` before reporting the current frame.
  pub fn push_stall(&self, duration: Duration)
  {
    self.lock().queue.push_back(Step::Stall(duration));
  }

  pub fn set_devices(&self, devices: Vec<DeviceInfo>)
  {
    self.lock().devices = devices;
  }

  pub fn init_count(&self) -> usize
  {
    self.lock().init_count
  }

  pub fn shutdown_count(&self) -> usize
  {
    self.lock().shutdown_count
  }

  pub fn poll_count(&self) -> usize
  {
    self.lock().poll_count
  }
}

impl InputBackend for ScriptedBackend
{
  fn initialize(&mut self) -> Result<(), DeviceError>
  {
    let mut s = self.lock();
    s.initialized = true;
    s.init_count += 1;
    Ok(())
  }

  fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>, DeviceError>
  {
    let s = self.lock();
    if !s.initialized
    {
      return Err(DeviceError::NotInitialized);
    }
    Ok(s.devices.clone())
  }

  fn poll_axes(&mut self, device: usize) -> Result<Vec<f64>, DeviceError>
  {
    let mut s = self.lock();
    if !s.initialized
    {
      return Err(DeviceError::NotInitialized);
    }
    if device >= s.devices.len()
    {
      return Err(DeviceError::Lost(device));
    }

    s.poll_count += 1;
    match s.queue.pop_front()
    {
      Some(Step::Fail(e)) => return Err(e),
      Some(Step::Frame(frame)) => s.current = frame,
      Some(Step::Panic(message)) =>
      {
        drop(s);
        panic!("{message}");
      }
      Some(Step::Stall(duration)) =>
      {
        drop(s);
        thread::sleep(duration);
        return Ok(self.lock().current.axes.clone());
      }
      None =>
      {}
    }
    Ok(s.current.axes.clone())
  }

  fn poll_buttons(&mut self, _device: usize) -> Result<Vec<bool>, DeviceError>
  {
    Ok(self.lock().current.buttons.clone())
  }

  fn poll_hats(&mut self, _device: usize) -> Result<Vec<(i8, i8)>, DeviceError>
  {
    Ok(self.lock().current.hats.clone())
  }

  fn shutdown(&mut self)
  {
    let mut s = self.lock();
    s.initialized = false;
    s.shutdown_count += 1;
  }
}
