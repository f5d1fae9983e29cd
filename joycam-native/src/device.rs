use std::f64::consts::TAU;
use std::time::Instant;

use joycam_core::error::DeviceError;
use joycam_core::input::{DeviceInfo, InputBackend};

//
// ──────────────────────────────────────────────────────────────
//   Synthetic controller
//
//   Left stick traces a slow ellipse with rests in between, one face
//   button is tapped every few seconds and the D-pad taps right.
// ──────────────────────────────────────────────────────────────
//

const STICK_PERIOD_SECS: f64 = 6.0;
const BUTTON_PERIOD_SECS: f64 = 4.0;
const TAP_SECS: f64 = 0.25;
const BUTTON_COUNT: usize = 10;

pub struct SyntheticBackend
{
  started: Instant,
  initialized: bool,
}

impl SyntheticBackend
{
  pub fn new() -> Self
  {
    Self { started: Instant::now(), initialized: false }
  }

  fn elapsed(&self) -> f64
  {
    self.started.elapsed().as_secs_f64()
  }

  fn check(&self, device: usize) -> Result<(), DeviceError>
  {
    if !self.initialized
    {
      return Err(DeviceError::NotInitialized);
    }
    if device != 0
    {
      return Err(DeviceError::Lost(device));
    }
    Ok(())
  }

  /// Index of the button held right now, if any.
  fn tapped_button(&self) -> Option<usize>
  {
    let t = self.elapsed();
    let cycle = (t / BUTTON_PERIOD_SECS) as usize;
    let phase = t - cycle as f64 * BUTTON_PERIOD_SECS;

    // odd cycles belong to the D-pad
    (phase < TAP_SECS && cycle % 2 == 0).then_some((cycle / 2) % 5)
  }

  fn dpad_tapped(&self) -> bool
  {
    let t = self.elapsed();
    let cycle = (t / BUTTON_PERIOD_SECS) as usize;
    let phase = t - cycle as f64 * BUTTON_PERIOD_SECS;
    phase < TAP_SECS && cycle % 2 == 1
  }
}

impl InputBackend for SyntheticBackend
{
  fn initialize(&mut self) -> Result<(), DeviceError>
  {
    self.initialized = true;
    Ok(())
  }

  fn enumerate_devices(&mut self) -> Result<Vec<DeviceInfo>, DeviceError>
  {
    if !self.initialized
    {
      return Err(DeviceError::NotInitialized);
    }
    Ok(vec![DeviceInfo {
      name: "Synthetic Gamepad".to_string(),
      axis_count: 4,
      button_count: BUTTON_COUNT,
      hat_count: 1,
    }])
  }

  fn poll_axes(&mut self, device: usize) -> Result<Vec<f64>, DeviceError>
  {
    self.check(device)?;

    let phase = self.elapsed() / STICK_PERIOD_SECS * TAU;
    // rest for the second half of every period
    let gain = if phase.sin() >= 0.0 { 0.8 } else { 0.0 };
    Ok(vec![gain * phase.cos(), gain * 0.5 * (2.0 * phase).sin(), 0.0, 0.0])
  }

  fn poll_buttons(&mut self, device: usize) -> Result<Vec<bool>, DeviceError>
  {
    self.check(device)?;

    let mut buttons = vec![false; BUTTON_COUNT];
    if let Some(i) = self.tapped_button()
    {
      buttons[i] = true;
    }
    Ok(buttons)
  }

  fn poll_hats(&mut self, device: usize) -> Result<Vec<(i8, i8)>, DeviceError>
  {
    self.check(device)?;
    Ok(vec![if self.dpad_tapped() { (1, 0) } else { (0, 0) }])
  }

  fn shutdown(&mut self)
  {
    self.initialized = false;
  }
}
