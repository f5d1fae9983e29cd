use std::time::Instant;

use log::{debug, warn};

use crate::camera::orbit::{orbit_camera, OrbitSettings, OrbitStep};
use crate::camera::pose::Transition;
use crate::camera::presets::PresetCameraOps;
use crate::camera::viewport::Viewport;
use crate::config::{CameraFunction, RuntimeConfig};
use crate::input::mailbox::{ButtonSnapshot, DpadDirection, DpadState, SharedInputState};

//
// ──────────────────────────────────────────────────────────────
//   Consumer side: fixed-rate tick on the UI thread
//
//   1. rate limit
//   2. drain the stick sample and orbit, or refresh occasionally
//   3. fire presets on button / D-pad rising edges
//   4. report when the auto-reset interval has elapsed
// ──────────────────────────────────────────────────────────────
//

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport
{
  /// Too soon after the previous tick; nothing else ran.
  pub skipped: bool,
  /// Orbit result when a stick sample was drained and a camera existed.
  pub camera: Option<OrbitStep>,
  pub fired: Vec<CameraFunction>,
  pub refreshed: bool,
  pub auto_reset_due: bool,
}

pub struct CameraUpdateLoop
{
  last_tick: Option<Instant>,
  idle_ticks: u32,
  prev_buttons: ButtonSnapshot,
  prev_dpad: DpadState,
  reset_timer_start: Instant,
}

impl CameraUpdateLoop
{
  pub fn new(now: Instant) -> Self
  {
    Self {
      last_tick: None,
      idle_ticks: 0,
      prev_buttons: ButtonSnapshot::default(),
      prev_dpad: DpadState::default(),
      reset_timer_start: now,
    }
  }

  /// Restart the auto-reset interval, e.g. after a manual reset.
  pub fn restart_reset_timer(&mut self, now: Instant)
  {
    self.reset_timer_start = now;
  }

  pub fn tick(
    &mut self,
    now: Instant,
    config: &RuntimeConfig,
    mailbox: &SharedInputState,
    viewport: &mut dyn Viewport,
    presets: &PresetCameraOps,
  ) -> TickReport
  {
    let mut report = TickReport::default();

    if let Some(last) = self.last_tick
    {
      if now.saturating_duration_since(last) < config.update_interval()
      {
        report.skipped = true;
        return report;
      }
    }
    self.last_tick = Some(now);

    match mailbox.take_axes()
    {
      Some((x, y)) =>
      {
        self.idle_ticks = 0;
        report.camera = self.orbit(x, y, config, viewport);
        report.refreshed = matches!(report.camera, Some(OrbitStep::Rotated(_)));
      }
      None =>
      {
        self.idle_ticks += 1;
        if self.idle_ticks >= config.orbit.idle_refresh_every
        {
          self.idle_ticks = 0;
          report.refreshed = viewport.refresh().is_ok();
        }
      }
    }

    self.fire_edges(config, mailbox, viewport, presets, &mut report.fired);

    let since_reset = now.saturating_duration_since(self.reset_timer_start);
    if config.auto_reset_enabled && since_reset >= config.auto_reset_interval()
    {
      self.reset_timer_start = now;
      report.auto_reset_due = true;
    }

    report
  }

  fn orbit(
    &mut self,
    x: f64,
    y: f64,
    config: &RuntimeConfig,
    viewport: &mut dyn Viewport,
  ) -> Option<OrbitStep>
  {
    let pose = match viewport.camera()
    {
      Ok(pose) => pose,
      Err(e) =>
      {
        warn!("skipping camera update: {e}");
        return None;
      }
    };

    let step = orbit_camera(&pose, x, y, &OrbitSettings::from_config(config));
    match &step
    {
      OrbitStep::Rotated(next) =>
      {
        let applied =
          viewport.apply_camera(next, Transition::Instant).and_then(|_| viewport.refresh());
        if let Err(e) = applied
        {
          warn!("camera update failed: {e}");
        }
      }
      OrbitStep::Rejected(reason) =>
      {
        warn!("camera update rejected ({reason:?}), keeping previous pose")
      }
      OrbitStep::Idle => debug!("stick sample below orbit threshold"),
    }

    Some(step)
  }

  fn fire_edges(
    &mut self,
    config: &RuntimeConfig,
    mailbox: &SharedInputState,
    viewport: &mut dyn Viewport,
    presets: &PresetCameraOps,
    fired: &mut Vec<CameraFunction>,
  )
  {
    let buttons = mailbox.buttons();
    let dpad = mailbox.dpad();

    // previous state is tracked even while disabled so that enabling
    // does not fire on a button that is already held
    let rising_buttons = ButtonSnapshot(buttons.0 & !self.prev_buttons.0);
    let rising_dpad = DpadState(dpad.0 & !self.prev_dpad.0);
    self.prev_buttons = buttons;
    self.prev_dpad = dpad;

    let mut functions = Vec::new();
    if config.button_enabled
    {
      functions.extend(rising_buttons.pressed().filter_map(|i| config.assignments.button(i)));
    }
    if config.dpad_enabled
    {
      functions.extend(
        DpadDirection::ALL
          .into_iter()
          .filter(|d| rising_dpad.is_pressed(*d))
          .filter_map(|d| config.assignments.dpad(d)),
      );
    }

    for function in functions
    {
      debug!("firing {}", function.name());
      if let Err(e) = presets.execute(function, viewport)
      {
        warn!("{} failed: {e}", function.name());
      }
      fired.push(function);
    }
  }
}
