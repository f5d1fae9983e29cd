use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::config::{ConfigHandle, PollingTuning, RuntimeConfig};
use crate::error::panic_message;
use crate::input::device::{DeviceManager, RawFrame};
use crate::input::mailbox::SharedInputState;
use crate::input::shaping::{shape_axis, StickSmoother};

//
// ──────────────────────────────────────────────────────────────
//   Activity → polling period
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity
{
  /// Stick outside the dead zone.
  Moving,
  /// Stick at rest, some button or D-pad direction held.
  ButtonsHeld,
  Idle,
}

impl Activity
{
  pub fn interval(self, tuning: &PollingTuning) -> Duration
  {
    let ms = match self
    {
      Activity::Moving => tuning.active_interval_ms,
      Activity::ButtonsHeld => tuning.held_interval_ms,
      Activity::Idle => tuning.idle_interval_ms,
    };
    Duration::from_millis(ms)
  }
}

//
// ──────────────────────────────────────────────────────────────
//   PollLoop: one iteration of the producer, no threading
// ──────────────────────────────────────────────────────────────
//

pub struct PollLoop
{
  devices: Arc<Mutex<DeviceManager>>,
  mailbox: Arc<SharedInputState>,
  config: ConfigHandle,
  smoother: StickSmoother,
}

impl PollLoop
{
  pub fn new(
    devices: Arc<Mutex<DeviceManager>>,
    mailbox: Arc<SharedInputState>,
    config: ConfigHandle,
  ) -> Self
  {
    Self { devices, mailbox, config, smoother: StickSmoother::new() }
  }

  /// Read the device once, shape, publish, and return how long to wait
  /// before the next iteration. Device errors are handled here and
  /// never escape.
  pub fn poll_once(&mut self) -> Duration
  {
    let config = self.config.snapshot();
    let tuning = &config.polling;

    let result = self.devices.lock().unwrap_or_else(PoisonError::into_inner).read_frame(&config);

    match result
    {
      Ok(Some(frame)) => self.publish(&frame, &config).interval(tuning),

      Ok(None) =>
      {
        self.mailbox.clear_axes();
        self.mailbox.set_buttons(&[]);
        self.mailbox.set_dpad(Default::default());
        Activity::Idle.interval(tuning)
      }

      Err(e) if e.needs_reinit() =>
      {
        warn!("{e}; reinitializing input subsystem");
        self.mailbox.clear_axes();
        self.smoother.reset();

        let mut devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        match devices.reinitialize(config.selected_joystick, tuning.reinit_delay())
        {
          Ok(_) => Activity::Moving.interval(tuning),
          Err(e) =>
          {
            warn!("input reinitialization failed: {e}");
            Duration::from_millis(tuning.error_backoff_ms)
          }
        }
      }

      Err(e) =>
      {
        warn!("joystick read failed: {e}");
        Duration::from_millis(tuning.error_backoff_ms)
      }
    }
  }

  fn publish(&mut self, frame: &RawFrame, config: &RuntimeConfig) -> Activity
  {
    let x = shape_axis(frame.x, config.dead_zone, config.response_curve);
    let y = shape_axis(frame.y, config.dead_zone, config.response_curve);
    let (x, y) = self.smoother.filter(x, y, &config.polling);

    self.mailbox.set_buttons(&frame.buttons);
    self.mailbox.set_dpad(frame.dpad);

    let eps = config.polling.publish_epsilon;
    if x.abs() > eps || y.abs() > eps
    {
      self.mailbox.publish_axes(x, y);
      Activity::Moving
    }
    else
    {
      self.mailbox.clear_axes();
      if frame.buttons.iter().any(|b| *b) || frame.dpad.any()
      {
        Activity::ButtonsHeld
      }
      else
      {
        Activity::Idle
      }
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   PollingWorker: dedicated thread around a PollLoop
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome
{
  Stopped,
  /// The thread did not exit in time and was left detached.
  TimedOut,
}

pub struct PollingWorker
{
  stop: Arc<AtomicBool>,
  handle: Option<JoinHandle<()>>,
}

impl PollingWorker
{
  pub fn spawn(mut poll: PollLoop) -> std::io::Result<Self>
  {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let handle = thread::Builder::new().name("joycam-poll".into()).spawn(move || {
      info!("polling thread started");
      while !flag.load(Ordering::Acquire)
      {
        let wait = match panic::catch_unwind(AssertUnwindSafe(|| poll.poll_once()))
        {
          Ok(wait) => wait,
          Err(payload) =>
          {
            error!("polling iteration panicked: {}", panic_message(payload.as_ref()));
            Duration::from_millis(poll.config.read(|c| c.polling.error_backoff_ms))
          }
        };

        if flag.load(Ordering::Acquire)
        {
          break;
        }
        // stop() unparks us, spurious wakeups just poll early
        thread::park_timeout(wait);
      }
      info!("polling thread stopped");
    })?;

    Ok(Self { stop, handle: Some(handle) })
  }

  pub fn is_running(&self) -> bool
  {
    self.handle.as_ref().is_some_and(|h| !h.is_finished())
  }

  /// Ask the thread to exit and wait up to `timeout` for it.
  pub fn stop(&mut self, timeout: Duration) -> StopOutcome
  {
    self.stop.store(true, Ordering::Release);

    let Some(handle) = self.handle.take()
    else
    {
      return StopOutcome::Stopped;
    };
    handle.thread().unpark();

    let deadline = Instant::now() + timeout;
    while !handle.is_finished()
    {
      if Instant::now() >= deadline
      {
        warn!("polling thread did not stop within {timeout:?}, leaving it detached");
        return StopOutcome::TimedOut;
      }
      thread::sleep(Duration::from_millis(5));
    }

    if handle.join().is_err()
    {
      error!("polling thread exited with a panic");
    }
    debug!("polling thread joined");
    StopOutcome::Stopped
  }
}

impl Drop for PollingWorker
{
  fn drop(&mut self)
  {
    self.stop.store(true, Ordering::Release);
    if let Some(handle) = &self.handle
    {
      handle.thread().unpark();
    }
  }
}

#[cfg(test)]
mod tests
{
  use super::*;
  use crate::error::DeviceError;
  use crate::input::scripted::{ScriptedBackend, ScriptedFrame};

  fn rig(config: RuntimeConfig) -> (ScriptedBackend, Arc<SharedInputState>, PollLoop)
  {
    let backend = ScriptedBackend::with_gamepad();
    let mut devices = DeviceManager::new(Box::new(backend.clone()));
    devices.initialize().unwrap();
    devices.connect(0);

    let mailbox = Arc::new(SharedInputState::new());
    let poll = PollLoop::new(Arc::new(Mutex::new(devices)), Arc::clone(&mailbox), ConfigHandle::new(config));
    (backend, mailbox, poll)
  }

  fn quick_config() -> RuntimeConfig
  {
    let mut config = RuntimeConfig { dead_zone: 0.1, ..RuntimeConfig::default() };
    config.polling.reinit_delay_ms = 0;
    config
  }

  #[test]
  fn stick_motion_publishes_at_active_rate()
  {
    let (backend, mailbox, mut poll) = rig(quick_config());
    backend.set_frame(ScriptedFrame::stick(0.5, 0.0));

    assert_eq!(poll.poll_once(), Duration::from_millis(20));
    assert_eq!(mailbox.take_axes(), Some((0.5, 0.0)));
  }

  #[test]
  fn dead_zone_input_leaves_mailbox_clean()
  {
    let (backend, mailbox, mut poll) = rig(quick_config());
    backend.set_frame(ScriptedFrame::stick(0.05, 0.05));

    assert_eq!(poll.poll_once(), Duration::from_millis(200));
    assert!(!mailbox.is_dirty());
    assert_eq!(mailbox.peek_axes(), (0.0, 0.0));
  }

  #[test]
  fn held_button_uses_medium_rate()
  {
    let (backend, mailbox, mut poll) = rig(quick_config());
    backend.set_frame(ScriptedFrame::idle().with_button(2));

    assert_eq!(poll.poll_once(), Duration::from_millis(50));
    assert!(mailbox.buttons().is_pressed(2));

    backend.set_frame(ScriptedFrame::idle().with_hat((0, -1)));
    assert_eq!(poll.poll_once(), Duration::from_millis(50));
    assert!(!mailbox.buttons().any());
    assert!(mailbox.dpad().any());
  }

  #[test]
  fn released_stick_decays_then_goes_idle()
  {
    let (backend, mailbox, mut poll) = rig(quick_config());
    backend.set_frame(ScriptedFrame::stick(0.4, 0.0));
    poll.poll_once();
    mailbox.take_axes();

    backend.set_frame(ScriptedFrame::idle());
    assert_eq!(poll.poll_once(), Duration::from_millis(20));
    let (x, _) = mailbox.take_axes().unwrap();
    assert!(x > 0.0 && x < 0.4);

    let mut last = Duration::ZERO;
    for _ in 0..40
    {
      last = poll.poll_once();
    }
    assert_eq!(last, Duration::from_millis(200));
    assert_eq!(mailbox.take_axes(), None);
  }

  #[test]
  fn transient_error_backs_off()
  {
    let (backend, _, mut poll) = rig(quick_config());
    backend.push_error(DeviceError::Backend("usb hiccup".into()));

    assert_eq!(poll.poll_once(), Duration::from_millis(500));
    assert_eq!(backend.init_count(), 1);
  }

  #[test]
  fn lost_device_reinitializes_and_resumes()
  {
    let (backend, mailbox, mut poll) = rig(quick_config());
    backend.push_error(DeviceError::Lost(0));

    poll.poll_once();
    assert_eq!(backend.init_count(), 2);
    assert_eq!(backend.shutdown_count(), 1);

    backend.set_frame(ScriptedFrame::stick(0.0, -0.8));
    poll.poll_once();
    assert_eq!(mailbox.take_axes(), Some((0.0, -0.8)));
  }

  #[test]
  fn worker_thread_stops_promptly_while_idle()
  {
    let (backend, _, poll) = rig(quick_config());
    let mut worker = PollingWorker::spawn(poll).unwrap();

    let started = Instant::now();
    while backend.poll_count() == 0 && started.elapsed() < Duration::from_secs(2)
    {
      thread::sleep(Duration::from_millis(1));
    }
    assert!(worker.is_running());

    let stopping = Instant::now();
    assert_eq!(worker.stop(Duration::from_secs(5)), StopOutcome::Stopped);
    assert!(stopping.elapsed() < Duration::from_millis(150));
    assert!(!worker.is_running());

    // second stop is a no-op
    assert_eq!(worker.stop(Duration::from_millis(1)), StopOutcome::Stopped);
  }

  fn wait_for(mut ready: impl FnMut() -> bool) -> bool
  {
    let started = Instant::now();
    while started.elapsed() < Duration::from_secs(2)
    {
      if ready()
      {
        return true;
      }
      thread::sleep(Duration::from_millis(1));
    }
    ready()
  }

  #[test]
  fn panicking_iteration_does_not_end_the_thread()
  {
    let mut config = quick_config();
    config.polling.error_backoff_ms = 5;
    let (backend, mailbox, poll) = rig(config);
    backend.push_panic("driver blew up");
    backend.push_frame(ScriptedFrame::stick(0.5, 0.0));

    let mut worker = PollingWorker::spawn(poll).unwrap();
    assert!(wait_for(|| mailbox.is_dirty()));
    assert!(worker.is_running());
    assert!(backend.poll_count() >= 2);
    let (x, y) = mailbox.peek_axes();
    assert!((x - 0.5).abs() < 1e-9 && y.abs() < 1e-9);

    assert_eq!(worker.stop(Duration::from_secs(5)), StopOutcome::Stopped);
  }

  #[test]
  fn stalled_poll_times_out_and_detaches()
  {
    let (backend, _, poll) = rig(quick_config());
    backend.push_stall(Duration::from_millis(500));

    let mut worker = PollingWorker::spawn(poll).unwrap();
    assert!(wait_for(|| backend.poll_count() >= 1));

    let stopping = Instant::now();
    assert_eq!(worker.stop(Duration::from_millis(20)), StopOutcome::TimedOut);
    assert!(stopping.elapsed() < Duration::from_millis(400));
    assert!(!worker.is_running());
  }
}
