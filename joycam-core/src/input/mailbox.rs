use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

//
// ──────────────────────────────────────────────────────────────
//   SharedInputState
//
//   Single producer (polling thread), single consumer (UI tick).
//   Every field is an independent atomic: the consumer may see a
//   stale or torn (x, y) pair, which only costs one frame.
// ──────────────────────────────────────────────────────────────
//

pub const MAX_BUTTONS: usize = 64;

#[derive(Debug, Default)]
pub struct SharedInputState
{
  axis_x: AtomicU64,
  axis_y: AtomicU64,
  dirty: AtomicBool,
  buttons: AtomicU64,
  dpad: AtomicU8,
}

impl SharedInputState
{
  pub fn new() -> Self
  {
    Self::default()
  }

  // ── producer side ────────────────────────────────────────────

  /// Store a fresh shaped stick sample and flag it for the consumer.
  pub fn publish_axes(&self, x: f64, y: f64)
  {
    self.axis_x.store(x.to_bits(), Ordering::Relaxed);
    self.axis_y.store(y.to_bits(), Ordering::Relaxed);
    self.dirty.store(true, Ordering::Release);
  }

  /// Zero the stick and withdraw any unconsumed sample.
  ///
  /// Besides `take_axes`, this is the one place `dirty` drops: the
  /// producer retracts a sample it published when the stick has since
  /// returned to rest or the device went away.
  pub fn clear_axes(&self)
  {
    self.axis_x.store(0f64.to_bits(), Ordering::Relaxed);
    self.axis_y.store(0f64.to_bits(), Ordering::Relaxed);
    self.dirty.store(false, Ordering::Release);
  }

  pub fn set_buttons(&self, states: &[bool])
  {
    self.buttons.store(ButtonSnapshot::from_states(states).0, Ordering::Release);
  }

  pub fn set_dpad(&self, state: DpadState)
  {
    self.dpad.store(state.0, Ordering::Release);
  }

  // ── consumer side ────────────────────────────────────────────

  /// Take the pending stick sample, clearing `dirty`. `None` when
  /// nothing new arrived since the last take.
  pub fn take_axes(&self) -> Option<(f64, f64)>
  {
    if !self.dirty.swap(false, Ordering::AcqRel)
    {
      return None;
    }

    Some(self.peek_axes())
  }

  pub fn peek_axes(&self) -> (f64, f64)
  {
    (
      f64::from_bits(self.axis_x.load(Ordering::Relaxed)),
      f64::from_bits(self.axis_y.load(Ordering::Relaxed)),
    )
  }

  pub fn is_dirty(&self) -> bool
  {
    self.dirty.load(Ordering::Acquire)
  }

  pub fn buttons(&self) -> ButtonSnapshot
  {
    ButtonSnapshot(self.buttons.load(Ordering::Acquire))
  }

  pub fn dpad(&self) -> DpadState
  {
    DpadState(self.dpad.load(Ordering::Acquire))
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Button bitmask
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSnapshot(pub u64);

impl ButtonSnapshot
{
  /// Buttons past [`MAX_BUTTONS`] are dropped.
  pub fn from_states(states: &[bool]) -> Self
  {
    let bits = states
      .iter()
      .take(MAX_BUTTONS)
      .enumerate()
      .filter(|(_, pressed)| **pressed)
      .fold(0u64, |acc, (i, _)| acc | (1 << i));

    Self(bits)
  }

  pub fn is_pressed(self, index: u32) -> bool
  {
    (index as usize) < MAX_BUTTONS && self.0 & (1 << index) != 0
  }

  pub fn any(self) -> bool
  {
    self.0 != 0
  }

  pub fn pressed(self) -> impl Iterator<Item = u32>
  {
    (0..MAX_BUTTONS as u32).filter(move |i| self.is_pressed(*i))
  }
}

//
// ──────────────────────────────────────────────────────────────
//   D-pad
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DpadDirection
{
  #[serde(rename = "dpad_up")]
  Up,
  #[serde(rename = "dpad_down")]
  Down,
  #[serde(rename = "dpad_left")]
  Left,
  #[serde(rename = "dpad_right")]
  Right,
}

impl DpadDirection
{
  pub const ALL: [DpadDirection; 4] =
    [DpadDirection::Up, DpadDirection::Down, DpadDirection::Left, DpadDirection::Right];

  pub fn key(self) -> &'static str
  {
    match self
    {
      DpadDirection::Up => "dpad_up",
      DpadDirection::Down => "dpad_down",
      DpadDirection::Left => "dpad_left",
      DpadDirection::Right => "dpad_right",
    }
  }

  pub fn from_key(key: &str) -> Option<Self>
  {
    Self::ALL.into_iter().find(|d| d.key() == key)
  }

  fn bit(self) -> u8
  {
    match self
    {
      DpadDirection::Up => 1,
      DpadDirection::Down => 2,
      DpadDirection::Left => 4,
      DpadDirection::Right => 8,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DpadState(pub u8);

impl DpadState
{
  /// Interpret a hat value: x = -1 left, 1 right; y = 1 up, -1 down.
  pub fn from_hat(hat: (i8, i8)) -> Self
  {
    let mut state = DpadState::default();
    match hat.0
    {
      -1 => state.set(DpadDirection::Left, true),
      1 => state.set(DpadDirection::Right, true),
      _ =>
      {}
    }
    match hat.1
    {
      1 => state.set(DpadDirection::Up, true),
      -1 => state.set(DpadDirection::Down, true),
      _ =>
      {}
    }
    state
  }

  pub fn set(&mut self, direction: DpadDirection, pressed: bool)
  {
    if pressed
    {
      self.0 |= direction.bit();
    }
    else
    {
      self.0 &= !direction.bit();
    }
  }

  pub fn is_pressed(self, direction: DpadDirection) -> bool
  {
    self.0 & direction.bit() != 0
  }

  pub fn any(self) -> bool
  {
    self.0 != 0
  }
}

#[cfg(test)]
mod tests
{
  use std::sync::Arc;
  use std::thread;

  use super::*;

  #[test]
  fn take_clears_dirty()
  {
    let state = SharedInputState::new();
    assert_eq!(state.take_axes(), None);

    state.publish_axes(0.5, -0.25);
    assert!(state.is_dirty());
    assert_eq!(state.take_axes(), Some((0.5, -0.25)));
    assert!(!state.is_dirty());
    assert_eq!(state.take_axes(), None);

    // values stay readable after the take
    assert_eq!(state.peek_axes(), (0.5, -0.25));
  }

  #[test]
  fn clear_withdraws_pending_sample()
  {
    let state = SharedInputState::new();
    state.publish_axes(0.9, 0.9);
    state.clear_axes();
    assert_eq!(state.take_axes(), None);
    assert_eq!(state.peek_axes(), (0.0, 0.0));
  }

  #[test]
  fn button_mask_round_trips()
  {
    let state = SharedInputState::new();
    state.set_buttons(&[false, true, false, true]);

    let snap = state.buttons();
    assert!(!snap.is_pressed(0));
    assert!(snap.is_pressed(1));
    assert!(snap.is_pressed(3));
    assert!(!snap.is_pressed(200));
    assert_eq!(snap.pressed().collect::<Vec<_>>(), vec![1, 3]);
  }

  #[test]
  fn buttons_past_capacity_are_ignored()
  {
    let mut states = vec![false; 80];
    states[70] = true;
    assert!(!ButtonSnapshot::from_states(&states).any());
  }

  #[test]
  fn hat_maps_to_dpad()
  {
    let up_left = DpadState::from_hat((-1, 1));
    assert!(up_left.is_pressed(DpadDirection::Left));
    assert!(up_left.is_pressed(DpadDirection::Up));
    assert!(!up_left.is_pressed(DpadDirection::Right));
    assert!(!up_left.is_pressed(DpadDirection::Down));

    assert!(!DpadState::from_hat((0, 0)).any());
    assert!(DpadState::from_hat((1, -1)).is_pressed(DpadDirection::Down));
  }

  #[test]
  fn dpad_keys_round_trip()
  {
    for d in DpadDirection::ALL
    {
      assert_eq!(DpadDirection::from_key(d.key()), Some(d));
    }
    assert_eq!(DpadDirection::from_key("dpad_sideways"), None);
  }

  #[test]
  fn producer_and_consumer_threads_share_state()
  {
    let state = Arc::new(SharedInputState::new());
    let producer = {
      let state = Arc::clone(&state);
      thread::spawn(move || {
        for i in 1..=1000
        {
          state.publish_axes(i as f64, -(i as f64));
        }
      })
    };

    let mut seen = 0;
    while !producer.is_finished()
    {
      if let Some((x, _)) = state.take_axes()
      {
        assert!(x >= 1.0 && x <= 1000.0);
        seen += 1;
      }
    }
    producer.join().unwrap();

    if let Some((x, _)) = state.take_axes()
    {
      assert!(x >= 1.0);
      seen += 1;
    }
    assert!(seen >= 1);
  }
}
