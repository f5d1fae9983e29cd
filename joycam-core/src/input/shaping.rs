use crate::config::PollingTuning;

//
// ──────────────────────────────────────────────────────────────
//   Per-axis shaping
//
//   raw → dead zone → response curve → smoothing → mailbox
// ──────────────────────────────────────────────────────────────
//

/// Hard clamp to zero below `threshold`. Values at or above the
/// threshold pass through unchanged (no rescaling).
pub fn apply_dead_zone(value: f64, threshold: f64) -> f64
{
  if value.abs() < threshold
  {
    0.0
  }
  else
  {
    value
  }
}

/// `sign(v) * |v|^exponent`.
///
/// `exponent < 1` boosts small deflections, `> 1` damps them.
pub fn apply_response_curve(value: f64, exponent: f64) -> f64
{
  if value == 0.0
  {
    return 0.0;
  }

  value.signum() * value.abs().powf(exponent)
}

/// Dead zone followed by response curve.
pub fn shape_axis(value: f64, dead_zone: f64, exponent: f64) -> f64
{
  apply_response_curve(apply_dead_zone(value, dead_zone), exponent)
}

//
// ──────────────────────────────────────────────────────────────
//   Spike-rejecting low-pass filter for a stick (x, y) pair
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
pub struct StickSmoother
{
  prev: Option<(f64, f64)>,
}

impl StickSmoother
{
  pub fn new() -> Self
  {
    Self { prev: None }
  }

  /// Blend the new sample toward the previous output.
  ///
  /// A jump larger than `jump_threshold` on either axis only moves
  /// `jump_blend` of the way; ordinary motion is low-passed with
  /// `smoothing_weight` on the new sample. The first sample passes
  /// through untouched.
  pub fn filter(&mut self, x: f64, y: f64, tuning: &PollingTuning) -> (f64, f64)
  {
    let out = match self.prev
    {
      None => (x, y),

      Some((px, py)) =>
      {
        let is_spike =
          (x - px).abs() > tuning.jump_threshold || (y - py).abs() > tuning.jump_threshold;

        let weight = if is_spike { tuning.jump_blend } else { tuning.smoothing_weight };
        if is_spike
        {
          log::debug!("stick spike suppressed: ({px:.2}, {py:.2}) -> ({x:.2}, {y:.2})");
        }

        (px + weight * (x - px), py + weight * (y - py))
      }
    };

    self.prev = Some(out);
    out
  }

  pub fn reset(&mut self)
  {
    self.prev = None;
  }
}
