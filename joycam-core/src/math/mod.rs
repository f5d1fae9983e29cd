pub mod quaternion;

pub use quaternion::Quaternion;

use glam::DVec3;

/// Normalise `v`, or return `fallback` when `v` is too short to carry a direction.
pub fn normalize_or(v: DVec3, fallback: DVec3) -> DVec3
{
  let len = v.length();
  if len > 1e-12 && len.is_finite()
  {
    v / len
  }
  else
  {
    fallback
  }
}
