use glam::DVec3;
use log::debug;

use crate::camera::pose::CameraPose;
use crate::config::{OrbitTuning, RuntimeConfig};
use crate::math::{normalize_or, Quaternion};

//
// ──────────────────────────────────────────────────────────────
//   Per-frame joystick orbit
//
//   forward = normalize(eye - target)
//   right   = forward × up
//   q       = yaw * pitch          (pitch applied first)
//
//   Near a ViewCube corner `right` is ill-defined, so rotation
//   falls back to world X / world Z with heavily damped input.
// ──────────────────────────────────────────────────────────────
//

/// Everything the orbit reads from the configuration, copied once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitSettings
{
  pub rotation_scale: f64,
  pub dead_zone: f64,
  pub use_z_axis_rotation: bool,
  pub tuning: OrbitTuning,
}

impl OrbitSettings
{
  pub fn from_config(config: &RuntimeConfig) -> Self
  {
    Self {
      rotation_scale: config.rotation_scale,
      dead_zone: config.dead_zone,
      use_z_axis_rotation: config.use_z_axis_rotation,
      tuning: config.orbit.clone(),
    }
  }
}

impl Default for OrbitSettings
{
  fn default() -> Self
  {
    Self::from_config(&RuntimeConfig::default())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason
{
  /// Eye on the target, or a zero up vector.
  Degenerate,
  /// New eye has a coordinate beyond `max_eye_coordinate`.
  OutOfBounds,
  /// Eye X and Z both changed sign in one step.
  SignFlip,
  NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitStep
{
  /// Input below `input_epsilon`; nothing to do.
  Idle,
  Rotated(CameraPose),
  /// The previous pose must be kept.
  Rejected(RejectReason),
}

/// True when `forward` or `up` sits close to a world axis, or they are
/// nearly parallel.
pub fn is_singular(forward: DVec3, up: DVec3, right_length: f64, tuning: &OrbitTuning) -> bool
{
  let t = tuning.singularity_threshold;
  let near_axis = |v: DVec3| v.abs().max_element() > t;

  near_axis(forward) || near_axis(up) || right_length < tuning.min_right_length
}

/// Rotate `pose` by one tick of shaped stick input.
pub fn orbit_camera(pose: &CameraPose, x: f64, y: f64, settings: &OrbitSettings) -> OrbitStep
{
  let t = &settings.tuning;

  if x.abs() < t.input_epsilon && y.abs() < t.input_epsilon
  {
    return OrbitStep::Idle;
  }
  if !pose.is_finite() || !x.is_finite() || !y.is_finite()
  {
    return OrbitStep::Rejected(RejectReason::NonFinite);
  }

  let offset = pose.eye - pose.target;
  let up = normalize_or(pose.up, DVec3::ZERO);
  if offset.length_squared() == 0.0 || up == DVec3::ZERO
  {
    return OrbitStep::Rejected(RejectReason::Degenerate);
  }

  let forward = offset.normalize();
  let right = forward.cross(up);
  let right_length = right.length();

  let yaw_angle = x * settings.rotation_scale;
  let pitch_angle = y * settings.rotation_scale;

  let singular = is_singular(forward, up, right_length, t);

  let q = if singular
  {
    debug!("singular camera frame (|right| = {right_length:.4}), using world axes");
    let pitch = Quaternion::from_axis_angle(DVec3::X, pitch_angle * t.singular_input_scale);
    let yaw = Quaternion::from_axis_angle(DVec3::Z, -yaw_angle * t.singular_input_scale);
    yaw * pitch
  }
  else
  {
    let right = right / right_length;
    let pitch = Quaternion::from_axis_angle(right, pitch_angle);

    let turntable = settings.use_z_axis_rotation && forward.z.abs() <= t.z_singularity_threshold;
    let yaw = if turntable
    {
      let z_sign = if up.z >= 0.0 { 1.0 } else { -1.0 };
      Quaternion::from_axis_angle(DVec3::Z, z_sign * -yaw_angle)
    }
    else
    {
      Quaternion::from_axis_angle(up, -yaw_angle)
    };
    yaw * pitch
  };

  let new_eye = pose.target + q.rotate(offset);
  let rotated_up = q.rotate(up);

  let mut new_up = if singular
  {
    // creep toward the rotated up instead of snapping
    normalize_or(up.lerp(rotated_up, t.singular_up_blend), up)
  }
  else
  {
    rotated_up
  };

  let input_active = x.abs() > t.level_input_min || y.abs() > t.level_input_min;
  if settings.use_z_axis_rotation && input_active
  {
    new_up = level_up(new_eye, pose.target, new_up, settings.dead_zone, t);
  }

  if !new_eye.is_finite() || !new_up.is_finite()
  {
    return OrbitStep::Rejected(RejectReason::NonFinite);
  }
  if new_eye.abs().max_element() > t.max_eye_coordinate
  {
    return OrbitStep::Rejected(RejectReason::OutOfBounds);
  }
  if pose.eye.x * new_eye.x < 0.0 && pose.eye.z * new_eye.z < 0.0
  {
    return OrbitStep::Rejected(RejectReason::SignFlip);
  }

  OrbitStep::Rotated(CameraPose::new(new_eye, pose.target, new_up))
}

/// Turntable level correction: ease `up` 30% (by default) toward the
/// horizon-level up when the tilt exceeds twice the dead zone.
fn level_up(eye: DVec3, target: DVec3, up: DVec3, dead_zone: f64, t: &OrbitTuning) -> DVec3
{
  let view = normalize_or(target - eye, DVec3::ZERO);
  if view == DVec3::ZERO || view.z.abs() > t.z_singularity_threshold
  {
    return up;
  }

  let ideal_right = view.cross(DVec3::Z);
  if ideal_right.length() <= 0.1
  {
    return up;
  }

  let mut ideal_up = ideal_right.normalize().cross(view).normalize();
  if view.z < t.level_flip_view_z
  {
    ideal_up = -ideal_up;
  }

  let tilt = (1.0 - up.dot(ideal_up)).abs();
  if tilt <= 2.0 * dead_zone
  {
    return up;
  }

  debug!("levelling camera, tilt {tilt:.3}");
  normalize_or(up.lerp(ideal_up, t.level_blend), up)
}

#[cfg(test)]
mod tests
{
  use approx::assert_abs_diff_eq;

  use super::*;

  /// Eye above the XY plane, up perpendicular to the view, no world
  /// component past 0.8.
  fn oblique_pose() -> CameraPose
  {
    let eye = DVec3::new(10.0, -10.0, 12.0);
    let f = eye.normalize();
    let up = (DVec3::Z - f * f.z).normalize();
    CameraPose::new(eye, DVec3::ZERO, up)
  }

  fn rotated(step: OrbitStep) -> CameraPose
  {
    match step
    {
      OrbitStep::Rotated(pose) => pose,
      other => panic!("expected rotation, got {other:?}"),
    }
  }

  #[test]
  fn tiny_input_is_idle()
  {
    let step = orbit_camera(&oblique_pose(), 0.0005, -0.0005, &OrbitSettings::default());
    assert_eq!(step, OrbitStep::Idle);
  }

  #[test]
  fn oblique_pose_is_not_singular()
  {
    let pose = oblique_pose();
    let f = pose.forward();
    let t = OrbitTuning::default();
    assert!(!is_singular(f, pose.up, f.cross(pose.up).length(), &t));
  }

  #[test]
  fn yaw_keeps_distance_and_up()
  {
    let pose = oblique_pose();
    let next = rotated(orbit_camera(&pose, 0.5, 0.0, &OrbitSettings::default()));

    assert_abs_diff_eq!(next.distance(), pose.distance(), epsilon = 1e-9);
    assert!(next.up.abs_diff_eq(pose.up, 1e-12));
    assert!(!next.eye.abs_diff_eq(pose.eye, 1e-6));
    // yaw angle = 0.5 * 0.008
    assert_abs_diff_eq!(next.forward().angle_between(pose.forward()), 0.004, epsilon = 1e-9);
  }

  #[test]
  fn pitch_rotates_up_with_eye()
  {
    let pose = oblique_pose();
    let next = rotated(orbit_camera(&pose, 0.0, 1.0, &OrbitSettings::default()));

    assert_abs_diff_eq!(next.up.dot(next.forward()), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(next.up.angle_between(pose.up), 0.008, epsilon = 1e-9);
  }

  #[test]
  fn top_view_within_one_degree_takes_singular_branch()
  {
    let tilt = 1f64.to_radians() * 0.9;
    let eye = DVec3::new(tilt.sin(), 0.0, tilt.cos()) * 10.0;
    let pose = CameraPose::new(eye, DVec3::ZERO, DVec3::Y);
    let f = pose.forward();
    assert!(is_singular(f, pose.up, f.cross(pose.up).length(), &OrbitTuning::default()));

    for (x, y) in [(1.0, 0.0), (0.0, 1.0), (-1.0, -1.0)]
    {
      let next = rotated(orbit_camera(&pose, x, y, &OrbitSettings::default()));
      assert!(next.is_finite());
      assert_abs_diff_eq!(next.up.length(), 1.0, epsilon = 1e-12);
      assert_abs_diff_eq!(next.distance(), 10.0, epsilon = 1e-9);
      // damped tenfold
      assert!(next.forward().angle_between(f) <= 0.008 * 0.1 * 1.5);
    }
  }

  #[test]
  fn parallel_up_and_forward_is_handled()
  {
    let pose = CameraPose::new(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Z);
    let next = rotated(orbit_camera(&pose, 1.0, 1.0, &OrbitSettings::default()));
    assert!(next.is_finite());
  }

  #[test]
  fn turntable_yaw_is_about_world_z()
  {
    let settings = OrbitSettings { use_z_axis_rotation: true, ..OrbitSettings::default() };
    let pose = oblique_pose();
    let next = rotated(orbit_camera(&pose, 1.0, 0.0, &settings));

    // height is preserved by a rotation about Z
    assert_abs_diff_eq!(next.eye.z, pose.eye.z, epsilon = 1e-9);
    assert_abs_diff_eq!(next.up.length(), 1.0, epsilon = 1e-12);
  }

  #[test]
  fn turntable_levels_a_rolled_camera()
  {
    let settings = OrbitSettings { use_z_axis_rotation: true, dead_zone: 0.01, ..OrbitSettings::default() };
    let base = oblique_pose();

    // roll the camera 30 degrees about its view axis
    let roll = Quaternion::from_axis_angle(base.forward(), 30f64.to_radians());
    let mut pose = CameraPose::new(base.eye, base.target, roll.rotate(base.up));

    let tilt = |p: &CameraPose| p.up.angle_between(base.up);
    let before = tilt(&pose);
    for _ in 0..10
    {
      pose = rotated(orbit_camera(&pose, 0.0, 0.02, &settings));
    }
    assert!(tilt(&pose) < before * 0.5, "tilt {} vs {}", tilt(&pose), before);
  }

  #[test]
  fn far_eye_is_rejected()
  {
    let target = DVec3::new(990.0, 0.0, 0.0);
    let pose = CameraPose::new(target + DVec3::new(0.0, -20.0, 0.5), target, DVec3::Z);
    let settings = OrbitSettings { rotation_scale: 10.0, ..OrbitSettings::default() };
    assert_eq!(
      orbit_camera(&pose, -1.0, 0.0, &settings),
      OrbitStep::Rejected(RejectReason::OutOfBounds)
    );
  }

  #[test]
  fn simultaneous_x_and_z_sign_flip_is_rejected()
  {
    // a half-turn pitch sends the eye to the opposite side of the target
    let eye = DVec3::new(3.0, 2.0, 3.0);
    let f = eye.normalize();
    let pose = CameraPose::new(eye, DVec3::ZERO, (DVec3::Z - f * f.z).normalize());
    let settings = OrbitSettings { rotation_scale: std::f64::consts::PI, ..OrbitSettings::default() };
    let step = orbit_camera(&pose, 0.0, 1.0, &settings);
    assert_eq!(step, OrbitStep::Rejected(RejectReason::SignFlip));
  }

  #[test]
  fn degenerate_pose_is_rejected()
  {
    let pose = CameraPose::new(DVec3::ONE, DVec3::ONE, DVec3::Z);
    assert_eq!(
      orbit_camera(&pose, 1.0, 0.0, &OrbitSettings::default()),
      OrbitStep::Rejected(RejectReason::Degenerate)
    );
  }

  #[test]
  fn non_finite_input_or_pose_is_rejected()
  {
    let pose = oblique_pose();
    let settings = OrbitSettings::default();
    assert_eq!(
      orbit_camera(&pose, f64::NAN, 0.0, &settings),
      OrbitStep::Rejected(RejectReason::NonFinite)
    );

    let broken = CameraPose::new(DVec3::new(f64::INFINITY, -10.0, 12.0), DVec3::ZERO, pose.up);
    assert_eq!(
      orbit_camera(&broken, 0.5, 0.0, &settings),
      OrbitStep::Rejected(RejectReason::NonFinite)
    );
  }
}
