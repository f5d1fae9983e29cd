use std::thread;
use std::time::Duration;

use glam::DVec3;
use log::{info, warn};

use crate::camera::pose::{CameraPose, Transition, ViewFace};
use crate::camera::viewport::Viewport;
use crate::config::{CameraFunction, PresetTuning, RuntimeConfig};
use crate::error::ViewportError;
use crate::math::{normalize_or, Quaternion};

//
// ──────────────────────────────────────────────────────────────
//   Discrete camera jumps (buttons, D-pad, UI commands)
//
//   All of these animate; only the joystick orbit writes instantly.
// ──────────────────────────────────────────────────────────────
//

/// Camera-relative axis for a quarter-turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAxis
{
  /// Yaw about `up`. Positive turns the view right.
  Horizontal,
  /// Pitch about `right`. Positive swings the eye downward.
  Vertical,
  /// Roll about the view axis. Positive turns the scene clockwise.
  Axial,
}

/// Face whose target→eye direction best matches `direction`. Ties go
/// to the earlier face in [`ViewFace::ALL`].
pub fn nearest_view_face(direction: DVec3) -> ViewFace
{
  let mut best = ViewFace::Front;
  let mut best_dot = f64::NEG_INFINITY;

  for face in ViewFace::ALL
  {
    let dot = direction.dot(face.direction());
    if dot > best_dot
    {
      best = face;
      best_dot = dot;
    }
  }

  best
}

#[derive(Debug, Clone)]
pub struct PresetCameraOps
{
  tuning: PresetTuning,
  z_singularity_threshold: f64,
}

impl PresetCameraOps
{
  pub fn new(tuning: PresetTuning, z_singularity_threshold: f64) -> Self
  {
    Self { tuning, z_singularity_threshold }
  }

  pub fn from_config(config: &RuntimeConfig) -> Self
  {
    Self::new(config.presets.clone(), config.orbit.z_singularity_threshold)
  }

  pub fn home(&self, viewport: &mut dyn Viewport) -> Result<(), ViewportError>
  {
    if viewport.go_home(true)
    {
      info!("moved to home view");
    }
    else
    {
      warn!("host could not move to home view");
    }
    viewport.refresh()
  }

  pub fn fit_view(&self, viewport: &mut dyn Viewport) -> Result<(), ViewportError>
  {
    viewport.fit()
  }

  pub fn iso_view(&self, viewport: &mut dyn Viewport) -> Result<(), ViewportError>
  {
    let pose = CameraPose::new(self.tuning.iso_eye, DVec3::ZERO, DVec3::Z);
    viewport.apply_camera(&pose, Transition::Smooth)?;
    viewport.refresh()
  }

  pub fn view_cube_face(
    &self,
    viewport: &mut dyn Viewport,
    face: ViewFace,
  ) -> Result<(), ViewportError>
  {
    viewport.set_view_orientation(face.into(), Transition::Smooth)?;
    viewport.fit()?;
    viewport.refresh()
  }

  pub fn nearest_view_cube_face(
    &self,
    viewport: &mut dyn Viewport,
  ) -> Result<ViewFace, ViewportError>
  {
    let pose = viewport.camera()?;
    let face = nearest_view_face(pose.forward());
    info!("nearest ViewCube face is {face:?}");

    self.view_cube_face(viewport, face)?;
    Ok(face)
  }

  /// Turn the current camera by `degrees` about a camera-relative axis.
  pub fn rotate_screen(
    &self,
    viewport: &mut dyn Viewport,
    axis: ScreenAxis,
    degrees: f64,
  ) -> Result<(), ViewportError>
  {
    let pose = viewport.camera()?;
    let next = self.rotated_pose(&pose, axis, degrees);

    viewport.apply_camera(&next, Transition::Smooth)?;
    viewport.refresh()
  }

  /// Snap to the nearest face first when the host reports an arbitrary
  /// orientation, then rotate.
  pub fn smart_rotate(
    &self,
    viewport: &mut dyn Viewport,
    axis: ScreenAxis,
    degrees: f64,
  ) -> Result<(), ViewportError>
  {
    if viewport.camera()?.orientation.is_arbitrary()
    {
      info!("arbitrary orientation, snapping to nearest face before rotating");
      self.nearest_view_cube_face(viewport)?;
      // let the host finish its animated transition
      thread::sleep(Duration::from_millis(self.tuning.smart_settle_ms));
    }

    self.rotate_screen(viewport, axis, degrees)
  }

  /// Pure part of [`PresetCameraOps::rotate_screen`].
  pub fn rotated_pose(&self, pose: &CameraPose, axis: ScreenAxis, degrees: f64) -> CameraPose
  {
    let angle = degrees.to_radians();
    let offset = pose.eye - pose.target;
    let up = normalize_or(pose.up, DVec3::Z);

    match axis
    {
      ScreenAxis::Horizontal =>
      {
        let q = Quaternion::from_axis_angle(up, angle);
        CameraPose::new(pose.target + q.rotate(offset), pose.target, pose.up)
      }

      ScreenAxis::Vertical =>
      {
        let view = normalize_or(pose.target - pose.eye, DVec3::NEG_Y);
        let near_z = view.z.abs() > self.z_singularity_threshold;

        let right = if near_z
        {
          // looking along Z: take right from the horizontal part of up
          let flat = DVec3::new(up.x, up.y, 0.0);
          if flat.length() > 0.1
          {
            let flat = flat.normalize();
            DVec3::new(-flat.y, flat.x, 0.0)
          }
          else
          {
            DVec3::X
          }
        }
        else
        {
          let r = view.cross(up);
          if r.length() < 0.01 { DVec3::X } else { r.normalize() }
        };

        let q = Quaternion::from_axis_angle(right, angle);
        let mut new_up = q.rotate(up);

        let max_level_z = self.tuning.relevel_max_tilt_deg.to_radians().sin();
        if !near_z && new_up.z.abs() < max_level_z
        {
          let flat = DVec3::new(new_up.x, new_up.y, 0.0);
          new_up = if flat.length() > 0.01 { flat.normalize() } else { up };
        }

        CameraPose::new(pose.target + q.rotate(offset), pose.target, new_up)
      }

      ScreenAxis::Axial =>
      {
        let axis = normalize_or(offset, DVec3::NEG_Y);
        let q = Quaternion::from_axis_angle(axis, angle);
        CameraPose::new(pose.eye, pose.target, q.rotate(pose.up))
      }
    }
  }

  /// Run one assignable camera function.
  pub fn execute(
    &self,
    function: CameraFunction,
    viewport: &mut dyn Viewport,
  ) -> Result<(), ViewportError>
  {
    use CameraFunction as F;
    use ScreenAxis::{Axial, Horizontal, Vertical};

    match function
    {
      F::None => Ok(()),
      F::HomeView => self.home(viewport),
      F::FitView => self.fit_view(viewport),
      F::NearestViewcube => self.nearest_view_cube_face(viewport).map(|_| ()),
      F::ViewcubeFront => self.view_cube_face(viewport, ViewFace::Front),
      F::ViewcubeBack => self.view_cube_face(viewport, ViewFace::Back),
      F::ViewcubeLeft => self.view_cube_face(viewport, ViewFace::Left),
      F::ViewcubeRight => self.view_cube_face(viewport, ViewFace::Right),
      F::ViewcubeTop => self.view_cube_face(viewport, ViewFace::Top),
      F::ViewcubeBottom => self.view_cube_face(viewport, ViewFace::Bottom),
      F::IsoView => self.iso_view(viewport),
      F::RotateScreenRight => self.rotate_screen(viewport, Horizontal, 90.0),
      F::RotateScreenLeft => self.rotate_screen(viewport, Horizontal, -90.0),
      F::RotateScreenUp => self.rotate_screen(viewport, Vertical, 90.0),
      F::RotateScreenDown => self.rotate_screen(viewport, Vertical, -90.0),
      F::RotateScreenClockwise => self.rotate_screen(viewport, Axial, 90.0),
      F::RotateScreenCounterClockwise => self.rotate_screen(viewport, Axial, -90.0),
      F::SmartRotateRight => self.smart_rotate(viewport, Horizontal, 90.0),
      F::SmartRotateLeft => self.smart_rotate(viewport, Horizontal, -90.0),
      F::SmartRotateUp => self.smart_rotate(viewport, Vertical, 90.0),
      F::SmartRotateDown => self.smart_rotate(viewport, Vertical, -90.0),
      F::SmartRotateClockwise => self.smart_rotate(viewport, Axial, 90.0),
      F::SmartRotateCounterClockwise => self.smart_rotate(viewport, Axial, -90.0),
    }
  }
}

#[cfg(test)]
mod tests
{
  use std::f64::consts::FRAC_1_SQRT_2;

  use super::*;

  fn ops() -> PresetCameraOps
  {
    let tuning = PresetTuning { smart_settle_ms: 0, ..PresetTuning::default() };
    PresetCameraOps::new(tuning, 0.95)
  }

  fn front() -> CameraPose
  {
    CameraPose::new(DVec3::new(0.0, -10.0, 0.0), DVec3::ZERO, DVec3::Z)
  }

  #[test]
  fn nearest_face_on_axes()
  {
    assert_eq!(nearest_view_face(DVec3::new(0.0, -1.0, 0.0)), ViewFace::Front);
    assert_eq!(nearest_view_face(DVec3::new(1.0, 0.0, 0.0)), ViewFace::Right);
    assert_eq!(nearest_view_face(DVec3::new(0.1, 0.2, -0.9)), ViewFace::Bottom);
  }

  #[test]
  fn nearest_face_ties_go_to_enumeration_order()
  {
    // Front is listed before Right
    assert_eq!(nearest_view_face(DVec3::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0)), ViewFace::Front);
    // Back before Top
    assert_eq!(nearest_view_face(DVec3::new(0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2)), ViewFace::Back);
  }

  #[test]
  fn horizontal_quarter_turn_from_front_reaches_right()
  {
    let next = ops().rotated_pose(&front(), ScreenAxis::Horizontal, 90.0);
    assert!(next.eye.abs_diff_eq(DVec3::new(10.0, 0.0, 0.0), 1e-9), "{:?}", next.eye);
    assert_eq!(next.up, DVec3::Z);

    let back = ops().rotated_pose(&next, ScreenAxis::Horizontal, -90.0);
    assert!(back.eye.abs_diff_eq(front().eye, 1e-9));
  }

  #[test]
  fn vertical_quarter_turn_from_front_reaches_bottom()
  {
    let next = ops().rotated_pose(&front(), ScreenAxis::Vertical, 90.0);
    assert!(next.eye.abs_diff_eq(DVec3::new(0.0, 0.0, -10.0), 1e-9), "{:?}", next.eye);
    assert!(next.up.abs_diff_eq(DVec3::NEG_Y, 1e-9), "{:?}", next.up);
  }

  #[test]
  fn vertical_turn_from_top_uses_horizontal_up()
  {
    let top = CameraPose::new(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
    let next = ops().rotated_pose(&top, ScreenAxis::Vertical, -90.0);

    assert!(next.is_finite());
    assert!((next.distance() - 10.0).abs() < 1e-9);
    // swings onto the horizon, away from the Z axis
    assert!(next.eye.z.abs() < 1e-9, "{:?}", next.eye);
  }

  #[test]
  fn vertical_turn_flattens_up_near_the_horizon()
  {
    // a 60 degree pitch leaves up within 45 degrees of the horizon
    let next = ops().rotated_pose(&front(), ScreenAxis::Vertical, 60.0);
    assert_eq!(next.up.z, 0.0);
    assert!(next.up.abs_diff_eq(DVec3::NEG_Y, 1e-12), "{:?}", next.up);
    assert!((next.distance() - 10.0).abs() < 1e-9);
  }

  #[test]
  fn vertical_turn_keeps_steep_up()
  {
    let next = ops().rotated_pose(&front(), ScreenAxis::Vertical, 20.0);
    assert!(next.up.z > 0.9);
  }

  #[test]
  fn axial_turn_rolls_up_only()
  {
    let next = ops().rotated_pose(&front(), ScreenAxis::Axial, 90.0);
    assert_eq!(next.eye, front().eye);
    assert!(next.up.abs_diff_eq(DVec3::NEG_X, 1e-9), "{:?}", next.up);
  }
}
