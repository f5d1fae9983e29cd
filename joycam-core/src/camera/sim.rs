use glam::DVec3;
use log::debug;

use crate::camera::pose::{CameraPose, Transition, ViewOrientation};
use crate::camera::viewport::Viewport;
use crate::error::ViewportError;

//
// ──────────────────────────────────────────────────────────────
//   SimulatedViewport: in-memory host camera
//
//   Classifies every pose it is given the way the host does:
//   a canonical orientation when view direction and up both match,
//   otherwise Arbitrary.
// ──────────────────────────────────────────────────────────────
//

const CLASSIFY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct SimulatedViewport
{
  pose: CameraPose,
  home: CameraPose,
  available: bool,
  fit_distance: f64,
  refresh_count: usize,
  fit_count: usize,
  transitions: Vec<Transition>,
}

impl SimulatedViewport
{
  pub fn new(pose: CameraPose) -> Self
  {
    let home = canonical_pose(ViewOrientation::IsoTopRight, DVec3::ZERO, 20.0).unwrap_or(pose);
    Self {
      pose: classify(pose),
      home,
      available: true,
      fit_distance: 20.0,
      refresh_count: 0,
      fit_count: 0,
      transitions: Vec::new(),
    }
  }

  /// Camera looking at the origin from `orientation`. `Arbitrary`
  /// falls back to the front view.
  pub fn at_orientation(orientation: ViewOrientation, distance: f64) -> Self
  {
    let pose = canonical_pose(orientation, DVec3::ZERO, distance)
      .or_else(|| canonical_pose(ViewOrientation::Front, DVec3::ZERO, distance))
      .unwrap_or_else(|| CameraPose::new(DVec3::new(0.0, -distance, 0.0), DVec3::ZERO, DVec3::Z));
    Self::new(pose)
  }

  pub fn with_home(mut self, home: CameraPose) -> Self
  {
    self.home = home;
    self
  }

  pub fn with_fit_distance(mut self, distance: f64) -> Self
  {
    self.fit_distance = distance;
    self
  }

  /// Replace the pose without recording a transition.
  pub fn set_pose(&mut self, pose: CameraPose)
  {
    self.pose = classify(pose);
  }

  /// `false` simulates a closed document: no viewport, no camera.
  pub fn set_available(&mut self, available: bool)
  {
    self.available = available;
  }

  pub fn pose(&self) -> CameraPose
  {
    self.pose
  }

  pub fn refresh_count(&self) -> usize
  {
    self.refresh_count
  }

  pub fn fit_count(&self) -> usize
  {
    self.fit_count
  }

  pub fn transitions(&self) -> &[Transition]
  {
    &self.transitions
  }

  fn ensure_available(&self) -> Result<(), ViewportError>
  {
    if self.available
    {
      Ok(())
    }
    else
    {
      Err(ViewportError::NoViewport)
    }
  }
}

impl Viewport for SimulatedViewport
{
  fn camera(&self) -> Result<CameraPose, ViewportError>
  {
    if !self.available
    {
      return Err(ViewportError::NoCamera);
    }
    Ok(self.pose)
  }

  fn apply_camera(&mut self, pose: &CameraPose, transition: Transition) -> Result<(), ViewportError>
  {
    self.ensure_available()?;
    if !pose.is_finite() || pose.distance() == 0.0
    {
      return Err(ViewportError::Rejected("degenerate camera".into()));
    }

    self.pose = classify(*pose);
    self.transitions.push(transition);
    Ok(())
  }

  fn set_view_orientation(&mut self, orientation: ViewOrientation, transition: Transition)
    -> Result<(), ViewportError>
  {
    self.ensure_available()?;

    let distance = match self.pose.distance()
    {
      d if d > 0.0 => d,
      _ => 1.0,
    };
    let pose = canonical_pose(orientation, self.pose.target, distance)
      .ok_or_else(|| ViewportError::Rejected("arbitrary is not a settable orientation".into()))?;

    self.pose = pose;
    self.transitions.push(transition);
    Ok(())
  }

  fn refresh(&mut self) -> Result<(), ViewportError>
  {
    self.ensure_available()?;
    self.refresh_count += 1;
    Ok(())
  }

  fn fit(&mut self) -> Result<(), ViewportError>
  {
    self.ensure_available()?;

    let forward = self.pose.forward();
    if forward != DVec3::ZERO
    {
      self.pose.eye = self.pose.target + forward * self.fit_distance;
    }
    self.fit_count += 1;
    Ok(())
  }

  fn go_home(&mut self, animated: bool) -> bool
  {
    if !self.available
    {
      return false;
    }

    debug!("simulated home view (animated: {animated})");
    self.pose = classify(self.home);
    self.transitions.push(if animated { Transition::Smooth } else { Transition::Instant });
    true
  }
}

/// Pose for `orientation` around `target`, `None` for `Arbitrary`.
fn canonical_pose(orientation: ViewOrientation, target: DVec3, distance: f64) -> Option<CameraPose>
{
  let direction = orientation.direction()?;
  let up = orientation.canonical_up()?;
  Some(CameraPose { eye: target + direction * distance, target, up, orientation })
}

fn classify(mut pose: CameraPose) -> CameraPose
{
  let direction = pose.forward();
  let up = pose.up.normalize_or_zero();

  pose.orientation = ViewOrientation::ALL
    .into_iter()
    .find(|o| {
      match (o.direction(), o.canonical_up())
      {
        (Some(d), Some(u)) =>
        {
          direction.abs_diff_eq(d, CLASSIFY_TOLERANCE) && up.abs_diff_eq(u, CLASSIFY_TOLERANCE)
        }
        _ => false,
      }
    })
    .unwrap_or(ViewOrientation::Arbitrary);
  pose
}

#[cfg(test)]
mod tests
{
  use super::*;

  #[test]
  fn poses_are_classified()
  {
    let front = SimulatedViewport::at_orientation(ViewOrientation::Front, 10.0);
    assert_eq!(front.pose().orientation, ViewOrientation::Front);
    assert_eq!(front.pose().eye, DVec3::new(0.0, -10.0, 0.0));

    let rolled = CameraPose::new(DVec3::new(0.0, -10.0, 0.0), DVec3::ZERO, DVec3::X);
    let viewport = SimulatedViewport::new(rolled);
    assert_eq!(viewport.pose().orientation, ViewOrientation::Arbitrary);
  }

  #[test]
  fn orientation_change_keeps_distance_and_target()
  {
    let mut viewport = SimulatedViewport::new(CameraPose::new(
      DVec3::new(1.0, -4.0, 1.0),
      DVec3::new(1.0, 0.0, 1.0),
      DVec3::Z,
    ));
    viewport.set_view_orientation(ViewOrientation::Top, Transition::Smooth).unwrap();

    let pose = viewport.pose();
    assert_eq!(pose.orientation, ViewOrientation::Top);
    assert_eq!(pose.eye, DVec3::new(1.0, 0.0, 5.0));
    assert_eq!(pose.up, DVec3::Y);
    assert!(viewport.set_view_orientation(ViewOrientation::Arbitrary, Transition::Smooth).is_err());
  }

  #[test]
  fn fit_moves_eye_along_view()
  {
    let mut viewport = SimulatedViewport::at_orientation(ViewOrientation::Right, 3.0).with_fit_distance(12.0);
    viewport.fit().unwrap();
    assert_eq!(viewport.pose().eye, DVec3::new(12.0, 0.0, 0.0));
    assert_eq!(viewport.pose().orientation, ViewOrientation::Right);
    assert_eq!(viewport.fit_count(), 1);
  }

  #[test]
  fn unavailable_viewport_fails_every_call()
  {
    let mut viewport = SimulatedViewport::at_orientation(ViewOrientation::Front, 10.0);
    viewport.set_available(false);

    assert!(matches!(viewport.camera(), Err(ViewportError::NoCamera)));
    assert!(viewport.refresh().is_err());
    assert!(!viewport.go_home(true));
  }
}
