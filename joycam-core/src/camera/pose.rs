use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::math::normalize_or;

//
// ──────────────────────────────────────────────────────────────
//   Camera pose (Z-up world)
//
//     eye    → camera position
//     target → orbit centre
//     up     → screen-up direction, not necessarily unit length
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose
{
  pub eye: DVec3,
  pub target: DVec3,
  pub up: DVec3,
  pub orientation: ViewOrientation,
}

impl CameraPose
{
  /// A pose the host has not classified yet.
  pub fn new(eye: DVec3, target: DVec3, up: DVec3) -> Self
  {
    Self { eye, target, up, orientation: ViewOrientation::Arbitrary }
  }

  pub fn distance(&self) -> f64
  {
    (self.eye - self.target).length()
  }

  /// Unit vector target → eye.
  pub fn forward(&self) -> DVec3
  {
    normalize_or(self.eye - self.target, DVec3::ZERO)
  }

  /// Unit vector eye → target.
  pub fn view_direction(&self) -> DVec3
  {
    -self.forward()
  }

  pub fn is_finite(&self) -> bool
  {
    self.eye.is_finite() && self.target.is_finite() && self.up.is_finite()
  }
}

/// Whether a camera write should animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition
{
  Instant,
  Smooth,
}

impl Transition
{
  pub fn is_smooth(self) -> bool
  {
    self == Transition::Smooth
  }
}

//
// ──────────────────────────────────────────────────────────────
//   ViewCube faces
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewFace
{
  Front,
  Back,
  Left,
  Right,
  Top,
  Bottom,
}

impl ViewFace
{
  /// Enumeration order doubles as the nearest-face tie-break.
  pub const ALL: [ViewFace; 6] =
    [ViewFace::Front, ViewFace::Back, ViewFace::Left, ViewFace::Right, ViewFace::Top, ViewFace::Bottom];

  /// Unit vector target → eye when looking at this face.
  pub fn direction(self) -> DVec3
  {
    match self
    {
      ViewFace::Front => DVec3::NEG_Y,
      ViewFace::Back => DVec3::Y,
      ViewFace::Left => DVec3::NEG_X,
      ViewFace::Right => DVec3::X,
      ViewFace::Top => DVec3::Z,
      ViewFace::Bottom => DVec3::NEG_Z,
    }
  }

  pub fn canonical_up(self) -> DVec3
  {
    match self
    {
      ViewFace::Top => DVec3::Y,
      ViewFace::Bottom => DVec3::NEG_Y,
      _ => DVec3::Z,
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Host view orientation
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewOrientation
{
  #[default]
  Arbitrary,
  Front,
  Back,
  Left,
  Right,
  Top,
  Bottom,
  IsoTopLeft,
  IsoTopRight,
  IsoBottomLeft,
  IsoBottomRight,
}

impl ViewOrientation
{
  pub const ALL: [ViewOrientation; 11] = [
    ViewOrientation::Arbitrary,
    ViewOrientation::Front,
    ViewOrientation::Back,
    ViewOrientation::Left,
    ViewOrientation::Right,
    ViewOrientation::Top,
    ViewOrientation::Bottom,
    ViewOrientation::IsoTopLeft,
    ViewOrientation::IsoTopRight,
    ViewOrientation::IsoBottomLeft,
    ViewOrientation::IsoBottomRight,
  ];

  pub fn is_arbitrary(self) -> bool
  {
    self == ViewOrientation::Arbitrary
  }

  pub fn face(self) -> Option<ViewFace>
  {
    match self
    {
      ViewOrientation::Front => Some(ViewFace::Front),
      ViewOrientation::Back => Some(ViewFace::Back),
      ViewOrientation::Left => Some(ViewFace::Left),
      ViewOrientation::Right => Some(ViewFace::Right),
      ViewOrientation::Top => Some(ViewFace::Top),
      ViewOrientation::Bottom => Some(ViewFace::Bottom),
      _ => None,
    }
  }

  /// Unit vector target → eye, `None` for `Arbitrary`.
  pub fn direction(self) -> Option<DVec3>
  {
    if let Some(face) = self.face()
    {
      return Some(face.direction());
    }

    let corner = match self
    {
      ViewOrientation::IsoTopRight => DVec3::new(1.0, -1.0, 1.0),
      ViewOrientation::IsoTopLeft => DVec3::new(-1.0, -1.0, 1.0),
      ViewOrientation::IsoBottomRight => DVec3::new(1.0, -1.0, -1.0),
      ViewOrientation::IsoBottomLeft => DVec3::new(-1.0, -1.0, -1.0),
      _ => return None,
    };
    Some(corner.normalize())
  }

  /// Faces use their ViewCube up; iso corners use world Z made
  /// perpendicular to the view.
  pub fn canonical_up(self) -> Option<DVec3>
  {
    if let Some(face) = self.face()
    {
      return Some(face.canonical_up());
    }

    let dir = self.direction()?;
    Some((DVec3::Z - dir * dir.dot(DVec3::Z)).normalize())
  }
}

impl From<ViewFace> for ViewOrientation
{
  fn from(face: ViewFace) -> Self
  {
    match face
    {
      ViewFace::Front => ViewOrientation::Front,
      ViewFace::Back => ViewOrientation::Back,
      ViewFace::Left => ViewOrientation::Left,
      ViewFace::Right => ViewOrientation::Right,
      ViewFace::Top => ViewOrientation::Top,
      ViewFace::Bottom => ViewOrientation::Bottom,
    }
  }
}

#[cfg(test)]
mod tests
{
  use super::*;

  #[test]
  fn canonical_frames_are_orthonormal()
  {
    for o in ViewOrientation::ALL.into_iter().filter(|o| !o.is_arbitrary())
    {
      let dir = o.direction().unwrap();
      let up = o.canonical_up().unwrap();
      assert!((dir.length() - 1.0).abs() < 1e-12, "{o:?}");
      assert!((up.length() - 1.0).abs() < 1e-12, "{o:?}");
      assert!(dir.dot(up).abs() < 1e-12, "{o:?}");
    }
  }

  #[test]
  fn iso_top_right_looks_down_from_above()
  {
    let up = ViewOrientation::IsoTopRight.canonical_up().unwrap();
    assert!(up.z > 0.0);
    assert_eq!(ViewOrientation::Arbitrary.direction(), None);
  }

  #[test]
  fn pose_directions()
  {
    let pose = CameraPose::new(DVec3::new(0.0, -5.0, 0.0), DVec3::ZERO, DVec3::Z);
    assert_eq!(pose.forward(), DVec3::NEG_Y);
    assert_eq!(pose.view_direction(), DVec3::Y);
    assert_eq!(pose.distance(), 5.0);
    assert!(pose.orientation.is_arbitrary());
  }
}
