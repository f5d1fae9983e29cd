use crate::camera::pose::{CameraPose, Transition, ViewOrientation};
use crate::error::ViewportError;

/// The host's active viewport. Every call happens on the thread that
/// owns the host UI.
pub trait Viewport
{
  /// Current camera, with the host's classification in `orientation`.
  fn camera(&self) -> Result<CameraPose, ViewportError>;

  /// Write eye, target and up in one assignment. `pose.orientation` is
  /// ignored; the host reclassifies.
  fn apply_camera(&mut self, pose: &CameraPose, transition: Transition)
    -> Result<(), ViewportError>;

  fn set_view_orientation(
    &mut self,
    orientation: ViewOrientation,
    transition: Transition,
  ) -> Result<(), ViewportError>;

  fn refresh(&mut self) -> Result<(), ViewportError>;

  fn fit(&mut self) -> Result<(), ViewportError>;

  /// `false` when the host could not move to its home view.
  fn go_home(&mut self, animated: bool) -> bool;
}
