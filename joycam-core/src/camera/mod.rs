pub mod orbit;
pub mod pose;
pub mod presets;
pub mod sim;
pub mod update_loop;
pub mod viewport;

pub use orbit::{orbit_camera, OrbitSettings, OrbitStep, RejectReason};
pub use pose::{CameraPose, Transition, ViewFace, ViewOrientation};
pub use presets::{nearest_view_face, PresetCameraOps, ScreenAxis};
pub use sim::SimulatedViewport;
pub use update_loop::{CameraUpdateLoop, TickReport};
pub use viewport::Viewport;
