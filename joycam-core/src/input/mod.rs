pub mod device;
pub mod mailbox;
pub mod scripted;
pub mod shaping;
pub mod worker;

pub use device::{DeviceInfo, DeviceManager, InputBackend, RawFrame};
pub use mailbox::{ButtonSnapshot, DpadDirection, DpadState, SharedInputState};
pub use scripted::{ScriptedBackend, ScriptedFrame};
pub use worker::{Activity, PollLoop, PollingWorker, StopOutcome};
