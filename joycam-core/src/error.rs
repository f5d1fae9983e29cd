use thiserror::Error;

/// Failures reported by the controller back-end.
#[derive(Debug, Error)]
pub enum DeviceError
{
  /// The device subsystem was never initialised or has been torn down.
  #[error("input subsystem is not initialized")]
  NotInitialized,

  /// The device handle disappeared (unplugged, OS revoked the handle).
  #[error("input device {0} is no longer available")]
  Lost(usize),

  #[error("input backend error: {0}")]
  Backend(String),
}

impl DeviceError
{
  /// Whether recovery means tearing down and re-initialising the subsystem.
  pub fn needs_reinit(&self) -> bool
  {
    matches!(self, DeviceError::NotInitialized | DeviceError::Lost(_))
  }
}

/// Failures reported by the host viewport.
#[derive(Debug, Error)]
pub enum ViewportError
{
  #[error("no active viewport")]
  NoViewport,

  #[error("no active camera")]
  NoCamera,

  #[error("host rejected camera update: {0}")]
  Rejected(String),
}

/// Settings persistence failures.
#[derive(Debug, Error)]
pub enum ConfigError
{
  #[error("settings io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("settings json error: {0}")]
  Json(#[from] serde_json::Error),
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String
{
  if let Some(s) = payload.downcast_ref::<&str>()
  {
    (*s).to_string()
  }
  else if let Some(s) = payload.downcast_ref::<String>()
  {
    s.clone()
  }
  else
  {
    "non-string panic payload".to_string()
  }
}
