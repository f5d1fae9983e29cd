use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use glam::DVec3;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::input::mailbox::DpadDirection;

//
// ──────────────────────────────────────────────────────────────
//   Camera functions assignable to buttons and D-pad directions
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFunction
{
  None,
  HomeView,
  FitView,
  NearestViewcube,
  ViewcubeFront,
  ViewcubeBack,
  ViewcubeLeft,
  ViewcubeRight,
  ViewcubeTop,
  ViewcubeBottom,
  IsoView,
  RotateScreenRight,
  RotateScreenLeft,
  SmartRotateRight,
  SmartRotateLeft,
  RotateScreenUp,
  RotateScreenDown,
  SmartRotateUp,
  SmartRotateDown,
  RotateScreenClockwise,
  RotateScreenCounterClockwise,
  SmartRotateClockwise,
  SmartRotateCounterClockwise,
}

impl CameraFunction
{
  /// Settings UI order.
  pub const ALL: [CameraFunction; 23] = [
    CameraFunction::None,
    CameraFunction::HomeView,
    CameraFunction::FitView,
    CameraFunction::NearestViewcube,
    CameraFunction::ViewcubeFront,
    CameraFunction::ViewcubeBack,
    CameraFunction::ViewcubeLeft,
    CameraFunction::ViewcubeRight,
    CameraFunction::ViewcubeTop,
    CameraFunction::ViewcubeBottom,
    CameraFunction::IsoView,
    CameraFunction::RotateScreenRight,
    CameraFunction::RotateScreenLeft,
    CameraFunction::SmartRotateRight,
    CameraFunction::SmartRotateLeft,
    CameraFunction::RotateScreenUp,
    CameraFunction::RotateScreenDown,
    CameraFunction::SmartRotateUp,
    CameraFunction::SmartRotateDown,
    CameraFunction::RotateScreenClockwise,
    CameraFunction::RotateScreenCounterClockwise,
    CameraFunction::SmartRotateClockwise,
    CameraFunction::SmartRotateCounterClockwise,
  ];

  /// Persisted identifier.
  pub fn name(self) -> &'static str
  {
    match self
    {
      CameraFunction::None => "none",
      CameraFunction::HomeView => "home_view",
      CameraFunction::FitView => "fit_view",
      CameraFunction::NearestViewcube => "nearest_viewcube",
      CameraFunction::ViewcubeFront => "viewcube_front",
      CameraFunction::ViewcubeBack => "viewcube_back",
      CameraFunction::ViewcubeLeft => "viewcube_left",
      CameraFunction::ViewcubeRight => "viewcube_right",
      CameraFunction::ViewcubeTop => "viewcube_top",
      CameraFunction::ViewcubeBottom => "viewcube_bottom",
      CameraFunction::IsoView => "iso_view",
      CameraFunction::RotateScreenRight => "rotate_screen_right",
      CameraFunction::RotateScreenLeft => "rotate_screen_left",
      CameraFunction::SmartRotateRight => "smart_rotate_right",
      CameraFunction::SmartRotateLeft => "smart_rotate_left",
      CameraFunction::RotateScreenUp => "rotate_screen_up",
      CameraFunction::RotateScreenDown => "rotate_screen_down",
      CameraFunction::SmartRotateUp => "smart_rotate_up",
      CameraFunction::SmartRotateDown => "smart_rotate_down",
      CameraFunction::RotateScreenClockwise => "rotate_screen_clockwise",
      CameraFunction::RotateScreenCounterClockwise => "rotate_screen_counter_clockwise",
      CameraFunction::SmartRotateClockwise => "smart_rotate_clockwise",
      CameraFunction::SmartRotateCounterClockwise => "smart_rotate_counter_clockwise",
    }
  }

  pub fn label(self) -> &'static str
  {
    match self
    {
      CameraFunction::None => "No function",
      CameraFunction::HomeView => "Home view",
      CameraFunction::FitView => "Fit view",
      CameraFunction::NearestViewcube => "Nearest ViewCube face",
      CameraFunction::ViewcubeFront => "ViewCube front",
      CameraFunction::ViewcubeBack => "ViewCube back",
      CameraFunction::ViewcubeLeft => "ViewCube left",
      CameraFunction::ViewcubeRight => "ViewCube right",
      CameraFunction::ViewcubeTop => "ViewCube top",
      CameraFunction::ViewcubeBottom => "ViewCube bottom",
      CameraFunction::IsoView => "Isometric view",
      CameraFunction::RotateScreenRight => "Rotate screen right 90°",
      CameraFunction::RotateScreenLeft => "Rotate screen left 90°",
      CameraFunction::SmartRotateRight => "Smart rotate right 90°",
      CameraFunction::SmartRotateLeft => "Smart rotate left 90°",
      CameraFunction::RotateScreenUp => "Rotate screen up 90°",
      CameraFunction::RotateScreenDown => "Rotate screen down 90°",
      CameraFunction::SmartRotateUp => "Smart rotate up 90°",
      CameraFunction::SmartRotateDown => "Smart rotate down 90°",
      CameraFunction::RotateScreenClockwise => "Rotate screen clockwise 90°",
      CameraFunction::RotateScreenCounterClockwise => "Rotate screen counter-clockwise 90°",
      CameraFunction::SmartRotateClockwise => "Smart rotate clockwise 90°",
      CameraFunction::SmartRotateCounterClockwise => "Smart rotate counter-clockwise 90°",
    }
  }

  /// Accepts either the persisted identifier or the UI label.
  pub fn from_name(name: &str) -> Option<Self>
  {
    Self::ALL.into_iter().find(|f| f.name() == name || f.label() == name)
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Button / D-pad assignment table
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonAssignmentTable
{
  pub buttons: BTreeMap<u32, CameraFunction>,
  pub dpad: BTreeMap<DpadDirection, CameraFunction>,
}

impl Default for ButtonAssignmentTable
{
  fn default() -> Self
  {
    let buttons = BTreeMap::from([
      (0, CameraFunction::ViewcubeFront),
      (1, CameraFunction::ViewcubeBack),
      (2, CameraFunction::ViewcubeLeft),
      (3, CameraFunction::ViewcubeRight),
      (4, CameraFunction::NearestViewcube),
    ]);

    Self { buttons, dpad: BTreeMap::new() }
  }
}

impl ButtonAssignmentTable
{
  pub fn empty() -> Self
  {
    Self { buttons: BTreeMap::new(), dpad: BTreeMap::new() }
  }

  /// Assigned function, or `None` when unassigned or assigned to `none`.
  pub fn button(&self, index: u32) -> Option<CameraFunction>
  {
    self.buttons.get(&index).copied().filter(|f| *f != CameraFunction::None)
  }

  pub fn dpad(&self, direction: DpadDirection) -> Option<CameraFunction>
  {
    self.dpad.get(&direction).copied().filter(|f| *f != CameraFunction::None)
  }

  /// Entry-by-entry parse: bad keys and unknown function names are skipped.
  fn parse_buttons(value: &Value) -> BTreeMap<u32, CameraFunction>
  {
    let mut out = BTreeMap::new();
    let Some(entries) = value.as_object()
    else
    {
      warn!("button assignments are not an object, ignoring");
      return out;
    };

    for (key, name) in entries
    {
      let index = match key.trim().parse::<u32>()
      {
        Ok(i) => i,
        Err(_) =>
        {
          warn!("ignoring button assignment with non-numeric key {key:?}");
          continue;
        }
      };

      match name.as_str().and_then(CameraFunction::from_name)
      {
        Some(function) =>
        {
          out.insert(index, function);
        }
        None => warn!("ignoring unknown function {name} for button {index}"),
      }
    }

    out
  }

  fn parse_dpad(value: &Value) -> BTreeMap<DpadDirection, CameraFunction>
  {
    let mut out = BTreeMap::new();
    let Some(entries) = value.as_object()
    else
    {
      warn!("d-pad assignments are not an object, ignoring");
      return out;
    };

    for (key, name) in entries
    {
      let Some(direction) = DpadDirection::from_key(key)
      else
      {
        warn!("ignoring d-pad assignment for unknown direction {key:?}");
        continue;
      };

      match name.as_str().and_then(CameraFunction::from_name)
      {
        Some(function) =>
        {
          out.insert(direction, function);
        }
        None => warn!("ignoring unknown function {name} for {key}"),
      }
    }

    out
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Tuning groups
// ──────────────────────────────────────────────────────────────
//

/// Numeric constants of the per-frame orbit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitTuning
{
  /// `|forward·axis|` or `|up·axis|` above this counts as singular.
  pub singularity_threshold: f64,
  /// `|forward × up|` below this counts as singular.
  pub min_right_length: f64,
  pub singular_input_scale: f64,
  pub singular_up_blend: f64,
  /// `|view·Z|` above this disables turntable yaw and level correction.
  pub z_singularity_threshold: f64,
  pub level_blend: f64,
  /// Level correction flips its ideal up once `view.z` drops below this.
  pub level_flip_view_z: f64,
  pub level_input_min: f64,
  pub input_epsilon: f64,
  pub max_eye_coordinate: f64,
  /// Refresh the viewport every N idle ticks.
  pub idle_refresh_every: u32,
}

impl Default for OrbitTuning
{
  fn default() -> Self
  {
    Self {
      singularity_threshold: 0.8,
      min_right_length: 0.05,
      singular_input_scale: 0.1,
      singular_up_blend: 0.05,
      z_singularity_threshold: 0.95,
      level_blend: 0.3,
      level_flip_view_z: -0.9,
      level_input_min: 0.01,
      input_epsilon: 0.001,
      max_eye_coordinate: 1000.0,
      idle_refresh_every: 10,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingTuning
{
  pub active_interval_ms: u64,
  pub held_interval_ms: u64,
  pub idle_interval_ms: u64,
  pub jump_threshold: f64,
  pub jump_blend: f64,
  pub smoothing_weight: f64,
  pub publish_epsilon: f64,
  pub error_backoff_ms: u64,
  pub reinit_delay_ms: u64,
  pub stop_timeout_ms: u64,
}

impl Default for PollingTuning
{
  fn default() -> Self
  {
    Self {
      active_interval_ms: 20,
      held_interval_ms: 50,
      idle_interval_ms: 200,
      jump_threshold: 0.5,
      jump_blend: 0.1,
      smoothing_weight: 0.3,
      publish_epsilon: 0.001,
      error_backoff_ms: 500,
      reinit_delay_ms: 500,
      stop_timeout_ms: 5000,
    }
  }
}

impl PollingTuning
{
  pub fn reinit_delay(&self) -> Duration
  {
    Duration::from_millis(self.reinit_delay_ms)
  }

  pub fn stop_timeout(&self) -> Duration
  {
    Duration::from_millis(self.stop_timeout_ms)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetTuning
{
  /// Wait after a nearest-face snap before a smart rotation.
  pub smart_settle_ms: u64,
  pub relevel_max_tilt_deg: f64,
  pub iso_eye: DVec3,
}

impl Default for PresetTuning
{
  fn default() -> Self
  {
    Self {
      smart_settle_ms: 100,
      relevel_max_tilt_deg: 45.0,
      iso_eye: DVec3::new(10.0, -10.0, 10.0),
    }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   RuntimeConfig
// ──────────────────────────────────────────────────────────────
//

pub const MIN_UPDATE_INTERVAL_SECS: f64 = 0.01;
pub const MAX_UPDATE_INTERVAL_SECS: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig
{
  pub debug: bool,
  /// Radians of rotation per tick at full stick deflection.
  pub rotation_scale: f64,
  pub dead_zone: f64,
  pub update_interval_secs: f64,
  pub selected_joystick: usize,
  pub axis_x: usize,
  pub axis_y: usize,
  pub response_curve: f64,
  pub use_z_axis_rotation: bool,
  pub show_welcome_message: bool,
  pub auto_reset_enabled: bool,
  pub auto_reset_interval_minutes: u64,
  pub button_enabled: bool,
  pub dpad_enabled: bool,
  pub assignments: ButtonAssignmentTable,
  pub orbit: OrbitTuning,
  pub polling: PollingTuning,
  pub presets: PresetTuning,
}

impl Default for RuntimeConfig
{
  fn default() -> Self
  {
    Self {
      debug: false,
      rotation_scale: 0.008,
      dead_zone: 0.15,
      update_interval_secs: 0.032,
      selected_joystick: 0,
      axis_x: 0,
      axis_y: 1,
      response_curve: 1.0,
      use_z_axis_rotation: false,
      show_welcome_message: false,
      auto_reset_enabled: false,
      auto_reset_interval_minutes: 60,
      button_enabled: true,
      dpad_enabled: true,
      assignments: ButtonAssignmentTable::default(),
      orbit: OrbitTuning::default(),
      polling: PollingTuning::default(),
      presets: PresetTuning::default(),
    }
  }
}

impl RuntimeConfig
{
  pub fn update_interval(&self) -> Duration
  {
    Duration::from_secs_f64(self.update_interval_secs)
  }

  pub fn auto_reset_interval(&self) -> Duration
  {
    Duration::from_secs(self.auto_reset_interval_minutes.saturating_mul(60))
  }

  pub fn log_level(&self) -> log::LevelFilter
  {
    if self.debug
    {
      log::LevelFilter::Info
    }
    else
    {
      log::LevelFilter::Warn
    }
  }

  /// Pull every field back into its usable range. Non-finite values
  /// revert to the default.
  pub fn sanitize(&mut self)
  {
    let d = RuntimeConfig::default();

    self.rotation_scale = clamp_or(self.rotation_scale, 0.001, 0.5, d.rotation_scale);
    self.dead_zone = clamp_or(self.dead_zone, 0.0, 0.5, d.dead_zone);
    self.update_interval_secs = clamp_or(
      self.update_interval_secs,
      MIN_UPDATE_INTERVAL_SECS,
      MAX_UPDATE_INTERVAL_SECS,
      d.update_interval_secs,
    );
    self.response_curve = clamp_or(self.response_curve, 0.1, 3.0, d.response_curve);
    self.auto_reset_interval_minutes = self.auto_reset_interval_minutes.max(1);

    let o = &mut self.orbit;
    let od = OrbitTuning::default();
    o.singularity_threshold = clamp_or(o.singularity_threshold, 0.0, 1.0, od.singularity_threshold);
    o.min_right_length = clamp_or(o.min_right_length, 0.0, 1.0, od.min_right_length);
    o.singular_input_scale = clamp_or(o.singular_input_scale, 0.0, 1.0, od.singular_input_scale);
    o.singular_up_blend = clamp_or(o.singular_up_blend, 0.0, 1.0, od.singular_up_blend);
    o.z_singularity_threshold =
      clamp_or(o.z_singularity_threshold, 0.0, 1.0, od.z_singularity_threshold);
    o.level_blend = clamp_or(o.level_blend, 0.0, 1.0, od.level_blend);
    o.level_flip_view_z = clamp_or(o.level_flip_view_z, -1.0, 0.0, od.level_flip_view_z);
    o.level_input_min = clamp_or(o.level_input_min, 0.0, 1.0, od.level_input_min);
    o.input_epsilon = clamp_or(o.input_epsilon, 0.0, 1.0, od.input_epsilon);
    o.max_eye_coordinate = clamp_or(o.max_eye_coordinate, 1.0, f64::MAX, od.max_eye_coordinate);
    o.idle_refresh_every = o.idle_refresh_every.max(1);

    let p = &mut self.polling;
    let pd = PollingTuning::default();
    p.active_interval_ms = p.active_interval_ms.max(1);
    p.held_interval_ms = p.held_interval_ms.max(p.active_interval_ms);
    p.idle_interval_ms = p.idle_interval_ms.max(p.held_interval_ms);
    p.jump_threshold = clamp_or(p.jump_threshold, 0.0, 2.0, pd.jump_threshold);
    p.jump_blend = clamp_or(p.jump_blend, 0.0, 1.0, pd.jump_blend);
    p.smoothing_weight = clamp_or(p.smoothing_weight, 0.0, 1.0, pd.smoothing_weight);
    p.publish_epsilon = clamp_or(p.publish_epsilon, 0.0, 1.0, pd.publish_epsilon);

    let pr = &mut self.presets;
    let prd = PresetTuning::default();
    pr.relevel_max_tilt_deg =
      clamp_or(pr.relevel_max_tilt_deg, 0.0, 90.0, prd.relevel_max_tilt_deg);
    if !pr.iso_eye.is_finite() || pr.iso_eye.length_squared() == 0.0
    {
      pr.iso_eye = prd.iso_eye;
    }
  }

  /// Tolerant parse of a settings document. Never fails: anything that
  /// cannot be used keeps its default.
  pub fn from_json_str(text: &str) -> RuntimeConfig
  {
    match serde_json::from_str::<Value>(text)
    {
      Ok(doc) => Self::from_document(&doc),
      Err(e) =>
      {
        warn!("settings are not valid JSON ({e}), using defaults");
        RuntimeConfig::default()
      }
    }
  }

  pub fn from_document(doc: &Value) -> RuntimeConfig
  {
    let Some(doc) = doc.as_object()
    else
    {
      warn!("settings document is not an object, using defaults");
      return RuntimeConfig::default();
    };

    let defaults = RuntimeConfig::default();
    let mut top = Map::new();
    let mut buttons = None;
    let mut dpad = None;
    let mut legacy_home = None;

    for (key, value) in doc
    {
      match canonical_key(key).as_str()
      {
        "assignments" =>
        {
          if let Some(b) = value.get("buttons")
          {
            buttons = Some(b);
          }
          if let Some(d) = value.get("dpad")
          {
            dpad = Some(d);
          }
        }
        "button_assignments" => buttons = Some(value),
        "dpad_assignments" => dpad = Some(value),
        "home_view_button" => legacy_home = Some(value),
        "orbit" | "polling" | "presets" => {}
        other =>
        {
          top.insert(other.to_string(), value.clone());
        }
      }
    }

    let mut config = merge_tolerant(&defaults, &top, "");

    if let Some(section) = tuning_section(doc, "orbit")
    {
      config.orbit = merge_tolerant(&defaults.orbit, section, "orbit.");
    }
    if let Some(section) = tuning_section(doc, "polling")
    {
      config.polling = merge_tolerant(&defaults.polling, section, "polling.");
    }
    if let Some(section) = tuning_section(doc, "presets")
    {
      config.presets = merge_tolerant(&defaults.presets, section, "presets.");
    }

    match (buttons, legacy_home)
    {
      (Some(b), _) => config.assignments.buttons = ButtonAssignmentTable::parse_buttons(b),
      (None, Some(home)) =>
      {
        if let Some(index) = as_index(home)
        {
          info!("migrating legacy home_view_button {index}");
          config.assignments.buttons = BTreeMap::from([(index, CameraFunction::HomeView)]);
        }
      }
      (None, None) =>
      {}
    }
    if let Some(d) = dpad
    {
      config.assignments.dpad = ButtonAssignmentTable::parse_dpad(d);
    }

    config.sanitize();
    config
  }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64
{
  if value.is_finite()
  {
    value.clamp(min, max)
  }
  else
  {
    fallback
  }
}

/// Lower-case key with the older flat names mapped onto current fields.
fn canonical_key(key: &str) -> String
{
  let key = key.to_ascii_lowercase();
  match key.as_str()
  {
    "update_rate" => "update_interval_secs".to_string(),
    "auto_reset_interval" => "auto_reset_interval_minutes".to_string(),
    _ => key,
  }
}

fn tuning_section<'a>(doc: &'a Map<String, Value>, name: &str) -> Option<&'a Map<String, Value>>
{
  doc.iter().find(|(k, _)| canonical_key(k) == name).and_then(|(_, v)| v.as_object())
}

fn as_index(value: &Value) -> Option<u32>
{
  match value
  {
    Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// Numbers stored as strings are accepted, as the older settings files did.
fn coerce_numeric_string(value: &Value) -> Option<Value>
{
  let text = value.as_str()?.trim();
  if let Ok(i) = text.parse::<u64>()
  {
    return Some(Value::from(i));
  }
  text.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::from)
}

/// Overlay `doc` onto `defaults` one key at a time, keeping a
/// replacement only if the whole struct still deserializes.
fn merge_tolerant<T>(defaults: &T, doc: &Map<String, Value>, prefix: &str) -> T
where
  T: Serialize + DeserializeOwned + Clone,
{
  let mut merged = match serde_json::to_value(defaults)
  {
    Ok(Value::Object(map)) => map,
    _ => return defaults.clone(),
  };

  for (key, value) in doc
  {
    let key = canonical_key(key);
    if !merged.contains_key(&key)
    {
      debug!("ignoring unknown setting {prefix}{key}");
      continue;
    }

    let mut candidates = vec![value.clone()];
    candidates.extend(coerce_numeric_string(value));

    let previous = merged.get(&key).cloned();
    let accepted = candidates.into_iter().any(|candidate| {
      merged.insert(key.clone(), candidate);
      serde_json::from_value::<T>(Value::Object(merged.clone())).is_ok()
    });

    if !accepted
    {
      warn!("setting {prefix}{key} has invalid value {value}, keeping default");
      if let Some(previous) = previous
      {
        merged.insert(key, previous);
      }
    }
  }

  serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| defaults.clone())
}

//
// ──────────────────────────────────────────────────────────────
//   Settings file
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct SettingsFile
{
  path: PathBuf,
}

impl SettingsFile
{
  pub fn new(path: impl Into<PathBuf>) -> Self
  {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path
  {
    &self.path
  }

  pub fn exists(&self) -> bool
  {
    self.path.is_file()
  }

  /// Missing or unreadable files fall back to defaults; never fails.
  pub fn load(&self) -> RuntimeConfig
  {
    match fs::read_to_string(&self.path)
    {
      Ok(text) =>
      {
        info!("loading settings from {}", self.path.display());
        RuntimeConfig::from_json_str(&text)
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound =>
      {
        info!("no settings at {}, using defaults", self.path.display());
        RuntimeConfig::default()
      }
      Err(e) =>
      {
        warn!("cannot read settings {}: {e}, using defaults", self.path.display());
        RuntimeConfig::default()
      }
    }
  }

  pub fn save(&self, config: &RuntimeConfig) -> Result<(), ConfigError>
  {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty())
    {
      fs::create_dir_all(dir)?;
    }

    let text = serde_json::to_string_pretty(config)?;
    fs::write(&self.path, text)?;
    info!("settings saved to {}", self.path.display());
    Ok(())
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Shared handle
// ──────────────────────────────────────────────────────────────
//

/// Read capability shared by the polling thread and the UI loop.
/// `commit` is the only way to change the configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle
{
  inner: Arc<RwLock<RuntimeConfig>>,
}

impl ConfigHandle
{
  pub fn new(mut config: RuntimeConfig) -> Self
  {
    config.sanitize();
    Self { inner: Arc::new(RwLock::new(config)) }
  }

  pub fn snapshot(&self) -> RuntimeConfig
  {
    self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn read<R>(&self, f: impl FnOnce(&RuntimeConfig) -> R) -> R
  {
    let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
    f(&guard)
  }

  /// Sanitize, swap in memory, then persist. The in-memory value is
  /// replaced even if saving fails; the error is returned for the UI.
  pub fn commit(&self, mut config: RuntimeConfig, file: &SettingsFile) -> Result<(), ConfigError>
  {
    config.sanitize();
    {
      let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
      *guard = config.clone();
    }
    file.save(&config)
  }
}
