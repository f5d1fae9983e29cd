use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use joycam_core::camera::{SimulatedViewport, ViewOrientation, Viewport};
use joycam_core::config::{RuntimeConfig, SettingsFile};
use joycam_core::JoystickAddIn;

use crate::device::SyntheticBackend;

const DEFAULT_SETTINGS: &str = "joycam_settings.json";
const DEFAULT_RUN_SECS: u64 = 20;
const STATUS_EVERY: Duration = Duration::from_secs(2);

//
// ──────────────────────────────────────────────────────────────
//   Command line: joycam-native [--reset-settings] [settings.json] [seconds]
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Parser)]
#[command(name = "joycam-native")]
#[command(about = "Drive a simulated viewport camera from a synthetic game controller")]
pub struct Args
{
  /// Settings file, created with defaults when missing
  #[arg(default_value = DEFAULT_SETTINGS)]
  pub settings_path: PathBuf,

  /// How long to run, in whole seconds
  pub seconds: Option<u64>,

  /// Overwrite the settings file with defaults before starting
  #[arg(long)]
  pub reset_settings: bool,
}

impl Args
{
  pub fn run_for(&self) -> Duration
  {
    Duration::from_secs(self.seconds.unwrap_or(DEFAULT_RUN_SECS))
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Host loop
// ──────────────────────────────────────────────────────────────
//

pub fn run(args: &Args, settings: &SettingsFile, config: RuntimeConfig) -> anyhow::Result<()>
{
  if !settings.exists()
  {
    settings
      .save(&config)
      .with_context(|| format!("writing default settings to {}", settings.path().display()))?;
  }

  let mut addin = JoystickAddIn::new(Box::new(SyntheticBackend::new()), config, Instant::now());
  if args.reset_settings
  {
    addin
      .reset_settings(settings)
      .with_context(|| format!("restoring defaults in {}", settings.path().display()))?;
  }
  let interval = addin.config().read(|c| c.update_interval());

  let started = addin.start();
  match &started.device
  {
    Some(device) =>
    {
      info!("controller: {} ({} axes, {} buttons)", device.name, device.axis_count, device.button_count)
    }
    None if started.show_no_device_notice =>
    {
      warn!("no controller found; use a reset once one is plugged in")
    }
    None => info!("no controller found"),
  }

  let mut viewport = SimulatedViewport::at_orientation(ViewOrientation::IsoTopRight, 20.0);
  let deadline = Instant::now() + args.run_for();
  let mut next_status = Instant::now() + STATUS_EVERY;
  let mut rotations = 0usize;

  while Instant::now() < deadline
  {
    let now = Instant::now();
    let report = addin.tick(&mut viewport, now);

    if matches!(report.camera, Some(joycam_core::camera::OrbitStep::Rotated(_)))
    {
      rotations += 1;
    }
    for function in &report.fired
    {
      info!("{} -> {:?}", function.label(), viewport.pose().orientation);
    }

    if now >= next_status
    {
      next_status = now + STATUS_EVERY;
      let pose = viewport.camera().context("simulated viewport lost its camera")?;
      info!(
        "eye {:.3} up {:.3} ({:?}), {rotations} orbit steps",
        pose.eye, pose.up, pose.orientation
      );
    }

    thread::sleep(interval);
  }

  addin.stop();

  let pose = viewport.pose();
  println!("final eye  {:.4}", pose.eye);
  println!("final up   {:.4}", pose.up);
  println!("orbit steps {rotations}, refreshes {}", viewport.refresh_count());
  Ok(())
}
