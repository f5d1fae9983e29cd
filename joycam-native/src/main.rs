mod app;
mod device;

use clap::Parser;
use env_logger::Env;
use joycam_core::config::{RuntimeConfig, SettingsFile};
use log::LevelFilter;

fn main() -> anyhow::Result<()>
{
  let args = app::Args::parse();

  // Logger first so settings load can report a corrupt file
  let rust_log_set = std::env::var_os("RUST_LOG").is_some();
  env_logger::Builder::from_env(Env::default().default_filter_or("debug")).init();

  let settings = SettingsFile::new(&args.settings_path);
  let config = settings.load();
  if let Some(level) = settings_level(&config, rust_log_set)
  {
    log::set_max_level(level);
  }

  app::run(&args, &settings, config)
}

/// RUST_LOG wins; otherwise the settings' debug flag picks the level.
fn settings_level(config: &RuntimeConfig, rust_log_set: bool) -> Option<LevelFilter>
{
  (!rust_log_set).then(|| config.log_level())
}

#[cfg(test)]
mod tests
{
  use super::*;

  #[test]
  fn rust_log_overrides_settings()
  {
    let config = RuntimeConfig::default();
    assert_eq!(settings_level(&config, true), None);
    assert_eq!(settings_level(&config, false), Some(config.log_level()));
  }
}
