//! Configuration display command

use anyhow::Result;
use moon_core::MonitorConfig;
use std::path::Path;

pub fn config_command(config: &MonitorConfig, explicit: Option<&Path>) -> Result<()> {
    match explicit {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => match MonitorConfig::default_path() {
            Ok(path) if path.exists() => println!("# Loaded from {}", path.display()),
            Ok(path) => println!("# Defaults ({} not found)", path.display()),
            Err(_) => println!("# Defaults"),
        },
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
