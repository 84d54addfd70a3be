//! `ytdm config` shows the effective configuration.

use anyhow::Result;
use ytdm_core::config::{self, YtdmConfig};

pub fn run_config(cfg: &YtdmConfig) -> Result<()> {
    let path = config::config_path()?;
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
