//! `rgql config` – show where the config lives and what is in effect.

use anyhow::Result;
use rgql_core::config::{self, RgqlConfig};
use std::path::Path;

pub fn run_config(cfg: &RgqlConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());

    let mut shown = cfg.clone();
    if shown.token.is_some() {
        shown.token = Some("***".to_string());
    }
    if shown.retry.is_none() {
        shown.retry = Some(Default::default());
    }
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}
