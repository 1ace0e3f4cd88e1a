//! Command implementations.

pub mod build;
pub mod check;
pub mod clean;
pub mod extract;

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use glossa_core::Config;

/// Load and validate the configuration, honoring `GLOSSA__*` overrides.
///
/// Returns the config and the site root (the config file's directory).
pub fn load_config(config_path: &Path) -> Result<(Config, PathBuf)> {
    let config = Config::load_with_env(config_path)
        .wrap_err_with(|| format!("Failed to load configuration from {}", config_path.display()))?;
    Ok((config, site_root(config_path)))
}

/// Directory containing the config file, or the current directory.
pub fn site_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
