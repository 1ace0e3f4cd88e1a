//! Clean command - removes build output

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use glossa_generator::Builder;

use super::load_config;

/// Run the clean command.
pub fn run(config_path: &Path) -> Result<()> {
    let (config, root) = load_config(config_path)?;
    let builder = Builder::new(config, &root);

    builder.clean().wrap_err("Failed to remove output directory")?;
    println!("  Removed {}", builder.output_dir().display());

    Ok(())
}
