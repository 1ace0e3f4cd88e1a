//! Extract command - updates translation files from templates

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use glossa_generator::Extractor;

use super::load_config;

/// Run the extract command.
pub fn run(config_path: &Path) -> Result<()> {
    tracing::info!(?config_path, "Extracting translation keys");

    let (config, root) = load_config(config_path)?;
    let i18n_dir = root.join(&config.i18n.dir);

    if config.languages()?.non_default().next().is_none() {
        println!("  Only the default language is configured, nothing to extract");
        return Ok(());
    }

    let stats = Extractor::new(config, &root)
        .extract()
        .wrap_err("Extraction failed")?;

    println!();
    println!("  Languages:  {}", stats.languages);
    println!("  Templates:  {}", stats.templates);
    println!("  New keys:   {}", stats.keys_added);
    println!("  Files:      {}", stats.files_written);
    println!("  Directory:  {}", i18n_dir.display());
    println!();

    Ok(())
}
