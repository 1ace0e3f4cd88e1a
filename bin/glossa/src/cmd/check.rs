//! Check command - validate configuration, templates and translations

use std::{collections::BTreeSet, path::Path};

use color_eyre::eyre::{Result, bail};
use glossa_core::Config;
use glossa_generator::{PageCompiler, TemplateRegistry};
use glossa_i18n::KeyStore;

use super::{load_config, site_root};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Compiles every page in memory and reports untranslated keys.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and translations");

    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let loaded = match load_config(config_path) {
        Ok(loaded) => {
            println!("  ✓ Configuration valid");
            Some(loaded)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e:#}"));
            println!("  ✗ Configuration invalid");
            None
        }
    };

    if let Some((config, root)) = &loaded {
        println!("\nChecking directories...");
        check_directories(config, root, &mut result);

        println!("\nChecking templates and translations...");
        check_site(config, root, &mut result);
    } else {
        tracing::debug!(root = %site_root(config_path).display(), "skipping site checks");
    }

    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn check_directories(config: &Config, root: &Path, result: &mut ValidationResult) {
    let dirs = [
        (&config.build.templates_dir, true),
        (&config.i18n.dir, false),
        (&config.build.public_dir, false),
        (&config.build.fonts_dir, false),
    ];

    for (dir, required) in dirs {
        if root.join(dir).is_dir() {
            println!("  ✓ {dir}/ exists");
        } else if required {
            result.add_error(format!("Required directory missing: {dir}/"));
            println!("  ✗ {dir}/ missing (required)");
        } else {
            println!("  ℹ {dir}/ missing (optional)");
        }
    }

    let output = root.join(&config.build.output_dir);
    if output.exists() && !output.is_dir() {
        result.add_error(format!(
            "Output path exists but is not a directory: {}",
            config.build.output_dir
        ));
    }
}

fn check_site(config: &Config, root: &Path, result: &mut ValidationResult) {
    let registry = match TemplateRegistry::load_dir(
        &root.join(&config.build.templates_dir),
        &config.build.template_extension,
    ) {
        Ok(registry) => registry,
        Err(e) => {
            result.add_error(format!("Failed to load templates: {e}"));
            return;
        }
    };

    let pages = registry.pages().count();
    if pages == 0 {
        result.add_warning("No page templates found");
    }
    println!("  ℹ {pages} page(s), {} partial(s)", registry.len() - pages);

    let compiler = match PageCompiler::new(config, &registry, root.join(&config.build.output_dir)) {
        Ok(compiler) => compiler,
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    };

    for lang in compiler.languages().all() {
        check_language(config, root, &registry, &compiler, lang, result);
    }
}

fn check_language(
    config: &Config,
    root: &Path,
    registry: &TemplateRegistry,
    compiler: &PageCompiler<'_>,
    lang: &str,
    result: &mut ValidationResult,
) {
    let mut store = match KeyStore::from_config(config, root) {
        Ok(store) => store,
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    };
    if let Err(e) = store.load(lang) {
        result.add_error(format!("[{lang}] {e}"));
        return;
    }

    let mut failed = 0;
    for template in registry.pages() {
        if let Err(e) = compiler.compile(template, lang, &mut store) {
            result.add_error(format!("[{lang}] {e}"));
            failed += 1;
        }
    }

    if compiler.languages().is_default(lang) {
        if failed == 0 {
            println!("  ✓ [{lang}] default language compiles");
        }
        return;
    }

    // Translation files whose template no longer exists
    let mut expected = BTreeSet::new();
    for template in registry.iter() {
        match store.domain(template.name(), lang) {
            Ok(domain) => {
                expected.insert(domain.file().to_string());
            }
            Err(e) => result.add_error(format!("[{lang}] {e}")),
        }
    }
    for (domain, _) in store.domains(lang) {
        if !expected.contains(domain.file()) {
            result.add_warning(format!("[{lang}] {domain} has no matching template"));
        }
    }

    let untranslated = store.untranslated(lang);
    let missing: usize = untranslated.iter().map(|(_, count)| count).sum();
    for (domain, count) in &untranslated {
        result.add_warning(format!("[{lang}] {domain}: {count} untranslated key(s)"));
    }

    if failed == 0 && missing == 0 {
        println!("  ✓ [{lang}] fully translated");
    } else if failed == 0 {
        println!("  ⚠ [{lang}] {missing} untranslated key(s)");
    } else {
        println!("  ✗ [{lang}] {failed} page(s) failed to compile");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn site(translations: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("glossa.toml"),
            "[site]\ntitle = \"Demo\"\nlanguages = [\"en\", \"zh\"]\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates/index.html"), "<p i18n>Hello</p>").unwrap();
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::write(dir.path().join("i18n/index.zh.yaml"), translations).unwrap();
        dir
    }

    #[test]
    fn test_check_translated_site_passes_strict() {
        let dir = site("Hello: 你好\n");
        run(&dir.path().join("glossa.toml"), true).unwrap();
    }

    #[test]
    fn test_check_untranslated_is_warning() {
        let dir = site("Hello: ''\n");
        let config = dir.path().join("glossa.toml");
        assert!(run(&config, false).is_ok());
        assert!(run(&config, true).is_err());
    }

    #[test]
    fn test_check_malformed_translation_is_error() {
        let dir = site("[1, 2]\n");
        assert!(run(&dir.path().join("glossa.toml"), false).is_err());
    }

    #[test]
    fn test_check_orphan_translation_file() {
        let dir = site("Hello: 你好\n");
        fs::write(dir.path().join("i18n/removed.zh.yaml"), "Bye: 再见\n").unwrap();
        let config = dir.path().join("glossa.toml");
        assert!(run(&config, false).is_ok());
        assert!(run(&config, true).is_err());
    }
}
