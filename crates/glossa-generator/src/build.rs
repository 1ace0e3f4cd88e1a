//! Build orchestration.
//!
//! Coordinates the full site build process.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use glossa_core::{Config, CoreError, config::StagePhase};
use glossa_i18n::{I18nError, KeyStore};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    assets::{AssetError, AssetProcessor},
    pages::{PageCompiler, PageError},
    stages::{StageError, StageRunner},
    template::{TemplateError, TemplateRegistry},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or language error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Translation error.
    #[error(transparent)]
    I18n(#[from] I18nError),

    /// Template loading error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Page compilation error.
    #[error(transparent)]
    Page(#[from] PageError),

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// External stage error.
    #[error(transparent)]
    Stage(#[from] StageError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of pages generated, across all languages.
    pub pages: usize,

    /// Number of languages built.
    pub languages: usize,

    /// Units left untranslated, across all languages.
    pub untranslated: usize,

    /// Number of assets copied.
    pub assets: usize,

    /// Number of external stages run.
    pub stages: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates the build process.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    root: PathBuf,
    output_dir: PathBuf,
}

impl Builder {
    /// Create a builder for the site rooted at `root`, writing to the
    /// configured output directory.
    #[must_use]
    pub fn new(config: Config, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let output_dir = root.join(&config.build.output_dir);
        Self {
            config,
            root,
            output_dir,
        }
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Execute the full build process.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();
        let languages = self.config.languages()?;

        info!(
            root = %self.root.display(),
            output = %self.output_dir.display(),
            languages = languages.all().len(),
            "starting build"
        );

        // 1. Clean output directory
        self.clean()?;
        fs::create_dir_all(&self.output_dir)?;

        // 2. Stages producing inputs for the pages (stylesheets)
        let runner = StageRunner::new(&self.root, &self.output_dir);
        stats.stages += runner.run_phase(&self.config, StagePhase::Build)?;

        // 3. Compile pages, one independent pipeline per language
        let registry = TemplateRegistry::load_dir(
            &self.root.join(&self.config.build.templates_dir),
            &self.config.build.template_extension,
        )?;
        if registry.pages().next().is_none() {
            warn!("no page templates found");
        }
        let compiler = PageCompiler::new(&self.config, &registry, &self.output_dir)?;

        let per_language = languages
            .all()
            .par_iter()
            .map(|lang| self.build_language(&compiler, lang))
            .collect::<Result<Vec<_>>>()?;
        stats.languages = per_language.len();
        for (pages, untranslated) in per_language {
            stats.pages += pages;
            stats.untranslated += untranslated;
        }

        // 4. Static assets
        stats.assets = self.process_assets()?;

        // 5. Post-processing stages, then production-only ones
        stats.stages += runner.run_phase(&self.config, StagePhase::Post)?;
        if self.config.build.production {
            stats.stages += runner.run_phase(&self.config, StagePhase::Production)?;
        } else {
            debug!("skipping production stages");
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            languages = stats.languages,
            assets = stats.assets,
            stages = stats.stages,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Remove the output directory if it exists.
    pub fn clean(&self) -> Result<()> {
        if self.output_dir.exists() {
            debug!(dir = %self.output_dir.display(), "cleaning output directory");
            fs::remove_dir_all(&self.output_dir)?;
        }
        Ok(())
    }

    /// Returns (pages written, untranslated units).
    fn build_language(&self, compiler: &PageCompiler<'_>, lang: &str) -> Result<(usize, usize)> {
        let mut store = KeyStore::from_config(&self.config, &self.root)?;
        store.load(lang)?;

        let pages = compiler.compile_language(lang, &mut store)?;
        let untranslated = if compiler.languages().is_default(lang) {
            0
        } else {
            pages.iter().map(|p| p.stats.untranslated).sum()
        };
        if untranslated > 0 {
            debug!(lang, untranslated, "pages contain untranslated text");
        }
        Ok((pages.len(), untranslated))
    }

    fn process_assets(&self) -> Result<usize> {
        let processor = AssetProcessor::new();
        let public = processor.process(
            &self.root.join(&self.config.build.public_dir),
            &self.output_dir,
        )?;
        let fonts = processor.process(
            &self.root.join(&self.config.build.fonts_dir),
            &self.output_dir.join("fonts"),
        )?;
        Ok(public + fonts)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn test_config() -> Config {
        toml::from_str(
            r#"
[site]
title = "Test Site"
default_language = "en"
languages = ["en", "zh"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_empty_site() {
        let dir = TempDir::new().unwrap();
        let builder = Builder::new(test_config(), dir.path());

        let stats = builder.build().unwrap();
        assert_eq!(stats.pages, 0);
        assert_eq!(stats.languages, 2);
        assert!(dir.path().join("dist").is_dir());
    }

    #[test]
    fn test_build_cleans_stale_output() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist")).unwrap();
        fs::write(dir.path().join("dist/stale.html"), "old").unwrap();

        Builder::new(test_config(), dir.path()).build().unwrap();
        assert!(!dir.path().join("dist/stale.html").exists());
    }

    #[test]
    fn test_build_copies_public_and_fonts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        fs::write(dir.path().join("public/favicon.ico"), "ico").unwrap();
        fs::create_dir_all(dir.path().join("fonts")).unwrap();
        fs::write(dir.path().join("fonts/body.woff2"), "font").unwrap();

        let out = dir.path().join("site");
        let stats = Builder::new(test_config(), dir.path())
            .with_output_dir(&out)
            .build()
            .unwrap();

        assert_eq!(stats.assets, 2);
        assert!(out.join("favicon.ico").exists());
        assert!(out.join("fonts/body.woff2").exists());
    }

    #[test]
    fn test_clean_missing_output_is_ok() {
        let dir = TempDir::new().unwrap();
        let builder = Builder::new(test_config(), dir.path());
        builder.clean().unwrap();
        assert!(!builder.output_dir().exists());
    }

    #[test]
    fn test_unknown_default_language_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.site.default_language = "fr".to_string();
        assert!(matches!(
            Builder::new(config, dir.path()).build(),
            Err(BuildError::Core(_))
        ));
    }
}
