//! Extracting translation keys from templates into translation files.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use glossa_core::Config;
use glossa_i18n::{Document, KeyStore};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    pages::{PageCompiler, PageError, Result},
    template::TemplateRegistry,
};

/// Extraction statistics.
#[derive(Debug, Clone, Default)]
pub struct ExtractStats {
    /// Languages processed (the default language is never extracted).
    pub languages: usize,
    /// Page templates scanned per language.
    pub templates: usize,
    /// Keys added across all languages.
    pub keys_added: usize,
    /// Translation files written across all languages.
    pub files_written: usize,
    /// Extraction duration in milliseconds.
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
struct LanguageStats {
    keys_added: usize,
    files_written: usize,
}

/// Scans every page template and records its keys for each translated language.
#[derive(Debug)]
pub struct Extractor {
    config: Config,
    root: PathBuf,
}

impl Extractor {
    /// Create an extractor for the site rooted at `root`.
    pub fn new(config: Config, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    /// Site root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Update translation files for every non-default language.
    ///
    /// Existing translations are never modified. Running twice without template
    /// changes leaves the files byte-identical.
    pub fn extract(&self) -> Result<ExtractStats> {
        let start = Instant::now();
        let registry = TemplateRegistry::load_dir(
            &self.root.join(&self.config.build.templates_dir),
            &self.config.build.template_extension,
        )
        .map_err(|source| PageError::Load {
            dir: self.config.build.templates_dir.clone(),
            source,
        })?;

        // Pages are rendered but never written during extraction.
        let compiler = PageCompiler::new(&self.config, &registry, &self.root)?;
        let languages: Vec<&str> = compiler.languages().non_default().collect();

        let per_language = languages
            .par_iter()
            .map(|lang| self.extract_language(&compiler, &registry, lang))
            .collect::<Result<Vec<_>>>()?;

        let stats = ExtractStats {
            languages: languages.len(),
            templates: registry.pages().count(),
            keys_added: per_language.iter().map(|s| s.keys_added).sum(),
            files_written: per_language.iter().map(|s| s.files_written).sum(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            languages = stats.languages,
            templates = stats.templates,
            keys_added = stats.keys_added,
            duration_ms = stats.duration_ms,
            "extraction complete"
        );
        Ok(stats)
    }

    fn extract_language(
        &self,
        compiler: &PageCompiler<'_>,
        registry: &TemplateRegistry,
        lang: &str,
    ) -> Result<LanguageStats> {
        let mut store = KeyStore::from_config(&self.config, &self.root)?;
        store.load(lang)?;
        let before = key_count(&store, lang);

        for template in registry.pages() {
            // Rendering registers `trans` keys as a side effect.
            let html = compiler.render(template, lang, &mut store)?;
            let keys = compiler
                .scanner()
                .keys(&Document::parse(&html), template.name());
            let domain = store.domain(template.name(), lang)?;
            let added = store.merge_extracted(&domain, &keys);
            debug!(template = %template.name(), lang, keys = keys.len(), added, "scanned template");
        }

        let keys_added = key_count(&store, lang) - before;
        let files_written = store.persist(lang)?;
        info!(lang, keys_added, files = files_written, "keys extracted");

        Ok(LanguageStats {
            keys_added,
            files_written,
        })
    }
}

fn key_count(store: &KeyStore, lang: &str) -> usize {
    store.domains(lang).map(|(_, catalog)| catalog.len()).sum()
}
