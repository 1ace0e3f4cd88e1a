//! Compiling page templates into localized HTML files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use glossa_core::{Config, CoreError, Languages};
use glossa_i18n::{ApplyStats, Applier, I18nError, KeyStore, ScanConfig, Scanner};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    i18n::I18nExtension,
    template::{Template, TemplateContext, TemplateError, TemplateRegistry},
};

/// Page compilation errors.
#[derive(Debug, Error)]
pub enum PageError {
    /// Templates could not be loaded.
    #[error("failed to load templates from {dir}: {source}")]
    Load {
        dir: String,
        #[source]
        source: TemplateError,
    },

    /// Template rendering failed.
    #[error("failed to render {template}: {source}")]
    Template {
        template: String,
        #[source]
        source: TemplateError,
    },

    /// Translation error.
    #[error(transparent)]
    I18n(#[from] I18nError),

    /// Language error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for page compilation.
pub type Result<T> = std::result::Result<T, PageError>;

/// A page written to the output directory.
#[derive(Debug, Clone)]
pub struct CompiledPage {
    /// Source template name.
    pub template: String,
    /// Language the page was compiled for.
    pub lang: String,
    /// Written file.
    pub output: PathBuf,
    /// Translation counters.
    pub stats: ApplyStats,
}

/// Renders and localizes page templates for one site.
#[derive(Debug)]
pub struct PageCompiler<'a> {
    config: &'a Config,
    registry: &'a TemplateRegistry,
    languages: Languages,
    applier: Applier,
    output_dir: PathBuf,
}

impl<'a> PageCompiler<'a> {
    /// Create a compiler writing into `output_dir`.
    pub fn new(
        config: &'a Config,
        registry: &'a TemplateRegistry,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let languages = config.languages()?;
        let scanner = Scanner::new(ScanConfig::from_config(&config.i18n));
        Ok(Self {
            config,
            registry,
            applier: Applier::new(scanner, languages.clone()),
            languages,
            output_dir: output_dir.into(),
        })
    }

    /// The configured languages.
    #[must_use]
    pub fn languages(&self) -> &Languages {
        &self.languages
    }

    /// The scanner shared by compilation and extraction.
    #[must_use]
    pub fn scanner(&self) -> &Scanner {
        self.applier.scanner()
    }

    /// Output file name of `template` in `lang`, relative to the output directory.
    pub fn output_name(&self, template: &Template, lang: &str) -> Result<String> {
        Ok(self.languages.localize(
            template.name(),
            lang,
            Some(&self.config.build.output_extension),
        )?)
    }

    /// Render `template` for `lang`, resolving translation primitives against `store`.
    ///
    /// The result still carries `i18n` directives.
    pub fn render(&self, template: &Template, lang: &str, store: &mut KeyStore) -> Result<String> {
        let page = self.output_name(template, self.languages.default_language())?;
        let context = TemplateContext::new()
            .with_var("lang", lang)
            .with_var("default_lang", self.languages.default_language())
            .with_var("page", page.as_str())
            .with_var("site_title", self.config.site.title.as_str())
            .with_var("langs", self.languages.all().join(","));

        // Language variants sit side by side, so switch links use the bare file name.
        let file_name = page.rsplit('/').next().unwrap_or(&page);
        let mut extension = I18nExtension::new(&self.languages, lang, file_name, store);
        self.registry
            .render_with(template.name(), &context, &mut extension)
            .map_err(|source| PageError::Template {
                template: template.name().to_string(),
                source,
            })
    }

    /// Render and localize `template` for `lang` without writing it.
    pub fn compile(
        &self,
        template: &Template,
        lang: &str,
        store: &mut KeyStore,
    ) -> Result<(String, ApplyStats)> {
        let html = self.render(template, lang, store)?;
        Ok(self
            .applier
            .localize_document(&html, template.name(), lang, store)?)
    }

    /// Compile every page for `lang` into the output directory.
    pub fn compile_language(&self, lang: &str, store: &mut KeyStore) -> Result<Vec<CompiledPage>> {
        self.languages.ensure(lang)?;

        let mut pages = Vec::new();
        for template in self.registry.pages() {
            let (html, stats) = self.compile(template, lang, store)?;
            let output = self.output_dir.join(self.output_name(template, lang)?);
            write_page(&output, &html)?;

            debug!(
                template = %template.name(),
                lang,
                translated = stats.translated,
                untranslated = stats.untranslated,
                "compiled page"
            );
            pages.push(CompiledPage {
                template: template.name().to_string(),
                lang: lang.to_string(),
                output,
                stats,
            });
        }

        info!(lang, pages = pages.len(), "pages compiled");
        Ok(pages)
    }
}

fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn config() -> Config {
        toml::from_str(
            r#"
[site]
title = "Demo"
languages = ["en", "zh"]

[build]
output_extension = "htm"
"#,
        )
        .unwrap()
    }

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new("_head.html", "<title>{{ site_title }}</title>"));
        registry.register(Template::new(
            "blog/post.html",
            r#"<html lang="{{ lang }}">{% include "_head.html" %}<a href="{{ i18n_switch("zh") }}" i18n>Read</a></html>"#,
        ));
        registry
    }

    #[test]
    fn test_output_name_uses_output_extension() {
        let config = config();
        let registry = registry();
        let compiler = PageCompiler::new(&config, &registry, "dist").unwrap();
        let template = registry.get("blog/post.html").unwrap();

        assert_eq!(compiler.output_name(template, "en").unwrap(), "blog/post.htm");
        assert_eq!(compiler.output_name(template, "zh").unwrap(), "blog/post.zh.htm");
    }

    #[test]
    fn test_compile_language_writes_pages() {
        let dir = TempDir::new().unwrap();
        let i18n = dir.path().join("i18n/blog");
        fs::create_dir_all(&i18n).unwrap();
        fs::write(i18n.join("post.zh.yaml"), "Read: 阅读\n").unwrap();

        let config = config();
        let registry = registry();
        let compiler = PageCompiler::new(&config, &registry, dir.path().join("dist")).unwrap();

        let mut store = KeyStore::from_config(&config, dir.path()).unwrap();
        store.load("zh").unwrap();
        let pages = compiler.compile_language("zh", &mut store).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].stats.translated, 1);
        let html = fs::read_to_string(dir.path().join("dist/blog/post.zh.htm")).unwrap();
        assert_eq!(
            html,
            r#"<html lang="zh"><title>Demo</title><a href="post.zh.htm">阅读</a></html>"#
        );
    }

    #[test]
    fn test_render_error_names_template() {
        let config = config();
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new("index.html", "{{ missing }}"));
        let compiler = PageCompiler::new(&config, &registry, "dist").unwrap();

        let dir = TempDir::new().unwrap();
        let mut store = KeyStore::from_config(&config, dir.path()).unwrap();
        let template = registry.get("index.html").unwrap();
        let err = compiler.render(template, "en", &mut store).unwrap_err();
        assert!(err.to_string().contains("index.html"));
    }
}
