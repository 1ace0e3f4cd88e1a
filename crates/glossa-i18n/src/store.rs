//! Translation key storage.
//!
//! Keys are grouped by domain: one translation file per template and language,
//! named with the language-qualified rule (`index.html` + `zh` → `index.zh.yaml`).
//! Merging newly found keys never touches existing entries, so translations
//! survive any number of extraction passes.

use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use glossa_core::{Config, Languages};
use serde_yaml::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{I18nError, Result};

/// Key → translated string (`""` when not translated yet).
pub type Catalog = BTreeMap<String, String>;

/// One translation file: a template in a language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId {
    lang: String,
    file: String,
}

impl DomainId {
    /// Language of the domain.
    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// File name relative to the translation directory.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file)
    }
}

/// In-memory translation keys for any number of domains.
#[derive(Debug, Clone)]
pub struct KeyStore {
    languages: Languages,
    dir: PathBuf,
    extension: String,
    domains: BTreeMap<DomainId, Catalog>,
}

impl KeyStore {
    /// Create an empty store reading from and writing to `dir`.
    pub fn new(languages: Languages, dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            languages,
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            domains: BTreeMap::new(),
        }
    }

    /// Create a store for a site rooted at `root`.
    pub fn from_config(config: &Config, root: &Path) -> Result<Self> {
        Ok(Self::new(
            config.languages()?,
            root.join(&config.i18n.dir),
            &config.i18n.extension,
        ))
    }

    /// Translation directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Domain of `template` (a path relative to the templates root) in `lang`.
    pub fn domain(&self, template: &str, lang: &str) -> Result<DomainId> {
        let file = self
            .languages
            .localize(&template.replace('\\', "/"), lang, Some(&self.extension))?;
        Ok(DomainId {
            lang: lang.to_string(),
            file,
        })
    }

    /// Load every translation file of `lang`.
    ///
    /// A missing directory means no translations yet. The default language has
    /// no translation files, so loading it does nothing.
    pub fn load(&mut self, lang: &str) -> Result<usize> {
        self.languages.ensure(lang)?;

        if self.languages.is_default(lang) {
            debug!(lang, "default language has no translation files");
            return Ok(0);
        }
        if !self.dir.is_dir() {
            debug!(dir = %self.dir.display(), "translation directory missing, starting empty");
            return Ok(0);
        }

        let suffix = format!(".{lang}.{}", self.extension);
        let mut loaded = 0;

        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || !name.ends_with(&suffix) {
                continue;
            }

            let path = entry.path();
            let file = path
                .strip_prefix(&self.dir)
                .map_err(|_| I18nError::malformed(path, "outside the translation directory"))?
                .to_string_lossy()
                .replace('\\', "/");

            let content = fs::read_to_string(path)?;
            let catalog = parse_catalog(&content, path)?;
            debug!(file = %file, keys = catalog.len(), "loaded translation file");

            self.domains.insert(
                DomainId {
                    lang: lang.to_string(),
                    file,
                },
                catalog,
            );
            loaded += 1;
        }

        info!(lang, files = loaded, "translations loaded");
        Ok(loaded)
    }

    /// Register `key` if absent and return its translation, or the key itself
    /// when it is not translated.
    pub fn get_or_register(&mut self, domain: &DomainId, key: &str) -> String {
        let key = key.trim();
        self.lookup(domain, key).unwrap_or_else(|| key.to_string())
    }

    /// Register `key` if absent and return its non-empty translation.
    /// Empty keys are never registered.
    pub fn lookup(&mut self, domain: &DomainId, key: &str) -> Option<String> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        let value = self
            .domains
            .entry(domain.clone())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Add keys missing from `domain` with empty translations. Existing entries
    /// are left untouched. Returns the number of keys added.
    pub fn merge_extracted<I, S>(&mut self, domain: &DomainId, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .peekable();
        if keys.peek().is_none() {
            return 0;
        }

        let catalog = self.domains.entry(domain.clone()).or_default();
        let mut added = 0;
        for key in keys {
            if let std::collections::btree_map::Entry::Vacant(slot) = catalog.entry(key) {
                slot.insert(String::new());
                added += 1;
            }
        }
        added
    }

    /// Write every domain of `lang` to the translation directory.
    pub fn persist(&self, lang: &str) -> Result<usize> {
        self.languages.ensure(lang)?;

        let mut written = 0;
        for (domain, catalog) in self.domains(lang) {
            let path = self.dir.join(&domain.file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, serde_yaml::to_string(catalog)?)?;
            debug!(path = %path.display(), keys = catalog.len(), "wrote translation file");
            written += 1;
        }

        info!(lang, files = written, "translations saved");
        Ok(written)
    }

    /// Entries of `domain`.
    #[must_use]
    pub fn catalog(&self, domain: &DomainId) -> Option<&Catalog> {
        self.domains.get(domain)
    }

    /// Domains of `lang` in file-name order.
    pub fn domains<'a>(&'a self, lang: &'a str) -> impl Iterator<Item = (&'a DomainId, &'a Catalog)> {
        self.domains.iter().filter(move |(id, _)| id.lang == lang)
    }

    /// Number of untranslated keys per domain of `lang`, skipping complete domains.
    #[must_use]
    pub fn untranslated(&self, lang: &str) -> Vec<(DomainId, usize)> {
        self.domains(lang)
            .map(|(id, catalog)| {
                let missing = catalog.values().filter(|v| v.trim().is_empty()).count();
                (id.clone(), missing)
            })
            .filter(|(_, missing)| *missing > 0)
            .collect()
    }
}

/// Parse a flat YAML mapping. Null values become empty strings and other
/// scalars their text; anything nested is rejected.
fn parse_catalog(content: &str, path: &Path) -> Result<Catalog> {
    if content.trim().is_empty() {
        return Ok(Catalog::new());
    }

    let value: Value =
        serde_yaml::from_str(content).map_err(|e| I18nError::malformed(path, e.to_string()))?;

    let mapping = match value {
        Value::Null => return Ok(Catalog::new()),
        Value::Mapping(mapping) => mapping,
        _ => return Err(I18nError::malformed(path, "expected a mapping of keys to strings")),
    };

    let mut catalog = Catalog::new();
    for (key, value) in mapping {
        let key = scalar_text(key)
            .ok_or_else(|| I18nError::malformed(path, "translation keys must be scalars"))?;
        let value = scalar_text(value).ok_or_else(|| {
            I18nError::malformed(path, format!("value of `{key}` must be a string"))
        })?;
        catalog.insert(key, value);
    }
    Ok(catalog)
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store(dir: &Path) -> KeyStore {
        let languages = Languages::new(["en", "zh", "ja"], "en").unwrap();
        KeyStore::new(languages, dir, "yaml")
    }

    #[test]
    fn test_domain_naming() {
        let dir = TempDir::new().unwrap();
        let store = store(dir.path());

        assert_eq!(store.domain("index.html", "zh").unwrap().file(), "index.zh.yaml");
        assert_eq!(
            store.domain("blog/post.html", "ja").unwrap().file(),
            "blog/post.ja.yaml"
        );
        assert!(store.domain("index.html", "fr").is_err());
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir.path().join("missing"));
        assert_eq!(store.load("zh").unwrap(), 0);
    }

    #[test]
    fn test_load_only_requested_language() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.zh.yaml"), "Hello: 你好\n").unwrap();
        fs::write(dir.path().join("index.ja.yaml"), "Hello: こんにちは\n").unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("blog/post.zh.yaml"), "Read more: 阅读更多\n").unwrap();

        let mut store = store(dir.path());
        assert_eq!(store.load("zh").unwrap(), 2);

        let index = store.domain("index.html", "zh").unwrap();
        assert_eq!(store.get_or_register(&index, "Hello"), "你好");
        let post = store.domain("blog/post.html", "zh").unwrap();
        assert_eq!(store.get_or_register(&post, "Read more"), "阅读更多");
        assert_eq!(store.domains("ja").count(), 0);
    }

    #[test]
    fn test_load_default_language_is_noop() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.yaml"), "Hello: Hello\n").unwrap();
        let mut store = store(dir.path());
        assert_eq!(store.load("en").unwrap(), 0);
    }

    #[test]
    fn test_load_unknown_language_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = store(dir.path());
        assert!(matches!(
            store.load("fr"),
            Err(I18nError::Core(glossa_core::CoreError::UnknownLanguage(_)))
        ));
    }

    #[test]
    fn test_null_and_scalar_values() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("index.zh.yaml"),
            "Hello:\n'404': 404\nenabled: true\n",
        )
        .unwrap();

        let mut store = store(dir.path());
        store.load("zh").unwrap();
        let domain = store.domain("index.html", "zh").unwrap();
        let catalog = store.catalog(&domain).unwrap();
        assert_eq!(catalog["Hello"], "");
        assert_eq!(catalog["404"], "404");
        assert_eq!(catalog["enabled"], "true");
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.zh.yaml"), "Hello: [unclosed\n").unwrap();
        let mut store = store(dir.path());
        assert!(matches!(store.load("zh"), Err(I18nError::Malformed { .. })));

        fs::write(dir.path().join("index.zh.yaml"), "- a\n- b\n").unwrap();
        assert!(matches!(store.load("zh"), Err(I18nError::Malformed { .. })));

        fs::write(dir.path().join("index.zh.yaml"), "a:\n  nested: x\n").unwrap();
        assert!(matches!(store.load("zh"), Err(I18nError::Malformed { .. })));
    }

    #[test]
    fn test_empty_file_is_empty_catalog() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.zh.yaml"), "").unwrap();
        let mut store = store(dir.path());
        assert_eq!(store.load("zh").unwrap(), 1);
    }

    #[test]
    fn test_get_or_register() {
        let dir = TempDir::new().unwrap();
        let mut store = store(dir.path());
        let domain = store.domain("index.html", "zh").unwrap();

        assert_eq!(store.get_or_register(&domain, "  Hello "), "Hello");
        assert_eq!(store.catalog(&domain).unwrap()["Hello"], "");
        assert_eq!(store.lookup(&domain, "Hello"), None);
    }

    #[test]
    fn test_empty_key_is_not_registered() {
        let dir = TempDir::new().unwrap();
        let mut store = store(dir.path());
        let domain = store.domain("index.html", "zh").unwrap();

        assert_eq!(store.get_or_register(&domain, "   "), "");
        assert_eq!(store.lookup(&domain, ""), None);
        assert!(store.catalog(&domain).is_none());
        assert!(store.domains("zh").next().is_none());
    }

    #[test]
    fn test_merge_preserves_existing_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.zh.yaml"), "Hello: 你好\nBye: ''\n").unwrap();
        let mut store = store(dir.path());
        store.load("zh").unwrap();
        let domain = store.domain("index.html", "zh").unwrap();

        let added = store.merge_extracted(&domain, ["Hello", "Bye", "New"]);
        assert_eq!(added, 1);

        let catalog = store.catalog(&domain).unwrap();
        assert_eq!(catalog["Hello"], "你好");
        assert_eq!(catalog["Bye"], "");
        assert_eq!(catalog["New"], "");
    }

    #[test]
    fn test_merge_nothing_creates_no_domain() {
        let dir = TempDir::new().unwrap();
        let mut store = store(dir.path());
        let domain = store.domain("index.html", "zh").unwrap();
        assert_eq!(store.merge_extracted(&domain, Vec::<String>::new()), 0);
        assert!(store.catalog(&domain).is_none());
    }

    #[test]
    fn test_persist_round_trip_is_stable() {
        let dir = TempDir::new().unwrap();
        let mut store = store(dir.path());
        let index = store.domain("index.html", "zh").unwrap();
        let post = store.domain("blog/post.html", "zh").unwrap();
        store.merge_extracted(&index, ["nav.home", "Hello"]);
        store.merge_extracted(&post, ["Read more"]);

        assert_eq!(store.persist("zh").unwrap(), 2);
        let first = fs::read_to_string(dir.path().join("index.zh.yaml")).unwrap();
        assert!(dir.path().join("blog/post.zh.yaml").exists());

        let mut reloaded = self::store(dir.path());
        reloaded.load("zh").unwrap();
        reloaded.persist("zh").unwrap();
        let second = fs::read_to_string(dir.path().join("index.zh.yaml")).unwrap();

        assert_eq!(first, second);
        assert_eq!(reloaded.catalog(&index).unwrap()["nav.home"], "");
    }

    #[test]
    fn test_untranslated_counts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.zh.yaml"), "x: X\ny: ''\nz:\n").unwrap();
        fs::write(dir.path().join("b.zh.yaml"), "x: X\n").unwrap();
        let mut store = store(dir.path());
        store.load("zh").unwrap();

        let missing = store.untranslated("zh");
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].0.file(), "a.zh.yaml");
        assert_eq!(missing[0].1, 2);
    }
}
