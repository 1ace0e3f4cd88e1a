//! Supported languages and language-qualified file naming.
//!
//! Every compiled page and every translation file is named from a canonical path
//! plus a target language:
//!
//! - `index.html` + `en` (default) → `index.html`
//! - `index.html` + `zh` → `index.zh.html`
//! - `blog/post.html` + `zh` with extension `yaml` → `blog/post.zh.yaml`

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// The fixed set of languages a site is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Languages {
    supported: Vec<String>,
    default: String,
}

impl Languages {
    /// Create a language set.
    ///
    /// Fails when the set is empty or does not contain the default language.
    pub fn new<I, S>(supported: I, default: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let supported: Vec<String> = supported.into_iter().map(Into::into).collect();
        let default = default.into();

        if supported.is_empty() {
            return Err(CoreError::config("at least one language must be configured"));
        }
        if !supported.contains(&default) {
            return Err(CoreError::config(format!(
                "default language `{default}` is not among the supported languages"
            )));
        }

        Ok(Self { supported, default })
    }

    /// The language whose output carries no language suffix.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default
    }

    /// All supported languages in configuration order.
    #[must_use]
    pub fn all(&self) -> &[String] {
        &self.supported
    }

    /// Supported languages other than the default one.
    pub fn non_default(&self) -> impl Iterator<Item = &str> {
        self.supported
            .iter()
            .map(String::as_str)
            .filter(move |lang| *lang != self.default)
    }

    /// Whether `lang` is supported.
    #[must_use]
    pub fn contains(&self, lang: &str) -> bool {
        self.supported.iter().any(|l| l == lang)
    }

    /// Whether `lang` is the default language.
    #[must_use]
    pub fn is_default(&self, lang: &str) -> bool {
        self.default == lang
    }

    /// Fail with [`CoreError::UnknownLanguage`] unless `lang` is supported.
    pub fn ensure(&self, lang: &str) -> Result<()> {
        if self.contains(lang) {
            Ok(())
        } else {
            Err(CoreError::unknown_language(lang))
        }
    }

    /// Derive the language-qualified name of `path`.
    ///
    /// The extension is `ext` when given (a leading `.` is added if missing),
    /// otherwise the final extension of `path`. The language is inserted before
    /// the extension unless it is the default language.
    pub fn localize(&self, path: &str, lang: &str, ext: Option<&str>) -> Result<String> {
        self.ensure(lang)?;

        let (base, own_ext) = split_extension(path);
        let extension = match ext {
            Some(e) if e.is_empty() || e.starts_with('.') => e.to_string(),
            Some(e) => format!(".{e}"),
            None => own_ext.to_string(),
        };

        if self.is_default(lang) {
            Ok(format!("{base}{extension}"))
        } else {
            Ok(format!("{base}.{lang}{extension}"))
        }
    }

    /// [`Languages::localize`] for filesystem paths.
    pub fn localize_path(&self, path: &Path, lang: &str, ext: Option<&str>) -> Result<PathBuf> {
        let localized = self.localize(&path.to_string_lossy(), lang, ext)?;
        Ok(PathBuf::from(localized))
    }
}

/// Split `path` into base and final extension (including the dot).
///
/// Only the last path segment is considered, and a leading dot of a file name
/// does not start an extension.
fn split_extension(path: &str) -> (&str, &str) {
    let name_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => path.split_at(name_start + dot),
        _ => (path, ""),
    }
}
