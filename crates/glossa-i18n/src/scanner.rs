//! Template scanning for translation directives.
//!
//! An element is translatable when it carries any of:
//!
//! - `i18n` → key is the trimmed element content
//! - `i18n="key"` or `i18n-key="key"` → explicit key
//! - `i18n-<attr>="key"` for a configured attribute → the attribute is translated
//!
//! One element may produce a content unit plus one unit per flagged attribute.

use std::collections::{BTreeSet, VecDeque};

use glossa_core::config::I18nConfig;

use crate::markup::{Document, Element, Elements, NodePath};

/// Directive names and the attributes that may be localized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    marker: String,
    key_marker: String,
    attributes: Vec<(String, String)>,
}

impl ScanConfig {
    /// Create a config from a marker name and the localizable attributes.
    pub fn new<I, S>(marker: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let marker = marker.into();
        let attributes = attributes
            .into_iter()
            .map(|a| {
                let attr = a.into();
                let directive = format!("{marker}-{attr}");
                (attr, directive)
            })
            .collect();
        Self {
            key_marker: format!("{marker}-key"),
            marker,
            attributes,
        }
    }

    /// Build from the `[i18n]` configuration section.
    #[must_use]
    pub fn from_config(config: &I18nConfig) -> Self {
        Self::new(config.marker.clone(), config.attributes.iter().cloned())
    }

    /// Whether `name` is the marker or any `<marker>-*` attribute, configured or not.
    #[must_use]
    pub fn is_directive(&self, name: &str) -> bool {
        if name.eq_ignore_ascii_case(&self.marker) {
            return true;
        }
        let prefix = self.marker.len();
        name.len() > prefix + 1
            && name.is_char_boundary(prefix)
            && name[..prefix].eq_ignore_ascii_case(&self.marker)
            && name.as_bytes()[prefix] == b'-'
    }

    /// Whether `name` is a `<marker>-<attr>` directive for an attribute that is
    /// not configured as localizable.
    fn is_unconfigured_directive(&self, name: &str) -> bool {
        self.is_directive(name)
            && !name.eq_ignore_ascii_case(&self.marker)
            && !name.eq_ignore_ascii_case(&self.key_marker)
            && !self
                .attributes
                .iter()
                .any(|(_, directive)| name.eq_ignore_ascii_case(directive))
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from_config(&I18nConfig::default())
    }
}

/// Where a translation is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InsertionPoint {
    /// The element content.
    Content,
    /// The named attribute.
    Attribute(String),
}

/// One translatable unit found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedUnit {
    /// Template the document was compiled from.
    pub source: String,
    /// Translation key.
    pub key: String,
    /// Where the translation goes.
    pub target: InsertionPoint,
    /// Location of the element in the document.
    pub path: NodePath,
}

/// Finds translation directives in parsed markup.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// The scanner configuration.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Lazily scan `doc` in document order.
    #[must_use]
    pub fn scan<'a>(&'a self, doc: &'a Document, source: &'a str) -> Scan<'a> {
        Scan {
            scanner: self,
            source,
            elements: doc.elements(),
            pending: VecDeque::new(),
        }
    }

    /// The set of keys found in `doc`.
    #[must_use]
    pub fn keys(&self, doc: &Document, source: &str) -> BTreeSet<String> {
        self.scan(doc, source).map(|unit| unit.key).collect()
    }

    /// Remove every directive attribute from `doc`. Returns the number removed.
    pub fn strip(&self, doc: &mut Document) -> usize {
        let mut removed = 0;
        doc.for_each_element_mut(|element| {
            removed += element.remove_attrs(|name| self.config.is_directive(name));
        });
        removed
    }

    fn units_for(&self, path: &NodePath, element: &Element, source: &str, out: &mut VecDeque<ScannedUnit>) {
        let unit = |key: String, target: InsertionPoint| ScannedUnit {
            source: source.to_string(),
            key,
            target,
            path: path.clone(),
        };

        let explicit = explicit_value(element, &self.config.key_marker)
            .or_else(|| explicit_value(element, &self.config.marker));
        if let Some(key) = explicit {
            out.push_back(unit(key, InsertionPoint::Content));
        } else if element.has_attr(&self.config.marker) {
            let inner = element.inner_html_without(&|name| self.config.is_directive(name));
            let key = inner.trim();
            if key.is_empty() {
                tracing::debug!(source, element = %element.name, "skipping empty translatable element");
            } else {
                out.push_back(unit(key.to_string(), InsertionPoint::Content));
            }
        }

        for attr in element.attrs.iter().filter(|a| self.config.is_unconfigured_directive(&a.name)) {
            tracing::warn!(
                source,
                element = %element.name,
                directive = %attr.name,
                "attribute is not configured as localizable, directive will only be stripped"
            );
        }

        for (attr, directive) in &self.config.attributes {
            if !element.has_attr(directive) {
                continue;
            }
            // A valueless directive translates the attribute's current value
            let key = explicit_value(element, directive).or_else(|| explicit_value(element, attr));
            match key {
                Some(key) => out.push_back(unit(key, InsertionPoint::Attribute(attr.clone()))),
                None => tracing::debug!(source, attribute = %attr, "no key for attribute directive"),
            }
        }
    }
}

/// Trimmed, non-empty value of attribute `name`.
fn explicit_value(element: &Element, name: &str) -> Option<String> {
    element
        .attr(name)
        .and_then(|a| a.value())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lazy sequence of [`ScannedUnit`]s produced by [`Scanner::scan`].
#[derive(Debug)]
pub struct Scan<'a> {
    scanner: &'a Scanner,
    source: &'a str,
    elements: Elements<'a>,
    pending: VecDeque<ScannedUnit>,
}

impl Iterator for Scan<'_> {
    type Item = ScannedUnit;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return Some(unit);
            }
            let (path, element) = self.elements.next()?;
            self.scanner
                .units_for(&path, element, self.source, &mut self.pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> Vec<ScannedUnit> {
        let scanner = Scanner::default();
        let doc = Document::parse(src);
        scanner.scan(&doc, "page.html").collect()
    }

    #[test]
    fn test_content_marker_uses_trimmed_content() {
        let units = scan("<span i18n>  Hello </span>");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].key, "Hello");
        assert_eq!(units[0].target, InsertionPoint::Content);
        assert_eq!(units[0].source, "page.html");
        assert_eq!(units[0].path, vec![0]);
    }

    #[test]
    fn test_explicit_keys() {
        let units = scan(r#"<h1 i18n="home.title">Welcome</h1><p i18n-key="home.intro">Intro</p>"#);
        let keys: Vec<_> = units.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["home.title", "home.intro"]);
    }

    #[test]
    fn test_key_marker_wins_over_marker_value() {
        let units = scan(r#"<p i18n="a" i18n-key="b">x</p>"#);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].key, "b");
    }

    #[test]
    fn test_content_and_attribute_on_same_element() {
        let units = scan(r#"<div i18n i18n-title="t1">Text</div>"#);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].key, "Text");
        assert_eq!(units[0].target, InsertionPoint::Content);
        assert_eq!(units[1].key, "t1");
        assert_eq!(units[1].target, InsertionPoint::Attribute("title".to_string()));
    }

    #[test]
    fn test_attribute_only_directive() {
        let units = scan(r#"<a href="/" i18n-title="nav.home">Home</a>"#);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].key, "nav.home");
        assert_eq!(units[0].target, InsertionPoint::Attribute("title".to_string()));
    }

    #[test]
    fn test_valueless_attribute_directive_uses_current_value() {
        let units = scan(r#"<img class="logo" i18n-class>"#);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].key, "logo");

        assert!(scan(r#"<img i18n-title>"#).is_empty());
    }

    #[test]
    fn test_unconfigured_attribute_ignored() {
        assert!(scan(r#"<img i18n-alt="logo">"#).is_empty());
    }

    #[test]
    fn test_unconfigured_attribute_directive_is_stripped() {
        let scanner = Scanner::default();
        let mut doc = Document::parse(r#"<img alt="Logo" i18n-alt="logo.alt" i18n-alt2>"#);
        assert_eq!(scanner.strip(&mut doc), 2);
        assert_eq!(doc.to_html(), r#"<img alt="Logo">"#);
    }

    #[test]
    fn test_directive_names() {
        let config = ScanConfig::default();
        assert!(config.is_directive("i18n"));
        assert!(config.is_directive("I18N-Title"));
        assert!(config.is_directive("i18n-alt"));
        assert!(!config.is_directive("i18n-"));
        assert!(!config.is_directive("i18nx"));
        assert!(!config.is_directive("data-i18n"));

        assert!(config.is_unconfigured_directive("i18n-alt"));
        assert!(!config.is_unconfigured_directive("i18n-key"));
        assert!(!config.is_unconfigured_directive("i18n-title"));
    }

    #[test]
    fn test_nested_directives_excluded_from_key() {
        let units = scan(r#"<p i18n>Go <a i18n-title="t" href="/">home</a></p>"#);
        assert_eq!(units[0].key, r#"Go <a href="/">home</a>"#);
        assert_eq!(units[1].key, "t");
        assert_eq!(units[1].path, vec![0, 1]);
    }

    #[test]
    fn test_empty_content_skipped() {
        assert!(scan("<span i18n>   </span>").is_empty());
    }

    #[test]
    fn test_document_order_is_deterministic() {
        let src = r#"<ul><li i18n>One</li><li i18n>Two</li></ul><footer i18n>Three</footer>"#;
        let first: Vec<_> = scan(src).into_iter().map(|u| u.key).collect();
        let second: Vec<_> = scan(src).into_iter().map(|u| u.key).collect();
        assert_eq!(first, vec!["One", "Two", "Three"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_markup_yields_empty_scan() {
        assert!(scan("<span i18n").is_empty());
    }

    #[test]
    fn test_strip_removes_only_directives() {
        let scanner = Scanner::default();
        let mut doc = Document::parse(
            r#"<div i18n i18n-title="t1" title="x" i18n-key="k" data-i18n="keep">Text</div>"#,
        );
        assert_eq!(scanner.strip(&mut doc), 3);
        assert_eq!(
            doc.to_html(),
            r#"<div title="x" data-i18n="keep">Text</div>"#
        );
    }

    #[test]
    fn test_custom_marker() {
        let scanner = Scanner::new(ScanConfig::new("tr", ["alt"]));
        let doc = Document::parse(r#"<img tr-alt="logo.alt"><b tr>Bold</b><i i18n>no</i>"#);
        let keys = scanner.keys(&doc, "x.html");
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["Bold".to_string(), "logo.alt".to_string()]
        );
    }
}
