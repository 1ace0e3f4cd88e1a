//! Substituting translations into compiled markup.

use glossa_core::Languages;
use tracing::debug;

use crate::{
    error::Result,
    markup::Document,
    scanner::{InsertionPoint, ScannedUnit, Scanner},
    store::{DomainId, KeyStore},
};

/// Counters for one localized document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Units found in the document.
    pub units: usize,
    /// Units replaced by a translation.
    pub translated: usize,
    /// Units left with their source text.
    pub untranslated: usize,
    /// Directive attributes removed.
    pub stripped: usize,
}

/// Rewrites scanned units with their translations.
#[derive(Debug, Clone)]
pub struct Applier {
    scanner: Scanner,
    languages: Languages,
}

impl Applier {
    /// Create an applier.
    #[must_use]
    pub fn new(scanner: Scanner, languages: Languages) -> Self {
        Self { scanner, languages }
    }

    /// The scanner used by [`Applier::localize_document`].
    #[must_use]
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Apply translations for `lang` to `units` of `doc`, then strip directives.
    ///
    /// The default language keeps its source text. Missing or empty
    /// translations also keep the source text.
    pub fn apply(
        &self,
        doc: &mut Document,
        units: &[ScannedUnit],
        lang: &str,
        store: &mut KeyStore,
        domain: &DomainId,
    ) -> Result<ApplyStats> {
        self.languages.ensure(lang)?;

        let mut stats = ApplyStats {
            units: units.len(),
            ..ApplyStats::default()
        };

        if self.languages.is_default(lang) {
            stats.untranslated = units.len();
        } else {
            // Reverse document order: nested units first, so an outer content
            // replacement wins and paths stay valid.
            for unit in units.iter().rev() {
                let Some(translation) = store.lookup(domain, &unit.key) else {
                    stats.untranslated += 1;
                    continue;
                };
                let Some(element) = doc.element_at_mut(&unit.path) else {
                    debug!(key = %unit.key, "element replaced by an enclosing translation");
                    continue;
                };
                match &unit.target {
                    InsertionPoint::Content => element.set_inner_html(translation),
                    InsertionPoint::Attribute(name) => element.set_attr(name, translation),
                }
                stats.translated += 1;
            }
        }

        stats.stripped = self.scanner.strip(doc);
        Ok(stats)
    }

    /// Parse, scan, apply and serialize `html` compiled from template `source`.
    pub fn localize_document(
        &self,
        html: &str,
        source: &str,
        lang: &str,
        store: &mut KeyStore,
    ) -> Result<(String, ApplyStats)> {
        let mut doc = Document::parse(html);
        let units: Vec<_> = self.scanner.scan(&doc, source).collect();
        let domain = store.domain(source, lang)?;
        let stats = self.apply(&mut doc, &units, lang, store, &domain)?;
        Ok((doc.to_html(), stats))
    }
}
