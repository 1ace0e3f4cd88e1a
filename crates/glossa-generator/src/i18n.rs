//! Translation primitives available inside templates.

use glossa_core::Languages;
use glossa_i18n::KeyStore;

use crate::template::{Result, TemplateError, TemplateExtension};

/// Template extension providing `url`, `i18n_switch` and `trans`.
///
/// `trans` registers its key in the domain of the template it appears in, so a
/// string inside a partial belongs to the partial's translation file.
pub struct I18nExtension<'a> {
    languages: &'a Languages,
    lang: &'a str,
    page: &'a str,
    store: &'a mut KeyStore,
}

impl<'a> I18nExtension<'a> {
    /// Create the extension for rendering `page` (the file name of its
    /// default-language output) in `lang`.
    pub fn new(languages: &'a Languages, lang: &'a str, page: &'a str, store: &'a mut KeyStore) -> Self {
        Self {
            languages,
            lang,
            page,
            store,
        }
    }

    fn translate(&mut self, template: &str, key: &str) -> Result<String> {
        let domain = self.store.domain(template, self.lang)?;
        Ok(self.store.get_or_register(&domain, key))
    }
}

impl TemplateExtension for I18nExtension<'_> {
    fn function(&mut self, _template: &str, name: &str, arg: &str) -> Result<String> {
        match name {
            "url" => Ok(self.languages.localize(arg, self.lang, None)?),
            "i18n_switch" => Ok(self.languages.localize(self.page, arg, None)?),
            _ => Err(TemplateError::UnknownFunction(name.to_string())),
        }
    }

    fn filter(&mut self, template: &str, name: &str, input: &str) -> Result<String> {
        match name {
            "trans" => self.translate(template, input),
            _ => Err(TemplateError::UnknownFilter(name.to_string())),
        }
    }

    fn block(&mut self, template: &str, name: &str, body: &str) -> Result<String> {
        match name {
            "trans" => self.translate(template, body.trim()),
            _ => Err(TemplateError::UnknownBlock(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::template::{Template, TemplateContext, TemplateRegistry};

    fn languages() -> Languages {
        Languages::new(["en", "zh"], "en").unwrap()
    }

    fn render(registry: &TemplateRegistry, lang: &str, store: &mut KeyStore) -> Result<String> {
        let languages = languages();
        let mut ext = I18nExtension::new(&languages, lang, "index.html", store);
        registry.render_with("index.html", &TemplateContext::new(), &mut ext)
    }

    #[test]
    fn test_url_and_switch() {
        let dir = TempDir::new().unwrap();
        let mut store = KeyStore::new(languages(), dir.path(), "yaml");
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new(
            "index.html",
            r#"{{ url("about.html") }} {{ i18n_switch("en") }} {{ i18n_switch("zh") }}"#,
        ));

        assert_eq!(
            render(&registry, "zh", &mut store).unwrap(),
            "about.zh.html index.html index.zh.html"
        );
        assert_eq!(
            render(&registry, "en", &mut store).unwrap(),
            "about.html index.html index.zh.html"
        );
    }

    #[test]
    fn test_switch_to_unknown_language_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = KeyStore::new(languages(), dir.path(), "yaml");
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new("index.html", r#"{{ i18n_switch("fr") }}"#));

        assert!(matches!(
            render(&registry, "zh", &mut store),
            Err(TemplateError::Language(_))
        ));
    }

    #[test]
    fn test_trans_uses_template_domain() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.zh.yaml"), "Hello: 你好\n").unwrap();
        fs::write(dir.path().join("_nav.zh.yaml"), "Home: 首页\n").unwrap();

        let mut store = KeyStore::new(languages(), dir.path(), "yaml");
        store.load("zh").unwrap();

        let mut registry = TemplateRegistry::new();
        registry.register(Template::new("_nav.html", "{{ 'Home' | trans }}|{{ 'Hello' | trans }}"));
        registry.register(Template::new(
            "index.html",
            "{% trans %} Hello {% endtrans %}|{% include '_nav.html' %}|{{ 'Bye' | trans }}",
        ));

        assert_eq!(
            render(&registry, "zh", &mut store).unwrap(),
            "你好|首页|Hello|Bye"
        );

        // Unknown keys are registered in the domain they appear in
        let nav = store.domain("_nav.html", "zh").unwrap();
        assert_eq!(store.catalog(&nav).unwrap().get("Hello").map(String::as_str), Some(""));
        let index = store.domain("index.html", "zh").unwrap();
        assert!(store.catalog(&index).unwrap().contains_key("Bye"));
    }
}
