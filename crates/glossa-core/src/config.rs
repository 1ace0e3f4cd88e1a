//! Site configuration management.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    lang::Languages,
};

/// Main configuration structure for Glossa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Translation settings.
    #[serde(default)]
    pub i18n: I18nConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title, exposed to templates as `site_title`.
    pub title: String,

    /// Default language code.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// List of supported languages.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory holding page templates and `_` partials.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Files copied verbatim into the output root.
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Fonts copied into `<output>/fonts`.
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: String,

    /// Extension of template files.
    #[serde(default = "default_html_extension")]
    pub template_extension: String,

    /// Extension of compiled pages.
    #[serde(default = "default_html_extension")]
    pub output_extension: String,

    /// Whether production-only stages run.
    #[serde(default)]
    pub production: bool,

    /// External tools run around page compilation.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// An external directory-to-directory tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Name used in logs and errors.
    pub name: String,

    /// Program to execute.
    pub program: String,

    /// Arguments; `{output}` and `{root}` are substituted.
    #[serde(default)]
    pub args: Vec<String>,

    /// When the stage runs.
    #[serde(default)]
    pub phase: StagePhase,
}

/// Point of the build at which a stage runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePhase {
    /// Alongside page compilation (stylesheets).
    #[default]
    Build,
    /// After pages are written (font subsetting).
    Post,
    /// After everything else, only for production builds (minification).
    Production,
}

/// Translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Directory holding translation files.
    #[serde(default = "default_i18n_dir")]
    pub dir: String,

    /// Extension of translation files.
    #[serde(default = "default_i18n_extension")]
    pub extension: String,

    /// Attribute marking translatable content. `<marker>-key` carries explicit
    /// keys and `<marker>-<attribute>` marks a translatable attribute.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Attributes that may be localized.
    #[serde(default = "default_attributes")]
    pub attributes: Vec<String>,
}

/// `GLOSSA__SECTION__KEY` variables, e.g. `GLOSSA__BUILD__OUTPUT_DIR`.
fn env_overrides() -> config::Environment {
    config::Environment::with_prefix("GLOSSA").separator("__")
}

// Default value functions
fn default_language() -> String {
    "en".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_fonts_dir() -> String {
    "fonts".to_string()
}

fn default_html_extension() -> String {
    "html".to_string()
}

fn default_i18n_dir() -> String {
    "i18n".to_string()
}

fn default_i18n_extension() -> String {
    "yaml".to_string()
}

fn default_marker() -> String {
    "i18n".to_string()
}

fn default_attributes() -> Vec<String> {
    vec!["title".to_string(), "class".to_string()]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            output_dir: default_output_dir(),
            public_dir: default_public_dir(),
            fonts_dir: default_fonts_dir(),
            template_extension: default_html_extension(),
            output_extension: default_html_extension(),
            production: false,
            stages: Vec::new(),
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            dir: default_i18n_dir(),
            extension: default_i18n_extension(),
            marker: default_marker(),
            attributes: default_attributes(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, with `GLOSSA__` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        Self::load_with_overrides(path, env_overrides())
    }

    fn load_with_overrides(path: &Path, overrides: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(overrides)
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.title.is_empty() {
            return Err(CoreError::config("site.title cannot be empty"));
        }

        let mut seen = HashSet::new();
        for lang in &self.site.languages {
            if lang.is_empty() {
                return Err(CoreError::config("site.languages cannot contain empty codes"));
            }
            if !seen.insert(lang.as_str()) {
                return Err(CoreError::config(format!(
                    "site.languages lists `{lang}` more than once"
                )));
            }
        }

        // Also checks non-empty and default membership
        self.languages()?;

        if self.build.output_extension.is_empty() || self.i18n.extension.is_empty() {
            return Err(CoreError::config("file extensions cannot be empty"));
        }

        if self.i18n.marker.is_empty() {
            return Err(CoreError::config("i18n.marker cannot be empty"));
        }

        if self.i18n.attributes.iter().any(|a| a == "key") {
            return Err(CoreError::config(
                "i18n.attributes cannot contain `key`, it is reserved for explicit keys",
            ));
        }

        if self.site.languages.len() == 1 {
            tracing::warn!("only one language configured, translation files will not be used");
        }

        Ok(())
    }

    /// The configured language set.
    pub fn languages(&self) -> Result<Languages> {
        Languages::new(
            self.site.languages.iter().cloned(),
            self.site.default_language.clone(),
        )
    }

    /// Stages configured for `phase`, in declaration order.
    pub fn stages(&self, phase: StagePhase) -> impl Iterator<Item = &StageConfig> {
        self.build.stages.iter().filter(move |s| s.phase == phase)
    }
}
