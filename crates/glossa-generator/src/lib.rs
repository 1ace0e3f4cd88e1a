//! Glossa Generator Library
//!
//! Multilingual static site generation for Glossa.
//!
//! # Modules
//!
//! - [`template`] - HTML template system with variable interpolation
//! - [`i18n`] - Translation primitives for templates
//! - [`pages`] - Per-language page compilation
//! - [`extract`] - Translation key extraction
//! - [`assets`] - Static asset copying
//! - [`stages`] - External tool stages
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod extract;
pub mod i18n;
pub mod pages;
pub mod stages;
pub mod template;

pub use assets::{AssetError, AssetProcessor};
pub use build::{BuildError, BuildStats, Builder};
pub use extract::{ExtractStats, Extractor};
pub use i18n::I18nExtension;
pub use pages::{CompiledPage, PageCompiler, PageError};
pub use stages::{StageError, StageRunner};
pub use template::{Template, TemplateContext, TemplateError, TemplateExtension, TemplateRegistry};
