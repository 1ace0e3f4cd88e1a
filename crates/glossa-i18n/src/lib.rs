//! Glossa i18n Library
//!
//! Translation key extraction and template localization.
//!
//! # Modules
//!
//! - [`markup`] - Lenient HTML tree
//! - [`scanner`] - Finds `i18n` directives in markup
//! - [`store`] - Per-template, per-language translation keys
//! - [`applier`] - Writes translations into markup

pub mod applier;
pub mod error;
pub mod markup;
pub mod scanner;
pub mod store;

pub use applier::{ApplyStats, Applier};
pub use error::{I18nError, Result};
pub use markup::Document;
pub use scanner::{InsertionPoint, ScanConfig, ScannedUnit, Scanner};
pub use store::{Catalog, DomainId, KeyStore};
