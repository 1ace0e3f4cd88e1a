//! Glossa Core Library
//!
//! Configuration, the supported language set and the error type shared by the
//! Glossa build pipeline.

pub mod config;
pub mod error;
pub mod lang;

pub use config::Config;
pub use error::{CoreError, Result};
pub use lang::Languages;
