//! Glossa CLI Library
//!
//! Command implementations for the Glossa binary, exposed as a library so
//! they can be driven from tests and other tools.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, extract, clean, check)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use glossa::cmd;
//!
//! cmd::extract::run(Path::new("glossa.toml")).unwrap();
//! cmd::build::run(Path::new("glossa.toml"), None, false).unwrap();
//! ```

pub mod cmd;

// Re-export core types for convenience
pub use glossa_core::{Config, Languages};
pub use glossa_generator::{BuildStats, Builder, ExtractStats, Extractor};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(verbose >= 2))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
