//! Glossa CLI
//!
//! Multilingual static site generator.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Glossa.
#[derive(Parser)]
#[command(
    name = "glossa",
    version,
    about = "A multilingual static site generator"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "glossa.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Compile every page in every language
    Build {
        /// Output directory (defaults to build.output_dir)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
        /// Run production-only stages
        #[arg(long)]
        prod: bool,
    },
    /// Update translation files with keys found in the templates
    Extract,
    /// Remove the output directory
    Clean,
    /// Validate configuration, templates and translations
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    glossa::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { output, prod } => {
            glossa::cmd::build::run(&cli.config, output.as_deref(), prod)?;
        }
        Commands::Extract => {
            glossa::cmd::extract::run(&cli.config)?;
        }
        Commands::Clean => {
            glossa::cmd::clean::run(&cli.config)?;
        }
        Commands::Check { strict } => {
            glossa::cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["glossa", "build", "--output", "site"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, std::path::PathBuf::from("glossa.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build { output, prod } => {
                assert_eq!(output, Some(std::path::PathBuf::from("site")));
                assert!(!prod);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_production() {
        let cli = Cli::parse_from(["glossa", "build", "--prod"]);

        match cli.command {
            Commands::Build { output, prod } => {
                assert!(output.is_none());
                assert!(prod);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_extract_and_clean_parsing() {
        assert!(matches!(
            Cli::parse_from(["glossa", "extract"]).command,
            Commands::Extract
        ));
        assert!(matches!(
            Cli::parse_from(["glossa", "clean"]).command,
            Commands::Clean
        ));
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let cli = Cli::parse_from(["glossa", "check", "--strict"]);

        match cli.command {
            Commands::Check { strict } => assert!(strict),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["glossa", "-vvv", "build"]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let cli = Cli::parse_from(["glossa", "--config", "site/glossa.toml", "extract"]);
        assert_eq!(cli.config, std::path::PathBuf::from("site/glossa.toml"));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["glossa"]).is_err());
    }
}
