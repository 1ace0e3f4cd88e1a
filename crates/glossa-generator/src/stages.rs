//! External build stages such as stylesheet compilers, font subsetters and
//! minifiers.

use std::{
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use glossa_core::config::{Config, StageConfig, StagePhase};
use thiserror::Error;
use tracing::{debug, info};

/// External stage errors.
#[derive(Debug, Error)]
pub enum StageError {
    /// The program could not be started.
    #[error("failed to start stage `{name}` ({program}): {source}")]
    Spawn {
        name: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("stage `{name}` failed with {status}")]
    Failed { name: String, status: ExitStatus },
}

/// Result type for stage operations.
pub type Result<T> = std::result::Result<T, StageError>;

/// Runs configured stages from the site root.
#[derive(Debug, Clone)]
pub struct StageRunner {
    root: PathBuf,
    output_dir: PathBuf,
}

impl StageRunner {
    /// Create a runner for a site rooted at `root` building into `output_dir`.
    pub fn new(root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Arguments of `stage` with `{output}` and `{root}` substituted.
    #[must_use]
    pub fn expand_args(&self, stage: &StageConfig) -> Vec<String> {
        let output = self.output_dir.to_string_lossy();
        let root = self.root.to_string_lossy();
        stage
            .args
            .iter()
            .map(|arg| arg.replace("{output}", &output).replace("{root}", &root))
            .collect()
    }

    /// Run one stage to completion.
    pub fn run(&self, stage: &StageConfig) -> Result<()> {
        let args = self.expand_args(stage);
        debug!(stage = %stage.name, program = %stage.program, ?args, "running stage");

        let status = Command::new(&stage.program)
            .args(&args)
            .current_dir(&self.root)
            .status()
            .map_err(|source| StageError::Spawn {
                name: stage.name.clone(),
                program: stage.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(StageError::Failed {
                name: stage.name.clone(),
                status,
            });
        }

        info!(stage = %stage.name, "stage finished");
        Ok(())
    }

    /// Run every stage of `phase` in declaration order. Returns how many ran.
    pub fn run_phase(&self, config: &Config, phase: StagePhase) -> Result<usize> {
        let mut count = 0;
        for stage in config.stages(phase) {
            self.run(stage)?;
            count += 1;
        }
        Ok(count)
    }

    /// Site root the stages run in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
