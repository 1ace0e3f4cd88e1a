//! Static asset copying.
//!
//! Public files land in the output root and fonts under `<output>/fonts`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copies a directory tree of static files, skipping hidden entries.
#[derive(Debug, Default)]
pub struct AssetProcessor;

impl AssetProcessor {
    /// Create a new asset processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Copy every file of `source_dir` into `dest_dir`, keeping relative paths.
    /// Returns the number of copied files. A missing source copies nothing.
    pub fn process(&self, source_dir: &Path, dest_dir: &Path) -> Result<usize> {
        if !source_dir.is_dir() {
            debug!(source = %source_dir.display(), "asset directory does not exist, skipping");
            return Ok(0);
        }

        info!(
            source = %source_dir.display(),
            dest = %dest_dir.display(),
            "processing assets"
        );

        let mut count = 0;
        let walker = WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;
            let dest_path = dest_dir.join(relative);
            Self::copy_file(entry.path(), &dest_path)?;

            debug!(
                src = %entry.path().display(),
                dest = %dest_path.display(),
                "copied asset"
            );
            count += 1;
        }

        info!(count, "assets processed");
        Ok(count)
    }

    /// Copy a single file, creating parent directories.
    pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, dest)?;
        Ok(())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_process_assets() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let mut css_file = fs::File::create(source.path().join("style.css")).unwrap();
        css_file.write_all(b"body { color: red; }").unwrap();
        fs::create_dir_all(source.path().join("img")).unwrap();
        fs::write(source.path().join("img/logo.svg"), "<svg/>").unwrap();

        let count = AssetProcessor::new()
            .process(source.path(), dest.path())
            .unwrap();

        assert_eq!(count, 2);
        assert!(dest.path().join("style.css").exists());
        assert!(dest.path().join("img/logo.svg").exists());
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        fs::write(source.path().join(".DS_Store"), "").unwrap();
        fs::create_dir_all(source.path().join(".git")).unwrap();
        fs::write(source.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(source.path().join("robots.txt"), "User-agent: *").unwrap();

        let count = AssetProcessor::new()
            .process(source.path(), dest.path())
            .unwrap();

        assert_eq!(count, 1);
        assert!(!dest.path().join(".DS_Store").exists());
        assert!(!dest.path().join(".git").exists());
    }

    #[test]
    fn test_missing_source_is_empty() {
        let dest = TempDir::new().unwrap();
        let count = AssetProcessor::new()
            .process(&dest.path().join("nope"), dest.path())
            .unwrap();
        assert_eq!(count, 0);
    }
}
