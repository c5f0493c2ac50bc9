//! Copies of original files, taken before they are overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

/// Directory under a run root that holds backups; never walked.
pub const BACKUP_DIR_NAME: &str = "bak";

/// `<root>/bak/<root dir name>_<YYYYmmdd_HHMMSS>`, one per root per run.
#[derive(Debug, Clone)]
pub struct BackupDir {
    root: PathBuf,
    dir: PathBuf,
}

impl BackupDir {
    pub fn new(root: &Path, now: DateTime<Local>) -> Self {
        let name = root
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        let dir = root
            .join(BACKUP_DIR_NAME)
            .join(format!("{name}_{}", now.format("%Y%m%d_%H%M%S")));

        Self {
            root: root.to_path_buf(),
            dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write `original` to the mirror of `file` inside the backup directory.
    pub fn save(&self, file: &Path, original: &[u8]) -> Result<PathBuf> {
        let rel = match file.strip_prefix(&self.root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => Path::new(file.file_name().context("backup target has no file name")?),
        };
        let target = self.dir.join(rel);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create backup dir {}", parent.display()))?;
        }
        fs::write(&target, original)
            .with_context(|| format!("Failed to write backup {}", target.display()))?;

        Ok(target)
    }
}
