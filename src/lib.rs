use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

pub mod backup;
pub mod comments;
pub mod language;
pub mod report;
pub mod resolve;
pub mod safety;

pub use crate::comments::{remove_comments, strip};
pub use crate::language::Language;

use crate::backup::{BACKUP_DIR_NAME, BackupDir};
use crate::safety::{Limits, SkipReason};

/// Configuration passed from the CLI layer (main.rs) into the core logic.
#[derive(Debug)]
pub struct Config {
    pub paths: Vec<PathBuf>,
    /// Single file given with `--file`; replaces `paths` when set.
    pub file: Option<PathBuf>,
    pub force: bool,
    pub follow_symlinks: bool,
    pub no_gitignore: bool,
    pub excludes: Vec<String>,
    pub limits: Limits,
    pub dry_run: bool,
    pub backup: bool,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from(".")],
            file: None,
            force: false,
            follow_symlinks: false,
            no_gitignore: false,
            excludes: Vec::new(),
            limits: Limits::default(),
            dry_run: false,
            backup: true,
            json: false,
        }
    }
}

/// What happened to one file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Comments were removed. `backup` is where the original went, if anywhere.
    Changed { backup: Option<PathBuf> },
    Unchanged,
    Skipped(SkipReason),
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct FileReport {
    pub display_path: String,
    pub language: Option<Language>,
    pub outcome: FileOutcome,
}

#[derive(Debug, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// Aggregated result of a run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
    pub backup_dirs: Vec<PathBuf>,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn record(&mut self, report: &FileReport) {
        let path = report.display_path.clone();
        match &report.outcome {
            FileOutcome::Changed { .. } => self.changed.push(path),
            FileOutcome::Unchanged => self.unchanged.push(path),
            FileOutcome::Skipped(reason) => self.skipped.push(SkippedFile {
                path,
                reason: reason.to_string(),
            }),
            FileOutcome::Failed(err) => self.failed.push(FailedFile {
                path,
                error: format!("{err:#}"),
            }),
        }
    }

    /// Files that reached the engine.
    pub fn processed(&self) -> usize {
        self.changed.len() + self.unchanged.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// A file queued for processing.
#[derive(Debug)]
struct Job {
    path: PathBuf,
    display_path: String,
    language: Language,
    backup: Option<usize>,
}

pub fn run_with_config(cfg: Config) -> Result<RunSummary> {
    let mut summary = RunSummary {
        dry_run: cfg.dry_run,
        ..RunSummary::default()
    };
    let now = Local::now();
    let mut backups: Vec<BackupDir> = Vec::new();
    let mut jobs: Vec<Job> = Vec::new();

    if let Some(file) = &cfg.file {
        let path = file
            .canonicalize()
            .with_context(|| format!("Cannot open {}", file.display()))?;
        let language = match eligible_language(&path, cfg.force) {
            Some(language) => language,
            None => bail!(
                "Unsupported file type: {} (use --force to process it anyway)",
                file.display()
            ),
        };
        let root = path.parent().unwrap_or(Path::new("/")).to_path_buf();
        jobs.push(Job {
            display_path: make_display_path(&root, &path),
            path,
            language,
            backup: register_backup(&cfg, &mut backups, &root, now),
        });
    } else {
        let exclude_globset = build_exclude_globset(&cfg.excludes)?;

        for raw_root in &cfg.paths {
            // Canonicalise roots so running from arbitrary working dirs is reliable.
            let canon_root = match raw_root.canonicalize() {
                Ok(p) => p,
                Err(err) => {
                    warn!(root = %raw_root.display(), %err, "skipping root");
                    summary.failed.push(FailedFile {
                        path: raw_root.display().to_string(),
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            let backup_root = if canon_root.is_file() {
                canon_root.parent().unwrap_or(Path::new("/")).to_path_buf()
            } else {
                canon_root.clone()
            };
            let backup = register_backup(&cfg, &mut backups, &backup_root, now);

            collect_jobs(
                &cfg,
                &canon_root,
                exclude_globset.clone(),
                backup,
                &mut jobs,
                &mut summary,
            );
        }
    }

    debug!(files = jobs.len(), "processing");

    let reports: Vec<FileReport> = jobs
        .par_iter()
        .map(|job| {
            let backup = job.backup.map(|i| &backups[i]);
            FileReport {
                display_path: job.display_path.clone(),
                language: Some(job.language),
                outcome: process_file(&job.path, job.language, &cfg, backup),
            }
        })
        .collect();

    for report in &reports {
        match &report.outcome {
            FileOutcome::Skipped(reason) => warn!(path = %report.display_path, %reason, "skipped"),
            FileOutcome::Failed(err) => warn!(path = %report.display_path, "failed: {err:#}"),
            _ => {}
        }
        summary.record(report);
    }

    for (job, report) in jobs.iter().zip(&reports) {
        if let (Some(i), FileOutcome::Changed { backup: Some(_) }) = (job.backup, &report.outcome) {
            let dir = backups[i].path().to_path_buf();
            if !summary.backup_dirs.contains(&dir) {
                summary.backup_dirs.push(dir);
            }
        }
    }

    if cfg.json {
        report::print_json(&summary)?;
    } else {
        report::print_reports(&reports, &summary);
    }

    Ok(summary)
}

fn eligible_language(path: &Path, force: bool) -> Option<Language> {
    if force {
        Some(resolve::resolve_forced(path))
    } else {
        resolve::resolve(path)
    }
}

fn register_backup(
    cfg: &Config,
    backups: &mut Vec<BackupDir>,
    root: &Path,
    now: chrono::DateTime<Local>,
) -> Option<usize> {
    if cfg.dry_run || !cfg.backup {
        return None;
    }
    let dir = BackupDir::new(root, now);
    if let Some(i) = backups.iter().position(|b| b.path() == dir.path()) {
        return Some(i);
    }
    backups.push(dir);
    Some(backups.len() - 1)
}

fn collect_jobs(
    cfg: &Config,
    canon_root: &Path,
    exclude_globset: Option<GlobSet>,
    backup: Option<usize>,
    jobs: &mut Vec<Job>,
    summary: &mut RunSummary,
) {
    let mut builder = WalkBuilder::new(canon_root);
    builder.follow_links(cfg.follow_symlinks).hidden(true);

    // Helps avoid edge cases where process CWD is invalid and global ignores need a base.
    builder.current_dir(canon_root.to_path_buf());

    if cfg.no_gitignore {
        builder
            .git_ignore(false)
            .git_exclude(false)
            .git_global(false)
            .ignore(false);
    } else {
        builder
            .git_ignore(true)
            .git_exclude(true)
            .git_global(true)
            .ignore(true)
            .require_git(false);
    }

    let root_for_filter = canon_root.to_path_buf();

    builder.filter_entry(move |entry: &DirEntry| {
        // Always keep the root.
        if entry.depth() == 0 {
            return true;
        }

        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        if is_dir && entry.depth() == 1 && entry.file_name() == BACKUP_DIR_NAME {
            return false;
        }

        // Apply user exclude globs, relative to the current root.
        if let Some(ref gs) = exclude_globset {
            let path = entry.path();
            let rel = path.strip_prefix(&root_for_filter).unwrap_or(path);
            let rel_norm = normalize_for_matching(rel);

            if gs.is_match(&rel_norm) {
                return false;
            }

            // If this is a directory, also try a trailing slash to make patterns
            // like `tests/**` able to prune the whole subtree early.
            if is_dir && !rel_norm.ends_with('/') {
                let rel_dir = format!("{rel_norm}/");
                if gs.is_match(&rel_dir) {
                    return false;
                }
            }
        }

        true
    });

    for result in builder.build() {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "walk error");
                summary.failed.push(FailedFile {
                    path: canon_root.display().to_string(),
                    error: err.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let language = match eligible_language(path, cfg.force) {
            Some(language) => language,
            None => {
                debug!(path = %path.display(), "unsupported file type");
                continue;
            }
        };

        jobs.push(Job {
            path: path.to_path_buf(),
            display_path: make_display_path(canon_root, path),
            language,
            backup,
        });
    }
}

/// Strip one file in place. Never panics and never aborts the run.
pub fn process_file(
    path: &Path,
    language: Language,
    cfg: &Config,
    backup: Option<&BackupDir>,
) -> FileOutcome {
    match rewrite_file(path, language, cfg, backup) {
        Ok(outcome) => outcome,
        Err(err) => FileOutcome::Failed(err),
    }
}

fn rewrite_file(
    path: &Path,
    language: Language,
    cfg: &Config,
    backup: Option<&BackupDir>,
) -> Result<FileOutcome> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if let Err(reason) = safety::check(&bytes, &cfg.limits, cfg.force) {
        return Ok(FileOutcome::Skipped(reason));
    }
    let Ok(text) = std::str::from_utf8(&bytes) else {
        return Ok(FileOutcome::Skipped(SkipReason::Binary));
    };

    let stripped = strip(text, language);
    if stripped == text {
        debug!(path = %path.display(), %language, "no comments");
        return Ok(FileOutcome::Unchanged);
    }

    if cfg.dry_run {
        return Ok(FileOutcome::Changed { backup: None });
    }

    let saved = backup.map(|b| b.save(path, &bytes)).transpose()?;
    fs::write(path, stripped).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), %language, "comments removed");

    Ok(FileOutcome::Changed { backup: saved })
}

/// Build a GlobSet from the user–provided `--exclude` patterns.
/// Returns `Ok(None)` if there are no patterns.
fn build_exclude_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();

    for pat in patterns {
        let pat = pat.trim();
        if pat.is_empty() {
            continue;
        }

        let glob =
            Glob::new(pat).with_context(|| format!("Invalid --exclude glob pattern: {pat}"))?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .context("Failed to build exclude glob set")?;

    Ok(Some(set))
}

/// Produce a display path relative to `root` (stable regardless of current working directory).
pub fn make_display_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);

    // If root is a file and path == root, rel is empty.
    if rel.as_os_str().is_empty() {
        return path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
    }

    normalize_for_matching(rel)
}

/// Convert paths to a stable, slash-separated form for matching/printing.
fn normalize_for_matching(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_path_is_relative_to_root() {
        let root = Path::new("/work/repo");
        assert_eq!(make_display_path(root, Path::new("/work/repo/src/a.rs")), "src/a.rs");
        assert_eq!(make_display_path(Path::new("/work/a.rs"), Path::new("/work/a.rs")), "a.rs");
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = RunSummary::default();
        for (name, outcome) in [
            ("a.py", FileOutcome::Changed { backup: None }),
            ("b.py", FileOutcome::Unchanged),
            ("c.bin", FileOutcome::Skipped(SkipReason::Binary)),
            ("d.py", FileOutcome::Failed(anyhow::anyhow!("denied"))),
        ] {
            summary.record(&FileReport {
                display_path: name.to_string(),
                language: Some(Language::Python),
                outcome,
            });
        }

        assert_eq!(summary.processed(), 2);
        assert_eq!(summary.skipped[0].reason, "binary file");
        assert_eq!(summary.failed[0].error, "denied");
        assert!(summary.has_failures());
    }

    #[test]
    fn process_file_rewrites_and_backs_up() -> Result<()> {
        let temp = assert_fs::TempDir::new()?;
        let file = temp.child("app.py");
        file.write_str("x = 1  # set x\n")?;
        let backup = BackupDir::new(temp.path(), Local::now());

        let outcome = process_file(file.path(), Language::Python, &Config::default(), Some(&backup));

        let saved = match outcome {
            FileOutcome::Changed { backup: Some(saved) } => saved,
            other => panic!("expected a change with a backup, got {other:?}"),
        };
        assert_eq!(fs::read_to_string(file.path())?, "x = 1\n");
        assert_eq!(fs::read_to_string(saved)?, "x = 1  # set x\n");
        Ok(())
    }

    #[test]
    fn process_file_leaves_clean_files_alone() -> Result<()> {
        let temp = assert_fs::TempDir::new()?;
        let file = temp.child("clean.rs");
        file.write_str("fn main() {}\n")?;
        let backup = BackupDir::new(temp.path(), Local::now());

        let outcome = process_file(file.path(), Language::Rust, &Config::default(), Some(&backup));

        assert!(matches!(outcome, FileOutcome::Unchanged));
        assert!(!backup.path().exists());
        Ok(())
    }

    #[test]
    fn dry_run_writes_nothing() -> Result<()> {
        let temp = assert_fs::TempDir::new()?;
        let file = temp.child("a.sh");
        file.write_str("echo hi # greet\n")?;
        let cfg = Config {
            dry_run: true,
            ..Config::default()
        };

        let outcome = process_file(file.path(), Language::Shell, &cfg, None);

        assert!(matches!(outcome, FileOutcome::Changed { backup: None }));
        assert_eq!(fs::read_to_string(file.path())?, "echo hi # greet\n");
        Ok(())
    }

    #[test]
    fn binary_file_is_skipped() -> Result<()> {
        let temp = assert_fs::TempDir::new()?;
        let file = temp.child("blob.c");
        file.write_binary(b"int\0x;")?;

        let outcome = process_file(file.path(), Language::C, &Config::default(), None);

        assert!(matches!(outcome, FileOutcome::Skipped(SkipReason::Binary)));
        Ok(())
    }

    #[test]
    fn missing_file_is_a_failure_not_a_panic() {
        let outcome = process_file(
            Path::new("/definitely/missing.py"),
            Language::Python,
            &Config::default(),
            None,
        );
        assert!(matches!(outcome, FileOutcome::Failed(_)));
    }
}
