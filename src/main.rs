use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{ArgAction, Parser};
use nocomment::safety::{DEFAULT_MAX_BYTES, DEFAULT_MAX_LINE_LENGTH, Limits};
use nocomment::{Config, run_with_config};
use tracing_subscriber::EnvFilter;

/// nocomment - strip comments from source files.
///
/// Walks the given paths and removes line and block comments in place, leaving
/// strings, regex literals, shell expansions and similar look-alikes alone.
#[derive(Parser, Debug)]
#[command(
    name = "nocomment",
    author,
    version,
    about = "Strip comments from source files in place, keeping a timestamped backup",
    long_about = r#"Strip comments from source files in place, keeping a timestamped backup.

By default it:
  • respects .gitignore / .ignore / git exclude files
  • skips hidden files and the bak/ directory
  • copies every changed file to bak/<dir>_<timestamp>/ before rewriting it
  • leaves binary, oversized and unsupported files alone

Typical usage:
  nocomment
  nocomment src tests --exclude 'vendor/**'
  nocomment -f scripts/deploy.sh --dry-run
"#
)]
struct Args {
    /// Paths to process (files or directories). Defaults to current directory.
    #[arg(value_name = "PATH", default_value = ".")]
    paths: Vec<PathBuf>,

    /// Process a single file instead of walking PATHs.
    ///
    /// Unsupported file types are an error unless --force is given.
    #[arg(short = 'f', long = "file", value_name = "FILE", conflicts_with = "paths")]
    file: Option<PathBuf>,

    /// Treat every file as supported and lift the size and line-length limits.
    ///
    /// Binary files are still skipped. Files with unknown extensions use `#`
    /// line comments.
    #[arg(long = "force")]
    force: bool,

    /// Additional glob patterns to exclude (files or directories).
    ///
    /// Patterns are evaluated relative to each PATH root, e.g.:
    ///
    ///   nocomment --exclude 'migrations/**'
    ///   nocomment --exclude 'tests/**,*.gen.py'
    #[arg(
        long = "exclude",
        short = 'E',
        value_name = "GLOB",
        action = ArgAction::Append,
        value_delimiter = ','
    )]
    excludes: Vec<String>,

    /// Disable reading .gitignore / .ignore / git exclude files.
    #[arg(long = "no-gitignore")]
    no_gitignore: bool,

    /// Follow symbolic links during traversal.
    #[arg(long = "follow-symlinks")]
    follow_symlinks: bool,

    /// Skip files larger than this many bytes.
    #[arg(long = "max-bytes", value_name = "N", default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: u64,

    /// Skip files with a line longer than this many bytes.
    #[arg(long = "max-line-length", value_name = "N", default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    max_line_length: usize,

    /// Report what would change without writing anything.
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Rewrite files without keeping a backup copy.
    #[arg(long = "no-backup")]
    no_backup: bool,

    /// Print the run summary as JSON.
    #[arg(long = "json")]
    json: bool,

    /// Log per-file decisions to stderr (RUST_LOG overrides).
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cfg = Config {
        paths: args.paths,
        file: args.file,
        force: args.force,
        follow_symlinks: args.follow_symlinks,
        no_gitignore: args.no_gitignore,
        excludes: args.excludes,
        limits: Limits {
            max_bytes: args.max_bytes,
            max_line_length: args.max_line_length,
        },
        dry_run: args.dry_run,
        backup: !args.no_backup,
        json: args.json,
    };

    let summary = run_with_config(cfg)?;
    if summary.has_failures() {
        bail!(
            "{} file(s) could not be processed. See stderr for details.",
            summary.failed.len()
        );
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
