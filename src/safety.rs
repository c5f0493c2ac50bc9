//! Decides whether a file's bytes may be rewritten at all.

use serde::Serialize;
use thiserror::Error;

/// Leading bytes searched for NUL.
pub const BINARY_SNIFF: usize = 512;

pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    pub max_bytes: u64,
    pub max_line_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("binary file")]
    Binary,
    #[error("file too large ({size} bytes, limit {limit})")]
    TooLarge { size: u64, limit: u64 },
    #[error("line {line} too long ({len} bytes, limit {limit})")]
    LineTooLong {
        line: usize,
        len: usize,
        limit: usize,
    },
}

/// NUL in the first [`BINARY_SNIFF`] bytes, or not UTF-8 at all.
pub fn is_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(BINARY_SNIFF)];
    head.contains(&0) || std::str::from_utf8(bytes).is_err()
}

/// `force` lifts the size and line limits; binary files are always refused.
pub fn check(bytes: &[u8], limits: &Limits, force: bool) -> Result<(), SkipReason> {
    if !force {
        let size = bytes.len() as u64;
        if size > limits.max_bytes {
            return Err(SkipReason::TooLarge {
                size,
                limit: limits.max_bytes,
            });
        }
    }

    if is_binary(bytes) {
        return Err(SkipReason::Binary);
    }

    if !force
        && let Some((index, line)) = bytes
            .split(|&b| b == b'\n')
            .enumerate()
            .find(|(_, line)| line.len() > limits.max_line_length)
    {
        return Err(SkipReason::LineTooLong {
            line: index + 1,
            len: line.len(),
            limit: limits.max_line_length,
        });
    }

    Ok(())
}
