//! Comment removal.
//!
//! [`strip`] is total: any text and any [`Language`] give a result, and text
//! without comments comes back byte-for-byte. Each call owns its own
//! [`Engine`], so files can be processed on as many threads as the caller likes.

mod engine;
mod protect;
mod rules;
mod scan;
mod structural;

pub use engine::{Engine, LineMode, LineOutput, StringKind};
pub use protect::is_protected;
pub use rules::{CommentRule, RuleKind, dialect_for, rules_for};
pub use scan::{Dialect, LineScan, QuoteState, SingleQuote, Span, classify, in_regex_literal, is_escaped};
pub use structural::{contains_emoji, is_structural};

use crate::language::Language;

/// Remove comments from `content`, choosing the grammar from a language tag.
///
/// Unrecognised tags use the default `#` grammar.
pub fn remove_comments(content: &str, tag: &str) -> String {
    strip(content, Language::from_tag(tag))
}

pub fn strip(content: &str, language: Language) -> String {
    let mut engine = Engine::new(language);
    let mut out: Vec<String> = Vec::new();

    for raw in content.split('\n') {
        let (line, cr) = match raw.strip_suffix('\r') {
            Some(line) => (line, "\r"),
            None => (raw, ""),
        };
        match engine.process_line(line) {
            LineOutput::Unchanged => out.push(raw.to_owned()),
            LineOutput::Rewritten(text) => out.push(text + cr),
            LineOutput::Dropped => {}
        }
    }

    out.join("\n")
}
