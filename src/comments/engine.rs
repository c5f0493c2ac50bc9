//! Cross-line state machine and the per-line rewrite.

use std::sync::LazyLock;

use regex::Regex;

use crate::comments::protect::LineContext;
use crate::comments::rules::{CommentRule, RuleKind, dialect_for, rules_for};
use crate::comments::scan::{Cursor, Dialect, Span, find_close};
use crate::language::Language;

/// `key: |`, `- >-`, `key: |2+` at end of line.
static YAML_BLOCK_SCALAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:\-]\s+[|>][1-9]?[+-]?[1-9]?\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    TripleDouble,
    TripleSingle,
    Template,
}

impl StringKind {
    fn span(self) -> Span {
        match self {
            StringKind::TripleDouble => Span::TripleDouble,
            StringKind::TripleSingle => Span::TripleSingle,
            StringKind::Template => Span::Backtick,
        }
    }
}

/// What the previous lines left open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineMode {
    #[default]
    Normal,
    BlockComment {
        end: &'static str,
    },
    MultilineString(StringKind),
    YamlBlockScalar {
        indent: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutput {
    /// Emit the input line as-is.
    Unchanged,
    Rewritten(String),
    /// The line held only comment text.
    Dropped,
}

/// Rewrites one file's lines in order. Create one per file.
#[derive(Debug)]
pub struct Engine {
    language: Language,
    rules: &'static [CommentRule],
    dialect: Dialect,
    mode: LineMode,
}

impl Engine {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            rules: rules_for(language),
            dialect: dialect_for(language),
            mode: LineMode::Normal,
        }
    }

    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Process one line, without its line terminator.
    pub fn process_line(&mut self, line: &str) -> LineOutput {
        match self.mode {
            LineMode::Normal => self.normal_line(line),
            LineMode::BlockComment { end } => self.block_comment_line(line, end),
            LineMode::MultilineString(kind) => self.string_line(line, kind),
            LineMode::YamlBlockScalar { indent } => {
                if line.trim().is_empty() || indentation(line) > indent {
                    return LineOutput::Unchanged;
                }
                self.mode = LineMode::Normal;
                self.normal_line(line)
            }
        }
    }

    fn normal_line(&mut self, line: &str) -> LineOutput {
        if line.trim().is_empty() {
            return LineOutput::Unchanged;
        }
        let rewritten = self.rewrite_code(line);
        self.enter_block_scalar(line, &rewritten);
        finish(line, rewritten)
    }

    fn block_comment_line(&mut self, line: &str, end: &'static str) -> LineOutput {
        let Some(at) = line.find(end) else {
            return LineOutput::Dropped;
        };
        self.mode = LineMode::Normal;
        let rest = self.rewrite_code(&line[at + end.len()..]);
        self.enter_block_scalar(line, &rest);
        match finish("", rest) {
            LineOutput::Unchanged => LineOutput::Dropped,
            output => output,
        }
    }

    fn string_line(&mut self, line: &str, kind: StringKind) -> LineOutput {
        let Some(close) = find_close(line, kind.span(), self.dialect) else {
            return LineOutput::Unchanged;
        };
        self.mode = LineMode::Normal;
        let (head, tail) = line.split_at(close);
        let rest = self.rewrite_code(tail);
        if rest == tail {
            return LineOutput::Unchanged;
        }
        finish(line, format!("{head}{rest}"))
    }

    fn enter_block_scalar(&mut self, line: &str, rewritten: &str) {
        if self.language != Language::Yaml || self.mode != LineMode::Normal {
            return;
        }
        if !rewritten.trim_start().starts_with('#') && YAML_BLOCK_SCALAR.is_match(rewritten) {
            self.mode = LineMode::YamlBlockScalar {
                indent: indentation(line),
            };
        }
    }

    /// Strip every comment from a line that starts in code, and set the mode
    /// the line leaves open. One left-to-right pass: after a block comment the
    /// scanner resumes in code just past its end token.
    fn rewrite_code(&mut self, line: &str) -> String {
        let cx = LineContext::new(line, self.language);
        let mut cursor = Cursor::new(line, self.dialect);
        let mut out = String::with_capacity(line.len());
        let mut kept_from = 0;

        while !cursor.at_end() {
            let pos = cursor.pos();
            let found = if cursor.span() == Span::Code {
                self.comment_at(line, pos, &cx)
            } else {
                None
            };
            let Some(rule) = found else {
                cursor.advance();
                continue;
            };

            out.push_str(&line[kept_from..pos]);
            if rule.kind == RuleKind::Line {
                self.mode = LineMode::Normal;
                return out;
            }

            let body = pos + rule.start.len();
            let Some(offset) = line[body..].find(rule.end) else {
                self.mode = LineMode::BlockComment { end: rule.end };
                return out;
            };
            let after = body + offset + rule.end.len();
            if self.fuses(out.as_bytes().last(), line.as_bytes().get(after)) {
                out.push(' ');
            }
            kept_from = after;
            cursor.skip_to(after);
        }

        out.push_str(&line[kept_from..]);
        self.mode = self.mode_after(cursor.span());
        out
    }

    /// The first rule, in declaration order, whose unprotected start token
    /// begins at `pos`.
    fn comment_at(&self, line: &str, pos: usize, cx: &LineContext) -> Option<&'static CommentRule> {
        let rest = &line.as_bytes()[pos..];
        self.rules
            .iter()
            .find(|rule| rest.starts_with(rule.start.as_bytes()) && !cx.protects(pos, rule.start))
    }

    /// Removing a comment between `before` and `after` would glue two
    /// non-blank bytes together.
    fn fuses(&self, before: Option<&u8>, after: Option<&u8>) -> bool {
        if matches!(self.language, Language::Html | Language::Markdown) {
            return false;
        }
        matches!((before, after), (Some(b), Some(a)) if !b.is_ascii_whitespace() && !a.is_ascii_whitespace())
    }

    fn mode_after(&self, end: Span) -> LineMode {
        match end {
            Span::TripleDouble => LineMode::MultilineString(StringKind::TripleDouble),
            Span::TripleSingle => LineMode::MultilineString(StringKind::TripleSingle),
            Span::Backtick if self.dialect.multiline_backtick => {
                LineMode::MultilineString(StringKind::Template)
            }
            _ => LineMode::Normal,
        }
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn finish(original: &str, rewritten: String) -> LineOutput {
    if rewritten == original {
        return LineOutput::Unchanged;
    }
    let trimmed = rewritten.trim_end_matches([' ', '\t']);
    if trimmed.trim().is_empty() {
        LineOutput::Dropped
    } else {
        LineOutput::Rewritten(trimmed.to_owned())
    }
}
