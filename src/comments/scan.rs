//! Single-pass lexical classification of one line.
//!
//! [`LineScan`] walks a line once and records, for every byte offset, which
//! span (code, string, regex literal) that byte is read in. Everything that
//! needs to ask "is position `p` inside a string?" reads that table instead of
//! re-walking the prefix, which keeps a whole line linear no matter how many
//! candidate comment tokens it contains.

use std::iter::repeat_n;

/// How a language treats `'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleQuote {
    /// `'` is an ordinary character (Lisp quote, Ada attribute tick).
    Off,
    /// `'...'` is a string.
    String,
    /// `'x'` is a character literal; any other `'` (Rust lifetimes, OCaml
    /// type variables, Haskell primes) is code.
    CharLiteral,
}

/// Which string-like constructs a language has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub single: SingleQuote,
    pub double: bool,
    pub backtick: bool,
    pub backtick_escapes: bool,
    /// An unterminated backtick string continues on the next line.
    pub multiline_backtick: bool,
    /// Rust raw strings: `r"..."`, `br"..."`, `r#"..."#`.
    pub raw_prefix: bool,
    /// JavaScript-style `/regex/` literals.
    pub regex: bool,
    pub triple_double: bool,
    pub triple_single: bool,
}

impl Dialect {
    /// Single, double and backtick quotes with backslash escapes.
    pub const PLAIN: Dialect = Dialect {
        single: SingleQuote::String,
        double: true,
        backtick: true,
        backtick_escapes: true,
        multiline_backtick: false,
        raw_prefix: false,
        regex: false,
        triple_double: false,
        triple_single: false,
    };
}

/// Lexical context a byte is read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    Code,
    Single,
    Double,
    Backtick,
    TripleDouble,
    TripleSingle,
    Regex,
    /// Raw string closed by `"` plus this many `#`.
    Raw(usize),
}

impl Span {
    fn escapes(self, dialect: Dialect) -> bool {
        match self {
            Span::Code | Span::Raw(_) => false,
            Span::Backtick => dialect.backtick_escapes,
            _ => true,
        }
    }

    /// Width of the closing delimiter starting at `i`, if there is one.
    fn closes_at(self, bytes: &[u8], i: usize) -> Option<usize> {
        let rest = &bytes[i..];
        let width = match self {
            Span::Code => return None,
            Span::Single if rest[0] == b'\'' => 1,
            Span::Double if rest[0] == b'"' => 1,
            Span::Backtick if rest[0] == b'`' => 1,
            Span::Regex if rest[0] == b'/' => 1,
            Span::TripleDouble if rest.starts_with(b"\"\"\"") => 3,
            Span::TripleSingle if rest.starts_with(b"'''") => 3,
            Span::Raw(hashes)
                if rest[0] == b'"'
                    && rest.len() > hashes
                    && rest[1..=hashes].iter().all(|&b| b == b'#') =>
            {
                1 + hashes
            }
            _ => return None,
        };
        Some(width)
    }
}

/// Resumable left-to-right scanner over one line.
///
/// [`LineScan`] drives it over a whole line; the rewrite engine drives it
/// directly so it can jump over a removed block comment and keep going in
/// code without scanning the line again.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    line: &'a str,
    dialect: Dialect,
    span: Span,
    pos: usize,
    /// Last non-blank code byte, for the regex heuristic.
    prev_significant: Option<u8>,
    /// Length of the backslash run ending at `pos`, counted in code only.
    backslashes: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str, dialect: Dialect) -> Self {
        Self {
            line,
            dialect,
            span: Span::Code,
            pos: 0,
            prev_significant: None,
            backslashes: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Span the byte at `pos` will be read in, or the span left open at end of line.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Consume the next byte, or the whole delimiter or escape starting at it.
    /// Returns the number of bytes consumed.
    pub fn advance(&mut self) -> usize {
        let bytes = self.line.as_bytes();
        let i = self.pos;

        if self.span == Span::Code {
            let escaped = self.backslashes % 2 == 1;
            if !escaped
                && let Some((width, opened)) =
                    opening(self.line, i, self.dialect, self.prev_significant)
            {
                self.span = opened;
                self.backslashes = 0;
                self.pos += width;
                return width;
            }
            let b = bytes[i];
            if !b.is_ascii_whitespace() {
                self.prev_significant = Some(b);
            }
            self.backslashes = if b == b'\\' { self.backslashes + 1 } else { 0 };
            self.pos += 1;
            return 1;
        }

        let width = if bytes[i] == b'\\' && self.span.escapes(self.dialect) {
            (bytes.len() - i).min(2)
        } else if let Some(width) = self.span.closes_at(bytes, i) {
            self.prev_significant = Some(bytes[i + width - 1]);
            self.span = Span::Code;
            width
        } else {
            1
        };
        self.pos += width;
        width
    }

    /// Continue in code at `pos`, skipping everything in between. The
    /// skipped bytes do not count as code for the regex heuristic.
    pub fn skip_to(&mut self, pos: usize) {
        self.pos = pos.min(self.line.len());
        self.span = Span::Code;
        self.backslashes = 0;
    }
}

/// Per-byte span table for one line.
#[derive(Debug, Clone)]
pub struct LineScan {
    /// `spans[j]` is the span byte `j` is read in; the final entry is the
    /// span still open at end of line.
    spans: Vec<Span>,
}

impl LineScan {
    pub fn new(line: &str, dialect: Dialect) -> Self {
        let mut spans = Vec::with_capacity(line.len() + 1);
        let mut cursor = Cursor::new(line, dialect);

        while !cursor.at_end() {
            let before = cursor.span();
            let width = cursor.advance();
            let after = cursor.span();
            if before == Span::Code && after != Span::Code {
                // The opening delimiter's first byte is still code.
                spans.push(Span::Code);
                spans.extend(repeat_n(after, width - 1));
            } else {
                spans.extend(repeat_n(before, width));
            }
        }

        spans.push(cursor.span());
        Self { spans }
    }

    /// Span at byte `pos`; positions past the end report the end-of-line span.
    pub fn span_at(&self, pos: usize) -> Span {
        self.spans[pos.min(self.spans.len() - 1)]
    }

    pub fn is_code(&self, pos: usize) -> bool {
        self.span_at(pos) == Span::Code
    }

    /// Span still open after the last byte.
    pub fn end(&self) -> Span {
        self.spans[self.spans.len() - 1]
    }

    pub fn quote_state(&self, pos: usize) -> QuoteState {
        let span = self.span_at(pos);
        QuoteState {
            in_single_quote: matches!(span, Span::Single | Span::TripleSingle),
            in_double_quote: matches!(span, Span::Double | Span::TripleDouble | Span::Raw(_)),
            in_backtick: span == Span::Backtick,
        }
    }
}

fn opening(line: &str, i: usize, dialect: Dialect, prev: Option<u8>) -> Option<(usize, Span)> {
    let bytes = line.as_bytes();
    let rest = &bytes[i..];

    if dialect.raw_prefix
        && let Some((width, hashes)) = raw_string_open(bytes, i)
    {
        return Some((width, Span::Raw(hashes)));
    }

    match rest[0] {
        b'"' if dialect.triple_double && rest.starts_with(b"\"\"\"") => {
            Some((3, Span::TripleDouble))
        }
        b'\'' if dialect.triple_single && rest.starts_with(b"'''") => {
            Some((3, Span::TripleSingle))
        }
        b'"' if dialect.double => Some((1, Span::Double)),
        b'\'' => match dialect.single {
            SingleQuote::Off => None,
            SingleQuote::String => Some((1, Span::Single)),
            SingleQuote::CharLiteral => is_char_literal(line, i).then_some((1, Span::Single)),
        },
        b'`' if dialect.backtick => Some((1, Span::Backtick)),
        b'/' if dialect.regex && regex_can_start(bytes, i, prev) => Some((1, Span::Regex)),
        _ => None,
    }
}

/// `r"`, `br"`, `r#"`: returns the prefix width (quote included) and the
/// number of hashes.
fn raw_string_open(bytes: &[u8], i: usize) -> Option<(usize, usize)> {
    if i > 0 && is_ident_byte(bytes[i - 1]) {
        return None;
    }
    let mut j = i;
    if bytes[j] == b'b' {
        j += 1;
    }
    if bytes.get(j) != Some(&b'r') {
        return None;
    }
    j += 1;
    let hashes = bytes[j..].iter().take_while(|&&b| b == b'#').count();
    j += hashes;
    (bytes.get(j) == Some(&b'"')).then_some((j + 1 - i, hashes))
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `'x'`, `'中'`, `'\n'`, `'\u{1F600}'`.
fn is_char_literal(line: &str, i: usize) -> bool {
    let rest = &line[i + 1..];
    let mut chars = rest.chars();
    match chars.next() {
        Some('\\') => {
            let tail = &rest.as_bytes()[rest.len().min(2)..];
            tail.iter().take(10).any(|&b| b == b'\'')
        }
        Some(c) => rest[c.len_utf8()..].starts_with('\''),
        None => false,
    }
}

fn regex_can_start(bytes: &[u8], i: usize, prev: Option<u8>) -> bool {
    if matches!(bytes.get(i + 1), Some(b'/' | b'*')) {
        return false;
    }
    match prev {
        None => true,
        Some(p) => b"=(,:[{;".contains(&p),
    }
}

/// Byte offset just past the delimiter that closes `span`, for a line that
/// starts inside it.
pub fn find_close(line: &str, span: Span, dialect: Dialect) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && span.escapes(dialect) {
            i += 2;
            continue;
        }
        if let Some(width) = span.closes_at(bytes, i) {
            return Some(i + width);
        }
        i += 1;
    }
    None
}

/// Which quote kinds are open at a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteState {
    pub in_single_quote: bool,
    pub in_double_quote: bool,
    pub in_backtick: bool,
}

impl QuoteState {
    pub fn in_any(self) -> bool {
        self.in_single_quote || self.in_double_quote || self.in_backtick
    }
}

/// Quote state at `pos` using plain single/double/backtick rules.
pub fn classify(line: &str, pos: usize) -> QuoteState {
    LineScan::new(line, Dialect::PLAIN).quote_state(pos)
}

/// True when `pos` is preceded by an odd run of backslashes.
pub fn is_escaped(line: &str, pos: usize) -> bool {
    let bytes = line.as_bytes();
    let end = pos.min(bytes.len());
    let run = bytes[..end].iter().rev().take_while(|&&b| b == b'\\').count();
    run % 2 == 1
}

/// True when `pos` falls inside a `/regex/` literal.
pub fn in_regex_literal(line: &str, pos: usize) -> bool {
    let dialect = Dialect {
        regex: true,
        ..Dialect::PLAIN
    };
    LineScan::new(line, dialect).span_at(pos) == Span::Regex
}
