//! Language-specific vetoes for comment candidates.
//!
//! A candidate reaching these checks already sits in code according to the
//! line scanner. The rules here catch the tokens a lexer without a grammar
//! cannot tell apart: `${VAR#prefix}`, `$#`, `#fff`, `{$IFDEF}`, `-->` in
//! Haskell, and so on. When a rule cannot decide it does not protect.

use std::cell::{OnceCell, Ref, RefCell};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::comments::rules::dialect_for;
use crate::comments::scan::{LineScan, is_escaped};
use crate::comments::structural::is_structural;
use crate::language::Language;

static CONTROL_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:if|for|while)\s*\(").unwrap());

static MACRO_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*!\s*[(\[{]").unwrap());

const HASKELL_OPERATOR: &[u8] = b"!#$%&*+./<=>?@\\^|~:";

/// Whether the comment candidate `token` at byte `pos` of `line` must be kept.
pub fn is_protected(line: &str, pos: usize, language: Language, token: &str) -> bool {
    let scan = LineScan::new(line, dialect_for(language));
    !scan.is_code(pos) || LineContext::new(line, language).protects(pos, token)
}

/// Per-line answers shared by every candidate on the line.
///
/// Each fact is computed on first use and then looked up by position, so a
/// line full of candidates is not re-read once per candidate.
#[derive(Debug)]
pub(crate) struct LineContext<'a> {
    line: &'a str,
    language: Language,
    headers: OnceCell<Vec<Range<usize>>>,
    macros: OnceCell<Vec<Range<usize>>>,
    found: RefCell<HashMap<&'static str, Vec<usize>>>,
}

impl<'a> LineContext<'a> {
    pub(crate) fn new(line: &'a str, language: Language) -> Self {
        Self {
            line,
            language,
            headers: OnceCell::new(),
            macros: OnceCell::new(),
            found: RefCell::new(HashMap::new()),
        }
    }

    /// Whether the candidate `token` at `pos`, already known to be in code,
    /// must be kept.
    pub(crate) fn protects(&self, pos: usize, token: &str) -> bool {
        let site = Site { cx: self, pos, token };
        if token == "#" && site.is_shebang() && has_shebang(self.language) {
            return true;
        }

        use Language::*;
        match self.language {
            Yaml => yaml(&site),
            Shell | Perl => shell(&site),
            Python => python(&site),
            Php => c_family(&site) || php_hash(&site),
            C | Java | Swift | Dart | JavaScript | TypeScript | Go | Rust | Json | Verilog => {
                c_family(&site)
            }
            Css | Scss => css(&site),
            Html | Markdown => token == "<!--" && self.unclosed_before("<![CDATA[", "]]>", pos),
            Haskell => token == "--" && site.next_byte().is_some_and(|b| HASKELL_OPERATOR.contains(&b)),
            Latex => is_escaped(self.line, pos),
            Fortran => matches!(token, "C" | "c" | "*") && pos != 0,
            Batch => batch(&site),
            Pascal => token == "{" && site.next_byte() == Some(b'$'),
            Assembly => {
                token == "#" && site.next_byte().is_some_and(|b| b.is_ascii_digit() || b"-$:".contains(&b))
            }
            Erlang => site.prev_byte() == Some(b'$'),
            Lisp => site.prev_byte() == Some(b'\\'),
            CoffeeScript => token == "###" && site.next_byte() == Some(b'#'),
            Ruby | R | Tcl | PowerShell | Julia | Hash | Toml | Hcl | Sql | Lua | Ada | Vhdl
            | OCaml | FSharp | Matlab | Prolog | FortranFree | Cobol | Rst | Unknown => false,
        }
    }

    /// Start offsets of the non-overlapping occurrences of `needle`.
    fn positions(&self, needle: &'static str) -> Ref<'_, Vec<usize>> {
        if !self.found.borrow().contains_key(needle) {
            let hits = self.line.match_indices(needle).map(|(at, _)| at).collect();
            self.found.borrow_mut().insert(needle, hits);
        }
        Ref::map(self.found.borrow(), |found| &found[needle])
    }

    /// `needle` occurs wholly inside `line[..pos]`.
    fn seen_before(&self, needle: &'static str, pos: usize) -> bool {
        self.positions(needle)
            .first()
            .is_some_and(|&at| at + needle.len() <= pos)
    }

    fn count_before(&self, needle: &'static str, pos: usize) -> usize {
        self.positions(needle)
            .partition_point(|&at| at + needle.len() <= pos)
    }

    /// `needle` occurs wholly inside `line[from..to]`.
    fn seen_between(&self, needle: &'static str, from: usize, to: usize) -> bool {
        let hits = self.positions(needle);
        let first = hits.partition_point(|&at| at < from);
        hits.get(first).is_some_and(|&at| at + needle.len() <= to)
    }

    /// The last `open` in `line[..pos]` has no `close` after it, still before `pos`.
    fn unclosed_before(&self, open: &'static str, close: &'static str, pos: usize) -> bool {
        let opens = self.count_before(open, pos);
        if opens == 0 {
            return false;
        }
        let after_open = self.positions(open)[opens - 1] + open.len();
        !self.seen_between(close, after_open, pos)
    }

    fn headers(&self) -> &[Range<usize>] {
        self.headers
            .get_or_init(|| CONTROL_HEADER.find_iter(self.line).map(|m| m.range()).collect())
    }

    fn macros(&self) -> &[Range<usize>] {
        self.macros
            .get_or_init(|| MACRO_CALL.find_iter(self.line).map(|m| m.range()).collect())
    }
}

/// Last match ending at or before `pos`.
fn last_before(matches: &[Range<usize>], pos: usize) -> Option<&Range<usize>> {
    let n = matches.partition_point(|m| m.end <= pos);
    n.checked_sub(1).map(|i| &matches[i])
}

fn has_shebang(language: Language) -> bool {
    use Language::*;
    matches!(
        language,
        Shell | Python | Ruby | Perl | R | Tcl | Php | Julia | Hash | Unknown
    )
}

struct Site<'s> {
    cx: &'s LineContext<'s>,
    pos: usize,
    token: &'s str,
}

impl<'s> Site<'s> {
    fn line(&self) -> &'s str {
        self.cx.line
    }

    fn prefix(&self) -> &'s str {
        &self.line()[..self.pos]
    }

    /// Everything after the matched token.
    fn rest(&self) -> &'s str {
        &self.line()[self.pos + self.token.len()..]
    }

    fn prev_byte(&self) -> Option<u8> {
        self.pos.checked_sub(1).map(|i| self.line().as_bytes()[i])
    }

    fn next_byte(&self) -> Option<u8> {
        self.rest().bytes().next()
    }

    fn is_leading(&self) -> bool {
        self.prefix().trim().is_empty()
    }

    fn is_shebang(&self) -> bool {
        self.pos == 0 && self.line().starts_with("#!")
    }

    /// Inside `${...` that has not been closed yet.
    fn in_parameter_expansion(&self) -> bool {
        let (cx, pos) = (self.cx, self.pos);
        cx.seen_before("${", pos) && cx.count_before("{", pos) > cx.count_before("}", pos)
    }
}

fn yaml(site: &Site) -> bool {
    if site.token != "#" {
        return false;
    }
    let after = site.pos + site.token.len();
    if site.in_parameter_expansion() && site.cx.seen_between("}", after, site.line().len()) {
        return true;
    }
    if in_url(site) {
        return true;
    }
    if site.is_leading() {
        let comment = site.line()[site.pos..].trim();
        return comment.starts_with("##") || comment.starts_with("# #") || is_structural(comment);
    }
    false
}

/// The `#` is part of the same whitespace-delimited word as an earlier `http`.
fn in_url(site: &Site) -> bool {
    let prefix = site.prefix();
    let word_start = prefix
        .rfind(|c: char| c.is_whitespace())
        .map_or(0, |i| i + 1);
    prefix[word_start..].contains("http")
}

fn shell(site: &Site) -> bool {
    if site.token != "#" {
        return false;
    }
    if is_hex_colour(site.rest()) {
        return true;
    }
    let glued = site
        .prev_byte()
        .is_some_and(|b| !b.is_ascii_whitespace() && !b";|&()".contains(&b));
    if glued || site.in_parameter_expansion() {
        return true;
    }
    site.cx.seen_before("[ ", site.pos) && !site.cx.seen_before(" ]", site.pos)
}

fn is_hex_colour(after_hash: &str) -> bool {
    let bytes = after_hash.as_bytes();
    [6, 3].into_iter().any(|len| {
        bytes.len() >= len
            && bytes[..len].iter().all(u8::is_ascii_hexdigit)
            && bytes.get(len).is_none_or(|b| !b.is_ascii_alphanumeric())
    })
}

fn python(site: &Site) -> bool {
    if site.token != "#" {
        return false;
    }
    let (cx, pos) = (site.cx, site.pos);
    if cx.count_before("\"\"\"", pos) % 2 == 1 || cx.count_before("'''", pos) % 2 == 1 {
        return true;
    }
    if (cx.seen_before("f\"", pos) || cx.seen_before("f'", pos)) && in_fstring_braces(site.prefix())
    {
        return true;
    }
    (cx.seen_before("r\"", pos) || cx.seen_before("r'", pos))
        && (cx.count_before("\"", pos) + cx.count_before("'", pos)) % 2 == 1
}

/// Walks `prefix` tracking f-string quotes and `{}` depth.
fn in_fstring_braces(prefix: &str) -> bool {
    let bytes = prefix.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            None => {
                if matches!(b, b'f' | b'F')
                    && let Some(&q @ (b'"' | b'\'')) = bytes.get(i + 1)
                {
                    quote = Some(q);
                    depth = 0;
                    i += 2;
                    continue;
                }
            }
            Some(q) => match b {
                b'\\' => i += 1,
                b'{' if bytes.get(i + 1) == Some(&b'{') && depth == 0 => i += 1,
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                _ if b == q && depth == 0 => quote = None,
                _ => {}
            },
        }
        i += 1;
    }

    quote.is_some() && depth > 0
}

fn c_family(site: &Site) -> bool {
    if !matches!(site.token, "//" | "/*") {
        return false;
    }
    let (cx, pos) = (site.cx, site.pos);

    if let Some(header) = last_before(cx.headers(), pos)
        && !cx.seen_between("{", header.end, pos)
        && !site.prefix().trim_end().ends_with(';')
    {
        return true;
    }

    cx.language == Language::Rust
        && last_before(cx.macros(), pos).is_some_and(|call| !cx.seen_between(";", call.end, pos))
}

/// A `#` after code on the same line is kept, as is a `#[...]` attribute.
fn php_hash(site: &Site) -> bool {
    site.token == "#" && (!site.is_leading() || site.next_byte() == Some(b'['))
}

fn css(site: &Site) -> bool {
    site.cx.unclosed_before("url(", ")", site.pos)
        || site.cx.unclosed_before("content:", ";", site.pos)
}

fn batch(site: &Site) -> bool {
    let before = site.prefix().trim();
    let at_command_start =
        before.is_empty() || before.ends_with('&') || before.ends_with('@');
    match site.token {
        "REM" | "rem" => {
            !at_command_start || site.next_byte().is_some_and(|b| !b.is_ascii_whitespace())
        }
        "::" => !at_command_start,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: &str, token: &str) -> usize {
        line.find(token).unwrap()
    }

    fn last(line: &str, token: &str) -> usize {
        line.rfind(token).unwrap()
    }

    #[test]
    fn strings_protect_in_every_language() {
        let line = r#"s = "a # b""#;
        assert!(is_protected(line, at(line, "#"), Language::Ruby, "#"));
        assert!(is_protected(line, at(line, "#"), Language::Unknown, "#"));
    }

    #[test]
    fn shebang_is_kept_for_scripting_languages() {
        assert!(is_protected("#!/bin/bash", 0, Language::Shell, "#"));
        assert!(is_protected("#!/usr/bin/env python3", 0, Language::Python, "#"));
        assert!(!is_protected("#!/bin/bash", 0, Language::Yaml, "#"));
        assert!(!is_protected("# !not a shebang", 0, Language::Shell, "#"));
    }

    #[test]
    fn shell_parameter_expansion() {
        let line = "VERSION=${GITHUB_REF#refs/tags/} # Comment";
        assert!(is_protected(line, at(line, "#"), Language::Shell, "#"));
        assert!(!is_protected(line, last(line, "#"), Language::Shell, "#"));
    }

    #[test]
    fn shell_test_expression_and_word_rule() {
        let line = "if [ $# -eq 0 ]; then # none";
        assert!(is_protected(line, at(line, "#"), Language::Shell, "#"));
        assert!(!is_protected(line, last(line, "#"), Language::Shell, "#"));

        let line = "echo a#b";
        assert!(is_protected(line, at(line, "#"), Language::Shell, "#"));
        let line = "true;# c";
        assert!(!is_protected(line, at(line, "#"), Language::Shell, "#"));
    }

    #[test]
    fn shell_hex_colours() {
        let line = "COLOR= #ff00aa";
        assert!(is_protected(line, at(line, "#"), Language::Shell, "#"));
        let line = "echo #abc";
        assert!(is_protected(line, at(line, "#"), Language::Shell, "#"));
        let line = "echo # abc";
        assert!(!is_protected(line, at(line, "#"), Language::Shell, "#"));
        let line = "echo #abcd";
        assert!(!is_protected(line, at(line, "#"), Language::Shell, "#"));
    }

    #[test]
    fn yaml_trailing_comment_is_not_protected() {
        let line = "name: test # this is a regular comment";
        assert!(!is_protected(line, at(line, "#"), Language::Yaml, "#"));
    }

    #[test]
    fn yaml_glued_hash_is_still_a_comment() {
        let line = "key: value#note";
        assert!(!is_protected(line, at(line, "#"), Language::Yaml, "#"));
        let line = "url: mongodb://host/db#frag";
        assert!(!is_protected(line, at(line, "#"), Language::Yaml, "#"));
    }

    #[test]
    fn yaml_hash_inside_values() {
        let line = "docs: https://example.com/guide#install";
        assert!(is_protected(line, at(line, "#"), Language::Yaml, "#"));
        let line = r##"tags: ["#tag1", "#tag2"]"##;
        assert!(is_protected(line, at(line, "#"), Language::Yaml, "#"));
        let line = "run: echo ${REF# refs/} done";
        assert!(is_protected(line, at(line, "#"), Language::Yaml, "#"));
    }

    #[test]
    fn yaml_leading_comments_depend_on_structure() {
        assert!(is_protected("# 🚀 release notes", 0, Language::Yaml, "#"));
        assert!(is_protected("  # ===== jobs =====", 2, Language::Yaml, "#"));
        assert!(is_protected("## Heading", 0, Language::Yaml, "#"));
        assert!(!is_protected("  # 这是整行注释", 2, Language::Yaml, "#"));
        assert!(!is_protected("# install deps", 0, Language::Yaml, "#"));
    }

    #[test]
    fn python_fstring_braces_and_raw_strings() {
        let prefix = r#"x = f"{value "#;
        assert!(in_fstring_braces(prefix));
        assert!(!in_fstring_braces(r#"x = f"{value}" "#));
        assert!(!in_fstring_braces(r#"x = f"{{literal "#));

        let line = r#"f_string = f"Hello #{name}#" # Comment"#;
        assert!(is_protected(line, at(line, "#"), Language::Python, "#"));
        assert!(!is_protected(line, last(line, "#"), Language::Python, "#"));
    }

    #[test]
    fn python_same_line_triple_quote() {
        let line = r#"doc = """ # inside"#;
        assert!(is_protected(line, at(line, "#"), Language::Python, "#"));
        let line = r#"doc = """done""" # outside"#;
        assert!(!is_protected(line, at(line, "#"), Language::Python, "#"));
    }

    #[test]
    fn c_family_control_headers() {
        let line = "if (x) // why";
        assert!(is_protected(line, at(line, "//"), Language::C, "//"));
        let line = "if (x) { // fine";
        assert!(!is_protected(line, at(line, "//"), Language::C, "//"));
        let line = "if (x) return; // fine";
        assert!(!is_protected(line, at(line, "//"), Language::C, "//"));
        let line = "modify(x); // fine";
        assert!(!is_protected(line, at(line, "//"), Language::C, "//"));
    }

    #[test]
    fn rust_unterminated_macro_call() {
        let line = "let v = vec![1, 2, // items";
        assert!(is_protected(line, at(line, "//"), Language::Rust, "//"));
        let line = r#"println!("x"); // done"#;
        assert!(!is_protected(line, at(line, "//"), Language::Rust, "//"));
        let line = "let v = vec![1, 2, // items";
        assert!(!is_protected(line, at(line, "//"), Language::Go, "//"));
    }

    #[test]
    fn css_url_and_content() {
        let line = "background: url(http://x.test/a.png)";
        assert!(is_protected(line, at(line, "//"), Language::Css, "/*"));
        let line = "a { color: red; } /* c */";
        assert!(!is_protected(line, at(line, "/*"), Language::Css, "/*"));
        let line = "content: counter(x) /* c */";
        assert!(is_protected(line, at(line, "/*"), Language::Css, "/*"));
    }

    #[test]
    fn markup_cdata() {
        let line = "<![CDATA[ <!-- kept";
        assert!(is_protected(line, at(line, "<!--"), Language::Html, "<!--"));
        let line = "<![CDATA[x]]> <!-- c -->";
        assert!(!is_protected(line, at(line, "<!--"), Language::Html, "<!--"));
    }

    #[test]
    fn small_family_rules() {

        assert!(is_protected("x --> y", 2, Language::Haskell, "--"));
        assert!(!is_protected("x -- y", 2, Language::Haskell, "--"));

        assert!(is_protected(r"50\% off", 3, Language::Latex, "%"));
        assert!(!is_protected(r"50\\% off", 4, Language::Latex, "%"));

        assert!(is_protected("      X = A * B", 12, Language::Fortran, "*"));
        assert!(!is_protected("C comment", 0, Language::Fortran, "C"));

        assert!(is_protected("{$IFDEF DEBUG}", 0, Language::Pascal, "{"));
        assert!(!is_protected("{ note }", 0, Language::Pascal, "{"));

        assert!(is_protected("mov r0, #1", 8, Language::Assembly, "#"));
        assert!(!is_protected("mov r0, r1 # c", 11, Language::Assembly, "#"));

        assert!(is_protected("X = $%.", 5, Language::Erlang, "%"));
        assert!(is_protected(r"(char #\;)", 8, Language::Lisp, ";"));
    }

    #[test]
    fn php_hash_after_code_is_kept() {
        let line = "$a = 1; # c";
        assert!(is_protected(line, at(line, "#"), Language::Php, "#"));
        assert!(is_protected("#[Attribute]", 0, Language::Php, "#"));
        assert!(!is_protected("# note", 0, Language::Php, "#"));
        assert!(!is_protected("  # note", 2, Language::Php, "#"));

        let line = "$a = 1; // c";
        assert!(!is_protected(line, at(line, "//"), Language::Php, "//"));
    }

    #[test]
    fn coffee_four_hashes_is_a_line_comment() {
        assert!(is_protected("#### heading", 0, Language::CoffeeScript, "###"));
        assert!(!is_protected("#### heading", 0, Language::CoffeeScript, "#"));
        assert!(!is_protected("### block", 0, Language::CoffeeScript, "###"));
    }

    #[test]
    fn context_answers_repeated_queries_by_position() {
        let line = "if (a) x(); if (b // one /* two";
        let cx = LineContext::new(line, Language::C);
        assert!(!cx.protects(at(line, " if (b"), "//"));
        assert!(cx.protects(at(line, "//"), "//"));
        assert!(cx.protects(at(line, "/*"), "/*"));

        let line = "${A#x} ${B # y} # z";
        let cx = LineContext::new(line, Language::Shell);
        assert!(cx.protects(at(line, "# y"), "#"));
        assert!(!cx.protects(last(line, "#"), "#"));
    }

    #[test]
    fn batch_rem_must_start_a_command() {
        assert!(!is_protected("REM note", 0, Language::Batch, "REM"));
        assert!(!is_protected("REM", 0, Language::Batch, "REM"));
        assert!(!is_protected("echo a & rem note", 9, Language::Batch, "rem"));
        assert!(is_protected("REMOVE.exe", 0, Language::Batch, "REM"));
        assert!(is_protected("echo REM text", 5, Language::Batch, "REM"));
        assert!(is_protected("echo a::b", 6, Language::Batch, "::"));
        assert!(!is_protected(":: label comment", 0, Language::Batch, "::"));
    }
}
