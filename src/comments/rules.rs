//! Per-language comment grammar and lexical dialect.
//!
//! Both tables are plain data. Order inside a rule list only matters when two
//! start tokens match at the same byte, so block rules whose start token
//! extends a line token (`--[[` vs `--`, `%{` vs `%`) are declared first.

use crate::comments::scan::{Dialect, SingleQuote};
use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Line,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRule {
    pub start: &'static str,
    /// Empty for line comments.
    pub end: &'static str,
    pub kind: RuleKind,
}

const fn line(start: &'static str) -> CommentRule {
    CommentRule {
        start,
        end: "",
        kind: RuleKind::Line,
    }
}

const fn block(start: &'static str, end: &'static str) -> CommentRule {
    CommentRule {
        start,
        end,
        kind: RuleKind::Block,
    }
}

const C_STYLE: &[CommentRule] = &[block("/*", "*/"), line("//")];
const HASH: &[CommentRule] = &[line("#")];
const PHP: &[CommentRule] = &[block("/*", "*/"), line("//"), line("#")];
const HCL: &[CommentRule] = &[block("/*", "*/"), line("#"), line("//")];
const SQL: &[CommentRule] = &[block("/*", "*/"), line("--")];
const LUA: &[CommentRule] = &[block("--[[", "]]"), line("--")];
const HASKELL: &[CommentRule] = &[block("{-", "-}"), line("--")];
const DASH: &[CommentRule] = &[line("--")];
const ML: &[CommentRule] = &[block("(*", "*)")];
const FSHARP: &[CommentRule] = &[block("(*", "*)"), line("//")];
const PASCAL: &[CommentRule] = &[block("(*", "*)"), block("{", "}"), line("//")];
const CSS: &[CommentRule] = &[block("/*", "*/")];
const MARKUP: &[CommentRule] = &[block("<!--", "-->")];
const PERCENT: &[CommentRule] = &[line("%")];
const MATLAB: &[CommentRule] = &[block("%{", "%}"), line("%")];
const PROLOG: &[CommentRule] = &[block("/*", "*/"), line("%")];
const ASSEMBLY: &[CommentRule] = &[line(";"), line("#"), line("//")];
const FORTRAN: &[CommentRule] = &[line("!"), line("C"), line("c"), line("*")];
const FORTRAN_FREE: &[CommentRule] = &[line("!")];
const SEMICOLON: &[CommentRule] = &[line(";")];
const COBOL: &[CommentRule] = &[line("*>")];
const POWERSHELL: &[CommentRule] = &[block("<#", "#>"), line("#")];
const BATCH: &[CommentRule] = &[line("REM"), line("rem"), line("::")];
const JULIA: &[CommentRule] = &[block("#=", "=#"), line("#")];
const COFFEE: &[CommentRule] = &[block("###", "###"), line("#")];
const NONE: &[CommentRule] = &[];

/// Comment rules for `language`, in declaration order.
pub fn rules_for(language: Language) -> &'static [CommentRule] {
    use Language::*;

    match language {
        C | Java | Swift | Dart | JavaScript | TypeScript | Go | Rust | Json | Verilog => C_STYLE,
        Php => PHP,
        Python | Ruby | Shell | Perl | R | Tcl | Hash | Toml | Yaml | Unknown => HASH,
        PowerShell => POWERSHELL,
        Batch => BATCH,
        Julia => JULIA,
        CoffeeScript => COFFEE,
        Hcl => HCL,
        Sql => SQL,
        Lua => LUA,
        Haskell => HASKELL,
        Ada | Vhdl => DASH,
        OCaml => ML,
        FSharp => FSHARP,
        Pascal => PASCAL,
        Css => CSS,
        Scss => C_STYLE,
        Html | Markdown => MARKUP,
        Latex | Erlang => PERCENT,
        Matlab => MATLAB,
        Prolog => PROLOG,
        Assembly => ASSEMBLY,
        Fortran => FORTRAN,
        FortranFree => FORTRAN_FREE,
        Lisp => SEMICOLON,
        Cobol => COBOL,
        Rst => NONE,
    }
}

/// Which string-like constructs a language's lines may contain.
pub fn dialect_for(language: Language) -> Dialect {
    use Language::*;

    let plain = Dialect::PLAIN;
    match language {
        JavaScript | TypeScript => Dialect {
            regex: true,
            multiline_backtick: true,
            ..plain
        },
        Go => Dialect {
            backtick_escapes: false,
            multiline_backtick: true,
            ..plain
        },
        Rust => Dialect {
            single: SingleQuote::CharLiteral,
            backtick: false,
            raw_prefix: true,
            ..plain
        },
        OCaml | FSharp | Haskell => Dialect {
            single: SingleQuote::CharLiteral,
            backtick: false,
            ..plain
        },
        Python => Dialect {
            backtick: false,
            triple_double: true,
            triple_single: true,
            ..plain
        },
        Java | Swift | Julia => Dialect {
            triple_double: true,
            ..plain
        },
        Dart => Dialect {
            triple_double: true,
            triple_single: true,
            ..plain
        },
        Markdown => Dialect {
            single: SingleQuote::Off,
            double: false,
            backtick_escapes: false,
            multiline_backtick: true,
            ..plain
        },
        Html | Latex | Rst => Dialect {
            single: SingleQuote::Off,
            double: language == Html,
            backtick: false,
            ..plain
        },
        Lisp | Ada | Vhdl | Batch => Dialect {
            single: SingleQuote::Off,
            backtick: false,
            ..plain
        },
        Css | Scss | Sql | Yaml | Toml | Json | Php | Perl | Ruby | Shell | R | Tcl | Hash
        | PowerShell | CoffeeScript | Hcl | Lua | Pascal | Matlab | Erlang | Prolog | Assembly
        | Fortran | FortranFree | Cobol | C | Verilog | Unknown => plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_language_has_a_table_entry() {
        for language in Language::iter() {
            let rules = rules_for(language);
            for rule in rules {
                assert!(!rule.start.is_empty(), "{language}: empty start token");
                match rule.kind {
                    RuleKind::Line => assert!(rule.end.is_empty(), "{language}: {rule:?}"),
                    RuleKind::Block => assert!(!rule.end.is_empty(), "{language}: {rule:?}"),
                }
            }
        }
    }

    #[test]
    fn unknown_language_uses_hash_line_comments() {
        assert_eq!(rules_for(Language::Unknown), &[line("#")]);
    }

    #[test]
    fn compound_families_keep_all_their_rules() {
        let php: Vec<_> = rules_for(Language::Php).iter().map(|r| r.start).collect();
        assert_eq!(php, ["/*", "//", "#"]);

        let lua = rules_for(Language::Lua);
        assert_eq!(lua[0], block("--[[", "]]"));
        assert_eq!(lua[1], line("--"));

        let haskell = rules_for(Language::Haskell);
        assert_eq!(haskell[0], block("{-", "-}"));
    }

    #[test]
    fn css_is_block_only_but_scss_has_line_comments() {
        assert_eq!(rules_for(Language::Css), &[block("/*", "*/")]);
        assert!(rules_for(Language::Scss).contains(&line("//")));
    }

    #[test]
    fn regex_literals_are_only_scanned_for_javascript_family() {
        for language in Language::iter() {
            let expected = matches!(language, Language::JavaScript | Language::TypeScript);
            assert_eq!(dialect_for(language).regex, expected, "{language}");
        }
    }
}
