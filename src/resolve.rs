//! Path to [`Language`], with content sniffing for extensions that several
//! languages share.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use crate::language::Language;

/// Bytes read from the head of a file when sniffing.
pub const SNIFF_LIMIT: u64 = 8 * 1024;

const EXTENSIONS: &[&str] = &[
    "c", "cpp", "cc", "cxx", "h", "hpp", "cs", "mm", "zig", "odin", "jai", "hlsl", "glsl",
    "shader", "java", "scala", "kt", "kts", "groovy", "gradle", "sbt", "js", "jsx", "ts", "tsx",
    "mjs", "cjs", "coffee", "go", "rs", "swift", "dart", "py", "pyw", "rb", "php", "pm", "lua",
    "tcl", "sh", "bash", "zsh", "fish", "ps1", "psm1", "bat", "cmd", "jl", "hs", "elm", "ml",
    "mli", "fs", "fsx", "clj", "cljs", "scm", "lisp", "lsp", "el", "nb", "html", "htm", "xml",
    "svg", "vue", "svelte", "astro", "twig", "erb", "ejs", "hbs", "mustache", "pug", "jade",
    "liquid", "css", "scss", "sass", "less", "styl", "yaml", "yml", "toml", "ini", "cfg", "conf",
    "json", "jsonc", "json5", "md", "markdown", "mdx", "tex", "rst", "asciidoc", "adoc", "sql",
    "plsql", "psql", "asm", "vh", "sv", "vhd", "vhdl", "gd", "pas", "ada", "adb", "ads", "f",
    "for", "f90", "f95", "f03", "cob", "cbl", "erl", "ex", "exs", "nim", "cr", "mk", "cmake",
    "bazel", "bzl", "dockerfile", "tf", "hcl", "nomad", "consul", "vault",
];

/// Extensions whose family depends on the file content.
const AMBIGUOUS: &[&str] = &["m", "r", "s", "d", "pl", "pro", "pp", "v"];

/// Language for `path`, or `None` when the file type is not supported.
pub fn resolve(path: &Path) -> Option<Language> {
    if let Some(language) = by_file_name(path) {
        return Some(language);
    }

    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if AMBIGUOUS.contains(&ext.as_str()) {
        let language = match read_head(path) {
            Ok(head) => sniff(&ext, &head),
            Err(err) => {
                debug!(path = %path.display(), %err, "sniff failed, using extension default");
                fallback(&ext)
            }
        };
        return Some(language);
    }

    EXTENSIONS
        .contains(&ext.as_str())
        .then(|| Language::from_tag(&ext))
}

/// Like [`resolve`], but every file is eligible.
pub fn resolve_forced(path: &Path) -> Language {
    resolve(path).unwrap_or(Language::Unknown)
}

fn by_file_name(path: &Path) -> Option<Language> {
    let name = path.file_name()?.to_str()?;
    match name {
        "Dockerfile" | "dockerfile" | "Containerfile" => Some(Language::Shell),
        "Makefile" | "makefile" | "GNUmakefile" | "CMakeLists.txt" => Some(Language::Hash),
        _ => None,
    }
}

fn read_head(path: &Path) -> io::Result<String> {
    let mut buf = Vec::new();
    File::open(path)?.take(SNIFF_LIMIT).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Pick a family for an ambiguous extension from the start of the file.
pub fn sniff(ext: &str, head: &str) -> Language {
    let lower = head.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    match ext {
        "m" => {
            const OBJC: &[&str] = &[
                "#import",
                "@interface",
                "@implementation",
                "nsstring",
                "@property",
                "@synthesize",
                "foundation/foundation.h",
            ];
            const MATLAB: &[&str] = &["function", "end", "clear all", "clc", "matlab"];
            if has(OBJC) {
                Language::C
            } else if MATLAB.iter().filter(|w| lower.contains(*w)).count() >= 2 {
                Language::Matlab
            } else {
                Language::C
            }
        }
        "r" => {
            if has(&["library(", "data.frame", "<-", "ggplot", "dplyr"]) {
                Language::R
            } else {
                Language::Unknown
            }
        }
        "s" => {
            if has(&[".section", ".global", ".globl", ".text"]) {
                Language::Assembly
            } else if has(&["(define"]) {
                Language::Lisp
            } else {
                Language::Assembly
            }
        }
        "d" => {
            if has(&["import std", "void main"]) {
                Language::C
            } else {
                Language::Unknown
            }
        }
        "pl" => {
            if has(&["#!/usr/bin/perl", "#!/usr/bin/env perl", "use strict"]) {
                Language::Perl
            } else if has(&[":-", "?-"]) {
                Language::Prolog
            } else {
                Language::Perl
            }
        }
        "pro" => {
            if has(&["qt", "target"]) {
                Language::Hash
            } else if has(&[":-", "?-"]) {
                Language::Prolog
            } else {
                Language::Unknown
            }
        }
        "pp" => {
            if has(&["program", "begin"]) {
                Language::Pascal
            } else if has(&["class", "node"]) {
                Language::Hash
            } else {
                Language::Pascal
            }
        }
        "v" => {
            if has(&["module", "endmodule", "always"]) {
                Language::Verilog
            } else {
                Language::Unknown
            }
        }
        _ => fallback(ext),
    }
}

fn fallback(ext: &str) -> Language {
    match ext {
        "m" | "d" => Language::C,
        "r" => Language::R,
        "s" => Language::Assembly,
        "pl" => Language::Perl,
        "pp" => Language::Pascal,
        "v" => Language::Verilog,
        _ => Language::from_tag(ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn plain_extensions_resolve_case_insensitively() {
        assert_eq!(resolve(Path::new("a/b.py")), Some(Language::Python));
        assert_eq!(resolve(Path::new("Main.JAVA")), Some(Language::Java));
        assert_eq!(resolve(Path::new("x.tsx")), Some(Language::TypeScript));
        assert_eq!(resolve(Path::new("conf.yml")), Some(Language::Yaml));
        assert_eq!(resolve(Path::new("main.tf")), Some(Language::Hcl));
        assert_eq!(resolve(Path::new("page.pug")), Some(Language::Html));
    }

    #[test]
    fn bare_file_names() {
        assert_eq!(resolve(Path::new("Dockerfile")), Some(Language::Shell));
        assert_eq!(resolve(Path::new("sub/Makefile")), Some(Language::Hash));
        assert_eq!(resolve(Path::new("CMakeLists.txt")), Some(Language::Hash));
    }

    #[test]
    fn unsupported_files_need_force() {
        assert_eq!(resolve(Path::new("image.png")), None);
        assert_eq!(resolve(Path::new("README")), None);
        assert_eq!(resolve_forced(Path::new("image.png")), Language::Unknown);
    }

    #[test]
    fn sniffs_ambiguous_extensions() {
        assert_eq!(sniff("m", "#import <Foundation/Foundation.h>\n@interface A"), Language::C);
        assert_eq!(sniff("m", "function y = f(x)\n  % doc\n  y = x;\nend"), Language::Matlab);
        assert_eq!(sniff("r", "library(dplyr)\nx <- 1"), Language::R);
        assert_eq!(sniff("s", ".section .text\n.global _start"), Language::Assembly);
        assert_eq!(sniff("s", "(define (sq x) (* x x))"), Language::Lisp);
        assert_eq!(sniff("v", "module top;\nalways @(posedge clk)"), Language::Verilog);
        assert_eq!(sniff("pl", "#!/usr/bin/perl\nuse strict;"), Language::Perl);
        assert_eq!(sniff("pl", "parent(X, Y) :- father(X, Y)."), Language::Prolog);
        assert_eq!(sniff("pro", "QT += core\nTARGET = app"), Language::Hash);
        assert_eq!(sniff("pro", "grand(X) :- p(X)."), Language::Prolog);
        assert_eq!(sniff("pp", "program Hello;\nbegin\nend."), Language::Pascal);
        assert_eq!(sniff("pp", "class nginx {\n  package { 'nginx': }\n}"), Language::Hash);
        assert_eq!(sniff("d", "import std.stdio;\nvoid main() {}"), Language::C);
    }

    #[test]
    fn sniffing_reads_the_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp = assert_fs::TempDir::new()?;
        let file = temp.child("calc.m");
        file.write_str("function r = calc(a)\n  r = a * 2;\nend\n")?;

        assert_eq!(resolve(file.path()), Some(Language::Matlab));
        Ok(())
    }

    #[test]
    fn unreadable_ambiguous_file_falls_back_to_extension() {
        assert_eq!(resolve(Path::new("/definitely/missing/file.pl")), Some(Language::Perl));
    }
}
