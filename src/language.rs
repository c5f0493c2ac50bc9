//! The closed set of comment-grammar families.
//!
//! A [`Language`] is resolved once per file (see [`crate::resolve`]) and then
//! drives every grammar and protection lookup in [`crate::comments`].

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(into = "&'static str")]
pub enum Language {
    #[strum(
        to_string = "c",
        serialize = "cpp",
        serialize = "cc",
        serialize = "cxx",
        serialize = "h",
        serialize = "hpp",
        serialize = "cs",
        serialize = "objc",
        serialize = "mm",
        serialize = "hlsl",
        serialize = "glsl",
        serialize = "shader",
        serialize = "d",
        serialize = "zig",
        serialize = "odin",
        serialize = "jai"
    )]
    C,
    #[strum(
        to_string = "java",
        serialize = "scala",
        serialize = "kotlin",
        serialize = "kt",
        serialize = "kts",
        serialize = "groovy",
        serialize = "gradle",
        serialize = "sbt"
    )]
    Java,
    #[strum(to_string = "swift")]
    Swift,
    #[strum(to_string = "dart")]
    Dart,
    #[strum(
        to_string = "javascript",
        serialize = "js",
        serialize = "jsx",
        serialize = "mjs",
        serialize = "cjs"
    )]
    JavaScript,
    #[strum(to_string = "typescript", serialize = "ts", serialize = "tsx")]
    TypeScript,
    #[strum(to_string = "go")]
    Go,
    #[strum(to_string = "rust", serialize = "rs")]
    Rust,
    #[strum(to_string = "json", serialize = "jsonc", serialize = "json5")]
    Json,
    #[strum(
        to_string = "verilog",
        serialize = "v",
        serialize = "vh",
        serialize = "sv"
    )]
    Verilog,
    #[strum(to_string = "php")]
    Php,
    #[strum(
        to_string = "python",
        serialize = "py",
        serialize = "pyw",
        serialize = "bazel",
        serialize = "bzl",
        serialize = "starlark"
    )]
    Python,
    #[strum(to_string = "ruby", serialize = "rb")]
    Ruby,
    #[strum(
        to_string = "shell",
        serialize = "sh",
        serialize = "bash",
        serialize = "zsh",
        serialize = "ksh",
        serialize = "fish",
        serialize = "dockerfile"
    )]
    Shell,
    #[strum(to_string = "perl", serialize = "pl", serialize = "pm")]
    Perl,
    #[strum(to_string = "r")]
    R,
    #[strum(to_string = "tcl")]
    Tcl,
    #[strum(to_string = "powershell", serialize = "ps1", serialize = "psm1")]
    PowerShell,
    #[strum(to_string = "batch", serialize = "bat", serialize = "cmd")]
    Batch,
    #[strum(to_string = "julia", serialize = "jl")]
    Julia,
    #[strum(to_string = "coffeescript", serialize = "coffee")]
    CoffeeScript,
    #[strum(
        to_string = "hash",
        serialize = "make",
        serialize = "mk",
        serialize = "makefile",
        serialize = "cmake",
        serialize = "elixir",
        serialize = "ex",
        serialize = "exs",
        serialize = "nim",
        serialize = "crystal",
        serialize = "cr",
        serialize = "gdscript",
        serialize = "gd",
        serialize = "qmake",
        serialize = "puppet"
    )]
    Hash,
    #[strum(
        to_string = "toml",
        serialize = "ini",
        serialize = "cfg",
        serialize = "conf"
    )]
    Toml,
    #[strum(to_string = "yaml", serialize = "yml")]
    Yaml,
    #[strum(
        to_string = "hcl",
        serialize = "tf",
        serialize = "nomad",
        serialize = "consul",
        serialize = "vault"
    )]
    Hcl,
    #[strum(to_string = "sql", serialize = "plsql", serialize = "psql")]
    Sql,
    #[strum(to_string = "lua")]
    Lua,
    #[strum(to_string = "haskell", serialize = "hs", serialize = "elm")]
    Haskell,
    #[strum(to_string = "ada", serialize = "adb", serialize = "ads")]
    Ada,
    #[strum(to_string = "vhdl", serialize = "vhd")]
    Vhdl,
    #[strum(
        to_string = "ocaml",
        serialize = "ml",
        serialize = "mli",
        serialize = "mathematica",
        serialize = "nb"
    )]
    OCaml,
    #[strum(to_string = "fsharp", serialize = "fs", serialize = "fsx")]
    FSharp,
    #[strum(to_string = "pascal", serialize = "pas", serialize = "pp")]
    Pascal,
    #[strum(to_string = "css")]
    Css,
    #[strum(
        to_string = "scss",
        serialize = "sass",
        serialize = "less",
        serialize = "styl"
    )]
    Scss,
    #[strum(
        to_string = "html",
        serialize = "htm",
        serialize = "xml",
        serialize = "svg",
        serialize = "vue",
        serialize = "svelte",
        serialize = "astro",
        serialize = "twig",
        serialize = "erb",
        serialize = "ejs",
        serialize = "hbs",
        serialize = "mustache",
        serialize = "liquid",
        serialize = "pug",
        serialize = "jade"
    )]
    Html,
    #[strum(to_string = "markdown", serialize = "md", serialize = "mdx")]
    Markdown,
    #[strum(to_string = "latex", serialize = "tex")]
    Latex,
    #[strum(to_string = "matlab")]
    Matlab,
    #[strum(to_string = "erlang", serialize = "erl")]
    Erlang,
    #[strum(to_string = "prolog")]
    Prolog,
    #[strum(to_string = "assembly", serialize = "asm", serialize = "s")]
    Assembly,
    #[strum(to_string = "fortran", serialize = "f", serialize = "for")]
    Fortran,
    #[strum(to_string = "fortran90", serialize = "f90", serialize = "f95", serialize = "f03")]
    FortranFree,
    #[strum(
        to_string = "lisp",
        serialize = "lsp",
        serialize = "el",
        serialize = "scm",
        serialize = "scheme",
        serialize = "clj",
        serialize = "cljs",
        serialize = "clojure"
    )]
    Lisp,
    #[strum(to_string = "cobol", serialize = "cob", serialize = "cbl")]
    Cobol,
    #[strum(to_string = "rst", serialize = "asciidoc", serialize = "adoc")]
    Rst,
    #[strum(to_string = "unknown")]
    Unknown,
}

impl Language {
    /// Parse a language tag. Never fails: unrecognised tags are [`Language::Unknown`],
    /// which strips `#` line comments.
    pub fn from_tag(tag: &str) -> Self {
        tag.trim()
            .trim_start_matches('.')
            .parse()
            .unwrap_or(Language::Unknown)
    }

    /// Upper-cased display name used by the per-file report (`|PYTHON|`).
    pub fn label(self) -> String {
        self.to_string().to_ascii_uppercase()
    }
}
