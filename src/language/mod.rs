pub mod javascript;
pub mod pack;
pub mod python;
pub mod rust_lang;
pub mod typescript;

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tree_sitter::{Language, Node};

use crate::index::graph::{DefKind, ImportStatement};
use pack::{PackSource, QueryPack};

/// A source language the indexer understands.
///
/// A plain enum (not trait objects): cheap to copy, pattern-matched at
/// dispatch boundaries. Each variant owes the registry exactly four things —
/// an extension mapping, a grammar, a query pack, and the handful of
/// convention hooks below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageKind {
    Python,
    TypeScript,
    JavaScript,
    Rust,
}

/// All registered languages, in registry order.
pub const ALL_LANGUAGES: &[LanguageKind] = &[
    LanguageKind::Python,
    LanguageKind::TypeScript,
    LanguageKind::JavaScript,
    LanguageKind::Rust,
];

impl LanguageKind {
    /// Decide a language for a path. Extension-first; extensionless files get
    /// a shebang sniff. `None` means the file is skipped (logged, not fatal).
    pub fn from_path(path: &Path) -> Option<LanguageKind> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => sniff_shebang(path),
        }
    }

    pub fn from_extension(ext: &str) -> Option<LanguageKind> {
        match ext {
            "py" | "pyi" => Some(LanguageKind::Python),
            "ts" | "tsx" | "mts" => Some(LanguageKind::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(LanguageKind::JavaScript),
            "rs" => Some(LanguageKind::Rust),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LanguageKind::Python => "Python",
            LanguageKind::TypeScript => "TypeScript",
            LanguageKind::JavaScript => "JavaScript",
            LanguageKind::Rust => "Rust",
        }
    }

    pub fn grammar(self) -> Language {
        match self {
            LanguageKind::Python => tree_sitter_python::LANGUAGE.into(),
            LanguageKind::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            LanguageKind::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            LanguageKind::Rust => tree_sitter_rust::LANGUAGE.into(),
        }
    }

    /// The compiled query pack, built on first use and cached process-wide.
    ///
    /// # Panics
    /// If the pack source fails to compile against its grammar — a build-time
    /// defect in the pack itself, not an input condition.
    pub fn pack(self) -> &'static QueryPack {
        static PYTHON: OnceLock<QueryPack> = OnceLock::new();
        static TYPESCRIPT: OnceLock<QueryPack> = OnceLock::new();
        static JAVASCRIPT: OnceLock<QueryPack> = OnceLock::new();
        static RUST: OnceLock<QueryPack> = OnceLock::new();

        let (cell, source): (&OnceLock<QueryPack>, PackSource) = match self {
            LanguageKind::Python => (&PYTHON, python::pack_source()),
            LanguageKind::TypeScript => (&TYPESCRIPT, typescript::pack_source()),
            LanguageKind::JavaScript => (&JAVASCRIPT, javascript::pack_source()),
            LanguageKind::Rust => (&RUST, rust_lang::pack_source()),
        };
        cell.get_or_init(|| {
            QueryPack::compile(&self.grammar(), &source)
                .unwrap_or_else(|err| panic!("{} query pack: {err:#}", self.display_name()))
        })
    }

    /// Map a `@def` capture's node kind to a definition kind. Method-ness is
    /// decided later from the enclosing scope.
    pub fn def_kind_of_node(self, node_kind: &str) -> Option<DefKind> {
        match self {
            LanguageKind::Python => python::def_kind_of_node(node_kind),
            LanguageKind::TypeScript => typescript::def_kind_of_node(node_kind),
            LanguageKind::JavaScript => javascript::def_kind_of_node(node_kind),
            LanguageKind::Rust => rust_lang::def_kind_of_node(node_kind),
        }
    }

    /// Decompose one `@import` match into zero or more import statements.
    pub fn decompose_import(self, node: Node<'_>, source: &[u8]) -> Vec<ImportStatement> {
        match self {
            LanguageKind::Python => python::decompose_import(node, source),
            LanguageKind::TypeScript | LanguageKind::JavaScript => {
                typescript::decompose_import(node, source)
            }
            LanguageKind::Rust => rust_lang::decompose_import(node, source),
        }
    }

    /// Definition kinds visible from anywhere in their scope regardless of
    /// position (forward references allowed).
    pub fn hoists(self, kind: DefKind) -> bool {
        match self {
            // Python resolves function/class names at call time, so lexical
            // lookup treats them as visible scope-wide.
            LanguageKind::Python => matches!(kind, DefKind::Function | DefKind::Method | DefKind::Class),
            // Module-level declarations and function declarations hoist.
            LanguageKind::TypeScript | LanguageKind::JavaScript => {
                matches!(kind, DefKind::Function | DefKind::Method | DefKind::Class)
            }
            // Items are order-independent.
            LanguageKind::Rust => !matches!(kind, DefKind::Variable | DefKind::Parameter),
        }
    }

    /// Default visibility of a root-scope definition when the language has no
    /// declaration-site keyword for it (Python underscore convention).
    pub fn default_visible(self, name: &str) -> bool {
        match self {
            LanguageKind::Python => !name.starts_with('_'),
            // TS/JS visibility comes from `export`; Rust from `pub`. The
            // packs mark those explicitly, so the default is private.
            LanguageKind::TypeScript | LanguageKind::JavaScript | LanguageKind::Rust => false,
        }
    }

    /// Test-suite naming conventions, used by entry-point filtering.
    pub fn is_test_symbol(self, name: &str) -> bool {
        match self {
            LanguageKind::Python => {
                name.starts_with("test_") || name.ends_with("_test") || name.starts_with("Test")
            }
            LanguageKind::TypeScript | LanguageKind::JavaScript => {
                matches!(name, "describe" | "it" | "test" | "beforeEach" | "afterEach")
                    || name.starts_with("test")
                    || name.ends_with(".test")
            }
            LanguageKind::Rust => name.starts_with("test_") || name.ends_with("_test"),
        }
    }

    /// File that marks a directory as a package for package-style imports.
    pub fn package_marker(self) -> Option<&'static str> {
        match self {
            LanguageKind::Python => Some("__init__.py"),
            _ => None,
        }
    }

    /// Builtin shape named by a literal node kind ("string" -> "str"), used
    /// when inferring a definition's type from its assignment.
    pub fn literal_primitive(self, node_kind: &str) -> Option<&'static str> {
        match self {
            LanguageKind::Python => python::literal_primitive(node_kind),
            LanguageKind::TypeScript | LanguageKind::JavaScript => {
                typescript::literal_primitive(node_kind)
            }
            LanguageKind::Rust => rust_lang::literal_primitive(node_kind),
        }
    }

    /// Declaration node kinds that are interface-like by syntax alone.
    /// Python has no syntactic marker — the indexer checks for a `Protocol`
    /// or `ABC` base instead.
    pub fn interface_like_node(self, node_kind: &str) -> bool {
        match self {
            LanguageKind::TypeScript => node_kind == "interface_declaration",
            LanguageKind::Rust => node_kind == "trait_item",
            LanguageKind::Python | LanguageKind::JavaScript => false,
        }
    }

    /// External visibility of a root-scope definition at its declaration
    /// site: `export` ancestors for TS/JS, a `pub` modifier for Rust, the
    /// underscore convention for Python.
    pub fn def_visible(self, def_node: Node<'_>, name: &str) -> bool {
        match self {
            LanguageKind::Python => self.default_visible(name),
            LanguageKind::TypeScript | LanguageKind::JavaScript => {
                let mut current = Some(def_node);
                while let Some(n) = current {
                    if n.kind() == "export_statement" {
                        return true;
                    }
                    current = n.parent();
                }
                false
            }
            LanguageKind::Rust => (0..def_node.child_count())
                .filter_map(|i| def_node.child(i as u32))
                .any(|c| c.kind() == "visibility_modifier"),
        }
    }

    /// Per-base expression nodes of a class's `@bases` capture.
    pub fn base_candidates<'a>(self, bases_node: Node<'a>) -> Vec<Node<'a>> {
        match self {
            LanguageKind::Python => python::base_candidates(bases_node),
            LanguageKind::TypeScript | LanguageKind::JavaScript => {
                typescript::base_candidates(bases_node)
            }
            // Rust impls and traits carry no heritage the packs capture.
            LanguageKind::Rust => Vec::new(),
        }
    }
}

/// Extensionless fallback: read the first line and look for an interpreter.
fn sniff_shebang(path: &Path) -> Option<LanguageKind> {
    let mut head = [0u8; 128];
    let n = std::fs::File::open(path)
        .and_then(|mut f| std::io::Read::read(&mut f, &mut head))
        .ok()?;
    let first_line = std::str::from_utf8(&head[..n]).ok()?.lines().next()?;
    if !first_line.starts_with("#!") {
        return None;
    }
    if first_line.contains("python") {
        Some(LanguageKind::Python)
    } else if first_line.contains("node") || first_line.contains("deno") {
        Some(LanguageKind::JavaScript)
    } else {
        None
    }
}
