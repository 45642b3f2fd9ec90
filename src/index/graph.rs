use std::fmt;

use serde::Serialize;

use crate::language::LanguageKind;

/// Byte + point range of a node in its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SrcRange {
    pub start_byte: usize,
    pub end_byte: usize,
    /// 1-based line of the range start.
    pub start_line: usize,
    /// 0-based column of the range start.
    pub start_col: usize,
    /// 1-based line of the range end.
    pub end_line: usize,
}

impl SrcRange {
    pub fn contains(&self, other: &SrcRange) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }
}

macro_rules! local_id {
    ($name:ident) => {
        /// Index into one `FileGraph` arena. Never valid across files.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

local_id!(ScopeId);
local_id!(DefId);
local_id!(RefId);
local_id!(ImportId);

/// Lexical scope kinds. Language-specific scope constructs map onto this
/// fixed set (a Python comprehension and a JS arrow body both land here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    Module,
    Function,
    Class,
    Block,
    Comprehension,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// `None` only for the synthetic module root.
    pub parent: Option<ScopeId>,
    pub range: SrcRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefKind {
    Function,
    Method,
    Class,
    Variable,
    Parameter,
    ImportBinding,
}

/// Where a definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefOrigin {
    /// Written in the file.
    Source,
    /// Synthetic binding produced by an import statement.
    /// `source_name` is the name in the target module (`X` in
    /// `from m import X as Y`); `None` binds the module itself as a namespace.
    Import {
        import_id: ImportId,
        source_name: Option<String>,
    },
}

/// A summary of a definition's most recent assignment right-hand side,
/// kept for receiver-type inference. The full expression is not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedExpr {
    /// A literal of a known builtin shape ("str", "int", "list", ...).
    Literal(&'static str),
    /// A call — `x = Foo()`. Whether it constructs an instance or yields a
    /// callable's return value is decided when the callee reference resolves.
    Call { callee: RefId },
    /// A plain name copy — `x = y`.
    Name(RefId),
}

#[derive(Debug, Clone)]
pub struct Definition {
    pub name: String,
    pub kind: DefKind,
    pub scope: ScopeId,
    /// Range of the whole declaration.
    pub range: SrcRange,
    /// Range of just the name identifier.
    pub name_range: SrcRange,
    /// Declared type expression, verbatim. For callables this is the return
    /// annotation; it is interpreted later by the type resolver.
    pub declared_type: Option<String>,
    /// Most recent assignment RHS summary, if the definition is one.
    pub assigned: Option<AssignedExpr>,
    /// Scope introduced by this declaration (function body, class body).
    pub body_scope: Option<ScopeId>,
    /// Base-class references for class definitions, in declaration order.
    pub bases: Vec<RefId>,
    /// Externally visible under the language's visibility rules.
    pub visible: bool,
    /// Interface-like declaration (TS interface, Python Protocol subclass,
    /// Rust trait) — a candidate for structural implementer discovery.
    pub interface_like: bool,
    /// Visible from anywhere in its scope regardless of position.
    pub hoisted: bool,
    pub origin: DefOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageKind {
    Read,
    Call,
    TypeAnnotation,
    MemberAccess,
}

#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
    pub usage: UsageKind,
    pub scope: ScopeId,
    pub range: SrcRange,
    /// Previous link of a member-access chain (`a` for the `b` in `a.b`).
    pub receiver: Option<RefId>,
    /// Intra-file resolution result, filled by the single-file indexer.
    /// References without one stay pending for cross-file resolution.
    pub local_target: Option<DefId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportStyle {
    /// `import './x'` — no bindings, evaluated for effect.
    SideEffect,
    /// `from m import a, b as c` / `import {a, b as c} from 'm'`.
    Named,
    /// `import m` / `import * as ns from 'm'` — binds the module itself.
    Namespace,
    /// `from m import *` / `export * from 'm'`.
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    /// The name the import binds in the importing file.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ImportStatement {
    /// Raw module path as written (`subpkg.processor`, `./utils`, `crate::x`).
    pub module_path: String,
    pub names: Vec<ImportedName>,
    pub style: ImportStyle,
    /// A re-export (`export {x} from 'm'`, `pub use`): the imported names are
    /// also part of this file's export surface.
    pub reexport: bool,
    pub range: SrcRange,
}

/// The local scope graph of a single file: arenas of scopes, definitions,
/// references and imports, plus the intra-file resolution results.
///
/// A `FileGraph` is immutable once built and owns all of its nodes. Anything
/// cross-file refers into it by `(FileId, local id)` pairs resolved through
/// the project index, so deleting a file never touches another file's graph.
#[derive(Debug, Clone)]
pub struct FileGraph {
    pub path: std::path::PathBuf,
    pub language: LanguageKind,
    /// xxh64 of the source bytes. Unchanged content hashes identically, which
    /// lets the scheduler skip no-op re-index work.
    pub content_hash: u64,
    /// Full source text, retained for excerpt extraction at query time
    /// (readers never touch disk). The parse tree is NOT retained.
    pub source: std::sync::Arc<str>,
    /// `scopes[0]` is always the synthetic module root.
    pub scopes: Vec<Scope>,
    pub defs: Vec<Definition>,
    pub refs: Vec<Reference>,
    pub imports: Vec<ImportStatement>,
    /// Owning definition per scope (the function/class whose body it is).
    /// Indexed by `ScopeId`; `None` for the root and bare blocks.
    pub scope_owner: Vec<Option<DefId>>,
    /// Explicit export list (`__all__ = [...]`). When present it is
    /// authoritative for wildcard imports and the export table.
    pub export_list: Option<Vec<String>>,
    /// The tree had error nodes; indexing was best-effort.
    pub parse_partial: bool,
}

pub const ROOT_SCOPE: ScopeId = ScopeId(0);

impl FileGraph {
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn def(&self, id: DefId) -> &Definition {
        &self.defs[id.index()]
    }

    pub fn reference(&self, id: RefId) -> &Reference {
        &self.refs[id.index()]
    }

    pub fn import(&self, id: ImportId) -> &ImportStatement {
        &self.imports[id.index()]
    }

    /// Iterate a scope's chain outward: itself, parent, ..., root.
    pub fn scope_chain(&self, from: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(from), move |&s| self.scope(s).parent)
    }

    /// Definitions attached directly to `scope`, in appearance order.
    pub fn defs_in_scope(&self, scope: ScopeId) -> impl Iterator<Item = (DefId, &Definition)> {
        self.defs
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.scope == scope)
            .map(|(i, d)| (DefId(i as u32), d))
    }

    /// References that stayed unresolved after the intra-file pass.
    pub fn pending_refs(&self) -> impl Iterator<Item = (RefId, &Reference)> {
        self.refs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.local_target.is_none())
            .map(|(i, r)| (RefId(i as u32), r))
    }

    /// The innermost function/method/class definition whose body contains
    /// `scope`. Returns `None` for module-level scopes.
    pub fn enclosing_def(&self, scope: ScopeId) -> Option<DefId> {
        self.scope_chain(scope)
            .find_map(|s| self.scope_owner[s.index()])
    }

    /// Source excerpt for a range: the text of its first line, trimmed.
    pub fn excerpt(&self, range: &SrcRange) -> String {
        self.source
            .lines()
            .nth(range.start_line.saturating_sub(1))
            .unwrap_or("")
            .trim()
            .to_owned()
    }

    /// An empty graph for a file that failed to parse. The file stays present
    /// in the index with no definitions and no references.
    pub fn empty(
        path: std::path::PathBuf,
        language: LanguageKind,
        content_hash: u64,
        source: std::sync::Arc<str>,
    ) -> Self {
        let len = source.len();
        let lines = source.lines().count().max(1);
        FileGraph {
            path,
            language,
            content_hash,
            source,
            scopes: vec![Scope {
                kind: ScopeKind::Module,
                parent: None,
                range: SrcRange {
                    start_byte: 0,
                    end_byte: len,
                    start_line: 1,
                    start_col: 0,
                    end_line: lines,
                },
            }],
            defs: Vec::new(),
            refs: Vec::new(),
            imports: Vec::new(),
            scope_owner: vec![None],
            export_list: None,
            parse_partial: true,
        }
    }
}
