//! The project index: one local scope graph per file plus the derived
//! cross-file tables. Single-writer — only the indexing path mutates it, and
//! the only mutations are add, replace and remove at file granularity.
//! Readers observe immutable snapshots published at batch boundaries.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::index::graph::{DefId, Definition, FileGraph, RefId, Reference};
use crate::language::LanguageKind;

/// Stable identifier of a file within one indexing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// `(file, local id)` pair — the only way anything outside a file's own
/// graph points at one of its definitions. Resolved through the index, so
/// mutually importing files never own each other's nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GlobalDefId {
    pub file: FileId,
    pub def: DefId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GlobalRefId {
    pub file: FileId,
    pub reference: RefId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionQuality {
    Exact,
    Heuristic,
    PolymorphicSet,
}

/// A resolved reference. `targets` holds one definition for exact and
/// heuristic edges; a polymorphic set enumerates every candidate and is
/// equivalent to that many single-target edges.
#[derive(Debug, Clone)]
pub struct ResolvedEdge {
    pub source: GlobalRefId,
    pub targets: Vec<GlobalDefId>,
    pub quality: ResolutionQuality,
    /// Import-binding hops crossed on the way to the target, for diagnostics.
    pub proxy_chain: Vec<GlobalDefId>,
}

/// What an import binding ultimately points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget {
    /// A definition in another file.
    Def(GlobalDefId),
    /// The module itself (`import pkg.mod as m` binds a namespace).
    Module(FileId),
}

/// One resolved import binding of a file.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    /// The import-binding definition in the importing file.
    pub binding: DefId,
    pub target: ImportTarget,
    /// Re-export hops crossed while chasing the name, for diagnostics.
    pub chain: Vec<GlobalDefId>,
}

/// The in-memory project index. Cloning is cheap enough to publish a
/// snapshot per batch: per-file graphs are shared by `Arc`, so a clone
/// copies table entries, never file contents.
#[derive(Clone)]
pub struct ProjectIndex {
    pub root: PathBuf,
    path_ids: HashMap<PathBuf, FileId>,
    files: HashMap<FileId, Arc<FileGraph>>,
    next_file_id: u32,
    /// Language-aware module path ("subpkg.processor") -> file.
    pub module_paths: HashMap<String, FileId>,
    /// file -> files that import it.
    pub reverse_imports: HashMap<FileId, HashSet<FileId>>,
    /// file -> externally visible name -> definition. BTreeMap keeps
    /// wildcard-import iteration deterministic.
    pub exports: HashMap<FileId, BTreeMap<String, DefId>>,
    /// importer -> resolved import bindings.
    pub import_resolutions: HashMap<FileId, Vec<ResolvedImport>>,
    /// source file -> cross-file resolved reference edges.
    pub cross_edges: HashMap<FileId, Vec<ResolvedEdge>>,
}

/// Immutable view handed to readers. Published atomically at batch
/// boundaries; a query started at time T sees a snapshot whose batch
/// completed no later than T.
pub type Snapshot = Arc<ProjectIndex>;

impl ProjectIndex {
    pub fn new(root: PathBuf) -> Self {
        ProjectIndex {
            root,
            path_ids: HashMap::new(),
            files: HashMap::new(),
            next_file_id: 0,
            module_paths: HashMap::new(),
            reverse_imports: HashMap::new(),
            exports: HashMap::new(),
            import_resolutions: HashMap::new(),
            cross_edges: HashMap::new(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::new(self.clone())
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.path_ids.get(path).copied()
    }

    pub fn graph(&self, id: FileId) -> Option<&Arc<FileGraph>> {
        self.files.get(&id)
    }

    pub fn path_of(&self, id: FileId) -> Option<&Path> {
        self.files.get(&id).map(|g| g.path.as_path())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> impl Iterator<Item = (FileId, &Arc<FileGraph>)> {
        self.files.iter().map(|(&id, g)| (id, g))
    }

    /// Deterministic iteration order (by path), for queries whose output
    /// ordering matters.
    pub fn files_ordered(&self) -> Vec<(FileId, &Arc<FileGraph>)> {
        let mut all: Vec<_> = self.files().collect();
        all.sort_by(|a, b| a.1.path.cmp(&b.1.path));
        all
    }

    pub fn def(&self, id: GlobalDefId) -> Option<&Definition> {
        self.files.get(&id.file)?.defs.get(id.def.index())
    }

    pub fn reference(&self, id: GlobalRefId) -> Option<&Reference> {
        self.files.get(&id.file)?.refs.get(id.reference.index())
    }

    /// The export table entry for `(file, name)`.
    pub fn export(&self, file: FileId, name: &str) -> Option<DefId> {
        self.exports.get(&file)?.get(name).copied()
    }

    /// Project-relative display path.
    pub fn relative_path(&self, id: FileId) -> String {
        self.path_of(id)
            .map(|p| {
                p.strip_prefix(&self.root)
                    .unwrap_or(p)
                    .to_string_lossy()
                    .into_owned()
            })
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Mutation: add / replace / remove
    // -----------------------------------------------------------------------

    /// Add a file's graph, or replace it atomically if the path is already
    /// indexed. The file keeps its id across replacements.
    pub fn insert(&mut self, graph: FileGraph) -> FileId {
        let id = match self.path_ids.get(&graph.path) {
            Some(&existing) => existing,
            None => {
                let id = FileId(self.next_file_id);
                self.next_file_id += 1;
                self.path_ids.insert(graph.path.clone(), id);
                id
            }
        };

        if let Some(module_path) = module_path_for(&self.root, &graph.path, graph.language) {
            self.module_paths.insert(module_path, id);
        }
        self.files.insert(id, Arc::new(graph));
        self.rebuild_exports_for(id);
        id
    }

    /// Remove a file. Derived edges touching it from either side are purged;
    /// edges are always removed before their targets.
    pub fn remove(&mut self, path: &Path) -> Option<FileId> {
        let id = self.path_ids.remove(path)?;
        self.purge_derived(id);
        self.module_paths.retain(|_, &mut v| v != id);
        self.exports.remove(&id);
        self.files.remove(&id);
        Some(id)
    }

    /// Drop everything stage 4.4+ derived for `id` — called before
    /// re-running resolution on a changed file, and on removal.
    pub fn purge_derived(&mut self, id: FileId) {
        self.import_resolutions.remove(&id);
        self.cross_edges.remove(&id);
        self.reverse_imports.remove(&id);
        for targets in self.reverse_imports.values_mut() {
            targets.remove(&id);
        }
        // Edges in other files whose target lives in this one.
        for edges in self.cross_edges.values_mut() {
            edges.retain(|e| e.targets.iter().all(|t| t.file != id));
        }
        for resolutions in self.import_resolutions.values_mut() {
            resolutions.retain(|r| match r.target {
                ImportTarget::Def(d) => d.file != id,
                ImportTarget::Module(f) => f != id,
            });
        }
    }

    /// Files whose cross-file resolution may be affected by a change to
    /// `id`: its reverse importers, per the reverse-import table.
    pub fn importers_of(&self, id: FileId) -> HashSet<FileId> {
        self.reverse_imports.get(&id).cloned().unwrap_or_default()
    }

    /// Rebuild the export table of one file from its root-scope definitions
    /// and the language's visibility rules. An explicit export list wins.
    fn rebuild_exports_for(&mut self, id: FileId) {
        let Some(graph) = self.files.get(&id) else {
            return;
        };
        let mut table: BTreeMap<String, DefId> = BTreeMap::new();

        match &graph.export_list {
            Some(listed) => {
                let allowed: HashSet<&str> = listed.iter().map(String::as_str).collect();
                for (def_id, def) in graph.defs_in_scope(crate::index::graph::ROOT_SCOPE) {
                    if allowed.contains(def.name.as_str()) {
                        table.insert(def.name.clone(), def_id);
                    }
                }
            }
            None => {
                for (def_id, def) in graph.defs_in_scope(crate::index::graph::ROOT_SCOPE) {
                    if def.visible {
                        // Later same-name definitions overwrite earlier ones,
                        // matching re-assignment semantics at module level.
                        table.insert(def.name.clone(), def_id);
                    }
                }
            }
        }

        self.exports.insert(id, table);
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn language_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for graph in self.files.values() {
            *counts.entry(graph.language.display_name()).or_insert(0) += 1;
        }
        counts
    }

    pub fn def_count(&self) -> usize {
        self.files.values().map(|g| g.defs.len()).sum()
    }

    pub fn ref_count(&self) -> usize {
        self.files.values().map(|g| g.refs.len()).sum()
    }
}

/// Language-aware module path for a file, relative to the project root.
///
/// Python: `subpkg/processor.py` -> `subpkg.processor`, with package init
/// modules naming the package itself (`subpkg/__init__.py` -> `subpkg`).
/// TS/JS: extensionless relative path with `/` separators (the import
/// resolver probes paths rather than consulting this table, but reverse
/// lookups want an entry). Rust: `src/a/b.rs` -> `crate::a::b`.
pub fn module_path_for(root: &Path, path: &Path, language: LanguageKind) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let last = parts.pop()?;
    let stem = last.rsplit_once('.').map(|(s, _)| s).unwrap_or(&last);

    match language {
        LanguageKind::Python => {
            if stem != "__init__" {
                parts.push(stem.to_owned());
            }
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("."))
            }
        }
        LanguageKind::TypeScript | LanguageKind::JavaScript => {
            parts.push(stem.to_owned());
            Some(parts.join("/"))
        }
        LanguageKind::Rust => {
            if !parts.is_empty() && parts[0] == "src" {
                parts.remove(0);
            }
            if stem == "lib" || stem == "main" {
                if parts.is_empty() {
                    return Some("crate".to_owned());
                }
            } else if stem == "mod" {
                // crate::dir for dir/mod.rs
            } else {
                parts.push(stem.to_owned());
            }
            let mut segments = vec!["crate".to_owned()];
            segments.extend(parts);
            Some(segments.join("::"))
        }
    }
}
