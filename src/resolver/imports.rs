//! Import resolution: turn each file's import statements into resolved
//! targets — `(imported name, target file, target definition)` — chasing
//! re-export chains through intermediate modules.

use std::collections::HashSet;

use tracing::debug;

use crate::index::graph::{DefId, DefKind, DefOrigin, ImportStatement, ImportStyle};
use crate::language::LanguageKind;
use crate::project::{FileId, GlobalDefId, ImportTarget, ProjectIndex, ResolvedImport};
use super::module_path::resolve_module;

/// Re-export chains terminate here; on loop detection the name is left
/// unresolved rather than guessed.
pub const MAX_REEXPORT_DEPTH: usize = 8;

/// Resolve every import binding of `file` and record the results (and the
/// reverse-import edges they induce) in the index.
pub fn resolve_imports(index: &mut ProjectIndex, file: FileId) {
    let Some(graph) = index.graph(file).cloned() else {
        return;
    };

    let mut resolutions: Vec<ResolvedImport> = Vec::new();
    let mut imported_files: HashSet<FileId> = HashSet::new();

    for (i, def) in graph.defs.iter().enumerate() {
        if def.kind != DefKind::ImportBinding {
            continue;
        }
        let DefOrigin::Import {
            import_id,
            source_name,
        } = &def.origin
        else {
            continue;
        };
        let stmt = graph.import(*import_id);

        let resolved = match source_name {
            // Namespace binding: the module itself.
            None => namespace_target(index, file, stmt).map(|target_file| ResolvedImport {
                binding: DefId(i as u32),
                target: ImportTarget::Module(target_file),
                chain: Vec::new(),
            }),
            // Named binding: a name out of the target module, possibly
            // re-exported onward.
            Some(name) => resolve_named(index, file, stmt, name).map(|(target, chain)| {
                ResolvedImport {
                    binding: DefId(i as u32),
                    target,
                    chain,
                }
            }),
        };

        match resolved {
            Some(resolution) => {
                match resolution.target {
                    ImportTarget::Def(d) => imported_files.insert(d.file),
                    ImportTarget::Module(f) => imported_files.insert(f),
                };
                resolutions.push(resolution);
            }
            None => {
                debug!(
                    file = %graph.path.display(),
                    module = %stmt.module_path,
                    name = %def.name,
                    "import left unresolved"
                );
            }
        }
    }

    // Wildcard and side-effect statements bind nothing here but still create
    // reverse-import edges, so invalidation reaches this file when the
    // target changes.
    for stmt in &graph.imports {
        if matches!(stmt.style, ImportStyle::Wildcard | ImportStyle::SideEffect)
            && let Some(target) = resolve_module(index, file, &stmt.module_path)
        {
            imported_files.insert(target);
        }
    }

    index.import_resolutions.insert(file, resolutions);
    for target in imported_files {
        if target != file {
            index.reverse_imports.entry(target).or_default().insert(file);
        }
    }
}

/// Resolve the module a namespace-style statement binds: the full dotted
/// path when aliased, otherwise the first segment (what the bare name
/// actually denotes).
fn namespace_target(
    index: &ProjectIndex,
    file: FileId,
    stmt: &ImportStatement,
) -> Option<FileId> {
    let aliased = stmt.names.first().is_some_and(|n| n.alias.is_some());
    if aliased {
        resolve_module(index, file, &stmt.module_path)
    } else {
        let sep = match index.graph(file)?.language {
            LanguageKind::Rust => "::",
            _ => ".",
        };
        let first = stmt.module_path.split(sep).next()?;
        resolve_module(index, file, first)
    }
}

/// Resolve one named import: find the module, then the name in it —
/// following re-exports — or fall back to a submodule of the same name.
fn resolve_named(
    index: &ProjectIndex,
    importer: FileId,
    stmt: &ImportStatement,
    name: &str,
) -> Option<(ImportTarget, Vec<GlobalDefId>)> {
    let module = resolve_module(index, importer, &stmt.module_path)?;

    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    if let Some(target) = chase_export(index, module, name, MAX_REEXPORT_DEPTH, &mut chain, &mut visited)
    {
        return Some((target, chain));
    }

    // `from pkg import mod` where `mod` is a submodule, not a name.
    let sep = match index.graph(importer)?.language {
        LanguageKind::Rust => "::",
        _ => ".",
    };
    let submodule_path = format!("{}{}{}", stmt.module_path, sep, name);
    resolve_module(index, importer, &submodule_path)
        .map(|f| (ImportTarget::Module(f), Vec::new()))
}

/// Find `name` among the externally visible names of `file`, following
/// re-export proxies up to `depth` hops. Pure over the index's stable export
/// tables, so resolution order across files cannot change the result.
pub fn chase_export(
    index: &ProjectIndex,
    file: FileId,
    name: &str,
    depth: usize,
    chain: &mut Vec<GlobalDefId>,
    visited: &mut HashSet<(FileId, String)>,
) -> Option<ImportTarget> {
    if depth == 0 || !visited.insert((file, name.to_owned())) {
        return None;
    }
    let graph = index.graph(file)?;

    if let Some(def_id) = index.export(file, name) {
        let def = graph.def(def_id);
        if def.kind != DefKind::ImportBinding {
            return Some(ImportTarget::Def(GlobalDefId { file, def: def_id }));
        }
        // A re-export proxy: follow it to the ultimate target, keeping the
        // hop for diagnostics.
        let DefOrigin::Import {
            import_id,
            source_name,
        } = &def.origin
        else {
            return None;
        };
        chain.push(GlobalDefId { file, def: def_id });
        let stmt = graph.import(*import_id);
        return match source_name {
            None => namespace_target(index, file, stmt).map(ImportTarget::Module),
            Some(inner) => {
                let next = resolve_module(index, file, &stmt.module_path)?;
                chase_export(index, next, inner, depth - 1, chain, visited)
            }
        };
    }

    // Not an explicit export: wildcard re-exports may still surface it.
    // Python wildcard imports feed the module namespace; other languages
    // only re-export through explicit `export * from` statements.
    for stmt in &graph.imports {
        if stmt.style != ImportStyle::Wildcard {
            continue;
        }
        if graph.language != LanguageKind::Python && !stmt.reexport {
            continue;
        }
        // An explicit __all__ gates what a wildcard can re-export.
        if graph.language == LanguageKind::Python
            && let Some(listed) = &graph.export_list
            && !listed.iter().any(|n| n == name)
        {
            continue;
        }
        if let Some(next) = resolve_module(index, file, &stmt.module_path)
            && let Some(target) = chase_export(index, next, name, depth - 1, chain, visited)
        {
            return Some(target);
        }
    }

    None
}
