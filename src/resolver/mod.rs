//! Cross-file resolution: stage 4.4 (imports) and stage 4.5 (references).
//!
//! Both passes are per-file and order-independent across files — they
//! consult only the project index's stable export tables, so the final
//! result of a batch does not depend on the order files are visited.

pub mod imports;
pub mod module_path;
pub mod types;

use std::collections::HashSet;

use crate::index::graph::{DefKind, ImportStyle, RefId};
use crate::project::{
    FileId, GlobalDefId, GlobalRefId, ImportTarget, ProjectIndex, ResolutionQuality, ResolvedEdge,
};
use imports::{MAX_REEXPORT_DEPTH, chase_export, resolve_imports};
use module_path::resolve_module;

/// Counters for one resolution run, reported by the index command.
#[derive(Debug, Default)]
pub struct ResolveStats {
    /// Import bindings resolved to a definition or module.
    pub imports_resolved: usize,
    /// Import bindings with no reachable target.
    pub imports_unresolved: usize,
    /// References that gained a cross-file edge.
    pub refs_resolved: usize,
    /// References still pending after every pass (member accesses among
    /// them resolve lazily through the type resolver).
    pub refs_pending: usize,
}

/// Run stages 4.4 and 4.5 for every file — the cold-index path.
pub fn resolve_all(index: &mut ProjectIndex) -> ResolveStats {
    let ids: Vec<FileId> = index.files().map(|(id, _)| id).collect();
    for &id in &ids {
        resolve_imports(index, id);
    }
    let mut stats = ResolveStats::default();
    for &id in &ids {
        resolve_file_refs(index, id, &mut stats);
    }
    for &id in &ids {
        let graph = index.graph(id).expect("file present");
        let bindings = graph
            .defs
            .iter()
            .filter(|d| d.kind == DefKind::ImportBinding)
            .count();
        let resolved = index
            .import_resolutions
            .get(&id)
            .map(Vec::len)
            .unwrap_or(0);
        stats.imports_resolved += resolved;
        stats.imports_unresolved += bindings.saturating_sub(resolved);
    }
    stats
}

/// Stage 4.5 for one file: attach cross-file edges for references that
/// resolved to import bindings, then try wildcard imports for the rest.
/// Never invents a target — what stays unresolved stays unresolved.
pub fn resolve_file_refs(index: &mut ProjectIndex, file: FileId, stats: &mut ResolveStats) {
    let Some(graph) = index.graph(file).cloned() else {
        return;
    };

    let mut edges: Vec<ResolvedEdge> = Vec::new();

    for (i, reference) in graph.refs.iter().enumerate() {
        // Member accesses resolve through receiver types, lazily.
        if reference.receiver.is_some() {
            continue;
        }
        let ref_id = RefId(i as u32);
        let source = GlobalRefId {
            file,
            reference: ref_id,
        };

        match reference.local_target {
            Some(local) if graph.def(local).kind == DefKind::ImportBinding => {
                // Through the proxy, straight to the ultimate target.
                let Some(resolution) = index
                    .import_resolutions
                    .get(&file)
                    .and_then(|rs| rs.iter().find(|r| r.binding == local))
                else {
                    continue;
                };
                if let ImportTarget::Def(target) = resolution.target {
                    let mut proxy_chain = vec![GlobalDefId { file, def: local }];
                    proxy_chain.extend(resolution.chain.iter().copied());
                    edges.push(ResolvedEdge {
                        source,
                        targets: vec![target],
                        quality: ResolutionQuality::Exact,
                        proxy_chain,
                    });
                    stats.refs_resolved += 1;
                }
                // Namespace bindings carry no definition edge; member
                // accesses through them resolve via the type resolver.
            }
            Some(_) => {}
            None => {
                // Wildcard imports in declaration order; first match wins.
                let mut resolved = false;
                for stmt in &graph.imports {
                    if stmt.style != ImportStyle::Wildcard || stmt.reexport {
                        continue;
                    }
                    let Some(module) = resolve_module(index, file, &stmt.module_path) else {
                        continue;
                    };
                    let mut chain = Vec::new();
                    let mut visited = HashSet::new();
                    if let Some(ImportTarget::Def(target)) = chase_export(
                        index,
                        module,
                        &reference.name,
                        MAX_REEXPORT_DEPTH,
                        &mut chain,
                        &mut visited,
                    ) {
                        edges.push(ResolvedEdge {
                            source,
                            targets: vec![target],
                            quality: ResolutionQuality::Exact,
                            proxy_chain: chain,
                        });
                        resolved = true;
                        break;
                    }
                }
                if resolved {
                    stats.refs_resolved += 1;
                } else {
                    stats.refs_pending += 1;
                }
            }
        }
    }

    index.cross_edges.insert(file, edges);
}
