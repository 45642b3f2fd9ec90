use serde::Serialize;

use crate::callgraph::{EntryPoint, Neighborhood};
use crate::error::{ErrorBody, QueryError};
use crate::project::ProjectIndex;
use crate::resolver::ResolveStats;

/// Aggregate statistics produced by an indexing run.
#[derive(Debug, Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub definitions: usize,
    pub references: usize,
    pub languages: std::collections::BTreeMap<&'static str, usize>,
    pub imports_resolved: usize,
    pub imports_unresolved: usize,
    pub refs_resolved: usize,
    pub refs_pending: usize,
}

impl IndexStats {
    pub fn collect(index: &ProjectIndex, resolve: &ResolveStats) -> Self {
        IndexStats {
            files: index.file_count(),
            definitions: index.def_count(),
            references: index.ref_count(),
            languages: index.language_counts(),
            imports_resolved: resolve.imports_resolved,
            imports_unresolved: resolve.imports_unresolved,
            refs_resolved: resolve.refs_resolved,
            refs_pending: resolve.refs_pending,
        }
    }
}

/// Wire shape of `list_entrypoints`.
#[derive(Debug, Serialize)]
pub struct EntrypointsResponse {
    pub entrypoints: Vec<EntryPoint>,
}

/// One definition row for the `definitions` dump (used by the round-trip
/// comparison against per-file query match counts).
#[derive(Debug, Serialize)]
pub struct DefinitionRow {
    pub file: String,
    pub name: String,
    pub kind: crate::index::graph::DefKind,
    pub line: usize,
    pub visible: bool,
}

pub fn definition_rows(index: &ProjectIndex) -> Vec<DefinitionRow> {
    let mut rows = Vec::new();
    for (id, graph) in index.files_ordered() {
        for def in &graph.defs {
            rows.push(DefinitionRow {
                file: index.relative_path(id),
                name: def.name.clone(),
                kind: def.kind,
                line: def.name_range.start_line,
                visible: def.visible,
            });
        }
    }
    rows
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("error: failed to serialise output: {err}"),
    }
}

/// Print a query error in the wire shape and return the process exit code.
pub fn print_query_error(err: &QueryError) -> i32 {
    let body: ErrorBody = err.into();
    match serde_json::to_string_pretty(&body) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("error: {err}"),
    }
    1
}

pub fn print_neighborhood(neighborhood: &Neighborhood) {
    print_json(neighborhood);
}

pub fn print_summary(stats: &IndexStats) {
    println!(
        "Indexed {} files ({} definitions, {} references)",
        stats.files, stats.definitions, stats.references
    );
    for (language, count) in &stats.languages {
        println!("  {language}: {count} files");
    }
    println!(
        "Imports: {} resolved, {} unresolved. References: {} cross-file, {} pending.",
        stats.imports_resolved,
        stats.imports_unresolved,
        stats.refs_resolved,
        stats.refs_pending
    );
}
