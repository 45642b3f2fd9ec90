//! Call-graph service: materialise caller/callee edges from resolved
//! call references on demand, classify entry points, and answer
//! neighborhood queries around a symbol.
//!
//! Call edges are a pure function of the snapshot's resolved references —
//! nothing here is stored back into the index, so invalidation never has to
//! touch this module.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use petgraph::Directed;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::error::{QueryError, QueryResult};
use crate::index::graph::{DefKind, RefId, SrcRange, UsageKind};
use crate::language::LanguageKind;
use crate::project::{FileId, GlobalDefId, GlobalRefId, ProjectIndex};
use crate::resolver::types::TypeResolver;

/// Per-query deadline. Exceeding it aborts the query with a timeout error;
/// in-flight indexing is never cancelled.
#[derive(Debug, Clone, Copy)]
pub struct QueryDeadline(Option<Instant>);

impl QueryDeadline {
    pub fn none() -> Self {
        QueryDeadline(None)
    }

    pub fn after(duration: Duration) -> Self {
        QueryDeadline(Some(Instant::now() + duration))
    }

    pub fn check(&self) -> QueryResult<()> {
        match self.0 {
            Some(deadline) if Instant::now() > deadline => Err(QueryError::Timeout),
            _ => Ok(()),
        }
    }
}

/// The materialised call graph over one snapshot. Node weights are
/// definition ids; edge weights are the call-site references.
pub struct CallGraph {
    graph: StableGraph<GlobalDefId, GlobalRefId, Directed>,
    nodes: HashMap<GlobalDefId, NodeIndex>,
}

impl CallGraph {
    fn node(&mut self, def: GlobalDefId) -> NodeIndex {
        match self.nodes.get(&def) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(def);
                self.nodes.insert(def, idx);
                idx
            }
        }
    }

    pub fn callers_of(&self, def: GlobalDefId) -> Vec<(GlobalDefId, GlobalRefId)> {
        let Some(&idx) = self.nodes.get(&def) else {
            return Vec::new();
        };
        let mut out: Vec<(GlobalDefId, GlobalRefId)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (self.graph[e.source()], *e.weight()))
            .collect();
        out.sort_by_key(|(d, _)| *d);
        out
    }

    pub fn callees_of(&self, def: GlobalDefId) -> Vec<(GlobalDefId, GlobalRefId)> {
        let Some(&idx) = self.nodes.get(&def) else {
            return Vec::new();
        };
        let mut out: Vec<(GlobalDefId, GlobalRefId)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()], *e.weight()))
            .collect();
        out.sort_by_key(|(d, _)| *d);
        out
    }

    pub fn in_degree(&self, def: GlobalDefId) -> usize {
        self.nodes
            .get(&def)
            .map(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }
}

/// Build the call graph for a snapshot: every call-usage reference with a
/// resolved target contributes an edge from its enclosing definition.
/// Member calls resolve lazily through the type resolver here; polymorphic
/// sets contribute one edge per candidate.
pub fn build_call_graph(
    index: &ProjectIndex,
    deadline: &QueryDeadline,
) -> QueryResult<CallGraph> {
    let mut call_graph = CallGraph {
        graph: StableGraph::new(),
        nodes: HashMap::new(),
    };
    let mut types = TypeResolver::new(index);

    for (file, graph) in index.files_ordered() {
        deadline.check()?;
        for (i, reference) in graph.refs.iter().enumerate() {
            if reference.usage != UsageKind::Call {
                continue;
            }
            let ref_id = RefId(i as u32);
            let site = GlobalRefId {
                file,
                reference: ref_id,
            };

            // A call at module top level has no calling definition; it
            // contributes no edge (and so no in-degree).
            let Some(caller_local) = graph.enclosing_def(reference.scope) else {
                continue;
            };
            let caller = GlobalDefId {
                file,
                def: caller_local,
            };

            let targets = resolve_call_targets(index, &mut types, file, ref_id, reference);
            for target in targets {
                let from = call_graph.node(caller);
                let to = call_graph.node(target);
                call_graph.graph.add_edge(from, to, site);
            }
        }
    }

    Ok(call_graph)
}

/// All definitions a call reference can land on: local target, cross-file
/// edge, or receiver-typed member resolution.
fn resolve_call_targets(
    index: &ProjectIndex,
    types: &mut TypeResolver<'_>,
    file: FileId,
    ref_id: RefId,
    reference: &crate::index::graph::Reference,
) -> Vec<GlobalDefId> {
    if reference.receiver.is_some() {
        return types
            .resolve_member(GlobalRefId {
                file,
                reference: ref_id,
            })
            .map(|edge| edge.targets)
            .unwrap_or_default();
    }

    if let Some(local) = reference.local_target {
        let def = index
            .graph(file)
            .map(|g| g.def(local).kind)
            .unwrap_or(DefKind::Variable);
        if def != DefKind::ImportBinding {
            return vec![GlobalDefId { file, def: local }];
        }
    }

    index
        .cross_edges
        .get(&file)
        .and_then(|edges| edges.iter().find(|e| e.source.reference == ref_id))
        .map(|e| e.targets.clone())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Scope restriction for entry-point queries: explicit files and/or folders,
/// both relative to the project root. Empty means the whole project.
#[derive(Debug, Default, Clone)]
pub struct ScopeFilter {
    pub files: Vec<String>,
    pub folders: Vec<String>,
}

impl ScopeFilter {
    pub fn matches(&self, relative_path: &str) -> bool {
        if self.files.is_empty() && self.folders.is_empty() {
            return true;
        }
        self.files.iter().any(|f| relative_path == f)
            || self
                .folders
                .iter()
                .any(|d| relative_path.starts_with(d.trim_end_matches('/')))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryPoint {
    pub file: String,
    pub name: String,
    pub range: SrcRange,
    pub excerpt: String,
}

/// Top-level callables no other definition in the queried scope calls.
/// Test-suite names are filtered by language convention unless opted in.
pub fn list_entrypoints(
    index: &ProjectIndex,
    scope: &ScopeFilter,
    include_tests: bool,
    deadline: &QueryDeadline,
) -> QueryResult<Vec<EntryPoint>> {
    let call_graph = build_call_graph(index, deadline)?;

    let in_scope: HashSet<FileId> = index
        .files()
        .filter(|(id, _)| scope.matches(&index.relative_path(*id)))
        .map(|(id, _)| id)
        .collect();

    let mut out = Vec::new();
    for (file, graph) in index.files_ordered() {
        deadline.check()?;
        if !in_scope.contains(&file) {
            continue;
        }
        for (def_id, def) in graph.defs_in_scope(crate::index::graph::ROOT_SCOPE) {
            if def.kind != DefKind::Function {
                continue;
            }
            if !include_tests && graph.language.is_test_symbol(&def.name) {
                continue;
            }
            let global = GlobalDefId { file, def: def_id };
            let called_from_scope = call_graph
                .callers_of(global)
                .iter()
                .any(|(caller, _)| in_scope.contains(&caller.file));
            if called_from_scope {
                continue;
            }
            out.push(EntryPoint {
                file: index.relative_path(file),
                name: def.name.clone(),
                range: def.range,
                excerpt: graph.excerpt(&def.range),
            });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Neighborhood
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NeighborhoodNode {
    /// Stable node key: `file:name:line`.
    pub id: String,
    pub file: String,
    pub name: String,
    pub kind: DefKind,
    pub range: SrcRange,
    pub excerpt: String,
    /// BFS distance from the queried symbol: negative toward callers,
    /// positive toward callees, 0 for the symbol itself.
    pub distance: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NeighborhoodEdge {
    pub caller: String,
    pub callee: String,
    pub call_site: CallSiteLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallSiteLocation {
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Neighborhood {
    pub nodes: Vec<NeighborhoodNode>,
    pub edges: Vec<NeighborhoodEdge>,
}

pub const DEFAULT_NEIGHBORHOOD_DEPTH: usize = 2;

/// Resolve `symbol_ref` (either `file:name` or a bare name) and BFS outward
/// along call edges up to `depth` in both directions.
pub fn show_call_graph_neighborhood(
    index: &ProjectIndex,
    symbol_ref: &str,
    depth: usize,
    deadline: &QueryDeadline,
) -> QueryResult<Neighborhood> {
    let call_graph = build_call_graph(index, deadline)?;
    let origin = resolve_symbol_ref(index, &call_graph, symbol_ref)?;

    // distance keyed by definition; callers grow negative, callees positive.
    let mut distances: HashMap<GlobalDefId, i64> = HashMap::new();
    let mut edges: HashSet<(GlobalDefId, GlobalDefId, GlobalRefId)> = HashSet::new();
    distances.insert(origin, 0);

    let mut queue: VecDeque<(GlobalDefId, usize, Direction)> = VecDeque::new();
    queue.push_back((origin, 0, Direction::Incoming));
    queue.push_back((origin, 0, Direction::Outgoing));

    while let Some((current, hops, direction)) = queue.pop_front() {
        deadline.check()?;
        if hops == depth {
            continue;
        }
        let next_hops = hops + 1;
        let neighbors = match direction {
            Direction::Incoming => call_graph.callers_of(current),
            Direction::Outgoing => call_graph.callees_of(current),
        };
        for (neighbor, site) in neighbors {
            let (caller, callee) = match direction {
                Direction::Incoming => (neighbor, current),
                Direction::Outgoing => (current, neighbor),
            };
            edges.insert((caller, callee, site));
            if !distances.contains_key(&neighbor) {
                let signed = match direction {
                    Direction::Incoming => -(next_hops as i64),
                    Direction::Outgoing => next_hops as i64,
                };
                distances.insert(neighbor, signed);
                queue.push_back((neighbor, next_hops, direction));
            }
        }
    }

    let mut nodes: Vec<NeighborhoodNode> = distances
        .iter()
        .filter_map(|(&def, &distance)| {
            let graph = index.graph(def.file)?;
            let d = graph.defs.get(def.def.index())?;
            Some(NeighborhoodNode {
                id: node_key(index, def),
                file: index.relative_path(def.file),
                name: d.name.clone(),
                kind: d.kind,
                range: d.range,
                excerpt: graph.excerpt(&d.range),
                distance,
            })
        })
        .collect();
    nodes.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.id.cmp(&b.id)));

    let mut edge_list: Vec<NeighborhoodEdge> = edges
        .into_iter()
        .filter_map(|(caller, callee, site)| {
            let site_ref = index.reference(site)?;
            Some(NeighborhoodEdge {
                caller: node_key(index, caller),
                callee: node_key(index, callee),
                call_site: CallSiteLocation {
                    file: index.relative_path(site.file),
                    line: site_ref.range.start_line,
                },
            })
        })
        .collect();
    edge_list.sort_by(|a, b| {
        a.caller
            .cmp(&b.caller)
            .then(a.callee.cmp(&b.callee))
            .then(a.call_site.line.cmp(&b.call_site.line))
    });

    Ok(Neighborhood {
        nodes,
        edges: edge_list,
    })
}

fn node_key(index: &ProjectIndex, def: GlobalDefId) -> String {
    let file = index.relative_path(def.file);
    match index.def(def) {
        Some(d) => format!("{}:{}:{}", file, d.name, d.range.start_line),
        None => format!("{}:{}", file, def.def),
    }
}

/// `file:name` refs must name the matching file; bare names prefer the
/// definition with the highest call-graph in-degree, then the shorter
/// project-relative path. A tie after both rules is ambiguous.
fn resolve_symbol_ref(
    index: &ProjectIndex,
    call_graph: &CallGraph,
    symbol_ref: &str,
) -> QueryResult<GlobalDefId> {
    const CALLABLE: &[DefKind] = &[DefKind::Function, DefKind::Method, DefKind::Class];

    if let Some((file_part, name)) = symbol_ref.rsplit_once(':') {
        let matching_file = index
            .files_ordered()
            .into_iter()
            .map(|(id, _)| id)
            .find(|&id| {
                let rel = index.relative_path(id);
                rel == file_part || rel.ends_with(file_part)
            });
        let Some(file) = matching_file else {
            // Distinguish "we skipped that file" from "no such file".
            let extension = std::path::Path::new(file_part)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            if !extension.is_empty() && LanguageKind::from_extension(extension).is_none() {
                return Err(QueryError::UnsupportedLanguage(file_part.to_owned()));
            }
            return Err(QueryError::NotFound(symbol_ref.to_owned()));
        };

        let graph = index.graph(file).expect("listed file present");
        let found = graph
            .defs
            .iter()
            .enumerate()
            .find(|(_, d)| d.name == name && CALLABLE.contains(&d.kind))
            .map(|(i, _)| GlobalDefId {
                file,
                def: crate::index::graph::DefId(i as u32),
            });
        return match found {
            Some(def) => Ok(def),
            None => {
                // The name may be an import binding whose target never
                // resolved; that is an unresolved symbol, not a missing one.
                let dangling_binding = graph.defs.iter().enumerate().any(|(i, d)| {
                    d.name == name
                        && d.kind == DefKind::ImportBinding
                        && !index
                            .import_resolutions
                            .get(&file)
                            .is_some_and(|rs| {
                                rs.iter()
                                    .any(|r| r.binding == crate::index::graph::DefId(i as u32))
                            })
                });
                if dangling_binding {
                    Err(QueryError::UnresolvedSymbol(symbol_ref.to_owned()))
                } else if graph.parse_partial {
                    Err(QueryError::ParsePartial(index.relative_path(file)))
                } else {
                    Err(QueryError::NotFound(symbol_ref.to_owned()))
                }
            }
        };
    }

    // Bare name: gather candidates across files.
    let mut candidates: Vec<GlobalDefId> = Vec::new();
    for (file, graph) in index.files_ordered() {
        for (i, def) in graph.defs.iter().enumerate() {
            if def.name == symbol_ref && CALLABLE.contains(&def.kind) {
                candidates.push(GlobalDefId {
                    file,
                    def: crate::index::graph::DefId(i as u32),
                });
            }
        }
    }

    match candidates.len() {
        0 => Err(QueryError::NotFound(symbol_ref.to_owned())),
        1 => Ok(candidates[0]),
        _ => {
            candidates.sort_by(|&a, &b| {
                call_graph
                    .in_degree(b)
                    .cmp(&call_graph.in_degree(a))
                    .then_with(|| {
                        index
                            .relative_path(a.file)
                            .len()
                            .cmp(&index.relative_path(b.file).len())
                    })
            });
            let best = candidates[0];
            let runner_up = candidates[1];
            let tied = call_graph.in_degree(best) == call_graph.in_degree(runner_up)
                && index.relative_path(best.file).len()
                    == index.relative_path(runner_up.file).len();
            if tied {
                Err(QueryError::AmbiguousSymbol {
                    name: symbol_ref.to_owned(),
                    candidates: candidates
                        .iter()
                        .map(|c| node_key(index, *c))
                        .collect(),
                })
            } else {
                Ok(best)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use crate::index::index_file;
    use crate::project::ProjectIndex;
    use crate::resolver::resolve_all;

    fn resolved_project(files: &[(&str, &str)]) -> ProjectIndex {
        let root = PathBuf::from("/proj");
        let mut index = ProjectIndex::new(root.clone());
        for (rel, source) in files {
            let path = root.join(rel);
            let language = LanguageKind::from_path(&path).expect("known language");
            index.insert(index_file(&path, source, language));
        }
        resolve_all(&mut index);
        index
    }

    #[test]
    fn test_intra_file_call_edge() {
        let index = resolved_project(&[(
            "app.py",
            "def helper():\n    pass\n\ndef caller():\n    helper()\n",
        )]);
        let graph = build_call_graph(&index, &QueryDeadline::none()).unwrap();
        let file = index.file_id(Path::new("/proj/app.py")).unwrap();
        let fg = index.graph(file).unwrap();
        let helper = fg.defs.iter().position(|d| d.name == "helper").unwrap();
        let helper_id = GlobalDefId {
            file,
            def: crate::index::graph::DefId(helper as u32),
        };

        let callers = graph.callers_of(helper_id);
        assert_eq!(callers.len(), 1);
        assert_eq!(index.def(callers[0].0).unwrap().name, "caller");
    }

    #[test]
    fn test_entrypoints_exclude_called_functions() {
        let index = resolved_project(&[(
            "app.py",
            "def helper():\n    pass\n\ndef main():\n    helper()\n",
        )]);
        let entrypoints = list_entrypoints(
            &index,
            &ScopeFilter::default(),
            false,
            &QueryDeadline::none(),
        )
        .unwrap();
        let names: Vec<&str> = entrypoints.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"main"), "main is uncalled: entry point");
        assert!(!names.contains(&"helper"), "helper is called: not an entry point");
    }

    #[test]
    fn test_entrypoints_filter_test_names_by_default() {
        let index = resolved_project(&[(
            "app.py",
            "def main():\n    pass\n\ndef test_main():\n    pass\n",
        )]);
        let without = list_entrypoints(
            &index,
            &ScopeFilter::default(),
            false,
            &QueryDeadline::none(),
        )
        .unwrap();
        assert!(without.iter().all(|e| e.name != "test_main"));

        let with = list_entrypoints(
            &index,
            &ScopeFilter::default(),
            true,
            &QueryDeadline::none(),
        )
        .unwrap();
        assert!(with.iter().any(|e| e.name == "test_main"));
    }

    #[test]
    fn test_module_level_call_does_not_disqualify_entry_point() {
        let index = resolved_project(&[(
            "app.py",
            "def main():\n    pass\n\nif __name__ == \"__main__\":\n    main()\n",
        )]);
        let entrypoints = list_entrypoints(
            &index,
            &ScopeFilter::default(),
            false,
            &QueryDeadline::none(),
        )
        .unwrap();
        assert!(
            entrypoints.iter().any(|e| e.name == "main"),
            "module-level call sites come from no definition"
        );
    }

    #[test]
    fn test_neighborhood_depth_one_is_symmetric() {
        let index = resolved_project(&[(
            "app.py",
            "def callee():\n    pass\n\ndef caller():\n    callee()\n",
        )]);

        let around_caller =
            show_call_graph_neighborhood(&index, "app.py:caller", 1, &QueryDeadline::none())
                .unwrap();
        let around_callee =
            show_call_graph_neighborhood(&index, "app.py:callee", 1, &QueryDeadline::none())
                .unwrap();

        assert!(
            around_caller.nodes.iter().any(|n| n.name == "callee"),
            "callee in caller's neighborhood"
        );
        assert!(
            around_callee.nodes.iter().any(|n| n.name == "caller"),
            "caller in callee's neighborhood (symmetry at depth 1)"
        );
        assert_eq!(around_caller.edges.len(), 1);
        assert_eq!(around_callee.edges.len(), 1);
        assert_eq!(
            around_caller.edges[0].caller, around_callee.edges[0].caller,
            "same edge from both sides"
        );
    }

    #[test]
    fn test_neighborhood_depth_bounds_traversal() {
        let index = resolved_project(&[(
            "app.py",
            "def a():\n    b()\n\ndef b():\n    c()\n\ndef c():\n    pass\n",
        )]);
        let shallow =
            show_call_graph_neighborhood(&index, "app.py:a", 1, &QueryDeadline::none()).unwrap();
        assert!(shallow.nodes.iter().any(|n| n.name == "b"));
        assert!(
            !shallow.nodes.iter().any(|n| n.name == "c"),
            "depth 1 stops before c"
        );

        let deep =
            show_call_graph_neighborhood(&index, "app.py:a", 2, &QueryDeadline::none()).unwrap();
        assert!(deep.nodes.iter().any(|n| n.name == "c"));
        let c_node = deep.nodes.iter().find(|n| n.name == "c").unwrap();
        assert_eq!(c_node.distance, 2);
    }

    #[test]
    fn test_symbol_ref_not_found() {
        let index = resolved_project(&[("app.py", "def main():\n    pass\n")]);
        let err =
            show_call_graph_neighborhood(&index, "app.py:ghost", 1, &QueryDeadline::none())
                .unwrap_err();
        assert_eq!(err.kind(), "not-found");
    }

    #[test]
    fn test_dangling_import_binding_is_unresolved_symbol() {
        let index = resolved_project(&[("main.py", "from ghostlib import phantom\n")]);
        let err =
            show_call_graph_neighborhood(&index, "main.py:phantom", 1, &QueryDeadline::none())
                .unwrap_err();
        assert_eq!(err.kind(), "unresolved-symbol");
    }

    #[test]
    fn test_bare_name_prefers_higher_in_degree() {
        let index = resolved_project(&[
            ("popular.py", "def target():\n    pass\n"),
            ("lonely.py", "def target():\n    pass\n"),
            (
                "users.py",
                "from popular import target\n\ndef u1():\n    target()\n\ndef u2():\n    target()\n",
            ),
        ]);
        let neighborhood =
            show_call_graph_neighborhood(&index, "target", 1, &QueryDeadline::none()).unwrap();
        let origin = neighborhood
            .nodes
            .iter()
            .find(|n| n.distance == 0)
            .unwrap();
        assert!(
            origin.file.ends_with("popular.py"),
            "in-degree tie-break must pick the called definition"
        );
    }

    #[test]
    fn test_ambiguous_bare_name_errors() {
        let index = resolved_project(&[
            ("aa.py", "def twin():\n    pass\n"),
            ("bb.py", "def twin():\n    pass\n"),
        ]);
        let err = show_call_graph_neighborhood(&index, "twin", 1, &QueryDeadline::none())
            .unwrap_err();
        assert_eq!(err.kind(), "ambiguous-symbol");
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let index = resolved_project(&[("app.py", "def main():\n    pass\n")]);
        let deadline = QueryDeadline::after(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        let err = show_call_graph_neighborhood(&index, "app.py:main", 1, &deadline).unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_method_call_through_instance_contributes_edge() {
        let index = resolved_project(&[(
            "app.py",
            "class Worker:\n    def run(self):\n        pass\n\ndef main():\n    w = Worker()\n    w.run()\n",
        )]);
        let neighborhood =
            show_call_graph_neighborhood(&index, "app.py:main", 1, &QueryDeadline::none())
                .unwrap();
        assert!(
            neighborhood.nodes.iter().any(|n| n.name == "run"),
            "member call resolves through the receiver type"
        );
    }
}
