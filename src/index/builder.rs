//! Single-file indexing: parse one file, run its language's query pack, and
//! produce the local scope graph with intra-file resolution applied.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use tree_sitter::{Node, Parser, QueryCursor, StreamingIterator, Tree};
use xxhash_rust::xxh64::xxh64;

use crate::language::LanguageKind;
use super::graph::{
    AssignedExpr, DefId, DefKind, DefOrigin, Definition, FileGraph, ImportId, ImportStyle,
    RefId, Reference, ROOT_SCOPE, Scope, ScopeId, ScopeKind, SrcRange, UsageKind,
};
use super::range_of;

// One Parser per (thread, language) — rayon workers never contend on a lock,
// and the watcher path reuses its own thread's instances.
thread_local! {
    static PARSERS: RefCell<HashMap<LanguageKind, Parser>> = RefCell::new(HashMap::new());
}

fn parse_with_thread_parser(language: LanguageKind, source: &[u8]) -> Option<Tree> {
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = parsers.entry(language).or_insert_with(|| {
            let mut p = Parser::new();
            p.set_language(&language.grammar())
                .expect("grammar/language version mismatch");
            p
        });
        parser.parse(source, None)
    })
}

/// Index one file into its local scope graph.
///
/// Never fails: a file tree-sitter cannot parse degrades to an empty graph
/// (present in the index, no definitions, no references), and individual
/// query matches that do not decompose cleanly are skipped.
pub fn index_file(path: &Path, source: &str, language: LanguageKind) -> FileGraph {
    let content_hash = xxh64(source.as_bytes(), 0);
    let shared_source: Arc<str> = Arc::from(source);

    let Some(tree) = parse_with_thread_parser(language, source.as_bytes()) else {
        warn!(path = %path.display(), "tree-sitter returned no tree, downgrading to empty graph");
        return FileGraph::empty(path.to_owned(), language, content_hash, shared_source);
    };

    let parse_partial = tree.root_node().has_error();
    if parse_partial {
        debug!(path = %path.display(), "parse errors present, indexing best-effort");
    }

    let mut builder = Builder {
        language,
        source: source.as_bytes(),
        graph: FileGraph {
            path: path.to_owned(),
            language,
            content_hash,
            source: shared_source,
            scopes: Vec::new(),
            defs: Vec::new(),
            refs: Vec::new(),
            imports: Vec::new(),
            scope_owner: Vec::new(),
            export_list: None,
            parse_partial,
        },
        ref_by_range: HashMap::new(),
        def_name_ranges: HashSet::new(),
        import_ranges: Vec::new(),
        pending_values: Vec::new(),
        pending_bases: Vec::new(),
        pending_receivers: Vec::new(),
    };

    builder.collect_scopes(&tree);
    builder.collect_imports(&tree);
    builder.collect_defs(&tree);
    builder.collect_refs(&tree);
    builder.link_pending();
    builder.resolve_locals();
    builder.graph
}

struct Builder<'s> {
    language: LanguageKind,
    source: &'s [u8],
    graph: FileGraph,
    /// Name-node byte range -> reference, for linking chains and RHS values.
    ref_by_range: HashMap<(usize, usize), RefId>,
    /// Name-node ranges of definitions; identifier reads there are not refs.
    def_name_ranges: HashSet<(usize, usize)>,
    /// Import statement ranges; identifiers inside are bindings, not refs.
    import_ranges: Vec<SrcRange>,
    /// (def, RHS summary keyed by the value node) awaiting reference ids.
    pending_values: Vec<(DefId, PendingValue)>,
    /// (class def, tail-name ranges of its base expressions).
    pending_bases: Vec<(DefId, Vec<(usize, usize)>)>,
    /// (member ref, tail-name range of its receiver expression).
    pending_receivers: Vec<(RefId, (usize, usize))>,
}

enum PendingValue {
    Literal(&'static str),
    Call((usize, usize)),
    Name((usize, usize)),
}

impl<'s> Builder<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    // -----------------------------------------------------------------------
    // Pass 1: scopes
    // -----------------------------------------------------------------------

    fn collect_scopes(&mut self, tree: &Tree) {
        let pack = self.language.pack();
        let root = tree.root_node();

        self.graph.scopes.push(Scope {
            kind: ScopeKind::Module,
            parent: None,
            range: range_of(root),
        });

        let mut found: Vec<(SrcRange, ScopeKind)> = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&pack.scopes, root, self.source);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let name = pack.scopes.capture_names()[capture.index as usize];
                let Some(kind) = scope_kind_of_capture(name) else {
                    continue;
                };
                found.push((range_of(capture.node), kind));
            }
        }

        // Parents before children: outer ranges first, ties broken widest-first.
        found.sort_by(|a, b| {
            a.0.start_byte
                .cmp(&b.0.start_byte)
                .then(b.0.end_byte.cmp(&a.0.end_byte))
        });
        found.dedup_by_key(|(range, _)| (range.start_byte, range.end_byte));

        let mut stack: Vec<ScopeId> = vec![ROOT_SCOPE];
        for (range, kind) in found {
            while stack.len() > 1 {
                let top = *stack.last().expect("stack is never empty");
                if self.graph.scope(top).range.contains(&range) {
                    break;
                }
                stack.pop();
            }
            let parent = *stack.last().expect("root always on stack");
            let id = ScopeId(self.graph.scopes.len() as u32);
            self.graph.scopes.push(Scope {
                kind,
                parent: Some(parent),
                range,
            });
            stack.push(id);
        }

        self.graph.scope_owner = vec![None; self.graph.scopes.len()];
    }

    /// Innermost scope containing a byte offset.
    fn scope_at(&self, byte: usize) -> ScopeId {
        let mut best = ROOT_SCOPE;
        let mut best_width = usize::MAX;
        for (i, scope) in self.graph.scopes.iter().enumerate() {
            if scope.range.start_byte <= byte && byte < scope.range.end_byte {
                let width = scope.range.end_byte - scope.range.start_byte;
                if width < best_width {
                    best = ScopeId(i as u32);
                    best_width = width;
                }
            }
        }
        best
    }

    /// Scope whose range equals `range`, if the declaration introduced one.
    fn scope_with_range(&self, range: &SrcRange) -> Option<ScopeId> {
        self.graph
            .scopes
            .iter()
            .position(|s| s.range.start_byte == range.start_byte && s.range.end_byte == range.end_byte)
            .map(|i| ScopeId(i as u32))
    }

    // -----------------------------------------------------------------------
    // Pass 2: imports (before defs and refs so their ranges can be excluded)
    // -----------------------------------------------------------------------

    fn collect_imports(&mut self, tree: &Tree) {
        let pack = self.language.pack();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&pack.imports, tree.root_node(), self.source);

        let mut statements = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                statements.extend(self.language.decompose_import(capture.node, self.source));
            }
        }
        statements.sort_by_key(|s| s.range.start_byte);
        statements.dedup_by_key(|s| (s.range.start_byte, s.module_path.clone(), s.names.clone()));

        for stmt in statements {
            self.import_ranges.push(stmt.range);
            let import_id = ImportId(self.graph.imports.len() as u32);
            let range = stmt.range;
            let style = stmt.style;
            let reexport = stmt.reexport;

            for imported in &stmt.names {
                let (local, source_name) = match style {
                    ImportStyle::Namespace => {
                        (namespace_binding_name(self.language, imported), None)
                    }
                    _ => (
                        imported.local_name().to_owned(),
                        Some(imported.name.clone()),
                    ),
                };
                let visible = match self.language {
                    LanguageKind::Python => self.language.default_visible(&local),
                    _ => reexport,
                };
                self.graph.defs.push(Definition {
                    name: local,
                    kind: DefKind::ImportBinding,
                    scope: ROOT_SCOPE,
                    range,
                    name_range: range,
                    declared_type: None,
                    assigned: None,
                    body_scope: None,
                    bases: Vec::new(),
                    visible,
                    interface_like: false,
                    hoisted: self.language.hoists(DefKind::ImportBinding),
                    origin: DefOrigin::Import {
                        import_id,
                        source_name,
                    },
                });
            }
            self.graph.imports.push(stmt);
        }
    }

    // -----------------------------------------------------------------------
    // Pass 3: definitions
    // -----------------------------------------------------------------------

    fn collect_defs(&mut self, tree: &Tree) {
        let pack = self.language.pack();
        let def_idx = pack
            .definitions
            .capture_index_for_name("def")
            .expect("definitions query must have @def");
        let name_idx = pack
            .definitions
            .capture_index_for_name("name")
            .expect("definitions query must have @name");
        let type_idx = pack.definitions.capture_index_for_name("type");
        let rettype_idx = pack.definitions.capture_index_for_name("rettype");
        let value_idx = pack.definitions.capture_index_for_name("value");
        let bases_idx = pack.definitions.capture_index_for_name("bases");

        struct RawDef<'t> {
            def_node: Node<'t>,
            name_node: Node<'t>,
            type_node: Option<Node<'t>>,
            value_node: Option<Node<'t>>,
            bases_node: Option<Node<'t>>,
        }

        let mut raw: Vec<RawDef<'_>> = Vec::new();
        let mut seen: HashMap<(usize, usize), usize> = HashMap::new();

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&pack.definitions, tree.root_node(), self.source);
        while let Some(m) = matches.next() {
            let mut def_node = None;
            let mut name_node = None;
            let mut type_node = None;
            let mut value_node = None;
            let mut bases_node = None;
            for capture in m.captures {
                let idx = Some(capture.index);
                if capture.index == def_idx {
                    def_node = Some(capture.node);
                } else if capture.index == name_idx {
                    name_node = Some(capture.node);
                } else if idx == type_idx || idx == rettype_idx {
                    type_node = Some(capture.node);
                } else if idx == value_idx {
                    value_node = Some(capture.node);
                } else if idx == bases_idx {
                    bases_node = Some(capture.node);
                }
            }
            let (Some(def_node), Some(name_node)) = (def_node, name_node) else {
                continue;
            };
            // Overlapping patterns re-match the same binding site; merge
            // their optional captures rather than dropping any.
            let key = (name_node.start_byte(), def_node.start_byte());
            match seen.get(&key) {
                Some(&at) => {
                    let existing = &mut raw[at];
                    existing.type_node = existing.type_node.or(type_node);
                    existing.value_node = existing.value_node.or(value_node);
                    existing.bases_node = existing.bases_node.or(bases_node);
                }
                None => {
                    seen.insert(key, raw.len());
                    raw.push(RawDef {
                        def_node,
                        name_node,
                        type_node,
                        value_node,
                        bases_node,
                    });
                }
            }
        }

        raw.sort_by_key(|d| (d.name_node.start_byte(), d.def_node.start_byte()));

        for d in raw {
            let Some(mut kind) = self.language.def_kind_of_node(d.def_node.kind()) else {
                continue;
            };
            let name = self.text(d.name_node).to_owned();
            let def_range = range_of(d.def_node);
            let name_range = range_of(d.name_node);

            // A declaration that introduces its own scope (function, class)
            // binds its name in the parent scope. Parameters and variables
            // stay where they are.
            let mut scope = self.scope_at(name_range.start_byte);
            let mut body_scope = None;
            if matches!(kind, DefKind::Function | DefKind::Class) {
                body_scope = self.scope_with_range(&def_range);
                if let Some(own) = body_scope
                    && own == scope
                {
                    scope = self.graph.scope(own).parent.unwrap_or(ROOT_SCOPE);
                }
            }

            // A variable whose value is a function expression IS a function
            // (`const walk = () => ...`, `f = lambda: ...`); it owns the
            // value's scope so calls in the body attribute to it.
            if kind == DefKind::Variable
                && let Some(value) = d.value_node
                && matches!(
                    value.kind(),
                    "arrow_function" | "function_expression" | "lambda"
                )
            {
                kind = DefKind::Function;
                body_scope = self.scope_with_range(&range_of(value));
            }

            if kind == DefKind::Function && self.graph.scope(scope).kind == ScopeKind::Class {
                kind = DefKind::Method;
            }

            let declared_type = d.type_node.map(|n| clean_type_text(self.text(n)));
            let interface_like = self.language.interface_like_node(d.def_node.kind());
            let visible = scope == ROOT_SCOPE && self.language.def_visible(d.def_node, &name)
                || (self.language == LanguageKind::Python
                    && self.language.default_visible(&name)
                    && kind != DefKind::Parameter);

            let id = DefId(self.graph.defs.len() as u32);
            self.def_name_ranges
                .insert((name_range.start_byte, name_range.end_byte));

            if let Some(value) = d.value_node {
                if name == "__all__" && scope == ROOT_SCOPE {
                    self.graph.export_list = extract_export_list(value, self.source);
                }
                if let Some(pending) = self.classify_value(value) {
                    self.pending_values.push((id, pending));
                }
            }
            if let Some(bases) = d.bases_node {
                let tails: Vec<(usize, usize)> = self
                    .language
                    .base_candidates(bases)
                    .into_iter()
                    .filter_map(|b| tail_name_node(b))
                    .map(|n| (n.start_byte(), n.end_byte()))
                    .collect();
                self.pending_bases.push((id, tails));
            }

            self.graph.defs.push(Definition {
                name,
                kind,
                scope,
                range: def_range,
                name_range,
                declared_type,
                assigned: None,
                body_scope,
                bases: Vec::new(),
                visible,
                interface_like,
                hoisted: self.language.hoists(kind),
                origin: DefOrigin::Source,
            });

            if let Some(own) = body_scope {
                self.graph.scope_owner[own.index()] = Some(id);
            }
        }
    }

    fn classify_value(&self, value: Node<'_>) -> Option<PendingValue> {
        if let Some(prim) = self.language.literal_primitive(value.kind()) {
            return Some(PendingValue::Literal(prim));
        }
        match value.kind() {
            "call" | "call_expression" | "new_expression" | "struct_expression" => {
                let callee = value
                    .child_by_field_name("function")
                    .or_else(|| value.child_by_field_name("constructor"))
                    .or_else(|| value.child_by_field_name("name"))?;
                let tail = tail_name_node(callee)?;
                Some(PendingValue::Call((tail.start_byte(), tail.end_byte())))
            }
            "identifier" => Some(PendingValue::Name((
                value.start_byte(),
                value.end_byte(),
            ))),
            "attribute" | "member_expression" | "field_expression" => {
                let tail = tail_name_node(value)?;
                Some(PendingValue::Name((tail.start_byte(), tail.end_byte())))
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Pass 4: references
    // -----------------------------------------------------------------------

    fn collect_refs(&mut self, tree: &Tree) {
        let pack = self.language.pack();

        struct RawRef<'t> {
            node: Node<'t>,
            usage: UsageKind,
            priority: u8,
            is_member: bool,
        }

        let mut by_range: HashMap<(usize, usize), RawRef<'_>> = HashMap::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&pack.references, tree.root_node(), self.source);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let capture_name = pack.references.capture_names()[capture.index as usize];
                let (usage, priority, is_member) = match capture_name {
                    "ref.call" => (UsageKind::Call, 3, false),
                    "ref.callmember" => (UsageKind::Call, 3, true),
                    "ref.member" => (UsageKind::MemberAccess, 2, true),
                    "ref.type" => (UsageKind::TypeAnnotation, 1, false),
                    "ref.read" => (UsageKind::Read, 0, false),
                    _ => continue,
                };
                let key = (capture.node.start_byte(), capture.node.end_byte());
                let replace = by_range
                    .get(&key)
                    .map(|existing| priority > existing.priority)
                    .unwrap_or(true);
                if replace {
                    by_range.insert(
                        key,
                        RawRef {
                            node: capture.node,
                            usage,
                            priority,
                            is_member,
                        },
                    );
                }
            }
        }

        let mut raw: Vec<RawRef<'_>> = by_range.into_values().collect();
        raw.sort_by_key(|r| r.node.start_byte());

        for r in raw {
            let key = (r.node.start_byte(), r.node.end_byte());
            // Definition names and import internals are binding sites.
            if self.def_name_ranges.contains(&key) {
                continue;
            }
            if self
                .import_ranges
                .iter()
                .any(|imp| imp.start_byte <= key.0 && key.1 <= imp.end_byte)
            {
                continue;
            }

            let range = range_of(r.node);
            let id = RefId(self.graph.refs.len() as u32);
            self.graph.refs.push(Reference {
                name: self.text(r.node).to_owned(),
                usage: r.usage,
                scope: self.scope_at(range.start_byte),
                range,
                receiver: None,
                local_target: None,
            });
            self.ref_by_range.insert(key, id);

            if r.is_member
                && let Some(parent) = r.node.parent()
                && let Some(object) = parent
                    .child_by_field_name("object")
                    .or_else(|| parent.child_by_field_name("value"))
                && let Some(tail) = tail_name_node(object)
            {
                self.pending_receivers
                    .push((id, (tail.start_byte(), tail.end_byte())));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pass 5: link deferred cross-arena references
    // -----------------------------------------------------------------------

    fn link_pending(&mut self) {
        for (def_id, pending) in std::mem::take(&mut self.pending_values) {
            let assigned = match pending {
                PendingValue::Literal(prim) => Some(AssignedExpr::Literal(prim)),
                PendingValue::Call(key) => self
                    .ref_by_range
                    .get(&key)
                    .map(|&r| AssignedExpr::Call { callee: r }),
                PendingValue::Name(key) => self
                    .ref_by_range
                    .get(&key)
                    .map(|&r| AssignedExpr::Name(r)),
            };
            self.graph.defs[def_id.index()].assigned = assigned;
        }

        for (def_id, tails) in std::mem::take(&mut self.pending_bases) {
            let mut bases = Vec::new();
            let mut protocol_base = false;
            for key in tails {
                if let Some(&ref_id) = self.ref_by_range.get(&key) {
                    let base_name = self.graph.refs[ref_id.index()].name.clone();
                    if matches!(base_name.as_str(), "Protocol" | "ABC") {
                        protocol_base = true;
                    }
                    bases.push(ref_id);
                }
            }
            let def = &mut self.graph.defs[def_id.index()];
            def.bases = bases;
            if protocol_base {
                def.interface_like = true;
            }
        }

        for (ref_id, key) in std::mem::take(&mut self.pending_receivers) {
            if let Some(&receiver) = self.ref_by_range.get(&key) {
                self.graph.refs[ref_id.index()].receiver = Some(receiver);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Pass 6: intra-file lexical resolution
    // -----------------------------------------------------------------------

    /// Climb scopes outward from each reference until a matching definition
    /// is found. Within a scope the latest definition preceding the reference
    /// wins (re-assignment produces a fresh definition); hoisted kinds match
    /// regardless of position. Class scopes are transparent only to
    /// references written directly in them — a method body does not see its
    /// class's other members without a receiver.
    fn resolve_locals(&mut self) {
        let resolutions: Vec<(usize, DefId)> = self
            .graph
            .refs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.receiver.is_none())
            .filter_map(|(i, r)| self.lookup_lexical(r).map(|d| (i, d)))
            .collect();
        for (i, def) in resolutions {
            self.graph.refs[i].local_target = Some(def);
        }
    }

    fn lookup_lexical(&self, reference: &Reference) -> Option<DefId> {
        for scope in self.graph.scope_chain(reference.scope) {
            if self.graph.scope(scope).kind == ScopeKind::Class && scope != reference.scope {
                continue;
            }
            let mut latest_preceding: Option<DefId> = None;
            let mut hoisted: Option<DefId> = None;
            for (id, def) in self.graph.defs_in_scope(scope) {
                if def.name != reference.name {
                    continue;
                }
                if def.name_range.start_byte <= reference.range.start_byte {
                    let later = latest_preceding
                        .map(|cur| {
                            self.graph.def(cur).name_range.start_byte
                                <= def.name_range.start_byte
                        })
                        .unwrap_or(true);
                    if later {
                        latest_preceding = Some(id);
                    }
                } else if def.hoisted && hoisted.is_none() {
                    hoisted = Some(id);
                }
            }
            if let Some(found) = latest_preceding.or(hoisted) {
                return Some(found);
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Local name bound by a namespace-style import: the alias when present,
/// otherwise the first path segment (`import a.b.c` binds `a`).
fn namespace_binding_name(
    language: LanguageKind,
    imported: &crate::index::graph::ImportedName,
) -> String {
    if let Some(alias) = &imported.alias {
        return alias.clone();
    }
    let sep = if language == LanguageKind::Rust { "::" } else { "." };
    imported
        .name
        .split(sep)
        .next()
        .unwrap_or(&imported.name)
        .to_owned()
}

fn scope_kind_of_capture(capture_name: &str) -> Option<ScopeKind> {
    match capture_name {
        "scope.function" => Some(ScopeKind::Function),
        "scope.class" => Some(ScopeKind::Class),
        "scope.block" => Some(ScopeKind::Block),
        "scope.comprehension" => Some(ScopeKind::Comprehension),
        _ => None,
    }
}

/// The identifier that names the tail of an expression: `c` for `a.b.c`,
/// `foo` for `foo(...)`, `List` for `List[Foo]`.
fn tail_name_node<'t>(node: Node<'t>) -> Option<Node<'t>> {
    match node.kind() {
        "identifier" | "type_identifier" | "property_identifier" | "field_identifier" => {
            Some(node)
        }
        "attribute" => node.child_by_field_name("attribute"),
        "member_expression" => node.child_by_field_name("property"),
        "field_expression" => node.child_by_field_name("field"),
        "call" | "call_expression" | "new_expression" => node
            .child_by_field_name("function")
            .or_else(|| node.child_by_field_name("constructor"))
            .and_then(tail_name_node),
        "subscript" => node.child_by_field_name("value").and_then(tail_name_node),
        "generic_type" => node.child_by_field_name("name"),
        "scoped_identifier" => node.child_by_field_name("name"),
        "parenthesized_expression" => node.named_child(0).and_then(tail_name_node),
        _ => None,
    }
}

/// Annotation text arrives as written (`: int`, `-> str`); keep the bare
/// expression.
fn clean_type_text(text: &str) -> String {
    text.trim_start_matches([':', '-', '>'])
        .trim()
        .to_owned()
}

/// `__all__ = ["a", "b"]` — the authoritative export list.
fn extract_export_list(value: Node<'_>, source: &[u8]) -> Option<Vec<String>> {
    if !matches!(value.kind(), "list" | "tuple") {
        return None;
    }
    let mut names = Vec::new();
    let mut cursor = value.walk();
    for child in value.named_children(&mut cursor) {
        if child.kind() == "string" {
            let text = child
                .utf8_text(source)
                .unwrap_or("")
                .trim_matches(|c| c == '"' || c == '\'');
            names.push(text.to_owned());
        }
    }
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_python(source: &str) -> FileGraph {
        index_file(Path::new("test.py"), source, LanguageKind::Python)
    }

    fn def_named<'g>(graph: &'g FileGraph, name: &str) -> &'g Definition {
        graph
            .defs
            .iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("definition '{name}' not found"))
    }

    fn ref_named<'g>(graph: &'g FileGraph, name: &str) -> (RefId, &'g Reference) {
        graph
            .refs
            .iter()
            .enumerate()
            .find(|(_, r)| r.name == name)
            .map(|(i, r)| (RefId(i as u32), r))
            .unwrap_or_else(|| panic!("reference '{name}' not found"))
    }

    #[test]
    fn test_intra_file_call_resolves() {
        let graph = index_python("def helper():\n    pass\n\ndef caller():\n    helper()\n");
        let (_, helper_ref) = ref_named(&graph, "helper");
        assert_eq!(helper_ref.usage, UsageKind::Call);
        let target = helper_ref.local_target.expect("helper() should resolve locally");
        assert_eq!(graph.def(target).name, "helper");
        assert_eq!(graph.def(target).kind, DefKind::Function);
    }

    #[test]
    fn test_local_def_shadows_import() {
        let source = "from utils import helper\n\ndef helper():\n    pass\n\nhelper()\n";
        let graph = index_python(source);
        let call = graph
            .refs
            .iter()
            .find(|r| r.name == "helper" && r.usage == UsageKind::Call)
            .expect("call ref");
        let target = call.local_target.expect("resolves locally");
        // The source definition, not the import binding, wins.
        assert_eq!(graph.def(target).kind, DefKind::Function);
        assert_eq!(graph.def(target).origin, DefOrigin::Source);
    }

    #[test]
    fn test_reassignment_binds_latest_preceding() {
        let source = "x = 1\nprint(x)\nx = \"two\"\nprint(x)\n";
        let graph = index_python(source);
        let x_defs: Vec<DefId> = graph
            .defs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.name == "x")
            .map(|(i, _)| DefId(i as u32))
            .collect();
        assert_eq!(x_defs.len(), 2, "each assignment is a definition");

        let x_reads: Vec<&Reference> = graph
            .refs
            .iter()
            .filter(|r| r.name == "x" && r.usage == UsageKind::Read)
            .collect();
        assert_eq!(x_reads.len(), 2);
        assert_eq!(x_reads[0].local_target, Some(x_defs[0]));
        assert_eq!(x_reads[1].local_target, Some(x_defs[1]));
    }

    #[test]
    fn test_function_call_before_definition_hoists() {
        let source = "def caller():\n    return helper()\n\ndef helper():\n    return 1\n";
        let graph = index_python(source);
        let call = graph
            .refs
            .iter()
            .find(|r| r.name == "helper" && r.usage == UsageKind::Call)
            .expect("call ref");
        let target = call.local_target.expect("hoisted function resolves");
        assert_eq!(graph.def(target).name, "helper");
    }

    #[test]
    fn test_method_attaches_to_class_scope() {
        let source = "class Indexer:\n    def run(self):\n        pass\n";
        let graph = index_python(source);
        let run = def_named(&graph, "run");
        assert_eq!(run.kind, DefKind::Method);
        assert_eq!(graph.scope(run.scope).kind, ScopeKind::Class);
        let class_def = def_named(&graph, "Indexer");
        assert_eq!(class_def.kind, DefKind::Class);
        assert_eq!(class_def.body_scope, Some(run.scope));
    }

    #[test]
    fn test_method_body_does_not_see_sibling_methods_bare() {
        let source = "class C:\n    def a(self):\n        pass\n    def b(self):\n        a()\n";
        let graph = index_python(source);
        let call = graph
            .refs
            .iter()
            .find(|r| r.name == "a" && r.usage == UsageKind::Call)
            .expect("call ref");
        assert_eq!(
            call.local_target, None,
            "class scope is skipped from method bodies"
        );
    }

    #[test]
    fn test_member_chain_records_receiver() {
        let source = "import subpkg.processor as proc\nproc.process_batch()\n";
        let graph = index_python(source);
        let (proc_id, proc_ref) = ref_named(&graph, "proc");
        assert_eq!(proc_ref.usage, UsageKind::Read);
        let (_, member) = ref_named(&graph, "process_batch");
        assert_eq!(member.usage, UsageKind::Call);
        assert_eq!(member.receiver, Some(proc_id));
        // The root of the chain resolves to the import binding.
        let target = proc_ref.local_target.expect("proc binds locally");
        assert_eq!(graph.def(target).kind, DefKind::ImportBinding);
    }

    #[test]
    fn test_class_bases_recorded_in_order() {
        let source = "class Base:\n    pass\n\nclass Mixin:\n    pass\n\nclass Derived(Base, Mixin):\n    pass\n";
        let graph = index_python(source);
        let derived = def_named(&graph, "Derived");
        assert_eq!(derived.bases.len(), 2);
        assert_eq!(graph.reference(derived.bases[0]).name, "Base");
        assert_eq!(graph.reference(derived.bases[1]).name, "Mixin");
    }

    #[test]
    fn test_protocol_base_marks_interface_like() {
        let source = "from typing import Protocol\n\nclass Handler(Protocol):\n    def process(self):\n        ...\n";
        let graph = index_python(source);
        assert!(def_named(&graph, "Handler").interface_like);
    }

    #[test]
    fn test_assignment_value_summaries() {
        let source = "name = \"ada\"\ncount = 3\nworker = Worker()\nalias = worker\n";
        let graph = index_python(source);
        assert_eq!(
            def_named(&graph, "name").assigned,
            Some(AssignedExpr::Literal("str"))
        );
        assert_eq!(
            def_named(&graph, "count").assigned,
            Some(AssignedExpr::Literal("int"))
        );
        match def_named(&graph, "worker").assigned {
            Some(AssignedExpr::Call { callee }) => {
                assert_eq!(graph.reference(callee).name, "Worker");
            }
            ref other => panic!("expected constructor-call summary, got {other:?}"),
        }
        match def_named(&graph, "alias").assigned {
            Some(AssignedExpr::Name(r)) => assert_eq!(graph.reference(r).name, "worker"),
            ref other => panic!("expected name-copy summary, got {other:?}"),
        }
    }

    #[test]
    fn test_dunder_all_export_list() {
        let source = "__all__ = [\"run\", \"Indexer\"]\n\ndef run():\n    pass\n";
        let graph = index_python(source);
        assert_eq!(
            graph.export_list,
            Some(vec!["run".to_owned(), "Indexer".to_owned()])
        );
    }

    #[test]
    fn test_parse_failure_degrades_to_empty_graph() {
        let graph = index_python("def broken(:\n    ???\n");
        assert!(graph.parse_partial);
        // Best-effort: whatever indexed, the graph is present and usable.
        assert_eq!(graph.scopes[0].kind, ScopeKind::Module);
    }

    #[test]
    fn test_unchanged_content_hashes_identically() {
        let a = index_python("def f():\n    pass\n");
        let b = index_python("def f():\n    pass\n");
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.defs.len(), b.defs.len());
        assert_eq!(a.refs.len(), b.refs.len());
    }

    #[test]
    fn test_comprehension_variable_scoped_to_comprehension() {
        let source = "squares = [n * n for n in range(10)]\nprint(n)\n";
        let graph = index_python(source);
        let n_def = def_named(&graph, "n");
        assert_eq!(graph.scope(n_def.scope).kind, ScopeKind::Comprehension);
        // The print(n) read outside the comprehension must not see it.
        let outer_read = graph
            .refs
            .iter()
            .filter(|r| r.name == "n" && r.usage == UsageKind::Read)
            .find(|r| r.scope == ROOT_SCOPE)
            .expect("outer read of n");
        assert_eq!(outer_read.local_target, None);
    }

    #[test]
    fn test_typescript_exported_function_visible() {
        let source = "export function run(): void {}\nfunction hidden(): void {}\n";
        let graph = index_file(Path::new("mod.ts"), source, LanguageKind::TypeScript);
        assert!(def_named(&graph, "run").visible);
        assert!(!def_named(&graph, "hidden").visible);
    }

    #[test]
    fn test_rust_pub_fn_visible() {
        let source = "pub fn run() {}\nfn hidden() {}\n";
        let graph = index_file(Path::new("lib.rs"), source, LanguageKind::Rust);
        assert!(def_named(&graph, "run").visible);
        assert!(!def_named(&graph, "hidden").visible);
    }
}
