//! Receiver-chain type resolution: give `a.b.c` a target by inferring the
//! type of `a`, looking `b` up on it, and so on down the chain.
//!
//! Descriptors are tagged values, not graph nodes; resolution yields either
//! a single definition or a bounded polymorphic set. Everything here runs
//! lazily against an immutable snapshot — nothing is precomputed and nothing
//! is stored back into the index.

use std::collections::{HashMap, HashSet};

use crate::index::graph::{
    AssignedExpr, DefId, DefKind, FileGraph, RefId, ScopeId, ScopeKind, UsageKind,
};
use crate::project::{
    FileId, GlobalDefId, GlobalRefId, ImportTarget, ProjectIndex, ResolutionQuality, ResolvedEdge,
};
use super::imports::{MAX_REEXPORT_DEPTH, chase_export};

/// The inferred type of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// The class object itself (`C` after `class C`).
    Class(GlobalDefId),
    /// An instance of a class (`C()` or `x: C`).
    Instance(GlobalDefId),
    /// Something callable; calling it yields the boxed descriptor.
    Callable(Box<TypeDescriptor>),
    /// A parameterised container (`Queue[Task]`).
    Generic {
        base: GlobalDefId,
        params: Vec<TypeDescriptor>,
    },
    /// One of several possibilities; members resolve on every arm.
    Union(Vec<TypeDescriptor>),
    /// A module namespace (`import pkg.mod as m` makes `m` one).
    Module(FileId),
    /// `super()` inside a method: the receiver class, lookup starting past it.
    Super(GlobalDefId),
    /// A builtin shape with no definition in the index ("str", "int", ...).
    Primitive(&'static str),
    Unknown,
}

/// Result of looking a member name up on a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberLookup {
    Single(GlobalDefId),
    /// Candidates under polymorphism — every definition the receiver could
    /// point at.
    Set(Vec<GlobalDefId>),
    NotFound,
}

enum RefTarget {
    Def(GlobalDefId),
    Module(FileId),
}

/// Lazy, memoised type resolution over one snapshot.
///
/// Memoisation is keyed on definition id, which also breaks descriptor
/// cycles (`a = b; b = a`): a definition currently being derived reports
/// `Unknown` to its own recursion.
pub struct TypeResolver<'a> {
    index: &'a ProjectIndex,
    memo: HashMap<GlobalDefId, (TypeDescriptor, bool)>,
    in_progress: HashSet<GlobalDefId>,
    mro_cache: HashMap<GlobalDefId, Vec<GlobalDefId>>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        TypeResolver {
            index,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            mro_cache: HashMap::new(),
        }
    }

    /// Resolve a member-access (or member-call) reference through its
    /// receiver chain. Returns `None` when the chain bottoms out in
    /// `Unknown` — never an invented target.
    pub fn resolve_member(&mut self, source: GlobalRefId) -> Option<ResolvedEdge> {
        let index = self.index;
        let graph = index.graph(source.file)?;
        let reference = graph.reference(source.reference);
        let receiver = reference.receiver?;

        let (descriptor, declared) = self.descriptor_of_ref(source.file, receiver);
        match self.lookup_member(&descriptor, &reference.name) {
            MemberLookup::Single(target) => Some(ResolvedEdge {
                source,
                targets: vec![target],
                quality: if declared {
                    ResolutionQuality::Exact
                } else {
                    ResolutionQuality::Heuristic
                },
                proxy_chain: Vec::new(),
            }),
            MemberLookup::Set(targets) => Some(ResolvedEdge {
                source,
                targets,
                quality: ResolutionQuality::PolymorphicSet,
                proxy_chain: Vec::new(),
            }),
            MemberLookup::NotFound => None,
        }
    }

    // -----------------------------------------------------------------------
    // Descriptor derivation
    // -----------------------------------------------------------------------

    /// Descriptor of the value a reference evaluates to, and whether it came
    /// from a declared annotation (drives edge quality).
    pub fn descriptor_of_ref(&mut self, file: FileId, r: RefId) -> (TypeDescriptor, bool) {
        let index = self.index;
        let Some(graph) = index.graph(file) else {
            return (TypeDescriptor::Unknown, false);
        };
        let reference = graph.reference(r);

        // `super()` — start member lookup past the enclosing class.
        if reference.name == "super"
            && reference.usage == UsageKind::Call
            && reference.receiver.is_none()
            && let Some(class) = enclosing_class(graph, reference.scope)
        {
            return (
                TypeDescriptor::Super(GlobalDefId { file, def: class }),
                true,
            );
        }

        let (value, declared) = if let Some(recv) = reference.receiver {
            // Middle of a chain: type the receiver, look this segment up.
            let (recv_desc, recv_declared) = self.descriptor_of_ref(file, recv);
            match self.lookup_member(&recv_desc, &reference.name) {
                MemberLookup::Single(def) => {
                    let (d, dec) = self.value_descriptor(def);
                    (d, dec && recv_declared)
                }
                MemberLookup::Set(defs) => {
                    let arms: Vec<TypeDescriptor> = defs
                        .into_iter()
                        .map(|d| self.value_descriptor(d).0)
                        .collect();
                    (TypeDescriptor::Union(arms), false)
                }
                MemberLookup::NotFound => {
                    // Submodule navigation: `pkg.sub` where `pkg` is a module.
                    if let TypeDescriptor::Module(module) = recv_desc
                        && let Some(sub) = self.submodule(module, &reference.name)
                    {
                        (TypeDescriptor::Module(sub), recv_declared)
                    } else {
                        (TypeDescriptor::Unknown, false)
                    }
                }
            }
        } else {
            match self.resolve_ref_target(file, r) {
                Some(RefTarget::Def(def)) => self.value_descriptor(def),
                Some(RefTarget::Module(m)) => (TypeDescriptor::Module(m), true),
                None => (TypeDescriptor::Unknown, false),
            }
        };

        if reference.usage == UsageKind::Call {
            (self.call_result(value), declared)
        } else {
            (value, declared)
        }
    }

    /// Descriptor of a definition's value: what reading the name yields.
    /// Derivation order per definition: declared annotation, then the most
    /// recent assignment's right-hand side, then `Unknown`.
    pub fn value_descriptor(&mut self, id: GlobalDefId) -> (TypeDescriptor, bool) {
        if let Some(cached) = self.memo.get(&id) {
            return cached.clone();
        }
        if !self.in_progress.insert(id) {
            return (TypeDescriptor::Unknown, false);
        }
        let result = self.value_descriptor_uncached(id);
        self.in_progress.remove(&id);
        self.memo.insert(id, result.clone());
        result
    }

    fn value_descriptor_uncached(&mut self, id: GlobalDefId) -> (TypeDescriptor, bool) {
        let index = self.index;
        let Some(def) = index.def(id) else {
            return (TypeDescriptor::Unknown, false);
        };
        let Some(graph) = index.graph(id.file) else {
            return (TypeDescriptor::Unknown, false);
        };

        match def.kind {
            DefKind::Class => (TypeDescriptor::Class(id), true),
            DefKind::Function | DefKind::Method => {
                let ret = def
                    .declared_type
                    .as_deref()
                    .map(|t| self.parse_annotation(id.file, def.scope, t))
                    .unwrap_or(TypeDescriptor::Unknown);
                (TypeDescriptor::Callable(Box::new(ret)), true)
            }
            DefKind::ImportBinding => {
                match self.import_binding_target(id.file, id.def) {
                    Some(ImportTarget::Def(target)) => self.value_descriptor(target),
                    Some(ImportTarget::Module(m)) => (TypeDescriptor::Module(m), true),
                    None => (TypeDescriptor::Unknown, false),
                }
            }
            DefKind::Parameter => {
                // `self` / `cls` in a method body.
                if let Some(class) = enclosing_class(graph, def.scope)
                    && (def.name == "self" || def.name == "cls")
                {
                    let class_id = GlobalDefId {
                        file: id.file,
                        def: class,
                    };
                    return if def.name == "cls" {
                        (TypeDescriptor::Class(class_id), true)
                    } else {
                        (TypeDescriptor::Instance(class_id), true)
                    };
                }
                match def.declared_type.as_deref() {
                    Some(t) => (self.parse_annotation(id.file, def.scope, t), true),
                    None => (TypeDescriptor::Unknown, false),
                }
            }
            DefKind::Variable => {
                if let Some(t) = def.declared_type.as_deref() {
                    return (self.parse_annotation(id.file, def.scope, t), true);
                }
                match &def.assigned {
                    Some(AssignedExpr::Literal(prim)) => {
                        (TypeDescriptor::Primitive(prim), false)
                    }
                    Some(AssignedExpr::Call { callee }) => {
                        // The callee ref has Call usage, so descriptor_of_ref
                        // already yields the call's result.
                        let (desc, _) = self.descriptor_of_ref(id.file, *callee);
                        (desc, false)
                    }
                    Some(AssignedExpr::Name(r)) => {
                        let (d, _) = self.descriptor_of_ref(id.file, *r);
                        (d, false)
                    }
                    None => (TypeDescriptor::Unknown, false),
                }
            }
        }
    }

    /// What calling a value of `descriptor` yields.
    fn call_result(&mut self, descriptor: TypeDescriptor) -> TypeDescriptor {
        match descriptor {
            TypeDescriptor::Class(c) => TypeDescriptor::Instance(c),
            TypeDescriptor::Callable(ret) => *ret,
            TypeDescriptor::Union(arms) => TypeDescriptor::Union(
                arms.into_iter().map(|a| self.call_result(a)).collect(),
            ),
            // `super()` evaluates to the bounded proxy itself.
            TypeDescriptor::Super(c) => TypeDescriptor::Super(c),
            _ => TypeDescriptor::Unknown,
        }
    }

    // -----------------------------------------------------------------------
    // Member lookup
    // -----------------------------------------------------------------------

    /// Look `name` up on a descriptor. Chains terminate quietly on
    /// `Unknown` and `Callable` — remaining segments stay unresolved.
    pub fn lookup_member(&mut self, descriptor: &TypeDescriptor, name: &str) -> MemberLookup {
        match descriptor {
            TypeDescriptor::Instance(class) | TypeDescriptor::Class(class) => {
                let class_def = match self.index.def(*class) {
                    Some(d) => d,
                    None => return MemberLookup::NotFound,
                };
                if class_def.interface_like {
                    let implementers = self.implementers_of(*class);
                    let mut targets = Vec::new();
                    for implementer in implementers {
                        if let Some(t) = self.member_on_class(implementer, name, false) {
                            targets.push(t);
                        }
                    }
                    match targets.len() {
                        0 => self
                            .member_on_class(*class, name, false)
                            .map(MemberLookup::Single)
                            .unwrap_or(MemberLookup::NotFound),
                        1 => MemberLookup::Single(targets[0]),
                        _ => MemberLookup::Set(targets),
                    }
                } else {
                    self.member_on_class(*class, name, false)
                        .map(MemberLookup::Single)
                        .unwrap_or(MemberLookup::NotFound)
                }
            }
            TypeDescriptor::Generic { base, .. } => {
                // Substitution affects further chain typing, not membership.
                self.lookup_member(&TypeDescriptor::Instance(*base), name)
            }
            TypeDescriptor::Union(arms) => {
                let mut targets = Vec::new();
                for arm in arms.clone() {
                    match self.lookup_member(&arm, name) {
                        MemberLookup::Single(t) => targets.push(t),
                        MemberLookup::Set(ts) => targets.extend(ts),
                        MemberLookup::NotFound => {}
                    }
                }
                targets.sort();
                targets.dedup();
                match targets.len() {
                    0 => MemberLookup::NotFound,
                    1 => MemberLookup::Single(targets[0]),
                    _ => MemberLookup::Set(targets),
                }
            }
            TypeDescriptor::Module(file) => {
                let mut chain = Vec::new();
                let mut visited = HashSet::new();
                match chase_export(
                    self.index,
                    *file,
                    name,
                    MAX_REEXPORT_DEPTH,
                    &mut chain,
                    &mut visited,
                ) {
                    Some(ImportTarget::Def(d)) => MemberLookup::Single(d),
                    _ => MemberLookup::NotFound,
                }
            }
            TypeDescriptor::Super(class) => {
                let mro = self.linearize(*class);
                for ancestor in mro.into_iter().skip(1) {
                    if let Some(t) = self.member_on_class(ancestor, name, true) {
                        return MemberLookup::Single(t);
                    }
                }
                MemberLookup::NotFound
            }
            TypeDescriptor::Callable(_)
            | TypeDescriptor::Primitive(_)
            | TypeDescriptor::Unknown => MemberLookup::NotFound,
        }
    }

    /// Search one class (and, unless `own_only`, its linearised ancestry)
    /// for a member, including companion same-name class definitions in the
    /// same file (how Rust impl blocks attach methods to their type).
    fn member_on_class(
        &mut self,
        class: GlobalDefId,
        name: &str,
        own_only: bool,
    ) -> Option<GlobalDefId> {
        let order = if own_only {
            vec![class]
        } else {
            self.linearize(class)
        };
        for current in order {
            if let Some(found) = self.member_declared_on(current, name) {
                return Some(found);
            }
        }
        None
    }

    fn member_declared_on(&self, class: GlobalDefId, name: &str) -> Option<GlobalDefId> {
        let graph = self.index.graph(class.file)?;
        let class_def = graph.defs.get(class.def.index())?;

        let mut scopes: Vec<ScopeId> = class_def.body_scope.into_iter().collect();
        // Companion definitions: same-file class defs with the same name
        // contribute their bodies too (impl blocks).
        for (i, other) in graph.defs.iter().enumerate() {
            if DefId(i as u32) != class.def
                && other.kind == DefKind::Class
                && other.name == class_def.name
                && let Some(body) = other.body_scope
            {
                scopes.push(body);
            }
        }

        for scope in scopes {
            for (def_id, def) in graph.defs_in_scope(scope) {
                if def.name == name {
                    return Some(GlobalDefId {
                        file: class.file,
                        def: def_id,
                    });
                }
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Linearisation
    // -----------------------------------------------------------------------

    /// C3 linearisation of a class hierarchy, tolerant of cycles and merge
    /// failures: a class inheriting from itself (through any loop) is
    /// linearised up to the point the cycle is detected, and an inconsistent
    /// hierarchy degrades to a depth-first, declaration-order walk.
    pub fn linearize(&mut self, class: GlobalDefId) -> Vec<GlobalDefId> {
        if let Some(cached) = self.mro_cache.get(&class) {
            return cached.clone();
        }
        let mut visiting = HashSet::new();
        let result = self.linearize_inner(class, &mut visiting);
        self.mro_cache.insert(class, result.clone());
        result
    }

    fn linearize_inner(
        &mut self,
        class: GlobalDefId,
        visiting: &mut HashSet<GlobalDefId>,
    ) -> Vec<GlobalDefId> {
        if !visiting.insert(class) {
            return Vec::new();
        }

        let bases = self.bases_of(class);
        let mut sequences: Vec<Vec<GlobalDefId>> = Vec::new();
        for &base in &bases {
            let linearised = self.linearize_inner(base, visiting);
            if !linearised.is_empty() {
                sequences.push(linearised);
            }
        }
        if !bases.is_empty() {
            sequences.push(bases.clone());
        }

        let mut result = vec![class];
        match c3_merge(sequences.clone()) {
            Some(merged) => result.extend(merged),
            None => {
                // Inconsistent hierarchy: depth-first, declaration order.
                let mut seen: HashSet<GlobalDefId> = result.iter().copied().collect();
                for sequence in sequences {
                    for item in sequence {
                        if seen.insert(item) {
                            result.push(item);
                        }
                    }
                }
            }
        }

        visiting.remove(&class);
        result
    }

    fn bases_of(&mut self, class: GlobalDefId) -> Vec<GlobalDefId> {
        let index = self.index;
        let Some(graph) = index.graph(class.file) else {
            return Vec::new();
        };
        let Some(def) = graph.defs.get(class.def.index()) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for &base_ref in &def.bases {
            if let Some(RefTarget::Def(target)) = self.resolve_ref_target(class.file, base_ref)
                && index.def(target).is_some_and(|d| d.kind == DefKind::Class)
            {
                out.push(target);
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Protocol implementers
    // -----------------------------------------------------------------------

    /// Structural implementer discovery: every non-interface class whose
    /// member names cover the protocol's. A cheap coverage check, not a
    /// subtype proof — false positives are accepted by design.
    fn implementers_of(&mut self, protocol: GlobalDefId) -> Vec<GlobalDefId> {
        let index = self.index;
        let required = self.member_names_of(protocol);
        if required.is_empty() {
            return Vec::new();
        }

        let mut found = Vec::new();
        for (file, graph) in index.files_ordered() {
            for (i, def) in graph.defs.iter().enumerate() {
                if def.kind != DefKind::Class || def.interface_like {
                    continue;
                }
                let candidate = GlobalDefId {
                    file,
                    def: DefId(i as u32),
                };
                if candidate == protocol {
                    continue;
                }
                let names = self.member_names_of(candidate);
                if required.iter().all(|r| names.contains(r)) {
                    found.push(candidate);
                }
            }
        }
        found
    }

    fn member_names_of(&self, class: GlobalDefId) -> HashSet<String> {
        let mut names = HashSet::new();
        let Some(graph) = self.index.graph(class.file) else {
            return names;
        };
        let Some(body) = graph.defs.get(class.def.index()).and_then(|d| d.body_scope) else {
            return names;
        };
        for (_, def) in graph.defs_in_scope(body) {
            if matches!(def.kind, DefKind::Method | DefKind::Function) {
                names.insert(def.name.clone());
            }
        }
        names
    }

    // -----------------------------------------------------------------------
    // Reference and annotation plumbing
    // -----------------------------------------------------------------------

    fn resolve_ref_target(&self, file: FileId, r: RefId) -> Option<RefTarget> {
        let graph = self.index.graph(file)?;
        let reference = graph.reference(r);

        if let Some(local) = reference.local_target {
            let def = graph.def(local);
            if def.kind == DefKind::ImportBinding {
                return match self.import_binding_target(file, local)? {
                    ImportTarget::Def(d) => Some(RefTarget::Def(d)),
                    ImportTarget::Module(m) => Some(RefTarget::Module(m)),
                };
            }
            return Some(RefTarget::Def(GlobalDefId { file, def: local }));
        }

        self.index
            .cross_edges
            .get(&file)?
            .iter()
            .find(|e| e.source.reference == r)
            .and_then(|e| e.targets.first())
            .map(|&d| RefTarget::Def(d))
    }

    fn import_binding_target(&self, file: FileId, binding: DefId) -> Option<ImportTarget> {
        self.index
            .import_resolutions
            .get(&file)?
            .iter()
            .find(|r| r.binding == binding)
            .map(|r| r.target)
    }

    fn submodule(&self, module: FileId, name: &str) -> Option<FileId> {
        let module_path = crate::project::module_path_for(
            &self.index.root,
            self.index.path_of(module)?,
            self.index.graph(module)?.language,
        )?;
        self.index
            .module_paths
            .get(&format!("{module_path}.{name}"))
            .copied()
    }

    /// Parse a declared type expression into a descriptor (instance space:
    /// `x: C` makes `x` an instance of `C`). Handles names, `A | B`,
    /// `Union[...]`, `Optional[X]`, parameterised names, and quoted forward
    /// references; anything else is `Unknown`.
    pub fn parse_annotation(
        &mut self,
        file: FileId,
        scope: ScopeId,
        text: &str,
    ) -> TypeDescriptor {
        let text = text.trim().trim_matches(|c| c == '"' || c == '\'');
        if text.is_empty() {
            return TypeDescriptor::Unknown;
        }

        if let Some(arms) = split_top_level(text, '|') {
            let parsed = arms
                .into_iter()
                .map(|a| self.parse_annotation(file, scope, a))
                .collect();
            return TypeDescriptor::Union(parsed);
        }

        if let Some((head, inner)) = split_subscript(text) {
            match head {
                "Optional" => {
                    let some = self.parse_annotation(file, scope, inner);
                    return TypeDescriptor::Union(vec![
                        some,
                        TypeDescriptor::Primitive("None"),
                    ]);
                }
                "Union" => {
                    let arms = split_top_level(inner, ',')
                        .unwrap_or_else(|| vec![inner])
                        .into_iter()
                        .map(|a| self.parse_annotation(file, scope, a))
                        .collect();
                    return TypeDescriptor::Union(arms);
                }
                _ => {
                    let params: Vec<TypeDescriptor> = split_top_level(inner, ',')
                        .unwrap_or_else(|| vec![inner])
                        .into_iter()
                        .map(|p| self.parse_annotation(file, scope, p))
                        .collect();
                    return match self.resolve_type_name(file, scope, head) {
                        Some(base) => TypeDescriptor::Generic { base, params },
                        None => TypeDescriptor::Unknown,
                    };
                }
            }
        }

        if let Some(prim) = builtin_type_name(text) {
            return TypeDescriptor::Primitive(prim);
        }

        match self.resolve_type_name(file, scope, text) {
            Some(class) => TypeDescriptor::Instance(class),
            None => TypeDescriptor::Unknown,
        }
    }

    /// Resolve a bare name from an annotation: lexically from `scope`
    /// (position-independent — annotations may precede the class), then
    /// through import bindings.
    fn resolve_type_name(
        &self,
        file: FileId,
        scope: ScopeId,
        name: &str,
    ) -> Option<GlobalDefId> {
        let graph = self.index.graph(file)?;
        for s in graph.scope_chain(scope) {
            for (def_id, def) in graph.defs_in_scope(s) {
                if def.name != name {
                    continue;
                }
                match def.kind {
                    DefKind::Class => return Some(GlobalDefId { file, def: def_id }),
                    DefKind::ImportBinding => {
                        if let Some(ImportTarget::Def(d)) =
                            self.import_binding_target(file, def_id)
                        {
                            return Some(d);
                        }
                    }
                    _ => {}
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

fn enclosing_class(graph: &FileGraph, scope: ScopeId) -> Option<DefId> {
    graph
        .scope_chain(scope)
        .find(|&s| graph.scope(s).kind == ScopeKind::Class)
        .and_then(|s| graph.scope_owner[s.index()])
}

/// Standard C3 merge. `None` when the hierarchy is inconsistent.
fn c3_merge(mut sequences: Vec<Vec<GlobalDefId>>) -> Option<Vec<GlobalDefId>> {
    let mut result = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }
        // A good head appears in no sequence's tail.
        let head = sequences
            .iter()
            .map(|s| s[0])
            .find(|&candidate| {
                sequences
                    .iter()
                    .all(|s| !s[1..].contains(&candidate))
            })?;
        result.push(head);
        for sequence in &mut sequences {
            sequence.retain(|&c| c != head);
        }
    }
}

/// Split on a separator at bracket depth zero; `None` when it never occurs.
fn split_top_level(text: &str, separator: char) -> Option<Vec<&str>> {
    let mut depth = 0usize;
    let mut parts = Vec::new();
    let mut start = 0;
    let mut found = false;
    for (i, c) in text.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + c.len_utf8();
                found = true;
            }
            _ => {}
        }
    }
    if !found {
        return None;
    }
    parts.push(text[start..].trim());
    Some(parts)
}

/// `Name[inner]` at the top level.
fn split_subscript(text: &str) -> Option<(&str, &str)> {
    let open = text.find('[')?;
    if !text.ends_with(']') {
        return None;
    }
    let head = text[..open].trim();
    let inner = &text[open + 1..text.len() - 1];
    if head.is_empty() || head.contains(|c: char| !c.is_alphanumeric() && c != '_' && c != '.') {
        return None;
    }
    Some((head, inner))
}

fn builtin_type_name(name: &str) -> Option<&'static str> {
    match name {
        "str" | "string" => Some("str"),
        "int" => Some("int"),
        "float" => Some("float"),
        "bool" | "boolean" => Some("bool"),
        "None" => Some("None"),
        "list" | "List" => Some("list"),
        "dict" | "Dict" => Some("dict"),
        "set" | "Set" => Some("set"),
        "tuple" | "Tuple" => Some("tuple"),
        "number" => Some("number"),
        _ => None,
    }
}
