use tree_sitter::Node;

use crate::index::graph::{DefKind, ImportStatement, ImportStyle, ImportedName};
use crate::index::range_of;
use super::pack::PackSource;

/// Scope-introducing nodes. The capture name encodes the scope kind.
/// Python has no block scopes; comprehensions and lambdas get their own.
const SCOPES_QUERY: &str = r#"
    (function_definition) @scope.function
    (lambda) @scope.function
    (class_definition) @scope.class
    (list_comprehension) @scope.comprehension
    (set_comprehension) @scope.comprehension
    (dictionary_comprehension) @scope.comprehension
    (generator_expression) @scope.comprehension
"#;

/// Definition sites. `@def` is the declaration node (its kind decides the
/// definition kind), `@name` the bound identifier. `@type` / `@rettype` carry
/// annotation expressions verbatim; `@value` the assignment RHS; `@bases` a
/// class's superclass argument list.
const DEFINITIONS_QUERY: &str = r#"
    (function_definition
      name: (identifier) @name
      return_type: (type)? @rettype) @def

    (class_definition
      name: (identifier) @name
      superclasses: (argument_list)? @bases) @def

    (assignment
      left: (identifier) @name
      type: (type)? @type
      right: (_)? @value) @def

    (assignment
      left: (pattern_list (identifier) @name)) @def
    (assignment
      left: (tuple_pattern (identifier) @name)) @def

    (augmented_assignment
      left: (identifier) @name) @def

    (named_expression
      name: (identifier) @name) @def

    (for_statement
      left: (identifier) @name) @def
    (for_statement
      left: (pattern_list (identifier) @name)) @def
    (for_statement
      left: (tuple_pattern (identifier) @name)) @def

    (for_in_clause
      left: (identifier) @name) @def
    (for_in_clause
      left: (pattern_list (identifier) @name)) @def
    (for_in_clause
      left: (tuple_pattern (identifier) @name)) @def

    (parameters (identifier) @name) @def
    (lambda_parameters (identifier) @name) @def
    (default_parameter
      name: (identifier) @name
      value: (_)? @value) @def
    (typed_parameter
      (identifier) @name
      type: (type) @type) @def
    (typed_default_parameter
      name: (identifier) @name
      type: (type) @type
      value: (_)? @value) @def
    (list_splat_pattern (identifier) @name) @def
    (dictionary_splat_pattern (identifier) @name) @def

    (as_pattern
      alias: (as_pattern_target (identifier) @name)) @def
"#;

/// Reference sites by usage. The bare-identifier catch-all is filtered by the
/// indexer against definition-name and import ranges; more specific captures
/// on the same node win (call > member > type > read).
const REFERENCES_QUERY: &str = r#"
    (call
      function: (identifier) @ref.call)
    (call
      function: (attribute
        attribute: (identifier) @ref.callmember))

    (attribute
      attribute: (identifier) @ref.member)

    (type (identifier) @ref.type)
    (type (subscript value: (identifier) @ref.type))
    (type (subscript subscript: (identifier) @ref.type))
    (type (binary_operator (identifier) @ref.type))

    (identifier) @ref.read
"#;

const IMPORTS_QUERY: &str = r#"
    (import_statement) @import
    (import_from_statement) @import
"#;

pub fn pack_source() -> PackSource {
    PackSource {
        scopes: SCOPES_QUERY,
        definitions: DEFINITIONS_QUERY,
        references: REFERENCES_QUERY,
        imports: IMPORTS_QUERY,
    }
}

pub fn def_kind_of_node(node_kind: &str) -> Option<DefKind> {
    match node_kind {
        "function_definition" => Some(DefKind::Function),
        "class_definition" => Some(DefKind::Class),
        "assignment" | "augmented_assignment" | "named_expression" | "for_statement"
        | "for_in_clause" | "as_pattern" => Some(DefKind::Variable),
        "parameters" | "lambda_parameters" | "default_parameter" | "typed_parameter"
        | "typed_default_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
            Some(DefKind::Parameter)
        }
        _ => None,
    }
}

pub fn literal_primitive(node_kind: &str) -> Option<&'static str> {
    match node_kind {
        "string" | "concatenated_string" => Some("str"),
        "integer" => Some("int"),
        "float" => Some("float"),
        "true" | "false" => Some("bool"),
        "none" => Some("None"),
        "list" | "list_comprehension" => Some("list"),
        "dictionary" | "dictionary_comprehension" => Some("dict"),
        "set" | "set_comprehension" => Some("set"),
        "tuple" => Some("tuple"),
        _ => None,
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Decompose one `import_statement` / `import_from_statement` match.
///
/// - `import a.b.c [as x]` binds a namespace (the module itself).
/// - `from m import a, b as c` binds names out of `m`.
/// - `from m import *` binds every externally visible name of `m`.
/// - `from . import x` / `from ..pkg import y` keep the relative prefix
///   verbatim in `module_path`; the import resolver interprets the dots.
pub fn decompose_import(node: Node<'_>, source: &[u8]) -> Vec<ImportStatement> {
    let range = range_of(node);
    match node.kind() {
        "import_statement" => {
            let mut out = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "dotted_name" => {
                        let path = node_text(child, source).to_owned();
                        out.push(ImportStatement {
                            module_path: path.clone(),
                            names: vec![ImportedName {
                                name: path,
                                alias: None,
                            }],
                            style: ImportStyle::Namespace,
                            reexport: false,
                            range,
                        });
                    }
                    "aliased_import" => {
                        let path = child
                            .child_by_field_name("name")
                            .map(|n| node_text(n, source).to_owned())
                            .unwrap_or_default();
                        let alias = child
                            .child_by_field_name("alias")
                            .map(|n| node_text(n, source).to_owned());
                        out.push(ImportStatement {
                            module_path: path.clone(),
                            names: vec![ImportedName { name: path, alias }],
                            style: ImportStyle::Namespace,
                            reexport: false,
                            range,
                        });
                    }
                    _ => {}
                }
            }
            out
        }
        "import_from_statement" => {
            let module_path = node
                .child_by_field_name("module_name")
                .map(|n| node_text(n, source).to_owned())
                .unwrap_or_default();

            let mut wildcard = false;
            let mut names = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                // The module_name field also appears as a named child; skip it.
                if Some(child) == node.child_by_field_name("module_name") {
                    continue;
                }
                match child.kind() {
                    "wildcard_import" => wildcard = true,
                    "dotted_name" | "identifier" => names.push(ImportedName {
                        name: node_text(child, source).to_owned(),
                        alias: None,
                    }),
                    "aliased_import" => {
                        let name = child
                            .child_by_field_name("name")
                            .map(|n| node_text(n, source).to_owned())
                            .unwrap_or_default();
                        let alias = child
                            .child_by_field_name("alias")
                            .map(|n| node_text(n, source).to_owned());
                        names.push(ImportedName { name, alias });
                    }
                    _ => {}
                }
            }

            vec![ImportStatement {
                module_path,
                names,
                style: if wildcard {
                    ImportStyle::Wildcard
                } else {
                    ImportStyle::Named
                },
                reexport: false,
                range,
            }]
        }
        _ => Vec::new(),
    }
}

/// Per-base expression nodes of a `superclasses` argument list, skipping
/// keyword arguments (`metaclass=...`).
pub fn base_candidates<'a>(bases_node: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut cursor = bases_node.walk();
    for child in bases_node.named_children(&mut cursor) {
        if child.kind() != "keyword_argument" && child.kind() != "comment" {
            out.push(child);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageKind;
    use tree_sitter::Parser;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&LanguageKind::Python.grammar())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    fn first_import(source: &str) -> ImportStatement {
        let tree = parse(source);
        let stmt = tree.root_node().named_child(0).unwrap();
        decompose_import(stmt, source.as_bytes())
            .into_iter()
            .next()
            .expect("one import statement")
    }

    #[test]
    fn test_plain_import_binds_namespace() {
        let imp = first_import("import subpkg.processor\n");
        assert_eq!(imp.module_path, "subpkg.processor");
        assert_eq!(imp.style, ImportStyle::Namespace);
        assert_eq!(imp.names[0].local_name(), "subpkg.processor");
    }

    #[test]
    fn test_aliased_import() {
        let imp = first_import("import subpkg.processor as proc\n");
        assert_eq!(imp.module_path, "subpkg.processor");
        assert_eq!(imp.names[0].local_name(), "proc");
    }

    #[test]
    fn test_from_import_with_aliases() {
        let imp = first_import("from utils import helper, format_name as fmt\n");
        assert_eq!(imp.module_path, "utils");
        assert_eq!(imp.style, ImportStyle::Named);
        assert_eq!(imp.names.len(), 2);
        assert_eq!(imp.names[0].local_name(), "helper");
        assert_eq!(imp.names[1].name, "format_name");
        assert_eq!(imp.names[1].local_name(), "fmt");
    }

    #[test]
    fn test_wildcard_import() {
        let imp = first_import("from os.path import *\n");
        assert_eq!(imp.module_path, "os.path");
        assert_eq!(imp.style, ImportStyle::Wildcard);
        assert!(imp.names.is_empty());
    }

    #[test]
    fn test_relative_import_keeps_dots() {
        let imp = first_import("from ..shared import config\n");
        assert_eq!(imp.module_path, "..shared");
        assert_eq!(imp.names[0].name, "config");
    }

    #[test]
    fn test_def_kind_mapping() {
        assert_eq!(
            def_kind_of_node("function_definition"),
            Some(DefKind::Function)
        );
        assert_eq!(def_kind_of_node("class_definition"), Some(DefKind::Class));
        assert_eq!(def_kind_of_node("assignment"), Some(DefKind::Variable));
        assert_eq!(def_kind_of_node("typed_parameter"), Some(DefKind::Parameter));
        assert_eq!(def_kind_of_node("call"), None);
    }

    #[test]
    fn test_literal_primitives() {
        assert_eq!(literal_primitive("string"), Some("str"));
        assert_eq!(literal_primitive("dictionary"), Some("dict"));
        assert_eq!(literal_primitive("call"), None);
    }
}
