use tree_sitter::Node;

use crate::index::graph::{DefKind, ImportStatement, ImportStyle, ImportedName};
use crate::index::range_of;
use super::pack::PackSource;

/// Impl and trait bodies count as class scopes so their methods resolve as
/// members; `impl Foo` produces a companion class definition named `Foo`.
const SCOPES_QUERY: &str = r#"
    (function_item) @scope.function
    (closure_expression) @scope.function
    (impl_item) @scope.class
    (trait_item) @scope.class
    (block) @scope.block
"#;

const DEFINITIONS_QUERY: &str = r#"
    (function_item
      name: (identifier) @name
      return_type: (_)? @rettype) @def

    (struct_item
      name: (type_identifier) @name) @def

    (enum_item
      name: (type_identifier) @name) @def

    (trait_item
      name: (type_identifier) @name) @def

    (impl_item
      type: (type_identifier) @name) @def

    (type_item
      name: (type_identifier) @name) @def

    (const_item
      name: (identifier) @name) @def

    (static_item
      name: (identifier) @name) @def

    (let_declaration
      pattern: (identifier) @name
      type: (_)? @type
      value: (_)? @value) @def

    (parameter
      pattern: (identifier) @name
      type: (_)? @type) @def
"#;

const REFERENCES_QUERY: &str = r#"
    (call_expression
      function: (identifier) @ref.call)
    (call_expression
      function: (field_expression
        field: (field_identifier) @ref.callmember))
    (call_expression
      function: (scoped_identifier
        name: (identifier) @ref.call))

    (field_expression
      field: (field_identifier) @ref.member)

    (struct_expression
      name: (type_identifier) @ref.call)

    (identifier) @ref.read
    (type_identifier) @ref.type
"#;

const IMPORTS_QUERY: &str = r#"
    (use_declaration) @import
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
        "function_item" => Some(DefKind::Function),
        "struct_item" | "enum_item" | "trait_item" | "impl_item" | "type_item" => {
            Some(DefKind::Class)
        }
        "const_item" | "static_item" | "let_declaration" => Some(DefKind::Variable),
        "parameter" => Some(DefKind::Parameter),
        _ => None,
    }
}

pub fn literal_primitive(node_kind: &str) -> Option<&'static str> {
    match node_kind {
        "string_literal" | "raw_string_literal" => Some("str"),
        "integer_literal" => Some("int"),
        "float_literal" => Some("float"),
        "boolean_literal" => Some("bool"),
        _ => None,
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Decompose a `use` declaration into import statements.
///
/// `use a::b::c;` imports `c` from module path `a::b`; `use a::b::{c, d as
/// e};` fans out; `use a::b::*;` is a wildcard; `pub use` marks a re-export.
pub fn decompose_import(node: Node<'_>, source: &[u8]) -> Vec<ImportStatement> {
    let range = range_of(node);
    let reexport = (0..node.child_count())
        .filter_map(|i| node.child(i as u32))
        .any(|c| c.kind() == "visibility_modifier");

    let Some(argument) = node.child_by_field_name("argument") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    walk_use_tree(argument, source, "", reexport, range, &mut out);
    out
}

/// Recursive walk over a use tree, accumulating the module-path prefix.
fn walk_use_tree(
    node: Node<'_>,
    source: &[u8],
    prefix: &str,
    reexport: bool,
    range: crate::index::graph::SrcRange,
    out: &mut Vec<ImportStatement>,
) {
    let join = |prefix: &str, seg: &str| {
        if prefix.is_empty() {
            seg.to_owned()
        } else {
            format!("{prefix}::{seg}")
        }
    };

    match node.kind() {
        "identifier" | "crate" | "super" | "self" => {
            let name = node_text(node, source).to_owned();
            out.push(ImportStatement {
                module_path: prefix.to_owned(),
                names: vec![ImportedName { name, alias: None }],
                style: if prefix.is_empty() {
                    ImportStyle::Namespace
                } else {
                    ImportStyle::Named
                },
                reexport,
                range,
            });
        }
        "scoped_identifier" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| node_text(n, source).to_owned())
                .unwrap_or_default();
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_owned())
                .unwrap_or_default();
            out.push(ImportStatement {
                module_path: join(prefix, &path),
                names: vec![ImportedName { name, alias: None }],
                style: ImportStyle::Named,
                reexport,
                range,
            });
        }
        "use_as_clause" => {
            let alias = node
                .child_by_field_name("alias")
                .map(|n| node_text(n, source).to_owned());
            if let Some(path_node) = node.child_by_field_name("path") {
                match path_node.kind() {
                    "scoped_identifier" => {
                        let path = path_node
                            .child_by_field_name("path")
                            .map(|n| node_text(n, source).to_owned())
                            .unwrap_or_default();
                        let name = path_node
                            .child_by_field_name("name")
                            .map(|n| node_text(n, source).to_owned())
                            .unwrap_or_default();
                        out.push(ImportStatement {
                            module_path: join(prefix, &path),
                            names: vec![ImportedName { name, alias }],
                            style: ImportStyle::Named,
                            reexport,
                            range,
                        });
                    }
                    _ => {
                        let name = node_text(path_node, source).to_owned();
                        out.push(ImportStatement {
                            module_path: prefix.to_owned(),
                            names: vec![ImportedName { name, alias }],
                            style: ImportStyle::Named,
                            reexport,
                            range,
                        });
                    }
                }
            }
        }
        "scoped_use_list" => {
            let path = node
                .child_by_field_name("path")
                .map(|n| node_text(n, source))
                .unwrap_or("");
            let new_prefix = join(prefix, path);
            if let Some(list) = node.child_by_field_name("list") {
                walk_use_tree(list, source, &new_prefix, reexport, range, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                walk_use_tree(child, source, prefix, reexport, range, out);
            }
        }
        "use_wildcard" => {
            let path = node
                .named_child(0)
                .map(|n| node_text(n, source).to_owned())
                .unwrap_or_default();
            out.push(ImportStatement {
                module_path: join(prefix, &path),
                names: Vec::new(),
                style: ImportStyle::Wildcard,
                reexport,
                range,
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageKind;
    use tree_sitter::Parser;

    fn imports_of(source: &str) -> Vec<ImportStatement> {
        let mut parser = Parser::new();
        parser.set_language(&LanguageKind::Rust.grammar()).unwrap();
        let tree = parser.parse(source, None).unwrap();
        let stmt = tree.root_node().named_child(0).unwrap();
        decompose_import(stmt, source.as_bytes())
    }

    #[test]
    fn test_scoped_use() {
        let imports = imports_of("use graph::resolver;\n");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module_path, "graph");
        assert_eq!(imports[0].names[0].name, "resolver");
    }

    #[test]
    fn test_use_list_fans_out() {
        let imports = imports_of("use graph::{resolver, walker};\n");
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].names[0].name, "resolver");
        assert_eq!(imports[1].names[0].name, "walker");
    }

    #[test]
    fn test_use_as_alias() {
        let imports = imports_of("use graph::resolver as res;\n");
        assert_eq!(imports[0].names[0].name, "resolver");
        assert_eq!(imports[0].names[0].local_name(), "res");
    }

    #[test]
    fn test_wildcard_use() {
        let imports = imports_of("use prelude::*;\n");
        assert_eq!(imports[0].style, ImportStyle::Wildcard);
        assert_eq!(imports[0].module_path, "prelude");
    }

    #[test]
    fn test_pub_use_is_reexport() {
        let imports = imports_of("pub use graph::resolver;\n");
        assert!(imports[0].reexport);
    }
}
