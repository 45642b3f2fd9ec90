use tree_sitter::Node;

use crate::index::graph::{DefKind, ImportStatement, ImportStyle, ImportedName};
use crate::index::range_of;
use super::pack::PackSource;

const SCOPES_QUERY: &str = r#"
    (function_declaration) @scope.function
    (function_expression) @scope.function
    (arrow_function) @scope.function
    (method_definition) @scope.function
    (class_declaration) @scope.class
    (statement_block) @scope.block
    (for_statement) @scope.block
"#;

const DEFINITIONS_QUERY: &str = r#"
    (function_declaration
      name: (identifier) @name
      return_type: (type_annotation)? @rettype) @def

    (function_expression
      name: (identifier) @name) @def

    (class_declaration
      name: (type_identifier) @name
      (class_heritage)? @bases) @def

    (interface_declaration
      name: (type_identifier) @name) @def

    (type_alias_declaration
      name: (type_identifier) @name) @def

    (enum_declaration
      name: (identifier) @name) @def

    (method_definition
      name: (property_identifier) @name
      return_type: (type_annotation)? @rettype) @def

    (public_field_definition
      name: (property_identifier) @name
      type: (type_annotation)? @type
      value: (_)? @value) @def

    (method_signature
      name: (property_identifier) @name
      return_type: (type_annotation)? @rettype) @def

    (property_signature
      name: (property_identifier) @name
      type: (type_annotation)? @type) @def

    (variable_declarator
      name: (identifier) @name
      type: (type_annotation)? @type
      value: (_)? @value) @def

    (required_parameter
      pattern: (identifier) @name
      type: (type_annotation)? @type) @def

    (optional_parameter
      pattern: (identifier) @name
      type: (type_annotation)? @type) @def
"#;

const REFERENCES_QUERY: &str = r#"
    (call_expression
      function: (identifier) @ref.call)
    (call_expression
      function: (member_expression
        property: (property_identifier) @ref.callmember))

    (new_expression
      constructor: (identifier) @ref.call)

    (member_expression
      property: (property_identifier) @ref.member)

    (type_annotation (type_identifier) @ref.type)
    (generic_type name: (type_identifier) @ref.type)

    (identifier) @ref.read
    (type_identifier) @ref.type
"#;

const IMPORTS_QUERY: &str = r#"
    (import_statement) @import
    (export_statement) @import
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
        "function_declaration" | "function_expression" | "method_definition"
        | "method_signature" => Some(DefKind::Function),
        "class_declaration" | "interface_declaration" | "type_alias_declaration"
        | "enum_declaration" => Some(DefKind::Class),
        "variable_declarator" | "public_field_definition" | "property_signature" => {
            Some(DefKind::Variable)
        }
        "required_parameter" | "optional_parameter" => Some(DefKind::Parameter),
        _ => None,
    }
}

pub fn literal_primitive(node_kind: &str) -> Option<&'static str> {
    match node_kind {
        "string" | "template_string" => Some("string"),
        "number" => Some("number"),
        "true" | "false" => Some("boolean"),
        "array" => Some("array"),
        "object" => Some("object"),
        _ => None,
    }
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Strip the quotes from an import source string node.
fn import_source_text(node: Node<'_>, source: &[u8]) -> String {
    node_text(node, source)
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_owned()
}

/// Decompose ESM import and re-export statements. Shared by TypeScript and
/// JavaScript — the grammars agree on this part of the surface.
///
/// Plain `export` of a local declaration is not an import and yields nothing;
/// the visibility walk picks those up.
pub fn decompose_import(node: Node<'_>, source: &[u8]) -> Vec<ImportStatement> {
    let range = range_of(node);
    let Some(source_node) = node.child_by_field_name("source") else {
        return Vec::new();
    };
    let module_path = import_source_text(source_node, source);

    match node.kind() {
        "import_statement" => {
            let mut names = Vec::new();
            let mut namespace_alias: Option<String> = None;
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() != "import_clause" {
                    continue;
                }
                let mut clause_cursor = child.walk();
                for part in child.named_children(&mut clause_cursor) {
                    match part.kind() {
                        // `import Foo from './x'` — the default export.
                        "identifier" => names.push(ImportedName {
                            name: "default".to_owned(),
                            alias: Some(node_text(part, source).to_owned()),
                        }),
                        "namespace_import" => {
                            let mut ns_cursor = part.walk();
                            namespace_alias = part
                                .named_children(&mut ns_cursor)
                                .find(|n| n.kind() == "identifier")
                                .map(|n| node_text(n, source).to_owned());
                        }
                        "named_imports" => {
                            let mut spec_cursor = part.walk();
                            for spec in part.named_children(&mut spec_cursor) {
                                if spec.kind() != "import_specifier" {
                                    continue;
                                }
                                let name = spec
                                    .child_by_field_name("name")
                                    .map(|n| node_text(n, source).to_owned())
                                    .unwrap_or_default();
                                let alias = spec
                                    .child_by_field_name("alias")
                                    .map(|n| node_text(n, source).to_owned());
                                names.push(ImportedName { name, alias });
                            }
                        }
                        _ => {}
                    }
                }
            }

            if let Some(alias) = namespace_alias {
                vec![ImportStatement {
                    names: vec![ImportedName {
                        name: module_path.clone(),
                        alias: Some(alias),
                    }],
                    module_path,
                    style: ImportStyle::Namespace,
                    reexport: false,
                    range,
                }]
            } else if names.is_empty() {
                vec![ImportStatement {
                    module_path,
                    names,
                    style: ImportStyle::SideEffect,
                    reexport: false,
                    range,
                }]
            } else {
                vec![ImportStatement {
                    module_path,
                    names,
                    style: ImportStyle::Named,
                    reexport: false,
                    range,
                }]
            }
        }
        // `export ... from './x'` — a re-export. Only reached when the
        // statement has a source field.
        "export_statement" => {
            let mut names = Vec::new();
            let mut wildcard = false;
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "export_clause" => {
                        let mut spec_cursor = child.walk();
                        for spec in child.named_children(&mut spec_cursor) {
                            if spec.kind() != "export_specifier" {
                                continue;
                            }
                            let name = spec
                                .child_by_field_name("name")
                                .map(|n| node_text(n, source).to_owned())
                                .unwrap_or_default();
                            let alias = spec
                                .child_by_field_name("alias")
                                .map(|n| node_text(n, source).to_owned());
                            names.push(ImportedName { name, alias });
                        }
                    }
                    "namespace_export" => wildcard = true,
                    _ => {}
                }
            }
            // Bare `export * from` has no named child at all.
            if !wildcard && names.is_empty() {
                wildcard = node_text(node, source).contains('*');
            }

            vec![ImportStatement {
                module_path,
                names,
                style: if wildcard {
                    ImportStyle::Wildcard
                } else {
                    ImportStyle::Named
                },
                reexport: true,
                range,
            }]
        }
        _ => Vec::new(),
    }
}

/// Base-class and implemented-interface expressions of a `class_heritage`.
pub fn base_candidates<'a>(heritage: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut cursor = heritage.walk();
    for clause in heritage.named_children(&mut cursor) {
        match clause.kind() {
            "extends_clause" | "implements_clause" => {
                let mut inner = clause.walk();
                for child in clause.named_children(&mut inner) {
                    if child.kind() != "type_arguments" {
                        out.push(child);
                    }
                }
            }
            // JavaScript heritage is a bare expression.
            _ => out.push(clause),
        }
    }
    out
}
