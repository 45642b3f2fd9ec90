use crate::index::graph::DefKind;
use super::pack::PackSource;

/// JavaScript shares the ESM surface with TypeScript (import decomposition
/// lives in [`super::typescript`]); only the query pack differs — no type
/// annotations, no interfaces, class names are plain identifiers.
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
      name: (identifier) @name) @def

    (function_expression
      name: (identifier) @name) @def

    (class_declaration
      name: (identifier) @name
      (class_heritage)? @bases) @def

    (method_definition
      name: (property_identifier) @name) @def

    (field_definition
      property: (property_identifier) @name
      value: (_)? @value) @def

    (variable_declarator
      name: (identifier) @name
      value: (_)? @value) @def

    (formal_parameters (identifier) @name) @def
    (arrow_function parameter: (identifier) @name) @def
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

    (identifier) @ref.read
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
        "function_declaration" | "function_expression" | "method_definition" => {
            Some(DefKind::Function)
        }
        "class_declaration" => Some(DefKind::Class),
        "variable_declarator" | "field_definition" => Some(DefKind::Variable),
        "formal_parameters" | "arrow_function" => Some(DefKind::Parameter),
        _ => None,
    }
}
