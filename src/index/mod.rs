pub mod builder;
pub mod graph;

pub use builder::index_file;

use tree_sitter::Node;

use graph::SrcRange;

/// Source range of a tree-sitter node, with 1-based lines.
pub fn range_of(node: Node<'_>) -> SrcRange {
    let start = node.start_position();
    let end = node.end_position();
    SrcRange {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: start.row + 1,
        start_col: start.column,
        end_line: end.row + 1,
    }
}
