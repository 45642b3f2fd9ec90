use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema)]
pub struct ListEntrypointsParams {
    /// Restrict to these files (paths relative to the project root)
    pub files: Option<Vec<String>>,
    /// Restrict to these folders (paths relative to the project root)
    pub folders: Option<Vec<String>>,
    /// Include test-suite entry points (filtered by naming convention otherwise)
    pub include_tests: Option<bool>,
}

#[derive(Deserialize, JsonSchema)]
pub struct NeighborhoodParams {
    /// Symbol reference: "file:name" for an exact file, or a bare name
    pub symbol_ref: String,
    /// Traversal depth in each direction (default: 2)
    pub depth: Option<usize>,
}
