//! Integration test suite: end-to-end runs of the compiled `ariadne` binary
//! against fixture projects written into temp directories. The
//! `CARGO_BIN_EXE_ariadne` environment variable is set by Cargo during
//! `cargo test` and points at the compiled binary for the current profile.
//!
//! MCP coverage strategy: both MCP tools call the same query functions as
//! the `entrypoints` and `neighborhood` subcommands tested here, and
//! serialise through the same response types, so CLI tests provide
//! equivalent regression coverage without a mock JSON-RPC client.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ariadne"))
}

/// Run an ariadne command and assert it exits successfully. Returns stdout.
fn run_success(args: &[&str]) -> String {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke ariadne binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        out.status.success(),
        "command {args:?} failed with status {:?}\nstdout: {stdout}\nstderr: {stderr}",
        out.status,
    );
    stdout
}

/// Run an ariadne command and assert it fails. Returns (stdout, stderr).
fn run_failure(args: &[&str]) -> (String, String) {
    let out = Command::new(binary())
        .args(args)
        .output()
        .expect("failed to invoke ariadne binary");
    assert!(
        !out.status.success(),
        "command {args:?} unexpectedly succeeded"
    );
    (
        String::from_utf8_lossy(&out.stdout).to_string(),
        String::from_utf8_lossy(&out.stderr).to_string(),
    )
}

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// A Python project using dotted aliased imports, mirroring the classic
/// `import pkg.mod as alias` layout.
fn aliased_imports_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "main.py",
        "import subpkg.processor as proc\n\n\ndef main():\n    batch = proc.process_batch()\n    valid = proc.validate_input()\n    return batch, valid\n",
    );
    write_file(dir.path(), "subpkg/__init__.py", "");
    write_file(
        dir.path(),
        "subpkg/processor.py",
        "def process_batch():\n    return \"processed\"\n\n\ndef validate_input():\n    return \"validated\"\n",
    );
    dir
}

/// Local definition shadowing an imported name.
fn shadowing_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "utils.py",
        "def helper():\n    return \"imported helper\"\n\n\ndef process_data(data):\n    return data\n",
    );
    write_file(
        dir.path(),
        "shadowing.py",
        "from utils import helper, process_data\n\n\ndef helper():\n    return \"local helper\"\n\n\ndef run():\n    result = helper()\n    processed = process_data(result)\n    return processed\n",
    );
    dir
}

// ---------------------------------------------------------------------------
// index / stats
// ---------------------------------------------------------------------------

#[test]
fn test_index_prints_summary() {
    let dir = aliased_imports_project();
    let stdout = run_success(&["index", dir.path().to_str().unwrap()]);
    assert!(stdout.contains("Indexed 3 files"), "got: {stdout}");
    assert!(stdout.contains("Python"), "got: {stdout}");
}

#[test]
fn test_index_json_shape() {
    let dir = aliased_imports_project();
    let stdout = run_success(&["index", dir.path().to_str().unwrap(), "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["files"], 3);
    assert!(json["definitions"].as_u64().unwrap() > 0);
    assert_eq!(json["languages"]["Python"], 3);
}

#[test]
fn test_stats_reports_resolution_counts() {
    let dir = shadowing_project();
    let stdout = run_success(&["stats", dir.path().to_str().unwrap()]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["files"], 2);
    assert!(json["imports_resolved"].as_u64().unwrap() >= 2);
}

// ---------------------------------------------------------------------------
// definitions dump
// ---------------------------------------------------------------------------

#[test]
fn test_definitions_dump_lists_every_definition() {
    let dir = aliased_imports_project();
    let stdout = run_success(&["definitions", dir.path().to_str().unwrap()]);
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout).expect("valid JSON");

    let names: Vec<&str> = rows
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"process_batch"));
    assert!(names.contains(&"validate_input"));
    assert!(names.contains(&"main"));
    // The aliased import binds `proc` in main.py.
    assert!(
        rows.iter().any(|r| {
            r["name"] == "proc" && r["kind"] == "import-binding"
        }),
        "rows: {rows:?}"
    );
}

// ---------------------------------------------------------------------------
// entrypoints
// ---------------------------------------------------------------------------

#[test]
fn test_entrypoints_shape_and_filtering() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "app.py",
        "def helper():\n    return 1\n\n\ndef main():\n    return helper()\n\n\ndef test_main():\n    return main()\n",
    );

    let stdout = run_success(&["entrypoints", dir.path().to_str().unwrap()]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let entrypoints = json["entrypoints"].as_array().unwrap();
    let names: Vec<&str> = entrypoints
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();

    assert!(names.contains(&"main"), "uncalled main is an entry point");
    assert!(
        !names.contains(&"helper"),
        "helper is called by main: not an entry point"
    );
    assert!(
        !names.contains(&"test_main"),
        "test names are filtered by default"
    );

    let main_entry = entrypoints
        .iter()
        .find(|e| e["name"] == "main")
        .expect("main present");
    assert_eq!(main_entry["file"], "app.py");
    assert!(main_entry["excerpt"].as_str().unwrap().contains("def main"));
    assert!(main_entry["range"]["start_line"].as_u64().is_some());
}

#[test]
fn test_entrypoints_include_tests_flag() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "app.py",
        "def main():\n    return 1\n\n\ndef test_main():\n    return main()\n",
    );

    let stdout = run_success(&[
        "entrypoints",
        dir.path().to_str().unwrap(),
        "--include-tests",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let names: Vec<&str> = json["entrypoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"test_main"));
}

#[test]
fn test_entrypoints_folder_scope() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "app/main.py", "def app_main():\n    pass\n");
    write_file(dir.path(), "tools/script.py", "def tool_main():\n    pass\n");

    let stdout = run_success(&[
        "entrypoints",
        dir.path().to_str().unwrap(),
        "--folders",
        "app",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let names: Vec<&str> = json["entrypoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"app_main"));
    assert!(!names.contains(&"tool_main"));
}

// ---------------------------------------------------------------------------
// neighborhood
// ---------------------------------------------------------------------------

#[test]
fn test_neighborhood_cross_file_aliased_import() {
    let dir = aliased_imports_project();
    let stdout = run_success(&[
        "neighborhood",
        "main.py:main",
        dir.path().to_str().unwrap(),
        "--depth",
        "1",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");

    let nodes = json["nodes"].as_array().unwrap();
    let process_batch = nodes
        .iter()
        .find(|n| n["name"] == "process_batch")
        .expect("proc.process_batch() resolves into subpkg/processor.py");
    assert!(
        process_batch["file"]
            .as_str()
            .unwrap()
            .ends_with("subpkg/processor.py")
    );
    assert_eq!(process_batch["distance"], 1);

    let edges = json["edges"].as_array().unwrap();
    assert!(
        edges
            .iter()
            .any(|e| e["call_site"]["file"] == "main.py"),
        "call sites point at the caller's file"
    );
}

#[test]
fn test_neighborhood_shadowing_resolves_to_local_definition() {
    let dir = shadowing_project();
    let stdout = run_success(&[
        "neighborhood",
        "shadowing.py:run",
        dir.path().to_str().unwrap(),
        "--depth",
        "1",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");

    let nodes = json["nodes"].as_array().unwrap();
    let helper = nodes
        .iter()
        .find(|n| n["name"] == "helper")
        .expect("helper() resolves");
    assert_eq!(
        helper["file"], "shadowing.py",
        "the local definition shadows the import"
    );
    // The un-shadowed import keeps resolving across files.
    let process_data = nodes
        .iter()
        .find(|n| n["name"] == "process_data")
        .expect("process_data() resolves");
    assert_eq!(process_data["file"], "utils.py");
}

#[test]
fn test_neighborhood_inheritance_and_super() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "shapes.py",
        "class Base:\n    def base_method(self):\n        return \"base\"\n\n\nclass Derived(Base):\n    def base_method(self):\n        return super().base_method() + \"_derived\"\n\n\ndef use_derived():\n    d = Derived()\n    return d.base_method()\n",
    );

    // The call in use_derived lands on the override...
    let stdout = run_success(&[
        "neighborhood",
        "shapes.py:use_derived",
        dir.path().to_str().unwrap(),
        "--depth",
        "1",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let callees: Vec<u64> = json["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["name"] == "base_method" && n["distance"] == 1)
        .map(|n| n["range"]["start_line"].as_u64().unwrap())
        .collect();
    assert_eq!(callees.len(), 1);
    assert_eq!(callees[0], 7, "Derived.base_method is on line 7");

    // ...and the override's own neighborhood includes Base.base_method as a
    // callee through super().
    let stdout = run_success(&[
        "neighborhood",
        "shapes.py:use_derived",
        dir.path().to_str().unwrap(),
        "--depth",
        "2",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let base_at_depth_2 = json["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["name"] == "base_method" && n["distance"] == 2);
    assert!(base_at_depth_2, "super().base_method() reaches Base at depth 2");
}

#[test]
fn test_neighborhood_polymorphic_protocol() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "handlers.py",
        "from typing import Protocol\n\n\nclass Handler(Protocol):\n    def process(self):\n        ...\n\n    def get_name(self):\n        ...\n\n\nclass HandlerA:\n    def process(self):\n        return \"a\"\n\n    def get_name(self):\n        return \"A\"\n\n\nclass HandlerB:\n    def process(self):\n        return \"b\"\n\n    def get_name(self):\n        return \"B\"\n\n\nclass HandlerC:\n    def process(self):\n        return \"c\"\n\n    def get_name(self):\n        return \"C\"\n\n\ndef execute_handler(h: Handler):\n    return h.process()\n",
    );

    let stdout = run_success(&[
        "neighborhood",
        "handlers.py:execute_handler",
        dir.path().to_str().unwrap(),
        "--depth",
        "1",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let process_nodes: Vec<&serde_json::Value> = json["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|n| n["name"] == "process" && n["distance"] == 1)
        .collect();
    assert_eq!(
        process_nodes.len(),
        3,
        "h.process() fans out to all three implementers"
    );
}

// ---------------------------------------------------------------------------
// error shapes
// ---------------------------------------------------------------------------

#[test]
fn test_not_found_error_shape() {
    let dir = aliased_imports_project();
    let (_, stderr) = run_failure(&[
        "neighborhood",
        "main.py:nonexistent",
        dir.path().to_str().unwrap(),
    ]);
    let json: serde_json::Value =
        serde_json::from_str(&stderr).expect("error body is JSON on stderr");
    assert_eq!(json["error"]["kind"], "not-found");
}

#[test]
fn test_ambiguous_symbol_error_shape() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "aa.py", "def twin():\n    pass\n");
    write_file(dir.path(), "bb.py", "def twin():\n    pass\n");

    let (_, stderr) = run_failure(&["neighborhood", "twin", dir.path().to_str().unwrap()]);
    let json: serde_json::Value = serde_json::from_str(&stderr).expect("valid JSON");
    assert_eq!(json["error"]["kind"], "ambiguous-symbol");
}

#[test]
fn test_unsupported_language_error_shape() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "app.py", "def main():\n    pass\n");
    write_file(dir.path(), "notes.md", "# readme\n");

    let (_, stderr) = run_failure(&[
        "neighborhood",
        "notes.md:main",
        dir.path().to_str().unwrap(),
    ]);
    let json: serde_json::Value = serde_json::from_str(&stderr).expect("valid JSON");
    assert_eq!(json["error"]["kind"], "unsupported-language");
}

// ---------------------------------------------------------------------------
// mixed-language and degraded input
// ---------------------------------------------------------------------------

#[test]
fn test_typescript_project_indexes_and_resolves() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "src/tree.ts",
        "export function walk(): void {}\n\nexport function prune(): void {\n    walk();\n}\n",
    );
    write_file(
        dir.path(),
        "src/app.ts",
        "import { walk } from './tree';\n\nexport function run(): void {\n    walk();\n}\n",
    );

    let stdout = run_success(&[
        "neighborhood",
        "src/app.ts:run",
        dir.path().to_str().unwrap(),
        "--depth",
        "1",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let walk_node = json["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == "walk")
        .expect("cross-file TS import resolves");
    assert!(walk_node["file"].as_str().unwrap().ends_with("tree.ts"));
}

#[test]
fn test_syntax_errors_degrade_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "good.py", "def main():\n    pass\n");
    write_file(dir.path(), "broken.py", "def broken(:\n    ???\n");

    // Indexing succeeds; the broken file is present but best-effort.
    let stdout = run_success(&["index", dir.path().to_str().unwrap(), "--json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(json["files"], 2, "broken files stay in the index");

    // Queries about the healthy file are unaffected.
    run_success(&[
        "neighborhood",
        "good.py:main",
        dir.path().to_str().unwrap(),
    ]);
}

#[test]
fn test_wildcard_import_loop_terminates() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.py", "from b import *\n\n\ndef from_a():\n    pass\n");
    write_file(dir.path(), "b.py", "from a import *\n\n\ndef from_b():\n    pass\n");
    write_file(
        dir.path(),
        "user.py",
        "from a import *\n\n\ndef use():\n    from_b()\n    ghost_name()\n",
    );

    // Terminates (no infinite recursion) and resolves what is reachable.
    let stdout = run_success(&[
        "neighborhood",
        "user.py:use",
        dir.path().to_str().unwrap(),
        "--depth",
        "1",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let nodes = json["nodes"].as_array().unwrap();
    assert!(
        nodes.iter().any(|n| n["name"] == "from_b"),
        "from_b is reachable through the wildcard chain"
    );
    assert!(
        !nodes.iter().any(|n| n["name"] == "ghost_name"),
        "unresolvable names stay unresolved"
    );
}
