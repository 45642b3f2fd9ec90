//! Module-search rules: turn a raw import path into an indexed file.
//!
//! Resolution consults only the project index (path and module-path tables),
//! never the filesystem — readers must not block on disk, and unresolved
//! specifiers (external packages, builtins) simply stay unresolved.

use std::path::{Component, Path, PathBuf};

use crate::language::LanguageKind;
use crate::project::{FileId, ProjectIndex};

/// Resolve `module_path` as written in `importer` to an indexed file.
pub fn resolve_module(
    index: &ProjectIndex,
    importer: FileId,
    module_path: &str,
) -> Option<FileId> {
    let graph = index.graph(importer)?;
    match graph.language {
        LanguageKind::Python => resolve_python(index, importer, module_path),
        LanguageKind::TypeScript | LanguageKind::JavaScript => {
            resolve_ts_js(index, importer, module_path)
        }
        LanguageKind::Rust => resolve_rust(index, importer, module_path),
    }
}

// ---------------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------------

/// Package-style paths walk the module-path table (directories become
/// packages via their `__init__.py` marker, which is what gives them a table
/// entry). Relative paths are anchored at the importer's package.
fn resolve_python(index: &ProjectIndex, importer: FileId, module_path: &str) -> Option<FileId> {
    let absolute = if module_path.starts_with('.') {
        let dots = module_path.chars().take_while(|&c| c == '.').count();
        let remainder = &module_path[dots..];

        // One dot anchors at the importer's own package; each further dot
        // climbs one package up.
        let importer_module = crate::project::module_path_for(
            &index.root,
            index.path_of(importer)?,
            LanguageKind::Python,
        )?;
        let mut segments: Vec<&str> = importer_module.split('.').collect();
        let is_init = index
            .path_of(importer)?
            .file_name()
            .is_some_and(|n| n == "__init__.py");
        // A module's package is its path minus the module segment; an init
        // module already names its package.
        let climb = if is_init { dots - 1 } else { dots };
        for _ in 0..climb {
            segments.pop();
        }
        if !remainder.is_empty() {
            segments.extend(remainder.split('.'));
        }
        if segments.is_empty() {
            return None;
        }
        segments.join(".")
    } else {
        module_path.to_owned()
    };

    index.module_paths.get(&absolute).copied()
}

// ---------------------------------------------------------------------------
// TypeScript / JavaScript
// ---------------------------------------------------------------------------

const TS_JS_PROBES: &[&str] = &["ts", "tsx", "js", "jsx", "mts", "mjs", "cjs"];

/// Relative specifiers probe the indexed paths with the usual extension and
/// `index.*` fallbacks. Bare specifiers are external packages and stay
/// unresolved by design.
fn resolve_ts_js(index: &ProjectIndex, importer: FileId, module_path: &str) -> Option<FileId> {
    if !module_path.starts_with('.') && !module_path.starts_with('/') {
        return None;
    }
    let importer_dir = index.path_of(importer)?.parent()?;
    let joined = normalize(&importer_dir.join(module_path));

    // Exact path (specifier already carries an extension).
    if let Some(id) = index.file_id(&joined) {
        return Some(id);
    }
    for ext in TS_JS_PROBES {
        let candidate = joined.with_extension(ext);
        if let Some(id) = index.file_id(&candidate) {
            return Some(id);
        }
    }
    for ext in TS_JS_PROBES {
        let candidate = joined.join(format!("index.{ext}"));
        if let Some(id) = index.file_id(&candidate) {
            return Some(id);
        }
    }
    None
}

/// Lexical normalisation — fold `.` and `..` without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rust
// ---------------------------------------------------------------------------

/// Mod-tree walk over the `crate::...` table. `crate::` paths are looked up
/// directly; `super::` climbs from the importer's module; bare paths try the
/// importer-relative tree first, then the crate root. External crates stay
/// unresolved.
fn resolve_rust(index: &ProjectIndex, importer: FileId, module_path: &str) -> Option<FileId> {
    let importer_module = crate::project::module_path_for(
        &index.root,
        index.path_of(importer)?,
        LanguageKind::Rust,
    )?;

    let lookup = |candidate: &str| index.module_paths.get(candidate).copied();

    if let Some(rest) = module_path.strip_prefix("crate::") {
        return lookup(&format!("crate::{rest}"));
    }
    if module_path == "crate" {
        return lookup("crate");
    }
    if let Some(rest) = module_path.strip_prefix("super::") {
        let mut segments: Vec<&str> = importer_module.split("::").collect();
        segments.pop();
        if segments.is_empty() {
            return None;
        }
        let base = segments.join("::");
        return lookup(&format!("{base}::{rest}"));
    }
    if let Some(rest) = module_path.strip_prefix("self::") {
        return lookup(&format!("{importer_module}::{rest}"));
    }

    lookup(&format!("{importer_module}::{module_path}"))
        .or_else(|| lookup(&format!("crate::{module_path}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::index_file;
    use crate::project::ProjectIndex;

    fn project_with(files: &[(&str, &str)]) -> ProjectIndex {
        let root = PathBuf::from("/proj");
        let mut index = ProjectIndex::new(root.clone());
        for (rel, source) in files {
            let path = root.join(rel);
            let language = LanguageKind::from_path(&path).expect("known language");
            index.insert(index_file(&path, source, language));
        }
        index
    }

    #[test]
    fn test_python_package_style_path() {
        let index = project_with(&[
            ("main.py", "import subpkg.processor\n"),
            ("subpkg/__init__.py", ""),
            ("subpkg/processor.py", "def process_batch():\n    pass\n"),
        ]);
        let main = index.file_id(Path::new("/proj/main.py")).unwrap();
        let processor = index.file_id(Path::new("/proj/subpkg/processor.py")).unwrap();
        assert_eq!(
            resolve_module(&index, main, "subpkg.processor"),
            Some(processor)
        );
        let init = index.file_id(Path::new("/proj/subpkg/__init__.py")).unwrap();
        assert_eq!(resolve_module(&index, main, "subpkg"), Some(init));
    }

    #[test]
    fn test_python_relative_single_dot() {
        let index = project_with(&[
            ("pkg/__init__.py", ""),
            ("pkg/a.py", "from .b import helper\n"),
            ("pkg/b.py", "def helper():\n    pass\n"),
        ]);
        let a = index.file_id(Path::new("/proj/pkg/a.py")).unwrap();
        let b = index.file_id(Path::new("/proj/pkg/b.py")).unwrap();
        assert_eq!(resolve_module(&index, a, ".b"), Some(b));
    }

    #[test]
    fn test_python_relative_double_dot_climbs() {
        let index = project_with(&[
            ("shared.py", "def config():\n    pass\n"),
            ("pkg/__init__.py", ""),
            ("pkg/inner.py", "from ..shared import config\n"),
        ]);
        let inner = index.file_id(Path::new("/proj/pkg/inner.py")).unwrap();
        let shared = index.file_id(Path::new("/proj/shared.py")).unwrap();
        assert_eq!(resolve_module(&index, inner, "..shared"), Some(shared));
    }

    #[test]
    fn test_ts_relative_with_extension_probe() {
        let index = project_with(&[
            ("src/app.ts", "import { walk } from './tree';\n"),
            ("src/tree.ts", "export function walk() {}\n"),
        ]);
        let app = index.file_id(Path::new("/proj/src/app.ts")).unwrap();
        let tree = index.file_id(Path::new("/proj/src/tree.ts")).unwrap();
        assert_eq!(resolve_module(&index, app, "./tree"), Some(tree));
    }

    #[test]
    fn test_ts_index_file_fallback() {
        let index = project_with(&[
            ("src/app.ts", "import { api } from './lib';\n"),
            ("src/lib/index.ts", "export function api() {}\n"),
        ]);
        let app = index.file_id(Path::new("/proj/src/app.ts")).unwrap();
        let lib = index.file_id(Path::new("/proj/src/lib/index.ts")).unwrap();
        assert_eq!(resolve_module(&index, app, "./lib"), Some(lib));
    }

    #[test]
    fn test_ts_bare_specifier_is_external() {
        let index = project_with(&[("src/app.ts", "import React from 'react';\n")]);
        let app = index.file_id(Path::new("/proj/src/app.ts")).unwrap();
        assert_eq!(resolve_module(&index, app, "react"), None);
    }

    #[test]
    fn test_rust_crate_path() {
        let index = project_with(&[
            ("src/lib.rs", "pub mod walker;\n"),
            ("src/walker.rs", "pub fn walk() {}\n"),
        ]);
        let lib = index.file_id(Path::new("/proj/src/lib.rs")).unwrap();
        let walker = index.file_id(Path::new("/proj/src/walker.rs")).unwrap();
        assert_eq!(resolve_module(&index, lib, "crate::walker"), Some(walker));
        assert_eq!(resolve_module(&index, lib, "walker"), Some(walker));
    }
}
