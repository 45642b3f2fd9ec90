use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::AriadneConfig;
use crate::language::LanguageKind;

/// Walk a project directory and collect indexable source files.
///
/// Respects `.gitignore` rules, always excludes `node_modules` and `.git`,
/// and applies any additional exclusions from `config.exclude`. Files whose
/// language the registry does not know are skipped here rather than failing
/// later.
pub fn walk_project(root: &Path, config: &AriadneConfig) -> anyhow::Result<Vec<PathBuf>> {
    let excludes = compile_excludes(config);
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(true)
        // Read .gitignore files even when the directory is not inside a git
        // repository, so exclusions work for standalone trees and tests.
        .require_git(false)
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "walk error, skipping entry");
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }
        if path
            .components()
            .any(|c| c.as_os_str() == "node_modules" || c.as_os_str() == ".git")
        {
            continue;
        }
        if is_excluded(root, path, &excludes) {
            continue;
        }
        if LanguageKind::from_path(path).is_none() {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Compile the config's exclude patterns once for the whole walk. Invalid
/// patterns are reported and dropped, never fatal.
fn compile_excludes(config: &AriadneConfig) -> Vec<glob::Pattern> {
    config
        .exclude
        .iter()
        .flatten()
        .filter_map(|raw| match glob::Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                warn!(pattern = %raw, %err, "ignoring invalid exclude pattern");
                None
            }
        })
        .collect()
}

/// A pattern excludes a file when it matches the project-relative path or a
/// single component of it, so `vendor` prunes the whole directory without
/// the user spelling `vendor/**`.
fn is_excluded(root: &Path, path: &Path, excludes: &[glob::Pattern]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);
    excludes.iter().any(|pattern| {
        pattern.matches_path(relative)
            || relative
                .components()
                .any(|c| c.as_os_str().to_str().is_some_and(|s| pattern.matches(s)))
    })
}
