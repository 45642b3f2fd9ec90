//! The incremental scheduler: coalesce watch events into batches behind a
//! quiet period, invalidate what a batch touches, re-run the dependent
//! indexing stages, and publish a fresh snapshot.
//!
//! Batches are atomic from a reader's point of view: a query observes the
//! full pre-state or the full post-state of a batch, never a mix, because
//! the only externally visible mutation is the snapshot publication at the
//! end of `apply_batch`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::index::index_file;
use crate::language::LanguageKind;
use crate::project::{FileId, ProjectIndex, Snapshot};
use crate::resolver::{ResolveStats, imports::resolve_imports, resolve_file_refs};
use super::event::WatchEvent;

/// Quiet period: a batch closes once this long passes without a new event.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Owns the project index — the single writer. Everything else sees
/// snapshots through the watch channel.
pub struct Scheduler {
    index: ProjectIndex,
    publisher: watch::Sender<Snapshot>,
}

impl Scheduler {
    /// Wrap an already cold-indexed project. The receiver side observes the
    /// initial snapshot immediately.
    pub fn new(index: ProjectIndex) -> (Self, watch::Receiver<Snapshot>) {
        let (publisher, receiver) = watch::channel(index.snapshot());
        (Scheduler { index, publisher }, receiver)
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }

    /// Drive the scheduler from a watcher event stream until it closes.
    /// Events are coalesced into batches behind `quiet`; a batch runs to
    /// completion while further events queue up for the next one.
    pub async fn run(mut self, mut events: mpsc::Receiver<WatchEvent>, quiet: Duration) {
        while let Some(first) = events.recv().await {
            let mut batch = vec![first];
            loop {
                match tokio::time::timeout(quiet, events.recv()).await {
                    Ok(Some(event)) => batch.push(event),
                    Ok(None) => {
                        self.apply_batch(batch);
                        return;
                    }
                    Err(_elapsed) => break,
                }
            }
            self.apply_batch(batch);
        }
    }

    /// Apply one batch: invalidate, re-index changed files (stages 4.2-4.3),
    /// re-resolve them and every reverse importer (4.4-4.5), publish.
    /// Type resolution and call-graph queries are lazy — nothing more to do
    /// here after invalidation.
    pub fn apply_batch(&mut self, events: Vec<WatchEvent>) {
        let batch = coalesce(events);
        if batch.is_empty() {
            return;
        }

        // Reverse importers must be collected before the tables are purged.
        let mut dependents: HashSet<FileId> = HashSet::new();
        let mut reindexed: HashSet<FileId> = HashSet::new();

        for event in &batch {
            if let Some(id) = self.index.file_id(event.path()) {
                dependents.extend(self.index.importers_of(id));
            }
        }

        for event in &batch {
            match event {
                WatchEvent::Removed(path) => {
                    if let Some(id) = self.index.remove(path) {
                        debug!(path = %path.display(), "removed from index");
                        dependents.remove(&id);
                        reindexed.remove(&id);
                    }
                }
                WatchEvent::Changed(path) => {
                    if let Some(id) = self.reindex_file(path) {
                        reindexed.insert(id);
                        dependents.remove(&id);
                    }
                }
            }
        }

        // Files with unresolved names may now resolve against created
        // files — they carry no reverse-import edge yet, so find them by
        // their gaps.
        dependents.extend(self.files_with_unresolved(&reindexed));

        let mut stats = ResolveStats::default();
        for &id in &reindexed {
            resolve_imports(&mut self.index, id);
        }
        for &id in &reindexed {
            resolve_file_refs(&mut self.index, id, &mut stats);
        }
        // Local graphs of dependents are still valid; only their cross-file
        // resolution is refreshed.
        for &id in &dependents {
            resolve_imports(&mut self.index, id);
            resolve_file_refs(&mut self.index, id, &mut stats);
        }

        info!(
            changed = reindexed.len(),
            dependents = dependents.len(),
            "batch applied"
        );
        let _ = self.publisher.send(self.index.snapshot());
    }

    /// Re-read and re-index one file. Skips the work when the content hash
    /// is unchanged (re-indexing identical bytes is a no-op by contract).
    fn reindex_file(&mut self, path: &PathBuf) -> Option<FileId> {
        let language = LanguageKind::from_path(path)?;
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            // Disappeared between event and read — the Removed event for it
            // is either in this batch or the next.
            Err(_) => return None,
        };

        let new_hash = xxhash_rust::xxh64::xxh64(source.as_bytes(), 0);
        if let Some(id) = self.index.file_id(path)
            && self.index.graph(id).is_some_and(|g| g.content_hash == new_hash)
        {
            debug!(path = %path.display(), "content unchanged, skipping");
            return None;
        }

        if let Some(id) = self.index.file_id(path) {
            self.index.purge_derived(id);
        }
        Some(self.index.insert(index_file(path, &source, language)))
    }

    /// Files with unresolved import bindings or pending plain-name
    /// references — candidates to re-resolve when new files appear.
    fn files_with_unresolved(&self, exclude: &HashSet<FileId>) -> Vec<FileId> {
        self.index
            .files()
            .filter(|(id, _)| !exclude.contains(id))
            .filter(|(id, graph)| {
                let bindings = graph
                    .defs
                    .iter()
                    .filter(|d| d.kind == crate::index::graph::DefKind::ImportBinding)
                    .count();
                let resolved = self
                    .index
                    .import_resolutions
                    .get(id)
                    .map(Vec::len)
                    .unwrap_or(0);
                if resolved < bindings {
                    return true;
                }
                let edges = self.index.cross_edges.get(id);
                graph.pending_refs().any(|(ref_id, r)| {
                    r.receiver.is_none()
                        && !edges.is_some_and(|es| {
                            es.iter().any(|e| e.source.reference == ref_id)
                        })
                })
            })
            .map(|(id, _)| id)
            .collect()
    }

    pub fn index(&self) -> &ProjectIndex {
        &self.index
    }
}

/// Deduplicate a batch by path, last event per path winning. This is also
/// the merge rule for an overfull queue — invalidation is idempotent, so
/// merging batches loses nothing.
fn coalesce(events: Vec<WatchEvent>) -> Vec<WatchEvent> {
    let mut latest: Vec<WatchEvent> = Vec::new();
    for event in events {
        latest.retain(|e| e.path() != event.path());
        latest.push(event);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use crate::callgraph::{QueryDeadline, show_call_graph_neighborhood};
    use crate::resolver::resolve_all;
    use crate::walker::walk_project;

    /// Cold-index a real directory, as `main` does before watching.
    fn cold_index(root: &Path) -> ProjectIndex {
        let mut index = ProjectIndex::new(root.to_path_buf());
        let config = crate::config::AriadneConfig::default();
        for path in walk_project(root, &config).unwrap() {
            if let Some(language) = LanguageKind::from_path(&path) {
                let source = fs::read_to_string(&path).unwrap();
                index.insert(index_file(&path, &source, language));
            }
        }
        resolve_all(&mut index);
        index
    }

    fn two_file_project() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("callee.py"),
            "def target():\n    pass\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("caller.py"),
            "from callee import target\n\ndef run():\n    target()\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_delete_then_recreate_restores_edges() {
        let dir = two_file_project();
        let (mut scheduler, rx) = Scheduler::new(cold_index(dir.path()));
        let callee_path = dir.path().join("callee.py");

        // Baseline: the cross-file call edge exists.
        let snapshot = rx.borrow().clone();
        let n = show_call_graph_neighborhood(&snapshot, "caller.py:run", 1, &QueryDeadline::none())
            .unwrap();
        assert!(n.nodes.iter().any(|node| node.name == "target"));

        // Delete the callee's file: no edges into its definitions, no crash.
        fs::remove_file(&callee_path).unwrap();
        scheduler.apply_batch(vec![WatchEvent::Removed(callee_path.clone())]);
        let snapshot = rx.borrow().clone();
        assert!(snapshot.file_id(&callee_path).is_none());
        let n = show_call_graph_neighborhood(&snapshot, "caller.py:run", 1, &QueryDeadline::none())
            .unwrap();
        assert!(
            !n.nodes.iter().any(|node| node.name == "target"),
            "deleted definitions must leave the call graph"
        );

        // Recreate it: edges return.
        fs::write(&callee_path, "def target():\n    pass\n").unwrap();
        scheduler.apply_batch(vec![WatchEvent::Changed(callee_path.clone())]);
        let snapshot = rx.borrow().clone();
        let n = show_call_graph_neighborhood(&snapshot, "caller.py:run", 1, &QueryDeadline::none())
            .unwrap();
        assert!(
            n.nodes.iter().any(|node| node.name == "target"),
            "recreating the file must restore the edge"
        );
    }

    #[test]
    fn test_incremental_equals_cold_index() {
        let dir = two_file_project();
        let (mut scheduler, _rx) = Scheduler::new(cold_index(dir.path()));

        // Edit caller.py to add a function, apply incrementally.
        let caller_path = dir.path().join("caller.py");
        let edited =
            "from callee import target\n\ndef run():\n    target()\n\ndef extra():\n    run()\n";
        fs::write(&caller_path, edited).unwrap();
        scheduler.apply_batch(vec![WatchEvent::Changed(caller_path.clone())]);

        // A cold index of the final file contents must agree.
        let cold = cold_index(dir.path());
        let incremental = scheduler.index();

        assert_eq!(cold.file_count(), incremental.file_count());
        for (cold_id, cold_graph) in cold.files() {
            let live_id = incremental.graph(
                incremental
                    .file_id(&cold_graph.path)
                    .expect("same files indexed"),
            );
            let live_graph = live_id.unwrap();
            assert_eq!(cold_graph.content_hash, live_graph.content_hash);
            assert_eq!(cold_graph.defs.len(), live_graph.defs.len());
            assert_eq!(cold_graph.refs.len(), live_graph.refs.len());
            let cold_edges = cold.cross_edges.get(&cold_id).map(Vec::len).unwrap_or(0);
            let live_edges = incremental
                .cross_edges
                .get(&incremental.file_id(&cold_graph.path).unwrap())
                .map(Vec::len)
                .unwrap_or(0);
            assert_eq!(cold_edges, live_edges, "{}", cold_graph.path.display());
        }
    }

    #[test]
    fn test_edit_and_revert_is_bit_identical() {
        let dir = two_file_project();
        let (mut scheduler, _rx) = Scheduler::new(cold_index(dir.path()));
        let caller_path = dir.path().join("caller.py");
        let original = fs::read_to_string(&caller_path).unwrap();
        let original_graph = {
            let id = scheduler.index().file_id(&caller_path).unwrap();
            scheduler.index().graph(id).unwrap().clone()
        };

        fs::write(
            &caller_path,
            format!("{original}\ndef added():\n    pass\n"),
        )
        .unwrap();
        scheduler.apply_batch(vec![WatchEvent::Changed(caller_path.clone())]);
        fs::write(&caller_path, &original).unwrap();
        scheduler.apply_batch(vec![WatchEvent::Changed(caller_path.clone())]);

        let id = scheduler.index().file_id(&caller_path).unwrap();
        let final_graph = scheduler.index().graph(id).unwrap();
        assert_eq!(original_graph.content_hash, final_graph.content_hash);
        assert_eq!(original_graph.defs.len(), final_graph.defs.len());
        assert_eq!(original_graph.refs.len(), final_graph.refs.len());
        assert_eq!(original_graph.scopes.len(), final_graph.scopes.len());
    }

    #[test]
    fn test_new_file_resolves_previously_pending_import() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.py"),
            "from latecomer import shine\n\nshine()\n",
        )
        .unwrap();
        let (mut scheduler, _rx) = Scheduler::new(cold_index(dir.path()));

        let main_id = scheduler.index().file_id(&dir.path().join("main.py")).unwrap();
        assert!(
            scheduler
                .index()
                .import_resolutions
                .get(&main_id)
                .unwrap()
                .is_empty(),
            "nothing to resolve against yet"
        );

        let late_path = dir.path().join("latecomer.py");
        fs::write(&late_path, "def shine():\n    pass\n").unwrap();
        scheduler.apply_batch(vec![WatchEvent::Changed(late_path)]);

        let resolutions = scheduler.index().import_resolutions.get(&main_id).unwrap();
        assert_eq!(
            resolutions.len(),
            1,
            "the pending import resolves once the file exists"
        );
    }

    #[test]
    fn test_unchanged_content_is_skipped() {
        let dir = two_file_project();
        let (mut scheduler, rx) = Scheduler::new(cold_index(dir.path()));
        let callee_path = dir.path().join("callee.py");

        let before = rx.borrow().clone();
        // Touch without changing bytes.
        scheduler.apply_batch(vec![WatchEvent::Changed(callee_path.clone())]);
        let after = rx.borrow().clone();

        let id = before.file_id(&callee_path).unwrap();
        assert!(
            std::sync::Arc::ptr_eq(
                before.graph(id).unwrap(),
                after.graph(id).unwrap()
            ),
            "byte-identical content must not be re-indexed"
        );
    }

    #[test]
    fn test_coalesce_keeps_last_event_per_path() {
        let a = PathBuf::from("/p/a.py");
        let events = vec![
            WatchEvent::Changed(a.clone()),
            WatchEvent::Removed(a.clone()),
        ];
        let merged = coalesce(events);
        assert_eq!(merged, vec![WatchEvent::Removed(a)]);
    }
}
