//! Filesystem watching: debounced notify events, filtered the same way the
//! initial walk filters files, bridged into a tokio channel for the
//! incremental scheduler.

pub mod event;
pub mod scheduler;

use std::path::Path;
use std::time::Duration;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::language::LanguageKind;
use event::WatchEvent;

/// Handle to a running watcher. Keeps the debouncer alive — dropping it
/// stops the OS watcher.
pub struct WatcherHandle {
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    _bridge_task: JoinHandle<()>,
}

/// OS-event debounce. Batch coalescing on top of this is the scheduler's
/// quiet period, not ours.
const OS_DEBOUNCE: Duration = Duration::from_millis(50);

/// Bounded inbound queue. When full the bridge blocks, which makes the
/// debouncer coalesce further events — the merge-oldest-batch behavior the
/// scheduler relies on (invalidation is idempotent).
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Build a gitignore matcher from the project root — the same source of
/// truth the initial walk uses.
fn build_gitignore_matcher(project_root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(project_root);
    let gitignore_path = project_root.join(".gitignore");
    if gitignore_path.exists() {
        let _ = builder.add(&gitignore_path);
    }
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Start a debounced watcher on `watch_root`.
///
/// Returns a handle (must be kept alive) and a receiver of classified
/// events for the scheduler.
pub fn start_watcher(
    watch_root: &Path,
) -> anyhow::Result<(WatcherHandle, tokio_mpsc::Receiver<WatchEvent>)> {
    let (std_tx, std_rx) = std::sync::mpsc::channel::<DebounceEventResult>();

    let mut debouncer = new_debouncer(OS_DEBOUNCE, move |res| {
        let _ = std_tx.send(res);
    })?;
    debouncer
        .watcher()
        .watch(watch_root, RecursiveMode::Recursive)?;

    let gitignore = build_gitignore_matcher(watch_root);
    let (tokio_tx, tokio_rx) = tokio_mpsc::channel::<WatchEvent>(EVENT_QUEUE_CAPACITY);

    let bridge_task = tokio::task::spawn_blocking(move || {
        while let Ok(result) = std_rx.recv() {
            match result {
                Ok(events) => {
                    for debounced in events {
                        if let Some(event) = classify_event(&debounced.path, &gitignore)
                            && tokio_tx.blocking_send(event).is_err()
                        {
                            return; // receiver dropped, shutdown
                        }
                    }
                }
                Err(err) => {
                    warn!(error = ?err, "watcher event stream error");
                }
            }
        }
    });

    Ok((
        WatcherHandle {
            _debouncer: debouncer,
            _bridge_task: bridge_task,
        },
        tokio_rx,
    ))
}

/// Filter and classify one event path. Unknown languages and ignored paths
/// yield nothing; existence decides Changed vs Removed (the debouncer does
/// not distinguish create from modify).
fn classify_event(path: &Path, gitignore: &Gitignore) -> Option<WatchEvent> {
    if path
        .components()
        .any(|c| c.as_os_str() == "node_modules" || c.as_os_str() == ".git")
    {
        return None;
    }
    let is_dir = path.is_dir();
    if gitignore.matched(path, is_dir).is_ignore() {
        return None;
    }
    let ext = path.extension().and_then(|e| e.to_str())?;
    LanguageKind::from_extension(ext)?;

    if path.exists() {
        Some(WatchEvent::Changed(path.to_path_buf()))
    } else {
        Some(WatchEvent::Removed(path.to_path_buf()))
    }
}
