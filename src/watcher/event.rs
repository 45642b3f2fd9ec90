use std::path::PathBuf;

/// Classified filesystem events after debouncing and filtering.
///
/// Creates, modifies and renames all land on `Changed` — the scheduler
/// re-reads the file either way, and a rename surfaces as a `Removed` for
/// the old path plus a `Changed` for the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            WatchEvent::Changed(p) | WatchEvent::Removed(p) => p,
        }
    }
}
