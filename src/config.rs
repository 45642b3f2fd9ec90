use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::watcher::scheduler::DEFAULT_QUIET_PERIOD;

/// Configuration loaded from `ariadne.toml` at the project root.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AriadneConfig {
    /// Additional path patterns to exclude from indexing (beyond .gitignore
    /// and node_modules).
    pub exclude: Option<Vec<String>>,
    /// Include test-suite entry points by default.
    pub include_tests: Option<bool>,
    /// Watcher quiet period in milliseconds.
    pub debounce_ms: Option<u64>,
}

impl AriadneConfig {
    /// Load `ariadne.toml` from the project root. A missing file is the
    /// normal case and stays silent; an unreadable or unparsable one is
    /// reported and ignored, since bad config must never block indexing.
    pub fn load(root: &Path) -> Self {
        let path = root.join("ariadne.toml");
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(path = %path.display(), %err, "config unreadable, using defaults");
                return Self::default();
            }
        };
        toml::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "config invalid, using defaults");
            Self::default()
        })
    }

    pub fn quiet_period(&self) -> Duration {
        self.debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_QUIET_PERIOD)
    }
}
