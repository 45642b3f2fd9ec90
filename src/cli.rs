use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// A multi-language source-code indexer.
///
/// ariadne parses a project into per-file scope graphs, resolves references
/// and imports across files, and answers structural queries — definitions,
/// callers, entry points, call-graph neighborhoods — for editor tooling and
/// LLM tool hosts.
#[derive(Parser, Debug)]
#[command(
    name = "ariadne",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a project once and print a summary.
    Index {
        /// Path to the project root.
        path: PathBuf,

        /// Output the summary as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },

    /// List top-level entry points: callables no other definition calls.
    Entrypoints {
        /// Path to the project root.
        path: PathBuf,

        /// Restrict to specific files (relative to the project root).
        #[arg(long, value_delimiter = ',')]
        files: Vec<String>,

        /// Restrict to specific folders (relative to the project root).
        #[arg(long, value_delimiter = ',')]
        folders: Vec<String>,

        /// Include test-suite entry points (filtered by naming convention
        /// otherwise).
        #[arg(long)]
        include_tests: bool,
    },

    /// Show the call-graph neighborhood around a symbol.
    ///
    /// The symbol ref is either `file:name` (exact file) or a bare name;
    /// bare names prefer the definition with the most callers.
    Neighborhood {
        /// Symbol reference: `main.py:main` or `main`.
        symbol_ref: String,

        /// Path to the project root.
        path: PathBuf,

        /// Traversal depth in each direction.
        #[arg(long, default_value_t = crate::callgraph::DEFAULT_NEIGHBORHOOD_DEPTH)]
        depth: usize,
    },

    /// Dump every indexed definition as JSON rows.
    Definitions {
        /// Path to the project root.
        path: PathBuf,
    },

    /// Project statistics: files, definitions, references, languages.
    Stats {
        /// Path to the project root.
        path: PathBuf,
    },

    /// Index, then watch the project and keep the index fresh.
    Watch {
        /// Path to the project root.
        path: PathBuf,
    },

    /// Serve queries to tool hosts over MCP stdio.
    Serve {
        /// Path to the project root.
        path: PathBuf,

        /// Index once and freeze — do not watch for changes.
        #[arg(long)]
        no_watch: bool,

        /// Include test-suite entry points in responses.
        #[arg(long)]
        include_tests: bool,
    },
}
