mod callgraph;
mod cli;
mod config;
mod error;
mod index;
mod language;
mod mcp;
mod output;
mod project;
mod resolver;
mod walker;
mod watcher;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use callgraph::{QueryDeadline, ScopeFilter, list_entrypoints, show_call_graph_neighborhood};
use cli::{Cli, Commands};
use config::AriadneConfig;
use index::graph::FileGraph;
use index::index_file;
use language::LanguageKind;
use output::{EntrypointsResponse, IndexStats, definition_rows, print_json, print_query_error, print_summary};
use project::ProjectIndex;
use resolver::{ResolveStats, resolve_all};
use walker::walk_project;
use watcher::scheduler::Scheduler;
use watcher::start_watcher;

/// Deadline applied to one-shot CLI queries.
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Cold-index a project: walk, parse every file in parallel, then run the
/// cross-file resolution passes serially on the single writer.
fn build_index(root: &Path) -> Result<(ProjectIndex, ResolveStats, AriadneConfig)> {
    let root = root
        .canonicalize()
        .with_context(|| format!("project root {} not accessible", root.display()))?;
    let config = AriadneConfig::load(&root);
    let files = walk_project(&root, &config)?;
    info!(files = files.len(), root = %root.display(), "indexing");

    // Parsing is embarrassingly parallel; thread-local parsers mean zero
    // lock contention across rayon workers.
    let graphs: Vec<FileGraph> = files
        .par_iter()
        .filter_map(|path| {
            let language = LanguageKind::from_path(path)?;
            let source = std::fs::read_to_string(path).ok()?;
            Some(index_file(path, &source, language))
        })
        .collect();

    let mut index = ProjectIndex::new(root);
    for graph in graphs {
        index.insert(graph);
    }
    let stats = resolve_all(&mut index);
    Ok((index, stats, config))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index { path, json } => {
            let (index, resolve_stats, _) = build_index(&path)?;
            let stats = IndexStats::collect(&index, &resolve_stats);
            if json {
                print_json(&stats);
            } else {
                print_summary(&stats);
            }
        }

        Commands::Entrypoints {
            path,
            files,
            folders,
            include_tests,
        } => {
            let (index, _, config) = build_index(&path)?;
            let scope = ScopeFilter { files, folders };
            let include_tests = include_tests || config.include_tests.unwrap_or(false);
            let deadline = QueryDeadline::after(QUERY_TIMEOUT);
            match list_entrypoints(&index, &scope, include_tests, &deadline) {
                Ok(entrypoints) => print_json(&EntrypointsResponse { entrypoints }),
                Err(err) => std::process::exit(print_query_error(&err)),
            }
        }

        Commands::Neighborhood {
            symbol_ref,
            path,
            depth,
        } => {
            let (index, _, _) = build_index(&path)?;
            let deadline = QueryDeadline::after(QUERY_TIMEOUT);
            match show_call_graph_neighborhood(&index, &symbol_ref, depth, &deadline) {
                Ok(neighborhood) => output::print_neighborhood(&neighborhood),
                Err(err) => std::process::exit(print_query_error(&err)),
            }
        }

        Commands::Definitions { path } => {
            let (index, _, _) = build_index(&path)?;
            print_json(&definition_rows(&index));
        }

        Commands::Stats { path } => {
            let (index, resolve_stats, _) = build_index(&path)?;
            print_json(&IndexStats::collect(&index, &resolve_stats));
        }

        Commands::Watch { path } => {
            let (index, resolve_stats, config) = build_index(&path)?;
            let root = index.root.clone();
            print_summary(&IndexStats::collect(&index, &resolve_stats));

            let (scheduler, _snapshots) = Scheduler::new(index);
            let (handle, events) = start_watcher(&root)?;
            let _handle = handle; // dropping it stops the watcher
            eprintln!("Watching for changes... (press Ctrl+C to stop)");
            scheduler.run(events, config.quiet_period()).await;
        }

        Commands::Serve {
            path,
            no_watch,
            include_tests,
        } => {
            let (index, _, config) = build_index(&path)?;
            let root = index.root.clone();
            let include_tests = include_tests || config.include_tests.unwrap_or(false);
            let (scheduler, snapshots) = Scheduler::new(index);

            if no_watch {
                // Index once and freeze; the initial snapshot serves forever.
                drop(scheduler);
                mcp::run(snapshots, include_tests).await?;
            } else {
                let (handle, events) = start_watcher(&root)?;
                let _handle = handle;
                let quiet = config.quiet_period();
                let indexer = tokio::spawn(scheduler.run(events, quiet));
                mcp::run(snapshots, include_tests).await?;
                indexer.abort();
            }
        }
    }

    Ok(())
}
