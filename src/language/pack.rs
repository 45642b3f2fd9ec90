use anyhow::{Context, Result};
use tree_sitter::{Language, Query};

/// The four query sources that make a language pluggable. Everything the
/// indexer knows about a grammar's surface syntax lives in these strings;
/// adding a language is an extension mapping, a grammar reference, and a
/// `PackSource`.
pub struct PackSource {
    pub scopes: &'static str,
    pub definitions: &'static str,
    pub references: &'static str,
    pub imports: &'static str,
}

/// A compiled query pack. Built lazily once per language and cached
/// process-wide; `tree_sitter::Query` is immutable and shareable.
pub struct QueryPack {
    pub scopes: Query,
    pub definitions: Query,
    pub references: Query,
    pub imports: Query,
}

impl QueryPack {
    pub fn compile(language: &Language, source: &PackSource) -> Result<QueryPack> {
        Ok(QueryPack {
            scopes: Query::new(language, source.scopes).context("compiling scopes query")?,
            definitions: Query::new(language, source.definitions)
                .context("compiling definitions query")?,
            references: Query::new(language, source.references)
                .context("compiling references query")?,
            imports: Query::new(language, source.imports).context("compiling imports query")?,
        })
    }
}
