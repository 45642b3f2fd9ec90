use serde::Serialize;
use thiserror::Error;

/// Error kinds surfaced to query callers.
///
/// Indexing errors never reach here — they are scoped to the file that
/// produced them (a parse failure downgrades that file to an empty graph).
/// These kinds cover the query surface only and serialise as
/// `{ "error": { "kind": ..., "message": ... } }`.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The caller asked about a file whose language the registry does not know.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The file has syntax errors; results for it are best-effort.
    #[error("file has parse errors, results are best-effort: {0}")]
    ParsePartial(String),

    /// A referenced name has no target after all resolution passes.
    #[error("unresolved symbol: {0}")]
    UnresolvedSymbol(String),

    /// A name-only symbol ref matched multiple definitions with no tie-breaker.
    #[error("ambiguous symbol '{name}': candidates in {candidates:?}")]
    AmbiguousSymbol { name: String, candidates: Vec<String> },

    /// The requested file or symbol does not exist in the index.
    #[error("not found: {0}")]
    NotFound(String),

    /// The query exceeded its deadline.
    #[error("query exceeded its deadline")]
    Timeout,

    /// A bug. The batch that produced it is rolled back and the error logged.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Stable kebab-case kind tag used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::UnsupportedLanguage(_) => "unsupported-language",
            QueryError::ParsePartial(_) => "parse-partial",
            QueryError::UnresolvedSymbol(_) => "unresolved-symbol",
            QueryError::AmbiguousSymbol { .. } => "ambiguous-symbol",
            QueryError::NotFound(_) => "not-found",
            QueryError::Timeout => "timeout",
            QueryError::Internal(_) => "internal",
        }
    }
}

/// Wire shape for errors: `{ "error": { "kind": ..., "message": ... } }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl From<&QueryError> for ErrorBody {
    fn from(err: &QueryError) -> Self {
        ErrorBody {
            error: ErrorDetail {
                kind: err.kind().to_owned(),
                message: err.to_string(),
            },
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
