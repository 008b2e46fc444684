use thiserror::Error;

/// Errors surfaced by the collaborators around the typing engine.
///
/// The engine itself never fails; these only travel as far as the boundary
/// that decides whether to log and swallow them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("text corpus is empty: {0}")]
    EmptyCorpus(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
