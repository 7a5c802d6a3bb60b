use thiserror::Error;

/// Errors from the retrieval store
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("no relevant context found")]
    NoMatch,

    #[error("network error: {0}")]
    Network(String),

    #[error("retrieval api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("config error: {0}")]
    Config(String),
}
