use thiserror::Error;

/// Errors from the generation backend
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("generation api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("backend returned no completion")]
    EmptyCompletion,

    #[error("config error: {0}")]
    Config(String),
}
