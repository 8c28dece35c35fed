use thiserror::Error;

/// Errors returned by ComfyUI job operations.
#[derive(Error, Debug)]
pub enum ComfyError {
    /// A template setter rejected its value. The template is unchanged.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// ComfyUI returned a non-success HTTP status.
    #[error("ComfyUI returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The prompt id was not present in the history mapping.
    #[error("Prompt not found: {0}")]
    NotFound(String),

    /// A template or history document did not have the expected shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The response from ComfyUI could not be used.
    #[error("{0}")]
    InvalidResponse(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ComfyError>;
