use crate::semantic::{EmbeddingError, IndexError};

/// Per-request failures. None of these affect process state.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Caller sent nothing usable
    #[error("{0}")]
    Input(String),

    /// The upload could not be read
    #[error("File processing error: {0}")]
    Processing(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl AppError {
    pub fn no_file() -> Self {
        Self::Input("No file uploaded".to_string())
    }

    pub fn empty_file() -> Self {
        Self::Input("Uploaded file is empty".to_string())
    }

    /// True for errors caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Processing(_))
    }
}
