use thiserror::Error;

/// Main error type for Docweaver operations
#[derive(Error, Debug)]
pub enum DocweaverError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Regex(#[from] regex::Error),

    /// The caller supplied nothing usable; the pipeline was not entered.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Generation service error: {0}")]
    Generation(String),

    #[error("No usable output: all {attempted} chunk generation calls failed")]
    NoUsableOutput { attempted: usize },

    #[error("No previous documentation found for {session}; generate documentation first")]
    MissingPriorDocument { session: String },

    #[error("Session store error: {0}")]
    Session(String),
}

impl DocweaverError {
    /// True for errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocweaverError::InvalidInput(_) | DocweaverError::MissingPriorDocument { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DocweaverError>;
