// Errors raised while talking to the device-management backend
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The backend rejected the bearer token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timed out")]
    Timeout,

    /// The backend refused the request, e.g. a duplicate email
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

impl RepositoryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        RepositoryError::NotFound(what.into())
    }

    pub fn decode(msg: impl std::fmt::Display) -> Self {
        RepositoryError::Decode(msg.to_string())
    }
}
