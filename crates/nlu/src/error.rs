use thiserror::Error;

/// Any variant means "classification unavailable" to the caller; the split
/// only exists for logging. A single failed call is never retried here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("nlu request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("nlu service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected nlu payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
