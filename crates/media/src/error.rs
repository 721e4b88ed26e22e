use thiserror::Error;

/// A hard failure of the image service. An empty result set is *not* an
/// error — `find_image` returns `Ok(None)` for that.
#[derive(Debug, Error)]
pub enum Error {
    #[error("image search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("image service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected image search payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
