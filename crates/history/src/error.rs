use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("exchange store query failed: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
