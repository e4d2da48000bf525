use thiserror::Error;

#[derive(Error, Debug)]
pub enum DelveError {
    #[error("Chain read error: {0}")]
    ChainRead(String),

    #[error("Submission error: {0}")]
    Submission(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Game over: {0}")]
    GameOver(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DelveError>;
