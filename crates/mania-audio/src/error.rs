use thiserror::Error;

/// Failure to fetch or decode the song audio.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read audio: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported audio format: {0}")]
    Unsupported(String),

    #[error("audio decode error: {0}")]
    Decode(String),

    #[error("audio contains no samples")]
    Empty,
}
