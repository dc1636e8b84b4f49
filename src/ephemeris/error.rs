use thiserror::Error;

#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("unknown body: {0}")]
    UnknownBody(String),
    #[error("TLE directory not found: {0}")]
    TleDirectoryNotFound(String),
    #[error("TLE read error: {0}")]
    TleRead(#[from] std::io::Error),
    #[error("invalid TLE in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("propagation error: {0}")]
    Propagation(String),
}
