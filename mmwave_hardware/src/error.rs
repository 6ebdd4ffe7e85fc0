use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("frame read timeout")]
    Timeout,
    #[error("radar disconnected")]
    Disconnected,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("encode limits: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, HwError>;
