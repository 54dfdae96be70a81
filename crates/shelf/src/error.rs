use thiserror::Error;

/// Errors raised while building, editing or encoding a replica.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("cannot descend into value at {0}")]
    NotAMap(String),

    /// Shelves only nest through maps; arrays hold plain values.
    #[error("objects inside arrays are not supported")]
    ObjectInArray,

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ShelfError>;
