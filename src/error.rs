use crate::model::SongKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    #[error("song already exists: {0}")]
    DuplicateKey(SongKey),

    #[error("song not found: {0}")]
    NotFound(SongKey),

    #[error("playlist is empty")]
    EmptyCollection,
}

pub type Result<T> = std::result::Result<T, PlaylistError>;
