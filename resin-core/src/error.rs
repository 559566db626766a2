use thiserror::Error;

/// A layout value that is not a JSON array of blocks.
///
/// String-encoded layouts are parsed as JSON only; their content is never
/// evaluated.
#[derive(Debug, Error)]
#[error("malformed layout in field `{field}`: {source}")]
pub struct MalformedLayoutError {
    pub field: String,
    pub source: serde_json::Error,
}

/// A relation-link field whose value is missing or has no target `_id`.
#[derive(Debug, Error)]
#[error("relation field `{field}` has no target entry")]
pub struct MissingRelationTargetError {
    pub field: String,
}

/// Failure while turning one entry or singleton into nodes.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    MalformedLayout(#[from] MalformedLayoutError),

    #[error(transparent)]
    MissingRelationTarget(#[from] MissingRelationTargetError),

    #[error("entry has no string `_id`")]
    MissingEntryId,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("node sink rejected node `{id}`: {source}")]
    Sink {
        id: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
