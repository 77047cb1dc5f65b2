use thiserror::Error;

/// Errors that can occur in cqa-kge.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Entity name not found in the index.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),
    /// Relation name not found in the index.
    #[error("Relation not found: {0}")]
    RelationNotFound(String),
    /// Entity id outside `0..num_entities`.
    #[error("Entity id {id} out of range (num_entities = {len})")]
    EntityIdOutOfRange { id: usize, len: usize },
    /// Relation id outside `0..num_relations`.
    #[error("Relation id {id} out of range (num_relations = {len})")]
    RelationIdOutOfRange { id: usize, len: usize },
    /// A score left the unit interval (or was NaN) where a probability was required.
    #[error("Numeric error: {0}")]
    Numeric(String),
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Whether this error comes from resolving an unknown entity or relation.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::EntityNotFound(_)
                | Self::RelationNotFound(_)
                | Self::EntityIdOutOfRange { .. }
                | Self::RelationIdOutOfRange { .. }
        )
    }
}

/// Result type alias for cqa-kge.
pub type Result<T> = std::result::Result<T, Error>;
