//! Error taxonomy for trip and listing operations.

use std::io;

use thiserror::Error;

use crate::models::TripId;

/// Failure raised by a store or manager operation.
///
/// Every variant leaves the in-memory state untouched: operations either
/// commit fully or not at all.
#[derive(Debug, Error)]
pub enum StaysError {
    /// User input was empty or otherwise unusable.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A trip with the same name already exists.
    #[error("a trip named {0:?} already exists")]
    DuplicateTrip(String),

    /// The trip is designated as protected and cannot be deleted.
    #[error("trip {0} is protected and cannot be deleted")]
    ProtectedTrip(TripId),

    /// No trip with the given id exists.
    #[error("trip {0} not found")]
    NotFound(TripId),

    /// A listing operation was attempted with no trip selected.
    #[error("no active trip")]
    NoActiveTrip,

    /// Every identifier up to the storable maximum is in use.
    #[error("no identifiers left to assign")]
    IdsExhausted,

    /// State could not be encoded for storage.
    #[error("failed to serialize trips: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage backend rejected a read or write.
    #[error("storage error on key {key:?}: {source}")]
    Storage {
        /// Logical key being accessed.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl StaysError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn storage(key: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            key: key.into(),
            source,
        }
    }

    /// Whether the caller can recover by correcting input or picking another action.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::IdsExhausted | Self::Serialization(_) | Self::Storage { .. }
        )
    }

    /// Short message suitable for showing to the person using the app.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(reason) => format!("Please correct your input ({reason})."),
            Self::DuplicateTrip(name) => format!("Trip \"{name}\" already exists!"),
            Self::ProtectedTrip(_) => "This trip cannot be deleted.".to_string(),
            Self::NotFound(_) => "That trip no longer exists.".to_string(),
            Self::NoActiveTrip => "Please create a trip first.".to_string(),
            Self::IdsExhausted | Self::Serialization(_) | Self::Storage { .. } => {
                "Your changes could not be saved.".to_string()
            }
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StaysError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_are_not_recoverable() {
        let err = StaysError::storage("trips", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("\"trips\""));

        assert!(!StaysError::IdsExhausted.is_recoverable());
        assert!(StaysError::NoActiveTrip.is_recoverable());
        assert!(StaysError::validation("empty name").is_recoverable());
    }

    #[test]
    fn user_messages_prompt_for_next_step() {
        assert!(StaysError::NoActiveTrip
            .user_message()
            .contains("create a trip first"));
        assert_eq!(
            StaysError::DuplicateTrip("Paris".to_string()).user_message(),
            "Trip \"Paris\" already exists!"
        );
    }
}
