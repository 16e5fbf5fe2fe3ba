//! Unified error type for the domain layer.

use thiserror::Error;

/// Errors that can arise from pure domain operations (placement math,
/// invariant checks, payload parsing). Infrastructure-layer faults (store,
/// bus, command channel) are modeled separately in the engine crate and
/// convert into these where an invariant is actually violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    #[error("malformed job payload: {0}")]
    MalformedPayload(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = DomainError::not_found("Group", "42");
        assert_eq!(err.to_string(), "Group not found: 42");
    }
}
