//! Configuration errors raised while building a specification.
//!
//! Every variant is fatal at build time: a specification that fails to build
//! never reaches the runner.

use thiserror::Error;

/// Errors that can occur while building a specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    /// A check id does not follow the `namespace/segment/...` shape.
    #[error("invalid check id '{id}': {reason}")]
    InvalidCheckId { id: String, reason: String },

    /// The same check id was registered twice.
    #[error("check '{id}' is registered more than once")]
    DuplicateCheck { id: String },

    /// The same condition name was registered twice.
    #[error("condition '{name}' is registered more than once")]
    DuplicateCondition { name: String },

    /// A check requires a condition that is not registered.
    #[error("check '{check}' requires unknown condition '{condition}'")]
    UnknownCondition { check: String, condition: String },

    /// An import would overwrite an identifier the target already holds.
    #[error("import of '{id}' from specification '{source_spec}' collides with an existing identifier")]
    ImportCollision { id: String, source_spec: String },

    /// An import names an identifier the source does not define.
    #[error("specification '{source_spec}' has no check, condition or section named '{id}'")]
    ImportNotFound { id: String, source_spec: String },

    /// The resolved check set does not match the expected manifest.
    #[error("expected checks mismatch: unexpected [{}], missing [{}]", .extra.join(", "), .missing.join(", "))]
    ExpectedChecksMismatch {
        extra: Vec<String>,
        missing: Vec<String>,
    },
}

/// Result type for specification building.
pub type SpecResult<T> = Result<T, SpecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_message_names_id() {
        let err = SpecError::ImportCollision {
            id: "a.b/x".to_string(),
            source_spec: "S".to_string(),
        };
        assert!(err.to_string().contains("a.b/x"));
    }

    #[test]
    fn test_mismatch_message_lists_ids() {
        let err = SpecError::ExpectedChecksMismatch {
            extra: vec!["a/x".to_string(), "a/y".to_string()],
            missing: vec![],
        };
        let msg = err.to_string();
        assert!(msg.contains("unexpected [a/x, a/y]"));
        assert!(msg.contains("missing []"));
    }
}
