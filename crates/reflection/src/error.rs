//! Error types for association reflection
//!
//! Every failure is surfaced to the caller of the accessor that triggered
//! it. An absent or ambiguous reciprocal is not an error.

use thiserror::Error;

use crate::config::ConfigError;
use crate::relationships::RelationshipType;

/// Result type alias for reflection operations
pub type ReflectionResult<T> = Result<T, ReflectionError>;

/// Error types for declaring and resolving relationships
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectionError {
    /// The associated model name does not resolve to a registered model
    #[error("Unresolved class: no model named '{name}' is registered")]
    UnresolvedClass { name: String },

    /// A many-to-one relationship needs a primary key the model does not declare
    #[error("Model '{model}' declares no primary key and no :primary_key option was given")]
    NoPrimaryKey { model: String },

    /// Lookup of a relationship by name failed
    #[error("Unknown relationship '{name}' on model '{model}'")]
    UnknownRelationship { model: String, name: String },

    /// The field is not defined for this kind of relationship
    #[error("Relationship '{relationship}' ({kind}) has no {field}")]
    NotApplicable {
        relationship: String,
        kind: RelationshipType,
        field: &'static str,
    },

    /// The declaration options are inconsistent
    #[error("Invalid declaration of '{model}.{name}': {reason}")]
    InvalidDeclaration {
        model: String,
        name: String,
        reason: String,
    },

    /// Configuration could not be loaded or validated
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ReflectionError {
    pub fn unresolved_class(name: impl Into<String>) -> Self {
        Self::UnresolvedClass { name: name.into() }
    }

    pub fn unknown_relationship(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownRelationship {
            model: model.into(),
            name: name.into(),
        }
    }

    pub(crate) fn invalid_declaration(
        model: &str,
        name: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDeclaration {
            model: model.to_string(),
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ReflectionError::unresolved_class("ParParent");
        assert_eq!(
            err.to_string(),
            "Unresolved class: no model named 'ParParent' is registered"
        );

        let err = ReflectionError::unknown_relationship("Artist", "albums");
        assert_eq!(err.to_string(), "Unknown relationship 'albums' on model 'Artist'");

        let err = ReflectionError::NotApplicable {
            relationship: "albums".to_string(),
            kind: RelationshipType::OneToMany,
            field: "primary key",
        };
        assert_eq!(err.to_string(), "Relationship 'albums' (one_to_many) has no primary key");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ReflectionError = ConfigError::ParseError {
            message: "bad yaml".to_string(),
        }
        .into();
        assert!(matches!(err, ReflectionError::Config(_)));
        assert_eq!(err.to_string(), "Configuration parsing error: bad yaml");
    }
}
