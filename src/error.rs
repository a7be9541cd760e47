//! Error handling for deterministic identity generation
//!
//! This module provides idiomatic Rust error types using thiserror. Only
//! configuration problems and values that cannot be canonicalized are errors;
//! incomplete identity data is resolved by falling back to a random identifier.

use thiserror::Error;

/// Main error type for identifier generation and parsing
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Malformed value for property '{property}': {reason}")]
    MalformedPropertyValue { property: String, reason: String },

    #[error("Object type '{object_type}' has no registered identity properties")]
    UnknownObjectType { object_type: String },

    #[error("Object type '{object_type}' is missing identity properties: {}", missing.join(", "))]
    MissingIdentityProperties {
        object_type: String,
        missing: Vec<String>,
    },

    #[error("Invalid property bag: {0}")]
    InvalidPropertyBag(String),

    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl IdentityError {
    pub(crate) fn malformed(property: &str, reason: impl Into<String>) -> Self {
        IdentityError::MalformedPropertyValue {
            property: property.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading or validating the identity registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Object type name must not be empty")]
    EmptyObjectType,

    #[error("Object type '{object_type}' declares no identity properties")]
    EmptyIdentitySpec { object_type: String },

    #[error("Object type '{object_type}' declares a blank identity property name")]
    BlankPropertyName { object_type: String },

    #[error("Object type '{object_type}' declares identity property '{property}' with a reserved character")]
    ReservedCharacter {
        object_type: String,
        property: String,
    },

    #[error("Object type '{object_type}' declares identity property '{property}' more than once")]
    DuplicateProperty {
        object_type: String,
        property: String,
    },
}

/// Result alias for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;
