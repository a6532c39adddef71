//! Error types for the Graphmap core library
//!
//! This module defines the error taxonomy of the mapping engine, using
//! thiserror for the typed variants and anyhow for errors raised by
//! user-supplied accessor and constructor hooks.

use std::fmt;
use thiserror::Error;

/// Main error type for mapping operations
///
/// Every variant raised while a graph is being mapped carries the property
/// path (e.g. `orders[3].customer.address`) at which it happened. A path of
/// `""` denotes the root value.
#[derive(Error, Debug)]
pub enum Error {
    /// No registered transformer accepted the value
    #[error("Cannot find a transformer to map {source_type} to {target_type} at '{path}'")]
    CannotFindTransformer {
        source_type: String,
        target_type: String,
        path: String,
    },

    /// A runtime value violates a declared type contract
    #[error("Invalid argument at '{path}': {message}")]
    InvalidArgument { message: String, path: String },

    /// An object's materialization depends on itself before any reference exists
    #[error("Circular reference detected while mapping {source_type} to {target_type} at '{path}'")]
    CircularReference {
        source_type: String,
        target_type: String,
        path: String,
    },

    /// The target class cannot be instantiated (abstract, interface, unknown)
    #[error("Class '{class}' is not instantiable at '{path}'")]
    ClassNotInstantiable { class: String, path: String },

    /// A collection target lacks element type metadata
    #[error("Missing element type information for target {target_type} at '{path}'")]
    MissingElementTypeInformation { target_type: String, path: String },

    /// The constructor call failed or mandatory arguments were unset
    #[error("Cannot instantiate '{class}' at '{path}': {message}")]
    InstantiationFailure {
        class: String,
        message: String,
        /// Source properties responsible for unset mandatory arguments
        unset_source_properties: Vec<String>,
        path: String,
    },

    /// A target property has no write accessor
    ///
    /// Raised only internally; the object processor logs and skips it.
    #[error("Property '{property}' of class '{class}' is not writable at '{path}'")]
    PropertyUnwritable {
        class: String,
        property: String,
        path: String,
    },

    /// A nested property path could not be resolved while building metadata
    #[error("Invalid property path '{property_path}' on class '{class}': {message}")]
    InvalidPropertyPath {
        class: String,
        property_path: String,
        message: String,
    },

    /// The class provider does not know the class
    #[error("Unknown class '{class}'")]
    UnknownClass { class: String },

    /// An accessor hook (getter, setter, adder, remover) failed
    #[error("Property access failed for '{property}' at '{path}': {message}")]
    PropertyAccess {
        property: String,
        message: String,
        path: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A type expression could not be parsed
    #[error("Type syntax error at position {position} in '{input}': {message}")]
    TypeSyntax {
        message: String,
        position: usize,
        input: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of errors, used by the trace collector and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CannotFindTransformer,
    InvalidArgument,
    CircularReference,
    ClassNotInstantiable,
    MissingElementTypeInformation,
    InstantiationFailure,
    PropertyUnwritable,
    InvalidPropertyPath,
    UnknownClass,
    PropertyAccess,
    TypeSyntax,
    Configuration,
    Io,
    Internal,
}

impl Error {
    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>, path: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create a PropertyAccess error from a failed hook
    pub fn property_access(
        property: impl Into<String>,
        path: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Error::PropertyAccess {
            property: property.into(),
            message: source.to_string(),
            path: path.into(),
            source: Some(source),
        }
    }

    /// Create a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CannotFindTransformer { .. } => ErrorKind::CannotFindTransformer,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::CircularReference { .. } => ErrorKind::CircularReference,
            Error::ClassNotInstantiable { .. } => ErrorKind::ClassNotInstantiable,
            Error::MissingElementTypeInformation { .. } => ErrorKind::MissingElementTypeInformation,
            Error::InstantiationFailure { .. } => ErrorKind::InstantiationFailure,
            Error::PropertyUnwritable { .. } => ErrorKind::PropertyUnwritable,
            Error::InvalidPropertyPath { .. } => ErrorKind::InvalidPropertyPath,
            Error::UnknownClass { .. } => ErrorKind::UnknownClass,
            Error::PropertyAccess { .. } => ErrorKind::PropertyAccess,
            Error::TypeSyntax { .. } => ErrorKind::TypeSyntax,
            Error::Configuration { .. } | Error::Json { .. } | Error::Yaml { .. } => {
                ErrorKind::Configuration
            }
            Error::Io { .. } => ErrorKind::Io,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// The property path carried by mapping-time errors
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::CannotFindTransformer { path, .. }
            | Error::InvalidArgument { path, .. }
            | Error::CircularReference { path, .. }
            | Error::ClassNotInstantiable { path, .. }
            | Error::MissingElementTypeInformation { path, .. }
            | Error::InstantiationFailure { path, .. }
            | Error::PropertyUnwritable { path, .. }
            | Error::PropertyAccess { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
