//! Canonical type model
//!
//! Types describe both what a transformer declares it can handle and what a
//! target property expects. Collection key and value types are themselves
//! lists of types: an empty list means the element type is unknown, more than
//! one entry is a union.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

pub mod parser;
pub mod resolver;

pub use parser::TypeParser;
pub use resolver::TypeResolver;

use crate::{Error, Result};
use std::fmt;

/// Universal supertype of every class
pub const OBJECT: &str = "object";

/// Class names known to the engine without registration
pub mod builtin {
    pub const TRAVERSABLE: &str = "Traversable";
    pub const COUNTABLE: &str = "Countable";
    pub const ARRAY_ACCESS: &str = "ArrayAccess";
    pub const COLLECTION: &str = "Collection";
    pub const ARRAY_COLLECTION: &str = "ArrayCollection";
    pub const LAZY_ARRAY: &str = "LazyArray";
    pub const DATE_TIME_INTERFACE: &str = "DateTimeInterface";
    pub const DATE_TIME_IMMUTABLE: &str = "DateTimeImmutable";
}

/// Scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Float,
    String,
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Int => write!(f, "int"),
            ScalarKind::Float => write!(f, "float"),
            ScalarKind::String => write!(f, "string"),
            ScalarKind::Bool => write!(f, "bool"),
        }
    }
}

/// A type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Mixed,
    Scalar(ScalarKind),
    Array { key: Vec<Type>, value: Vec<Type> },
    Object { class: String, key: Vec<Type>, value: Vec<Type> },
}

impl Type {
    pub fn int() -> Self {
        Type::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        Type::Scalar(ScalarKind::Float)
    }

    pub fn string() -> Self {
        Type::Scalar(ScalarKind::String)
    }

    pub fn bool() -> Self {
        Type::Scalar(ScalarKind::Bool)
    }

    /// Array with unknown key and value types
    pub fn array() -> Self {
        Type::Array {
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    pub fn array_of(key: Type, value: Type) -> Self {
        Type::Array {
            key: vec![key],
            value: vec![value],
        }
    }

    /// `array<int, value>`
    pub fn list_of(value: Type) -> Self {
        Type::array_of(Type::int(), value)
    }

    pub fn object(class: impl Into<String>) -> Self {
        Type::Object {
            class: class.into(),
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    /// The universal `object` type
    pub fn any_object() -> Self {
        Type::object(OBJECT)
    }

    /// A generic object type such as `Collection<int, Book>`
    pub fn object_of(class: impl Into<String>, key: Type, value: Type) -> Self {
        Type::Object {
            class: class.into(),
            key: vec![key],
            value: vec![value],
        }
    }

    /// Parse a type expression into a (union) list of types
    pub fn parse(input: &str) -> Result<Vec<Type>> {
        TypeParser::new(input)?.parse()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Type::Null)
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, Type::Mixed)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Type::Object { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Type::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<&str> {
        match self {
            Type::Object { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn key_types(&self) -> &[Type] {
        match self {
            Type::Array { key, .. } | Type::Object { key, .. } => key,
            _ => &[],
        }
    }

    pub fn value_types(&self) -> &[Type] {
        match self {
            Type::Array { value, .. } | Type::Object { value, .. } => value,
            _ => &[],
        }
    }

    /// The same type without generic parameters
    pub fn simple(&self) -> Type {
        match self {
            Type::Array { .. } => Type::array(),
            Type::Object { class, .. } => Type::object(class.clone()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, key, value) = match self {
            Type::Null => return write!(f, "null"),
            Type::Mixed => return write!(f, "mixed"),
            Type::Scalar(kind) => return write!(f, "{}", kind),
            Type::Array { key, value } => ("array", key, value),
            Type::Object { class, key, value } => (class.as_str(), key, value),
        };

        write!(f, "{}", name)?;
        match (key.is_empty(), value.is_empty()) {
            (true, true) => Ok(()),
            (true, false) => write!(f, "<{}>", display_types(value)),
            (false, _) => write!(
                f,
                "<{}, {}>",
                display_types(key),
                if value.is_empty() {
                    "mixed".to_string()
                } else {
                    display_types(value)
                }
            ),
        }
    }
}

/// Render a union of types as `A|B`
pub fn display_types(types: &[Type]) -> String {
    if types.is_empty() {
        return "mixed".to_string();
    }
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

/// A (source, target) pair a transformer declares it can convert
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeMapping {
    pub source: Type,
    pub target: Type,
    /// The transformer may yield a subtype of `target`, chosen at runtime
    pub variant: bool,
}

impl TypeMapping {
    pub fn new(source: Type, target: Type) -> Self {
        Self {
            source,
            target,
            variant: false,
        }
    }

    /// A variant mapping; the target must be a concrete object type
    pub fn variant(source: Type, target: Type) -> Result<Self> {
        if !target.is_object() {
            return Err(Error::invalid_argument(
                format!("variant target type must be an object type, got {}", target),
                "",
            ));
        }
        Ok(Self {
            source,
            target,
            variant: true,
        })
    }
}

impl fmt::Display for TypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)?;
        if self.variant {
            write!(f, " (variant)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Type::int().to_string(), "int");
        assert_eq!(Type::array().to_string(), "array");
        assert_eq!(Type::list_of(Type::object("App\\Book")).to_string(), "array<int, App\\Book>");
        assert_eq!(
            Type::Object {
                class: "Collection".into(),
                key: vec![],
                value: vec![Type::string(), Type::Null],
            }
            .to_string(),
            "Collection<string|null>"
        );
    }

    #[test]
    fn test_simple_strips_generics() {
        let t = Type::object_of("Collection", Type::int(), Type::object("Book"));
        assert_eq!(t.simple(), Type::object("Collection"));
        assert_eq!(t.value_types(), &[Type::object("Book")]);
    }

    #[test]
    fn test_variant_requires_object_target() {
        assert!(TypeMapping::variant(Type::any_object(), Type::object("Animal")).is_ok());
        assert!(TypeMapping::variant(Type::any_object(), Type::Mixed).is_err());
        assert!(TypeMapping::variant(Type::int(), Type::string()).is_err());
    }
}
