//! Mapping metadata
//!
//! Everything the object processor needs to know about a `(source class,
//! target class)` pair is computed once here and cached for the life of the
//! process: which source property feeds which target property, how each side
//! is read and written, which properties go through the constructor, and
//! which can be deferred behind a lazy proxy.

pub mod class;
pub mod object;
pub mod pairing;
pub mod path;
pub mod property;
pub mod value_object;

#[cfg(test)]
mod tests;

pub use class::{ClassMetadata, ClassMetadataFactory};
pub use object::{ObjectToObjectMetadata, ObjectToObjectMetadataFactory};
pub use pairing::{pair_properties, Pairing};
pub use path::{PathSegment, PropertyPath};
pub use property::{PropertyMapping, ReadMode, WriteMode};
pub use value_object::is_value_object;
