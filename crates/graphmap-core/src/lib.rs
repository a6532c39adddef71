//! Graphmap Core - Object-graph transformation engine
//!
//! This crate maps arbitrary object graphs between parallel class
//! hierarchies (entities to DTOs and back) by resolving, at runtime, which
//! transformer handles each `(source type, target type)` pair.
//!
//! # Main Components
//!
//! - **Values**: Dynamically typed values with reference identity for objects and collections
//! - **Types**: Type expressions (`?int`, `list<BookDto>`, `Collection<int, Tag>`) and their parser
//! - **Reflection**: Class descriptors supplied by a [`ClassProvider`](reflection::ClassProvider)
//! - **Metadata**: Cached per-class facts and per class-pair mapping plans
//! - **Transformers**: The dispatch chain of null, scalar, object, collection and copy transformers
//! - **Mapper**: The façade that ties everything together, see [`Mapper`]
//!
//! # Example
//!
//! ```
//! use graphmap_core::{ClassBuilder, ClassRegistry, Mapper, ObjectRef, Result, Value};
//! use std::sync::Arc;
//!
//! fn example() -> Result<()> {
//!     let classes = Arc::new(ClassRegistry::new());
//!     classes.define(ClassBuilder::new("Book").field("title", "string"))?;
//!     classes.define(ClassBuilder::new("BookDto").field("title", "string"))?;
//!
//!     let mapper = Mapper::builder().provider(classes).build()?;
//!     let book = ObjectRef::new("Book");
//!     book.set("title", "Dune")?;
//!
//!     let dtos = mapper.map_to(&Value::list([book]), "list<BookDto>")?;
//!     assert_eq!(dtos.as_array().map(|a| a.len()), Some(1));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod mapper;
pub mod metadata;
pub mod preset;
pub mod processor;
pub mod reflection;
pub mod trace;
pub mod transformer;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, ErrorKind, Result};
pub use value::{Array, ArrayKey, CollectionRef, ObjectRef, Value};
pub use types::{display_types, ScalarKind, Type, TypeMapping};
pub use context::Context;
pub use config::{MapperConfig, MapperOptions, WarmUpPair};
pub use mapper::{MapTarget, Mapper, MapperBuilder};
pub use reflection::{
    ClassBuilder, ClassDescriptor, ClassProvider, ClassRegistry, ConstructorParam, MapDirective,
    PropertyDescriptor,
};
pub use metadata::{ObjectToObjectMetadata, PropertyMapping};
pub use preset::PresetMapping;
pub use trace::{TraceCollector, TraceOperation};
pub use transformer::{FnTransformer, MainTransformer, TransformOutcome, TransformRequest, Transformer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
