//! Class introspection collaborator
//!
//! The engine never inspects values to learn about classes. Instead a
//! [`ClassProvider`] hands out plain [`ClassDescriptor`]s, and the metadata
//! factories derive everything else from them.

pub mod builder;
pub mod descriptor;
pub mod inflector;
pub mod registry;

pub use builder::ClassBuilder;
pub use descriptor::{
    ClassDescriptor, ConstructorDescriptor, ConstructorFn, ConstructorParam, MapDirective,
    MethodDescriptor, MethodFn, PropertyDescriptor, PropertyMapperFn, Visibility,
};
pub use registry::ClassRegistry;

use std::sync::Arc;

/// Source of class descriptors
pub trait ClassProvider: Send + Sync {
    /// Describe `class`, or `None` when it is unknown
    fn describe(&self, class: &str) -> Option<Arc<ClassDescriptor>>;
}

impl<P: ClassProvider + ?Sized> ClassProvider for Arc<P> {
    fn describe(&self, class: &str) -> Option<Arc<ClassDescriptor>> {
        (**self).describe(class)
    }
}
