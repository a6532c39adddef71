//! Value-object (unalterable class) classification
//!
//! Instances of a value object are never mutated field by field during a
//! mapping; they are reused or replaced wholesale.

use super::property::{find_adder_remover, find_setter};
use crate::reflection::{ClassDescriptor, Visibility};
use crate::types::{builtin, TypeResolver};

/// Decide whether instances of `descriptor` are value objects
///
/// Precedence: immutable dates are always value objects; array-access
/// implementations never are; then an explicit override; then open
/// (dynamic-property) classes and classes with any writable property are
/// not value objects; everything else is.
pub fn is_value_object(descriptor: &ClassDescriptor, resolver: &TypeResolver) -> bool {
    if descriptor.immutable_date {
        return true;
    }
    if resolver.is_subclass_of(&descriptor.name, builtin::ARRAY_ACCESS) {
        return false;
    }
    if let Some(value_object) = descriptor.value_object {
        return value_object;
    }
    if descriptor.allow_dynamic_properties {
        return false;
    }
    !has_writable_property(descriptor)
}

fn has_writable_property(descriptor: &ClassDescriptor) -> bool {
    descriptor.properties.iter().any(|property| {
        let public_field = property.visibility == Visibility::Public
            && !property.readonly
            && !descriptor.readonly;
        public_field
            || find_setter(descriptor, &property.name).is_some()
            || find_adder_remover(descriptor, &property.name).is_some()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{ClassBuilder, ClassProvider, ClassRegistry};
    use std::sync::Arc;

    fn classify(builder: ClassBuilder) -> bool {
        let registry = Arc::new(ClassRegistry::new());
        let descriptor = builder.build().unwrap();
        let name = descriptor.name.clone();
        registry.register(descriptor).unwrap();
        let resolver = TypeResolver::new(registry.clone());
        is_value_object(&registry.describe(&name).unwrap(), &resolver)
    }

    #[test]
    fn test_immutable_date_is_value_object() {
        let registry = Arc::new(ClassRegistry::new());
        let resolver = TypeResolver::new(registry.clone());
        let date = registry.describe("DateTimeImmutable").unwrap();
        assert!(is_value_object(&date, &resolver));
    }

    #[test]
    fn test_readonly_properties_only() {
        assert!(classify(
            ClassBuilder::new("Money")
                .field_with("amount", "int", |p| p.readonly())
                .param("amount", "int")
        ));
    }

    #[test]
    fn test_any_writable_property_disqualifies() {
        assert!(!classify(ClassBuilder::new("Dto").field("name", "string")));
        assert!(!classify(ClassBuilder::new("Entity").encapsulated("name", "string")));
    }

    #[test]
    fn test_dynamic_and_array_access_classes() {
        assert!(!classify(ClassBuilder::new("Bag").dynamic_properties()));
        assert!(!classify(
            ClassBuilder::new("Map").implements("ArrayAccess").value_object(true)
        ));
    }

    #[test]
    fn test_override() {
        assert!(classify(ClassBuilder::new("Frozen").field("x", "int").value_object(true)));
        assert!(!classify(ClassBuilder::new("Plain").value_object(false)));
    }
}
