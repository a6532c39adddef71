//! In-memory class provider
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::builder::ClassBuilder;
use super::descriptor::ClassDescriptor;
use super::ClassProvider;
use crate::types::{builtin, OBJECT};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Registry of class descriptors
///
/// Registering a class whose parent is already known copies the parent's
/// properties, methods and constructor into it unless the child redeclares
/// them. Every registration receives a fresh `modified` stamp unless the
/// descriptor carries one, so re-registering a class invalidates metadata
/// derived from the previous version.
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Arc<ClassDescriptor>>>,
    revision: AtomicU64,
}

impl ClassRegistry {
    /// Create a registry holding the built-in classes
    pub fn new() -> Self {
        let registry = Self::empty();
        for descriptor in builtin_classes() {
            registry.insert(descriptor);
        }
        registry
    }

    /// Create a registry without built-in classes
    pub fn empty() -> Self {
        Self {
            classes: RwLock::new(HashMap::new()),
            revision: AtomicU64::new(0),
        }
    }

    /// Register a class
    pub fn register(&self, mut descriptor: ClassDescriptor) -> Result<()> {
        if let Some(parent_name) = descriptor.parent.clone() {
            let parent = self
                .describe(&parent_name)
                .ok_or_else(|| Error::UnknownClass {
                    class: parent_name.clone(),
                })?;
            inherit(&mut descriptor, &parent);
        }
        for interface in &descriptor.interfaces {
            if !self.contains(interface) {
                return Err(Error::UnknownClass {
                    class: interface.clone(),
                });
            }
        }

        log::debug!("Registering class '{}'", descriptor.name);
        self.insert(descriptor);
        Ok(())
    }

    /// Build and register a class in one step
    pub fn define(&self, builder: ClassBuilder) -> Result<()> {
        self.register(builder.build()?)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.read().contains_key(class)
    }

    /// Names of all registered classes, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn insert(&self, mut descriptor: ClassDescriptor) {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        if descriptor.modified == 0 {
            descriptor.modified = revision;
        }
        self.classes
            .write()
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassProvider for ClassRegistry {
    fn describe(&self, class: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.read().get(class).cloned()
    }
}

fn inherit(child: &mut ClassDescriptor, parent: &ClassDescriptor) {
    let own_properties = std::mem::take(&mut child.properties);
    let mut properties: Vec<_> = parent
        .properties
        .iter()
        .filter(|p| !own_properties.iter().any(|own| own.name == p.name))
        .cloned()
        .collect();
    properties.extend(own_properties);
    child.properties = properties;

    for method in &parent.methods {
        if child.method(&method.name).is_none() {
            child.methods.push(method.clone());
        }
    }

    if child.constructor.is_none() {
        child.constructor = parent.constructor.clone();
    }
    if !child.allow_dynamic_properties {
        child.allow_dynamic_properties = parent.allow_dynamic_properties;
    }
    if parent.immutable_date {
        child.immutable_date = true;
    }
}

fn builtin_classes() -> Vec<ClassDescriptor> {
    let interface = |name: &str, parents: &[&str]| {
        let mut descriptor = ClassDescriptor::new(name);
        descriptor.is_interface = true;
        descriptor.interfaces = parents.iter().map(|p| p.to_string()).collect();
        descriptor
    };

    let mut object = ClassDescriptor::new(OBJECT);
    object.is_abstract = true;

    let collection_class = |name: &str| {
        let mut descriptor = ClassDescriptor::new(name);
        descriptor.interfaces = vec![builtin::COLLECTION.to_string()];
        descriptor.value_object = Some(false);
        descriptor
    };

    let mut date = ClassDescriptor::new(builtin::DATE_TIME_IMMUTABLE);
    date.interfaces = vec![builtin::DATE_TIME_INTERFACE.to_string()];
    date.immutable_date = true;

    vec![
        object,
        interface(builtin::TRAVERSABLE, &[]),
        interface(builtin::COUNTABLE, &[]),
        interface(builtin::ARRAY_ACCESS, &[]),
        interface(
            builtin::COLLECTION,
            &[builtin::TRAVERSABLE, builtin::COUNTABLE, builtin::ARRAY_ACCESS],
        ),
        collection_class(builtin::ARRAY_COLLECTION),
        collection_class(builtin::LAZY_ARRAY),
        interface(builtin::DATE_TIME_INTERFACE, &[]),
        date,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = ClassRegistry::new();
        for name in ["object", "Traversable", "Collection", "ArrayCollection", "DateTimeImmutable"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(registry.describe("Collection").unwrap().is_interface);
    }

    #[test]
    fn test_child_inherits_parent_members() {
        let registry = ClassRegistry::new();
        registry
            .define(
                ClassBuilder::new("Animal")
                    .abstract_class()
                    .field("name", "string")
                    .encapsulated("legs", "int"),
            )
            .unwrap();
        registry
            .define(ClassBuilder::new("Dog").extends("Animal").field("legs", "?int"))
            .unwrap();

        let dog = registry.describe("Dog").unwrap();
        assert!(!dog.is_abstract);
        assert!(dog.property("name").is_some());
        assert!(dog.property("legs").unwrap().is_nullable());
        assert!(dog.method("setLegs").is_some());

        let names: Vec<&str> = dog.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "legs"]);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let registry = ClassRegistry::new();
        let result = registry.define(ClassBuilder::new("Orphan").extends("Missing"));
        assert!(matches!(result, Err(Error::UnknownClass { .. })));
    }

    #[test]
    fn test_reregistration_bumps_stamp() {
        let registry = ClassRegistry::new();
        registry.define(ClassBuilder::new("Book")).unwrap();
        let first = registry.describe("Book").unwrap().modified;
        registry.define(ClassBuilder::new("Book")).unwrap();
        assert!(registry.describe("Book").unwrap().modified > first);
    }
}
