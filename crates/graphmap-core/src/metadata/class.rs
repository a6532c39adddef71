//! Per-class metadata
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::value_object::is_value_object;
use crate::reflection::ClassDescriptor;
use crate::types::TypeResolver;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Facts about a class derived from its descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    pub class: String,
    pub instantiable: bool,
    pub cloneable: bool,
    pub readonly: bool,
    pub value_object: bool,
    pub dynamic_properties_readable: bool,
    pub dynamic_properties_writable: bool,
    pub attributes: Vec<String>,
    /// Properties populated before lazy materialization
    pub eager_properties: Vec<String>,
    /// Instances may be returned as lazy proxies
    pub lazy_capable: bool,
    /// Traversable or array-accessible
    pub collection: bool,
    /// Freshness stamp of the descriptor this was built from
    pub modified: u64,
}

impl ClassMetadata {
    pub fn build(descriptor: &ClassDescriptor, resolver: &TypeResolver) -> Self {
        let value_object = is_value_object(descriptor, resolver);
        let collection = resolver.is_collection_class(&descriptor.name);
        let instantiable = descriptor.is_instantiable();

        Self {
            class: descriptor.name.clone(),
            instantiable,
            cloneable: descriptor.cloneable,
            readonly: descriptor.readonly,
            value_object,
            dynamic_properties_readable: descriptor.allow_dynamic_properties,
            dynamic_properties_writable: descriptor.allow_dynamic_properties && !descriptor.readonly,
            attributes: descriptor.attributes.clone(),
            eager_properties: descriptor
                .properties
                .iter()
                .filter(|p| p.eager)
                .map(|p| p.name.clone())
                .collect(),
            lazy_capable: instantiable && !descriptor.readonly && !value_object && !collection,
            collection,
            modified: descriptor.modified,
        }
    }

    pub fn is_eager(&self, property: &str) -> bool {
        self.eager_properties.iter().any(|p| p == property)
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }
}

/// Process-wide cache of [`ClassMetadata`]
///
/// Entries are rebuilt when the descriptor's `modified` stamp changes.
pub struct ClassMetadataFactory {
    resolver: TypeResolver,
    cache: RwLock<HashMap<String, Arc<ClassMetadata>>>,
}

impl ClassMetadataFactory {
    pub fn new(resolver: TypeResolver) -> Self {
        Self {
            resolver,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Metadata of `class`
    pub fn get(&self, class: &str) -> Result<Arc<ClassMetadata>> {
        let descriptor = self
            .resolver
            .provider()
            .describe(class)
            .ok_or_else(|| Error::UnknownClass {
                class: class.to_string(),
            })?;

        if let Some(cached) = self.cache.read().get(class) {
            if cached.modified == descriptor.modified {
                return Ok(cached.clone());
            }
        }

        let mut cache = self.cache.write();
        if let Some(cached) = cache.get(class) {
            if cached.modified == descriptor.modified {
                return Ok(cached.clone());
            }
        }

        log::debug!("Building class metadata for '{}'", class);
        let metadata = Arc::new(ClassMetadata::build(&descriptor, &self.resolver));
        cache.insert(class.to_string(), metadata.clone());
        Ok(metadata)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}
