//! Object-to-object mapping plans
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::class::{ClassMetadata, ClassMetadataFactory};
use super::pairing::pair_properties;
use super::path::PropertyPath;
use super::property::{
    is_nullable, lone_scalar, read_mode, write_mode, PropertyMapping, ReadMode, WriteMode,
};
use crate::reflection::{ClassDescriptor, ConstructorParam, Visibility};
use crate::types::{Type, TypeResolver};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Complete plan for mapping instances of one class onto another
#[derive(Debug, Clone)]
pub struct ObjectToObjectMetadata {
    pub source: Arc<ClassMetadata>,
    pub target: Arc<ClassMetadata>,
    /// All property mappings in target declaration order
    pub properties: Vec<PropertyMapping>,
    /// Constructor parameters of the target, in call order
    pub constructor_params: Vec<ConstructorParam>,
    constructor: Vec<usize>,
    eager: Vec<usize>,
    lazy: Vec<usize>,
}

impl ObjectToObjectMetadata {
    pub fn source_class(&self) -> &str {
        &self.source.class
    }

    pub fn target_class(&self) -> &str {
        &self.target.class
    }

    pub fn property(&self, target_property: &str) -> Option<&PropertyMapping> {
        self.properties
            .iter()
            .find(|p| p.target_property == target_property)
    }

    /// Mappings that feed constructor arguments
    pub fn constructor_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.constructor.iter().map(move |&i| &self.properties[i])
    }

    /// Non-constructor mappings applied before any lazy materialization
    pub fn eager_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.eager.iter().map(move |&i| &self.properties[i])
    }

    /// Non-constructor mappings that may be deferred behind a proxy
    pub fn lazy_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.lazy.iter().map(move |&i| &self.properties[i])
    }

    /// Names of all eager target properties, constructor-fed ones included
    ///
    /// A lazy proxy exposes these without initializing.
    pub fn eager_names(&self) -> Vec<String> {
        self.properties
            .iter()
            .filter(|p| p.eager)
            .map(|p| p.target_property.clone())
            .collect()
    }

    /// Whether a lazy proxy would defer anything
    pub fn has_lazy_properties(&self) -> bool {
        !self.lazy.is_empty() || !self.constructor.is_empty()
    }

    fn is_fresh(&self, source: &ClassDescriptor, target: &ClassDescriptor) -> bool {
        self.source.modified == source.modified && self.target.modified == target.modified
    }
}

/// Process-wide cache of [`ObjectToObjectMetadata`]
pub struct ObjectToObjectMetadataFactory {
    classes: Arc<ClassMetadataFactory>,
    cache: RwLock<HashMap<(String, String), Arc<ObjectToObjectMetadata>>>,
}

impl ObjectToObjectMetadataFactory {
    pub fn new(classes: Arc<ClassMetadataFactory>) -> Self {
        Self {
            classes,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn class_metadata(&self) -> &Arc<ClassMetadataFactory> {
        &self.classes
    }

    fn resolver(&self) -> &TypeResolver {
        self.classes.resolver()
    }

    /// Plan for mapping `source_class` onto `target_class`
    pub fn get(&self, source_class: &str, target_class: &str) -> Result<Arc<ObjectToObjectMetadata>> {
        let source = self.describe(source_class)?;
        let target = self.describe(target_class)?;
        let key = (source_class.to_string(), target_class.to_string());

        if let Some(cached) = self.cache.read().get(&key) {
            if cached.is_fresh(&source, &target) {
                return Ok(cached.clone());
            }
        }

        let mut cache = self.cache.write();
        if let Some(cached) = cache.get(&key) {
            if cached.is_fresh(&source, &target) {
                return Ok(cached.clone());
            }
        }

        log::debug!("Building mapping plan {} -> {}", source_class, target_class);
        let metadata = Arc::new(self.build(&source, &target)?);
        cache.insert(key, metadata.clone());
        Ok(metadata)
    }

    /// Precompute plans; returns the number of plans now cached
    pub fn warm<I, S, T>(&self, pairs: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        for (source, target) in pairs {
            self.get(source.as_ref(), target.as_ref())?;
        }
        Ok(self.cached_count())
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    fn describe(&self, class: &str) -> Result<Arc<ClassDescriptor>> {
        self.resolver()
            .provider()
            .describe(class)
            .ok_or_else(|| Error::UnknownClass {
                class: class.to_string(),
            })
    }

    fn build(&self, source: &ClassDescriptor, target: &ClassDescriptor) -> Result<ObjectToObjectMetadata> {
        let source_meta = self.classes.get(&source.name)?;
        let target_meta = self.classes.get(&target.name)?;
        let resolver = self.resolver();

        let mut properties = Vec::new();
        for pairing in pair_properties(source, target, resolver) {
            let source_read = match &pairing.source_property {
                Some(name) if PropertyPath::is_path(name) => {
                    ReadMode::PropertyPath(self.resolve_path(source, name)?.0)
                }
                Some(name) => read_mode(source, name),
                None => ReadMode::None,
            };

            let mapping = if PropertyPath::is_path(&pairing.target_property) {
                let (path, types) = self.resolve_path(target, &pairing.target_property)?;
                self.path_mapping(pairing.source_property, source_read, path, types)
            } else {
                self.property_mapping(
                    target,
                    &target_meta,
                    &pairing.target_property,
                    pairing.source_property,
                    source_read,
                )
            };
            properties.push(mapping);
        }

        let constructor_params = if target.is_instantiable() {
            target
                .constructor
                .as_ref()
                .map(|c| c.params.clone())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut constructor = Vec::new();
        for param in &constructor_params {
            if let Some(index) = properties
                .iter()
                .position(|p| p.constructor_argument && p.target_property == param.name)
            {
                constructor.push(index);
            }
        }

        let mut eager = Vec::new();
        let mut lazy = Vec::new();
        for (index, mapping) in properties.iter().enumerate() {
            // Unwritable pairs stay in the plan so the processor can report them
            if mapping.target_write == WriteMode::Constructor || !mapping.has_source() {
                continue;
            }
            if mapping.eager {
                eager.push(index);
            } else {
                lazy.push(index);
            }
        }

        Ok(ObjectToObjectMetadata {
            source: source_meta,
            target: target_meta,
            properties,
            constructor_params,
            constructor,
            eager,
            lazy,
        })
    }

    fn resolve_path(&self, class: &ClassDescriptor, raw: &str) -> Result<(PropertyPath, Vec<Type>)> {
        let path = PropertyPath::parse(raw).map_err(|message| Error::InvalidPropertyPath {
            class: class.name.clone(),
            property_path: raw.to_string(),
            message,
        })?;
        let types = path.resolve(&class.name, self.resolver().provider().as_ref())?;
        Ok((path, types))
    }

    fn property_mapping(
        &self,
        target: &ClassDescriptor,
        target_meta: &ClassMetadata,
        name: &str,
        source_property: Option<String>,
        source_read: ReadMode,
    ) -> PropertyMapping {
        let (target_write, constructor_argument) = write_mode(target, name, self.resolver());
        let declared = target.property(name);

        let declared_types = match declared {
            Some(property) => property.types.clone(),
            None => target
                .constructor
                .as_ref()
                .and_then(|c| c.param(name))
                .map(|param| param.types.clone())
                .unwrap_or_default(),
        };
        let target_types = if declared_types.is_empty() {
            vec![Type::Mixed]
        } else {
            declared_types
        };

        PropertyMapping {
            source_property,
            target_property: name.to_string(),
            source_read,
            target_read: read_mode(target, name),
            target_write,
            constructor_argument,
            nullable: is_nullable(&target_types),
            lone_scalar: lone_scalar(&target_types),
            target_types,
            visibility: declared.map_or(Visibility::Public, |p| p.visibility),
            allow_delete: declared.is_some_and(|p| p.allow_delete),
            eager: target_meta.is_eager(name),
            mapper: declared.and_then(|p| p.mapper.clone()),
        }
    }

    fn path_mapping(
        &self,
        source_property: Option<String>,
        source_read: ReadMode,
        path: PropertyPath,
        types: Vec<Type>,
    ) -> PropertyMapping {
        let types = if types.is_empty() { vec![Type::Mixed] } else { types };
        PropertyMapping {
            source_property,
            target_property: path.as_str().to_string(),
            source_read,
            target_read: ReadMode::PropertyPath(path.clone()),
            target_write: WriteMode::PropertyPath(path),
            constructor_argument: false,
            nullable: is_nullable(&types),
            lone_scalar: lone_scalar(&types),
            target_types: types,
            visibility: Visibility::Public,
            allow_delete: false,
            eager: false,
            mapper: None,
        }
    }
}
