//! Per-property mapping metadata and accessor inference

use super::path::PropertyPath;
use crate::reflection::inflector::{singularize, ucfirst};
use crate::reflection::{ClassDescriptor, PropertyMapperFn, Visibility};
use crate::types::{ScalarKind, Type, TypeResolver};
use std::fmt;

/// How a value is read from an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadMode {
    None,
    Property,
    Getter(String),
    PropertyPath(PropertyPath),
    DynamicProperty,
}

impl ReadMode {
    pub fn is_readable(&self) -> bool {
        !matches!(self, ReadMode::None)
    }
}

/// How a value is written to a target object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    None,
    Constructor,
    Property,
    Setter(String),
    AdderRemover { adder: String, remover: String },
    PropertyPath(PropertyPath),
    DynamicProperty,
}

impl WriteMode {
    /// Whether the value can be written after instantiation
    pub fn is_settable(&self) -> bool {
        !matches!(self, WriteMode::None | WriteMode::Constructor)
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::None => write!(f, "none"),
            WriteMode::Constructor => write!(f, "constructor"),
            WriteMode::Property => write!(f, "property"),
            WriteMode::Setter(name) => write!(f, "setter {}", name),
            WriteMode::AdderRemover { adder, remover } => write!(f, "{}/{}", adder, remover),
            WriteMode::PropertyPath(path) => write!(f, "path {}", path),
            WriteMode::DynamicProperty => write!(f, "dynamic property"),
        }
    }
}

/// Complete plan for one target property
#[derive(Clone)]
pub struct PropertyMapping {
    /// Paired source property name or path; `None` when nothing pairs
    pub source_property: Option<String>,
    /// Target property name or path
    pub target_property: String,
    pub source_read: ReadMode,
    /// Used to read the current target value before writing
    pub target_read: ReadMode,
    pub target_write: WriteMode,
    /// Passed to the constructor when the target is instantiated
    pub constructor_argument: bool,
    /// Declared target types; `[Mixed]` when undeclared
    pub target_types: Vec<Type>,
    pub visibility: Visibility,
    pub nullable: bool,
    /// The target accepts exactly one scalar kind (plus null)
    pub lone_scalar: Option<ScalarKind>,
    pub allow_delete: bool,
    pub eager: bool,
    pub mapper: Option<PropertyMapperFn>,
}

impl PropertyMapping {
    /// Whether a value is read from the source at all
    pub fn has_source(&self) -> bool {
        self.mapper.is_some() || (self.source_property.is_some() && self.source_read.is_readable())
    }
}

impl fmt::Debug for PropertyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMapping")
            .field("source_property", &self.source_property)
            .field("target_property", &self.target_property)
            .field("source_read", &self.source_read)
            .field("target_read", &self.target_read)
            .field("target_write", &self.target_write)
            .field("constructor_argument", &self.constructor_argument)
            .field("target_types", &self.target_types)
            .field("nullable", &self.nullable)
            .field("lone_scalar", &self.lone_scalar)
            .field("allow_delete", &self.allow_delete)
            .field("eager", &self.eager)
            .field("mapper", &self.mapper.is_some())
            .finish()
    }
}

/// The single scalar kind of `types`, ignoring null
pub fn lone_scalar(types: &[Type]) -> Option<ScalarKind> {
    let mut non_null = types.iter().filter(|t| !t.is_null());
    let first = non_null.next()?;
    if non_null.next().is_some() {
        return None;
    }
    first.scalar_kind()
}

pub fn is_nullable(types: &[Type]) -> bool {
    types.is_empty() || types.iter().any(|t| t.is_null() || t.is_mixed())
}

/// Public one-argument `set{Name}`
pub fn find_setter(class: &ClassDescriptor, property: &str) -> Option<String> {
    let name = format!("set{}", ucfirst(property));
    class.public_method(&name, 1).map(|m| m.name.clone())
}

/// Public zero-argument `get{Name}`, `is{Name}` or `has{Name}`
pub fn find_getter(class: &ClassDescriptor, property: &str) -> Option<String> {
    let suffix = ucfirst(property);
    ["get", "is", "has"]
        .iter()
        .find_map(|prefix| class.public_method(&format!("{}{}", prefix, suffix), 0))
        .map(|m| m.name.clone())
}

/// Public `add{Singular}` and `remove{Singular}` pair, both required
pub fn find_adder_remover(class: &ClassDescriptor, property: &str) -> Option<(String, String)> {
    singularize(property).into_iter().find_map(|singular| {
        let suffix = ucfirst(&singular);
        let adder = class.public_method(&format!("add{}", suffix), 1)?;
        let remover = class.public_method(&format!("remove{}", suffix), 1)?;
        Some((adder.name.clone(), remover.name.clone()))
    })
}

/// Read strategy for a plain property name
pub fn read_mode(class: &ClassDescriptor, property: &str) -> ReadMode {
    match class.property(property) {
        Some(p) if p.visibility == Visibility::Public => ReadMode::Property,
        _ => {
            if let Some(getter) = find_getter(class, property) {
                ReadMode::Getter(getter)
            } else if class.property(property).is_none() && class.allow_dynamic_properties {
                ReadMode::DynamicProperty
            } else {
                ReadMode::None
            }
        }
    }
}

/// Write strategy for a plain property name, and whether it is a constructor argument
///
/// Priority: constructor parameter that is not independently settable,
/// setter, adder/remover pair on a collection-typed property, public
/// writable property, dynamic property of an open class.
pub fn write_mode(class: &ClassDescriptor, property: &str, resolver: &TypeResolver) -> (WriteMode, bool) {
    let constructor_argument = class.is_instantiable()
        && class
            .constructor
            .as_ref()
            .is_some_and(|c| c.param(property).is_some());

    let settable = settable_mode(class, property, resolver);
    match settable {
        WriteMode::None if constructor_argument => (WriteMode::Constructor, true),
        mode => (mode, constructor_argument),
    }
}

fn settable_mode(class: &ClassDescriptor, property: &str, resolver: &TypeResolver) -> WriteMode {
    if class.readonly {
        return WriteMode::None;
    }
    if let Some(setter) = find_setter(class, property) {
        return WriteMode::Setter(setter);
    }

    let declared = class.property(property);
    let collection_typed = declared.is_some_and(|p| {
        p.types.iter().any(|t| {
            t.is_array() || t.class().is_some_and(|c| resolver.is_collection_class(c))
        })
    });
    if collection_typed {
        if let Some((adder, remover)) = find_adder_remover(class, property) {
            return WriteMode::AdderRemover { adder, remover };
        }
    }

    match declared {
        Some(p) if p.visibility == Visibility::Public && !p.readonly => WriteMode::Property,
        Some(_) => WriteMode::None,
        None if class.allow_dynamic_properties => WriteMode::DynamicProperty,
        None => WriteMode::None,
    }
}
