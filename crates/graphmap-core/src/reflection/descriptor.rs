//! Plain descriptors of classes, properties, methods and constructors
//!
//! These are the raw per-class facts the metadata factories consume. They
//! replace runtime reflection and declarative attributes: everything the
//! engine needs to know about a class is spelled out here.

use crate::context::Context;
use crate::types::Type;
use crate::value::{ObjectRef, Value};
use std::fmt;
use std::sync::Arc;

/// Body of a method: receives the instance and the arguments
pub type MethodFn = Arc<dyn Fn(&ObjectRef, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Constructor body: receives named arguments in declaration order and
/// returns the initial fields of the instance
pub type ConstructorFn =
    Arc<dyn Fn(&[(String, Value)]) -> anyhow::Result<Vec<(String, Value)>> + Send + Sync>;

/// Custom property mapper: computes a target property value from the source object
pub type PropertyMapperFn =
    Arc<dyn Fn(&ObjectRef, &Context) -> anyhow::Result<Value> + Send + Sync>;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Explicit pairing directive
///
/// On a target property it names the source property (or path) to read
/// from; on a source property it names the target property (or path) to
/// write to. `class` scopes the directive to one paired class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDirective {
    pub property: String,
    pub class: Option<String>,
}

/// A declared property
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub types: Vec<Type>,
    pub visibility: Visibility,
    pub readonly: bool,
    /// Value the property holds after instantiation; `None` leaves it unset
    pub default: Option<Value>,
    pub map: Vec<MapDirective>,
    /// Collection elements missing from the source are removed from the target
    pub allow_delete: bool,
    /// Populated before any lazy materialization (e.g. identifiers)
    pub eager: bool,
    pub mapper: Option<PropertyMapperFn>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, types: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            types,
            visibility: Visibility::Public,
            readonly: false,
            default: None,
            map: Vec::new(),
            allow_delete: false,
            eager: false,
            mapper: None,
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Pair with `property` of any class
    pub fn map(mut self, property: impl Into<String>) -> Self {
        self.map.push(MapDirective {
            property: property.into(),
            class: None,
        });
        self
    }

    /// Pair with `property` only when the paired class is `class`
    pub fn map_for(mut self, property: impl Into<String>, class: impl Into<String>) -> Self {
        self.map.push(MapDirective {
            property: property.into(),
            class: Some(class.into()),
        });
        self
    }

    pub fn allow_delete(mut self) -> Self {
        self.allow_delete = true;
        self
    }

    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    pub fn mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&ObjectRef, &Context) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.types.is_empty() || self.types.iter().any(|t| t.is_null() || t.is_mixed())
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("types", &self.types)
            .field("visibility", &self.visibility)
            .field("readonly", &self.readonly)
            .field("map", &self.map)
            .field("allow_delete", &self.allow_delete)
            .field("eager", &self.eager)
            .field("mapper", &self.mapper.is_some())
            .finish()
    }
}

/// A declared method
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub arity: usize,
    pub visibility: Visibility,
    pub body: MethodFn,
}

impl MethodDescriptor {
    pub fn new<F>(name: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            visibility: Visibility::Public,
            body: Arc::new(body),
        }
    }

    pub fn invoke(&self, instance: &ObjectRef, args: &[Value]) -> anyhow::Result<Value> {
        (self.body)(instance, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} args)", self.name, self.arity)
    }
}

/// A constructor parameter
#[derive(Debug, Clone)]
pub struct ConstructorParam {
    pub name: String,
    pub types: Vec<Type>,
    /// Default value; a parameter with a default is optional
    pub default: Option<Value>,
}

impl ConstructorParam {
    pub fn new(name: impl Into<String>, types: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            types,
            default: None,
        }
    }

    pub fn optional(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// A constructor
#[derive(Clone, Default)]
pub struct ConstructorDescriptor {
    pub params: Vec<ConstructorParam>,
    pub visibility: Visibility,
    /// Custom body; by default each argument is written to the same-named field
    pub body: Option<ConstructorFn>,
}

impl ConstructorDescriptor {
    pub fn param(&self, name: &str) -> Option<&ConstructorParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Initial fields produced from `args`
    pub fn invoke(&self, args: &[(String, Value)]) -> anyhow::Result<Vec<(String, Value)>> {
        match &self.body {
            Some(body) => body(args),
            None => Ok(args.to_vec()),
        }
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("custom_body", &self.body.is_some())
            .finish()
    }
}

/// All facts about a class
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub cloneable: bool,
    pub readonly: bool,
    pub allow_dynamic_properties: bool,
    /// Explicit value-object classification, overriding inference
    pub value_object: Option<bool>,
    /// A recognized immutable date or interval kind
    pub immutable_date: bool,
    pub attributes: Vec<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub constructor: Option<ConstructorDescriptor>,
    /// Source class to concrete target subclass, for abstract targets
    pub inheritance_map: Vec<(String, String)>,
    /// Freshness stamp; cached metadata is rebuilt when it changes
    pub modified: u64,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            interfaces: Vec::new(),
            is_abstract: false,
            is_interface: false,
            cloneable: true,
            readonly: false,
            allow_dynamic_properties: false,
            value_object: None,
            immutable_date: false,
            attributes: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructor: None,
            inheritance_map: Vec::new(),
            modified: 0,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// A public method with the given arity
    pub fn public_method(&self, name: &str, arity: usize) -> Option<&MethodDescriptor> {
        self.method(name)
            .filter(|m| m.arity == arity && m.visibility == Visibility::Public)
    }

    pub fn is_instantiable(&self) -> bool {
        !self.is_abstract
            && !self.is_interface
            && self
                .constructor
                .as_ref()
                .map_or(true, |c| c.visibility == Visibility::Public)
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }

    /// Concrete target class for a source class, from the inheritance map
    pub fn inheritance_target(&self, source_class: &str) -> Option<&str> {
        self.inheritance_map
            .iter()
            .find(|(source, _)| source == source_class)
            .map(|(_, target)| target.as_str())
    }
}
