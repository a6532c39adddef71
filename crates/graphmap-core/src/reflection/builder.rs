//! Fluent builder for class descriptors
//!
//! Besides plain declarations, the builder can generate the accessor hooks a
//! hand-written class would expose: `setName`, `getName` and the
//! `addBook`/`removeBook` pair for a `books` collection property.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::descriptor::{
    ClassDescriptor, ConstructorDescriptor, ConstructorParam, MethodDescriptor,
    PropertyDescriptor, Visibility,
};
use super::inflector::{singularize, ucfirst};
use crate::types::Type;
use crate::value::{Array, ArrayKey, ObjectRef, Value};
use crate::{Error, Result};

/// Builder for [`ClassDescriptor`]
pub struct ClassBuilder {
    descriptor: ClassDescriptor,
    /// First declaration error, reported by `build`
    error: Option<Error>,
}

impl ClassBuilder {
    /// Create a new class builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ClassDescriptor::new(name),
            error: None,
        }
    }

    /// Set the parent class
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.descriptor.parent = Some(parent.into());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.descriptor.interfaces.push(interface.into());
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.descriptor.is_abstract = true;
        self
    }

    pub fn interface(mut self) -> Self {
        self.descriptor.is_interface = true;
        self
    }

    pub fn not_cloneable(mut self) -> Self {
        self.descriptor.cloneable = false;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.descriptor.readonly = true;
        self
    }

    /// Instances accept properties that are not declared
    pub fn dynamic_properties(mut self) -> Self {
        self.descriptor.allow_dynamic_properties = true;
        self
    }

    /// Override the value-object classification
    pub fn value_object(mut self, value_object: bool) -> Self {
        self.descriptor.value_object = Some(value_object);
        self
    }

    pub fn immutable_date(mut self) -> Self {
        self.descriptor.immutable_date = true;
        self
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.descriptor.attributes.push(attribute.into());
        self
    }

    /// Map instances of `source_class` to the concrete subclass `target_class`
    pub fn inheritance(
        mut self,
        source_class: impl Into<String>,
        target_class: impl Into<String>,
    ) -> Self {
        self.descriptor
            .inheritance_map
            .push((source_class.into(), target_class.into()));
        self
    }

    /// Set an explicit freshness stamp
    pub fn modified(mut self, stamp: u64) -> Self {
        self.descriptor.modified = stamp;
        self
    }

    /// Add a fully specified property
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.descriptor.properties.retain(|p| p.name != property.name);
        self.descriptor.properties.push(property);
        self
    }

    /// Add a public property with the given type expression
    pub fn field(self, name: &str, types: &str) -> Self {
        self.field_with(name, types, |p| p)
    }

    /// Add a property with the given type expression, customized by `configure`
    pub fn field_with<F>(mut self, name: &str, types: &str, configure: F) -> Self
    where
        F: FnOnce(PropertyDescriptor) -> PropertyDescriptor,
    {
        match self.parse(types) {
            Some(types) => self.property(configure(PropertyDescriptor::new(name, types))),
            None => {
                self.descriptor.properties.retain(|p| p.name != name);
                self
            }
        }
    }

    /// Add a private property with a generated setter and getter
    pub fn encapsulated(self, name: &str, types: &str) -> Self {
        self.field_with(name, types, |p| p.private())
            .setter(name)
            .getter(name)
    }

    /// Add a method
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor
            .methods
            .retain(|m| !m.name.eq_ignore_ascii_case(&method.name));
        self.descriptor.methods.push(method);
        self
    }

    /// Generate `set{Property}` writing the field
    pub fn setter(self, property: &str) -> Self {
        let field = property.to_string();
        self.method(MethodDescriptor::new(
            format!("set{}", ucfirst(property)),
            1,
            move |this: &ObjectRef, args: &[Value]| {
                this.set(&field, args.first().cloned().unwrap_or_default())?;
                Ok(Value::Null)
            },
        ))
    }

    /// Generate `get{Property}` reading the field
    pub fn getter(self, property: &str) -> Self {
        let field = property.to_string();
        self.method(MethodDescriptor::new(
            format!("get{}", ucfirst(property)),
            0,
            move |this: &ObjectRef, _: &[Value]| Ok(this.get(&field)?.unwrap_or_default()),
        ))
    }

    /// Generate `add{Singular}` and `remove{Singular}` for a collection property
    pub fn adder_remover(self, property: &str) -> Self {
        let singular = singularize(property)
            .into_iter()
            .next()
            .unwrap_or_else(|| property.to_string());
        let field = property.to_string();
        let remove_field = property.to_string();

        self.method(MethodDescriptor::new(
            format!("add{}", ucfirst(&singular)),
            1,
            move |this: &ObjectRef, args: &[Value]| {
                let element = args.first().cloned().unwrap_or_default();
                match this.get(&field)? {
                    Some(Value::Collection(collection)) => collection.push(element)?,
                    Some(Value::Array(mut array)) => {
                        array.push(element)?;
                        this.set(&field, array)?;
                    }
                    Some(Value::Null) | None => {
                        this.set(&field, Array::from_values([element]))?;
                    }
                    Some(other) => {
                        anyhow::bail!("cannot add to '{}' holding {}", field, other.type_name())
                    }
                }
                Ok(Value::Null)
            },
        ))
        .method(MethodDescriptor::new(
            format!("remove{}", ucfirst(&singular)),
            1,
            move |this: &ObjectRef, args: &[Value]| {
                let element = args.first().cloned().unwrap_or_default();
                match this.get(&remove_field)? {
                    Some(Value::Collection(collection)) => {
                        let key = collection
                            .entries()?
                            .into_iter()
                            .find(|(_, v)| *v == element)
                            .map(|(k, _)| k);
                        if let Some(key) = key {
                            collection.remove(&key)?;
                        }
                    }
                    Some(Value::Array(array)) => {
                        let was_list = array.is_list();
                        let mut remaining = array.clone();
                        let key: Option<ArrayKey> = array
                            .iter()
                            .find(|(_, v)| *v == element)
                            .map(|(k, _)| k.clone());
                        if let Some(key) = key {
                            remaining.remove(&key);
                        }
                        if was_list {
                            remaining = remaining.reindex();
                        }
                        this.set(&remove_field, remaining)?;
                    }
                    _ => {}
                }
                Ok(Value::Null)
            },
        ))
    }

    /// Declare a public constructor with the given parameters
    pub fn constructor(mut self, params: Vec<ConstructorParam>) -> Self {
        let constructor = self
            .descriptor
            .constructor
            .get_or_insert_with(ConstructorDescriptor::default);
        constructor.params = params;
        self
    }

    /// Append a mandatory constructor parameter
    pub fn param(mut self, name: &str, types: &str) -> Self {
        if let Some(types) = self.parse(types) {
            self.descriptor
                .constructor
                .get_or_insert_with(ConstructorDescriptor::default)
                .params
                .push(ConstructorParam::new(name, types));
        }
        self
    }

    /// Append an optional constructor parameter
    pub fn optional_param(mut self, name: &str, types: &str, default: impl Into<Value>) -> Self {
        if let Some(types) = self.parse(types) {
            self.descriptor
                .constructor
                .get_or_insert_with(ConstructorDescriptor::default)
                .params
                .push(ConstructorParam::new(name, types).optional(default));
        }
        self
    }

    /// Replace the default constructor body
    pub fn constructor_body<F>(mut self, body: F) -> Self
    where
        F: Fn(&[(String, Value)]) -> anyhow::Result<Vec<(String, Value)>> + Send + Sync + 'static,
    {
        self.descriptor
            .constructor
            .get_or_insert_with(ConstructorDescriptor::default)
            .body = Some(std::sync::Arc::new(body));
        self
    }

    /// Make the constructor private; the class is then not instantiable
    pub fn private_constructor(mut self) -> Self {
        self.descriptor
            .constructor
            .get_or_insert_with(ConstructorDescriptor::default)
            .visibility = Visibility::Private;
        self
    }

    /// Build the class descriptor
    pub fn build(self) -> Result<ClassDescriptor> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.descriptor.name.trim().is_empty() {
            return Err(Error::configuration("Class name is required"));
        }
        if self.descriptor.is_interface && self.descriptor.constructor.is_some() {
            return Err(Error::configuration(format!(
                "Interface '{}' cannot declare a constructor",
                self.descriptor.name
            )));
        }
        Ok(self.descriptor)
    }

    fn parse(&mut self, types: &str) -> Option<Vec<Type>> {
        match Type::parse(types) {
            Ok(types) => Some(types),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CollectionRef;

    fn call(class: &ClassDescriptor, method: &str, this: &ObjectRef, args: &[Value]) -> Value {
        class.method(method).unwrap().invoke(this, args).unwrap()
    }

    #[test]
    fn test_generated_setter_and_getter() {
        let class = ClassBuilder::new("Person")
            .encapsulated("name", "string")
            .build()
            .unwrap();
        let person = ObjectRef::new("Person");

        call(&class, "setName", &person, &[Value::from("Ada")]);
        assert_eq!(call(&class, "getName", &person, &[]), Value::from("Ada"));
        assert_eq!(class.property("name").unwrap().visibility, Visibility::Private);
    }

    #[test]
    fn test_adder_remover_on_array_reindexes() {
        let class = ClassBuilder::new("Shelf")
            .field_with("books", "list<string>", |p| p.private())
            .adder_remover("books")
            .build()
            .unwrap();
        let shelf = ObjectRef::new("Shelf");

        for title in ["a", "b", "c"] {
            call(&class, "addBook", &shelf, &[Value::from(title)]);
        }
        call(&class, "removeBook", &shelf, &[Value::from("a")]);

        assert_eq!(shelf.get("books").unwrap(), Some(Value::list(["b", "c"])));
    }

    #[test]
    fn test_adder_on_collection() {
        let class = ClassBuilder::new("Library")
            .field("categories", "Collection<int, string>")
            .adder_remover("categories")
            .build()
            .unwrap();
        let collection = CollectionRef::new("ArrayCollection");
        let library = ObjectRef::with_fields("Library", [("categories", collection.clone().into())]);

        call(&class, "addCategory", &library, &[Value::from("fiction")]);
        assert_eq!(collection.values().unwrap(), vec![Value::from("fiction")]);
        call(&class, "removeCategory", &library, &[Value::from("fiction")]);
        assert!(collection.is_empty().unwrap());
    }

    #[test]
    fn test_build_reports_type_errors() {
        let result = ClassBuilder::new("Broken").field("x", "array<int").build();
        assert!(matches!(result, Err(Error::TypeSyntax { .. })));
    }

    #[test]
    fn test_constructor_params() {
        let class = ClassBuilder::new("Money")
            .param("amount", "int")
            .optional_param("currency", "string", "EUR")
            .build()
            .unwrap();
        let constructor = class.constructor.unwrap();
        assert!(!constructor.param("amount").unwrap().is_optional());
        assert_eq!(
            constructor.param("currency").unwrap().default,
            Some(Value::from("EUR"))
        );
    }
}
