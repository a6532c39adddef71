//! Type guessing and class hierarchy queries

use super::{builtin, Type, OBJECT};
use crate::reflection::ClassProvider;
use crate::value::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Answers subtype questions against a [`ClassProvider`]
#[derive(Clone)]
pub struct TypeResolver {
    provider: Arc<dyn ClassProvider>,
}

impl TypeResolver {
    pub fn new(provider: Arc<dyn ClassProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn ClassProvider> {
        &self.provider
    }

    /// The runtime type of a value
    pub fn guess(&self, value: &Value) -> Type {
        match value {
            Value::Null => Type::Null,
            Value::Bool(_) => Type::bool(),
            Value::Int(_) => Type::int(),
            Value::Float(_) => Type::float(),
            Value::String(_) => Type::string(),
            Value::Array(_) => Type::array(),
            Value::Object(o) => Type::object(o.class()),
            Value::Collection(c) => Type::object(c.class()),
        }
    }

    /// Ancestors of `class` ordered by distance: parents first, then interfaces
    ///
    /// The class itself and the universal `object` type are not included.
    pub fn ancestors(&self, class: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut result = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        seen.insert(class.to_string());
        queue.push_back(class.to_string());

        while let Some(current) = queue.pop_front() {
            let Some(descriptor) = self.provider.describe(&current) else {
                continue;
            };
            let next = descriptor
                .parent
                .iter()
                .chain(descriptor.interfaces.iter());
            for name in next {
                if name != OBJECT && seen.insert(name.clone()) {
                    result.push(name.clone());
                    queue.push_back(name.clone());
                }
            }
        }
        result
    }

    /// Specificity family of a type, most specific first
    ///
    /// For `Book` this is `Book`, its ancestors by distance, `object`, `mixed`.
    /// Generic parameters are dropped; the rank of a declared type in the
    /// family of the requested type is its specificity.
    pub fn family(&self, t: &Type) -> Vec<Type> {
        let mut family = vec![t.simple()];
        if let Type::Object { class, .. } = t {
            if class != OBJECT {
                family.extend(self.ancestors(class).into_iter().map(Type::object));
                family.push(Type::any_object());
            }
        }
        if !t.is_mixed() {
            family.push(Type::Mixed);
        }
        family
    }

    /// Whether `class` is `ancestor` or one of its descendants
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        class == ancestor || ancestor == OBJECT || self.ancestors(class).iter().any(|a| a == ancestor)
    }

    /// Whether `value` satisfies `t`, ignoring generic parameters
    pub fn is_instance(&self, value: &Value, t: &Type) -> bool {
        match (t, value) {
            (Type::Mixed, _) => true,
            (Type::Null, Value::Null) => true,
            (Type::Scalar(kind), _) => self.guess(value).scalar_kind() == Some(*kind),
            (Type::Array { .. }, Value::Array(_)) => true,
            (Type::Object { class, .. }, Value::Object(o)) => self.is_subclass_of(o.class(), class),
            (Type::Object { class, .. }, Value::Collection(c)) => {
                self.is_subclass_of(c.class(), class)
            }
            _ => false,
        }
    }

    /// Whether instances of `class` are traversable or array-accessible
    pub fn is_collection_class(&self, class: &str) -> bool {
        self.is_subclass_of(class, builtin::TRAVERSABLE)
            || self.is_subclass_of(class, builtin::ARRAY_ACCESS)
    }

    /// Whether `class` is known and can be instantiated
    pub fn is_instantiable(&self, class: &str) -> bool {
        self.provider
            .describe(class)
            .is_some_and(|d| d.is_instantiable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{ClassBuilder, ClassRegistry};
    use crate::value::{CollectionRef, ObjectRef};

    fn resolver() -> TypeResolver {
        let registry = ClassRegistry::new();
        registry
            .define(ClassBuilder::new("Named").interface())
            .unwrap();
        registry
            .define(ClassBuilder::new("Animal").abstract_class().implements("Named"))
            .unwrap();
        registry
            .define(ClassBuilder::new("Dog").extends("Animal"))
            .unwrap();
        TypeResolver::new(Arc::new(registry))
    }

    #[test]
    fn test_family_order() {
        let family = resolver().family(&Type::object("Dog"));
        assert_eq!(
            family,
            vec![
                Type::object("Dog"),
                Type::object("Animal"),
                Type::object("Named"),
                Type::any_object(),
                Type::Mixed,
            ]
        );
        assert_eq!(resolver().family(&Type::int()), vec![Type::int(), Type::Mixed]);
        assert_eq!(resolver().family(&Type::Mixed), vec![Type::Mixed]);
    }

    #[test]
    fn test_is_instance() {
        let r = resolver();
        let dog = Value::from(ObjectRef::new("Dog"));
        assert!(r.is_instance(&dog, &Type::object("Named")));
        assert!(r.is_instance(&dog, &Type::any_object()));
        assert!(!r.is_instance(&dog, &Type::int()));
        assert!(r.is_instance(&Value::Int(1), &Type::int()));

        let collection = Value::from(CollectionRef::new("ArrayCollection"));
        assert!(r.is_instance(&collection, &Type::object("Traversable")));
        assert!(r.is_collection_class("ArrayCollection"));
        assert!(!r.is_collection_class("Dog"));
    }

    #[test]
    fn test_instantiable() {
        let r = resolver();
        assert!(r.is_instantiable("Dog"));
        assert!(!r.is_instantiable("Animal"));
        assert!(!r.is_instantiable("Unknown"));
    }
}
