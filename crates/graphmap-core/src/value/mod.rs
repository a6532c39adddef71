//! Runtime values moved through the mapping engine
//!
//! Scalars and arrays have value semantics. Objects and collections are
//! shared handles whose equality is identity, which is what the object
//! cache keys on.

pub mod collection;
pub mod lazy;
pub mod object;

pub use collection::{CollectionRef, WeakCollectionRef};
pub use lazy::{Initializer, LazySlot};
pub use object::{Fields, ObjectRef, WeakObjectRef};

use crate::{Error, Result};
use std::fmt;

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Array),
    Object(ObjectRef),
    Collection(CollectionRef),
}

impl Value {
    /// Build a list-shaped array
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(Array::from_values(values.into_iter().map(Into::into)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    /// Objects and collections carry identity
    pub fn has_identity(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Collection(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Identity of an object or collection
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(o) => Some(o.id()),
            Value::Collection(c) => Some(c.id()),
            _ => None,
        }
    }

    /// Short description used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Object(o) => o.class().to_string(),
            Value::Collection(c) => c.class().to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Collection(a), Value::Collection(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(a) => fmt::Debug::fmt(a, f),
            Value::Object(o) => fmt::Debug::fmt(o, f),
            Value::Collection(c) => fmt::Debug::fmt(c, f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<&ObjectRef> for Value {
    fn from(o: &ObjectRef) -> Self {
        Value::Object(o.clone())
    }
}

impl From<CollectionRef> for Value {
    fn from(c: CollectionRef) -> Self {
        Value::Collection(c)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Key of an [`Array`] entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

impl ArrayKey {
    /// Convert a primitive value into a key; other values have no key form
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(ArrayKey::Int(*i)),
            Value::String(s) => Some(ArrayKey::String(s.clone())),
            Value::Bool(b) => Some(ArrayKey::Int(i64::from(*b))),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(i) => Value::Int(*i),
            ArrayKey::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::String(s.to_string())
    }
}

/// Ordered associative array with value semantics
#[derive(Clone)]
pub struct Array {
    entries: Vec<(ArrayKey, Value)>,
    /// Key of the next pushed element; `None` once `i64::MAX` is taken
    next_index: Option<i64>,
}

impl Default for Array {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_index: Some(0),
        }
    }
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let entries: Vec<(ArrayKey, Value)> = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (ArrayKey::Int(i as i64), v))
            .collect();
        Self {
            next_index: Some(entries.len() as i64),
            entries,
        }
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ArrayKey, Value)>,
    {
        let mut array = Self::new();
        for (key, value) in entries {
            array.insert(key, value);
        }
        array
    }

    /// Append under the next integer key
    ///
    /// Fails once the array holds the key `i64::MAX`.
    pub fn push(&mut self, value: Value) -> Result<()> {
        let Some(index) = self.next_index else {
            return Err(Error::invalid_argument(
                "cannot append: the next integer key is already occupied",
                "",
            ));
        };
        self.entries.push((ArrayKey::Int(index), value));
        self.next_index = index.checked_add(1);
        Ok(())
    }

    /// Insert or replace the value under `key`
    pub fn insert(&mut self, key: ArrayKey, value: Value) {
        if let (ArrayKey::Int(i), Some(next)) = (&key, self.next_index) {
            if *i >= next {
                self.next_index = i.checked_add(1);
            }
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &ArrayKey) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ArrayKey, Value)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        self.values().any(|v| v == value)
    }

    /// Whether the keys are exactly `0..len` in order
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == ArrayKey::Int(i as i64))
    }

    /// Renumber the entries `0..len`, keeping their order
    pub fn reindex(self) -> Self {
        Self::from_values(self.entries.into_iter().map(|(_, v)| v))
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl IntoIterator for Array {
    type Item = (ArrayKey, Value);
    type IntoIter = std::vec::IntoIter<(ArrayKey, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_push_after_explicit_key() {
        let mut a = Array::new();
        a.insert(ArrayKey::Int(10), Value::from("x"));
        a.push(Value::from("y")).unwrap();
        assert_eq!(a.get(&ArrayKey::Int(11)), Some(&Value::from("y")));
        assert!(!a.is_list());
        assert!(a.reindex().is_list());
    }

    #[test]
    fn test_array_max_int_key() {
        let mut a = Array::from_entries([(ArrayKey::Int(i64::MAX), Value::from("a"))]);
        assert_eq!(a.get(&ArrayKey::Int(i64::MAX)), Some(&Value::from("a")));

        a.insert(ArrayKey::Int(3), Value::from("b"));
        assert_eq!(a.len(), 2);

        let err = a.push(Value::from("c")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_value_equality_semantics() {
        assert_eq!(Value::list([1, 2]), Value::list([1, 2]));
        let o = ObjectRef::new("A");
        assert_eq!(Value::from(&o), Value::from(o.clone()));
        assert_ne!(Value::from(o), Value::from(ObjectRef::new("A")));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::from(ObjectRef::new("App\\X")).type_name(), "App\\X");
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(Some(3)).type_name(), "int");
    }
}
