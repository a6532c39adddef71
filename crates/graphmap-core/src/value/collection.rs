//! Identity-bearing, possibly lazy collections
//!
//! A collection is the engine's rendition of a traversable, countable,
//! array-accessible object. Keys may be any value, including objects.

use super::lazy::{Initializer, LazySlot};
use super::Value;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

struct CollectionCell {
    class: String,
    entries: RwLock<Vec<(Value, Value)>>,
    lazy: LazySlot<CollectionRef>,
}

/// Handle to a collection instance
#[derive(Clone)]
pub struct CollectionRef(Arc<CollectionCell>);

/// Non-owning handle to a collection instance
#[derive(Clone)]
pub struct WeakCollectionRef(Weak<CollectionCell>);

impl WeakCollectionRef {
    pub fn upgrade(&self) -> Option<CollectionRef> {
        self.0.upgrade().map(CollectionRef)
    }
}

impl fmt::Debug for WeakCollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(collection) => write!(f, "Weak({:?})", collection),
            None => write!(f, "Weak(dropped)"),
        }
    }
}

impl CollectionRef {
    pub fn new(class: impl Into<String>) -> Self {
        Self::from_entries(class, Vec::new())
    }

    pub fn from_entries(class: impl Into<String>, entries: Vec<(Value, Value)>) -> Self {
        CollectionRef(Arc::new(CollectionCell {
            class: class.into(),
            entries: RwLock::new(entries),
            lazy: LazySlot::ready(),
        }))
    }

    /// Build a list-like collection keyed `0..n`
    pub fn from_values<I>(class: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Value::Int(i as i64), v))
            .collect();
        Self::from_entries(class, entries)
    }

    /// A collection whose entries and count are computed on first access
    pub fn lazy(class: impl Into<String>, initializer: Initializer<CollectionRef>) -> Self {
        CollectionRef(Arc::new(CollectionCell {
            class: class.into(),
            entries: RwLock::new(Vec::new()),
            lazy: LazySlot::deferred(initializer),
        }))
    }

    pub fn class(&self) -> &str {
        &self.0.class
    }

    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &CollectionRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A handle that does not keep the collection alive
    pub fn downgrade(&self) -> WeakCollectionRef {
        WeakCollectionRef(Arc::downgrade(&self.0))
    }

    pub fn is_initialized(&self) -> bool {
        self.0.lazy.is_initialized()
    }

    pub fn initialize(&self) -> Result<()> {
        self.0.lazy.initialize(self)
    }

    pub fn len(&self) -> Result<usize> {
        self.initialize()?;
        Ok(self.0.entries.read().len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>> {
        self.initialize()?;
        Ok(self
            .0
            .entries
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    /// Insert or replace the entry under `key`
    pub fn insert(&self, key: Value, value: Value) -> Result<()> {
        self.initialize()?;
        self.insert_raw(key, value);
        Ok(())
    }

    /// Append under the next integer key
    ///
    /// Fails once the collection holds the key `i64::MAX`.
    pub fn push(&self, value: Value) -> Result<()> {
        self.initialize()?;
        self.push_raw(value)
    }

    pub fn remove(&self, key: &Value) -> Result<Option<Value>> {
        self.initialize()?;
        let mut entries = self.0.entries.write();
        let index = entries.iter().position(|(k, _)| k == key);
        Ok(index.map(|i| entries.remove(i).1))
    }

    /// Snapshot of all entries in order
    pub fn entries(&self) -> Result<Vec<(Value, Value)>> {
        self.initialize()?;
        Ok(self.0.entries.read().clone())
    }

    pub fn values(&self) -> Result<Vec<Value>> {
        Ok(self.entries()?.into_iter().map(|(_, v)| v).collect())
    }

    pub fn contains_value(&self, value: &Value) -> Result<bool> {
        self.initialize()?;
        Ok(self.0.entries.read().iter().any(|(_, v)| v == value))
    }

    /// Replace every entry at once
    pub fn replace_entries(&self, entries: Vec<(Value, Value)>) -> Result<()> {
        self.initialize()?;
        *self.0.entries.write() = entries;
        Ok(())
    }

    pub(crate) fn insert_raw(&self, key: Value, value: Value) {
        let mut entries = self.0.entries.write();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
    }

    pub(crate) fn push_raw(&self, value: Value) -> Result<()> {
        let mut entries = self.0.entries.write();
        let next = match entries.iter().filter_map(|(k, _)| k.as_int()).max() {
            None => 0,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                Error::invalid_argument("cannot append: the next integer key is already occupied", "")
            })?,
        };
        entries.push((Value::Int(next), value));
        Ok(())
    }
}

impl PartialEq for CollectionRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for CollectionRef {}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:x}", self.class(), self.id())?;
        if !self.is_initialized() {
            write!(f, " (uninitialized)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectRef;

    #[test]
    fn test_push_uses_next_int_key() {
        let c = CollectionRef::new("ArrayCollection");
        c.insert(Value::Int(5), Value::from("a")).unwrap();
        c.insert(Value::from("k"), Value::from("b")).unwrap();
        c.push(Value::from("c")).unwrap();

        assert_eq!(c.get(&Value::Int(6)).unwrap(), Some(Value::from("c")));
        assert_eq!(c.len().unwrap(), 3);
    }

    #[test]
    fn test_push_after_max_int_key_fails() {
        let c = CollectionRef::from_entries("ArrayCollection", vec![(Value::Int(i64::MAX), Value::from("a"))]);
        let err = c.push(Value::from("b")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
        assert_eq!(c.len().unwrap(), 1);
    }

    #[test]
    fn test_object_keys_by_identity() {
        let k1 = ObjectRef::new("Key");
        let k2 = ObjectRef::new("Key");
        let c = CollectionRef::new("ArrayCollection");
        c.insert(Value::Object(k1.clone()), Value::Int(1)).unwrap();

        assert_eq!(c.get(&Value::Object(k1)).unwrap(), Some(Value::Int(1)));
        assert_eq!(c.get(&Value::Object(k2)).unwrap(), None);
    }

    #[test]
    fn test_lazy_collection_defers_count() {
        let c = CollectionRef::lazy(
            "LazyArray",
            Box::new(|this: &CollectionRef| {
                this.push(Value::Int(1))?;
                this.push(Value::Int(2))?;
                Ok(())
            }),
        );
        assert!(!c.is_initialized());
        assert_eq!(c.len().unwrap(), 2);
        assert!(c.is_initialized());
        assert_eq!(c.values().unwrap(), vec![Value::Int(1), Value::Int(2)]);
    }
}
