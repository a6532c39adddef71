//! Identity-bearing object instances
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::lazy::{Initializer, LazySlot};
use super::Value;
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

/// Ordered field storage of an object
///
/// A field that is absent is *unset*, which is distinct from holding `Null`.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared state behind an [`ObjectRef`]
pub struct ObjectCell {
    class: String,
    fields: RwLock<Fields>,
    /// Fields readable and writable without triggering lazy initialization
    eager: HashSet<String>,
    lazy: LazySlot<ObjectRef>,
}

/// Handle to an object instance
///
/// Cloning the handle shares the instance; equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCell>);

/// Non-owning handle to an object instance
#[derive(Clone)]
pub struct WeakObjectRef(Weak<ObjectCell>);

impl WeakObjectRef {
    /// The instance, unless every strong handle was dropped
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(object) => write!(f, "Weak({:?})", object),
            None => write!(f, "Weak(dropped)"),
        }
    }
}

impl ObjectRef {
    /// Create an empty, fully initialized object of `class`
    pub fn new(class: impl Into<String>) -> Self {
        Self::with_fields(class, Vec::<(String, Value)>::new())
    }

    /// Create an object with initial fields
    pub fn with_fields<I, K>(class: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut storage = Fields::default();
        for (name, value) in fields {
            storage.set(&name.into(), value);
        }

        ObjectRef(Arc::new(ObjectCell {
            class: class.into(),
            fields: RwLock::new(storage),
            eager: HashSet::new(),
            lazy: LazySlot::ready(),
        }))
    }

    /// Create a lazy proxy whose fields are populated by `initializer` on first access
    ///
    /// Fields named in `eager` bypass the initializer.
    pub fn lazy<I>(class: impl Into<String>, eager: I, initializer: Initializer<ObjectRef>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        ObjectRef(Arc::new(ObjectCell {
            class: class.into(),
            fields: RwLock::new(Fields::default()),
            eager: eager.into_iter().collect(),
            lazy: LazySlot::deferred(initializer),
        }))
    }

    pub fn class(&self) -> &str {
        &self.0.class
    }

    /// Stable identity of the instance for the lifetime of the handle
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A handle that does not keep the instance alive
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }

    pub fn is_initialized(&self) -> bool {
        self.0.lazy.is_initialized()
    }

    /// Force lazy initialization
    pub fn initialize(&self) -> Result<()> {
        self.0.lazy.initialize(self)
    }

    fn initialize_for(&self, name: &str) -> Result<()> {
        if self.0.eager.contains(name) {
            return Ok(());
        }
        self.initialize()
    }

    /// Read a field; `None` means the field is unset
    pub fn get(&self, name: &str) -> Result<Option<Value>> {
        self.initialize_for(name)?;
        Ok(self.peek(name))
    }

    /// Read a field without triggering lazy initialization
    pub fn peek(&self, name: &str) -> Option<Value> {
        self.0.fields.read().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.initialize_for(name)?;
        self.set_raw(name, value.into());
        Ok(())
    }

    pub fn unset(&self, name: &str) -> Result<()> {
        self.initialize_for(name)?;
        self.0.fields.write().remove(name);
        Ok(())
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.get(name)?.is_some())
    }

    /// Names of all set fields, declared and dynamic, in insertion order
    pub fn field_names(&self) -> Result<Vec<String>> {
        self.initialize()?;
        Ok(self.0.fields.read().names())
    }

    /// Write without triggering lazy initialization
    pub(crate) fn set_raw(&self, name: &str, value: Value) {
        self.0.fields.write().set(name, value);
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fields are not printed: graphs may be cyclic.
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
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_fields_roundtrip() {
        let obj = ObjectRef::new("App\\Person");
        assert_eq!(obj.get("name").unwrap(), None);

        obj.set("name", "Ada").unwrap();
        obj.set("age", 36).unwrap();
        assert_eq!(obj.get("name").unwrap(), Some(Value::from("Ada")));
        assert_eq!(obj.field_names().unwrap(), vec!["name", "age"]);

        obj.unset("name").unwrap();
        assert!(!obj.has("name").unwrap());
    }

    #[test]
    fn test_identity() {
        let a = ObjectRef::new("A");
        let b = ObjectRef::new("A");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_lazy_proxy_initializes_on_access() {
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        let proxy = ObjectRef::lazy(
            "App\\Book",
            vec!["id".to_string()],
            Box::new(move |this: &ObjectRef| {
                r.fetch_add(1, Ordering::SeqCst);
                this.set("title", "Dune")?;
                Ok(())
            }),
        );
        proxy.set("id", 7).unwrap();

        assert_eq!(proxy.get("id").unwrap(), Some(Value::from(7)));
        assert!(!proxy.is_initialized());

        assert_eq!(proxy.get("title").unwrap(), Some(Value::from("Dune")));
        assert!(proxy.is_initialized());
        proxy.get("title").unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_does_not_recurse() {
        let a = ObjectRef::new("Node");
        a.set("next", a.clone()).unwrap();
        assert!(format!("{:?}", a).starts_with("Node#"));
    }
}
