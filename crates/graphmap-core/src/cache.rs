//! Per-call object cache
//!
//! Maps `(source identity, target type)` to the target produced for it. The
//! cache guarantees that a source object reached through several paths maps
//! to one target instance, and it is what breaks reference cycles: a target
//! is saved as soon as its identity exists, before its properties are
//! populated, so a property pointing back at the source finds it.
//!
//! Targets are held weakly: lazy proxy initializers keep the cache alive,
//! and the cache must not keep the proxies alive in turn. A target nobody
//! holds can no longer be observed, so its source may map to a new one.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use crate::types::Type;
use crate::value::{Value, WeakCollectionRef, WeakObjectRef};
use crate::{Error, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: usize,
    target_type: String,
}

#[derive(Debug)]
enum CacheEntry {
    /// Target is being built and has no identity yet
    ///
    /// The source handle is kept so its identity cannot be reused while the
    /// entry exists.
    Reserved { source: Value },
    Resolved { source: Value, target: CachedTarget },
}

#[derive(Debug)]
enum CachedTarget {
    Object(WeakObjectRef),
    Collection(WeakCollectionRef),
    Value(Value),
}

impl CachedTarget {
    fn new(target: Value) -> Self {
        match target {
            Value::Object(object) => CachedTarget::Object(object.downgrade()),
            Value::Collection(collection) => CachedTarget::Collection(collection.downgrade()),
            other => CachedTarget::Value(other),
        }
    }

    /// The target, unless it was dropped
    fn get(&self) -> Option<Value> {
        match self {
            CachedTarget::Object(object) => object.upgrade().map(Value::Object),
            CachedTarget::Collection(collection) => collection.upgrade().map(Value::Collection),
            CachedTarget::Value(value) => Some(value.clone()),
        }
    }
}

/// Memo of targets produced during one top-level mapping call
#[derive(Debug, Default)]
pub struct ObjectCache {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an entry for a target that cannot exist before its dependencies
    ///
    /// Values without identity are ignored.
    pub fn pre_cache(&mut self, source: &Value, target_type: &Type) {
        if let Some(key) = Self::key(source, target_type) {
            self.entries.entry(key).or_insert_with(|| CacheEntry::Reserved {
                source: source.clone(),
            });
        }
    }

    /// Record the target for `source`, creating or resolving the entry
    pub fn save_target(&mut self, source: &Value, target_type: &Type, target: Value) {
        if let Some(key) = Self::key(source, target_type) {
            self.entries.insert(
                key,
                CacheEntry::Resolved {
                    source: source.clone(),
                    target: CachedTarget::new(target),
                },
            );
        }
    }

    /// Look up the target for `source`
    ///
    /// Returns `Ok(None)` when nothing is cached, and `CircularReference` when
    /// the entry is reserved but its target has no identity yet.
    pub fn get_target(&self, source: &Value, target_type: &Type, path: &str) -> Result<Option<Value>> {
        let Some(key) = Self::key(source, target_type) else {
            return Ok(None);
        };

        match self.entries.get(&key) {
            None => Ok(None),
            Some(CacheEntry::Resolved { target, .. }) => Ok(target.get()),
            Some(CacheEntry::Reserved { .. }) => Err(Error::CircularReference {
                source_type: source.type_name(),
                target_type: target_type.to_string(),
                path: path.to_string(),
            }),
        }
    }

    /// Whether an entry (reserved or resolved) exists
    pub fn contains(&self, source: &Value, target_type: &Type) -> bool {
        Self::key(source, target_type).is_some_and(|key| self.entries.contains_key(&key))
    }

    /// Drop a reservation that will never be resolved
    pub fn release(&mut self, source: &Value, target_type: &Type) {
        if let Some(key) = Self::key(source, target_type) {
            if matches!(self.entries.get(&key), Some(CacheEntry::Reserved { .. })) {
                self.entries.remove(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All resolved `(source, target)` pairs
    pub fn resolved(&self) -> Vec<(Value, Value)> {
        self.entries
            .values()
            .filter_map(|entry| match entry {
                CacheEntry::Resolved { source, target } => Some((source.clone(), target.get()?)),
                CacheEntry::Reserved { .. } => None,
            })
            .collect()
    }

    fn key(source: &Value, target_type: &Type) -> Option<CacheKey> {
        Some(CacheKey {
            source: source.identity()?,
            target_type: target_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectRef;

    #[test]
    fn test_unseen_then_resolved() {
        let mut cache = ObjectCache::new();
        let source = Value::from(ObjectRef::new("Book"));
        let target = Value::from(ObjectRef::new("BookDto"));
        let t = Type::object("BookDto");

        assert_eq!(cache.get_target(&source, &t, "").unwrap(), None);
        cache.save_target(&source, &t, target.clone());
        assert_eq!(cache.get_target(&source, &t, "").unwrap(), Some(target));
        assert_eq!(cache.get_target(&source, &Type::object("Other"), "").unwrap(), None);
    }

    #[test]
    fn test_reserved_entry_is_circular() {
        let mut cache = ObjectCache::new();
        let source = Value::from(ObjectRef::new("Node"));
        let t = Type::object("NodeDto");

        cache.pre_cache(&source, &t);
        match cache.get_target(&source, &t, "next.next") {
            Err(Error::CircularReference { path, .. }) => assert_eq!(path, "next.next"),
            other => panic!("expected circular reference, got {:?}", other),
        }

        let target = Value::from(ObjectRef::new("NodeDto"));
        cache.save_target(&source, &t, target.clone());
        assert_eq!(cache.get_target(&source, &t, "").unwrap(), Some(target));
    }

    #[test]
    fn test_targets_are_not_kept_alive() {
        let mut cache = ObjectCache::new();
        let source = Value::from(ObjectRef::new("Book"));
        let t = Type::object("BookDto");
        let target = ObjectRef::new("BookDto");
        let weak = target.downgrade();

        cache.save_target(&source, &t, Value::from(target));
        assert!(weak.upgrade().is_none());
        assert_eq!(cache.get_target(&source, &t, "").unwrap(), None);
        assert!(cache.resolved().is_empty());
    }

    #[test]
    fn test_scalars_are_not_cached() {
        let mut cache = ObjectCache::new();
        cache.save_target(&Value::Int(1), &Type::int(), Value::Int(1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_release_only_drops_reservations() {
        let mut cache = ObjectCache::new();
        let source = Value::from(ObjectRef::new("A"));
        let t = Type::object("B");
        cache.pre_cache(&source, &t);
        cache.release(&source, &t);
        assert!(!cache.contains(&source, &t));

        cache.save_target(&source, &t, Value::from(ObjectRef::new("B")));
        cache.release(&source, &t);
        assert!(cache.contains(&source, &t));
    }
}
