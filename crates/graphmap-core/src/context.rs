//! Mapping context
//!
//! The [`Context`] is threaded through every transformer call. It is an
//! immutable, copy-on-extend bag of typed values (options, preset mappings,
//! trace collectors, user data) plus the property path of the value being
//! mapped and the per-call state that owns the object cache.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use crate::cache::ObjectCache;
use crate::config::MapperOptions;
use crate::trace::{TraceCollector, TraceOperation};
use crate::types::Type;
use crate::value::Value;
use crate::Result;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// State owned by one top-level mapping call
///
/// Lazy proxies keep the state alive after the call returns so that their
/// initializers resolve references against the same cache.
#[derive(Debug, Default)]
pub struct CallState {
    cache: Mutex<ObjectCache>,
}

impl CallState {
    pub fn new() -> Self {
        Self::default()
    }

    // The lock is held only for the duration of each cache operation, never
    // across a nested transformation.

    pub fn get_target(&self, source: &Value, target_type: &Type, path: &str) -> Result<Option<Value>> {
        self.cache.lock().get_target(source, target_type, path)
    }

    pub fn pre_cache(&self, source: &Value, target_type: &Type) {
        self.cache.lock().pre_cache(source, target_type);
    }

    pub fn save_target(&self, source: &Value, target_type: &Type, target: Value) {
        self.cache.lock().save_target(source, target_type, target);
    }

    pub fn release(&self, source: &Value, target_type: &Type) {
        self.cache.lock().release(source, target_type);
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// All resolved `(source, target)` pairs so far
    pub fn resolved(&self) -> Vec<(Value, Value)> {
        self.cache.lock().resolved()
    }
}

enum Segment {
    Property(String),
    Index(String),
}

struct PathNode {
    parent: Option<Arc<PathNode>>,
    segment: Segment,
}

/// Immutable mapping context
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    path: Option<Arc<PathNode>>,
    call: Option<Arc<CallState>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this context that also holds `value`, replacing any value of the same type
    pub fn with<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            values: Arc::new(values),
            path: self.path.clone(),
            call: self.call.clone(),
        }
    }

    /// A copy of this context without the value of type `T`
    pub fn without<T: Any + Send + Sync>(&self) -> Self {
        let mut values = (*self.values).clone();
        values.remove(&TypeId::of::<T>());
        Self {
            values: Arc::new(values),
            path: self.path.clone(),
            call: self.call.clone(),
        }
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn with_options(&self, options: MapperOptions) -> Self {
        self.with(options)
    }

    /// Options of this call, or the defaults
    pub fn options(&self) -> MapperOptions {
        self.get::<MapperOptions>().copied().unwrap_or_default()
    }

    pub fn trace(&self) -> Option<&TraceCollector> {
        self.get::<TraceCollector>()
    }

    /// Record a trace entry at the current path when a collector is present
    pub fn record(
        &self,
        operation: TraceOperation,
        source_type: Option<&str>,
        target_type: Option<&str>,
        detail: impl Into<String>,
    ) {
        if let Some(trace) = self.trace() {
            trace.record(&self.path(), operation, source_type, target_type, detail);
        }
    }

    /// Descend into a named property
    pub fn at_property(&self, name: &str) -> Self {
        self.descend(Segment::Property(name.to_string()))
    }

    /// Descend into a collection element
    pub fn at_index(&self, key: impl fmt::Display) -> Self {
        self.descend(Segment::Index(key.to_string()))
    }

    /// Rendered property path, e.g. `orders[3].customer.address`; empty at the root
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut node = self.path.as_deref();
        while let Some(current) = node {
            segments.push(&current.segment);
            node = current.parent.as_deref();
        }

        let mut rendered = String::new();
        for segment in segments.into_iter().rev() {
            match segment {
                Segment::Property(name) => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(name);
                }
                Segment::Index(key) => {
                    rendered.push('[');
                    rendered.push_str(key);
                    rendered.push(']');
                }
            }
        }
        rendered
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.path.as_deref();
        while let Some(current) = node {
            depth += 1;
            node = current.parent.as_deref();
        }
        depth
    }

    /// State of the current top-level call
    pub fn call_state(&self) -> Option<&Arc<CallState>> {
        self.call.as_ref()
    }

    /// This context with a fresh call state and an empty path
    pub(crate) fn begin_call(&self) -> Self {
        Self {
            values: self.values.clone(),
            path: None,
            call: Some(Arc::new(CallState::new())),
        }
    }

    /// This context, with a call state created if none exists
    pub(crate) fn ensure_call(&self) -> Self {
        if self.call.is_some() {
            self.clone()
        } else {
            Self {
                values: self.values.clone(),
                path: self.path.clone(),
                call: Some(Arc::new(CallState::new())),
            }
        }
    }

    fn descend(&self, segment: Segment) -> Self {
        Self {
            values: self.values.clone(),
            path: Some(Arc::new(PathNode {
                parent: self.path.clone(),
                segment,
            })),
            call: self.call.clone(),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values.len())
            .field("path", &self.path())
            .field("in_call", &self.call.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Tenant(&'static str);

    #[test]
    fn test_copy_on_extend() {
        let base = Context::new();
        let extended = base.with(Tenant("acme"));

        assert!(base.get::<Tenant>().is_none());
        assert_eq!(extended.get::<Tenant>(), Some(&Tenant("acme")));
        assert_eq!(extended.with(Tenant("other")).get::<Tenant>(), Some(&Tenant("other")));
        assert!(extended.without::<Tenant>().get::<Tenant>().is_none());
    }

    #[test]
    fn test_options_default() {
        let ctx = Context::new();
        assert_eq!(ctx.options(), MapperOptions::default());
        let ctx = ctx.with_options(MapperOptions::default().lazy_loading(false));
        assert!(!ctx.options().lazy_loading);
    }

    #[test]
    fn test_path_rendering() {
        let ctx = Context::new();
        assert_eq!(ctx.path(), "");
        let ctx = ctx.at_property("orders").at_index(3).at_property("customer").at_property("address");
        assert_eq!(ctx.path(), "orders[3].customer.address");
        assert_eq!(ctx.depth(), 4);
        assert_eq!(Context::new().at_index("k").path(), "[k]");
    }

    #[test]
    fn test_call_state_is_shared_by_descendants() {
        let ctx = Context::new().begin_call();
        let child = ctx.at_property("a");
        assert!(Arc::ptr_eq(ctx.call_state().unwrap(), child.call_state().unwrap()));

        let other = ctx.begin_call();
        assert!(!Arc::ptr_eq(ctx.call_state().unwrap(), other.call_state().unwrap()));
        assert_eq!(ctx.ensure_call().call_state().map(Arc::as_ptr), ctx.call_state().map(Arc::as_ptr));
    }
}
