//! Property reads and writes through the accessor a plan selected

use crate::context::Context;
use crate::metadata::property::{find_setter, read_mode};
use crate::metadata::{PathSegment, PropertyPath, ReadMode, WriteMode};
use crate::reflection::{ClassDescriptor, ClassProvider, Visibility};
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};
use std::sync::Arc;

/// Reads and writes properties of live objects
#[derive(Clone)]
pub struct PropertyAccessor {
    provider: Arc<dyn ClassProvider>,
}

impl PropertyAccessor {
    pub fn new(provider: Arc<dyn ClassProvider>) -> Self {
        Self { provider }
    }

    fn describe(&self, object: &ObjectRef) -> Option<Arc<ClassDescriptor>> {
        self.provider.describe(object.class())
    }

    /// Call a method of `object` on behalf of `property`
    pub fn invoke(
        &self,
        object: &ObjectRef,
        method: &str,
        args: &[Value],
        property: &str,
        ctx: &Context,
    ) -> Result<Value> {
        let descriptor = self.describe(object).ok_or_else(|| Error::UnknownClass {
            class: object.class().to_string(),
        })?;
        let Some(method) = descriptor.method(method) else {
            return Err(Error::property_access(
                property,
                ctx.path(),
                anyhow::anyhow!("{}::{} does not exist", object.class(), method),
            ));
        };
        method
            .invoke(object, args)
            .map_err(|err| Error::property_access(property, ctx.path(), err))
    }

    /// Read `name` with `mode`; `None` when the value is unset or unreachable
    pub fn read(&self, object: &ObjectRef, mode: &ReadMode, name: &str, ctx: &Context) -> Result<Option<Value>> {
        match mode {
            ReadMode::None => Ok(None),
            ReadMode::Property | ReadMode::DynamicProperty => object.get(name),
            ReadMode::Getter(getter) => self.invoke(object, getter, &[], name, ctx).map(Some),
            ReadMode::PropertyPath(path) => self.read_path(object, path, ctx),
        }
    }

    /// Write `value` to `name` with `mode`
    ///
    /// Adder/remover pairs are handled by [`PropertyAccessor::add_remove`].
    pub fn write(&self, object: &ObjectRef, mode: &WriteMode, name: &str, value: Value, ctx: &Context) -> Result<()> {
        match mode {
            WriteMode::Property | WriteMode::DynamicProperty => object.set(name, value),
            WriteMode::Setter(setter) => self.invoke(object, setter, &[value], name, ctx).map(|_| ()),
            WriteMode::PropertyPath(path) => self.write_path(object, path, value, ctx),
            WriteMode::None | WriteMode::Constructor | WriteMode::AdderRemover { .. } => {
                Err(Error::PropertyUnwritable {
                    class: object.class().to_string(),
                    property: name.to_string(),
                    path: ctx.path(),
                })
            }
        }
    }

    /// Sync a collection property through its adder and remover
    ///
    /// Elements of `new` missing from `current` are added. With `allow_delete`,
    /// elements of `current` missing from `new` are removed.
    #[allow(clippy::too_many_arguments)]
    pub fn add_remove(
        &self,
        object: &ObjectRef,
        adder: &str,
        remover: &str,
        name: &str,
        current: Option<&Value>,
        new: &Value,
        allow_delete: bool,
        ctx: &Context,
    ) -> Result<()> {
        let new_values = elements(new, ctx)?;
        let current_values = match current {
            Some(current) => elements(current, ctx)?,
            None => Vec::new(),
        };

        for value in &new_values {
            if !current_values.contains(value) {
                self.invoke(object, adder, std::slice::from_ref(value), name, ctx)?;
            }
        }
        if allow_delete {
            for value in &current_values {
                if !new_values.contains(value) {
                    self.invoke(object, remover, std::slice::from_ref(value), name, ctx)?;
                }
            }
        }
        Ok(())
    }

    fn read_named(&self, object: &ObjectRef, name: &str, ctx: &Context) -> Result<Option<Value>> {
        let mode = match self.describe(object) {
            Some(descriptor) => read_mode(&descriptor, name),
            None => ReadMode::Property,
        };
        if mode == ReadMode::None {
            return Err(Error::property_access(
                name,
                ctx.path(),
                anyhow::anyhow!("{}::{} is not readable", object.class(), name),
            ));
        }
        self.read(object, &mode, name, ctx)
    }

    fn write_named(&self, object: &ObjectRef, name: &str, value: Value, ctx: &Context) -> Result<()> {
        let unwritable = || Error::PropertyUnwritable {
            class: object.class().to_string(),
            property: name.to_string(),
            path: ctx.path(),
        };
        let Some(descriptor) = self.describe(object) else {
            return object.set(name, value);
        };

        if let Some(setter) = find_setter(&descriptor, name) {
            return self.invoke(object, &setter, &[value], name, ctx).map(|_| ());
        }
        match descriptor.property(name) {
            Some(p) if p.visibility == Visibility::Public && !p.readonly && !descriptor.readonly => {
                object.set(name, value)
            }
            None if descriptor.allow_dynamic_properties && !descriptor.readonly => object.set(name, value),
            _ => Err(unwritable()),
        }
    }

    /// Follow `path` from `root`; `None` when any step is unset or null
    pub fn read_path(&self, root: &ObjectRef, path: &PropertyPath, ctx: &Context) -> Result<Option<Value>> {
        let mut current = Value::Object(root.clone());
        for segment in path.segments() {
            let next = match (segment, &current) {
                (_, Value::Null) => None,
                (PathSegment::Property(name), Value::Object(object)) => self.read_named(object, name, ctx)?,
                (PathSegment::Index(key), Value::Array(array)) => array.get(key).cloned(),
                (PathSegment::Index(key), Value::Collection(collection)) => collection.get(&key.to_value())?,
                (segment, other) => {
                    return Err(Error::invalid_argument(
                        format!("cannot follow {:?} of {} in '{}'", segment, other.type_name(), path),
                        ctx.path(),
                    ))
                }
            };
            match next {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Assign `value` at `path` below `root`
    ///
    /// Arrays along the way are copied and written back to their owner.
    pub fn write_path(&self, root: &ObjectRef, path: &PropertyPath, value: Value, ctx: &Context) -> Result<()> {
        self.assign(&Value::Object(root.clone()), path.segments(), value, path, ctx)
            .map(|_| ())
    }

    /// Returns the replacement for `container` when it has value semantics
    fn assign(
        &self,
        container: &Value,
        segments: &[PathSegment],
        value: Value,
        path: &PropertyPath,
        ctx: &Context,
    ) -> Result<Option<Value>> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(Some(value));
        };
        let unreachable = |what: &str| {
            Error::invalid_argument(format!("cannot write '{}': {}", path, what), ctx.path())
        };

        match (first, container) {
            (PathSegment::Property(name), Value::Object(object)) => {
                if rest.is_empty() {
                    self.write_named(object, name, value, ctx)?;
                    return Ok(None);
                }
                let child = self
                    .read_named(object, name, ctx)?
                    .filter(|v| !v.is_null())
                    .ok_or_else(|| unreachable(&format!("'{}' is unset", name)))?;
                if let Some(replacement) = self.assign(&child, rest, value, path, ctx)? {
                    self.write_named(object, name, replacement, ctx)?;
                }
                Ok(None)
            }
            (PathSegment::Index(key), Value::Collection(collection)) => {
                let key = key.to_value();
                if rest.is_empty() {
                    collection.insert(key, value)?;
                    return Ok(None);
                }
                let child = collection
                    .get(&key)?
                    .ok_or_else(|| unreachable("missing collection element"))?;
                if let Some(replacement) = self.assign(&child, rest, value, path, ctx)? {
                    collection.insert(key, replacement)?;
                }
                Ok(None)
            }
            (PathSegment::Index(key), Value::Array(array)) => {
                let mut array = array.clone();
                if rest.is_empty() {
                    array.insert(key.clone(), value);
                    return Ok(Some(Value::Array(array)));
                }
                let child = array
                    .get(key)
                    .cloned()
                    .ok_or_else(|| unreachable("missing array element"))?;
                match self.assign(&child, rest, value, path, ctx)? {
                    Some(replacement) => {
                        array.insert(key.clone(), replacement);
                        Ok(Some(Value::Array(array)))
                    }
                    None => Ok(None),
                }
            }
            (_, other) => Err(unreachable(&format!("unexpected {}", other.type_name()))),
        }
    }
}

/// Elements of an array or collection value; null has none
fn elements(value: &Value, ctx: &Context) -> Result<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(array) => Ok(array.values().cloned().collect()),
        Value::Collection(collection) => collection.values(),
        other => Err(Error::invalid_argument(
            format!("expected a collection, got {}", other.type_name()),
            ctx.path(),
        )),
    }
}
