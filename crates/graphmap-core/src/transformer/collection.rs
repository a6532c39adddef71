//! Array and collection mapping
//!
//! Elements are mapped one by one through the main transformer into the
//! target's declared element type, which must be known. Keys follow these
//! rules:
//!
//! - integer and string keys are kept, except that a string key is dropped
//!   (the element is appended) when the target key type is strictly `int`;
//! - any other key is itself mapped into the declared key type, and rejected
//!   when there is none.
//!
//! When an existing target collection is populated, new entries are merged
//! into it. Under [`CollectionPolicy::allow_delete`] the target's entries are
//! replaced by exactly the newly computed ones, and integer-keyed results are
//! renumbered.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::{refuse, MainTransformer, TransformOutcome, TransformRequest, Transformer};
use crate::context::Context;
use crate::trace::TraceOperation;
use crate::types::{builtin, ScalarKind, Type, TypeMapping};
use crate::value::{Array, ArrayKey, CollectionRef, Value};
use crate::{Error, Result};

/// Collection write policy of the property currently being mapped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionPolicy {
    pub allow_delete: bool,
}

/// Maps arrays and traversables into arrays and array-accessible objects
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversableToArrayAccessTransformer;

impl Transformer for TraversableToArrayAccessTransformer {
    fn name(&self) -> &str {
        "TraversableToArrayAccessTransformer"
    }

    fn declared_mappings(&self) -> Vec<TypeMapping> {
        iterable_sources()
            .into_iter()
            .flat_map(|source| {
                [Type::array(), Type::object(builtin::ARRAY_ACCESS)]
                    .into_iter()
                    .map(move |target| TypeMapping::new(source.clone(), target))
            })
            .collect()
    }

    fn transform(
        &self,
        request: &TransformRequest<'_>,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<TransformOutcome> {
        map_iterable(request, ctx, main, false)
    }
}

/// Maps arrays and traversables into traversable objects
///
/// Interface targets become lazy views when lazy loading is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraversableToTraversableTransformer;

impl Transformer for TraversableToTraversableTransformer {
    fn name(&self) -> &str {
        "TraversableToTraversableTransformer"
    }

    fn declared_mappings(&self) -> Vec<TypeMapping> {
        iterable_sources()
            .into_iter()
            .map(|source| TypeMapping::new(source, Type::object(builtin::TRAVERSABLE)))
            .collect()
    }

    fn transform(
        &self,
        request: &TransformRequest<'_>,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<TransformOutcome> {
        map_iterable(request, ctx, main, true)
    }
}

fn iterable_sources() -> Vec<Type> {
    vec![Type::array(), Type::object(builtin::TRAVERSABLE)]
}

fn source_entries(source: &Value) -> Result<Option<Vec<(Value, Value)>>> {
    Ok(match source {
        Value::Array(array) => Some(
            array
                .iter()
                .map(|(key, value)| (key.to_value(), value.clone()))
                .collect(),
        ),
        Value::Collection(collection) => Some(collection.entries()?),
        _ => None,
    })
}

fn key_label(key: &Value) -> String {
    match key {
        Value::Int(i) => i.to_string(),
        Value::String(s) => s.clone(),
        other => other.type_name(),
    }
}

/// Everything needed to map one source entry into the target
struct ElementMapper<'a> {
    key_types: &'a [Type],
    value_types: &'a [Type],
    ctx: &'a Context,
    main: &'a MainTransformer,
}

impl ElementMapper<'_> {
    /// Target key for `key`; `None` appends the element positionally
    fn key(&self, key: &Value) -> Result<Option<Value>> {
        match key {
            Value::Int(_) => Ok(Some(key.clone())),
            Value::String(_) => {
                let int_only = !self.key_types.is_empty()
                    && self
                        .key_types
                        .iter()
                        .all(|t| t.scalar_kind() == Some(ScalarKind::Int));
                Ok((!int_only).then(|| key.clone()))
            }
            _ if self.key_types.is_empty() => Err(Error::invalid_argument(
                format!(
                    "key of type {} requires a declared target key type",
                    key.type_name()
                ),
                self.ctx.path(),
            )),
            _ => self
                .main
                .transform(key, None, self.key_types, &self.ctx.at_index(key_label(key)))
                .map(Some),
        }
    }

    fn map<F>(&self, entries: Vec<(Value, Value)>, existing: F) -> Result<Vec<(Option<Value>, Value)>>
    where
        F: Fn(&Value) -> Result<Option<Value>>,
    {
        let mut mapped = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let target_key = self.key(&key)?;
            let current = match &target_key {
                Some(k) => existing(k)?,
                None => None,
            };
            let element_ctx = self.ctx.at_index(key_label(&key));
            let element = self
                .main
                .transform(&value, current.as_ref(), self.value_types, &element_ctx)?;
            mapped.push((target_key, element));
        }
        Ok(mapped)
    }
}

fn array_key(key: &Value, ctx: &Context) -> Result<ArrayKey> {
    ArrayKey::from_value(key).ok_or_else(|| {
        Error::invalid_argument(
            format!("{} cannot be used as an array key", key.type_name()),
            ctx.path(),
        )
    })
}

/// Re-raise an append failure at the path being mapped
fn at_path(err: Error, ctx: &Context) -> Error {
    match err {
        Error::InvalidArgument { message, .. } => Error::invalid_argument(message, ctx.path()),
        other => other,
    }
}

fn write_array(base: Array, mapped: Vec<(Option<Value>, Value)>, replace: bool, ctx: &Context) -> Result<Array> {
    let mut array = if replace { Array::new() } else { base };
    for (key, value) in mapped {
        match key {
            Some(key) => array.insert(array_key(&key, ctx)?, value),
            None => array.push(value).map_err(|err| at_path(err, ctx))?,
        }
    }
    if replace && !array.is_list() && array.iter().all(|(k, _)| matches!(k, ArrayKey::Int(_))) {
        array = array.reindex();
    }
    Ok(array)
}

fn write_collection(
    collection: &CollectionRef,
    mapped: Vec<(Option<Value>, Value)>,
    replace: bool,
    ctx: &Context,
) -> Result<()> {
    if !replace {
        for (key, value) in mapped {
            match key {
                Some(key) => collection.insert(key, value)?,
                None => collection.push(value).map_err(|err| at_path(err, ctx))?,
            }
        }
        return Ok(());
    }

    let mut entries: Vec<(Value, Value)> = Vec::with_capacity(mapped.len());
    let mut next = Some(0i64);
    for (key, value) in mapped {
        let key = match (key, next) {
            (Some(key), _) => key,
            (None, Some(index)) => Value::Int(index),
            (None, None) => {
                return Err(Error::invalid_argument(
                    "cannot append: the next integer key is already occupied",
                    ctx.path(),
                ))
            }
        };
        if let (Value::Int(i), Some(index)) = (&key, next) {
            if *i >= index {
                next = i.checked_add(1);
            }
        }
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
    }
    if entries.iter().all(|(k, _)| matches!(k, Value::Int(_))) {
        entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, (_, v))| (Value::Int(i as i64), v))
            .collect();
    }
    collection.replace_entries(entries)
}

fn map_iterable(
    request: &TransformRequest<'_>,
    ctx: &Context,
    main: &MainTransformer,
    lazy_capable: bool,
) -> Result<TransformOutcome> {
    if !matches!(request.source, Value::Array(_) | Value::Collection(_)) {
        return refuse("source is not iterable");
    }

    let target_type = request.target_type;
    let resolver = main.resolver();
    if let Some(class) = target_type.class() {
        if !resolver.is_collection_class(class) {
            return refuse(format!("{} is not a collection class", class));
        }
    } else if !target_type.is_array() {
        return refuse(format!("{} is not iterable", target_type));
    }

    if target_type.value_types().is_empty() {
        return Err(Error::MissingElementTypeInformation {
            target_type: target_type.to_string(),
            path: ctx.path(),
        });
    }

    let options = ctx.options();
    let allow_delete = ctx.get::<CollectionPolicy>().is_some_and(|p| p.allow_delete);
    let element_ctx = ctx.without::<CollectionPolicy>();
    let existing = request.target.filter(|_| options.target_value_reading);
    let elements = ElementMapper {
        key_types: target_type.key_types(),
        value_types: target_type.value_types(),
        ctx: &element_ctx,
        main,
    };

    let Some(class) = target_type.class() else {
        let base = existing.and_then(Value::as_array).cloned().unwrap_or_default();
        let entries = source_entries(request.source)?.unwrap_or_default();
        let mapped = elements.map(entries, |key| {
            Ok(ArrayKey::from_value(key).and_then(|k| base.get(&k).cloned()))
        })?;
        return write_array(base, mapped, allow_delete, ctx)
            .map(|array| TransformOutcome::Transformed(Value::Array(array)));
    };

    let call = ctx.call_state().cloned();
    let remember = |target: &CollectionRef| {
        if let Some(call) = &call {
            if request.source.has_identity() {
                call.save_target(request.source, target_type, Value::Collection(target.clone()));
            }
        }
    };

    if let Some(existing) = existing
        .and_then(Value::as_collection)
        .filter(|c| resolver.is_subclass_of(c.class(), class))
    {
        remember(existing);
        let entries = source_entries(request.source)?.unwrap_or_default();
        let mapped = elements.map(entries, |key| existing.get(key))?;
        write_collection(existing, mapped, allow_delete, ctx)?;
        return Ok(TransformOutcome::Transformed(Value::Collection(existing.clone())));
    }

    let concrete = if resolver.is_instantiable(class) {
        class.to_string()
    } else if lazy_capable && options.lazy_loading && resolver.is_subclass_of(builtin::LAZY_ARRAY, class) {
        let collection = lazy_collection(request.source.clone(), target_type.clone(), element_ctx.clone(), main.clone());
        remember(&collection);
        ctx.record(
            TraceOperation::LazyProxy,
            Some(&request.source.type_name()),
            Some(&target_type.to_string()),
            builtin::LAZY_ARRAY,
        );
        return Ok(TransformOutcome::Transformed(Value::Collection(collection)));
    } else if resolver.is_subclass_of(builtin::ARRAY_COLLECTION, class) {
        builtin::ARRAY_COLLECTION.to_string()
    } else {
        return Err(Error::ClassNotInstantiable {
            class: class.to_string(),
            path: ctx.path(),
        });
    };

    let collection = CollectionRef::new(concrete);
    remember(&collection);
    let entries = source_entries(request.source)?.unwrap_or_default();
    let mapped = elements.map(entries, |_| Ok(None))?;
    write_collection(&collection, mapped, false, ctx)?;
    Ok(TransformOutcome::Transformed(Value::Collection(collection)))
}

/// A collection whose elements are read and mapped on first access
fn lazy_collection(source: Value, target_type: Type, ctx: Context, main: MainTransformer) -> CollectionRef {
    CollectionRef::lazy(
        builtin::LAZY_ARRAY,
        Box::new(move |this: &CollectionRef| {
            let elements = ElementMapper {
                key_types: target_type.key_types(),
                value_types: target_type.value_types(),
                ctx: &ctx,
                main: &main,
            };
            let entries = source_entries(&source)?.unwrap_or_default();
            for (key, value) in elements.map(entries, |_| Ok(None))? {
                match key {
                    Some(key) => this.insert_raw(key, value),
                    None => this.push_raw(value)?,
                }
            }
            Ok(())
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_array_merges_and_replaces() {
        let ctx = Context::new();
        let base = Array::from_values([Value::from("x"), Value::from("y"), Value::from("z")]);
        let mapped = vec![(Some(Value::Int(0)), Value::from("a")), (None, Value::from("b"))];

        let merged = write_array(base.clone(), mapped.clone(), false, &ctx).unwrap();
        assert_eq!(
            merged,
            Array::from_values(["a", "y", "z", "b"].map(Value::from))
        );

        let replaced = write_array(base, mapped, true, &ctx).unwrap();
        assert_eq!(replaced, Array::from_values(["a", "b"].map(Value::from)));
    }

    #[test]
    fn test_write_array_rejects_object_keys() {
        let ctx = Context::new();
        let key = Value::from(crate::value::ObjectRef::new("K"));
        let result = write_array(Array::new(), vec![(Some(key), Value::Null)], false, &ctx);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_append_after_max_int_key_reports_path() {
        let ctx = Context::new().at_property("tags");
        let base = Array::from_entries([(ArrayKey::Int(i64::MAX), Value::from("x"))]);
        let mapped = vec![(None, Value::from("y"))];

        match write_array(base, mapped.clone(), false, &ctx) {
            Err(Error::InvalidArgument { path, .. }) => assert_eq!(path, "tags"),
            other => panic!("expected invalid argument, got {:?}", other),
        }

        let collection = CollectionRef::new("ArrayCollection");
        let mapped_max = vec![(Some(Value::Int(i64::MAX)), Value::from("x")), (None, Value::from("y"))];
        let result = write_collection(&collection, mapped_max, true, &ctx);
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_write_collection_replace_renumbers() {
        let collection = CollectionRef::from_values("ArrayCollection", ["a", "b", "c"].map(Value::from));
        let mapped = vec![(Some(Value::Int(2)), Value::from("c")), (Some(Value::Int(0)), Value::from("a"))];
        write_collection(&collection, mapped, true, &Context::new()).unwrap();
        assert_eq!(
            collection.entries().unwrap(),
            vec![(Value::Int(0), Value::from("c")), (Value::Int(1), Value::from("a"))]
        );
    }
}
