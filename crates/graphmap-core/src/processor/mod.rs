//! Object processor
//!
//! Executes an [`ObjectToObjectMetadata`] plan for one source object:
//!
//! 1. an existing target is populated in place when target value reading
//!    allows it, otherwise a new instance is created;
//! 2. lazy-capable targets become proxies whose constructor call and lazy
//!    properties run on first access, other targets are built immediately;
//! 3. the target is registered in the object cache before any property is
//!    mapped, so cycles resolve to the half-built instance;
//! 4. dynamic properties are copied when both classes allow them;
//! 5. eager properties are applied right away, lazy ones now or inside the
//!    proxy initializer.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

pub mod access;
mod constructor;

pub use access::PropertyAccessor;

use crate::context::{CallState, Context};
use crate::metadata::{
    ObjectToObjectMetadata, ObjectToObjectMetadataFactory, PropertyMapping, ReadMode, WriteMode,
};
use crate::reflection::ClassDescriptor;
use crate::trace::TraceOperation;
use crate::transformer::collection::CollectionPolicy;
use crate::transformer::{coerce_scalar, MainTransformer};
use crate::types::{display_types, Type};
use crate::value::{Array, ObjectRef, Value};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Maps one object onto one target class
#[derive(Clone)]
pub struct ObjectProcessor {
    metadata: Arc<ObjectToObjectMetadataFactory>,
    accessor: PropertyAccessor,
}

impl ObjectProcessor {
    pub fn new(metadata: Arc<ObjectToObjectMetadataFactory>) -> Self {
        let provider = metadata.class_metadata().resolver().provider().clone();
        Self {
            metadata,
            accessor: PropertyAccessor::new(provider),
        }
    }

    pub fn metadata(&self) -> &Arc<ObjectToObjectMetadataFactory> {
        &self.metadata
    }

    pub fn accessor(&self) -> &PropertyAccessor {
        &self.accessor
    }

    fn describe(&self, class: &str) -> Result<Arc<ClassDescriptor>> {
        self.metadata
            .class_metadata()
            .resolver()
            .provider()
            .describe(class)
            .ok_or_else(|| Error::UnknownClass {
                class: class.to_string(),
            })
    }

    /// Map `source` onto `target_type`, populating `target` when allowed
    pub fn process(
        &self,
        source: &ObjectRef,
        target: Option<&Value>,
        target_type: &Type,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<Value> {
        let class = target_type.class().unwrap_or_else(|| source.class());
        let plan = self.metadata.get(source.class(), class)?;
        let options = ctx.options();
        let call = ctx.call_state().cloned().unwrap_or_default();
        let source_value = Value::Object(source.clone());

        if plan.target.value_object && source.class() == class {
            call.save_target(&source_value, target_type, source_value.clone());
            return Ok(source_value);
        }

        let resolver = main.resolver();
        let existing = target
            .and_then(Value::as_object)
            .filter(|t| {
                options.target_value_reading
                    && !plan.target.value_object
                    && resolver.is_subclass_of(t.class(), class)
            });
        if let Some(existing) = existing {
            call.save_target(&source_value, target_type, Value::Object(existing.clone()));
            self.copy_dynamic(&plan, source, existing, ctx, main)?;
            self.apply(&plan, plan.eager_properties().chain(plan.lazy_properties()), false, source, existing, ctx, main)?;
            return Ok(Value::Object(existing.clone()));
        }

        if !plan.target.instantiable {
            return Err(Error::ClassNotInstantiable {
                class: class.to_string(),
                path: ctx.path(),
            });
        }

        if options.lazy_loading && plan.target.lazy_capable && plan.has_lazy_properties() {
            return self.proxy(plan, source, target_type, ctx, main, &call);
        }

        // The target cannot be referenced until its constructor ran
        call.pre_cache(&source_value, target_type);
        let instance = match self
            .constructor_arguments(&plan, source, ctx, main)
            .and_then(|args| self.instantiate(&plan, args, ctx))
        {
            Ok(instance) => instance,
            Err(err) => {
                call.release(&source_value, target_type);
                return Err(err);
            }
        };
        call.save_target(&source_value, target_type, Value::Object(instance.clone()));

        self.copy_dynamic(&plan, source, &instance, ctx, main)?;
        self.apply(&plan, plan.eager_properties().chain(plan.lazy_properties()), true, source, &instance, ctx, main)?;
        Ok(Value::Object(instance))
    }

    fn proxy(
        &self,
        plan: Arc<ObjectToObjectMetadata>,
        source: &ObjectRef,
        target_type: &Type,
        ctx: &Context,
        main: &MainTransformer,
        call: &Arc<CallState>,
    ) -> Result<Value> {
        self.check_mandatory_arguments(&plan, source, ctx)?;

        let initializer = {
            let processor = self.clone();
            let plan = plan.clone();
            let source = source.clone();
            let ctx = ctx.clone();
            let main = main.clone();
            Box::new(move |this: &ObjectRef| -> Result<()> {
                log::debug!("Initializing lazy {} at '{}'", this.class(), ctx.path());
                let args = processor.constructor_arguments(&plan, &source, &ctx, &main)?;
                processor.initialize_proxy(this, &plan, args, &ctx)?;
                processor.copy_dynamic(&plan, &source, this, &ctx, &main)?;
                processor.apply(&plan, plan.lazy_properties(), true, &source, this, &ctx, &main)
            })
        };

        let proxy = ObjectRef::lazy(plan.target_class(), plan.eager_names(), initializer);
        call.save_target(&Value::Object(source.clone()), target_type, Value::Object(proxy.clone()));
        ctx.record(
            TraceOperation::LazyProxy,
            Some(source.class()),
            Some(plan.target_class()),
            plan.eager_names().join(","),
        );

        // Eager properties are readable without initializing, constructor-fed ones included
        let eager = plan.properties.iter().filter(|m| m.eager && m.has_source());
        for mapping in eager {
            if mapping.target_write == WriteMode::Constructor {
                let property_ctx = ctx.at_property(&mapping.target_property);
                if let Some(value) = self.source_value(mapping, source, None, &property_ctx, main)? {
                    proxy.set_raw(&mapping.target_property, value);
                }
            } else {
                self.apply(&plan, std::iter::once(mapping), false, source, &proxy, ctx, main)?;
            }
        }

        Ok(Value::Object(proxy))
    }

    /// Read the raw source value of a mapping; `None` when unset
    pub(crate) fn read_source(
        &self,
        mapping: &PropertyMapping,
        source: &ObjectRef,
        ctx: &Context,
    ) -> Result<Option<Value>> {
        let Some(name) = &mapping.source_property else {
            return Ok(None);
        };
        self.accessor.read(source, &mapping.source_read, name, ctx)
    }

    /// The target-ready value of a mapping; `None` when the source is unset
    pub(crate) fn source_value(
        &self,
        mapping: &PropertyMapping,
        source: &ObjectRef,
        current: Option<&Value>,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<Option<Value>> {
        if let Some(mapper) = &mapping.mapper {
            return mapper(source, ctx)
                .map(Some)
                .map_err(|err| Error::property_access(&mapping.target_property, ctx.path(), err));
        }

        let Some(raw) = self.read_source(mapping, source, ctx)? else {
            return Ok(None);
        };

        if ctx.options().scalar_short_circuit && (raw.is_null() || raw.is_scalar()) {
            if let Some(kind) = mapping.lone_scalar {
                let coerced = if raw.is_null() && mapping.nullable {
                    Some(Value::Null)
                } else {
                    coerce_scalar(&raw, kind)
                };
                if let Some(value) = coerced {
                    ctx.record(
                        TraceOperation::ShortCircuit,
                        Some(&raw.type_name()),
                        Some(&display_types(&mapping.target_types)),
                        "",
                    );
                    return Ok(Some(value));
                }
            }
        }

        main.transform(&raw, current, &mapping.target_types, ctx).map(Some)
    }

    /// Write each mapping's value into `target`
    ///
    /// With `constructed`, mappings already passed to the constructor are skipped.
    #[allow(clippy::too_many_arguments)]
    fn apply<'a, I>(
        &self,
        plan: &ObjectToObjectMetadata,
        mappings: I,
        constructed: bool,
        source: &ObjectRef,
        target: &ObjectRef,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<()>
    where
        I: Iterator<Item = &'a PropertyMapping>,
    {
        let reading = ctx.options().target_value_reading;

        for mapping in mappings {
            if constructed && mapping.constructor_argument {
                continue;
            }
            let property_ctx = ctx
                .at_property(&mapping.target_property)
                .with(CollectionPolicy {
                    allow_delete: mapping.allow_delete,
                });

            if !mapping.target_write.is_settable() {
                self.skip_unwritable(plan, mapping, &property_ctx);
                continue;
            }

            let adder = matches!(mapping.target_write, WriteMode::AdderRemover { .. });
            let current = match (&mapping.target_read, adder) {
                // The adder owns the field, so its raw value is the current collection
                (ReadMode::None, true) => target.get(&mapping.target_property)?,
                (mode, _) if reading || adder => {
                    self.accessor
                        .read(target, mode, &mapping.target_property, &property_ctx)?
                }
                _ => None,
            };
            let existing = if adder || !reading { None } else { current.as_ref() };

            let Some(value) = self.source_value(mapping, source, existing, &property_ctx, main)? else {
                continue;
            };

            let written = match &mapping.target_write {
                WriteMode::AdderRemover { adder, remover } => self.accessor.add_remove(
                    target,
                    adder,
                    remover,
                    &mapping.target_property,
                    current.as_ref(),
                    &value,
                    mapping.allow_delete,
                    &property_ctx,
                ),
                mode => self
                    .accessor
                    .write(target, mode, &mapping.target_property, value, &property_ctx),
            };

            match written {
                Err(Error::PropertyUnwritable { .. }) => self.skip_unwritable(plan, mapping, &property_ctx),
                other => other?,
            }
        }
        Ok(())
    }

    fn skip_unwritable(&self, plan: &ObjectToObjectMetadata, mapping: &PropertyMapping, ctx: &Context) {
        let err = Error::PropertyUnwritable {
            class: plan.target_class().to_string(),
            property: mapping.target_property.clone(),
            path: ctx.path(),
        };
        log::warn!("Skipping property: {}", err);
        ctx.record(
            TraceOperation::Skipped,
            Some(plan.source_class()),
            Some(plan.target_class()),
            err.to_string(),
        );
    }

    /// Copy undeclared fields when both classes allow dynamic properties
    fn copy_dynamic(
        &self,
        plan: &ObjectToObjectMetadata,
        source: &ObjectRef,
        target: &ObjectRef,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<()> {
        if !plan.source.dynamic_properties_readable || !plan.target.dynamic_properties_writable {
            return Ok(());
        }
        let source_descriptor = self.describe(source.class())?;

        for name in source.field_names()? {
            if source_descriptor.property(&name).is_some() || plan.property(&name).is_some() {
                continue;
            }
            let Some(value) = source.get(&name)? else {
                continue;
            };
            let value = Self::dynamic_value(value, &ctx.at_property(&name), main)?;
            target.set(&name, value)?;
        }
        Ok(())
    }

    /// Map the objects inside an undeclared field, keeping everything else as is
    fn dynamic_value(value: Value, ctx: &Context, main: &MainTransformer) -> Result<Value> {
        match value {
            Value::Array(array) => {
                let mut mapped = Array::new();
                for (key, element) in array {
                    let element_ctx = ctx.at_index(&key);
                    mapped.insert(key, Self::dynamic_value(element, &element_ctx, main)?);
                }
                Ok(Value::Array(mapped))
            }
            value if value.has_identity() => main.transform(&value, None, &[Type::any_object()], ctx),
            value => Ok(value),
        }
    }
}

impl fmt::Debug for ObjectProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProcessor")
            .field("cached_plans", &self.metadata.cached_count())
            .finish()
    }
}
