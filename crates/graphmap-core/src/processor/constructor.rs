//! Constructor argument assembly and instantiation
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::ObjectProcessor;
use crate::context::Context;
use crate::metadata::ObjectToObjectMetadata;
use crate::reflection::{ClassDescriptor, ConstructorParam};
use crate::trace::TraceOperation;
use crate::transformer::MainTransformer;
use crate::types::display_types;
use crate::value::{ObjectRef, Value};
use crate::{Error, Result};

impl ObjectProcessor {
    /// Arguments for the target constructor, in parameter order
    ///
    /// A parameter whose source value is unset takes its default. Every
    /// mandatory parameter without a value is reported in one error.
    pub(crate) fn constructor_arguments(
        &self,
        plan: &ObjectToObjectMetadata,
        source: &ObjectRef,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<Vec<(String, Value)>> {
        let mut args = Vec::with_capacity(plan.constructor_params.len());
        let mut unset = Vec::new();

        for param in &plan.constructor_params {
            let param_ctx = ctx.at_property(&param.name);
            let mapping = plan
                .property(&param.name)
                .filter(|m| m.constructor_argument);
            let value = match mapping {
                Some(mapping) => self.source_value(mapping, source, None, &param_ctx, main)?,
                None => None,
            };

            match (value, &param.default) {
                (Some(value), _) => args.push((param.name.clone(), value)),
                (None, Some(default)) => {
                    param_ctx.record(
                        TraceOperation::DefaultApplied,
                        None,
                        Some(&display_types(&param.types)),
                        format!("{:?}", default),
                    );
                    args.push((param.name.clone(), default.clone()));
                }
                (None, None) => unset.push(self.responsible_source(plan, param)),
            }
        }

        if unset.is_empty() {
            Ok(args)
        } else {
            Err(self.unset_arguments(plan, unset, ctx))
        }
    }

    /// Fail before creating a proxy when a mandatory argument has no source value
    pub(crate) fn check_mandatory_arguments(
        &self,
        plan: &ObjectToObjectMetadata,
        source: &ObjectRef,
        ctx: &Context,
    ) -> Result<()> {
        let mut unset = Vec::new();
        for param in plan.constructor_params.iter().filter(|p| !p.is_optional()) {
            let present = match plan.property(&param.name).filter(|m| m.constructor_argument) {
                Some(mapping) if mapping.mapper.is_some() => true,
                Some(mapping) => self
                    .read_source(mapping, source, &ctx.at_property(&param.name))?
                    .is_some(),
                None => false,
            };
            if !present {
                unset.push(self.responsible_source(plan, param));
            }
        }

        if unset.is_empty() {
            Ok(())
        } else {
            Err(self.unset_arguments(plan, unset, ctx))
        }
    }

    fn responsible_source(&self, plan: &ObjectToObjectMetadata, param: &ConstructorParam) -> String {
        plan.property(&param.name)
            .and_then(|m| m.source_property.clone())
            .unwrap_or_else(|| param.name.clone())
    }

    fn unset_arguments(&self, plan: &ObjectToObjectMetadata, unset: Vec<String>, ctx: &Context) -> Error {
        Error::InstantiationFailure {
            class: plan.target_class().to_string(),
            message: format!(
                "no value for mandatory constructor argument(s) from source {}: {}",
                plan.source_class(),
                unset.join(", ")
            ),
            unset_source_properties: unset,
            path: ctx.path(),
        }
    }

    /// Declared defaults, and null for nullable properties without one
    fn default_fields(&self, descriptor: &ClassDescriptor) -> Vec<(String, Value)> {
        descriptor
            .properties
            .iter()
            .filter_map(|p| match &p.default {
                Some(default) => Some((p.name.clone(), default.clone())),
                None if p.is_nullable() => Some((p.name.clone(), Value::Null)),
                None => None,
            })
            .collect()
    }

    /// Fields produced by the constructor from `args`
    fn construct(
        &self,
        descriptor: &ClassDescriptor,
        args: Vec<(String, Value)>,
        ctx: &Context,
    ) -> Result<Vec<(String, Value)>> {
        match &descriptor.constructor {
            Some(constructor) => constructor.invoke(&args).map_err(|err| Error::InstantiationFailure {
                class: descriptor.name.clone(),
                message: err.to_string(),
                unset_source_properties: Vec::new(),
                path: ctx.path(),
            }),
            None => Ok(args),
        }
    }

    /// Create a fully initialized target instance
    pub(crate) fn instantiate(
        &self,
        plan: &ObjectToObjectMetadata,
        args: Vec<(String, Value)>,
        ctx: &Context,
    ) -> Result<ObjectRef> {
        let descriptor = self.describe(plan.target_class())?;
        let constructed = self.construct(&descriptor, args, ctx)?;
        // Later entries win
        let fields = self.default_fields(&descriptor).into_iter().chain(constructed);
        Ok(ObjectRef::with_fields(plan.target_class(), fields))
    }

    /// Run the constructor inside a proxy's initializer
    ///
    /// Fields written eagerly before initialization keep their values unless
    /// the constructor itself produces them.
    pub(crate) fn initialize_proxy(
        &self,
        proxy: &ObjectRef,
        plan: &ObjectToObjectMetadata,
        args: Vec<(String, Value)>,
        ctx: &Context,
    ) -> Result<()> {
        let descriptor = self.describe(plan.target_class())?;
        let constructed = self.construct(&descriptor, args, ctx)?;
        for (name, value) in self.default_fields(&descriptor) {
            if proxy.peek(&name).is_none() {
                proxy.set_raw(&name, value);
            }
        }
        for (name, value) in constructed {
            proxy.set_raw(&name, value);
        }
        Ok(())
    }
}
