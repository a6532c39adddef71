//! Object to object mapping
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::{refuse, MainTransformer, TransformOutcome, TransformRequest, Transformer};
use crate::context::Context;
use crate::processor::ObjectProcessor;
use crate::types::{Type, TypeMapping, OBJECT};
use crate::value::Value;
use crate::{Error, Result};

/// Maps objects onto classes, delegating the work to the [`ObjectProcessor`]
///
/// Abstract and interface targets are resolved to a concrete class through
/// the target's inheritance map, or to the source's own class when that is a
/// subclass of the target, and dispatch is re-entered with it. A target of
/// plain `object` means "the source's class".
#[derive(Debug, Clone)]
pub struct ObjectToObjectTransformer {
    processor: ObjectProcessor,
}

impl ObjectToObjectTransformer {
    pub fn new(processor: ObjectProcessor) -> Self {
        Self { processor }
    }
}

impl Transformer for ObjectToObjectTransformer {
    fn name(&self) -> &str {
        "ObjectToObjectTransformer"
    }

    fn declared_mappings(&self) -> Vec<TypeMapping> {
        vec![TypeMapping {
            source: Type::any_object(),
            target: Type::any_object(),
            variant: true,
        }]
    }

    fn transform(
        &self,
        request: &TransformRequest<'_>,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<TransformOutcome> {
        let Value::Object(source) = request.source else {
            return refuse("source is not an object");
        };
        let Some(class) = request.target_type.class() else {
            return refuse("target is not an object type");
        };
        let resolver = main.resolver();

        if class == OBJECT {
            let concrete = Type::object(source.class());
            return main
                .transform(request.source, request.target, &[concrete], ctx)
                .map(TransformOutcome::Transformed);
        }

        if resolver.is_collection_class(class) {
            return refuse(format!("{} is a collection class", class));
        }

        let Some(descriptor) = resolver.provider().describe(class) else {
            return Err(Error::ClassNotInstantiable {
                class: class.to_string(),
                path: ctx.path(),
            });
        };

        let populates_existing = ctx.options().target_value_reading
            && request
                .target
                .is_some_and(|target| target.as_object().is_some() && resolver.is_instance(target, request.target_type));

        if !descriptor.is_instantiable() && !populates_existing {
            let concrete = std::iter::once(source.class().to_string())
                .chain(resolver.ancestors(source.class()))
                .find_map(|candidate| descriptor.inheritance_target(&candidate).map(str::to_string))
                .or_else(|| {
                    (source.class() != class
                        && resolver.is_subclass_of(source.class(), class)
                        && resolver.is_instantiable(source.class()))
                    .then(|| source.class().to_string())
                });

            return match concrete {
                Some(concrete) => {
                    log::debug!("Resolved abstract target {} to {} at '{}'", class, concrete, ctx.path());
                    main.transform(request.source, request.target, &[Type::object(concrete)], ctx)
                        .map(TransformOutcome::Transformed)
                }
                None => Err(Error::ClassNotInstantiable {
                    class: class.to_string(),
                    path: ctx.path(),
                }),
            };
        }

        self.processor
            .process(source, request.target, request.target_type, ctx, main)
            .map(TransformOutcome::Transformed)
    }
}
