//! The dispatch loop every value passes through
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::registry::TransformerRegistry;
use super::{TransformOutcome, TransformRequest, Transformer};
use crate::context::Context;
use crate::preset::PresetMapping;
use crate::trace::TraceOperation;
use crate::types::{display_types, Type, TypeResolver};
use crate::value::Value;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

struct Inner {
    registry: TransformerRegistry,
    resolver: TypeResolver,
}

/// Entry point for (re-)entering dispatch
///
/// Cheap to clone; lazy initializers keep a clone to map deferred values.
#[derive(Clone)]
pub struct MainTransformer {
    inner: Arc<Inner>,
}

impl MainTransformer {
    pub fn new(transformers: Vec<Arc<dyn Transformer>>, resolver: TypeResolver) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: TransformerRegistry::new(transformers, resolver.clone()),
                resolver,
            }),
        }
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.inner.registry
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.inner.resolver
    }

    /// Convert `source` into one of `target_types`
    ///
    /// 1. A value already produced for the same source and target type in
    ///    this call is returned as is.
    /// 2. A preset target for the source is used next.
    /// 3. Otherwise candidates are tried in order until one does not refuse.
    ///
    /// With no target types the existing target's type is used, or `mixed`.
    pub fn transform(
        &self,
        source: &Value,
        target: Option<&Value>,
        target_types: &[Type],
        ctx: &Context,
    ) -> Result<Value> {
        let ctx = ctx.ensure_call();
        let resolver = self.resolver();
        let target_types = self.requested_types(source, target, target_types);

        if source.has_identity() {
            if let Some(hit) = self.cached(source, &target_types, &ctx)? {
                return Ok(hit);
            }
        }

        let source_type = resolver.guess(source);
        let candidates = self
            .registry()
            .find_candidates(std::slice::from_ref(&source_type), &target_types);

        let source_name = source_type.to_string();
        for candidate in candidates.iter() {
            let request = TransformRequest {
                source,
                target,
                source_type: &source_type,
                target_type: &candidate.target_type,
            };
            let target_name = candidate.target_type.to_string();

            match candidate.transformer.transform(&request, &ctx, self)? {
                TransformOutcome::Transformed(value) => {
                    ctx.record(
                        TraceOperation::Transformed,
                        Some(&source_name),
                        Some(&target_name),
                        candidate.transformer.name(),
                    );
                    return Ok(value);
                }
                TransformOutcome::Refused(reason) => {
                    log::debug!(
                        "{} refused {} -> {} at '{}': {}",
                        candidate.transformer.name(),
                        source_name,
                        target_name,
                        ctx.path(),
                        reason
                    );
                    ctx.record(
                        TraceOperation::Refused,
                        Some(&source_name),
                        Some(&target_name),
                        format!("{}: {}", candidate.transformer.name(), reason),
                    );
                }
            }
        }

        Err(Error::CannotFindTransformer {
            source_type: source_name,
            target_type: display_types(&target_types),
            path: ctx.path(),
        })
    }

    fn requested_types(&self, source: &Value, target: Option<&Value>, target_types: &[Type]) -> Vec<Type> {
        let mut types = if !target_types.is_empty() {
            target_types.to_vec()
        } else if let Some(target) = target.filter(|t| !t.is_null()) {
            vec![self.resolver().guess(target)]
        } else {
            vec![Type::Mixed]
        };

        // A null source satisfies a nullable target as null
        if source.is_null() {
            if let Some(index) = types.iter().position(Type::is_null) {
                let null = types.remove(index);
                types.insert(0, null);
            }
        }
        types
    }

    fn cached(&self, source: &Value, target_types: &[Type], ctx: &Context) -> Result<Option<Value>> {
        let Some(call) = ctx.call_state() else {
            return Ok(None);
        };
        let path = ctx.path();
        let source_name = source.type_name();

        for target_type in target_types.iter().filter(|t| t.is_object()) {
            if let Some(hit) = call.get_target(source, target_type, &path)? {
                ctx.record(
                    TraceOperation::CacheHit,
                    Some(&source_name),
                    Some(&target_type.to_string()),
                    "",
                );
                return Ok(Some(hit));
            }
        }

        let Some(preset) = ctx.get::<PresetMapping>() else {
            return Ok(None);
        };
        for target_type in target_types.iter().filter(|t| t.is_object()) {
            let Some(class) = target_type.class() else {
                continue;
            };
            if let Some(found) = preset.find(source, class) {
                call.save_target(source, target_type, found.clone());
                ctx.record(
                    TraceOperation::PresetHit,
                    Some(&source_name),
                    Some(&target_type.to_string()),
                    "",
                );
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for MainTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainTransformer")
            .field("registry", &self.inner.registry)
            .finish()
    }
}
