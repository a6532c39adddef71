//! Null handling

use super::{MainTransformer, TransformOutcome, TransformRequest, Transformer};
use crate::context::Context;
use crate::types::{Type, TypeMapping};
use crate::value::Value;
use crate::Result;

/// Maps null to anything nullable, and anything to a `null` target
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransformer;

impl Transformer for NullTransformer {
    fn name(&self) -> &str {
        "NullTransformer"
    }

    fn declared_mappings(&self) -> Vec<TypeMapping> {
        vec![
            TypeMapping::new(Type::Null, Type::Mixed),
            TypeMapping::new(Type::Mixed, Type::Null),
        ]
    }

    fn transform(
        &self,
        _request: &TransformRequest<'_>,
        _ctx: &Context,
        _main: &MainTransformer,
    ) -> Result<TransformOutcome> {
        Ok(TransformOutcome::Transformed(Value::Null))
    }
}
