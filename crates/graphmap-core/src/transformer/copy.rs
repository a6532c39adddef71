//! Pass-through for untyped targets and values that already conform

use super::{refuse, MainTransformer, TransformOutcome, TransformRequest, Transformer};
use crate::context::Context;
use crate::types::{Type, TypeMapping};
use crate::Result;

/// Returns the source unchanged; objects keep their identity
///
/// Values that are not instances of the requested type are refused, so a
/// string never passes for an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyTransformer;

impl Transformer for CopyTransformer {
    fn name(&self) -> &str {
        "CopyTransformer"
    }

    fn declared_mappings(&self) -> Vec<TypeMapping> {
        vec![TypeMapping::new(Type::Mixed, Type::Mixed)]
    }

    fn transform(
        &self,
        request: &TransformRequest<'_>,
        _ctx: &Context,
        main: &MainTransformer,
    ) -> Result<TransformOutcome> {
        if !main.resolver().is_instance(request.source, request.target_type) {
            return refuse(format!(
                "{} is not an instance of {}",
                request.source_type, request.target_type
            ));
        }
        Ok(TransformOutcome::Transformed(request.source.clone()))
    }
}
