//! Closure-backed transformers

use super::{MainTransformer, TransformOutcome, TransformRequest, Transformer};
use crate::context::Context;
use crate::types::TypeMapping;
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// Signature of an [`FnTransformer`] body
pub type TransformFn = Arc<
    dyn Fn(&TransformRequest<'_>, &Context, &MainTransformer) -> Result<TransformOutcome>
        + Send
        + Sync,
>;

/// A transformer defined by a closure and a list of declared mappings
#[derive(Clone)]
pub struct FnTransformer {
    name: String,
    mappings: Vec<TypeMapping>,
    body: TransformFn,
}

impl FnTransformer {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TransformRequest<'_>, &Context, &MainTransformer) -> Result<TransformOutcome>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            mappings: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Declare a mapping this transformer accepts
    pub fn mapping(mut self, mapping: TypeMapping) -> Self {
        self.mappings.push(mapping);
        self
    }
}

impl Transformer for FnTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_mappings(&self) -> Vec<TypeMapping> {
        self.mappings.clone()
    }

    fn transform(
        &self,
        request: &TransformRequest<'_>,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<TransformOutcome> {
        (self.body)(request, ctx, main)
    }
}

impl fmt::Debug for FnTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer")
            .field("name", &self.name)
            .field("mappings", &self.mappings)
            .finish()
    }
}
