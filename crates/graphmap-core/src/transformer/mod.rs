//! Transformer strategies and dispatch
//!
//! A [`Transformer`] declares the `(source type, target type)` pairs it can
//! convert and either converts a value or refuses it. Refusal is an ordinary
//! outcome, not an error: the [`MainTransformer`] simply moves on to the next
//! candidate the [`TransformerRegistry`] produced.
//!
//! # Examples
//!
//! ```
//! use graphmap_core::transformer::{FnTransformer, TransformOutcome};
//! use graphmap_core::types::{Type, TypeMapping};
//! use graphmap_core::Value;
//!
//! let upper = FnTransformer::new("upper", |request, _ctx, _main| {
//!     match request.source.as_str() {
//!         Some(s) => Ok(TransformOutcome::Transformed(Value::from(s.to_uppercase()))),
//!         None => Ok(TransformOutcome::Refused("not a string".into())),
//!     }
//! })
//! .mapping(TypeMapping::new(Type::string(), Type::string()));
//! ```
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

pub mod collection;
pub mod copy;
pub mod function;
pub mod main;
pub mod null;
pub mod object;
pub mod registry;
pub mod scalar;

#[cfg(test)]
mod tests;

use crate::context::Context;
use crate::processor::ObjectProcessor;
use crate::types::{Type, TypeMapping};
use crate::value::Value;
use crate::Result;
use std::sync::Arc;

pub use collection::{
    CollectionPolicy, TraversableToArrayAccessTransformer, TraversableToTraversableTransformer,
};
pub use copy::CopyTransformer;
pub use function::FnTransformer;
pub use main::MainTransformer;
pub use null::NullTransformer;
pub use object::ObjectToObjectTransformer;
pub use registry::{Candidate, TransformerRegistry};
pub use scalar::{coerce_scalar, ScalarToScalarTransformer};

/// Result of a single transformer invocation
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutcome {
    Transformed(Value),
    /// The transformer declines; dispatch continues with the next candidate
    Refused(String),
}

/// What a transformer is asked to convert
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    pub source: &'a Value,
    /// Existing target value to populate, when target value reading allows it
    pub target: Option<&'a Value>,
    pub source_type: &'a Type,
    /// The requested target type this candidate was selected for
    pub target_type: &'a Type,
}

/// A conversion strategy
pub trait Transformer: Send + Sync {
    /// Name used in logs and traces
    fn name(&self) -> &str;

    /// Type pairs this transformer accepts
    fn declared_mappings(&self) -> Vec<TypeMapping>;

    /// Convert `request.source`, or refuse
    ///
    /// Nested values are converted by re-entering `main`.
    fn transform(
        &self,
        request: &TransformRequest<'_>,
        ctx: &Context,
        main: &MainTransformer,
    ) -> Result<TransformOutcome>;
}

/// Helper for refusing with a formatted reason
pub(crate) fn refuse(reason: impl Into<String>) -> Result<TransformOutcome> {
    Ok(TransformOutcome::Refused(reason.into()))
}

/// Built-in transformers in registration order
pub fn builtin_transformers(processor: ObjectProcessor) -> Vec<Arc<dyn Transformer>> {
    vec![
        Arc::new(NullTransformer),
        Arc::new(ScalarToScalarTransformer),
        Arc::new(ObjectToObjectTransformer::new(processor)),
        Arc::new(TraversableToArrayAccessTransformer),
        Arc::new(TraversableToTraversableTransformer),
        Arc::new(CopyTransformer),
    ]
}
