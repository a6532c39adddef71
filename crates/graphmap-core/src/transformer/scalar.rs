//! Scalar conversions
//!
//! Casts are lenient: booleans become `0`/`1`, numeric strings parse, floats
//! truncate towards zero, null becomes the zero value of the target kind.
//! A string that is not numeric is never turned into a number.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::{refuse, MainTransformer, TransformOutcome, TransformRequest, Transformer};
use crate::context::Context;
use crate::types::{ScalarKind, Type, TypeMapping};
use crate::value::Value;
use crate::Result;

const KINDS: [ScalarKind; 4] = [
    ScalarKind::Int,
    ScalarKind::Float,
    ScalarKind::String,
    ScalarKind::Bool,
];

/// Converts between scalar kinds, and from null to a scalar
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarToScalarTransformer;

impl Transformer for ScalarToScalarTransformer {
    fn name(&self) -> &str {
        "ScalarToScalarTransformer"
    }

    fn declared_mappings(&self) -> Vec<TypeMapping> {
        let sources = KINDS.iter().map(|k| Type::Scalar(*k)).chain([Type::Null]);
        sources
            .flat_map(|source| {
                KINDS
                    .iter()
                    .map(move |target| TypeMapping::new(source.clone(), Type::Scalar(*target)))
            })
            .collect()
    }

    fn transform(
        &self,
        request: &TransformRequest<'_>,
        _ctx: &Context,
        _main: &MainTransformer,
    ) -> Result<TransformOutcome> {
        let Some(kind) = request.target_type.scalar_kind() else {
            return refuse(format!("{} is not a scalar type", request.target_type));
        };
        match coerce_scalar(request.source, kind) {
            Some(value) => Ok(TransformOutcome::Transformed(value)),
            None => refuse(format!(
                "cannot cast {} to {}",
                request.source.type_name(),
                kind
            )),
        }
    }
}

/// Cast a null or scalar value to `kind`; `None` when no cast exists
pub fn coerce_scalar(value: &Value, kind: ScalarKind) -> Option<Value> {
    match kind {
        ScalarKind::Int => to_int(value).map(Value::Int),
        ScalarKind::Float => to_float(value).map(Value::Float),
        ScalarKind::String => to_string(value).map(Value::String),
        ScalarKind::Bool => to_bool(value).map(Value::Bool),
    }
}

fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Null => Some(0),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Int(i) => Some(*i),
        Value::Float(x) if x.is_finite() => Some(x.trunc() as i64),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|x| x.is_finite()).map(|x| x.trunc() as i64))
        }
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Int(i) => Some(i.to_string()),
        // Integral floats render without a fractional part
        Value::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => Some(format!("{}", *x as i64)),
        Value::Float(x) => Some(x.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::Float(x) => Some(*x != 0.0),
        Value::String(s) => Some(!(s.is_empty() || s == "0")),
        _ => None,
    }
}
