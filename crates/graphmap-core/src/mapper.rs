//! The mapper façade
//!
//! A [`Mapper`] bundles a class provider, the transformer chain and the
//! process-wide metadata caches. Each [`Mapper::map`] call gets its own object
//! cache, so identity is preserved within a call and never across calls.
//!
//! # Examples
//!
//! ```
//! use graphmap_core::{ClassBuilder, ClassRegistry, Context, MapTarget, Mapper, ObjectRef, Type, Value};
//! use std::sync::Arc;
//!
//! # fn main() -> graphmap_core::Result<()> {
//! let classes = Arc::new(ClassRegistry::new());
//! classes.define(ClassBuilder::new("Person").field("name", "string").field("age", "int"))?;
//! classes.define(ClassBuilder::new("PersonDto").field("name", "string").field("age", "?int"))?;
//!
//! let mapper = Mapper::builder().provider(classes).build()?;
//!
//! let person = ObjectRef::new("Person");
//! person.set("name", "Ada")?;
//!
//! let dto = mapper.map(&person.into(), MapTarget::from(Type::object("PersonDto")), &Context::new())?;
//! let dto = dto.as_object().expect("object");
//! assert_eq!(dto.get("name")?, Some(Value::from("Ada")));
//! assert_eq!(dto.get("age")?, Some(Value::Null));
//! # Ok(())
//! # }
//! ```
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use crate::config::{MapperConfig, MapperOptions};
use crate::context::Context;
use crate::metadata::{ClassMetadataFactory, ObjectToObjectMetadataFactory};
use crate::processor::ObjectProcessor;
use crate::reflection::{ClassProvider, ClassRegistry};
use crate::trace::TraceCollector;
use crate::transformer::{builtin_transformers, MainTransformer, Transformer};
use crate::types::{Type, TypeResolver};
use crate::value::Value;
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// What a value is mapped into
#[derive(Debug, Clone)]
pub enum MapTarget {
    /// A new value of one of these types (a union is tried in order)
    Types(Vec<Type>),
    /// An existing value to populate in place where possible
    Instance(Value),
}

impl From<Type> for MapTarget {
    fn from(t: Type) -> Self {
        MapTarget::Types(vec![t])
    }
}

impl From<Vec<Type>> for MapTarget {
    fn from(types: Vec<Type>) -> Self {
        MapTarget::Types(types)
    }
}

impl From<Value> for MapTarget {
    fn from(value: Value) -> Self {
        MapTarget::Instance(value)
    }
}

/// Builder for [`Mapper`]
#[derive(Default)]
pub struct MapperBuilder {
    provider: Option<Arc<dyn ClassProvider>>,
    transformers: Vec<Arc<dyn Transformer>>,
    options: MapperOptions,
    warm_up: Vec<(String, String)>,
}

impl MapperBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Class metadata source; a [`ClassRegistry`] with only the built-ins by default
    pub fn provider<P: ClassProvider + 'static>(mut self, provider: Arc<P>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Register a transformer ahead of the built-in ones
    ///
    /// User transformers are tried in the order they are added.
    pub fn with_transformer<T: Transformer + 'static>(mut self, transformer: T) -> Self {
        self.transformers.push(Arc::new(transformer));
        self
    }

    /// Default options of every call; a context may override them
    pub fn options(mut self, options: MapperOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply options and warm-up pairs from a configuration
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.options = config.options;
        self.warm_up
            .extend(config.warm_up.into_iter().map(|pair| (pair.source, pair.target)));
        self
    }

    /// Precompute the mapping plan of a class pair at build time
    pub fn warm_up(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.warm_up.push((source.into(), target.into()));
        self
    }

    pub fn build(self) -> Result<Mapper> {
        let provider: Arc<dyn ClassProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(ClassRegistry::new()),
        };
        let resolver = TypeResolver::new(provider);
        let classes = Arc::new(ClassMetadataFactory::new(resolver.clone()));
        let metadata = Arc::new(ObjectToObjectMetadataFactory::new(classes));

        let mut transformers = self.transformers;
        transformers.extend(builtin_transformers(ObjectProcessor::new(metadata.clone())));
        let main = MainTransformer::new(transformers, resolver);

        if !self.warm_up.is_empty() {
            let cached = metadata.warm(self.warm_up)?;
            log::debug!("Warmed {} mapping plan(s)", cached);
        }

        Ok(Mapper {
            main,
            metadata,
            options: self.options,
        })
    }
}

/// Maps object graphs between class hierarchies
#[derive(Clone)]
pub struct Mapper {
    main: MainTransformer,
    metadata: Arc<ObjectToObjectMetadataFactory>,
    options: MapperOptions,
}

impl Mapper {
    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    pub fn options(&self) -> MapperOptions {
        self.options
    }

    pub fn main_transformer(&self) -> &MainTransformer {
        &self.main
    }

    pub fn metadata(&self) -> &Arc<ObjectToObjectMetadataFactory> {
        &self.metadata
    }

    /// Map `source` into `target`
    ///
    /// Options in `ctx` take precedence over the mapper's defaults. When
    /// tracing is enabled and `ctx` carries no collector, one is created for
    /// the call and its report logged at debug level.
    pub fn map(&self, source: &Value, target: impl Into<MapTarget>, ctx: &Context) -> Result<Value> {
        let target = target.into();
        let span = tracing::debug_span!("graphmap.map", source = %source.type_name());
        let _enter = span.enter();

        let mut ctx = ctx.begin_call();
        if ctx.get::<MapperOptions>().is_none() {
            ctx = ctx.with_options(self.options);
        }
        let own_trace = ctx.options().trace && ctx.trace().is_none();
        if own_trace {
            ctx = ctx.with(TraceCollector::new());
        }

        let result = match &target {
            MapTarget::Types(types) => self.main.transform(source, None, types, &ctx),
            MapTarget::Instance(existing) => self.main.transform(source, Some(existing), &[], &ctx),
        };

        if let Err(err) = &result {
            tracing::debug!(error = %err, "mapping failed");
        }
        if own_trace {
            if let Some(trace) = ctx.trace() {
                trace.finish();
                log::debug!("{}", trace.report());
            }
        }
        result
    }

    /// Map `source` into the type named by `type_spec`, e.g. `list<BookDto>`
    pub fn map_to(&self, source: &Value, type_spec: &str) -> Result<Value> {
        let types = Type::parse(type_spec)?;
        self.map(source, MapTarget::Types(types), &Context::new())
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("options", &self.options)
            .field("main", &self.main)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WarmUpPair;
    use crate::reflection::ClassBuilder;

    #[test]
    fn test_builder_defaults() {
        let mapper = Mapper::builder().build().unwrap();
        assert_eq!(mapper.options(), MapperOptions::default());
        assert_eq!(
            mapper.map_to(&Value::from("7"), "int").unwrap(),
            Value::Int(7)
        );
    }

    #[test]
    fn test_config_warms_plans() {
        let classes = Arc::new(ClassRegistry::new());
        classes.define(ClassBuilder::new("A").field("x", "int")).unwrap();
        classes.define(ClassBuilder::new("B").field("x", "int")).unwrap();

        let config = MapperConfig {
            options: MapperOptions::default().lazy_loading(false),
            warm_up: vec![WarmUpPair {
                source: "A".into(),
                target: "B".into(),
            }],
        };
        let mapper = Mapper::builder().provider(classes).config(config).build().unwrap();
        assert_eq!(mapper.metadata().cached_count(), 1);
        assert!(!mapper.options().lazy_loading);
    }

    #[test]
    fn test_warm_up_unknown_class_fails_build() {
        let result = Mapper::builder().warm_up("Nope", "Missing").build();
        assert!(result.is_err());
    }
}
