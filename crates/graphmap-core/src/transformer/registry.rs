//! Candidate selection
//!
//! For every requested target type, in the order requested, a declared
//! mapping matches when its source type is in the specificity family of the
//! value's type and its target type is in the family of the requested type.
//! Matches are ordered by
//!
//! 1. position of the requested target type,
//! 2. rank of the declared target in the requested type's family,
//! 3. rank of the declared source in the value type's family,
//! 4. non-variant before variant,
//! 5. registration order.
//!
//! A transformer appears at most once per requested target type. Candidate
//! lists are cached per `(source types, target types)` key.

use super::Transformer;
use crate::types::{display_types, Type, TypeMapping, TypeResolver};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A transformer selected for one requested target type
#[derive(Clone)]
pub struct Candidate {
    pub transformer: Arc<dyn Transformer>,
    /// The declared mapping that matched
    pub mapping: TypeMapping,
    /// The requested target type the mapping matched against
    pub target_type: Type,
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("transformer", &self.transformer.name())
            .field("mapping", &self.mapping)
            .field("target_type", &self.target_type)
            .finish()
    }
}

struct Declared {
    transformer: usize,
    mapping: TypeMapping,
}

/// Registered transformers and their declared mappings
pub struct TransformerRegistry {
    transformers: Vec<Arc<dyn Transformer>>,
    declared: Vec<Declared>,
    resolver: TypeResolver,
    cache: RwLock<HashMap<String, Arc<Vec<Candidate>>>>,
}

impl TransformerRegistry {
    /// Build a registry; registration order is the final tiebreaker
    pub fn new(transformers: Vec<Arc<dyn Transformer>>, resolver: TypeResolver) -> Self {
        let declared = transformers
            .iter()
            .enumerate()
            .flat_map(|(index, transformer)| {
                transformer
                    .declared_mappings()
                    .into_iter()
                    .map(move |mapping| Declared {
                        transformer: index,
                        mapping,
                    })
            })
            .collect();

        Self {
            transformers,
            declared,
            resolver,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn transformers(&self) -> &[Arc<dyn Transformer>] {
        &self.transformers
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Ordered candidates for converting a value of one of `source_types`
    /// into one of `target_types`
    pub fn find_candidates(&self, source_types: &[Type], target_types: &[Type]) -> Arc<Vec<Candidate>> {
        let key = format!("{}=>{}", display_types(source_types), display_types(target_types));
        if let Some(cached) = self.cache.read().get(&key) {
            return cached.clone();
        }

        let candidates = Arc::new(self.compute(source_types, target_types));
        log::debug!(
            "Dispatch {}: {} candidate(s) [{}]",
            key,
            candidates.len(),
            candidates
                .iter()
                .map(|c| c.transformer.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.cache.write().entry(key).or_insert(candidates).clone()
    }

    fn compute(&self, source_types: &[Type], target_types: &[Type]) -> Vec<Candidate> {
        let source_families: Vec<Vec<Type>> = source_types
            .iter()
            .map(|t| self.resolver.family(t))
            .collect();

        let mut ranked = Vec::new();
        for (target_index, target) in target_types.iter().enumerate() {
            let target_family = self.resolver.family(target);

            for (order, declared) in self.declared.iter().enumerate() {
                let mapping = &declared.mapping;
                if mapping.variant && !target.is_object() {
                    continue;
                }

                let declared_target = mapping.target.simple();
                let Some(target_rank) = target_family.iter().position(|t| *t == declared_target) else {
                    continue;
                };

                let declared_source = mapping.source.simple();
                let Some(source_rank) = source_families
                    .iter()
                    .filter_map(|family| family.iter().position(|t| *t == declared_source))
                    .min()
                else {
                    continue;
                };

                ranked.push((
                    (target_index, target_rank, source_rank, mapping.variant, order),
                    Candidate {
                        transformer: self.transformers[declared.transformer].clone(),
                        mapping: mapping.clone(),
                        target_type: target.clone(),
                    },
                    declared.transformer,
                ));
            }
        }

        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let mut seen = Vec::new();
        ranked
            .into_iter()
            .filter(|(rank, _, transformer)| {
                let key = (rank.0, *transformer);
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            })
            .map(|(_, candidate, _)| candidate)
            .collect()
    }

    /// Number of cached candidate lists
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field(
                "transformers",
                &self.transformers.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("cached", &self.cached_count())
            .finish()
    }
}
