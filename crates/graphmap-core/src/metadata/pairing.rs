//! Source/target property pairing
//!
//! Properties pair name for name unless a map directive says otherwise.
//! Directives on either side may be scoped to one paired class; a scoped
//! directive outranks an unscoped one, and at equal scope the target side
//! wins.

use super::path::PropertyPath;
use super::property::{find_getter, read_mode, ReadMode};
use crate::reflection::{ClassDescriptor, MapDirective};
use crate::types::TypeResolver;

/// A target property and the source property it reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub target_property: String,
    pub source_property: Option<String>,
}

fn applies(directive: &MapDirective, paired_class: &str, resolver: &TypeResolver) -> bool {
    directive
        .class
        .as_deref()
        .map_or(true, |scope| resolver.is_subclass_of(paired_class, scope))
}

fn scoped_directive<'a>(
    directives: &'a [MapDirective],
    paired_class: &str,
    resolver: &TypeResolver,
) -> Option<&'a MapDirective> {
    directives
        .iter()
        .find(|d| d.class.is_some() && applies(d, paired_class, resolver))
}

fn unscoped_directive(directives: &[MapDirective]) -> Option<&MapDirective> {
    directives.iter().find(|d| d.class.is_none())
}

/// The directive a source property applies towards `target_class`, scoped first
fn source_directive<'a>(
    source: &'a ClassDescriptor,
    property: &str,
    target_class: &str,
    resolver: &TypeResolver,
) -> Option<(&'a MapDirective, bool)> {
    let directives = &source.property(property)?.map;
    scoped_directive(directives, target_class, resolver)
        .map(|d| (d, true))
        .or_else(|| unscoped_directive(directives).map(|d| (d, false)))
}

/// Names of the target's mappable properties: declared ones, then constructor-only parameters
pub fn target_property_names(target: &ClassDescriptor) -> Vec<String> {
    let mut names: Vec<String> = target.properties.iter().map(|p| p.name.clone()).collect();
    if let Some(constructor) = &target.constructor {
        for param in &constructor.params {
            if !names.contains(&param.name) {
                names.push(param.name.clone());
            }
        }
    }
    names
}

/// Pair every target property with its source property
///
/// Source-side directives naming a target path (`details.title`) produce
/// additional pairings whose target property is that path.
pub fn pair_properties(
    source: &ClassDescriptor,
    target: &ClassDescriptor,
    resolver: &TypeResolver,
) -> Vec<Pairing> {
    let source_names: Vec<&str> = source.properties.iter().map(|p| p.name.as_str()).collect();

    // Source properties whose directive sends them elsewhere
    let redirected: Vec<(&str, &MapDirective, bool)> = source_names
        .iter()
        .filter_map(|name| {
            source_directive(source, name, &target.name, resolver).map(|(d, scoped)| (*name, d, scoped))
        })
        .collect();

    let mut pairings = Vec::new();
    let target_names = target_property_names(target);

    for name in &target_names {
        let target_directives = target
            .property(name)
            .map(|p| p.map.as_slice())
            .unwrap_or(&[]);
        let from_source = |scoped: bool| {
            redirected
                .iter()
                .find(|(_, d, s)| *s == scoped && d.property == *name)
                .map(|(source_name, _, _)| source_name.to_string())
        };

        let paired = scoped_directive(target_directives, &source.name, resolver)
            .map(|d| d.property.clone())
            .or_else(|| from_source(true))
            .or_else(|| unscoped_directive(target_directives).map(|d| d.property.clone()))
            .or_else(|| from_source(false))
            .or_else(|| default_source(source, name, &redirected));

        pairings.push(Pairing {
            target_property: name.clone(),
            source_property: paired,
        });
    }

    for (source_name, directive, _) in &redirected {
        if PropertyPath::is_path(&directive.property) && !target_names.contains(&directive.property) {
            pairings.push(Pairing {
                target_property: directive.property.clone(),
                source_property: Some(source_name.to_string()),
            });
        }
    }

    pairings
}

fn default_source(
    source: &ClassDescriptor,
    name: &str,
    redirected: &[(&str, &MapDirective, bool)],
) -> Option<String> {
    if redirected.iter().any(|(source_name, _, _)| *source_name == name) {
        return None;
    }
    let readable = source.property(name).is_some() || find_getter(source, name).is_some();
    if readable || read_mode(source, name) == ReadMode::DynamicProperty {
        Some(name.to_string())
    } else {
        None
    }
}
