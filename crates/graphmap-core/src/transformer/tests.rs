//! Tests for candidate selection and the dispatch loop

use super::*;
use crate::error::ErrorKind;
use crate::Error;
use crate::metadata::{ClassMetadataFactory, ObjectToObjectMetadataFactory};
use crate::reflection::{ClassBuilder, ClassRegistry};
use crate::trace::{TraceCollector, TraceOperation};
use crate::types::TypeResolver;

fn resolver() -> TypeResolver {
    let registry = ClassRegistry::new();
    registry.define(ClassBuilder::new("Animal").abstract_class()).unwrap();
    registry.define(ClassBuilder::new("Dog").extends("Animal")).unwrap();
    TypeResolver::new(Arc::new(registry))
}

fn labelled(name: &'static str, source: Type, target: Type) -> Arc<dyn Transformer> {
    Arc::new(
        FnTransformer::new(name, move |_, _, _| Ok(TransformOutcome::Transformed(Value::from(name))))
            .mapping(TypeMapping::new(source, target)),
    )
}

fn with_builtins(resolver: TypeResolver) -> MainTransformer {
    let classes = Arc::new(ClassMetadataFactory::new(resolver.clone()));
    let metadata = Arc::new(ObjectToObjectMetadataFactory::new(classes));
    MainTransformer::new(builtin_transformers(ObjectProcessor::new(metadata)), resolver)
}

fn names(candidates: &[Candidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.transformer.name()).collect()
}

#[test]
fn test_most_specific_source_wins() {
    let registry = TransformerRegistry::new(
        vec![
            labelled("anything", Type::Mixed, Type::string()),
            labelled("animal", Type::object("Animal"), Type::string()),
            labelled("dog", Type::object("Dog"), Type::string()),
        ],
        resolver(),
    );

    let candidates = registry.find_candidates(&[Type::object("Dog")], &[Type::string()]);
    assert_eq!(names(&candidates), vec!["dog", "animal", "anything"]);
}

#[test]
fn test_target_specificity_before_source_specificity() {
    let registry = TransformerRegistry::new(
        vec![
            labelled("dog_to_mixed", Type::object("Dog"), Type::Mixed),
            labelled("any_to_string", Type::Mixed, Type::string()),
        ],
        resolver(),
    );

    let candidates = registry.find_candidates(&[Type::object("Dog")], &[Type::string()]);
    assert_eq!(names(&candidates), vec!["any_to_string", "dog_to_mixed"]);
}

#[test]
fn test_requested_order_is_primary() {
    let registry = TransformerRegistry::new(
        vec![
            labelled("to_int", Type::string(), Type::int()),
            labelled("to_bool", Type::string(), Type::bool()),
        ],
        resolver(),
    );

    let candidates = registry.find_candidates(&[Type::string()], &[Type::bool(), Type::int()]);
    assert_eq!(names(&candidates), vec!["to_bool", "to_int"]);
    assert_eq!(candidates[0].target_type, Type::bool());
}

#[test]
fn test_registration_order_breaks_ties() {
    let registry = TransformerRegistry::new(
        vec![
            labelled("first", Type::string(), Type::string()),
            labelled("second", Type::string(), Type::string()),
        ],
        resolver(),
    );

    let candidates = registry.find_candidates(&[Type::string()], &[Type::string()]);
    assert_eq!(names(&candidates), vec!["first", "second"]);
}

#[test]
fn test_variant_mapping_only_for_object_targets() {
    let variant: Arc<dyn Transformer> = Arc::new(
        FnTransformer::new("variant", |_, _, _| Ok(TransformOutcome::Refused("unused".into())))
            .mapping(TypeMapping::variant(Type::any_object(), Type::any_object()).unwrap()),
    );
    let registry = TransformerRegistry::new(vec![variant], resolver());

    assert!(registry
        .find_candidates(&[Type::object("Dog")], &[Type::Mixed])
        .is_empty());
    assert_eq!(
        names(&registry.find_candidates(&[Type::object("Dog")], &[Type::object("Animal")])),
        vec!["variant"]
    );
}

#[test]
fn test_candidates_are_cached_and_stable() {
    let registry = TransformerRegistry::new(
        vec![labelled("dog", Type::object("Dog"), Type::string())],
        resolver(),
    );

    let first = registry.find_candidates(&[Type::object("Dog")], &[Type::string()]);
    let second = registry.find_candidates(&[Type::object("Dog")], &[Type::string()]);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.cached_count(), 1);
}

#[test]
fn test_refusal_falls_through_to_next_candidate() {
    let refuser: Arc<dyn Transformer> = Arc::new(
        FnTransformer::new("refuser", |_, _, _| Ok(TransformOutcome::Refused("not today".into())))
            .mapping(TypeMapping::new(Type::string(), Type::string())),
    );
    let main = MainTransformer::new(
        vec![refuser, labelled("fallback", Type::string(), Type::string())],
        resolver(),
    );

    let ctx = Context::new().with(TraceCollector::new());
    let result = main
        .transform(&Value::from("x"), None, &[Type::string()], &ctx)
        .unwrap();
    assert_eq!(result, Value::from("fallback"));

    let summary = ctx.trace().unwrap().summary();
    assert_eq!(summary.count(TraceOperation::Refused), 1);
    assert_eq!(summary.count(TraceOperation::Transformed), 1);
}

#[test]
fn test_no_candidate_reports_path() {
    let main = MainTransformer::new(Vec::new(), resolver());
    let ctx = Context::new().at_property("orders").at_index(3);

    let err = main
        .transform(&Value::from(1), None, &[Type::string()], &ctx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CannotFindTransformer);
    match err {
        Error::CannotFindTransformer {
            source_type,
            target_type,
            path,
        } => {
            assert_eq!(source_type, "int");
            assert_eq!(target_type, "string");
            assert_eq!(path, "orders[3]");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_null_source_prefers_null_target() {
    let main = with_builtins(resolver());
    let nullable_int = Type::parse("?int").unwrap();

    let result = main
        .transform(&Value::Null, None, &nullable_int, &Context::new())
        .unwrap();
    assert_eq!(result, Value::Null);

    let result = main
        .transform(&Value::Null, None, &[Type::int()], &Context::new())
        .unwrap();
    assert_eq!(result, Value::Int(0));
}

#[test]
fn test_builtin_scalar_and_copy() {
    let main = with_builtins(resolver());

    let result = main
        .transform(&Value::from("42"), None, &[Type::int()], &Context::new())
        .unwrap();
    assert_eq!(result, Value::Int(42));

    let result = main
        .transform(&Value::from(1.5), None, &[], &Context::new())
        .unwrap();
    assert_eq!(result, Value::Float(1.5));
}

#[test]
fn test_user_transformer_takes_precedence() {
    let resolver = resolver();
    let classes = Arc::new(ClassMetadataFactory::new(resolver.clone()));
    let metadata = Arc::new(ObjectToObjectMetadataFactory::new(classes));
    let mut transformers = vec![labelled("custom", Type::string(), Type::int())];
    transformers.extend(builtin_transformers(ObjectProcessor::new(metadata)));
    let main = MainTransformer::new(transformers, resolver);

    let result = main
        .transform(&Value::from("42"), None, &[Type::int()], &Context::new())
        .unwrap();
    assert_eq!(result, Value::from("custom"));
}

#[test]
fn test_existing_target_type_is_used_without_requested_types() {
    let main = with_builtins(resolver());
    let result = main
        .transform(&Value::from("7"), Some(&Value::Int(1)), &[], &Context::new())
        .unwrap();
    assert_eq!(result, Value::Int(7));
}
