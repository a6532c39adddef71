//! Tests for object-to-object plans

use super::*;
use crate::reflection::{ClassBuilder, ClassRegistry};
use crate::types::{ScalarKind, Type, TypeResolver};
use crate::Error;
use std::sync::Arc;

fn setup() -> (Arc<ClassRegistry>, ObjectToObjectMetadataFactory) {
    let registry = Arc::new(ClassRegistry::new());
    let classes = Arc::new(ClassMetadataFactory::new(TypeResolver::new(registry.clone())));
    (registry, ObjectToObjectMetadataFactory::new(classes))
}

fn define_books(registry: &ClassRegistry) {
    registry
        .define(ClassBuilder::new("Author").field("name", "string"))
        .unwrap();
    registry
        .define(
            ClassBuilder::new("Book")
                .field("id", "int")
                .field("title", "string")
                .field("author", "Author")
                .field("isbn", "string")
                .field("chapters", "list<string>"),
        )
        .unwrap();
    registry
        .define(ClassBuilder::new("Details").field("isbn", "?string"))
        .unwrap();
    registry
        .define(
            ClassBuilder::new("BookDto")
                .field_with("id", "int", |p| p.readonly().eager())
                .param("id", "int")
                .encapsulated("title", "?string")
                .field_with("authorName", "string", |p| p.map("author.name"))
                .field_with("chapters", "list<string>", |p| p.private().allow_delete())
                .adder_remover("chapters")
                .field("details", "Details")
                .field("pages", "int"),
        )
        .unwrap();
}

#[test]
fn test_plan_partitions() {
    let (registry, factory) = setup();
    define_books(&registry);
    let plan = factory.get("Book", "BookDto").unwrap();

    let constructor: Vec<_> = plan.constructor_properties().map(|p| p.target_property.as_str()).collect();
    assert_eq!(constructor, vec!["id"]);
    assert_eq!(plan.property("id").unwrap().target_write, WriteMode::Constructor);

    // id is eager but written only through the constructor
    assert_eq!(plan.eager_properties().count(), 0);
    assert_eq!(plan.eager_names(), vec!["id".to_string()]);

    let lazy: Vec<_> = plan.lazy_properties().map(|p| p.target_property.as_str()).collect();
    // details and pages have no source and are left alone
    assert_eq!(lazy, vec!["title", "authorName", "chapters"]);
    assert!(plan.target.lazy_capable);
}

#[test]
fn test_property_details() {
    let (registry, factory) = setup();
    define_books(&registry);
    let plan = factory.get("Book", "BookDto").unwrap();

    let title = plan.property("title").unwrap();
    assert_eq!(title.target_write, WriteMode::Setter("setTitle".into()));
    assert_eq!(title.target_read, ReadMode::Getter("getTitle".into()));
    assert_eq!(title.lone_scalar, Some(ScalarKind::String));
    assert!(title.nullable);

    let author_name = plan.property("authorName").unwrap();
    assert!(matches!(author_name.source_read, ReadMode::PropertyPath(_)));

    let chapters = plan.property("chapters").unwrap();
    assert!(matches!(chapters.target_write, WriteMode::AdderRemover { .. }));
    assert!(chapters.allow_delete);

    let pages = plan.property("pages").unwrap();
    assert_eq!(pages.source_property, None);
    assert!(!pages.has_source());
    assert!(!pages.nullable);

    let details = plan.property("details").unwrap();
    assert_eq!(details.target_types, vec![Type::object("Details")]);
}

#[test]
fn test_source_directive_to_target_path() {
    let (registry, factory) = setup();
    registry.define(ClassBuilder::new("Details").field("isbn", "?string")).unwrap();
    registry
        .define(ClassBuilder::new("Source").field_with("code", "string", |p| p.map("details.isbn")))
        .unwrap();
    registry
        .define(ClassBuilder::new("Target").field("details", "Details"))
        .unwrap();

    let plan = factory.get("Source", "Target").unwrap();
    let mapping = plan.property("details.isbn").unwrap();
    assert!(matches!(mapping.target_write, WriteMode::PropertyPath(_)));
    assert_eq!(mapping.source_property.as_deref(), Some("code"));
    assert_eq!(mapping.target_types, vec![Type::string(), Type::Null]);
}

#[test]
fn test_invalid_path_fails_at_build_time() {
    let (registry, factory) = setup();
    registry.define(ClassBuilder::new("Source").field("a", "int")).unwrap();
    registry
        .define(ClassBuilder::new("Target").field_with("x", "int", |p| p.map("a.b")))
        .unwrap();

    match factory.get("Source", "Target") {
        Err(Error::InvalidPropertyPath { class, property_path, .. }) => {
            assert_eq!(class, "Source");
            assert_eq!(property_path, "a.b");
        }
        other => panic!("expected invalid path, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_cache_and_invalidation() {
    let (registry, factory) = setup();
    define_books(&registry);

    let first = factory.get("Book", "BookDto").unwrap();
    assert!(Arc::ptr_eq(&first, &factory.get("Book", "BookDto").unwrap()));

    registry
        .define(
            ClassBuilder::new("Book")
                .field("title", "string")
                .field("author", "Author"),
        )
        .unwrap();
    let second = factory.get("Book", "BookDto").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.property("chapters").unwrap().source_property, None);
}

#[test]
fn test_warm() {
    let (registry, factory) = setup();
    define_books(&registry);
    let count = factory
        .warm([("Book", "BookDto"), ("Author", "Author")])
        .unwrap();
    assert_eq!(count, 2);
    assert!(factory.warm([("Book", "Missing")]).is_err());
}

#[test]
fn test_concurrent_builds_share_one_plan() {
    let (registry, factory) = setup();
    define_books(&registry);
    let factory = Arc::new(factory);

    let plans: Vec<_> = (0..8)
        .map(|_| {
            let factory = factory.clone();
            std::thread::spawn(move || factory.get("Book", "BookDto").unwrap())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    for plan in &plans[1..] {
        assert!(Arc::ptr_eq(&plans[0], plan));
    }
}
