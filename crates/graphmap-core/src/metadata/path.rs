//! Nested property paths such as `author.books[0].title`

use crate::reflection::ClassProvider;
use crate::types::{builtin, Type};
use crate::value::ArrayKey;
use crate::{Error, Result};
use std::fmt;

/// One step of a property path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Property(String),
    Index(ArrayKey),
}

/// A parsed property path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// Whether `name` is a path rather than a plain property name
    pub fn is_path(name: &str) -> bool {
        name.contains('.') || name.contains('[')
    }

    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let mut segments = Vec::new();
        let mut chars = raw.chars().peekable();
        let mut current = String::new();
        let mut expect_name = true;

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if current.is_empty() && expect_name {
                        return Err("empty property name".to_string());
                    }
                    if !current.is_empty() {
                        segments.push(PathSegment::Property(std::mem::take(&mut current)));
                    }
                    expect_name = true;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Property(std::mem::take(&mut current)));
                    } else if segments.is_empty() {
                        return Err("path cannot start with an index".to_string());
                    }
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => key.push(c),
                            None => return Err("unterminated index".to_string()),
                        }
                    }
                    segments.push(PathSegment::Index(parse_key(&key)?));
                    expect_name = false;
                }
                c if c.is_alphanumeric() || c == '_' => {
                    current.push(c);
                    expect_name = false;
                }
                other => return Err(format!("unexpected character '{}'", other)),
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::Property(current));
        } else if expect_name {
            return Err("path ends without a property name".to_string());
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk the declared types of each segment starting at `class`
    ///
    /// Returns the declared types of the last segment. A segment whose
    /// owner has an unknown type, or that names a missing property, is an
    /// `InvalidPropertyPath` error.
    pub fn resolve(&self, class: &str, provider: &dyn ClassProvider) -> Result<Vec<Type>> {
        let mut current = vec![Type::object(class)];

        for (i, segment) in self.segments.iter().enumerate() {
            let candidates: Vec<&Type> = current.iter().filter(|t| !t.is_null()).collect();
            if candidates.is_empty() || candidates.iter().any(|t| t.is_mixed()) {
                return Err(self.error(class, format!("type of segment {} is unknown", i)));
            }

            current = match segment {
                PathSegment::Property(name) => {
                    let mut next = Vec::new();
                    for t in candidates {
                        let Some(owner) = t.class() else {
                            return Err(self.error(class, format!("'{}' is read from a non-object", name)));
                        };
                        let descriptor = provider
                            .describe(owner)
                            .ok_or_else(|| self.error(class, format!("unknown class '{}'", owner)))?;
                        match descriptor.property(name) {
                            Some(property) if property.types.is_empty() => next.push(Type::Mixed),
                            Some(property) => next.extend(property.types.iter().cloned()),
                            None if descriptor.allow_dynamic_properties => next.push(Type::Mixed),
                            None => {
                                return Err(self.error(
                                    class,
                                    format!("class '{}' has no property '{}'", owner, name),
                                ))
                            }
                        }
                    }
                    next
                }
                PathSegment::Index(key) => {
                    let mut next = Vec::new();
                    for t in candidates {
                        let indexable = t.is_array()
                            || t.class().is_some_and(|c| is_indexable(c, provider));
                        if !indexable || t.value_types().is_empty() {
                            return Err(self.error(
                                class,
                                format!("cannot index {} with [{}]", t, key),
                            ));
                        }
                        next.extend(t.value_types().iter().cloned());
                    }
                    next
                }
            };
        }

        Ok(current)
    }

    fn error(&self, class: &str, message: String) -> Error {
        Error::InvalidPropertyPath {
            class: class.to_string(),
            property_path: self.raw.clone(),
            message,
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_key(raw: &str) -> std::result::Result<ArrayKey, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty index".to_string());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(ArrayKey::Int(i));
    }
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    Ok(ArrayKey::String(unquoted.to_string()))
}

fn is_indexable(class: &str, provider: &dyn ClassProvider) -> bool {
    let mut pending = vec![class.to_string()];
    let mut seen = Vec::new();
    while let Some(name) = pending.pop() {
        if name == builtin::ARRAY_ACCESS || name == builtin::TRAVERSABLE {
            return true;
        }
        if seen.contains(&name) {
            continue;
        }
        if let Some(descriptor) = provider.describe(&name) {
            pending.extend(descriptor.parent.iter().cloned());
            pending.extend(descriptor.interfaces.iter().cloned());
        }
        seen.push(name);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{ClassBuilder, ClassRegistry};

    fn registry() -> ClassRegistry {
        let registry = ClassRegistry::new();
        registry
            .define(ClassBuilder::new("Chapter").field("title", "string"))
            .unwrap();
        registry
            .define(
                ClassBuilder::new("Book")
                    .field("chapters", "list<Chapter>")
                    .field("index", "Collection<string, Chapter>")
                    .field("notes", "array")
                    .field("extra", "mixed"),
            )
            .unwrap();
        registry
            .define(ClassBuilder::new("Author").field("book", "?Book"))
            .unwrap();
        registry
    }

    #[test]
    fn test_parse_segments() {
        let path = PropertyPath::parse("book.chapters[0].title").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Property("book".into()),
                PathSegment::Property("chapters".into()),
                PathSegment::Index(ArrayKey::Int(0)),
                PathSegment::Property("title".into()),
            ]
        );
        assert_eq!(
            PropertyPath::parse("index['intro']").unwrap().segments()[1],
            PathSegment::Index(ArrayKey::String("intro".into()))
        );
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse("a[0").is_err());
        assert!(PropertyPath::parse("a.").is_err());
        assert!(PropertyPath::parse("[0]").is_err());
    }

    #[test]
    fn test_resolve_walks_declared_types() {
        let registry = registry();
        let types = PropertyPath::parse("book.chapters[0].title")
            .unwrap()
            .resolve("Author", &registry)
            .unwrap();
        assert_eq!(types, vec![Type::string()]);

        let types = PropertyPath::parse("book.index[intro]")
            .unwrap()
            .resolve("Author", &registry)
            .unwrap();
        assert_eq!(types, vec![Type::object("Chapter")]);
    }

    #[test]
    fn test_unresolvable_segments_fail() {
        let registry = registry();
        for raw in ["book.missing", "book.notes[0]", "book.extra.deeper", "book.chapters.title"] {
            let result = PropertyPath::parse(raw).unwrap().resolve("Author", &registry);
            assert!(
                matches!(result, Err(Error::InvalidPropertyPath { .. })),
                "{} should not resolve",
                raw
            );
        }
    }
}
