//! Preset mappings
//!
//! A [`PresetMapping`] placed in the context tells the engine that a given
//! source object already has a target of some class. The main transformer
//! returns that target instead of building a new one, which lets a reverse
//! mapping (DTO back to entity) reuse the original objects.

use crate::value::Value;
use std::collections::HashMap;

/// `(source identity, target class)` to an existing target object
#[derive(Debug, Clone, Default)]
pub struct PresetMapping {
    // Both handles are held so identities stay valid while the preset lives
    entries: HashMap<(usize, String), (Value, Value)>,
}

impl PresetMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(source, target)` pairs; pairs without identity are ignored
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut preset = Self::new();
        for (source, target) in pairs {
            preset.insert(source, target);
        }
        preset
    }

    /// Register `target` as the mapping of `source` to the target's class
    pub fn insert(&mut self, source: Value, target: Value) {
        let (Some(id), Some(class)) = (source.identity(), class_of(&target)) else {
            return;
        };
        self.entries.insert((id, class), (source, target));
    }

    /// Existing target of class `target_class` for `source`
    pub fn find(&self, source: &Value, target_class: &str) -> Option<Value> {
        let id = source.identity()?;
        self.entries
            .get(&(id, target_class.to_string()))
            .map(|(_, target)| target.clone())
    }

    /// The inverse mapping: each target maps back to its source
    pub fn reverse(&self) -> Self {
        Self::from_pairs(
            self.entries
                .values()
                .map(|(source, target)| (target.clone(), source.clone())),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn class_of(value: &Value) -> Option<String> {
    match value {
        Value::Object(o) => Some(o.class().to_string()),
        Value::Collection(c) => Some(c.class().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectRef;

    #[test]
    fn test_find_by_identity_and_class() {
        let book = Value::from(ObjectRef::new("Book"));
        let dto = Value::from(ObjectRef::new("BookDto"));
        let preset = PresetMapping::from_pairs([(book.clone(), dto.clone())]);

        assert_eq!(preset.find(&book, "BookDto"), Some(dto));
        assert_eq!(preset.find(&book, "Other"), None);
        assert_eq!(preset.find(&Value::from(ObjectRef::new("Book")), "BookDto"), None);
    }

    #[test]
    fn test_reverse() {
        let book = Value::from(ObjectRef::new("Book"));
        let dto = Value::from(ObjectRef::new("BookDto"));
        let reversed = PresetMapping::from_pairs([(book.clone(), dto.clone())]).reverse();
        assert_eq!(reversed.find(&dto, "Book"), Some(book));
    }

    #[test]
    fn test_scalars_are_ignored() {
        let preset = PresetMapping::from_pairs([(Value::Int(1), Value::Int(2))]);
        assert!(preset.is_empty());
    }
}
