//! Type expression parser
//!
//! A small recursive descent parser for type strings such as
//! `?App\Entity\Book`, `int|string`, `array<string, Book>` or
//! `Collection<int, Book>`.
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

use super::{builtin, Type, OBJECT};
use crate::{Error, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Type expression parser
pub struct TypeParser<'a> {
    /// Input string being parsed
    input: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current position in input
    position: usize,
}

impl<'a> TypeParser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(Self::error_at("Empty type expression", 0, input));
        }

        Ok(Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        })
    }

    /// Parse the whole input as a union of types
    pub fn parse(mut self) -> Result<Vec<Type>> {
        let types = self.parse_union()?;
        self.skip_whitespace();
        if let Some(ch) = self.current_char() {
            return Err(self.error(&format!("Unexpected character '{}'", ch)));
        }
        Ok(types)
    }

    fn parse_union(&mut self) -> Result<Vec<Type>> {
        let mut types = Vec::new();
        loop {
            for t in self.parse_atom()? {
                if !types.contains(&t) {
                    types.push(t);
                }
            }
            self.skip_whitespace();
            if self.current_char() == Some('|') {
                self.advance();
            } else {
                break;
            }
        }
        Ok(types)
    }

    fn parse_atom(&mut self) -> Result<Vec<Type>> {
        self.skip_whitespace();

        if self.current_char() == Some('?') {
            self.advance();
            let mut types = self.parse_atom()?;
            if !types.contains(&Type::Null) {
                types.push(Type::Null);
            }
            return Ok(types);
        }

        let name = self.parse_identifier()?;
        self.skip_whitespace();

        let params = if self.current_char() == Some('<') {
            self.advance();
            self.parse_generic_params()?
        } else {
            Vec::new()
        };

        self.build_type(&name, params).map(|t| vec![t])
    }

    /// Parse `K, V>` or `V>` after the opening bracket
    fn parse_generic_params(&mut self) -> Result<Vec<Vec<Type>>> {
        let mut params = vec![self.parse_union()?];
        self.skip_whitespace();

        if self.current_char() == Some(',') {
            self.advance();
            params.push(self.parse_union()?);
            self.skip_whitespace();
        }

        self.expect_char('>')?;
        Ok(params)
    }

    fn build_type(&self, name: &str, params: Vec<Vec<Type>>) -> Result<Type> {
        let (key, value) = match params.len() {
            0 => (Vec::new(), Vec::new()),
            1 => (Vec::new(), params.into_iter().next().unwrap_or_default()),
            _ => {
                let mut iter = params.into_iter();
                (iter.next().unwrap_or_default(), iter.next().unwrap_or_default())
            }
        };
        let has_params = !key.is_empty() || !value.is_empty();

        let scalar = match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Some(Type::int()),
            "float" | "double" => Some(Type::float()),
            "string" => Some(Type::string()),
            "bool" | "boolean" => Some(Type::bool()),
            "null" => Some(Type::Null),
            "mixed" => Some(Type::Mixed),
            _ => None,
        };

        if let Some(scalar) = scalar {
            if has_params {
                return Err(self.error(&format!("Type '{}' does not take parameters", name)));
            }
            return Ok(scalar);
        }

        match name.to_ascii_lowercase().as_str() {
            "array" => Ok(Type::Array { key, value }),
            "list" => {
                if !key.is_empty() {
                    return Err(self.error("list<> takes a single value type"));
                }
                Ok(Type::Array {
                    key: vec![Type::int()],
                    value,
                })
            }
            "iterable" => Ok(Type::Object {
                class: builtin::TRAVERSABLE.to_string(),
                key,
                value,
            }),
            "object" => Ok(Type::Object {
                class: OBJECT.to_string(),
                key,
                value,
            }),
            _ => Ok(Type::Object {
                class: name.trim_start_matches('\\').to_string(),
                key,
                value,
            }),
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '\\' {
                if identifier.is_empty() && ch.is_ascii_digit() {
                    break;
                }
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if identifier.is_empty() {
            let found = self
                .current_char()
                .map(|c| format!("'{}'", c))
                .unwrap_or_else(|| "end of input".to_string());
            return Err(self.error(&format!("Expected type name, found {}", found)));
        }

        Ok(identifier)
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        if self.current_char() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("Expected '{}'", expected)))
        }
    }

    fn current_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: &str) -> Error {
        Self::error_at(message, self.position, self.input)
    }

    fn error_at(message: &str, position: usize, input: &str) -> Error {
        Error::TypeSyntax {
            message: message.to_string(),
            position,
            input: input.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_and_nullable() {
        assert_eq!(Type::parse("int").unwrap(), vec![Type::int()]);
        assert_eq!(Type::parse("?string").unwrap(), vec![Type::string(), Type::Null]);
        assert_eq!(
            Type::parse("int | bool | null").unwrap(),
            vec![Type::int(), Type::bool(), Type::Null]
        );
    }

    #[test]
    fn test_classes_and_generics() {
        assert_eq!(
            Type::parse("\\App\\Dto\\BookDto").unwrap(),
            vec![Type::object("App\\Dto\\BookDto")]
        );
        assert_eq!(
            Type::parse("array<string, App\\Book>").unwrap(),
            vec![Type::array_of(Type::string(), Type::object("App\\Book"))]
        );
        assert_eq!(
            Type::parse("list<?Book>").unwrap(),
            vec![Type::Array {
                key: vec![Type::int()],
                value: vec![Type::object("Book"), Type::Null],
            }]
        );
        assert_eq!(
            Type::parse("iterable<Book>").unwrap(),
            vec![Type::Object {
                class: "Traversable".into(),
                key: vec![],
                value: vec![Type::object("Book")],
            }]
        );
    }

    #[test]
    fn test_syntax_errors_report_position() {
        match Type::parse("array<int, Book") {
            Err(Error::TypeSyntax { position, .. }) => assert_eq!(position, 15),
            other => panic!("expected syntax error, got {:?}", other),
        }
        assert!(Type::parse("").is_err());
        assert!(Type::parse("int<string>").is_err());
        assert!(Type::parse("Foo Bar").is_err());
    }
}
