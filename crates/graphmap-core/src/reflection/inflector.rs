//! Accessor name inference helpers
//!
//! Collection properties are commonly exposed through singular adder and
//! remover methods (`books` → `addBook`/`removeBook`). These helpers produce
//! candidate singular forms; the caller keeps whichever candidate matches an
//! existing method.

use regex::Regex;
use std::sync::OnceLock;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?i)ies$", "y"),
            (r"(?i)(ss|x|ch|sh|zz)es$", "$1"),
            (r"(?i)ves$", "f"),
            (r"(?i)ves$", "fe"),
            (r"(?i)ses$", "se"),
            (r"(?i)ses$", "s"),
            (r"(?i)s$", ""),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|pattern| Rule { pattern, replacement })
        })
        .collect()
    })
}

const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("data", "datum"),
    ("criteria", "criterion"),
];

/// Candidate singular forms of `plural`, most likely first
pub fn singularize(plural: &str) -> Vec<String> {
    let lower = plural.to_ascii_lowercase();
    let mut candidates: Vec<String> = Vec::new();

    for (irregular, singular) in IRREGULAR {
        if lower.ends_with(irregular) {
            let stem = &plural[..plural.len() - irregular.len()];
            candidates.push(format!("{}{}", stem, singular));
        }
    }

    for rule in rules() {
        if rule.pattern.is_match(plural) {
            let candidate = rule.pattern.replace(plural, rule.replacement).into_owned();
            if !candidate.is_empty() && !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    // Uncountable nouns keep their form
    if !candidates.iter().any(|c| c == plural) {
        candidates.push(plural.to_string());
    }
    candidates
}

/// Upper-case the first character
pub fn ucfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singularize_regular() {
        assert_eq!(singularize("books")[0], "book");
        assert_eq!(singularize("categories")[0], "category");
        assert!(singularize("addresses").contains(&"address".to_string()));
        assert!(singularize("boxes").contains(&"box".to_string()));
    }

    #[test]
    fn test_singularize_irregular_and_uncountable() {
        assert_eq!(singularize("children")[0], "child");
        assert!(singularize("equipment").contains(&"equipment".to_string()));
    }

    #[test]
    fn test_ucfirst() {
        assert_eq!(ucfirst("name"), "Name");
        assert_eq!(ucfirst(""), "");
    }
}
