//! Rust identifier rules for emitted code.

use std::collections::HashSet;

use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Field, argument, and function names: snake_case, keywords escaped.
pub fn value_ident(name: &str) -> String {
    let snake = name.to_snake_case();
    if snake.is_empty() {
        return "value".to_string();
    }
    if snake.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{snake}");
    }
    if NON_RAW.contains(&snake.as_str()) {
        return format!("{snake}_");
    }
    if KEYWORDS.contains(&snake.as_str()) {
        return format!("r#{snake}");
    }
    snake
}

/// Enum variant names: PascalCase, never starting with a digit.
pub fn variant_ident(name: &str) -> String {
    let pascal = name.to_pascal_case();
    if pascal.is_empty() {
        return "Empty".to_string();
    }
    if pascal.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("V{pascal}");
    }
    if pascal == "Self" {
        return "Self_".to_string();
    }
    pascal
}

/// Type names generated code refers to unqualified. A schema with one of
/// these names would shadow them.
const RESERVED_TYPES: &[&str] = &[
    "Arc", "ApiImpl", "BTreeMap", "Box", "Client", "Deserialize", "Err", "From", "Future",
    "None", "Ok", "Option", "Result", "Send", "Serialize", "ServerInterface",
    "ServerInterfaceWrapper", "Some", "String", "Sync", "TryFrom", "Vec",
];

/// Resolved type names are used verbatim unless they hit `Self` or a
/// reserved name, which gets a `Model` suffix.
pub fn type_ident(name: &str) -> String {
    if name == "Self" {
        "Self_".to_string()
    } else if RESERVED_TYPES.contains(&name) {
        format!("{name}Model")
    } else {
        name.to_string()
    }
}

pub fn const_ident(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.to_shouty_snake_case())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// A Rust string literal for `value`.
pub fn literal(value: &str) -> String {
    format!("{value:?}")
}

/// Lines of a doc comment, trailing whitespace removed.
pub fn doc_lines(text: Option<&str>) -> Vec<String> {
    text.map(|text| {
        text.trim()
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect()
    })
    .unwrap_or_default()
}

/// Hands out identifiers unique within one scope by appending `_2`, `_3`, ...
#[derive(Debug, Default)]
pub struct IdentScope {
    taken: HashSet<String>,
}

impl IdentScope {
    pub fn with_reserved(reserved: &[&str]) -> Self {
        Self {
            taken: reserved.iter().map(|name| (*name).to_string()).collect(),
        }
    }

    pub fn claim(&mut self, ident: String) -> String {
        if self.taken.insert(ident.clone()) {
            return ident;
        }
        let (stem, raw) = match ident.strip_prefix("r#") {
            Some(stem) => (stem.to_string(), true),
            None => (ident, false),
        };
        let mut counter = 2;
        loop {
            let candidate = format!("{stem}_{counter}");
            if self.taken.insert(candidate.clone()) {
                log::debug!("renamed identifier {}{stem} to {candidate}", if raw { "r#" } else { "" });
                return candidate;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ident() {
        assert_eq!(value_ident("petId"), "pet_id");
        assert_eq!(value_ident("X-Request-Id"), "x_request_id");
        assert_eq!(value_ident("type"), "r#type");
        assert_eq!(value_ident("self"), "self_");
        assert_eq!(value_ident("2fa"), "_2fa");
        assert_eq!(value_ident(""), "value");
    }

    #[test]
    fn test_variant_ident() {
        assert_eq!(variant_ident("in-stock"), "InStock");
        assert_eq!(variant_ident("1"), "V1");
        assert_eq!(variant_ident(""), "Empty");
    }

    #[test]
    fn test_type_ident_avoids_reserved_names() {
        assert_eq!(type_ident("Pet"), "Pet");
        assert_eq!(type_ident("Result"), "ResultModel");
        assert_eq!(type_ident("Client"), "ClientModel");
        assert_eq!(type_ident("Option"), "OptionModel");
        assert_eq!(type_ident("Self"), "Self_");
    }

    #[test]
    fn test_scope_dedupes() {
        let mut scope = IdentScope::with_reserved(&["additional_properties"]);
        assert_eq!(scope.claim("name".to_string()), "name");
        assert_eq!(scope.claim("name".to_string()), "name_2");
        assert_eq!(scope.claim("additional_properties".to_string()), "additional_properties_2");
        assert_eq!(scope.claim("r#type".to_string()), "r#type");
        assert_eq!(scope.claim("r#type".to_string()), "type_2");
    }

    #[test]
    fn test_literal_and_docs() {
        assert_eq!(literal("a \"b\""), r#""a \"b\"""#);
        assert_eq!(doc_lines(Some("line one  \nline two\n")), ["line one", "line two"]);
        assert!(doc_lines(None).is_empty());
        assert_eq!(const_ident(&["findPets", "X-Request-Id", "shape"]), "FIND_PETS_X_REQUEST_ID_SHAPE");
    }
}
