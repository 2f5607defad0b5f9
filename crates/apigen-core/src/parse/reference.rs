use std::fmt;

/// The canonical target of a `$ref`: a document location plus a JSON pointer.
///
/// The root document has the empty location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefTarget {
    pub document: String,
    pub pointer: String,
}

impl RefTarget {
    pub fn new(document: impl Into<String>, pointer: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            pointer: pointer.into(),
        }
    }

    /// Parse `[<document>]#<pointer>` relative to the document it appears in.
    pub fn parse(reference: &str, from_document: &str) -> Option<Self> {
        if reference.is_empty() {
            return None;
        }
        let (document, pointer) = match reference.split_once('#') {
            Some((document, pointer)) => (document, pointer),
            None => (reference, ""),
        };
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return None;
        }
        let document = if document.is_empty() {
            from_document.to_string()
        } else {
            join_location(from_document, document)
        };
        Some(Self::new(document, pointer))
    }

    /// The last pointer segment, or the document stem for whole-document refs.
    pub fn leaf_name(&self) -> String {
        match self.pointer.rsplit('/').next() {
            Some(segment) if !self.pointer.is_empty() => unescape_segment(segment),
            _ => {
                let file = self.document.rsplit('/').next().unwrap_or_default();
                file.split('.').next().unwrap_or_default().to_string()
            }
        }
    }
}

impl fmt::Display for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.pointer)
    }
}

/// Escape one JSON pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Normalize a document location: drop `./` and resolve `..` segments.
pub fn normalize_location(location: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in location.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Resolve `location` relative to the directory of `base`.
fn join_location(base: &str, location: &str) -> String {
    if location.starts_with('/') || location.contains("://") {
        return location.to_string();
    }
    match base.rsplit_once('/') {
        Some((dir, _)) => normalize_location(&format!("{dir}/{location}")),
        None => normalize_location(location),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_reference() {
        let t = RefTarget::parse("#/components/schemas/Pet", "").unwrap();
        assert_eq!(t.document, "");
        assert_eq!(t.pointer, "/components/schemas/Pet");
        assert_eq!(t.leaf_name(), "Pet");
    }

    #[test]
    fn test_reference_inherits_document() {
        let t = RefTarget::parse("#/components/schemas/ObjectB", "b.yaml").unwrap();
        assert_eq!(t.document, "b.yaml");
    }

    #[test]
    fn test_relative_document() {
        let t = RefTarget::parse("../common/b.yaml#/X", "specs/a.yaml").unwrap();
        assert_eq!(t.document, "common/b.yaml");
        let t = RefTarget::parse("./b.yaml#/X", "").unwrap();
        assert_eq!(t.document, "b.yaml");
    }

    #[test]
    fn test_whole_document_reference() {
        let t = RefTarget::parse("models/pet.yaml", "").unwrap();
        assert_eq!(t.pointer, "");
        assert_eq!(t.leaf_name(), "pet");
    }

    #[test]
    fn test_escaped_segment() {
        let t = RefTarget::parse("#/components/schemas/a~1b", "").unwrap();
        assert_eq!(t.leaf_name(), "a/b");
        assert_eq!(escape_segment("/pets/{id}"), "~1pets~1{id}");
    }

    #[test]
    fn test_invalid_reference() {
        assert!(RefTarget::parse("", "").is_none());
        assert!(RefTarget::parse("#components", "").is_none());
    }
}
