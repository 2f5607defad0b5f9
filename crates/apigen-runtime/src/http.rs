use std::fmt;

/// HTTP method of a request or route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
            Method::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive header lookup over an ordered header list.
pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Media type without parameters, lowercased: `application/json; charset=utf-8` → `application/json`.
pub fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a received content type satisfies a declared one.
///
/// Essences must be equal, except that any two JSON media types match each
/// other.
pub fn media_type_matches(actual: &str, declared: &str) -> bool {
    let actual = media_essence(actual);
    let declared = media_essence(declared);
    actual == declared || (actual.contains("json") && declared.contains("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_matches() {
        assert!(media_type_matches("application/json; charset=utf-8", "application/json"));
        assert!(media_type_matches("application/problem+json", "application/json"));
        assert!(media_type_matches("Text/Plain", "text/plain"));
        assert!(!media_type_matches("text/plain", "application/json"));
        assert!(!media_type_matches("", "application/json"));
    }
}
