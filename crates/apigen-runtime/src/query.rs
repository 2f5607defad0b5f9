//! Query strings, form bodies and cookie headers as ordered key/value pairs.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Unreserved characters (RFC 3986) stay literal.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path segments additionally keep the `simple` style delimiters literal.
const PATH_ENCODE_SET: &AsciiSet = &COMPONENT_ENCODE_SET.remove(b',').remove(b'=');

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT_ENCODE_SET).to_string()
}

pub fn encode_path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_ENCODE_SET).to_string()
}

/// Percent-decode one component. Invalid UTF-8 is replaced, not rejected.
pub fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn decode_form_component(raw: &str) -> String {
    decode_component(&raw.replace('+', " "))
}

/// `k=v&k=v`, percent-encoded, in the given order.
pub fn build_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// `k=v; k=v` for a `Cookie` header.
pub fn build_cookie_header(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_component(value)))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decoded pairs of a query string, form body or cookie header.
///
/// `reserved` names the parameters of the operation, so an exploded
/// open object only claims keys that belong to no other parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPairs {
    pairs: Vec<(String, String)>,
    reserved: Vec<String>,
}

impl FormPairs {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            pairs,
            reserved: Vec::new(),
        }
    }

    pub fn parse_query(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = raw
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (decode_form_component(key), decode_form_component(value))
            })
            .collect();
        Self::from_pairs(pairs)
    }

    pub fn parse_cookies(header: &str) -> Self {
        let pairs = header
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (key.to_string(), decode_component(value))
            })
            .collect();
        Self::from_pairs(pairs)
    }

    pub fn reserve(mut self, names: &[&str]) -> Self {
        self.reserved
            .extend(names.iter().map(|name| (*name).to_string()));
        self
    }

    /// A key is reserved when it is a parameter name or a `name[...]` key of one.
    pub fn is_reserved(&self, key: &str) -> bool {
        self.reserved.iter().any(|name| {
            key == name
                || key
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('['))
        })
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_round_trip() {
        let pairs = vec![
            ("filter[kind]".to_string(), "big dog".to_string()),
            ("tags".to_string(), "a,b".to_string()),
            ("tags".to_string(), "ü&=".to_string()),
        ];
        let raw = build_query(&pairs);
        assert_eq!(raw, "filter%5Bkind%5D=big%20dog&tags=a%2Cb&tags=%C3%BC%26%3D");

        let parsed = FormPairs::parse_query(&raw);
        assert_eq!(parsed.first("filter[kind]"), Some("big dog"));
        assert_eq!(parsed.all("tags"), ["a,b", "ü&="]);
    }

    #[test]
    fn test_plus_is_space_in_query() {
        let parsed = FormPairs::parse_query("?q=a+b&flag");
        assert_eq!(parsed.first("q"), Some("a b"));
        assert!(parsed.contains("flag"));
        assert_eq!(parsed.first("flag"), Some(""));
    }

    #[test]
    fn test_cookies() {
        let header = build_cookie_header(&[
            ("session".to_string(), "abc def".to_string()),
            ("ids".to_string(), "1,2".to_string()),
        ]);
        assert_eq!(header, "session=abc%20def; ids=1%2C2");
        let parsed = FormPairs::parse_cookies(&header);
        assert_eq!(parsed.first("session"), Some("abc def"));
        assert_eq!(parsed.first("ids"), Some("1,2"));
    }

    #[test]
    fn test_reserved_keys() {
        let pairs = FormPairs::parse_query("limit=1&filter[a]=x&other=2").reserve(&["limit", "filter"]);
        assert!(pairs.is_reserved("limit"));
        assert!(pairs.is_reserved("filter[a]"));
        assert!(!pairs.is_reserved("filtered"));
        assert!(!pairs.is_reserved("other"));
    }

    #[test]
    fn test_path_segment_keeps_delimiters() {
        assert_eq!(encode_path_segment("1,2,3"), "1,2,3");
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
    }
}
