use super::types::{NormalizedName, TypeRef};
use crate::parse::operation::ParameterLocation;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Lowercase form, as used for path item keys.
    pub fn key(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

/// Parameter serialization style. Anything else is rejected during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamStyle {
    Simple,
    Form,
    DeepObject,
}

impl ParamStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamStyle::Simple => "simple",
            ParamStyle::Form => "form",
            ParamStyle::DeepObject => "deepObject",
        }
    }

    /// Default style for a location.
    pub fn default_for(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Query | ParameterLocation::Cookie => ParamStyle::Form,
            ParameterLocation::Path | ParameterLocation::Header => ParamStyle::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: NormalizedName,
    /// Name on the wire (query key, header name, ...).
    pub wire_name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub style: ParamStyle,
    pub explode: bool,
    pub ty: TypeRef,
    pub description: Option<String>,
}

/// How a body of a given media type is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyCodec {
    Json,
    Form,
    Text,
    /// Opaque bytes: octet streams, multipart, anything unrecognized.
    Raw,
}

impl BodyCodec {
    pub fn for_media_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.contains("json") {
            BodyCodec::Json
        } else if essence == "application/x-www-form-urlencoded" {
            BodyCodec::Form
        } else if essence.starts_with("text/") {
            BodyCodec::Text
        } else {
            BodyCodec::Raw
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBodyVariant {
    pub content_type: String,
    /// PascalCase tag derived from the media type, e.g. `Json`.
    pub tag: String,
    pub codec: BodyCodec,
    pub ty: Option<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBodyDescriptor {
    pub required: bool,
    pub description: Option<String>,
    pub variants: Vec<RequestBodyVariant>,
}

/// Which statuses a response group applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusMatch {
    Code(u16),
    /// `2XX` style ranges, holding the leading digit.
    Range(u8),
    Default,
}

impl StatusMatch {
    pub fn parse(status: &str) -> Option<Self> {
        if status.eq_ignore_ascii_case("default") {
            return Some(StatusMatch::Default);
        }
        let upper = status.to_ascii_uppercase();
        if let Some(digit) = upper.strip_suffix("XX") {
            return match digit.parse::<u8>() {
                Ok(d) if (1..=5).contains(&d) => Some(StatusMatch::Range(d)),
                _ => None,
            };
        }
        match status.parse::<u16>() {
            Ok(code) if (100..600).contains(&code) => Some(StatusMatch::Code(code)),
            _ => None,
        }
    }

    pub fn matches(self, status: u16) -> bool {
        match self {
            StatusMatch::Code(code) => code == status,
            StatusMatch::Range(digit) => status / 100 == u16::from(digit),
            StatusMatch::Default => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseVariant {
    pub content_type: String,
    pub tag: String,
    pub codec: BodyCodec,
    pub ty: Option<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseGroup {
    pub status: StatusMatch,
    pub description: String,
    /// Empty when the response declares no content: a raw-body fallback.
    pub variants: Vec<ResponseVariant>,
}

/// One path + method combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: NormalizedName,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub request_body: Option<RequestBodyDescriptor>,
    /// Declaration order, `default` last.
    pub responses: Vec<ResponseGroup>,
    pub deprecated: bool,
}

impl OperationDescriptor {
    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    /// Path parameters in the order they appear in the path template.
    pub fn path_parameters(&self) -> Vec<&ParameterDescriptor> {
        path_template_names(&self.path)
            .iter()
            .filter_map(|name| {
                self.parameters_in(ParameterLocation::Path)
                    .find(|p| &p.wire_name == name)
            })
            .collect()
    }
}

/// Variable names of a path template, in order: `/a/{x}/b/{y}` → `[x, y]`.
pub fn path_template_names(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                names.push(after[..end].to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}
