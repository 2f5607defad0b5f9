use heck::{ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

use crate::ir::{HttpMethod, NormalizedName};

/// Create a `NormalizedName` from an arbitrary string, computing all casing variants.
pub fn normalize_name(name: &str) -> NormalizedName {
    let sanitized = sanitize_identifier(name);

    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        camel_case: sanitized.to_lower_camel_case(),
        snake_case: sanitized.to_snake_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
    }
}

/// Derive a camelCase operation name from method + path.
///
/// - `GET /pets` → `listPets`
/// - `GET /pets/{id}` → `getPet`
/// - `DELETE /stores/{storeId}/pets/{petId}` → `deleteStoresPet`
pub fn route_to_name(method: HttpMethod, path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let ends_with_param = segments
        .last()
        .is_some_and(|s| s.starts_with('{') && s.ends_with('}'));
    let resources: Vec<&str> = segments
        .into_iter()
        .filter(|s| !(s.starts_with('{') && s.ends_with('}')))
        .collect();

    let verb = match method {
        HttpMethod::Get if ends_with_param => "get",
        HttpMethod::Get => "list",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        other => other.key(),
    };

    let last = resources.len().saturating_sub(1);
    resources
        .iter()
        .enumerate()
        .fold(verb.to_string(), |mut name, (i, part)| {
            let word = if i == last && ends_with_param {
                singularize(part)
            } else {
                (*part).to_string()
            };
            name.push_str(&word.to_pascal_case());
            name
        })
}

/// PascalCase tag for a media type, used in synthesized type and field names.
///
/// Well-known types get short tags; anything else uses its full essence so
/// distinct media types never share a tag.
pub fn content_type_tag(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "application/json" => "Json".to_string(),
        "text/plain" => "Text".to_string(),
        "application/x-www-form-urlencoded" => "Form".to_string(),
        "multipart/form-data" => "Multipart".to_string(),
        "application/octet-stream" => "Octet".to_string(),
        other => {
            let subtype = other.split_once('/').map(|(_, s)| s).unwrap_or(other);
            normalize_name(subtype).pascal_case
        }
    }
}

/// Tag for a response status key: `200`, `4XX`, or `Default`.
pub fn status_tag(status: &str) -> String {
    if status.eq_ignore_ascii_case("default") {
        "Default".to_string()
    } else {
        status.to_ascii_uppercase()
    }
}

/// Naive singularization for route-derived names.
fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies").filter(|s| !s.is_empty()) {
        format!("{stem}y")
    } else if ["ses", "xes", "zes"].iter().any(|suffix| word.ends_with(suffix)) {
        word[..word.len() - 2].to_string()
    } else if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Sanitize a string to be a valid identifier, collapsing separators to `_`.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            pending_separator = false;
        } else {
            pending_separator = true;
        }
    }

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_id_casing() {
        let n = normalize_name("findPetsByStatus");
        assert_eq!(n.pascal_case, "FindPetsByStatus");
        assert_eq!(n.camel_case, "findPetsByStatus");
        assert_eq!(n.snake_case, "find_pets_by_status");
        assert_eq!(n.screaming_snake, "FIND_PETS_BY_STATUS");
    }

    #[test]
    fn test_separators() {
        assert_eq!(normalize_name("x-rate-limit").snake_case, "x_rate_limit");
        assert_eq!(normalize_name("params_with_add_props").pascal_case, "ParamsWithAddProps");
        assert_eq!(normalize_name("$weird name").pascal_case, "WeirdName");
        assert_eq!(normalize_name("???").original, "???");
        assert_eq!(normalize_name("???").snake_case, "unnamed");
    }

    #[test]
    fn test_route_names() {
        assert_eq!(route_to_name(HttpMethod::Get, "/pets"), "listPets");
        assert_eq!(route_to_name(HttpMethod::Post, "/pets"), "createPets");
        assert_eq!(route_to_name(HttpMethod::Get, "/pets/{petId}"), "getPet");
        assert_eq!(route_to_name(HttpMethod::Put, "/pets/{petId}"), "updatePet");
        assert_eq!(
            route_to_name(HttpMethod::Delete, "/stores/{storeId}/pets/{petId}"),
            "deleteStoresPet"
        );
        assert_eq!(
            route_to_name(HttpMethod::Get, "/categories/{id}"),
            "getCategory"
        );
        assert_eq!(route_to_name(HttpMethod::Head, "/"), "head");
    }

    #[test]
    fn test_content_type_tags() {
        assert_eq!(content_type_tag("application/json"), "Json");
        assert_eq!(content_type_tag("application/json; charset=utf-8"), "Json");
        assert_eq!(content_type_tag("application/problem+json"), "ProblemJson");
        assert_eq!(content_type_tag("application/vnd.api+json"), "VndApiJson");
        assert_eq!(content_type_tag("text/plain"), "Text");
        assert_eq!(content_type_tag("image/png"), "Png");
    }

    #[test]
    fn test_status_tags() {
        assert_eq!(status_tag("200"), "200");
        assert_eq!(status_tag("4xx"), "4XX");
        assert_eq!(status_tag("default"), "Default");
    }
}
