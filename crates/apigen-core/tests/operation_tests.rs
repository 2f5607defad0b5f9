use apigen_core::config::NamingStrategy;
use apigen_core::error::{NamingError, SchemaError, TransformError};
use apigen_core::ir::{
    BodyCodec, HttpMethod, OperationDescriptor, ParamStyle, ParameterLocation, ResolvedSpec,
    StatusMatch, TypeRef,
};
use apigen_core::parse::DocumentSet;
use apigen_core::transform::{self, TransformOptions};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const ADDITIONAL: &str = include_str!("fixtures/additional-properties.yaml");

fn resolve(yaml: &str) -> ResolvedSpec {
    let docs = DocumentSet::from_yaml(yaml).unwrap();
    transform::transform(&docs).unwrap()
}

fn operation<'a>(spec: &'a ResolvedSpec, camel: &str) -> &'a OperationDescriptor {
    spec.operations
        .iter()
        .find(|op| op.name.camel_case == camel)
        .unwrap_or_else(|| panic!("missing operation {camel}"))
}

#[test]
fn operations_in_document_order() {
    let spec = resolve(PETSTORE);
    let order: Vec<_> = spec
        .operations
        .iter()
        .map(|op| (op.method, op.name.camel_case.as_str()))
        .collect();
    assert_eq!(
        order,
        [
            (HttpMethod::Get, "findPets"),
            (HttpMethod::Post, "addPet"),
            (HttpMethod::Get, "findPetById"),
            (HttpMethod::Delete, "deletePet"),
            (HttpMethod::Put, "updatePetStatus"),
        ]
    );
    assert_eq!(spec.info.title, "Petstore");
    assert_eq!(spec.servers[0].url, "http://petstore.example.com/api");
}

#[test]
fn parameter_styles_and_defaults() {
    let spec = resolve(PETSTORE);
    let op = operation(&spec, "findPets");

    let styles: Vec<_> = op
        .parameters
        .iter()
        .map(|p| (p.wire_name.as_str(), p.location, p.style, p.explode, p.required))
        .collect();
    assert_eq!(
        styles,
        [
            ("tags", ParameterLocation::Query, ParamStyle::Form, true, false),
            ("limit", ParameterLocation::Query, ParamStyle::Form, true, false),
            ("filter", ParameterLocation::Query, ParamStyle::DeepObject, true, false),
            ("X-Request-Id", ParameterLocation::Header, ParamStyle::Simple, false, true),
            ("session", ParameterLocation::Cookie, ParamStyle::Form, true, false),
        ]
    );

    assert_eq!(op.parameters[0].ty, TypeRef::Array(Box::new(TypeRef::String)));
    let filter = spec.types.lookup("FindPetsParams_Filter").unwrap();
    assert_eq!(op.parameters[2].ty, TypeRef::Named(filter.id));
    assert_eq!(op.parameters[3].name.snake_case, "x_request_id");
}

#[test]
fn operation_parameters_override_path_level() {
    let spec = resolve(PETSTORE);

    let get = operation(&spec, "findPetById");
    assert_eq!(get.parameters.len(), 1);
    assert_eq!(get.parameters[0].location, ParameterLocation::Path);
    assert!(get.parameters[0].required);
    assert_eq!(get.parameters[0].description, None);

    let delete = operation(&spec, "deletePet");
    let path_params = delete.path_parameters();
    assert_eq!(path_params.len(), 1);
    assert_eq!(
        path_params[0].description.as_deref(),
        Some("overrides the path-level declaration")
    );
    let reason = &delete.parameters[1];
    assert_eq!(reason.style, ParamStyle::Form);
    assert!(!reason.explode);
}

#[test]
fn responses_grouped_with_default_last() {
    let spec = resolve(PETSTORE);
    let op = operation(&spec, "findPets");

    let statuses: Vec<_> = op.responses.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        [StatusMatch::Code(200), StatusMatch::Range(4), StatusMatch::Default]
    );

    let error = spec.types.lookup("Error").unwrap().id;
    let problem = &op.responses[1].variants[0];
    assert_eq!(problem.content_type, "application/problem+json");
    assert_eq!(problem.tag, "ProblemJson");
    assert_eq!(problem.codec, BodyCodec::Json);
    assert_eq!(problem.ty, Some(TypeRef::Named(error)));

    let ensure = operation(&resolve(ADDITIONAL), "ensureEverythingIsReferenced").clone();
    let statuses: Vec<_> = ensure.responses.iter().map(|r| r.status).collect();
    assert_eq!(statuses, [StatusMatch::Code(200), StatusMatch::Default]);
    let default = &ensure.responses[1];
    assert_eq!(default.variants.len(), 2);
    assert_eq!(default.variants[1].codec, BodyCodec::Text);
    assert_eq!(default.variants[1].ty, None);
}

#[test]
fn empty_response_is_raw_fallback() {
    let spec = resolve(PETSTORE);
    let op = operation(&spec, "addPet");
    let no_content = op
        .responses
        .iter()
        .find(|r| r.status == StatusMatch::Code(204))
        .unwrap();
    assert!(no_content.variants.is_empty());
    assert_eq!(no_content.description, "nothing to report");
}

#[test]
fn request_body_variants() {
    let spec = resolve(PETSTORE);

    let add = operation(&spec, "addPet");
    let body = add.request_body.as_ref().unwrap();
    assert!(body.required);
    let new_pet = spec.types.lookup("NewPet").unwrap().id;
    assert_eq!(body.variants[0].ty, Some(TypeRef::Named(new_pet)));

    let update = operation(&spec, "updatePetStatus");
    let body = update.request_body.as_ref().unwrap();
    let variants: Vec<_> = body
        .variants
        .iter()
        .map(|v| (v.tag.as_str(), v.codec, v.ty.is_some()))
        .collect();
    assert_eq!(
        variants,
        [
            ("Json", BodyCodec::Json, true),
            ("Form", BodyCodec::Form, true),
            ("Octet", BodyCodec::Raw, false),
        ]
    );
}

#[test]
fn route_based_names_and_aliases() {
    let docs = DocumentSet::from_yaml(PETSTORE).unwrap();
    let mut options = TransformOptions {
        naming_strategy: NamingStrategy::UseRouteBased,
        ..Default::default()
    };
    options
        .aliases
        .insert("getPet".to_string(), "fetchPet".to_string());
    let spec = transform::transform_with_options(&docs, &options).unwrap();

    let names: Vec<_> = spec
        .operations
        .iter()
        .map(|op| op.name.camel_case.as_str())
        .collect();
    assert_eq!(
        names,
        ["listPets", "createPets", "fetchPet", "deletePet", "updatePetsStatus"]
    );
}

#[test]
fn duplicate_operation_names() {
    let docs = DocumentSet::from_yaml(
        r#"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths:
  /a:
    get:
      operationId: fetch
      responses: {}
  /b:
    get:
      operationId: Fetch
      responses: {}
"#,
    )
    .unwrap();
    let err = transform::transform(&docs).unwrap_err();
    match err {
        TransformError::Naming(NamingError::DuplicateOperation { name, first, second }) => {
            assert_eq!(name, "Fetch");
            assert_eq!(first, "#/paths/~1a/get");
            assert_eq!(second, "#/paths/~1b/get");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unsupported_styles_are_rejected() {
    for (location, style) in [
        ("query", "pipeDelimited"),
        ("path", "matrix"),
        ("header", "form"),
        ("cookie", "deepObject"),
    ] {
        let yaml = format!(
            r#"
openapi: "3.0.0"
info: {{title: T, version: "1"}}
paths:
  /things/{{p}}:
    get:
      operationId: getThing
      parameters:
        - name: p
          in: path
          required: true
          schema: {{type: string}}
        - name: x
          in: {location}
          style: {style}
          schema: {{type: string}}
      responses: {{}}
"#
        );
        let docs = DocumentSet::from_yaml(&yaml).unwrap();
        let err = transform::transform(&docs).unwrap_err();
        assert!(
            matches!(
                &err,
                TransformError::Schema(SchemaError::UnsupportedStyle { style: s, .. }) if s == style
            ),
            "{location}/{style}: {err}"
        );
    }
}

#[test]
fn duplicate_parameters_are_rejected() {
    let docs = DocumentSet::from_yaml(
        r#"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths:
  /things:
    get:
      operationId: listThings
      parameters:
        - {name: q, in: query, schema: {type: string}}
        - {name: q, in: query, schema: {type: integer}}
      responses: {}
"#,
    )
    .unwrap();
    let err = transform::transform(&docs).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Schema(SchemaError::DuplicateParameter { ref name, ref location, .. })
            if name == "q" && location == "query"
    ));
}

#[test]
fn undeclared_path_variable() {
    let docs = DocumentSet::from_yaml(
        r#"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths:
  /things/{id}:
    get:
      operationId: getThing
      responses: {}
"#,
    )
    .unwrap();
    let err = transform::transform(&docs).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Schema(SchemaError::UnsupportedShape { .. })
    ));
}

fn single_parameter(parameter: &str) -> Result<ResolvedSpec, TransformError> {
    let yaml = format!(
        r#"
openapi: "3.0.0"
info: {{title: T, version: "1"}}
paths:
  /things:
    get:
      operationId: listThings
      parameters:
        - {parameter}
      responses: {{}}
"#
    );
    let docs = DocumentSet::from_yaml(&yaml).unwrap();
    transform::transform(&docs)
}

#[test]
fn nested_parameter_shapes_are_rejected() {
    for (parameter, field) in [
        (
            "{name: p, in: query, schema: {type: object, properties: {inner: {type: object, additionalProperties: {type: string}}}}}",
            "field 'inner' is not a scalar",
        ),
        (
            "{name: p, in: query, explode: false, schema: {type: object, properties: {tags: {type: array, items: {type: string}}}}}",
            "field 'tags' is not a scalar",
        ),
        (
            "{name: X-Ids, in: header, schema: {type: array, items: {type: object, properties: {id: {type: integer}}}}}",
            "array items are not scalars",
        ),
        (
            "{name: p, in: cookie, schema: {type: object, properties: {id: {type: integer}}, additionalProperties: {type: array, items: {type: string}}}}",
            "additional properties are not scalars",
        ),
        (
            "{name: p, in: query, schema: {type: object, additionalProperties: {type: object, properties: {id: {type: integer}}}}}",
            "map values are not scalars",
        ),
    ] {
        let err = single_parameter(parameter).unwrap_err();
        match &err {
            TransformError::Schema(SchemaError::UnsupportedParameterShape { detail, site, .. }) => {
                assert_eq!(detail, field);
                assert!(site.starts_with("#/paths/~1things/get/parameters/"), "{site}");
            }
            other => panic!("{parameter}: unexpected error: {other}"),
        }
    }
}

#[test]
fn flat_and_deep_parameter_shapes_are_accepted() {
    for parameter in [
        "{name: p, in: query, schema: {type: object, properties: {tags: {type: array, items: {type: string}}}}}",
        "{name: p, in: query, style: deepObject, explode: true, schema: {type: object, properties: {inner: {type: object, additionalProperties: {type: string}}}}}",
        "{name: p, in: query, schema: {type: object, additionalProperties: true}}",
        "{name: X-Ids, in: header, schema: {type: array, items: {type: integer}}}",
    ] {
        let spec = single_parameter(parameter).unwrap_or_else(|err| panic!("{parameter}: {err}"));
        assert_eq!(operation(&spec, "listThings").parameters.len(), 1);
    }

    let spec = resolve(ADDITIONAL);
    let params = &operation(&spec, "paramsWithAddProps").parameters;
    let styles: Vec<_> = params.iter().map(|p| (p.wire_name.as_str(), p.style)).collect();
    assert_eq!(styles, [("p1", ParamStyle::Simple), ("p2", ParamStyle::DeepObject)]);
}
