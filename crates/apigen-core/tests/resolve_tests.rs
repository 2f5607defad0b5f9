use apigen_core::error::{NamingError, SchemaError, TransformError};
use apigen_core::ir::{AdditionalMode, EnumLiterals, ResolvedSpec, TypeKind, TypeRef};
use apigen_core::parse::{self, DocumentSet};
use apigen_core::transform;

const ADDITIONAL: &str = include_str!("fixtures/additional-properties.yaml");
const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const CYCLES: &str = include_str!("fixtures/cycles.yaml");
const ROOT: &str = include_str!("fixtures/root.yaml");
const DOC_A: &str = include_str!("fixtures/a.yaml");
const DOC_B: &str = include_str!("fixtures/b.yaml");

fn resolve(yaml: &str) -> ResolvedSpec {
    let docs = DocumentSet::from_yaml(yaml).unwrap();
    transform::transform(&docs).unwrap()
}

fn resolve_err(yaml: &str) -> TransformError {
    let docs = DocumentSet::from_yaml(yaml).unwrap();
    transform::transform(&docs).unwrap_err()
}

fn names(spec: &ResolvedSpec) -> Vec<&str> {
    spec.types.iter().map(|t| t.name.as_str()).collect()
}

fn kind<'a>(spec: &'a ResolvedSpec, name: &str) -> &'a TypeKind {
    &spec
        .types
        .lookup(name)
        .unwrap_or_else(|| panic!("missing type {name}"))
        .kind
}

fn additional(spec: &ResolvedSpec, name: &str) -> AdditionalMode {
    match kind(spec, name) {
        TypeKind::Struct { additional, .. } => additional.clone(),
        other => panic!("{name} is not a struct: {other:?}"),
    }
}

#[test]
fn additional_properties_modes() {
    let spec = resolve(ADDITIONAL);

    assert_eq!(
        additional(&spec, "AdditionalPropertiesObject1"),
        AdditionalMode::Typed(TypeRef::Integer)
    );
    assert_eq!(
        additional(&spec, "AdditionalPropertiesObject2"),
        AdditionalMode::Forbidden
    );
    assert_eq!(
        additional(&spec, "AdditionalPropertiesObject3"),
        AdditionalMode::Arbitrary
    );
    assert_eq!(
        additional(&spec, "AdditionalPropertiesObject4"),
        AdditionalMode::Arbitrary
    );
    assert_eq!(
        additional(&spec, "AdditionalPropertiesObject4_Inner"),
        AdditionalMode::Arbitrary
    );
    assert_eq!(additional(&spec, "SchemaObject"), AdditionalMode::Forbidden);

    let schema_object = spec.types.lookup("SchemaObject").unwrap().id;
    assert_eq!(
        kind(&spec, "AdditionalPropertiesObject5"),
        &TypeKind::Map(TypeRef::Named(schema_object))
    );
}

#[test]
fn resolution_order_is_breadth_first() {
    let spec = resolve(ADDITIONAL);
    insta::assert_snapshot!(names(&spec).join("\n"), @r"
    RequestBody
    EnsureEverythingIsReferencedJsonDefaultResponse
    SchemaObject
    EnsureEverythingIsReferencedJson200Response
    AdditionalPropertiesObject1
    AdditionalPropertiesObject2
    AdditionalPropertiesObject3
    AdditionalPropertiesObject4
    AdditionalPropertiesObject5
    ObjectWithJsonField
    ParamsWithAddPropsParams_P2
    BodyWithAddPropsJsonBody
    AdditionalPropertiesObject4_Inner
    ");
}

#[test]
fn hoisted_inline_objects() {
    let spec = resolve(ADDITIONAL);

    let TypeKind::Struct { fields, additional } = kind(&spec, "BodyWithAddPropsJsonBody") else {
        panic!("expected struct");
    };
    assert_eq!(additional, &AdditionalMode::Arbitrary);
    let inner = fields.iter().find(|f| f.wire_key == "inner").unwrap();
    assert_eq!(inner.ty, TypeRef::Map(Box::new(TypeRef::Integer)));
    assert!(inner.required);

    let TypeKind::Struct { fields, .. } = kind(&spec, "ObjectWithJsonField") else {
        panic!("expected struct");
    };
    let keys: Vec<_> = fields.iter().map(|f| (f.wire_key.as_str(), f.required)).collect();
    assert_eq!(keys, [("name", true), ("value1", true), ("value2", false)]);
    assert_eq!(fields[1].ty, TypeRef::Any);
}

#[test]
fn all_of_merges_members_in_order() {
    let spec = resolve(PETSTORE);

    let TypeKind::Struct { fields, additional } = kind(&spec, "Pet") else {
        panic!("expected struct");
    };
    let keys: Vec<_> = fields.iter().map(|f| f.wire_key.as_str()).collect();
    assert_eq!(keys, ["name", "tag", "kind", "owner", "id"]);
    assert_eq!(additional, &AdditionalMode::Forbidden);

    let id = fields.iter().find(|f| f.wire_key == "id").unwrap();
    assert!(id.required);
    let tag = fields.iter().find(|f| f.wire_key == "tag").unwrap();
    assert!(tag.nullable);
    assert!(tag.is_optional());

    let owner = fields.iter().find(|f| f.wire_key == "owner").unwrap();
    let owner_type = spec.types.lookup("NewPet_Owner").unwrap();
    assert_eq!(owner.ty, TypeRef::Named(owner_type.id));
    assert!(spec.types.lookup("Pet_Owner").is_none());
}

#[test]
fn all_of_diamond_reuses_inherited_inline_types() {
    let spec = resolve(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Leaf:
      allOf:
        - $ref: "#/components/schemas/Base"
        - $ref: "#/components/schemas/Mid"
    Mid:
      allOf:
        - $ref: "#/components/schemas/Base"
        - type: object
          properties:
            depth: {type: integer}
    Base:
      type: object
      properties:
        meta:
          type: object
          properties:
            created: {type: string}
"##,
    );
    assert_eq!(names(&spec), ["Leaf", "Mid", "Base", "Base_Meta"]);

    let meta = spec.types.lookup("Base_Meta").unwrap().id;
    for owner in ["Leaf", "Mid", "Base"] {
        let TypeKind::Struct { fields, .. } = kind(&spec, owner) else {
            panic!("{owner} is not a struct");
        };
        let field = fields.iter().find(|f| f.wire_key == "meta").unwrap();
        assert_eq!(field.ty, TypeRef::Named(meta), "{owner}");
    }
    let TypeKind::Struct { fields, .. } = kind(&spec, "Leaf") else {
        panic!("expected struct");
    };
    let keys: Vec<_> = fields.iter().map(|f| f.wire_key.as_str()).collect();
    assert_eq!(keys, ["meta", "depth"]);
}

#[test]
fn all_of_compatible_inline_redeclaration_is_shared() {
    let spec = resolve(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Ticket:
      allOf:
        - type: object
          properties:
            status: {type: string, enum: [open, closed]}
        - type: object
          required: [status]
          properties:
            status: {type: string, enum: [open, closed]}
"##,
    );
    assert_eq!(names(&spec), ["Ticket", "Ticket_Status"]);

    let TypeKind::Struct { fields, .. } = kind(&spec, "Ticket") else {
        panic!("expected struct");
    };
    assert_eq!(fields.len(), 1);
    assert!(fields[0].required);
    let status = spec.types.lookup("Ticket_Status").unwrap().id;
    assert_eq!(fields[0].ty, TypeRef::Named(status));
}

#[test]
fn all_of_incompatible_inline_redeclaration_collides() {
    let err = resolve_err(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Ticket:
      allOf:
        - type: object
          properties:
            status: {type: string, enum: [open, closed]}
        - type: object
          properties:
            status: {type: string, enum: [new, done]}
"##,
    );
    match err {
        TransformError::Naming(NamingError::Collision { name, first, second }) => {
            assert_eq!(name, "Ticket_Status");
            assert_eq!(first, "#/components/schemas/Ticket/allOf/0/properties/status");
            assert_eq!(second, "#/components/schemas/Ticket/allOf/1/properties/status");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn enums_unions_and_aliases() {
    let spec = resolve(PETSTORE);

    assert_eq!(
        kind(&spec, "PetKind"),
        &TypeKind::Enum(EnumLiterals::Strings(vec![
            "dog".to_string(),
            "cat".to_string(),
            "bird".to_string()
        ]))
    );
    assert_eq!(
        kind(&spec, "Priority"),
        &TypeKind::Enum(EnumLiterals::Integers(vec![1, 2, 3]))
    );

    let pet = spec.types.lookup("Pet").unwrap().id;
    assert_eq!(kind(&spec, "PetAlias"), &TypeKind::Alias(TypeRef::Named(pet)));

    let TypeKind::Union(variants) = kind(&spec, "NewPet_Owner_Contact") else {
        panic!("expected union");
    };
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].ty, TypeRef::String);
    let second = spec.types.lookup("NewPet_Owner_Contact_Variant2").unwrap();
    assert_eq!(variants[1].ty, TypeRef::Named(second.id));

    assert!(spec.types.lookup("UpdatePetStatusJsonBody_Status").is_some());
}

#[test]
fn component_cycle_resolves_once() {
    let spec = resolve(CYCLES);
    assert_eq!(names(&spec), ["A", "B", "Node"]);

    let TypeKind::Struct { fields, .. } = kind(&spec, "A") else {
        panic!("expected struct");
    };
    let b = spec.types.lookup("B").unwrap().id;
    assert_eq!(fields[0].ty, TypeRef::Named(b));
    assert!(fields[0].indirect);
    assert!(!fields[1].indirect);

    let TypeKind::Struct { fields, .. } = kind(&spec, "B") else {
        panic!("expected struct");
    };
    assert!(fields[0].indirect);
    assert_eq!(fields[1].ty, TypeRef::Array(Box::new(TypeRef::Named(b))));
    assert!(!fields[1].indirect);

    let TypeKind::Struct { fields, .. } = kind(&spec, "Node") else {
        panic!("expected struct");
    };
    assert!(fields[1].indirect);
}

#[test]
fn cross_document_cycle() {
    let docs = DocumentSet::from_yaml(ROOT)
        .unwrap()
        .with_external("a.yaml", parse::from_yaml(DOC_A).unwrap())
        .with_external("b.yaml", parse::from_yaml(DOC_B).unwrap());
    let spec = transform::transform(&docs).unwrap();

    assert_eq!(names(&spec), ["Container", "ObjectA", "ObjectB", "Shared"]);

    let object_b = spec.types.lookup("ObjectB").unwrap();
    assert_eq!(object_b.origin, "b.yaml#/components/schemas/ObjectB");
    let TypeKind::Struct { fields, .. } = &object_b.kind else {
        panic!("expected struct");
    };
    let a = spec.types.lookup("ObjectA").unwrap().id;
    assert_eq!(fields[1].ty, TypeRef::Named(a));
    assert!(fields[1].indirect);

    let TypeKind::Struct { fields, .. } = kind(&spec, "Container") else {
        panic!("expected struct");
    };
    assert!(fields.iter().all(|f| !f.indirect));
}

#[test]
fn missing_external_document_is_dangling() {
    let docs = DocumentSet::from_yaml(ROOT)
        .unwrap()
        .with_external("a.yaml", parse::from_yaml(DOC_A).unwrap());
    let err = transform::transform(&docs).unwrap_err();
    match err {
        TransformError::Schema(SchemaError::DanglingReference { reference, site }) => {
            assert_eq!(reference, "b.yaml#/components/schemas/ObjectB");
            assert_eq!(site, "#/components/schemas/Container/properties/b");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dangling_local_reference() {
    let err = resolve_err(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Pet:
      type: object
      properties:
        owner:
          $ref: "#/components/schemas/Person"
"##,
    );
    assert!(matches!(
        err,
        TransformError::Schema(SchemaError::DanglingReference { ref reference, .. })
            if reference == "#/components/schemas/Person"
    ));
}

#[test]
fn alias_loop_is_circular() {
    let err = resolve_err(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Loop1:
      $ref: "#/components/schemas/Loop2"
    Loop2:
      $ref: "#/components/schemas/Loop1"
"##,
    );
    match err {
        TransformError::Schema(SchemaError::CircularReference { chain }) => {
            assert!(chain.starts_with("#/components/schemas/Loop1"));
            assert!(chain.ends_with("#/components/schemas/Loop1"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn all_of_type_conflict() {
    let err = resolve_err(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Base:
      type: object
      properties:
        id: {type: integer}
    Derived:
      allOf:
        - $ref: "#/components/schemas/Base"
        - type: object
          properties:
            id: {type: string}
"##,
    );
    assert!(matches!(
        err,
        TransformError::Schema(SchemaError::CompositionConflict { ref owner, ref field })
            if owner == "Derived" && field == "id"
    ));
}

#[test]
fn all_of_rejects_scalar_member() {
    let err = resolve_err(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Odd:
      allOf:
        - type: object
          properties:
            id: {type: integer}
        - type: string
"##,
    );
    assert!(matches!(
        err,
        TransformError::Schema(SchemaError::UnsupportedShape { .. })
    ));
}

#[test]
fn hoisted_name_collision_reports_both_sites() {
    let err = resolve_err(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths:
  /pets:
    post:
      operationId: addPet
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name: {type: string}
      responses:
        '204':
          description: created
components:
  schemas:
    AddPetJsonBody:
      type: object
      properties:
        id: {type: integer}
"##,
    );
    match err {
        TransformError::Naming(NamingError::Collision { name, first, second }) => {
            assert_eq!(name, "AddPetJsonBody");
            assert_eq!(first, "#/paths/~1pets/post/requestBody/content/application~1json");
            assert_eq!(second, "#/components/schemas/AddPetJsonBody");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn identical_external_schemas_share_a_type() {
    let docs = DocumentSet::from_yaml(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Holder:
      type: object
      properties:
        left:
          $ref: "left.yaml#/components/schemas/Money"
        right:
          $ref: "right.yaml#/components/schemas/Money"
"##,
    )
    .unwrap()
    .with_external(
        "left.yaml",
        parse::from_yaml("components:\n  schemas:\n    Money:\n      type: integer\n").unwrap(),
    )
    .with_external(
        "right.yaml",
        parse::from_yaml("components:\n  schemas:\n    Money:\n      type: integer\n").unwrap(),
    );
    let spec = transform::transform(&docs).unwrap();
    assert_eq!(names(&spec), ["Holder", "Money"]);
    assert_eq!(kind(&spec, "Money"), &TypeKind::Alias(TypeRef::Integer));
}

#[test]
fn different_external_schemas_collide() {
    let docs = DocumentSet::from_yaml(
        r##"
openapi: "3.0.0"
info: {title: T, version: "1"}
paths: {}
components:
  schemas:
    Holder:
      type: object
      properties:
        left:
          $ref: "left.yaml#/components/schemas/Money"
        right:
          $ref: "right.yaml#/components/schemas/Money"
"##,
    )
    .unwrap()
    .with_external(
        "left.yaml",
        parse::from_yaml("components:\n  schemas:\n    Money:\n      type: integer\n").unwrap(),
    )
    .with_external(
        "right.yaml",
        parse::from_yaml("components:\n  schemas:\n    Money:\n      type: string\n").unwrap(),
    );
    let err = transform::transform(&docs).unwrap_err();
    match err {
        TransformError::Naming(NamingError::Collision { name, first, second }) => {
            assert_eq!(name, "Money");
            assert_eq!(first, "left.yaml#/components/schemas/Money");
            assert_eq!(second, "right.yaml#/components/schemas/Money");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn resolution_is_deterministic() {
    assert_eq!(resolve(PETSTORE), resolve(PETSTORE));
    assert_eq!(resolve(ADDITIONAL), resolve(ADDITIONAL));
}
