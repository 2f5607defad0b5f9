use indexmap::IndexMap;

use crate::error::NamingError;
use crate::ir::TypeId;
use crate::parse::reference::RefTarget;

use super::name_normalizer::normalize_name;

/// Single-pass name table shared by every type of one run.
///
/// Names are never suffixed to dodge a clash: a clash is reported with both
/// declaration sites and the caller decides whether it is a duplicate.
#[derive(Debug, Default)]
pub struct Namer {
    taken: IndexMap<String, (TypeId, String)>,
}

impl Namer {
    pub fn claim(&mut self, name: &str, id: TypeId, origin: &str) -> Result<(), NamingError> {
        if let Some((_, first)) = self.taken.get(name) {
            return Err(NamingError::Collision {
                name: name.to_string(),
                first: first.clone(),
                second: origin.to_string(),
            });
        }
        self.taken
            .insert(name.to_string(), (id, origin.to_string()));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<(TypeId, &str)> {
        self.taken
            .get(name)
            .map(|(id, origin)| (*id, origin.as_str()))
    }
}

/// Name of a type declared by reference: its component key in PascalCase.
pub fn component_type_name(target: &RefTarget) -> String {
    normalize_name(&target.leaf_name()).pascal_case
}

/// Name of an anonymous object hoisted out of `field`: `<Enclosing>_<Field>`.
pub fn nested_type_name(enclosing: &str, field: &str) -> String {
    format!("{enclosing}_{}", normalize_name(field).pascal_case)
}

/// Name of an anonymous array item schema.
pub fn item_type_name(enclosing: &str) -> String {
    format!("{enclosing}Item")
}

/// Name of an anonymous `additionalProperties` value schema.
pub fn additional_type_name(enclosing: &str) -> String {
    format!("{enclosing}_AdditionalProperties")
}

/// Name of the `index`-th (1-based) anonymous union member.
pub fn variant_type_name(enclosing: &str, index: usize) -> String {
    format!("{enclosing}_Variant{index}")
}

/// Name of an inline parameter schema: `<Operation>Params_<Param>`.
pub fn param_type_name(operation: &str, param: &str) -> String {
    format!("{operation}Params_{}", normalize_name(param).pascal_case)
}

/// Name of an inline request body schema: `<Operation><Tag>Body`.
pub fn body_type_name(operation: &str, tag: &str) -> String {
    format!("{operation}{tag}Body")
}

/// Name of an inline response schema: `<Operation><Tag><Status>Response`.
pub fn response_type_name(operation: &str, tag: &str, status: &str) -> String {
    format!("{operation}{tag}{status}Response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_collision_reports_both_sites() {
        let mut namer = Namer::default();
        namer.claim("Pet", TypeId(0), "#/components/schemas/Pet").unwrap();
        let err = namer
            .claim("Pet", TypeId(1), "common.yaml#/components/schemas/Pet")
            .unwrap_err();
        match err {
            NamingError::Collision { name, first, second } => {
                assert_eq!(name, "Pet");
                assert_eq!(first, "#/components/schemas/Pet");
                assert_eq!(second, "common.yaml#/components/schemas/Pet");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(namer.get("Pet").map(|(id, _)| id), Some(TypeId(0)));
    }

    #[test]
    fn test_synthesized_names() {
        assert_eq!(
            nested_type_name("AdditionalPropertiesObject4", "inner"),
            "AdditionalPropertiesObject4_Inner"
        );
        assert_eq!(
            param_type_name("ParamsWithAddProps", "p1"),
            "ParamsWithAddPropsParams_P1"
        );
        assert_eq!(body_type_name("BodyWithAddProps", "Json"), "BodyWithAddPropsJsonBody");
        assert_eq!(
            response_type_name("ListPets", "Json", "200"),
            "ListPetsJson200Response"
        );
        assert_eq!(variant_type_name("Shape", 2), "Shape_Variant2");
        assert_eq!(item_type_name("Pet_Tags"), "Pet_TagsItem");
    }

    #[test]
    fn test_component_type_name() {
        let target = RefTarget::new("b.yaml", "/components/schemas/object_b");
        assert_eq!(component_type_name(&target), "ObjectB");
    }
}
