use crate::error::SchemaError;
use crate::ir::{AdditionalMode, Field, TypeRef};

/// Fields and open-map policy accumulated while merging `allOf` members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    pub fields: Vec<Field>,
    pub additional: AdditionalMode,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            additional: AdditionalMode::Forbidden,
        }
    }
}

impl FieldSet {
    /// Merge a later member into this set.
    ///
    /// A repeated wire key keeps its earlier position; the later declaration's
    /// `required`, `nullable` and description win. Different types for the
    /// same key cannot be represented and are reported.
    pub fn merge(&mut self, owner: &str, later: FieldSet) -> Result<(), SchemaError> {
        for field in later.fields {
            match self.fields.iter_mut().find(|f| f.wire_key == field.wire_key) {
                Some(existing) if existing.ty == field.ty => {
                    existing.required = field.required;
                    existing.nullable = field.nullable;
                    if field.description.is_some() {
                        existing.description = field.description;
                    }
                }
                Some(_) => {
                    return Err(SchemaError::CompositionConflict {
                        owner: owner.to_string(),
                        field: field.wire_key,
                    });
                }
                None => self.fields.push(field),
            }
        }
        self.additional = merge_additional(owner, &self.additional, later.additional)?;
        Ok(())
    }

    /// Apply a `required` list that may name fields declared by other members.
    pub fn mark_required(&mut self, keys: &[String]) {
        for field in &mut self.fields {
            if keys.contains(&field.wire_key) {
                field.required = true;
            }
        }
    }
}

fn merge_additional(
    owner: &str,
    earlier: &AdditionalMode,
    later: AdditionalMode,
) -> Result<AdditionalMode, SchemaError> {
    match (earlier, later) {
        (AdditionalMode::Forbidden, later) => Ok(later),
        (earlier, AdditionalMode::Forbidden) => Ok(earlier.clone()),
        (earlier, later) if *earlier == later => Ok(later),
        (AdditionalMode::Typed(TypeRef::Any), AdditionalMode::Arbitrary)
        | (AdditionalMode::Arbitrary, AdditionalMode::Typed(TypeRef::Any)) => {
            Ok(AdditionalMode::Arbitrary)
        }
        _ => Err(SchemaError::CompositionConflict {
            owner: owner.to_string(),
            field: "additionalProperties".to_string(),
        }),
    }
}
