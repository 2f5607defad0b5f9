use std::collections::HashSet;

use crate::ir::{TypeArena, TypeId, TypeKind};

/// Mark every struct field and union variant whose by-value reference can
/// reach its owner again. Those members must be stored behind a pointer.
///
/// Arrays and maps already allocate, so only direct `Named` references and
/// aliases count as by-value edges.
pub fn mark_indirect(arena: &mut TypeArena) {
    let mut marks: Vec<(TypeId, usize)> = Vec::new();
    for ty in arena.iter() {
        let members: Vec<Option<TypeId>> = match &ty.kind {
            TypeKind::Struct { fields, .. } => fields.iter().map(|f| f.ty.named()).collect(),
            TypeKind::Union(variants) => variants.iter().map(|v| v.ty.named()).collect(),
            _ => continue,
        };
        for (index, target) in members.into_iter().enumerate() {
            if let Some(target) = target
                && reaches(arena, target, ty.id)
            {
                marks.push((ty.id, index));
            }
        }
    }

    let types = arena.types_mut();
    for (owner, index) in marks {
        log::debug!("boxing member {index} of type #{} to break a cycle", owner.0);
        match &mut types[owner.0].kind {
            TypeKind::Struct { fields, .. } => fields[index].indirect = true,
            TypeKind::Union(variants) => variants[index].indirect = true,
            _ => {}
        }
    }
}

fn by_value_edges(arena: &TypeArena, id: TypeId) -> Vec<TypeId> {
    let Some(ty) = arena.get(id) else {
        return Vec::new();
    };
    match &ty.kind {
        TypeKind::Struct { fields, .. } => fields.iter().filter_map(|f| f.ty.named()).collect(),
        TypeKind::Union(variants) => variants.iter().filter_map(|v| v.ty.named()).collect(),
        TypeKind::Alias(target) => target.named().into_iter().collect(),
        TypeKind::Map(_) | TypeKind::Enum(_) => Vec::new(),
    }
}

fn reaches(arena: &TypeArena, from: TypeId, goal: TypeId) -> bool {
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(id) = stack.pop() {
        if id == goal {
            return true;
        }
        if seen.insert(id) {
            stack.extend(by_value_edges(arena, id));
        }
    }
    false
}
