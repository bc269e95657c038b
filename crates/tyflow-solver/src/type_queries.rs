//! Type classification queries.
//!
//! Free functions over `TypeInterner` that answer "what shape is this type"
//! without callers matching on `TypeKey` themselves.

use crate::intern::TypeInterner;
use crate::types::*;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tyflow_common::interner::Atom;

pub fn is_union_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(interner.lookup(type_id), Some(TypeKey::Union(_)))
}

pub fn is_intersection_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(interner.lookup(type_id), Some(TypeKey::Intersection(_)))
}

/// Members of a union, or the type itself.
pub fn union_members(interner: &TypeInterner, type_id: TypeId) -> Vec<TypeId> {
    match interner.lookup(type_id) {
        Some(TypeKey::Union(list)) => interner.type_list(list).to_vec(),
        _ => vec![type_id],
    }
}

/// Members of an intersection, or the type itself.
pub fn intersection_members(interner: &TypeInterner, type_id: TypeId) -> Vec<TypeId> {
    match interner.lookup(type_id) {
        Some(TypeKey::Intersection(list)) => interner.type_list(list).to_vec(),
        _ => vec![type_id],
    }
}

pub fn literal_value(interner: &TypeInterner, type_id: TypeId) -> Option<LiteralValue> {
    match interner.lookup(type_id)? {
        TypeKey::Literal(value) | TypeKey::FreshLiteral(value) => Some(value),
        _ => None,
    }
}

pub fn is_literal_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    literal_value(interner, type_id).is_some()
}

pub fn is_fresh_literal_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(interner.lookup(type_id), Some(TypeKey::FreshLiteral(_)))
}

pub fn is_string_literal(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(literal_value(interner, type_id), Some(LiteralValue::String(_)))
}

pub fn is_boolean_literal(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(literal_value(interner, type_id), Some(LiteralValue::Boolean(_)))
}

/// A type with exactly one value: literals, `null`, `undefined` and `void`.
pub fn is_unit_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    type_id.is_nullable() || is_literal_type(interner, type_id)
}

/// A unit type or a union made only of unit types.
pub fn is_literal_union_or_unit(interner: &TypeInterner, type_id: TypeId) -> bool {
    union_members(interner, type_id)
        .iter()
        .all(|&member| is_unit_type(interner, member))
}

pub fn is_primitive_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(
        type_id,
        TypeId::STRING
            | TypeId::NUMBER
            | TypeId::BIGINT
            | TypeId::BOOLEAN
            | TypeId::SYMBOL
            | TypeId::NULL
            | TypeId::UNDEFINED
            | TypeId::VOID
    ) || matches!(
        interner.lookup(type_id),
        Some(
            TypeKey::Literal(_)
                | TypeKey::FreshLiteral(_)
                | TypeKey::TemplateLiteral(_)
                | TypeKey::StringIntrinsic { .. }
        )
    )
}

pub fn is_type_parameter(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(interner.lookup(type_id), Some(TypeKey::TypeParameter(_)))
}

/// Type parameters and the deferred types built from them.
pub fn is_instantiable_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    match interner.lookup(type_id) {
        Some(
            TypeKey::TypeParameter(_)
            | TypeKey::Index(_)
            | TypeKey::IndexAccess(..)
            | TypeKey::Conditional(_)
            | TypeKey::Substitution { .. },
        ) => true,
        Some(TypeKey::Intersection(list)) => interner
            .type_list(list)
            .iter()
            .any(|&member| is_instantiable_type(interner, member)),
        _ => false,
    }
}

pub fn type_param_info(interner: &TypeInterner, type_id: TypeId) -> Option<TypeParamInfo> {
    match interner.lookup(type_id)? {
        TypeKey::TypeParameter(info) => Some(info),
        _ => None,
    }
}

pub fn object_shape_of(interner: &TypeInterner, type_id: TypeId) -> Option<Arc<ObjectShape>> {
    match interner.lookup(type_id)? {
        TypeKey::Object(shape_id) => Some(interner.object_shape(shape_id)),
        _ => None,
    }
}

/// Objects, arrays, tuples and the non-primitive `object`.
pub fn is_object_like_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    type_id == TypeId::OBJECT
        || matches!(
            interner.lookup(type_id),
            Some(
                TypeKey::Object(_)
                    | TypeKey::Array(_)
                    | TypeKey::Tuple(_)
                    | TypeKey::Application(_)
                    | TypeKey::Mapped(_)
                    | TypeKey::EvolvingArray(_)
            )
        )
}

pub fn is_function_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    object_shape_of(interner, type_id).is_some_and(|shape| {
        !shape.call_signatures.is_empty() || !shape.construct_signatures.is_empty()
    })
}

pub fn array_element_type(interner: &TypeInterner, type_id: TypeId) -> Option<TypeId> {
    match interner.lookup(type_id)? {
        TypeKey::Array(element) => Some(element),
        _ => None,
    }
}

pub fn tuple_elements(interner: &TypeInterner, type_id: TypeId) -> Option<Arc<[TupleElement]>> {
    match interner.lookup(type_id)? {
        TypeKey::Tuple(list) => Some(interner.tuple_list(list)),
        _ => None,
    }
}

pub fn is_array_or_tuple_type(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(
        interner.lookup(type_id),
        Some(TypeKey::Array(_) | TypeKey::Tuple(_))
    )
}

/// Element type of an array, or the union of a tuple's element types.
pub fn element_type_of_array_like(interner: &TypeInterner, type_id: TypeId) -> Option<TypeId> {
    match interner.lookup(type_id)? {
        TypeKey::Array(element) => Some(element),
        TypeKey::Tuple(list) => {
            let members: Vec<TypeId> = interner
                .tuple_list(list)
                .iter()
                .map(|e| {
                    if e.flags.contains(ElementFlags::VARIADIC) {
                        element_type_of_array_like(interner, e.type_id).unwrap_or(TypeId::UNKNOWN)
                    } else {
                        e.type_id
                    }
                })
                .collect();
            Some(interner.union(members))
        }
        _ => None,
    }
}

pub fn evolving_array_element(interner: &TypeInterner, type_id: TypeId) -> Option<TypeId> {
    match interner.lookup(type_id)? {
        TypeKey::EvolvingArray(element) => Some(element),
        _ => None,
    }
}

pub fn is_evolving_array(interner: &TypeInterner, type_id: TypeId) -> bool {
    evolving_array_element(interner, type_id).is_some()
}

pub fn application_of(interner: &TypeInterner, type_id: TypeId) -> Option<Arc<TypeApplication>> {
    match interner.lookup(type_id)? {
        TypeKey::Application(app_id) => Some(interner.type_application(app_id)),
        _ => None,
    }
}

/// Declared type of a named property of an object type.
pub fn property_of(interner: &TypeInterner, type_id: TypeId, name: Atom) -> Option<PropertyInfo> {
    object_shape_of(interner, type_id).and_then(|shape| shape.property(name).copied())
}

/// Whether the type refers to a type parameter anywhere in its structure.
///
/// Signatures that declare their own type parameters count as generic
/// too, since inference may still need to reach them.
pub fn could_contain_type_variables(interner: &TypeInterner, type_id: TypeId) -> bool {
    let mut visited = FxHashSet::default();
    contains_type_variables_inner(interner, type_id, &mut visited)
}

fn contains_type_variables_inner(
    interner: &TypeInterner,
    type_id: TypeId,
    visited: &mut FxHashSet<TypeId>,
) -> bool {
    if type_id.is_intrinsic() || !visited.insert(type_id) {
        return false;
    }
    let Some(key) = interner.lookup(type_id) else {
        return false;
    };
    let mut check = |id: TypeId| contains_type_variables_inner(interner, id, visited);
    match key {
        TypeKey::TypeParameter(_)
        | TypeKey::Index(_)
        | TypeKey::IndexAccess(..)
        | TypeKey::Conditional(_)
        | TypeKey::Mapped(_)
        | TypeKey::Substitution { .. } => true,
        TypeKey::Intrinsic(_) | TypeKey::Literal(_) | TypeKey::FreshLiteral(_) => false,
        TypeKey::Union(list) | TypeKey::Intersection(list) => {
            interner.type_list(list).iter().any(|&member| check(member))
        }
        TypeKey::Array(element) | TypeKey::EvolvingArray(element) => check(element),
        TypeKey::Tuple(list) => interner.tuple_list(list).iter().any(|e| check(e.type_id)),
        TypeKey::Application(app_id) => interner
            .type_application(app_id)
            .args
            .iter()
            .any(|&arg| check(arg)),
        TypeKey::TemplateLiteral(id) => interner
            .template_literal_type(id)
            .types
            .iter()
            .any(|&t| check(t)),
        TypeKey::StringIntrinsic { type_arg, .. } => check(type_arg),
        TypeKey::Object(shape_id) => {
            let shape = interner.object_shape(shape_id);
            shape.properties.iter().any(|p| check(p.type_id))
                || shape
                    .call_signatures
                    .iter()
                    .chain(shape.construct_signatures.iter())
                    .any(|sig| {
                        !sig.type_params.is_empty()
                            || sig.params.iter().any(|p| check(p.type_id))
                            || check(sig.return_type)
                            || sig.this_type.is_some_and(&mut check)
                            || sig
                                .type_predicate
                                .and_then(|p| p.type_id)
                                .is_some_and(&mut check)
                    })
                || shape.string_index.is_some_and(|i| check(i.value_type))
                || shape.number_index.is_some_and(|i| check(i.value_type))
        }
    }
}

/// Whether a type parameter occurs anywhere in the type. Unlike
/// `could_contain_type_variables`, a concrete `keyof` or conditional type
/// does not count.
pub fn contains_type_parameters(interner: &TypeInterner, type_id: TypeId) -> bool {
    let mut visited = FxHashSet::default();
    contains_type_parameters_inner(interner, type_id, &mut visited)
}

fn contains_type_parameters_inner(
    interner: &TypeInterner,
    type_id: TypeId,
    visited: &mut FxHashSet<TypeId>,
) -> bool {
    if type_id.is_intrinsic() || !visited.insert(type_id) {
        return false;
    }
    if matches!(interner.lookup(type_id), Some(TypeKey::TypeParameter(_))) {
        return true;
    }
    let mut children = Vec::new();
    for_each_child(interner, type_id, |child| children.push(child));
    children
        .into_iter()
        .any(|child| contains_type_parameters_inner(interner, child, visited))
}

/// Whether `needle` occurs anywhere inside `haystack`.
pub fn type_contains(interner: &TypeInterner, haystack: TypeId, needle: TypeId) -> bool {
    let mut visited = FxHashSet::default();
    type_contains_inner(interner, haystack, needle, &mut visited)
}

fn type_contains_inner(
    interner: &TypeInterner,
    haystack: TypeId,
    needle: TypeId,
    visited: &mut FxHashSet<TypeId>,
) -> bool {
    if haystack == needle {
        return true;
    }
    if haystack.is_intrinsic() || !visited.insert(haystack) {
        return false;
    }
    let mut children = Vec::new();
    for_each_child(interner, haystack, |child| children.push(child));
    children
        .into_iter()
        .any(|child| type_contains_inner(interner, child, needle, visited))
}

/// Visit the immediate child types of `type_id`.
pub fn for_each_child(interner: &TypeInterner, type_id: TypeId, mut f: impl FnMut(TypeId)) {
    let Some(key) = interner.lookup(type_id) else {
        return;
    };
    match key {
        TypeKey::Intrinsic(_)
        | TypeKey::Literal(_)
        | TypeKey::FreshLiteral(_)
        | TypeKey::TypeParameter(_) => {}
        TypeKey::Union(list) | TypeKey::Intersection(list) => {
            interner.type_list(list).iter().for_each(|&t| f(t));
        }
        TypeKey::Array(element) | TypeKey::EvolvingArray(element) | TypeKey::Index(element) => {
            f(element)
        }
        TypeKey::Tuple(list) => interner.tuple_list(list).iter().for_each(|e| f(e.type_id)),
        TypeKey::Application(app_id) => interner
            .type_application(app_id)
            .args
            .iter()
            .for_each(|&t| f(t)),
        TypeKey::IndexAccess(object, index) => {
            f(object);
            f(index);
        }
        TypeKey::Conditional(id) => {
            let cond = interner.conditional_type(id);
            f(cond.check_type);
            f(cond.extends_type);
            f(cond.true_type);
            f(cond.false_type);
        }
        TypeKey::Mapped(id) => {
            let mapped = interner.mapped_type(id);
            f(mapped.constraint);
            f(mapped.template);
            if let Some(name_type) = mapped.name_type {
                f(name_type);
            }
        }
        TypeKey::TemplateLiteral(id) => interner
            .template_literal_type(id)
            .types
            .iter()
            .for_each(|&t| f(t)),
        TypeKey::StringIntrinsic { type_arg, .. } => f(type_arg),
        TypeKey::Substitution { base, constraint } => {
            f(base);
            f(constraint);
        }
        TypeKey::Object(shape_id) => {
            let shape = interner.object_shape(shape_id);
            shape.properties.iter().for_each(|p| f(p.type_id));
            for sig in shape
                .call_signatures
                .iter()
                .chain(shape.construct_signatures.iter())
            {
                sig.params.iter().for_each(|p| f(p.type_id));
                f(sig.return_type);
            }
            if let Some(index) = shape.string_index {
                f(index.value_type);
            }
            if let Some(index) = shape.number_index {
                f(index.value_type);
            }
        }
    }
}

/// Identity used to compare nesting levels during inference: types that
/// are instantiations of the same declaration share a recursion identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecursionIdentity {
    Definition(DefId),
    Shape(ObjectShapeId),
    Type(TypeId),
}

pub fn recursion_identity(interner: &TypeInterner, type_id: TypeId) -> RecursionIdentity {
    match interner.lookup(type_id) {
        Some(TypeKey::Application(app_id)) => {
            RecursionIdentity::Definition(interner.type_application(app_id).base)
        }
        Some(TypeKey::Object(shape_id)) => {
            match interner.object_shape(shape_id).nominal {
                Some(def) => RecursionIdentity::Definition(def),
                None => RecursionIdentity::Shape(shape_id),
            }
        }
        Some(TypeKey::IndexAccess(object, _)) => recursion_identity(interner, object),
        Some(TypeKey::Conditional(id)) => {
            RecursionIdentity::Type(interner.conditional_type(id).check_type)
        }
        _ => RecursionIdentity::Type(type_id),
    }
}
