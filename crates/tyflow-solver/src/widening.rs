//! Literal widening.
//!
//! - `base_type_of_literal`: every literal to its primitive (`"a"` to `string`)
//! - `widened_literal_type`: only fresh literals, as produced by expressions
//! - `widened_type`: object literal freshness and, without strict null
//!   checks, `null`/`undefined` to `any`

use crate::intern::TypeInterner;
use crate::types::*;

/// Primitive type of a literal; unions are mapped member-wise.
pub fn base_type_of_literal(interner: &TypeInterner, type_id: TypeId) -> TypeId {
    match interner.lookup(type_id) {
        Some(TypeKey::Literal(value) | TypeKey::FreshLiteral(value)) => primitive_of(value),
        Some(TypeKey::TemplateLiteral(_) | TypeKey::StringIntrinsic { .. }) => TypeId::STRING,
        Some(TypeKey::Union(list)) => {
            let members: Vec<TypeId> = interner
                .type_list(list)
                .iter()
                .map(|&member| base_type_of_literal(interner, member))
                .collect();
            interner.union(members)
        }
        _ => type_id,
    }
}

/// Widen fresh literals to their primitive; regular literals are kept.
pub fn widened_literal_type(interner: &TypeInterner, type_id: TypeId) -> TypeId {
    match interner.lookup(type_id) {
        Some(TypeKey::FreshLiteral(value)) => primitive_of(value),
        Some(TypeKey::Union(list)) => {
            let members: Vec<TypeId> = interner
                .type_list(list)
                .iter()
                .map(|&member| widened_literal_type(interner, member))
                .collect();
            interner.union(members)
        }
        _ => type_id,
    }
}

fn primitive_of(value: LiteralValue) -> TypeId {
    match value {
        LiteralValue::String(_) => TypeId::STRING,
        LiteralValue::Number(_) => TypeId::NUMBER,
        LiteralValue::BigInt(_) => TypeId::BIGINT,
        LiteralValue::Boolean(_) => TypeId::BOOLEAN,
    }
}

/// Widened form of an inferred or declared-by-initializer type.
pub fn widened_type(interner: &TypeInterner, type_id: TypeId, strict_null_checks: bool) -> TypeId {
    if !strict_null_checks && matches!(type_id, TypeId::NULL | TypeId::UNDEFINED) {
        return TypeId::ANY;
    }
    match interner.lookup(type_id) {
        Some(TypeKey::Union(list)) => {
            let members: Vec<TypeId> = interner
                .type_list(list)
                .iter()
                .map(|&member| {
                    if member.is_nullable() {
                        member
                    } else {
                        widened_type(interner, member, strict_null_checks)
                    }
                })
                .collect();
            let widened = interner.union(members);
            if !strict_null_checks
                && crate::type_queries::union_members(interner, widened)
                    .iter()
                    .all(|m| m.is_nullable())
            {
                return TypeId::ANY;
            }
            widened
        }
        Some(TypeKey::Object(shape_id)) => {
            let shape = interner.object_shape(shape_id);
            if !shape.flags.contains(ObjectFlags::FRESH_LITERAL) {
                return type_id;
            }
            let mut widened = (*shape).clone();
            widened.flags.remove(ObjectFlags::FRESH_LITERAL);
            for prop in &mut widened.properties {
                prop.type_id = widened_type(
                    interner,
                    widened_literal_type(interner, prop.type_id),
                    strict_null_checks,
                );
            }
            interner.object_with_shape(widened)
        }
        Some(TypeKey::Array(element)) => {
            let widened = widened_type(interner, element, strict_null_checks);
            if widened == element {
                type_id
            } else {
                interner.array(widened)
            }
        }
        _ => type_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fresh_literals_widen() {
        let interner = TypeInterner::new();
        let fresh = interner.fresh_literal_number(1.0);
        let regular = interner.literal_number(1.0);
        assert_eq!(widened_literal_type(&interner, fresh), TypeId::NUMBER);
        assert_eq!(widened_literal_type(&interner, regular), regular);
        assert_eq!(base_type_of_literal(&interner, regular), TypeId::NUMBER);
    }

    #[test]
    fn test_boolean_literals_widen_to_boolean() {
        let interner = TypeInterner::new();
        assert_eq!(
            base_type_of_literal(&interner, TypeId::BOOLEAN_TRUE),
            TypeId::BOOLEAN
        );
        assert_eq!(
            widened_literal_type(&interner, TypeId::FRESH_FALSE),
            TypeId::BOOLEAN
        );
    }

    #[test]
    fn test_nullable_widening_depends_on_strictness() {
        let interner = TypeInterner::new();
        assert_eq!(widened_type(&interner, TypeId::NULL, false), TypeId::ANY);
        assert_eq!(widened_type(&interner, TypeId::NULL, true), TypeId::NULL);
    }
}
