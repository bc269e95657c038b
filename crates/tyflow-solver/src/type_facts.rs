//! Type facts: which runtime checks a value of a given type may pass.
//!
//! Narrowing by `typeof`, equality with `null`/`undefined` and truthiness is
//! table-driven. Every type maps to a `TypeFacts` set; a constituent survives
//! a narrowing when it has the fact the condition requires.

use crate::intern::TypeInterner;
use crate::type_queries;
use crate::types::*;
use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFacts: u32 {
        const TYPEOF_EQ_STRING = 1 << 0;
        const TYPEOF_EQ_NUMBER = 1 << 1;
        const TYPEOF_EQ_BIGINT = 1 << 2;
        const TYPEOF_EQ_BOOLEAN = 1 << 3;
        const TYPEOF_EQ_SYMBOL = 1 << 4;
        const TYPEOF_EQ_OBJECT = 1 << 5;
        const TYPEOF_EQ_FUNCTION = 1 << 6;
        const TYPEOF_EQ_HOST_OBJECT = 1 << 7;
        const TYPEOF_NE_STRING = 1 << 8;
        const TYPEOF_NE_NUMBER = 1 << 9;
        const TYPEOF_NE_BIGINT = 1 << 10;
        const TYPEOF_NE_BOOLEAN = 1 << 11;
        const TYPEOF_NE_SYMBOL = 1 << 12;
        const TYPEOF_NE_OBJECT = 1 << 13;
        const TYPEOF_NE_FUNCTION = 1 << 14;
        const TYPEOF_NE_HOST_OBJECT = 1 << 15;
        const EQ_UNDEFINED = 1 << 16;
        const EQ_NULL = 1 << 17;
        const EQ_UNDEFINED_OR_NULL = 1 << 18;
        const NE_UNDEFINED = 1 << 19;
        const NE_NULL = 1 << 20;
        const NE_UNDEFINED_OR_NULL = 1 << 21;
        const TRUTHY = 1 << 22;
        const FALSY = 1 << 23;
        const IS_UNDEFINED = 1 << 24;
        const IS_NULL = 1 << 25;
        const IS_UNDEFINED_OR_NULL = Self::IS_UNDEFINED.bits() | Self::IS_NULL.bits();
        const ALL = (1 << 27) - 1;

        const BASE_STRING_STRICT_FACTS = Self::TYPEOF_EQ_STRING.bits()
            | Self::TYPEOF_NE_NUMBER.bits() | Self::TYPEOF_NE_BIGINT.bits()
            | Self::TYPEOF_NE_BOOLEAN.bits() | Self::TYPEOF_NE_SYMBOL.bits()
            | Self::TYPEOF_NE_OBJECT.bits() | Self::TYPEOF_NE_FUNCTION.bits()
            | Self::TYPEOF_NE_HOST_OBJECT.bits() | Self::NE_UNDEFINED.bits()
            | Self::NE_NULL.bits() | Self::NE_UNDEFINED_OR_NULL.bits();
        const BASE_STRING_FACTS = Self::BASE_STRING_STRICT_FACTS.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::FALSY.bits();
        const STRING_STRICT_FACTS = Self::BASE_STRING_STRICT_FACTS.bits()
            | Self::TRUTHY.bits() | Self::FALSY.bits();
        const STRING_FACTS = Self::BASE_STRING_FACTS.bits() | Self::TRUTHY.bits();
        const EMPTY_STRING_STRICT_FACTS = Self::BASE_STRING_STRICT_FACTS.bits() | Self::FALSY.bits();
        const EMPTY_STRING_FACTS = Self::BASE_STRING_FACTS.bits();
        const NON_EMPTY_STRING_STRICT_FACTS = Self::BASE_STRING_STRICT_FACTS.bits() | Self::TRUTHY.bits();
        const NON_EMPTY_STRING_FACTS = Self::BASE_STRING_FACTS.bits() | Self::TRUTHY.bits();

        const BASE_NUMBER_STRICT_FACTS = Self::TYPEOF_EQ_NUMBER.bits()
            | Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_BIGINT.bits()
            | Self::TYPEOF_NE_BOOLEAN.bits() | Self::TYPEOF_NE_SYMBOL.bits()
            | Self::TYPEOF_NE_OBJECT.bits() | Self::TYPEOF_NE_FUNCTION.bits()
            | Self::TYPEOF_NE_HOST_OBJECT.bits() | Self::NE_UNDEFINED.bits()
            | Self::NE_NULL.bits() | Self::NE_UNDEFINED_OR_NULL.bits();
        const BASE_NUMBER_FACTS = Self::BASE_NUMBER_STRICT_FACTS.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::FALSY.bits();
        const NUMBER_STRICT_FACTS = Self::BASE_NUMBER_STRICT_FACTS.bits()
            | Self::TRUTHY.bits() | Self::FALSY.bits();
        const NUMBER_FACTS = Self::BASE_NUMBER_FACTS.bits() | Self::TRUTHY.bits();
        const ZERO_NUMBER_STRICT_FACTS = Self::BASE_NUMBER_STRICT_FACTS.bits() | Self::FALSY.bits();
        const ZERO_NUMBER_FACTS = Self::BASE_NUMBER_FACTS.bits();
        const NON_ZERO_NUMBER_STRICT_FACTS = Self::BASE_NUMBER_STRICT_FACTS.bits() | Self::TRUTHY.bits();
        const NON_ZERO_NUMBER_FACTS = Self::BASE_NUMBER_FACTS.bits() | Self::TRUTHY.bits();

        const BASE_BIGINT_STRICT_FACTS = Self::TYPEOF_EQ_BIGINT.bits()
            | Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BOOLEAN.bits() | Self::TYPEOF_NE_SYMBOL.bits()
            | Self::TYPEOF_NE_OBJECT.bits() | Self::TYPEOF_NE_FUNCTION.bits()
            | Self::TYPEOF_NE_HOST_OBJECT.bits() | Self::NE_UNDEFINED.bits()
            | Self::NE_NULL.bits() | Self::NE_UNDEFINED_OR_NULL.bits();
        const BASE_BIGINT_FACTS = Self::BASE_BIGINT_STRICT_FACTS.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::FALSY.bits();
        const BIGINT_STRICT_FACTS = Self::BASE_BIGINT_STRICT_FACTS.bits()
            | Self::TRUTHY.bits() | Self::FALSY.bits();
        const BIGINT_FACTS = Self::BASE_BIGINT_FACTS.bits() | Self::TRUTHY.bits();
        const ZERO_BIGINT_STRICT_FACTS = Self::BASE_BIGINT_STRICT_FACTS.bits() | Self::FALSY.bits();
        const ZERO_BIGINT_FACTS = Self::BASE_BIGINT_FACTS.bits();
        const NON_ZERO_BIGINT_STRICT_FACTS = Self::BASE_BIGINT_STRICT_FACTS.bits() | Self::TRUTHY.bits();
        const NON_ZERO_BIGINT_FACTS = Self::BASE_BIGINT_FACTS.bits() | Self::TRUTHY.bits();

        const BASE_BOOLEAN_STRICT_FACTS = Self::TYPEOF_EQ_BOOLEAN.bits()
            | Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BIGINT.bits() | Self::TYPEOF_NE_SYMBOL.bits()
            | Self::TYPEOF_NE_OBJECT.bits() | Self::TYPEOF_NE_FUNCTION.bits()
            | Self::TYPEOF_NE_HOST_OBJECT.bits() | Self::NE_UNDEFINED.bits()
            | Self::NE_NULL.bits() | Self::NE_UNDEFINED_OR_NULL.bits();
        const BASE_BOOLEAN_FACTS = Self::BASE_BOOLEAN_STRICT_FACTS.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::FALSY.bits();
        const FALSE_STRICT_FACTS = Self::BASE_BOOLEAN_STRICT_FACTS.bits() | Self::FALSY.bits();
        const FALSE_FACTS = Self::BASE_BOOLEAN_FACTS.bits();
        const TRUE_STRICT_FACTS = Self::BASE_BOOLEAN_STRICT_FACTS.bits() | Self::TRUTHY.bits();
        const TRUE_FACTS = Self::BASE_BOOLEAN_FACTS.bits() | Self::TRUTHY.bits();

        const SYMBOL_STRICT_FACTS = Self::TYPEOF_EQ_SYMBOL.bits()
            | Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BIGINT.bits() | Self::TYPEOF_NE_BOOLEAN.bits()
            | Self::TYPEOF_NE_OBJECT.bits() | Self::TYPEOF_NE_FUNCTION.bits()
            | Self::TYPEOF_NE_HOST_OBJECT.bits() | Self::NE_UNDEFINED.bits()
            | Self::NE_NULL.bits() | Self::NE_UNDEFINED_OR_NULL.bits() | Self::TRUTHY.bits();
        const SYMBOL_FACTS = Self::SYMBOL_STRICT_FACTS.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::FALSY.bits();

        const OBJECT_STRICT_FACTS = Self::TYPEOF_EQ_OBJECT.bits() | Self::TYPEOF_EQ_HOST_OBJECT.bits()
            | Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BIGINT.bits() | Self::TYPEOF_NE_BOOLEAN.bits()
            | Self::TYPEOF_NE_SYMBOL.bits() | Self::TYPEOF_NE_FUNCTION.bits()
            | Self::NE_UNDEFINED.bits() | Self::NE_NULL.bits()
            | Self::NE_UNDEFINED_OR_NULL.bits() | Self::TRUTHY.bits();
        const OBJECT_FACTS = Self::OBJECT_STRICT_FACTS.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::FALSY.bits();

        const FUNCTION_STRICT_FACTS = Self::TYPEOF_EQ_FUNCTION.bits() | Self::TYPEOF_EQ_HOST_OBJECT.bits()
            | Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BIGINT.bits() | Self::TYPEOF_NE_BOOLEAN.bits()
            | Self::TYPEOF_NE_SYMBOL.bits() | Self::TYPEOF_NE_OBJECT.bits()
            | Self::NE_UNDEFINED.bits() | Self::NE_NULL.bits()
            | Self::NE_UNDEFINED_OR_NULL.bits() | Self::TRUTHY.bits();
        const FUNCTION_FACTS = Self::FUNCTION_STRICT_FACTS.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::FALSY.bits();

        const VOID_FACTS = Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BIGINT.bits() | Self::TYPEOF_NE_BOOLEAN.bits()
            | Self::TYPEOF_NE_SYMBOL.bits() | Self::TYPEOF_NE_OBJECT.bits()
            | Self::TYPEOF_NE_FUNCTION.bits() | Self::TYPEOF_NE_HOST_OBJECT.bits()
            | Self::EQ_UNDEFINED.bits() | Self::EQ_UNDEFINED_OR_NULL.bits()
            | Self::NE_NULL.bits() | Self::FALSY.bits();
        const UNDEFINED_FACTS = Self::VOID_FACTS.bits() | Self::IS_UNDEFINED.bits();
        const NULL_FACTS = Self::TYPEOF_EQ_OBJECT.bits()
            | Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BIGINT.bits() | Self::TYPEOF_NE_BOOLEAN.bits()
            | Self::TYPEOF_NE_SYMBOL.bits() | Self::TYPEOF_NE_FUNCTION.bits()
            | Self::TYPEOF_NE_HOST_OBJECT.bits() | Self::EQ_NULL.bits()
            | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::NE_UNDEFINED.bits()
            | Self::FALSY.bits() | Self::IS_NULL.bits();

        const EMPTY_OBJECT_STRICT_FACTS = Self::ALL.bits()
            & !(Self::EQ_UNDEFINED.bits() | Self::EQ_NULL.bits()
                | Self::EQ_UNDEFINED_OR_NULL.bits() | Self::IS_UNDEFINED_OR_NULL.bits());
        const EMPTY_OBJECT_FACTS = Self::ALL.bits() & !Self::IS_UNDEFINED_OR_NULL.bits();
        const UNKNOWN_FACTS = Self::ALL.bits() & !Self::IS_UNDEFINED_OR_NULL.bits();

        /// Every not-equal fact a `typeof` switch can establish.
        const ALL_TYPEOF_NE = Self::TYPEOF_NE_STRING.bits() | Self::TYPEOF_NE_NUMBER.bits()
            | Self::TYPEOF_NE_BIGINT.bits() | Self::TYPEOF_NE_BOOLEAN.bits()
            | Self::TYPEOF_NE_SYMBOL.bits() | Self::TYPEOF_NE_OBJECT.bits()
            | Self::TYPEOF_NE_FUNCTION.bits() | Self::NE_UNDEFINED.bits();

        const OR_FACTS_MASK = Self::TYPEOF_EQ_FUNCTION.bits() | Self::TYPEOF_NE_OBJECT.bits();
        const AND_FACTS_MASK = Self::ALL.bits() & !Self::OR_FACTS_MASK.bits();
    }
}

/// The typeof tags recognised by narrowing.
pub const TYPEOF_TAGS: [&str; 8] = [
    "string",
    "number",
    "bigint",
    "boolean",
    "symbol",
    "undefined",
    "object",
    "function",
];

/// Facts required of a constituent when `typeof x === tag`.
pub fn typeof_eq_facts(tag: &str) -> Option<TypeFacts> {
    Some(match tag {
        "string" => TypeFacts::TYPEOF_EQ_STRING,
        "number" => TypeFacts::TYPEOF_EQ_NUMBER,
        "bigint" => TypeFacts::TYPEOF_EQ_BIGINT,
        "boolean" => TypeFacts::TYPEOF_EQ_BOOLEAN,
        "symbol" => TypeFacts::TYPEOF_EQ_SYMBOL,
        "undefined" => TypeFacts::EQ_UNDEFINED,
        "object" => TypeFacts::TYPEOF_EQ_OBJECT,
        "function" => TypeFacts::TYPEOF_EQ_FUNCTION,
        _ => return None,
    })
}

/// Facts required of a constituent when `typeof x !== tag`.
pub fn typeof_ne_facts(tag: &str) -> Option<TypeFacts> {
    Some(match tag {
        "string" => TypeFacts::TYPEOF_NE_STRING,
        "number" => TypeFacts::TYPEOF_NE_NUMBER,
        "bigint" => TypeFacts::TYPEOF_NE_BIGINT,
        "boolean" => TypeFacts::TYPEOF_NE_BOOLEAN,
        "symbol" => TypeFacts::TYPEOF_NE_SYMBOL,
        "undefined" => TypeFacts::NE_UNDEFINED,
        "object" => TypeFacts::TYPEOF_NE_OBJECT,
        "function" => TypeFacts::TYPEOF_NE_FUNCTION,
        _ => return None,
    })
}

/// Facts of `type_id`. Generic types answer for their constraint.
pub fn type_facts(interner: &TypeInterner, type_id: TypeId, strict_null_checks: bool) -> TypeFacts {
    type_facts_inner(interner, type_id, strict_null_checks, 0)
}

fn pick(strict: bool, strict_facts: TypeFacts, loose_facts: TypeFacts) -> TypeFacts {
    if strict { strict_facts } else { loose_facts }
}

fn type_facts_inner(
    interner: &TypeInterner,
    type_id: TypeId,
    strict: bool,
    depth: u32,
) -> TypeFacts {
    if depth > 20 {
        return TypeFacts::UNKNOWN_FACTS;
    }
    match type_id {
        id if id.is_never() => return TypeFacts::empty(),
        TypeId::STRING => {
            return pick(strict, TypeFacts::STRING_STRICT_FACTS, TypeFacts::STRING_FACTS);
        }
        TypeId::NUMBER => {
            return pick(strict, TypeFacts::NUMBER_STRICT_FACTS, TypeFacts::NUMBER_FACTS);
        }
        TypeId::BIGINT => {
            return pick(strict, TypeFacts::BIGINT_STRICT_FACTS, TypeFacts::BIGINT_FACTS);
        }
        TypeId::SYMBOL => {
            return pick(strict, TypeFacts::SYMBOL_STRICT_FACTS, TypeFacts::SYMBOL_FACTS);
        }
        TypeId::OBJECT => {
            return pick(strict, TypeFacts::OBJECT_STRICT_FACTS, TypeFacts::OBJECT_FACTS);
        }
        TypeId::VOID => return TypeFacts::VOID_FACTS,
        TypeId::UNDEFINED => return TypeFacts::UNDEFINED_FACTS,
        TypeId::NULL => return TypeFacts::NULL_FACTS,
        TypeId::EMPTY_OBJECT => {
            return pick(
                strict,
                TypeFacts::EMPTY_OBJECT_STRICT_FACTS,
                TypeFacts::EMPTY_OBJECT_FACTS,
            );
        }
        id if id.is_any() || id == TypeId::UNKNOWN || id == TypeId::ERROR => {
            return TypeFacts::UNKNOWN_FACTS;
        }
        _ => {}
    }

    let Some(key) = interner.lookup(type_id) else {
        return TypeFacts::UNKNOWN_FACTS;
    };
    match key {
        TypeKey::Literal(value) | TypeKey::FreshLiteral(value) => match value {
            LiteralValue::String(atom) => {
                let empty = interner.resolve_atom(atom).is_empty();
                match (empty, strict) {
                    (true, true) => TypeFacts::EMPTY_STRING_STRICT_FACTS,
                    (true, false) => TypeFacts::EMPTY_STRING_FACTS,
                    (false, true) => TypeFacts::NON_EMPTY_STRING_STRICT_FACTS,
                    (false, false) => TypeFacts::NON_EMPTY_STRING_FACTS,
                }
            }
            LiteralValue::Number(n) => {
                let zero = n.0 == 0.0 || n.0.is_nan();
                match (zero, strict) {
                    (true, true) => TypeFacts::ZERO_NUMBER_STRICT_FACTS,
                    (true, false) => TypeFacts::ZERO_NUMBER_FACTS,
                    (false, true) => TypeFacts::NON_ZERO_NUMBER_STRICT_FACTS,
                    (false, false) => TypeFacts::NON_ZERO_NUMBER_FACTS,
                }
            }
            LiteralValue::BigInt(atom) => {
                let text = interner.resolve_atom(atom);
                let zero = text.trim_start_matches('-').chars().all(|c| c == '0');
                match (zero, strict) {
                    (true, true) => TypeFacts::ZERO_BIGINT_STRICT_FACTS,
                    (true, false) => TypeFacts::ZERO_BIGINT_FACTS,
                    (false, true) => TypeFacts::NON_ZERO_BIGINT_STRICT_FACTS,
                    (false, false) => TypeFacts::NON_ZERO_BIGINT_FACTS,
                }
            }
            LiteralValue::Boolean(true) => {
                pick(strict, TypeFacts::TRUE_STRICT_FACTS, TypeFacts::TRUE_FACTS)
            }
            LiteralValue::Boolean(false) => {
                pick(strict, TypeFacts::FALSE_STRICT_FACTS, TypeFacts::FALSE_FACTS)
            }
        },
        TypeKey::TemplateLiteral(_) | TypeKey::StringIntrinsic { .. } => {
            pick(strict, TypeFacts::STRING_STRICT_FACTS, TypeFacts::STRING_FACTS)
        }
        TypeKey::Union(list) => interner
            .type_list(list)
            .iter()
            .fold(TypeFacts::empty(), |acc, &member| {
                acc | type_facts_inner(interner, member, strict, depth + 1)
            }),
        TypeKey::Intersection(list) => {
            let members = interner.type_list(list);
            let ignore_objects = members
                .iter()
                .any(|&member| type_queries::is_primitive_type(interner, member));
            let mut ored = TypeFacts::empty();
            let mut anded = TypeFacts::ALL;
            for &member in members.iter() {
                if ignore_objects && type_queries::is_object_like_type(interner, member) {
                    continue;
                }
                let facts = type_facts_inner(interner, member, strict, depth + 1);
                ored |= facts;
                anded &= facts;
            }
            (ored & TypeFacts::OR_FACTS_MASK) | (anded & TypeFacts::AND_FACTS_MASK)
        }
        TypeKey::Object(shape_id) => {
            let shape = interner.object_shape(shape_id);
            if !shape.call_signatures.is_empty() || !shape.construct_signatures.is_empty() {
                pick(strict, TypeFacts::FUNCTION_STRICT_FACTS, TypeFacts::FUNCTION_FACTS)
            } else if shape.properties.is_empty()
                && shape.string_index.is_none()
                && shape.number_index.is_none()
                && shape.nominal.is_none()
            {
                pick(
                    strict,
                    TypeFacts::EMPTY_OBJECT_STRICT_FACTS,
                    TypeFacts::EMPTY_OBJECT_FACTS,
                )
            } else {
                pick(strict, TypeFacts::OBJECT_STRICT_FACTS, TypeFacts::OBJECT_FACTS)
            }
        }
        TypeKey::Array(_)
        | TypeKey::Tuple(_)
        | TypeKey::Application(_)
        | TypeKey::Mapped(_)
        | TypeKey::EvolvingArray(_) => {
            pick(strict, TypeFacts::OBJECT_STRICT_FACTS, TypeFacts::OBJECT_FACTS)
        }
        TypeKey::TypeParameter(_) => {
            let constraint = interner.type_param_constraint(type_id).unwrap_or(TypeId::UNKNOWN);
            type_facts_inner(interner, constraint, strict, depth + 1)
        }
        TypeKey::Substitution { base, .. } => type_facts_inner(interner, base, strict, depth + 1),
        TypeKey::Index(_) => {
            // keyof yields string | number | symbol
            pick(strict, TypeFacts::STRING_STRICT_FACTS, TypeFacts::STRING_FACTS)
                | pick(strict, TypeFacts::NUMBER_STRICT_FACTS, TypeFacts::NUMBER_FACTS)
                | pick(strict, TypeFacts::SYMBOL_STRICT_FACTS, TypeFacts::SYMBOL_FACTS)
        }
        TypeKey::IndexAccess(..) | TypeKey::Conditional(_) | TypeKey::Intrinsic(_) => {
            TypeFacts::UNKNOWN_FACTS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_truthiness() {
        let interner = TypeInterner::new();
        let empty = interner.literal_string("");
        let hello = interner.literal_string("hello");
        assert!(type_facts(&interner, empty, true).contains(TypeFacts::FALSY));
        assert!(!type_facts(&interner, empty, true).contains(TypeFacts::TRUTHY));
        assert!(type_facts(&interner, hello, true).contains(TypeFacts::TRUTHY));
        assert!(!type_facts(&interner, hello, true).contains(TypeFacts::FALSY));
        let zero = interner.literal_number(0.0);
        assert!(!type_facts(&interner, zero, true).contains(TypeFacts::TRUTHY));
    }

    #[test]
    fn test_null_is_typeof_object() {
        let interner = TypeInterner::new();
        let facts = type_facts(&interner, TypeId::NULL, true);
        assert!(facts.contains(TypeFacts::TYPEOF_EQ_OBJECT));
        assert!(facts.contains(TypeFacts::IS_NULL));
        assert!(!facts.contains(TypeFacts::NE_NULL));
    }

    #[test]
    fn test_strictness_affects_nullable_facts() {
        let interner = TypeInterner::new();
        assert!(!type_facts(&interner, TypeId::STRING, true).contains(TypeFacts::EQ_NULL));
        assert!(type_facts(&interner, TypeId::STRING, false).contains(TypeFacts::EQ_NULL));
    }

    #[test]
    fn test_typeof_tables_cover_every_tag() {
        for tag in TYPEOF_TAGS {
            assert!(typeof_eq_facts(tag).is_some());
            assert!(typeof_ne_facts(tag).is_some());
        }
        assert!(typeof_eq_facts("nonsense").is_none());
    }
}
