//! Type narrowing primitives.
//!
//! `NarrowingContext` is the pure type algebra behind control flow
//! analysis: filtering unions by type facts, `typeof` and equality
//! narrowing, the candidate mapping used by `instanceof` and type
//! predicates, assignment reduction and evolving array bookkeeping.
//! Nothing here looks at syntax; the checker decides *which* primitive to
//! apply and this module computes the resulting type.
//!
//! Property-based narrowing (discriminants, `in`) lives in
//! `narrowing_property`, switch statement narrowing in
//! `narrowing_discriminants`.

use crate::intern::TypeInterner;
use crate::relation::TypeRelation;
use crate::type_facts::{TypeFacts, type_facts, typeof_ne_facts};
use crate::type_queries::{
    evolving_array_element, is_fresh_literal_type, is_function_type, is_instantiable_type,
    is_object_like_type, is_primitive_type, is_unit_type, literal_value, object_shape_of,
    union_members,
};
use crate::types::*;
use crate::widening::base_type_of_literal;
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::cell::RefCell;
use tracing::{Level, span, trace};

type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// Session-scoped memo tables for the narrowing primitives that the
/// checker queries repeatedly.
#[derive(Debug, Default)]
pub struct NarrowingCache {
    assignment_reduced: RefCell<FxHashMap<(TypeId, TypeId), TypeId>>,
    narrowed: RefCell<FxHashMap<NarrowedTypeKey, TypeId>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NarrowedTypeKey {
    source: TypeId,
    candidate: TypeId,
    assume_true: bool,
    check_derived: bool,
}

impl NarrowingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.assignment_reduced.borrow_mut().clear();
        self.narrowed.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.assignment_reduced.borrow().len() + self.narrowed.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove every member that is a strict subtype of another member.
///
/// Members are scanned from the end so that of two mutually related
/// members the earlier one survives.
pub fn union_with_subtype_reduction(
    interner: &TypeInterner,
    relation: &dyn TypeRelation,
    types: &[TypeId],
) -> TypeId {
    let members: FxIndexSet<TypeId> = types
        .iter()
        .flat_map(|&t| union_members(interner, t))
        .collect();
    let mut members: Vec<TypeId> = members.into_iter().collect();
    if members.len() < 2 {
        return interner.union(members);
    }
    if members.iter().any(|m| m.is_any() || *m == TypeId::UNKNOWN) {
        return interner.union(members);
    }

    let mut index = members.len();
    while index > 0 {
        index -= 1;
        let source = members[index];
        let redundant = members.iter().enumerate().any(|(other, &target)| {
            other != index && target != source && relation.is_strict_subtype_of(source, target)
        });
        if redundant {
            trace!(source = source.0, "subtype reduction removed member");
            members.remove(index);
        }
    }
    interner.union(members)
}

pub struct NarrowingContext<'a> {
    pub(crate) interner: &'a TypeInterner,
    pub(crate) relation: &'a dyn TypeRelation,
    cache: Option<&'a NarrowingCache>,
}

impl<'a> NarrowingContext<'a> {
    pub fn new(interner: &'a TypeInterner, relation: &'a dyn TypeRelation) -> Self {
        NarrowingContext {
            interner,
            relation,
            cache: None,
        }
    }

    /// Memoize assignment reduction and union narrowing in `cache`.
    pub fn with_cache(mut self, cache: &'a NarrowingCache) -> Self {
        self.cache = Some(cache);
        self
    }

    #[inline]
    pub fn interner(&self) -> &'a TypeInterner {
        self.interner
    }

    #[inline]
    pub fn relation(&self) -> &'a dyn TypeRelation {
        self.relation
    }

    #[inline]
    pub fn strict_null_checks(&self) -> bool {
        self.relation.strict_null_checks()
    }

    // =========================================================================
    // Union plumbing
    // =========================================================================

    /// Union members, or the type itself. `boolean` is `false | true`.
    pub(crate) fn constituents(&self, type_id: TypeId) -> Vec<TypeId> {
        union_members(self.interner, type_id)
    }

    pub(crate) fn union_of(&self, members: Vec<TypeId>) -> TypeId {
        self.interner.union(members)
    }

    /// Keep the constituents for which `keep` holds. A non-union type is
    /// kept whole or replaced by `never`.
    pub fn filter_type(&self, type_id: TypeId, mut keep: impl FnMut(TypeId) -> bool) -> TypeId {
        if type_id.is_never() {
            return type_id;
        }
        let members = self.constituents(type_id);
        if members.len() == 1 && members[0] == type_id {
            return if keep(type_id) { type_id } else { TypeId::NEVER };
        }
        let total = members.len();
        let kept: Vec<TypeId> = members.into_iter().filter(|&m| keep(m)).collect();
        if kept.len() == total {
            return type_id;
        }
        self.union_of(kept)
    }

    /// Apply `f` to every constituent and union the results.
    pub fn map_type(&self, type_id: TypeId, mut f: impl FnMut(TypeId) -> TypeId) -> TypeId {
        let members = self.constituents(type_id);
        if members.len() == 1 && members[0] == type_id {
            return f(type_id);
        }
        let mut changed = false;
        let mapped: Vec<TypeId> = members
            .into_iter()
            .map(|m| {
                let result = f(m);
                changed |= result != m;
                result
            })
            .collect();
        if !changed {
            return type_id;
        }
        self.union_of(mapped)
    }

    pub fn remove_type(&self, type_id: TypeId, target: TypeId) -> TypeId {
        self.filter_type(type_id, |t| t != target)
    }

    pub fn some_type(&self, type_id: TypeId, mut f: impl FnMut(TypeId) -> bool) -> bool {
        self.constituents(type_id).into_iter().any(|m| f(m))
    }

    pub fn every_type(&self, type_id: TypeId, mut f: impl FnMut(TypeId) -> bool) -> bool {
        self.constituents(type_id).into_iter().all(|m| f(m))
    }

    // =========================================================================
    // Type facts
    // =========================================================================

    pub fn type_facts(&self, type_id: TypeId) -> TypeFacts {
        type_facts(self.interner, type_id, self.strict_null_checks())
    }

    pub fn has_type_facts(&self, type_id: TypeId, facts: TypeFacts) -> bool {
        self.type_facts(type_id).intersects(facts)
    }

    /// Constituents that may pass a check requiring one of `include`.
    pub fn type_with_facts(&self, type_id: TypeId, include: TypeFacts) -> TypeId {
        self.filter_type(type_id, |t| self.has_type_facts(t, include))
    }

    /// `type_with_facts`, with `unknown` split into `{} | null | undefined`
    /// under strict null checks and generic constituents that may still be
    /// nullish intersected with `{}` when the facts exclude nullish values.
    pub fn adjusted_type_with_facts(&self, type_id: TypeId, facts: TypeFacts) -> TypeId {
        let strict = self.strict_null_checks();
        let unknown_union = self.unknown_union_type();
        let source = if strict && type_id == TypeId::UNKNOWN {
            unknown_union
        } else {
            type_id
        };
        let mut reduced = self.type_with_facts(source, facts);
        if reduced == unknown_union {
            reduced = TypeId::UNKNOWN;
        }
        if !strict {
            return reduced;
        }
        if facts == TypeFacts::NE_UNDEFINED {
            return self.remove_nullable_by_intersection(
                reduced,
                TypeFacts::EQ_UNDEFINED,
                TypeFacts::EQ_NULL,
                TypeFacts::IS_NULL,
                TypeId::NULL,
            );
        }
        if facts == TypeFacts::NE_NULL {
            return self.remove_nullable_by_intersection(
                reduced,
                TypeFacts::EQ_NULL,
                TypeFacts::EQ_UNDEFINED,
                TypeFacts::IS_UNDEFINED,
                TypeId::UNDEFINED,
            );
        }
        if facts == TypeFacts::NE_UNDEFINED_OR_NULL || facts == TypeFacts::TRUTHY {
            return self.map_type(reduced, |t| {
                if self.has_type_facts(t, TypeFacts::EQ_UNDEFINED_OR_NULL) {
                    self.interner.intersection2(t, TypeId::EMPTY_OBJECT)
                } else {
                    t
                }
            });
        }
        reduced
    }

    fn unknown_union_type(&self) -> TypeId {
        self.interner
            .union3(TypeId::EMPTY_OBJECT, TypeId::NULL, TypeId::UNDEFINED)
    }

    fn remove_nullable_by_intersection(
        &self,
        type_id: TypeId,
        target_facts: TypeFacts,
        other_facts: TypeFacts,
        other_includes_facts: TypeFacts,
        other_type: TypeId,
    ) -> TypeId {
        let facts = self.type_facts(type_id)
            & (TypeFacts::EQ_UNDEFINED | TypeFacts::EQ_NULL | TypeFacts::IS_UNDEFINED_OR_NULL);
        if !facts.intersects(target_facts) {
            return type_id;
        }
        let empty_or_other = self.interner.union2(TypeId::EMPTY_OBJECT, other_type);
        self.map_type(type_id, |t| {
            if !self.has_type_facts(t, target_facts) {
                return t;
            }
            let with = if !facts.intersects(other_includes_facts) && self.has_type_facts(t, other_facts)
            {
                empty_or_other
            } else {
                TypeId::EMPTY_OBJECT
            };
            self.interner.intersection2(t, with)
        })
    }

    /// Remove `null` and `undefined` under strict null checks.
    pub fn non_nullable(&self, type_id: TypeId) -> TypeId {
        if self.strict_null_checks() {
            self.adjusted_type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL)
        } else {
            type_id
        }
    }

    pub fn maybe_nullable(&self, type_id: TypeId) -> bool {
        self.some_type(type_id, |t| t.is_nullable())
    }

    // =========================================================================
    // typeof
    // =========================================================================

    /// Narrowing for `typeof x === tag` (`assume_true`) or `!==`.
    pub fn narrow_type_by_typeof(&self, type_id: TypeId, tag: &str, assume_true: bool) -> TypeId {
        trace!(type_id = type_id.0, tag, assume_true, "narrow by typeof");
        if assume_true {
            return self.narrow_type_by_type_name(type_id, tag);
        }
        let facts = typeof_ne_facts(tag).unwrap_or(TypeFacts::TYPEOF_NE_HOST_OBJECT);
        self.adjusted_type_with_facts(type_id, facts)
    }

    /// The part of `type_id` a `typeof` check for `tag` lets through.
    pub fn narrow_type_by_type_name(&self, type_id: TypeId, tag: &str) -> TypeId {
        match tag {
            "string" => {
                self.narrow_type_by_type_facts(type_id, TypeId::STRING, TypeFacts::TYPEOF_EQ_STRING)
            }
            "number" => {
                self.narrow_type_by_type_facts(type_id, TypeId::NUMBER, TypeFacts::TYPEOF_EQ_NUMBER)
            }
            "bigint" => {
                self.narrow_type_by_type_facts(type_id, TypeId::BIGINT, TypeFacts::TYPEOF_EQ_BIGINT)
            }
            "boolean" => self.narrow_type_by_type_facts(
                type_id,
                TypeId::BOOLEAN,
                TypeFacts::TYPEOF_EQ_BOOLEAN,
            ),
            "symbol" => {
                self.narrow_type_by_type_facts(type_id, TypeId::SYMBOL, TypeFacts::TYPEOF_EQ_SYMBOL)
            }
            "object" => {
                if type_id.is_any() {
                    return type_id;
                }
                let objects =
                    self.narrow_type_by_type_facts(type_id, TypeId::OBJECT, TypeFacts::TYPEOF_EQ_OBJECT);
                let null = self.narrow_type_by_type_facts(type_id, TypeId::NULL, TypeFacts::EQ_NULL);
                self.interner.union2(objects, null)
            }
            "function" => {
                if type_id.is_any() {
                    return type_id;
                }
                let function = self.function_type();
                self.narrow_type_by_type_facts(type_id, function, TypeFacts::TYPEOF_EQ_FUNCTION)
            }
            "undefined" => {
                self.narrow_type_by_type_facts(type_id, TypeId::UNDEFINED, TypeFacts::EQ_UNDEFINED)
            }
            _ => self.narrow_type_by_type_facts(
                type_id,
                TypeId::OBJECT,
                TypeFacts::TYPEOF_EQ_HOST_OBJECT,
            ),
        }
    }

    /// `(...args: any[]) => unknown`, the type implied by `typeof x === "function"`.
    pub fn function_type(&self) -> TypeId {
        let rest = ParamInfo {
            name: None,
            type_id: self.interner.array(TypeId::ANY),
            optional: false,
            rest: true,
        };
        self.interner
            .function(FunctionShape::new(vec![rest], TypeId::UNKNOWN))
    }

    /// Keep a constituent that is a strict subtype of `implied` and has the
    /// facts, replace a supertype of `implied` by `implied`, and intersect
    /// anything else that may still pass the check.
    pub fn narrow_type_by_type_facts(
        &self,
        type_id: TypeId,
        implied: TypeId,
        facts: TypeFacts,
    ) -> TypeId {
        self.map_type(type_id, |t| {
            if self.relation.is_strict_subtype_of(t, implied) {
                if self.has_type_facts(t, facts) {
                    t
                } else {
                    TypeId::NEVER
                }
            } else if self.relation.is_subtype_of(implied, t) {
                implied
            } else if self.has_type_facts(t, facts) {
                self.interner.intersection2(t, implied)
            } else {
                TypeId::NEVER
            }
        })
    }

    // =========================================================================
    // Equality
    // =========================================================================

    /// Narrowing for `x == value` / `x === value` with the operator
    /// already folded into `assume_true`.
    pub fn narrow_type_by_equality(
        &self,
        type_id: TypeId,
        value_type: TypeId,
        double_equals: bool,
        assume_true: bool,
    ) -> TypeId {
        let _span = span!(
            Level::TRACE,
            "narrow_type_by_equality",
            type_id = type_id.0,
            value_type = value_type.0,
            assume_true
        )
        .entered();

        if type_id.is_any() {
            return type_id;
        }
        if value_type.is_nullable() {
            if !self.strict_null_checks() {
                return type_id;
            }
            let facts = if double_equals {
                if assume_true {
                    TypeFacts::EQ_UNDEFINED_OR_NULL
                } else {
                    TypeFacts::NE_UNDEFINED_OR_NULL
                }
            } else if value_type == TypeId::NULL {
                if assume_true {
                    TypeFacts::EQ_NULL
                } else {
                    TypeFacts::NE_NULL
                }
            } else if assume_true {
                TypeFacts::EQ_UNDEFINED
            } else {
                TypeFacts::NE_UNDEFINED
            };
            return self.adjusted_type_with_facts(type_id, facts);
        }

        if assume_true {
            if !double_equals
                && (type_id == TypeId::UNKNOWN
                    || self.some_type(type_id, |t| self.is_empty_object_type(t)))
            {
                if self.is_primitive_or_non_primitive(value_type)
                    || self.is_empty_object_type(value_type)
                {
                    return value_type;
                }
                if is_object_like_type(self.interner, value_type) {
                    return TypeId::OBJECT;
                }
            }
            let filtered = self.filter_type(type_id, |t| {
                self.relation.are_types_comparable(t, value_type)
                    || (double_equals && self.is_coercible_under_double_equals(t, value_type))
            });
            return self.replace_primitives_with_literals(filtered, value_type);
        }

        if is_unit_type(self.interner, value_type) {
            return self.filter_type(type_id, |t| {
                !(is_unit_type(self.interner, t) && self.relation.are_types_comparable(t, value_type))
            });
        }
        type_id
    }

    fn is_primitive_or_non_primitive(&self, type_id: TypeId) -> bool {
        matches!(type_id, TypeId::OBJECT | TypeId::BOOLEAN) || is_primitive_type(self.interner, type_id)
    }

    /// `{}` with no members and no nominal identity.
    pub fn is_empty_object_type(&self, type_id: TypeId) -> bool {
        if type_id == TypeId::EMPTY_OBJECT {
            return true;
        }
        object_shape_of(self.interner, type_id).is_some_and(|shape| {
            shape.properties.is_empty()
                && shape.call_signatures.is_empty()
                && shape.construct_signatures.is_empty()
                && shape.string_index.is_none()
                && shape.number_index.is_none()
                && shape.nominal.is_none()
        })
    }

    fn is_coercible_under_double_equals(&self, source: TypeId, target: TypeId) -> bool {
        let source_ok = matches!(source, TypeId::NUMBER | TypeId::STRING)
            || matches!(literal_value(self.interner, source), Some(LiteralValue::Boolean(_)));
        let target_ok = matches!(target, TypeId::NUMBER | TypeId::STRING | TypeId::BOOLEAN)
            || matches!(literal_value(self.interner, target), Some(LiteralValue::Boolean(_)));
        source_ok && target_ok
    }

    /// Replace `string`, `number` and `bigint` constituents of
    /// `with_primitives` by the compatible literal types of `with_literals`.
    pub fn replace_primitives_with_literals(
        &self,
        with_primitives: TypeId,
        with_literals: TypeId,
    ) -> TypeId {
        let has_primitive = self.some_type(with_primitives, |t| {
            matches!(t, TypeId::STRING | TypeId::NUMBER | TypeId::BIGINT)
                || self.literal_kind(t) == Some(LiteralKind::Template)
        });
        let has_literal = self.some_type(with_literals, |t| {
            matches!(
                self.literal_kind(t),
                Some(LiteralKind::String | LiteralKind::Template | LiteralKind::Number | LiteralKind::BigInt)
            )
        });
        if !has_primitive || !has_literal {
            return with_primitives;
        }
        let literals_have_general_string = self.some_type(with_literals, |t| {
            t == TypeId::STRING || self.literal_kind(t) == Some(LiteralKind::Template)
        });
        self.map_type(with_primitives, |t| match t {
            TypeId::STRING => self.extract_types(with_literals, |m| {
                m == TypeId::STRING
                    || matches!(
                        self.literal_kind(m),
                        Some(LiteralKind::String | LiteralKind::Template)
                    )
            }),
            TypeId::NUMBER => self.extract_types(with_literals, |m| {
                m == TypeId::NUMBER || self.literal_kind(m) == Some(LiteralKind::Number)
            }),
            TypeId::BIGINT => self.extract_types(with_literals, |m| {
                m == TypeId::BIGINT || self.literal_kind(m) == Some(LiteralKind::BigInt)
            }),
            _ if self.literal_kind(t) == Some(LiteralKind::Template)
                && !literals_have_general_string =>
            {
                self.extract_types(with_literals, |m| {
                    self.literal_kind(m) == Some(LiteralKind::String)
                })
            }
            _ => t,
        })
    }

    fn extract_types(&self, type_id: TypeId, keep: impl Fn(TypeId) -> bool) -> TypeId {
        let kept: Vec<TypeId> = self
            .constituents(type_id)
            .into_iter()
            .filter(|&m| keep(m))
            .collect();
        self.union_of(kept)
    }

    fn literal_kind(&self, type_id: TypeId) -> Option<LiteralKind> {
        match self.interner.lookup(type_id)? {
            TypeKey::Literal(value) | TypeKey::FreshLiteral(value) => Some(match value {
                LiteralValue::String(_) => LiteralKind::String,
                LiteralValue::Number(_) => LiteralKind::Number,
                LiteralValue::BigInt(_) => LiteralKind::BigInt,
                LiteralValue::Boolean(_) => LiteralKind::Boolean,
            }),
            TypeKey::TemplateLiteral(_) | TypeKey::StringIntrinsic { .. } => {
                Some(LiteralKind::Template)
            }
            _ => None,
        }
    }

    // =========================================================================
    // instanceof and type predicates
    // =========================================================================

    /// Narrow `type_id` by `candidate`, the instance type of an
    /// `instanceof` check (`check_derived`) or the type of a type predicate.
    pub fn narrowed_type(
        &self,
        type_id: TypeId,
        candidate: TypeId,
        assume_true: bool,
        check_derived: bool,
    ) -> TypeId {
        let is_union = union_members(self.interner, type_id).len() > 1;
        let Some(cache) = self.cache.filter(|_| is_union) else {
            return self.narrowed_type_worker(type_id, candidate, assume_true, check_derived);
        };
        let key = NarrowedTypeKey {
            source: type_id,
            candidate,
            assume_true,
            check_derived,
        };
        if let Some(&cached) = cache.narrowed.borrow().get(&key) {
            return cached;
        }
        let result = self.narrowed_type_worker(type_id, candidate, assume_true, check_derived);
        cache.narrowed.borrow_mut().insert(key, result);
        result
    }

    fn narrowed_type_worker(
        &self,
        type_id: TypeId,
        candidate: TypeId,
        assume_true: bool,
        check_derived: bool,
    ) -> TypeId {
        let _span = span!(
            Level::TRACE,
            "narrowed_type",
            type_id = type_id.0,
            candidate = candidate.0,
            assume_true,
            check_derived
        )
        .entered();

        if !assume_true {
            if type_id == candidate {
                return TypeId::NEVER;
            }
            if check_derived {
                return self.filter_type(type_id, |t| !self.is_type_derived_from(t, candidate));
            }
            let true_type = self.narrowed_type(type_id, candidate, true, false);
            return self.filter_type(type_id, |t| !self.is_type_subset_of(t, true_type));
        }

        if type_id.is_any() || type_id == TypeId::UNKNOWN {
            return candidate;
        }
        if type_id == candidate {
            return candidate;
        }

        let narrowed = self.map_type(candidate, |n| {
            let directly_related = self.map_type(type_id, |t| {
                if check_derived {
                    if self.is_type_derived_from(t, n) {
                        t
                    } else if self.is_type_derived_from(n, t) {
                        n
                    } else {
                        TypeId::NEVER
                    }
                } else if self.relation.is_strict_subtype_of(t, n) {
                    t
                } else if self.relation.is_strict_subtype_of(n, t) {
                    n
                } else if self.relation.is_subtype_of(t, n) {
                    t
                } else if self.relation.is_subtype_of(n, t) {
                    n
                } else {
                    TypeId::NEVER
                }
            });
            if !directly_related.is_never() {
                return directly_related;
            }
            self.map_type(type_id, |t| {
                if !is_instantiable_type(self.interner, t) {
                    return TypeId::NEVER;
                }
                let related = match self.interner.type_param_constraint(t) {
                    None => true,
                    Some(constraint) if check_derived => self.is_type_derived_from(n, constraint),
                    Some(constraint) => self.relation.is_subtype_of(n, constraint),
                };
                if related {
                    self.interner.intersection2(t, n)
                } else {
                    TypeId::NEVER
                }
            })
        });

        if !narrowed.is_never() {
            narrowed
        } else if self.relation.is_subtype_of(candidate, type_id) {
            candidate
        } else if self.relation.is_assignable_to(type_id, candidate) {
            type_id
        } else if self.relation.is_assignable_to(candidate, type_id) {
            candidate
        } else {
            self.interner.intersection2(type_id, candidate)
        }
    }

    /// Nominal derivation as used by `instanceof`.
    pub fn is_type_derived_from(&self, source: TypeId, target: TypeId) -> bool {
        let interner = self.interner;
        let source_members = union_members(interner, source);
        if source_members.len() > 1 {
            return source_members
                .iter()
                .all(|&s| self.is_type_derived_from(s, target));
        }
        let target_members = union_members(interner, target);
        if target_members.len() > 1 {
            return target_members
                .iter()
                .any(|&t| self.is_type_derived_from(source, t));
        }
        if let Some(TypeKey::Intersection(list)) = interner.lookup(source) {
            return interner
                .type_list(list)
                .iter()
                .any(|&s| self.is_type_derived_from(s, target));
        }
        if let Some(TypeKey::TypeParameter(_)) = interner.lookup(source) {
            let constraint = interner.type_param_constraint(source).unwrap_or(TypeId::UNKNOWN);
            return self.is_type_derived_from(constraint, target);
        }
        if source == target {
            return true;
        }
        if self.is_empty_object_type(target) {
            return is_object_like_type(interner, source);
        }
        if target == TypeId::OBJECT {
            return is_object_like_type(interner, source) && !self.is_empty_object_type(source);
        }
        if is_function_type(interner, target)
            && object_shape_of(interner, target).is_some_and(|s| s.nominal.is_none())
        {
            return is_function_type(interner, source);
        }
        match (interner.lookup(source), interner.lookup(target)) {
            (Some(TypeKey::Array(_) | TypeKey::Tuple(_)), Some(TypeKey::Array(_))) => true,
            (Some(TypeKey::Application(s)), Some(TypeKey::Application(t))) => {
                let s = interner.type_application(s);
                let t = interner.type_application(t);
                interner.def_derives_from(s.base, t.base)
            }
            (Some(TypeKey::Object(s)), Some(TypeKey::Object(t))) => {
                let s = interner.object_shape(s);
                let t = interner.object_shape(t);
                match (s.nominal, t.nominal) {
                    (Some(derived), Some(base)) => interner.def_derives_from(derived, base),
                    _ => false,
                }
            }
            (Some(TypeKey::Application(s)), Some(TypeKey::Object(t))) => {
                let s = interner.type_application(s);
                let t = interner.object_shape(t);
                t.nominal
                    .is_some_and(|base| interner.def_derives_from(s.base, base))
            }
            _ => false,
        }
    }

    /// `source` is `never`, `target`, or made only of members of `target`.
    pub fn is_type_subset_of(&self, source: TypeId, target: TypeId) -> bool {
        if source == target || source.is_never() {
            return true;
        }
        let targets = self.constituents(target);
        if targets.len() < 2 {
            return false;
        }
        self.constituents(source)
            .iter()
            .all(|member| targets.contains(member))
    }

    /// `x.constructor === C` where `candidate` is the prototype type of `C`.
    pub fn narrow_type_by_constructor(&self, type_id: TypeId, candidate: TypeId) -> TypeId {
        if candidate.is_any() || candidate == TypeId::OBJECT {
            return type_id;
        }
        if type_id.is_any() {
            return candidate;
        }
        self.filter_type(type_id, |t| self.is_constructed_by(t, candidate))
    }

    fn is_constructed_by(&self, source: TypeId, target: TypeId) -> bool {
        let nominal_of = |t: TypeId| {
            object_shape_of(self.interner, t).and_then(|shape| {
                if shape.flags.contains(ObjectFlags::CLASS_INSTANCE) {
                    Some(shape.nominal)
                } else {
                    None
                }
            })
        };
        match (nominal_of(source), nominal_of(target)) {
            (None, None) => self.relation.is_subtype_of(source, target),
            (source_def, target_def) => source_def.flatten() == target_def.flatten(),
        }
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    /// Declared constituents that some constituent of `assigned` can be
    /// assigned to. Falls back to `declared` when `assigned` is not
    /// assignable to the reduction.
    pub fn assignment_reduced_type(&self, declared: TypeId, assigned: TypeId) -> TypeId {
        if declared == assigned {
            return declared;
        }
        if assigned.is_never() {
            return assigned;
        }
        let Some(cache) = self.cache else {
            return self.assignment_reduced_type_worker(declared, assigned);
        };
        if let Some(&cached) = cache.assignment_reduced.borrow().get(&(declared, assigned)) {
            return cached;
        }
        let result = self.assignment_reduced_type_worker(declared, assigned);
        cache
            .assignment_reduced
            .borrow_mut()
            .insert((declared, assigned), result);
        result
    }

    fn assignment_reduced_type_worker(&self, declared: TypeId, assigned: TypeId) -> TypeId {
        let filtered = self.filter_type(declared, |t| self.type_maybe_assignable_to(assigned, t));
        let is_fresh_boolean = is_fresh_literal_type(self.interner, assigned)
            && matches!(
                literal_value(self.interner, assigned),
                Some(LiteralValue::Boolean(_))
            );
        let reduced = if is_fresh_boolean {
            self.map_type(filtered, |t| self.interner.fresh_type_of(t))
        } else {
            filtered
        };
        trace!(
            declared = declared.0,
            assigned = assigned.0,
            reduced = reduced.0,
            "assignment reduction"
        );
        if self.relation.is_assignable_to(assigned, reduced) {
            reduced
        } else {
            declared
        }
    }

    fn type_maybe_assignable_to(&self, source: TypeId, target: TypeId) -> bool {
        union_members(self.interner, source)
            .iter()
            .any(|&s| self.relation.is_assignable_to(s, target))
    }

    // =========================================================================
    // Evolving arrays
    // =========================================================================

    /// Extend an evolving array by an element written through `push`,
    /// `unshift` or an indexed assignment.
    pub fn add_evolving_array_element(&self, evolving: TypeId, value_type: TypeId) -> TypeId {
        let element = evolving_array_element(self.interner, evolving).unwrap_or(TypeId::NEVER);
        let regular = self.interner.regular_type_of(value_type);
        let added = base_type_of_literal(self.interner, regular);
        if self.is_type_subset_of(added, element) {
            return evolving;
        }
        let element = self.interner.union2(element, added);
        trace!(element = element.0, "evolving array element grew");
        self.interner.evolving_array(element)
    }

    /// The array type an evolving array settles on.
    pub fn finalize_evolving_array(&self, type_id: TypeId) -> TypeId {
        match evolving_array_element(self.interner, type_id) {
            None => type_id,
            Some(element) if element.is_never() => TypeId::AUTO_ARRAY,
            Some(element) => {
                let reduced = union_with_subtype_reduction(self.interner, self.relation, &[element]);
                self.interner.array(reduced)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LiteralKind {
    String,
    Number,
    BigInt,
    Boolean,
    Template,
}

#[cfg(test)]
#[path = "../tests/narrowing_tests.rs"]
mod tests;
