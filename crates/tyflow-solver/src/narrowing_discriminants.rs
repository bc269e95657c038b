//! Switch statement narrowing.
//!
//! A `switch` narrows its operand per clause range `[clause_start,
//! clause_end)`. An empty range is the implicit fall-through past every
//! clause and behaves like `default`.
//!
//! Key functions:
//! - `narrow_type_by_switch_on_discriminant`: case values are unit types
//! - `narrow_type_by_switch_on_typeof`: `switch (typeof x)` with witness tags
//! - `is_exhaustive_literal_switch` / `is_exhaustive_typeof_switch`

use crate::narrowing::NarrowingContext;
use crate::type_facts::{TypeFacts, typeof_ne_facts};
use crate::type_queries::{is_literal_type, is_object_like_type, is_primitive_type, is_unit_type};
use crate::types::*;
use tracing::{Level, span, trace};

/// Not-equal facts of every `typeof` witness outside `[start, end)`.
///
/// Witnesses are the case tags in clause order; `""` marks the default
/// clause or a repeated tag.
pub fn not_equal_facts_from_typeof_switch(start: usize, end: usize, witnesses: &[String]) -> TypeFacts {
    witnesses
        .iter()
        .enumerate()
        .filter(|(index, witness)| (*index < start || *index >= end) && !witness.is_empty())
        .fold(TypeFacts::empty(), |facts, (_, witness)| {
            facts | typeof_ne_facts(witness).unwrap_or(TypeFacts::TYPEOF_NE_HOST_OBJECT)
        })
}

impl<'a> NarrowingContext<'a> {
    /// Narrow by the case values of a clause range. `switch_types` holds
    /// the regular literal type of every case in the statement, with
    /// `never` standing for `default`.
    pub fn narrow_type_by_switch_on_discriminant(
        &self,
        type_id: TypeId,
        switch_types: &[TypeId],
        clause_start: usize,
        clause_end: usize,
    ) -> TypeId {
        let _span = span!(
            Level::TRACE,
            "narrow_type_by_switch_on_discriminant",
            type_id = type_id.0,
            clause_start,
            clause_end
        )
        .entered();

        if switch_types.is_empty() {
            return type_id;
        }
        let end = clause_end.min(switch_types.len());
        let start = clause_start.min(end);
        let clause_types = &switch_types[start..end];
        let has_default_clause =
            clause_start == clause_end || clause_types.contains(&TypeId::NEVER);

        if type_id == TypeId::UNKNOWN && !has_default_clause {
            let mut ground = Vec::with_capacity(clause_types.len());
            for &clause_type in clause_types {
                if is_primitive_type(self.interner, clause_type) || clause_type == TypeId::OBJECT {
                    ground.push(clause_type);
                } else if is_object_like_type(self.interner, clause_type) {
                    ground.push(TypeId::OBJECT);
                } else {
                    return type_id;
                }
            }
            return self.union_of(ground);
        }

        let discriminant = self.union_of(clause_types.to_vec());
        let case_type = if discriminant.is_never() {
            TypeId::NEVER
        } else {
            let filtered =
                self.filter_type(type_id, |t| self.relation.are_types_comparable(discriminant, t));
            self.replace_primitives_with_literals(filtered, discriminant)
        };
        if !has_default_clause {
            return case_type;
        }

        let default_type = self.filter_type(type_id, |t| {
            !(is_unit_type(self.interner, t)
                && switch_types.contains(&self.interner.regular_type_of(t)))
        });
        trace!(case_type = case_type.0, default_type = default_type.0, "switch default");
        if case_type.is_never() {
            default_type
        } else {
            self.interner.union2(case_type, default_type)
        }
    }

    /// Narrow by `switch (typeof x)`. `default_index` is the position of
    /// the `default` clause, if any.
    pub fn narrow_type_by_switch_on_typeof(
        &self,
        type_id: TypeId,
        witnesses: &[String],
        default_index: Option<usize>,
        clause_start: usize,
        clause_end: usize,
    ) -> TypeId {
        let has_default_clause = clause_start == clause_end
            || default_index.is_some_and(|index| index >= clause_start && index < clause_end);
        if has_default_clause {
            let not_equal = not_equal_facts_from_typeof_switch(clause_start, clause_end, witnesses);
            return self.filter_type(type_id, |t| self.type_facts(t).contains(not_equal));
        }
        let end = clause_end.min(witnesses.len());
        let start = clause_start.min(end);
        let narrowed: Vec<TypeId> = witnesses[start..end]
            .iter()
            .map(|witness| {
                if witness.is_empty() {
                    TypeId::NEVER
                } else {
                    self.narrow_type_by_type_name(type_id, witness)
                }
            })
            .collect();
        self.union_of(narrowed)
    }

    /// `switch (x)` over a literal-typed operand handles every constituent.
    pub fn is_exhaustive_literal_switch(&self, operand: TypeId, switch_types: &[TypeId]) -> bool {
        let literal_operand = self
            .constituents(operand)
            .iter()
            .all(|&t| is_literal_type(self.interner, t) || t.is_nullable());
        if !literal_operand || switch_types.is_empty() {
            return false;
        }
        if switch_types
            .iter()
            .any(|&t| !is_unit_type(self.interner, t) && !t.is_never())
        {
            return false;
        }
        self.constituents(operand)
            .iter()
            .all(|&t| switch_types.contains(&self.interner.regular_type_of(t)))
    }

    /// `switch (typeof x)` handles every constituent of `operand`.
    pub fn is_exhaustive_typeof_switch(&self, operand: TypeId, witnesses: &[String]) -> bool {
        let not_equal = not_equal_facts_from_typeof_switch(0, 0, witnesses);
        let operand = self.interner.type_param_constraint(operand).unwrap_or(operand);
        if operand.is_any() || operand == TypeId::UNKNOWN {
            return not_equal.contains(TypeFacts::ALL_TYPEOF_NE);
        }
        !self.some_type(operand, |t| self.type_facts(t).contains(not_equal))
    }
}
