//! Type evaluation: reducing applications, `keyof`, indexed access,
//! conditional, mapped and template literal types to their structural
//! result when their inputs are concrete.
//!
//! Generic inputs leave the type deferred; `evaluate` returns it unchanged
//! (or rebuilt around its evaluated parts). The per-kind rules live in
//! `evaluate_rules`.

use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::relation::TypeRelation;
use crate::type_queries::could_contain_type_variables;
use crate::types::*;
use rustc_hash::FxHashMap;
use tyflow_common::limits::{STACK_GROWTH, STACK_RED_ZONE};

/// Evaluate `type_id` once with a fresh evaluator.
pub fn evaluate_type(interner: &TypeInterner, relation: &dyn TypeRelation, type_id: TypeId) -> TypeId {
    if type_id.is_intrinsic() || !needs_evaluation(interner, type_id) {
        return type_id;
    }
    let mut evaluator = TypeEvaluator::new(interner, relation);
    evaluator.evaluate(type_id)
}

fn needs_evaluation(interner: &TypeInterner, type_id: TypeId) -> bool {
    matches!(
        interner.lookup(type_id),
        Some(
            TypeKey::Application(_)
                | TypeKey::Index(_)
                | TypeKey::IndexAccess(..)
                | TypeKey::Conditional(_)
                | TypeKey::Mapped(_)
                | TypeKey::TemplateLiteral(_)
                | TypeKey::StringIntrinsic { .. }
                | TypeKey::Substitution { .. }
        )
    )
}

pub struct TypeEvaluator<'a> {
    interner: &'a TypeInterner,
    relation: &'a dyn TypeRelation,
    guard: RecursionGuard<TypeId>,
    cache: FxHashMap<TypeId, TypeId>,
}

impl<'a> TypeEvaluator<'a> {
    pub fn new(interner: &'a TypeInterner, relation: &'a dyn TypeRelation) -> Self {
        TypeEvaluator {
            interner,
            relation,
            guard: RecursionGuard::with_profile(RecursionProfile::TypeEvaluation),
            cache: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn interner(&self) -> &'a TypeInterner {
        self.interner
    }

    #[inline]
    pub fn relation(&self) -> &'a dyn TypeRelation {
        self.relation
    }

    /// Evaluate a type, memoizing the result. Re-entering a type that is
    /// already being evaluated leaves it deferred; exceeding the depth
    /// budget yields `error`.
    pub fn evaluate(&mut self, type_id: TypeId) -> TypeId {
        if type_id.is_intrinsic() {
            return type_id;
        }
        if let Some(&cached) = self.cache.get(&type_id) {
            return cached;
        }
        match self.guard.enter(type_id) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return type_id,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                tracing::debug!(type_id = type_id.0, "type evaluation budget exceeded");
                return TypeId::ERROR;
            }
        }
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || self.evaluate_inner(type_id));
        self.guard.leave(type_id);
        self.cache.insert(type_id, result);
        result
    }

    fn evaluate_inner(&mut self, type_id: TypeId) -> TypeId {
        let Some(key) = self.interner.lookup(type_id) else {
            return type_id;
        };
        match key {
            TypeKey::Application(app_id) => self.evaluate_application(type_id, app_id),
            TypeKey::Index(operand) => self.evaluate_keyof(type_id, operand),
            TypeKey::IndexAccess(object, index) => self.evaluate_index_access(object, index),
            TypeKey::Conditional(id) => self.evaluate_conditional(type_id, id),
            TypeKey::Mapped(id) => self.evaluate_mapped(type_id, id),
            TypeKey::TemplateLiteral(id) => self.evaluate_template_literal(type_id, id),
            TypeKey::StringIntrinsic { kind, type_arg } => {
                let evaluated = self.evaluate(type_arg);
                if evaluated == type_arg {
                    type_id
                } else {
                    self.interner.string_intrinsic(kind, evaluated)
                }
            }
            TypeKey::Substitution { base, .. } => {
                if could_contain_type_variables(self.interner, base) {
                    type_id
                } else {
                    base
                }
            }
            _ => type_id,
        }
    }

    /// Expand `Base<Args>` to the declaration's body. Missing arguments
    /// take their defaults (or `unknown`); bodiless declarations stay
    /// nominal.
    fn evaluate_application(&mut self, type_id: TypeId, app_id: TypeApplicationId) -> TypeId {
        let interner = self.interner;
        let app = interner.type_application(app_id);
        let Some(def) = interner.definition(app.base) else {
            return type_id;
        };
        let Some(body) = def.body else {
            return type_id;
        };
        let mut substitution = TypeSubstitution::new();
        for (index, &param) in def.type_params.iter().enumerate() {
            let arg = match app.args.get(index) {
                Some(&arg) => arg,
                None => match interner.type_param_default(param) {
                    Some(default) => instantiate_type(interner, default, &substitution),
                    None => TypeId::UNKNOWN,
                },
            };
            substitution.insert(param, arg);
        }
        let expanded = instantiate_type(interner, body, &substitution);
        tracing::trace!(type_id = type_id.0, expanded = expanded.0, "expanded type application");
        self.evaluate(expanded)
    }
}
