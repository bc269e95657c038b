//! Conditional type evaluation: `Check extends Extends ? True : False`.

use crate::evaluate::TypeEvaluator;
use crate::infer::{InferenceContext, InferenceFlags, InferencePriority};
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::type_queries::contains_type_parameters;
use crate::types::*;

impl TypeEvaluator<'_> {
    /// Resolve a conditional type whose check type is concrete.
    ///
    /// `infer` declarations in the extends clause are inferred from the
    /// check type first; the chosen branch is instantiated with the result.
    pub fn evaluate_conditional(&mut self, type_id: TypeId, id: ConditionalTypeId) -> TypeId {
        let interner = self.interner();
        let cond = interner.conditional_type(id);
        let check = self.evaluate(cond.check_type);

        if cond.is_distributive {
            if check.is_never() {
                return TypeId::NEVER;
            }
            if let Some(TypeKey::Union(list)) = interner.lookup(check) {
                let members = interner.type_list(list);
                let results: Vec<TypeId> = members
                    .iter()
                    .map(|&member| {
                        let single = interner.conditional(ConditionalType {
                            check_type: member,
                            ..(*cond).clone()
                        });
                        self.evaluate(single)
                    })
                    .collect();
                return interner.union(results);
            }
        }

        if contains_type_parameters(interner, check) {
            tracing::trace!(type_id = type_id.0, "conditional deferred on generic check type");
            return type_id;
        }
        if check.is_any() && !matches!(cond.extends_type, TypeId::ANY | TypeId::UNKNOWN) {
            let true_type = self.evaluate(cond.true_type);
            let false_type = self.evaluate(cond.false_type);
            return interner.union2(true_type, false_type);
        }

        let mut mapper = TypeSubstitution::new();
        if !cond.infer_type_params.is_empty() {
            let mut context = InferenceContext::new(
                interner,
                cond.infer_type_params.clone(),
                None,
                InferenceFlags::NONE,
                self.relation(),
            );
            context.infer(
                check,
                cond.extends_type,
                InferencePriority::NO_CONSTRAINTS | InferencePriority::ALWAYS_STRICT,
                false,
            );
            mapper = context.type_mapper();
        }
        let extends = instantiate_type(interner, cond.extends_type, &mapper);
        let extends = self.evaluate(extends);
        if contains_type_parameters(interner, extends) {
            return type_id;
        }

        let branch = if self.relation().is_assignable_to(check, extends) {
            cond.true_type
        } else {
            cond.false_type
        };
        let result = instantiate_type(interner, branch, &mapper);
        tracing::trace!(type_id = type_id.0, result = result.0, "resolved conditional type");
        self.evaluate(result)
    }
}
