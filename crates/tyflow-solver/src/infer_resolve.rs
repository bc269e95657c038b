//! Resolving inference candidates to inferred types.

use crate::infer::{
    InferenceContext, InferenceFlags, InferenceInfo, InferencePriority, is_type_parameter_at_top_level,
};
use crate::instantiate::{TypeSubstitution, instantiate_type};
use crate::narrowing::union_with_subtype_reduction;
use crate::type_queries::{
    is_primitive_type, literal_value, object_shape_of, type_contains, union_members,
};
use crate::types::*;
use crate::widening::{base_type_of_literal, widened_literal_type, widened_type};
use tracing::debug;

impl InferenceContext<'_> {
    /// Inferred type for the parameter at `index`, memoized until new
    /// candidates arrive.
    pub fn resolve(&mut self, index: usize) -> TypeId {
        let Some(info) = self.inferences.get(index).cloned() else {
            return TypeId::UNKNOWN;
        };
        if let Some(inferred) = info.inferred_type {
            return inferred;
        }
        let type_param = info.type_param;

        let mut fallback = None;
        let inferred = if self.signature.is_some() {
            let covariant = (!info.candidates.is_empty()).then(|| self.covariant_inference(&info));
            let contravariant = (!info.contra_candidates.is_empty()).then(|| self.contravariant_inference(&info));
            match (covariant, contravariant) {
                (Some(co), Some(contra)) => {
                    let prefer_covariant = !co.is_never()
                        && !co.is_any()
                        && info
                            .contra_candidates
                            .iter()
                            .any(|&t| self.relation.is_assignable_to(co, t))
                        && self.inferences.iter().all(|other| {
                            (other.type_param != type_param
                                && self.interner.type_param_constraint(other.type_param) != Some(type_param))
                                || other
                                    .candidates
                                    .iter()
                                    .all(|&c| self.relation.is_assignable_to(c, co))
                        });
                    if prefer_covariant {
                        fallback = Some(contra);
                        Some(co)
                    } else {
                        fallback = Some(co);
                        Some(contra)
                    }
                }
                (Some(co), None) => Some(co),
                (None, Some(contra)) => Some(contra),
                (None, None) => {
                    if self.flags.contains(InferenceFlags::NO_DEFAULT) {
                        Some(TypeId::SILENT_NEVER)
                    } else {
                        match self.interner.type_param_default(type_param) {
                            Some(default) => {
                                let mapper = self.back_reference_mapper(index);
                                Some(instantiate_type(self.interner, default, &mapper))
                            }
                            None => None,
                        }
                    }
                }
            }
        } else {
            self.type_from_inference(index)
        };

        let default_type = if self.flags.contains(InferenceFlags::ANY_DEFAULT) {
            TypeId::ANY
        } else {
            TypeId::UNKNOWN
        };
        self.inferences[index].inferred_type = Some(inferred.unwrap_or(default_type));

        let mut result = inferred.unwrap_or(default_type);
        if let Some(constraint) = self.interner.type_param_constraint(type_param) {
            let mapper = self.constraint_mapper(index, constraint);
            let constraint = instantiate_type(self.interner, constraint, &mapper);
            // With no inference at all the constraint wins over the default.
            let satisfies = inferred.is_some_and(|t| self.relation.is_assignable_to(t, constraint));
            if !satisfies {
                let filtered = match inferred {
                    Some(inferred) if self.inferences[index].priority == InferencePriority::RETURN_TYPE => {
                        let kept: Vec<TypeId> = union_members(self.interner, inferred)
                            .into_iter()
                            .filter(|&m| self.relation.is_assignable_to(m, constraint))
                            .collect();
                        let kept = self.interner.union(kept);
                        (!kept.is_never()).then_some(kept)
                    }
                    _ => None,
                };
                result = match (filtered, fallback) {
                    (Some(filtered), _) => filtered,
                    (None, Some(fallback)) if self.relation.is_assignable_to(fallback, constraint) => fallback,
                    _ => constraint,
                };
            }
        }
        debug!(type_param = type_param.0, inferred = result.0, "resolved inference");
        self.inferences[index].inferred_type = Some(result);
        result
    }

    pub fn resolve_all(&mut self) -> Vec<TypeId> {
        (0..self.inferences.len()).map(|i| self.resolve(i)).collect()
    }

    /// Resolve and freeze the parameter at `index`.
    pub fn fix(&mut self, index: usize) -> TypeId {
        let inferred = self.resolve(index);
        if self.inferences.get(index).is_some_and(|info| !info.is_fixed) {
            self.inferences[index].is_fixed = true;
            self.clear_cached_inferences();
        }
        inferred
    }

    /// Substitution from every context parameter to its inferred type.
    pub fn type_mapper(&mut self) -> TypeSubstitution {
        let mut mapper = TypeSubstitution::new();
        for index in 0..self.inferences.len() {
            let inferred = self.resolve(index);
            mapper.insert(self.inferences[index].type_param, inferred);
        }
        mapper
    }

    /// Parameters at or after `index` become `unknown`; earlier ones map to
    /// their current inference.
    fn back_reference_mapper(&mut self, index: usize) -> TypeSubstitution {
        let mut mapper = TypeSubstitution::new();
        for other in 0..self.inferences.len() {
            let param = self.inferences[other].type_param;
            if other >= index {
                mapper.insert(param, TypeId::UNKNOWN);
            } else {
                let inferred = self.resolve(other);
                mapper.insert(param, inferred);
            }
        }
        mapper
    }

    /// Inferred types for the context parameters that `constraint` mentions.
    fn constraint_mapper(&mut self, index: usize, constraint: TypeId) -> TypeSubstitution {
        let mut mapper = TypeSubstitution::new();
        for other in 0..self.inferences.len() {
            let param = self.inferences[other].type_param;
            if !type_contains(self.interner, constraint, param) {
                continue;
            }
            let inferred = if other == index {
                self.inferences[other].inferred_type.unwrap_or(TypeId::UNKNOWN)
            } else {
                self.resolve(other)
            };
            mapper.insert(param, inferred);
        }
        mapper
    }

    /// Candidate union without a signature: covariant candidates reduced
    /// by subtype, else the intersection of contravariant ones.
    pub(crate) fn type_from_inference(&self, index: usize) -> Option<TypeId> {
        let info = self.inferences.get(index)?;
        if !info.candidates.is_empty() {
            return Some(union_with_subtype_reduction(
                self.interner,
                self.relation,
                &info.candidates,
            ));
        }
        if !info.contra_candidates.is_empty() {
            return Some(self.interner.intersection(info.contra_candidates.clone()));
        }
        None
    }

    fn covariant_inference(&self, info: &InferenceInfo) -> TypeId {
        let interner = self.interner;
        let candidates = self.union_object_and_array_literal_candidates(&info.candidates);
        let primitive_constraint = self.has_primitive_constraint(info.type_param)
            || crate::type_queries::type_param_info(interner, info.type_param).is_some_and(|p| p.is_const);
        let widen_literals = !primitive_constraint
            && info.top_level
            && (info.is_fixed || !self.is_type_parameter_at_top_level_in_return(info.type_param));
        let base_candidates: Vec<TypeId> = if primitive_constraint {
            candidates.iter().map(|&c| interner.regular_type_of(c)).collect()
        } else if widen_literals {
            candidates.iter().map(|&c| widened_literal_type(interner, c)).collect()
        } else {
            candidates
        };
        let unwidened = if info.priority.intersects(InferencePriority::PRIORITY_IMPLIES_COMBINATION) {
            union_with_subtype_reduction(interner, self.relation, &base_candidates)
        } else {
            self.common_supertype(&base_candidates)
        };
        widened_type(interner, unwidened, self.relation.strict_null_checks())
    }

    fn contravariant_inference(&self, info: &InferenceInfo) -> TypeId {
        if info.priority.intersects(InferencePriority::PRIORITY_IMPLIES_COMBINATION) {
            self.interner.intersection(info.contra_candidates.clone())
        } else {
            self.common_subtype(&info.contra_candidates)
        }
    }

    fn is_type_parameter_at_top_level_in_return(&self, type_param: TypeId) -> bool {
        let Some(signature) = &self.signature else {
            return false;
        };
        if is_type_parameter_at_top_level(self.interner, signature.return_type, type_param, 0) {
            return true;
        }
        signature
            .type_predicate
            .and_then(|p| p.type_id)
            .is_some_and(|t| is_type_parameter_at_top_level(self.interner, t, type_param, 0))
    }

    /// Whether the parameter's constraint admits primitives, key types or
    /// template literals, in which case literal candidates are kept.
    fn has_primitive_constraint(&self, type_param: TypeId) -> bool {
        let interner = self.interner;
        let Some(constraint) = interner.type_param_constraint(type_param) else {
            return false;
        };
        let constraint = match interner.lookup(constraint) {
            Some(TypeKey::Conditional(id)) => {
                let cond = interner.conditional_type(id);
                interner.union2(cond.true_type, cond.false_type)
            }
            _ => constraint,
        };
        union_members(interner, constraint).iter().any(|&member| {
            is_primitive_type(interner, member)
                || matches!(
                    interner.lookup(member),
                    Some(
                        TypeKey::Index(_)
                            | TypeKey::TemplateLiteral(_)
                            | TypeKey::StringIntrinsic { .. }
                    )
                )
        })
    }

    /// Object and array literal candidates merge into one candidate.
    fn union_object_and_array_literal_candidates(&self, candidates: &[TypeId]) -> Vec<TypeId> {
        let is_literal = |c: &TypeId| {
            object_shape_of(self.interner, *c).is_some_and(|shape| {
                shape
                    .flags
                    .intersects(ObjectFlags::OBJECT_LITERAL | ObjectFlags::ARRAY_LITERAL)
            })
        };
        let literals: Vec<TypeId> = candidates.iter().copied().filter(is_literal).collect();
        if literals.len() < 2 {
            return candidates.to_vec();
        }
        let mut result: Vec<TypeId> = candidates.iter().copied().filter(|c| !is_literal(c)).collect();
        result.push(union_with_subtype_reduction(self.interner, self.relation, &literals));
        result
    }

    /// Single common supertype of `types`, with nullable members set aside
    /// under strict null checks and literals of one primitive kept as a union.
    fn common_supertype(&self, types: &[TypeId]) -> TypeId {
        let interner = self.interner;
        if types.len() == 1 {
            return types[0];
        }
        let strict = self.relation.strict_null_checks();
        let primary: Vec<TypeId> = if strict {
            types
                .iter()
                .map(|&t| {
                    let members: Vec<TypeId> = union_members(interner, t)
                        .into_iter()
                        .filter(|m| !m.is_nullable())
                        .collect();
                    interner.union(members)
                })
                .filter(|t| !t.is_never())
                .collect()
        } else {
            types.to_vec()
        };
        if primary.is_empty() {
            return interner.union(types.to_vec());
        }
        let supertype = if self.literal_types_with_same_base_type(&primary) {
            interner.union(primary)
        } else {
            self.single_common_supertype(&primary)
        };
        if !strict || supertype == TypeId::ANY {
            return supertype;
        }
        let mut nullables = Vec::new();
        for &t in types {
            for member in union_members(interner, t) {
                if member.is_nullable() && !nullables.contains(&member) {
                    nullables.push(member);
                }
            }
        }
        if nullables.is_empty() {
            return supertype;
        }
        nullables.insert(0, supertype);
        interner.union(nullables)
    }

    fn literal_types_with_same_base_type(&self, types: &[TypeId]) -> bool {
        let mut common = None;
        for &t in types {
            if literal_value(self.interner, t).is_none() && !self.is_literal_union(t) {
                return false;
            }
            let base = base_type_of_literal(self.interner, t);
            match common {
                None => common = Some(base),
                Some(existing) if existing == base => {}
                Some(_) => return false,
            }
        }
        true
    }

    fn is_literal_union(&self, t: TypeId) -> bool {
        let members = union_members(self.interner, t);
        members.len() > 1 && members.iter().all(|&m| literal_value(self.interner, m).is_some())
    }

    /// Leftmost type to which every other type is a strict subtype, falling
    /// back to plain subtyping.
    fn single_common_supertype(&self, types: &[TypeId]) -> TypeId {
        let pick = |related: &dyn Fn(TypeId, TypeId) -> bool| {
            types
                .iter()
                .copied()
                .reduce(|best, t| if related(best, t) { t } else { best })
        };
        let strict = pick(&|s, t| self.relation.is_strict_subtype_of(s, t));
        let strict = strict.filter(|&candidate| {
            types
                .iter()
                .all(|&t| t == candidate || self.relation.is_strict_subtype_of(t, candidate))
        });
        strict
            .or_else(|| pick(&|s, t| self.relation.is_subtype_of(s, t)))
            .unwrap_or(TypeId::UNKNOWN)
    }

    /// Leftmost type that is a subtype of everything to its right.
    fn common_subtype(&self, types: &[TypeId]) -> TypeId {
        types
            .iter()
            .copied()
            .reduce(|best, t| if self.relation.is_subtype_of(t, best) { t } else { best })
            .unwrap_or(TypeId::UNKNOWN)
    }
}
