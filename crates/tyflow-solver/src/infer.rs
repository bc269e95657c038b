//! Generic type argument inference.
//!
//! An `InferenceContext` holds one `InferenceInfo` per type parameter being
//! inferred. `infer` walks a source type against a target type that
//! mentions those parameters and records candidates; `resolve` (see
//! `infer_resolve`) turns the candidates into a final type.
//!
//! The walk peels one structural layer per step. Re-entrant object
//! comparisons go through `invoke_once`, which records a circularity
//! marker for the pair and gives up once both sides are deeply nested
//! instantiations of the same declaration.

use crate::evaluate::evaluate_type;
use crate::intern::TypeInterner;
use crate::relation::TypeRelation;
use crate::template_literal::{
    infer_from_literal_parts, is_numeric_text, is_text_valid_for_placeholder, template_texts,
};
use crate::type_queries::{
    could_contain_type_variables, intersection_members, is_instantiable_type, is_object_like_type,
    is_string_literal, literal_value, object_shape_of, recursion_identity, tuple_elements,
    union_members,
};
use crate::types::*;
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use tracing::{Level, span, trace};
use tyflow_common::limits::{
    DEEP_NESTING_WINDOW, MAX_REVERSE_MAPPED_NESTING, MAX_TYPE_PARAMETER_TOP_LEVEL_DEPTH,
    STACK_GROWTH, STACK_RED_ZONE,
};

bitflags! {
    /// Where a candidate came from. Numerically lower means more specific;
    /// a candidate at a lower priority evicts those at higher ones.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct InferencePriority: u32 {
        const NONE = 0;
        /// Inference to a naked type parameter inside a union or intersection.
        const NAKED_TYPE_VARIABLE = 1 << 0;
        /// Speculative slice into a variadic tuple ending in optional elements.
        const SPECULATIVE_TUPLE = 1 << 1;
        /// Source was a substitution type.
        const SUBSTITUTE_SOURCE = 1 << 2;
        /// Reverse inference through a homomorphic mapped type.
        const HOMOMORPHIC_MAPPED_TYPE = 1 << 3;
        /// Partial reverse inference through a homomorphic mapped type.
        const PARTIAL_HOMOMORPHIC_MAPPED_TYPE = 1 << 4;
        /// Inference to the constraint of a mapped type.
        const MAPPED_TYPE_CONSTRAINT = 1 << 5;
        /// Conditional type in a contravariant position.
        const CONTRAVARIANT_CONDITIONAL = 1 << 6;
        /// Inference made from a contextual return type.
        const RETURN_TYPE = 1 << 7;
        /// Literal or string source inferred to `keyof T`.
        const LITERAL_KEYOF = 1 << 8;
        /// Do not descend into constraints of instantiable sources.
        const NO_CONSTRAINTS = 1 << 9;
        /// Parameters are always contravariant.
        const ALWAYS_STRICT = 1 << 10;
        /// Initial priority of a fresh inference.
        const MAX_VALUE = 1 << 11;

        /// Candidates from these positions are unioned rather than
        /// reduced to a common supertype.
        const PRIORITY_IMPLIES_COMBINATION = Self::RETURN_TYPE.bits()
            | Self::MAPPED_TYPE_CONSTRAINT.bits()
            | Self::LITERAL_KEYOF.bits();

        /// Sentinel for an inference pair currently being explored.
        const CIRCULARITY = u32::MAX;
    }
}

impl InferencePriority {
    /// Signed view used for ordering; `CIRCULARITY` is -1.
    #[inline]
    pub fn as_i32(self) -> i32 {
        self.bits() as i32
    }
}

impl PartialOrd for InferencePriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InferencePriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_i32().cmp(&other.as_i32())
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct InferenceFlags: u8 {
        const NONE = 0;
        /// Infer `silentNever` for parameters without candidates.
        const NO_DEFAULT = 1 << 0;
        /// Infer `any` instead of `unknown` for parameters without candidates.
        const ANY_DEFAULT = 1 << 1;
        /// A generic function argument was skipped during the first pass.
        const SKIPPED_GENERIC_FUNCTION = 1 << 2;
    }
}

/// Inference record for one type parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceInfo {
    pub type_param: TypeId,
    pub candidates: Vec<TypeId>,
    pub contra_candidates: Vec<TypeId>,
    /// Memoized result of `resolve`.
    pub inferred_type: Option<TypeId>,
    pub priority: InferencePriority,
    /// Every inference so far was made to a top-level occurrence.
    pub top_level: bool,
    pub is_fixed: bool,
    /// Known arity of a variadic tuple parameter, or -1.
    pub implied_arity: i32,
}

impl InferenceInfo {
    pub fn new(type_param: TypeId) -> Self {
        InferenceInfo {
            type_param,
            candidates: Vec::new(),
            contra_candidates: Vec::new(),
            inferred_type: None,
            priority: InferencePriority::MAX_VALUE,
            top_level: true,
            is_fixed: false,
            implied_arity: -1,
        }
    }

    pub fn has_candidates(&self) -> bool {
        !self.candidates.is_empty() || !self.contra_candidates.is_empty()
    }
}

const EXPANDING_SOURCE: u8 = 1;
const EXPANDING_TARGET: u8 = 2;
const EXPANDING_BOTH: u8 = EXPANDING_SOURCE | EXPANDING_TARGET;

/// Per-walk state. Pooled by the context and reset on release.
#[derive(Debug, Default)]
pub struct InferenceState {
    original_target: TypeId,
    priority: InferencePriority,
    inference_priority: InferencePriority,
    contravariant: bool,
    bivariant: bool,
    expanding: u8,
    visited: FxHashMap<(TypeId, TypeId), InferencePriority>,
    source_stack: Vec<TypeId>,
    target_stack: Vec<TypeId>,
}

impl InferenceState {
    fn reset(&mut self) {
        self.original_target = TypeId::NONE;
        self.priority = InferencePriority::NONE;
        self.inference_priority = InferencePriority::MAX_VALUE;
        self.contravariant = false;
        self.bivariant = false;
        self.expanding = 0;
        self.visited.clear();
        self.source_stack.clear();
        self.target_stack.clear();
    }
}

#[derive(Clone, Copy, Debug)]
enum OnceAction {
    Conditional,
    GenericMapped,
    ObjectTypes,
}

/// Reverse-mapping state shared by a context and the nested contexts it
/// spawns for homomorphic mapped types.
#[derive(Debug, Default)]
struct ReverseMappedState {
    cache: FxHashMap<(TypeId, TypeId, TypeId), Option<TypeId>>,
    homomorphic_cache: FxHashMap<(TypeId, TypeId, TypeId), Option<TypeId>>,
    source_stack: Vec<TypeId>,
    target_stack: Vec<TypeId>,
    expanding: u8,
}

/// A context sensitive element of an object or array literal argument,
/// with the contextual type it will be checked against. Inferring from it
/// early lets one element's inferences type the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntraExpressionSite {
    pub source: TypeId,
    pub contextual_type: TypeId,
}

pub struct InferenceContext<'a> {
    pub(crate) interner: &'a TypeInterner,
    pub(crate) relation: &'a dyn TypeRelation,
    pub(crate) inferences: Vec<InferenceInfo>,
    pub(crate) signature: Option<FunctionShape>,
    pub(crate) flags: InferenceFlags,
    intra_expression_sites: Vec<IntraExpressionSite>,
    state_pool: Vec<InferenceState>,
    reverse: ReverseMappedState,
}

impl<'a> InferenceContext<'a> {
    pub fn new(
        interner: &'a TypeInterner,
        type_params: Vec<TypeId>,
        signature: Option<FunctionShape>,
        flags: InferenceFlags,
        relation: &'a dyn TypeRelation,
    ) -> Self {
        Self::with_inferences(
            interner,
            type_params.into_iter().map(InferenceInfo::new).collect(),
            signature,
            flags,
            relation,
        )
    }

    fn with_inferences(
        interner: &'a TypeInterner,
        inferences: Vec<InferenceInfo>,
        signature: Option<FunctionShape>,
        flags: InferenceFlags,
        relation: &'a dyn TypeRelation,
    ) -> Self {
        InferenceContext {
            interner,
            relation,
            inferences,
            signature,
            flags,
            intra_expression_sites: Vec::new(),
            state_pool: Vec::new(),
            reverse: ReverseMappedState::default(),
        }
    }

    /// A copy of this context, candidates included, with `extra_flags`
    /// added. Resolving in the copy leaves this context unfixed.
    pub fn clone_with_flags(&self, extra_flags: InferenceFlags) -> InferenceContext<'a> {
        Self::with_inferences(
            self.interner,
            self.inferences.clone(),
            self.signature.clone(),
            self.flags | extra_flags,
            self.relation,
        )
    }

    /// A copy holding only the type parameters that have candidates, or
    /// `None` when nothing was inferred.
    pub fn clone_inferred_part(&self) -> Option<InferenceContext<'a>> {
        let inferences: Vec<InferenceInfo> = self
            .inferences
            .iter()
            .filter(|info| info.has_candidates())
            .cloned()
            .collect();
        if inferences.is_empty() {
            return None;
        }
        Some(Self::with_inferences(
            self.interner,
            inferences,
            self.signature.clone(),
            self.flags,
            self.relation,
        ))
    }

    /// Take over the inferences of `source` for every type parameter that
    /// has no candidates here. Both contexts must list the same type
    /// parameters in the same order.
    pub fn merge_inferences(&mut self, source: &[InferenceInfo]) {
        for (target, source) in self.inferences.iter_mut().zip(source) {
            if !target.has_candidates() && source.has_candidates() {
                trace!(type_param = target.type_param.0, "merged inference");
                *target = source.clone();
            }
        }
    }

    pub fn add_intra_expression_inference_site(&mut self, source: TypeId, contextual_type: TypeId) {
        self.intra_expression_sites.push(IntraExpressionSite {
            source,
            contextual_type,
        });
    }

    pub fn intra_expression_sites(&self) -> &[IntraExpressionSite] {
        &self.intra_expression_sites
    }

    /// Infer from every recorded site to its contextual type, then forget
    /// the sites.
    pub fn infer_from_intra_expression_sites(&mut self) {
        let sites = std::mem::take(&mut self.intra_expression_sites);
        for site in sites {
            self.infer(site.source, site.contextual_type, InferencePriority::NONE, false);
        }
    }

    pub fn inferences(&self) -> &[InferenceInfo] {
        &self.inferences
    }

    pub fn type_params(&self) -> Vec<TypeId> {
        self.inferences.iter().map(|i| i.type_param).collect()
    }

    pub fn flags(&self) -> InferenceFlags {
        self.flags
    }

    pub fn set_implied_arity(&mut self, index: usize, arity: i32) {
        if let Some(info) = self.inferences.get_mut(index) {
            info.implied_arity = arity;
        }
    }

    /// Infer from `source` to `target`, recording candidates for every
    /// context type parameter that `target` mentions.
    pub fn infer(
        &mut self,
        source: TypeId,
        target: TypeId,
        priority: InferencePriority,
        contravariant: bool,
    ) {
        let _span = span!(Level::TRACE, "infer", source = source.0, target = target.0).entered();
        let mut state = self.state_pool.pop().unwrap_or_default();
        state.original_target = target;
        state.priority = priority;
        state.inference_priority = InferencePriority::MAX_VALUE;
        state.contravariant = contravariant;
        self.infer_from_types(&mut state, source, target);
        state.reset();
        self.state_pool.push(state);
    }

    pub(crate) fn inference_index(&self, type_id: TypeId) -> Option<usize> {
        match self.interner.lookup(type_id) {
            Some(TypeKey::TypeParameter(_) | TypeKey::IndexAccess(..)) => self
                .inferences
                .iter()
                .position(|info| info.type_param == type_id),
            _ => None,
        }
    }

    pub(crate) fn clear_cached_inferences(&mut self) {
        for info in &mut self.inferences {
            if !info.is_fixed {
                info.inferred_type = None;
            }
        }
    }

    fn distributed(&self, type_id: TypeId) -> Vec<TypeId> {
        union_members(self.interner, type_id)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    fn infer_from_types(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.infer_from_types_inner(st, source, target)
        })
    }

    fn infer_from_types_inner(&mut self, st: &mut InferenceState, mut source: TypeId, mut target: TypeId) {
        let interner = self.interner;
        if !could_contain_type_variables(interner, target) {
            return;
        }

        if let (Some(TypeKey::Application(s_app)), Some(TypeKey::Application(t_app))) =
            (interner.lookup(source), interner.lookup(target))
        {
            let s_app = interner.type_application(s_app);
            let t_app = interner.type_application(t_app);
            if s_app.base == t_app.base {
                if let Some(def) = interner
                    .definition(s_app.base)
                    .filter(|def| def.kind == DefKind::TypeAlias)
                {
                    let source_args = self.fill_missing_type_arguments(&s_app.args, &def);
                    let target_args = self.fill_missing_type_arguments(&t_app.args, &def);
                    self.infer_from_type_arguments(st, &source_args, &target_args, &def.variances);
                    return;
                }
            }
        }

        if source == target {
            if let Some(TypeKey::Union(list) | TypeKey::Intersection(list)) = interner.lookup(source) {
                for &member in interner.type_list(list).iter() {
                    self.infer_from_types(st, member, member);
                }
                return;
            }
        }

        match interner.lookup(target) {
            Some(TypeKey::Union(list)) if !source.is_never() => {
                let sources = self.distributed(source);
                let targets = interner.type_list(list).to_vec();
                let (sources, targets) =
                    self.infer_from_matching_types(st, sources, targets, Self::is_type_or_base_identical_to);
                let (sources, targets) =
                    self.infer_from_matching_types(st, sources, targets, Self::is_type_closely_matched_by);
                if targets.is_empty() {
                    return;
                }
                target = interner.union(targets);
                if sources.is_empty() {
                    self.infer_with_priority(st, source, target, InferencePriority::NAKED_TYPE_VARIABLE);
                    return;
                }
                source = interner.union(sources);
            }
            Some(TypeKey::Intersection(list)) => {
                let members = interner.type_list(list);
                let all_plain_objects = members.iter().all(|&m| {
                    is_object_like_type(interner, m) && !could_contain_type_variables(interner, m)
                });
                if !all_plain_objects && !crate::type_queries::is_union_type(interner, source) {
                    let sources = intersection_members(interner, source);
                    let (sources, targets) = self.infer_from_matching_types(
                        st,
                        sources,
                        members.to_vec(),
                        |ctx, s, t| ctx.relation.is_type_identical_to(s, t),
                    );
                    if sources.is_empty() || targets.is_empty() {
                        return;
                    }
                    source = interner.intersection(sources);
                    target = interner.intersection(targets);
                }
            }
            _ => {}
        }

        if matches!(
            interner.lookup(target),
            Some(TypeKey::Substitution { .. } | TypeKey::IndexAccess(..))
        ) {
            target = self.actual_type_variable(target);
        }

        if matches!(
            interner.lookup(target),
            Some(TypeKey::TypeParameter(_) | TypeKey::IndexAccess(..))
        ) {
            if let Some(index) = self.inference_index(target) {
                self.record_candidate(st, index, source, target);
                return;
            }
            let simplified = evaluate_type(interner, self.relation, target);
            if simplified != target {
                self.infer_from_types(st, source, simplified);
            } else if let Some(TypeKey::IndexAccess(object, index)) = interner.lookup(target) {
                // Treat a generic key as instantiated and push it into the
                // object, hoping to expose a bare type parameter.
                let index = evaluate_type(interner, self.relation, index);
                if is_instantiable_type(interner, index) {
                    let object = evaluate_type(interner, self.relation, object);
                    if let Some(distributed) = self.distribute_index_over_object_type(object, index)
                        && distributed != target
                    {
                        self.infer_from_types(st, source, distributed);
                    }
                }
            }
        }

        let source_key = interner.lookup(source);
        let target_key = interner.lookup(target);
        match (source_key.clone(), target_key) {
            (Some(TypeKey::Application(s_app)), Some(TypeKey::Application(t_app)))
                if interner.type_application(s_app).base == interner.type_application(t_app).base =>
            {
                self.infer_from_application_arguments(st, s_app, t_app);
            }
            (Some(TypeKey::Array(s)), Some(TypeKey::Array(t))) => {
                self.infer_from_types(st, s, t);
            }
            (Some(TypeKey::Index(s)), Some(TypeKey::Index(t))) => {
                self.infer_from_contravariant_types(st, s, t);
            }
            (_, Some(TypeKey::Index(t)))
                if source == TypeId::STRING
                    || literal_value(interner, source).is_some()
                    || matches!(source_key, Some(TypeKey::Union(_))) && union_members(interner, source)
                        .iter()
                        .all(|&m| literal_value(interner, m).is_some()) =>
            {
                let empty = self.empty_object_from_string_literal(source);
                self.infer_from_contravariant_types_with_priority(
                    st,
                    empty,
                    t,
                    InferencePriority::LITERAL_KEYOF,
                );
            }
            (Some(TypeKey::IndexAccess(so, si)), Some(TypeKey::IndexAccess(to, ti))) => {
                self.infer_from_types(st, so, to);
                self.infer_from_types(st, si, ti);
            }
            (
                Some(TypeKey::StringIntrinsic { kind: sk, type_arg: sa }),
                Some(TypeKey::StringIntrinsic { kind: tk, type_arg: ta }),
            ) => {
                if sk == tk {
                    self.infer_from_types(st, sa, ta);
                }
            }
            (Some(TypeKey::Substitution { base, constraint }), _) => {
                self.infer_from_types(st, base, target);
                let intersection = interner.intersection2(base, constraint);
                self.infer_with_priority(st, intersection, target, InferencePriority::SUBSTITUTE_SOURCE);
            }
            (_, Some(TypeKey::Conditional(_))) => {
                self.invoke_once(st, source, target, OnceAction::Conditional);
            }
            (_, Some(TypeKey::Union(list))) => {
                let targets = interner.type_list(list).to_vec();
                self.infer_to_multiple_types(st, source, &targets, true);
            }
            (_, Some(TypeKey::Intersection(list))) => {
                let targets = interner.type_list(list).to_vec();
                self.infer_to_multiple_types(st, source, &targets, false);
            }
            (Some(TypeKey::Union(list)), _) => {
                for &member in interner.type_list(list).iter() {
                    self.infer_from_types(st, member, target);
                }
            }
            (_, Some(TypeKey::TemplateLiteral(id))) => {
                self.infer_to_template_literal_type(st, source, id);
            }
            _ => {
                if self.is_generic_mapped_type(source) && self.is_generic_mapped_type(target) {
                    self.invoke_once(st, source, target, OnceAction::GenericMapped);
                }
                let instantiable_source = matches!(
                    source_key,
                    Some(
                        TypeKey::Intersection(_)
                            | TypeKey::TypeParameter(_)
                            | TypeKey::IndexAccess(..)
                            | TypeKey::Conditional(_)
                            | TypeKey::Substitution { .. }
                    )
                );
                if !(st.priority.contains(InferencePriority::NO_CONSTRAINTS) && instantiable_source) {
                    let apparent = self.apparent_type(source);
                    if apparent != source
                        && !is_object_like_type(interner, apparent)
                        && !crate::type_queries::is_intersection_type(interner, apparent)
                    {
                        self.infer_from_types(st, apparent, target);
                        return;
                    }
                    source = apparent;
                }
                if is_object_like_type(interner, source)
                    || crate::type_queries::is_intersection_type(interner, source)
                {
                    self.invoke_once(st, source, target, OnceAction::ObjectTypes);
                }
            }
        }
    }

    fn record_candidate(&mut self, st: &mut InferenceState, index: usize, source: TypeId, target: TypeId) {
        let interner = self.interner;
        if source == TypeId::NON_INFERRABLE_ANY || self.is_non_inferrable(source) {
            return;
        }
        if !self.inferences[index].is_fixed {
            let type_param = self.inferences[index].type_param;
            let mut changed = false;
            {
                let info = &mut self.inferences[index];
                if st.priority < info.priority {
                    info.candidates.clear();
                    info.contra_candidates.clear();
                    info.top_level = true;
                    info.priority = st.priority;
                }
            }
            if st.priority == self.inferences[index].priority {
                if is_tuple_of_self(interner, type_param, source) {
                    return;
                }
                let info = &mut self.inferences[index];
                if st.contravariant && !st.bivariant {
                    if !info.contra_candidates.contains(&source) {
                        info.contra_candidates.push(source);
                        changed = true;
                    }
                } else if !info.candidates.contains(&source) {
                    info.candidates.push(source);
                    changed = true;
                }
            }
            if !st.priority.contains(InferencePriority::RETURN_TYPE)
                && matches!(interner.lookup(target), Some(TypeKey::TypeParameter(_)))
                && self.inferences[index].top_level
                && !is_type_parameter_at_top_level(interner, st.original_target, target, 0)
            {
                self.inferences[index].top_level = false;
                changed = true;
            }
            if changed {
                trace!(type_param = type_param.0, candidate = source.0, "inference candidate");
                self.clear_cached_inferences();
            }
        }
        st.inference_priority = st.inference_priority.min(st.priority);
    }

    fn is_non_inferrable(&self, type_id: TypeId) -> bool {
        object_shape_of(self.interner, type_id)
            .is_some_and(|shape| shape.flags.contains(ObjectFlags::NON_INFERRABLE))
    }

    fn fill_missing_type_arguments(&self, args: &[TypeId], def: &DefinitionInfo) -> Vec<TypeId> {
        let mut filled = args.to_vec();
        for &param in def.type_params.iter().skip(args.len()) {
            filled.push(self.interner.type_param_default(param).unwrap_or(TypeId::UNKNOWN));
        }
        filled
    }

    fn infer_from_application_arguments(
        &mut self,
        st: &mut InferenceState,
        source: TypeApplicationId,
        target: TypeApplicationId,
    ) {
        let source = self.interner.type_application(source);
        let target = self.interner.type_application(target);
        let variances = self
            .interner
            .definition(source.base)
            .map(|def| def.variances)
            .unwrap_or_default();
        self.infer_from_type_arguments(st, &source.args, &target.args, &variances);
    }

    fn infer_from_type_arguments(
        &mut self,
        st: &mut InferenceState,
        sources: &[TypeId],
        targets: &[TypeId],
        variances: &[Variance],
    ) {
        for (index, (&source, &target)) in sources.iter().zip(targets.iter()).enumerate() {
            let contravariant = variances
                .get(index)
                .is_some_and(|&v| v == Variance::CONTRAVARIANT);
            if contravariant {
                self.infer_from_contravariant_types(st, source, target);
            } else {
                self.infer_from_types(st, source, target);
            }
        }
    }

    fn infer_with_priority(
        &mut self,
        st: &mut InferenceState,
        source: TypeId,
        target: TypeId,
        priority: InferencePriority,
    ) {
        let saved = st.priority;
        st.priority |= priority;
        self.infer_from_types(st, source, target);
        st.priority = saved;
    }

    fn infer_from_contravariant_types(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        st.contravariant = !st.contravariant;
        self.infer_from_types(st, source, target);
        st.contravariant = !st.contravariant;
    }

    fn infer_from_contravariant_types_with_priority(
        &mut self,
        st: &mut InferenceState,
        source: TypeId,
        target: TypeId,
        priority: InferencePriority,
    ) {
        let saved = st.priority;
        st.priority |= priority;
        self.infer_from_contravariant_types(st, source, target);
        st.priority = saved;
    }

    fn infer_from_contravariant_types_if_strict(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        if self.relation.strict_function_types() || st.priority.contains(InferencePriority::ALWAYS_STRICT) {
            self.infer_from_contravariant_types(st, source, target);
        } else {
            self.infer_from_types(st, source, target);
        }
    }

    fn infer_from_matching_types(
        &mut self,
        st: &mut InferenceState,
        sources: Vec<TypeId>,
        targets: Vec<TypeId>,
        matches: impl Fn(&Self, TypeId, TypeId) -> bool,
    ) -> (Vec<TypeId>, Vec<TypeId>) {
        let mut matched_sources = Vec::new();
        let mut matched_targets = Vec::new();
        for &t in &targets {
            for &s in &sources {
                if matches(self, s, t) {
                    self.infer_from_types(st, s, t);
                    if !matched_sources.contains(&s) {
                        matched_sources.push(s);
                    }
                    if !matched_targets.contains(&t) {
                        matched_targets.push(t);
                    }
                }
            }
        }
        let sources = sources
            .into_iter()
            .filter(|s| !matched_sources.contains(s))
            .collect();
        let targets = targets
            .into_iter()
            .filter(|t| !matched_targets.contains(t))
            .collect();
        (sources, targets)
    }

    fn is_type_or_base_identical_to(&self, source: TypeId, target: TypeId) -> bool {
        let interner = self.interner;
        self.relation.is_type_identical_to(source, target)
            || (target == TypeId::STRING && is_string_literal(interner, source))
            || (target == TypeId::NUMBER
                && matches!(literal_value(interner, source), Some(LiteralValue::Number(_))))
    }

    fn is_type_closely_matched_by(&self, source: TypeId, target: TypeId) -> bool {
        let interner = self.interner;
        match (interner.lookup(source), interner.lookup(target)) {
            (Some(TypeKey::Application(s)), Some(TypeKey::Application(t))) => {
                interner.type_application(s).base == interner.type_application(t).base
            }
            (Some(TypeKey::Object(s)), Some(TypeKey::Object(t))) => {
                let s_def = interner.object_shape(s).nominal;
                s_def.is_some() && s_def == interner.object_shape(t).nominal
            }
            _ => false,
        }
    }

    fn invoke_once(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId, action: OnceAction) {
        let key = (source, target);
        if let Some(&status) = st.visited.get(&key) {
            st.inference_priority = st.inference_priority.min(status);
            return;
        }
        st.visited.insert(key, InferencePriority::CIRCULARITY);
        let saved_priority = st.inference_priority;
        st.inference_priority = InferencePriority::MAX_VALUE;
        let saved_expanding = st.expanding;
        st.source_stack.push(source);
        st.target_stack.push(target);
        if is_deeply_nested_type(self.interner, source, &st.source_stack, DEEP_NESTING_WINDOW) {
            st.expanding |= EXPANDING_SOURCE;
        }
        if is_deeply_nested_type(self.interner, target, &st.target_stack, DEEP_NESTING_WINDOW) {
            st.expanding |= EXPANDING_TARGET;
        }
        if st.expanding != EXPANDING_BOTH {
            match action {
                OnceAction::Conditional => self.infer_to_conditional_type(st, source, target),
                OnceAction::GenericMapped => self.infer_from_generic_mapped_types(st, source, target),
                OnceAction::ObjectTypes => self.infer_from_object_types(st, source, target),
            }
        } else {
            trace!(source = source.0, target = target.0, "inference circularity");
            st.inference_priority = InferencePriority::CIRCULARITY;
        }
        st.target_stack.pop();
        st.source_stack.pop();
        st.expanding = saved_expanding;
        st.visited.insert(key, st.inference_priority);
        st.inference_priority = st.inference_priority.min(saved_priority);
    }

    fn infer_to_multiple_types(
        &mut self,
        st: &mut InferenceState,
        source: TypeId,
        targets: &[TypeId],
        is_union: bool,
    ) {
        let mut type_variable_count = 0;
        if is_union {
            let mut naked_type_variable = None;
            let sources = self.distributed(source);
            let mut matched = vec![false; sources.len()];
            let mut circularity = false;
            for &t in targets {
                if self.inference_index(t).is_some() {
                    naked_type_variable = Some(t);
                    type_variable_count += 1;
                    continue;
                }
                for (i, &s) in sources.iter().enumerate() {
                    let saved = st.inference_priority;
                    st.inference_priority = InferencePriority::MAX_VALUE;
                    self.infer_from_types(st, s, t);
                    if st.inference_priority == st.priority {
                        matched[i] = true;
                    }
                    circularity = circularity || st.inference_priority == InferencePriority::CIRCULARITY;
                    st.inference_priority = st.inference_priority.min(saved);
                }
            }
            if type_variable_count == 0 {
                if let Some(variable) = self.single_type_variable_from_intersections(targets) {
                    self.infer_with_priority(st, source, variable, InferencePriority::NAKED_TYPE_VARIABLE);
                }
                return;
            }
            if type_variable_count == 1 && !circularity {
                let unmatched: Vec<TypeId> = sources
                    .iter()
                    .zip(matched.iter())
                    .filter(|(_, m)| !**m)
                    .map(|(&s, _)| s)
                    .collect();
                if let (false, Some(variable)) = (unmatched.is_empty(), naked_type_variable) {
                    let unmatched = self.interner.union(unmatched);
                    self.infer_from_types(st, unmatched, variable);
                    return;
                }
            }
        } else {
            for &t in targets {
                if self.inference_index(t).is_some() {
                    type_variable_count += 1;
                } else {
                    self.infer_from_types(st, source, t);
                }
            }
        }
        let infer_to_naked = if is_union {
            type_variable_count > 0
        } else {
            type_variable_count == 1
        };
        if infer_to_naked {
            for &t in targets {
                if self.inference_index(t).is_some() {
                    self.infer_with_priority(st, source, t, InferencePriority::NAKED_TYPE_VARIABLE);
                }
            }
        }
    }

    fn single_type_variable_from_intersections(&self, targets: &[TypeId]) -> Option<TypeId> {
        let mut variable = None;
        for &t in targets {
            let Some(TypeKey::Intersection(list)) = self.interner.lookup(t) else {
                return None;
            };
            let found = self
                .interner
                .type_list(list)
                .iter()
                .copied()
                .find(|&m| self.inference_index(m).is_some())?;
            if variable.is_some_and(|v| v != found) {
                return None;
            }
            variable = Some(found);
        }
        variable
    }

    fn infer_to_conditional_type(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        let interner = self.interner;
        let Some(TypeKey::Conditional(target_id)) = interner.lookup(target) else {
            return;
        };
        let target_cond = interner.conditional_type(target_id);
        if let Some(TypeKey::Conditional(source_id)) = interner.lookup(source) {
            let source_cond = interner.conditional_type(source_id);
            self.infer_from_types(st, source_cond.check_type, target_cond.check_type);
            self.infer_from_types(st, source_cond.extends_type, target_cond.extends_type);
            self.infer_from_types(st, source_cond.true_type, target_cond.true_type);
            self.infer_from_types(st, source_cond.false_type, target_cond.false_type);
        } else {
            let priority = if st.contravariant {
                InferencePriority::CONTRAVARIANT_CONDITIONAL
            } else {
                InferencePriority::NONE
            };
            let saved = st.priority;
            st.priority |= priority;
            let targets = [target_cond.true_type, target_cond.false_type];
            self.infer_to_multiple_types(st, source, &targets, true);
            st.priority = saved;
        }
    }

    fn infer_to_template_literal_type(&mut self, st: &mut InferenceState, source: TypeId, target: TemplateLiteralId) {
        let interner = self.interner;
        let template = interner.template_literal_type(target);
        let texts = template_texts(interner, &template);
        let matches = self.infer_types_from_template_literal(source, &template);
        if matches.is_none() && !texts.iter().all(|t| t.is_empty()) {
            return;
        }
        for (index, &placeholder) in template.types.iter().enumerate() {
            let part = matches
                .as_ref()
                .and_then(|m| m.get(index).copied())
                .unwrap_or(TypeId::NEVER);
            if is_string_literal(interner, part) {
                if let Some(matching) = self.constraint_member_for_text(part, placeholder) {
                    self.infer_from_types(st, matching, placeholder);
                    continue;
                }
            }
            self.infer_from_types(st, part, placeholder);
        }
    }

    /// Types covering each placeholder of `template` in `source`.
    fn infer_types_from_template_literal(
        &self,
        source: TypeId,
        template: &TemplateLiteralType,
    ) -> Option<Vec<TypeId>> {
        let interner = self.interner;
        let target_texts = template_texts(interner, template);
        match interner.lookup(source)? {
            TypeKey::Literal(LiteralValue::String(atom))
            | TypeKey::FreshLiteral(LiteralValue::String(atom)) => {
                infer_from_literal_parts(interner, &[interner.resolve_atom(atom)], &[], &target_texts)
            }
            TypeKey::TemplateLiteral(id) => {
                let source_template = interner.template_literal_type(id);
                if source_template.texts == template.texts {
                    let parts = source_template
                        .types
                        .iter()
                        .zip(template.types.iter())
                        .map(|(&s, &t)| {
                            if self
                                .relation
                                .is_assignable_to(self.base_constraint_or_type(s), self.base_constraint_or_type(t))
                            {
                                s
                            } else {
                                self.string_like_type_for(s)
                            }
                        })
                        .collect();
                    return Some(parts);
                }
                infer_from_literal_parts(
                    interner,
                    &template_texts(interner, &source_template),
                    &source_template.types,
                    &target_texts,
                )
            }
            _ => None,
        }
    }

    fn base_constraint_or_type(&self, type_id: TypeId) -> TypeId {
        match self.interner.lookup(type_id) {
            Some(TypeKey::TypeParameter(_)) => self
                .interner
                .type_param_constraint(type_id)
                .unwrap_or(TypeId::UNKNOWN),
            _ => type_id,
        }
    }

    /// `t` itself when string-like, else `${t}`.
    fn string_like_type_for(&self, type_id: TypeId) -> TypeId {
        let string_like = type_id.is_any()
            || type_id == TypeId::STRING
            || is_string_literal(self.interner, type_id)
            || matches!(
                self.interner.lookup(type_id),
                Some(TypeKey::TemplateLiteral(_) | TypeKey::StringIntrinsic { .. })
            );
        if string_like {
            type_id
        } else {
            self.interner.template_literal(vec!["", ""], vec![type_id])
        }
    }

    /// The most specific member of a placeholder's constraint that the
    /// literal text `part` can stand for.
    fn constraint_member_for_text(&self, part: TypeId, placeholder: TypeId) -> Option<TypeId> {
        let interner = self.interner;
        self.inference_index(placeholder)?;
        let constraint = interner.type_param_constraint(placeholder)?;
        if constraint.is_any() {
            return None;
        }
        let members = union_members(interner, constraint);
        if members.contains(&TypeId::STRING) {
            return None;
        }
        let text = interner.literal_text(part)?;
        let numeric = is_numeric_text(&text);
        let bigint = text.parse::<i128>().is_ok();
        members
            .iter()
            .filter_map(|&member| {
                let candidate = match (member, interner.lookup(member)) {
                    (_, Some(TypeKey::TemplateLiteral(_)))
                        if is_text_valid_for_placeholder(interner, &text, member) =>
                    {
                        (1, part)
                    }
                    (_, Some(TypeKey::StringIntrinsic { kind, .. })) if kind.apply(&text) == text => (2, part),
                    (_, Some(TypeKey::Literal(LiteralValue::String(_))))
                        if interner.literal_text(member).as_deref() == Some(text.as_str()) =>
                    {
                        (3, member)
                    }
                    (TypeId::NUMBER, _) if numeric => (4, interner.literal_number(text.parse().ok()?)),
                    (_, Some(TypeKey::Literal(LiteralValue::Number(n))))
                        if numeric && text.parse::<f64>().ok() == Some(n.0) =>
                    {
                        (5, member)
                    }
                    (TypeId::BIGINT, _) if bigint => (6, interner.literal_bigint(&text)),
                    (_, Some(TypeKey::Literal(LiteralValue::BigInt(_))))
                        if bigint && interner.literal_text(member).as_deref() == Some(text.as_str()) =>
                    {
                        (7, member)
                    }
                    (_, Some(TypeKey::Literal(LiteralValue::Boolean(b))))
                        if (if b { "true" } else { "false" }) == text =>
                    {
                        (8, member)
                    }
                    (TypeId::UNDEFINED, _) if text == "undefined" => (9, member),
                    (TypeId::NULL, _) if text == "null" => (10, member),
                    _ => return None,
                };
                Some(candidate)
            })
            .min_by_key(|&(rank, _)| rank)
            .map(|(_, ty)| ty)
    }

    fn is_generic_mapped_type(&self, type_id: TypeId) -> bool {
        match self.interner.lookup(type_id) {
            Some(TypeKey::Mapped(id)) => {
                could_contain_type_variables(self.interner, self.interner.mapped_type(id).constraint)
            }
            _ => false,
        }
    }

    fn infer_from_generic_mapped_types(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        let interner = self.interner;
        let (Some(TypeKey::Mapped(s)), Some(TypeKey::Mapped(t))) =
            (interner.lookup(source), interner.lookup(target))
        else {
            return;
        };
        let source_mapped = interner.mapped_type(s);
        let target_mapped = interner.mapped_type(t);
        self.infer_from_types(st, source_mapped.constraint, target_mapped.constraint);
        self.infer_from_types(st, source_mapped.template, target_mapped.template);
        if let (Some(s_name), Some(t_name)) = (source_mapped.name_type, target_mapped.name_type) {
            self.infer_from_types(st, s_name, t_name);
        }
    }

    /// The type variable a substitution or indexed access stands for:
    /// `T` for a substitution over `T`, `T[K]` for an access whose sides
    /// are substitutions.
    fn actual_type_variable(&self, type_id: TypeId) -> TypeId {
        let interner = self.interner;
        match interner.lookup(type_id) {
            Some(TypeKey::Substitution { base, .. }) => self.actual_type_variable(base),
            Some(TypeKey::IndexAccess(object, index))
                if matches!(interner.lookup(object), Some(TypeKey::Substitution { .. }))
                    || matches!(interner.lookup(index), Some(TypeKey::Substitution { .. })) =>
            {
                interner.index_access(self.actual_type_variable(object), self.actual_type_variable(index))
            }
            _ => type_id,
        }
    }

    /// `(A | B)[K]` as `A[K] | B[K]` and `(A & B)[K]` as `A[K] & B[K]`.
    fn distribute_index_over_object_type(&self, object: TypeId, index: TypeId) -> Option<TypeId> {
        let interner = self.interner;
        let (members, is_union) = match interner.lookup(object)? {
            TypeKey::Union(list) => (interner.type_list(list), true),
            TypeKey::Intersection(list) => (interner.type_list(list), false),
            _ => return None,
        };
        let accesses: Vec<TypeId> = members
            .iter()
            .map(|&member| evaluate_type(interner, self.relation, interner.index_access(member, index)))
            .collect();
        Some(if is_union {
            interner.union(accesses)
        } else {
            interner.intersection(accesses)
        })
    }

    /// Structure to look at when inferring from a non-object source.
    fn apparent_type(&self, type_id: TypeId) -> TypeId {
        let interner = self.interner;
        match interner.lookup(type_id) {
            Some(TypeKey::TypeParameter(_)) => interner
                .type_param_constraint(type_id)
                .filter(|&c| c != type_id)
                .unwrap_or(TypeId::EMPTY_OBJECT),
            Some(
                TypeKey::Application(_)
                | TypeKey::IndexAccess(..)
                | TypeKey::Conditional(_)
                | TypeKey::Index(_)
                | TypeKey::Mapped(_),
            ) => evaluate_type(interner, self.relation, type_id),
            _ => type_id,
        }
    }

    /// Expand applications to their structural body for member-wise inference.
    fn expanded(&self, type_id: TypeId) -> TypeId {
        match self.interner.lookup(type_id) {
            Some(TypeKey::Application(_)) => evaluate_type(self.interner, self.relation, type_id),
            Some(TypeKey::EvolvingArray(element)) => self.interner.array(element),
            _ => type_id,
        }
    }

    // =========================================================================
    // Object types
    // =========================================================================

    fn infer_from_object_types(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        let interner = self.interner;
        match (interner.lookup(source), interner.lookup(target)) {
            (Some(TypeKey::Application(s)), Some(TypeKey::Application(t)))
                if interner.type_application(s).base == interner.type_application(t).base =>
            {
                self.infer_from_application_arguments(st, s, t);
                return;
            }
            (Some(TypeKey::Array(s)), Some(TypeKey::Array(t))) => {
                self.infer_from_types(st, s, t);
                return;
            }
            _ => {}
        }
        let source = self.expanded(source);
        let target = self.expanded(target);

        if self.is_generic_mapped_type(source) && self.is_generic_mapped_type(target) {
            self.infer_from_generic_mapped_types(st, source, target);
        }
        if let Some(TypeKey::Mapped(id)) = interner.lookup(target) {
            let mapped = interner.mapped_type(id);
            if mapped.name_type.is_none() && self.infer_to_mapped_type(st, source, target, mapped.constraint) {
                return;
            }
        }
        if self.types_definitely_unrelated(source, target) {
            return;
        }

        let source_elements = tuple_elements(interner, source);
        let source_array_element = crate::type_queries::array_element_type(interner, source);
        if source_elements.is_some() || source_array_element.is_some() {
            if let Some(target_elements) = tuple_elements(interner, target) {
                self.infer_to_tuple(st, source_elements.as_deref(), source_array_element, &target_elements);
                return;
            }
            if crate::type_queries::array_element_type(interner, target).is_some() {
                self.infer_from_index_types(st, source, target);
                return;
            }
        }

        self.infer_from_properties(st, source, target);
        self.infer_from_signatures(st, source, target, false);
        self.infer_from_signatures(st, source, target, true);
        self.infer_from_index_types(st, source, target);
    }

    fn infer_to_tuple(
        &mut self,
        st: &mut InferenceState,
        source: Option<&[TupleElement]>,
        source_array_element: Option<TypeId>,
        target: &[TupleElement],
    ) {
        let interner = self.interner;
        let target_arity = target.len();

        if let Some(source) = source {
            let structure_matches = source.len() == target_arity
                && source.iter().zip(target.iter()).all(|(s, t)| {
                    s.flags.intersection(ElementFlags::VARIABLE)
                        == t.flags.intersection(ElementFlags::VARIABLE)
                });
            if structure_matches {
                for (s, t) in source.iter().zip(target.iter()) {
                    self.infer_from_types(st, s.type_id, t.type_id);
                }
                return;
            }
        }

        let (start_length, end_length) = match source {
            Some(source) => {
                let start = fixed_length(source).min(fixed_length(target));
                let end = if target.iter().any(|e| e.flags.intersects(ElementFlags::VARIABLE)) {
                    end_fixed_count(source).min(end_fixed_count(target))
                } else {
                    0
                };
                (start, end.min(source.len() - start))
            }
            None => (0, 0),
        };

        if let Some(source) = source {
            for i in 0..start_length {
                self.infer_from_types(st, source[i].type_id, target[i].type_id);
            }
        }

        let source_arity = source.map_or(1, |s| s.len());
        let single_rest = match source {
            None => source_array_element,
            Some(source) => (source_arity - start_length - end_length == 1
                && source[start_length].flags.contains(ElementFlags::REST))
            .then(|| source[start_length].type_id),
        };

        if let Some(rest_type) = single_rest {
            for t in &target[start_length..target_arity - end_length] {
                let element = if t.flags.contains(ElementFlags::VARIADIC) {
                    interner.array(rest_type)
                } else {
                    rest_type
                };
                self.infer_from_types(st, element, t.type_id);
            }
        } else if let Some(source) = source {
            let middle_length = target_arity - start_length - end_length;
            if middle_length == 2 {
                let first = target[start_length];
                let second = target[start_length + 1];
                if first.flags.contains(ElementFlags::VARIADIC) && second.flags.contains(ElementFlags::VARIADIC) {
                    if let Some(index) = self.inference_index(first.type_id) {
                        let implied = self.inferences[index].implied_arity;
                        if implied >= 0 {
                            let implied = implied as usize;
                            let leading = slice_tuple(interner, source, start_length, (end_length + source_arity).saturating_sub(implied));
                            self.infer_from_types(st, leading, first.type_id);
                            let trailing = slice_tuple(interner, source, start_length + implied, end_length);
                            self.infer_from_types(st, trailing, second.type_id);
                        }
                    }
                } else if first.flags.contains(ElementFlags::VARIADIC) && second.flags.contains(ElementFlags::REST) {
                    if let Some(implied) = self.fixed_tuple_constraint_arity(first.type_id) {
                        let leading = slice_tuple(interner, source, start_length, source_arity.saturating_sub(start_length + implied));
                        self.infer_from_types(st, leading, first.type_id);
                        if let Some(rest) = element_type_of_slice(interner, source, start_length + implied, end_length) {
                            self.infer_from_types(st, rest, second.type_id);
                        }
                    }
                } else if first.flags.contains(ElementFlags::REST) && second.flags.contains(ElementFlags::VARIADIC) {
                    if let Some(implied) = self.fixed_tuple_constraint_arity(second.type_id) {
                        let end_index = source_arity.saturating_sub(end_fixed_count(target));
                        let start_index = end_index.saturating_sub(implied);
                        let trailing = interner.tuple(source[start_index..end_index].to_vec());
                        if let Some(rest) = element_type_of_slice(interner, source, start_length, end_length + implied) {
                            self.infer_from_types(st, rest, first.type_id);
                        }
                        self.infer_from_types(st, trailing, second.type_id);
                    }
                }
            } else if middle_length == 1 && target[start_length].flags.contains(ElementFlags::VARIADIC) {
                let ends_in_optional = target
                    .last()
                    .is_some_and(|e| e.flags.contains(ElementFlags::OPTIONAL));
                let priority = if ends_in_optional {
                    InferencePriority::SPECULATIVE_TUPLE
                } else {
                    InferencePriority::NONE
                };
                let slice = slice_tuple(interner, source, start_length, end_length);
                self.infer_with_priority(st, slice, target[start_length].type_id, priority);
            } else if middle_length == 1 && target[start_length].flags.contains(ElementFlags::REST) {
                if let Some(rest) = element_type_of_slice(interner, source, start_length, end_length) {
                    self.infer_from_types(st, rest, target[start_length].type_id);
                }
            }
        }

        if let Some(source) = source {
            for i in 0..end_length {
                self.infer_from_types(
                    st,
                    source[source_arity - i - 1].type_id,
                    target[target_arity - i - 1].type_id,
                );
            }
        }
    }

    /// Arity of a context type parameter constrained to a fixed-length tuple.
    fn fixed_tuple_constraint_arity(&self, type_id: TypeId) -> Option<usize> {
        let index = self.inference_index(type_id)?;
        let constraint = self
            .interner
            .type_param_constraint(self.inferences[index].type_param)?;
        let elements = tuple_elements(self.interner, constraint)?;
        if elements.iter().any(|e| e.flags.intersects(ElementFlags::VARIABLE)) {
            return None;
        }
        Some(fixed_length(&elements))
    }

    fn types_definitely_unrelated(&self, source: TypeId, target: TypeId) -> bool {
        let interner = self.interner;
        if let (Some(s), Some(t)) = (tuple_elements(interner, source), tuple_elements(interner, target)) {
            let t_variadic = t.iter().any(|e| e.flags.contains(ElementFlags::VARIADIC));
            let t_variable = t.iter().any(|e| e.flags.intersects(ElementFlags::VARIABLE));
            let s_variable = s.iter().any(|e| e.flags.intersects(ElementFlags::VARIABLE));
            return (!t_variadic && min_length(&t) > min_length(&s))
                || (!t_variable && (s_variable || fixed_length(&t) < fixed_length(&s)));
        }
        match (object_shape_of(interner, source), object_shape_of(interner, target)) {
            (Some(s), Some(t)) => has_unmatched_property(&s, &t) && has_unmatched_property(&t, &s),
            _ => false,
        }
    }

    fn infer_from_properties(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        let (Some(source_shape), Some(target_shape)) = (
            object_shape_of(self.interner, source),
            object_shape_of(self.interner, target),
        ) else {
            return;
        };
        for target_prop in &target_shape.properties {
            if let Some(source_prop) = source_shape.property(target_prop.name) {
                self.infer_from_types(st, source_prop.type_id, target_prop.type_id);
            }
        }
    }

    fn infer_from_signatures(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId, construct: bool) {
        let (Some(source_shape), Some(target_shape)) = (
            object_shape_of(self.interner, source),
            object_shape_of(self.interner, target),
        ) else {
            return;
        };
        let (sources, targets) = if construct {
            (&source_shape.construct_signatures, &target_shape.construct_signatures)
        } else {
            (&source_shape.call_signatures, &target_shape.call_signatures)
        };
        let source_len = sources.len();
        if source_len == 0 {
            return;
        }
        let target_len = targets.len();
        for (i, target_sig) in targets.iter().enumerate() {
            let source_index = (source_len + i).saturating_sub(target_len).min(source_len - 1);
            self.infer_from_signature(st, &sources[source_index], target_sig);
        }
    }

    fn infer_from_signature(&mut self, st: &mut InferenceState, source: &FunctionShape, target: &FunctionShape) {
        let saved_bivariant = st.bivariant;
        st.bivariant = st.bivariant || target.is_method;
        for (s, t) in self.parameter_type_pairs(source, target) {
            self.infer_from_contravariant_types_if_strict(st, s, t);
        }
        st.bivariant = saved_bivariant;

        if let (Some(tp), Some(sp)) = (target.type_predicate, source.type_predicate) {
            if tp.kind == sp.kind {
                if let (Some(t), Some(s)) = (tp.type_id, sp.type_id) {
                    self.infer_from_types(st, s, t);
                    return;
                }
            }
        }
        if could_contain_type_variables(self.interner, target.return_type) {
            self.infer_from_types(st, source.return_type, target.return_type);
        }
    }

    /// Pairs of (source, target) parameter types matched by position,
    /// including `this` and a trailing rest parameter.
    fn parameter_type_pairs(&self, source: &FunctionShape, target: &FunctionShape) -> Vec<(TypeId, TypeId)> {
        let mut pairs = Vec::new();
        if let (Some(s), Some(t)) = (source.this_type, target.this_type) {
            pairs.push((s, t));
        }
        let source_has_rest = source.has_rest_parameter();
        let target_rest = target.params.last().filter(|p| p.rest).map(|p| p.type_id);
        let target_non_rest = target.params.len() - usize::from(target_rest.is_some());
        let param_count = if source_has_rest {
            target_non_rest
        } else {
            source.params.len().min(target_non_rest)
        };
        for i in 0..param_count {
            pairs.push((self.type_at_position(source, i), self.type_at_position(target, i)));
        }
        if let Some(target_rest) = target_rest {
            pairs.push((self.rest_type_at_position(source, param_count), target_rest));
        }
        pairs
    }

    fn type_at_position(&self, sig: &FunctionShape, index: usize) -> TypeId {
        let non_rest = sig.params.len() - usize::from(sig.has_rest_parameter());
        if index < non_rest {
            return sig.params[index].type_id;
        }
        let Some(rest) = sig.params.last().filter(|p| p.rest) else {
            return TypeId::ANY;
        };
        let offset = index - non_rest;
        if let Some(elements) = tuple_elements(self.interner, rest.type_id) {
            if let Some(element) = elements.get(offset) {
                if !element.flags.intersects(ElementFlags::VARIABLE) {
                    return element.type_id;
                }
            }
        }
        crate::type_queries::element_type_of_array_like(self.interner, rest.type_id)
            .unwrap_or_else(|| self.interner.index_access(rest.type_id, TypeId::NUMBER))
    }

    /// The parameters of `sig` from `position` on, as a tuple.
    fn rest_type_at_position(&self, sig: &FunctionShape, position: usize) -> TypeId {
        let non_rest = sig.params.len() - usize::from(sig.has_rest_parameter());
        if sig.has_rest_parameter() && position == non_rest {
            if let Some(rest) = sig.params.last() {
                return rest.type_id;
            }
        }
        let mut elements = Vec::new();
        for param in sig.params.iter().skip(position) {
            if param.rest {
                match crate::type_queries::array_element_type(self.interner, param.type_id) {
                    Some(element) => elements.push(TupleElement::rest(element)),
                    None => elements.push(TupleElement::variadic(param.type_id)),
                }
            } else if param.optional {
                elements.push(TupleElement::optional(param.type_id));
            } else {
                elements.push(TupleElement::required(param.type_id));
            }
        }
        self.interner.tuple(elements)
    }

    fn index_infos(&self, type_id: TypeId) -> Vec<IndexSignature> {
        let interner = self.interner;
        match interner.lookup(type_id) {
            Some(TypeKey::Object(shape_id)) => {
                let shape = interner.object_shape(shape_id);
                shape.string_index.into_iter().chain(shape.number_index).collect()
            }
            Some(TypeKey::Array(_) | TypeKey::Tuple(_)) => {
                let element = crate::type_queries::element_type_of_array_like(interner, type_id)
                    .unwrap_or(TypeId::UNKNOWN);
                vec![IndexSignature {
                    key_type: TypeId::NUMBER,
                    value_type: element,
                    readonly: false,
                }]
            }
            _ => Vec::new(),
        }
    }

    fn infer_from_index_types(&mut self, st: &mut InferenceState, source: TypeId, target: TypeId) {
        let interner = self.interner;
        let both_mapped = matches!(interner.lookup(source), Some(TypeKey::Mapped(_)))
            && matches!(interner.lookup(target), Some(TypeKey::Mapped(_)));
        let priority = if both_mapped {
            InferencePriority::HOMOMORPHIC_MAPPED_TYPE
        } else {
            InferencePriority::NONE
        };
        let target_infos = self.index_infos(target);
        let source_infos = self.index_infos(source);

        let inferable_index = object_shape_of(interner, source).filter(|shape| {
            !shape.flags.contains(ObjectFlags::CLASS_INSTANCE)
                && shape.call_signatures.is_empty()
                && shape.construct_signatures.is_empty()
        });
        if let Some(shape) = inferable_index {
            for target_info in &target_infos {
                let mut prop_types = Vec::new();
                for prop in &shape.properties {
                    let numeric = is_numeric_text(&interner.resolve_atom(prop.name));
                    if target_info.key_type == TypeId::STRING || numeric {
                        prop_types.push(prop.type_id);
                    }
                }
                for info in &source_infos {
                    if is_applicable_index_type(info.key_type, target_info.key_type) {
                        prop_types.push(info.value_type);
                    }
                }
                if !prop_types.is_empty() {
                    let union = interner.union(prop_types);
                    self.infer_with_priority(st, union, target_info.value_type, priority);
                }
            }
        }

        for target_info in &target_infos {
            let applicable = source_infos
                .iter()
                .find(|info| info.key_type == target_info.key_type)
                .or_else(|| {
                    source_infos
                        .iter()
                        .find(|info| is_applicable_index_type(target_info.key_type, info.key_type))
                });
            if let Some(source_info) = applicable {
                self.infer_with_priority(st, source_info.value_type, target_info.value_type, priority);
            }
        }
    }

    // =========================================================================
    // Mapped types
    // =========================================================================

    fn infer_to_mapped_type(
        &mut self,
        st: &mut InferenceState,
        source: TypeId,
        target: TypeId,
        constraint: TypeId,
    ) -> bool {
        let interner = self.interner;
        match interner.lookup(constraint) {
            Some(TypeKey::Union(list) | TypeKey::Intersection(list)) => {
                let mut result = false;
                for &member in interner.type_list(list).iter() {
                    result = self.infer_to_mapped_type(st, source, target, member) || result;
                }
                result
            }
            Some(TypeKey::Index(inner)) => {
                if let Some(index) = self.inference_index(inner) {
                    if !self.inferences[index].is_fixed {
                        if let Some(inferred) = self.infer_type_for_homomorphic_mapped_type(source, target, constraint) {
                            let priority = if self.is_non_inferrable(source) {
                                InferencePriority::PARTIAL_HOMOMORPHIC_MAPPED_TYPE
                            } else {
                                InferencePriority::HOMOMORPHIC_MAPPED_TYPE
                            };
                            let type_param = self.inferences[index].type_param;
                            self.infer_with_priority(st, inferred, type_param, priority);
                        }
                    }
                }
                true
            }
            Some(TypeKey::TypeParameter(_)) => {
                let keys = evaluate_type(interner, self.relation, interner.keyof(source));
                self.infer_with_priority(st, keys, constraint, InferencePriority::MAPPED_TYPE_CONSTRAINT);
                if let Some(extended) = interner.type_param_constraint(constraint) {
                    if extended != constraint && self.infer_to_mapped_type(st, source, target, extended) {
                        return true;
                    }
                }
                let Some(TypeKey::Mapped(mapped_id)) = interner.lookup(target) else {
                    return true;
                };
                let template = interner.mapped_type(mapped_id).template;
                let mut types = Vec::new();
                if let Some(shape) = object_shape_of(interner, source) {
                    types.extend(shape.properties.iter().map(|p| p.type_id));
                    types.extend(shape.string_index.iter().map(|i| i.value_type));
                    types.extend(shape.number_index.iter().map(|i| i.value_type));
                }
                let union = interner.union(types);
                self.infer_from_types(st, union, template);
                true
            }
            _ => false,
        }
    }

    fn infer_type_for_homomorphic_mapped_type(
        &mut self,
        source: TypeId,
        target: TypeId,
        constraint: TypeId,
    ) -> Option<TypeId> {
        let key = (source, target, constraint);
        if let Some(&cached) = self.reverse.homomorphic_cache.get(&key) {
            return cached;
        }
        let result = self.create_reverse_mapped_type(source, target, constraint);
        self.reverse.homomorphic_cache.insert(key, result);
        result
    }

    fn create_reverse_mapped_type(&mut self, source: TypeId, target: TypeId, constraint: TypeId) -> Option<TypeId> {
        let interner = self.interner;
        let Some(TypeKey::Mapped(mapped_id)) = interner.lookup(target) else {
            return None;
        };
        let mapped = interner.mapped_type(mapped_id);
        match interner.lookup(source)? {
            TypeKey::Array(element) => {
                let element = self.infer_reverse_mapped_type(element, target, constraint)?;
                Some(interner.array(element))
            }
            TypeKey::Tuple(list) => {
                let mut elements = Vec::new();
                for element in interner.tuple_list(list).iter() {
                    let reversed = self.infer_reverse_mapped_type(element.type_id, target, constraint)?;
                    let mut flags = element.flags;
                    if mapped.optional_modifier == MappedModifier::Add && flags.contains(ElementFlags::OPTIONAL) {
                        flags = ElementFlags::REQUIRED;
                    }
                    elements.push(TupleElement {
                        type_id: reversed,
                        name: element.name,
                        flags,
                    });
                }
                Some(interner.tuple(elements))
            }
            TypeKey::Object(shape_id) => {
                let shape = interner.object_shape(shape_id);
                let partially_inferable = !shape.flags.contains(ObjectFlags::NON_INFERRABLE)
                    || (shape.flags.contains(ObjectFlags::OBJECT_LITERAL)
                        && shape.properties.iter().any(|p| !self.is_non_inferrable(p.type_id)));
                if shape.string_index.is_none() && (shape.properties.is_empty() || !partially_inferable) {
                    return None;
                }
                let mut reversed = ObjectShape::default();
                for prop in &shape.properties {
                    let type_id = self
                        .infer_reverse_mapped_type(prop.type_id, target, constraint)
                        .unwrap_or(TypeId::UNKNOWN);
                    reversed.properties.push(PropertyInfo {
                        type_id,
                        optional: prop.optional && mapped.optional_modifier != MappedModifier::Add,
                        readonly: prop.readonly && mapped.readonly_modifier != MappedModifier::Add,
                        ..*prop
                    });
                }
                if let Some(index) = shape.string_index {
                    let value_type = self
                        .infer_reverse_mapped_type(index.value_type, target, constraint)
                        .unwrap_or(TypeId::UNKNOWN);
                    reversed.string_index = Some(IndexSignature { value_type, ..index });
                }
                Some(interner.object_with_shape(reversed))
            }
            _ => None,
        }
    }

    fn infer_reverse_mapped_type(&mut self, source: TypeId, target: TypeId, constraint: TypeId) -> Option<TypeId> {
        let key = (source, target, constraint);
        if let Some(&cached) = self.reverse.cache.get(&key) {
            return Some(cached.unwrap_or(TypeId::UNKNOWN));
        }
        if self.reverse.source_stack.len() >= MAX_REVERSE_MAPPED_NESTING {
            return None;
        }
        self.reverse.source_stack.push(source);
        self.reverse.target_stack.push(target);
        let saved_expanding = self.reverse.expanding;
        if is_deeply_nested_type(self.interner, source, &self.reverse.source_stack, DEEP_NESTING_WINDOW) {
            self.reverse.expanding |= EXPANDING_SOURCE;
        }
        if is_deeply_nested_type(self.interner, target, &self.reverse.target_stack, DEEP_NESTING_WINDOW) {
            self.reverse.expanding |= EXPANDING_TARGET;
        }
        let result = if self.reverse.expanding != EXPANDING_BOTH {
            Some(self.infer_reverse_mapped_type_worker(source, target, constraint))
        } else {
            None
        };
        self.reverse.source_stack.pop();
        self.reverse.target_stack.pop();
        self.reverse.expanding = saved_expanding;
        self.reverse.cache.insert(key, result);
        result
    }

    /// Infer the type `T[P]` from one source member through the template.
    fn infer_reverse_mapped_type_worker(&mut self, source: TypeId, target: TypeId, constraint: TypeId) -> TypeId {
        let interner = self.interner;
        let (Some(TypeKey::Mapped(mapped_id)), Some(TypeKey::Index(inner))) =
            (interner.lookup(target), interner.lookup(constraint))
        else {
            return TypeId::UNKNOWN;
        };
        let mapped = interner.mapped_type(mapped_id);
        let type_variable = interner.index_access(inner, mapped.type_param);
        let mut nested = InferenceContext::new(
            interner,
            vec![type_variable],
            None,
            InferenceFlags::NONE,
            self.relation,
        );
        std::mem::swap(&mut nested.reverse, &mut self.reverse);
        nested.infer(source, mapped.template, InferencePriority::NONE, false);
        std::mem::swap(&mut nested.reverse, &mut self.reverse);
        nested
            .type_from_inference(0)
            .unwrap_or(TypeId::UNKNOWN)
    }

    /// Object with one `any`-typed property per string literal in `source`.
    fn empty_object_from_string_literal(&self, source: TypeId) -> TypeId {
        let interner = self.interner;
        let mut shape = ObjectShape::default();
        for member in union_members(interner, source) {
            if let Some(LiteralValue::String(atom)) = literal_value(interner, member) {
                shape.properties.push(PropertyInfo::new(atom, TypeId::ANY));
            }
        }
        if source == TypeId::STRING {
            shape.string_index = Some(IndexSignature {
                key_type: TypeId::STRING,
                value_type: TypeId::EMPTY_OBJECT,
                readonly: false,
            });
        }
        interner.object_with_shape(shape)
    }
}

fn is_applicable_index_type(source_key: TypeId, target_key: TypeId) -> bool {
    source_key == target_key || (target_key == TypeId::STRING && source_key == TypeId::NUMBER)
}

/// Leading elements that are required or optional.
fn fixed_length(elements: &[TupleElement]) -> usize {
    elements
        .iter()
        .take_while(|e| e.flags.intersects(ElementFlags::FIXED))
        .count()
}

/// Trailing elements that are required or optional.
fn end_fixed_count(elements: &[TupleElement]) -> usize {
    elements
        .iter()
        .rev()
        .take_while(|e| e.flags.intersects(ElementFlags::FIXED))
        .count()
}

fn min_length(elements: &[TupleElement]) -> usize {
    elements
        .iter()
        .rposition(|e| e.flags.contains(ElementFlags::REQUIRED))
        .map_or(0, |i| i + 1)
}

fn slice_tuple(interner: &TypeInterner, elements: &[TupleElement], start: usize, end_skip: usize) -> TypeId {
    let end = elements.len().saturating_sub(end_skip).max(start.min(elements.len()));
    let start = start.min(end);
    interner.tuple(elements[start..end].to_vec())
}

fn element_type_of_slice(
    interner: &TypeInterner,
    elements: &[TupleElement],
    start: usize,
    end_skip: usize,
) -> Option<TypeId> {
    let end = elements.len().saturating_sub(end_skip);
    if start >= end {
        return None;
    }
    let members: Vec<TypeId> = elements[start..end]
        .iter()
        .map(|e| {
            if e.flags.contains(ElementFlags::VARIADIC) {
                crate::type_queries::element_type_of_array_like(interner, e.type_id)
                    .unwrap_or_else(|| interner.index_access(e.type_id, TypeId::NUMBER))
            } else {
                e.type_id
            }
        })
        .collect();
    Some(interner.union(members))
}

/// `target` has a required property that `source` lacks.
fn has_unmatched_property(source: &ObjectShape, target: &ObjectShape) -> bool {
    target
        .properties
        .iter()
        .any(|p| !p.optional && source.property(p.name).is_none())
}

/// `[T[0]]` (or `T[0]`) as a candidate for `T` carries no information.
fn is_tuple_of_self(interner: &TypeInterner, type_param: TypeId, candidate: TypeId) -> bool {
    let first_of_self = interner.index_access(type_param, interner.literal_number(0.0));
    if candidate == first_of_self {
        return true;
    }
    match tuple_elements(interner, candidate) {
        Some(elements) => elements.len() == 1 && elements[0].type_id == first_of_self,
        None => false,
    }
}

/// Whether `type_param` occurs at the top level of `type_id`: the type
/// itself, a union or intersection member, or a conditional branch.
pub fn is_type_parameter_at_top_level(
    interner: &TypeInterner,
    type_id: TypeId,
    type_param: TypeId,
    depth: u32,
) -> bool {
    if type_id == type_param {
        return true;
    }
    match interner.lookup(type_id) {
        Some(TypeKey::Union(list) | TypeKey::Intersection(list)) => interner
            .type_list(list)
            .iter()
            .any(|&m| is_type_parameter_at_top_level(interner, m, type_param, depth)),
        Some(TypeKey::Conditional(id)) if depth < MAX_TYPE_PARAMETER_TOP_LEVEL_DEPTH => {
            let cond = interner.conditional_type(id);
            is_type_parameter_at_top_level(interner, cond.true_type, type_param, depth + 1)
                || is_type_parameter_at_top_level(interner, cond.false_type, type_param, depth + 1)
        }
        _ => false,
    }
}

/// Whether `type_id` is the `max_depth`-th (or later) type on `stack`
/// sharing its recursion identity, counting only occurrences with
/// non-decreasing type ids.
fn is_deeply_nested_type(interner: &TypeInterner, type_id: TypeId, stack: &[TypeId], max_depth: usize) -> bool {
    if stack.len() < max_depth {
        return false;
    }
    if let Some(TypeKey::Intersection(list)) = interner.lookup(type_id) {
        return interner
            .type_list(list)
            .iter()
            .any(|&m| is_deeply_nested_type(interner, m, stack, max_depth));
    }
    let identity = recursion_identity(interner, type_id);
    let mut count = 0;
    let mut last_type_id = 0;
    for &entry in stack {
        if recursion_identity(interner, entry) == identity {
            if entry.0 >= last_type_id {
                count += 1;
                if count >= max_depth {
                    return true;
                }
            }
            last_type_id = entry.0;
        }
    }
    false
}
