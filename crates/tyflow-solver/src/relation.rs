//! Structural type relations.
//!
//! `RelationChecker` implements assignability, subtyping, strict subtyping,
//! comparability and identity over interned types. Recursive comparisons
//! are tracked by a `RecursionGuard` keyed on `(source, target, kind)`:
//! re-entering a pair that is already being compared assumes it related,
//! and exceeding the depth or iteration budget reports it unrelated.
//!
//! Results are memoized once the outermost comparison finishes, so no
//! cached answer ever depends on a cycle assumption.

use crate::evaluate::evaluate_type;
use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::template_literal::{is_text_valid_for_placeholder, match_template_parts, template_texts};
use crate::type_queries::{element_type_of_array_like, is_object_like_type};
use crate::types::*;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use tracing::trace;
use tyflow_common::limits::{STACK_GROWTH, STACK_RED_ZONE};
use tyflow_common::options::CheckerOptions;

/// Type relation queries needed by narrowing and inference.
pub trait TypeRelation {
    fn is_assignable_to(&self, source: TypeId, target: TypeId) -> bool;
    fn is_subtype_of(&self, source: TypeId, target: TypeId) -> bool;
    fn is_strict_subtype_of(&self, source: TypeId, target: TypeId) -> bool;
    fn is_comparable_to(&self, source: TypeId, target: TypeId) -> bool;
    fn is_type_identical_to(&self, source: TypeId, target: TypeId) -> bool;

    fn strict_null_checks(&self) -> bool {
        true
    }

    /// Parameters compare contravariantly.
    fn strict_function_types(&self) -> bool {
        true
    }

    /// Implicit `any` is reported where flow analysis has to fall back to it.
    fn no_implicit_any(&self) -> bool {
        false
    }

    /// Comparable in either direction.
    fn are_types_comparable(&self, left: TypeId, right: TypeId) -> bool {
        self.is_comparable_to(left, right) || self.is_comparable_to(right, left)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Identity,
    StrictSubtype,
    Subtype,
    Assignable,
    Comparable,
}

type RelationKey = (TypeId, TypeId, RelationKind);

pub struct RelationChecker<'a> {
    interner: &'a TypeInterner,
    options: CheckerOptions,
    cache: RefCell<FxHashMap<RelationKey, bool>>,
    guard: RefCell<RecursionGuard<RelationKey>>,
}

impl<'a> RelationChecker<'a> {
    pub fn new(interner: &'a TypeInterner, options: CheckerOptions) -> Self {
        RelationChecker {
            interner,
            options: options.apply_strict_defaults(),
            cache: RefCell::new(FxHashMap::default()),
            guard: RefCell::new(RecursionGuard::with_profile(RecursionProfile::SubtypeCheck)),
        }
    }

    pub fn interner(&self) -> &'a TypeInterner {
        self.interner
    }

    pub fn options(&self) -> &CheckerOptions {
        &self.options
    }

    pub fn is_related(&self, source: TypeId, target: TypeId, kind: RelationKind) -> bool {
        if source == target {
            return true;
        }
        if kind == RelationKind::Identity {
            return self.interner.regular_type_of(source) == self.interner.regular_type_of(target);
        }
        if let Some(simple) = self.simple_related(source, target, kind) {
            return simple;
        }
        let key = (source, target, kind);
        if let Some(&cached) = self.cache.borrow().get(&key) {
            return cached;
        }

        let entered = self.guard.borrow_mut().enter(key);
        match entered {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return true,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                trace!(source = source.0, target = target.0, "relation budget exceeded");
                return false;
            }
        }

        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.structured_related(source, target, kind)
        });

        let outermost = {
            let mut guard = self.guard.borrow_mut();
            guard.leave(key);
            let outermost = !guard.is_active();
            if outermost {
                guard.reset();
            }
            outermost
        };
        if outermost {
            self.cache.borrow_mut().insert(key, result);
        }
        result
    }

    /// Rules decided without looking at structure.
    fn simple_related(&self, source: TypeId, target: TypeId, kind: RelationKind) -> Option<bool> {
        let strict = self.options.strict_null_checks;
        if source == TypeId::ERROR || target == TypeId::ERROR {
            return Some(true);
        }
        if target == TypeId::UNKNOWN || target.is_any() {
            return Some(true);
        }
        if source.is_never() {
            return Some(true);
        }
        if target.is_never() {
            return Some(false);
        }
        if source.is_any() {
            return Some(matches!(kind, RelationKind::Assignable | RelationKind::Comparable));
        }
        if source == TypeId::UNKNOWN {
            return Some(false);
        }
        if !strict && matches!(source, TypeId::NULL | TypeId::UNDEFINED) {
            return Some(true);
        }
        if source == TypeId::UNDEFINED && target == TypeId::VOID {
            return Some(true);
        }
        if target == TypeId::EMPTY_OBJECT
            && crate::type_queries::is_primitive_type(self.interner, source)
            && !source.is_nullable()
        {
            return Some(true);
        }
        None
    }

    fn structured_related(&self, source: TypeId, target: TypeId, kind: RelationKind) -> bool {
        let interner = self.interner;
        let source = interner.regular_type_of(source);
        let target = interner.regular_type_of(target);
        if source == target {
            return true;
        }

        if let (Some(TypeKey::Application(s_app)), Some(TypeKey::Application(t_app))) =
            (interner.lookup(source), interner.lookup(target))
        {
            let s_app = interner.type_application(s_app);
            let t_app = interner.type_application(t_app);
            if s_app.base == t_app.base {
                if let Some(result) = self.type_arguments_related(&s_app, &t_app, kind) {
                    return result;
                }
            }
        }

        let source_eval = evaluate_type(interner, self, source);
        let target_eval = evaluate_type(interner, self, target);
        if source_eval != source || target_eval != target {
            return self.is_related(source_eval, target_eval, kind);
        }

        let source_key = interner.lookup(source);
        let target_key = interner.lookup(target);

        if let Some(TypeKey::Union(list)) = source_key {
            let members = interner.type_list(list);
            return if kind == RelationKind::Comparable {
                members.iter().any(|&m| self.is_related(m, target, kind))
            } else {
                members.iter().all(|&m| self.is_related(m, target, kind))
            };
        }
        if let Some(TypeKey::Union(list)) = target_key {
            return interner
                .type_list(list)
                .iter()
                .any(|&m| self.is_related(source, m, kind));
        }
        if let Some(TypeKey::Intersection(list)) = target_key {
            return interner
                .type_list(list)
                .iter()
                .all(|&m| self.is_related(source, m, kind));
        }
        if let Some(TypeKey::Intersection(list)) = source_key {
            return interner
                .type_list(list)
                .iter()
                .any(|&m| self.is_related(m, target, kind));
        }

        match source_key {
            Some(TypeKey::TypeParameter(_)) => {
                let constraint = interner.type_param_constraint(source).unwrap_or(TypeId::UNKNOWN);
                return constraint != source && self.is_related(constraint, target, kind);
            }
            Some(TypeKey::Substitution { base, constraint }) => {
                return self.is_related(base, target, kind)
                    || self.is_related(constraint, target, kind);
            }
            Some(TypeKey::Conditional(id)) => {
                let cond = interner.conditional_type(id);
                let branches = interner.union2(cond.true_type, cond.false_type);
                return self.is_related(branches, target, kind);
            }
            Some(TypeKey::Index(_)) => {
                let keys = interner.union3(TypeId::STRING, TypeId::NUMBER, TypeId::SYMBOL);
                return self.is_related(keys, target, kind);
            }
            _ => {}
        }
        match target_key {
            Some(TypeKey::TypeParameter(_)) if kind == RelationKind::Comparable => {
                return interner
                    .type_param_constraint(target)
                    .is_some_and(|c| c != target && self.is_related(source, c, kind));
            }
            Some(TypeKey::Substitution { base, .. }) => {
                return self.is_related(source, base, kind);
            }
            _ => {}
        }

        if let Some(TypeKey::Literal(value)) = source_key {
            return self.literal_related(source, value, target, kind);
        }
        if matches!(
            source_key,
            Some(TypeKey::TemplateLiteral(_) | TypeKey::StringIntrinsic { .. })
        ) {
            return target == TypeId::STRING;
        }
        if source == TypeId::OBJECT {
            return target == TypeId::EMPTY_OBJECT;
        }
        if matches!(source_key, Some(TypeKey::Intrinsic(_))) {
            return false;
        }

        if target == TypeId::OBJECT {
            return is_object_like_type(interner, source);
        }
        self.object_like_related(source, target, kind)
    }

    fn literal_related(
        &self,
        source: TypeId,
        value: LiteralValue,
        target: TypeId,
        kind: RelationKind,
    ) -> bool {
        let interner = self.interner;
        let base = crate::widening::base_type_of_literal(interner, source);
        if target == base || (base == TypeId::BOOLEAN && target == TypeId::BOOLEAN) {
            return true;
        }
        if target == TypeId::EMPTY_OBJECT {
            return true;
        }
        if let LiteralValue::String(atom) = value {
            let text = interner.resolve_atom(atom);
            match interner.lookup(target) {
                Some(TypeKey::TemplateLiteral(id)) => {
                    let template = interner.template_literal_type(id);
                    let texts = template_texts(interner, &template);
                    return match match_template_parts(&text, &texts) {
                        Some(parts) => parts.iter().zip(template.types.iter()).all(|(part, &ty)| {
                            is_text_valid_for_placeholder(interner, part, ty)
                                || self.is_related(interner.literal_string(part), ty, kind)
                        }),
                        None => false,
                    };
                }
                Some(TypeKey::StringIntrinsic { .. }) => {
                    return is_text_valid_for_placeholder(interner, &text, target);
                }
                _ => {}
            }
        }
        false
    }

    fn type_arguments_related(
        &self,
        source: &TypeApplication,
        target: &TypeApplication,
        kind: RelationKind,
    ) -> Option<bool> {
        let def = self.interner.definition(source.base)?;
        if def.variances.is_empty() || source.args.len() != target.args.len() {
            return None;
        }
        let related = source
            .args
            .iter()
            .zip(target.args.iter())
            .enumerate()
            .all(|(index, (&s, &t))| {
                let variance = def
                    .variances
                    .get(index)
                    .copied()
                    .unwrap_or(Variance::COVARIANT);
                if variance.contains(Variance::INDEPENDENT) {
                    true
                } else if variance.contains(Variance::INVARIANT) {
                    self.is_related(s, t, kind) && self.is_related(t, s, kind)
                } else if variance == Variance::BIVARIANT {
                    self.is_related(s, t, kind) || self.is_related(t, s, kind)
                } else if variance.contains(Variance::CONTRAVARIANT) {
                    self.is_related(t, s, kind)
                } else {
                    self.is_related(s, t, kind)
                }
            });
        // A failed variance check may still succeed structurally.
        if related { Some(true) } else { None }
    }

    fn object_like_related(&self, source: TypeId, target: TypeId, kind: RelationKind) -> bool {
        let interner = self.interner;
        let source_key = interner.lookup(source);
        let target_key = interner.lookup(target);
        match (source_key, target_key) {
            (Some(TypeKey::EvolvingArray(element)), _) => {
                self.is_related(interner.array(element), target, kind)
            }
            (Some(TypeKey::Array(s)), Some(TypeKey::Array(t))) => self.is_related(s, t, kind),
            (Some(TypeKey::Tuple(list)), Some(TypeKey::Array(t))) => interner
                .tuple_list(list)
                .iter()
                .all(|e| {
                    let element = if e.flags.contains(ElementFlags::VARIADIC) {
                        element_type_of_array_like(interner, e.type_id).unwrap_or(TypeId::UNKNOWN)
                    } else {
                        e.type_id
                    };
                    self.is_related(element, t, kind)
                }),
            (Some(TypeKey::Tuple(s)), Some(TypeKey::Tuple(t))) => {
                self.tuple_related(&interner.tuple_list(s), &interner.tuple_list(t), kind)
            }
            (Some(TypeKey::Array(s)), Some(TypeKey::Tuple(t))) => {
                let elements = interner.tuple_list(t);
                match elements.as_ref() {
                    [only] if only.flags.contains(ElementFlags::REST) => {
                        self.is_related(s, only.type_id, kind)
                    }
                    _ => false,
                }
            }
            (Some(TypeKey::Array(_) | TypeKey::Tuple(_)), Some(TypeKey::Object(shape_id))) => {
                let element = element_type_of_array_like(interner, source).unwrap_or(TypeId::UNKNOWN);
                self.array_to_object_related(element, &interner.object_shape(shape_id), kind)
            }
            (Some(TypeKey::Object(s)), Some(TypeKey::Object(t))) => {
                self.object_related(&interner.object_shape(s), &interner.object_shape(t), kind)
            }
            _ => false,
        }
    }

    fn tuple_related(&self, source: &[TupleElement], target: &[TupleElement], kind: RelationKind) -> bool {
        let element_type = |e: &TupleElement| {
            if e.flags.contains(ElementFlags::OPTIONAL) {
                self.interner.union2(e.type_id, TypeId::UNDEFINED)
            } else {
                e.type_id
            }
        };
        let target_rest = target
            .iter()
            .position(|e| e.flags.intersects(ElementFlags::VARIABLE));
        let source_variable = source
            .iter()
            .any(|e| e.flags.intersects(ElementFlags::VARIABLE));

        let Some(rest_index) = target_rest else {
            if source_variable || source.len() > target.len() {
                return false;
            }
            return target.iter().enumerate().all(|(i, t)| match source.get(i) {
                Some(s) => {
                    if s.flags.contains(ElementFlags::OPTIONAL)
                        && t.flags.contains(ElementFlags::REQUIRED)
                    {
                        return false;
                    }
                    self.is_related(element_type(s), element_type(t), kind)
                }
                None => !t.flags.contains(ElementFlags::REQUIRED),
            });
        };

        let suffix = &target[rest_index + 1..];
        if source.len() < rest_index + suffix.len() {
            return false;
        }
        for (s, t) in source.iter().zip(target[..rest_index].iter()) {
            if s.flags.intersects(ElementFlags::VARIABLE) {
                return false;
            }
            if !self.is_related(element_type(s), element_type(t), kind) {
                return false;
            }
        }
        let source_suffix_start = source.len() - suffix.len();
        for (s, t) in source[source_suffix_start..].iter().zip(suffix.iter()) {
            if s.flags.intersects(ElementFlags::VARIABLE)
                || !self.is_related(element_type(s), element_type(t), kind)
            {
                return false;
            }
        }
        let middle = &source[rest_index..source_suffix_start];
        let rest = target[rest_index];
        if rest.flags.contains(ElementFlags::VARIADIC) {
            let slice = self.interner.tuple(middle.to_vec());
            return self.is_related(slice, rest.type_id, kind);
        }
        middle.iter().all(|s| {
            let element = if s.flags.contains(ElementFlags::VARIADIC) {
                element_type_of_array_like(self.interner, s.type_id).unwrap_or(TypeId::UNKNOWN)
            } else {
                s.type_id
            };
            self.is_related(element, rest.type_id, kind)
        })
    }

    fn array_to_object_related(&self, element: TypeId, target: &ObjectShape, kind: RelationKind) -> bool {
        let length = self.interner.intern_string("length");
        for prop in &target.properties {
            if prop.name == length {
                if !self.is_related(TypeId::NUMBER, prop.type_id, kind) {
                    return false;
                }
            } else if !prop.optional {
                return false;
            }
        }
        if let Some(index) = target.number_index {
            if !self.is_related(element, index.value_type, kind) {
                return false;
            }
        }
        target.call_signatures.is_empty() && target.construct_signatures.is_empty()
    }

    fn object_related(&self, source: &ObjectShape, target: &ObjectShape, kind: RelationKind) -> bool {
        let interner = self.interner;
        if let (Some(s_def), Some(t_def)) = (source.nominal, target.nominal) {
            if interner.def_derives_from(s_def, t_def) {
                return true;
            }
        }
        let require_optional = matches!(kind, RelationKind::Subtype | RelationKind::StrictSubtype)
            && !source.flags.contains(ObjectFlags::OBJECT_LITERAL);

        for target_prop in &target.properties {
            match source.property(target_prop.name) {
                Some(source_prop) => {
                    if source_prop.optional
                        && !target_prop.optional
                        && kind != RelationKind::Comparable
                    {
                        return false;
                    }
                    let source_type = self.property_read_type(source_prop);
                    let target_type = self.property_read_type(target_prop);
                    if !self.is_related(source_type, target_type, kind) {
                        return false;
                    }
                }
                None => {
                    if !target_prop.optional || require_optional {
                        return false;
                    }
                }
            }
        }

        if kind == RelationKind::StrictSubtype
            && source.properties.len() < target.properties.len()
        {
            return false;
        }

        if !self.signatures_related(&source.call_signatures, &target.call_signatures, kind)
            || !self.signatures_related(
                &source.construct_signatures,
                &target.construct_signatures,
                kind,
            )
        {
            return false;
        }

        self.index_signatures_related(source, target, kind)
    }

    fn property_read_type(&self, prop: &PropertyInfo) -> TypeId {
        if prop.optional && !self.options.exact_optional_property_types {
            self.interner.union2(prop.type_id, TypeId::UNDEFINED)
        } else {
            prop.type_id
        }
    }

    fn index_signatures_related(&self, source: &ObjectShape, target: &ObjectShape, kind: RelationKind) -> bool {
        let implicit_index = source.flags.contains(ObjectFlags::OBJECT_LITERAL);
        if let Some(target_index) = target.string_index {
            match source.string_index {
                Some(source_index) => {
                    if !self.is_related(source_index.value_type, target_index.value_type, kind) {
                        return false;
                    }
                }
                None if implicit_index => {}
                None => return false,
            }
            if !source
                .properties
                .iter()
                .all(|p| self.is_related(self.property_read_type(p), target_index.value_type, kind))
            {
                return false;
            }
        }
        if let Some(target_index) = target.number_index {
            match source.number_index.or(source.string_index) {
                Some(source_index) => {
                    if !self.is_related(source_index.value_type, target_index.value_type, kind) {
                        return false;
                    }
                }
                None if implicit_index => {}
                None => return false,
            }
            let numeric_props_related = source.properties.iter().all(|p| {
                let name = self.interner.resolve_atom(p.name);
                !crate::template_literal::is_numeric_text(&name)
                    || self.is_related(self.property_read_type(p), target_index.value_type, kind)
            });
            if !numeric_props_related {
                return false;
            }
        }
        true
    }

    fn signatures_related(&self, source: &[FunctionShape], target: &[FunctionShape], kind: RelationKind) -> bool {
        target.iter().all(|t| source.iter().any(|s| self.signature_related(s, t, kind)))
    }

    fn signature_related(&self, source: &FunctionShape, target: &FunctionShape, kind: RelationKind) -> bool {
        let erased;
        let source = if source.type_params.is_empty() {
            source
        } else {
            let args = vec![TypeId::ANY; source.type_params.len()];
            let substitution = crate::instantiate::TypeSubstitution::from_args(&source.type_params, &args);
            let instantiated = crate::instantiate::instantiate_type(
                self.interner,
                self.interner.function(source.clone()),
                &substitution,
            );
            match crate::type_queries::object_shape_of(self.interner, instantiated)
                .and_then(|shape| shape.call_signatures.first().cloned())
            {
                Some(sig) => {
                    erased = sig;
                    &erased
                }
                None => source,
            }
        };

        if !target.has_rest_parameter() && source.min_argument_count() > target.params.len() {
            return false;
        }
        let bivariant = !self.options.strict_function_types
            || source.is_method
            || target.is_method
            || kind == RelationKind::Comparable;
        let count = source.params.len().max(target.params.len());
        for index in 0..count {
            let (Some(s), Some(t)) = (
                self.param_type_at(source, index),
                self.param_type_at(target, index),
            ) else {
                continue;
            };
            let related = if bivariant {
                self.is_related(t, s, kind) || self.is_related(s, t, kind)
            } else {
                self.is_related(t, s, kind)
            };
            if !related {
                return false;
            }
        }
        if target.type_predicate.is_some() && source.type_predicate.is_none() {
            return false;
        }
        target.return_type == TypeId::VOID
            || self.is_related(source.return_type, target.return_type, kind)
    }

    /// Type accepted at argument position `index`, expanding a rest parameter.
    fn param_type_at(&self, sig: &FunctionShape, index: usize) -> Option<TypeId> {
        let fixed = if sig.has_rest_parameter() {
            sig.params.len() - 1
        } else {
            sig.params.len()
        };
        if index < fixed {
            return sig.params.get(index).map(|p| p.type_id);
        }
        let rest = sig.params.last().filter(|p| p.rest)?;
        let offset = index - fixed;
        if let Some(elements) = crate::type_queries::tuple_elements(self.interner, rest.type_id) {
            if let Some(element) = elements.get(offset) {
                if !element.flags.intersects(ElementFlags::VARIABLE) {
                    return Some(element.type_id);
                }
            }
        }
        element_type_of_array_like(self.interner, rest.type_id).or(Some(TypeId::ANY))
    }
}

impl TypeRelation for RelationChecker<'_> {
    fn is_assignable_to(&self, source: TypeId, target: TypeId) -> bool {
        self.is_related(source, target, RelationKind::Assignable)
    }

    fn is_subtype_of(&self, source: TypeId, target: TypeId) -> bool {
        self.is_related(source, target, RelationKind::Subtype)
    }

    fn is_strict_subtype_of(&self, source: TypeId, target: TypeId) -> bool {
        self.is_related(source, target, RelationKind::StrictSubtype)
    }

    fn is_comparable_to(&self, source: TypeId, target: TypeId) -> bool {
        self.is_related(source, target, RelationKind::Comparable)
    }

    fn is_type_identical_to(&self, source: TypeId, target: TypeId) -> bool {
        self.is_related(source, target, RelationKind::Identity)
    }

    fn strict_null_checks(&self) -> bool {
        self.options.strict_null_checks
    }

    fn strict_function_types(&self) -> bool {
        self.options.strict_function_types
    }

    fn no_implicit_any(&self) -> bool {
        self.options.no_implicit_any
    }
}
