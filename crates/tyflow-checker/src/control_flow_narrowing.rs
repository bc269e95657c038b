//! Control flow narrowing: truthiness, optionality, typeof, equality,
//! discriminants, constructors, instanceof, in-operator (including `#field in x`)
//! and type predicates.

use std::rc::Rc;
use tracing::trace;
use tyflow_binder::{BinaryOperator, NodeIndex, NodeKind, PrefixOperator, SymbolId, symbol_flags};
use tyflow_common::interner::Atom;
use tyflow_common::limits::MAX_CONST_ALIAS_INLINE_DEPTH;
use tyflow_solver::type_queries::{is_object_like_type, is_union_type, literal_value};
use tyflow_solver::{LiteralValue, TypeFacts, TypeId, TypePredicate, TypePredicateKind, format_number};

use crate::control_flow::{FlowAnalyzer, FlowState};
use crate::references::{
    access_base, accessed_property_name, is_access_expression, is_constant_reference,
    is_matching_reference, is_or_contains_matching_reference, literal_property_name,
    optional_chain_contains_reference, reference_candidate,
};

impl<'a> FlowAnalyzer<'a> {
    /// Narrow `type_id` by the condition `expr` having the outcome
    /// `assume_true`.
    pub(crate) fn narrow_type(
        &self,
        f: &FlowState,
        type_id: TypeId,
        expr: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        let arena = &self.binder.arena;
        // `a?.b` being evaluated at all tells us `a` is not nullish.
        if self.is_expression_of_optional_chain_root(expr) || self.is_left_of_coalesce(expr) {
            return self.narrow_type_by_optionality(f, type_id, expr, assume_true);
        }
        let Some(kind) = arena.kind(expr) else {
            return type_id;
        };
        match kind {
            NodeKind::Identifier { .. } => {
                if let Some(initializer) = self.inlinable_const_alias(f, expr) {
                    self.inline_level.set(self.inline_level.get() + 1);
                    let result = self.narrow_type(f, type_id, initializer, assume_true);
                    self.inline_level.set(self.inline_level.get() - 1);
                    return result;
                }
                self.narrow_type_by_truthiness(f, type_id, expr, assume_true)
            }
            NodeKind::ThisKeyword
            | NodeKind::SuperKeyword
            | NodeKind::PropertyAccess { .. }
            | NodeKind::ElementAccess { .. } => {
                self.narrow_type_by_truthiness(f, type_id, expr, assume_true)
            }
            NodeKind::Call { .. } => self.narrow_type_by_call_expression(f, type_id, expr, assume_true),
            NodeKind::Parenthesized { expression } | NodeKind::NonNull { expression } => {
                self.narrow_type(f, type_id, *expression, assume_true)
            }
            NodeKind::Binary { .. } => self.narrow_type_by_binary_expression(f, type_id, expr, assume_true),
            NodeKind::PrefixUnary {
                operator: PrefixOperator::Exclamation,
                operand,
            } => self.narrow_type(f, type_id, *operand, !assume_true),
            _ => type_id,
        }
    }

    fn is_expression_of_optional_chain_root(&self, expr: NodeIndex) -> bool {
        let arena = &self.binder.arena;
        let parent = arena.parent(expr);
        if !arena.is_optional_chain_root(parent) {
            return false;
        }
        match arena.kind(parent) {
            Some(
                NodeKind::PropertyAccess { expression, .. } | NodeKind::ElementAccess { expression, .. },
            ) => *expression == expr,
            Some(NodeKind::Call { callee, .. }) => *callee == expr,
            _ => false,
        }
    }

    fn is_left_of_coalesce(&self, expr: NodeIndex) -> bool {
        let arena = &self.binder.arena;
        matches!(
            arena.kind(arena.parent(expr)),
            Some(NodeKind::Binary {
                left,
                operator: BinaryOperator::QuestionQuestion | BinaryOperator::QuestionQuestionAssign,
                ..
            }) if *left == expr
        )
    }

    /// The initializer of a `const` alias used as a condition (`const ok =
    /// typeof x === "string"; if (ok)`), when narrowing may look through it.
    fn inlinable_const_alias(&self, f: &FlowState, expr: NodeIndex) -> Option<NodeIndex> {
        let binder = self.binder;
        if self.inline_level.get() >= MAX_CONST_ALIAS_INLINE_DEPTH
            || is_matching_reference(binder, f.reference, expr)
        {
            return None;
        }
        let NodeKind::Identifier { symbol, .. } = binder.arena.kind(expr)? else {
            return None;
        };
        let symbol = binder.symbols.get(*symbol)?;
        if !symbol.has_any_flags(symbol_flags::CONST) {
            return None;
        }
        let NodeKind::VariableDeclaration {
            initializer,
            has_type_annotation: false,
            ..
        } = binder.arena.kind(symbol.value_declaration)?
        else {
            return None;
        };
        (initializer.is_some() && is_constant_reference(binder, f.reference)).then_some(*initializer)
    }

    // =========================================================================
    // Truthiness and optionality
    // =========================================================================

    fn narrow_type_by_optionality(
        &self,
        f: &FlowState,
        type_id: TypeId,
        expr: NodeIndex,
        assume_present: bool,
    ) -> TypeId {
        let facts = if assume_present {
            TypeFacts::NE_UNDEFINED_OR_NULL
        } else {
            TypeFacts::EQ_UNDEFINED_OR_NULL
        };
        let narrowing = self.narrowing();
        if is_matching_reference(self.binder, f.reference, expr) {
            return narrowing.adjusted_type_with_facts(type_id, facts);
        }
        if let Some(access) = self.discriminant_property_access(f, expr, type_id) {
            return self.narrow_type_by_discriminant(type_id, access, |t| {
                narrowing.type_with_facts(t, facts)
            });
        }
        type_id
    }

    fn narrow_type_by_truthiness(
        &self,
        f: &FlowState,
        mut type_id: TypeId,
        expr: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        let facts = if assume_true {
            TypeFacts::TRUTHY
        } else {
            TypeFacts::FALSY
        };
        let narrowing = self.narrowing();
        if is_matching_reference(self.binder, f.reference, expr) {
            return narrowing.adjusted_type_with_facts(type_id, facts);
        }
        if self.strict_null_checks()
            && assume_true
            && optional_chain_contains_reference(self.binder, expr, f.reference)
        {
            type_id = narrowing.adjusted_type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL);
        }
        if let Some(access) = self.discriminant_property_access(f, expr, type_id) {
            return self.narrow_type_by_discriminant(type_id, access, |t| {
                narrowing.type_with_facts(t, facts)
            });
        }
        type_id
    }

    // =========================================================================
    // Binary expressions
    // =========================================================================

    fn narrow_type_by_binary_expression(
        &self,
        f: &FlowState,
        type_id: TypeId,
        expr: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        let binder = self.binder;
        let Some(NodeKind::Binary {
            left,
            operator,
            right,
        }) = binder.arena.kind(expr)
        else {
            return type_id;
        };
        let (left, operator, right) = (*left, *operator, *right);
        trace!(?operator, assume_true, "narrow by binary expression");

        match operator {
            BinaryOperator::Assign
            | BinaryOperator::BarBarAssign
            | BinaryOperator::AmpersandAmpersandAssign
            | BinaryOperator::QuestionQuestionAssign => {
                let narrowed = self.narrow_type(f, type_id, right, assume_true);
                self.narrow_type_by_truthiness(f, narrowed, left, assume_true)
            }
            BinaryOperator::EqualsEquals
            | BinaryOperator::ExclamationEquals
            | BinaryOperator::EqualsEqualsEquals
            | BinaryOperator::ExclamationEqualsEquals => {
                self.narrow_type_by_equality_expression(f, type_id, left, operator, right, assume_true)
            }
            BinaryOperator::InstanceOf => {
                self.narrow_type_by_instanceof(f, type_id, left, right, assume_true)
            }
            BinaryOperator::In => {
                let target = reference_candidate(binder, right);
                if !is_matching_reference(binder, f.reference, target) {
                    return type_id;
                }
                if let Some(NodeKind::PrivateIdentifier { symbol, .. }) = binder.arena.kind(left) {
                    return self.narrow_type_by_private_identifier_in(type_id, *symbol, assume_true);
                }
                match self.in_operator_property_name(left) {
                    Some(name) => self
                        .narrowing()
                        .narrow_type_by_in_keyword(type_id, name, assume_true),
                    None => type_id,
                }
            }
            BinaryOperator::Comma => self.narrow_type(f, type_id, right, assume_true),
            BinaryOperator::AmpersandAmpersand => {
                if assume_true {
                    let narrowed = self.narrow_type(f, type_id, left, true);
                    self.narrow_type(f, narrowed, right, true)
                } else {
                    self.interner.union2(
                        self.narrow_type(f, type_id, left, false),
                        self.narrow_type(f, type_id, right, false),
                    )
                }
            }
            BinaryOperator::BarBar => {
                if assume_true {
                    self.interner.union2(
                        self.narrow_type(f, type_id, left, true),
                        self.narrow_type(f, type_id, right, true),
                    )
                } else {
                    let narrowed = self.narrow_type(f, type_id, left, false);
                    self.narrow_type(f, narrowed, right, false)
                }
            }
            _ => type_id,
        }
    }

    fn narrow_type_by_equality_expression(
        &self,
        f: &FlowState,
        mut type_id: TypeId,
        left: NodeIndex,
        operator: BinaryOperator,
        right: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        let binder = self.binder;
        let arena = &binder.arena;
        let left = reference_candidate(binder, left);
        let right = reference_candidate(binder, right);

        match (arena.kind(left), arena.kind(right)) {
            (Some(NodeKind::TypeOf { .. }), Some(NodeKind::StringLiteral { text })) => {
                return self.narrow_type_by_typeof(f, type_id, left, operator, *text, assume_true);
            }
            (Some(NodeKind::StringLiteral { text }), Some(NodeKind::TypeOf { .. })) => {
                return self.narrow_type_by_typeof(f, type_id, right, operator, *text, assume_true);
            }
            _ => {}
        }
        if is_matching_reference(binder, f.reference, left) {
            return self.narrow_type_by_equality(type_id, operator, right, assume_true);
        }
        if is_matching_reference(binder, f.reference, right) {
            return self.narrow_type_by_equality(type_id, operator, left, assume_true);
        }
        if self.strict_null_checks() {
            if optional_chain_contains_reference(binder, left, f.reference) {
                type_id = self.narrow_type_by_optional_chain_containment(type_id, operator, right, assume_true);
            } else if optional_chain_contains_reference(binder, right, f.reference) {
                type_id = self.narrow_type_by_optional_chain_containment(type_id, operator, left, assume_true);
            }
        }
        if let Some(access) = self.discriminant_property_access(f, left, type_id) {
            return self.narrow_type_by_discriminant(type_id, access, |t| {
                self.narrow_type_by_equality(t, operator, right, assume_true)
            });
        }
        if let Some(access) = self.discriminant_property_access(f, right, type_id) {
            return self.narrow_type_by_discriminant(type_id, access, |t| {
                self.narrow_type_by_equality(t, operator, left, assume_true)
            });
        }
        if self.is_matching_constructor_reference(f, left) {
            return self.narrow_type_by_constructor(type_id, operator, right, assume_true);
        }
        if self.is_matching_constructor_reference(f, right) {
            return self.narrow_type_by_constructor(type_id, operator, left, assume_true);
        }
        if self.is_boolean_literal(right) && !is_access_expression(binder, left) {
            return self.narrow_type_by_boolean_comparison(f, type_id, left, right, operator, assume_true);
        }
        if self.is_boolean_literal(left) && !is_access_expression(binder, right) {
            return self.narrow_type_by_boolean_comparison(f, type_id, right, left, operator, assume_true);
        }
        type_id
    }

    fn is_boolean_literal(&self, node: NodeIndex) -> bool {
        matches!(
            self.binder.arena.kind(node),
            Some(NodeKind::TrueKeyword | NodeKind::FalseKeyword)
        )
    }

    /// `typeof target === "tag"` (or `!==`, `==`, `!=`).
    fn narrow_type_by_typeof(
        &self,
        f: &FlowState,
        mut type_id: TypeId,
        type_of_expr: NodeIndex,
        operator: BinaryOperator,
        tag: Atom,
        assume_true: bool,
    ) -> TypeId {
        let binder = self.binder;
        let assume_true = if is_negated_equality(operator) {
            !assume_true
        } else {
            assume_true
        };
        let Some(NodeKind::TypeOf { expression }) = binder.arena.kind(type_of_expr) else {
            return type_id;
        };
        let tag = binder.atoms.resolve(tag);
        let narrowing = self.narrowing();
        let target = reference_candidate(binder, *expression);
        if is_matching_reference(binder, f.reference, target) {
            return narrowing.narrow_type_by_typeof(type_id, &tag, assume_true);
        }
        if self.strict_null_checks()
            && optional_chain_contains_reference(binder, target, f.reference)
            && assume_true == (&*tag != "undefined")
        {
            type_id = narrowing.adjusted_type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL);
        }
        if let Some(access) = self.discriminant_property_access(f, target, type_id) {
            return self.narrow_type_by_discriminant(type_id, access, |t| {
                narrowing.narrow_type_by_typeof(t, &tag, assume_true)
            });
        }
        type_id
    }

    /// `reference == value` with the operator folded into `assume_true`.
    fn narrow_type_by_equality(
        &self,
        type_id: TypeId,
        operator: BinaryOperator,
        value: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        if type_id.is_any() {
            return type_id;
        }
        let assume_true = if is_negated_equality(operator) {
            !assume_true
        } else {
            assume_true
        };
        let Some(value_type) = self.expression_type(value) else {
            return type_id;
        };
        let double_equals = matches!(
            operator,
            BinaryOperator::EqualsEquals | BinaryOperator::ExclamationEquals
        );
        self.narrowing()
            .narrow_type_by_equality(type_id, value_type, double_equals, assume_true)
    }

    /// `a?.b === value`: when the comparison implies `a?.b` was evaluated,
    /// `a` is not nullish.
    fn narrow_type_by_optional_chain_containment(
        &self,
        type_id: TypeId,
        operator: BinaryOperator,
        value: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        let Some(value_type) = self.expression_type(value) else {
            return type_id;
        };
        let equals = matches!(
            operator,
            BinaryOperator::EqualsEquals | BinaryOperator::EqualsEqualsEquals
        );
        let include_null = matches!(
            operator,
            BinaryOperator::EqualsEquals | BinaryOperator::ExclamationEquals
        );
        let is_nullable_in_flags =
            |t: TypeId| t == TypeId::UNDEFINED || (include_null && t == TypeId::NULL);
        let narrowing = self.narrowing();
        // any and unknown include null and undefined in their domain.
        let remove_nullable = (equals != assume_true
            && narrowing.every_type(value_type, is_nullable_in_flags))
            || (equals == assume_true
                && narrowing.every_type(value_type, |t| {
                    !t.is_any() && t != TypeId::UNKNOWN && !is_nullable_in_flags(t)
                }));
        if remove_nullable {
            return narrowing.adjusted_type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL);
        }
        type_id
    }

    /// `x.constructor` or `x["constructor"]` with `x` the reference.
    fn is_matching_constructor_reference(&self, f: &FlowState, expr: NodeIndex) -> bool {
        let binder = self.binder;
        let Some(name) = accessed_property_name(binder, expr) else {
            return false;
        };
        &*binder.atoms.resolve(name) == "constructor"
            && access_base(binder, expr)
                .is_some_and(|base| is_matching_reference(binder, f.reference, base))
    }

    fn narrow_type_by_constructor(
        &self,
        type_id: TypeId,
        operator: BinaryOperator,
        constructor: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        // Inequality never narrows.
        let narrows = if assume_true {
            matches!(
                operator,
                BinaryOperator::EqualsEquals | BinaryOperator::EqualsEqualsEquals
            )
        } else {
            is_negated_equality(operator)
        };
        if !narrows {
            return type_id;
        }
        match self.host.prototype_type_of(constructor) {
            Some(candidate) => self.narrowing().narrow_type_by_constructor(type_id, candidate),
            None => type_id,
        }
    }

    /// `expr === true` and friends narrow like `expr` itself.
    fn narrow_type_by_boolean_comparison(
        &self,
        f: &FlowState,
        type_id: TypeId,
        expr: NodeIndex,
        literal: NodeIndex,
        operator: BinaryOperator,
        assume_true: bool,
    ) -> TypeId {
        let is_true = matches!(self.binder.arena.kind(literal), Some(NodeKind::TrueKeyword));
        let assume_true = (assume_true != is_true) != !is_negated_equality(operator);
        self.narrow_type(f, type_id, expr, assume_true)
    }

    fn narrow_type_by_instanceof(
        &self,
        f: &FlowState,
        type_id: TypeId,
        left: NodeIndex,
        right: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        let binder = self.binder;
        let narrowing = self.narrowing();
        let left = reference_candidate(binder, left);
        if !is_matching_reference(binder, f.reference, left) {
            if assume_true
                && self.strict_null_checks()
                && optional_chain_contains_reference(binder, left, f.reference)
            {
                return narrowing.adjusted_type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL);
            }
            return type_id;
        }

        // A `[Symbol.hasInstance]` method with a type predicate decides.
        if let Some(predicate) = self
            .host
            .has_instance_signature(right)
            .and_then(|signature| signature.type_predicate)
        {
            if predicate.kind == TypePredicateKind::Identifier
                && predicate.parameter_index == Some(0)
                && let Some(predicate_type) = predicate.type_id
            {
                return narrowing.narrowed_type(type_id, predicate_type, assume_true, true);
            }
        }

        let Some(instance_type) = self.host.instance_type_of(right) else {
            return type_id;
        };
        let interner = self.interner;
        // Don't narrow `any` to exactly `Object` or a function type, and only
        // narrow the false branch by a non-empty object type.
        if type_id.is_any() && self.is_global_object_or_function_type(instance_type) {
            return type_id;
        }
        if !assume_true
            && !(is_object_like_type(interner, instance_type)
                && !narrowing.is_empty_object_type(instance_type))
        {
            return type_id;
        }
        narrowing.narrowed_type(type_id, instance_type, assume_true, true)
    }

    /// `#field in x` holds exactly for instances of the declaring class, or
    /// for the class constructor itself when the member is static.
    fn narrow_type_by_private_identifier_in(
        &self,
        type_id: TypeId,
        member: SymbolId,
        assume_true: bool,
    ) -> TypeId {
        let Some(member) = self.binder.symbols.get(member) else {
            return type_id;
        };
        let class = member.parent;
        let target = if member.has_any_flags(symbol_flags::STATIC) {
            self.host.constructor_type_of_class(class)
        } else {
            self.host.declared_type_of_symbol(class)
        };
        match target {
            Some(target) => self
                .narrowing()
                .narrowed_type(type_id, target, assume_true, true),
            None => type_id,
        }
    }

    fn is_global_object_or_function_type(&self, type_id: TypeId) -> bool {
        type_id == TypeId::OBJECT || self.host.global_function_type() == Some(type_id)
    }

    /// Property name tested by `name in x`, in the solver's atom table.
    fn in_operator_property_name(&self, left: NodeIndex) -> Option<Atom> {
        if let Some(name) = literal_property_name(self.binder, left) {
            return Some(self.solver_atom(name));
        }
        let left_type = self.host.type_of_expression(left)?;
        match literal_value(self.interner, left_type)? {
            LiteralValue::String(name) => Some(name),
            LiteralValue::Number(value) => Some(self.interner.intern_string(&format_number(value.0))),
            _ => None,
        }
    }

    /// Re-intern a binder atom in the type interner's table.
    pub(crate) fn solver_atom(&self, atom: Atom) -> Atom {
        if Rc::ptr_eq(&self.binder.atoms, self.interner.atoms()) {
            return atom;
        }
        self.interner.intern_string(&self.binder.atoms.resolve(atom))
    }

    // =========================================================================
    // Type predicates
    // =========================================================================

    fn narrow_type_by_call_expression(
        &self,
        f: &FlowState,
        type_id: TypeId,
        call: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        if !self.has_matching_argument(f, call) {
            return type_id;
        }
        // An optional call that did not happen says nothing in the false branch.
        if !assume_true && self.binder.arena.is_optional_chain(call) {
            return type_id;
        }
        let Some(predicate) = self
            .host
            .effects_signature(call)
            .and_then(|signature| signature.type_predicate)
        else {
            return type_id;
        };
        match predicate.kind {
            TypePredicateKind::This | TypePredicateKind::Identifier => {
                self.narrow_type_by_type_predicate(f, type_id, &predicate, call, assume_true)
            }
            _ => type_id,
        }
    }

    fn has_matching_argument(&self, f: &FlowState, call: NodeIndex) -> bool {
        let binder = self.binder;
        let Some(NodeKind::Call {
            callee, arguments, ..
        }) = binder.arena.kind(call)
        else {
            return false;
        };
        let matches_argument = arguments.iter().any(|&argument| {
            is_or_contains_matching_reference(binder, f.reference, argument)
                || optional_chain_contains_reference(binder, argument, f.reference)
                || self.candidate_discriminant_property_access(f, argument).is_some()
        });
        if matches_argument {
            return true;
        }
        matches!(
            binder.arena.kind(*callee),
            Some(NodeKind::PropertyAccess { expression, .. })
                if is_or_contains_matching_reference(binder, f.reference, *expression)
        )
    }

    pub(crate) fn narrow_type_by_type_predicate(
        &self,
        f: &FlowState,
        mut type_id: TypeId,
        predicate: &TypePredicate,
        call: NodeIndex,
        assume_true: bool,
    ) -> TypeId {
        let Some(predicate_type) = predicate.type_id else {
            return type_id;
        };
        // Don't narrow `any` to exactly `Object` or a function type.
        if type_id.is_any() && self.is_global_object_or_function_type(predicate_type) {
            return type_id;
        }
        let Some(argument) = self.type_predicate_argument(predicate, call) else {
            return type_id;
        };
        let binder = self.binder;
        let narrowing = self.narrowing();
        if is_matching_reference(binder, f.reference, argument) {
            return narrowing.narrowed_type(type_id, predicate_type, assume_true, false);
        }
        if self.strict_null_checks()
            && optional_chain_contains_reference(binder, argument, f.reference)
            && ((assume_true && !narrowing.has_type_facts(predicate_type, TypeFacts::EQ_UNDEFINED))
                || (!assume_true && narrowing.every_type(predicate_type, |t| t.is_nullable())))
        {
            type_id = narrowing.adjusted_type_with_facts(type_id, TypeFacts::NE_UNDEFINED_OR_NULL);
        }
        if let Some(access) = self.discriminant_property_access(f, argument, type_id) {
            return self.narrow_type_by_discriminant(type_id, access, |t| {
                narrowing.narrowed_type(t, predicate_type, assume_true, false)
            });
        }
        type_id
    }

    /// The expression a predicate talks about: an argument for parameter
    /// predicates, the receiver for `this` predicates.
    fn type_predicate_argument(&self, predicate: &TypePredicate, call: NodeIndex) -> Option<NodeIndex> {
        let arena = &self.binder.arena;
        let NodeKind::Call {
            callee, arguments, ..
        } = arena.kind(call)?
        else {
            return None;
        };
        match predicate.kind {
            TypePredicateKind::Identifier | TypePredicateKind::AssertsIdentifier => {
                arguments.get(predicate.parameter_index?).copied()
            }
            TypePredicateKind::This | TypePredicateKind::AssertsThis => {
                let invoked = arena.skip_parentheses(*callee);
                access_base(self.binder, invoked).map(|base| arena.skip_parentheses(base))
            }
        }
    }

    /// `asserts cond` narrows as if the rest of the body ran under `cond`.
    pub(crate) fn narrow_type_by_assertion(
        &self,
        f: &FlowState,
        type_id: TypeId,
        expr: NodeIndex,
    ) -> TypeId {
        let arena = &self.binder.arena;
        let node = arena.skip_parentheses(expr);
        match arena.kind(node) {
            Some(NodeKind::FalseKeyword) => TypeId::UNREACHABLE_NEVER,
            Some(NodeKind::Binary {
                left,
                operator: BinaryOperator::AmpersandAmpersand,
                right,
            }) => {
                let narrowed = self.narrow_type_by_assertion(f, type_id, *left);
                self.narrow_type_by_assertion(f, narrowed, *right)
            }
            Some(NodeKind::Binary {
                left,
                operator: BinaryOperator::BarBar,
                right,
            }) => self.interner.union2(
                self.narrow_type_by_assertion(f, type_id, *left),
                self.narrow_type_by_assertion(f, type_id, *right),
            ),
            _ => self.narrow_type(f, type_id, node, true),
        }
    }

    // =========================================================================
    // Discriminants
    // =========================================================================

    /// An access of a property of the reference, possibly through a `const`
    /// alias (`const kind = x.kind`).
    pub(crate) fn candidate_discriminant_property_access(
        &self,
        f: &FlowState,
        expr: NodeIndex,
    ) -> Option<NodeIndex> {
        let binder = self.binder;
        match binder.arena.kind(expr)? {
            NodeKind::PropertyAccess { expression, .. } | NodeKind::ElementAccess { expression, .. } => {
                is_matching_reference(binder, f.reference, *expression).then_some(expr)
            }
            NodeKind::Identifier { symbol, .. } => {
                let symbol = binder.symbols.get(*symbol)?;
                if !symbol.has_any_flags(symbol_flags::CONST) {
                    return None;
                }
                let declaration = symbol.value_declaration;
                match binder.arena.kind(declaration)? {
                    // `const kind = x.kind`
                    NodeKind::VariableDeclaration {
                        initializer,
                        has_type_annotation: false,
                        ..
                    } => {
                        let base = access_base(binder, *initializer)?;
                        is_matching_reference(binder, f.reference, base).then_some(*initializer)
                    }
                    // `const { kind } = x`
                    NodeKind::BindingElement { initializer, .. } if initializer.is_none() => {
                        let pattern = binder.arena.parent(declaration);
                        let Some(NodeKind::VariableDeclaration {
                            initializer: source,
                            has_type_annotation: false,
                            ..
                        }) = binder.arena.kind(binder.arena.parent(pattern))
                        else {
                            return None;
                        };
                        let source_is_reference = matches!(
                            binder.arena.kind(*source),
                            Some(
                                NodeKind::Identifier { .. }
                                    | NodeKind::PropertyAccess { .. }
                                    | NodeKind::ElementAccess { .. }
                            )
                        );
                        (source_is_reference
                            && matches!(
                                binder.arena.kind(pattern),
                                Some(NodeKind::ObjectBindingPattern { .. })
                            )
                            && is_matching_reference(binder, f.reference, *source))
                        .then_some(declaration)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// `expr` read as a discriminant property of the reference.
    ///
    /// The declared type decides discriminance while the computed type is a
    /// subset of it; after a predicate injected a foreign type the computed
    /// type is used instead.
    pub(crate) fn discriminant_property_access(
        &self,
        f: &FlowState,
        expr: NodeIndex,
        computed: TypeId,
    ) -> Option<NodeIndex> {
        let interner = self.interner;
        let declared_is_union = is_union_type(interner, f.declared_type);
        if !declared_is_union && !is_union_type(interner, computed) {
            return None;
        }
        let access = self.candidate_discriminant_property_access(f, expr)?;
        let name = self.solver_atom(accessed_property_name(self.binder, access)?);
        let narrowing = self.narrowing();
        let t = if declared_is_union && narrowing.is_type_subset_of(computed, f.declared_type) {
            f.declared_type
        } else {
            computed
        };
        narrowing.is_discriminant_property(t, name).then_some(access)
    }

    pub(crate) fn narrow_type_by_discriminant(
        &self,
        type_id: TypeId,
        access: NodeIndex,
        narrow: impl FnOnce(TypeId) -> TypeId,
    ) -> TypeId {
        let binder = self.binder;
        let Some(name) = accessed_property_name(binder, access) else {
            return type_id;
        };
        let optional_chain = binder.arena.is_optional_chain(access);
        let non_null_base = access_base(binder, access)
            .is_some_and(|base| matches!(binder.arena.kind(base), Some(NodeKind::NonNull { .. })));
        self.narrowing().narrow_type_by_discriminant(
            type_id,
            self.solver_atom(name),
            optional_chain || non_null_base,
            optional_chain,
            narrow,
        )
    }
}

fn is_negated_equality(operator: BinaryOperator) -> bool {
    matches!(
        operator,
        BinaryOperator::ExclamationEquals | BinaryOperator::ExclamationEqualsEquals
    )
}
