//! Control flow analysis for type narrowing.
//!
//! `FlowAnalyzer` answers one question: what is the type of a reference at
//! the program point its flow node describes? It walks the flow graph
//! backwards from that point, applying one rule per flow node kind, until it
//! reaches an assignment or the start of the graph.
//!
//! Example:
//! ```typescript
//! function foo(x: string | number) {
//!     x = 1;
//!     if (typeof x === "string") {
//!     } else {
//!         // FALSE_CONDITION (typeof x === "string")
//!         //   <- ASSIGNMENT (x = 1): assignment-reduced to number
//!         // Returns: number
//!         x;
//!     }
//! }
//! ```
//!
//! Shared flow nodes are memoized for the duration of one top-level query,
//! loop junctions for the whole session. A query that recurses deeper than
//! `MAX_FLOW_DEPTH` reports TS2563 once and disables narrowing for the rest
//! of the session.

use crate::host::CheckerHost;
use crate::references::{
    contains_matching_reference, flow_cache_key, is_matching_reference,
    optional_chain_contains_reference, reference_candidate, reference_root,
};
use crate::switch_clauses::SwitchStatementLinks;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use tracing::{Level, debug, span, trace};
use tyflow_binder::{
    AssignmentKind, BinaryOperator, BinderState, FlowNode, FlowNodeId, FunctionKind, NodeIndex,
    NodeKind, PrefixOperator, SymbolId, assignment_target, assignment_target_kind, flow_flags,
};
use tyflow_common::Atom;
use tyflow_common::diagnostics::{Diagnostic, diagnostic_codes};
use tyflow_common::limits::{MAX_FLOW_DEPTH, STACK_GROWTH, STACK_RED_ZONE};
use tyflow_solver::type_queries::{
    element_type_of_array_like, evolving_array_element, is_evolving_array, is_string_literal,
    is_union_type, literal_value, tuple_elements, union_members,
};
use tyflow_solver::{
    ElementFlags, LiteralValue, NarrowingCache, NarrowingContext, TypeFacts, TypeId, TypeInterner,
    TypePredicateKind, TypeRelation, base_type_of_literal, union_with_subtype_reduction,
    widened_literal_type,
};

// =============================================================================
// FlowType / FlowState
// =============================================================================

/// The type computed at a flow node, and whether it was computed while a
/// loop junction higher up the stack was still being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowType {
    pub type_id: TypeId,
    pub incomplete: bool,
}

impl FlowType {
    /// An incomplete `never` is recorded as the silent `never` so that it
    /// does not poison the union at the enclosing junction.
    pub fn new(type_id: TypeId, incomplete: bool) -> Self {
        let type_id = if incomplete && type_id.is_never() {
            TypeId::SILENT_NEVER
        } else {
            type_id
        };
        FlowType {
            type_id,
            incomplete,
        }
    }

    #[inline]
    pub fn complete(type_id: TypeId) -> Self {
        FlowType {
            type_id,
            incomplete: false,
        }
    }
}

/// Per-query state. Pooled on the analyzer and reset on release.
#[derive(Debug)]
pub(crate) struct FlowState {
    pub(crate) reference: NodeIndex,
    pub(crate) declared_type: TypeId,
    pub(crate) initial_type: TypeId,
    pub(crate) flow_container: Option<NodeIndex>,
    /// Loop cache key, computed on first use. The inner `None` marks a
    /// reference that cannot be keyed.
    pub(crate) ref_key: Option<Option<String>>,
    pub(crate) depth: u32,
    /// Start of this query's window in the shared-flow cache.
    pub(crate) shared_flow_start: usize,
    /// Reduce-label flow nodes currently in effect, innermost last.
    pub(crate) reduce_labels: Vec<FlowNodeId>,
}

impl Default for FlowState {
    fn default() -> Self {
        FlowState {
            reference: NodeIndex::NONE,
            declared_type: TypeId::NONE,
            initial_type: TypeId::NONE,
            flow_container: None,
            ref_key: None,
            depth: 0,
            shared_flow_start: 0,
            reduce_labels: Vec::new(),
        }
    }
}

impl FlowState {
    fn reset(&mut self) {
        self.reference = NodeIndex::NONE;
        self.declared_type = TypeId::NONE;
        self.initial_type = TypeId::NONE;
        self.flow_container = None;
        self.ref_key = None;
        self.depth = 0;
        self.shared_flow_start = 0;
        self.reduce_labels.clear();
    }
}

#[derive(Clone, Debug)]
struct FlowLoopInfo {
    flow: FlowNodeId,
    key: String,
    types: Vec<TypeId>,
}

// =============================================================================
// FlowAnalyzer
// =============================================================================

/// Flow analyzer for control flow-based type narrowing.
///
/// One analyzer is one session: its caches, the loop stack and the
/// "too large" latch live as long as the analyzer does. `interner` must
/// share its atom table with `binder` (see `TypeInterner::with_atoms`)
/// whenever property names flow between the two.
pub struct FlowAnalyzer<'a> {
    pub(crate) binder: &'a BinderState,
    pub(crate) interner: &'a TypeInterner,
    pub(crate) relation: &'a dyn TypeRelation,
    pub(crate) host: &'a dyn CheckerHost,
    file_name: String,
    narrowing_cache: NarrowingCache,
    /// Set once a query exceeds `MAX_FLOW_DEPTH`; never cleared.
    flow_analysis_disabled: Cell<bool>,
    diagnostics: RefCell<Vec<Diagnostic>>,
    state_pool: RefCell<Vec<FlowState>>,
    shared_flows: RefCell<Vec<(FlowNodeId, FlowType)>>,
    flow_loop_cache: RefCell<FxHashMap<(FlowNodeId, String), TypeId>>,
    flow_loop_stack: RefCell<Vec<FlowLoopInfo>>,
    /// Nesting of const aliases currently being inlined.
    pub(crate) inline_level: Cell<u32>,
    pub(crate) last_flow_node: Cell<Option<(FlowNodeId, bool)>>,
    pub(crate) flow_node_reachable: RefCell<FxHashMap<FlowNodeId, bool>>,
    pub(crate) flow_node_post_required_call: RefCell<FxHashMap<FlowNodeId, bool>>,
    pub(crate) reachability_reduce_labels: RefCell<Vec<FlowNodeId>>,
    pub(crate) switch_links: RefCell<FxHashMap<NodeIndex, SwitchStatementLinks>>,
}

impl<'a> FlowAnalyzer<'a> {
    /// Create a new `FlowAnalyzer`.
    pub fn new(
        binder: &'a BinderState,
        interner: &'a TypeInterner,
        relation: &'a dyn TypeRelation,
        host: &'a dyn CheckerHost,
    ) -> Self {
        FlowAnalyzer {
            binder,
            interner,
            relation,
            host,
            file_name: String::new(),
            narrowing_cache: NarrowingCache::new(),
            flow_analysis_disabled: Cell::new(false),
            diagnostics: RefCell::new(Vec::new()),
            state_pool: RefCell::new(Vec::new()),
            shared_flows: RefCell::new(Vec::new()),
            flow_loop_cache: RefCell::new(FxHashMap::default()),
            flow_loop_stack: RefCell::new(Vec::new()),
            inline_level: Cell::new(0),
            last_flow_node: Cell::new(None),
            flow_node_reachable: RefCell::new(FxHashMap::default()),
            flow_node_post_required_call: RefCell::new(FxHashMap::default()),
            reachability_reduce_labels: RefCell::new(Vec::new()),
            switch_links: RefCell::new(FxHashMap::default()),
        }
    }

    /// File name recorded on diagnostics.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Whether a query exceeded the depth bound and narrowing is off.
    pub fn is_flow_analysis_disabled(&self) -> bool {
        self.flow_analysis_disabled.get()
    }

    pub(crate) fn narrowing(&self) -> NarrowingContext<'_> {
        NarrowingContext::new(self.interner, self.relation).with_cache(&self.narrowing_cache)
    }

    #[inline]
    pub(crate) fn strict_null_checks(&self) -> bool {
        self.relation.strict_null_checks()
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Narrowed type of the identifier `reference` at its own flow node,
    /// starting from the declared type the host reports for its symbol.
    pub fn flow_type_of_reference(&self, reference: NodeIndex) -> TypeId {
        let symbol = match self.binder.arena.kind(reference) {
            Some(NodeKind::Identifier { symbol, .. }) => Some(*symbol),
            _ => None,
        };
        let declared = match symbol {
            Some(symbol) => self.host.declared_type_of_symbol(symbol),
            None => self.host.type_of_expression(reference),
        };
        let Some(declared) = declared else {
            return TypeId::ERROR;
        };
        let container = symbol.map(|symbol| self.flow_container(reference, symbol, declared));
        self.narrowed_type(reference, declared, None, container, None)
    }

    /// The function whose start ends the walk for `reference`. Narrowing
    /// flows into a function expression or arrow only for a const, or for
    /// a parameter or mutable local that is never assigned after the
    /// reference.
    fn flow_container(&self, reference: NodeIndex, symbol: SymbolId, declared: TypeId) -> NodeIndex {
        let binder = self.binder;
        let arena = &binder.arena;
        let Some(sym) = binder.symbols.get(symbol) else {
            return NodeIndex::NONE;
        };
        let declaration_container = arena.container_of(sym.value_declaration);
        let mut container = arena.container_of(reference);
        while container != declaration_container
            && matches!(
                arena.kind(container),
                Some(NodeKind::FunctionLike {
                    kind: FunctionKind::Arrow | FunctionKind::Expression,
                    ..
                })
            )
            && ((sym.is_const_variable() && declared != TypeId::AUTO_ARRAY)
                || (sym.is_parameter_or_mutable_local()
                    && binder.is_past_last_assignment(symbol, reference)))
        {
            container = arena.container_of(container);
        }
        trace!(reference = reference.0, container = container.0, "flow container");
        container
    }

    /// Type of the class property `property` at the end of `constructor`,
    /// for a property declared without a type annotation. `None` when every
    /// path leaves it nullish.
    pub fn flow_type_in_constructor(
        &self,
        property: SymbolId,
        constructor: NodeIndex,
    ) -> Option<TypeId> {
        let flow = self.binder.return_flow_of(constructor);
        if flow.is_none() {
            return None;
        }
        self.flow_type_of_property_at(property, constructor, flow)
    }

    /// Type of the static property `property` at the end of the first
    /// static block that leaves it non-nullish.
    pub fn flow_type_in_static_blocks(
        &self,
        property: SymbolId,
        blocks: &[NodeIndex],
    ) -> Option<TypeId> {
        blocks.iter().find_map(|&block| {
            let flow = self.binder.return_flow_of(block);
            if flow.is_none() {
                return None;
            }
            self.flow_type_of_property_at(property, block, flow)
        })
    }

    fn flow_type_of_property_at(
        &self,
        property: SymbolId,
        container: NodeIndex,
        flow: FlowNodeId,
    ) -> Option<TypeId> {
        let binder = self.binder;
        let sym = binder.symbols.get(property)?;
        let reference = match binder.arena.kind(sym.value_declaration)? {
            NodeKind::PropertyDeclaration { reference, .. } => *reference,
            _ => return None,
        };
        let flow_type = self.narrowed_type(
            reference,
            TypeId::AUTO,
            Some(TypeId::UNDEFINED),
            Some(container),
            Some(flow),
        );
        if self.relation.no_implicit_any()
            && (flow_type == TypeId::AUTO || flow_type == TypeId::AUTO_ARRAY)
        {
            let implicit = if flow_type == TypeId::AUTO { "any" } else { "any[]" };
            let name = binder.atoms.resolve(sym.escaped_name);
            let (start, length) = binder
                .arena
                .get(sym.value_declaration)
                .map_or((0, 0), |node| (node.pos, node.end.saturating_sub(node.pos)));
            self.diagnostics.borrow_mut().push(Diagnostic::from_code(
                self.file_name.clone(),
                start,
                length,
                diagnostic_codes::MEMBER_0_IMPLICITLY_HAS_AN_1_TYPE,
                &[name.as_ref(), implicit],
            ));
        }
        let all_nullable = union_members(self.interner, flow_type)
            .iter()
            .all(|&member| member.is_nullable());
        debug!(property = property.0, flow_type = flow_type.0, "property flow type");
        if all_nullable {
            None
        } else {
            Some(self.auto_to_any(flow_type))
        }
    }

    /// Type of `reference` at `flow` (or at the reference's own flow node),
    /// given its declared type and the type it has on entry to the flow
    /// container.
    pub fn narrowed_type(
        &self,
        reference: NodeIndex,
        declared_type: TypeId,
        initial_type: Option<TypeId>,
        flow_container: Option<NodeIndex>,
        flow_node: Option<FlowNodeId>,
    ) -> TypeId {
        let _span = span!(
            Level::TRACE,
            "narrowed_type",
            reference = reference.0,
            declared = declared_type.0
        )
        .entered();

        if self.flow_analysis_disabled.get() {
            return TypeId::ERROR;
        }
        let flow = flow_node.unwrap_or_else(|| self.binder.flow_node_of(reference));
        if flow.is_none() {
            return declared_type;
        }

        let mut state = self.acquire_flow_state();
        state.reference = reference;
        state.declared_type = declared_type;
        state.initial_type = initial_type.unwrap_or(declared_type);
        state.flow_container = flow_container.filter(|c| c.is_some());
        state.shared_flow_start = self.shared_flows.borrow().len();

        let evolved = self.type_at_flow_node(&mut state, flow).type_id;

        self.shared_flows
            .borrow_mut()
            .truncate(state.shared_flow_start);
        self.release_flow_state(state);

        if self.flow_analysis_disabled.get() {
            return TypeId::ERROR;
        }

        let narrowing = self.narrowing();
        let result = if is_evolving_array(self.interner, evolved)
            && self.is_evolving_array_operation_target(reference)
        {
            TypeId::AUTO_ARRAY
        } else {
            narrowing.finalize_evolving_array(evolved)
        };

        let parent = self.binder.arena.parent(reference);
        let asserted_non_null = matches!(self.binder.arena.kind(parent), Some(NodeKind::NonNull { .. }))
            && !result.is_never()
            && narrowing
                .type_with_facts(result, TypeFacts::NE_UNDEFINED_OR_NULL)
                .is_never();
        if result == TypeId::UNREACHABLE_NEVER || asserted_non_null {
            return declared_type;
        }
        debug!(result = result.0, "narrowed_type");
        result
    }

    fn acquire_flow_state(&self) -> FlowState {
        self.state_pool.borrow_mut().pop().unwrap_or_default()
    }

    fn release_flow_state(&self, mut state: FlowState) {
        state.reset();
        self.state_pool.borrow_mut().push(state);
    }

    // =========================================================================
    // Graph walk
    // =========================================================================

    pub(crate) fn type_at_flow_node(&self, f: &mut FlowState, flow: FlowNodeId) -> FlowType {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.type_at_flow_node_worker(f, flow)
        })
    }

    fn type_at_flow_node_worker(&self, f: &mut FlowState, mut flow_id: FlowNodeId) -> FlowType {
        if self.flow_analysis_disabled.get() {
            return FlowType::complete(TypeId::ERROR);
        }
        if f.depth >= MAX_FLOW_DEPTH {
            self.report_flow_control_error(f);
            return FlowType::complete(TypeId::ERROR);
        }
        f.depth += 1;

        let binder = self.binder;
        let mut shared_flow = None;
        let result = loop {
            let Some(flow) = binder.flow_nodes.get(flow_id) else {
                break FlowType::complete(f.initial_type);
            };

            if flow.has_any_flags(flow_flags::SHARED) {
                if let Some(cached) = self.cached_shared_flow(f, flow_id) {
                    f.depth -= 1;
                    return cached;
                }
                shared_flow = Some(flow_id);
            }

            let flow_type = if flow.has_any_flags(flow_flags::ASSIGNMENT) {
                self.type_at_flow_assignment(f, flow)
            } else if flow.has_any_flags(flow_flags::CALL) {
                self.type_at_flow_call(f, flow)
            } else if flow.has_any_flags(flow_flags::CONDITION) {
                Some(self.type_at_flow_condition(f, flow))
            } else if flow.has_any_flags(flow_flags::SWITCH_CLAUSE) {
                Some(self.type_at_switch_clause(f, flow))
            } else if flow.has_any_flags(flow_flags::BRANCH_LABEL) {
                let antecedents = self.branch_label_antecedents(flow, &f.reduce_labels);
                match antecedents {
                    [single] => {
                        flow_id = *single;
                        continue;
                    }
                    [] => Some(FlowType::complete(self.auto_to_any(f.declared_type))),
                    _ => Some(self.type_at_flow_branch_label(f, antecedents)),
                }
            } else if flow.has_any_flags(flow_flags::LOOP_LABEL) {
                match flow.antecedent.as_slice() {
                    [single] => {
                        flow_id = *single;
                        continue;
                    }
                    [] => Some(FlowType::complete(self.auto_to_any(f.declared_type))),
                    _ => Some(self.type_at_flow_loop_label(f, flow)),
                }
            } else if flow.has_any_flags(flow_flags::ARRAY_MUTATION) {
                self.type_at_flow_array_mutation(f, flow)
            } else if flow.has_any_flags(flow_flags::REDUCE_LABEL) {
                let Some(antecedent) = flow.first_antecedent() else {
                    break FlowType::complete(f.initial_type);
                };
                f.reduce_labels.push(flow_id);
                let flow_type = self.type_at_flow_node(f, antecedent);
                f.reduce_labels.pop();
                Some(flow_type)
            } else if flow.has_any_flags(flow_flags::START) {
                if let Some(outer) = self.start_hand_off(f, flow) {
                    flow_id = outer;
                    continue;
                }
                Some(FlowType::complete(f.initial_type))
            } else {
                // Unreachable, or a node that carries no information.
                Some(FlowType::complete(self.auto_to_any(f.declared_type)))
            };

            match flow_type {
                Some(flow_type) => break flow_type,
                None => match flow.first_antecedent() {
                    Some(antecedent) => flow_id = antecedent,
                    None => break FlowType::complete(f.initial_type),
                },
            }
        };

        if let Some(shared) = shared_flow {
            self.shared_flows.borrow_mut().push((shared, result));
        }
        f.depth -= 1;
        result
    }

    fn cached_shared_flow(&self, f: &FlowState, flow: FlowNodeId) -> Option<FlowType> {
        let shared = self.shared_flows.borrow();
        shared
            .get(f.shared_flow_start..)?
            .iter()
            .find(|(id, _)| *id == flow)
            .map(|(_, flow_type)| *flow_type)
    }

    fn report_flow_control_error(&self, f: &FlowState) {
        self.flow_analysis_disabled.set(true);
        let arena = &self.binder.arena;
        let enclosing = f.flow_container.unwrap_or_else(|| {
            arena.find_ancestor(f.reference, |kind| {
                matches!(kind, NodeKind::FunctionLike { .. } | NodeKind::SourceFile)
            })
        });
        let anchor = match arena.kind(enclosing) {
            Some(NodeKind::FunctionLike { body, .. }) if body.is_some() => *body,
            Some(_) => enclosing,
            None => f.reference,
        };
        let (start, length) = arena
            .get(anchor)
            .map_or((0, 0), |node| (node.pos, node.end.saturating_sub(node.pos)));
        debug!(anchor = anchor.0, depth = f.depth, "flow analysis depth exceeded");
        self.diagnostics.borrow_mut().push(Diagnostic::from_code(
            self.file_name.clone(),
            start,
            length,
            diagnostic_codes::THE_CONTAINING_FUNCTION_OR_MODULE_BODY_IS_TOO_LARGE_FOR_CONTROL_FLOW_ANALYSIS,
            &[],
        ));
    }

    fn auto_to_any(&self, type_id: TypeId) -> TypeId {
        match type_id {
            TypeId::AUTO => TypeId::ANY,
            TypeId::AUTO_ARRAY => self.interner.array(TypeId::ANY),
            _ => type_id,
        }
    }

    /// The flow node to continue at when a `START` node belongs to a nested
    /// function whose captured references come from the enclosing graph.
    fn start_hand_off(&self, f: &FlowState, flow: &FlowNode) -> Option<FlowNodeId> {
        let container = flow.node;
        if container.is_none() || Some(container) == f.flow_container {
            return None;
        }
        let arena = &self.binder.arena;
        match arena.kind(f.reference) {
            Some(NodeKind::PropertyAccess { .. } | NodeKind::ElementAccess { .. }) => return None,
            Some(NodeKind::ThisKeyword)
                if !matches!(
                    arena.kind(container),
                    Some(NodeKind::FunctionLike {
                        kind: FunctionKind::Arrow,
                        ..
                    })
                ) =>
            {
                return None;
            }
            _ => {}
        }
        let outer = self.binder.flow_node_of(container);
        outer.is_some().then_some(outer)
    }

    /// Antecedents of a branch label, as substituted by the innermost
    /// reduce label that targets it.
    pub(crate) fn branch_label_antecedents(
        &self,
        flow: &'a FlowNode,
        reduce_labels: &[FlowNodeId],
    ) -> &'a [FlowNodeId] {
        let binder = self.binder;
        for &label in reduce_labels.iter().rev() {
            if let Some(data) = binder
                .flow_nodes
                .get(label)
                .and_then(|node| node.reduce_label.as_ref())
            {
                if data.target == flow.id {
                    return &data.antecedents;
                }
            }
        }
        &flow.antecedent
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    fn type_at_flow_assignment(&self, f: &mut FlowState, flow: &FlowNode) -> Option<FlowType> {
        let binder = self.binder;
        let node = flow.node;

        if is_matching_reference(binder, f.reference, node) {
            if !self.is_reachable_flow_node(flow.id) {
                return Some(FlowType::complete(TypeId::UNREACHABLE_NEVER));
            }
            let compound = match binder.arena.kind(node) {
                Some(NodeKind::Binary { operator, .. }) => operator.is_compound_assignment(),
                _ => assignment_target_kind(&binder.arena, node) == AssignmentKind::Compound,
            };
            if compound {
                let antecedent = flow.first_antecedent()?;
                let flow_type = self.type_at_flow_node(f, antecedent);
                return Some(FlowType::new(
                    base_type_of_literal(self.interner, flow_type.type_id),
                    flow_type.incomplete,
                ));
            }
            let declared = f.declared_type;
            if declared == TypeId::AUTO || declared == TypeId::AUTO_ARRAY {
                if self.is_empty_array_assignment(node) {
                    return Some(FlowType::complete(self.interner.evolving_array(TypeId::NEVER)));
                }
                let assigned =
                    widened_literal_type(self.interner, self.initial_or_assigned_type(f, node));
                let result = if self.relation.is_assignable_to(assigned, declared) {
                    assigned
                } else {
                    self.interner.array(TypeId::ANY)
                };
                return Some(FlowType::complete(result));
            }
            if is_union_type(self.interner, declared) {
                let assigned = self.initial_or_assigned_type(f, node);
                let reduced = self.narrowing().assignment_reduced_type(declared, assigned);
                trace!(assigned = assigned.0, reduced = reduced.0, "assignment");
                return Some(FlowType::complete(reduced));
            }
            return Some(FlowType::complete(declared));
        }

        if contains_matching_reference(binder, f.reference, node) {
            if !self.is_reachable_flow_node(flow.id) {
                return Some(FlowType::complete(TypeId::UNREACHABLE_NEVER));
            }
            return Some(FlowType::complete(f.declared_type));
        }

        // `for (const k in ref)` only runs its body for a non-nullish `ref`.
        if let Some(NodeKind::VariableDeclaration { .. }) = binder.arena.kind(node) {
            let parent = binder.arena.parent(node);
            if let Some(NodeKind::ForInStatement {
                initializer,
                expression,
            }) = binder.arena.kind(parent)
            {
                if *initializer == node
                    && (is_matching_reference(binder, f.reference, *expression)
                        || optional_chain_contains_reference(binder, *expression, f.reference))
                {
                    let antecedent = flow.first_antecedent()?;
                    let flow_type = self.type_at_flow_node(f, antecedent);
                    let narrowing = self.narrowing();
                    let finalized = narrowing.finalize_evolving_array(flow_type.type_id);
                    return Some(FlowType::complete(narrowing.non_nullable(finalized)));
                }
            }
        }
        None
    }

    fn is_empty_array_assignment(&self, node: NodeIndex) -> bool {
        let arena = &self.binder.arena;
        let value = match arena.kind(node) {
            Some(NodeKind::VariableDeclaration { initializer, .. }) => *initializer,
            Some(NodeKind::Binary {
                operator: BinaryOperator::Assign,
                right,
                ..
            }) => *right,
            Some(NodeKind::BindingElement { .. }) | None => return false,
            Some(_) => match arena.kind(arena.parent(node)) {
                Some(NodeKind::Binary {
                    operator: BinaryOperator::Assign,
                    left,
                    right,
                    ..
                }) if *left == node => *right,
                _ => return false,
            },
        };
        matches!(
            arena.kind(arena.skip_parentheses(value)),
            Some(NodeKind::ArrayLiteral { elements }) if elements.is_empty()
        )
    }

    /// Type written by an assignment node: the initial type of a
    /// declaration or binding element, the right operand of an assignment
    /// expression, or the part of a destructured value a target receives.
    fn initial_or_assigned_type(&self, f: &FlowState, node: NodeIndex) -> TypeId {
        let written = match self.binder.arena.kind(node) {
            Some(NodeKind::VariableDeclaration { .. } | NodeKind::BindingElement { .. }) => {
                self.initial_type(node)
            }
            Some(NodeKind::Binary { right, .. }) => self.expression_type(*right),
            _ => self.assigned_type(node),
        };
        written.unwrap_or(f.declared_type)
    }

    fn initial_type(&self, node: NodeIndex) -> Option<TypeId> {
        let arena = &self.binder.arena;
        match arena.kind(node)? {
            NodeKind::VariableDeclaration { initializer, .. } => {
                if initializer.is_some() {
                    return self.expression_type(*initializer);
                }
                match arena.kind(arena.parent(node)) {
                    Some(NodeKind::ForInStatement { .. }) => Some(TypeId::STRING),
                    Some(NodeKind::ForOfStatement { expression, .. }) => {
                        Some(self.iterated_type(self.expression_type(*expression)?))
                    }
                    _ => Some(TypeId::UNDEFINED),
                }
            }
            NodeKind::BindingElement {
                property_name,
                initializer,
                dot_dot_dot,
                ..
            } => {
                let pattern = arena.parent(node);
                let parent_type = self.initial_type(arena.parent(pattern))?;
                let element_type = match arena.kind(pattern)? {
                    NodeKind::ObjectBindingPattern { .. } => {
                        self.destructured_property_type(parent_type, *property_name)
                    }
                    NodeKind::ArrayBindingPattern { .. } if *dot_dot_dot => {
                        self.interner.array(self.iterated_type(parent_type))
                    }
                    NodeKind::ArrayBindingPattern { elements } => {
                        let index = elements.iter().position(|&element| element == node)?;
                        self.destructured_array_element_type(parent_type, index)
                    }
                    _ => return None,
                };
                Some(self.type_with_default(element_type, *initializer))
            }
            _ => None,
        }
    }

    /// Type an assignment target receives from the construct that writes
    /// to it: `for...in` keys, `for...of` elements, the right operand of an
    /// assignment, or its share of a destructured value.
    fn assigned_type(&self, node: NodeIndex) -> Option<TypeId> {
        let arena = &self.binder.arena;
        let parent = arena.parent(node);
        let assigned = match arena.kind(parent)? {
            NodeKind::ForInStatement { .. } => TypeId::STRING,
            NodeKind::ForOfStatement { expression, .. } => {
                self.iterated_type(self.expression_type(*expression)?)
            }
            NodeKind::Binary { right, .. } => {
                let grandparent = arena.parent(parent);
                let is_destructuring_default = match arena.kind(grandparent) {
                    Some(NodeKind::ArrayLiteral { .. }) => {
                        assignment_target(arena, grandparent).is_some()
                    }
                    Some(NodeKind::PropertyAssignment { .. }) => {
                        assignment_target(arena, arena.parent(grandparent)).is_some()
                    }
                    _ => false,
                };
                if is_destructuring_default {
                    self.type_with_default(self.assigned_type(parent)?, *right)
                } else {
                    self.expression_type(*right)?
                }
            }
            NodeKind::Delete { .. } => TypeId::UNDEFINED,
            NodeKind::ArrayLiteral { elements } => {
                let index = elements.iter().position(|&element| element == node)?;
                self.destructured_array_element_type(self.assigned_type(parent)?, index)
            }
            NodeKind::SpreadElement { .. } => {
                let array_like = self.assigned_type(arena.parent(parent))?;
                self.interner.array(self.iterated_type(array_like))
            }
            NodeKind::PropertyAssignment { name, .. } => {
                let object = self.assigned_type(arena.parent(parent))?;
                self.destructured_property_type(object, *name)
            }
            NodeKind::ShorthandPropertyAssignment { default, .. } => {
                let name = match arena.kind(node)? {
                    NodeKind::Identifier { name, .. } => *name,
                    _ => return None,
                };
                let object = self.assigned_type(arena.parent(parent))?;
                let property = self.destructured_property_type(object, name);
                self.type_with_default(property, *default)
            }
            _ => TypeId::ERROR,
        };
        trace!(node = node.0, assigned = assigned.0, "assigned type");
        Some(assigned)
    }

    /// `T` with `undefined` replaced by the type of a destructuring default.
    fn type_with_default(&self, type_id: TypeId, default: NodeIndex) -> TypeId {
        if default.is_none() {
            return type_id;
        }
        let Some(default_type) = self.expression_type(default) else {
            return type_id;
        };
        let defined = self.narrowing().type_with_facts(type_id, TypeFacts::NE_UNDEFINED);
        self.interner.union2(defined, default_type)
    }

    fn destructured_property_type(&self, type_id: TypeId, name: Atom) -> TypeId {
        if name.is_none() {
            return TypeId::ERROR;
        }
        let name = self.solver_atom(name);
        let narrowing = self.narrowing();
        let mut types = Vec::new();
        for member in union_members(self.interner, type_id) {
            match narrowing.property_or_index_signature_type(member, name) {
                Some(found) => types.push(found),
                None => return TypeId::ERROR,
            }
        }
        self.interner.union(types)
    }

    /// Element `index` of every tuple in `type_id`, or the iterated type
    /// when some constituent is not a tuple.
    fn destructured_array_element_type(&self, type_id: TypeId, index: usize) -> TypeId {
        let members = union_members(self.interner, type_id);
        let tuple_types: Option<Vec<TypeId>> = members
            .iter()
            .map(|&member| self.tuple_element_type(member, index))
            .collect();
        match tuple_types {
            Some(types) => self.interner.union(types),
            None => self.iterated_type(type_id),
        }
    }

    fn tuple_element_type(&self, tuple: TypeId, index: usize) -> Option<TypeId> {
        let elements = tuple_elements(self.interner, tuple)?;
        if let Some(element) = elements.get(index)
            && !element.flags.intersects(ElementFlags::REST | ElementFlags::VARIADIC)
        {
            return Some(if element.flags.contains(ElementFlags::OPTIONAL) {
                self.interner.union2(element.type_id, TypeId::UNDEFINED)
            } else {
                element.type_id
            });
        }
        elements
            .iter()
            .take(index + 1)
            .find(|element| element.flags.contains(ElementFlags::REST))
            .map(|element| element.type_id)
    }

    /// Element type produced by iterating `iterable`.
    fn iterated_type(&self, iterable: TypeId) -> TypeId {
        if let Some(iterated) = self.host.iterated_type_of(iterable) {
            return iterated;
        }
        let mut types = Vec::new();
        for member in union_members(self.interner, iterable) {
            let element = if member == TypeId::STRING || is_string_literal(self.interner, member) {
                Some(TypeId::STRING)
            } else {
                element_type_of_array_like(self.interner, member)
            };
            match element {
                Some(element) => types.push(element),
                None => return TypeId::ERROR,
            }
        }
        self.interner.union(types)
    }

    /// Host type of an expression, with literal expressions typed locally
    /// when the host has no entry.
    pub(crate) fn expression_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.host
            .type_of_expression(node)
            .or_else(|| self.literal_type_of_expression(node))
    }

    fn literal_type_of_expression(&self, node: NodeIndex) -> Option<TypeId> {
        let interner = self.interner;
        match self.binder.arena.kind(node)? {
            NodeKind::NullKeyword => Some(TypeId::NULL),
            NodeKind::TrueKeyword => Some(TypeId::FRESH_TRUE),
            NodeKind::FalseKeyword => Some(TypeId::FRESH_FALSE),
            NodeKind::StringLiteral { text } => {
                Some(interner.fresh_literal_string(&self.binder.atoms.resolve(*text)))
            }
            NodeKind::NumericLiteral { value } => Some(interner.fresh_literal_number(*value)),
            NodeKind::BigIntLiteral { text } => {
                Some(interner.literal_bigint(&self.binder.atoms.resolve(*text)))
            }
            NodeKind::PrefixUnary {
                operator: PrefixOperator::Minus,
                operand,
            } => match self.binder.arena.kind(*operand)? {
                NodeKind::NumericLiteral { value } => Some(interner.fresh_literal_number(-*value)),
                _ => None,
            },
            NodeKind::Identifier { name, symbol } if symbol.is_none() => {
                (&*self.binder.atoms.resolve(*name) == "undefined").then_some(TypeId::UNDEFINED)
            }
            NodeKind::Parenthesized { expression } => self.expression_type(*expression),
            _ => None,
        }
    }

    // =========================================================================
    // Call
    // =========================================================================

    fn type_at_flow_call(&self, f: &mut FlowState, flow: &FlowNode) -> Option<FlowType> {
        let signature = self.host.effects_signature(flow.node)?;
        let predicate = signature
            .type_predicate
            .as_ref()
            .filter(|predicate| predicate.is_asserts());
        let Some(predicate) = predicate else {
            if signature.return_type.is_never() {
                return Some(FlowType::complete(TypeId::UNREACHABLE_NEVER));
            }
            return None;
        };

        let antecedent = flow.first_antecedent()?;
        let flow_type = self.type_at_flow_node(f, antecedent);
        let t = self.narrowing().finalize_evolving_array(flow_type.type_id);
        let narrowed = if predicate.type_id.is_some() {
            self.narrow_type_by_type_predicate(f, t, predicate, flow.node, true)
        } else if predicate.kind == TypePredicateKind::AssertsIdentifier {
            match (predicate.parameter_index, self.binder.arena.kind(flow.node)) {
                (Some(index), Some(NodeKind::Call { arguments, .. })) if index < arguments.len() => {
                    self.narrow_type_by_assertion(f, t, arguments[index])
                }
                _ => t,
            }
        } else {
            t
        };
        if narrowed == t {
            return Some(flow_type);
        }
        Some(FlowType::new(narrowed, flow_type.incomplete))
    }

    // =========================================================================
    // Condition
    // =========================================================================

    fn type_at_flow_condition(&self, f: &mut FlowState, flow: &FlowNode) -> FlowType {
        let Some(antecedent) = flow.first_antecedent() else {
            return FlowType::complete(f.initial_type);
        };
        let flow_type = self.type_at_flow_node(f, antecedent);
        if flow_type.type_id.is_never() {
            return flow_type;
        }
        let assume_true = flow.has_any_flags(flow_flags::TRUE_CONDITION);
        let non_evolving = self.narrowing().finalize_evolving_array(flow_type.type_id);
        let narrowed = self.narrow_type(f, non_evolving, flow.node, assume_true);
        if narrowed == non_evolving {
            return flow_type;
        }
        FlowType::new(narrowed, flow_type.incomplete)
    }

    // =========================================================================
    // Join points
    // =========================================================================

    fn type_at_flow_branch_label(&self, f: &mut FlowState, antecedents: &[FlowNodeId]) -> FlowType {
        let binder = self.binder;
        let narrowing = self.narrowing();
        let mut types: Vec<TypeId> = Vec::with_capacity(antecedents.len());
        let mut subtype_reduction = false;
        let mut seen_incomplete = false;
        let mut bypass_flow: Option<&FlowNode> = None;

        for &antecedent in antecedents {
            if bypass_flow.is_none() {
                if let Some(node) = binder.flow_nodes.get(antecedent) {
                    let is_bypass = node
                        .switch_clause
                        .is_some_and(|data| data.clause_start == data.clause_end);
                    if node.has_any_flags(flow_flags::SWITCH_CLAUSE) && is_bypass {
                        // The "no clause matched" path is added last, if at all.
                        bypass_flow = Some(node);
                        continue;
                    }
                }
            }
            let flow_type = self.type_at_flow_node(f, antecedent);
            let t = flow_type.type_id;
            if t == f.declared_type && f.declared_type == f.initial_type {
                return FlowType::complete(t);
            }
            if !types.contains(&t) {
                types.push(t);
            }
            if !narrowing.is_type_subset_of(t, f.initial_type) {
                subtype_reduction = true;
            }
            seen_incomplete |= flow_type.incomplete;
        }

        if let Some(bypass) = bypass_flow {
            let flow_type = self.type_at_flow_node(f, bypass.id);
            let t = flow_type.type_id;
            let exhaustive = bypass
                .switch_clause
                .is_some_and(|data| self.is_exhaustive_switch_statement(data.switch_statement));
            if !t.is_never() && !types.contains(&t) && !exhaustive {
                if t == f.declared_type && f.declared_type == f.initial_type {
                    return FlowType::complete(t);
                }
                types.push(t);
                if !narrowing.is_type_subset_of(t, f.initial_type) {
                    subtype_reduction = true;
                }
                seen_incomplete |= flow_type.incomplete;
            }
        }

        trace!(count = types.len(), subtype_reduction, "branch label");
        FlowType::new(
            self.union_or_evolving_array(f, &types, subtype_reduction),
            seen_incomplete,
        )
    }

    fn loop_key(&self, f: &mut FlowState) -> Option<String> {
        if f.ref_key.is_none() {
            f.ref_key = Some(flow_cache_key(
                self.binder,
                f.reference,
                f.declared_type,
                f.initial_type,
                f.flow_container,
            ));
        }
        f.ref_key.clone().flatten()
    }

    fn type_at_flow_loop_label(&self, f: &mut FlowState, flow: &FlowNode) -> FlowType {
        let Some(key) = self.loop_key(f) else {
            return FlowType::complete(f.declared_type);
        };
        let cache_key = (flow.id, key);
        if let Some(&cached) = self.flow_loop_cache.borrow().get(&cache_key) {
            return FlowType::complete(cached);
        }

        // A back edge of a loop already being resolved for this reference
        // yields the union of the partial results so far.
        let in_flight = self
            .flow_loop_stack
            .borrow()
            .iter()
            .find(|info| info.flow == flow.id && info.key == cache_key.1 && !info.types.is_empty())
            .map(|info| info.types.clone());
        if let Some(partial) = in_flight {
            trace!(flow = flow.id.0, "loop back edge in flight");
            return FlowType::new(self.union_or_evolving_array(f, &partial, false), true);
        }

        let narrowing = self.narrowing();
        let mut antecedent_types: Vec<TypeId> = Vec::new();
        let mut subtype_reduction = false;
        let mut first_incomplete = false;

        for (index, &antecedent) in flow.antecedent.iter().enumerate() {
            let flow_type = if index == 0 {
                let flow_type = self.type_at_flow_node(f, antecedent);
                first_incomplete = flow_type.incomplete;
                flow_type
            } else {
                self.flow_loop_stack.borrow_mut().push(FlowLoopInfo {
                    flow: flow.id,
                    key: cache_key.1.clone(),
                    types: antecedent_types.clone(),
                });
                let flow_type = self.type_at_flow_node(f, antecedent);
                self.flow_loop_stack.borrow_mut().pop();
                // The back edge may have resolved this loop already.
                if let Some(&cached) = self.flow_loop_cache.borrow().get(&cache_key) {
                    return FlowType::complete(cached);
                }
                flow_type
            };
            let t = flow_type.type_id;
            if !antecedent_types.contains(&t) {
                antecedent_types.push(t);
            }
            if !narrowing.is_type_subset_of(t, f.initial_type) {
                subtype_reduction = true;
            }
            if t == f.declared_type {
                break;
            }
        }

        let result = self.union_or_evolving_array(f, &antecedent_types, subtype_reduction);
        debug!(flow = flow.id.0, result = result.0, "loop label");
        if first_incomplete {
            return FlowType::new(result, true);
        }
        self.flow_loop_cache.borrow_mut().insert(cache_key, result);
        FlowType::complete(result)
    }

    /// Union of the types reaching a junction. Evolving arrays stay evolving
    /// when every non-`never` type is one.
    pub(crate) fn union_or_evolving_array(
        &self,
        f: &FlowState,
        types: &[TypeId],
        subtype_reduction: bool,
    ) -> TypeId {
        let interner = self.interner;
        let mut has_evolving = false;
        let all_evolving = types.iter().all(|&t| {
            if t.is_never() {
                return true;
            }
            let evolving = is_evolving_array(interner, t);
            has_evolving |= evolving;
            evolving
        });
        if all_evolving && has_evolving {
            let elements = types
                .iter()
                .map(|&t| evolving_array_element(interner, t).unwrap_or(TypeId::NEVER))
                .collect();
            return interner.evolving_array(interner.union(elements));
        }

        let narrowing = self.narrowing();
        let finalized: Vec<TypeId> = types
            .iter()
            .map(|&t| narrowing.finalize_evolving_array(t))
            .collect();
        let result = if subtype_reduction {
            union_with_subtype_reduction(interner, self.relation, &finalized)
        } else {
            interner.union(finalized)
        };
        if result != f.declared_type
            && is_union_type(interner, result)
            && union_members(interner, result) == union_members(interner, f.declared_type)
        {
            return f.declared_type;
        }
        result
    }

    // =========================================================================
    // Array mutation
    // =========================================================================

    fn type_at_flow_array_mutation(&self, f: &mut FlowState, flow: &FlowNode) -> Option<FlowType> {
        if f.declared_type != TypeId::AUTO && f.declared_type != TypeId::AUTO_ARRAY {
            return None;
        }
        let binder = self.binder;
        let arena = &binder.arena;
        let node = flow.node;
        let array = match arena.kind(node)? {
            NodeKind::Call { callee, .. } => match arena.kind(*callee)? {
                NodeKind::PropertyAccess { expression, .. } => *expression,
                _ => return None,
            },
            NodeKind::Binary { left, .. } => match arena.kind(*left)? {
                NodeKind::ElementAccess { expression, .. } => *expression,
                _ => return None,
            },
            _ => return None,
        };
        if !is_matching_reference(binder, f.reference, reference_candidate(binder, array)) {
            return None;
        }

        let antecedent = flow.first_antecedent()?;
        let flow_type = self.type_at_flow_node(f, antecedent);
        if !is_evolving_array(self.interner, flow_type.type_id) {
            return Some(flow_type);
        }
        let narrowing = self.narrowing();
        let mut evolved = flow_type.type_id;
        match arena.kind(node)? {
            NodeKind::Call { arguments, .. } => {
                for &argument in arguments {
                    if let Some(value_type) = self.expression_type(argument) {
                        evolved = narrowing.add_evolving_array_element(evolved, value_type);
                    }
                }
            }
            NodeKind::Binary { left, right, .. } => {
                let index_type = match arena.kind(*left) {
                    Some(NodeKind::ElementAccess { argument, .. }) => self.expression_type(*argument),
                    _ => None,
                };
                if index_type.is_some_and(|t| self.is_number_like(t)) {
                    if let Some(value_type) = self.expression_type(*right) {
                        evolved = narrowing.add_evolving_array_element(evolved, value_type);
                    }
                }
            }
            _ => {}
        }
        if evolved == flow_type.type_id {
            return Some(flow_type);
        }
        trace!(evolved = evolved.0, "array mutation");
        Some(FlowType::new(evolved, flow_type.incomplete))
    }

    pub(crate) fn is_number_like(&self, type_id: TypeId) -> bool {
        let interner = self.interner;
        union_members(interner, type_id).iter().all(|&member| {
            member == TypeId::NUMBER
                || matches!(literal_value(interner, member), Some(LiteralValue::Number(_)))
        })
    }

    /// Whether `reference` is read only to be extended or measured
    /// (`x.push(..)`, `x.unshift(..)`, `x.length`, `x[n] = ..`), which keeps
    /// it an evolving array.
    pub(crate) fn is_evolving_array_operation_target(&self, reference: NodeIndex) -> bool {
        let binder = self.binder;
        let arena = &binder.arena;
        let root = reference_root(binder, reference);
        let parent = arena.parent(root);
        match arena.kind(parent) {
            Some(NodeKind::PropertyAccess { name, .. }) => {
                let name = binder.atoms.resolve(*name);
                if &*name == "length" {
                    return true;
                }
                (&*name == "push" || &*name == "unshift")
                    && matches!(
                        arena.kind(arena.parent(parent)),
                        Some(NodeKind::Call { callee, .. }) if *callee == parent
                    )
            }
            Some(NodeKind::ElementAccess {
                expression,
                argument,
                ..
            }) if *expression == root => {
                let assigned = matches!(
                    arena.kind(arena.parent(parent)),
                    Some(NodeKind::Binary {
                        left,
                        operator: BinaryOperator::Assign,
                        ..
                    }) if *left == parent
                );
                assigned
                    && self
                        .expression_type(*argument)
                        .is_some_and(|t| self.is_number_like(t))
            }
            _ => false,
        }
    }
}
