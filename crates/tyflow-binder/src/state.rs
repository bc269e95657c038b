//! Binder state: nodes, symbols and the flow graph of one source file.
//!
//! Parsing and statement binding happen elsewhere; this type exposes the
//! primitive operations a binder performs (allocate a node, declare a
//! symbol, create and link flow nodes) so that graphs can be assembled
//! directly by an embedder or by tests.

use crate::assignments::AssignmentMarks;
use crate::flow::{
    FlowNodeArena, FlowNodeId, FlowReduceLabelData, FlowSwitchClauseData, flow_flags,
};
use crate::node::{BinaryOperator, FunctionKind, NodeArena, NodeIndex, NodeKind, PrefixOperator};
use crate::symbols::{SymbolArena, SymbolId, symbol_flags};
use rustc_hash::FxHashMap;
use std::cell::OnceCell;
use std::rc::Rc;
use tracing::trace;
use tyflow_common::interner::{Atom, Interner};

pub struct BinderState {
    pub atoms: Rc<Interner>,
    pub arena: NodeArena,
    pub symbols: SymbolArena,
    /// Flow nodes for control flow analysis
    pub flow_nodes: FlowNodeArena,
    /// Node-to-flow mapping: the flow node active at each reference or container
    pub node_flow: FxHashMap<u32, FlowNodeId>,
    /// Shared unreachable flow node
    pub unreachable_flow: FlowNodeId,
    /// Flow node at the end of each constructor and static block
    return_flows: FxHashMap<u32, FlowNodeId>,
    /// Member symbols that property and element accesses resolve to
    resolved_symbols: FxHashMap<u32, SymbolId>,
    /// Computed on first query, dropped whenever nodes or symbols change
    assignment_marks: OnceCell<AssignmentMarks>,
    next_pos: u32,
}

impl BinderState {
    pub fn new(atoms: Rc<Interner>) -> Self {
        let mut flow_nodes = FlowNodeArena::new();
        let unreachable_flow = flow_nodes.alloc(flow_flags::UNREACHABLE);
        BinderState {
            atoms,
            arena: NodeArena::new(),
            symbols: SymbolArena::new(),
            flow_nodes,
            node_flow: FxHashMap::default(),
            unreachable_flow,
            return_flows: FxHashMap::default(),
            resolved_symbols: FxHashMap::default(),
            assignment_marks: OnceCell::new(),
            next_pos: 0,
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    pub fn declare_symbol(&mut self, name: &str, flags: u32) -> SymbolId {
        let atom = self.atoms.intern(name);
        self.assignment_marks.take();
        self.symbols.alloc(flags, atom)
    }

    /// Declare a property or method of `class`.
    pub fn declare_member(&mut self, class: SymbolId, name: &str, flags: u32) -> SymbolId {
        let member = self.declare_symbol(name, flags | symbol_flags::PROPERTY);
        if let Some(sym) = self.symbols.get_mut(member) {
            sym.parent = class;
        }
        member
    }

    /// Mark a binding as assigned outside the bound nodes. Narrowing then
    /// treats every read as possibly following an assignment.
    pub fn mark_assigned(&mut self, symbol: SymbolId) {
        if let Some(sym) = self.symbols.get_mut(symbol) {
            sym.flags |= symbol_flags::ASSIGNED;
        }
    }

    /// Record the member symbol an access expression resolves to.
    pub fn set_resolved_symbol(&mut self, access: NodeIndex, symbol: SymbolId) {
        self.resolved_symbols.insert(access.0, symbol);
    }

    pub fn resolved_symbol_of(&self, access: NodeIndex) -> SymbolId {
        self.resolved_symbols
            .get(&access.0)
            .copied()
            .unwrap_or(SymbolId::NONE)
    }

    // =========================================================================
    // Assignments
    // =========================================================================

    pub fn assignment_marks(&self) -> &AssignmentMarks {
        self.assignment_marks
            .get_or_init(|| AssignmentMarks::collect(&self.arena, &self.symbols))
    }

    /// Whether a parameter or mutable local is assigned anywhere.
    pub fn is_symbol_assigned(&self, symbol: SymbolId) -> bool {
        let Some(sym) = self.symbols.get(symbol) else {
            return false;
        };
        sym.has_any_flags(symbol_flags::ASSIGNED)
            || self.assignment_marks().last_assignment(symbol).is_some()
    }

    /// Whether `location` follows every assignment to `symbol`, or there
    /// are none.
    pub fn is_past_last_assignment(&self, symbol: SymbolId, location: NodeIndex) -> bool {
        if self
            .symbols
            .get(symbol)
            .is_some_and(|sym| sym.has_any_flags(symbol_flags::ASSIGNED))
        {
            return false;
        }
        match self.assignment_marks().last_assignment(symbol) {
            None => true,
            Some(last) => self.arena.get(location).is_some_and(|node| last < node.pos),
        }
    }

    /// A `const`, a parameter or mutable local that is never assigned, or a
    /// binding of a function expression.
    pub fn is_constant_variable(&self, symbol: SymbolId) -> bool {
        let Some(sym) = self.symbols.get(symbol) else {
            return false;
        };
        if sym.is_const_variable() {
            return true;
        }
        if sym.is_parameter_or_mutable_local() && !self.is_symbol_assigned(symbol) {
            return true;
        }
        matches!(
            self.arena.kind(sym.value_declaration),
            Some(NodeKind::FunctionLike {
                kind: FunctionKind::Expression,
                ..
            })
        )
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    fn alloc(&mut self, kind: NodeKind) -> NodeIndex {
        let pos = self.next_pos;
        self.next_pos += 2;
        self.assignment_marks.take();
        self.arena.alloc(kind, pos, pos + 1)
    }

    fn set_value_declaration(&mut self, symbol: SymbolId, declaration: NodeIndex) {
        if let Some(sym) = self.symbols.get_mut(symbol) {
            if sym.value_declaration.is_none() {
                sym.value_declaration = declaration;
            }
        }
    }

    fn identifier_symbol(&self, node: NodeIndex) -> SymbolId {
        match self.arena.kind(node) {
            Some(NodeKind::Identifier { symbol, .. }) => *symbol,
            _ => SymbolId::NONE,
        }
    }

    pub fn atom(&self, text: &str) -> Atom {
        self.atoms.intern(text)
    }

    pub fn identifier(&mut self, symbol: SymbolId) -> NodeIndex {
        let name = self
            .symbols
            .get(symbol)
            .map_or(Atom::NONE, |sym| sym.escaped_name);
        self.alloc(NodeKind::Identifier { name, symbol })
    }

    /// `#name`, resolving to the class member `symbol`.
    pub fn private_identifier(&mut self, symbol: SymbolId) -> NodeIndex {
        let name = self
            .symbols
            .get(symbol)
            .map_or(Atom::NONE, |sym| sym.escaped_name);
        self.alloc(NodeKind::PrivateIdentifier { name, symbol })
    }

    pub fn this_keyword(&mut self) -> NodeIndex {
        self.alloc(NodeKind::ThisKeyword)
    }

    pub fn super_keyword(&mut self) -> NodeIndex {
        self.alloc(NodeKind::SuperKeyword)
    }

    pub fn null_keyword(&mut self) -> NodeIndex {
        self.alloc(NodeKind::NullKeyword)
    }

    pub fn true_keyword(&mut self) -> NodeIndex {
        self.alloc(NodeKind::TrueKeyword)
    }

    pub fn false_keyword(&mut self) -> NodeIndex {
        self.alloc(NodeKind::FalseKeyword)
    }

    pub fn string_literal(&mut self, text: &str) -> NodeIndex {
        let text = self.atoms.intern(text);
        self.alloc(NodeKind::StringLiteral { text })
    }

    pub fn numeric_literal(&mut self, value: f64) -> NodeIndex {
        self.alloc(NodeKind::NumericLiteral { value })
    }

    pub fn array_literal(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::ArrayLiteral { elements })
    }

    pub fn object_literal(&mut self, properties: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::ObjectLiteral { properties })
    }

    pub fn property_assignment(&mut self, name: &str, initializer: NodeIndex) -> NodeIndex {
        let name = self.atoms.intern(name);
        self.alloc(NodeKind::PropertyAssignment { name, initializer })
    }

    /// `{ name }`, or `{ name = default }` in a destructuring target.
    pub fn shorthand_property_assignment(
        &mut self,
        symbol: SymbolId,
        default: NodeIndex,
    ) -> NodeIndex {
        let name = self.identifier(symbol);
        self.alloc(NodeKind::ShorthandPropertyAssignment { name, default })
    }

    pub fn spread_element(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::SpreadElement { expression })
    }

    pub fn property_access(&mut self, expression: NodeIndex, name: &str) -> NodeIndex {
        let name = self.atoms.intern(name);
        self.alloc(NodeKind::PropertyAccess {
            expression,
            name,
            question_dot: false,
        })
    }

    /// `expression?.name`
    pub fn optional_property_access(&mut self, expression: NodeIndex, name: &str) -> NodeIndex {
        let name = self.atoms.intern(name);
        self.alloc(NodeKind::PropertyAccess {
            expression,
            name,
            question_dot: true,
        })
    }

    pub fn element_access(&mut self, expression: NodeIndex, argument: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::ElementAccess {
            expression,
            argument,
            question_dot: false,
        })
    }

    pub fn parenthesized(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::Parenthesized { expression })
    }

    pub fn non_null(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::NonNull { expression })
    }

    pub fn type_of(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::TypeOf { expression })
    }

    pub fn delete(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::Delete { expression })
    }

    pub fn prefix(&mut self, operator: PrefixOperator, operand: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::PrefixUnary { operator, operand })
    }

    pub fn not(&mut self, operand: NodeIndex) -> NodeIndex {
        self.prefix(PrefixOperator::Exclamation, operand)
    }

    pub fn binary(
        &mut self,
        left: NodeIndex,
        operator: BinaryOperator,
        right: NodeIndex,
    ) -> NodeIndex {
        self.alloc(NodeKind::Binary {
            left,
            operator,
            right,
        })
    }

    pub fn call(&mut self, callee: NodeIndex, arguments: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::Call {
            callee,
            arguments,
            question_dot: false,
        })
    }

    /// `name = initializer` as a declaration; also records the symbol's value declaration.
    pub fn variable_declaration(&mut self, symbol: SymbolId, initializer: NodeIndex) -> NodeIndex {
        self.declare_variable(symbol, initializer, false)
    }

    /// `name: T = initializer`
    pub fn annotated_variable_declaration(
        &mut self,
        symbol: SymbolId,
        initializer: NodeIndex,
    ) -> NodeIndex {
        self.declare_variable(symbol, initializer, true)
    }

    fn declare_variable(
        &mut self,
        symbol: SymbolId,
        initializer: NodeIndex,
        has_type_annotation: bool,
    ) -> NodeIndex {
        let name = self.identifier(symbol);
        let decl = self.alloc(NodeKind::VariableDeclaration {
            name,
            initializer,
            has_type_annotation,
        });
        self.set_value_declaration(symbol, decl);
        decl
    }

    /// `const { a, b } = initializer` or `const [a, b] = initializer`.
    pub fn destructuring_declaration(
        &mut self,
        pattern: NodeIndex,
        initializer: NodeIndex,
    ) -> NodeIndex {
        self.alloc(NodeKind::VariableDeclaration {
            name: pattern,
            initializer,
            has_type_annotation: false,
        })
    }

    pub fn object_binding_pattern(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::ObjectBindingPattern { elements })
    }

    pub fn array_binding_pattern(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::ArrayBindingPattern { elements })
    }

    /// An element of a binding pattern. `name` is an identifier or a nested
    /// pattern; in object patterns `property_name` defaults to the
    /// identifier's own name.
    pub fn binding_element(
        &mut self,
        property_name: Option<&str>,
        name: NodeIndex,
        initializer: NodeIndex,
    ) -> NodeIndex {
        self.alloc_binding_element(property_name, name, initializer, false)
    }

    /// `...name` in a binding pattern.
    pub fn rest_binding_element(&mut self, name: NodeIndex) -> NodeIndex {
        self.alloc_binding_element(None, name, NodeIndex::NONE, true)
    }

    fn alloc_binding_element(
        &mut self,
        property_name: Option<&str>,
        name: NodeIndex,
        initializer: NodeIndex,
        dot_dot_dot: bool,
    ) -> NodeIndex {
        let property_name = match (property_name, self.arena.kind(name)) {
            (Some(text), _) => self.atoms.intern(text),
            (None, Some(NodeKind::Identifier { name, .. })) => *name,
            _ => Atom::NONE,
        };
        let symbol = self.identifier_symbol(name);
        let element = self.alloc(NodeKind::BindingElement {
            property_name,
            name,
            initializer,
            dot_dot_dot,
        });
        self.set_value_declaration(symbol, element);
        element
    }

    pub fn parameter(&mut self, symbol: SymbolId, initializer: NodeIndex) -> NodeIndex {
        let name = self.identifier(symbol);
        let parameter = self.alloc(NodeKind::Parameter { name, initializer });
        self.set_value_declaration(symbol, parameter);
        parameter
    }

    /// A class property with no type annotation, typed from its assignments.
    pub fn property_declaration(&mut self, symbol: SymbolId) -> NodeIndex {
        let name = self
            .symbols
            .get(symbol)
            .map_or(Atom::NONE, |sym| sym.escaped_name);
        let this = self.this_keyword();
        let reference = self.alloc(NodeKind::PropertyAccess {
            expression: this,
            name,
            question_dot: false,
        });
        self.set_resolved_symbol(reference, symbol);
        let decl = self.alloc(NodeKind::PropertyDeclaration { symbol, reference });
        self.set_value_declaration(symbol, decl);
        decl
    }

    pub fn for_in_statement(&mut self, initializer: NodeIndex, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::ForInStatement {
            initializer,
            expression,
        })
    }

    pub fn for_of_statement(&mut self, initializer: NodeIndex, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::ForOfStatement {
            initializer,
            expression,
        })
    }

    pub fn case_clause(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc(NodeKind::CaseClause { expression })
    }

    pub fn default_clause(&mut self) -> NodeIndex {
        self.alloc(NodeKind::CaseClause {
            expression: NodeIndex::NONE,
        })
    }

    pub fn switch_statement(&mut self, expression: NodeIndex, clauses: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::SwitchStatement {
            expression,
            clauses,
        })
    }

    pub fn block(&mut self) -> NodeIndex {
        self.block_of(Vec::new())
    }

    pub fn block_of(&mut self, statements: Vec<NodeIndex>) -> NodeIndex {
        self.alloc(NodeKind::Block { statements })
    }

    pub fn function_like(&mut self, kind: FunctionKind, body: NodeIndex) -> NodeIndex {
        self.function_with_parameters(kind, Vec::new(), body)
    }

    pub fn function_with_parameters(
        &mut self,
        kind: FunctionKind,
        parameters: Vec<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.alloc(NodeKind::FunctionLike {
            kind,
            parameters,
            body,
        })
    }

    pub fn source_file(&mut self) -> NodeIndex {
        self.alloc(NodeKind::SourceFile)
    }

    // =========================================================================
    // Flow graph
    // =========================================================================

    /// Record the flow node that is active at `node`.
    pub fn set_flow_node(&mut self, node: NodeIndex, flow: FlowNodeId) {
        self.node_flow.insert(node.0, flow);
    }

    pub fn flow_node_of(&self, node: NodeIndex) -> FlowNodeId {
        self.node_flow
            .get(&node.0)
            .copied()
            .unwrap_or(FlowNodeId::NONE)
    }

    /// Record the flow node reached at the end of a constructor or static block.
    pub fn set_return_flow(&mut self, container: NodeIndex, flow: FlowNodeId) {
        self.return_flows.insert(container.0, flow);
    }

    pub fn return_flow_of(&self, container: NodeIndex) -> FlowNodeId {
        self.return_flows
            .get(&container.0)
            .copied()
            .unwrap_or(FlowNodeId::NONE)
    }

    /// Start node of the flow graph owned by `container`.
    pub fn start_flow(&mut self, container: NodeIndex) -> FlowNodeId {
        let id = self.flow_nodes.alloc(flow_flags::START);
        if let Some(flow) = self.flow_nodes.get_mut(id) {
            flow.node = container;
        }
        id
    }

    fn linear_flow(&mut self, flags: u32, node: NodeIndex, antecedent: FlowNodeId) -> FlowNodeId {
        let id = self.flow_nodes.alloc(flags);
        if let Some(flow) = self.flow_nodes.get_mut(id) {
            flow.node = node;
        }
        self.flow_nodes.set_antecedent(id, antecedent);
        id
    }

    pub fn assignment_flow(&mut self, node: NodeIndex, antecedent: FlowNodeId) -> FlowNodeId {
        self.linear_flow(flow_flags::ASSIGNMENT, node, antecedent)
    }

    pub fn condition_flow(
        &mut self,
        expression: NodeIndex,
        antecedent: FlowNodeId,
        assume_true: bool,
    ) -> FlowNodeId {
        let flags = if assume_true {
            flow_flags::TRUE_CONDITION
        } else {
            flow_flags::FALSE_CONDITION
        };
        self.linear_flow(flags, expression, antecedent)
    }

    pub fn call_flow(&mut self, call: NodeIndex, antecedent: FlowNodeId) -> FlowNodeId {
        self.linear_flow(flow_flags::CALL, call, antecedent)
    }

    pub fn array_mutation_flow(&mut self, node: NodeIndex, antecedent: FlowNodeId) -> FlowNodeId {
        self.linear_flow(flow_flags::ARRAY_MUTATION, node, antecedent)
    }

    pub fn switch_clause_flow(
        &mut self,
        switch_statement: NodeIndex,
        clause_start: u32,
        clause_end: u32,
        antecedent: FlowNodeId,
    ) -> FlowNodeId {
        let id = self.linear_flow(flow_flags::SWITCH_CLAUSE, switch_statement, antecedent);
        if let Some(flow) = self.flow_nodes.get_mut(id) {
            flow.switch_clause = Some(FlowSwitchClauseData {
                switch_statement,
                clause_start,
                clause_end,
            });
        }
        id
    }

    pub fn reduce_label_flow(
        &mut self,
        target: FlowNodeId,
        antecedents: Vec<FlowNodeId>,
        antecedent: FlowNodeId,
    ) -> FlowNodeId {
        let id = self.linear_flow(flow_flags::REDUCE_LABEL, NodeIndex::NONE, antecedent);
        if let Some(flow) = self.flow_nodes.get_mut(id) {
            flow.reduce_label = Some(FlowReduceLabelData {
                target,
                antecedents,
            });
        }
        id
    }

    pub fn branch_label(&mut self) -> FlowNodeId {
        self.flow_nodes.alloc(flow_flags::BRANCH_LABEL)
    }

    pub fn loop_label(&mut self) -> FlowNodeId {
        self.flow_nodes.alloc(flow_flags::LOOP_LABEL)
    }

    pub fn add_antecedent(&mut self, label: FlowNodeId, antecedent: FlowNodeId) {
        trace!(label = label.0, antecedent = antecedent.0, "add_antecedent");
        self.flow_nodes.add_antecedent(label, antecedent);
    }

    /// Label joining `antecedents`, in order.
    pub fn join(&mut self, antecedents: &[FlowNodeId]) -> FlowNodeId {
        let label = self.branch_label();
        for &antecedent in antecedents {
            self.add_antecedent(label, antecedent);
        }
        label
    }
}
