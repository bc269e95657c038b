use std::rc::Rc;
use tyflow_binder::{BinaryOperator, BinderState, FlowNodeId, NodeIndex, SymbolId, symbol_flags};
use tyflow_checker::{ExpressionTypeTable, FlowAnalyzer};
use tyflow_common::Interner;
use tyflow_common::options::CheckerOptions;
use tyflow_solver::{PropertyInfo, RelationChecker, TypeId, TypeInterner};

struct Fixture {
    b: BinderState,
    interner: TypeInterner,
    host: ExpressionTypeTable,
    start: FlowNodeId,
}

impl Fixture {
    fn new() -> Self {
        let atoms = Rc::new(Interner::new());
        let mut b = BinderState::new(atoms.clone());
        let file = b.source_file();
        let start = b.start_flow(file);
        Fixture {
            b,
            interner: TypeInterner::with_atoms(atoms),
            host: ExpressionTypeTable::new(),
            start,
        }
    }

    fn parameter(&mut self, name: &str, declared: TypeId) -> SymbolId {
        let symbol = self.b.declare_symbol(name, symbol_flags::PARAMETER);
        self.host.set_declared_type(symbol, declared);
        symbol
    }

    fn case(&mut self, text: &str) -> NodeIndex {
        let literal = self.b.string_literal(text);
        let literal_type = self.interner.literal_string(text);
        self.host.set_expression_type(literal, literal_type);
        self.b.case_clause(literal)
    }

    /// Reads of `symbol` at the clause flows `[start, end)` of `switch`.
    fn reads(&mut self, symbol: SymbolId, switch: NodeIndex, ranges: &[(u32, u32)]) -> Vec<NodeIndex> {
        ranges
            .iter()
            .map(|&(start, end)| {
                let flow = self.b.switch_clause_flow(switch, start, end, self.start);
                let read = self.b.identifier(symbol);
                self.b.set_flow_node(read, flow);
                read
            })
            .collect()
    }

    fn types_of(&self, reads: &[NodeIndex]) -> Vec<TypeId> {
        let relation = RelationChecker::new(&self.interner, CheckerOptions::strict());
        let analyzer = FlowAnalyzer::new(&self.b, &self.interner, &relation, &self.host);
        reads
            .iter()
            .map(|&read| analyzer.flow_type_of_reference(read))
            .collect()
    }
}

#[test]
fn test_switch_on_reference_narrows_each_clause() {
    // switch (x) { case "a": case "b": default: }
    let mut fx = Fixture::new();
    let a = fx.interner.literal_string("a");
    let b = fx.interner.literal_string("b");
    let c = fx.interner.literal_string("c");
    let declared = fx.interner.union3(a, b, c);
    let x = fx.parameter("x", declared);

    let operand = fx.b.identifier(x);
    let case_a = fx.case("a");
    let case_b = fx.case("b");
    let default = fx.b.default_clause();
    let switch = fx.b.switch_statement(operand, vec![case_a, case_b, default]);

    let reads = fx.reads(x, switch, &[(0, 1), (1, 2), (0, 2), (2, 3)]);
    assert_eq!(
        fx.types_of(&reads),
        vec![a, b, fx.interner.union2(a, b), c]
    );
}

#[test]
fn test_switch_on_typeof() {
    // switch (typeof x) { case "string": case "number": default: }
    let mut fx = Fixture::new();
    let declared = fx
        .interner
        .union3(TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN);
    let x = fx.parameter("x", declared);

    let operand = fx.b.identifier(x);
    let type_of = fx.b.type_of(operand);
    let case_string = fx.case("string");
    let case_number = fx.case("number");
    let default = fx.b.default_clause();
    let switch = fx
        .b
        .switch_statement(type_of, vec![case_string, case_number, default]);

    let reads = fx.reads(x, switch, &[(0, 1), (1, 2), (2, 3)]);
    assert_eq!(
        fx.types_of(&reads),
        vec![TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN]
    );
}

#[test]
fn test_switch_on_true_uses_case_conditions() {
    // switch (true) { case typeof x === "string": default: }
    let mut fx = Fixture::new();
    let declared = fx.interner.union2(TypeId::STRING, TypeId::NUMBER);
    let x = fx.parameter("x", declared);

    let operand = fx.b.identifier(x);
    let type_of = fx.b.type_of(operand);
    let tag = fx.b.string_literal("string");
    let condition = fx.b.binary(type_of, BinaryOperator::EqualsEqualsEquals, tag);
    let case = fx.b.case_clause(condition);
    let default = fx.b.default_clause();
    let discriminant = fx.b.true_keyword();
    let switch = fx.b.switch_statement(discriminant, vec![case, default]);

    let reads = fx.reads(x, switch, &[(0, 1), (1, 2)]);
    assert_eq!(fx.types_of(&reads), vec![TypeId::STRING, TypeId::NUMBER]);
}

#[test]
fn test_switch_on_discriminant_property() {
    // switch (s.kind) { case "a": case "b": }
    let mut fx = Fixture::new();
    let kind = fx.interner.intern_string("kind");
    let shape_a = fx
        .interner
        .object(vec![PropertyInfo::new(kind, fx.interner.literal_string("a"))]);
    let shape_b = fx
        .interner
        .object(vec![PropertyInfo::new(kind, fx.interner.literal_string("b"))]);
    let declared = fx.interner.union2(shape_a, shape_b);
    let s = fx.parameter("s", declared);

    let base = fx.b.identifier(s);
    let access = fx.b.property_access(base, "kind");
    let case_a = fx.case("a");
    let case_b = fx.case("b");
    let switch = fx.b.switch_statement(access, vec![case_a, case_b]);

    let reads = fx.reads(s, switch, &[(0, 1), (1, 2)]);
    assert_eq!(fx.types_of(&reads), vec![shape_a, shape_b]);
}

#[test]
fn test_exhaustive_switch_bypass_is_unreachable() {
    // switch (x) { case "a": case "b": } with x: "a" | "b"
    let mut fx = Fixture::new();
    let a = fx.interner.literal_string("a");
    let b = fx.interner.literal_string("b");
    let declared = fx.interner.union2(a, b);
    let x = fx.parameter("x", declared);

    let operand = fx.b.identifier(x);
    fx.host.set_expression_type(operand, declared);
    let case_a = fx.case("a");
    let case_b = fx.case("b");
    let switch = fx.b.switch_statement(operand, vec![case_a, case_b]);
    let bypass = fx.b.switch_clause_flow(switch, 2, 2, fx.start);
    let read = fx.b.identifier(x);
    fx.b.set_flow_node(read, bypass);

    let relation = RelationChecker::new(&fx.interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&fx.b, &fx.interner, &relation, &fx.host);
    assert!(!analyzer.is_reachable_flow_node(bypass));
    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::NEVER);
}

#[test]
fn test_non_exhaustive_switch_bypass_is_reachable() {
    let mut fx = Fixture::new();
    let a = fx.interner.literal_string("a");
    let b = fx.interner.literal_string("b");
    let declared = fx.interner.union2(a, b);
    let x = fx.parameter("x", declared);

    let operand = fx.b.identifier(x);
    fx.host.set_expression_type(operand, declared);
    let case_a = fx.case("a");
    let switch = fx.b.switch_statement(operand, vec![case_a]);
    let bypass = fx.b.switch_clause_flow(switch, 1, 1, fx.start);
    let read = fx.b.identifier(x);
    fx.b.set_flow_node(read, bypass);

    let relation = RelationChecker::new(&fx.interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&fx.b, &fx.interner, &relation, &fx.host);
    assert!(analyzer.is_reachable_flow_node(bypass));
    assert_eq!(analyzer.flow_type_of_reference(read), b);
}

#[test]
fn test_exhaustive_typeof_switch() {
    // switch (typeof x) { case "string": case "number": } with x: string | number
    let mut fx = Fixture::new();
    let declared = fx.interner.union2(TypeId::STRING, TypeId::NUMBER);
    let x = fx.parameter("x", declared);

    let operand = fx.b.identifier(x);
    fx.host.set_expression_type(operand, declared);
    let type_of = fx.b.type_of(operand);
    let case_string = fx.case("string");
    let case_number = fx.case("number");
    let switch = fx.b.switch_statement(type_of, vec![case_string, case_number]);
    let bypass = fx.b.switch_clause_flow(switch, 2, 2, fx.start);

    let relation = RelationChecker::new(&fx.interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&fx.b, &fx.interner, &relation, &fx.host);
    assert!(!analyzer.is_reachable_flow_node(bypass));
    // Cached answer.
    assert!(!analyzer.is_reachable_flow_node(bypass));
}
