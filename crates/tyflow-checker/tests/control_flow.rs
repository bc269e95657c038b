use std::rc::Rc;
use tyflow_binder::{BinaryOperator, BinderState, FunctionKind, NodeIndex, NodeKind, symbol_flags};
use tyflow_checker::{ExpressionTypeTable, FlowAnalyzer};
use tyflow_common::diagnostics::diagnostic_codes;
use tyflow_common::limits::MAX_FLOW_DEPTH;
use tyflow_common::options::CheckerOptions;
use tyflow_common::Interner;
use tyflow_solver::{
    FunctionShape, PropertyInfo, RelationChecker, TupleElement, TypeId, TypeInterner,
};

fn session() -> (BinderState, TypeInterner) {
    // RUST_LOG=tyflow_checker=trace shows the walk.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let atoms = Rc::new(Interner::new());
    (BinderState::new(atoms.clone()), TypeInterner::with_atoms(atoms))
}

#[test]
fn test_assignment_then_typeof_false_branch() {
    // x = 1; if (typeof x === "string") {} else { x }
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    b.mark_assigned(x);

    let target = b.identifier(x);
    let one = b.numeric_literal(1.0);
    let assign = b.binary(target, BinaryOperator::Assign, one);
    let after_assign = b.assignment_flow(assign, start);

    let operand = b.identifier(x);
    let type_of = b.type_of(operand);
    let tag = b.string_literal("string");
    let condition = b.binary(type_of, BinaryOperator::EqualsEqualsEquals, tag);
    let else_branch = b.condition_flow(condition, after_assign, false);
    let read = b.identifier(x);
    b.set_flow_node(read, else_branch);

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, interner.union2(TypeId::STRING, TypeId::NUMBER));
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::NUMBER);
    // Repeated queries answer the same.
    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::NUMBER);
    assert!(analyzer.diagnostics().is_empty());
}

#[test]
fn test_evolving_array_from_pushes() {
    // let a = []; a.push(1); a.push("s"); a
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let a = b.declare_symbol("a", symbol_flags::BLOCK_SCOPED_VARIABLE);

    let empty = b.array_literal(Vec::new());
    let decl = b.variable_declaration(a, empty);
    let mut flow = b.assignment_flow(decl, start);

    let one = b.numeric_literal(1.0);
    let s = b.string_literal("s");
    for value in [one, s] {
        let receiver = b.identifier(a);
        let push = b.property_access(receiver, "push");
        let call = b.call(push, vec![value]);
        flow = b.array_mutation_flow(call, flow);
    }
    let read = b.identifier(a);
    b.set_flow_node(read, flow);

    // `a.length` keeps reading the evolving array.
    let receiver = b.identifier(a);
    let _length = b.property_access(receiver, "length");
    b.set_flow_node(receiver, flow);

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(a, TypeId::AUTO);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(
        analyzer.flow_type_of_reference(read),
        interner.array(interner.union2(TypeId::NUMBER, TypeId::STRING))
    );
    assert_eq!(analyzer.flow_type_of_reference(receiver), TypeId::AUTO_ARRAY);
}

#[test]
fn test_empty_array_without_mutations_is_auto_array() {
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let a = b.declare_symbol("a", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let empty = b.array_literal(Vec::new());
    let decl = b.variable_declaration(a, empty);
    let flow = b.assignment_flow(decl, start);
    let read = b.identifier(a);
    b.set_flow_node(read, flow);

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(a, TypeId::AUTO);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::AUTO_ARRAY);
}

#[test]
fn test_unassignable_write_to_auto_array_is_any_array() {
    // let a = []; a = 1; a
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let a = b.declare_symbol("a", symbol_flags::BLOCK_SCOPED_VARIABLE);
    b.mark_assigned(a);
    let target = b.identifier(a);
    let one = b.numeric_literal(1.0);
    let assign = b.binary(target, BinaryOperator::Assign, one);
    let flow = b.assignment_flow(assign, start);
    let read = b.identifier(a);
    b.set_flow_node(read, flow);

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(a, TypeId::AUTO_ARRAY);
    host.set_expression_type(one, TypeId::NUMBER);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    let result = analyzer.flow_type_of_reference(read);
    assert_eq!(result, interner.array(TypeId::ANY));
    assert_ne!(result, TypeId::AUTO_ARRAY);
}

#[test]
fn test_loop_converges_to_union_of_assigned_literals() {
    // x = 1; while (c) { if (d) x = 2; else x = 3; } x
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    b.mark_assigned(x);
    let c = b.declare_symbol("c", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let d = b.declare_symbol("d", symbol_flags::BLOCK_SCOPED_VARIABLE);

    let lit1 = interner.literal_number(1.0);
    let lit2 = interner.literal_number(2.0);
    let lit3 = interner.literal_number(3.0);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, interner.union(vec![lit1, lit2, lit3, TypeId::STRING]));

    let mut assign_x = |b: &mut BinderState, value: f64, ty: TypeId, antecedent| {
        let target = b.identifier(x);
        let literal = b.numeric_literal(value);
        host.set_expression_type(literal, ty);
        let assign = b.binary(target, BinaryOperator::Assign, literal);
        b.assignment_flow(assign, antecedent)
    };

    let entry = assign_x(&mut b, 1.0, lit1, start);
    let loop_label = b.loop_label();
    b.add_antecedent(loop_label, entry);
    let c_cond = b.identifier(c);
    let body = b.condition_flow(c_cond, loop_label, true);
    let d_cond = b.identifier(d);
    let then_branch = b.condition_flow(d_cond, body, true);
    let else_branch = b.condition_flow(d_cond, body, false);
    let then_assign = assign_x(&mut b, 2.0, lit2, then_branch);
    let else_assign = assign_x(&mut b, 3.0, lit3, else_branch);
    let body_end = b.join(&[then_assign, else_assign]);
    b.add_antecedent(loop_label, body_end);
    let exit = b.condition_flow(c_cond, loop_label, false);

    let read = b.identifier(x);
    b.set_flow_node(read, exit);

    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    let expected = interner.union(vec![lit1, lit2, lit3]);
    assert_eq!(analyzer.flow_type_of_reference(read), expected);
    // Second query is served from the loop cache.
    assert_eq!(analyzer.flow_type_of_reference(read), expected);
}

#[test]
fn test_depth_bound_reports_once_and_latches() {
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let condition = b.identifier(x);

    let mut flow = start;
    for _ in 0..(MAX_FLOW_DEPTH + 100) {
        flow = b.condition_flow(condition, flow, true);
    }
    let read = b.identifier(x);
    b.set_flow_node(read, flow);
    let shallow = b.identifier(x);
    b.set_flow_node(shallow, start);

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, interner.union2(TypeId::STRING, TypeId::UNDEFINED));
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host).with_file_name("big.ts");

    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::ERROR);
    assert!(analyzer.is_flow_analysis_disabled());

    let diagnostics = analyzer.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].code,
        diagnostic_codes::THE_CONTAINING_FUNCTION_OR_MODULE_BODY_IS_TOO_LARGE_FOR_CONTROL_FLOW_ANALYSIS
    );
    assert_eq!(diagnostics[0].file, "big.ts");

    // The latch stays set for the rest of the session.
    assert_eq!(analyzer.flow_type_of_reference(shallow), TypeId::ERROR);
    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::ERROR);
    assert_eq!(analyzer.diagnostics().len(), 1);
}

#[test]
fn test_captured_reference_continues_in_enclosing_graph() {
    // function f(x: string | number) {
    //     if (typeof x === "string") { const g = () => x; }
    // }
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::PARAMETER);

    let operand = b.identifier(x);
    let type_of = b.type_of(operand);
    let tag = b.string_literal("string");
    let condition = b.binary(type_of, BinaryOperator::EqualsEqualsEquals, tag);
    let then_branch = b.condition_flow(condition, start, true);

    let body = b.block();
    let arrow = b.function_like(FunctionKind::Arrow, body);
    b.set_flow_node(arrow, then_branch);
    let inner_start = b.start_flow(arrow);
    let read = b.identifier(x);
    b.set_flow_node(read, inner_start);

    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, declared);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::STRING);
    // With the arrow as flow container the walk stops at its start.
    assert_eq!(
        analyzer.narrowed_type(read, declared, None, Some(arrow), None),
        declared
    );
}

#[test]
fn test_const_alias_condition_is_inlined() {
    // const isString = typeof x === "string"; if (isString) { x }
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::PARAMETER);
    let is_string = b.declare_symbol(
        "isString",
        symbol_flags::BLOCK_SCOPED_VARIABLE | symbol_flags::CONST,
    );

    let operand = b.identifier(x);
    let type_of = b.type_of(operand);
    let tag = b.string_literal("string");
    let test = b.binary(type_of, BinaryOperator::EqualsEqualsEquals, tag);
    let decl = b.variable_declaration(is_string, test);
    let after_decl = b.assignment_flow(decl, start);

    let alias = b.identifier(is_string);
    let then_branch = b.condition_flow(alias, after_decl, true);
    let else_branch = b.condition_flow(alias, after_decl, false);
    let in_then = b.identifier(x);
    b.set_flow_node(in_then, then_branch);
    let in_else = b.identifier(x);
    b.set_flow_node(in_else, else_branch);

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, interner.union2(TypeId::STRING, TypeId::NUMBER));
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(in_then), TypeId::STRING);
    assert_eq!(analyzer.flow_type_of_reference(in_else), TypeId::NUMBER);
}

#[test]
fn test_assignment_after_never_call_keeps_declared_type() {
    // fail(); x = 1; x
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let fail = b.declare_symbol("fail", symbol_flags::FUNCTION);

    let callee = b.identifier(fail);
    let call = b.call(callee, Vec::new());
    let after_call = b.call_flow(call, start);
    let target = b.identifier(x);
    let one = b.numeric_literal(1.0);
    let assign = b.binary(target, BinaryOperator::Assign, one);
    let after_assign = b.assignment_flow(assign, after_call);
    let read = b.identifier(x);
    b.set_flow_node(read, after_assign);

    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, declared);
    host.set_effects_signature(call, FunctionShape::new(Vec::new(), TypeId::NEVER));
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert!(!analyzer.is_reachable_flow_node(after_assign));
    assert_eq!(analyzer.flow_type_of_reference(read), declared);
}

#[test]
fn test_reference_without_flow_node_keeps_declared_type() {
    let (mut b, interner) = session();
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let read = b.identifier(x);

    let declared = interner.union2(TypeId::STRING, TypeId::NULL);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, declared);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read), declared);
}

#[test]
fn test_closure_before_last_assignment_sees_declared_type() {
    // function f(x: string | number) {
    //     if (typeof x === "string") { const g = () => x; }
    //     x = 1;
    // }
    let (mut b, interner) = session();
    let x = b.declare_symbol("x", symbol_flags::PARAMETER);
    let param = b.parameter(x, NodeIndex::NONE);

    let read = b.identifier(x);
    let arrow_body = b.block_of(vec![read]);
    let arrow = b.function_like(FunctionKind::Arrow, arrow_body);
    let target = b.identifier(x);
    let one = b.numeric_literal(1.0);
    let assign = b.binary(target, BinaryOperator::Assign, one);
    let operand = b.identifier(x);
    let type_of = b.type_of(operand);
    let tag = b.string_literal("string");
    let condition = b.binary(type_of, BinaryOperator::EqualsEqualsEquals, tag);
    let body = b.block_of(vec![condition, arrow, assign]);
    let function = b.function_with_parameters(FunctionKind::Declaration, vec![param], body);

    let start = b.start_flow(function);
    let then_branch = b.condition_flow(condition, start, true);
    b.set_flow_node(arrow, then_branch);
    let inner_start = b.start_flow(arrow);
    b.set_flow_node(read, inner_start);
    assert!(!b.is_past_last_assignment(x, read));

    let declared = interner.union2(TypeId::STRING, TypeId::NUMBER);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, declared);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read), declared);
}

#[test]
fn test_closure_after_last_assignment_keeps_narrowing() {
    // function f(x: string | number) {
    //     x = 1;
    //     const g = () => x;
    // }
    let (mut b, interner) = session();
    let x = b.declare_symbol("x", symbol_flags::PARAMETER);
    let param = b.parameter(x, NodeIndex::NONE);

    let target = b.identifier(x);
    let one = b.numeric_literal(1.0);
    let assign = b.binary(target, BinaryOperator::Assign, one);
    let read = b.identifier(x);
    let arrow_body = b.block_of(vec![read]);
    let arrow = b.function_like(FunctionKind::Arrow, arrow_body);
    let body = b.block_of(vec![assign, arrow]);
    let function = b.function_with_parameters(FunctionKind::Declaration, vec![param], body);

    let start = b.start_flow(function);
    let after_assign = b.assignment_flow(assign, start);
    b.set_flow_node(arrow, after_assign);
    let inner_start = b.start_flow(arrow);
    b.set_flow_node(read, inner_start);
    assert!(b.is_past_last_assignment(x, read));

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(x, interner.union2(TypeId::STRING, TypeId::NUMBER));
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::NUMBER);
}

#[test]
fn test_array_destructuring_assignment() {
    // [a, ...rest] = t   where t: [number, string]
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let a = b.declare_symbol("a", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let rest = b.declare_symbol("rest", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let t = b.declare_symbol("t", symbol_flags::PARAMETER);

    let target_a = b.identifier(a);
    let target_rest = b.identifier(rest);
    let spread = b.spread_element(target_rest);
    let pattern = b.array_literal(vec![target_a, spread]);
    let source = b.identifier(t);
    b.binary(pattern, BinaryOperator::Assign, source);
    let after_a = b.assignment_flow(target_a, start);
    let after_rest = b.assignment_flow(target_rest, after_a);
    let read_a = b.identifier(a);
    b.set_flow_node(read_a, after_rest);
    let read_rest = b.identifier(rest);
    b.set_flow_node(read_rest, after_rest);

    let tuple = interner.tuple(vec![
        TupleElement::required(TypeId::NUMBER),
        TupleElement::required(TypeId::STRING),
    ]);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(a, interner.union(vec![TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN]));
    host.set_declared_type(rest, TypeId::AUTO);
    host.set_expression_type(source, tuple);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read_a), TypeId::NUMBER);
    assert_eq!(
        analyzer.flow_type_of_reference(read_rest),
        interner.array(interner.union2(TypeId::NUMBER, TypeId::STRING))
    );
}

#[test]
fn test_object_destructuring_assignment_with_default() {
    // ({ width: w = 0, label } = options)   where options: { width?: number; label: string }
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let w = b.declare_symbol("w", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let label = b.declare_symbol("label", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let options = b.declare_symbol("options", symbol_flags::PARAMETER);

    let target_w = b.identifier(w);
    let zero = b.numeric_literal(0.0);
    let with_default = b.binary(target_w, BinaryOperator::Assign, zero);
    let width = b.property_assignment("width", with_default);
    let shorthand = b.shorthand_property_assignment(label, NodeIndex::NONE);
    let target_label = match b.arena.kind(shorthand) {
        Some(NodeKind::ShorthandPropertyAssignment { name, .. }) => *name,
        other => panic!("unexpected node {other:?}"),
    };
    let pattern = b.object_literal(vec![width, shorthand]);
    let source = b.identifier(options);
    b.binary(pattern, BinaryOperator::Assign, source);
    let after_w = b.assignment_flow(target_w, start);
    let after_label = b.assignment_flow(target_label, after_w);
    let read_w = b.identifier(w);
    b.set_flow_node(read_w, after_label);
    let read_label = b.identifier(label);
    b.set_flow_node(read_label, after_label);

    let options_type = interner.object(vec![
        PropertyInfo::opt(interner.intern_string("width"), TypeId::NUMBER),
        PropertyInfo::new(interner.intern_string("label"), TypeId::STRING),
    ]);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(w, interner.union2(TypeId::NUMBER, TypeId::UNDEFINED));
    host.set_declared_type(label, interner.union2(TypeId::STRING, TypeId::UNDEFINED));
    host.set_expression_type(source, options_type);
    host.set_expression_type(zero, TypeId::NUMBER);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read_w), TypeId::NUMBER);
    assert_eq!(analyzer.flow_type_of_reference(read_label), TypeId::STRING);
}

#[test]
fn test_binding_element_initial_type() {
    // let [first, second = "none"] = pair;   pair: [number, string | undefined]
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let first = b.declare_symbol("first", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let second = b.declare_symbol("second", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let pair = b.declare_symbol("pair", symbol_flags::PARAMETER);

    let first_name = b.identifier(first);
    let first_element = b.binding_element(None, first_name, NodeIndex::NONE);
    let second_name = b.identifier(second);
    let fallback = b.string_literal("none");
    let second_element = b.binding_element(None, second_name, fallback);
    let pattern = b.array_binding_pattern(vec![first_element, second_element]);
    let source = b.identifier(pair);
    b.destructuring_declaration(pattern, source);
    let after_first = b.assignment_flow(first_element, start);
    let after_second = b.assignment_flow(second_element, after_first);
    let read_first = b.identifier(first);
    b.set_flow_node(read_first, after_second);
    let read_second = b.identifier(second);
    b.set_flow_node(read_second, after_second);

    let pair_type = interner.tuple(vec![
        TupleElement::required(TypeId::NUMBER),
        TupleElement::required(interner.union2(TypeId::STRING, TypeId::UNDEFINED)),
    ]);
    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(first, interner.union2(TypeId::NUMBER, TypeId::UNDEFINED));
    host.set_declared_type(second, interner.union2(TypeId::STRING, TypeId::UNDEFINED));
    host.set_expression_type(source, pair_type);
    host.set_expression_type(fallback, TypeId::STRING);
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read_first), TypeId::NUMBER);
    assert_eq!(analyzer.flow_type_of_reference(read_second), TypeId::STRING);
}

#[test]
fn test_for_of_variable_takes_element_type() {
    // for (const item of items) item   items: string[]
    let (mut b, interner) = session();
    let file = b.source_file();
    let start = b.start_flow(file);
    let item = b.declare_symbol("item", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let items = b.declare_symbol("items", symbol_flags::PARAMETER);

    let decl = b.variable_declaration(item, NodeIndex::NONE);
    let iterable = b.identifier(items);
    b.for_of_statement(decl, iterable);
    let after_decl = b.assignment_flow(decl, start);
    let read = b.identifier(item);
    b.set_flow_node(read, after_decl);

    let mut host = ExpressionTypeTable::new();
    host.set_declared_type(item, TypeId::AUTO);
    host.set_expression_type(iterable, interner.array(TypeId::STRING));
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_of_reference(read), TypeId::STRING);
}

#[test]
fn test_property_type_from_constructor_assignments() {
    // class C { value; items; missing; constructor() { this.value = 1; this.items = []; } }
    let (mut b, interner) = session();
    let class = b.declare_symbol("C", symbol_flags::CLASS);
    let value = b.declare_member(class, "value", 0);
    let items = b.declare_member(class, "items", 0);
    let missing = b.declare_member(class, "missing", 0);
    b.property_declaration(value);
    let items_decl = b.property_declaration(items);
    b.property_declaration(missing);

    let body = b.block();
    let constructor = b.function_like(FunctionKind::Constructor, body);
    let start = b.start_flow(constructor);
    let this = b.this_keyword();
    let target = b.property_access(this, "value");
    let one = b.numeric_literal(1.0);
    let assign_value = b.binary(target, BinaryOperator::Assign, one);
    let after_value = b.assignment_flow(assign_value, start);
    let this = b.this_keyword();
    let target = b.property_access(this, "items");
    let empty = b.array_literal(vec![]);
    let assign_items = b.binary(target, BinaryOperator::Assign, empty);
    let after_items = b.assignment_flow(assign_items, after_value);
    b.set_return_flow(constructor, after_items);

    let host = ExpressionTypeTable::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host).with_file_name("c.ts");

    assert_eq!(analyzer.flow_type_in_constructor(value, constructor), Some(TypeId::NUMBER));
    assert_eq!(analyzer.flow_type_in_constructor(missing, constructor), None);
    assert!(analyzer.diagnostics().is_empty());

    assert_eq!(
        analyzer.flow_type_in_constructor(items, constructor),
        Some(interner.array(TypeId::ANY))
    );
    let diagnostics = analyzer.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, diagnostic_codes::MEMBER_0_IMPLICITLY_HAS_AN_1_TYPE);
    assert_eq!(diagnostics[0].message_text, "Member 'items' implicitly has an 'any[]' type.");
    assert_eq!(diagnostics[0].start, b.arena.get(items_decl).map_or(0, |node| node.pos));
}

#[test]
fn test_implicit_any_member_is_silent_without_no_implicit_any() {
    let (mut b, interner) = session();
    let class = b.declare_symbol("C", symbol_flags::CLASS);
    let items = b.declare_member(class, "items", 0);
    b.property_declaration(items);
    let body = b.block();
    let constructor = b.function_like(FunctionKind::Constructor, body);
    let start = b.start_flow(constructor);
    let this = b.this_keyword();
    let target = b.property_access(this, "items");
    let empty = b.array_literal(vec![]);
    let assign = b.binary(target, BinaryOperator::Assign, empty);
    let after = b.assignment_flow(assign, start);
    b.set_return_flow(constructor, after);

    let host = ExpressionTypeTable::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::default());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(
        analyzer.flow_type_in_constructor(items, constructor),
        Some(interner.array(TypeId::ANY))
    );
    assert!(analyzer.diagnostics().is_empty());
}

#[test]
fn test_static_property_type_from_first_assigning_block() {
    // class C { static count; static {} static { this.count = 0; } }
    let (mut b, interner) = session();
    let class = b.declare_symbol("C", symbol_flags::CLASS);
    let count = b.declare_member(class, "count", symbol_flags::STATIC);
    b.property_declaration(count);

    let empty_body = b.block();
    let first = b.function_like(FunctionKind::StaticBlock, empty_body);
    let first_start = b.start_flow(first);
    b.set_return_flow(first, first_start);

    let body = b.block();
    let second = b.function_like(FunctionKind::StaticBlock, body);
    let second_start = b.start_flow(second);
    let this = b.this_keyword();
    let target = b.property_access(this, "count");
    let zero = b.numeric_literal(0.0);
    let assign = b.binary(target, BinaryOperator::Assign, zero);
    let after = b.assignment_flow(assign, second_start);
    b.set_return_flow(second, after);

    let host = ExpressionTypeTable::new();
    let relation = RelationChecker::new(&interner, CheckerOptions::strict());
    let analyzer = FlowAnalyzer::new(&b, &interner, &relation, &host);

    assert_eq!(analyzer.flow_type_in_static_blocks(count, &[first]), None);
    assert_eq!(
        analyzer.flow_type_in_static_blocks(count, &[first, second]),
        Some(TypeId::NUMBER)
    );
}
