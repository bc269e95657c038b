use std::rc::Rc;
use tyflow_binder::{
    AssignmentKind, BinaryOperator, BinderState, FunctionKind, NodeIndex, NodeKind,
    assignment_target_kind, flow_flags, symbol_flags,
};
use tyflow_common::Interner;

fn binder() -> BinderState {
    BinderState::new(Rc::new(Interner::new()))
}

#[test]
fn test_linear_nodes_mark_shared_on_second_consumer() {
    let mut b = binder();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let cond = b.identifier(x);
    let when_true = b.condition_flow(cond, start, true);
    let when_false = b.condition_flow(cond, start, false);

    let start_node = b.flow_nodes.get(start).expect("start exists");
    assert!(start_node.has_any_flags(flow_flags::REFERENCED));
    assert!(start_node.has_any_flags(flow_flags::SHARED));

    let t = b.flow_nodes.get(when_true).expect("true branch exists");
    assert!(t.has_any_flags(flow_flags::TRUE_CONDITION));
    assert_eq!(t.first_antecedent(), Some(start));
    let f = b.flow_nodes.get(when_false).expect("false branch exists");
    assert!(f.has_any_flags(flow_flags::FALSE_CONDITION));
}

#[test]
fn test_labels_skip_unreachable_and_duplicate_antecedents() {
    let mut b = binder();
    let file = b.source_file();
    let start = b.start_flow(file);
    let label = b.branch_label();
    let unreachable = b.unreachable_flow;
    b.add_antecedent(label, start);
    b.add_antecedent(label, start);
    b.add_antecedent(label, unreachable);

    let node = b.flow_nodes.get(label).expect("label exists");
    assert_eq!(node.antecedent.as_slice(), &[start]);
    let start_node = b.flow_nodes.get(start).expect("start exists");
    assert!(!start_node.has_any_flags(flow_flags::SHARED));
}

#[test]
fn test_loop_label_keeps_entry_edge_first() {
    let mut b = binder();
    let file = b.source_file();
    let start = b.start_flow(file);
    let loop_label = b.loop_label();
    b.add_antecedent(loop_label, start);
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let one = b.numeric_literal(1.0);
    let target = b.identifier(x);
    let assign = b.binary(target, BinaryOperator::Assign, one);
    let body = b.assignment_flow(assign, loop_label);
    b.add_antecedent(loop_label, body);

    let node = b.flow_nodes.get(loop_label).expect("loop exists");
    assert_eq!(node.antecedent.as_slice(), &[start, body]);
}

#[test]
fn test_nodes_record_parents_and_declarations() {
    let mut b = binder();
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE | symbol_flags::CONST);
    let init = b.string_literal("a");
    let decl = b.variable_declaration(x, init);
    assert_eq!(b.arena.parent(init), decl);
    assert_eq!(
        b.symbols.get(x).map(|s| s.value_declaration),
        Some(decl)
    );
    assert!(b.is_constant_variable(x));

    let body = b.block();
    let func = b.function_like(FunctionKind::Arrow, body);
    assert_eq!(b.arena.parent(body), func);
    assert!(matches!(
        b.arena.kind(func),
        Some(NodeKind::FunctionLike {
            kind: FunctionKind::Arrow,
            ..
        })
    ));
}

#[test]
fn test_optional_chain_queries() {
    let mut b = binder();
    let a = b.declare_symbol("a", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let a_ref = b.identifier(a);
    let root = b.optional_property_access(a_ref, "b");
    let tail = b.property_access(root, "c");
    assert!(b.arena.is_optional_chain_root(root));
    assert!(b.arena.is_optional_chain(tail));
    assert!(!b.arena.is_optional_chain_root(tail));

    let paren = b.parenthesized(root);
    let after_paren = b.property_access(paren, "d");
    assert!(!b.arena.is_optional_chain(after_paren));
    assert_eq!(b.arena.skip_parentheses(paren), root);
}

#[test]
fn test_switch_clause_payload() {
    let mut b = binder();
    let file = b.source_file();
    let start = b.start_flow(file);
    let x = b.declare_symbol("x", symbol_flags::PARAMETER);
    let discriminant = b.identifier(x);
    let one = b.numeric_literal(1.0);
    let case_one = b.case_clause(one);
    let default = b.default_clause();
    let switch = b.switch_statement(discriminant, vec![case_one, default]);
    let clause = b.switch_clause_flow(switch, 0, 1, start);

    let data = b
        .flow_nodes
        .get(clause)
        .and_then(|node| node.switch_clause)
        .expect("switch clause payload");
    assert_eq!(data.switch_statement, switch);
    assert_eq!((data.clause_start, data.clause_end), (0, 1));
}

#[test]
fn test_destructuring_targets_are_definite_assignments() {
    // [a, { p: c }] = v; b += 1
    let mut b = binder();
    let a = b.declare_symbol("a", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let c = b.declare_symbol("c", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let a_target = b.identifier(a);
    let c_target = b.identifier(c);
    let p = b.property_assignment("p", c_target);
    let object = b.object_literal(vec![p]);
    let array = b.array_literal(vec![a_target, object]);
    let value = b.identifier(a);
    let _assign = b.binary(array, BinaryOperator::Assign, value);
    assert_eq!(assignment_target_kind(&b.arena, a_target), AssignmentKind::Definite);
    assert_eq!(assignment_target_kind(&b.arena, c_target), AssignmentKind::Definite);
    assert_eq!(assignment_target_kind(&b.arena, value), AssignmentKind::None);

    let counter = b.declare_symbol("b", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let target = b.identifier(counter);
    let one = b.numeric_literal(1.0);
    let _compound = b.binary(target, BinaryOperator::PlusAssign, one);
    assert_eq!(assignment_target_kind(&b.arena, target), AssignmentKind::Compound);
}

#[test]
fn test_last_assignment_position() {
    // let x = 1; x; x = 2; x
    let mut b = binder();
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let one = b.numeric_literal(1.0);
    let _decl = b.variable_declaration(x, one);
    let before = b.identifier(x);
    let target = b.identifier(x);
    let two = b.numeric_literal(2.0);
    let _assign = b.binary(target, BinaryOperator::Assign, two);
    let after = b.identifier(x);

    assert!(b.is_symbol_assigned(x));
    assert!(!b.is_constant_variable(x));
    assert!(!b.is_past_last_assignment(x, before));
    assert!(b.is_past_last_assignment(x, after));

    let y = b.declare_symbol("y", symbol_flags::PARAMETER);
    let read = b.identifier(y);
    assert!(!b.is_symbol_assigned(y));
    assert!(b.is_past_last_assignment(y, read));
    b.mark_assigned(y);
    assert!(!b.is_past_last_assignment(y, read));
}

#[test]
fn test_assignment_in_nested_function_is_never_past() {
    // let x; const f = () => { x = 1 }; x
    let mut b = binder();
    let x = b.declare_symbol("x", symbol_flags::BLOCK_SCOPED_VARIABLE);
    let _decl = b.variable_declaration(x, NodeIndex::NONE);
    let target = b.identifier(x);
    let one = b.numeric_literal(1.0);
    let assign = b.binary(target, BinaryOperator::Assign, one);
    let body = b.block_of(vec![assign]);
    let arrow = b.function_like(FunctionKind::Arrow, body);
    let read = b.identifier(x);

    assert_eq!(b.arena.container_of(target), arrow);
    assert_eq!(b.assignment_marks().last_assignment(x), Some(u32::MAX));
    assert!(!b.is_past_last_assignment(x, read));
}

#[test]
fn test_binding_elements_record_declarations() {
    let mut b = binder();
    let a = b.declare_symbol("a", symbol_flags::BLOCK_SCOPED_VARIABLE | symbol_flags::CONST);
    let name = b.identifier(a);
    let element = b.binding_element(None, name, NodeIndex::NONE);
    let pattern = b.object_binding_pattern(vec![element]);
    let init = b.null_keyword();
    let decl = b.destructuring_declaration(pattern, init);

    assert_eq!(b.symbols.get(a).map(|s| s.value_declaration), Some(element));
    assert_eq!(b.arena.parent(pattern), decl);
    match b.arena.kind(element) {
        Some(NodeKind::BindingElement { property_name, .. }) => {
            assert_eq!(&*b.atoms.resolve(*property_name), "a");
        }
        other => panic!("expected binding element, got {other:?}"),
    }
}
