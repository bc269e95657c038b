use std::rc::Rc;
use tyflow_binder::{BinaryOperator, BinderState, FlowNodeId, NodeIndex, symbol_flags};
use tyflow_checker::{ExpressionTypeTable, FlowAnalyzer};
use tyflow_common::Interner;
use tyflow_common::options::CheckerOptions;
use tyflow_solver::{FunctionShape, RelationChecker, TypeId, TypeInterner, TypePredicate, TypePredicateKind};

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

    /// `fail()` where `fail` returns `never`.
    fn never_call(&mut self, antecedent: FlowNodeId) -> FlowNodeId {
        let fail = self.b.declare_symbol("fail", symbol_flags::FUNCTION);
        let callee = self.b.identifier(fail);
        let call = self.b.call(callee, Vec::new());
        self.host
            .set_effects_signature(call, FunctionShape::new(Vec::new(), TypeId::NEVER));
        self.b.call_flow(call, antecedent)
    }

    /// `assert(argument)` through an `asserts value` signature.
    fn assert_call(&mut self, argument: NodeIndex, antecedent: FlowNodeId) -> FlowNodeId {
        let assert = self.b.declare_symbol("assert", symbol_flags::FUNCTION);
        let callee = self.b.identifier(assert);
        let call = self.b.call(callee, vec![argument]);
        let mut signature = FunctionShape::new(Vec::new(), TypeId::VOID);
        signature.type_predicate = Some(TypePredicate {
            kind: TypePredicateKind::AssertsIdentifier,
            parameter_index: Some(0),
            type_id: None,
        });
        self.host.set_effects_signature(call, signature);
        self.b.call_flow(call, antecedent)
    }

    fn super_call(&mut self, antecedent: FlowNodeId) -> FlowNodeId {
        let callee = self.b.super_keyword();
        let call = self.b.call(callee, Vec::new());
        self.b.call_flow(call, antecedent)
    }

    fn check(&self, check: impl FnOnce(&FlowAnalyzer<'_>)) {
        let relation = RelationChecker::new(&self.interner, CheckerOptions::strict());
        let analyzer = FlowAnalyzer::new(&self.b, &self.interner, &relation, &self.host);
        check(&analyzer);
    }
}

#[test]
fn test_never_returning_call_ends_flow() {
    let mut fx = Fixture::new();
    let after = fx.never_call(fx.start);
    let start = fx.start;
    fx.check(|analyzer| {
        assert!(analyzer.is_reachable_flow_node(start));
        assert!(!analyzer.is_reachable_flow_node(after));
    });
}

#[test]
fn test_assert_false_ends_flow() {
    let mut fx = Fixture::new();
    let x = fx.b.declare_symbol("x", symbol_flags::PARAMETER);

    let literal_false = fx.b.false_keyword();
    let after_false = fx.assert_call(literal_false, fx.start);

    let left = fx.b.false_keyword();
    let right = fx.b.identifier(x);
    let conjunction = fx.b.binary(left, BinaryOperator::AmpersandAmpersand, right);
    let after_conjunction = fx.assert_call(conjunction, fx.start);

    let left = fx.b.false_keyword();
    let right = fx.b.identifier(x);
    let disjunction = fx.b.binary(left, BinaryOperator::BarBar, right);
    let after_disjunction = fx.assert_call(disjunction, fx.start);

    let operand = fx.b.identifier(x);
    let after_value = fx.assert_call(operand, fx.start);

    fx.check(|analyzer| {
        assert!(!analyzer.is_reachable_flow_node(after_false));
        assert!(!analyzer.is_reachable_flow_node(after_conjunction));
        assert!(analyzer.is_reachable_flow_node(after_disjunction));
        assert!(analyzer.is_reachable_flow_node(after_value));
    });
}

#[test]
fn test_branch_reachable_when_any_antecedent_is() {
    let mut fx = Fixture::new();
    let dead = fx.never_call(fx.start);
    let also_dead = fx.never_call(fx.start);
    let one_live = fx.b.join(&[dead, fx.start]);
    let both_dead = fx.b.join(&[dead, also_dead]);
    fx.check(|analyzer| {
        assert!(analyzer.is_reachable_flow_node(one_live));
        assert!(!analyzer.is_reachable_flow_node(both_dead));
        // Shared `dead` answers from the memo on a second query.
        assert!(!analyzer.is_reachable_flow_node(dead));
    });
}

#[test]
fn test_loop_label_follows_entry_edge() {
    let mut fx = Fixture::new();
    let live_loop = fx.b.loop_label();
    fx.b.add_antecedent(live_loop, fx.start);
    let dead = fx.never_call(fx.start);
    let dead_loop = fx.b.loop_label();
    fx.b.add_antecedent(dead_loop, dead);
    let empty_loop = fx.b.loop_label();
    fx.check(|analyzer| {
        assert!(analyzer.is_reachable_flow_node(live_loop));
        assert!(!analyzer.is_reachable_flow_node(dead_loop));
        assert!(!analyzer.is_reachable_flow_node(empty_loop));
    });
}

#[test]
fn test_unreachable_node_and_empty_branch() {
    let mut fx = Fixture::new();
    let unreachable = fx.b.unreachable_flow;
    // Unreachable antecedents are never added to a label.
    let label = fx.b.join(&[unreachable]);
    fx.check(|analyzer| {
        assert!(!analyzer.is_reachable_flow_node(unreachable));
        assert!(!analyzer.is_reachable_flow_node(label));
    });
}

#[test]
fn test_reduce_label_restricts_target_antecedents() {
    // The finally block reached only through the path ending in `fail()`.
    let mut fx = Fixture::new();
    let dead = fx.never_call(fx.start);
    let finally_label = fx.b.join(&[dead, fx.start]);
    let reduced = fx.b.reduce_label_flow(finally_label, vec![dead], finally_label);
    fx.check(|analyzer| {
        assert!(!analyzer.is_reachable_flow_node(reduced));
        assert!(analyzer.is_reachable_flow_node(finally_label));
    });
}

#[test]
fn test_post_super_call() {
    let mut fx = Fixture::new();
    let after_super = fx.super_call(fx.start);
    let partial = fx.b.join(&[after_super, fx.start]);
    let other = fx.super_call(fx.start);
    let complete = fx.b.join(&[after_super, other]);
    let start = fx.start;
    fx.check(|analyzer| {
        assert!(!analyzer.is_post_required_call_flow_node(start));
        assert!(analyzer.is_post_required_call_flow_node(after_super));
        assert!(!analyzer.is_post_required_call_flow_node(partial));
        assert!(analyzer.is_post_required_call_flow_node(complete));
    });
}

#[test]
fn test_host_designated_required_call() {
    let mut fx = Fixture::new();
    let init = fx.b.declare_symbol("init", symbol_flags::FUNCTION);
    let callee = fx.b.identifier(init);
    let call = fx.b.call(callee, Vec::new());
    fx.host.mark_required_call(call);
    let after = fx.b.call_flow(call, fx.start);
    // Paths that end early count as initialized.
    let dead = fx.b.unreachable_flow;
    fx.check(|analyzer| {
        assert!(analyzer.is_post_required_call_flow_node(after));
        assert!(analyzer.is_post_required_call_flow_node(dead));
    });
}
