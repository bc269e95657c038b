//! Control Flow Analysis benchmarks.
//!
//! Flow graphs are built once per case; each iteration runs a fresh
//! `FlowAnalyzer` session so caches do not carry over.

use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tyflow::binder::{BinaryOperator, symbol_flags};
use tyflow::{
    BinderState, CheckerOptions, ExpressionTypeTable, FlowAnalyzer, FlowNodeId, Interner,
    NodeIndex, RelationChecker, SymbolId, TypeId, TypeInterner,
};

struct Case {
    binder: BinderState,
    interner: TypeInterner,
    host: ExpressionTypeTable,
    reads: Vec<NodeIndex>,
}

impl Case {
    fn new() -> (Self, FlowNodeId) {
        let atoms = Rc::new(Interner::new());
        let mut binder = BinderState::new(atoms.clone());
        let file = binder.source_file();
        let start = binder.start_flow(file);
        let case = Case {
            binder,
            interner: TypeInterner::with_atoms(atoms),
            host: ExpressionTypeTable::new(),
            reads: Vec::new(),
        };
        (case, start)
    }

    fn variable(&mut self, name: &str, declared: TypeId) -> SymbolId {
        let symbol = self
            .binder
            .declare_symbol(name, symbol_flags::BLOCK_SCOPED_VARIABLE);
        self.binder.mark_assigned(symbol);
        self.host.set_declared_type(symbol, declared);
        symbol
    }

    /// `target = value` after `antecedent`.
    fn assign(&mut self, target: SymbolId, value: f64, antecedent: FlowNodeId) -> FlowNodeId {
        let left = self.binder.identifier(target);
        let right = self.binder.numeric_literal(value);
        let assignment = self.binder.binary(left, BinaryOperator::Assign, right);
        self.binder.assignment_flow(assignment, antecedent)
    }

    fn read(&mut self, symbol: SymbolId, flow: FlowNodeId) {
        let read = self.binder.identifier(symbol);
        self.binder.set_flow_node(read, flow);
        self.reads.push(read);
    }

    fn run(&self) -> usize {
        let relation = RelationChecker::new(&self.interner, CheckerOptions::strict());
        let analyzer = FlowAnalyzer::new(&self.binder, &self.interner, &relation, &self.host);
        self.reads
            .iter()
            .map(|&read| analyzer.flow_type_of_reference(read).0 as usize)
            .sum()
    }
}

/// `if (c) x = 0; else if (c) x = 1; ... else x = -1; x`
fn if_else_chain(branches: usize) -> Case {
    let (mut case, start) = Case::new();
    let x = case.variable("x", TypeId::NUMBER);
    let c = case.binder.declare_symbol("c", symbol_flags::PARAMETER);
    case.host.set_declared_type(c, TypeId::BOOLEAN);

    let mut ends = Vec::with_capacity(branches + 1);
    let mut current = start;
    for i in 0..branches {
        let condition = case.binder.identifier(c);
        let then_flow = case.binder.condition_flow(condition, current, true);
        ends.push(case.assign(x, i as f64, then_flow));
        current = case.binder.condition_flow(condition, current, false);
    }
    ends.push(case.assign(x, -1.0, current));
    let join = case.binder.join(&ends);
    case.read(x, join);
    case
}

/// `if (c) { if (c) { ... x = 42 } else x = 0 } else x = 0; x`
fn nested_branches(depth: usize) -> Case {
    let (mut case, start) = Case::new();
    let x = case.variable("x", TypeId::NUMBER);
    let c = case.binder.declare_symbol("c", symbol_flags::PARAMETER);

    let mut elses = Vec::with_capacity(depth);
    let mut current = start;
    for _ in 0..depth {
        let condition = case.binder.identifier(c);
        let else_flow = case.binder.condition_flow(condition, current, false);
        elses.push(case.assign(x, 0.0, else_flow));
        current = case.binder.condition_flow(condition, current, true);
    }
    let mut end = case.assign(x, 42.0, current);
    for else_end in elses.into_iter().rev() {
        end = case.binder.join(&[end, else_end]);
    }
    case.read(x, end);
    case
}

/// `x = 0; while (c) { x = 1; ... x = n } x`
fn loop_with_assignments(assignments: usize) -> Case {
    let (mut case, start) = Case::new();
    let x = case.variable("x", TypeId::NUMBER);
    let c = case.binder.declare_symbol("c", symbol_flags::PARAMETER);

    let entry = case.assign(x, 0.0, start);
    let head = case.binder.loop_label();
    case.binder.add_antecedent(head, entry);
    let condition = case.binder.identifier(c);
    let mut body = case.binder.condition_flow(condition, head, true);
    for i in 1..=assignments {
        body = case.assign(x, i as f64, body);
        case.read(x, body);
    }
    case.binder.add_antecedent(head, body);
    let exit = case.binder.condition_flow(condition, head, false);
    case.read(x, exit);
    case
}

/// `if (typeof x === "string") x else if (typeof x === "number") x else x`
fn typeof_chain() -> Case {
    let (mut case, start) = Case::new();
    let declared = case
        .interner
        .union3(TypeId::STRING, TypeId::NUMBER, TypeId::BOOLEAN);
    let x = case.binder.declare_symbol("x", symbol_flags::PARAMETER);
    case.host.set_declared_type(x, declared);

    let mut current = start;
    for tag in ["string", "number"] {
        let operand = case.binder.identifier(x);
        let type_of = case.binder.type_of(operand);
        let tag = case.binder.string_literal(tag);
        let condition = case
            .binder
            .binary(type_of, BinaryOperator::EqualsEqualsEquals, tag);
        let then_flow = case.binder.condition_flow(condition, current, true);
        case.read(x, then_flow);
        current = case.binder.condition_flow(condition, current, false);
    }
    case.read(x, current);
    case
}

fn bench_flow_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("cfa_flow_analysis");

    let cases = [
        ("if_else", if_else_chain(2)),
        ("nested", nested_branches(3)),
        ("loop", loop_with_assignments(3)),
        ("type_narrowing", typeof_chain()),
    ];
    for (name, case) in &cases {
        group.bench_with_input(BenchmarkId::new("flow_type", name), case, |b, case| {
            b.iter(|| black_box(case.run()))
        });
    }

    group.finish();
}

/// Benchmark scaling with graph size.
fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("cfa_scaling");

    for n in [1, 5, 10, 20, 50] {
        let case = if_else_chain(n);
        group.bench_with_input(BenchmarkId::new("branches", n), &case, |b, case| {
            b.iter(|| black_box(case.run()))
        });
    }

    for depth in [1, 3, 5, 10] {
        let case = nested_branches(depth);
        group.bench_with_input(BenchmarkId::new("nesting", depth), &case, |b, case| {
            b.iter(|| black_box(case.run()))
        });
    }

    for n in [1, 4, 16] {
        let case = loop_with_assignments(n);
        group.bench_with_input(BenchmarkId::new("loop_assignments", n), &case, |b, case| {
            b.iter(|| black_box(case.run()))
        });
    }

    group.finish();
}

criterion_group!(cfa_benches, bench_flow_analysis, bench_scaling);
criterion_main!(cfa_benches);
