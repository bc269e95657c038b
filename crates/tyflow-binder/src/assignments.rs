//! Assignment positions of parameters and mutable locals.
//!
//! One pass over the node arena records, for every tracked binding, the
//! position after which it is never assigned again. An assignment from a
//! different function than the declaring one is recorded as `u32::MAX`;
//! an assignment inside a `for...in`, `for...of` or `switch` statement is
//! extended to the end of that statement. This is coarser than flow
//! analysis but needs no graph walk.

use crate::node::{BinaryOperator, NodeArena, NodeIndex, NodeKind};
use crate::symbols::{SymbolArena, SymbolId};
use rustc_hash::FxHashMap;
use tracing::trace;

/// How an expression is written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentKind {
    None,
    /// `x = v`, `x ||= v`, `[x] = v`, `for (x of xs)`
    Definite,
    /// `x += v`
    Compound,
}

/// The node that writes to `node`, looking through parentheses and
/// destructuring literals: `x` in `[{ a: x }] = v` is written by the
/// outer assignment.
pub fn assignment_target(arena: &NodeArena, mut node: NodeIndex) -> Option<NodeIndex> {
    loop {
        let parent = arena.parent(node);
        match arena.kind(parent)? {
            NodeKind::Binary { left, operator, .. } => {
                return (operator.is_assignment() && *left == node).then_some(parent);
            }
            NodeKind::ForInStatement { initializer, .. }
            | NodeKind::ForOfStatement { initializer, .. } => {
                return (*initializer == node).then_some(parent);
            }
            NodeKind::Parenthesized { .. }
            | NodeKind::NonNull { .. }
            | NodeKind::ArrayLiteral { .. }
            | NodeKind::SpreadElement { .. } => node = parent,
            NodeKind::ShorthandPropertyAssignment { name, .. } => {
                if *name != node {
                    return None;
                }
                node = arena.parent(parent);
            }
            NodeKind::PropertyAssignment { initializer, .. } => {
                if *initializer != node {
                    return None;
                }
                node = arena.parent(parent);
            }
            _ => return None,
        }
    }
}

pub fn assignment_target_kind(arena: &NodeArena, node: NodeIndex) -> AssignmentKind {
    let Some(target) = assignment_target(arena, node) else {
        return AssignmentKind::None;
    };
    match arena.kind(target) {
        Some(NodeKind::Binary { operator, .. })
            if *operator == BinaryOperator::Assign
                || operator.is_logical_or_coalescing_assignment() =>
        {
            AssignmentKind::Definite
        }
        Some(NodeKind::Binary { .. }) => AssignmentKind::Compound,
        Some(_) => AssignmentKind::Definite,
        None => AssignmentKind::None,
    }
}

/// Last assignment position of each tracked binding that is assigned at all.
#[derive(Clone, Debug, Default)]
pub struct AssignmentMarks {
    last_assignment: FxHashMap<SymbolId, u32>,
}

impl AssignmentMarks {
    pub fn collect(arena: &NodeArena, symbols: &SymbolArena) -> Self {
        let mut last_assignment: FxHashMap<SymbolId, u32> = FxHashMap::default();
        for (index, node) in arena.iter() {
            let NodeKind::Identifier { symbol, .. } = &node.kind else {
                continue;
            };
            let Some(sym) = symbols.get(*symbol) else {
                continue;
            };
            if !sym.is_parameter_or_mutable_local()
                || assignment_target_kind(arena, index) == AssignmentKind::None
            {
                continue;
            }
            let previous = last_assignment.get(symbol).copied();
            if previous == Some(u32::MAX) {
                continue;
            }
            let declaration = sym.value_declaration;
            let pos = if arena.container_of(index) == arena.container_of(declaration) {
                extend_assignment_position(arena, index, declaration)
            } else {
                u32::MAX
            };
            trace!(symbol = symbol.0, pos, "assignment");
            last_assignment.insert(*symbol, previous.map_or(pos, |p| p.max(pos)));
        }
        AssignmentMarks { last_assignment }
    }

    pub fn last_assignment(&self, symbol: SymbolId) -> Option<u32> {
        self.last_assignment.get(&symbol).copied()
    }
}

/// Widen the position of an assignment to the end of any enclosing
/// statement between it and the declaration.
fn extend_assignment_position(arena: &NodeArena, node: NodeIndex, declaration: NodeIndex) -> u32 {
    let Some(start) = arena.get(node) else {
        return 0;
    };
    let declaration_pos = arena.get(declaration).map_or(0, |decl| decl.pos);
    let mut pos = start.pos;
    let mut current = node;
    while let Some(n) = arena.get(current) {
        if n.pos <= declaration_pos && declaration.is_some() {
            break;
        }
        match n.kind {
            NodeKind::ForInStatement { .. }
            | NodeKind::ForOfStatement { .. }
            | NodeKind::SwitchStatement { .. } => pos = pos.max(n.end),
            NodeKind::FunctionLike { .. } | NodeKind::SourceFile => break,
            _ => {}
        }
        current = n.parent;
    }
    pos
}
