//! Reference identity for flow analysis.
//!
//! A *reference* is an expression whose type flow analysis can track:
//! an identifier, `this`, `super`, or a property/element access chain
//! rooted in one of those. Two references match when they denote the same
//! storage location syntactically: identifiers by resolved symbol, accesses
//! by accessed name plus a matching base.

use std::fmt::Write;
use tyflow_binder::{
    BinaryOperator, BinderState, FunctionKind, NodeIndex, NodeKind, SymbolId, symbol_flags,
};
use tyflow_common::interner::Atom;
use tyflow_solver::{TypeId, format_number};

// =============================================================================
// Accessed names
// =============================================================================

/// The property name read by an access expression: `x.name`, `x["name"]`
/// or `x[0]`, or by an object binding element (`{ name }`).
pub fn accessed_property_name(binder: &BinderState, node: NodeIndex) -> Option<Atom> {
    match binder.arena.kind(node)? {
        NodeKind::PropertyAccess { name, .. } => Some(*name),
        NodeKind::BindingElement { property_name, .. } if !property_name.is_none() => {
            Some(*property_name)
        }
        NodeKind::ElementAccess { argument, .. } => literal_property_name(binder, *argument),
        _ => None,
    }
}

/// Property name denoted by a string or numeric literal expression.
pub(crate) fn literal_property_name(binder: &BinderState, node: NodeIndex) -> Option<Atom> {
    match binder.arena.kind(node)? {
        NodeKind::StringLiteral { text } => Some(*text),
        NodeKind::NumericLiteral { value } => Some(binder.atoms.intern(&format_number(*value))),
        _ => None,
    }
}

pub(crate) fn is_access_expression(binder: &BinderState, node: NodeIndex) -> bool {
    matches!(
        binder.arena.kind(node),
        Some(NodeKind::PropertyAccess { .. } | NodeKind::ElementAccess { .. })
    )
}

/// The base of an access expression.
pub(crate) fn access_base(binder: &BinderState, node: NodeIndex) -> Option<NodeIndex> {
    match binder.arena.kind(node)? {
        NodeKind::PropertyAccess { expression, .. } | NodeKind::ElementAccess { expression, .. } => {
            Some(*expression)
        }
        _ => None,
    }
}

/// Symbol of an identifier whose binding never changes after initialization.
fn constant_identifier_symbol(binder: &BinderState, node: NodeIndex) -> Option<SymbolId> {
    let NodeKind::Identifier { symbol, .. } = binder.arena.kind(node)? else {
        return None;
    };
    binder.is_constant_variable(*symbol).then_some(*symbol)
}

fn identifier_symbol(binder: &BinderState, node: NodeIndex) -> Option<SymbolId> {
    match binder.arena.kind(node)? {
        NodeKind::Identifier { symbol, .. } if !symbol.is_none() => Some(*symbol),
        _ => None,
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Whether `target` denotes the same location as the reference `source`.
///
/// Parentheses, `!`, the left side of an assignment and the right side of a
/// comma are looked through on the target side.
pub fn is_matching_reference(binder: &BinderState, source: NodeIndex, target: NodeIndex) -> bool {
    let arena = &binder.arena;
    match arena.kind(target) {
        Some(NodeKind::Parenthesized { expression } | NodeKind::NonNull { expression }) => {
            return is_matching_reference(binder, source, *expression);
        }
        Some(NodeKind::Binary {
            left,
            operator,
            right,
        }) => {
            return (operator.is_assignment() && is_matching_reference(binder, source, *left))
                || (*operator == BinaryOperator::Comma
                    && is_matching_reference(binder, source, *right));
        }
        _ => {}
    }

    match arena.kind(source) {
        Some(NodeKind::Identifier { symbol, .. }) => {
            if symbol.is_none() {
                return false;
            }
            match arena.kind(target) {
                Some(NodeKind::Identifier {
                    symbol: target_symbol,
                    ..
                }) => target_symbol == symbol,
                Some(
                    NodeKind::VariableDeclaration { name, .. } | NodeKind::BindingElement { name, .. },
                ) => identifier_symbol(binder, *name) == Some(*symbol),
                _ => false,
            }
        }
        Some(NodeKind::ThisKeyword) => matches!(arena.kind(target), Some(NodeKind::ThisKeyword)),
        Some(NodeKind::SuperKeyword) => matches!(arena.kind(target), Some(NodeKind::SuperKeyword)),
        Some(NodeKind::NonNull { expression } | NodeKind::Parenthesized { expression }) => {
            is_matching_reference(binder, *expression, target)
        }
        Some(NodeKind::PropertyAccess { .. } | NodeKind::ElementAccess { .. }) => {
            is_matching_access(binder, source, target)
        }
        Some(NodeKind::Binary {
            operator: BinaryOperator::Comma,
            right,
            ..
        }) => is_matching_reference(binder, *right, target),
        _ => false,
    }
}

fn is_matching_access(binder: &BinderState, source: NodeIndex, target: NodeIndex) -> bool {
    let (Some(source_base), Some(target_base)) =
        (access_base(binder, source), access_base(binder, target))
    else {
        return false;
    };
    if let Some(source_name) = accessed_property_name(binder, source) {
        if let Some(target_name) = accessed_property_name(binder, target) {
            return source_name == target_name
                && is_matching_reference(binder, source_base, target_base);
        }
    }
    if let (
        Some(NodeKind::ElementAccess {
            argument: source_arg,
            ..
        }),
        Some(NodeKind::ElementAccess {
            argument: target_arg,
            ..
        }),
    ) = (binder.arena.kind(source), binder.arena.kind(target))
    {
        if let Some(symbol) = constant_identifier_symbol(binder, *source_arg) {
            if identifier_symbol(binder, *target_arg) == Some(symbol) {
                return is_matching_reference(binder, source_base, target_base);
            }
        }
    }
    false
}

/// Whether `target` matches a proper prefix of the access chain `source`.
///
/// An assignment to `x.y` invalidates what is known about `x.y.z`.
pub fn contains_matching_reference(
    binder: &BinderState,
    source: NodeIndex,
    target: NodeIndex,
) -> bool {
    let mut current = source;
    while let Some(base) = access_base(binder, current) {
        current = base;
        if is_matching_reference(binder, current, target) {
            return true;
        }
    }
    false
}

pub(crate) fn is_or_contains_matching_reference(
    binder: &BinderState,
    source: NodeIndex,
    target: NodeIndex,
) -> bool {
    is_matching_reference(binder, source, target)
        || contains_matching_reference(binder, source, target)
}

/// Whether `target` is the base of some link in the optional chain `source`.
pub fn optional_chain_contains_reference(
    binder: &BinderState,
    source: NodeIndex,
    target: NodeIndex,
) -> bool {
    let mut current = source;
    while binder.arena.is_optional_chain(current) {
        current = match binder.arena.kind(current) {
            Some(
                NodeKind::PropertyAccess { expression, .. }
                | NodeKind::ElementAccess { expression, .. },
            ) => *expression,
            Some(NodeKind::Call { callee, .. }) => *callee,
            _ => return false,
        };
        if is_matching_reference(binder, current, target) {
            return true;
        }
    }
    false
}

/// The reference an expression evaluates to: parentheses, assignment
/// targets and comma results are looked through.
pub fn reference_candidate(binder: &BinderState, node: NodeIndex) -> NodeIndex {
    match binder.arena.kind(node) {
        Some(NodeKind::Parenthesized { expression }) => reference_candidate(binder, *expression),
        Some(NodeKind::Binary {
            left,
            operator,
            right,
        }) => match operator {
            BinaryOperator::Assign
            | BinaryOperator::BarBarAssign
            | BinaryOperator::AmpersandAmpersandAssign
            | BinaryOperator::QuestionQuestionAssign => reference_candidate(binder, *left),
            BinaryOperator::Comma => reference_candidate(binder, *right),
            _ => node,
        },
        _ => node,
    }
}

/// The outermost expression that evaluates to the same value as `node`.
pub(crate) fn reference_root(binder: &BinderState, node: NodeIndex) -> NodeIndex {
    let parent = binder.arena.parent(node);
    match binder.arena.kind(parent) {
        Some(NodeKind::Parenthesized { .. }) => reference_root(binder, parent),
        Some(NodeKind::Binary {
            left,
            operator: BinaryOperator::Assign,
            ..
        }) if *left == node => reference_root(binder, parent),
        Some(NodeKind::Binary {
            operator: BinaryOperator::Comma,
            right,
            ..
        }) if *right == node => reference_root(binder, parent),
        _ => node,
    }
}

/// Whether the value read through `node` cannot change between two reads
/// without an intervening assignment to it: `this`, a constant binding, or
/// a chain of `readonly` members rooted in one.
pub fn is_constant_reference(binder: &BinderState, node: NodeIndex) -> bool {
    match binder.arena.kind(node) {
        Some(NodeKind::ThisKeyword) => true,
        Some(NodeKind::Identifier { .. }) => constant_identifier_symbol(binder, node).is_some(),
        Some(
            NodeKind::PropertyAccess { expression, .. } | NodeKind::ElementAccess { expression, .. },
        ) => {
            is_constant_reference(binder, *expression)
                && binder
                    .symbols
                    .get(binder.resolved_symbol_of(node))
                    .is_some_and(|member| member.has_any_flags(symbol_flags::READONLY))
        }
        _ => false,
    }
}

// =============================================================================
// Cache keys
// =============================================================================

/// Structural key of a reference for the session loop cache.
///
/// Identical keys denote the same location under the same declared and
/// initial types in the same flow container. `None` when the expression is
/// not keyable.
pub fn flow_cache_key(
    binder: &BinderState,
    node: NodeIndex,
    declared: TypeId,
    initial: TypeId,
    container: Option<NodeIndex>,
) -> Option<String> {
    let mut key = String::new();
    write_flow_cache_key(binder, &mut key, node, declared, initial, container)?;
    Some(key)
}

fn write_flow_cache_key(
    binder: &BinderState,
    key: &mut String,
    node: NodeIndex,
    declared: TypeId,
    initial: TypeId,
    container: Option<NodeIndex>,
) -> Option<()> {
    let write_root = |key: &mut String| {
        let _ = write!(key, ":{}", declared.0);
        if initial != declared {
            let _ = write!(key, "={}", initial.0);
        }
        if let Some(container) = container {
            let _ = write!(key, "@{}", container.0);
        }
    };
    match binder.arena.kind(node)? {
        NodeKind::Identifier { symbol, .. } => {
            if symbol.is_none() {
                return None;
            }
            let _ = write!(key, "{}", symbol.0);
            write_root(key);
        }
        NodeKind::ThisKeyword => write_root(key),
        NodeKind::SuperKeyword => {
            key.push_str("super");
            write_root(key);
        }
        NodeKind::NonNull { expression } | NodeKind::Parenthesized { expression } => {
            write_flow_cache_key(binder, key, *expression, declared, initial, container)?;
        }
        NodeKind::PropertyAccess { expression, .. } | NodeKind::ElementAccess { expression, .. } => {
            if let Some(name) = accessed_property_name(binder, node) {
                write_flow_cache_key(binder, key, *expression, declared, initial, container)?;
                key.push('.');
                key.push_str(&binder.atoms.resolve(name));
            } else {
                let NodeKind::ElementAccess { argument, .. } = binder.arena.kind(node)? else {
                    return None;
                };
                let symbol = constant_identifier_symbol(binder, *argument)?;
                write_flow_cache_key(binder, key, *expression, declared, initial, container)?;
                let _ = write!(key, ".@{}", symbol.0);
            }
        }
        NodeKind::FunctionLike {
            kind: FunctionKind::Arrow | FunctionKind::Expression,
            ..
        } => {
            let _ = write!(key, "{}#{}", node.0, declared.0);
        }
        _ => return None,
    }
    Some(())
}
