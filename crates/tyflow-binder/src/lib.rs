//! Binder-side data for the tyflow checker core.
//!
//! The checker core consumes three read-only structures produced by binding:
//! - `NodeArena`: the expression/statement nodes that flow nodes point at
//! - `SymbolArena`: resolved bindings for identifiers
//! - `FlowNodeArena`: the control flow graph of every function/module body
//!
//! `BinderState` bundles them together with the node-to-flow mapping and
//! offers a builder API for constructing graphs programmatically. It also
//! answers where parameters and mutable locals are last assigned
//! (`assignments`).

pub mod assignments;
pub mod flow;
pub mod node;
pub mod state;
pub mod symbols;

pub use assignments::{AssignmentKind, AssignmentMarks, assignment_target, assignment_target_kind};
pub use flow::{
    FlowNode, FlowNodeArena, FlowNodeId, FlowReduceLabelData, FlowSwitchClauseData, flow_flags,
};
pub use node::{
    BinaryOperator, FunctionKind, Node, NodeArena, NodeIndex, NodeKind, PrefixOperator,
};
pub use state::BinderState;
pub use symbols::{Symbol, SymbolArena, SymbolId, symbol_flags};
