//! tyflow: control flow narrowing and generic inference core for a
//! structural type checker.
//!
//! The workspace is split along the checker pipeline:
//! - `tyflow_common` - atoms, diagnostics, limits, options and tracing setup
//! - `tyflow_binder` - the reference AST, symbols and the flow graph
//! - `tyflow_solver` - type interning, relations, narrowing primitives and inference
//! - `tyflow_checker` - `FlowAnalyzer`, the flow-sensitive type of a reference
//!
//! This crate re-exports the entry points a host needs.

pub use tyflow_binder as binder;
pub use tyflow_checker as checker;
pub use tyflow_common as common;
pub use tyflow_solver as solver;

pub use tyflow_binder::{BinderState, FlowNodeId, NodeIndex, SymbolId};
pub use tyflow_checker::{CheckerHost, ExpressionTypeTable, FlowAnalyzer, FlowType};
pub use tyflow_common::tracing_config::init_tracing;
pub use tyflow_common::{CheckerOptions, Diagnostic, DiagnosticCategory, Interner};
pub use tyflow_solver::{
    InferenceContext, InferenceFlags, InferencePriority, RelationChecker, TypeId, TypeInterner,
    TypeRelation,
};
