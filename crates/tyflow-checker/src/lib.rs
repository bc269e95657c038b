//! Control flow narrowing for the tyflow checker core.
//!
//! This crate is organized into:
//! - `control_flow` - `FlowAnalyzer`, the backwards walk over the flow graph
//! - `control_flow_narrowing` - narrowing by condition expressions
//! - `switch_clauses` - switch statement narrowing and exhaustiveness
//! - `reachability` - reachability of flow nodes
//! - `references` - reference identity and cache keys
//! - `host` - `CheckerHost`, the expression typing the analyzer consumes

pub mod control_flow;
mod control_flow_narrowing;
pub mod host;
mod reachability;
pub mod references;
mod switch_clauses;

pub use control_flow::{FlowAnalyzer, FlowType};
pub use host::{CheckerHost, ExpressionTypeTable};
pub use references::{
    accessed_property_name, contains_matching_reference, flow_cache_key, is_constant_reference,
    is_matching_reference, optional_chain_contains_reference, reference_candidate,
};
