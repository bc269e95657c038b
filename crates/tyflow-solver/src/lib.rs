//! Structural type solver for the tyflow checker core.
//!
//! - **Interning**: every type is a `TypeId` into a `TypeInterner`; equal
//!   structure means equal id, and unions are normalized on construction.
//! - **Relations**: `TypeRelation` answers assignability, subtyping and
//!   comparability; `RelationChecker` is the structural implementation.
//! - **Evaluation and instantiation** of generic types.
//! - **Narrowing** primitives used by control flow analysis.
//! - **Inference** of type arguments from source/target pairs.
pub mod evaluate;
pub mod evaluate_rules;
pub mod infer;
mod infer_resolve;
pub mod instantiate;
mod intern;
pub mod narrowing;
mod narrowing_discriminants;
mod narrowing_property;
pub mod recursion;
pub mod relation;
pub mod template_literal;
pub mod type_facts;
pub mod type_queries;
pub mod types;
pub mod widening;

pub use evaluate::{TypeEvaluator, evaluate_type};
pub use infer::{
    InferenceContext, InferenceFlags, InferenceInfo, InferencePriority, InferenceState,
    IntraExpressionSite, is_type_parameter_at_top_level,
};
pub use instantiate::{TypeInstantiator, TypeSubstitution, instantiate_type};
pub use intern::{TypeInterner, format_number};
pub use narrowing::{NarrowingCache, NarrowingContext, union_with_subtype_reduction};
pub use narrowing_discriminants::not_equal_facts_from_typeof_switch;
pub use narrowing_property::PropertyLookup;
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use relation::{RelationChecker, RelationKind, TypeRelation};
pub use type_facts::{TYPEOF_TAGS, TypeFacts, type_facts, typeof_eq_facts, typeof_ne_facts};
pub use types::*;
pub use widening::{base_type_of_literal, widened_literal_type, widened_type};

// Test modules loaded here; narrowing_tests is loaded from narrowing.rs.
#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod intern_tests;
#[cfg(test)]
#[path = "../tests/relation_tests.rs"]
mod relation_tests;
#[cfg(test)]
#[path = "../tests/evaluate_tests.rs"]
mod evaluate_tests;
#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod infer_tests;
