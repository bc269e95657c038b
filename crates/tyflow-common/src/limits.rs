//! Centralized limits and thresholds for the checker core.
//!
//! These are the only termination mechanisms for otherwise-unbounded
//! recursion over cyclic flow graphs and recursive generic types. The
//! values are empirically chosen; change them only with evidence.
//!
//! # Categories
//!
//! - **Control flow**: flow-graph walk depth, const-alias inlining
//! - **Inference**: deep-nesting window, reverse-mapped nesting
//! - **Solver**: instantiation and relation depths

// =============================================================================
// Control Flow Limits
// =============================================================================

/// Maximum depth of a single narrowing query's backward flow-graph walk.
///
/// When a query nests deeper than this, narrowing reports one diagnostic for
/// the containing body and is disabled for the rest of the session.
///
/// # TypeScript example
///
/// ```typescript
/// // Thousands of sequential conditions on the same variable:
/// if (x === 0) {} if (x === 1) {} /* ... */ if (x === 2500) {}
/// x; // error TS2563
/// ```
pub const MAX_FLOW_DEPTH: u32 = 2000;

/// Maximum number of `const` aliases followed when narrowing by an aliased
/// condition.
///
/// # TypeScript example
///
/// ```typescript
/// const isString = typeof x === "string";
/// const ok = isString;
/// if (ok) { x; } // narrowed through two aliases
/// ```
pub const MAX_CONST_ALIAS_INLINE_DEPTH: u32 = 5;

// =============================================================================
// Inference Limits
// =============================================================================

/// Number of equally-shaped ancestors on a nesting stack after which a type
/// is considered deeply nested.
///
/// Inference stops descending once both the source side and the target side
/// are deeply nested.
pub const DEEP_NESTING_WINDOW: usize = 2;

/// Maximum nesting of reverse-mapped type inference through a homomorphic
/// mapped type template.
pub const MAX_REVERSE_MAPPED_NESTING: usize = 10;

/// Maximum depth at which `isTypeParameterAtTopLevel` keeps looking through
/// conditional branches of a return type.
pub const MAX_TYPE_PARAMETER_TOP_LEVEL_DEPTH: u32 = 3;

// =============================================================================
// Solver Limits
// =============================================================================

/// Maximum depth of a single type instantiation.
///
/// Deeply recursive generic aliases hit this limit and instantiate to
/// `error` instead of overflowing the stack.
pub const MAX_INSTANTIATION_DEPTH: u32 = 100;

/// Maximum depth of a structural relation check.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Red zone and growth size for stack extension in deep recursions.
pub const STACK_RED_ZONE: usize = 32 * 1024;
pub const STACK_GROWTH: usize = 2 * 1024 * 1024;
