//! Per-kind evaluation rules for `TypeEvaluator`.

pub mod conditional;
pub mod index_access;
pub mod keyof;
pub mod mapped;
pub mod template_literal;
