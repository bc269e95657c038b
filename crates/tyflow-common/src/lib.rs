//! Common types and utilities for the tyflow type checker core.
//!
//! This crate provides foundational types used across all tyflow crates:
//! - String interning (`Atom`, `Interner`)
//! - Diagnostics (`Diagnostic`, message templates and codes)
//! - Checker limits and thresholds
//! - Checker options (`CheckerOptions`)
//! - Tracing subscriber setup

// String interning for identifier and property-name deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Diagnostics produced by the core
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};

// Centralized limits and thresholds
pub mod limits;

// Configuration
pub mod options;
pub use options::CheckerOptions;

// Tracing subscriber initialisation
pub mod tracing_config;
