//! # Analysis Module
//!
//! Turns parsed targets into analyzable data: a dependency graph with
//! ordering/critical-path/parallelism annotations, and per-target safety
//! findings for dangerous recipe commands.
//!
//! ## Components
//!
//! | Component | Input | Output |
//! |-----------|-------|--------|
//! | [`graph::Graph`] | `&[Target]` | annotated dependency graph |
//! | [`safety::Checker`] | `&[Target]` | target name → [`safety::SafetyCheckResult`] |
//!
//! Both consume the same [`crate::makefile::Target`] records and are
//! independent of each other. All analysis is synchronous and allocation
//! only; a Makefile change means building fresh outputs, there is no
//! incremental update.

pub mod graph;
pub mod rules;
pub mod safety;

pub use graph::{Graph, Node, NodeKind, TreeRenderer, PLACEHOLDER_DESCRIPTION};
pub use rules::{builtin_rule_specs, builtin_rules, Rule, RuleSpec};
pub use safety::{Checker, MatchResult, SafetyCheckResult, SafetyConfig, Severity};
