#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for Grafter grammar trees.
//!
//! Three layers:
//! - **Arena** (`Ast`): every node of one tool invocation, addressed by `NodeId`
//! - **Grammar model** (`Grammar`, `GrammarSet`): grammar files over the arena
//! - **Notation** (`sexpr`): a textual tree form for fixtures and logging

pub mod ast;
pub mod grammar;
pub mod invariants;
pub mod kind;
pub mod sexpr;
pub mod walk;

#[cfg(test)]
mod sexpr_tests;

pub use ast::{Ast, NodeId, Position, TokenSpan};
pub use grammar::{Grammar, GrammarId, GrammarKind, GrammarSet};
pub use kind::NodeKind;
pub use walk::Order;
