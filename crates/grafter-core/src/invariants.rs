//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::ast::{Ast, NodeId};

/// Panic if any parent link or child index in the subtree is inconsistent.
///
/// Tree edits keep links consistent, so a failure here is a bug in a
/// transformation pass, not a problem with the user's grammar.
#[inline]
pub fn verify_links(ast: &Ast, root: NodeId) {
    if let Err(problem) = ast.check_links(root) {
        panic!("tree links: {problem} (edits must go through detach/attach)");
    }
}
