//! Tree traversal and node-level rewriting.
//!
//! The visiting order is a parameter of the traversal rather than a property
//! of the callback: [`rewrite`] takes an explicit [`Order`] and a single
//! closure.

use crate::ast::{Ast, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// Node before its children. Children of a replacement are visited.
    Pre,
    /// Children before their node.
    Post,
}

/// All nodes of the subtree in pre-order.
pub fn preorder(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        out.push(id);
        stack.extend(ast.children(id).iter().rev().copied());
    }
    out
}

/// All nodes of the subtree in post-order.
pub fn postorder(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_postorder(ast, root, &mut out);
    out
}

fn collect_postorder(ast: &Ast, id: NodeId, out: &mut Vec<NodeId>) {
    for &child in ast.children(id) {
        collect_postorder(ast, child, out);
    }
    out.push(id);
}

/// Visit every node of the subtree, letting `f` replace nodes.
///
/// When `f` returns `Some(replacement)`, the replacement (which must be
/// detached) takes the visited node's place in its parent, and the visited
/// node is detached. Returns the root of the resulting tree, which differs
/// from `root` only if the root itself was replaced.
pub fn rewrite<F>(ast: &mut Ast, root: NodeId, order: Order, mut f: F) -> NodeId
where
    F: FnMut(&mut Ast, NodeId) -> Option<NodeId>,
{
    rewrite_node(ast, root, order, &mut f)
}

fn rewrite_node<F>(ast: &mut Ast, id: NodeId, order: Order, f: &mut F) -> NodeId
where
    F: FnMut(&mut Ast, NodeId) -> Option<NodeId>,
{
    let mut current = id;
    if order == Order::Pre {
        current = apply(ast, current, f);
    }

    // Children may be replaced while we iterate, so index instead of borrowing.
    let mut index = 0;
    while index < ast.child_count(current) {
        if let Some(child) = ast.child(current, index) {
            rewrite_node(ast, child, order, f);
        }
        index += 1;
    }

    if order == Order::Post {
        current = apply(ast, current, f);
    }
    current
}

fn apply<F>(ast: &mut Ast, id: NodeId, f: &mut F) -> NodeId
where
    F: FnMut(&mut Ast, NodeId) -> Option<NodeId>,
{
    let Some(replacement) = f(ast, id) else {
        return id;
    };
    if replacement == id {
        return id;
    }
    if let Some(parent) = ast.parent(id) {
        let index = ast.child_index(id);
        ast.detach(id);
        ast.insert_child(parent, index, replacement);
    }
    replacement
}
