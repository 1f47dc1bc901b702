//! Arena-backed grammar AST.
//!
//! All nodes of one tool invocation live in a single [`Ast`]. Nodes are
//! addressed by [`NodeId`]; a node owns its children (by id) and knows its
//! parent only as an index. Moving a subtree between grammars is therefore a
//! [`detach`](Ast::detach) followed by an [`attach`](Ast::attach): a node is
//! never reachable from two parents at once.
//!
//! Every structural edit re-indexes the affected sibling list immediately, so
//! parent links and child indexes agree between any two calls.

use rowan::TextRange;
use serde::Serialize;

use crate::grammar::GrammarId;
use crate::kind::NodeKind;

/// Handle to a node in an [`Ast`] arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Line/column in a grammar source file. Lines are 1-based, columns 0-based.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Synthesized nodes carry line 0.
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Indexes into the grammar's token stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct TokenSpan {
    /// Index of the token this node was built from.
    pub index: Option<u32>,
    /// First token covered by the subtree.
    pub start: Option<u32>,
    /// Last token covered by the subtree.
    pub stop: Option<u32>,
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    child_index: usize,
    position: Position,
    tokens: TokenSpan,
    range: Option<TextRange>,
    owner: Option<GrammarId>,
}

#[derive(Clone, Debug, Default)]
pub struct Ast {
    nodes: Vec<NodeData>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node whose text is the kind's canonical name.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.alloc_with_text(kind, kind.name())
    }

    /// Allocate a detached node with explicit text.
    pub fn alloc_with_text(&mut self, kind: NodeKind, text: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            text: text.into(),
            children: Vec::new(),
            parent: None,
            child_index: 0,
            position: Position::default(),
            tokens: TokenSpan::default(),
            range: None,
            owner: None,
        });
        id
    }

    /// Number of allocated nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.data(id).kind
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.data(id).text
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.data_mut(id).text = text.into();
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.data(id).children.get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.data(id).children.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Index of the node within its parent's child list.
    pub fn child_index(&self, id: NodeId) -> usize {
        self.data(id).child_index
    }

    pub fn position(&self, id: NodeId) -> Position {
        self.data(id).position
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) {
        self.data_mut(id).position = position;
    }

    pub fn tokens(&self, id: NodeId) -> TokenSpan {
        self.data(id).tokens
    }

    pub fn set_tokens(&mut self, id: NodeId, tokens: TokenSpan) {
        self.data_mut(id).tokens = tokens;
    }

    pub fn range(&self, id: NodeId) -> Option<TextRange> {
        self.data(id).range
    }

    pub fn set_range(&mut self, id: NodeId, range: TextRange) {
        self.data_mut(id).range = Some(range);
    }

    pub fn owner(&self, id: NodeId) -> Option<GrammarId> {
        self.data(id).owner
    }

    pub fn set_owner(&mut self, id: NodeId, owner: GrammarId) {
        self.data_mut(id).owner = Some(owner);
    }

    /// Set the owner of every node in the subtree rooted at `root`.
    pub fn set_owner_recursive(&mut self, root: NodeId, owner: GrammarId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let data = self.data_mut(id);
            data.owner = Some(owner);
            stack.extend(data.children.iter().copied());
        }
    }

    /// Topmost ancestor of `id` (itself when detached).
    pub fn root_of(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }

    /// Whether `id` is `ancestor` or lies below it.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn first_child_with_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.kind(child) == kind)
    }

    pub fn children_with_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.kind(child) == kind)
            .collect()
    }

    /// All nodes of `kind` in the subtree, pre-order, including `id` itself.
    pub fn descendants_with_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        crate::walk::preorder(self, id)
            .into_iter()
            .filter(|&node| self.kind(node) == kind)
            .collect()
    }

    /// First node in the subtree whose token index equals `index`.
    pub fn node_with_token_index(&self, id: NodeId, index: u32) -> Option<NodeId> {
        crate::walk::preorder(self, id)
            .into_iter()
            .find(|&node| self.tokens(node).index == Some(index))
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Remove `id` from its parent. The subtree stays intact and becomes a
    /// free-standing tree. No-op for nodes without a parent.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        let Some(parent) = self.parent(id) else {
            return id;
        };
        let index = self.child_index(id);
        self.data_mut(parent).children.remove(index);
        self.reindex_from(parent, index);
        let data = self.data_mut(id);
        data.parent = None;
        data.child_index = 0;
        id
    }

    /// Insert a detached node as the `index`-th child of `parent`.
    ///
    /// Panics if `node` still has a parent or if `index` is out of bounds.
    pub fn attach(&mut self, parent: NodeId, node: NodeId, index: usize) {
        assert!(
            self.parent(node).is_none(),
            "attach: node {node:?} is still attached; detach it first"
        );
        assert!(
            !self.is_within(parent, node),
            "attach: node {node:?} cannot become its own descendant"
        );
        let count = self.child_count(parent);
        assert!(
            index <= count,
            "attach: index {index} out of bounds for {count} children"
        );
        self.data_mut(parent).children.insert(index, node);
        self.data_mut(node).parent = Some(parent);
        self.reindex_from(parent, index);
    }

    /// Attach `node` at `index`, detaching it from its current parent first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) {
        self.detach(node);
        self.attach(parent, node, index);
    }

    /// Append `node` as the last child of `parent`, detaching it first.
    pub fn push_child(&mut self, parent: NodeId, node: NodeId) {
        self.detach(node);
        let index = self.child_count(parent);
        self.attach(parent, node, index);
    }

    /// Remove `child` from `parent`. Returns false if it was not a child.
    pub fn delete_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    fn reindex_from(&mut self, parent: NodeId, start: usize) {
        let count = self.child_count(parent);
        for index in start..count {
            let child = self.data(parent).children[index];
            let data = self.data_mut(child);
            data.parent = Some(parent);
            data.child_index = index;
        }
    }

    /// Copy a single node (no children, no parent).
    pub fn dup_node(&mut self, id: NodeId) -> NodeId {
        let source = self.data(id);
        let copy = NodeData {
            kind: source.kind,
            text: source.text.clone(),
            children: Vec::new(),
            parent: None,
            child_index: 0,
            position: source.position,
            tokens: source.tokens,
            range: source.range,
            owner: source.owner,
        };
        let new_id = NodeId(self.nodes.len() as u32);
        self.nodes.push(copy);
        new_id
    }

    /// Deep copy of the subtree rooted at `id`, detached.
    pub fn dup_tree(&mut self, id: NodeId) -> NodeId {
        let copy = self.dup_node(id);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.dup_tree(child);
            self.push_child(copy, child_copy);
        }
        copy
    }

    /// Check that parent links and child indexes agree in the whole subtree.
    ///
    /// Returns the first inconsistency found, if any.
    pub fn check_links(&self, root: NodeId) -> Result<(), String> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for (index, &child) in self.children(id).iter().enumerate() {
                if self.parent(child) != Some(id) {
                    return Err(format!(
                        "{} {:?} has parent {:?}, expected {:?}",
                        self.kind(child),
                        child,
                        self.parent(child),
                        id
                    ));
                }
                if self.child_index(child) != index {
                    return Err(format!(
                        "{} {:?} has child index {}, expected {}",
                        self.kind(child),
                        child,
                        self.child_index(child),
                        index
                    ));
                }
                stack.push(child);
            }
        }
        Ok(())
    }
}
