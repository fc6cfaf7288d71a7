// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Index arena for CSG expression trees
//!
//! Nodes live in a flat vector and refer to their children by index.
//! Children always precede their parent, so a forward scan visits every
//! operand before the operator that consumes it.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binary boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
    Xor,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BooleanOp::Union => "union",
            BooleanOp::Subtract => "subtract",
            BooleanOp::Intersect => "intersect",
            BooleanOp::Xor => "xor",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node<L> {
    Leaf(L),
    Union(NodeId, NodeId),
    Subtract(NodeId, NodeId),
    Intersect(NodeId, NodeId),
    Xor(NodeId, NodeId),
    Not(NodeId),
    /// Region boundary marker; evaluates to its child
    Guard(NodeId),
    /// Nothing remains
    Nop,
}

impl<L> Node<L> {
    pub fn binary(op: BooleanOp, left: NodeId, right: NodeId) -> Self {
        match op {
            BooleanOp::Union => Node::Union(left, right),
            BooleanOp::Subtract => Node::Subtract(left, right),
            BooleanOp::Intersect => Node::Intersect(left, right),
            BooleanOp::Xor => Node::Xor(left, right),
        }
    }

    /// Operator and operands of a binary node.
    pub fn as_binary(&self) -> Option<(BooleanOp, NodeId, NodeId)> {
        match *self {
            Node::Union(l, r) => Some((BooleanOp::Union, l, r)),
            Node::Subtract(l, r) => Some((BooleanOp::Subtract, l, r)),
            Node::Intersect(l, r) => Some((BooleanOp::Intersect, l, r)),
            Node::Xor(l, r) => Some((BooleanOp::Xor, l, r)),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        match *self {
            Node::Leaf(_) | Node::Nop => Vec::new(),
            Node::Not(c) | Node::Guard(c) => vec![c],
            Node::Union(l, r) | Node::Subtract(l, r) | Node::Intersect(l, r) | Node::Xor(l, r) => {
                vec![l, r]
            }
        }
    }
}

/// CSG expression over leaf payloads of type `L`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsgTree<L> {
    nodes: Vec<Node<L>>,
    root: NodeId,
}

impl<L> CsgTree<L> {
    pub fn leaf(payload: L) -> Self {
        Self {
            nodes: vec![Node::Leaf(payload)],
            root: NodeId(0),
        }
    }

    pub fn nop() -> Self {
        Self {
            nodes: vec![Node::Nop],
            root: NodeId(0),
        }
    }

    /// Build from raw nodes, checking that every child precedes its parent.
    pub fn from_nodes(nodes: Vec<Node<L>>, root: NodeId) -> Result<Self, TreeError> {
        if root.0 >= nodes.len() {
            return Err(TreeError::BadRoot {
                root: root.0,
                len: nodes.len(),
            });
        }
        for (index, node) in nodes.iter().enumerate() {
            if let Some(child) = node.children().into_iter().find(|c| c.0 >= index) {
                return Err(TreeError::BadChild {
                    node: index,
                    child: child.0,
                });
            }
        }
        Ok(Self { nodes, root })
    }

    /// Append `other`'s nodes, returning the new id of its root.
    fn graft(&mut self, other: CsgTree<L>) -> NodeId {
        let offset = self.nodes.len();
        let shift = |id: NodeId| NodeId(id.0 + offset);
        self.nodes.extend(other.nodes.into_iter().map(|node| match node {
            Node::Leaf(l) => Node::Leaf(l),
            Node::Union(l, r) => Node::Union(shift(l), shift(r)),
            Node::Subtract(l, r) => Node::Subtract(shift(l), shift(r)),
            Node::Intersect(l, r) => Node::Intersect(shift(l), shift(r)),
            Node::Xor(l, r) => Node::Xor(shift(l), shift(r)),
            Node::Not(c) => Node::Not(shift(c)),
            Node::Guard(c) => Node::Guard(shift(c)),
            Node::Nop => Node::Nop,
        }));
        shift(other.root)
    }

    fn push_root(mut self, node: Node<L>) -> Self {
        self.nodes.push(node);
        self.root = NodeId(self.nodes.len() - 1);
        self
    }

    pub fn combine(mut self, op: BooleanOp, other: CsgTree<L>) -> Self {
        let left = self.root;
        let right = self.graft(other);
        self.push_root(Node::binary(op, left, right))
    }

    pub fn union(self, other: CsgTree<L>) -> Self {
        self.combine(BooleanOp::Union, other)
    }

    pub fn subtract(self, other: CsgTree<L>) -> Self {
        self.combine(BooleanOp::Subtract, other)
    }

    pub fn intersect(self, other: CsgTree<L>) -> Self {
        self.combine(BooleanOp::Intersect, other)
    }

    pub fn xor(self, other: CsgTree<L>) -> Self {
        self.combine(BooleanOp::Xor, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        let child = self.root;
        self.push_root(Node::Not(child))
    }

    pub fn guard(self) -> Self {
        let child = self.root;
        self.push_root(Node::Guard(child))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node<L> {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node<L>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the root is `Nop`.
    pub fn is_nop(&self) -> bool {
        matches!(self.node(self.root), Node::Nop)
    }

    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &L)> {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Node::Leaf(l) => Some((NodeId(i), l)),
            _ => None,
        })
    }

    /// Decompose into the node arena and the root id.
    pub fn into_parts(self) -> (Vec<Node<L>>, NodeId) {
        (self.nodes, self.root)
    }
}

impl<L: fmt::Display> fmt::Display for CsgTree<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node<L: fmt::Display>(
            tree: &CsgTree<L>,
            id: NodeId,
            f: &mut fmt::Formatter<'_>,
        ) -> fmt::Result {
            match tree.node(id) {
                Node::Leaf(l) => write!(f, "{l}"),
                Node::Not(c) => {
                    f.write_str("not(")?;
                    write_node(tree, *c, f)?;
                    f.write_str(")")
                }
                Node::Guard(c) => {
                    f.write_str("guard(")?;
                    write_node(tree, *c, f)?;
                    f.write_str(")")
                }
                Node::Nop => f.write_str("nop"),
                node => {
                    let Some((op, l, r)) = node.as_binary() else {
                        return Ok(());
                    };
                    write!(f, "{op}(")?;
                    write_node(tree, l, f)?;
                    f.write_str(", ")?;
                    write_node(tree, r, f)?;
                    f.write_str(")")
                }
            }
        }
        write_node(self, self.root, f)
    }
}
