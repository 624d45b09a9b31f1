//! Incremental construction of balanced trees.
//!
//! Slicing and editing both reduce to pushing a sequence of whole nodes and
//! leaf slices into a [`TreeBuilder`] and building the result.

use crate::{
    cow::CowContext,
    error::{violation, EmptyBuilderSnafu, Result},
    interval::Interval,
    leaf::{Leaf, TextLeaf},
    merge::concat,
    node::{Node, NodeVal},
    MAX_CHILDREN, MAX_LEAF, MIN_CHILDREN,
};
use snafu::ensure;
use std::cmp::{min, Ordering};

/// Accumulates nodes left to right into one balanced tree.
pub struct TreeBuilder {
    ctx: CowContext,
    // Layers of partially built trees, in strictly descending height from
    // the bottom of the stack. Every layer holds between one and
    // MAX_CHILDREN - 1 nodes of equal height, and a layer of more than one
    // node holds only nodes that satisfy is_ok_child.
    stack: Vec<Vec<Node>>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::with_context(CowContext::default())
    }

    /// A builder whose intermediate vectors come from `ctx`'s pool.
    pub fn with_context(ctx: CowContext) -> Self {
        Self {
            ctx,
            stack: Vec::new(),
        }
    }

    pub fn context(&self) -> &CowContext {
        &self.ctx
    }

    /// True until the first node is pushed.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Append a whole node.
    pub fn push(&mut self, node: Node) {
        let mut node = node;
        loop {
            let ord = match self.stack.last().and_then(|layer| layer.first()) {
                Some(first) => first.height().cmp(&node.height()),
                None => Ordering::Greater,
            };
            match ord {
                Ordering::Less => {
                    let top = self.pop_layer();
                    node = concat(&self.ctx, top, node);
                },
                Ordering::Equal => {
                    let Some(layer) = self.stack.last_mut() else {
                        violation("TreeBuilder.push: missing top layer");
                    };
                    push_equal(&self.ctx, layer, node);
                    if layer.len() < MAX_CHILDREN {
                        break;
                    }
                    node = self.pop_layer();
                },
                Ordering::Greater => {
                    let mut layer = self.ctx.alloc_children();
                    layer.push(node);
                    self.stack.push(layer);
                    break;
                },
            }
        }
    }

    /// Append the part of `node` covered by `iv`.
    ///
    /// Whole subtrees inside `iv` are shared rather than copied; only the
    /// leaves cut by the interval boundaries are sliced.
    pub fn push_slice(&mut self, node: &Node, iv: Interval) {
        if iv.is_empty() {
            return;
        }
        if iv == node.interval() {
            self.push(node.clone());
            return;
        }
        match &node.0.val {
            NodeVal::Leaf(leaf) => self.push_leaf(leaf.slice(iv)),
            NodeVal::Internal(children) => {
                let mut offset = 0;
                for child in children {
                    if iv.is_before(offset) {
                        break;
                    }
                    let child_iv = child.interval().translate(offset);
                    let overlap = iv.intersect(child_iv);
                    if !overlap.is_empty() {
                        self.push_slice(child, overlap.translate_neg(offset));
                    }
                    offset += child.len();
                }
            },
        }
    }

    pub fn push_leaf(&mut self, leaf: TextLeaf) {
        self.push(Node::from_leaf(leaf));
    }

    pub fn push_leaves(&mut self, leaves: impl IntoIterator<Item = TextLeaf>) {
        for leaf in leaves {
            self.push_leaf(leaf);
        }
    }

    /// Append `text`, cut into leaves of at most [`MAX_LEAF`] characters.
    pub fn push_str(&mut self, text: &str) {
        let mut rest = text;
        while !rest.is_empty() {
            let end = rest
                .char_indices()
                .nth(MAX_LEAF)
                .map_or(rest.len(), |(ix, _)| ix);
            let (chunk, tail) = rest.split_at(end);
            self.push_leaf(TextLeaf::from(chunk));
            rest = tail;
        }
    }

    /// Collapse the stack into a single tree.
    pub fn build(mut self) -> Result<Node> {
        ensure!(!self.stack.is_empty(), EmptyBuilderSnafu);
        let mut node = self.pop_layer();
        while !self.stack.is_empty() {
            let top = self.pop_layer();
            node = concat(&self.ctx, top, node);
        }
        Ok(node)
    }

    /// Remove the top layer and turn it into one node.
    fn pop_layer(&mut self) -> Node {
        let Some(mut layer) = self.stack.pop() else {
            violation("TreeBuilder.pop_layer: empty stack");
        };
        if layer.len() > 1 {
            tracing::trace!(
                "TreeBuilder.pop_layer: collapsing {} nodes of height {}",
                layer.len(),
                layer[0].height()
            );
            return Node::from_nodes(layer);
        }
        match layer.pop() {
            Some(node) => {
                self.ctx.recycle(layer);
                node
            },
            None => violation("TreeBuilder.pop_layer: empty layer"),
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Append `node` to a layer of the same height, merging it into the layer's
/// last node when either of the two is too small to stand alone.
fn push_equal(ctx: &CowContext, layer: &mut Vec<Node>, node: Node) {
    let Some(mut last) = layer.pop() else {
        violation("TreeBuilder.push: empty layer");
    };
    if last.is_ok_child() && node.is_ok_child() {
        layer.push(last);
        layer.push(node);
        return;
    }

    if node.is_leaf() {
        let rest = {
            let body = ctx.mutable_for(&mut last);
            let rest = body.leaf_mut().push_maybe_split(node.get_leaf());
            body.refresh();
            rest
        };
        let outcome = ctx.free_node(node);
        tracing::trace!("TreeBuilder.push: released merged leaf ({outcome:?})");
        if let Some(rest) = rest {
            tracing::trace!(
                "TreeBuilder.push: leaf split into {} + {} chars",
                last.len(),
                rest.len()
            );
            layer.push(last);
            layer.push(Node::from_leaf(rest));
        } else {
            layer.push(last);
        }
        return;
    }

    let mut incoming = ctx.take_children(node);
    let total = last.children().len() + incoming.len();
    if total <= MAX_CHILDREN {
        let body = ctx.mutable_for(&mut last);
        body.children_mut().append(&mut incoming);
        body.refresh();
        ctx.recycle(incoming);
        layer.push(last);
        return;
    }

    let splitpoint = min(MAX_CHILDREN, total - MIN_CHILDREN);
    tracing::trace!("TreeBuilder.push: splitting {total} children at {splitpoint}");
    let mut left = ctx.take_children(last);
    left.append(&mut incoming);
    ctx.recycle(incoming);
    let mut right = ctx.alloc_children();
    right.extend(left.drain(splitpoint..));
    layer.push(Node::from_nodes(left));
    layer.push(Node::from_nodes(right));
}
