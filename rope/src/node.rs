//! Tree nodes and their cached metrics.
//!
//! A [`Node`] is a cheap handle onto an [`Arc`]-shared body. Cloning a node
//! never copies text; two ropes that share a subtree share the same body.
//! Mutation only ever happens through [`crate::CowContext::mutable_for`],
//! which copies a body first if any other handle can observe it.

use crate::{
    error::{violation, InvariantViolationSnafu, Result},
    interval::Interval,
    leaf::{Leaf, TextLeaf},
    MAX_CHILDREN, MAX_LEAF, MIN_CHILDREN, MIN_LEAF,
};
use snafu::ensure;
use std::{fmt, sync::Arc};

/// Aggregate metrics of a subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeInfo {
    /// Length in characters.
    pub len: usize,
    /// Number of `'\n'` characters.
    pub newlines: usize,
}

impl NodeInfo {
    pub fn compute(leaf: &TextLeaf) -> Self {
        Self {
            len: leaf.len(),
            newlines: leaf.newline_count(),
        }
    }

    /// Fold `other`, which must follow `self` in document order.
    pub fn accumulate(&mut self, other: &NodeInfo) {
        self.len += other.len;
        self.newlines += other.newlines;
    }
}

#[derive(Clone)]
pub(crate) enum NodeVal {
    Leaf(TextLeaf),
    Internal(Vec<Node>),
}

#[derive(Clone)]
pub struct NodeBody {
    height: usize,
    info: NodeInfo,
    pub(crate) val: NodeVal,
}

impl NodeBody {
    pub(crate) fn new_leaf(leaf: TextLeaf) -> Self {
        Self {
            height: 0,
            info: NodeInfo::compute(&leaf),
            val: NodeVal::Leaf(leaf),
        }
    }

    pub(crate) fn new_internal(height: usize, children: Vec<Node>) -> Self {
        let mut body = Self {
            height,
            info: NodeInfo::default(),
            val: NodeVal::Internal(children),
        };
        body.refresh();
        body
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub(crate) fn leaf_mut(&mut self) -> &mut TextLeaf {
        match &mut self.val {
            NodeVal::Leaf(leaf) => leaf,
            NodeVal::Internal(_) => violation("leaf access on an internal node"),
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Node> {
        match &mut self.val {
            NodeVal::Internal(children) => children,
            NodeVal::Leaf(_) => violation("child access on a leaf node"),
        }
    }

    /// Recompute the cached metrics after the content was rewritten in place.
    pub(crate) fn refresh(&mut self) {
        self.info = match &self.val {
            NodeVal::Leaf(leaf) => NodeInfo::compute(leaf),
            NodeVal::Internal(children) => {
                children.iter().fold(NodeInfo::default(), |mut info, child| {
                    info.accumulate(child.info());
                    info
                })
            },
        };
    }
}

/// A node of the b-tree, either a leaf holding text or an internal node
/// holding between [`MIN_CHILDREN`] and [`MAX_CHILDREN`] children of equal
/// height.
#[derive(Clone)]
pub struct Node(pub(crate) Arc<NodeBody>);

impl Node {
    pub fn from_leaf(leaf: TextLeaf) -> Node {
        Node(Arc::new(NodeBody::new_leaf(leaf)))
    }

    /// Build an internal node over `children`.
    ///
    /// Fails when the list is empty or longer than [`MAX_CHILDREN`], when
    /// heights differ, or when a child is too small to stand as a sibling.
    pub fn from_children(children: Vec<Node>) -> Result<Node> {
        ensure!(
            !children.is_empty(),
            InvariantViolationSnafu {
                message: "internal node without children",
            }
        );
        ensure!(
            children.len() <= MAX_CHILDREN,
            InvariantViolationSnafu {
                message: format!(
                    "{} children exceed the maximum of {MAX_CHILDREN}",
                    children.len()
                ),
            }
        );
        let child_height = children[0].height();
        for (ix, child) in children.iter().enumerate() {
            ensure!(
                child.height() == child_height,
                InvariantViolationSnafu {
                    message: format!(
                        "child {ix} has height {} but its siblings have height {child_height}",
                        child.height()
                    ),
                }
            );
            ensure!(
                child.is_ok_child(),
                InvariantViolationSnafu {
                    message: format!("child {ix} is below its minimum size"),
                }
            );
        }
        Ok(Node(Arc::new(NodeBody::new_internal(
            child_height + 1,
            children,
        ))))
    }

    /// [`Node::from_children`] for callers that have already balanced the
    /// list. A failure here is a bug in the balancing code.
    #[track_caller]
    pub(crate) fn from_nodes(children: Vec<Node>) -> Node {
        Node::from_children(children).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn body(&self) -> &NodeBody {
        &self.0
    }

    pub fn info(&self) -> &NodeInfo {
        &self.0.info
    }

    pub fn len(&self) -> usize {
        self.0.info.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn newline_count(&self) -> usize {
        self.0.info.newlines
    }

    pub fn height(&self) -> usize {
        self.0.height
    }

    pub fn is_leaf(&self) -> bool {
        self.height() == 0
    }

    /// `[0, len)`.
    pub fn interval(&self) -> Interval {
        Interval::new(0, self.len())
    }

    /// True when both handles point at the same body.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_ok_child(&self) -> bool {
        match &self.0.val {
            NodeVal::Leaf(leaf) => leaf.is_ok_child(),
            NodeVal::Internal(children) => children.len() >= MIN_CHILDREN,
        }
    }

    pub fn as_leaf(&self) -> Option<&TextLeaf> {
        match &self.0.val {
            NodeVal::Leaf(leaf) => Some(leaf),
            NodeVal::Internal(_) => None,
        }
    }

    /// The children of an internal node; empty for a leaf.
    pub fn children(&self) -> &[Node] {
        match &self.0.val {
            NodeVal::Internal(children) => children,
            NodeVal::Leaf(_) => &[],
        }
    }

    pub(crate) fn get_leaf(&self) -> &TextLeaf {
        match &self.0.val {
            NodeVal::Leaf(leaf) => leaf,
            NodeVal::Internal(_) => violation("get_leaf called on an internal node"),
        }
    }

    pub(crate) fn get_children(&self) -> &[Node] {
        match &self.0.val {
            NodeVal::Internal(children) => children,
            NodeVal::Leaf(_) => violation("get_children called on a leaf node"),
        }
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.len() {
            return None;
        }
        let mut node = self;
        let mut offset = offset;
        while let NodeVal::Internal(children) = &node.0.val {
            let mut next = None;
            for child in children {
                if offset < child.len() {
                    next = Some(child);
                    break;
                }
                offset -= child.len();
            }
            node = next?;
        }
        node.get_leaf().char_at(offset)
    }

    /// Offset of the first character of line `line`.
    ///
    /// Line zero starts at offset zero; line `n` starts one past the `n`-th
    /// newline. Lines past the last newline saturate to [`Node::len`].
    pub fn offset_of_line(&self, line: usize) -> usize {
        if line > self.newline_count() {
            return self.len();
        }
        let mut node = self;
        let mut line = line;
        let mut offset = 0;
        while let NodeVal::Internal(children) = &node.0.val {
            let mut next = None;
            for child in children {
                let newlines = child.newline_count();
                if line <= newlines {
                    next = Some(child);
                    break;
                }
                line -= newlines;
                offset += child.len();
            }
            match next {
                Some(child) => node = child,
                None => return offset,
            }
        }
        offset + node.get_leaf().offset_of_line(line)
    }

    /// Line containing `offset`, i.e. the number of newlines before it.
    ///
    /// Offsets at or past the end saturate to the last line.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        if offset >= self.len() {
            return self.newline_count();
        }
        let mut node = self;
        let mut offset = offset;
        let mut line = 0;
        while let NodeVal::Internal(children) = &node.0.val {
            let mut next = None;
            for child in children {
                if offset < child.len() {
                    next = Some(child);
                    break;
                }
                offset -= child.len();
                line += child.newline_count();
            }
            match next {
                Some(child) => node = child,
                None => return line,
            }
        }
        line + node.get_leaf().line_of_offset(offset)
    }

    /// Check every structural invariant of the subtree rooted here, treating
    /// this node as the root of a finished tree.
    pub fn validate(&self) -> Result<()> {
        self.validate_node(true)
    }

    fn validate_node(&self, is_root: bool) -> Result<()> {
        match &self.0.val {
            NodeVal::Leaf(leaf) => {
                ensure!(
                    self.height() == 0,
                    InvariantViolationSnafu {
                        message: format!("leaf recorded at height {}", self.height()),
                    }
                );
                ensure!(
                    leaf.len() <= MAX_LEAF,
                    InvariantViolationSnafu {
                        message: format!("leaf of {} chars exceeds {MAX_LEAF}", leaf.len()),
                    }
                );
                ensure!(
                    is_root || leaf.len() >= MIN_LEAF,
                    InvariantViolationSnafu {
                        message: format!("leaf of {} chars is below {MIN_LEAF}", leaf.len()),
                    }
                );
                ensure!(
                    *self.info() == NodeInfo::compute(leaf),
                    InvariantViolationSnafu {
                        message: format!("stale leaf metrics {:?}", self.info()),
                    }
                );
            },
            NodeVal::Internal(children) => {
                let min = if is_root { 2 } else { MIN_CHILDREN };
                ensure!(
                    (min..=MAX_CHILDREN).contains(&children.len()),
                    InvariantViolationSnafu {
                        message: format!(
                            "{} children at height {} outside [{min}, {MAX_CHILDREN}]",
                            children.len(),
                            self.height()
                        ),
                    }
                );
                let mut info = NodeInfo::default();
                for child in children {
                    ensure!(
                        child.height() + 1 == self.height(),
                        InvariantViolationSnafu {
                            message: format!(
                                "child of height {} under a node of height {}",
                                child.height(),
                                self.height()
                            ),
                        }
                    );
                    child.validate_node(false)?;
                    info.accumulate(child.info());
                }
                ensure!(
                    info == *self.info(),
                    InvariantViolationSnafu {
                        message: format!(
                            "cached metrics {:?} disagree with children {:?}",
                            self.info(),
                            info
                        ),
                    }
                );
            },
        }
        Ok(())
    }
}

impl Default for Node {
    fn default() -> Node {
        Node::from_leaf(TextLeaf::default())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.val {
            NodeVal::Leaf(leaf) => f.debug_tuple("Leaf").field(&leaf.as_str()).finish(),
            NodeVal::Internal(children) => f
                .debug_struct("Internal")
                .field("height", &self.height())
                .field("len", &self.len())
                .field("newlines", &self.newline_count())
                .field("children", children)
                .finish(),
        }
    }
}
