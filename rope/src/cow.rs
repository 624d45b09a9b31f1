//! Copy-on-write ownership and a shared pool of child vectors.
//!
//! A node may be rewritten in place only while its handle is the sole
//! reference to the body; otherwise it is shallow-copied first. This is the
//! [`Arc`] reference count, not a token stored in the node.
//!
//! Every tree edited under one [`CowContext`] draws child vectors from the
//! same [`FreeList`], and retired internal nodes hand theirs back.

use crate::{
    error::violation,
    node::{Node, NodeBody, NodeVal},
    DEFAULT_FREE_LIST_SIZE, MAX_CHILDREN,
};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};

/// Result of [`CowContext::free_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeOutcome {
    /// The node was uniquely owned and its child vector went back to the pool.
    Stored,
    /// The node was uniquely owned and dropped; the pool was full or the node
    /// was a leaf.
    Discarded,
    /// Another handle still references the node, so it was left alone.
    NotOwned,
}

/// A bounded pool of empty child vectors.
///
/// Safe to share between threads; every access takes the lock.
pub struct FreeList {
    capacity: usize,
    pool: Mutex<Vec<Vec<Node>>>,
}

impl FreeList {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pool: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of vectors currently waiting for reuse.
    pub fn len(&self) -> usize {
        self.pool.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn alloc(&self) -> Vec<Node> {
        self.pool
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(MAX_CHILDREN))
    }

    /// Offer `children` back to the pool. Returns false if the pool is full.
    pub(crate) fn recycle(&self, mut children: Vec<Node>) -> bool {
        children.clear();
        let mut pool = self.pool.lock();
        if pool.len() >= self.capacity {
            return false;
        }
        pool.push(children);
        true
    }
}

impl fmt::Debug for FreeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeList")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Ownership context for in-place tree edits.
///
/// Clones share one [`FreeList`].
#[derive(Clone, Debug)]
pub struct CowContext {
    free_list: Arc<FreeList>,
}

impl CowContext {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FREE_LIST_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free_list: Arc::new(FreeList::new(capacity)),
        }
    }

    pub fn free_list(&self) -> &FreeList {
        &self.free_list
    }

    /// True when both contexts draw from the same pool.
    pub fn shares_pool_with(&self, other: &CowContext) -> bool {
        Arc::ptr_eq(&self.free_list, &other.free_list)
    }

    pub(crate) fn alloc_children(&self) -> Vec<Node> {
        self.free_list.alloc()
    }

    pub(crate) fn recycle(&self, children: Vec<Node>) {
        self.free_list.recycle(children);
    }

    /// Mutable access to the body behind `node`.
    ///
    /// If `node` is the only handle to its body it is returned as is.
    /// Otherwise `node` is repointed at a shallow copy: children are shared,
    /// leaf text is copied. Callers that change the content must call
    /// [`NodeBody::refresh`] afterwards.
    pub fn mutable_for<'a>(&self, node: &'a mut Node) -> &'a mut NodeBody {
        if Arc::get_mut(&mut node.0).is_none() {
            let body = match &node.0.val {
                NodeVal::Leaf(leaf) => NodeBody::new_leaf(leaf.clone()),
                NodeVal::Internal(children) => {
                    let mut copy = self.alloc_children();
                    copy.extend(children.iter().cloned());
                    NodeBody::new_internal(node.height(), copy)
                },
            };
            *node = Node(Arc::new(body));
        }
        // Unique at this point, so this never clones.
        Arc::make_mut(&mut node.0)
    }

    /// Release `node`, returning its child vector to the pool when nothing
    /// else references it.
    pub fn free_node(&self, node: Node) -> FreeOutcome {
        let body = match Arc::try_unwrap(node.0) {
            Ok(body) => body,
            Err(_) => return FreeOutcome::NotOwned,
        };
        match body.val {
            NodeVal::Internal(children) => {
                if self.free_list.recycle(children) {
                    tracing::trace!("CowContext.free_node: stored child vector");
                    FreeOutcome::Stored
                } else {
                    FreeOutcome::Discarded
                }
            },
            NodeVal::Leaf(_) => FreeOutcome::Discarded,
        }
    }

    /// Move the children out of an internal node.
    ///
    /// A uniquely owned node gives up its own vector; a shared one has its
    /// child handles cloned into a pooled vector.
    pub(crate) fn take_children(&self, node: Node) -> Vec<Node> {
        match Arc::try_unwrap(node.0) {
            Ok(body) => match body.val {
                NodeVal::Internal(children) => children,
                NodeVal::Leaf(_) => violation("take_children called on a leaf node"),
            },
            Err(shared) => {
                let mut children = self.alloc_children();
                children.extend(Node(shared).get_children().iter().cloned());
                children
            },
        }
    }
}

impl Default for CowContext {
    fn default() -> Self {
        Self::new()
    }
}
