//! Height-aware concatenation.
//!
//! [`concat`] joins two balanced trees into one balanced tree whose height is
//! at most one more than the taller input. Nodes that are uniquely owned are
//! consumed in place; shared ones are copied only along the seam.

use crate::{
    cow::CowContext,
    error::violation,
    leaf::Leaf,
    node::Node,
    MAX_CHILDREN, MIN_CHILDREN,
};
use std::cmp::{min, Ordering};

/// `a` followed by `b`.
pub fn concat(ctx: &CowContext, a: Node, b: Node) -> Node {
    if a.is_empty() {
        return b;
    }
    if b.is_empty() {
        return a;
    }

    let h1 = a.height();
    let h2 = b.height();
    match h1.cmp(&h2) {
        Ordering::Less => {
            if h1 == h2 - 1 && a.is_ok_child() {
                return merge_nodes(ctx, single(ctx, a), ctx.take_children(b));
            }
            let mut children2 = ctx.take_children(b);
            if children2.is_empty() {
                violation("internal node without children in concat");
            }
            let first = children2.remove(0);
            let joined = concat(ctx, a, first);
            if joined.height() == h2 - 1 {
                merge_nodes(ctx, single(ctx, joined), children2)
            } else {
                merge_nodes(ctx, ctx.take_children(joined), children2)
            }
        },
        Ordering::Equal => {
            if a.is_ok_child() && b.is_ok_child() {
                return pair(ctx, a, b);
            }
            if h1 == 0 {
                return merge_leaves(ctx, a, b);
            }
            merge_nodes(ctx, ctx.take_children(a), ctx.take_children(b))
        },
        Ordering::Greater => {
            if h2 == h1 - 1 && b.is_ok_child() {
                return merge_nodes(ctx, ctx.take_children(a), single(ctx, b));
            }
            let mut children1 = ctx.take_children(a);
            let Some(last) = children1.pop() else {
                violation("internal node without children in concat");
            };
            let joined = concat(ctx, last, b);
            if joined.height() == h1 - 1 {
                merge_nodes(ctx, children1, single(ctx, joined))
            } else {
                merge_nodes(ctx, children1, ctx.take_children(joined))
            }
        },
    }
}

/// Join two leaves, merging their text unless both are already large enough
/// to be siblings.
pub(crate) fn merge_leaves(ctx: &CowContext, a: Node, b: Node) -> Node {
    debug_assert!(a.is_leaf() && b.is_leaf());
    if a.is_ok_child() && b.is_ok_child() {
        return pair(ctx, a, b);
    }

    let mut a = a;
    let rest = {
        let body = ctx.mutable_for(&mut a);
        let rest = body.leaf_mut().push_maybe_split(b.get_leaf());
        body.refresh();
        rest
    };
    let outcome = ctx.free_node(b);
    tracing::trace!("merge_leaves: released right leaf ({outcome:?})");
    match rest {
        Some(rest) => {
            tracing::trace!(
                "merge_leaves: split into {} + {} chars",
                a.len(),
                rest.len()
            );
            pair(ctx, a, Node::from_leaf(rest))
        },
        None => a,
    }
}

/// Join two child lists of equal height.
///
/// Up to [`MAX_CHILDREN`] children become one node. Beyond that the list is
/// split at `min(MAX_CHILDREN, total - MIN_CHILDREN)` so that both halves
/// hold at least [`MIN_CHILDREN`], and the halves are wrapped in a new parent.
pub(crate) fn merge_nodes(
    ctx: &CowContext,
    mut children1: Vec<Node>,
    mut children2: Vec<Node>,
) -> Node {
    let total = children1.len() + children2.len();
    if total <= MAX_CHILDREN {
        children1.append(&mut children2);
        ctx.recycle(children2);
        return Node::from_nodes(children1);
    }

    let splitpoint = min(MAX_CHILDREN, total - MIN_CHILDREN);
    tracing::trace!("merge_nodes: splitting {total} children at {splitpoint}");
    let mut left = ctx.alloc_children();
    let mut right = ctx.alloc_children();
    for (ix, child) in children1.drain(..).chain(children2.drain(..)).enumerate() {
        if ix < splitpoint {
            left.push(child);
        } else {
            right.push(child);
        }
    }
    ctx.recycle(children1);
    ctx.recycle(children2);

    let mut parent = ctx.alloc_children();
    parent.push(Node::from_nodes(left));
    parent.push(Node::from_nodes(right));
    Node::from_nodes(parent)
}

fn single(ctx: &CowContext, node: Node) -> Vec<Node> {
    let mut children = ctx.alloc_children();
    children.push(node);
    children
}

fn pair(ctx: &CowContext, a: Node, b: Node) -> Node {
    let mut children = ctx.alloc_children();
    children.push(a);
    children.push(b);
    Node::from_nodes(children)
}

#[cfg(test)]
mod tests {
    use super::{concat, merge_leaves, merge_nodes};
    use crate::{cow::CowContext, leaf::TextLeaf, node::Node, MAX_LEAF, MIN_LEAF};

    fn leaf_of(c: char, len: usize) -> Node {
        Node::from_leaf(TextLeaf::from(c.to_string().repeat(len).as_str()))
    }

    fn text(node: &Node) -> String {
        let mut out = String::new();
        collect(node, &mut out);
        out
    }

    fn collect(node: &Node, out: &mut String) {
        match node.as_leaf() {
            Some(leaf) => out.push_str(leaf.as_str()),
            None => node.children().iter().for_each(|child| collect(child, out)),
        }
    }

    fn wide(ctx: &CowContext, count: usize, c: char) -> Node {
        (1..count).fold(leaf_of(c, MIN_LEAF), |acc, _| {
            concat(ctx, acc, leaf_of(c, MIN_LEAF))
        })
    }

    #[test]
    fn small_leaves_merge_into_one() {
        let ctx = CowContext::default();
        let node = merge_leaves(&ctx, leaf_of('a', 3), leaf_of('b', 4));
        assert!(node.is_leaf());
        assert_eq!(text(&node), "aaabbbb");
    }

    #[test]
    fn merging_shared_leaves_leaves_both_intact() {
        let ctx = CowContext::with_capacity(1);
        let a = leaf_of('a', 3);
        let b = leaf_of('b', 4);
        let node = merge_leaves(&ctx, a.clone(), b.clone());
        assert_eq!(text(&node), "aaabbbb");
        assert_eq!(text(&a), "aaa");
        assert_eq!(text(&b), "bbbb");
        assert!(ctx.free_list().is_empty());
    }

    #[test]
    fn ok_leaves_become_siblings() {
        let ctx = CowContext::default();
        let a = leaf_of('a', MIN_LEAF);
        let b = leaf_of('b', MAX_LEAF);
        let node = merge_leaves(&ctx, a.clone(), b.clone());
        assert_eq!(node.height(), 1);
        assert!(node.children()[0].ptr_eq(&a));
        assert!(node.children()[1].ptr_eq(&b));
    }

    #[test]
    fn oversized_leaf_merge_splits() {
        let ctx = CowContext::default();
        let node = merge_leaves(&ctx, leaf_of('a', 100), leaf_of('b', MAX_LEAF));
        assert_eq!(node.height(), 1);
        assert_eq!(node.children()[0].len(), 100 + MAX_LEAF - MIN_LEAF);
        assert_eq!(node.children()[1].len(), MIN_LEAF);
        assert_eq!(text(&node), "a".repeat(100) + &"b".repeat(MAX_LEAF));
        node.validate().expect("both halves within leaf bounds");
    }

    #[test]
    fn merge_nodes_splits_past_max_children() {
        let ctx = CowContext::default();
        let left = (0..6).map(|_| leaf_of('x', MIN_LEAF)).collect();
        let right = (0..5).map(|_| leaf_of('y', MIN_LEAF)).collect();
        let node = merge_nodes(&ctx, left, right);
        assert_eq!(node.height(), 2);
        assert_eq!(node.children()[0].children().len(), 7);
        assert_eq!(node.children()[1].children().len(), 4);
        node.validate().expect("balanced");
    }

    #[test]
    fn concat_grows_by_at_most_one_level() {
        let ctx = CowContext::default();
        let big = wide(&ctx, 40, 'a');
        big.validate().expect("balanced");
        let height = big.height();

        let joined = concat(&ctx, big.clone(), leaf_of('b', 5));
        joined.validate().expect("balanced");
        assert!(joined.height() <= height + 1);
        assert_eq!(joined.len(), 40 * MIN_LEAF + 5);
        assert!(text(&joined).ends_with("abbbbb"));

        let joined = concat(&ctx, leaf_of('c', 5), big.clone());
        joined.validate().expect("balanced");
        assert!(text(&joined).starts_with("ccccca"));

        // The inputs are untouched.
        big.validate().expect("balanced");
        assert_eq!(big.len(), 40 * MIN_LEAF);
    }

    #[test]
    fn concat_of_equal_height_trees() {
        let ctx = CowContext::default();
        let a = wide(&ctx, 3, 'a');
        let b = wide(&ctx, 2, 'b');
        assert_eq!(a.height(), b.height());
        let joined = concat(&ctx, a, b);
        joined.validate().expect("balanced");
        assert_eq!(joined.len(), 5 * MIN_LEAF);
    }

    #[test]
    fn concat_skips_empty_operands() {
        let ctx = CowContext::default();
        let a = leaf_of('a', 10);
        let joined = concat(&ctx, Node::default(), a.clone());
        assert!(joined.ptr_eq(&a));
        let joined = concat(&ctx, a.clone(), Node::default());
        assert!(joined.ptr_eq(&a));
    }
}
