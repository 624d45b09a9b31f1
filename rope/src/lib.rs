//! A persistent, height-balanced b-tree rope for editor text storage.
//!
//! Text lives in leaves of [`MIN_LEAF`]..=[`MAX_LEAF`] characters; internal
//! nodes hold [`MIN_CHILDREN`]..=[`MAX_CHILDREN`] children of equal height and
//! cache the length and newline count of their subtree, so offset and line
//! lookups are O(log n).
//!
//! The key components are:
//! - [`Rope`] - the public value type; every edit returns a new rope that
//!   shares unchanged subtrees with the old one
//! - [`TreeBuilder`] - reassembles a balanced tree from pushed nodes and
//!   slices, used by slicing and editing
//! - [`CowContext`] - decides when a node may be rewritten in place and pools
//!   child vectors between edits
//! - [`RopeReader`] / [`RopeWriter`] - `std::io` adapters for file I/O
//!
//! All offsets are character offsets, never bytes.
//!
//! ```
//! use brope::Rope;
//!
//! let rope = Rope::from("foo\nbaz\n");
//! let edited = rope.edit(6..7, &Rope::from("r"));
//! assert_eq!(edited.get_line(1), "bar");
//! assert_eq!(rope.get_line(1), "baz");
//! ```

pub mod builder;
pub mod cow;
pub mod error;
pub mod interval;
pub mod io;
pub mod leaf;
pub mod merge;
pub mod node;
pub mod rope;

pub use builder::TreeBuilder;
pub use cow::{CowContext, FreeList, FreeOutcome};
pub use error::{Result, TreeError};
pub use interval::Interval;
pub use io::{RopeReader, RopeWriter};
pub use leaf::{Leaf, TextLeaf};
pub use merge::concat;
pub use node::{Node, NodeBody, NodeInfo};
pub use rope::{Chunks, Rope};

/// Minimum characters in a leaf that has siblings.
pub const MIN_LEAF: usize = 511;
/// Maximum characters in any leaf.
pub const MAX_LEAF: usize = 1024;
/// Minimum children of an internal node below the root.
pub const MIN_CHILDREN: usize = 4;
/// Maximum children of any internal node.
pub const MAX_CHILDREN: usize = 8;
/// Pool capacity of [`CowContext::default`].
pub const DEFAULT_FREE_LIST_SIZE: usize = 32;
