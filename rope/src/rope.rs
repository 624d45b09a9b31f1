use crate::{
    builder::TreeBuilder,
    cow::CowContext,
    error::{Result, TreeError},
    interval::Interval,
    io::{RopeReader, RopeWriter},
    merge::concat,
    node::Node,
};
use std::{cmp::min, fmt};

/// A persistent text rope.
///
/// Every operation returns a new rope and leaves `self` untouched; unchanged
/// subtrees are shared between the two. Cloning is O(1).
#[derive(Clone, Default)]
pub struct Rope {
    root: Node,
}

impl Rope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_node(self) -> Node {
        self.root
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn newline_count(&self) -> usize {
        self.root.newline_count()
    }

    /// Number of lines; one more than the number of newlines.
    pub fn line_count(&self) -> usize {
        self.newline_count() + 1
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.root.char_at(offset)
    }

    /// Replace the characters in `iv` with `inserted`.
    ///
    /// Insertion is an empty `iv`, deletion an empty `inserted`. The interval
    /// is clamped to the rope.
    pub fn edit(&self, iv: impl Into<Interval>, inserted: &Rope) -> Rope {
        self.edit_with(&CowContext::default(), iv, inserted)
    }

    /// [`Rope::edit`] drawing scratch allocations from `ctx`.
    pub fn edit_with(&self, ctx: &CowContext, iv: impl Into<Interval>, inserted: &Rope) -> Rope {
        let iv = self.clamp(iv.into());
        tracing::debug!(
            "Rope.edit: {iv} of {} chars, inserting {} chars",
            self.len(),
            inserted.len()
        );
        let self_iv = self.root.interval();
        let mut b = TreeBuilder::with_context(ctx.clone());
        b.push_slice(&self.root, self_iv.prefix(iv));
        b.push(inserted.root.clone());
        b.push_slice(&self.root, self_iv.suffix(iv));
        Rope::from_builder(b)
    }

    /// The characters in `iv`, clamped to the rope.
    pub fn slice(&self, iv: impl Into<Interval>) -> Rope {
        let iv = self.clamp(iv.into());
        tracing::debug!("Rope.slice: {iv} of {} chars", self.len());
        let mut b = TreeBuilder::new();
        b.push_slice(&self.root, iv);
        Rope::from_builder(b)
    }

    pub fn concat(&self, other: &Rope) -> Rope {
        Rope {
            root: concat(&CowContext::default(), self.root.clone(), other.root.clone()),
        }
    }

    pub fn insert(&self, offset: usize, text: &str) -> Rope {
        self.edit(offset..offset, &Rope::from(text))
    }

    pub fn delete(&self, iv: impl Into<Interval>) -> Rope {
        self.edit(iv, &Rope::new())
    }

    /// Offset of the first character of `line`, saturating to [`Rope::len`].
    pub fn offset_of_line(&self, line: usize) -> usize {
        self.root.offset_of_line(line)
    }

    /// Line containing `offset`, saturating to the last line.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.root.line_of_offset(offset)
    }

    /// Line `line` without its trailing newline. Empty past the last line.
    pub fn line(&self, line: usize) -> Rope {
        let newlines = self.newline_count();
        if line > newlines {
            return Rope::new();
        }
        let start = self.offset_of_line(line);
        let end = if line < newlines {
            self.offset_of_line(line + 1) - 1
        } else {
            self.len()
        };
        self.slice(start..end)
    }

    pub fn get_line(&self, line: usize) -> String {
        self.line(line).to_string()
    }

    /// The leaves' text in order.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            stack: vec![&self.root],
        }
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.chunks().flat_map(str::chars)
    }

    pub fn to_char_array(&self) -> Vec<char> {
        let mut chars = Vec::with_capacity(self.len());
        chars.extend(self.chars());
        chars
    }

    /// True when both ropes share the same root.
    pub fn ptr_eq(&self, other: &Rope) -> bool {
        self.root.ptr_eq(&other.root)
    }

    /// Check the balancing invariants and cached metrics of the whole tree.
    pub fn validate(&self) -> Result<()> {
        self.root.validate()
    }

    pub fn reader(&self) -> RopeReader {
        RopeReader::new(self.root.clone())
    }

    /// A reader positioned at character `offset`.
    pub fn reader_at(&self, offset: usize) -> RopeReader {
        RopeReader::new(self.slice(offset..self.len()).root)
    }

    /// A writer that appends to a copy of this rope.
    pub fn writer(&self) -> RopeWriter {
        RopeWriter::from_rope(self.clone())
    }

    fn clamp(&self, iv: Interval) -> Interval {
        let hi = min(iv.hi, self.len());
        Interval::new(min(iv.lo, hi), hi)
    }

    pub(crate) fn from_builder(builder: TreeBuilder) -> Rope {
        match builder.build() {
            Ok(root) => Rope { root },
            Err(TreeError::EmptyBuilder) => Rope::new(),
            Err(err) => panic!("{err}"),
        }
    }
}

impl From<&str> for Rope {
    fn from(text: &str) -> Self {
        let mut b = TreeBuilder::new();
        b.push_str(text);
        Rope::from_builder(b)
    }
}

impl From<String> for Rope {
    fn from(text: String) -> Self {
        Rope::from(text.as_str())
    }
}

impl From<&String> for Rope {
    fn from(text: &String) -> Self {
        Rope::from(text.as_str())
    }
}

impl From<Node> for Rope {
    fn from(root: Node) -> Self {
        Rope { root }
    }
}

impl FromIterator<char> for Rope {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let text: String = iter.into_iter().collect();
        Rope::from(text)
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rope")
            .field("len", &self.len())
            .field("lines", &self.line_count())
            .field("height", &self.root.height())
            .field("text", &self.to_string())
            .finish()
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.len() == other.len()
            && self.newline_count() == other.newline_count()
            && self.chars().eq(other.chars())
    }
}

impl Eq for Rope {}

impl PartialEq<str> for Rope {
    fn eq(&self, other: &str) -> bool {
        let mut rest = other;
        for chunk in self.chunks() {
            match rest.strip_prefix(chunk) {
                Some(tail) => rest = tail,
                None => return false,
            }
        }
        rest.is_empty()
    }
}

impl PartialEq<&str> for Rope {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Iterator over the non-empty leaf texts of a rope, left to right.
pub struct Chunks<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some(node) = self.stack.pop() {
            match node.as_leaf() {
                Some(leaf) if !leaf.as_str().is_empty() => return Some(leaf.as_str()),
                Some(_) => {},
                None => self.stack.extend(node.children().iter().rev()),
            }
        }
        None
    }
}
