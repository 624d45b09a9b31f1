//! Leaf content of the tree.
//!
//! The tree only ever talks to its leaves through [`Leaf`], so a second
//! representation (say, a piece table over a mapped file) can be added later
//! without touching the balancing code. [`TextLeaf`] is the one variant in use.

use crate::{interval::Interval, MAX_LEAF, MIN_LEAF};
use std::{cmp::min, fmt};

/// The capability set a content chunk must provide.
///
/// All offsets are in characters (Unicode scalar values), never bytes.
pub trait Leaf: Clone + Default {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn char_at(&self, offset: usize) -> Option<char>;

    /// Copy of the characters covered by `iv`, clamped to the leaf.
    fn slice(&self, iv: Interval) -> Self;

    /// Whether the leaf is large enough to stand next to siblings without
    /// being merged first.
    fn is_ok_child(&self) -> bool {
        self.len() >= MIN_LEAF
    }

    fn newline_count(&self) -> usize;

    /// Offset one past the `line`-th newline, or [`Leaf::len`] if the leaf
    /// holds fewer newlines. Line zero starts at offset zero.
    fn offset_of_line(&self, line: usize) -> usize;

    /// Number of newlines strictly before `offset`.
    fn line_of_offset(&self, offset: usize) -> usize;

    /// Append `other`, splitting off a second leaf when the result would
    /// exceed [`MAX_LEAF`].
    ///
    /// When a split happens both halves satisfy [`Leaf::is_ok_child`]: the
    /// first leaf takes [`MAX_LEAF`] characters unless that would leave fewer
    /// than [`MIN_LEAF`] for the second.
    fn push_maybe_split(&mut self, other: &Self) -> Option<Self>;
}

/// A contiguous run of UTF-8 text with its character count cached.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TextLeaf {
    text: String,
    chars: usize,
}

impl TextLeaf {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars = bytecount::num_chars(text.as_bytes());
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> std::str::Chars<'_> {
        self.text.chars()
    }

    fn is_ascii(&self) -> bool {
        self.text.len() == self.chars
    }

    /// Byte index of the character at `offset`, or the byte length past the end.
    fn byte_offset(&self, offset: usize) -> usize {
        if offset >= self.chars {
            return self.text.len();
        }
        if self.is_ascii() {
            return offset;
        }
        self.text
            .char_indices()
            .nth(offset)
            .map_or(self.text.len(), |(ix, _)| ix)
    }

    fn char_offset(&self, byte: usize) -> usize {
        if self.is_ascii() {
            byte
        } else {
            bytecount::num_chars(&self.text.as_bytes()[..byte])
        }
    }
}

impl Leaf for TextLeaf {
    fn len(&self) -> usize {
        self.chars
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.chars {
            return None;
        }
        if self.is_ascii() {
            return self.text.as_bytes().get(offset).map(|&b| char::from(b));
        }
        self.text.chars().nth(offset)
    }

    fn slice(&self, iv: Interval) -> Self {
        let hi = min(iv.hi, self.chars);
        let lo = min(iv.lo, hi);
        let start = self.byte_offset(lo);
        let end = self.byte_offset(hi);
        Self {
            text: self.text[start..end].to_owned(),
            chars: hi - lo,
        }
    }

    fn newline_count(&self) -> usize {
        bytecount::count(self.text.as_bytes(), b'\n')
    }

    fn offset_of_line(&self, line: usize) -> usize {
        if line == 0 {
            return 0;
        }
        match memchr::memchr_iter(b'\n', self.text.as_bytes()).nth(line - 1) {
            Some(pos) => self.char_offset(pos) + 1,
            None => self.chars,
        }
    }

    fn line_of_offset(&self, offset: usize) -> usize {
        let end = self.byte_offset(offset);
        bytecount::count(&self.text.as_bytes()[..end], b'\n')
    }

    fn push_maybe_split(&mut self, other: &Self) -> Option<Self> {
        let total = self.chars + other.chars;
        self.text.push_str(&other.text);
        self.chars = total;
        if total <= MAX_LEAF {
            return None;
        }

        let splitpoint = min(MAX_LEAF, total - MIN_LEAF);
        let byte = self.byte_offset(splitpoint);
        let rest = self.text.split_off(byte);
        self.chars = splitpoint;
        Some(Self {
            text: rest,
            chars: total - splitpoint,
        })
    }
}

impl From<&str> for TextLeaf {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for TextLeaf {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Debug for TextLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextLeaf")
            .field("chars", &self.chars)
            .field("text", &self.text)
            .finish()
    }
}
