//! Byte stream adapters for handing ropes to file I/O.

use crate::{builder::TreeBuilder, cow::CowContext, node::Node, rope::Rope};
use std::{
    cmp::min,
    fmt,
    io::{self, Read, Write},
    mem, str,
};

/// Serializes a rope as UTF-8.
///
/// The reader holds its own handles to the tree, so it stays valid however
/// the rope it came from is edited afterwards.
pub struct RopeReader {
    // Subtrees still to be visited, next on top.
    stack: Vec<Node>,
    leaf: Option<Node>,
    // Byte position inside `leaf`.
    pos: usize,
}

impl RopeReader {
    pub(crate) fn new(root: Node) -> Self {
        Self {
            stack: vec![root],
            leaf: None,
            pos: 0,
        }
    }

    /// Make sure `leaf` has unread bytes. False once the tree is exhausted.
    fn fill(&mut self) -> bool {
        loop {
            if let Some(leaf) = self.leaf.as_ref().and_then(Node::as_leaf) {
                if self.pos < leaf.as_str().len() {
                    return true;
                }
            }
            let Some(node) = self.stack.pop() else {
                self.leaf = None;
                return false;
            };
            if node.is_leaf() {
                self.leaf = Some(node);
                self.pos = 0;
            } else {
                self.stack.extend(node.children().iter().rev().cloned());
            }
        }
    }
}

impl Read for RopeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() && self.fill() {
            let Some(leaf) = self.leaf.as_ref().and_then(Node::as_leaf) else {
                break;
            };
            let bytes = &leaf.as_str().as_bytes()[self.pos..];
            let n = min(bytes.len(), buf.len() - written);
            buf[written..written + n].copy_from_slice(&bytes[..n]);
            written += n;
            self.pos += n;
        }
        Ok(written)
    }
}

/// Builds a rope from a stream of UTF-8 bytes, appending at the end.
///
/// A multi-byte sequence split across two writes is held back until it is
/// complete.
pub struct RopeWriter {
    ctx: CowContext,
    rope: Rope,
    pending: Vec<u8>,
}

impl RopeWriter {
    pub fn new() -> Self {
        Self::with_context(CowContext::default())
    }

    pub fn with_context(ctx: CowContext) -> Self {
        Self {
            ctx,
            rope: Rope::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn from_rope(rope: Rope) -> Self {
        Self {
            rope,
            ..Self::new()
        }
    }

    /// Everything written so far, excluding an incomplete trailing sequence.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Finish writing. Fails if the stream stopped inside a UTF-8 sequence.
    pub fn finish(self) -> io::Result<Rope> {
        if !self.pending.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "stream ended inside a UTF-8 sequence ({} dangling bytes)",
                    self.pending.len()
                ),
            ));
        }
        Ok(self.rope)
    }

    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let rope = mem::take(&mut self.rope);
        let mut b = TreeBuilder::with_context(self.ctx.clone());
        b.push(rope.into_node());
        b.push_str(text);
        self.rope = Rope::from_builder(b);
    }

    // Append the first `valid` pending bytes, keeping the rest pending.
    fn commit(&mut self, valid: usize) -> io::Result<()> {
        let rest = self.pending.split_off(valid);
        let complete = mem::replace(&mut self.pending, rest);
        let text = String::from_utf8(complete)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.append(&text);
        Ok(())
    }
}

impl Default for RopeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for RopeWriter {
    /// Accepts whole UTF-8 sequences and holds back an incomplete trailing
    /// one. A buffer with a valid prefix before a malformed byte reports only
    /// the prefix as written; the malformed byte fails the next call.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let before = self.pending.len();
        self.pending.extend_from_slice(buf);
        match str::from_utf8(&self.pending) {
            Ok(text) => {
                let valid = text.len();
                self.commit(valid)?;
                Ok(buf.len())
            },
            Err(err) if err.error_len().is_some() => {
                let valid = err.valid_up_to();
                if valid <= before {
                    self.pending.truncate(before);
                    return Err(io::Error::new(io::ErrorKind::InvalidData, err));
                }
                self.pending.truncate(valid);
                self.commit(valid)?;
                Ok(valid - before)
            },
            Err(err) => {
                self.commit(err.valid_up_to())?;
                Ok(buf.len())
            },
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for RopeWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.pending.is_empty() {
            return Err(fmt::Error);
        }
        self.append(s);
        Ok(())
    }
}
