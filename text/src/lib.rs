//! Row and column editing on top of the brope rope.
//!
//! The key components are:
//! - [`buffer::TextBuffer`] - owns the current rope and applies single
//!   character and string edits addressed by [`Point`]
//! - [`point::Point`] - a row/column position in characters

pub mod buffer;
pub mod point;

pub use buffer::{BufferError, TextBuffer};
pub use point::Point;
