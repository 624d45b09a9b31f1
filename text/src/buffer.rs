use crate::point::Point;
use brope::{CowContext, Interval, Rope};
use snafu::{ensure, Snafu};

/// Errors for positions that do not exist in the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum BufferError {
    /// The row is past the last line
    #[snafu(display("Row {row} is out of range for a buffer of {line_count} lines"))]
    RowOutOfRange { row: usize, line_count: usize },

    /// The column is past the end of its line
    #[snafu(display("Column {column} is beyond the length {line_len} of row {row}"))]
    ColumnOutOfRange {
        row: usize,
        column: usize,
        line_len: usize,
    },
}

pub type Result<T, E = BufferError> = std::result::Result<T, E>;

/// An editable text buffer addressed by row and column.
///
/// Each edit replaces the current [`Rope`] with a new version. Versions
/// handed out earlier through [`TextBuffer::snapshot`] stay valid and cheap,
/// since they share everything the edit did not touch.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
    ctx: CowContext,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rope(rope: Rope) -> Self {
        Self {
            rope,
            ctx: CowContext::default(),
        }
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// The current version, independent of later edits.
    pub fn snapshot(&self) -> Rope {
        self.rope.clone()
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.rope.line_count()
    }

    /// Row `row` without its trailing newline.
    pub fn line(&self, row: usize) -> Result<String> {
        self.check_row(row)?;
        Ok(self.rope.get_line(row))
    }

    /// Length of row `row` in characters, excluding the newline.
    pub fn line_len(&self, row: usize) -> Result<usize> {
        self.check_row(row)?;
        let start = self.rope.offset_of_line(row);
        let end = if row < self.rope.newline_count() {
            self.rope.offset_of_line(row + 1) - 1
        } else {
            self.rope.len()
        };
        Ok(end - start)
    }

    /// Character offset of `point`. The column may sit just past the last
    /// character of its row.
    pub fn offset_of_point(&self, point: Point) -> Result<usize> {
        let line_len = self.line_len(point.row)?;
        ensure!(
            point.column <= line_len,
            ColumnOutOfRangeSnafu {
                row: point.row,
                column: point.column,
                line_len,
            }
        );
        Ok(self.rope.offset_of_line(point.row) + point.column)
    }

    /// Position of `offset`, clamped to the end of the buffer.
    pub fn point_of_offset(&self, offset: usize) -> Point {
        let offset = offset.min(self.len());
        let row = self.rope.line_of_offset(offset);
        Point::new(row, offset - self.rope.offset_of_line(row))
    }

    pub fn insert_char(&mut self, row: usize, column: usize, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.insert_str(row, column, c.encode_utf8(&mut buf))
    }

    pub fn insert_str(&mut self, row: usize, column: usize, text: &str) -> Result<()> {
        let offset = self.offset_of_point(Point::new(row, column))?;
        tracing::debug!(
            "TextBuffer.insert_str: {} chars at {row}:{column}",
            text.chars().count()
        );
        self.edit(Interval::new(offset, offset), text);
        Ok(())
    }

    /// Delete the character before `(row, column)`, joining rows when it is
    /// a newline. Returns the removed character, or `None` at the start of
    /// the buffer.
    pub fn delete_at(&mut self, row: usize, column: usize) -> Result<Option<char>> {
        let offset = self.offset_of_point(Point::new(row, column))?;
        if offset == 0 {
            return Ok(None);
        }
        let removed = self.rope.char_at(offset - 1);
        tracing::debug!("TextBuffer.delete_at: {row}:{column} removes {removed:?}");
        self.edit(Interval::new(offset - 1, offset), "");
        Ok(removed)
    }

    pub fn append_char(&mut self, c: char) {
        let end = self.len();
        let mut buf = [0u8; 4];
        self.edit(Interval::new(end, end), c.encode_utf8(&mut buf));
    }

    /// Column of the last character of `row`, or `None` for an empty row.
    pub fn last_char_in_row(&self, row: usize) -> Result<Option<usize>> {
        Ok(self.line_len(row)?.checked_sub(1))
    }

    /// Column of the last character of `row` that is neither whitespace nor
    /// NUL, or `None` when there is none.
    pub fn last_non_whitespace_char(&self, row: usize) -> Result<Option<usize>> {
        let line = self.line(row)?;
        Ok(line
            .chars()
            .enumerate()
            .filter(|&(_, c)| c != '\0' && !c.is_whitespace())
            .map(|(column, _)| column)
            .last())
    }

    fn edit(&mut self, iv: Interval, text: &str) {
        self.rope = self.rope.edit_with(&self.ctx, iv, &Rope::from(text));
    }

    fn check_row(&self, row: usize) -> Result<()> {
        let line_count = self.line_count();
        ensure!(row < line_count, RowOutOfRangeSnafu { row, line_count });
        Ok(())
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self::from_rope(Rope::from(text))
    }
}

impl From<Rope> for TextBuffer {
    fn from(rope: Rope) -> Self {
        Self::from_rope(rope)
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferError, TextBuffer};
    use crate::point::Point;

    #[test]
    fn line_lengths() {
        let buffer = TextBuffer::from("ab\n\ncde");
        assert_eq!(buffer.line_len(0), Ok(2));
        assert_eq!(buffer.line_len(1), Ok(0));
        assert_eq!(buffer.line_len(2), Ok(3));
        assert_eq!(
            buffer.line_len(3),
            Err(BufferError::RowOutOfRange {
                row: 3,
                line_count: 3
            })
        );
    }

    #[test]
    fn point_offset_conversions() {
        let buffer = TextBuffer::from("ab\n\ncde");
        assert_eq!(buffer.offset_of_point(Point::new(0, 2)), Ok(2));
        assert_eq!(buffer.offset_of_point(Point::new(2, 1)), Ok(5));
        assert_eq!(buffer.point_of_offset(5), Point::new(2, 1));
        assert_eq!(buffer.point_of_offset(3), Point::new(1, 0));
        assert_eq!(buffer.point_of_offset(99), Point::new(2, 3));
        assert!(matches!(
            buffer.offset_of_point(Point::new(0, 3)),
            Err(BufferError::ColumnOutOfRange { line_len: 2, .. })
        ));
    }

    #[test]
    fn last_chars() {
        let buffer = TextBuffer::from("let x = 1;  \n\n\t \n");
        assert_eq!(buffer.last_char_in_row(0), Ok(Some(11)));
        assert_eq!(buffer.last_non_whitespace_char(0), Ok(Some(9)));
        assert_eq!(buffer.last_char_in_row(1), Ok(None));
        assert_eq!(buffer.last_non_whitespace_char(2), Ok(None));
    }
}
