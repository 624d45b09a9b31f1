use std::{
    fmt,
    ops::{Add, AddAssign},
};

/// A zero-based row and column, both counted in characters.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

impl Add for Point {
    type Output = Self;

    /// Treat `other` as a relative extent: a non-zero row moves down and
    /// resets the column.
    fn add(self, other: Self) -> Self {
        if other.row == 0 {
            Point {
                row: self.row,
                column: self.column + other.column,
            }
        } else {
            Point {
                row: self.row + other.row,
                column: other.column,
            }
        }
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::Point;

    #[test]
    fn add_same_row_extends_column() {
        assert_eq!(Point::new(2, 3) + Point::new(0, 4), Point::new(2, 7));
    }

    #[test]
    fn add_rows_resets_column() {
        let mut p = Point::new(2, 3);
        p += Point::new(1, 1);
        assert_eq!(p, Point::new(3, 1));
    }

    #[test]
    fn ordering_is_row_major() {
        assert!(Point::new(0, 9) < Point::new(1, 0));
        assert!(Point::new(1, 2) < Point::new(1, 3));
        assert_eq!(Point::zero().to_string(), "0:0");
    }
}
