//! Half-open ranges of character offsets.

use std::{
    cmp::{max, min},
    fmt,
    ops::Range,
};

/// The half-open interval `[lo, hi)`.
///
/// An interval can be read as a sorted set of offsets: `[1, 4)` is `{1, 2, 3}`.
/// `lo <= hi` is not enforced; an interval with `lo >= hi` is empty and has
/// length zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interval {
    pub lo: usize,
    pub hi: usize,
}

impl Interval {
    pub fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi }
    }

    pub fn len(&self) -> usize {
        self.hi.saturating_sub(self.lo)
    }

    pub fn is_empty(&self) -> bool {
        self.lo >= self.hi
    }

    /// The smallest interval covering both. Empty operands are ignored.
    pub fn union(&self, other: Interval) -> Interval {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval::new(min(self.lo, other.lo), max(self.hi, other.hi))
    }

    /// The overlap of both intervals. A disjoint pair yields an empty
    /// interval positioned at the larger start.
    pub fn intersect(&self, other: Interval) -> Interval {
        let lo = max(self.lo, other.lo);
        let hi = min(self.hi, other.hi);
        Interval::new(lo, max(lo, hi))
    }

    /// The part of `self` that lies before `other`.
    pub fn prefix(&self, other: Interval) -> Interval {
        Interval::new(min(self.lo, other.lo), min(self.hi, other.lo))
    }

    /// The part of `self` that lies after `other`.
    pub fn suffix(&self, other: Interval) -> Interval {
        Interval::new(max(self.lo, other.hi), max(self.hi, other.hi))
    }

    pub fn translate(&self, amount: usize) -> Interval {
        Interval::new(self.lo + amount, self.hi + amount)
    }

    /// Shift left by `amount`. Both ends must be at least `amount`.
    pub fn translate_neg(&self, amount: usize) -> Interval {
        debug_assert!(self.lo >= amount, "{self} shifted left past zero by {amount}");
        Interval::new(self.lo - amount, self.hi - amount)
    }

    /// True when every offset of the interval is below `offset`.
    pub fn is_before(&self, offset: usize) -> bool {
        self.hi <= offset
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.lo <= offset && offset < self.hi
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lo, self.hi)
    }
}

impl fmt::Debug for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<Range<usize>> for Interval {
    fn from(range: Range<usize>) -> Self {
        Interval::new(range.start, range.end)
    }
}

impl From<Interval> for Range<usize> {
    fn from(iv: Interval) -> Self {
        iv.lo..iv.hi
    }
}

#[cfg(test)]
mod tests {
    use super::Interval;

    #[test]
    fn empty_when_inverted() {
        let iv = Interval::new(5, 2);
        assert!(iv.is_empty());
        assert_eq!(iv.len(), 0);
    }

    #[test]
    fn union_skips_empty_operands() {
        let a = Interval::new(3, 3);
        let b = Interval::new(10, 12);
        assert_eq!(a.union(b), b);
        assert_eq!(b.union(a), b);
        assert_eq!(Interval::new(1, 4).union(Interval::new(2, 8)), Interval::new(1, 8));
    }

    #[test]
    fn intersect_overlapping_and_disjoint() {
        let a = Interval::new(1, 4);
        assert_eq!(a.intersect(Interval::new(2, 5)), Interval::new(2, 4));

        let disjoint = a.intersect(Interval::new(6, 9));
        assert!(disjoint.is_empty());
        assert_eq!(disjoint.lo, 6);
    }

    #[test]
    fn prefix_and_suffix_split_around_edit() {
        let whole = Interval::new(0, 10);
        let edit = Interval::new(3, 6);
        assert_eq!(whole.prefix(edit), Interval::new(0, 3));
        assert_eq!(whole.suffix(edit), Interval::new(6, 10));

        // An edit past the end leaves nothing behind it.
        let past = Interval::new(12, 14);
        assert_eq!(whole.prefix(past), Interval::new(0, 10));
        assert!(whole.suffix(past).is_empty());
    }

    #[test]
    fn translate_round_trips() {
        let iv = Interval::new(2, 7);
        assert_eq!(iv.translate(5), Interval::new(7, 12));
        assert_eq!(iv.translate(5).translate_neg(5), iv);
    }

    #[test]
    fn is_before_is_exclusive_of_hi() {
        let iv = Interval::new(2, 5);
        assert!(iv.is_before(5));
        assert!(iv.is_before(9));
        assert!(!iv.is_before(4));
        assert!(iv.contains(2));
        assert!(!iv.contains(5));
    }

    #[test]
    fn display_is_half_open() {
        assert_eq!(Interval::new(4, 9).to_string(), "[4, 9)");
    }
}
