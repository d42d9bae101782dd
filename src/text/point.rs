//! Geometry primitives: points, ranges and seek directives.

use std::fmt;
use std::ops::{Add, Range, RangeInclusive, Sub};

/// A position in a buffer.
///
/// Lines are 1-based. Column 0 is before the first character; a column equal
/// to the line length is at the line's logical newline. Ordering is
/// lexicographic on (line, column).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPoint {
    pub line: usize,
    pub col: usize,
}

impl TextPoint {
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// The start of the first line.
impl Default for TextPoint {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl fmt::Display for TextPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.line, self.col)
    }
}

/// Signed displacement between two points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextDelta {
    pub lines: isize,
    pub cols: isize,
}

impl TextDelta {
    pub const ZERO: Self = Self { lines: 0, cols: 0 };

    #[must_use]
    pub const fn new(lines: isize, cols: isize) -> Self {
        Self { lines, cols }
    }
}

impl Add<TextDelta> for TextPoint {
    type Output = TextPoint;

    /// Saturates at line 1 and column 0.
    fn add(self, delta: TextDelta) -> TextPoint {
        let line = self.line.saturating_add_signed(delta.lines).max(1);
        let col = self.col.saturating_add_signed(delta.cols);
        TextPoint { line, col }
    }
}

impl Sub for TextPoint {
    type Output = TextDelta;

    fn sub(self, rhs: TextPoint) -> TextDelta {
        TextDelta {
            lines: self.line as isize - rhs.line as isize,
            cols: self.col as isize - rhs.col as isize,
        }
    }
}

/// A span between two points, `start <= end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: TextPoint,
    pub end: TextPoint,
}

impl TextRange {
    /// Create a range from two points in any order.
    #[must_use]
    pub fn new(a: TextPoint, b: TextPoint) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// An empty range at `point`.
    #[must_use]
    pub fn at(point: TextPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if `point` lies within `[start, end)`.
    #[must_use]
    pub fn contains(&self, point: TextPoint) -> bool {
        point >= self.start && point < self.end
    }

    /// The lines touched by this range.
    #[must_use]
    pub fn line_range(&self) -> LineRange {
        LineRange::new(self.start.line, self.end.line)
    }

    /// Lines affected by a line-wise operation on this range.
    ///
    /// A multi-line range ending at column 0 does not include its last line.
    #[must_use]
    pub fn affected_lines(&self) -> LineRange {
        let mut last = self.end.line;
        if self.end.col == 0 && last > self.start.line {
            last -= 1;
        }
        LineRange::new(self.start.line, last)
    }
}

/// An inclusive, 1-based range of lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub first: usize,
    pub last: usize,
}

impl LineRange {
    /// The empty line range.
    pub const EMPTY: Self = Self { first: 0, last: 0 };

    #[must_use]
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// A range covering a single line.
    #[must_use]
    pub fn single(line: usize) -> Self {
        Self {
            first: line,
            last: line,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first == 0 || self.last < self.first
    }

    #[must_use]
    pub fn count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.last - self.first + 1
        }
    }

    #[must_use]
    pub fn contains(&self, line: usize) -> bool {
        !self.is_empty() && line >= self.first && line <= self.last
    }

    /// Iterate over the line numbers.
    pub fn iter(&self) -> RangeInclusive<usize> {
        if self.is_empty() {
            #[allow(clippy::reversed_empty_ranges)]
            return 1..=0;
        }
        self.first..=self.last
    }
}

/// A range of characters within one line.
///
/// `end` may be [`CharRange::EOL`], meaning "to end of line".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CharRange {
    pub begin: usize,
    pub end: usize,
}

impl CharRange {
    /// Sentinel end offset meaning "to end of line".
    pub const EOL: usize = usize::MAX;

    #[must_use]
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// A range from `begin` to the end of the line.
    #[must_use]
    pub fn to_eol(begin: usize) -> Self {
        Self {
            begin,
            end: Self::EOL,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end == Self::EOL
    }

    /// Resolve against a line of `len` characters, clamping both bounds.
    #[must_use]
    pub fn resolve(&self, len: usize) -> Range<usize> {
        let end = self.end.min(len);
        self.begin.min(end)..end
    }
}

/// Direction of a range or insertion relative to the caret.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextDir {
    #[default]
    Forward,
    Backward,
}

/// Unit of text a seek moves over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextUnit {
    Char,
    Word,
    Line,
    Buffer,
}

/// How a seek moves relative to its unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Seek {
    /// The whole unit containing the point.
    Whole,
    /// To the beginning of the unit.
    Begin,
    /// To the end of the unit.
    End,
    /// To the previous unit.
    Prev,
    /// To the next unit.
    Next,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_point_is_buffer_start() {
        assert_eq!(TextPoint::default(), TextPoint::new(1, 0));
        let range = TextRange::default();
        assert_eq!(range.start, TextPoint::new(1, 0));
        assert!(range.is_empty());
    }

    #[test]
    fn test_point_ordering() {
        assert!(TextPoint::new(1, 9) < TextPoint::new(2, 0));
        assert!(TextPoint::new(2, 1) > TextPoint::new(2, 0));
    }

    #[test]
    fn test_point_delta_arithmetic() {
        let a = TextPoint::new(3, 2);
        let b = TextPoint::new(5, 0);
        let delta = b - a;
        assert_eq!(delta, TextDelta::new(2, -2));
        assert_eq!(a + delta, b);
        assert_eq!(TextPoint::new(1, 1) + TextDelta::new(-4, -9), TextPoint::new(1, 0));
    }

    #[test]
    fn test_range_normalizes() {
        let r = TextRange::new(TextPoint::new(4, 0), TextPoint::new(2, 3));
        assert_eq!(r.start, TextPoint::new(2, 3));
        assert!(r.contains(TextPoint::new(3, 100)));
        assert!(!r.contains(TextPoint::new(4, 0)));
        assert_eq!(r.line_range(), LineRange::new(2, 4));
        assert_eq!(r.affected_lines(), LineRange::new(2, 3));
    }

    #[test]
    fn test_line_range() {
        assert!(LineRange::EMPTY.is_empty());
        assert_eq!(LineRange::EMPTY.count(), 0);
        assert_eq!(LineRange::EMPTY.iter().count(), 0);
        let r = LineRange::new(3, 5);
        assert_eq!(r.count(), 3);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert!(r.contains(4));
        assert!(!r.contains(6));
    }

    #[test]
    fn test_char_range_resolve() {
        assert_eq!(CharRange::to_eol(2).resolve(5), 2..5);
        assert_eq!(CharRange::new(7, 9).resolve(5), 5..5);
        assert!(CharRange::to_eol(0).is_open());
    }
}
