//! A single logical line of a buffer.

use crate::lex::LexTag;
use crate::text::indent::{self, is_space};
use crate::text::point::CharRange;
use std::cell::Cell;
use std::ops::Range;

/// A styled span within one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LexElement {
    pub range: CharRange,
    pub lex: LexTag,
}

impl LexElement {
    #[must_use]
    pub fn new(off: usize, len: usize, lex: LexTag) -> Self {
        Self {
            range: CharRange::new(off, off + len),
            lex,
        }
    }

    #[must_use]
    pub fn off(&self) -> usize {
        self.range.begin
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.range.end.saturating_sub(self.range.begin)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if this element overlaps `range` (already resolved).
    fn overlaps(&self, range: &Range<usize>) -> bool {
        self.range.end > range.start && self.range.begin < range.end
    }
}

/// A mutable line of text plus its lex elements.
///
/// The content never contains a line terminator. Columns are character
/// offsets. Lex elements are non-overlapping, sorted by start offset, and are
/// dropped whenever the content changes.
#[derive(Clone, Debug, Default)]
pub struct TextLine {
    data: String,
    char_len: usize,
    lex_elements: Vec<LexElement>,
    // Number of leading whitespace characters, computed on demand.
    indent_len: Cell<Option<usize>>,
}

impl PartialEq for TextLine {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.lex_elements == other.lex_elements
    }
}

impl Eq for TextLine {}

impl TextLine {
    #[must_use]
    pub fn new(data: &str) -> Self {
        debug_assert!(!data.contains(['\n', '\r']), "line data contains a terminator");
        Self {
            data: data.to_string(),
            char_len: data.chars().count(),
            lex_elements: Vec::new(),
            indent_len: Cell::new(None),
        }
    }

    /// The line content.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.char_len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// Character at `col`, or `'\n'` at (and beyond) the end of the line.
    #[must_use]
    pub fn char_at(&self, col: usize) -> char {
        self.data.chars().nth(col).unwrap_or('\n')
    }

    /// Byte offset of column `col`, clamped to the line length.
    #[must_use]
    pub fn byte_offset(&self, col: usize) -> usize {
        if col >= self.char_len {
            return self.data.len();
        }
        self.data
            .char_indices()
            .nth(col)
            .map_or(self.data.len(), |(i, _)| i)
    }

    /// Substring covered by `range`.
    #[must_use]
    pub fn sub(&self, range: CharRange) -> &str {
        let r = range.resolve(self.char_len);
        &self.data[self.byte_offset(r.start)..self.byte_offset(r.end)]
    }

    /// Substring of `count` characters starting at `off`.
    #[must_use]
    pub fn sub_str(&self, off: usize, count: usize) -> &str {
        self.sub(CharRange::new(off, off.saturating_add(count)))
    }

    /// Offset of the first non-space character at or after `from`,
    /// or `len()` if there is none.
    #[must_use]
    pub fn first_non_space_char(&self, from: usize) -> usize {
        if from == 0 {
            return self.indent_len();
        }
        self.data
            .chars()
            .enumerate()
            .skip(from)
            .find(|&(_, c)| !is_space(c))
            .map_or(self.char_len, |(i, _)| i)
    }

    /// Offset of the last non-space character before `before`
    /// (the whole line when `before` is `None`).
    #[must_use]
    pub fn last_non_space_char(&self, before: Option<usize>) -> Option<usize> {
        let end = before.unwrap_or(self.char_len).min(self.char_len);
        self.data
            .chars()
            .take(end)
            .enumerate()
            .filter(|&(_, c)| !is_space(c))
            .map(|(i, _)| i)
            .last()
    }

    /// Visual width of the leading whitespace.
    #[must_use]
    pub fn indent(&self, tab_stop: usize) -> usize {
        indent::indent_width(self.indent_str(), tab_stop)
    }

    /// The leading whitespace itself.
    #[must_use]
    pub fn indent_str(&self) -> &str {
        &self.data[..self.byte_offset(self.indent_len())]
    }

    /// Number of leading whitespace characters.
    #[must_use]
    pub fn indent_len(&self) -> usize {
        if let Some(len) = self.indent_len.get() {
            return len;
        }
        let len = self.data.chars().take_while(|&c| is_space(c)).count();
        self.indent_len.set(Some(len));
        len
    }

    /// Check if the line is empty, optionally treating whitespace as empty.
    #[must_use]
    pub fn is_blank(&self, ignore_space: bool) -> bool {
        if ignore_space {
            self.indent_len() == self.char_len
        } else {
            self.char_len == 0
        }
    }

    /// Check if the line starts with `c`, optionally skipping leading
    /// whitespace. Returns the offset of the match.
    #[must_use]
    pub fn starts_with(&self, c: char, ignore_space: bool) -> Option<usize> {
        let mut chars = self.data.chars().enumerate();
        let found = if ignore_space {
            chars.find(|&(_, ch)| ch == c || !is_space(ch))
        } else {
            chars.next()
        };
        found.filter(|&(_, ch)| ch == c).map(|(i, _)| i)
    }

    /// Check if the line ends with `c`, optionally skipping trailing
    /// whitespace. Returns the offset of the match.
    #[must_use]
    pub fn ends_with(&self, c: char, ignore_space: bool) -> Option<usize> {
        let mut chars = self.data.chars().rev().zip((0..self.char_len).rev());
        let found = if ignore_space {
            chars.find(|&(ch, _)| ch == c || !is_space(ch))
        } else {
            chars.next()
        };
        found.filter(|&(ch, _)| ch == c).map(|(_, i)| i)
    }

    /// Insert `c` at column `col`.
    pub fn insert_char(&mut self, col: usize, c: char) {
        debug_assert!(col <= self.char_len);
        let at = self.byte_offset(col);
        self.data.insert(at, c);
        self.char_len += 1;
        self.invalidate();
    }

    /// Insert `s` at column `col`.
    pub fn insert_str(&mut self, col: usize, s: &str) {
        debug_assert!(col <= self.char_len);
        if s.is_empty() {
            return;
        }
        let at = self.byte_offset(col);
        self.data.insert_str(at, s);
        self.char_len += s.chars().count();
        self.invalidate();
    }

    /// Append `s` to the end of the line.
    pub fn append(&mut self, s: &str) {
        self.insert_str(self.char_len, s);
    }

    /// Remove the characters in `range` and return them.
    pub fn delete(&mut self, range: CharRange) -> String {
        let r = range.resolve(self.char_len);
        if r.is_empty() {
            return String::new();
        }
        let start = self.byte_offset(r.start);
        let end = self.byte_offset(r.end);
        let removed: String = self.data.drain(start..end).collect();
        self.char_len -= r.len();
        self.invalidate();
        removed
    }

    /// Split the line at `col`, keeping the head and returning the tail.
    pub fn split_off(&mut self, col: usize) -> String {
        self.delete(CharRange::to_eol(col))
    }

    /// Remove all content.
    pub fn clear(&mut self) {
        self.data.clear();
        self.char_len = 0;
        self.invalidate();
    }

    /// All lex elements of the line.
    #[must_use]
    pub fn lex_elements(&self) -> &[LexElement] {
        &self.lex_elements
    }

    /// Lex elements overlapping `range`.
    #[must_use]
    pub fn lex_elements_in(&self, range: CharRange) -> Vec<&LexElement> {
        let r = range.resolve(self.char_len);
        let r = if range.is_open() { r.start..usize::MAX } else { r };
        self.lex_elements
            .iter()
            .filter(|e| e.overlaps(&r))
            .collect()
    }

    /// Append a lex element. Elements must be added in ascending order.
    pub fn add_lex_element(&mut self, off: usize, len: usize, lex: LexTag) {
        debug_assert!(
            self.lex_elements
                .last()
                .is_none_or(|last| last.range.end <= off),
            "lex elements must be sorted and non-overlapping"
        );
        self.lex_elements.push(LexElement::new(off, len, lex));
    }

    /// Replace the whole lex element list.
    pub fn set_lex_elements(&mut self, elements: Vec<LexElement>) {
        self.lex_elements = elements;
    }

    pub fn clear_lex_elements(&mut self) {
        self.lex_elements.clear();
    }

    /// Lex tag at column `col`, if any element covers it.
    #[must_use]
    pub fn lex_at(&self, col: usize) -> Option<LexTag> {
        let idx = self
            .lex_elements
            .partition_point(|e| e.range.end <= col);
        self.lex_elements
            .get(idx)
            .filter(|e| e.range.begin <= col)
            .map(|e| e.lex)
    }

    fn invalidate(&mut self) {
        self.indent_len.set(None);
        self.lex_elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::{LexMajor, LexTag, minor};

    #[test]
    fn test_char() {
        let line = TextLine::new("a b\tc");
        assert_eq!(line.char_at(0), 'a');
        assert_eq!(line.char_at(1), ' ');
        assert_eq!(line.char_at(line.len()), '\n');
    }

    #[test]
    fn test_sub() {
        let line = TextLine::new("a b\tc");
        assert_eq!(line.sub_str(0, 0), "");
        assert_eq!(line.sub(CharRange::new(0, 0)), "");
        assert_eq!(line.sub_str(0, 1), "a");
        assert_eq!(line.sub_str(2, 3), "b\tc");
        assert_eq!(line.sub(CharRange::new(2, 5)), "b\tc");
        assert_eq!(line.sub(CharRange::to_eol(2)), "b\tc");
        assert_eq!(line.sub(CharRange::to_eol(0)), "a b\tc");
    }

    #[test]
    fn test_sub_multibyte() {
        let line = TextLine::new("héllo wörld");
        assert_eq!(line.len(), 11);
        assert_eq!(line.sub_str(1, 4), "éllo");
        assert_eq!(line.char_at(7), 'ö');
    }

    #[test]
    fn test_first_non_space_char() {
        let mut line = TextLine::new("");
        assert_eq!(line.first_non_space_char(0), line.len());

        line.insert_str(0, "a b\tc");
        assert_eq!(line.first_non_space_char(0), 0);
        assert_eq!(line.first_non_space_char(1), 2);
        assert_eq!(line.first_non_space_char(3), 4);
        assert_eq!(line.first_non_space_char(line.len()), line.len());
        assert_eq!(line.first_non_space_char(line.len() + 1), line.len());
    }

    #[test]
    fn test_last_non_space_char() {
        let mut line = TextLine::new("");
        assert_eq!(line.last_non_space_char(None), None);

        line.insert_str(0, "a b\tc");
        assert_eq!(line.last_non_space_char(None), Some(4));
        assert_eq!(line.last_non_space_char(Some(line.len())), Some(4));
        assert_eq!(line.last_non_space_char(Some(4)), Some(2));
        assert_eq!(line.last_non_space_char(Some(2)), Some(0));
        assert_eq!(line.last_non_space_char(Some(1)), Some(0));
        assert_eq!(line.last_non_space_char(Some(0)), None);
    }

    #[test]
    fn test_indent_and_indent_str() {
        let cases = [
            ("", 0, ""),
            ("abc", 0, ""),
            ("   ", 3, "   "),
            ("   abc", 3, "   "),
            ("\tabc", 4, "\t"),
            ("\t\tabc", 8, "\t\t"),
            ("  \t\tabc", 8, "  \t\t"),
            ("  \t  \tabc", 8, "  \t  \t"),
            ("    \t  \tabc", 12, "    \t  \t"),
        ];
        for (data, width, indent) in cases {
            let line = TextLine::new(data);
            assert_eq!(line.indent(4), width, "indent of {data:?}");
            assert_eq!(line.indent_str(), indent, "indent str of {data:?}");
        }
    }

    #[test]
    fn test_indent_cache_invalidated() {
        let mut line = TextLine::new("  abc");
        assert_eq!(line.indent_len(), 2);
        line.insert_str(0, "\t");
        assert_eq!(line.indent_len(), 3);
        line.delete(CharRange::new(0, 3));
        assert_eq!(line.indent_len(), 0);
    }

    #[test]
    fn test_is_blank() {
        let mut line = TextLine::new("");
        assert!(line.is_blank(true));
        assert!(line.is_blank(false));

        line.append(" \t");
        assert!(line.is_blank(true));
        assert!(!line.is_blank(false));
    }

    #[test]
    fn test_starts_with() {
        let line = TextLine::new("");
        assert_eq!(line.starts_with('a', true), None);
        assert_eq!(line.starts_with('a', false), None);

        let line = TextLine::new(" \t");
        assert_eq!(line.starts_with(' ', true), Some(0));
        assert_eq!(line.starts_with(' ', false), Some(0));

        let line = TextLine::new("\t ");
        assert_eq!(line.starts_with('\t', true), Some(0));
        assert_eq!(line.starts_with('\t', false), Some(0));

        let line = TextLine::new("\t test");
        assert_eq!(line.starts_with('t', true), Some(2));
        assert_eq!(line.starts_with('t', false), None);

        let line = TextLine::new("test");
        assert_eq!(line.starts_with('t', true), Some(0));
        assert_eq!(line.starts_with('t', false), Some(0));
    }

    #[test]
    fn test_ends_with() {
        let line = TextLine::new("");
        assert_eq!(line.ends_with('a', true), None);
        assert_eq!(line.ends_with('a', false), None);

        let line = TextLine::new(" \t");
        assert_eq!(line.ends_with('\t', true), Some(1));
        assert_eq!(line.ends_with('\t', false), Some(1));

        let line = TextLine::new("\t ");
        assert_eq!(line.ends_with(' ', true), Some(1));
        assert_eq!(line.ends_with(' ', false), Some(1));

        let line = TextLine::new("test\t ");
        assert_eq!(line.ends_with('t', true), Some(3));
        assert_eq!(line.ends_with('t', false), None);

        let line = TextLine::new("test");
        assert_eq!(line.ends_with('t', true), Some(3));
        assert_eq!(line.ends_with('t', false), Some(3));
    }

    #[test]
    fn test_range_lex_elements() {
        let mut line = TextLine::new("int i = 0;");
        line.add_lex_element(0, 3, LexTag::major(LexMajor::Type));
        line.add_lex_element(8, 1, LexTag::new(LexMajor::Constant, minor::CONSTANT_NUMBER));

        let count = |r: CharRange| line.lex_elements_in(r).len();

        assert_eq!(count(CharRange::to_eol(0)), 2);
        assert_eq!(count(CharRange::to_eol(1)), 2);
        assert_eq!(count(CharRange::to_eol(2)), 2);
        assert_eq!(count(CharRange::to_eol(3)), 1);
        assert_eq!(count(CharRange::to_eol(4)), 1);
        assert_eq!(count(CharRange::to_eol(5)), 1);
        assert_eq!(count(CharRange::to_eol(6)), 1);
        assert_eq!(count(CharRange::to_eol(8)), 1);
        assert_eq!(count(CharRange::to_eol(9)), 0);

        assert_eq!(count(CharRange::new(0, 3)), 1);
        assert_eq!(count(CharRange::new(0, 8)), 1);
        assert_eq!(count(CharRange::new(0, 9)), 2);

        assert_eq!(count(CharRange::new(1, 2)), 1);
        assert_eq!(count(CharRange::new(1, 5)), 1);
        assert_eq!(count(CharRange::new(8, 9)), 1);
        assert_eq!(count(CharRange::new(9, 10)), 0);
    }

    #[test]
    fn test_lex_at() {
        let mut line = TextLine::new("int i = 0;");
        line.add_lex_element(0, 3, LexTag::TYPE);
        line.add_lex_element(8, 1, LexTag::NUMBER);
        assert_eq!(line.lex_at(1), Some(LexTag::TYPE));
        assert_eq!(line.lex_at(3), None);
        assert_eq!(line.lex_at(8), Some(LexTag::NUMBER));
        assert_eq!(line.lex_at(9), None);
    }

    #[test]
    fn test_mutation_clears_lex_elements() {
        let mut line = TextLine::new("int i;");
        line.add_lex_element(0, 3, LexTag::TYPE);
        line.insert_char(0, ' ');
        assert!(line.lex_elements().is_empty());
    }

    #[test]
    fn test_split_off() {
        let mut line = TextLine::new("abcdef");
        let tail = line.split_off(2);
        assert_eq!(line.data(), "ab");
        assert_eq!(tail, "cdef");
        assert_eq!(line.len(), 2);
    }
}
