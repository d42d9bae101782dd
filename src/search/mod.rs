//! Find and replace over buffers.
//!
//! [`Finder`] searches one buffer on the calling thread. [`BatchWorker`]
//! runs a find or replace over many files or buffer snapshots on a worker
//! thread.

mod worker;

pub use worker::{
    BatchEvent, BatchJob, BatchMode, BatchWorker, FileResult, ReplacedBuffers, SearchTarget,
};

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::text::{Action, TextBuffer, TextDir, TextPoint, TextRange};

bitflags! {
    /// Options of a find request.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FindFlags: u8 {
        /// Treat the pattern as a regular expression.
        const USE_REGEX = 1 << 0;
        const CASE_SENSITIVE = 1 << 1;
        /// Only match at word boundaries.
        const WHOLE_WORD = 1 << 2;
    }
}

/// A compiled find request.
///
/// Matches never span lines and are never empty.
#[derive(Clone, Debug)]
pub struct Finder {
    pattern: String,
    flags: FindFlags,
    re: regex_lite::Regex,
}

impl Finder {
    /// Compile `pattern`. An empty or malformed pattern is an error.
    pub fn new(pattern: &str, flags: FindFlags) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: String::new(),
                cause: "empty pattern".to_string(),
            });
        }
        let mut source = if flags.contains(FindFlags::USE_REGEX) {
            pattern.to_string()
        } else {
            regex_lite::escape(pattern)
        };
        if flags.contains(FindFlags::WHOLE_WORD) {
            source = format!(r"\b(?:{source})\b");
        }
        let re = regex_lite::RegexBuilder::new(&source)
            .case_insensitive(!flags.contains(FindFlags::CASE_SENSITIVE))
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, &e))?;
        Ok(Self {
            pattern: pattern.to_string(),
            flags,
            re,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn flags(&self) -> FindFlags {
        self.flags
    }

    /// Matches on line `ln`, in order.
    #[must_use]
    pub fn find_in_line(&self, buffer: &TextBuffer, ln: usize) -> Vec<TextRange> {
        let data = buffer.line_data(ln);
        let mut ranges = Vec::new();
        let (mut byte, mut col) = (0, 0);
        for m in self.re.find_iter(data) {
            if m.is_empty() {
                continue;
            }
            col += data[byte..m.start()].chars().count();
            let start = col;
            col += m.as_str().chars().count();
            byte = m.end();
            ranges.push(TextRange::new(
                TextPoint::new(ln, start),
                TextPoint::new(ln, col),
            ));
        }
        ranges
    }

    /// Every match in the buffer, in order.
    #[must_use]
    pub fn find_all(&self, buffer: &TextBuffer) -> Vec<TextRange> {
        (1..=buffer.line_count())
            .flat_map(|ln| self.find_in_line(buffer, ln))
            .collect()
    }

    /// The next match from `from`.
    ///
    /// Forward search returns the first match starting at or after `from`;
    /// reverse search returns the last match ending at or before it. With
    /// `cycle` the search wraps around the buffer.
    #[must_use]
    pub fn find(
        &self,
        buffer: &TextBuffer,
        from: TextPoint,
        reversely: bool,
        cycle: bool,
    ) -> Option<TextRange> {
        let from = buffer.clamp_point(from);
        let count = buffer.line_count();

        if reversely {
            let before = (1..=from.line).rev().find_map(|ln| {
                self.find_in_line(buffer, ln)
                    .into_iter()
                    .rev()
                    .find(|r| r.end <= from)
            });
            if before.is_some() || !cycle {
                return before;
            }
            return (from.line..=count).rev().find_map(|ln| {
                self.find_in_line(buffer, ln)
                    .into_iter()
                    .rev()
                    .find(|r| r.end > from)
            });
        }

        let after = (from.line..=count).find_map(|ln| {
            self.find_in_line(buffer, ln)
                .into_iter()
                .find(|r| r.start >= from)
        });
        if after.is_some() || !cycle {
            return after;
        }
        (1..=from.line).find_map(|ln| {
            self.find_in_line(buffer, ln)
                .into_iter()
                .find(|r| r.start < from)
        })
    }

    /// Replace every match with `replacement` as one undo unit.
    /// Returns the number of replacements.
    pub fn replace_all(&self, buffer: &mut TextBuffer, replacement: &str) -> usize {
        let ranges = self.find_all(buffer);
        if ranges.is_empty() {
            return 0;
        }

        buffer.begin_group();
        for range in ranges.iter().rev() {
            buffer.execute(Action::delete_range(*range, TextDir::Forward, false));
            buffer.execute(Action::insert_string(range.start, replacement));
        }
        buffer.end_group();
        ranges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TextOptions;

    fn buffer(text: &str) -> TextBuffer {
        TextBuffer::from_text(text, TextOptions::default())
    }

    fn r(line: usize, start: usize, end: usize) -> TextRange {
        TextRange::new(TextPoint::new(line, start), TextPoint::new(line, end))
    }

    #[test]
    fn test_plain_pattern_is_escaped() {
        let buf = buffer("a.b axb");
        let finder = Finder::new("a.b", FindFlags::CASE_SENSITIVE).unwrap();
        assert_eq!(finder.find_all(&buf), vec![r(1, 0, 3)]);

        let finder = Finder::new("a.b", FindFlags::USE_REGEX).unwrap();
        assert_eq!(finder.find_all(&buf).len(), 2);
    }

    #[test]
    fn test_case_and_whole_word() {
        let buf = buffer("Foo food foo");
        let finder = Finder::new("foo", FindFlags::empty()).unwrap();
        assert_eq!(finder.find_all(&buf).len(), 3);

        let finder = Finder::new("foo", FindFlags::CASE_SENSITIVE).unwrap();
        assert_eq!(finder.find_all(&buf), vec![r(1, 4, 7), r(1, 9, 12)]);

        let finder = Finder::new("foo", FindFlags::WHOLE_WORD).unwrap();
        assert_eq!(finder.find_all(&buf), vec![r(1, 0, 3), r(1, 9, 12)]);
    }

    #[test]
    fn test_invalid_and_empty_patterns() {
        assert!(matches!(
            Finder::new("", FindFlags::empty()),
            Err(Error::InvalidPattern { .. })
        ));
        assert!(matches!(
            Finder::new("(", FindFlags::USE_REGEX),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_find_char_columns() {
        let buf = buffer("héllo wörld");
        let finder = Finder::new("wör", FindFlags::empty()).unwrap();
        assert_eq!(finder.find_all(&buf), vec![r(1, 6, 9)]);
    }

    #[test]
    fn test_find_forward_and_reverse() {
        let buf = buffer("ab\nab ab\nx");
        let finder = Finder::new("ab", FindFlags::empty()).unwrap();
        let from = TextPoint::new(2, 1);

        assert_eq!(finder.find(&buf, from, false, false), Some(r(2, 3, 5)));
        assert_eq!(finder.find(&buf, from, true, false), Some(r(1, 0, 2)));

        let end = TextPoint::new(3, 0);
        assert_eq!(finder.find(&buf, end, false, false), None);
        assert_eq!(finder.find(&buf, end, false, true), Some(r(1, 0, 2)));

        let start = TextPoint::new(1, 0);
        assert_eq!(finder.find(&buf, start, true, false), None);
        assert_eq!(finder.find(&buf, start, true, true), Some(r(2, 3, 5)));
    }

    #[test]
    fn test_replace_all_is_one_undo_unit() {
        let mut buf = buffer("cat dog\ncat");
        let finder = Finder::new("cat", FindFlags::empty()).unwrap();
        assert_eq!(finder.replace_all(&mut buf, "bird"), 2);
        assert_eq!(buf.text(), "bird dog\nbird");
        assert_eq!(buf.undo_len(), 1);

        buf.undo();
        assert_eq!(buf.text(), "cat dog\ncat");
        assert_eq!(finder.replace_all(&mut buffer("none"), "x"), 0);
    }
}
