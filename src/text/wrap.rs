//! Soft line wrapping.
//!
//! A [`WrapHelper`] keeps one [`WrapInfo`] per buffer line with the
//! character offsets where the line breaks into visual sub-lines, and the
//! total number of visual lines.

use unicode_segmentation::UnicodeSegmentation;

use crate::text::buffer::{BufferListener, ChangeKind, LineChange, TextBuffer};
use crate::text::point::{CharRange, LineRange};

/// Measures the display width of a piece of text.
pub trait TextExtent {
    fn width(&self, text: &str) -> usize;
}

impl<F> TextExtent for F
where
    F: Fn(&str) -> usize,
{
    fn width(&self, text: &str) -> usize {
        self(text)
    }
}

/// Binary-search the split for the sub-line starting at cluster `off`.
///
/// `bounds` holds the byte offset of every grapheme cluster plus the total
/// length. The result is a cluster index.
fn find_split(
    line: &str,
    bounds: &[usize],
    off: usize,
    max_width: usize,
    extent: &dyn TextExtent,
) -> Option<usize> {
    let len = bounds.len() - 1;
    let (mut begin, mut end) = (0, len - off);

    while begin < end {
        let m = begin + (end - begin) / 2;
        let width = extent.width(&line[bounds[off]..bounds[off + m]]);

        if width == max_width {
            return Some(off + m);
        }
        if width < max_width {
            let next = extent.width(&line[bounds[off + m]..bounds[off + m + 1]]);
            if max_width - width < next {
                // No room for one more cluster.
                return Some(off + m);
            }
            begin = m + 1;
        } else {
            end = m;
        }
    }
    None
}

/// Offsets (in chars) at which `line` breaks so that each sub-line fits in
/// `max_width`.
///
/// Splits fall between grapheme clusters only. A cluster wider than
/// `max_width` gets a sub-line of its own and overflows; no zero-width
/// sub-line is ever produced.
#[must_use]
pub fn wrap_line_by_char(line: &str, max_width: usize, extent: &dyn TextExtent) -> Vec<usize> {
    let mut bounds = Vec::new();
    let mut cols = Vec::new();
    let mut col = 0;
    for (i, g) in line.grapheme_indices(true) {
        bounds.push(i);
        cols.push(col);
        col += g.chars().count();
    }
    bounds.push(line.len());
    cols.push(col);
    let len = bounds.len() - 1;

    let mut offsets = Vec::new();
    let mut off = 0;
    while let Some(mut split) = find_split(line, &bounds, off, max_width, extent) {
        if split == off {
            split += 1;
            if split >= len {
                break;
            }
        }
        offsets.push(cols[split]);
        off = split;
    }
    offsets
}

/// Split offsets of one line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WrapInfo {
    offsets: Vec<usize>,
}

impl WrapInfo {
    #[must_use]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of splits. The line occupies `wrap_count() + 1` visual lines.
    #[must_use]
    pub fn wrap_count(&self) -> usize {
        self.offsets.len()
    }

    /// Recompute the offsets. Returns whether they changed and the change in
    /// split count.
    pub fn wrap(&mut self, line: &str, extent: &dyn TextExtent, max_width: usize) -> (bool, isize) {
        let offsets = wrap_line_by_char(line, max_width, extent);
        let delta = offsets.len() as isize - self.offsets.len() as isize;
        if offsets == self.offsets {
            return (false, 0);
        }
        self.offsets = offsets;
        (true, delta)
    }

    /// Drop all splits, returning how many there were.
    pub fn unwrap(&mut self) -> usize {
        let count = self.offsets.len();
        self.offsets.clear();
        count
    }

    /// Char ranges of the sub-lines. The last one runs to end of line.
    #[must_use]
    pub fn sub_ranges(&self) -> Vec<CharRange> {
        let mut ranges = Vec::with_capacity(self.offsets.len() + 1);
        let mut off = 0;
        for &split in &self.offsets {
            ranges.push(CharRange::new(off, split));
            off = split;
        }
        ranges.push(CharRange::to_eol(off));
        ranges
    }

    /// The 1-based sub-line containing column `col`, and the offset where
    /// that sub-line starts.
    #[must_use]
    pub fn sub_line_nr(&self, col: usize) -> (usize, usize) {
        let mut sub_ln = 1;
        let mut sub_off = 0;
        for &split in &self.offsets {
            if col <= split {
                break;
            }
            sub_off = split;
            sub_ln += 1;
        }
        (sub_ln, sub_off)
    }
}

/// Wrap state for a whole buffer.
///
/// Attach it to the buffer as a listener to keep it in step with edits.
pub struct WrapHelper {
    infos: Vec<WrapInfo>,
    width: usize,
    // Always the sum of `wrap_count() + 1` over all lines.
    wrapped_line_count: usize,
    extent: Box<dyn TextExtent>,
}

impl std::fmt::Debug for WrapHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapHelper")
            .field("lines", &self.infos.len())
            .field("width", &self.width)
            .field("wrapped_line_count", &self.wrapped_line_count)
            .finish_non_exhaustive()
    }
}

impl WrapHelper {
    /// Create an unwrapped helper for `buffer`.
    #[must_use]
    pub fn new(buffer: &TextBuffer, extent: Box<dyn TextExtent>) -> Self {
        let count = buffer.line_count();
        Self {
            infos: vec![WrapInfo::default(); count],
            width: 0,
            wrapped_line_count: count,
            extent,
        }
    }

    /// Current wrap width. Zero means wrapping is off.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of visual lines.
    #[must_use]
    pub fn wrapped_line_count(&self) -> usize {
        self.wrapped_line_count
    }

    #[must_use]
    pub fn wrap_info(&self, ln: usize) -> Option<&WrapInfo> {
        ln.checked_sub(1).and_then(|i| self.infos.get(i))
    }

    /// Visual lines taken by line `ln`.
    #[must_use]
    pub fn wrapped_lines_of(&self, ln: usize) -> usize {
        self.wrap_info(ln).map_or(1, |info| info.wrap_count() + 1)
    }

    /// Wrap every line at `width`. Returns the change in visual line count.
    ///
    /// A width of zero turns wrapping off.
    pub fn wrap(&mut self, buffer: &TextBuffer, width: usize) -> isize {
        if width == 0 {
            return self.unwrap();
        }
        self.width = width;
        self.sync_len(buffer);

        let mut delta = 0;
        for (info, line) in self.infos.iter_mut().zip(buffer.lines()) {
            delta += info.wrap(line.data(), self.extent.as_ref(), width).1;
        }
        self.recount();
        delta
    }

    /// Turn wrapping off. Returns the change in visual line count.
    pub fn unwrap(&mut self) -> isize {
        self.width = 0;
        let removed: usize = self.infos.iter_mut().map(WrapInfo::unwrap).sum();
        self.wrapped_line_count = self.infos.len();
        -(removed as isize)
    }

    /// Insert wrap info for a new line `ln`. Returns its split count.
    pub fn add_line_wrap(&mut self, buffer: &TextBuffer, ln: usize) -> isize {
        debug_assert!(ln >= 1 && ln <= self.infos.len() + 1);
        let idx = (ln.max(1) - 1).min(self.infos.len());
        let mut info = WrapInfo::default();
        let mut delta = 0;
        if self.width > 0 {
            delta = info.wrap(buffer.line_data(ln), self.extent.as_ref(), self.width).1;
        }
        self.wrapped_line_count += info.wrap_count() + 1;
        self.infos.insert(idx, info);
        delta
    }

    /// Remove the wrap info of deleted line `ln`.
    pub fn remove_line_wrap(&mut self, ln: usize) {
        debug_assert!(ln >= 1 && ln <= self.infos.len());
        if let Some(idx) = ln.checked_sub(1).filter(|&i| i < self.infos.len()) {
            let info = self.infos.remove(idx);
            self.wrapped_line_count -= info.wrap_count() + 1;
        }
    }

    /// Rewrap changed line `ln`. Returns the change in its split count.
    pub fn update_line_wrap(&mut self, buffer: &TextBuffer, ln: usize) -> isize {
        if self.width == 0 {
            return 0;
        }
        let Some(info) = ln.checked_sub(1).and_then(|i| self.infos.get_mut(i)) else {
            return 0;
        };
        let delta = info.wrap(buffer.line_data(ln), self.extent.as_ref(), self.width).1;
        self.wrapped_line_count = self.wrapped_line_count.saturating_add_signed(delta);
        delta
    }

    /// First visual line (1-based) of line `ln`, or 0 if `ln` is out of range.
    #[must_use]
    pub fn wrap_line_nr(&self, ln: usize) -> usize {
        if ln == 0 || ln > self.infos.len() {
            return 0;
        }
        self.infos[..ln - 1]
            .iter()
            .map(|info| info.wrap_count() + 1)
            .sum::<usize>()
            + 1
    }

    /// Line and 1-based sub-line shown at visual line `wrapped_ln`.
    #[must_use]
    pub fn unwrap_line_nr(&self, wrapped_ln: usize) -> Option<(usize, usize)> {
        let mut rest = wrapped_ln;
        for (i, info) in self.infos.iter().enumerate() {
            if rest == 0 {
                break;
            }
            let count = info.wrap_count() + 1;
            if rest <= count {
                return Some((i + 1, rest));
            }
            rest -= count;
        }
        None
    }

    /// Visual lines covered by `lines`.
    #[must_use]
    pub fn wrap_line_range(&self, lines: LineRange) -> LineRange {
        if lines.is_empty() || lines.first > self.infos.len() {
            return LineRange::EMPTY;
        }
        let first = self.wrap_line_nr(lines.first);
        let last_ln = lines.last.min(self.infos.len());
        let last = self.infos[lines.first - 1..last_ln]
            .iter()
            .map(|info| info.wrap_count() + 1)
            .sum::<usize>()
            + first
            - 1;
        LineRange::new(first, last)
    }

    /// Lines touching the visual lines in `wrapped`.
    #[must_use]
    pub fn unwrap_line_range(&self, wrapped: LineRange) -> LineRange {
        if wrapped.is_empty() {
            return LineRange::EMPTY;
        }
        let mut total = 0;
        let mut first = 0;
        for (i, info) in self.infos.iter().enumerate() {
            total += info.wrap_count() + 1;
            let ln = i + 1;
            if first == 0 && total >= wrapped.first {
                first = ln;
            }
            if first != 0 && total >= wrapped.last {
                return LineRange::new(first, ln);
            }
        }
        if first == 0 {
            LineRange::EMPTY
        } else {
            LineRange::new(first, self.infos.len())
        }
    }

    fn recount(&mut self) {
        self.wrapped_line_count = self.infos.iter().map(|info| info.wrap_count() + 1).sum();
    }

    fn sync_len(&mut self, buffer: &TextBuffer) {
        debug_assert_eq!(self.infos.len(), buffer.line_count(), "wrap infos out of step");
        self.infos.resize(buffer.line_count(), WrapInfo::default());
    }

    fn rebuild(&mut self, buffer: &TextBuffer) {
        self.infos = vec![WrapInfo::default(); buffer.line_count()];
        if self.width > 0 {
            self.wrap(buffer, self.width);
        } else {
            self.recount();
        }
    }
}

impl BufferListener for WrapHelper {
    fn on_buffer_change(&mut self, buffer: &TextBuffer, change: &LineChange) {
        match change.kind {
            ChangeKind::Insert => {
                for ln in change.lines.iter() {
                    self.add_line_wrap(buffer, ln);
                }
            }
            ChangeKind::Delete => {
                for _ in change.lines.iter() {
                    self.remove_line_wrap(change.lines.first);
                }
            }
            ChangeKind::Update => {
                for ln in change.lines.iter() {
                    self.update_line_wrap(buffer, ln);
                }
            }
            ChangeKind::Bulk => self.rebuild(buffer),
        }
    }
}
