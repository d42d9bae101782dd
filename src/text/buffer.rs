//! The line buffer: storage, edit primitives, history and change fan-out.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::log::{LogLevel, emit_log};
use crate::options::{FileFormat, TextOptions};
use crate::text::action::Action;
use crate::text::history::History;
use crate::text::line::{LexElement, TextLine};
use crate::text::point::{CharRange, LineRange, Seek, TextPoint, TextRange, TextUnit};

/// Identity of a buffer, stable across snapshots of the same buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Kind of a line-level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Delete,
    Update,
    /// The whole content was replaced.
    Bulk,
}

/// A change notification. `lines` is valid at the moment of delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineChange {
    pub kind: ChangeKind,
    pub lines: LineRange,
}

impl LineChange {
    #[must_use]
    pub fn new(kind: ChangeKind, lines: LineRange) -> Self {
        Self { kind, lines }
    }
}

/// Receiver of buffer change notifications.
///
/// Delivery is synchronous and ordered. Implementations must not call back
/// into the buffer's mutation API.
pub trait BufferListener {
    fn on_buffer_change(&mut self, buffer: &TextBuffer, change: &LineChange);

    fn on_file_format_change(&mut self, _buffer: &TextBuffer, _format: FileFormat) {}
}

/// Plain, `Send` copy of a buffer's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferSnapshot {
    pub id: BufferId,
    pub lines: Vec<String>,
    pub file_format: FileFormat,
}

impl BufferSnapshot {
    /// Content joined with the snapshot's line ending.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join(self.file_format.line_ending())
    }
}

/// Split `text` at `\n`, `\r\n` and `\r`.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&text[start..]);
    lines
}

/// Point reached after inserting `text` (with `\n` separators) at `start`.
pub(crate) fn end_point(start: TextPoint, text: &str) -> TextPoint {
    let mut pieces = text.split('\n');
    let first = pieces.next().unwrap_or_default();
    let mut end = TextPoint::new(start.line, start.col + first.chars().count());
    for piece in pieces {
        end = TextPoint::new(end.line + 1, piece.chars().count());
    }
    end
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// Char offsets of word-segment boundaries, always starting with 0 and
/// ending with the line length.
fn word_bounds(line: &TextLine) -> Vec<usize> {
    let mut bounds = vec![0];
    let mut col = 0;
    for word in line.data().split_word_bounds() {
        col += word.chars().count();
        bounds.push(col);
    }
    bounds
}

fn all_whitespace(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// An ordered list of lines with edit history and listeners.
///
/// The buffer always holds at least one (possibly empty) line. Lines are
/// addressed 1-based. Every edit primitive notifies listeners in order:
/// removed lines, then the surviving line, then inserted lines.
pub struct TextBuffer {
    id: BufferId,
    lines: Vec<TextLine>,
    file_format: FileFormat,
    options: TextOptions,
    history: History,
    listeners: Vec<Weak<RefCell<dyn BufferListener>>>,
    revision: u64,
    next_serial: u64,
    saved_serial: Option<u64>,
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("id", &self.id)
            .field("lines", &self.lines.len())
            .field("file_format", &self.file_format)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(TextOptions::default())
    }
}

impl TextBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new(options: TextOptions) -> Self {
        Self::with_lines(BufferId::next(), vec![TextLine::default()], options.file_format, options)
    }

    /// Create a buffer from text, detecting the line ending from the first
    /// terminator found.
    #[must_use]
    pub fn from_text(text: &str, options: TextOptions) -> Self {
        let file_format = FileFormat::detect(text).unwrap_or(options.file_format);
        let lines = split_lines(text).into_iter().map(TextLine::new).collect();
        Self::with_lines(BufferId::next(), lines, file_format, options)
    }

    /// Recreate a buffer from a snapshot. The buffer keeps the snapshot's id.
    #[must_use]
    pub fn from_snapshot(snapshot: BufferSnapshot, options: TextOptions) -> Self {
        let mut lines: Vec<TextLine> = snapshot
            .lines
            .iter()
            .map(|l| TextLine::new(l))
            .collect();
        if lines.is_empty() {
            lines.push(TextLine::default());
        }
        Self::with_lines(snapshot.id, lines, snapshot.file_format, options)
    }

    fn with_lines(
        id: BufferId,
        lines: Vec<TextLine>,
        file_format: FileFormat,
        options: TextOptions,
    ) -> Self {
        Self {
            id,
            lines,
            file_format,
            history: History::with_max_depth(options.max_history_depth),
            options,
            listeners: Vec::new(),
            revision: 0,
            next_serial: 0,
            saved_serial: None,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            id: self.id,
            lines: self.lines.iter().map(|l| l.data().to_string()).collect(),
            file_format: self.file_format,
        }
    }

    /// Replace the whole content. Clears the history.
    pub fn set_text(&mut self, text: &str) {
        self.lines = split_lines(text).into_iter().map(TextLine::new).collect();
        self.history.clear();
        self.saved_serial = None;
        self.touch();
        let all = LineRange::new(1, self.lines.len());
        self.notify(LineChange::new(ChangeKind::Bulk, all));
    }

    #[must_use]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[must_use]
    pub fn options(&self) -> &TextOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TextOptions) {
        self.history.set_max_depth(options.max_history_depth);
        self.options = options;
    }

    #[must_use]
    pub fn file_format(&self) -> FileFormat {
        self.file_format
    }

    /// Counter bumped by every content change.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line `ln` (1-based).
    #[must_use]
    pub fn line(&self, ln: usize) -> Option<&TextLine> {
        ln.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    /// Content of line `ln`, empty if out of range.
    #[must_use]
    pub fn line_data(&self, ln: usize) -> &str {
        self.line(ln).map_or("", TextLine::data)
    }

    /// Length of line `ln` in characters, 0 if out of range.
    #[must_use]
    pub fn line_len(&self, ln: usize) -> usize {
        self.line(ln).map_or(0, TextLine::len)
    }

    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.lines.iter()
    }

    /// The point after the last character.
    #[must_use]
    pub fn end_point(&self) -> TextPoint {
        let ln = self.lines.len();
        TextPoint::new(ln, self.line_len(ln))
    }

    /// Content joined with the buffer's line ending.
    #[must_use]
    pub fn text(&self) -> String {
        let ending = self.file_format.line_ending();
        let mut text = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                text.push_str(ending);
            }
            text.push_str(line.data());
        }
        text
    }

    /// Validate that `point` addresses an existing position.
    pub fn check_point(&self, point: TextPoint) -> Result<()> {
        let count = self.lines.len();
        if point.line == 0 || point.line > count {
            return Err(Error::LineOutOfBounds {
                line: point.line,
                count,
            });
        }
        if point.col > self.line_len(point.line) {
            return Err(Error::PointOutOfBounds {
                line: point.line,
                col: point.col,
            });
        }
        Ok(())
    }

    /// Clamp `point` into the buffer.
    #[must_use]
    pub fn clamp_point(&self, point: TextPoint) -> TextPoint {
        let line = point.line.clamp(1, self.lines.len());
        TextPoint::new(line, point.col.min(self.line_len(line)))
    }

    fn checked(&self, point: TextPoint) -> TextPoint {
        debug_assert!(
            self.check_point(point).is_ok(),
            "point {point} outside buffer"
        );
        self.clamp_point(point)
    }

    // ---- listeners ----

    /// Register a listener. It is dropped from the list once its owner drops it.
    pub fn attach_listener(&mut self, listener: Weak<RefCell<dyn BufferListener>>) {
        self.listeners.push(listener);
    }

    pub fn detach_listener(&mut self, listener: &Weak<RefCell<dyn BufferListener>>) {
        self.listeners.retain(|l| !Weak::ptr_eq(l, listener));
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().filter(|l| l.strong_count() > 0).count()
    }

    fn notify(&mut self, change: LineChange) {
        if change.lines.is_empty() && change.kind != ChangeKind::Bulk {
            return;
        }
        self.listeners.retain(|l| l.strong_count() > 0);
        let this: &Self = self;
        for listener in &this.listeners {
            let Some(listener) = listener.upgrade() else {
                continue;
            };
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.on_buffer_change(this, &change),
                Err(_) => emit_log(
                    LogLevel::Warn,
                    &format!(
                        "buffer listener busy, dropped {:?} of lines {}..={}",
                        change.kind, change.lines.first, change.lines.last
                    ),
                ),
            }
        }
    }

    fn notify_file_format(&mut self) {
        self.listeners.retain(|l| l.strong_count() > 0);
        let this: &Self = self;
        for listener in &this.listeners {
            let Some(listener) = listener.upgrade() else {
                continue;
            };
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.on_file_format_change(this, this.file_format),
                Err(_) => emit_log(
                    LogLevel::Warn,
                    &format!(
                        "buffer listener busy, dropped file format change to {:?}",
                        this.file_format
                    ),
                ),
            }
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ---- edit primitives ----

    /// Insert `c` at `point`. A line break splits the line.
    /// Returns the point after the inserted character.
    pub fn insert_char(&mut self, point: TextPoint, c: char) -> TextPoint {
        let point = self.checked(point);
        let idx = point.line - 1;
        if is_line_break(c) {
            let tail = self.lines[idx].split_off(point.col);
            self.lines.insert(idx + 1, TextLine::new(&tail));
            self.touch();
            self.notify(LineChange::new(ChangeKind::Update, LineRange::single(point.line)));
            self.notify(LineChange::new(ChangeKind::Insert, LineRange::single(point.line + 1)));
            TextPoint::new(point.line + 1, 0)
        } else {
            self.lines[idx].insert_char(point.col, c);
            self.touch();
            self.notify(LineChange::new(ChangeKind::Update, LineRange::single(point.line)));
            TextPoint::new(point.line, point.col + 1)
        }
    }

    /// Insert a string at `point`. Returns the point after the insertion.
    pub fn insert_string(&mut self, point: TextPoint, s: &str) -> TextPoint {
        if s.contains(is_line_break) {
            return self.insert_text(point, s);
        }
        let point = self.checked(point);
        if s.is_empty() {
            return point;
        }
        self.lines[point.line - 1].insert_str(point.col, s);
        self.touch();
        self.notify(LineChange::new(ChangeKind::Update, LineRange::single(point.line)));
        TextPoint::new(point.line, point.col + s.chars().count())
    }

    /// Insert possibly multi-line text at `point`.
    /// Returns the point after the insertion.
    pub fn insert_text(&mut self, point: TextPoint, text: &str) -> TextPoint {
        let pieces = split_lines(text);
        let Some((first, rest)) = pieces.split_first() else {
            return point;
        };
        if rest.is_empty() {
            return self.insert_string(point, first);
        }

        let point = self.checked(point);
        let idx = point.line - 1;
        let tail = self.lines[idx].split_off(point.col);
        self.lines[idx].append(first);

        let mut new_lines: Vec<TextLine> = rest.iter().map(|p| TextLine::new(p)).collect();
        let mut end_col = 0;
        if let Some(last) = new_lines.last_mut() {
            end_col = last.len();
            last.append(&tail);
        }
        let added = new_lines.len();
        self.lines.splice(point.line..point.line, new_lines);
        self.touch();

        self.notify(LineChange::new(ChangeKind::Update, LineRange::single(point.line)));
        self.notify(LineChange::new(
            ChangeKind::Insert,
            LineRange::new(point.line + 1, point.line + added),
        ));
        TextPoint::new(point.line + added, end_col)
    }

    /// Delete the text in `range` and return it, lines joined with `\n`.
    pub fn delete_text(&mut self, range: TextRange) -> String {
        let start = self.checked(range.start);
        let end = self.checked(range.end);
        if start >= end {
            return String::new();
        }

        if start.line == end.line {
            let removed = self.lines[start.line - 1].delete(CharRange::new(start.col, end.col));
            self.touch();
            self.notify(LineChange::new(ChangeKind::Update, LineRange::single(start.line)));
            return removed;
        }

        let removed = self.get_text(TextRange::new(start, end));
        let tail = self.lines[end.line - 1]
            .sub(CharRange::to_eol(end.col))
            .to_string();
        let first = &mut self.lines[start.line - 1];
        first.split_off(start.col);
        first.append(&tail);
        self.lines.drain(start.line..end.line);
        self.touch();

        self.notify(LineChange::new(
            ChangeKind::Delete,
            LineRange::new(start.line + 1, end.line),
        ));
        self.notify(LineChange::new(ChangeKind::Update, LineRange::single(start.line)));
        removed
    }

    /// Text in `range`, lines joined with `\n`.
    #[must_use]
    pub fn get_text(&self, range: TextRange) -> String {
        let start = self.clamp_point(range.start);
        let end = self.clamp_point(range.end);
        if start >= end {
            return String::new();
        }
        if start.line == end.line {
            return self.lines[start.line - 1]
                .sub(CharRange::new(start.col, end.col))
                .to_string();
        }

        let mut text = self.lines[start.line - 1]
            .sub(CharRange::to_eol(start.col))
            .to_string();
        for line in &self.lines[start.line..end.line - 1] {
            text.push('\n');
            text.push_str(line.data());
        }
        text.push('\n');
        text.push_str(self.lines[end.line - 1].sub(CharRange::new(0, end.col)));
        text
    }

    /// Replace the leading whitespace of line `ln`, returning the old one.
    pub fn set_line_indent(&mut self, ln: usize, indent: &str) -> String {
        let ln = self.checked(TextPoint::new(ln, 0)).line;
        let line = &mut self.lines[ln - 1];
        let old = line.delete(CharRange::new(0, line.indent_len()));
        line.insert_str(0, indent);
        self.touch();
        self.notify(LineChange::new(ChangeKind::Update, LineRange::single(ln)));
        old
    }

    /// Switch the line ending. Returns the previous format.
    pub fn set_file_format(&mut self, format: FileFormat) -> FileFormat {
        let old = self.file_format;
        if old != format {
            self.file_format = format;
            self.touch();
            self.notify_file_format();
        }
        old
    }

    /// Replace the lex elements of line `ln`. Does not notify.
    pub fn set_lex_elements(&mut self, ln: usize, elements: Vec<LexElement>) {
        if let Some(line) = ln.checked_sub(1).and_then(|i| self.lines.get_mut(i)) {
            line.set_lex_elements(elements);
        }
    }

    /// Indent width for line `ln` derived from the lines above it.
    ///
    /// The nearest non-blank line above gives the base width, one shift
    /// width is added when it ends with an opening bracket and one is
    /// removed when line `ln` starts with a closing bracket.
    #[must_use]
    pub fn guess_indent(&self, ln: usize) -> usize {
        let Some(prev) = self.lines[..ln.saturating_sub(1).min(self.lines.len())]
            .iter()
            .rev()
            .find(|l| !l.is_blank(true))
        else {
            return 0;
        };

        let TextOptions {
            tab_stop,
            shift_width,
            ..
        } = self.options;
        let mut width = prev.indent(tab_stop);
        if ['{', '(', '['].iter().any(|&c| prev.ends_with(c, true).is_some()) {
            width += shift_width;
        }
        if let Some(line) = self.line(ln) {
            if ['}', ')', ']'].iter().any(|&c| line.starts_with(c, true).is_some()) {
                width = width.saturating_sub(shift_width);
            }
        }
        width
    }

    // ---- seeking ----

    fn prev_char(&self, p: TextPoint) -> TextPoint {
        if p.col > 0 {
            TextPoint::new(p.line, p.col - 1)
        } else if p.line > 1 {
            TextPoint::new(p.line - 1, self.line_len(p.line - 1))
        } else {
            p
        }
    }

    fn next_char(&self, p: TextPoint) -> TextPoint {
        if p.col < self.line_len(p.line) {
            TextPoint::new(p.line, p.col + 1)
        } else if p.line < self.lines.len() {
            TextPoint::new(p.line + 1, 0)
        } else {
            p
        }
    }

    /// Start of the previous word, skipping whitespace directly before `p`.
    fn prev_word(&self, p: TextPoint) -> TextPoint {
        let Some(line) = self.line(p.line) else {
            return p;
        };
        if p.col == 0 {
            return self.prev_char(p);
        }
        let bounds = word_bounds(line);
        let i = bounds.partition_point(|&b| b < p.col);
        let mut start = bounds[i - 1];
        if i >= 2 && all_whitespace(line.sub(CharRange::new(start, p.col))) {
            start = bounds[i - 2];
        }
        TextPoint::new(p.line, start)
    }

    /// End of the current word, including whitespace directly after it.
    fn next_word(&self, p: TextPoint) -> TextPoint {
        let Some(line) = self.line(p.line) else {
            return p;
        };
        if p.col >= line.len() {
            return self.next_char(p);
        }
        let bounds = word_bounds(line);
        let i = bounds.partition_point(|&b| b <= p.col);
        let mut end = bounds.get(i).copied().unwrap_or(line.len());
        if !all_whitespace(line.sub(CharRange::new(p.col, end))) {
            if let Some(&next) = bounds.get(i + 1) {
                if all_whitespace(line.sub(CharRange::new(end, next))) {
                    end = next;
                }
            }
        }
        TextPoint::new(p.line, end)
    }

    fn word_at(&self, p: TextPoint) -> TextRange {
        let Some(line) = self.line(p.line) else {
            return TextRange::at(p);
        };
        if p.col >= line.len() {
            return TextRange::at(p);
        }
        let bounds = word_bounds(line);
        let i = bounds.partition_point(|&b| b <= p.col);
        let start = bounds[i - 1];
        let end = bounds.get(i).copied().unwrap_or(line.len());
        TextRange::new(TextPoint::new(p.line, start), TextPoint::new(p.line, end))
    }

    /// The span covered by moving `count` units from `point`.
    ///
    /// Unsupported unit/seek combinations give an empty range at `point`.
    #[must_use]
    pub fn seek_range(&self, point: TextPoint, unit: TextUnit, seek: Seek, count: usize) -> TextRange {
        let p = self.clamp_point(point);
        let count = count.max(1);
        let ln = p.line;
        let len = self.line_len(ln);
        let n = self.lines.len();
        let span = |a: TextPoint, b: TextPoint| TextRange::new(a, b);

        match (unit, seek) {
            (TextUnit::Char, Seek::Prev) => {
                let start = (0..count).fold(p, |q, _| self.prev_char(q));
                span(start, p)
            }
            (TextUnit::Char, Seek::Next) => {
                let end = (0..count).fold(p, |q, _| self.next_char(q));
                span(p, end)
            }
            (TextUnit::Char, Seek::Whole) if p.col < len => {
                span(p, TextPoint::new(ln, p.col + 1))
            }
            (TextUnit::Word, Seek::Prev) => {
                let start = (0..count).fold(p, |q, _| self.prev_word(q));
                span(start, p)
            }
            (TextUnit::Word, Seek::Next) => {
                let end = (0..count).fold(p, |q, _| self.next_word(q));
                span(p, end)
            }
            (TextUnit::Word, Seek::Whole) => self.word_at(p),
            (TextUnit::Word, Seek::Begin) => span(self.word_at(p).start, p),
            (TextUnit::Word, Seek::End) => span(p, self.word_at(p).end),
            (TextUnit::Line, Seek::Whole) => {
                let last = (ln + count - 1).min(n);
                if last < n {
                    span(TextPoint::new(ln, 0), TextPoint::new(last + 1, 0))
                } else if ln > 1 {
                    span(
                        TextPoint::new(ln - 1, self.line_len(ln - 1)),
                        TextPoint::new(last, self.line_len(last)),
                    )
                } else {
                    span(TextPoint::new(ln, 0), TextPoint::new(last, self.line_len(last)))
                }
            }
            (TextUnit::Line, Seek::Begin) => span(TextPoint::new(ln, 0), p),
            (TextUnit::Line, Seek::End) => span(p, TextPoint::new(ln, len)),
            (TextUnit::Line, Seek::Prev) if ln > 1 => {
                span(TextPoint::new(ln.saturating_sub(count).max(1), 0), TextPoint::new(ln, 0))
            }
            (TextUnit::Line, Seek::Next) if ln < n => {
                let last = (ln + count).min(n);
                span(TextPoint::new(ln, len), TextPoint::new(last, self.line_len(last)))
            }
            (TextUnit::Buffer, Seek::Begin) => span(TextPoint::new(1, 0), p),
            (TextUnit::Buffer, Seek::End) => span(p, self.end_point()),
            (TextUnit::Buffer, Seek::Whole) => span(TextPoint::new(1, 0), self.end_point()),
            _ => TextRange::at(p),
        }
    }

    /// The point reached by moving `count` units from `point`.
    #[must_use]
    pub fn seek(&self, point: TextPoint, unit: TextUnit, seek: Seek, count: usize) -> TextPoint {
        let range = self.seek_range(point, unit, seek, count);
        match seek {
            Seek::Next | Seek::End => range.end,
            Seek::Prev | Seek::Begin | Seek::Whole => range.start,
        }
    }

    // ---- history ----

    /// Execute `action`, record it for undo and return the caret after it.
    ///
    /// Ineffective actions are not recorded.
    pub fn execute(&mut self, action: Action) -> TextPoint {
        self.execute_with_selection(action).0
    }

    /// Like [`execute`](Self::execute), also returning the selection a range
    /// action leaves behind.
    pub fn execute_with_selection(&mut self, mut action: Action) -> (TextPoint, Option<TextRange>) {
        let caret = action.exec(self);
        let selection = action.selection_after_exec();
        if action.is_effective() {
            self.next_serial += 1;
            action.set_serial(self.next_serial);
            action.set_grouped(self.history.in_group());
            self.history.push(action, self.saved_serial);
        }
        (caret, selection)
    }

    /// Undo the most recent entry, returning the caret before it.
    pub fn undo(&mut self) -> Option<TextPoint> {
        let mut entry = self.history.pop_undo()?;
        let mut caret = None;
        for action in entry.iter_mut().rev() {
            caret = Some(action.undo(self));
        }
        self.history.push_redo(entry);
        caret
    }

    /// Redo the most recently undone entry, returning the caret after it.
    pub fn redo(&mut self) -> Option<TextPoint> {
        let mut entry = self.history.pop_redo()?;
        let mut caret = None;
        for action in &mut entry {
            caret = Some(action.exec(self));
        }
        self.history.push_undo(entry);
        caret
    }

    /// Open a group. Actions executed until the matching `end_group` undo
    /// as one unit. Groups nest; only the outermost one commits.
    pub fn begin_group(&mut self) {
        self.history.begin_group();
    }

    pub fn end_group(&mut self) {
        self.history.end_group();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of undo entries.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.history.undo_len()
    }

    /// Number of redo entries.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.history.redo_len()
    }

    pub fn clear_history(&mut self) {
        let modified = self.is_modified();
        self.history.clear();
        self.saved_serial = modified.then_some(u64::MAX);
    }

    /// Record the current history position as saved.
    pub fn mark_saved(&mut self) {
        self.saved_serial = self.history.top_serial();
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.history.top_serial() != self.saved_serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn buffer(text: &str) -> TextBuffer {
        TextBuffer::from_text(text, TextOptions::default())
    }

    fn lines(buffer: &TextBuffer) -> Vec<&str> {
        buffer.lines().map(TextLine::data).collect()
    }

    #[derive(Default)]
    struct Recorder {
        changes: Vec<LineChange>,
        formats: Vec<FileFormat>,
    }

    impl BufferListener for Recorder {
        fn on_buffer_change(&mut self, _buffer: &TextBuffer, change: &LineChange) {
            self.changes.push(*change);
        }

        fn on_file_format_change(&mut self, _buffer: &TextBuffer, format: FileFormat) {
            self.formats.push(format);
        }
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines(""), vec![""]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\nb\r"), vec!["a", "b", ""]);
        assert_eq!(split_lines("a\rb\n\nc"), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_end_point() {
        let p = TextPoint::new(2, 3);
        assert_eq!(end_point(p, "ab"), TextPoint::new(2, 5));
        assert_eq!(end_point(p, "ab\ncd\ne"), TextPoint::new(4, 1));
        assert_eq!(end_point(p, "\n"), TextPoint::new(3, 0));
    }

    #[test]
    fn test_from_text_detects_format() {
        let buf = buffer("a\r\nb");
        assert_eq!(buf.file_format(), FileFormat::Windows);
        assert_eq!(lines(&buf), vec!["a", "b"]);
        assert_eq!(buf.text(), "a\r\nb");

        let buf = buffer("");
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.end_point(), TextPoint::new(1, 0));
    }

    #[test]
    fn test_insert_and_delete_text() {
        let mut buf = buffer("abc\ndef");
        let end = buf.insert_text(TextPoint::new(1, 1), "X\nY\nZ");
        assert_eq!(end, TextPoint::new(3, 1));
        assert_eq!(lines(&buf), vec!["aX", "Y", "Zbc", "def"]);

        let range = TextRange::new(TextPoint::new(1, 1), end);
        assert_eq!(buf.get_text(range), "X\nY\nZ");
        assert_eq!(buf.delete_text(range), "X\nY\nZ");
        assert_eq!(lines(&buf), vec!["abc", "def"]);
    }

    #[test]
    fn test_insert_newline_char() {
        let mut buf = buffer("abcd");
        let end = buf.insert_char(TextPoint::new(1, 2), '\n');
        assert_eq!(end, TextPoint::new(2, 0));
        assert_eq!(lines(&buf), vec!["ab", "cd"]);
        buf.delete_text(TextRange::new(TextPoint::new(1, 2), end));
        assert_eq!(lines(&buf), vec!["abcd"]);
    }

    #[test]
    fn test_check_point() {
        let buf = buffer("abc\nde");
        assert!(buf.check_point(TextPoint::new(2, 2)).is_ok());
        assert!(matches!(
            buf.check_point(TextPoint::new(3, 0)),
            Err(Error::LineOutOfBounds { line: 3, count: 2 })
        ));
        assert!(matches!(
            buf.check_point(TextPoint::new(2, 3)),
            Err(Error::PointOutOfBounds { line: 2, col: 3 })
        ));
        assert_eq!(buf.clamp_point(TextPoint::new(9, 9)), TextPoint::new(2, 2));
    }

    #[test]
    fn test_seek_chars_cross_lines() {
        let buf = buffer("ab\ncd");
        let p = TextPoint::new(2, 0);
        assert_eq!(buf.seek(p, TextUnit::Char, Seek::Prev, 1), TextPoint::new(1, 2));
        assert_eq!(buf.seek(TextPoint::new(1, 2), TextUnit::Char, Seek::Next, 1), p);
        assert_eq!(buf.seek(TextPoint::new(1, 0), TextUnit::Char, Seek::Prev, 1), TextPoint::new(1, 0));
        assert_eq!(buf.seek(TextPoint::new(1, 1), TextUnit::Char, Seek::Next, 3), TextPoint::new(2, 1));
    }

    #[test]
    fn test_seek_words() {
        let buf = buffer("foo bar  baz");
        let p = TextPoint::new(1, 8);
        assert_eq!(buf.seek(p, TextUnit::Word, Seek::Prev, 1), TextPoint::new(1, 4));
        assert_eq!(buf.seek(TextPoint::new(1, 0), TextUnit::Word, Seek::Next, 1), TextPoint::new(1, 4));
        assert_eq!(buf.seek(TextPoint::new(1, 4), TextUnit::Word, Seek::Next, 1), TextPoint::new(1, 9));
        let word = buf.seek_range(TextPoint::new(1, 5), TextUnit::Word, Seek::Whole, 1);
        assert_eq!(buf.get_text(word), "bar");
    }

    #[test]
    fn test_seek_lines() {
        let buf = buffer("one\ntwo\nthree");
        let whole = buf.seek_range(TextPoint::new(2, 1), TextUnit::Line, Seek::Whole, 1);
        assert_eq!(buf.get_text(whole), "two\n");
        let last = buf.seek_range(TextPoint::new(3, 1), TextUnit::Line, Seek::Whole, 1);
        assert_eq!(buf.get_text(last), "\nthree");
        let begin = buf.seek_range(TextPoint::new(3, 2), TextUnit::Line, Seek::Begin, 1);
        assert_eq!(buf.get_text(begin), "th");
        let end = buf.seek_range(TextPoint::new(3, 2), TextUnit::Line, Seek::End, 1);
        assert_eq!(buf.get_text(end), "ree");
        assert!(buf
            .seek_range(TextPoint::new(1, 0), TextUnit::Buffer, Seek::Prev, 1)
            .is_empty());
    }

    #[test]
    fn test_listener_notification_order() {
        let mut buf = buffer("a\nb\nc\nd");
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let weak: Weak<RefCell<dyn BufferListener>> = Rc::downgrade(&recorder) as _;
        buf.attach_listener(weak.clone());

        buf.delete_text(TextRange::new(TextPoint::new(1, 1), TextPoint::new(3, 0)));
        buf.insert_text(TextPoint::new(1, 1), "x\ny");
        buf.set_file_format(FileFormat::Mac);

        let changes = recorder.borrow().changes.clone();
        assert_eq!(
            changes,
            vec![
                LineChange::new(ChangeKind::Delete, LineRange::new(2, 3)),
                LineChange::new(ChangeKind::Update, LineRange::single(1)),
                LineChange::new(ChangeKind::Update, LineRange::single(1)),
                LineChange::new(ChangeKind::Insert, LineRange::single(2)),
            ]
        );
        assert_eq!(recorder.borrow().formats, vec![FileFormat::Mac]);

        buf.detach_listener(&weak);
        buf.insert_char(TextPoint::new(1, 0), 'z');
        assert_eq!(recorder.borrow().changes.len(), 4);
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let mut buf = buffer("a");
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        buf.attach_listener(Rc::downgrade(&recorder) as _);
        assert_eq!(buf.listener_count(), 1);
        drop(recorder);
        buf.insert_char(TextPoint::new(1, 0), 'z');
        assert_eq!(buf.listener_count(), 0);
    }

    #[test]
    fn test_guess_indent() {
        let buf = buffer("fn main() {\n\n  x\n}");
        assert_eq!(buf.guess_indent(1), 0);
        assert_eq!(buf.guess_indent(2), 4);
        assert_eq!(buf.guess_indent(3), 4);
        assert_eq!(buf.guess_indent(4), 0);
    }

    #[test]
    fn test_set_line_indent() {
        let mut buf = buffer("\t  abc");
        let old = buf.set_line_indent(1, "    ");
        assert_eq!(old, "\t  ");
        assert_eq!(buf.line_data(1), "    abc");
    }

    #[test]
    fn test_snapshot_keeps_id() {
        let buf = buffer("x\ny");
        let snapshot = buf.snapshot();
        assert_eq!(snapshot.text(), "x\ny");
        let copy = TextBuffer::from_snapshot(snapshot, TextOptions::default());
        assert_eq!(copy.id(), buf.id());
        assert_eq!(copy.text(), buf.text());
    }
}
