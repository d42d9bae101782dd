//! Reversible edit commands.

use std::time::Instant;

use crate::options::FileFormat;
use crate::text::buffer::{TextBuffer, end_point};
use crate::text::indent::{indent_string, shift_removal};
use crate::text::point::{Seek, TextDelta, TextDir, TextPoint, TextRange, TextUnit};

/// The range an indent or delete-range action operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeAction {
    pub range: TextRange,
    pub dir: TextDir,
    /// Whether the range was an active selection.
    pub selected: bool,
}

impl RangeAction {
    #[must_use]
    pub fn new(range: TextRange, dir: TextDir, selected: bool) -> Self {
        Self {
            range,
            dir,
            selected,
        }
    }

    /// Caret position implied by the direction.
    #[must_use]
    pub fn caret(&self) -> TextPoint {
        match self.dir {
            TextDir::Forward => self.range.end,
            TextDir::Backward => self.range.start,
        }
    }
}

/// Text removed by a delete-by-unit action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletedText {
    pub start: TextPoint,
    pub text: String,
}

/// Leading whitespace of one line before and after an indent action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndentChange {
    pub line: usize,
    pub old: String,
    pub new: String,
}

impl IndentChange {
    fn delta(&self) -> isize {
        self.new.chars().count() as isize - self.old.chars().count() as isize
    }
}

/// The edit an [`Action`] performs. Fields marked as recorded are filled on
/// first execution and replayed on redo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    InsertChar {
        c: char,
        dir: TextDir,
    },
    InsertString {
        text: String,
    },
    InsertText {
        text: String,
    },
    Delete {
        unit: TextUnit,
        seek: Seek,
        count: usize,
        /// Recorded.
        deleted: Option<DeletedText>,
    },
    DeleteRange {
        range: RangeAction,
        /// Recorded.
        text: String,
    },
    IncreaseIndent {
        range: RangeAction,
        /// Recorded.
        changes: Vec<IndentChange>,
    },
    DecreaseIndent {
        range: RangeAction,
        /// Recorded.
        changes: Vec<IndentChange>,
    },
    AutoIndent {
        range: RangeAction,
        /// Recorded.
        changes: Vec<IndentChange>,
    },
    SetFileFormat {
        format: FileFormat,
        /// Recorded.
        old: FileFormat,
    },
}

/// A reversible edit.
///
/// Build one with a constructor, hand it to [`TextBuffer::execute`] and the
/// buffer keeps it for undo. An action whose edit turned out to be a no-op is
/// marked ineffective; undoing it does nothing.
#[derive(Clone, Debug)]
pub struct Action {
    kind: ActionKind,
    point: TextPoint,
    delta: TextDelta,
    caret_point: TextPoint,
    effective: bool,
    executed: bool,
    grouped: bool,
    serial: u64,
    timestamp: Instant,
}

impl Action {
    fn with_kind(kind: ActionKind, point: TextPoint, caret_point: TextPoint) -> Self {
        Self {
            kind,
            point,
            delta: TextDelta::ZERO,
            caret_point,
            effective: true,
            executed: false,
            grouped: false,
            serial: 0,
            timestamp: Instant::now(),
        }
    }

    fn with_range(
        make: fn(RangeAction) -> ActionKind,
        range: TextRange,
        dir: TextDir,
        selected: bool,
    ) -> Self {
        let range = RangeAction::new(range, dir, selected);
        Self::with_kind(make(range), range.range.start, range.caret())
    }

    /// Insert one character. A line break splits the line.
    #[must_use]
    pub fn insert_char(point: TextPoint, c: char) -> Self {
        Self::with_kind(
            ActionKind::InsertChar {
                c,
                dir: TextDir::Forward,
            },
            point,
            point,
        )
    }

    /// Insert a single-line string.
    #[must_use]
    pub fn insert_string(point: TextPoint, text: impl Into<String>) -> Self {
        Self::with_kind(ActionKind::InsertString { text: text.into() }, point, point)
    }

    /// Insert text that may span several lines.
    #[must_use]
    pub fn insert_text(point: TextPoint, text: impl Into<String>) -> Self {
        Self::with_kind(ActionKind::InsertText { text: text.into() }, point, point)
    }

    /// Delete one `unit` in the `seek` direction from `point`.
    #[must_use]
    pub fn delete(point: TextPoint, unit: TextUnit, seek: Seek) -> Self {
        Self::with_kind(
            ActionKind::Delete {
                unit,
                seek,
                count: 1,
                deleted: None,
            },
            point,
            point,
        )
    }

    #[must_use]
    pub fn delete_range(range: TextRange, dir: TextDir, selected: bool) -> Self {
        Self::with_range(
            |range| ActionKind::DeleteRange {
                range,
                text: String::new(),
            },
            range,
            dir,
            selected,
        )
    }

    #[must_use]
    pub fn increase_indent(range: TextRange, dir: TextDir, selected: bool) -> Self {
        Self::with_range(
            |range| ActionKind::IncreaseIndent {
                range,
                changes: Vec::new(),
            },
            range,
            dir,
            selected,
        )
    }

    #[must_use]
    pub fn decrease_indent(range: TextRange, dir: TextDir, selected: bool) -> Self {
        Self::with_range(
            |range| ActionKind::DecreaseIndent {
                range,
                changes: Vec::new(),
            },
            range,
            dir,
            selected,
        )
    }

    #[must_use]
    pub fn auto_indent(range: TextRange, dir: TextDir, selected: bool) -> Self {
        Self::with_range(
            |range| ActionKind::AutoIndent {
                range,
                changes: Vec::new(),
            },
            range,
            dir,
            selected,
        )
    }

    #[must_use]
    pub fn set_file_format(point: TextPoint, format: FileFormat) -> Self {
        Self::with_kind(
            ActionKind::SetFileFormat {
                format,
                old: format,
            },
            point,
            point,
        )
    }

    /// Insert-char only: keep the caret before the inserted character.
    #[must_use]
    pub fn with_dir(mut self, dir: TextDir) -> Self {
        if let ActionKind::InsertChar { dir: d, .. } = &mut self.kind {
            *d = dir;
        }
        self
    }

    /// Delete only: repeat the unit `count` times.
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        if let ActionKind::Delete { count: n, .. } = &mut self.kind {
            *n = count.max(1);
        }
        self
    }

    /// Caret to restore on undo.
    #[must_use]
    pub fn with_caret_point(mut self, caret_point: TextPoint) -> Self {
        self.caret_point = caret_point;
        self
    }

    pub fn set_caret_point(&mut self, caret_point: TextPoint) {
        self.caret_point = caret_point;
    }

    #[must_use]
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The edit anchor.
    #[must_use]
    pub fn point(&self) -> TextPoint {
        self.point
    }

    /// Caret displacement from the anchor after execution.
    #[must_use]
    pub fn delta(&self) -> TextDelta {
        self.delta
    }

    /// Caret before execution, restored on undo.
    #[must_use]
    pub fn caret_point(&self) -> TextPoint {
        self.caret_point
    }

    /// Caret after execution.
    #[must_use]
    pub fn caret_after(&self) -> TextPoint {
        self.point + self.delta
    }

    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.effective
    }

    #[must_use]
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    #[must_use]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub(crate) fn set_serial(&mut self, serial: u64) {
        self.serial = serial;
    }

    pub(crate) fn set_grouped(&mut self, grouped: bool) {
        self.grouped = grouped;
    }

    fn range_action(&self) -> Option<&RangeAction> {
        match &self.kind {
            ActionKind::DeleteRange { range, .. }
            | ActionKind::IncreaseIndent { range, .. }
            | ActionKind::DecreaseIndent { range, .. }
            | ActionKind::AutoIndent { range, .. } => Some(range),
            _ => None,
        }
    }

    /// The range operated on, for range actions.
    #[must_use]
    pub fn range(&self) -> Option<TextRange> {
        self.range_action().map(|r| r.range)
    }

    /// The selection to activate after execution, for range actions.
    ///
    /// Indent actions keep the selection on the shifted text. A selection
    /// edge at column 0 stays at column 0.
    #[must_use]
    pub fn selection_after_exec(&self) -> Option<TextRange> {
        match &self.kind {
            ActionKind::DeleteRange { range, .. } => Some(TextRange::at(range.range.start)),
            ActionKind::IncreaseIndent { range, changes }
            | ActionKind::DecreaseIndent { range, changes }
            | ActionKind::AutoIndent { range, changes } => Some(TextRange::new(
                shift_point(changes, range.range.start),
                shift_point(changes, range.range.end),
            )),
            _ => None,
        }
    }

    /// Apply the edit. The first call computes and records what changed;
    /// later calls (redo) replay the recording.
    pub(crate) fn exec(&mut self, buffer: &mut TextBuffer) -> TextPoint {
        let replay = self.executed;
        self.executed = true;
        if replay && !self.effective {
            return self.caret_after();
        }

        let point = self.point;
        match &mut self.kind {
            ActionKind::InsertChar { c, dir } => {
                let end = buffer.insert_char(point, *c);
                self.delta = match dir {
                    TextDir::Forward => end - point,
                    TextDir::Backward => TextDelta::ZERO,
                };
            }
            ActionKind::InsertString { text } | ActionKind::InsertText { text } => {
                if text.is_empty() {
                    self.effective = false;
                } else {
                    let end = buffer.insert_text(point, text);
                    self.delta = end - point;
                }
            }
            ActionKind::Delete {
                unit,
                seek,
                count,
                deleted,
            } => {
                if let Some(deleted) = deleted {
                    let end = end_point(deleted.start, &deleted.text);
                    buffer.delete_text(TextRange::new(deleted.start, end));
                    self.delta = deleted.start - point;
                } else {
                    let range = buffer.seek_range(point, *unit, *seek, *count);
                    if range.is_empty() {
                        self.effective = false;
                    } else {
                        let text = buffer.delete_text(range);
                        self.delta = range.start - point;
                        *deleted = Some(DeletedText {
                            start: range.start,
                            text,
                        });
                    }
                }
            }
            ActionKind::DeleteRange { range, text } => {
                if range.range.is_empty() {
                    self.effective = false;
                } else {
                    *text = buffer.delete_text(range.range);
                    self.delta = range.range.start - point;
                }
            }
            ActionKind::IncreaseIndent { range, changes } => {
                if !replay {
                    *changes = increase_changes(buffer, range);
                }
                self.effective = apply_indent(buffer, changes);
                self.delta = shift_point(changes, self.caret_point) - point;
            }
            ActionKind::DecreaseIndent { range, changes } => {
                if !replay {
                    *changes = decrease_changes(buffer, range);
                }
                self.effective = apply_indent(buffer, changes);
                self.delta = shift_point(changes, self.caret_point) - point;
            }
            ActionKind::AutoIndent { range, changes } => {
                if replay {
                    apply_indent(buffer, changes);
                } else {
                    *changes = auto_indent_changes(buffer, range);
                }
                self.effective = !changes.is_empty();
                self.delta = shift_point(changes, self.caret_point) - point;
            }
            ActionKind::SetFileFormat { format, old } => {
                *old = buffer.set_file_format(*format);
                self.effective = *old != *format;
                self.delta = TextDelta::ZERO;
            }
        }
        self.caret_after()
    }

    /// Reverse the edit and return the caret to restore.
    pub(crate) fn undo(&mut self, buffer: &mut TextBuffer) -> TextPoint {
        if !self.effective || !self.executed {
            return self.caret_point;
        }

        let point = self.point;
        match &self.kind {
            ActionKind::InsertChar { c, .. } => {
                let end = if *c == '\n' || *c == '\r' {
                    TextPoint::new(point.line + 1, 0)
                } else {
                    TextPoint::new(point.line, point.col + 1)
                };
                buffer.delete_text(TextRange::new(point, end));
            }
            ActionKind::InsertString { .. } | ActionKind::InsertText { .. } => {
                buffer.delete_text(TextRange::new(point, self.caret_after()));
            }
            ActionKind::Delete { deleted, .. } => {
                if let Some(deleted) = deleted {
                    buffer.insert_text(deleted.start, &deleted.text);
                }
            }
            ActionKind::DeleteRange { range, text } => {
                buffer.insert_text(range.range.start, text);
            }
            ActionKind::IncreaseIndent { changes, .. }
            | ActionKind::DecreaseIndent { changes, .. }
            | ActionKind::AutoIndent { changes, .. } => {
                for change in changes.iter().rev() {
                    buffer.set_line_indent(change.line, &change.old);
                }
            }
            ActionKind::SetFileFormat { old, .. } => {
                buffer.set_file_format(*old);
            }
        }
        self.caret_point
    }

    /// Fold `next` into this action when both delete the same unit in the
    /// same direction and `next` starts where this one left the caret.
    pub(crate) fn merge(&mut self, next: &Self) -> bool {
        if self.grouped || next.grouped || !self.effective || !next.effective {
            return false;
        }
        if next.point != self.caret_after() {
            return false;
        }
        let (
            ActionKind::Delete {
                unit,
                seek,
                count,
                deleted: Some(mine),
            },
            ActionKind::Delete {
                unit: next_unit,
                seek: next_seek,
                count: next_count,
                deleted: Some(theirs),
            },
        ) = (&mut self.kind, &next.kind)
        else {
            return false;
        };
        if unit != next_unit || seek != next_seek {
            return false;
        }

        match seek {
            Seek::Next => mine.text.push_str(&theirs.text),
            Seek::Prev => {
                mine.text.insert_str(0, &theirs.text);
                mine.start = theirs.start;
            }
            _ => return false,
        }
        *count += next_count;
        self.delta = mine.start - self.point;
        self.timestamp = next.timestamp;
        true
    }
}

/// Map `p` through the recorded whitespace change on its line.
fn shift_point(changes: &[IndentChange], p: TextPoint) -> TextPoint {
    if p.col == 0 {
        return p;
    }
    changes
        .iter()
        .find(|c| c.line == p.line)
        .map_or(p, |c| {
            TextPoint::new(p.line, p.col.saturating_add_signed(c.delta()))
        })
}

fn apply_indent(buffer: &mut TextBuffer, changes: &[IndentChange]) -> bool {
    for change in changes {
        buffer.set_line_indent(change.line, &change.new);
    }
    !changes.is_empty()
}

fn increase_changes(buffer: &TextBuffer, range: &RangeAction) -> Vec<IndentChange> {
    let unit = buffer.options().indent_unit();
    range
        .range
        .affected_lines()
        .iter()
        .filter_map(|ln| {
            let line = buffer.line(ln)?;
            if line.is_empty() {
                return None;
            }
            let old = line.indent_str().to_string();
            Some(IndentChange {
                line: ln,
                new: format!("{unit}{old}"),
                old,
            })
        })
        .collect()
}

fn decrease_changes(buffer: &TextBuffer, range: &RangeAction) -> Vec<IndentChange> {
    let options = buffer.options();
    range
        .range
        .affected_lines()
        .iter()
        .filter_map(|ln| {
            let old = buffer.line(ln)?.indent_str();
            let n = shift_removal(old, options.shift_width, options.tab_stop);
            if n == 0 {
                return None;
            }
            Some(IndentChange {
                line: ln,
                old: old.to_string(),
                new: old.chars().skip(n).collect(),
            })
        })
        .collect()
}

/// Re-indent line by line so each line sees its already re-indented
/// predecessor. Applies the changes as it goes.
fn auto_indent_changes(buffer: &mut TextBuffer, range: &RangeAction) -> Vec<IndentChange> {
    let mut changes = Vec::new();
    for ln in range.range.affected_lines().iter() {
        let Some(line) = buffer.line(ln) else {
            continue;
        };
        if line.is_blank(true) {
            continue;
        }
        let old = line.indent_str().to_string();
        let new = indent_string(buffer.guess_indent(ln), buffer.options());
        if new != old {
            buffer.set_line_indent(ln, &new);
            changes.push(IndentChange { line: ln, old, new });
        }
    }
    changes
}
