//! Undo/redo stacks.

use crate::log::{LogLevel, emit_log};
use crate::text::action::Action;

/// Edit history with bounded depth.
///
/// Each stack entry is one undo unit: either a single action or a group of
/// actions recorded between `begin_group` and `end_group`.
#[derive(Debug)]
pub(crate) struct History {
    undo_stack: Vec<Vec<Action>>,
    redo_stack: Vec<Vec<Action>>,
    current_group: Vec<Action>,
    group_depth: usize,
    /// Maximum number of undo entries to retain. Oldest entries are dropped when exceeded.
    max_depth: usize,
}

impl History {
    pub(crate) fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current_group: Vec::new(),
            group_depth: 0,
            max_depth,
        }
    }

    pub(crate) fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        self.enforce_depth();
    }

    pub(crate) fn in_group(&self) -> bool {
        self.group_depth > 0
    }

    /// Record an executed action, clearing the redo stack.
    ///
    /// Outside a group, a delete that continues the previous delete is merged
    /// into it unless that entry carries the `pinned` serial.
    pub(crate) fn push(&mut self, action: Action, pinned: Option<u64>) {
        self.redo_stack.clear();

        if self.in_group() {
            self.current_group.push(action);
            return;
        }

        if let Some([last]) = self.undo_stack.last_mut().map(Vec::as_mut_slice) {
            if Some(last.serial()) != pinned && last.merge(&action) {
                return;
            }
        }

        self.undo_stack.push(vec![action]);
        self.enforce_depth();
    }

    pub(crate) fn begin_group(&mut self) {
        self.group_depth += 1;
    }

    pub(crate) fn end_group(&mut self) {
        if self.group_depth == 0 {
            return;
        }
        self.group_depth -= 1;
        if self.group_depth == 0 {
            self.commit();
        }
    }

    fn commit(&mut self) {
        self.group_depth = 0;
        if !self.current_group.is_empty() {
            self.undo_stack.push(std::mem::take(&mut self.current_group));
            self.enforce_depth();
        }
    }

    fn enforce_depth(&mut self) {
        if self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..excess);
            emit_log(
                LogLevel::Debug,
                &format!("undo history pruned by {excess} entries"),
            );
        }
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Vec<Action>> {
        self.commit();
        self.undo_stack.pop()
    }

    pub(crate) fn push_undo(&mut self, actions: Vec<Action>) {
        self.undo_stack.push(actions);
        self.enforce_depth();
    }

    pub(crate) fn push_redo(&mut self, actions: Vec<Action>) {
        self.redo_stack.push(actions);
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Vec<Action>> {
        self.redo_stack.pop()
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || !self.current_group.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub(crate) fn undo_len(&self) -> usize {
        self.undo_stack.len() + usize::from(!self.current_group.is_empty())
    }

    pub(crate) fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Serial of the most recent action on the undo side.
    pub(crate) fn top_serial(&self) -> Option<u64> {
        self.current_group
            .last()
            .or_else(|| self.undo_stack.last().and_then(|entry| entry.last()))
            .map(Action::serial)
    }

    pub(crate) fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_group.clear();
        self.group_depth = 0;
    }
}
