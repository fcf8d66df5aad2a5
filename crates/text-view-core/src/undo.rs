//! Linear undo/redo history with grouped steps.
//!
//! Steps carry a group id; undo and redo always move a whole group. Typing steps coalesce into
//! the open group until it is closed (caret motion, a non-typing edit, or an explicit close).
//! A compound scope forces every step pushed inside it into one group.

#[derive(Debug, Clone)]
struct UndoStep<E> {
    group_id: usize,
    edit: E,
}

/// How a pushed step joins the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoMode {
    /// Starts a new group and closes the typing group.
    Standalone,
    /// Joins the open typing group, or opens one.
    Typing,
}

#[derive(Debug)]
pub(crate) struct UndoLog<E> {
    undo_stack: Vec<UndoStep<E>>,
    redo_stack: Vec<UndoStep<E>>,
    max_undo: usize,
    next_group_id: usize,
    open_group_id: Option<usize>,
    compound_depth: usize,
    compound_group_id: Option<usize>,
}

impl<E: Clone> UndoLog<E> {
    pub(crate) fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
            next_group_id: 0,
            open_group_id: None,
            compound_depth: 0,
            compound_group_id: None,
        }
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_group_id = None;
        self.compound_group_id = None;
        self.compound_depth = 0;
    }

    pub(crate) fn end_group(&mut self) {
        self.open_group_id = None;
    }

    pub(crate) fn begin_compound(&mut self) {
        if self.compound_depth == 0 {
            self.compound_group_id = None;
        }
        self.compound_depth += 1;
    }

    pub(crate) fn end_compound(&mut self) {
        debug_assert!(self.compound_depth > 0);
        self.compound_depth = self.compound_depth.saturating_sub(1);
        if self.compound_depth == 0 {
            self.compound_group_id = None;
            self.open_group_id = None;
        }
    }

    pub(crate) fn push(&mut self, edit: E, mode: UndoMode) {
        self.redo_stack.clear();

        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
        }

        let group_id = if self.compound_depth > 0 {
            match self.compound_group_id {
                Some(id) => id,
                None => {
                    let id = self.allocate_group();
                    self.compound_group_id = Some(id);
                    id
                }
            }
        } else {
            match (mode, self.open_group_id) {
                (UndoMode::Typing, Some(id)) => id,
                (UndoMode::Typing, None) => {
                    let id = self.allocate_group();
                    self.open_group_id = Some(id);
                    id
                }
                (UndoMode::Standalone, _) => {
                    self.open_group_id = None;
                    self.allocate_group()
                }
            }
        };

        self.undo_stack.push(UndoStep { group_id, edit });
    }

    /// Pop the newest group for undoing; edits are returned newest first.
    pub(crate) fn take_undo_group(&mut self) -> Option<Vec<E>> {
        self.open_group_id = None;
        let steps = Self::pop_group(&mut self.undo_stack)?;
        let edits = steps.iter().map(|s| s.edit.clone()).collect();
        self.redo_stack.extend(steps);
        Some(edits)
    }

    /// Pop the newest undone group for redoing; edits are returned oldest first.
    pub(crate) fn take_redo_group(&mut self) -> Option<Vec<E>> {
        self.open_group_id = None;
        let steps = Self::pop_group(&mut self.redo_stack)?;
        let edits = steps.iter().map(|s| s.edit.clone()).collect();
        self.undo_stack.extend(steps);
        Some(edits)
    }

    fn allocate_group(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id = self.next_group_id.wrapping_add(1);
        id
    }

    fn pop_group(stack: &mut Vec<UndoStep<E>>) -> Option<Vec<UndoStep<E>>> {
        let last_group_id = stack.last().map(|s| s.group_id)?;
        let mut steps = Vec::new();
        while let Some(step) = stack.pop_if(|s| s.group_id == last_group_id) {
            steps.push(step);
        }
        Some(steps)
    }
}
