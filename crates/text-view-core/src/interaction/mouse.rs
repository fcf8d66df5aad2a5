//! Pointer gestures.
//!
//! Points are in view coordinates (left margin included). Modifier mapping: shift extends the
//! selection, control makes a double click select a camel-case segment, alt on release turns a
//! local drag-and-drop into a copy.

use super::{DragKind, DragState, KeyModifiers};
use crate::Coordinate;
use crate::buffer::TextBuffer;
use crate::config::EditorKind;
use crate::host::{Rect, ScrollMode, TextViewHost};
use crate::index::CharacterRange;
use crate::layout::{CaretLocation, Point};
use crate::view::{Cursor, TextView};
use crate::words::double_click_selection;
use tracing::trace;

/// Half the size of the outline drawn around the pointer during a local drag-and-drop.
pub const DRAGGED_OUTLINE_RADIUS: Coordinate = 10;

impl<H: TextViewHost> TextView<H> {
    /// Pointer pressed at `pt` for the `click_count`-th time in a row.
    pub fn mouse_down(
        &mut self,
        buf: &mut dyn TextBuffer,
        pt: Point,
        click_count: usize,
        mods: KeyModifiers,
    ) {
        self.drag = DragState::default();
        self.drag_source = false;
        if self.config.kind == EditorKind::StaticText {
            return;
        }
        self.sync(buf);
        buf.end_undo_group();

        let text_pt = self.text_point(pt);
        let loc = self.locate(&*buf, text_pt);
        let c = loc.index.char_index;
        self.drag.start_pt = text_pt;
        self.drag.prev_pt = text_pt;

        let extend = mods.shift;
        let continued = if self.prev_drag == DragKind::None {
            DragKind::Select
        } else {
            self.prev_drag
        };

        match self.cursor {
            Cursor::Selection(sel) if extend => {
                let sel = sel.char_range;
                self.drag.kind = continued;
                self.selection_pivot = if c <= sel.first { sel.after() } else { sel.first };
                self.drag.prev_pt.x -= 1;
                self.mouse_drag(buf, pt);
            }
            Cursor::Selection(sel)
                if self.config.drag_and_drop
                    && click_count == 1
                    && sel.char_range.first <= c
                    && c <= sel.char_range.after() =>
            {
                self.drag.kind = DragKind::DragAndDrop;
                self.drag.drop_loc = None;
            }
            Cursor::Caret(caret) if extend => {
                let pivot = caret.index.char_index;
                self.drag.kind = DragKind::Select;
                self.selection_pivot = pivot;
                if c < pivot {
                    self.select(buf, CharacterRange::new(c, pivot - 1), true);
                } else if c > pivot {
                    self.select(buf, CharacterRange::new(pivot, c - 1), true);
                }
            }
            _ if click_count <= 1 => {
                if self.caret() != Some(loc) {
                    self.place_caret(buf, loc, true);
                }
                self.drag.kind = DragKind::Select;
                self.selection_pivot = c;
            }
            _ if click_count == 2 => {
                let partial = mods.control;
                self.drag.kind = if partial {
                    DragKind::SelectPartialWord
                } else {
                    DragKind::SelectWord
                };
                self.word_pivot =
                    double_click_selection(&*buf, c, partial, false, self.config.is_char_in_word);
                self.select(buf, self.word_pivot, true);
            }
            _ => {
                self.drag.kind = DragKind::SelectLine;
                self.line_pivot = loc.line;
                match self.line_range(&*buf, loc.line) {
                    Some(range) => self.select(buf, range, true),
                    None => self.place_caret(buf, loc, true),
                }
            }
        }
        trace!(kind = ?self.drag.kind, click_count, "pointer down");
    }

    /// Pointer moved to `pt` with the button held.
    pub fn mouse_drag(&mut self, buf: &mut dyn TextBuffer, pt: Point) {
        let text_pt = self.text_point(pt);
        if self.drag.kind == DragKind::None || text_pt == self.drag.prev_pt {
            return;
        }
        self.scroll_for_drag(pt);

        let loc = self.locate(&*buf, text_pt);
        let c = loc.index.char_index;
        let pivot = self.selection_pivot;

        match self.drag.kind {
            DragKind::Select => {
                if c < pivot {
                    self.select(buf, CharacterRange::new(c, pivot - 1), false);
                    self.notify_caret(&*buf, loc, true);
                } else if c == pivot {
                    self.place_caret(buf, loc, true);
                } else {
                    self.select(buf, CharacterRange::new(pivot, c - 1), false);
                    self.notify_caret(&*buf, loc, true);
                }
            }
            DragKind::SelectWord | DragKind::SelectPartialWord => {
                let partial = self.drag.kind == DragKind::SelectPartialWord;
                let range =
                    double_click_selection(&*buf, c, partial, true, self.config.is_char_in_word);
                self.select(buf, CharacterRange::covering(self.word_pivot, range), false);
                self.notify_caret(&*buf, loc, true);
            }
            DragKind::SelectLine => {
                let first = self.layout.line_start(self.line_pivot.min(loc.line));
                let last = self.layout.line_end(&*buf, self.line_pivot.max(loc.line));
                self.select(
                    buf,
                    CharacterRange::new(first.char_index, last.char_index),
                    false,
                );
                self.notify_caret(&*buf, loc, true);
            }
            DragKind::LocalDragAndDrop => {
                self.move_drop_marker(loc, true);
                let prev = self.drag.prev_pt;
                self.refresh_dragged_outline(prev);
                self.refresh_dragged_outline(text_pt);
            }
            DragKind::DragAndDrop if self.moved_past_threshold(text_pt) => {
                self.drag.kind = DragKind::None;
                if self.host.begin_drag_and_drop(pt) {
                    self.drag_source = true;
                    trace!("platform drag-and-drop started");
                } else if self.config.kind == EditorKind::FullEditor {
                    self.drag.kind = DragKind::LocalDragAndDrop;
                    self.move_drop_marker(loc, true);
                    trace!("local drag-and-drop started");
                }
            }
            DragKind::DragAndDrop | DragKind::None => {}
        }

        self.drag.prev_pt = text_pt;
    }

    /// Button released. `mods.alt` copies instead of moving a local drag-and-drop.
    pub fn mouse_up(&mut self, buf: &mut dyn TextBuffer, mods: KeyModifiers) {
        let kind = self.drag.kind;
        match kind {
            DragKind::LocalDragAndDrop if self.drag.drop_loc.is_some() => {
                if let Some(drop) = self.drag.drop_loc.take() {
                    self.drop_selection(buf, drop.index.char_index, mods.alt);
                }
                let prev = self.drag.prev_pt;
                self.refresh_dragged_outline(prev);
            }
            DragKind::LocalDragAndDrop | DragKind::DragAndDrop => {
                let start = self.locate(&*buf, self.drag.start_pt);
                if self.locate(&*buf, self.drag.prev_pt) == start {
                    self.place_caret(buf, start, true);
                }
            }
            _ if kind.is_selection() => {
                if let Cursor::Selection(sel) = self.cursor {
                    self.settle_pivot(&*buf, sel.char_range, kind);
                }
            }
            _ => {}
        }

        self.prev_drag = if kind.is_selection() {
            kind
        } else {
            DragKind::None
        };
        self.drag.kind = DragKind::None;
        self.drag.drop_loc = None;
        trace!(kind = ?kind, "pointer up");
    }

    /// Pick the end shift-extension grows from, and the caret x vertical motion continues from.
    fn settle_pivot(&mut self, buf: &dyn TextBuffer, sel: CharacterRange, kind: DragKind) {
        let word_drag = matches!(kind, DragKind::SelectWord | DragKind::SelectPartialWord);
        if word_drag && self.word_pivot.last == sel.last && self.word_pivot.first != sel.first {
            self.selection_pivot = sel.after();
        } else if kind == DragKind::SelectLine
            && self.layout.line_end(buf, self.line_pivot).char_index == sel.last
            && self.layout.line_start(self.line_pivot).char_index != sel.first
        {
            self.selection_pivot = sel.after();
        }

        if self.selection_pivot == sel.after() {
            let loc = self.layout.caret_location(buf, sel.first);
            self.caret_x = self.char_left(buf, loc);
        } else {
            self.selection_pivot = sel.first;
            let loc = self.layout.caret_location(buf, sel.last);
            self.caret_x = self.char_right(buf, loc);
        }
    }

    fn moved_past_threshold(&self, text_pt: Point) -> bool {
        let start = self.drag.start_pt;
        let threshold = self.config.drag_threshold;
        (text_pt.x - start.x).abs() > threshold || (text_pt.y - start.y).abs() > threshold
    }

    /// Show the drop marker at `loc`, or hide it while `loc` is over the dragged text.
    pub(crate) fn move_drop_marker(&mut self, loc: CaretLocation, on_self: bool) {
        if let Some(old) = self.drag.drop_loc {
            self.refresh_caret(old);
        }
        let c = loc.index.char_index;
        let outside = match self.cursor {
            Cursor::Selection(sel) => c <= sel.char_range.first || sel.char_range.after() <= c,
            Cursor::Caret(_) => true,
        };
        self.drag.drop_loc = (!on_self || outside).then_some(loc);
        if let Some(new) = self.drag.drop_loc {
            self.refresh_caret(new);
        }
    }

    fn refresh_dragged_outline(&mut self, text_pt: Point) {
        if self.printing {
            return;
        }
        let x = text_pt.x + self.config.left_margin_width;
        self.host.refresh_rect(Rect::new(
            text_pt.y - DRAGGED_OUTLINE_RADIUS,
            x - DRAGGED_OUTLINE_RADIUS,
            text_pt.y + DRAGGED_OUTLINE_RADIUS,
            x + DRAGGED_OUTLINE_RADIUS,
        ));
    }

    pub(crate) fn scroll_for_drag(&mut self, pt: Point) -> bool {
        self.host
            .scroll_to_rect(Rect::at(pt, 1, 1), ScrollMode::IfNeeded)
    }

    /// Where a drop would land, if anywhere.
    pub fn drop_location(&self) -> Option<CaretLocation> {
        self.drag.drop_loc
    }

    /// Whether this view started a platform drag-and-drop that has not finished.
    pub fn is_drag_source(&self) -> bool {
        self.drag_source
    }
}
