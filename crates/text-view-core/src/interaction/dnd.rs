//! Drag-and-drop: platform sessions and dropping the selection within the view.
//!
//! A platform session runs `dnd_enter`, any number of `dnd_here`, then `dnd_drop` or
//! `dnd_leave`. The view that started the drag hears `dnd_finished` once the session ends.

use super::DragKind;
use crate::buffer::TextBuffer;
use crate::error::CollaboratorError;
use crate::host::TextViewHost;
use crate::index::{CharacterRange, TextRange};
use crate::interaction::KeyModifiers;
use crate::layout::Point;
use crate::undo::UndoMode;
use crate::view::{Cursor, TextView};
use tracing::{trace, warn};

impl<H: TextViewHost> TextView<H> {
    /// A platform drag entered the view.
    pub fn dnd_enter(&mut self) {
        self.drag.kind = DragKind::DragAndDrop;
        self.drag.drop_loc = None;
        if let Cursor::Caret(loc) = self.cursor {
            self.refresh_caret(loc);
        }
        trace!("drag entered");
    }

    /// A platform drag moved to `pt`. `drop_on_self` is set when this view is the drag source.
    pub fn dnd_here(&mut self, buf: &dyn TextBuffer, pt: Point, drop_on_self: bool) {
        let text_pt = self.text_point(pt);
        if self.drag.kind != DragKind::DragAndDrop || text_pt == self.drag.prev_pt {
            return;
        }
        self.scroll_for_drag(pt);
        let loc = self.locate(buf, text_pt);
        self.move_drop_marker(loc, drop_on_self);
        self.drag.prev_pt = text_pt;
    }

    /// A platform drag left the view without dropping.
    pub fn dnd_leave(&mut self) {
        if self.drag.kind != DragKind::DragAndDrop {
            return;
        }
        if let Some(old) = self.drag.drop_loc.take() {
            self.refresh_caret(old);
        }
        self.drag.kind = DragKind::None;
        trace!("drag left");
    }

    /// A platform drag dropped at `pt`.
    ///
    /// Dropping on the source view moves (or with `copy`, copies) the selection. Dropping data
    /// from elsewhere pastes the host's payload at the drop point and selects it.
    pub fn dnd_drop(
        &mut self,
        buf: &mut dyn TextBuffer,
        pt: Point,
        drop_on_self: bool,
        copy: bool,
    ) -> Result<Option<TextRange>, CollaboratorError> {
        if self.drag.kind != DragKind::DragAndDrop {
            return Ok(None);
        }
        self.dnd_here(&*buf, pt, drop_on_self);
        if let Some(loc) = self.drag.drop_loc {
            self.refresh_caret(loc);
        }

        if drop_on_self {
            self.drag.kind = DragKind::LocalDragAndDrop;
            let mods = KeyModifiers {
                alt: copy,
                ..KeyModifiers::NONE
            };
            self.mouse_up(buf, mods);
            return Ok(self.selection());
        }

        let drop = self.drag.drop_loc.take();
        self.drag.kind = DragKind::None;
        let Some(drop) = drop else {
            return Ok(None);
        };
        self.place_caret(buf, drop, true);

        let payload = self
            .host
            .drop_payload()
            .inspect_err(|err| warn!(%err, "drop payload unavailable"))?;
        let Some(data) = payload else {
            return Ok(None);
        };
        let inserted = self.paste_styled(buf, &data);
        if let Some(range) = inserted
            && !range.is_empty()
        {
            self.select(buf, range.char_range, true);
        }
        trace!(?inserted, "foreign drop");
        Ok(inserted)
    }

    /// The platform drag this view started is over. A move to another place deletes the
    /// selection here.
    pub fn dnd_finished(&mut self, buf: &mut dyn TextBuffer, moved_elsewhere: bool) {
        if !self.drag_source {
            return;
        }
        self.drag_source = false;
        if moved_elsewhere {
            self.delete_selection(buf);
        }
    }

    /// Move or copy the selection so that it starts at `at`, as one undo step.
    ///
    /// Moving onto either edge of the selection changes nothing.
    pub(crate) fn drop_selection(&mut self, buf: &mut dyn TextBuffer, at: usize, copy: bool) {
        let Cursor::Selection(sel) = self.cursor else {
            return;
        };
        self.drag_source = false;
        if !self.config.kind.is_editable() {
            return;
        }
        let r = sel.char_range;
        if !copy && (at == r.first || at == r.after()) {
            return;
        }

        let len = r.count();
        let data = buf.styled_text(sel);
        let mut target = at;
        buf.end_undo_group();
        buf.begin_compound_edit();
        if copy {
            self.refresh_range(r);
            self.cursor = Cursor::Caret(self.layout.caret_location(&*buf, at));
        } else {
            if target > r.first {
                target -= len;
            }
            self.collapse_selection(&*buf);
            self.edit(buf, |b| b.delete(sel, UndoMode::Standalone));
        }
        let index = buf.index_at(target);
        self.edit(buf, |b| b.insert_styled(index, &data, UndoMode::Standalone));
        buf.end_compound_edit();

        trace!(from = r.first, to = target, copy, "selection dropped");
        self.select(buf, CharacterRange::with_count(target, len), true);
        self.scroll_to_selection(&*buf, false);
    }
}
