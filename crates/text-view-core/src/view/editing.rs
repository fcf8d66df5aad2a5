//! Editing commands: typing, deletion, clipboard and undo.
//!
//! Every command goes through the buffer's mutation API and lets the resulting change
//! notification drive relayout, exactly like an edit made by someone else.

use super::{Cursor, TextView};
use crate::buffer::{StyledString, TextBuffer};
use crate::error::CollaboratorError;
use crate::host::TextViewHost;
use crate::index::TextRange;
use crate::undo::UndoMode;
use tracing::warn;

impl<H: TextViewHost> TextView<H> {
    /// Run `f` against the buffer and absorb its notifications as the view's own edit.
    pub(crate) fn edit<R>(
        &mut self,
        buf: &mut dyn TextBuffer,
        f: impl FnOnce(&mut dyn TextBuffer) -> R,
    ) -> R {
        self.sync(buf);
        let out = f(&mut *buf);
        let changes = buf.take_changes(self.subscriber);
        self.absorb(&*buf, &changes, false);
        out
    }

    pub(crate) fn can_edit(&self) -> bool {
        self.config.kind.is_editable() && !self.drag_source
    }

    /// Drop the selection in favour of a caret at its start, without notifying anyone.
    pub(crate) fn collapse_selection(&mut self, buf: &dyn TextBuffer) -> Option<TextRange> {
        let Cursor::Selection(range) = self.cursor else {
            return None;
        };
        self.refresh_range(range.char_range);
        self.cursor = Cursor::Caret(self.layout.caret_location(buf, range.char_range.first));
        Some(range)
    }

    /// Insert `text` at the caret, replacing the selection. Consecutive calls form one undo step.
    pub fn type_text(&mut self, buf: &mut dyn TextBuffer, text: &str) {
        if !self.can_edit() || text.is_empty() {
            return;
        }
        self.sync(buf);
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        if let Cursor::Selection(range) = self.cursor {
            self.insertion_font = buf.font_at(range.char_range.first);
            self.collapse_selection(&*buf);
            self.edit(buf, |b| b.delete(range, UndoMode::Typing));
        }

        let at = self.insertion_index();
        let font = self.insertion_font.clone();
        let count = self.edit(buf, |b| b.insert(at, &text, &font, UndoMode::Typing));
        let loc = self
            .layout
            .caret_location(&*buf, at.char_index + count.char_count);
        self.place_caret(buf, loc, false);
    }

    /// Delete the selection, or the character (or word) before the caret.
    pub fn backspace(&mut self, buf: &mut dyn TextBuffer, word: bool) {
        if !self.can_edit() {
            return;
        }
        self.sync(buf);
        let Cursor::Caret(loc) = self.cursor else {
            self.delete_selection(buf);
            return;
        };
        let c = loc.index.char_index;
        if c <= 1 {
            return;
        }
        let first = if word { self.word_start(&*buf, c - 1) } else { c - 1 };
        let range = buf.range_of(first, c - 1);
        let deleted_font = buf.font_at(first);

        self.edit(buf, |b| b.delete(range, UndoMode::Typing));
        let loc = self.layout.caret_location(&*buf, first);
        self.place_caret(buf, loc, false);
        if self.config.paste_styled_text {
            self.insertion_font = deleted_font;
        }
    }

    /// Delete the selection, or the character (or word) after the caret.
    pub fn forward_delete(&mut self, buf: &mut dyn TextBuffer, word: bool) {
        if !self.can_edit() {
            return;
        }
        self.sync(buf);
        let Cursor::Caret(loc) = self.cursor else {
            self.delete_selection(buf);
            return;
        };
        let c = loc.index.char_index;
        if c > buf.char_count() {
            return;
        }
        let last = if word { self.word_end(&*buf, c) } else { c };
        let range = buf.range_of(c, last);

        self.edit(buf, |b| b.delete(range, UndoMode::Typing));
        let loc = self.layout.caret_location(&*buf, c);
        self.place_caret(buf, loc, false);
    }

    /// Delete the selected text. Text typed right after joins the same undo step.
    pub fn delete_selection(&mut self, buf: &mut dyn TextBuffer) {
        if !self.can_edit() {
            return;
        }
        self.sync(buf);
        if !self.has_selection() {
            return;
        }
        buf.end_undo_group();
        let Some(range) = self.collapse_selection(&*buf) else {
            return;
        };
        self.edit(buf, |b| b.delete(range, UndoMode::Typing));
        let loc = self.layout.caret_location(&*buf, range.char_range.first);
        self.place_caret(buf, loc, false);
    }

    /// Insert styled text at the caret, replacing the selection, as one undo step.
    ///
    /// Styles are kept only when [`crate::ViewConfig::paste_styled_text`] is set; otherwise the
    /// text takes the insertion font. Returns the inserted span.
    pub fn paste_styled(&mut self, buf: &mut dyn TextBuffer, data: &StyledString) -> Option<TextRange> {
        let keep_styles = self.config.paste_styled_text;
        self.paste_inner(buf, data, keep_styles)
    }

    /// Insert plain text in the insertion font at the caret, replacing the selection.
    pub fn paste_text(&mut self, buf: &mut dyn TextBuffer, text: &str) -> Option<TextRange> {
        let data = StyledString::plain(text, &self.insertion_font);
        self.paste_inner(buf, &data, false)
    }

    fn paste_inner(
        &mut self,
        buf: &mut dyn TextBuffer,
        data: &StyledString,
        keep_styles: bool,
    ) -> Option<TextRange> {
        if !self.can_edit() || data.is_empty() {
            return None;
        }
        self.sync(buf);
        buf.end_undo_group();
        buf.begin_compound_edit();

        if let Some(range) = self.collapse_selection(&*buf) {
            self.edit(buf, |b| b.delete(range, UndoMode::Standalone));
        }
        let at = self.insertion_index();
        let count = if keep_styles {
            self.edit(buf, |b| b.insert_styled(at, data, UndoMode::Standalone))
        } else {
            let font = self.insertion_font.clone();
            self.edit(buf, |b| b.insert(at, &data.text, &font, UndoMode::Standalone))
        };
        buf.end_compound_edit();

        let loc = self
            .layout
            .caret_location(&*buf, at.char_index + count.char_count);
        self.place_caret(buf, loc, true);
        Some(TextRange::from_start(at, count))
    }

    /// Put the selection on the host clipboard. Returns whether anything was copied.
    pub fn copy(&mut self, buf: &dyn TextBuffer) -> Result<bool, CollaboratorError> {
        let Cursor::Selection(range) = self.cursor else {
            return Ok(false);
        };
        if !self.config.kind.is_selectable() {
            return Ok(false);
        }
        let data = buf.styled_text(range);
        self.host
            .write_clipboard(&data)
            .inspect_err(|err| warn!(%err, "clipboard write failed"))?;
        Ok(true)
    }

    /// Copy the selection to the clipboard and delete it.
    pub fn cut(&mut self, buf: &mut dyn TextBuffer) -> Result<bool, CollaboratorError> {
        if !self.can_edit() {
            return Ok(false);
        }
        let copied = self.copy(&*buf)?;
        if copied {
            self.delete_selection(buf);
        }
        Ok(copied)
    }

    /// Replace the selection by the clipboard contents. Returns whether anything was pasted.
    pub fn paste(&mut self, buf: &mut dyn TextBuffer) -> Result<bool, CollaboratorError> {
        if !self.can_edit() {
            return Ok(false);
        }
        let clipboard = self
            .host
            .read_clipboard()
            .inspect_err(|err| warn!(%err, "clipboard read failed"))?;
        match clipboard {
            Some(data) if !data.is_empty() => Ok(self.paste_styled(buf, &data).is_some()),
            _ => Ok(false),
        }
    }

    /// Replace the whole text. The caret goes to the start and the undo history is cleared.
    pub fn set_text(&mut self, buf: &mut dyn TextBuffer, text: &str) {
        self.edit(buf, |b| b.set_text(text));
        self.set_caret(buf, 1);
    }

    /// Undo the newest step and select what it restored.
    pub fn undo(&mut self, buf: &mut dyn TextBuffer) -> bool {
        if !self.can_edit() {
            return false;
        }
        buf.end_undo_group();
        match self.edit(buf, |b| b.undo()) {
            Some(range) => {
                self.show_restored(buf, range);
                true
            }
            None => false,
        }
    }

    /// Redo the newest undone step and select what it restored.
    pub fn redo(&mut self, buf: &mut dyn TextBuffer) -> bool {
        if !self.can_edit() {
            return false;
        }
        match self.edit(buf, |b| b.redo()) {
            Some(range) => {
                self.show_restored(buf, range);
                true
            }
            None => false,
        }
    }

    fn show_restored(&mut self, buf: &mut dyn TextBuffer, range: TextRange) {
        if range.is_empty() {
            self.set_caret(buf, range.char_range.first);
        } else {
            self.set_selection(buf, range.char_range.first, range.char_range.last);
        }
        self.scroll_to_selection(&*buf, false);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{EditorKind, ViewConfig};
    use crate::font::{Font, MonospaceMetrics};
    use crate::host::HeadlessHost;
    use crate::index::CharacterRange;
    use crate::styled_text::StyledText;
    use crate::buffer::{StyledString, TextBuffer};
    use crate::view::TextView;

    fn setup(text: &str) -> (StyledText, TextView<HeadlessHost>) {
        let mut buf = StyledText::new(text, Font::default());
        let view = TextView::new(
            &mut buf,
            HeadlessHost::new(),
            MonospaceMetrics::new(10),
            ViewConfig::default(),
        );
        (buf, view)
    }

    #[test]
    fn typing_replaces_selection_in_one_undo_step() {
        let (mut buf, mut view) = setup("hello world");
        view.set_selection(&mut buf, 7, 11);
        view.type_text(&mut buf, "t");
        view.type_text(&mut buf, "here");
        assert_eq!(buf.to_string(), "hello there");
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(12));

        assert!(view.undo(&mut buf));
        assert_eq!(buf.to_string(), "hello world");
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(7, 11)));
    }

    #[test]
    fn caret_motion_closes_typing_group() {
        let (mut buf, mut view) = setup("");
        view.type_text(&mut buf, "ab");
        view.set_caret(&mut buf, 3);
        view.type_text(&mut buf, "cd");
        assert!(view.undo(&mut buf));
        assert_eq!(buf.to_string(), "ab");
        assert!(view.redo(&mut buf));
        assert_eq!(buf.to_string(), "abcd");
    }

    #[test]
    fn carriage_returns_become_line_breaks() {
        let (mut buf, mut view) = setup("");
        view.type_text(&mut buf, "a\r\nb\rc");
        assert_eq!(buf.to_string(), "a\nb\nc");
        assert_eq!(view.layout().line_count(), 3);
    }

    #[test]
    fn backspace_and_forward_delete() {
        let (mut buf, mut view) = setup("one two three");
        view.set_caret(&mut buf, 8);
        view.backspace(&mut buf, false);
        assert_eq!(buf.to_string(), "one tw three");
        view.backspace(&mut buf, true);
        assert_eq!(buf.to_string(), "one  three");
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(5));
        view.forward_delete(&mut buf, true);
        assert_eq!(buf.to_string(), "one ");
        view.set_caret(&mut buf, 1);
        view.backspace(&mut buf, false);
        assert_eq!(buf.to_string(), "one ");
    }

    #[test]
    fn cut_and_paste_through_host_clipboard() {
        let (mut buf, mut view) = setup("alpha beta");
        view.set_selection(&mut buf, 1, 6);
        assert!(view.cut(&mut buf).expect("clipboard"));
        assert_eq!(buf.to_string(), "beta");
        view.set_caret(&mut buf, 5);
        view.type_text(&mut buf, " ");
        assert!(view.paste(&mut buf).expect("clipboard"));
        assert_eq!(buf.to_string(), "beta alpha ");
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(12));
    }

    #[test]
    fn paste_is_one_undo_step() {
        let (mut buf, mut view) = setup("abc");
        view.set_selection(&mut buf, 2, 2);
        let inserted = view.paste_text(&mut buf, "XYZ");
        assert_eq!(inserted.map(|r| r.char_range), Some(CharacterRange::new(2, 4)));
        assert_eq!(buf.to_string(), "aXYZc");
        assert!(view.undo(&mut buf));
        assert_eq!(buf.to_string(), "abc");
    }

    #[test]
    fn styled_paste_keeps_fonts_only_when_enabled() {
        let bold = Font::default().with_size(20);
        let data = StyledString::plain("X", &bold);

        let (mut buf, mut view) = setup("ab");
        view.set_caret(&mut buf, 2);
        view.paste_styled(&mut buf, &data);
        assert_eq!(buf.font_at(2), Font::default());

        view.set_paste_styled_text(true);
        view.set_caret(&mut buf, 2);
        view.paste_styled(&mut buf, &data);
        assert_eq!(buf.font_at(2), bold);
    }

    #[test]
    fn read_only_views_refuse_edits() {
        let (mut buf, mut view) = setup("fixed");
        view.set_kind(&mut buf, EditorKind::SelectableText);
        view.type_text(&mut buf, "x");
        view.set_selection(&mut buf, 1, 5);
        assert!(!view.cut(&mut buf).expect("clipboard"));
        assert!(view.copy(&buf).expect("clipboard"));
        assert_eq!(buf.to_string(), "fixed");
        assert_eq!(view.host().clipboard.as_ref().map(|c| c.text.as_str()), Some("fixed"));
    }

    #[test]
    fn copy_when_select_fills_clipboard() {
        let (mut buf, mut view) = setup("copy me");
        view.set_copy_when_select(true);
        view.set_selection(&mut buf, 6, 7);
        assert_eq!(view.host().clipboard.as_ref().map(|c| c.text.as_str()), Some("me"));
    }
}
