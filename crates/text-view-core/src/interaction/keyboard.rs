//! Key handling: caret motion, shift-selection and editing keys.

use super::{DragKind, Key, KeyModifiers};
use crate::buffer::TextBuffer;
use crate::config::EditorKind;
use crate::host::TextViewHost;
use crate::index::CharacterRange;
use crate::layout::{CaretLocation, Point};
use crate::view::{Cursor, TextView};
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

/// Characters examined around the caret when looking for a grapheme boundary.
const GRAPHEME_WINDOW: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Char,
    PartialWord,
    Word,
    Line,
}

impl Motion {
    fn from_modifiers(mods: KeyModifiers) -> Self {
        if mods.meta {
            Self::Line
        } else if mods.control {
            Self::Word
        } else if mods.alt {
            Self::PartialWord
        } else {
            Self::Char
        }
    }
}

/// Start of the grapheme cluster ending just before `char_index`.
fn prev_grapheme_start(buf: &dyn TextBuffer, char_index: usize) -> usize {
    if char_index <= 1 {
        return 1;
    }
    let from = char_index.saturating_sub(GRAPHEME_WINDOW).max(1);
    let window: String = (from..char_index).filter_map(|i| buf.char_at(i)).collect();
    let width = window
        .graphemes(true)
        .next_back()
        .map_or(1, |g| g.chars().count());
    char_index - width
}

/// Position just after the grapheme cluster starting at `char_index`.
fn next_grapheme_end(buf: &dyn TextBuffer, char_index: usize) -> usize {
    let len = buf.char_count();
    if char_index > len {
        return len + 1;
    }
    let to = (char_index + GRAPHEME_WINDOW).min(len + 1);
    let window: String = (char_index..to).filter_map(|i| buf.char_at(i)).collect();
    let width = window.graphemes(true).next().map_or(1, |g| g.chars().count());
    char_index + width
}

impl<H: TextViewHost> TextView<H> {
    /// Handle a key press. Returns whether the view used the key.
    ///
    /// Shift with a motion key extends the selection from its pivot. Selectable read-only views
    /// only handle motion keys.
    pub fn handle_key(&mut self, buf: &mut dyn TextBuffer, key: Key, mods: KeyModifiers) -> bool {
        if self.config.kind == EditorKind::StaticText {
            return false;
        }
        if key == Key::Escape && self.drag.kind == DragKind::LocalDragAndDrop {
            self.drag.kind = DragKind::None;
            self.drag.drop_loc = None;
            self.refresh_all();
            trace!("local drag-and-drop cancelled");
            return true;
        }
        if self.is_dragging() {
            return true;
        }
        self.sync(buf);

        let extend = mods.shift && key.is_navigation();
        if extend {
            self.prepare_extension(buf, key);
        } else if self.config.kind == EditorKind::SelectableText && !key.is_navigation() {
            return false;
        }

        let motion = Motion::from_modifiers(mods);
        let processed = match key {
            Key::Left => {
                self.key_left(buf, motion);
                true
            }
            Key::Right => {
                self.key_right(buf, motion);
                true
            }
            Key::Up => {
                self.key_up(buf, motion);
                true
            }
            Key::Down => {
                self.key_down(buf, motion);
                true
            }
            Key::Home => {
                if mods.meta || mods.control {
                    self.set_caret(buf, 1);
                } else {
                    self.go_to_beginning_of_line(buf);
                }
                true
            }
            Key::End => {
                if mods.meta || mods.control {
                    let end = buf.char_count() + 1;
                    self.set_caret(buf, end);
                } else {
                    self.go_to_end_of_line(buf);
                }
                true
            }
            Key::PageUp => {
                self.page(buf, -1);
                true
            }
            Key::PageDown => {
                self.page(buf, 1);
                true
            }
            Key::Backspace => {
                self.backspace(buf, mods.control);
                true
            }
            Key::Delete => {
                self.forward_delete(buf, mods.control);
                true
            }
            Key::Return => {
                self.type_text(buf, "\n");
                true
            }
            Key::Tab => {
                self.type_text(buf, "\t");
                true
            }
            Key::Char(c) if !c.is_control() => {
                let mut tmp = [0; 4];
                self.type_text(buf, c.encode_utf8(&mut tmp));
                true
            }
            Key::Char(_) | Key::Escape => false,
        };

        if extend && let Some(loc) = self.caret() {
            self.finish_extension(buf, loc);
        }
        processed
    }

    /// Turn the selection back into a caret at its moving end so a motion can carry it further.
    fn prepare_extension(&mut self, buf: &mut dyn TextBuffer, key: Key) {
        let saved_x = self.caret_x;
        let mut restore_x = true;
        match self.cursor {
            Cursor::Selection(sel) if self.selection_pivot == sel.char_range.after() => {
                self.set_caret(buf, sel.char_range.first);
            }
            Cursor::Selection(sel) if self.selection_pivot == sel.char_range.first => {
                self.set_caret(buf, sel.char_range.after());
            }
            Cursor::Selection(sel) => {
                self.selection_pivot = sel.char_range.first;
                restore_x = false;
                self.set_caret(buf, sel.char_range.after());
            }
            Cursor::Caret(loc) => self.selection_pivot = loc.index.char_index,
        }
        if restore_x && matches!(key, Key::Up | Key::Down | Key::PageUp | Key::PageDown) {
            self.caret_x = saved_x;
        }
    }

    fn finish_extension(&mut self, buf: &mut dyn TextBuffer, loc: CaretLocation) {
        let c = loc.index.char_index;
        let pivot = self.selection_pivot;
        let saved_x = self.caret_x;
        if c < pivot {
            self.select(buf, CharacterRange::new(c, pivot - 1), false);
        } else if c > pivot {
            self.select(buf, CharacterRange::new(pivot, c - 1), false);
        }
        self.caret_x = saved_x;
        self.prev_drag = DragKind::Select;
        self.notify_caret(&*buf, loc, true);
    }

    fn key_left(&mut self, buf: &mut dyn TextBuffer, motion: Motion) {
        let sel = self.selection().map(|r| r.char_range);
        let c = self.insertion_index().char_index;
        let target = match (motion, sel) {
            (Motion::Line, _) => return self.go_to_beginning_of_line(buf),
            (Motion::Word, Some(sel)) => self.word_start(&*buf, sel.first),
            (Motion::Word, None) => self.word_start(&*buf, c - 1),
            (Motion::PartialWord, Some(sel)) => self.partial_word_start(&*buf, sel.first),
            (Motion::PartialWord, None) => self.partial_word_start(&*buf, c - 1),
            (Motion::Char, Some(sel)) => sel.first,
            (Motion::Char, None) => prev_grapheme_start(&*buf, c),
        };
        self.set_caret(buf, target);
    }

    fn key_right(&mut self, buf: &mut dyn TextBuffer, motion: Motion) {
        let sel = self.selection().map(|r| r.char_range);
        let c = self.insertion_index().char_index;
        let target = match (motion, sel) {
            (Motion::Line, _) => return self.go_to_end_of_line(buf),
            (Motion::Word, Some(sel)) => self.word_end(&*buf, sel.last) + 1,
            (Motion::Word, None) => self.word_end(&*buf, c) + 1,
            (Motion::PartialWord, Some(sel)) => self.partial_word_end(&*buf, sel.last) + 1,
            (Motion::PartialWord, None) => self.partial_word_end(&*buf, c) + 1,
            (Motion::Char, Some(sel)) => sel.after(),
            (Motion::Char, None) => next_grapheme_end(&*buf, c),
        };
        self.set_caret(buf, target);
    }

    fn key_up(&mut self, buf: &mut dyn TextBuffer, motion: Motion) {
        match (motion, self.cursor) {
            (Motion::Line, _) => self.set_caret(buf, 1),
            (Motion::Word, Cursor::Selection(sel)) => {
                let target = self.paragraph_start(&*buf, sel.char_range.first.saturating_sub(1));
                self.set_caret(buf, target);
            }
            (Motion::Word, Cursor::Caret(loc)) => {
                let target = self.paragraph_start(&*buf, loc.index.char_index - 1);
                self.set_caret(buf, target);
            }
            (_, Cursor::Selection(sel)) => self.set_caret(buf, sel.char_range.first),
            (_, Cursor::Caret(loc)) if loc.line > 1 => self.move_caret_vert(buf, loc, -1),
            (_, Cursor::Caret(_)) => self.set_caret(buf, 1),
        }
    }

    fn key_down(&mut self, buf: &mut dyn TextBuffer, motion: Motion) {
        let end = buf.char_count() + 1;
        match (motion, self.cursor) {
            (Motion::Line, _) => self.set_caret(buf, end),
            (Motion::Word, Cursor::Selection(sel)) => {
                let target = self.paragraph_end(&*buf, sel.char_range.after()) + 1;
                self.set_caret(buf, target);
            }
            (Motion::Word, Cursor::Caret(loc)) => {
                let target = self.paragraph_end(&*buf, loc.index.char_index) + 1;
                self.set_caret(buf, target);
            }
            (_, Cursor::Selection(sel)) => self.set_caret(buf, sel.char_range.after()),
            (_, Cursor::Caret(loc)) if loc.line < self.layout.line_count() => {
                self.move_caret_vert(buf, loc, 1)
            }
            (_, Cursor::Caret(_)) => self.set_caret(buf, end),
        }
    }

    /// Move the caret `delta` lines, keeping the remembered x.
    fn move_caret_vert(&mut self, buf: &mut dyn TextBuffer, from: CaretLocation, delta: isize) {
        let saved_x = self.caret_x;
        let loc = self.caret_lines_away(&*buf, from, delta);
        self.place_caret(buf, loc, true);
        self.caret_x = saved_x;
    }

    /// Move the caret one visible height up (`direction < 0`) or down.
    fn page(&mut self, buf: &mut dyn TextBuffer, direction: i32) {
        let len = buf.char_count();
        let Some(height) = self.host.visible_height() else {
            let target = if direction < 0 { 1 } else { len + 1 };
            self.set_caret(buf, target);
            return;
        };
        let from = match self.cursor {
            Cursor::Caret(loc) => loc,
            Cursor::Selection(sel) if direction < 0 => {
                self.layout.caret_location(&*buf, sel.char_range.first)
            }
            Cursor::Selection(sel) => self.layout.caret_location(&*buf, sel.char_range.after()),
        };
        let y = self.layout.line_top(from.line) + direction * height.max(1);
        if y < 0 {
            self.set_caret(buf, 1);
        } else if y >= self.layout.height() {
            self.set_caret(buf, len + 1);
        } else {
            let saved_x = self.caret_x;
            let loc = self.locate(&*buf, Point::new(saved_x, y));
            self.place_caret(buf, loc, true);
            self.caret_x = saved_x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::font::{Font, MonospaceMetrics};
    use crate::host::HeadlessHost;
    use crate::styled_text::StyledText;

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

    fn caret(view: &TextView<HeadlessHost>) -> Option<usize> {
        view.caret().map(|c| c.index.char_index)
    }

    #[test]
    fn grapheme_steps() {
        let buf = StyledText::new("ae\u{301}x", Font::default());
        assert_eq!(next_grapheme_end(&buf, 2), 4);
        assert_eq!(prev_grapheme_start(&buf, 4), 2);
        assert_eq!(prev_grapheme_start(&buf, 1), 1);
        assert_eq!(next_grapheme_end(&buf, 5), 5);
    }

    #[test]
    fn arrows_move_by_character() {
        let (mut buf, mut view) = setup("abc");
        assert!(view.handle_key(&mut buf, Key::Right, KeyModifiers::NONE));
        assert_eq!(caret(&view), Some(2));
        view.handle_key(&mut buf, Key::Left, KeyModifiers::NONE);
        view.handle_key(&mut buf, Key::Left, KeyModifiers::NONE);
        assert_eq!(caret(&view), Some(1));
    }

    #[test]
    fn word_motion() {
        let (mut buf, mut view) = setup("one two three");
        view.handle_key(&mut buf, Key::Right, KeyModifiers::CONTROL);
        assert_eq!(caret(&view), Some(4));
        view.handle_key(&mut buf, Key::Right, KeyModifiers::CONTROL);
        assert_eq!(caret(&view), Some(8));
        view.handle_key(&mut buf, Key::Left, KeyModifiers::CONTROL);
        assert_eq!(caret(&view), Some(5));
    }

    #[test]
    fn vertical_motion_keeps_x() {
        let (mut buf, mut view) = setup("abcdef\nab\nabcdef");
        view.set_caret(&mut buf, 6);
        view.handle_key(&mut buf, Key::Down, KeyModifiers::NONE);
        assert_eq!(caret(&view), Some(10));
        view.handle_key(&mut buf, Key::Down, KeyModifiers::NONE);
        assert_eq!(caret(&view), Some(16));
        view.handle_key(&mut buf, Key::Up, KeyModifiers::NONE);
        view.handle_key(&mut buf, Key::Up, KeyModifiers::NONE);
        assert_eq!(caret(&view), Some(6));
    }

    #[test]
    fn shift_extends_and_shrinks() {
        let (mut buf, mut view) = setup("hello world");
        view.set_caret(&mut buf, 3);
        view.handle_key(&mut buf, Key::Right, KeyModifiers::SHIFT);
        view.handle_key(&mut buf, Key::Right, KeyModifiers::SHIFT);
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(3, 4)));
        view.handle_key(&mut buf, Key::Left, KeyModifiers::SHIFT);
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(3, 3)));
        view.handle_key(&mut buf, Key::Left, KeyModifiers::SHIFT);
        assert_eq!(caret(&view), Some(3));
        view.handle_key(&mut buf, Key::Left, KeyModifiers::SHIFT);
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(2, 2)));
    }

    #[test]
    fn typing_keys() {
        let (mut buf, mut view) = setup("");
        view.handle_key(&mut buf, Key::Char('h'), KeyModifiers::NONE);
        view.handle_key(&mut buf, Key::Char('i'), KeyModifiers::NONE);
        view.handle_key(&mut buf, Key::Return, KeyModifiers::NONE);
        view.handle_key(&mut buf, Key::Tab, KeyModifiers::NONE);
        assert_eq!(buf.to_string(), "hi\n\t");
        view.handle_key(&mut buf, Key::Backspace, KeyModifiers::NONE);
        assert_eq!(buf.to_string(), "hi\n");
        assert!(!view.handle_key(&mut buf, Key::Char('\u{7}'), KeyModifiers::NONE));
    }

    #[test]
    fn selectable_text_ignores_editing_keys() {
        let (mut buf, mut view) = setup("abc");
        view.set_kind(&mut buf, EditorKind::SelectableText);
        assert!(!view.handle_key(&mut buf, Key::Char('x'), KeyModifiers::NONE));
        assert!(view.handle_key(&mut buf, Key::Right, KeyModifiers::NONE));
        assert_eq!(buf.to_string(), "abc");
    }

    #[test]
    fn page_keys_without_visible_height_jump_to_ends() {
        let (mut buf, mut view) = setup("one\ntwo\nthree");
        view.handle_key(&mut buf, Key::PageDown, KeyModifiers::NONE);
        assert_eq!(caret(&view), Some(14));
        view.handle_key(&mut buf, Key::PageUp, KeyModifiers::NONE);
        assert_eq!(caret(&view), Some(1));
    }

    #[test]
    fn page_keys_move_by_visible_height() {
        let text = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let (mut buf, mut view) = setup(&text);
        view.host_mut().page_height = Some(45);
        view.handle_key(&mut buf, Key::PageDown, KeyModifiers::NONE);
        assert_eq!(view.caret().map(|c| c.line), Some(4));
        view.handle_key(&mut buf, Key::PageUp, KeyModifiers::NONE);
        assert_eq!(view.caret().map(|c| c.line), Some(1));
    }

    #[test]
    fn escape_cancels_local_drag() {
        let (mut buf, mut view) = setup("abc def");
        view.set_selection(&mut buf, 1, 3);
        view.mouse_down(&mut buf, Point::new(15, 5), 1, KeyModifiers::NONE);
        view.mouse_drag(&mut buf, Point::new(60, 5));
        assert!(view.handle_key(&mut buf, Key::Escape, KeyModifiers::NONE));
        assert!(!view.is_dragging());
        view.mouse_up(&mut buf, KeyModifiers::NONE);
        assert_eq!(buf.to_string(), "abc def");
    }
}
