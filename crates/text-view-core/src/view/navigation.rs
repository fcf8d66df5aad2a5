//! Line, column and boundary navigation.

use super::{Cursor, TextView};
use crate::buffer::TextBuffer;
use crate::config::EditorKind;
use crate::host::TextViewHost;
use crate::index::CharacterRange;
use crate::layout::{CaretLocation, Point};
use crate::words;

impl<H: TextViewHost> TextView<H> {
    /// Characters `first..=last` of `line`, or `None` for the empty line after a trailing break.
    pub fn line_range(&self, buf: &dyn TextBuffer, line: usize) -> Option<CharacterRange> {
        let first = self.layout.line_start(line).char_index;
        let last = self.layout.line_end(buf, line).char_index;
        (last >= first).then(|| CharacterRange::new(first, last))
    }

    /// Move to the start of visual `line` (clamped). Selectable read-only views select the line.
    pub fn go_to_line(&mut self, buf: &mut dyn TextBuffer, line: usize) {
        let line = line.clamp(1, self.layout.line_count());
        if self.config.kind == EditorKind::SelectableText
            && let Some(range) = self.line_range(&*buf, line)
        {
            self.select(buf, range, true);
            self.scroll_to_selection(&*buf, false);
            return;
        }
        let loc = CaretLocation::new(self.layout.line_start(line), line);
        self.place_caret(buf, loc, true);
    }

    /// Select visual `line`.
    pub fn select_line(&mut self, buf: &mut dyn TextBuffer, line: usize) {
        self.go_to_line(buf, line);
        if !self.has_selection() {
            let line = line.clamp(1, self.layout.line_count());
            if let Some(range) = self.line_range(&*buf, line) {
                self.select(buf, range, true);
            }
        }
    }

    /// Move to `column` (1-based, tabs counted up to the next tab column) of visual `line`.
    ///
    /// The caret stops before the line's final character when the column lies beyond it.
    pub fn go_to_column(&mut self, buf: &mut dyn TextBuffer, line: usize, column: usize) {
        let line = line.clamp(1, self.layout.line_count());
        let tab = self.config.tab_char_count.max(1);
        let end = self.layout.line_end(&*buf, line).char_index;
        let mut i = self.layout.line_start(line).char_index;
        let mut col = 1;
        while col < column && i < end {
            col += if buf.char_at(i) == Some('\t') {
                tab - (col - 1) % tab
            } else {
                1
            };
            i += 1;
        }
        let loc = self.layout.caret_location(&*buf, i);
        self.place_caret(buf, loc, true);
    }

    /// Move to the start of the current visual line.
    ///
    /// With [`crate::ViewConfig::move_to_front_of_text`] the first stop is the first non-blank
    /// character, and only a caret already at or before it goes to the line start.
    pub fn go_to_beginning_of_line(&mut self, buf: &mut dyn TextBuffer) {
        let mut loc = match self.cursor {
            Cursor::Caret(loc) => loc,
            Cursor::Selection(range) => self.layout.caret_location(&*buf, range.char_range.first),
        };
        let len = buf.char_count();

        if loc.index.char_index == len + 1 && buf.ends_with_newline() {
            // already on the empty last line
        } else if self.config.move_to_front_of_text && len > 0 {
            let first = self.layout.line_start(loc.line).char_index;
            let mut last = self.layout.line_end(&*buf, loc.line).char_index;
            if buf.char_at(last) == Some('\n') {
                last -= 1;
            }
            let first_text = (first..=last)
                .find(|&i| buf.char_at(i).is_some_and(|c| c != ' ' && c != '\t'))
                .unwrap_or(last + 1);
            let target = if loc.index.char_index <= first_text {
                first
            } else {
                first_text
            };
            loc = self.layout.caret_location(&*buf, target);
        } else {
            loc = CaretLocation::new(self.layout.line_start(loc.line), loc.line);
        }
        self.place_caret(buf, loc, true);
    }

    /// Move to the end of the current visual line, before its trailing break or wrap space.
    pub fn go_to_end_of_line(&mut self, buf: &mut dyn TextBuffer) {
        let len = buf.char_count();
        let target = match self.cursor {
            Cursor::Selection(range) => {
                let line = self.layout.line_for_char(range.char_range.last);
                let end = self.layout.line_end(&*buf, line).char_index;
                if buf.char_at(end).is_some_and(char::is_whitespace) {
                    end
                } else {
                    end + 1
                }
            }
            Cursor::Caret(loc) if loc.index.char_index == len + 1 && buf.ends_with_newline() => {
                loc.index.char_index
            }
            Cursor::Caret(_) if len == 0 => return,
            Cursor::Caret(loc) => {
                let end = self.layout.line_end(&*buf, loc.line).char_index;
                match buf.char_at(end) {
                    Some(c) if c.is_whitespace() && (end < len || c == '\n') => end,
                    _ => end + 1,
                }
            }
        };
        let loc = self.layout.caret_location(&*buf, target);
        self.place_caret(buf, loc, true);
    }

    /// Caret `delta` visual lines away from `from`, aiming for the remembered caret x.
    ///
    /// Moving above the first line lands at the start of the text; below the last, at its end.
    pub(crate) fn caret_lines_away(
        &self,
        buf: &dyn TextBuffer,
        from: CaretLocation,
        delta: isize,
    ) -> CaretLocation {
        let target = from.line as isize + delta;
        if target < 1 {
            return self.layout.caret_location(buf, 1);
        }
        if target as usize > self.layout.line_count() {
            return self.layout.caret_location(buf, buf.char_count() + 1);
        }
        let line = target as usize;
        self.locate(buf, Point::new(self.caret_x, self.layout.line_top(line)))
    }

    /// First character of the word at or before `char_index`.
    pub fn word_start(&self, buf: &dyn TextBuffer, char_index: usize) -> usize {
        words::word_start(buf, char_index, self.config.is_char_in_word)
    }

    /// Last character of the word at or after `char_index`.
    pub fn word_end(&self, buf: &dyn TextBuffer, char_index: usize) -> usize {
        words::word_end(buf, char_index, self.config.is_char_in_word)
    }

    /// First character of the camel-case or digit segment at or before `char_index`.
    pub fn partial_word_start(&self, buf: &dyn TextBuffer, char_index: usize) -> usize {
        words::partial_word_start(buf, char_index)
    }

    /// Last character of the camel-case or digit segment at or after `char_index`.
    pub fn partial_word_end(&self, buf: &dyn TextBuffer, char_index: usize) -> usize {
        words::partial_word_end(buf, char_index)
    }

    /// First character of the paragraph containing `char_index`.
    pub fn paragraph_start(&self, buf: &dyn TextBuffer, char_index: usize) -> usize {
        words::paragraph_start(buf, char_index)
    }

    /// Line break ending the paragraph containing `char_index`.
    pub fn paragraph_end(&self, buf: &dyn TextBuffer, char_index: usize) -> usize {
        words::paragraph_end(buf, char_index)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{EditorKind, ViewConfig};
    use crate::font::{Font, MonospaceMetrics};
    use crate::host::HeadlessHost;
    use crate::index::CharacterRange;
    use crate::styled_text::StyledText;
    use crate::view::TextView;

    fn setup(text: &str, config: ViewConfig) -> (StyledText, TextView<HeadlessHost>) {
        let mut buf = StyledText::new(text, Font::default());
        let view = TextView::new(&mut buf, HeadlessHost::new(), MonospaceMetrics::new(10), config);
        (buf, view)
    }

    fn caret(view: &TextView<HeadlessHost>) -> Option<usize> {
        view.caret().map(|c| c.index.char_index)
    }

    #[test]
    fn go_to_line_clamps() {
        let (mut buf, mut view) = setup("one\ntwo\nthree", ViewConfig::default());
        view.go_to_line(&mut buf, 2);
        assert_eq!(caret(&view), Some(5));
        view.go_to_line(&mut buf, 99);
        assert_eq!(caret(&view), Some(9));
        view.go_to_line(&mut buf, 0);
        assert_eq!(caret(&view), Some(1));
    }

    #[test]
    fn go_to_line_past_trailing_break_lands_at_end() {
        let (mut buf, mut view) = setup("one\n", ViewConfig::default());
        view.go_to_line(&mut buf, 5);
        assert_eq!(caret(&view), Some(5));
        assert_eq!(view.caret().map(|c| c.line), Some(2));
    }

    #[test]
    fn selectable_views_select_the_line() {
        let config = ViewConfig {
            kind: EditorKind::SelectableText,
            ..ViewConfig::default()
        };
        let (mut buf, mut view) = setup("one\ntwo\n", config);
        view.go_to_line(&mut buf, 2);
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(5, 8)));
    }

    #[test]
    fn select_line_in_editor() {
        let (mut buf, mut view) = setup("one\ntwo", ViewConfig::default());
        view.select_line(&mut buf, 2);
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(5, 7)));
    }

    #[test]
    fn go_to_column_counts_tabs() {
        let (mut buf, mut view) = setup("x\n\tab\n", ViewConfig::default());
        view.go_to_column(&mut buf, 2, 9);
        assert_eq!(caret(&view), Some(4));
        view.go_to_column(&mut buf, 2, 10);
        assert_eq!(caret(&view), Some(5));
        view.go_to_column(&mut buf, 2, 40);
        assert_eq!(caret(&view), Some(6));
    }

    #[test]
    fn end_of_line_stops_before_break() {
        let (mut buf, mut view) = setup("one\ntwo", ViewConfig::default());
        view.set_caret(&mut buf, 2);
        view.go_to_end_of_line(&mut buf);
        assert_eq!(caret(&view), Some(4));
        view.set_caret(&mut buf, 5);
        view.go_to_end_of_line(&mut buf);
        assert_eq!(caret(&view), Some(8));
        view.go_to_beginning_of_line(&mut buf);
        assert_eq!(caret(&view), Some(5));
    }

    #[test]
    fn end_of_wrapped_line_stops_before_space() {
        let config = ViewConfig {
            line_width: 60,
            ..ViewConfig::default()
        };
        let (mut buf, mut view) = setup("hello world", config);
        view.set_caret(&mut buf, 2);
        view.go_to_end_of_line(&mut buf);
        assert_eq!(caret(&view), Some(6));
    }

    #[test]
    fn beginning_of_line_visits_front_of_text() {
        let config = ViewConfig {
            move_to_front_of_text: true,
            ..ViewConfig::default()
        };
        let (mut buf, mut view) = setup("    indented", config);
        view.set_caret(&mut buf, 9);
        view.go_to_beginning_of_line(&mut buf);
        assert_eq!(caret(&view), Some(5));
        view.go_to_beginning_of_line(&mut buf);
        assert_eq!(caret(&view), Some(1));
    }
}
