//! Per-view configuration.

use crate::Coordinate;
use crate::buffer::WordChars;

/// Default tab pitch in pixels.
pub const DEFAULT_TAB_PITCH: Coordinate = 36;

/// Characters between tab stops when counting columns.
pub const DEFAULT_TAB_CHAR_COUNT: usize = 8;

/// Distance the pointer must travel before a press turns into a drag-and-drop.
pub const DEFAULT_DRAG_THRESHOLD: Coordinate = 3;

/// How visual lines are broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Visual lines equal logical lines; the view is as wide as its longest line.
    LineBreaksOnly,
    /// Greedy word wrap at the configured line width.
    #[default]
    Word,
}

/// What the user may do with the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorKind {
    /// Read-only, no selection.
    StaticText,
    /// Read-only, selectable and copyable.
    SelectableText,
    /// Fully editable.
    #[default]
    FullEditor,
}

impl EditorKind {
    /// Whether the text may be modified through the view.
    pub fn is_editable(self) -> bool {
        self == Self::FullEditor
    }

    /// Whether a selection may exist.
    pub fn is_selectable(self) -> bool {
        self != Self::StaticText
    }
}

/// Default in-word character test: alphanumerics, apostrophe and underscore.
pub fn default_is_char_in_word(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '_'
}

/// View options.
#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    /// Editing capability.
    pub kind: EditorKind,
    /// Line breaking mode.
    pub wrap_mode: WrapMode,
    /// Width available for text in [`WrapMode::Word`].
    pub line_width: Coordinate,
    /// Blank margin left of the text.
    pub left_margin_width: Coordinate,
    /// Tab stop spacing.
    pub tab_pitch: Coordinate,
    /// Columns between tab stops in caret column reports.
    pub tab_char_count: usize,
    /// Copy to the clipboard whenever a selection is made.
    pub copy_when_select: bool,
    /// Keep pasted styles and do not reset the insertion font on paste.
    pub paste_styled_text: bool,
    /// Allow dragging the selection.
    pub drag_and_drop: bool,
    /// Report line and column on every caret move instead of only line changes.
    pub broadcast_caret_location: bool,
    /// Beginning-of-line motion stops at the first non-blank character before the line start.
    pub move_to_front_of_text: bool,
    /// Pointer travel that starts a drag-and-drop.
    pub drag_threshold: Coordinate,
    /// Word membership test for word motion, double-click and entire-word search.
    pub is_char_in_word: WordChars,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            kind: EditorKind::FullEditor,
            wrap_mode: WrapMode::Word,
            line_width: 640,
            left_margin_width: 0,
            tab_pitch: DEFAULT_TAB_PITCH,
            tab_char_count: DEFAULT_TAB_CHAR_COUNT,
            copy_when_select: false,
            paste_styled_text: false,
            drag_and_drop: true,
            broadcast_caret_location: false,
            move_to_front_of_text: false,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            is_char_in_word: default_is_char_in_word,
        }
    }
}

/// Tab width rule: distance from `x` to the next tab stop strictly after it.
///
/// A tab starting exactly on a stop advances a full pitch.
pub fn default_tab_width(x: Coordinate, pitch: Coordinate) -> Coordinate {
    let pitch = pitch.max(1);
    (x.div_euclid(pitch) + 1) * pitch - x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_width_rounds_to_next_stop() {
        assert_eq!(default_tab_width(0, 32), 32);
        assert_eq!(default_tab_width(5, 32), 27);
        assert_eq!(default_tab_width(31, 32), 1);
        assert_eq!(default_tab_width(32, 32), 32);
        assert_eq!(default_tab_width(7, 0), 1);
    }

    #[test]
    fn word_chars() {
        assert!(default_is_char_in_word('a'));
        assert!(default_is_char_in_word('\''));
        assert!(default_is_char_in_word('_'));
        assert!(!default_is_char_in_word('-'));
        assert!(!default_is_char_in_word(' '));
    }
}
