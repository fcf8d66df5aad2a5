//! The text buffer contract consumed by views.
//!
//! A buffer owns characters, per-character fonts and the undo log. It is shared: any number of
//! views subscribe to it and drain their own queue of [`TextChange`] notifications. Every
//! mutation, whoever performs it, emits exactly one notification per subscriber.

use crate::font::Font;
use crate::index::{CharacterRange, TextCount, TextIndex, TextRange};
use crate::run_array::RunArray;
use crate::search::{Replacement, SearchMatch, SearchPattern};
use crate::undo::UndoMode;

/// Predicate deciding which characters belong to a word.
pub type WordChars = fn(char) -> bool;

/// Text with one font per character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledString {
    /// The characters.
    pub text: String,
    /// One font per character of `text`.
    pub fonts: RunArray<Font>,
}

impl StyledString {
    /// Text drawn entirely in `font`.
    pub fn plain(text: impl Into<String>, font: &Font) -> Self {
        let text = text.into();
        let fonts = RunArray::with_run(font.clone(), text.chars().count());
        Self { text, fonts }
    }

    /// Size in both addressing schemes.
    pub fn count(&self) -> TextCount {
        TextCount::of(&self.text)
    }

    /// Whether there is no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Identifies one observer of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(crate) usize);

/// A localized modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    /// Inserted or restyled span after the edit; zero-width at the edit start for a pure deletion.
    pub range: TextRange,
    /// Size of the text removed at `range.start()` before the insertion; empty for a restyle.
    pub removed: TextCount,
    /// Extra characters that must be redrawn (`nothing` if none).
    pub redraw: CharacterRange,
    /// Whether text was removed.
    pub deletion: bool,
    /// Whether only fonts changed, leaving the characters in place.
    pub restyle: bool,
}

impl TextEdit {
    /// Number of characters inserted at `range.start()`.
    pub fn inserted_chars(&self) -> usize {
        if self.restyle {
            0
        } else {
            self.range.char_range.count()
        }
    }
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextChange {
    /// A localized insert, delete, replace or restyle.
    Edited(TextEdit),
    /// The whole text was replaced.
    Reset,
    /// The default font changed.
    DefaultFontChanged,
}

/// Storage, search and undo services a view relies on.
///
/// All indices are 1-based character/byte indices; see [`TextIndex`].
pub trait TextBuffer {
    /// Number of characters.
    fn char_count(&self) -> usize;

    /// Number of UTF-8 bytes.
    fn byte_count(&self) -> usize;

    /// Whether the buffer holds no text.
    fn is_empty(&self) -> bool {
        self.char_count() == 0
    }

    /// Character at `char_index`, `None` outside `1..=char_count`.
    fn char_at(&self, char_index: usize) -> Option<char>;

    /// Byte index of the character at `char_index` (`char_count + 1` maps to `byte_count + 1`).
    fn char_to_byte(&self, char_index: usize) -> usize;

    /// Character index containing `byte_index`.
    fn byte_to_char(&self, byte_index: usize) -> usize;

    /// Both indices for a character index, clamped to `[1, char_count + 1]`.
    fn index_at(&self, char_index: usize) -> TextIndex {
        let char_index = char_index.clamp(1, self.char_count() + 1);
        TextIndex::new(char_index, self.char_to_byte(char_index))
    }

    /// Text range covering characters `first..=last`.
    fn range_of(&self, first: usize, last: usize) -> TextRange {
        let start = self.index_at(first);
        let end = self.index_at(last + 1);
        TextRange::from_start(
            start,
            TextCount::new(
                end.char_index - start.char_index,
                end.byte_index - start.byte_index,
            ),
        )
    }

    /// Plain copy of `range`.
    fn text(&self, range: TextRange) -> String;

    /// Styled copy of `range`.
    fn styled_text(&self, range: TextRange) -> StyledString;

    /// Every font run; its length equals `char_count`.
    fn fonts(&self) -> &RunArray<Font>;

    /// Font of the character at `char_index`, or the default font outside the text.
    fn font_at(&self, char_index: usize) -> Font {
        match char_index.checked_sub(1).and_then(|i| self.fonts().get(i)) {
            Some(font) => font.clone(),
            None => self.default_font().clone(),
        }
    }

    /// Font used for text with no neighbours.
    fn default_font(&self) -> &Font;

    /// Whether the last character is a line break.
    fn ends_with_newline(&self) -> bool {
        self.char_at(self.char_count()) == Some('\n')
    }

    /// Insert plain text drawn in `font`.
    fn insert(&mut self, at: TextIndex, text: &str, font: &Font, mode: UndoMode) -> TextCount;

    /// Insert styled text.
    fn insert_styled(&mut self, at: TextIndex, text: &StyledString, mode: UndoMode) -> TextCount;

    /// Delete `range`.
    fn delete(&mut self, range: TextRange, mode: UndoMode) -> TextCount;

    /// Replace `range` by `text` as one edit.
    fn replace(&mut self, range: TextRange, text: &StyledString) -> TextCount;

    /// Apply `font` to `range`.
    fn set_font(&mut self, range: TextRange, font: &Font);

    /// Replace all text; clears the undo history.
    fn set_text(&mut self, text: &str);

    /// Change the default font.
    fn set_default_font(&mut self, font: Font);

    /// Undo the newest group; returns the span to select afterwards.
    fn undo(&mut self) -> Option<TextRange>;

    /// Redo the newest undone group; returns the span to select afterwards.
    fn redo(&mut self) -> Option<TextRange>;

    /// Stop coalescing typing into the current undo step.
    fn end_undo_group(&mut self);

    /// Group every following edit into one undo step until [`TextBuffer::end_compound_edit`].
    fn begin_compound_edit(&mut self);

    /// Close a compound edit.
    fn end_compound_edit(&mut self);

    /// First match starting at or after `from`.
    fn find_forward(
        &self,
        from: usize,
        pattern: &SearchPattern,
        entire_word: Option<WordChars>,
    ) -> Option<SearchMatch>;

    /// Last match lying entirely before `before`.
    fn find_backward(
        &self,
        before: usize,
        pattern: &SearchPattern,
        entire_word: Option<WordChars>,
    ) -> Option<SearchMatch>;

    /// Replace `range` by the expansion of `replacement` for `m`, drawn in `font`.
    fn replace_match(
        &mut self,
        range: TextRange,
        m: &SearchMatch,
        replacement: &Replacement,
        font: &Font,
    ) -> TextCount;

    /// Replace every match inside `range` as one edit; returns the new extent of `range`
    /// when anything was replaced.
    fn replace_all(
        &mut self,
        range: TextRange,
        pattern: &SearchPattern,
        replacement: &Replacement,
        entire_word: Option<WordChars>,
    ) -> Option<TextRange>;

    /// Register an observer.
    fn subscribe(&mut self) -> SubscriberId;

    /// Drop an observer and its queue.
    fn unsubscribe(&mut self, id: SubscriberId);

    /// Drain the observer's pending notifications in emission order.
    fn take_changes(&mut self, id: SubscriberId) -> Vec<TextChange>;
}
