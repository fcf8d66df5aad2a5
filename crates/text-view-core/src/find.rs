//! Search and replace around the selection.
//!
//! Matching itself belongs to the buffer; these commands pick the anchor from the caret or
//! selection, wrap around when asked, and select what they find or insert.

use crate::buffer::{TextBuffer, WordChars};
use crate::host::TextViewHost;
use crate::index::TextRange;
use crate::search::{Replacement, SearchMatch, SearchPattern};
use crate::view::{Cursor, TextView};
use tracing::{debug, trace};

/// A match found by [`TextView::search_forward`] or [`TextView::search_backward`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// The match, now selected.
    pub found: SearchMatch,
    /// Whether the search had to restart from the other end of the text.
    pub wrapped: bool,
}

impl<H: TextViewHost> TextView<H> {
    fn word_filter(&self, entire_word: bool) -> Option<WordChars> {
        entire_word.then_some(self.config.is_char_in_word)
    }

    /// Find the next match after the selection (or caret) and select it.
    ///
    /// With `wrap`, a miss restarts from the beginning of the text.
    pub fn search_forward(
        &mut self,
        buf: &mut dyn TextBuffer,
        pattern: &SearchPattern,
        entire_word: bool,
        wrap: bool,
    ) -> Option<SearchResult> {
        self.sync(buf);
        let in_word = self.word_filter(entire_word);
        let anchor = match self.cursor {
            Cursor::Selection(sel) => sel.char_range.after(),
            Cursor::Caret(loc) => loc.index.char_index,
        };

        let (found, wrapped) = match buf.find_forward(anchor, pattern, in_word) {
            Some(found) => (found, false),
            None if wrap && anchor > 1 => {
                let found = buf
                    .find_forward(1, pattern, in_word)
                    .filter(|m| m.range.char_range.first < anchor)?;
                (found, true)
            }
            None => return None,
        };

        trace!(first = found.range.char_range.first, wrapped, "search forward hit");
        self.select(buf, found.range.char_range, true);
        self.scroll_to_selection(&*buf, true);
        Some(SearchResult { found, wrapped })
    }

    /// Find the closest match before the selection (or caret) and select it.
    ///
    /// With `wrap`, a miss restarts from the end of the text.
    pub fn search_backward(
        &mut self,
        buf: &mut dyn TextBuffer,
        pattern: &SearchPattern,
        entire_word: bool,
        wrap: bool,
    ) -> Option<SearchResult> {
        self.sync(buf);
        let in_word = self.word_filter(entire_word);
        let anchor = match self.cursor {
            Cursor::Selection(sel) => sel.char_range.first,
            Cursor::Caret(loc) => loc.index.char_index,
        };
        let end = buf.char_count() + 1;

        let (found, wrapped) = match buf.find_backward(anchor, pattern, in_word) {
            Some(found) => (found, false),
            None if wrap && anchor < end => {
                let found = buf
                    .find_backward(end, pattern, in_word)
                    .filter(|m| m.range.char_range.first >= anchor)?;
                (found, true)
            }
            None => return None,
        };

        trace!(first = found.range.char_range.first, wrapped, "search backward hit");
        self.select(buf, found.range.char_range, true);
        self.scroll_to_selection(&*buf, true);
        Some(SearchResult { found, wrapped })
    }

    /// Whether the selection is exactly a match of `pattern`.
    pub fn selection_matches(
        &self,
        buf: &dyn TextBuffer,
        pattern: &SearchPattern,
        entire_word: bool,
    ) -> Option<SearchMatch> {
        let Cursor::Selection(sel) = self.cursor else {
            return None;
        };
        buf.find_forward(sel.char_range.first, pattern, self.word_filter(entire_word))
            .filter(|m| m.range.char_range == sel.char_range)
    }

    /// Replace the selection with `replacement` expanded for `m`, then select the new text.
    ///
    /// Returns the inserted span, or `None` when there is no selection or the view is read-only.
    pub fn replace_selection(
        &mut self,
        buf: &mut dyn TextBuffer,
        m: &SearchMatch,
        replacement: &Replacement,
    ) -> Option<TextRange> {
        if !self.can_edit() {
            return None;
        }
        self.sync(buf);
        let Cursor::Selection(sel) = self.cursor else {
            return None;
        };
        buf.end_undo_group();
        let first = sel.char_range.first;
        let font = buf.font_at(first);
        self.collapse_selection(&*buf);
        let count = self.edit(buf, |b| b.replace_match(sel, m, replacement, &font));

        if count.char_count == 0 {
            self.set_caret(buf, first);
            return Some(TextRange::from_start(buf.index_at(first), count));
        }
        let inserted = buf.range_of(first, first + count.char_count - 1);
        self.select(buf, inserted.char_range, true);
        Some(inserted)
    }

    /// Replace every match of `pattern`, either inside the selection or in the whole text,
    /// as one undo step. Returns whether anything was replaced.
    ///
    /// A restricted replace selects the affected span afterwards; otherwise the caret goes to
    /// the end of the text.
    pub fn replace_all(
        &mut self,
        buf: &mut dyn TextBuffer,
        pattern: &SearchPattern,
        replacement: &Replacement,
        entire_word: bool,
        restrict_to_selection: bool,
    ) -> bool {
        if !self.can_edit() {
            return false;
        }
        self.sync(buf);
        let range = match self.cursor {
            Cursor::Selection(sel) if restrict_to_selection => sel,
            Cursor::Caret(_) if restrict_to_selection => return false,
            _ => buf.range_of(1, buf.char_count()),
        };
        if range.is_empty() {
            return false;
        }

        let in_word = self.word_filter(entire_word);
        buf.end_undo_group();
        self.collapse_selection(&*buf);
        let replaced = self.edit(buf, |b| b.replace_all(range, pattern, replacement, in_word));
        debug!(restricted = restrict_to_selection, replaced = replaced.is_some(), "replace all");

        match replaced {
            Some(new_range) if restrict_to_selection => {
                if new_range.is_empty() {
                    self.set_caret(buf, new_range.char_range.first);
                } else {
                    self.select(buf, new_range.char_range, true);
                }
                true
            }
            Some(_) => {
                let end = buf.char_count() + 1;
                self.set_caret(buf, end);
                true
            }
            None if restrict_to_selection => {
                self.select(buf, range.char_range, true);
                false
            }
            None => false,
        }
    }
}
