//! In-memory styled text buffer.
//!
//! Characters live in a [`ropey::Rope`], fonts in a [`RunArray`] aligned with the characters.
//! Every mutation goes through one splice primitive that records undo history and queues a
//! [`TextChange`] for each subscriber.

use crate::buffer::{StyledString, SubscriberId, TextBuffer, TextChange, TextEdit, WordChars};
use crate::font::Font;
use crate::index::{CharacterRange, TextCount, TextIndex, TextRange};
use crate::run_array::RunArray;
use crate::search::{FontPredicate, Replacement, SearchMatch, SearchPattern};
use crate::undo::{UndoLog, UndoMode};
use regex::Regex;
use ropey::Rope;
use std::cell::OnceCell;
use std::fmt;

/// Default number of undo steps kept.
pub const DEFAULT_UNDO_DEPTH: usize = 100;

#[derive(Debug, Clone)]
struct EditRecord {
    start: TextIndex,
    removed: StyledString,
    inserted: StyledString,
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriberId,
    queue: Vec<TextChange>,
}

/// A styled, undoable text buffer.
///
/// # Example
///
/// ```rust
/// use text_view_core::{StyledText, TextBuffer, Font, UndoMode};
///
/// let mut text = StyledText::new("hello", Font::default());
/// let end = text.index_at(6);
/// text.insert(end, " world", &Font::default(), UndoMode::Standalone);
/// assert_eq!(text.to_string(), "hello world");
/// text.undo();
/// assert_eq!(text.to_string(), "hello");
/// ```
pub struct StyledText {
    rope: Rope,
    fonts: RunArray<Font>,
    default_font: Font,
    undo: UndoLog<EditRecord>,
    subscribers: Vec<Subscriber>,
    next_subscriber: usize,
    contents: OnceCell<String>,
}

impl StyledText {
    /// Create a buffer drawn entirely in `default_font`.
    pub fn new(text: &str, default_font: Font) -> Self {
        Self::with_undo_depth(text, default_font, DEFAULT_UNDO_DEPTH)
    }

    /// Create a buffer keeping at most `depth` undo steps.
    pub fn with_undo_depth(text: &str, default_font: Font, depth: usize) -> Self {
        let rope = Rope::from_str(text);
        let fonts = RunArray::with_run(default_font.clone(), rope.len_chars());
        Self {
            rope,
            fonts,
            default_font,
            undo: UndoLog::new(depth),
            subscribers: Vec::new(),
            next_subscriber: 0,
            contents: OnceCell::new(),
        }
    }

    /// Whether there is anything to undo.
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Whether there is anything to redo.
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    fn contents(&self) -> &str {
        self.contents.get_or_init(|| self.rope.to_string())
    }

    fn notify(&mut self, change: TextChange) {
        for subscriber in &mut self.subscribers {
            subscriber.queue.push(change);
        }
    }

    fn clamp_index(&self, at: TextIndex) -> TextIndex {
        debug_assert!(at.char_index >= 1 && at.char_index <= self.char_count() + 1);
        self.index_at(at.char_index)
    }

    /// Remove `remove` at `start`, then insert `insert` there. Returns what was removed.
    fn splice(&mut self, start: TextIndex, remove: TextCount, insert: &StyledString) -> StyledString {
        let c0 = start.char_index - 1;
        let b0 = self.rope.char_to_byte(c0);
        let removed = StyledString {
            text: self.rope.slice(c0..c0 + remove.char_count).to_string(),
            fonts: self.fonts.slice(c0, remove.char_count),
        };
        if remove.char_count > 0 {
            self.rope.remove(c0..c0 + remove.char_count);
            self.fonts.remove_range(c0, remove.char_count);
        }
        if !insert.is_empty() {
            self.rope.insert(c0, &insert.text);
            self.fonts.insert_array(c0, &insert.fonts);
        }
        debug_assert_eq!(self.fonts.len(), self.rope.len_chars());
        if let Some(contents) = self.contents.get_mut() {
            contents.replace_range(b0..b0 + removed.text.len(), &insert.text);
        }
        removed
    }

    fn apply(
        &mut self,
        start: TextIndex,
        remove: TextCount,
        insert: &StyledString,
        mode: Option<UndoMode>,
        redraw: CharacterRange,
    ) -> TextRange {
        let removed = self.splice(start, remove, insert);
        let range = TextRange::from_start(start, insert.count());
        if let Some(mode) = mode {
            self.undo.push(
                EditRecord {
                    start,
                    removed,
                    inserted: insert.clone(),
                },
                mode,
            );
        }
        self.notify(TextChange::Edited(TextEdit {
            range,
            removed: remove,
            redraw,
            deletion: remove.char_count > 0,
            restyle: false,
        }));
        range
    }

    fn word_bounded(&self, haystack: &str, start: usize, end: usize, chars: WordChars) -> bool {
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(chars) && !after.is_some_and(chars)
    }

    fn regex_match_at(&self, re: &Regex, byte_start: usize, limit: usize) -> Option<SearchMatch> {
        let haystack = &self.contents()[..limit];
        let caps = re.captures_at(haystack, byte_start)?;
        let m = caps.get(0)?;
        let start = TextIndex::new(self.rope.byte_to_char(m.start()) + 1, m.start() + 1);
        let count = TextCount::new(m.as_str().chars().count(), m.len());
        Some(SearchMatch::from_captures(
            TextRange::from_start(start, count),
            re,
            &caps,
        ))
    }

    fn find_regex_forward(
        &self,
        re: &Regex,
        from: usize,
        entire_word: Option<WordChars>,
    ) -> Option<SearchMatch> {
        let haystack = self.contents();
        let mut byte = self.char_to_byte(from) - 1;
        while byte <= haystack.len() {
            let m = re.find_at(haystack, byte)?;
            let accepted = !m.is_empty()
                && entire_word.is_none_or(|w| self.word_bounded(haystack, m.start(), m.end(), w));
            if accepted {
                return self.regex_match_at(re, m.start(), haystack.len());
            }
            byte = next_boundary(haystack, m.start());
        }
        None
    }

    fn find_regex_backward(
        &self,
        re: &Regex,
        before: usize,
        entire_word: Option<WordChars>,
    ) -> Option<SearchMatch> {
        let haystack = self.contents();
        let limit = self.char_to_byte(before) - 1;
        let last = re
            .find_iter(&haystack[..limit])
            .filter(|m| !m.is_empty())
            .filter(|m| {
                entire_word.is_none_or(|w| self.word_bounded(haystack, m.start(), m.end(), w))
            })
            .last()?;
        self.regex_match_at(re, last.start(), limit)
    }

    /// Maximal 0-based `(first, len)` spans whose fonts satisfy `pred`.
    fn font_spans(&self, pred: &FontPredicate) -> Vec<(usize, usize)> {
        let mut spans: Vec<(usize, usize)> = Vec::new();
        for (first, len, font) in self.fonts.runs_from(0) {
            if !pred(font) {
                continue;
            }
            match spans.last_mut() {
                Some((f, l)) if *f + *l == first => *l += len,
                _ => spans.push((first, len)),
            }
        }
        spans
    }

    fn font_match(&self, first: usize, len: usize) -> SearchMatch {
        let range = self.range_of(first + 1, first + len);
        SearchMatch::plain(range, self.text(range))
    }

    fn font_span_ok(&self, first: usize, len: usize, entire_word: Option<WordChars>) -> bool {
        entire_word.is_none_or(|w| {
            let before = self.char_at(first);
            let after = self.char_at(first + len + 1);
            !before.is_some_and(w) && !after.is_some_and(w)
        })
    }
}

fn next_boundary(text: &str, byte: usize) -> usize {
    text[byte..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| byte + c.len_utf8())
}

impl fmt::Display for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl fmt::Debug for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyledText")
            .field("text", &self.to_string())
            .field("font_runs", &self.fonts.run_count())
            .finish()
    }
}

impl TextBuffer for StyledText {
    fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn byte_count(&self) -> usize {
        self.rope.len_bytes()
    }

    fn char_at(&self, char_index: usize) -> Option<char> {
        if char_index == 0 || char_index > self.rope.len_chars() {
            None
        } else {
            Some(self.rope.char(char_index - 1))
        }
    }

    fn char_to_byte(&self, char_index: usize) -> usize {
        let c = char_index.clamp(1, self.rope.len_chars() + 1) - 1;
        self.rope.char_to_byte(c) + 1
    }

    fn byte_to_char(&self, byte_index: usize) -> usize {
        let b = byte_index.clamp(1, self.rope.len_bytes() + 1) - 1;
        self.rope.byte_to_char(b) + 1
    }

    fn text(&self, range: TextRange) -> String {
        if range.is_empty() {
            return String::new();
        }
        let c0 = range.char_range.first - 1;
        self.rope.slice(c0..range.char_range.last).to_string()
    }

    fn styled_text(&self, range: TextRange) -> StyledString {
        StyledString {
            text: self.text(range),
            fonts: if range.is_empty() {
                RunArray::new()
            } else {
                self.fonts
                    .slice(range.char_range.first - 1, range.char_range.count())
            },
        }
    }

    fn fonts(&self) -> &RunArray<Font> {
        &self.fonts
    }

    fn default_font(&self) -> &Font {
        &self.default_font
    }

    fn insert(&mut self, at: TextIndex, text: &str, font: &Font, mode: UndoMode) -> TextCount {
        self.insert_styled(at, &StyledString::plain(text, font), mode)
    }

    fn insert_styled(&mut self, at: TextIndex, text: &StyledString, mode: UndoMode) -> TextCount {
        if text.is_empty() {
            return TextCount::default();
        }
        let at = self.clamp_index(at);
        self.apply(at, TextCount::default(), text, Some(mode), CharacterRange::nothing());
        text.count()
    }

    fn delete(&mut self, range: TextRange, mode: UndoMode) -> TextCount {
        if range.is_empty() {
            return TextCount::default();
        }
        let count = range.count();
        self.apply(
            range.start(),
            count,
            &StyledString::default(),
            Some(mode),
            CharacterRange::nothing(),
        );
        count
    }

    fn replace(&mut self, range: TextRange, text: &StyledString) -> TextCount {
        let start = self.clamp_index(range.start());
        self.apply(
            start,
            range.count(),
            text,
            Some(UndoMode::Standalone),
            CharacterRange::nothing(),
        );
        text.count()
    }

    fn set_font(&mut self, range: TextRange, font: &Font) {
        if range.is_empty() {
            return;
        }
        let restyled = StyledString {
            text: self.text(range),
            fonts: RunArray::with_run(font.clone(), range.char_range.count()),
        };
        let removed = self.styled_text(range);
        if removed == restyled {
            return;
        }
        self.fonts
            .set_run(range.char_range.first - 1, range.char_range.count(), font.clone());
        self.undo.push(
            EditRecord {
                start: range.start(),
                removed,
                inserted: restyled,
            },
            UndoMode::Standalone,
        );
        self.notify(TextChange::Edited(TextEdit {
            range,
            removed: TextCount::default(),
            redraw: range.char_range,
            deletion: false,
            restyle: true,
        }));
    }

    fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.fonts = RunArray::with_run(self.default_font.clone(), self.rope.len_chars());
        self.contents = OnceCell::new();
        self.undo.clear();
        self.notify(TextChange::Reset);
    }

    fn set_default_font(&mut self, font: Font) {
        if font == self.default_font {
            return;
        }
        let old = std::mem::replace(&mut self.default_font, font.clone());
        let mut fonts = RunArray::new();
        for run in self.fonts.runs() {
            let value = if run.value == old {
                font.clone()
            } else {
                run.value.clone()
            };
            fonts.push_run(value, run.len);
        }
        self.fonts = fonts;
        self.notify(TextChange::DefaultFontChanged);
    }

    fn undo(&mut self) -> Option<TextRange> {
        let edits = self.undo.take_undo_group()?;
        let mut restored = None;
        for edit in edits {
            restored = Some(self.apply(
                edit.start,
                edit.inserted.count(),
                &edit.removed,
                None,
                CharacterRange::nothing(),
            ));
        }
        restored
    }

    fn redo(&mut self) -> Option<TextRange> {
        let edits = self.undo.take_redo_group()?;
        let mut restored = None;
        for edit in edits {
            restored = Some(self.apply(
                edit.start,
                edit.removed.count(),
                &edit.inserted,
                None,
                CharacterRange::nothing(),
            ));
        }
        restored
    }

    fn end_undo_group(&mut self) {
        self.undo.end_group();
    }

    fn begin_compound_edit(&mut self) {
        self.undo.begin_compound();
    }

    fn end_compound_edit(&mut self) {
        self.undo.end_compound();
    }

    fn find_forward(
        &self,
        from: usize,
        pattern: &SearchPattern,
        entire_word: Option<WordChars>,
    ) -> Option<SearchMatch> {
        let from = from.clamp(1, self.char_count() + 1);
        match pattern {
            SearchPattern::Regex(re) => self.find_regex_forward(re, from, entire_word),
            SearchPattern::Font(pred) => self
                .font_spans(pred)
                .into_iter()
                .filter(|(first, len)| first + len >= from)
                .map(|(first, len)| {
                    let start = first.max(from - 1);
                    (start, first + len - start)
                })
                .find(|&(first, len)| self.font_span_ok(first, len, entire_word))
                .map(|(first, len)| self.font_match(first, len)),
        }
    }

    fn find_backward(
        &self,
        before: usize,
        pattern: &SearchPattern,
        entire_word: Option<WordChars>,
    ) -> Option<SearchMatch> {
        let before = before.clamp(1, self.char_count() + 1);
        match pattern {
            SearchPattern::Regex(re) => self.find_regex_backward(re, before, entire_word),
            SearchPattern::Font(pred) => self
                .font_spans(pred)
                .into_iter()
                .filter(|(first, _)| first + 1 < before)
                .map(|(first, len)| (first, len.min(before - 1 - first)))
                .filter(|&(first, len)| self.font_span_ok(first, len, entire_word))
                .last()
                .map(|(first, len)| self.font_match(first, len)),
        }
    }

    fn replace_match(
        &mut self,
        range: TextRange,
        m: &SearchMatch,
        replacement: &Replacement,
        font: &Font,
    ) -> TextCount {
        let text = StyledString::plain(replacement.expand(m), font);
        self.replace(range, &text)
    }

    fn replace_all(
        &mut self,
        range: TextRange,
        pattern: &SearchPattern,
        replacement: &Replacement,
        entire_word: Option<WordChars>,
    ) -> Option<TextRange> {
        if range.is_empty() {
            return None;
        }
        let mut result = StyledString::default();
        let mut copied_to = range.char_range.first;
        let mut from = range.char_range.first;
        let mut replaced_any = false;

        while let Some(m) = self.find_forward(from, pattern, entire_word) {
            if m.range.char_range.last > range.char_range.last {
                break;
            }
            let between = self.range_of(copied_to, m.range.char_range.first - 1);
            let styled = self.styled_text(between);
            let at = result.fonts.len();
            result.text.push_str(&styled.text);
            result.fonts.insert_array(at, &styled.fonts);

            let font = self.font_at(m.range.char_range.first);
            let expanded = replacement.expand(&m);
            let count = expanded.chars().count();
            result.text.push_str(&expanded);
            result.fonts.push_run(font, count);

            copied_to = m.range.char_range.after();
            from = copied_to;
            replaced_any = true;
        }

        if !replaced_any {
            return None;
        }
        let tail = self.range_of(copied_to, range.char_range.last);
        let styled = self.styled_text(tail);
        let at = result.fonts.len();
        result.text.push_str(&styled.text);
        result.fonts.insert_array(at, &styled.fonts);

        let start = range.start();
        self.replace(range, &result);
        Some(TextRange::from_start(start, result.count()))
    }

    fn subscribe(&mut self) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push(Subscriber {
            id,
            queue: Vec::new(),
        });
        id
    }

    fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|s| s.id != id);
    }

    fn take_changes(&mut self, id: SubscriberId) -> Vec<TextChange> {
        self.subscribers
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| std::mem::take(&mut s.queue))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexRange;
    use crate::search::SearchOptions;

    fn is_word(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    #[test]
    fn insert_and_delete_emit_notifications() {
        let mut t = StyledText::new("hello", Font::default());
        let id = t.subscribe();
        t.insert(t.index_at(6), " world", &Font::default(), UndoMode::Standalone);
        t.delete(t.range_of(1, 5), UndoMode::Standalone);
        assert_eq!(t.to_string(), " world");
        let changes = t.take_changes(id);
        assert_eq!(changes.len(), 2);
        let TextChange::Edited(insert) = changes[0] else {
            panic!("expected edit");
        };
        assert_eq!(insert.range.char_range, IndexRange::new(6, 11));
        assert!(!insert.deletion);
        let TextChange::Edited(delete) = changes[1] else {
            panic!("expected edit");
        };
        assert!(delete.deletion);
        assert_eq!(delete.removed, TextCount::new(5, 5));
        assert_eq!(delete.range.char_range, IndexRange::empty_at(1));
        assert!(t.take_changes(id).is_empty());
    }

    #[test]
    fn index_conversions_are_one_based() {
        let t = StyledText::new("aé中b", Font::default());
        assert_eq!(t.char_to_byte(1), 1);
        assert_eq!(t.char_to_byte(3), 4);
        assert_eq!(t.char_to_byte(4), 7);
        assert_eq!(t.char_to_byte(5), 8);
        assert_eq!(t.byte_to_char(5), 3);
        assert_eq!(t.index_at(99), TextIndex::new(5, 8));
    }

    #[test]
    fn typing_coalesces_in_undo() {
        let mut t = StyledText::new("", Font::default());
        for (i, c) in "abc".chars().enumerate() {
            t.insert(t.index_at(i + 1), &c.to_string(), &Font::default(), UndoMode::Typing);
        }
        assert_eq!(t.undo().map(|r| r.char_range), Some(IndexRange::empty_at(1)));
        assert_eq!(t.to_string(), "");
        t.redo();
        assert_eq!(t.to_string(), "abc");
    }

    #[test]
    fn restyle_and_undo_restore_fonts() {
        let mut t = StyledText::new("abcd", Font::default());
        let bold = Font::default().with_size(20);
        t.set_font(t.range_of(2, 3), &bold);
        assert_eq!(t.font_at(2), bold);
        assert_eq!(t.font_at(4), Font::default());
        t.undo();
        assert_eq!(t.fonts().run_count(), 1);
    }

    #[test]
    fn regex_search_both_directions() {
        let t = StyledText::new("cat concat cat", Font::default());
        let p = SearchPattern::literal("cat").unwrap();
        let m = t.find_forward(2, &p, None).unwrap();
        assert_eq!(m.range.char_range, IndexRange::new(8, 10));
        let m = t.find_forward(2, &p, Some(is_word)).unwrap();
        assert_eq!(m.range.char_range, IndexRange::new(12, 14));
        let m = t.find_backward(12, &p, None).unwrap();
        assert_eq!(m.range.char_range, IndexRange::new(8, 10));
        let m = t.find_backward(12, &p, Some(is_word)).unwrap();
        assert_eq!(m.range.char_range, IndexRange::new(1, 3));
        assert!(t.find_backward(3, &p, None).is_none());
    }

    #[test]
    fn case_insensitive_search_over_multibyte_text() {
        let t = StyledText::new("émile ÉMILE", Font::default());
        let p = SearchPattern::new(
            "ÉMILE",
            SearchOptions {
                case_sensitive: false,
                regex: false,
            },
        )
        .unwrap();
        let m = t.find_forward(1, &p, None).unwrap();
        assert_eq!(m.range.char_range, IndexRange::new(1, 5));
        assert_eq!(m.range.byte_range, IndexRange::new(1, 6));
        let m = t.find_forward(2, &p, None).unwrap();
        assert_eq!(m.range.char_range, IndexRange::new(7, 11));
        assert_eq!(m.range.byte_range, IndexRange::new(8, 13));
    }

    #[test]
    fn search_follows_edits_between_queries() {
        let mut t = StyledText::new("añb añb", Font::default());
        let p = SearchPattern::literal("b").unwrap();
        assert_eq!(t.find_forward(1, &p, None).unwrap().range, t.range_of(3, 3));

        t.insert(t.index_at(1), "中b", &Font::default(), UndoMode::Standalone);
        assert_eq!(t.find_forward(1, &p, None).unwrap().range, t.range_of(2, 2));
        t.delete(t.range_of(1, 4), UndoMode::Standalone);
        assert_eq!(t.to_string(), "b añb");
        assert_eq!(t.find_forward(2, &p, None).unwrap().range, t.range_of(5, 5));
        t.undo();
        t.undo();
        assert_eq!(t.find_backward(9, &p, None).unwrap().range, t.range_of(7, 7));
        assert_eq!(t.contents(), t.to_string());
    }

    #[test]
    fn font_predicate_search() {
        let mut t = StyledText::new("plain BOLD plain", Font::default());
        let big = Font::default().with_size(20);
        t.set_font(t.range_of(7, 10), &big);
        let p = SearchPattern::font(|f| f.size == 20);
        let m = t.find_forward(1, &p, None).unwrap();
        assert_eq!(m.text, "BOLD");
        assert!(t.find_forward(11, &p, None).is_none());
        let m = t.find_backward(17, &p, None).unwrap();
        assert_eq!(m.range.char_range, IndexRange::new(7, 10));
    }

    #[test]
    fn replace_all_is_one_edit() {
        let mut t = StyledText::new("a1 b22 c333", Font::default());
        let id = t.subscribe();
        let p = SearchPattern::regex(r"\d+").unwrap();
        let whole = t.range_of(1, t.char_count());
        let out = t
            .replace_all(whole, &p, &Replacement::literal("#"), None)
            .unwrap();
        assert_eq!(t.to_string(), "a# b# c#");
        assert_eq!(out.char_range, IndexRange::new(1, 8));
        assert_eq!(t.take_changes(id).len(), 1);
        t.undo();
        assert_eq!(t.to_string(), "a1 b22 c333");
    }

    #[test]
    fn replace_all_respects_range() {
        let mut t = StyledText::new("x x x", Font::default());
        let p = SearchPattern::literal("x").unwrap();
        let out = t.replace_all(t.range_of(3, 5), &p, &Replacement::literal("yy"), None);
        assert_eq!(t.to_string(), "x yy yy");
        assert_eq!(out.map(|r| r.char_range), Some(IndexRange::new(3, 7)));
        assert!(t
            .replace_all(t.range_of(1, 1), &SearchPattern::literal("q").unwrap(), &Replacement::literal("z"), None)
            .is_none());
    }
}
