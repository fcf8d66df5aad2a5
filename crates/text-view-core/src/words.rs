//! Word, partial-word and paragraph boundaries.
//!
//! All functions take 1-based character indices, accept indices outside the text and clamp
//! them, and return character indices.

use crate::buffer::{TextBuffer, WordChars};
use crate::index::CharacterRange;

/// First character of the word at or before `char_index`.
///
/// When `char_index` is not inside a word, the word preceding it is used.
pub fn word_start(buf: &dyn TextBuffer, char_index: usize, in_word: WordChars) -> usize {
    let len = buf.char_count();
    if len == 0 || char_index <= 1 {
        return 1;
    }
    let mut i = char_index.min(len);
    while i >= 1 && buf.char_at(i).is_some_and(|c| !in_word(c)) {
        i -= 1;
    }
    while i >= 1 && buf.char_at(i).is_some_and(in_word) {
        i -= 1;
    }
    i + 1
}

/// Last character of the word at or after `char_index`.
pub fn word_end(buf: &dyn TextBuffer, char_index: usize, in_word: WordChars) -> usize {
    let len = buf.char_count();
    if len == 0 {
        return 1;
    }
    if char_index >= len {
        return len;
    }
    let mut i = char_index.max(1);
    while i <= len && buf.char_at(i).is_some_and(|c| !in_word(c)) {
        i += 1;
    }
    while i <= len && buf.char_at(i).is_some_and(in_word) {
        i += 1;
    }
    (i - 1).max(1)
}

/// First character of the camel-case or digit-run segment at or before `char_index`.
///
/// In `get_word Get142TheWordABCGood` the segments start at `get`, `word`, `Get`, `142`,
/// `The`, `Word`, `ABC` and `Good`.
pub fn partial_word_start(buf: &dyn TextBuffer, char_index: usize) -> usize {
    let len = buf.char_count();
    if len == 0 || char_index <= 1 {
        return 1;
    }
    let mut i = char_index.min(len);
    while i >= 1 && buf.char_at(i).is_some_and(|c| !c.is_alphanumeric()) {
        i -= 1;
    }
    let Some(mut prev) = buf.char_at(i) else {
        return 1;
    };
    let mut found_lower = prev.is_lowercase();
    while i > 1 {
        let Some(c) = buf.char_at(i - 1) else {
            break;
        };
        found_lower |= c.is_lowercase();
        if !c.is_alphanumeric()
            || (prev.is_uppercase() && c.is_lowercase())
            || (prev.is_uppercase() && c.is_uppercase() && found_lower)
            || (prev.is_alphabetic() && c.is_numeric())
            || (prev.is_numeric() && c.is_alphabetic())
        {
            break;
        }
        prev = c;
        i -= 1;
    }
    i
}

/// Last character of the camel-case or digit-run segment at or after `char_index`.
pub fn partial_word_end(buf: &dyn TextBuffer, char_index: usize) -> usize {
    let len = buf.char_count();
    if len == 0 {
        return 1;
    }
    if char_index >= len {
        return len;
    }
    let mut i = char_index.max(1);
    while i <= len && buf.char_at(i).is_some_and(|c| !c.is_alphanumeric()) {
        i += 1;
    }
    let Some(mut prev) = buf.char_at(i) else {
        return len;
    };
    while i < len {
        let Some(c) = buf.char_at(i + 1) else {
            break;
        };
        let next_is_lower = buf.char_at(i + 2).is_some_and(char::is_lowercase);
        if !c.is_alphanumeric()
            || (prev.is_lowercase() && c.is_uppercase())
            || (prev.is_alphabetic() && c.is_numeric())
            || (prev.is_numeric() && c.is_alphabetic())
            || (prev.is_uppercase() && c.is_uppercase() && next_is_lower)
        {
            break;
        }
        prev = c;
        i += 1;
    }
    i
}

/// First character of the paragraph containing `char_index`.
pub fn paragraph_start(buf: &dyn TextBuffer, char_index: usize) -> usize {
    let len = buf.char_count();
    if len == 0 || char_index <= 1 {
        return 1;
    }
    let mut i = char_index.min(len + 1);
    while i > 1 && buf.char_at(i - 1) != Some('\n') {
        i -= 1;
    }
    i
}

/// The line break ending the paragraph containing `char_index`, or the last character.
pub fn paragraph_end(buf: &dyn TextBuffer, char_index: usize) -> usize {
    let len = buf.char_count();
    if len == 0 {
        return 1;
    }
    if char_index >= len {
        return len;
    }
    let mut i = char_index.max(1);
    while i < len && buf.char_at(i) != Some('\n') {
        i += 1;
    }
    i
}

/// Range a double-click at `char_index` selects.
///
/// The word is selected when the click lands inside it or, unless `dragging`, on the character
/// right after it. Otherwise the clicked character alone is selected, preferring the character
/// before a line break.
pub fn double_click_selection(
    buf: &dyn TextBuffer,
    char_index: usize,
    partial_word: bool,
    dragging: bool,
    in_word: WordChars,
) -> CharacterRange {
    let len = buf.char_count();
    let (start, end) = if partial_word {
        let start = partial_word_start(buf, char_index);
        (start, partial_word_end(buf, start))
    } else {
        let start = word_start(buf, char_index, in_word);
        (start, word_end(buf, start, in_word))
    };

    let inside = start <= char_index && char_index <= end;
    let just_after = !dragging
        && ((char_index == end + 1 && end < len) || (char_index == len + 1 && end == len));
    if inside || just_after {
        return CharacterRange::new(start, end);
    }

    let mut i = char_index.min(len).max(1);
    if i > 1 && buf.char_at(i) == Some('\n') && buf.char_at(i - 1) != Some('\n') {
        i -= 1;
    }
    CharacterRange::new(i, i)
}
