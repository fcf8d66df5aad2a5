//! Text addressing: paired character/byte indices and inclusive ranges.
//!
//! All indices are 1-based. `len + 1` addresses the position just past the last character.
//! Ranges are inclusive; the "nothing" sentinel is distinct from a zero-width range at a
//! boundary (`first == n, last == n - 1`).

use std::cmp::Ordering;
use std::fmt;

/// One logical position in both addressing schemes.
///
/// `byte_index` is the 1-based UTF-8 offset of the character at `char_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextIndex {
    /// 1-based character index.
    pub char_index: usize,
    /// 1-based byte index.
    pub byte_index: usize,
}

impl TextIndex {
    /// The first position of every buffer.
    pub const START: TextIndex = TextIndex {
        char_index: 1,
        byte_index: 1,
    };

    /// Create an index from both components.
    pub fn new(char_index: usize, byte_index: usize) -> Self {
        Self {
            char_index,
            byte_index,
        }
    }

    /// Move forward by a count in both schemes.
    pub fn advanced(self, count: TextCount) -> Self {
        Self {
            char_index: self.char_index + count.char_count,
            byte_index: self.byte_index + count.byte_count,
        }
    }
}

impl Default for TextIndex {
    fn default() -> Self {
        Self::START
    }
}

impl Ord for TextIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.char_index.cmp(&other.char_index)
    }
}

impl PartialOrd for TextIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TextIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.char_index, self.byte_index)
    }
}

/// A length in both addressing schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TextCount {
    /// Number of characters.
    pub char_count: usize,
    /// Number of UTF-8 bytes.
    pub byte_count: usize,
}

impl TextCount {
    /// Create a count from both components.
    pub fn new(char_count: usize, byte_count: usize) -> Self {
        Self {
            char_count,
            byte_count,
        }
    }

    /// Count the characters and bytes of `text`.
    pub fn of(text: &str) -> Self {
        Self {
            char_count: text.chars().count(),
            byte_count: text.len(),
        }
    }

    /// Whether nothing is counted.
    pub fn is_empty(&self) -> bool {
        self.char_count == 0
    }
}

/// Inclusive `[first, last]` range of 1-based indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    /// First index in the range (0 for the "nothing" sentinel).
    pub first: usize,
    /// Last index in the range.
    pub last: usize,
}

/// Inclusive character range.
pub type CharacterRange = IndexRange;
/// Inclusive byte range.
pub type ByteRange = IndexRange;

impl IndexRange {
    /// Create an inclusive range.
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// The sentinel that means "no range at all".
    pub fn nothing() -> Self {
        Self { first: 0, last: 0 }
    }

    /// Zero-width range located at `index`.
    pub fn empty_at(index: usize) -> Self {
        Self {
            first: index,
            last: index.saturating_sub(1),
        }
    }

    /// Range starting at `first` containing `count` elements.
    pub fn with_count(first: usize, count: usize) -> Self {
        Self {
            first,
            last: (first + count).saturating_sub(1),
        }
    }

    /// Whether this is the "nothing" sentinel.
    pub fn is_nothing(&self) -> bool {
        self.first == 0
    }

    /// Whether the range holds no elements (sentinel or zero-width).
    pub fn is_empty(&self) -> bool {
        self.first == 0 || self.last < self.first
    }

    /// Number of elements covered.
    pub fn count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.last - self.first + 1
        }
    }

    /// Whether `index` lies inside the range.
    pub fn contains(&self, index: usize) -> bool {
        !self.is_empty() && self.first <= index && index <= self.last
    }

    /// Smallest range covering both inputs; a "nothing" input is ignored.
    pub fn covering(a: IndexRange, b: IndexRange) -> IndexRange {
        if a.is_nothing() {
            return b;
        }
        if b.is_nothing() {
            return a;
        }
        IndexRange {
            first: a.first.min(b.first),
            last: a.last.max(b.last),
        }
    }

    /// Index just past the end of the range.
    pub fn after(&self) -> usize {
        self.last + 1
    }
}

impl Default for IndexRange {
    fn default() -> Self {
        Self::nothing()
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nothing() {
            write!(f, "[nothing]")
        } else {
            write!(f, "[{}, {}]", self.first, self.last)
        }
    }
}

/// The same span in both addressing schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TextRange {
    /// Character range.
    pub char_range: CharacterRange,
    /// Byte range.
    pub byte_range: ByteRange,
}

impl TextRange {
    /// Pair a character range with its byte range.
    pub fn new(char_range: CharacterRange, byte_range: ByteRange) -> Self {
        debug_assert_eq!(char_range.is_nothing(), byte_range.is_nothing());
        debug_assert_eq!(char_range.is_empty(), byte_range.is_empty());
        debug_assert!(char_range.count() <= byte_range.count());
        Self {
            char_range,
            byte_range,
        }
    }

    /// Range starting at `start` and spanning `count`.
    pub fn from_start(start: TextIndex, count: TextCount) -> Self {
        Self {
            char_range: IndexRange::with_count(start.char_index, count.char_count),
            byte_range: IndexRange::with_count(start.byte_index, count.byte_count),
        }
    }

    /// The "no range" sentinel.
    pub fn nothing() -> Self {
        Self::default()
    }

    /// Whether this is the sentinel.
    pub fn is_nothing(&self) -> bool {
        self.char_range.is_nothing()
    }

    /// Whether the range covers no characters.
    pub fn is_empty(&self) -> bool {
        self.char_range.is_empty()
    }

    /// First position of the range.
    pub fn start(&self) -> TextIndex {
        TextIndex::new(self.char_range.first, self.byte_range.first)
    }

    /// Position just past the end of the range.
    pub fn after(&self) -> TextIndex {
        TextIndex::new(self.char_range.after(), self.byte_range.after())
    }

    /// Size of the range in both schemes.
    pub fn count(&self) -> TextCount {
        TextCount::new(self.char_range.count(), self.byte_range.count())
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chars {} bytes {}", self.char_range, self.byte_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_differs_from_zero_width() {
        let nothing = IndexRange::nothing();
        let zero = IndexRange::empty_at(5);
        assert!(nothing.is_nothing());
        assert!(!zero.is_nothing());
        assert!(zero.is_empty());
        assert_eq!(zero.count(), 0);
        assert_eq!(zero.after(), 5);
    }

    #[test]
    fn covering_ignores_nothing() {
        let a = IndexRange::new(3, 7);
        assert_eq!(IndexRange::covering(IndexRange::nothing(), a), a);
        assert_eq!(
            IndexRange::covering(a, IndexRange::new(1, 4)),
            IndexRange::new(1, 7)
        );
    }

    #[test]
    fn text_range_from_start() {
        let r = TextRange::from_start(TextIndex::new(2, 3), TextCount::new(2, 5));
        assert_eq!(r.char_range, IndexRange::new(2, 3));
        assert_eq!(r.byte_range, IndexRange::new(3, 7));
        assert_eq!(r.after(), TextIndex::new(4, 8));
        assert_eq!(r.count(), TextCount::new(2, 5));
    }

    #[test]
    fn text_count_of_multibyte() {
        assert_eq!(TextCount::of("aé中"), TextCount::new(3, 6));
    }
}
