//! Layout cache and position model.
//!
//! The cache holds one [`TextIndex`] per visual line and a run-length encoded sequence of
//! [`LineGeometry`]. When the buffer ends with a line break, the table carries one extra
//! empty line starting at `len + 1` so the caret has somewhere to live after the break.
//!
//! Every query here is a pure function of the cache and the buffer. Coordinates are text
//! coordinates: `x = 0` is the left edge of the text (the left margin is not included) and
//! `y = 0` is the top of the first line.

mod relayout;

pub(crate) use relayout::WrapParams;

use crate::Coordinate;
use crate::buffer::TextBuffer;
use crate::font::{Font, FontMetrics};
use crate::index::{TextCount, TextIndex};
use crate::run_array::RunArray;

/// Height and baseline of one visual line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineGeometry {
    /// Total line height.
    pub height: Coordinate,
    /// Distance from the top of the line to the baseline.
    pub ascent: Coordinate,
}

impl LineGeometry {
    /// Create a geometry value.
    pub fn new(height: Coordinate, ascent: Coordinate) -> Self {
        Self { height, ascent }
    }
}

/// A caret position together with its visual line (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretLocation {
    /// Position in the text.
    pub index: TextIndex,
    /// Visual line holding the caret.
    pub line: usize,
}

impl CaretLocation {
    /// Create a caret location.
    pub fn new(index: TextIndex, line: usize) -> Self {
        Self { index, line }
    }
}

impl Default for CaretLocation {
    fn default() -> Self {
        Self {
            index: TextIndex::START,
            line: 1,
        }
    }
}

/// A point in text coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    /// Horizontal position.
    pub x: Coordinate,
    /// Vertical position.
    pub y: Coordinate,
}

impl Point {
    /// Create a point.
    pub fn new(x: Coordinate, y: Coordinate) -> Self {
        Self { x, y }
    }
}

/// Width measurement shared by line breaking and caret mapping.
///
/// Tabs go through `tab_width(char_index, x)`; everything else through the font metrics.
pub(crate) struct Measure<'a> {
    pub(crate) buf: &'a dyn TextBuffer,
    pub(crate) metrics: &'a dyn FontMetrics,
    pub(crate) tab_width: &'a dyn Fn(usize, Coordinate) -> Coordinate,
}

impl<'a> Measure<'a> {
    /// `(index, char, font)` for characters `first..=last`.
    pub(crate) fn styled_chars(
        &self,
        first: usize,
        last: usize,
    ) -> impl Iterator<Item = (usize, char, &'a Font)> + use<'a> {
        let buf = self.buf;
        let start = first.max(1);
        buf.fonts()
            .runs_from(start - 1)
            .flat_map(|(f0, len, font)| (f0 + 1..=f0 + len).map(move |i| (i, font)))
            .take_while(move |(i, _)| *i <= last)
            .filter_map(move |(i, font)| buf.char_at(i).map(|c| (i, c, font)))
    }

    /// Width of one character drawn at `x`.
    pub(crate) fn char_width(&self, index: usize, c: char, font: &Font, x: Coordinate) -> Coordinate {
        if c == '\t' {
            (self.tab_width)(index, x)
        } else {
            self.metrics.char_width(font, c)
        }
    }

    /// Width of characters `first..=last` when the first one starts at `x`.
    pub(crate) fn string_width(&self, first: usize, last: usize, x: Coordinate) -> Coordinate {
        let mut w = 0;
        for (i, c, font) in self.styled_chars(first, last) {
            w += self.char_width(i, c, font, x + w);
        }
        w
    }

    /// Geometry of a line holding characters `first..=last`: tallest ascent plus tallest descent.
    pub(crate) fn line_geometry(&self, first: usize, last: usize) -> LineGeometry {
        let mut ascent = 0;
        let mut descent = 0;
        for (f0, _, font) in self.buf.fonts().runs_from(first.max(1) - 1) {
            if f0 + 1 > last {
                break;
            }
            let lm = self.metrics.line_metrics(font);
            ascent = ascent.max(lm.ascent);
            descent = descent.max(lm.descent);
        }
        LineGeometry::new(ascent + descent, ascent)
    }

    /// Geometry of an empty line drawn in `font`.
    pub(crate) fn empty_line_geometry(&self, font: &Font) -> LineGeometry {
        let lm = self.metrics.line_metrics(font);
        LineGeometry::new(lm.height(), lm.ascent)
    }

    /// UTF-8 size of characters `first..=last`.
    pub(crate) fn byte_len(&self, first: usize, last: usize) -> usize {
        (first..=last)
            .filter_map(|i| self.buf.char_at(i))
            .map(char::len_utf8)
            .sum()
    }
}

/// Font newly typed text at `char_index` inherits.
///
/// After a line break the following character's style wins; otherwise the preceding one's.
pub fn insertion_font_at(buf: &dyn TextBuffer, char_index: usize) -> Font {
    let len = buf.char_count();
    if char_index > 1 && buf.char_at(char_index - 1) == Some('\n') && char_index <= len {
        buf.font_at(char_index)
    } else if char_index > 1 {
        buf.font_at((char_index - 1).min(len))
    } else if len > 0 {
        buf.font_at(1)
    } else {
        buf.default_font().clone()
    }
}

/// Line-start table plus per-line geometry.
#[derive(Debug, Clone)]
pub struct LayoutCache {
    line_starts: Vec<TextIndex>,
    geometry: RunArray<LineGeometry>,
    trailing_line: bool,
    prev_len: TextCount,
    width: Coordinate,
    max_word_width: Coordinate,
    height: Coordinate,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self {
            line_starts: vec![TextIndex::START],
            geometry: RunArray::with_run(LineGeometry::default(), 1),
            trailing_line: false,
            prev_len: TextCount::default(),
            width: 0,
            max_word_width: 0,
            height: 0,
        }
    }
}

impl LayoutCache {
    /// Number of visual lines, including the empty line after a trailing break.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Every line start in order.
    pub fn line_starts(&self) -> &[TextIndex] {
        &self.line_starts
    }

    /// Per-line geometry.
    pub fn geometry(&self) -> &RunArray<LineGeometry> {
        &self.geometry
    }

    /// Whether the last line is the empty line following a trailing break.
    pub fn has_trailing_line(&self) -> bool {
        self.trailing_line
    }

    /// Content width: the wrap width, or the longest line when only breaking at line breaks.
    pub fn width(&self) -> Coordinate {
        self.width
    }

    /// Widest single word seen while wrapping.
    pub fn max_word_width(&self) -> Coordinate {
        self.max_word_width
    }

    /// Total content height.
    pub fn height(&self) -> Coordinate {
        self.height
    }

    fn clamp_line(&self, line: usize) -> usize {
        line.clamp(1, self.line_count())
    }

    /// First position on `line` (clamped).
    pub fn line_start(&self, line: usize) -> TextIndex {
        self.line_starts[self.clamp_line(line) - 1]
    }

    /// Last character on `line` (clamped); for an empty line this is the position before its start.
    pub fn line_end(&self, buf: &dyn TextBuffer, line: usize) -> TextIndex {
        let line = self.clamp_line(line);
        let next = if line < self.line_count() {
            self.line_starts[line]
        } else {
            TextIndex::new(buf.char_count() + 1, buf.byte_count() + 1)
        };
        let char_index = next.char_index - 1;
        let width = buf.char_at(char_index).map_or(1, char::len_utf8);
        TextIndex::new(char_index, next.byte_index.saturating_sub(width))
    }

    /// Visual line containing `char_index`.
    pub fn line_for_char(&self, char_index: usize) -> usize {
        match self
            .line_starts
            .binary_search_by(|s| s.char_index.cmp(&char_index))
        {
            Ok(i) => i + 1,
            Err(i) => i.max(1),
        }
    }

    /// Visual line containing `byte_index`.
    pub fn line_for_byte(&self, byte_index: usize) -> usize {
        match self
            .line_starts
            .binary_search_by(|s| s.byte_index.cmp(&byte_index))
        {
            Ok(i) => i + 1,
            Err(i) => i.max(1),
        }
    }

    /// Geometry of `line` (clamped).
    pub fn line_geometry(&self, line: usize) -> LineGeometry {
        self.geometry
            .get(self.clamp_line(line) - 1)
            .copied()
            .unwrap_or_default()
    }

    /// Height of `line`.
    pub fn line_height(&self, line: usize) -> Coordinate {
        self.line_geometry(line).height
    }

    /// Top of `line`: the sum of the heights of the lines above it.
    pub fn line_top(&self, line: usize) -> Coordinate {
        self.geometry
            .prefix_sum(self.clamp_line(line) - 1, |g| g.height)
    }

    /// Line containing `y`, clamped to the first and last lines.
    pub fn line_at_y(&self, y: Coordinate) -> usize {
        if y < 0 {
            return 1;
        }
        match self.geometry.find_positive_sum(y, |g| g.height.max(1)) {
            Some((i, _)) => i + 1,
            None => self.line_count(),
        }
    }

    /// Byte index for `char_index`, scanning from the start of its line.
    pub fn char_to_byte(&self, buf: &dyn TextBuffer, char_index: usize) -> usize {
        let char_index = char_index.clamp(1, buf.char_count() + 1);
        let start = self.line_start(self.line_for_char(char_index));
        if start.char_index > char_index {
            return buf.char_to_byte(char_index);
        }
        start.byte_index
            + (start.char_index..char_index)
                .filter_map(|i| buf.char_at(i))
                .map(char::len_utf8)
                .sum::<usize>()
    }

    /// Character index for `byte_index`, scanning from the start of its line.
    pub fn byte_to_char(&self, buf: &dyn TextBuffer, byte_index: usize) -> usize {
        let byte_index = byte_index.clamp(1, buf.byte_count() + 1);
        let start = self.line_start(self.line_for_byte(byte_index));
        let mut byte = start.byte_index;
        let mut char_index = start.char_index;
        while byte < byte_index {
            let Some(c) = buf.char_at(char_index) else {
                break;
            };
            if byte + c.len_utf8() > byte_index {
                break;
            }
            byte += c.len_utf8();
            char_index += 1;
        }
        char_index
    }

    /// Caret location for `char_index`, clamped to `[1, len + 1]`.
    pub fn caret_location(&self, buf: &dyn TextBuffer, char_index: usize) -> CaretLocation {
        let char_index = char_index.clamp(1, buf.char_count() + 1);
        CaretLocation::new(
            TextIndex::new(char_index, self.char_to_byte(buf, char_index)),
            self.line_for_char(char_index),
        )
    }

    /// Horizontal position of the caret: the width of everything before it on its line.
    pub(crate) fn char_left(&self, m: &Measure<'_>, loc: CaretLocation) -> Coordinate {
        let start = self.line_start(loc.line);
        if loc.index.char_index <= start.char_index {
            return 0;
        }
        m.string_width(start.char_index, loc.index.char_index - 1, 0)
    }

    /// Width of the character at `loc`, or 0 at the end of the text.
    pub(crate) fn char_width_at(&self, m: &Measure<'_>, loc: CaretLocation) -> Coordinate {
        let i = loc.index.char_index;
        match m.buf.char_at(i) {
            Some(c) => {
                let x = self.char_left(m, loc);
                m.char_width(i, c, &m.buf.font_at(i), x)
            }
            None => 0,
        }
    }

    /// Top-left pixel of the caret.
    pub(crate) fn caret_to_pixel(&self, m: &Measure<'_>, loc: CaretLocation) -> Point {
        Point::new(self.char_left(m, loc), self.line_top(loc.line))
    }

    /// Caret location nearest to `pt`.
    ///
    /// A point exactly on a character boundary maps to that boundary; otherwise the nearer side
    /// of the character under the point wins, ties going left. A single trailing whitespace
    /// character is skipped on every line except the final line of a buffer without a trailing
    /// break.
    pub(crate) fn pixel_to_caret(&self, m: &Measure<'_>, pt: Point) -> CaretLocation {
        let buf = m.buf;
        let len = buf.char_count();
        if len == 0 {
            return CaretLocation::default();
        }
        if pt.y >= self.height {
            return CaretLocation::new(
                TextIndex::new(len + 1, buf.byte_count() + 1),
                self.line_count(),
            );
        }

        let line = self.line_at_y(pt.y);
        let start = self.line_start(line);
        let mut end = self.line_end(buf, line).char_index;
        if end >= start.char_index
            && (end < len || buf.ends_with_newline())
            && buf.char_at(end).is_some_and(char::is_whitespace)
        {
            end -= 1;
        }

        if pt.x <= 0 {
            return CaretLocation::new(start, line);
        }

        let mut x = 0;
        let mut prev_d = pt.x;
        let mut byte = start.byte_index;
        for (i, c, font) in m.styled_chars(start.char_index, end) {
            x += m.char_width(i, c, font, x);
            let d = pt.x - x;
            let after = byte + c.len_utf8();
            if d == 0 {
                return CaretLocation::new(TextIndex::new(i + 1, after), line);
            }
            if d < 0 {
                return if prev_d <= -d {
                    CaretLocation::new(TextIndex::new(i, byte), line)
                } else {
                    CaretLocation::new(TextIndex::new(i + 1, after), line)
                };
            }
            prev_d = d;
            byte = after;
        }
        CaretLocation::new(TextIndex::new(end + 1, byte), line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{WrapMode, default_tab_width};
    use crate::font::MonospaceMetrics;
    use crate::styled_text::StyledText;

    fn layout(text: &str, mode: WrapMode, width: Coordinate) -> (StyledText, LayoutCache) {
        let buf = StyledText::new(text, Font::default());
        let metrics = MonospaceMetrics::new(10);
        let tabs = |_: usize, x: Coordinate| default_tab_width(x, 40);
        let m = Measure {
            buf: &buf,
            metrics: &metrics,
            tab_width: &tabs,
        };
        let mut cache = LayoutCache::default();
        cache.recalc_all(&m, &WrapParams::new(mode, width, &m));
        (buf, cache)
    }

    fn with_measure<R>(buf: &StyledText, f: impl FnOnce(&Measure<'_>) -> R) -> R {
        let metrics = MonospaceMetrics::new(10);
        let tabs = |_: usize, x: Coordinate| default_tab_width(x, 40);
        f(&Measure {
            buf,
            metrics: &metrics,
            tab_width: &tabs,
        })
    }

    #[test]
    fn line_lookup_by_char_and_byte() {
        let (buf, cache) = layout("aé\nbc\nd", WrapMode::LineBreaksOnly, 0);
        assert_eq!(cache.line_count(), 3);
        assert_eq!(cache.line_start(2), TextIndex::new(4, 5));
        assert_eq!(cache.line_for_char(3), 1);
        assert_eq!(cache.line_for_char(4), 2);
        assert_eq!(cache.line_for_byte(4), 1);
        assert_eq!(cache.line_for_byte(5), 2);
        assert_eq!(cache.line_end(&buf, 1), TextIndex::new(3, 4));
        assert_eq!(cache.line_end(&buf, 3), TextIndex::new(7, 8));
    }

    #[test]
    fn conversions_scan_from_line_start() {
        let (buf, cache) = layout("ab\nçd中e", WrapMode::LineBreaksOnly, 0);
        for c in 1..=buf.char_count() + 1 {
            let b = buf.char_to_byte(c);
            assert_eq!(cache.char_to_byte(&buf, c), b);
            assert_eq!(cache.byte_to_char(&buf, b), c);
        }
    }

    #[test]
    fn line_tops_accumulate_heights() {
        let (_, cache) = layout("a\nb\nc", WrapMode::LineBreaksOnly, 0);
        assert_eq!(cache.line_top(1), 0);
        assert_eq!(cache.line_top(3), 30);
        assert_eq!(cache.height(), 45);
        assert_eq!(cache.line_at_y(14), 1);
        assert_eq!(cache.line_at_y(15), 2);
        assert_eq!(cache.line_at_y(1000), 3);
        assert_eq!(cache.line_at_y(-5), 1);
    }

    #[test]
    fn pixel_mapping_snaps_to_nearest_boundary() {
        let (buf, cache) = layout("abcd", WrapMode::Word, 1000);
        with_measure(&buf, |m| {
            let at = |x| cache.pixel_to_caret(m, Point::new(x, 2)).index.char_index;
            assert_eq!(at(-3), 1);
            assert_eq!(at(4), 1);
            assert_eq!(at(5), 1);
            assert_eq!(at(6), 2);
            assert_eq!(at(10), 2);
            assert_eq!(at(39), 5);
            assert_eq!(at(400), 5);
        });
    }

    #[test]
    fn pixel_mapping_skips_trailing_break() {
        let (buf, cache) = layout("ab\ncd", WrapMode::Word, 1000);
        with_measure(&buf, |m| {
            let loc = cache.pixel_to_caret(m, Point::new(500, 0));
            assert_eq!(loc.index.char_index, 3);
            assert_eq!(loc.line, 1);
            let loc = cache.pixel_to_caret(m, Point::new(500, 20));
            assert_eq!(loc.index, TextIndex::new(6, 6));
            let loc = cache.pixel_to_caret(m, Point::new(5, 500));
            assert_eq!(loc.index.char_index, 6);
        });
    }

    #[test]
    fn caret_pixels_use_tab_rule() {
        let (buf, cache) = layout("a\tb", WrapMode::LineBreaksOnly, 0);
        with_measure(&buf, |m| {
            let loc = cache.caret_location(&buf, 3);
            assert_eq!(cache.caret_to_pixel(m, loc).x, 40);
            let loc = cache.caret_location(&buf, 2);
            assert_eq!(cache.char_width_at(m, loc), 30);
        });
    }

    #[test]
    fn round_trip_every_caret_position() {
        let (buf, cache) = layout(
            "one two\tthree  four\nfive six seven eight nine\n\nten",
            WrapMode::Word,
            90,
        );
        with_measure(&buf, |m| {
            for c in 1..=buf.char_count() + 1 {
                let loc = cache.caret_location(&buf, c);
                let pt = cache.caret_to_pixel(m, loc);
                let back = cache.pixel_to_caret(m, pt);
                assert_eq!(back.index.char_index, c, "char {c}");
                assert_eq!(back.line, loc.line, "char {c}");
            }
        });
    }

    #[test]
    fn insertion_font_prefers_previous_character() {
        let mut buf = StyledText::new("ab\ncd", Font::default());
        let big = Font::default().with_size(30);
        buf.set_font(buf.range_of(4, 5), &big);
        assert_eq!(insertion_font_at(&buf, 3), Font::default());
        assert_eq!(insertion_font_at(&buf, 4), big);
        assert_eq!(insertion_font_at(&buf, 6), big);
        assert_eq!(insertion_font_at(&StyledText::new("", big.clone()), 1), big);
    }
}
