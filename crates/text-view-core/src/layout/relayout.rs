//! Incremental line breaking.
//!
//! A localized relayout starts at the line holding the edit (one line earlier when the edit
//! touches the first word of a line, since that word may now fit on the previous line) and
//! re-breaks lines until a new line start sits at the same distance from the end of the text
//! as an old one. From there on the old starts are shifted by a constant instead of recomputed.

use super::{CaretLocation, LayoutCache, LineGeometry, Measure, insertion_font_at};
use crate::Coordinate;
use crate::config::WrapMode;
use crate::index::{CharacterRange, TextCount, TextIndex};
use tracing::{debug, trace};

/// Line breaking parameters for one relayout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WrapParams {
    pub(crate) mode: WrapMode,
    pub(crate) line_width: Coordinate,
    /// Geometry of the empty line of an empty buffer or after a trailing break.
    pub(crate) end_line: LineGeometry,
}

impl WrapParams {
    pub(crate) fn new(mode: WrapMode, line_width: Coordinate, m: &Measure<'_>) -> Self {
        let font = insertion_font_at(m.buf, m.buf.char_count() + 1);
        Self {
            mode,
            line_width,
            end_line: m.empty_line_geometry(&font),
        }
    }
}

/// What a relayout touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Relayout {
    /// First line whose content or geometry may have changed.
    pub(crate) first_line: usize,
    /// Last such line.
    pub(crate) last_line: usize,
    /// Top of the line where the relayout started, before the change.
    pub(crate) orig_y: Coordinate,
    /// Content height before the change.
    pub(crate) old_height: Coordinate,
}

struct BrokenLine {
    chars: usize,
    bytes: usize,
    width: Coordinate,
}

fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

impl LayoutCache {
    /// Rebuild the whole table.
    pub(crate) fn recalc_all(&mut self, m: &Measure<'_>, p: &WrapParams) -> Relayout {
        debug!(
            chars = m.buf.char_count(),
            mode = ?p.mode,
            width = p.line_width,
            "full relayout"
        );
        if p.mode == WrapMode::LineBreaksOnly {
            self.width = 0;
        }
        self.max_word_width = 0;
        self.line_starts.clear();
        self.line_starts.push(TextIndex::START);
        self.geometry.clear();
        self.geometry.push(p.end_line);
        self.trailing_line = false;
        self.prev_len = TextCount::default();

        self.recalc(
            m,
            p,
            TextIndex::START,
            m.buf.char_count(),
            false,
            CharacterRange::nothing(),
        )
    }

    /// Re-break the lines affected by an edit at `start` spanning at least `min_count` characters.
    pub(crate) fn recalc(
        &mut self,
        m: &Measure<'_>,
        p: &WrapParams,
        start: TextIndex,
        min_count: usize,
        deletion: bool,
        redraw: CharacterRange,
    ) -> Relayout {
        let len = m.buf.char_count();
        let old_height = self.height;
        trace!(start = %start, min_count, deletion, "relayout");

        if self.trailing_line {
            self.line_starts.pop();
            self.geometry.remove(self.geometry.len() - 1);
            self.trailing_line = false;
        }
        if p.mode == WrapMode::LineBreaksOnly && self.line_count() == 1 {
            self.width = 0;
        }

        let mut char_index = start.char_index.clamp(1, len + 1);
        let mut line = self.line_for_char(char_index);
        let orig_y = self.line_top(line);
        if char_index == len + 1 && len > 0 {
            char_index -= 1;
            line = self.line_for_char(char_index);
        }

        let (mut first_line, mut last_line, max_line_width) = if len > 0 {
            let loc = CaretLocation::new(TextIndex::new(char_index, 0), line);
            self.recalc_lines(m, p, loc, min_count.max(1))
        } else {
            self.line_starts.clear();
            self.line_starts.push(TextIndex::START);
            self.geometry.clear();
            self.geometry.push(p.end_line);
            (1, 1, 0)
        };

        if !redraw.is_empty() {
            first_line = first_line.min(self.line_for_char(redraw.first));
            last_line = last_line.max(self.line_for_char(redraw.last));
        }

        if m.buf.ends_with_newline() {
            let reached_end = last_line == self.line_count();
            self.line_starts
                .push(TextIndex::new(len + 1, m.buf.byte_count() + 1));
            self.geometry.push(p.end_line);
            self.trailing_line = true;
            if reached_end {
                last_line += 1;
            }
        }

        match p.mode {
            WrapMode::Word => self.width = p.line_width,
            WrapMode::LineBreaksOnly => self.width = self.width.max(max_line_width),
        }
        self.height = self.geometry.total(|g| g.height);
        self.prev_len = TextCount::new(len, m.buf.byte_count());

        Relayout {
            first_line,
            last_line,
            orig_y,
            old_height,
        }
    }

    /// The line-breaking loop. Returns `(first line, last line, widest line)`.
    fn recalc_lines(
        &mut self,
        m: &Measure<'_>,
        p: &WrapParams,
        loc: CaretLocation,
        min_count: usize,
    ) -> (usize, usize, Coordinate) {
        let len = m.buf.char_count();
        let prev_len = self.prev_len.char_count;

        let mut line = loc.line;
        if p.mode == WrapMode::Word
            && line > 1
            && loc.index.char_index <= len
            && self.no_prev_whitespace_on_line(m, loc)
        {
            line -= 1;
        }

        let mut first = self.line_start(line);
        let min_count = min_count + (loc.index.char_index - first.char_index);
        let first_line = line;
        let mut total = 0;
        let mut max_width = 0;

        loop {
            let broken = self.break_line(m, p, first.char_index, line);
            total += broken.chars;
            max_width = max_width.max(broken.width);
            let end_char = first.char_index + broken.chars - 1;
            debug_assert!(end_char <= len);

            // drop old starts that now lie inside this line
            while line < self.line_count()
                && (prev_len + 1) - self.line_starts[line].char_index > len - end_char
            {
                self.line_starts.remove(line);
                self.geometry.remove(line);
            }

            if end_char >= len {
                break;
            }

            let next = TextIndex::new(end_char + 1, first.byte_index + broken.bytes);
            if total >= min_count
                && line < self.line_count()
                && prev_len - self.line_starts[line].char_index == len - next.char_index
            {
                let old = self.line_starts[line];
                if old != next {
                    let dc = next.char_index as isize - old.char_index as isize;
                    let db = next.byte_index as isize - old.byte_index as isize;
                    for s in &mut self.line_starts[line..] {
                        s.char_index = s.char_index.wrapping_add_signed(dc);
                        s.byte_index = s.byte_index.wrapping_add_signed(db);
                    }
                }
                break;
            }

            line += 1;
            first = next;
            self.line_starts.insert(line - 1, next);
            self.geometry.insert(line - 1, LineGeometry::default());

            if line < self.line_count()
                && prev_len - self.line_starts[line].char_index == len - next.char_index
            {
                self.line_starts.remove(line);
                self.geometry.remove(line);
            }
        }

        (first_line, line, max_width)
    }

    /// Whether no whitespace separates the caret from the start of its line.
    fn no_prev_whitespace_on_line(&self, m: &Measure<'_>, loc: CaretLocation) -> bool {
        let first = self.line_start(loc.line).char_index;
        !(first + 1..loc.index.char_index)
            .rev()
            .any(|i| m.buf.char_at(i).is_some_and(is_whitespace))
    }

    /// Break one line starting at `first` and store its geometry.
    fn break_line(
        &mut self,
        m: &Measure<'_>,
        p: &WrapParams,
        first: usize,
        line: usize,
    ) -> BrokenLine {
        let len = m.buf.char_count();
        let (chars, width) = match p.mode {
            WrapMode::LineBreaksOnly => {
                let end = (first..=len)
                    .find(|&i| m.buf.char_at(i) == Some('\n'))
                    .unwrap_or(len);
                (end - first + 1, m.string_width(first, end, 0))
            }
            WrapMode::Word => self.break_word_line(m, p, first),
        };

        let last = first + chars - 1;
        let geometry = m.line_geometry(first, last);
        if line <= self.geometry.len() {
            self.geometry.set(line - 1, geometry);
        } else {
            self.geometry.push(geometry);
        }
        trace!(line, first, chars, width, "line broken");

        BrokenLine {
            chars,
            bytes: m.byte_len(first, last),
            width,
        }
    }

    fn break_word_line(
        &mut self,
        m: &Measure<'_>,
        p: &WrapParams,
        first: usize,
    ) -> (usize, Coordinate) {
        let len = m.buf.char_count();
        let mut width = 0;
        let (mut chars, mut end_of_line) = include_whitespace(m, p, first, &mut width);
        let mut i = first + chars;

        while i <= len && !end_of_line {
            let word_start = i;
            while m.buf.char_at(i).is_some_and(|c| !is_whitespace(c)) {
                i += 1;
            }

            let dw = m.string_width(word_start, i - 1, width);
            self.max_word_width = self.max_word_width.max(dw);
            if width + dw > p.line_width {
                if word_start == first {
                    return split_word(m, p, first, i - 1);
                }
                break;
            }

            width += dw;
            chars += i - word_start;

            let (ws, eol) = include_whitespace(m, p, i, &mut width);
            i += ws;
            chars += ws;
            end_of_line = eol;
        }

        (chars, width)
    }
}

/// Absorb the whitespace run at `start`. Returns `(count, end of line)`.
///
/// A line break always ends the line; a tab ends it when it pushes past the wrap width.
fn include_whitespace(
    m: &Measure<'_>,
    p: &WrapParams,
    start: usize,
    width: &mut Coordinate,
) -> (usize, bool) {
    let mut i = start;
    let mut count = 0;
    while let Some(c) = m.buf.char_at(i) {
        if !is_whitespace(c) {
            break;
        }
        count += 1;
        *width += m.char_width(i, c, &m.buf.font_at(i), *width);
        i += 1;
        if c == '\t' && p.mode == WrapMode::Word && *width > p.line_width {
            return (count, true);
        }
        if c == '\n' {
            return (count, true);
        }
    }
    (count, false)
}

/// Put as much of an overlong word on the line as fits, and always at least one character.
fn split_word(m: &Measure<'_>, p: &WrapParams, first: usize, last: usize) -> (usize, Coordinate) {
    let mut width = 0;
    let mut end = last;
    for (i, c, font) in m.styled_chars(first, last) {
        let dw = m.char_width(i, c, font, width);
        if i > first && width + dw > p.line_width {
            end = i - 1;
            break;
        }
        width += dw;
    }
    (end - first + 1, width)
}
