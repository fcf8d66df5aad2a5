//! The text view: layout, caret and selection over a shared buffer.
//!
//! A [`TextView`] observes one [`TextBuffer`] and keeps a [`LayoutCache`] in step with it. The
//! buffer is owned elsewhere and passed into every call; edits made through the view and edits
//! made directly on the buffer both arrive as [`TextChange`] notifications and go through the
//! same relayout path. After changing the buffer directly, call [`TextView::sync`].
//!
//! Exactly one of a caret or a non-empty selection exists at any time; see [`Cursor`].

mod editing;
mod navigation;

use crate::Coordinate;
use crate::buffer::{SubscriberId, TextBuffer, TextChange, TextEdit, WordChars};
use crate::config::{EditorKind, ViewConfig, WrapMode};
use crate::font::{Font, FontMetrics};
use crate::host::{CaretNotice, Rect, ScrollMode, TextViewHost};
use crate::index::{CharacterRange, TextIndex, TextRange};
use crate::interaction::{DragKind, DragState};
use crate::layout::{CaretLocation, LayoutCache, Measure, Point, WrapParams, insertion_font_at};
use tracing::{debug, trace};

/// Blank space kept right of the text so the caret is visible at the end of the widest line.
pub const RIGHT_MARGIN_WIDTH: Coordinate = 2;

/// Caret or selection; never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// An insertion point.
    Caret(CaretLocation),
    /// A non-empty selected span.
    Selection(TextRange),
}

/// Layout and interaction state for one view of a buffer.
pub struct TextView<H: TextViewHost> {
    pub(crate) host: H,
    pub(crate) metrics: Box<dyn FontMetrics>,
    pub(crate) config: ViewConfig,
    pub(crate) subscriber: SubscriberId,
    pub(crate) layout: LayoutCache,
    pub(crate) bounds_width: Coordinate,
    pub(crate) cursor: Cursor,
    pub(crate) caret_x: Coordinate,
    pub(crate) insertion_font: Font,
    pub(crate) selection_pivot: usize,
    pub(crate) word_pivot: CharacterRange,
    pub(crate) line_pivot: usize,
    pub(crate) drag: DragState,
    pub(crate) prev_drag: DragKind,
    pub(crate) drag_source: bool,
    pub(crate) active: bool,
    pub(crate) printing: bool,
}

impl<H: TextViewHost> TextView<H> {
    /// Attach a view to `buf` and lay out its text.
    pub fn new(
        buf: &mut dyn TextBuffer,
        host: H,
        metrics: impl FontMetrics + 'static,
        config: ViewConfig,
    ) -> Self {
        let subscriber = buf.subscribe();
        let mut view = Self {
            host,
            metrics: Box::new(metrics),
            config,
            subscriber,
            layout: LayoutCache::default(),
            bounds_width: config.line_width,
            cursor: Cursor::Caret(CaretLocation::default()),
            caret_x: 0,
            insertion_font: insertion_font_at(&*buf, 1),
            selection_pivot: 1,
            word_pivot: CharacterRange::nothing(),
            line_pivot: 1,
            drag: DragState::default(),
            prev_drag: DragKind::None,
            drag_source: false,
            active: false,
            printing: false,
        };
        view.relayout(&*buf, None, false);
        view
    }

    /// Detach from `buf` and hand back the host.
    pub fn close(self, buf: &mut dyn TextBuffer) -> H {
        buf.unsubscribe(self.subscriber);
        self.host
    }

    /// The hosting widget.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The hosting widget, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current options.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The line layout.
    pub fn layout(&self) -> &LayoutCache {
        &self.layout
    }

    /// Caret or selection.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The caret, when nothing is selected.
    pub fn caret(&self) -> Option<CaretLocation> {
        match self.cursor {
            Cursor::Caret(loc) => Some(loc),
            Cursor::Selection(_) => None,
        }
    }

    /// The selection, when there is one.
    pub fn selection(&self) -> Option<TextRange> {
        match self.cursor {
            Cursor::Caret(_) => None,
            Cursor::Selection(range) => Some(range),
        }
    }

    /// Whether text is selected.
    pub fn has_selection(&self) -> bool {
        matches!(self.cursor, Cursor::Selection(_))
    }

    /// Where typed or pasted text goes.
    pub fn insertion_index(&self) -> TextIndex {
        match self.cursor {
            Cursor::Caret(loc) => loc.index,
            Cursor::Selection(range) => range.start(),
        }
    }

    /// Font newly typed text is drawn in.
    pub fn insertion_font(&self) -> &Font {
        &self.insertion_font
    }

    /// Set the font newly typed text is drawn in.
    pub fn set_insertion_font(&mut self, font: Font) {
        self.insertion_font = font;
    }

    /// Whether the view has focus.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a drag gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.kind != DragKind::None
    }

    /// Granularity of the last finished drag, reused by shift-click.
    pub fn previous_drag_kind(&self) -> DragKind {
        self.prev_drag
    }

    /// Horizontal position vertical caret motion aims for.
    pub fn caret_x(&self) -> Coordinate {
        self.caret_x
    }

    /// Total content width, margins included.
    pub fn content_width(&self) -> Coordinate {
        self.config.left_margin_width + self.layout.width() + RIGHT_MARGIN_WIDTH
    }

    /// Narrowest width that avoids horizontal clipping, margins included.
    pub fn min_preferred_width(&self) -> Coordinate {
        let text = match self.config.wrap_mode {
            WrapMode::LineBreaksOnly => self.layout.width(),
            WrapMode::Word => self.layout.max_word_width(),
        };
        self.config.left_margin_width + text + RIGHT_MARGIN_WIDTH
    }

    // ---- position model -------------------------------------------------------------------

    pub(crate) fn with_measure<R>(&self, buf: &dyn TextBuffer, f: impl FnOnce(&Measure<'_>) -> R) -> R {
        let pitch = self.config.tab_pitch;
        let host = &self.host;
        let tabs = |index: usize, x: Coordinate| host.tab_width(index, x, pitch);
        f(&Measure {
            buf,
            metrics: &*self.metrics,
            tab_width: &tabs,
        })
    }

    /// Caret location for `char_index`, clamped into the text.
    pub fn caret_location(&self, buf: &dyn TextBuffer, char_index: usize) -> CaretLocation {
        self.layout.caret_location(buf, char_index)
    }

    /// Caret location nearest to `pt`, given in view coordinates.
    pub fn pixel_to_caret(&self, buf: &dyn TextBuffer, pt: Point) -> CaretLocation {
        self.locate(buf, self.text_point(pt))
    }

    /// Top-left of the caret at `loc`, in view coordinates.
    pub fn caret_to_pixel(&self, buf: &dyn TextBuffer, loc: CaretLocation) -> Point {
        let pt = self.with_measure(buf, |m| self.layout.caret_to_pixel(m, loc));
        Point::new(pt.x + self.config.left_margin_width, pt.y)
    }

    /// 1-based column of `loc`, counting a tab up to the next tab column.
    pub fn column_for(&self, buf: &dyn TextBuffer, loc: CaretLocation) -> usize {
        let tab = self.config.tab_char_count.max(1);
        let start = self.layout.line_start(loc.line).char_index;
        (start..loc.index.char_index)
            .filter_map(|i| buf.char_at(i))
            .fold(1, |col, c| {
                if c == '\t' {
                    col + tab - (col - 1) % tab
                } else {
                    col + 1
                }
            })
    }

    pub(crate) fn text_point(&self, pt: Point) -> Point {
        Point::new(pt.x - self.config.left_margin_width, pt.y)
    }

    pub(crate) fn locate(&self, buf: &dyn TextBuffer, text_pt: Point) -> CaretLocation {
        self.with_measure(buf, |m| self.layout.pixel_to_caret(m, text_pt))
    }

    pub(crate) fn char_left(&self, buf: &dyn TextBuffer, loc: CaretLocation) -> Coordinate {
        self.with_measure(buf, |m| self.layout.char_left(m, loc))
    }

    pub(crate) fn char_right(&self, buf: &dyn TextBuffer, loc: CaretLocation) -> Coordinate {
        self.with_measure(buf, |m| {
            self.layout.char_left(m, loc) + self.layout.char_width_at(m, loc)
        })
    }

    // ---- relayout ---------------------------------------------------------------------------

    /// Drain pending buffer notifications and bring the layout up to date.
    ///
    /// Edits that did not come through this view move the caret and selection with the text.
    pub fn sync(&mut self, buf: &mut dyn TextBuffer) {
        let changes = buf.take_changes(self.subscriber);
        self.absorb(&*buf, &changes, true);
    }

    pub(crate) fn absorb(&mut self, buf: &dyn TextBuffer, changes: &[TextChange], external: bool) {
        if changes.is_empty() {
            return;
        }
        if external {
            self.follow_changes(buf, changes);
        }
        match changes {
            [TextChange::Edited(edit)] => self.relayout(buf, Some(*edit), external),
            _ => {
                if changes.len() > 1 {
                    debug!(count = changes.len(), "several pending changes, relayout everything");
                }
                if !external && changes.contains(&TextChange::Reset) {
                    self.cursor = Cursor::Caret(CaretLocation::default());
                }
                self.relayout(buf, None, external);
            }
        }
    }

    /// Move caret and selection along with edits made behind the view's back, oldest first.
    fn follow_changes(&mut self, buf: &dyn TextBuffer, changes: &[TextChange]) {
        let (mut first, mut after) = match self.cursor {
            Cursor::Caret(loc) => (loc.index.char_index, loc.index.char_index),
            Cursor::Selection(range) => (range.char_range.first, range.char_range.after()),
        };
        for change in changes {
            match change {
                TextChange::Edited(edit) => {
                    first = shift_past_edit(first, edit);
                    after = shift_past_edit(after, edit);
                }
                TextChange::Reset => {
                    first = 1;
                    after = 1;
                }
                TextChange::DefaultFontChanged => {}
            }
        }

        let len = buf.char_count();
        let first = first.clamp(1, len + 1);
        let last = after.saturating_sub(1).min(len);
        self.cursor = match self.cursor {
            Cursor::Selection(_) if first <= last => Cursor::Selection(buf.range_of(first, last)),
            Cursor::Caret(loc) => {
                let mut moved = loc;
                moved.index.char_index = first;
                Cursor::Caret(moved)
            }
            Cursor::Selection(_) => {
                let mut loc = CaretLocation::default();
                loc.index.char_index = first;
                Cursor::Caret(loc)
            }
        };
    }

    /// Re-break lines after `edit`, or everything when `edit` is `None`.
    pub(crate) fn relayout(&mut self, buf: &dyn TextBuffer, mut edit: Option<TextEdit>, announce: bool) {
        if self.config.wrap_mode == WrapMode::Word && self.config.line_width <= 0 {
            debug!(width = self.config.line_width, "no room to wrap, breaking at line breaks only");
            self.config.wrap_mode = WrapMode::LineBreaksOnly;
            edit = None;
        }

        let r = {
            let pitch = self.config.tab_pitch;
            let host = &self.host;
            let tabs = |index: usize, x: Coordinate| host.tab_width(index, x, pitch);
            let m = Measure {
                buf,
                metrics: &*self.metrics,
                tab_width: &tabs,
            };
            let p = WrapParams::new(self.config.wrap_mode, self.config.line_width, &m);
            match edit {
                Some(e) => self.layout.recalc(
                    &m,
                    &p,
                    e.range.start(),
                    e.range.char_range.count(),
                    e.deletion,
                    e.redraw,
                ),
                None => self.layout.recalc_all(&m, &p),
            }
        };

        self.resolve_cursor(buf, announce);

        if !self.printing {
            let step = if self.layout.geometry().run_count() == 1 {
                self.layout.line_height(1)
            } else {
                self.metrics.line_metrics(buf.default_font()).height()
            };
            self.host.set_vertical_scroll_step(step);

            if self.layout.height() != r.old_height {
                self.refresh_all();
            } else {
                self.refresh_lines(r.first_line, r.last_line);
            }
            self.host.set_content_bounds(
                self.content_width(),
                self.layout.height(),
                r.old_height,
                r.orig_y,
            );
        }

        if self.config.wrap_mode == WrapMode::LineBreaksOnly
            && self.bounds_width > 0
            && self.host.width_beyond_display_capacity(self.layout.width())
        {
            debug!(
                width = self.layout.width(),
                "content too wide to display, switching to word wrap"
            );
            self.config.wrap_mode = WrapMode::Word;
            self.config.line_width = self.bounds_width;
            self.relayout(buf, None, announce);
        }
    }

    /// Recompute byte indices and lines of the caret or selection from their character indices.
    fn resolve_cursor(&mut self, buf: &dyn TextBuffer, announce: bool) {
        let len = buf.char_count();
        match self.cursor {
            Cursor::Caret(loc) => {
                let resolved = self.layout.caret_location(buf, loc.index.char_index);
                self.cursor = Cursor::Caret(resolved);
                if announce && resolved.line != loc.line {
                    self.notify_caret(buf, resolved, true);
                }
            }
            Cursor::Selection(range) => {
                let first = range.char_range.first.max(1);
                let last = range.char_range.last.min(len);
                self.cursor = if first <= last {
                    Cursor::Selection(buf.range_of(first, last))
                } else {
                    Cursor::Caret(self.layout.caret_location(buf, first))
                };
            }
        }
    }

    // ---- configuration ----------------------------------------------------------------------

    /// Change the line breaking mode.
    pub fn set_wrap_mode(&mut self, buf: &dyn TextBuffer, mode: WrapMode) {
        if mode == self.config.wrap_mode {
            return;
        }
        self.config.wrap_mode = mode;
        if mode == WrapMode::Word {
            self.config.line_width = self.bounds_width;
        }
        self.relayout(buf, None, true);
    }

    /// Change the wrap width.
    pub fn set_line_width(&mut self, buf: &dyn TextBuffer, width: Coordinate) {
        self.bounds_width = width;
        if self.config.wrap_mode == WrapMode::Word && width != self.config.line_width {
            self.config.line_width = width;
            self.relayout(buf, None, true);
        }
    }

    /// Notify the view that the widget is now `width` wide, margins included.
    pub fn set_bounds_width(&mut self, buf: &dyn TextBuffer, width: Coordinate) {
        let text_width = width - self.config.left_margin_width - RIGHT_MARGIN_WIDTH;
        if self.config.wrap_mode == WrapMode::Word {
            self.set_line_width(buf, text_width);
        } else {
            self.bounds_width = text_width;
            self.refresh_all();
        }
    }

    /// Change the margin left of the text; the widget width stays the same.
    pub fn set_left_margin_width(&mut self, buf: &dyn TextBuffer, width: Coordinate) {
        let width = width.max(0);
        if width == self.config.left_margin_width {
            return;
        }
        let bounds = self.bounds_width + self.config.left_margin_width + RIGHT_MARGIN_WIDTH;
        self.config.left_margin_width = width;
        self.set_bounds_width(buf, bounds);
    }

    /// Change the tab stop spacing.
    pub fn set_tab_pitch(&mut self, buf: &dyn TextBuffer, pitch: Coordinate) {
        let pitch = pitch.max(1);
        if pitch != self.config.tab_pitch {
            self.config.tab_pitch = pitch;
            self.relayout(buf, None, true);
        }
    }

    /// Change what the user may do.
    pub fn set_kind(&mut self, buf: &mut dyn TextBuffer, kind: EditorKind) {
        self.config.kind = kind;
        if !kind.is_selectable()
            && let Cursor::Selection(range) = self.cursor
        {
            self.set_caret(buf, range.char_range.first);
        }
    }

    /// Copy every new selection to the clipboard.
    pub fn set_copy_when_select(&mut self, enabled: bool) {
        self.config.copy_when_select = enabled;
    }

    /// Keep the styles of pasted text.
    pub fn set_paste_styled_text(&mut self, enabled: bool) {
        self.config.paste_styled_text = enabled;
    }

    /// Allow dragging the selection.
    pub fn set_drag_and_drop(&mut self, enabled: bool) {
        self.config.drag_and_drop = enabled;
    }

    /// Report line and column on every caret move.
    pub fn set_broadcast_caret_location(&mut self, enabled: bool) {
        self.config.broadcast_caret_location = enabled;
    }

    /// Change the word membership test.
    pub fn set_word_chars(&mut self, in_word: WordChars) {
        self.config.is_char_in_word = in_word;
    }

    // ---- caret and selection ----------------------------------------------------------------

    /// Put the caret at `char_index`, clamped into `[1, len + 1]`, and clear the selection.
    pub fn set_caret(&mut self, buf: &mut dyn TextBuffer, char_index: usize) {
        let loc = self.layout.caret_location(&*buf, char_index);
        self.place_caret(buf, loc, true);
    }

    pub(crate) fn place_caret(&mut self, buf: &mut dyn TextBuffer, loc: CaretLocation, end_undo: bool) {
        if self.drag_source {
            return;
        }
        if end_undo {
            buf.end_undo_group();
        }
        let buf = &*buf;

        let previous = self.cursor;
        if let Cursor::Selection(range) = previous {
            self.refresh_range(range.char_range);
        }
        let orig = match previous {
            Cursor::Caret(orig) => Some(orig),
            Cursor::Selection(_) => None,
        };

        self.cursor = Cursor::Caret(loc);
        self.caret_x = self.char_left(buf, loc);
        if orig != Some(loc) || !self.config.paste_styled_text {
            self.insertion_font = insertion_font_at(buf, loc.index.char_index);
        }

        if !self.scroll_to_caret(buf, loc) {
            if let Some(orig) = orig {
                self.refresh_caret(orig);
            }
            self.refresh_caret(loc);
        }

        let line_changed = orig.is_none_or(|orig| orig.line != loc.line);
        self.notify_caret(buf, loc, line_changed);
        if self.active {
            self.host.set_caret_blink(true);
        }
    }

    /// Select characters `first..=last`, clamped into the text.
    ///
    /// An empty range after clamping leaves a caret at `first` instead.
    pub fn set_selection(&mut self, buf: &mut dyn TextBuffer, first: usize, last: usize) {
        self.select(buf, CharacterRange::new(first, last), true);
    }

    /// Select a text range.
    pub fn set_selection_range(&mut self, buf: &mut dyn TextBuffer, range: TextRange) {
        debug_assert_eq!(
            range.char_range.count() == 0,
            range.byte_range.count() == 0,
            "character and byte ranges disagree"
        );
        self.select(buf, range.char_range, true);
    }

    /// Select everything.
    pub fn select_all(&mut self, buf: &mut dyn TextBuffer) {
        let len = buf.char_count();
        if len > 0 {
            self.select(buf, CharacterRange::new(1, len), true);
        }
    }

    pub(crate) fn select(&mut self, buf: &mut dyn TextBuffer, range: CharacterRange, announce: bool) {
        if self.drag_source || !self.config.kind.is_selectable() {
            return;
        }
        buf.end_undo_group();
        self.prev_drag = DragKind::None;

        let len = buf.char_count();
        if len == 0 {
            return;
        }
        let first = range.first.clamp(1, len);
        let last = range.last.min(len);
        if last < first {
            let loc = self.layout.caret_location(&*buf, first);
            self.place_caret(buf, loc, false);
            return;
        }

        let new = buf.range_of(first, last);
        let previous = self.cursor;
        if previous == Cursor::Selection(new) {
            return;
        }
        self.cursor = Cursor::Selection(new);
        trace!(first, last, "selection changed");

        let new_start_line = self.layout.line_for_char(first);
        let new_end_line = self.layout.line_for_char(last);
        if announce {
            let loc = CaretLocation::new(new.start(), new_start_line);
            self.notify_caret(&*buf, loc, true);
        }
        self.host.set_caret_blink(false);

        if self.config.copy_when_select && self.config.kind != EditorKind::StaticText {
            // failures are logged by copy
            let _ = self.copy(&*buf);
        }

        match previous {
            Cursor::Selection(old) if old.char_range.first == first => {
                let old_end_line = self.layout.line_for_char(old.char_range.last);
                self.refresh_lines(old_end_line.min(new_end_line), old_end_line.max(new_end_line));
            }
            Cursor::Selection(old) if old.char_range.last == last => {
                let old_start_line = self.layout.line_for_char(old.char_range.first);
                self.refresh_lines(
                    old_start_line.min(new_start_line),
                    old_start_line.max(new_start_line),
                );
            }
            Cursor::Selection(old) => {
                self.refresh_range(old.char_range);
                self.refresh_lines(new_start_line, new_end_line);
            }
            Cursor::Caret(orig) => {
                self.refresh_caret(orig);
                self.refresh_lines(new_start_line, new_end_line);
            }
        }
    }

    pub(crate) fn notify_caret(&mut self, buf: &dyn TextBuffer, loc: CaretLocation, line_changed: bool) {
        if self.printing {
            return;
        }
        if self.config.broadcast_caret_location {
            let column = self.column_for(buf, loc);
            self.host.caret_moved(CaretNotice::LocationChanged {
                line: loc.line,
                column,
            });
        } else if line_changed {
            self.host
                .caret_moved(CaretNotice::LineChanged { line: loc.line });
        }
    }

    // ---- activation -------------------------------------------------------------------------

    /// Give the view focus: show the caret or selection.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.host.set_caret_blink(self.caret().is_some());
        self.refresh_cursor();
    }

    /// Take focus away: hide the caret and dim the selection.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.host.set_caret_blink(false);
        self.refresh_cursor();
    }

    // ---- scrolling and repaint --------------------------------------------------------------

    /// Rectangle enclosing the caret at `loc`, widened to the left margin so it scrolls into view.
    pub fn caret_rect(&self, buf: &dyn TextBuffer, loc: CaretLocation) -> Rect {
        let top = self.layout.line_top(loc.line);
        let left = self.char_left(buf, loc);
        Rect::new(
            top,
            left,
            top + self.layout.line_height(loc.line),
            left + self.config.left_margin_width + RIGHT_MARGIN_WIDTH,
        )
    }

    fn scroll_to_caret(&mut self, buf: &dyn TextBuffer, loc: CaretLocation) -> bool {
        if self.printing {
            return false;
        }
        let rect = self.caret_rect(buf, loc);
        self.host.scroll_to_rect(rect, ScrollMode::IfNeeded)
    }

    /// Bring the selection, or the caret, into view.
    pub fn scroll_to_selection(&mut self, buf: &dyn TextBuffer, center: bool) -> bool {
        let mode = if center {
            ScrollMode::Center
        } else {
            ScrollMode::IfNeeded
        };
        let rect = match self.cursor {
            Cursor::Caret(loc) => self.caret_rect(buf, loc),
            Cursor::Selection(range) => {
                let start = self.layout.caret_location(buf, range.char_range.first);
                let end = self.layout.caret_location(buf, range.char_range.last);
                let top = self.layout.line_top(start.line);
                let bottom = self.layout.line_top(end.line) + self.layout.line_height(end.line);
                if start.line == end.line {
                    let margin = self.config.left_margin_width;
                    Rect::new(
                        top,
                        self.char_left(buf, start) + margin,
                        bottom,
                        self.char_right(buf, end) + margin,
                    )
                } else {
                    Rect::new(top, 0, bottom, self.content_width())
                }
            }
        };
        self.host.scroll_to_rect(rect, mode)
    }

    fn content_right(&self) -> Coordinate {
        self.config.left_margin_width
            + self.bounds_width.max(self.layout.width())
            + RIGHT_MARGIN_WIDTH
    }

    pub(crate) fn refresh_lines(&mut self, first: usize, last: usize) {
        if self.printing {
            return;
        }
        let top = self.layout.line_top(first);
        let bottom = self.layout.line_top(last) + self.layout.line_height(last);
        let right = self.content_right();
        self.host.refresh_rect(Rect::new(top, 0, bottom, right));
    }

    pub(crate) fn refresh_range(&mut self, range: CharacterRange) {
        let first = self.layout.line_for_char(range.first);
        let last = self.layout.line_for_char(range.last);
        self.refresh_lines(first, last);
    }

    pub(crate) fn refresh_caret(&mut self, loc: CaretLocation) {
        if loc.line >= 1 && loc.line <= self.layout.line_count() {
            self.refresh_lines(loc.line, loc.line);
        }
    }

    fn refresh_cursor(&mut self) {
        match self.cursor {
            Cursor::Caret(loc) => self.refresh_caret(loc),
            Cursor::Selection(range) => self.refresh_range(range.char_range),
        }
    }

    pub(crate) fn refresh_all(&mut self) {
        if self.printing {
            return;
        }
        let rect = Rect::new(0, 0, self.layout.height(), self.content_right());
        self.host.refresh_rect(rect);
    }
}

/// Where character position `i` ends up after `edit`.
///
/// Positions inside removed text collapse to the edit start; a position exactly at an insertion
/// point stays in front of the inserted text.
fn shift_past_edit(i: usize, edit: &TextEdit) -> usize {
    let start = edit.range.char_range.first.max(1);
    let removed = edit.removed.char_count;
    if i < start {
        i
    } else if i >= start + removed && (removed > 0 || i > start) {
        i - removed + edit.inserted_chars()
    } else {
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::MonospaceMetrics;
    use crate::host::HeadlessHost;
    use crate::styled_text::StyledText;
    use crate::undo::UndoMode;

    fn view(text: &str, width: Coordinate) -> (StyledText, TextView<HeadlessHost>) {
        let mut buf = StyledText::new(text, Font::default());
        let config = ViewConfig {
            line_width: width,
            ..ViewConfig::default()
        };
        let view = TextView::new(&mut buf, HeadlessHost::new(), MonospaceMetrics::new(10), config);
        (buf, view)
    }

    #[test]
    fn new_view_reports_bounds() {
        let (_, view) = view("hello world", 60);
        assert_eq!(view.layout().line_count(), 2);
        assert_eq!(view.host().bounds, Some((62, 30)));
        assert_eq!(view.caret().map(|c| c.index), Some(TextIndex::START));
    }

    #[test]
    fn caret_and_selection_are_exclusive() {
        let (mut buf, mut view) = view("hello world", 200);
        view.set_selection(&mut buf, 3, 7);
        assert!(view.caret().is_none());
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(3, 7)));
        view.set_caret(&mut buf, 4);
        assert!(view.selection().is_none());
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(4));
    }

    #[test]
    fn pending_edits_move_selection_in_order() {
        let (mut buf, mut view) = view("one two three", 1000);
        view.set_selection(&mut buf, 9, 13);
        buf.set_font(buf.range_of(1, 3), &Font::default().with_size(20));
        buf.insert(buf.index_at(1), "zero ", &Font::default(), UndoMode::Standalone);
        buf.delete(buf.range_of(6, 9), UndoMode::Standalone);
        view.sync(&mut buf);
        assert_eq!(buf.to_string(), "zero two three");
        assert_eq!(view.selection().map(|r| buf.text(r)), Some("three".to_string()));
    }

    #[test]
    fn pending_deletion_collapses_selection() {
        let (mut buf, mut view) = view("abcdefgh", 1000);
        view.set_selection(&mut buf, 3, 5);
        buf.insert(buf.index_at(9), "!", &Font::default(), UndoMode::Standalone);
        buf.delete(buf.range_of(2, 6), UndoMode::Standalone);
        view.sync(&mut buf);
        assert_eq!(buf.to_string(), "agh!");
        assert!(view.selection().is_none());
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(2));
    }

    #[test]
    fn caret_is_clamped() {
        let (mut buf, mut view) = view("abc", 200);
        view.set_caret(&mut buf, 99);
        assert_eq!(view.caret().map(|c| c.index), Some(TextIndex::new(4, 4)));
        view.set_caret(&mut buf, 0);
        assert_eq!(view.caret().map(|c| c.index), Some(TextIndex::START));
    }

    #[test]
    fn empty_selection_collapses_to_caret() {
        let (mut buf, mut view) = view("abc", 200);
        view.set_selection(&mut buf, 3, 2);
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(3));
    }

    #[test]
    fn external_edits_move_the_caret() {
        let (mut buf, mut view) = view("hello world", 200);
        view.set_caret(&mut buf, 7);
        buf.insert(TextIndex::START, ">> ", &Font::default(), UndoMode::Standalone);
        view.sync(&mut buf);
        assert_eq!(view.caret().map(|c| c.index), Some(TextIndex::new(10, 10)));

        view.set_selection(&mut buf, 10, 14);
        let range = buf.range_of(1, 3);
        buf.delete(range, UndoMode::Standalone);
        view.sync(&mut buf);
        assert_eq!(view.selection().map(|r| r.char_range), Some(CharacterRange::new(7, 11)));
    }

    #[test]
    fn external_delete_over_selection_leaves_caret() {
        let (mut buf, mut view) = view("hello world", 200);
        view.set_selection(&mut buf, 3, 5);
        let range = buf.range_of(2, 8);
        buf.delete(range, UndoMode::Standalone);
        view.sync(&mut buf);
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(2));
    }

    #[test]
    fn restyle_does_not_move_caret() {
        let (mut buf, mut view) = view("hello world", 200);
        view.set_caret(&mut buf, 9);
        let range = buf.range_of(1, 5);
        buf.set_font(range, &Font::default().with_size(20));
        view.sync(&mut buf);
        assert_eq!(view.caret().map(|c| c.index.char_index), Some(9));
        assert_eq!(view.layout().line_height(1), 25);
    }

    #[test]
    fn line_change_notices() {
        let (mut buf, mut view) = view("one\ntwo\n", 200);
        view.host_mut().clear_records();
        view.set_caret(&mut buf, 2);
        view.set_caret(&mut buf, 5);
        view.set_caret(&mut buf, 6);
        view.set_caret(&mut buf, 9);
        assert_eq!(
            view.host().notices,
            vec![
                CaretNotice::LineChanged { line: 2 },
                CaretNotice::LineChanged { line: 3 },
            ]
        );
    }

    #[test]
    fn location_notices_count_tab_columns() {
        let (mut buf, mut view) = view("a\tb", 400);
        view.set_broadcast_caret_location(true);
        view.host_mut().clear_records();
        view.set_caret(&mut buf, 3);
        view.set_caret(&mut buf, 4);
        assert_eq!(
            view.host().notices,
            vec![
                CaretNotice::LocationChanged { line: 1, column: 9 },
                CaretNotice::LocationChanged { line: 1, column: 10 },
            ]
        );
    }

    #[test]
    fn wide_content_switches_to_word_wrap() {
        let mut buf = StyledText::new(&"x".repeat(50), Font::default());
        let mut host = HeadlessHost::new();
        host.display_capacity = Some(300);
        let config = ViewConfig {
            wrap_mode: WrapMode::LineBreaksOnly,
            line_width: 200,
            ..ViewConfig::default()
        };
        let view = TextView::new(&mut buf, host, MonospaceMetrics::new(10), config);
        assert_eq!(view.config().wrap_mode, WrapMode::Word);
        assert_eq!(view.layout().line_count(), 3);
    }

    #[test]
    fn zero_width_falls_back_to_line_breaks() {
        let (_, view) = view("a b c\nd", 0);
        assert_eq!(view.config().wrap_mode, WrapMode::LineBreaksOnly);
        assert_eq!(view.layout().line_count(), 2);
    }

    #[test]
    fn bounds_width_rewraps() {
        let (buf, mut view) = view("aaa bbb ccc", 200);
        assert_eq!(view.layout().line_count(), 1);
        view.set_bounds_width(&buf, 42 + RIGHT_MARGIN_WIDTH);
        assert_eq!(view.layout().line_count(), 3);
    }

    #[test]
    fn pixel_mapping_accounts_for_margin() {
        let mut buf = StyledText::new("abcd", Font::default());
        let config = ViewConfig {
            left_margin_width: 20,
            ..ViewConfig::default()
        };
        let view = TextView::new(&mut buf, HeadlessHost::new(), MonospaceMetrics::new(10), config);
        let loc = view.caret_location(&buf, 3);
        assert_eq!(view.caret_to_pixel(&buf, loc), Point::new(40, 0));
        assert_eq!(view.pixel_to_caret(&buf, Point::new(40, 3)).index.char_index, 3);
    }
}
