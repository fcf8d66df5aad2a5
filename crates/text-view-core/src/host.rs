//! Capabilities the hosting widget provides to a view.
//!
//! The view never draws, scrolls or talks to the platform itself; it asks its host through
//! [`TextViewHost`]. [`HeadlessHost`] records every request and keeps an in-memory clipboard,
//! which is enough to drive a view without any windowing system.

use crate::Coordinate;
use crate::buffer::StyledString;
use crate::config::default_tab_width;
use crate::error::CollaboratorError;
use crate::layout::Point;
use crate::paginate::{PagePrinter, PageSize};

/// Axis-aligned rectangle in view coordinates; `bottom` and `right` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Top edge.
    pub top: Coordinate,
    /// Left edge.
    pub left: Coordinate,
    /// Bottom edge (exclusive).
    pub bottom: Coordinate,
    /// Right edge (exclusive).
    pub right: Coordinate,
}

impl Rect {
    /// Create a rectangle from its edges.
    pub fn new(top: Coordinate, left: Coordinate, bottom: Coordinate, right: Coordinate) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Rectangle spanning `width` x `height` from `origin`.
    pub fn at(origin: Point, width: Coordinate, height: Coordinate) -> Self {
        Self::new(origin.y, origin.x, origin.y + height, origin.x + width)
    }
}

/// How eagerly to scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Scroll only when the target is not already visible.
    IfNeeded,
    /// Center the target in the visible area.
    Center,
}

/// Caret movement report.
///
/// A view sends exactly one kind, chosen by [`crate::ViewConfig::broadcast_caret_location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretNotice {
    /// The caret moved to another line.
    LineChanged {
        /// 1-based visual line.
        line: usize,
    },
    /// The caret moved.
    LocationChanged {
        /// 1-based visual line.
        line: usize,
        /// 1-based column, counting tabs up to the next tab column.
        column: usize,
    },
}

/// Services a hosting widget provides.
pub trait TextViewHost {
    /// Repaint `rect` at the next opportunity.
    fn refresh_rect(&mut self, rect: Rect);

    /// The content size changed. `orig_height` is the previous height and `change_y` the top of
    /// the first line that moved, so the host can keep the scroll position stable.
    fn set_content_bounds(
        &mut self,
        _width: Coordinate,
        _height: Coordinate,
        _orig_height: Coordinate,
        _change_y: Coordinate,
    ) {
    }

    /// Scroll step that matches the line height when all lines are equally tall.
    fn set_vertical_scroll_step(&mut self, _step: Coordinate) {}

    /// Whether `width` exceeds the coordinate range the rendering system can handle.
    fn width_beyond_display_capacity(&self, width: Coordinate) -> bool {
        width > Coordinate::from(i16::MAX)
    }

    /// Height of the visible part of the view, used for paging.
    fn visible_height(&self) -> Option<Coordinate> {
        None
    }

    /// Bring `rect` into view. Returns whether scrolling happened.
    fn scroll_to_rect(&mut self, _rect: Rect, _mode: ScrollMode) -> bool {
        false
    }

    /// Turn caret blinking on or off.
    fn set_caret_blink(&mut self, _enabled: bool) {}

    /// Put styled text on the platform clipboard.
    fn write_clipboard(&mut self, data: &StyledString) -> Result<(), CollaboratorError>;

    /// Read the platform clipboard.
    fn read_clipboard(&mut self) -> Result<Option<StyledString>, CollaboratorError>;

    /// Start a platform drag-and-drop session for the selection. Returns `false` when the platform
    /// declines, in which case the view handles the drag locally.
    fn begin_drag_and_drop(&mut self, _pt: Point) -> bool {
        false
    }

    /// Data carried by a drag from another source.
    fn drop_payload(&mut self) -> Result<Option<StyledString>, CollaboratorError> {
        Ok(None)
    }

    /// Caret movement report.
    fn caret_moved(&mut self, _notice: CaretNotice) {}

    /// Width of the tab at `char_index` when it starts at `x`.
    fn tab_width(&self, _char_index: usize, x: Coordinate, pitch: Coordinate) -> Coordinate {
        default_tab_width(x, pitch)
    }

    /// Height reserved for a page header.
    fn print_header_height(&self, _page: PageSize) -> Coordinate {
        0
    }

    /// Height reserved for a page footer.
    fn print_footer_height(&self, _page: PageSize) -> Coordinate {
        0
    }

    /// Draw the header of `page` (1-based).
    fn draw_print_header(&mut self, _printer: &mut dyn PagePrinter, _page: usize, _height: Coordinate) {}

    /// Draw the footer of `page` (1-based).
    fn draw_print_footer(&mut self, _printer: &mut dyn PagePrinter, _page: usize, _height: Coordinate) {}
}

/// A host without a screen.
///
/// Keeps the clipboard in memory and records what the view asked for.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    /// Rectangles marked for repaint.
    pub refreshed: Vec<Rect>,
    /// Last content bounds reported, as `(width, height)`.
    pub bounds: Option<(Coordinate, Coordinate)>,
    /// Scroll requests.
    pub scrolls: Vec<(Rect, ScrollMode)>,
    /// Caret reports.
    pub notices: Vec<CaretNotice>,
    /// Current blink state.
    pub caret_blink: bool,
    /// In-memory clipboard.
    pub clipboard: Option<StyledString>,
    /// Whether [`TextViewHost::begin_drag_and_drop`] accepts.
    pub accept_platform_drag: bool,
    /// Number of platform drag sessions started.
    pub drags_started: usize,
    /// Data delivered by a foreign drop.
    pub foreign_drop: Option<StyledString>,
    /// Widest content the host claims to render.
    pub display_capacity: Option<Coordinate>,
    /// Visible height reported for paging.
    pub page_height: Option<Coordinate>,
    /// Height reserved for each printed page header.
    pub print_header: Coordinate,
    /// Height reserved for each printed page footer.
    pub print_footer: Coordinate,
    /// Pages whose header and footer were drawn.
    pub decorated_pages: Vec<usize>,
}

impl HeadlessHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget recorded requests.
    pub fn clear_records(&mut self) {
        self.refreshed.clear();
        self.scrolls.clear();
        self.notices.clear();
    }
}

impl TextViewHost for HeadlessHost {
    fn refresh_rect(&mut self, rect: Rect) {
        self.refreshed.push(rect);
    }

    fn set_content_bounds(
        &mut self,
        width: Coordinate,
        height: Coordinate,
        _orig_height: Coordinate,
        _change_y: Coordinate,
    ) {
        self.bounds = Some((width, height));
    }

    fn width_beyond_display_capacity(&self, width: Coordinate) -> bool {
        match self.display_capacity {
            Some(capacity) => width > capacity,
            None => width > Coordinate::from(i16::MAX),
        }
    }

    fn visible_height(&self) -> Option<Coordinate> {
        self.page_height
    }

    fn scroll_to_rect(&mut self, rect: Rect, mode: ScrollMode) -> bool {
        self.scrolls.push((rect, mode));
        false
    }

    fn set_caret_blink(&mut self, enabled: bool) {
        self.caret_blink = enabled;
    }

    fn write_clipboard(&mut self, data: &StyledString) -> Result<(), CollaboratorError> {
        self.clipboard = Some(data.clone());
        Ok(())
    }

    fn read_clipboard(&mut self) -> Result<Option<StyledString>, CollaboratorError> {
        Ok(self.clipboard.clone())
    }

    fn begin_drag_and_drop(&mut self, _pt: Point) -> bool {
        if self.accept_platform_drag {
            self.drags_started += 1;
        }
        self.accept_platform_drag
    }

    fn drop_payload(&mut self) -> Result<Option<StyledString>, CollaboratorError> {
        Ok(self.foreign_drop.take())
    }

    fn caret_moved(&mut self, notice: CaretNotice) {
        self.notices.push(notice);
    }

    fn print_header_height(&self, _page: PageSize) -> Coordinate {
        self.print_header
    }

    fn print_footer_height(&self, _page: PageSize) -> Coordinate {
        self.print_footer
    }

    fn draw_print_header(&mut self, _printer: &mut dyn PagePrinter, page: usize, _height: Coordinate) {
        self.decorated_pages.push(page);
    }
}
