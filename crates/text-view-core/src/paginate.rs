//! Page breaks and printing.
//!
//! [`paginate`] cuts the stacked line heights into page-sized slices. [`TextView::print`] drives a
//! [`PagePrinter`] through a whole job: it re-wraps the text to the page width, reserves the host's
//! header and footer, and hands each slice to the printer.

use crate::Coordinate;
use crate::buffer::TextBuffer;
use crate::error::CollaboratorError;
use crate::host::TextViewHost;
use crate::layout::LineGeometry;
use crate::run_array::RunArray;
use crate::view::{RIGHT_MARGIN_WIDTH, TextView};
use tracing::{debug, trace, warn};

/// Printable area of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageSize {
    /// Width available for text.
    pub width: Coordinate,
    /// Height available for header, text and footer.
    pub height: Coordinate,
}

/// One page's share of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    /// 1-based page number.
    pub page: usize,
    /// Content y where the page starts.
    pub top: Coordinate,
    /// Content y where the page ends (exclusive).
    pub bottom: Coordinate,
    /// First visual line touching the page.
    pub first_line: usize,
    /// Last visual line touching the page.
    pub last_line: usize,
}

impl PageSlice {
    /// Height of the slice.
    pub fn height(&self) -> Coordinate {
        self.bottom - self.top
    }
}

/// A print device.
pub trait PagePrinter {
    /// Printable area of each page.
    fn page_size(&self) -> PageSize;

    /// Start the job. `Ok(false)` means the user cancelled.
    fn open_document(&mut self) -> Result<bool, CollaboratorError>;

    /// Start the next page. `Ok(false)` means the user cancelled.
    fn new_page(&mut self) -> Result<bool, CollaboratorError>;

    /// Keep the top `height` of the page out of the text area.
    fn lock_header(&mut self, _height: Coordinate) {}

    /// Keep the bottom `height` of the page out of the text area.
    fn lock_footer(&mut self, _height: Coordinate) {}

    /// Render the content between `slice.top` and `slice.bottom` on the current page.
    fn print_slice(&mut self, slice: &PageSlice) -> Result<(), CollaboratorError>;

    /// Finish the job.
    fn close_document(&mut self) -> Result<(), CollaboratorError>;
}

/// How a print job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintOutcome {
    /// Every page was printed.
    Completed {
        /// Number of pages.
        pages: usize,
    },
    /// The printer cancelled the job.
    Cancelled,
}

/// Page breaks for lines stacked with `geometry`, at most `page_height` apart.
///
/// The first break is 0 and the last is the total height. A page ends before the line that does
/// not fit, unless that line is alone on the page; such a line is cut into page-sized pieces and
/// its remainder starts the next page.
pub fn paginate(geometry: &RunArray<LineGeometry>, page_height: Coordinate) -> Vec<Coordinate> {
    let page_height = page_height.max(1);
    let heights: Vec<Coordinate> = geometry.iter().map(|g| g.height).collect();
    let count = heights.len();

    let mut breaks = vec![0];
    let mut top = 0;
    let mut i = 0;
    let mut h = 0;
    loop {
        let carried = h > 0;
        let mut added = 0;
        let mut last = 0;
        while i < count && h <= page_height {
            last = heights[i];
            h += last;
            i += 1;
            added += 1;
        }

        let page_h = if h > page_height && (added > 1 || (carried && added > 0)) {
            // the last line starts the next page
            i -= 1;
            let page_h = h - last;
            h = 0;
            page_h
        } else if h > page_height {
            // a line taller than a page
            h -= page_height;
            page_height
        } else {
            let page_h = h;
            h = 0;
            page_h
        };

        top += page_h;
        breaks.push(top);
        if i >= count && h <= 0 {
            break;
        }
    }
    trace!(?breaks, page_height, "page breaks");
    breaks
}

impl<H: TextViewHost> TextView<H> {
    /// Whether a print job is running.
    pub fn is_printing(&self) -> bool {
        self.printing
    }

    /// Print the whole text on `printer`.
    ///
    /// The text is re-wrapped to the page width for the duration of the job. Width, wrap mode and
    /// focus are restored however the job ends.
    pub fn print(
        &mut self,
        buf: &mut dyn TextBuffer,
        printer: &mut dyn PagePrinter,
    ) -> Result<PrintOutcome, CollaboratorError> {
        self.sync(buf);
        self.printing = true;
        match printer.open_document() {
            Ok(true) => {}
            Ok(false) => {
                self.printing = false;
                debug!("print job cancelled before the first page");
                return Ok(PrintOutcome::Cancelled);
            }
            Err(err) => {
                self.printing = false;
                warn!(%err, "print job could not start");
                return Err(err);
            }
        }

        let saved_active = self.active;
        let saved_wrap = self.config.wrap_mode;
        let saved_bounds = self.bounds_width + self.config.left_margin_width + RIGHT_MARGIN_WIDTH;
        self.deactivate();

        let result = self.print_pages(&*buf, printer);

        self.printing = false;
        if self.config.wrap_mode != saved_wrap {
            self.set_wrap_mode(&*buf, saved_wrap);
        }
        self.set_bounds_width(&*buf, saved_bounds);
        if saved_active {
            self.activate();
        }
        result.inspect_err(|err| warn!(%err, "print job failed"))
    }

    fn print_pages(
        &mut self,
        buf: &dyn TextBuffer,
        printer: &mut dyn PagePrinter,
    ) -> Result<PrintOutcome, CollaboratorError> {
        let page = printer.page_size();
        let header = self.host.print_header_height(page).max(0);
        let footer = self.host.print_footer_height(page).max(0);
        let body = page.height - header - footer;
        if body <= 0 {
            return Err(CollaboratorError::Print(format!(
                "page height {} leaves no room for text after a {header} header and {footer} footer",
                page.height
            )));
        }

        self.set_bounds_width(buf, page.width);
        let breaks = paginate(self.layout.geometry(), body);
        let pages = breaks.len() - 1;
        debug!(pages, width = page.width, "printing");

        for (i, pair) in breaks.windows(2).enumerate() {
            let number = i + 1;
            if !printer.new_page()? {
                debug!(page = number, "print job cancelled");
                return Ok(PrintOutcome::Cancelled);
            }
            if header > 0 {
                self.host.draw_print_header(printer, number, header);
                printer.lock_header(header);
            }
            if footer > 0 {
                self.host.draw_print_footer(printer, number, footer);
                printer.lock_footer(footer);
            }
            let (top, bottom) = (pair[0], pair[1]);
            let slice = PageSlice {
                page: number,
                top,
                bottom,
                first_line: self.layout.line_at_y(top),
                last_line: self.layout.line_at_y((bottom - 1).max(top)),
            };
            printer.print_slice(&slice)?;
        }

        printer.close_document()?;
        Ok(PrintOutcome::Completed { pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ViewConfig, WrapMode};
    use crate::font::{Font, MonospaceMetrics};
    use crate::host::HeadlessHost;
    use crate::styled_text::StyledText;

    fn geometry(heights: &[Coordinate]) -> RunArray<LineGeometry> {
        let mut g = RunArray::new();
        for &h in heights {
            g.push(LineGeometry::new(h, h * 4 / 5));
        }
        g
    }

    #[derive(Default)]
    struct RecordingPrinter {
        size: PageSize,
        slices: Vec<PageSlice>,
        headers: Vec<Coordinate>,
        cancel_after: Option<usize>,
        fail_on: Option<usize>,
        closed: bool,
    }

    impl PagePrinter for RecordingPrinter {
        fn page_size(&self) -> PageSize {
            self.size
        }

        fn open_document(&mut self) -> Result<bool, CollaboratorError> {
            Ok(true)
        }

        fn new_page(&mut self) -> Result<bool, CollaboratorError> {
            Ok(self.cancel_after != Some(self.slices.len()))
        }

        fn lock_header(&mut self, height: Coordinate) {
            self.headers.push(height);
        }

        fn print_slice(&mut self, slice: &PageSlice) -> Result<(), CollaboratorError> {
            if self.fail_on == Some(slice.page) {
                return Err(CollaboratorError::Print("out of paper".into()));
            }
            self.slices.push(*slice);
            Ok(())
        }

        fn close_document(&mut self) -> Result<(), CollaboratorError> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn uniform_lines_back_off() {
        let breaks = paginate(&geometry(&[15; 10]), 50);
        assert_eq!(breaks, vec![0, 45, 90, 135, 150]);
    }

    #[test]
    fn exact_fit_has_no_residual() {
        assert_eq!(paginate(&geometry(&[25, 25]), 50), vec![0, 50]);
    }

    #[test]
    fn oversized_line_is_split() {
        let breaks = paginate(&geometry(&[15, 120, 15]), 50);
        assert_eq!(breaks, vec![0, 15, 65, 115, 150]);
    }

    #[test]
    fn oversized_line_after_back_off() {
        let breaks = paginate(&geometry(&[30, 30, 120]), 50);
        assert_eq!(breaks, vec![0, 30, 60, 110, 160, 180]);
    }

    #[test]
    fn print_whole_text() {
        let text = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut buf = StyledText::new(&text, Font::default());
        let mut host = HeadlessHost::new();
        host.print_header = 5;
        let mut view = TextView::new(&mut buf, host, MonospaceMetrics::new(10), ViewConfig::default());
        view.activate();

        let mut printer = RecordingPrinter {
            size: PageSize {
                width: 300,
                height: 50,
            },
            ..RecordingPrinter::default()
        };
        let outcome = view.print(&mut buf, &mut printer).unwrap();
        assert_eq!(outcome, PrintOutcome::Completed { pages: 4 });
        assert!(printer.closed);
        assert_eq!(printer.headers, vec![5; 4]);
        assert_eq!(view.host().decorated_pages, vec![1, 2, 3, 4]);
        assert_eq!(printer.slices[0].first_line, 1);
        assert_eq!(printer.slices[0].last_line, 3);
        assert_eq!(printer.slices[3].bottom, view.layout().height());
        assert!(view.is_active());
        assert!(!view.is_printing());
        assert_eq!(view.config().wrap_mode, WrapMode::Word);
        assert_eq!(view.config().line_width, 640);
    }

    #[test]
    fn cancelled_job_restores_width() {
        let mut buf = StyledText::new("one\ntwo\nthree\nfour", Font::default());
        let mut view = TextView::new(
            &mut buf,
            HeadlessHost::new(),
            MonospaceMetrics::new(10),
            ViewConfig::default(),
        );
        let mut printer = RecordingPrinter {
            size: PageSize {
                width: 100,
                height: 20,
            },
            cancel_after: Some(2),
            ..RecordingPrinter::default()
        };
        let outcome = view.print(&mut buf, &mut printer).unwrap();
        assert_eq!(outcome, PrintOutcome::Cancelled);
        assert_eq!(printer.slices.len(), 2);
        assert!(!printer.closed);
        assert_eq!(view.config().line_width, 640);
    }

    #[test]
    fn failed_job_reports_error() {
        let mut buf = StyledText::new("one\ntwo\nthree", Font::default());
        let mut view = TextView::new(
            &mut buf,
            HeadlessHost::new(),
            MonospaceMetrics::new(10),
            ViewConfig::default(),
        );
        view.activate();
        let mut printer = RecordingPrinter {
            size: PageSize {
                width: 100,
                height: 20,
            },
            fail_on: Some(2),
            ..RecordingPrinter::default()
        };
        assert!(view.print(&mut buf, &mut printer).is_err());
        assert!(view.is_active());
        assert!(!view.is_printing());
        assert_eq!(view.config().line_width, 640);
    }

    #[test]
    fn decorations_taller_than_page_fail() {
        let mut buf = StyledText::new("one\ntwo", Font::default());
        let mut host = HeadlessHost::new();
        host.print_header = 30;
        host.print_footer = 20;
        let mut view = TextView::new(&mut buf, host, MonospaceMetrics::new(10), ViewConfig::default());
        let mut printer = RecordingPrinter {
            size: PageSize {
                width: 100,
                height: 50,
            },
            ..RecordingPrinter::default()
        };
        let err = view.print(&mut buf, &mut printer).unwrap_err();
        assert!(matches!(err, CollaboratorError::Print(_)));
        assert!(printer.slices.is_empty());
        assert!(!view.is_printing());
        assert_eq!(view.config().line_width, 640);
    }
}
