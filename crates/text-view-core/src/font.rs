//! Fonts and the measurement contract used by layout.

use crate::Coordinate;
use unicode_width::UnicodeWidthChar;

/// Packed `0xRRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub u32);

/// Style attributes layered on a font face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontStyle {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Number of underlines (0 = none).
    pub underline_count: u8,
    /// Strike-through.
    pub strike: bool,
    /// Text color.
    pub color: Color,
}

/// A font face, size and style, attached to every character of a styled buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    /// Face name.
    pub name: String,
    /// Point size.
    pub size: u16,
    /// Style attributes.
    pub style: FontStyle,
}

impl Font {
    /// Create a plain font.
    pub fn new(name: impl Into<String>, size: u16) -> Self {
        Self {
            name: name.into(),
            size,
            style: FontStyle::default(),
        }
    }

    /// Copy of this font with a different style.
    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    /// Copy of this font with a different size.
    pub fn with_size(mut self, size: u16) -> Self {
        self.size = size;
        self
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("Monospace", 12)
    }
}

/// Vertical metrics of one font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineMetrics {
    /// Distance from the top of the line to the baseline.
    pub ascent: Coordinate,
    /// Distance from the baseline to the bottom of the line.
    pub descent: Coordinate,
}

impl LineMetrics {
    /// Total line height.
    pub fn height(&self) -> Coordinate {
        self.ascent + self.descent
    }
}

/// Measures characters for layout.
///
/// Implemented by the rendering side; layout never shapes text itself.
pub trait FontMetrics {
    /// Advance width of `ch` drawn in `font`. Tabs are never passed here.
    fn char_width(&self, font: &Font, ch: char) -> Coordinate;

    /// Ascent and descent of `font`.
    fn line_metrics(&self, font: &Font) -> LineMetrics;

    /// Width of a string drawn in a single font.
    fn string_width(&self, font: &Font, text: &str) -> Coordinate {
        text.chars().map(|ch| self.char_width(font, ch)).sum()
    }
}

/// Fixed cell-grid metrics.
///
/// Every character is `cell_width` times its UAX #11 column width; the line height is derived
/// from the point size (`ascent = size`, `descent = ceil(size / 4)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMetrics {
    /// Pixel width of one cell.
    pub cell_width: Coordinate,
}

impl MonospaceMetrics {
    /// Create metrics with the given cell width.
    pub fn new(cell_width: Coordinate) -> Self {
        Self { cell_width }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { cell_width: 8 }
    }
}

impl FontMetrics for MonospaceMetrics {
    fn char_width(&self, _font: &Font, ch: char) -> Coordinate {
        if ch == '\n' {
            return 0;
        }
        let cells = UnicodeWidthChar::width(ch).unwrap_or(1);
        self.cell_width * cells as Coordinate
    }

    fn line_metrics(&self, font: &Font) -> LineMetrics {
        let size = Coordinate::from(font.size);
        LineMetrics {
            ascent: size,
            descent: (size + 3) / 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monospace_widths() {
        let m = MonospaceMetrics::new(10);
        let f = Font::default();
        assert_eq!(m.char_width(&f, 'a'), 10);
        assert_eq!(m.char_width(&f, '中'), 20);
        assert_eq!(m.char_width(&f, '\n'), 0);
        assert_eq!(m.string_width(&f, "ab中"), 40);
    }

    #[test]
    fn monospace_line_metrics_follow_size() {
        let m = MonospaceMetrics::default();
        assert_eq!(m.line_metrics(&Font::default()).height(), 15);
        assert_eq!(
            m.line_metrics(&Font::default().with_size(20)),
            LineMetrics {
                ascent: 20,
                descent: 5
            }
        );
    }
}
