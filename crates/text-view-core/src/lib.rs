#![warn(missing_docs)]
//! Text View Core - Headless Styled Text Layout and Interaction Engine
//!
//! # Overview
//!
//! `text-view-core` is the engine behind an editable, word-wrapping text widget with per-character
//! fonts. It owns line layout, caret and selection state, mouse/keyboard/drag-and-drop interaction,
//! search and replace coordination and print pagination. It never draws; everything it needs from
//! the surrounding widget goes through the [`TextViewHost`] trait.
//!
//! # Core Features
//!
//! - **Incremental Layout**: edits re-break only the affected lines, then shift the rest
//! - **Two Addressing Schemes**: every position carries both a character and a UTF-8 byte index
//! - **Pixel Mapping**: nearest-boundary mapping between points and caret locations
//! - **Selection State Machine**: character, word and line granularity with shift-extension
//! - **Drag and Drop**: local moves and copies, platform sessions through the host
//! - **Shared Buffers**: several views observe one [`TextBuffer`] through change queues
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Interaction (mouse, keyboard, DnD)         │  ← Input
//! ├─────────────────────────────────────────────┤
//! │  Find / Replace, Pagination                 │  ← Commands
//! ├─────────────────────────────────────────────┤
//! │  TextView (caret & selection, editing)      │  ← State
//! ├─────────────────────────────────────────────┤
//! │  Layout Cache + Relayout                    │  ← Line Breaking
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer (StyledText: rope + font runs)  │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use text_view_core::{Font, HeadlessHost, MonospaceMetrics, StyledText, TextBuffer, TextView, ViewConfig};
//!
//! let mut text = StyledText::new("hello world", Font::default());
//! let config = ViewConfig {
//!     line_width: 60,
//!     ..ViewConfig::default()
//! };
//! let mut view = TextView::new(&mut text, HeadlessHost::new(), MonospaceMetrics::new(10), config);
//!
//! // "hello " fits on the first line, "world" wraps
//! assert_eq!(view.layout().line_count(), 2);
//!
//! view.set_caret(&mut text, 12);
//! view.type_text(&mut text, "!");
//! assert_eq!(text.to_string(), "hello world!");
//! ```
//!
//! # Module Description
//!
//! - [`index`] - character/byte positions and ranges
//! - [`run_array`] - run-length encoded sequences
//! - [`font`] - fonts and font metrics
//! - [`buffer`] - the text buffer contract
//! - [`styled_text`] - the bundled buffer implementation
//! - [`layout`] - line-start table, line geometry and pixel mapping
//! - [`view`] - caret, selection and editing
//! - [`interaction`] - mouse, keyboard and drag-and-drop
//! - [`find`] - search and replace around the selection
//! - [`paginate`] - page breaks and printing

/// Pixel coordinate.
pub type Coordinate = i32;

pub mod buffer;
pub mod config;
pub mod error;
pub mod find;
pub mod font;
pub mod host;
pub mod index;
pub mod interaction;
pub mod layout;
pub mod paginate;
pub mod run_array;
pub mod search;
pub mod styled_text;
pub mod undo;
pub mod view;
pub mod words;

pub use buffer::{StyledString, SubscriberId, TextBuffer, TextChange, TextEdit, WordChars};
pub use config::{EditorKind, ViewConfig, WrapMode, default_is_char_in_word, default_tab_width};
pub use error::{CollaboratorError, SearchError};
pub use find::SearchResult;
pub use font::{Color, Font, FontMetrics, FontStyle, LineMetrics, MonospaceMetrics};
pub use host::{CaretNotice, HeadlessHost, Rect, ScrollMode, TextViewHost};
pub use index::{ByteRange, CharacterRange, IndexRange, TextCount, TextIndex, TextRange};
pub use interaction::{DragKind, Key, KeyModifiers};
pub use layout::{CaretLocation, LayoutCache, LineGeometry, Point, insertion_font_at};
pub use paginate::{PageSize, PageSlice, PagePrinter, PrintOutcome, paginate};
pub use run_array::{Run, RunArray};
pub use search::{Replacement, SearchMatch, SearchOptions, SearchPattern, match_case};
pub use styled_text::StyledText;
pub use undo::UndoMode;
pub use view::{Cursor, RIGHT_MARGIN_WIDTH, TextView};
