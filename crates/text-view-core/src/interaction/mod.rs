//! Pointer, keyboard and drag-and-drop input.
//!
//! Input handlers live on [`crate::TextView`]; this module holds the gesture state they share.
//!
//! - [`mouse`] - click, double/triple click, drag-select
//! - [`dnd`] - local and platform drag-and-drop
//! - [`keyboard`] - caret motion and editing keys

pub mod dnd;
pub mod keyboard;
pub mod mouse;

use crate::layout::{CaretLocation, Point};

/// Granularity of the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragKind {
    /// No gesture.
    #[default]
    None,
    /// Character selection.
    Select,
    /// Whole-word selection from a double click.
    SelectWord,
    /// Camel-case segment selection from a modified double click.
    SelectPartialWord,
    /// Whole-line selection from a triple click.
    SelectLine,
    /// Press inside the selection, waiting to see whether it becomes a drag.
    DragAndDrop,
    /// Dragging the selection within this view.
    LocalDragAndDrop,
}

impl DragKind {
    /// Whether the gesture builds a selection.
    pub fn is_selection(self) -> bool {
        matches!(
            self,
            Self::Select | Self::SelectWord | Self::SelectPartialWord | Self::SelectLine
        )
    }
}

/// Gesture state between pointer down and pointer up.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DragState {
    pub(crate) kind: DragKind,
    /// Where the press happened, in text coordinates.
    pub(crate) start_pt: Point,
    /// Last pointer position seen, in text coordinates.
    pub(crate) prev_pt: Point,
    /// Where a drop would land; `None` while the pointer is over the dragged text.
    pub(crate) drop_loc: Option<CaretLocation>,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    /// Extend the selection.
    pub shift: bool,
    /// Word motion; partial-word double click.
    pub control: bool,
    /// Partial-word motion; copy instead of move on drop.
    pub alt: bool,
    /// Line and document motion.
    pub meta: bool,
}

impl KeyModifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Only shift.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Only control.
    pub const CONTROL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Only alt.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Only meta.
    pub const META: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: true,
    };
}

/// A key the view understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Delete backward.
    Backspace,
    /// Delete forward.
    Delete,
    /// Line break.
    Return,
    /// Tab character.
    Tab,
    /// Cancel the gesture in progress.
    Escape,
    /// A printable character.
    Char(char),
}

impl Key {
    /// Whether the key only moves the caret.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            Self::Left
                | Self::Right
                | Self::Up
                | Self::Down
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }
}
