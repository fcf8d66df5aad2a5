//! Error types.
//!
//! Layout and interaction never fail; out-of-range input is clamped. Only collaborators
//! (clipboard, drag-and-drop payload, print device) and pattern compilation produce errors.

use thiserror::Error;

#[derive(Debug, Error)]
/// Failures reported by the hosting widget or the print device.
pub enum CollaboratorError {
    #[error("clipboard unavailable: {0}")]
    /// The platform clipboard could not be read or written.
    Clipboard(String),
    #[error("drop payload unavailable: {0}")]
    /// A drag-and-drop source did not deliver its data.
    DropPayload(String),
    #[error("print job failed: {0}")]
    /// The print device failed mid-job.
    Print(String),
}

#[derive(Debug, Error)]
/// Failures compiling a search pattern.
pub enum SearchError {
    #[error("invalid search pattern: {0}")]
    /// The regular expression did not compile.
    InvalidPattern(#[from] regex::Error),
}
