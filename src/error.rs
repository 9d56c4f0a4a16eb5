//! Editor error types
//!
//! Most of these are recovered locally: the command that hit them is dropped
//! and the timeline stays as it was. Only `InvalidDirection` and
//! `InvalidNoteType` are surfaced to callers, since they mean malformed data
//! reached the codec.

use std::fmt;

/// Errors produced by timeline commands and the direction codec
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Cut direction code outside 0..=8
    InvalidDirection(i64),
    /// Note type code that is not red (0), blue (1) or mine (3)
    InvalidNoteType(i64),
    /// A strict placement hit a slot that already holds a note
    DuplicateNotePlacement { time: f64, lane: u8, layer: u8 },
    /// Lane or layer outside the 4x3 placement grid
    OutOfGrid { lane: u8, layer: u8 },
    /// Command referenced a note or obstacle that no longer exists
    MissingEntity(String),
    /// Paste with nothing copied, or into a view the clipboard didn't come from
    ClipboardEmptyOrWrongContext,
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::InvalidDirection(code) => write!(f, "Unrecognized direction: {}", code),
            EditorError::InvalidNoteType(code) => write!(f, "Unrecognized note type: {}", code),
            EditorError::DuplicateNotePlacement { time, lane, layer } => write!(
                f,
                "Tried to add a double-note in the same spot (beat {}, lane {}, layer {})",
                time, lane, layer
            ),
            EditorError::OutOfGrid { lane, layer } => {
                write!(f, "Placement outside the grid (lane {}, layer {})", lane, layer)
            }
            EditorError::MissingEntity(what) => write!(f, "No such entity: {}", what),
            EditorError::ClipboardEmptyOrWrongContext => {
                write!(f, "Clipboard is empty or belongs to another view")
            }
        }
    }
}

impl std::error::Error for EditorError {}
