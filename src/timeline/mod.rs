//! Timeline module - notes and obstacles placed along the song
//!
//! - Entity types and the immutable `Timeline` snapshot
//! - Pure store operations (place, delete, select, mirror, ...)
//! - Commands, the only way the editor changes a snapshot
//! - Bounded undo/redo history with bulk-delete grouping
//! - Clipboard with first-item paste anchoring

mod entity;
pub mod store;
pub mod clipboard;
mod command;
mod history;

pub use entity::*;
pub use clipboard::{Clipboard, View};
pub use command::*;
pub use history::*;
