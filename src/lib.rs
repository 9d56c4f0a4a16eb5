//! blockmap: timeline editor for block-slicing rhythm game maps
//!
//! Notes and obstacles live on a beat-time timeline. The editor keeps them in
//! immutable snapshots with a bounded undo history, maps them into a 3D scene
//! that scrolls with the playback cursor, and works out which of them are in
//! view.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod editor;
pub mod error;
pub mod project;
pub mod scene;
pub mod timeline;

pub use config::EditorConfig;
pub use editor::EditorSession;
pub use error::EditorError;
