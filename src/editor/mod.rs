//! Editor session layer
//!
//! - `EditorSession`: the per-project context every command goes through
//! - Pointer interaction (drag-selection, obstacle resize)
//! - Next-tick deferred tasks
//! - Cursor and zoom navigation

mod deferred;
mod interaction;
mod navigation;
mod session;

pub use deferred::*;
pub use interaction::*;
pub use navigation::*;
pub use session::*;
