//! Scene module - mapping timeline entities into 3D space
//!
//! - Direction/geometry codec (rotations, obstacle boxes)
//! - Beat-time to scene transform and per-frame render records
//! - Visibility window and density meter around the cursor

mod math;
mod codec;
mod transform;
mod window;

pub use math::*;
pub use codec::*;
pub use transform::*;
pub use window::*;
