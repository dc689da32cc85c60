//! The object-stream format: group headers, frame objects, end markers.

mod frame;
mod group;

pub use frame::*;
pub use group::*;
