//! Shared value types used by every shellfur crate.

mod types;

pub use types::{Color, EntityId, MaterialHandle, MeshHandle, Transform};
