//! Directional input: windowing-agnostic keys, axis bindings, and the
//! per-frame input sample.
//!
//! # Invariants
//! - Each axis of a sample is exactly -1, 0 or 1.
//! - A frame captures one sample; every consumer in that frame reads the same one.

mod keys;
mod sample;

pub use keys::{AxisBinding, InputBindings, Key, KeyState};
pub use sample::InputSample;
