//! Rendering adapter: the shader parameter contract and a renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read surfaces; they never write them.
//! - Global values are shared by every shell, last write wins.
//! - Per-instance values are one `ShellTag` per shell instance.

mod renderer;
mod surface;

pub use renderer::{DebugTextRenderer, PreviewDraw, RenderView, Renderer};
pub use surface::{PropertyBlock, ShaderSurfaces, ShaderValue, ShellTag, props};
