//! wgpu render backend for shell fur.
//!
//! Draws every shell of a mesh in one instanced call, with `_ShellIndex`
//! carried per instance and the global surface packed into one uniform block.
//! Also draws a grid floor and, when asked, the bare-mesh authoring preview.
//!
//! # Invariants
//! - The renderer never writes the scene or the surfaces.
//! - Camera motion is presentation only.

mod camera;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::{ShellFrame, ShellInstanceData, ShellUniforms, WgpuShellRenderer, collect_shell_instances};
pub use shaders::{GRID_SHADER, PREVIEW_SHADER, SHELL_SHADER};
