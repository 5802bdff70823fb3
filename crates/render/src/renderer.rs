use glam::Vec3;
use shellfur_common::{MeshHandle, Transform};
use shellfur_kernel::Scene;

use crate::surface::{ShaderSurfaces, props};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 1.5, 3.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

/// Authoring-only draw of a base mesh at a transform. Carries no state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewDraw {
    pub mesh: MeshHandle,
    pub transform: Transform,
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and the shader surfaces. It never writes
/// either: parameters flow one way, from the shell core to the GPU.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &Scene, surfaces: &ShaderSurfaces, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of the scene and every surface value.
///
/// Used by the CLI and by tests to look at what a GPU backend would consume.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, surfaces: &ShaderSurfaces, view: &RenderView) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Frame {} ({:.3}s) ===\n",
            scene.frame(),
            scene.elapsed()
        ));
        out.push_str(&format!("Nodes: {}\n", scene.node_count()));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        ));

        out.push_str(&format!("Globals ({}):\n", surfaces.global().len()));
        for (name, value) in surfaces.global().iter() {
            out.push_str(&format!("  {name} = {value}\n"));
        }

        let mut tagged: Vec<_> = surfaces.instance_tags().iter().collect();
        tagged.sort_by_key(|(_, tag)| tag.shell_index);
        out.push_str(&format!("Instances ({}):\n", tagged.len()));
        for (id, tag) in tagged {
            let p = scene
                .world_transform(*id)
                .map(|t| t.position)
                .unwrap_or(Vec3::ZERO);
            out.push_str(&format!(
                "  [{}] {}={} pos=({:.2}, {:.2}, {:.2})\n",
                id.short(),
                props::SHELL_INDEX,
                tag.shell_index,
                p.x,
                p.y,
                p.z
            ));
        }

        tracing::trace!(bytes = out.len(), "debug frame rendered");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ShellTag;

    #[test]
    fn debug_renderer_empty() {
        let renderer = DebugTextRenderer::new();
        let output = renderer.render(
            &Scene::new(),
            &ShaderSurfaces::new(),
            &RenderView::default(),
        );
        assert!(output.contains("Frame 0"));
        assert!(output.contains("Globals (0)"));
        assert!(output.contains("Instances (0)"));
    }

    #[test]
    fn debug_renderer_lists_surfaces_in_shell_order() {
        let mut scene = Scene::new();
        let owner = scene.spawn(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        let a = scene.spawn_child(owner, Transform::default()).unwrap();
        let b = scene.spawn_child(owner, Transform::default()).unwrap();

        let mut surfaces = ShaderSurfaces::new();
        surfaces.set_int(props::SHELL_COUNT, 2);
        surfaces.set_instance_tag(b, ShellTag::new(1));
        surfaces.set_instance_tag(a, ShellTag::new(0));

        let output = DebugTextRenderer::new().render(&scene, &surfaces, &RenderView::default());
        assert!(output.contains("_ShellCount = 2"));
        assert!(output.contains("pos=(1.00, 2.00, 3.00)"));
        let first = output.find("_ShellIndex=0").unwrap();
        let second = output.find("_ShellIndex=1").unwrap();
        assert!(first < second);
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 60.0);
        assert_eq!(view.target, Vec3::ZERO);
    }
}
