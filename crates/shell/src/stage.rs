use shellfur_assets::AssetStore;
use shellfur_ecs::ComponentStore;
use shellfur_kernel::Scene;
use shellfur_render::ShaderSurfaces;

/// Everything the host owns that shell rendering reads or writes.
///
/// One stage per host; the surfaces inside are the process-wide shader state.
#[derive(Debug, Default)]
pub struct Stage {
    pub scene: Scene,
    pub components: ComponentStore,
    pub assets: AssetStore,
    pub surfaces: ShaderSurfaces,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush the scene and component event logs. Hosts call this once per
    /// frame after `Scene::step`. Returns the number of events dropped.
    pub fn drain_events(&mut self) -> usize {
        let scene = self.scene.drain_events().len();
        let components = self.components.drain_events().len();
        if scene + components > 0 {
            tracing::trace!(scene, components, "drained stage events");
        }
        scene + components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fur::ShellFur;
    use crate::params::ParameterSet;
    use shellfur_assets::{Material, Mesh};
    use shellfur_common::Transform;
    use shellfur_input::InputSample;

    #[test]
    fn frame_loop_with_drain_keeps_logs_bounded() {
        let mut stage = Stage::new();
        let owner = stage.scene.spawn(Transform::default());
        let mesh = stage.assets.register_mesh(Mesh::plane(1.0, 1));
        let material = stage.assets.register_material(Material::default());
        let mut fur = ShellFur::new(owner)
            .with_mesh(mesh)
            .with_material(material)
            .with_params(ParameterSet {
                shell_count: 4,
                ..ParameterSet::default()
            });
        fur.on_activate(&mut stage).unwrap();
        assert!(stage.drain_events() > 0);

        let sample = InputSample::from_axes(1, 0, 0);
        for _ in 0..1_000 {
            fur.update(&mut stage, &sample, 0.016);
            stage.scene.step(0.016);
            assert_eq!(stage.drain_events(), 2);
        }
        assert!(stage.scene.events().is_empty());
        assert!(stage.components.events().is_empty());
        assert_eq!(stage.scene.frame(), 1_000);
    }
}
