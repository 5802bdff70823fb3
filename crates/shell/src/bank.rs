use glam::Vec4;
use shellfur_render::{ShaderSurfaces, props};

use crate::instances::ShellInstanceSet;
use crate::params::ParameterSet;

/// Pushes a [`ParameterSet`] to the shader surfaces.
///
/// Every publish writes the full set, so publishing the same values twice
/// leaves the surfaces exactly as one publish would.
#[derive(Debug, Default)]
pub struct ParameterBank {
    publishes: u64,
}

impl ParameterBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every parameter to the global surface once, then make sure each
    /// shell's tag matches its index and push it to that shell's surface.
    ///
    /// The targets must already be built; publishing to shells that do not
    /// exist yet is a caller bug.
    pub fn publish(
        &mut self,
        params: &ParameterSet,
        targets: &mut ShellInstanceSet,
        surfaces: &mut ShaderSurfaces,
    ) {
        debug_assert!(
            targets.is_active(),
            "parameters published before shell instances were created"
        );

        write_globals(params, surfaces);
        for instance in targets.instances_mut() {
            instance.tag.shell_index = instance.index;
            surfaces.set_instance_tag(instance.entity, instance.tag);
        }

        self.publishes += 1;
        tracing::debug!(
            shells = targets.len(),
            shell_count = params.shell_count,
            publish = self.publishes,
            "published shell parameters"
        );
    }

    /// Number of publishes so far.
    pub fn publish_count(&self) -> u64 {
        self.publishes
    }
}

fn write_globals(params: &ParameterSet, surfaces: &mut ShaderSurfaces) {
    surfaces.set_int(props::SHELL_COUNT, params.shell_count as i32);
    surfaces.set_float(props::SHELL_LENGTH, params.shell_length);
    surfaces.set_float(props::DENSITY, params.density);
    surfaces.set_float(props::THICKNESS, params.thickness);
    surfaces.set_float(props::ATTENUATION, params.occlusion_attenuation);
    surfaces.set_float(
        props::SHELL_DISTANCE_ATTENUATION,
        params.distance_attenuation,
    );
    surfaces.set_float(props::CURVATURE, params.curvature);
    surfaces.set_float(props::DISPLACEMENT_STRENGTH, params.displacement_strength);
    surfaces.set_float(props::OCCLUSION_BIAS, params.occlusion_bias);
    surfaces.set_float(props::NOISE_MIN, params.noise_min);
    surfaces.set_float(props::NOISE_MAX, params.noise_max);
    surfaces.set_color(props::SHELL_COLOR, params.shell_color);
    if let Some(speed) = params.wind_dir_change_speed {
        surfaces.set_vector(
            props::WIND_DIR_CHANGE_SPEED,
            Vec4::new(speed.x, speed.y, 0.0, 0.0),
        );
    } else {
        surfaces.clear_global(props::WIND_DIR_CHANGE_SPEED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;
    use glam::Vec2;
    use shellfur_assets::{Material, Mesh};
    use shellfur_common::{Color, Transform};
    use shellfur_render::ShellTag;

    fn active_set(stage: &mut Stage, count: u32) -> ShellInstanceSet {
        let owner = stage.scene.spawn(Transform::default());
        let mesh = stage.assets.register_mesh(Mesh::plane(1.0, 1));
        let material = stage.assets.register_material(Material::default());
        ShellInstanceSet::activate(stage, owner, count, Some(mesh), Some(material)).unwrap()
    }

    #[test]
    fn publish_scenario_four_shells() {
        let mut stage = Stage::new();
        let mut set = active_set(&mut stage, 4);
        let params = ParameterSet {
            shell_count: 4,
            shell_length: 0.2,
            density: 50.0,
            ..ParameterSet::default()
        };
        ParameterBank::new().publish(&params, &mut set, &mut stage.surfaces);

        let global = stage.surfaces.global();
        assert_eq!(global.get_int(props::SHELL_COUNT), Some(4));
        assert_eq!(global.get_float(props::SHELL_LENGTH), Some(0.2));
        assert_eq!(global.get_float(props::DENSITY), Some(50.0));
        for (i, instance) in set.instances().iter().enumerate() {
            assert_eq!(
                stage.surfaces.instance_tag(instance.entity()),
                Some(ShellTag::new(i as u32))
            );
        }
    }

    #[test]
    fn publish_writes_every_global_once() {
        let mut stage = Stage::new();
        let mut set = active_set(&mut stage, 0);
        let before = stage.surfaces.write_count();
        ParameterBank::new().publish(&ParameterSet::default(), &mut set, &mut stage.surfaces);
        // No wind speed by default: twelve globals, no instances.
        assert_eq!(stage.surfaces.write_count() - before, 12);
        assert_eq!(stage.surfaces.global().len(), 12);
        assert!(stage.surfaces.instance_tags().is_empty());
    }

    #[test]
    fn publish_is_idempotent() {
        let mut stage = Stage::new();
        let mut set = active_set(&mut stage, 8);
        let params = ParameterSet {
            shell_color: Color::new(0.2, 0.4, 0.6, 1.0),
            wind_dir_change_speed: Some(Vec2::new(0.5, 0.25)),
            ..ParameterSet::default()
        };
        let mut bank = ParameterBank::new();
        bank.publish(&params, &mut set, &mut stage.surfaces);
        let global = stage.surfaces.global().clone();
        let tags = stage.surfaces.instance_tags().clone();

        bank.publish(&params, &mut set, &mut stage.surfaces);
        assert_eq!(stage.surfaces.global(), &global);
        assert_eq!(stage.surfaces.instance_tags(), &tags);
        assert_eq!(bank.publish_count(), 2);
    }

    #[test]
    fn wind_speed_is_padded_to_four_components() {
        let mut stage = Stage::new();
        let mut set = active_set(&mut stage, 1);
        let params = ParameterSet {
            wind_dir_change_speed: Some(Vec2::new(1.5, -2.0)),
            ..ParameterSet::default()
        };
        ParameterBank::new().publish(&params, &mut set, &mut stage.surfaces);
        assert_eq!(
            stage.surfaces.global().get_vector(props::WIND_DIR_CHANGE_SPEED),
            Some(Vec4::new(1.5, -2.0, 0.0, 0.0))
        );
    }

    #[test]
    fn wind_off_clears_the_published_speed() {
        let mut stage = Stage::new();
        let mut set = active_set(&mut stage, 2);
        let mut bank = ParameterBank::new();
        let mut params = ParameterSet {
            wind_dir_change_speed: Some(Vec2::new(2.0, 3.0)),
            ..ParameterSet::default()
        };
        bank.publish(&params, &mut set, &mut stage.surfaces);
        params.wind_dir_change_speed = None;
        bank.publish(&params, &mut set, &mut stage.surfaces);
        assert_eq!(
            stage.surfaces.global().get_vector(props::WIND_DIR_CHANGE_SPEED),
            None
        );
        assert_eq!(stage.surfaces.global().len(), 12);
    }

    #[test]
    fn publish_repairs_drifted_tags() {
        let mut stage = Stage::new();
        let mut set = active_set(&mut stage, 3);
        set.instances_mut()[0].tag = ShellTag::new(7);
        ParameterBank::new().publish(&ParameterSet::default(), &mut set, &mut stage.surfaces);
        assert_eq!(set.instances()[0].tag(), ShellTag::new(0));
    }
}
