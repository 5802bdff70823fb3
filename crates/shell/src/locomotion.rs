use glam::Vec3;
use shellfur_common::EntityId;
use shellfur_input::InputSample;
use shellfur_kernel::Scene;

/// Moves the owning body along the frame's input direction at a fixed speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionDriver {
    pub speed: f32,
}

impl Default for LocomotionDriver {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl LocomotionDriver {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    pub fn displace(&self, position: Vec3, input: Vec3, dt: f32) -> Vec3 {
        position + dt * self.speed * input.normalize_or_zero()
    }

    /// Move `body` by one frame of `sample`. Returns the new local position,
    /// or `None` when the body is not in the scene.
    pub fn drive(
        &self,
        scene: &mut Scene,
        body: EntityId,
        sample: &InputSample,
        dt: f32,
    ) -> Option<Vec3> {
        let mut transform = scene.get(body)?.transform;
        if sample.is_idle() {
            return Some(transform.position);
        }
        transform.position = self.displace(transform.position, sample.direction(), dt);
        scene.set_transform(body, transform);
        Some(transform.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellfur_common::Transform;

    #[test]
    fn displace_uses_unit_direction() {
        let driver = LocomotionDriver::new(2.0);
        let out = driver.displace(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), 0.5);
        assert!((out.length() - 1.0).abs() < 1e-6);
        assert_eq!(driver.displace(Vec3::ONE, Vec3::ZERO, 0.5), Vec3::ONE);
    }

    #[test]
    fn drive_moves_body_in_scene() {
        let mut scene = Scene::new();
        let body = scene.spawn(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        let sample = InputSample::from_axes(0, 0, -1);
        let pos = LocomotionDriver::default()
            .drive(&mut scene, body, &sample, 0.25)
            .unwrap();
        assert_eq!(pos, Vec3::new(0.0, 1.0, -0.25));
        assert_eq!(scene.get(body).unwrap().transform.position, pos);
    }

    #[test]
    fn idle_sample_does_not_touch_scene() {
        let mut scene = Scene::new();
        let body = scene.spawn(Transform::default());
        scene.drain_events();
        LocomotionDriver::default().drive(&mut scene, body, &InputSample::IDLE, 0.1);
        assert!(scene.events().is_empty());
    }

    #[test]
    fn drive_missing_body_is_none() {
        let mut scene = Scene::new();
        let sample = InputSample::from_axes(1, 0, 0);
        assert_eq!(
            LocomotionDriver::default().drive(&mut scene, EntityId::new(), &sample, 0.1),
            None
        );
    }
}
