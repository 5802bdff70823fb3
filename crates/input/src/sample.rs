use glam::{IVec3, Vec3};

use crate::keys::{InputBindings, KeyState};

/// Directional intent for one frame.
///
/// Captured once per frame and handed by reference to every consumer, so
/// the body's motion and the fur's lean never disagree about the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSample {
    axes: IVec3,
}

impl InputSample {
    pub const IDLE: Self = Self { axes: IVec3::ZERO };

    /// Build a sample from raw axis values; anything beyond ±1 is reduced to its sign.
    pub fn from_axes(x: i32, y: i32, z: i32) -> Self {
        Self {
            axes: IVec3::new(x.signum(), y.signum(), z.signum()),
        }
    }

    /// Read the held keys through the bindings.
    pub fn capture(keys: &KeyState, bindings: &InputBindings) -> Self {
        let sample = Self::from_axes(
            bindings.x.value(keys),
            bindings.y.value(keys),
            bindings.z.value(keys),
        );
        tracing::trace!(axes = ?sample.axes, "captured input sample");
        sample
    }

    pub fn axes(&self) -> IVec3 {
        self.axes
    }

    /// Raw direction, each component in {-1, 0, 1}. Not normalized.
    pub fn direction(&self) -> Vec3 {
        self.axes.as_vec3()
    }

    pub fn is_idle(&self) -> bool {
        self.axes == IVec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Key;

    #[test]
    fn idle_sample() {
        let sample = InputSample::capture(&KeyState::new(), &InputBindings::default());
        assert!(sample.is_idle());
        assert_eq!(sample.direction(), Vec3::ZERO);
        assert_eq!(sample, InputSample::IDLE);
    }

    #[test]
    fn capture_maps_all_axes() {
        let mut keys = KeyState::new();
        keys.set(Key::D, true);
        keys.set(Key::S, true);
        keys.set(Key::Q, true);
        let sample = InputSample::capture(&keys, &InputBindings::default());
        assert_eq!(sample.direction(), Vec3::new(1.0, -1.0, 1.0));
    }

    #[test]
    fn from_axes_saturates_to_sign() {
        let sample = InputSample::from_axes(5, -3, 0);
        assert_eq!(sample.axes(), IVec3::new(1, -1, 0));
    }
}
