use glam::Vec3;
use shellfur_render::{ShaderSurfaces, props};

/// Pull applied per second of input, and gravity per second of idling.
pub const DEFAULT_DECAY_RATE: f32 = 10.0;

/// The fur's lean vector: dragged against movement, settling downward when idle.
///
/// Pure arithmetic, so identical input and `dt` sequences give bit-identical
/// output. The magnitude never exceeds 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementIntegrator {
    displacement: Vec3,
    decay_rate: f32,
}

impl Default for DisplacementIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplacementIntegrator {
    pub fn new() -> Self {
        Self::with_decay_rate(DEFAULT_DECAY_RATE)
    }

    pub fn with_decay_rate(decay_rate: f32) -> Self {
        Self {
            displacement: Vec3::ZERO,
            decay_rate,
        }
    }

    pub fn displacement(&self) -> Vec3 {
        self.displacement
    }

    pub fn decay_rate(&self) -> f32 {
        self.decay_rate
    }

    /// Integrate one frame without publishing.
    pub fn advance(&mut self, input: Vec3, dt: f32) -> Vec3 {
        let direction = input.normalize_or_zero();
        let pull = self.decay_rate * dt;
        self.displacement -= pull * direction;
        if direction == Vec3::ZERO {
            self.displacement.y -= pull;
        }
        if self.displacement.length() > 1.0 {
            self.displacement = self.displacement.normalize();
        }
        self.displacement
    }

    /// Overwrite `_ShellDirection` on the global surface.
    pub fn publish(&self, surfaces: &mut ShaderSurfaces) {
        surfaces.set_vector(props::SHELL_DIRECTION, self.displacement.extend(0.0));
    }

    pub fn step(&mut self, input: Vec3, dt: f32, surfaces: &mut ShaderSurfaces) -> Vec3 {
        let displacement = self.advance(input, dt);
        self.publish(surfaces);
        tracing::trace!(
            x = displacement.x,
            y = displacement.y,
            z = displacement.z,
            dt,
            "lean step"
        );
        displacement
    }
}
