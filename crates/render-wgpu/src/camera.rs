use glam::{Mat4, Vec3};

/// Camera circling a target point, driven by mouse drag and scroll.
/// Purely presentational; nothing in the shell core reads it.
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 4.0,
            yaw: 90.0_f32.to_radians(),
            pitch: 20.0_f32.to_radians(),
            fov: 50.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.05,
            far: 200.0,
            sensitivity: 0.005,
        }
    }
}

impl OrbitCamera {
    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        );
        self.target + offset * self.distance
    }

    /// Ease the target toward `point`; `rate` is the fraction covered per second.
    pub fn follow(&mut self, point: Vec3, rate: f32, dt: f32) {
        let t = (rate * dt).clamp(0.0, 1.0);
        self.target = self.target.lerp(point, t);
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch += dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-85.0_f32.to_radians(), 85.0_f32.to_radians());
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance * (1.0 - amount * 0.1)).clamp(0.5, 50.0);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
