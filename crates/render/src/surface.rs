use glam::Vec4;
use shellfur_common::{Color, EntityId};
use std::collections::BTreeMap;

/// Names of the shader properties shell rendering reads.
pub mod props {
    pub const SHELL_COUNT: &str = "_ShellCount";
    pub const SHELL_LENGTH: &str = "_ShellLength";
    pub const SHELL_DISTANCE_ATTENUATION: &str = "_ShellDistanceAttenuation";
    pub const DENSITY: &str = "_Density";
    pub const THICKNESS: &str = "_Thickness";
    /// Occlusion attenuation.
    pub const ATTENUATION: &str = "_Attenuation";
    pub const CURVATURE: &str = "_Curvature";
    pub const DISPLACEMENT_STRENGTH: &str = "_DisplacementStrength";
    pub const OCCLUSION_BIAS: &str = "_OcclusionBias";
    pub const NOISE_MIN: &str = "_NoiseMin";
    pub const NOISE_MAX: &str = "_NoiseMax";
    pub const SHELL_COLOR: &str = "_ShellColor";
    pub const WIND_DIR_CHANGE_SPEED: &str = "_WindDirChangeSpeed";
    pub const SHELL_DIRECTION: &str = "_ShellDirection";
    /// Per-instance only.
    pub const SHELL_INDEX: &str = "_ShellIndex";
}

/// A typed shader property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderValue {
    Int(i32),
    Float(f32),
    Vector(Vec4),
    Color(Color),
}

impl std::fmt::Display for ShaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.4}"),
            Self::Vector(v) => write!(f, "({:.4}, {:.4}, {:.4}, {:.4})", v.x, v.y, v.z, v.w),
            Self::Color(c) => write!(f, "rgba({:.3}, {:.3}, {:.3}, {:.3})", c.r, c.g, c.b, c.a),
        }
    }
}

/// Named property values, last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBlock {
    values: BTreeMap<&'static str, ShaderValue>,
}

impl PropertyBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, value: ShaderValue) {
        self.values.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<ShaderValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<ShaderValue> {
        self.values.get(name).copied()
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            ShaderValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ShaderValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_vector(&self, name: &str) -> Option<Vec4> {
        match self.get(name)? {
            ShaderValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_color(&self, name: &str) -> Option<Color> {
        match self.get(name)? {
            ShaderValue::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ShaderValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// Per-instance property override: the shell's position in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShellTag {
    pub shell_index: u32,
}

impl ShellTag {
    pub const fn new(shell_index: u32) -> Self {
        Self { shell_index }
    }
}

/// Every shader-visible value: one global block read by all shells, plus
/// one tag per shell instance.
///
/// There is a single writer per frame. Values persist until overwritten;
/// nothing here is reset automatically.
#[derive(Debug, Clone, Default)]
pub struct ShaderSurfaces {
    global: PropertyBlock,
    instances: BTreeMap<EntityId, ShellTag>,
    writes: u64,
}

impl ShaderSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global(&mut self, name: &'static str, value: ShaderValue) {
        self.global.set(name, value);
        self.writes += 1;
    }

    pub fn set_int(&mut self, name: &'static str, value: i32) {
        self.set_global(name, ShaderValue::Int(value));
    }

    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.set_global(name, ShaderValue::Float(value));
    }

    pub fn set_vector(&mut self, name: &'static str, value: Vec4) {
        self.set_global(name, ShaderValue::Vector(value));
    }

    pub fn set_color(&mut self, name: &'static str, value: Color) {
        self.set_global(name, ShaderValue::Color(value));
    }

    /// Drop a global so shaders fall back to their zero default.
    pub fn clear_global(&mut self, name: &str) -> Option<ShaderValue> {
        let removed = self.global.remove(name);
        if removed.is_some() {
            self.writes += 1;
        }
        removed
    }

    pub fn global(&self) -> &PropertyBlock {
        &self.global
    }

    /// Push a tag to one instance's own surface.
    pub fn set_instance_tag(&mut self, entity: EntityId, tag: ShellTag) {
        self.instances.insert(entity, tag);
        self.writes += 1;
    }

    pub fn instance_tag(&self, entity: EntityId) -> Option<ShellTag> {
        self.instances.get(&entity).copied()
    }

    /// Drop an instance's override when the instance goes away.
    pub fn clear_instance(&mut self, entity: EntityId) -> Option<ShellTag> {
        let removed = self.instances.remove(&entity);
        if removed.is_some() {
            self.writes += 1;
        }
        removed
    }

    pub fn instance_tags(&self) -> &BTreeMap<EntityId, ShellTag> {
        &self.instances
    }

    /// Total writes since creation, global and per-instance.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}
