use glam::Vec2;
use serde::{Deserialize, Serialize};
use shellfur_common::Color;
use shellfur_render::props;

/// Shaping parameters shared by every shell of one fur.
///
/// A plain value: publishing copies it out, nothing holds on to it by identity.
/// `noise_min <= noise_max` is expected by the shader but not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    pub shell_count: u32,
    pub shell_length: f32,
    pub distance_attenuation: f32,
    pub density: f32,
    pub noise_min: f32,
    pub noise_max: f32,
    pub thickness: f32,
    pub curvature: f32,
    pub displacement_strength: f32,
    pub shell_color: Color,
    pub occlusion_attenuation: f32,
    pub occlusion_bias: f32,
    /// Only the wind-driven grass variant publishes this.
    pub wind_dir_change_speed: Option<Vec2>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            shell_count: 16,
            shell_length: 0.15,
            distance_attenuation: 1.0,
            density: 100.0,
            noise_min: 0.0,
            noise_max: 1.0,
            thickness: 1.0,
            curvature: 1.0,
            displacement_strength: 0.1,
            shell_color: Color::rgb(0.35, 0.55, 0.2),
            occlusion_attenuation: 1.0,
            occlusion_bias: 0.0,
            wind_dir_change_speed: None,
        }
    }
}

impl ParameterSet {
    /// Clamp every scalar into its declared range. Returns the fields that moved.
    pub fn clamp_in_place(&mut self) -> Vec<ParameterField> {
        let mut moved = Vec::new();
        for field in ParameterField::ALL {
            let value = field.get(self);
            let (min, max) = field.range();
            let clamped = value.clamp(min, max);
            if clamped != value {
                tracing::warn!(
                    field = field.key(),
                    value,
                    clamped,
                    "parameter out of range, clamped"
                );
                field.set(self, clamped);
                moved.push(field);
            }
        }
        moved
    }

    /// Copy with every scalar clamped into range.
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        out.clamp_in_place();
        out
    }
}

/// The scalar fields of a [`ParameterSet`], with their shader names and ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterField {
    ShellCount,
    ShellLength,
    DistanceAttenuation,
    Density,
    NoiseMin,
    NoiseMax,
    Thickness,
    Curvature,
    DisplacementStrength,
    OcclusionAttenuation,
    OcclusionBias,
}

impl ParameterField {
    pub const ALL: [ParameterField; 11] = [
        Self::ShellCount,
        Self::ShellLength,
        Self::DistanceAttenuation,
        Self::Density,
        Self::NoiseMin,
        Self::NoiseMax,
        Self::Thickness,
        Self::Curvature,
        Self::DisplacementStrength,
        Self::OcclusionAttenuation,
        Self::OcclusionBias,
    ];

    /// Shader property this field is published under.
    pub fn key(self) -> &'static str {
        match self {
            Self::ShellCount => props::SHELL_COUNT,
            Self::ShellLength => props::SHELL_LENGTH,
            Self::DistanceAttenuation => props::SHELL_DISTANCE_ATTENUATION,
            Self::Density => props::DENSITY,
            Self::NoiseMin => props::NOISE_MIN,
            Self::NoiseMax => props::NOISE_MAX,
            Self::Thickness => props::THICKNESS,
            Self::Curvature => props::CURVATURE,
            Self::DisplacementStrength => props::DISPLACEMENT_STRENGTH,
            Self::OcclusionAttenuation => props::ATTENUATION,
            Self::OcclusionBias => props::OCCLUSION_BIAS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ShellCount => "Shell count",
            Self::ShellLength => "Shell length",
            Self::DistanceAttenuation => "Distance attenuation",
            Self::Density => "Density",
            Self::NoiseMin => "Noise min",
            Self::NoiseMax => "Noise max",
            Self::Thickness => "Thickness",
            Self::Curvature => "Curvature",
            Self::DisplacementStrength => "Displacement strength",
            Self::OcclusionAttenuation => "Occlusion attenuation",
            Self::OcclusionBias => "Occlusion bias",
        }
    }

    /// Inclusive range designers may pick from.
    pub fn range(self) -> (f32, f32) {
        match self {
            Self::ShellCount => (1.0, 256.0),
            Self::ShellLength => (0.0, 1.0),
            Self::DistanceAttenuation => (0.01, 3.0),
            Self::Density => (1.0, 1000.0),
            Self::NoiseMin | Self::NoiseMax => (0.0, 1.0),
            Self::Thickness | Self::Curvature => (0.0, 10.0),
            Self::DisplacementStrength => (0.0, 1.0),
            Self::OcclusionAttenuation => (0.0, 5.0),
            Self::OcclusionBias => (0.0, 1.0),
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::ShellCount)
    }

    pub fn get(self, params: &ParameterSet) -> f32 {
        match self {
            Self::ShellCount => params.shell_count as f32,
            Self::ShellLength => params.shell_length,
            Self::DistanceAttenuation => params.distance_attenuation,
            Self::Density => params.density,
            Self::NoiseMin => params.noise_min,
            Self::NoiseMax => params.noise_max,
            Self::Thickness => params.thickness,
            Self::Curvature => params.curvature,
            Self::DisplacementStrength => params.displacement_strength,
            Self::OcclusionAttenuation => params.occlusion_attenuation,
            Self::OcclusionBias => params.occlusion_bias,
        }
    }

    /// Write a value. The shell count is rounded to the nearest integer.
    pub fn set(self, params: &mut ParameterSet, value: f32) {
        match self {
            Self::ShellCount => params.shell_count = value.round().max(0.0) as u32,
            Self::ShellLength => params.shell_length = value,
            Self::DistanceAttenuation => params.distance_attenuation = value,
            Self::Density => params.density = value,
            Self::NoiseMin => params.noise_min = value,
            Self::NoiseMax => params.noise_max = value,
            Self::Thickness => params.thickness = value,
            Self::Curvature => params.curvature = value,
            Self::DisplacementStrength => params.displacement_strength = value,
            Self::OcclusionAttenuation => params.occlusion_attenuation = value,
            Self::OcclusionBias => params.occlusion_bias = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let params = ParameterSet::default();
        assert_eq!(params.clamped(), params);
        assert_eq!(params.shell_count, 16);
        assert_eq!(params.wind_dir_change_speed, None);
    }

    #[test]
    fn clamp_reports_moved_fields() {
        let mut params = ParameterSet {
            shell_count: 0,
            density: 5000.0,
            distance_attenuation: 0.0,
            ..ParameterSet::default()
        };
        let moved = params.clamp_in_place();
        assert_eq!(
            moved,
            vec![
                ParameterField::ShellCount,
                ParameterField::DistanceAttenuation,
                ParameterField::Density
            ]
        );
        assert_eq!(params.shell_count, 1);
        assert_eq!(params.density, 1000.0);
        assert_eq!(params.distance_attenuation, 0.01);
    }

    #[test]
    fn clamp_leaves_noise_order_alone() {
        let params = ParameterSet {
            noise_min: 0.8,
            noise_max: 0.2,
            ..ParameterSet::default()
        }
        .clamped();
        assert_eq!(params.noise_min, 0.8);
        assert_eq!(params.noise_max, 0.2);
    }

    #[test]
    fn field_get_set_round_trip_through_params() {
        let mut params = ParameterSet::default();
        ParameterField::Curvature.set(&mut params, 2.5);
        assert_eq!(params.curvature, 2.5);
        ParameterField::ShellCount.set(&mut params, 31.6);
        assert_eq!(params.shell_count, 32);
        assert_eq!(ParameterField::ShellCount.get(&params), 32.0);
    }

    #[test]
    fn field_keys_are_unique() {
        let mut keys: Vec<_> = ParameterField::ALL.iter().map(|f| f.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), ParameterField::ALL.len());
        assert_eq!(ParameterField::OcclusionAttenuation.key(), "_Attenuation");
    }
}
