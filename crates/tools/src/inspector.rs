use glam::Vec3;
use shellfur_common::EntityId;
use shellfur_render::ShaderSurfaces;
use shellfur_shell::{ShellFur, Stage};

/// Fur inspector for developer tooling.
///
/// Read-only queries against a fur and the stage it lives in, for the CLI
/// and the desktop side panel.
pub struct FurInspector;

impl FurInspector {
    /// Produce a summary of a fur and the shader surfaces.
    pub fn summary(fur: &ShellFur, stage: &Stage) -> FurSummary {
        FurSummary {
            active: fur.is_active(),
            shell_count: fur.params().shell_count,
            live_instances: fur.instances().len(),
            displacement: fur.displacement(),
            publishes: fur.bank().publish_count(),
            surface_writes: stage.surfaces.write_count(),
            frame: stage.scene.frame(),
        }
    }

    /// One line per shell, in layer order.
    pub fn list_shells(fur: &ShellFur, stage: &Stage) -> Vec<ShellInfo> {
        fur.instances()
            .instances()
            .iter()
            .map(|instance| ShellInfo {
                entity: instance.entity(),
                index: instance.index(),
                name: stage
                    .components
                    .get_name(instance.entity())
                    .map(|n| n.0.clone())
                    .unwrap_or_default(),
                published_index: stage
                    .surfaces
                    .instance_tag(instance.entity())
                    .map(|tag| tag.shell_index),
            })
            .collect()
    }

    /// Every global value as `name = value`, in name order.
    pub fn global_values(surfaces: &ShaderSurfaces) -> Vec<String> {
        surfaces
            .global()
            .iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect()
    }
}

/// Summary of one fur for the inspector.
#[derive(Debug, Clone)]
pub struct FurSummary {
    pub active: bool,
    pub shell_count: u32,
    pub live_instances: usize,
    pub displacement: Vec3,
    pub publishes: u64,
    pub surface_writes: u64,
    pub frame: u64,
}

impl std::fmt::Display for FurSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fur: active={} shells={}/{} lean=({:.3}, {:.3}, {:.3}) publishes={} writes={} frame={}",
            self.active,
            self.live_instances,
            self.shell_count,
            self.displacement.x,
            self.displacement.y,
            self.displacement.z,
            self.publishes,
            self.surface_writes,
            self.frame,
        )
    }
}

/// Detailed info about a single shell.
#[derive(Debug, Clone)]
pub struct ShellInfo {
    pub entity: EntityId,
    pub index: u32,
    pub name: String,
    /// The `_ShellIndex` on the instance surface, if any.
    pub published_index: Option<u32>,
}

impl std::fmt::Display for ShellInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let published = self
            .published_index
            .map(|i| i.to_string())
            .unwrap_or_else(|| "-".into());
        write!(
            f,
            "[{}] {} index={} _ShellIndex={}",
            self.entity.short(),
            self.name,
            self.index,
            published
        )
    }
}
