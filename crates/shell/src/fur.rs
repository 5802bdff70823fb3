use glam::Vec3;
use shellfur_common::{EntityId, MaterialHandle, MeshHandle};
use shellfur_input::InputSample;
use shellfur_kernel::Scene;
use shellfur_render::PreviewDraw;

use crate::bank::ParameterBank;
use crate::config::{FurConfig, MaterialSourceConfig};
use crate::displacement::DisplacementIntegrator;
use crate::error::ShellError;
use crate::instances::ShellInstanceSet;
use crate::locomotion::LocomotionDriver;
use crate::params::ParameterSet;
use crate::stage::Stage;

/// Where the shared shell material comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialSource {
    /// A material already registered with the asset store.
    Asset(MaterialHandle),
    /// A fresh material created from this shader on every activation and
    /// released on deactivation.
    Shader(String),
}

/// A furry body: the host-facing component tying the shell core together.
///
/// The host drives it through four hooks ([`on_activate`](Self::on_activate),
/// [`on_parameters_changed`](Self::on_parameters_changed),
/// [`on_deactivate`](Self::on_deactivate), [`on_debug_preview`](Self::on_debug_preview))
/// plus [`update`](Self::update) once per frame.
#[derive(Debug)]
pub struct ShellFur {
    owner: EntityId,
    mesh: Option<MeshHandle>,
    material: Option<MaterialSource>,
    params: ParameterSet,
    auto_update: bool,
    lean: bool,
    bank: ParameterBank,
    instances: ShellInstanceSet,
    integrator: Option<DisplacementIntegrator>,
    locomotion: LocomotionDriver,
    runtime_material: Option<MaterialHandle>,
}

impl ShellFur {
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            mesh: None,
            material: None,
            params: ParameterSet::default(),
            auto_update: true,
            lean: true,
            bank: ParameterBank::new(),
            instances: ShellInstanceSet::default(),
            integrator: None,
            locomotion: LocomotionDriver::default(),
            runtime_material: None,
        }
    }

    /// Build from a loaded configuration. `material` is used when the config
    /// asks for a registered asset and ignored when it names a shader.
    pub fn from_config(
        owner: EntityId,
        config: &FurConfig,
        mesh: Option<MeshHandle>,
        material: Option<MaterialHandle>,
    ) -> Self {
        let source = match &config.material {
            MaterialSourceConfig::Asset => material.map(MaterialSource::Asset),
            MaterialSourceConfig::Shader { name } => Some(MaterialSource::Shader(name.clone())),
        };
        Self {
            mesh,
            material: source,
            params: config.params.clone(),
            auto_update: config.auto_update,
            lean: config.lean,
            locomotion: LocomotionDriver::new(config.locomotion_speed),
            ..Self::new(owner)
        }
    }

    pub fn with_mesh(mut self, mesh: MeshHandle) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_material(mut self, material: MaterialHandle) -> Self {
        self.material = Some(MaterialSource::Asset(material));
        self
    }

    pub fn with_shader(mut self, shader: impl Into<String>) -> Self {
        self.material = Some(MaterialSource::Shader(shader.into()));
        self
    }

    pub fn with_params(mut self, params: ParameterSet) -> Self {
        self.params = params;
        self
    }

    pub fn with_auto_update(mut self, auto_update: bool) -> Self {
        self.auto_update = auto_update;
        self
    }

    pub fn with_lean(mut self, lean: bool) -> Self {
        self.lean = lean;
        self
    }

    pub fn with_locomotion_speed(mut self, speed: f32) -> Self {
        self.locomotion = LocomotionDriver::new(speed);
        self
    }

    /// Build the shells and publish the parameters once.
    ///
    /// Calling this while already active only logs a warning.
    pub fn on_activate(&mut self, stage: &mut Stage) -> Result<(), ShellError> {
        if self.instances.is_active() {
            tracing::warn!(owner = %self.owner.short(), "fur already active, activation ignored");
            return Ok(());
        }
        // Mesh problems must surface before a runtime material is created.
        let mesh = self.mesh.ok_or(ShellError::MissingMesh)?;
        if !stage.assets.contains_mesh(mesh) {
            return Err(ShellError::UnknownMesh(mesh));
        }
        let material = match &self.material {
            None => return Err(ShellError::MissingMaterial),
            Some(MaterialSource::Asset(handle)) => *handle,
            Some(MaterialSource::Shader(shader)) => {
                let handle = stage.assets.instantiate_material(shader);
                self.runtime_material = Some(handle);
                handle
            }
        };

        let activated = ShellInstanceSet::activate(
            stage,
            self.owner,
            self.params.shell_count,
            Some(mesh),
            Some(material),
        );
        match activated {
            Ok(set) => self.instances = set,
            Err(err) => {
                self.release_runtime_material(stage);
                return Err(err);
            }
        }

        if self.lean && self.integrator.is_none() {
            self.integrator = Some(DisplacementIntegrator::new());
        }
        self.bank
            .publish(&self.params, &mut self.instances, &mut stage.surfaces);
        Ok(())
    }

    /// The explicit "reapply configuration" hook.
    ///
    /// Does nothing unless auto-update is on and the shells exist. When the
    /// shell count no longer matches the live instances, the shells are
    /// rebuilt first. Returns whether anything was published.
    pub fn on_parameters_changed(&mut self, stage: &mut Stage) -> Result<bool, ShellError> {
        if !self.auto_update || !self.instances.is_active() {
            tracing::trace!(
                auto_update = self.auto_update,
                active = self.instances.is_active(),
                "parameter change not applied"
            );
            return Ok(false);
        }

        if self.params.shell_count as usize != self.instances.len() {
            let (mesh, material) = (self.instances.mesh(), self.instances.material());
            tracing::info!(
                from = self.instances.len(),
                to = self.params.shell_count,
                "rebuilding shells for new count"
            );
            self.instances.deactivate(stage);
            self.instances = match ShellInstanceSet::activate(
                stage,
                self.owner,
                self.params.shell_count,
                mesh,
                material,
            ) {
                Ok(set) => set,
                Err(err) => {
                    self.release_runtime_material(stage);
                    return Err(err);
                }
            };
        }

        Ok(self
            .instances
            .reindex(&mut self.bank, &self.params, &mut stage.surfaces))
    }

    /// Destroy the shells and release a runtime material. Idempotent.
    pub fn on_deactivate(&mut self, stage: &mut Stage) {
        self.instances.deactivate(stage);
        self.release_runtime_material(stage);
    }

    /// What to draw for authoring feedback: the base mesh at the owner's
    /// world transform, only while not playing.
    pub fn on_debug_preview(&self, scene: &Scene, playing: bool) -> Option<PreviewDraw> {
        if playing {
            return None;
        }
        let mesh = self.mesh?;
        let transform = scene.world_transform(self.owner)?;
        Some(PreviewDraw { mesh, transform })
    }

    /// One frame: move the owner, then lean the fur, from the same sample.
    ///
    /// Returns the published lean vector; `None` while inactive or with lean off.
    pub fn update(&mut self, stage: &mut Stage, sample: &InputSample, dt: f32) -> Option<Vec3> {
        if !self.instances.is_active() {
            return None;
        }
        self.locomotion.drive(&mut stage.scene, self.owner, sample, dt);
        if !self.lean {
            return None;
        }
        let integrator = self.integrator.as_mut()?;
        Some(integrator.step(sample.direction(), dt, &mut stage.surfaces))
    }

    fn release_runtime_material(&mut self, stage: &mut Stage) {
        if let Some(handle) = self.runtime_material.take() {
            stage.assets.remove_material(handle);
            tracing::debug!(?handle, "released runtime material");
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    pub fn material_source(&self) -> Option<&MaterialSource> {
        self.material.as_ref()
    }

    pub fn runtime_material(&self) -> Option<MaterialHandle> {
        self.runtime_material
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Edit parameters in place. Nothing is published until
    /// [`on_parameters_changed`](Self::on_parameters_changed).
    pub fn params_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
    }

    pub fn lean(&self) -> bool {
        self.lean
    }

    pub fn is_active(&self) -> bool {
        self.instances.is_active()
    }

    pub fn instances(&self) -> &ShellInstanceSet {
        &self.instances
    }

    pub fn bank(&self) -> &ParameterBank {
        &self.bank
    }

    pub fn locomotion(&self) -> &LocomotionDriver {
        &self.locomotion
    }

    /// Current lean vector, zero before the first activation or with lean off.
    pub fn displacement(&self) -> Vec3 {
        self.integrator
            .map(|i| i.displacement())
            .unwrap_or(Vec3::ZERO)
    }
}
