use shellfur_common::{EntityId, MaterialHandle, MeshHandle, Transform};
use shellfur_ecs::Renderable;
use shellfur_render::{ShaderSurfaces, ShellTag};

use crate::bank::ParameterBank;
use crate::error::ShellError;
use crate::params::ParameterSet;
use crate::stage::Stage;

/// One shell layer: a scene node drawing the shared mesh with the shared material.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellInstance {
    pub(crate) index: u32,
    pub(crate) entity: EntityId,
    pub(crate) mesh: MeshHandle,
    pub(crate) material: MaterialHandle,
    pub(crate) tag: ShellTag,
}

impl ShellInstance {
    /// Position in the layer stack, 0 being the base.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn material(&self) -> MaterialHandle {
        self.material
    }

    pub fn tag(&self) -> ShellTag {
        self.tag
    }
}

/// The shells of one fur, exclusively owned.
///
/// Instances are created on [`activate`](Self::activate) and destroyed on
/// [`deactivate`](Self::deactivate); nothing else creates or frees them.
/// While active, indices are exactly `0..len()` in order.
///
/// The collection is never resized in place. Changing the count means
/// `deactivate` followed by `activate`, which issues fresh entities.
#[derive(Debug, Default)]
pub struct ShellInstanceSet {
    owner: Option<EntityId>,
    mesh: Option<MeshHandle>,
    material: Option<MaterialHandle>,
    instances: Vec<ShellInstance>,
}

impl ShellInstanceSet {
    /// Build `shell_count` shells under `owner`.
    ///
    /// Fails before creating anything when the mesh or material is absent or
    /// unregistered, or the owner is not in the scene. On success the shared
    /// material has instancing enabled and every shell's tag is already on
    /// its surface.
    pub fn activate(
        stage: &mut Stage,
        owner: EntityId,
        shell_count: u32,
        mesh: Option<MeshHandle>,
        material: Option<MaterialHandle>,
    ) -> Result<Self, ShellError> {
        let mesh = mesh.ok_or(ShellError::MissingMesh)?;
        let material = material.ok_or(ShellError::MissingMaterial)?;
        if !stage.assets.contains_mesh(mesh) {
            return Err(ShellError::UnknownMesh(mesh));
        }
        if !stage.scene.contains(owner) {
            return Err(ShellError::OwnerNotFound(owner));
        }
        stage
            .assets
            .set_instancing(material, true)
            .map_err(|_| ShellError::UnknownMaterial(material))?;

        let mut set = Self {
            owner: Some(owner),
            mesh: Some(mesh),
            material: Some(material),
            instances: Vec::with_capacity(shell_count as usize),
        };
        for index in 0..shell_count {
            let Some(entity) = stage.scene.spawn_child(owner, Transform::IDENTITY) else {
                set.deactivate(stage);
                return Err(ShellError::OwnerNotFound(owner));
            };
            stage.components.set_name(entity, format!("Shell {index}"));
            stage
                .components
                .set_renderable(entity, Renderable { mesh, material });
            let tag = ShellTag::new(index);
            stage.surfaces.set_instance_tag(entity, tag);
            set.instances.push(ShellInstance {
                index,
                entity,
                mesh,
                material,
                tag,
            });
        }

        tracing::info!(
            owner = %owner.short(),
            shells = shell_count,
            ?material,
            "activated shell instances"
        );
        Ok(set)
    }

    /// Destroy every owned shell. Safe to call repeatedly or on a set that never activated.
    pub fn deactivate(&mut self, stage: &mut Stage) {
        if self.owner.is_none() && self.instances.is_empty() {
            return;
        }
        let destroyed = self.instances.len();
        for instance in self.instances.drain(..) {
            stage.surfaces.clear_instance(instance.entity);
            stage.components.remove_entity(instance.entity);
            stage.scene.despawn(instance.entity);
        }
        self.instances = Vec::new();
        self.owner = None;
        self.mesh = None;
        self.material = None;
        tracing::info!(destroyed, "deactivated shell instances");
    }

    /// Re-derive each shell's tag and republish everything through the bank.
    ///
    /// Does not resize: a count change needs a deactivate/activate round-trip.
    /// Returns `false` (and writes nothing) while inactive.
    pub fn reindex(
        &mut self,
        bank: &mut ParameterBank,
        params: &ParameterSet,
        surfaces: &mut ShaderSurfaces,
    ) -> bool {
        if !self.is_active() {
            tracing::trace!("reindex on inactive shell set ignored");
            return false;
        }
        for instance in &mut self.instances {
            instance.tag = ShellTag::new(instance.index);
        }
        if params.shell_count as usize != self.instances.len() {
            tracing::debug!(
                requested = params.shell_count,
                live = self.instances.len(),
                "reindex keeps the live shell count"
            );
        }
        bank.publish(params, self, surfaces);
        true
    }

    pub fn is_active(&self) -> bool {
        self.owner.is_some()
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    pub fn material(&self) -> Option<MaterialHandle> {
        self.material
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[ShellInstance] {
        &self.instances
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [ShellInstance] {
        &mut self.instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellfur_assets::{Material, Mesh};
    use shellfur_render::props;
    use std::collections::BTreeSet;

    fn stage_with_assets() -> (Stage, EntityId, MeshHandle, MaterialHandle) {
        let mut stage = Stage::new();
        let owner = stage.scene.spawn(Transform::default());
        let mesh = stage.assets.register_mesh(Mesh::plane(1.0, 1));
        let material = stage.assets.register_material(Material::default());
        (stage, owner, mesh, material)
    }

    #[test]
    fn activate_builds_contiguous_indices() {
        for n in [1u32, 2, 16, 256] {
            let (mut stage, owner, mesh, material) = stage_with_assets();
            let set =
                ShellInstanceSet::activate(&mut stage, owner, n, Some(mesh), Some(material))
                    .unwrap();
            assert_eq!(set.len(), n as usize);
            let indices: BTreeSet<u32> = set.instances().iter().map(|i| i.index()).collect();
            assert_eq!(indices, (0..n).collect::<BTreeSet<u32>>());
            for instance in set.instances() {
                assert_eq!(instance.tag().shell_index, instance.index());
                assert_eq!(
                    stage.surfaces.instance_tag(instance.entity()),
                    Some(instance.tag())
                );
            }
        }
    }

    #[test]
    fn activate_attaches_named_renderables_to_owner() {
        let (mut stage, owner, mesh, material) = stage_with_assets();
        let set =
            ShellInstanceSet::activate(&mut stage, owner, 3, Some(mesh), Some(material)).unwrap();
        assert_eq!(stage.scene.children(owner).len(), 3);
        let last = &set.instances()[2];
        assert_eq!(stage.scene.parent(last.entity()), Some(owner));
        assert_eq!(
            stage.components.get_name(last.entity()).unwrap().0,
            "Shell 2"
        );
        assert_eq!(
            stage.components.get_renderable(last.entity()),
            Some(&Renderable { mesh, material })
        );
        assert_eq!(stage.components.renderables_using(material).count(), 3);
    }

    #[test]
    fn activate_enables_instancing_on_shared_material() {
        let (mut stage, owner, mesh, material) = stage_with_assets();
        assert!(!stage.assets.get_material(material).unwrap().instancing);
        ShellInstanceSet::activate(&mut stage, owner, 2, Some(mesh), Some(material)).unwrap();
        assert!(stage.assets.get_material(material).unwrap().instancing);
    }

    #[test]
    fn missing_handles_fail_fast() {
        let (mut stage, owner, mesh, material) = stage_with_assets();
        let nodes = stage.scene.node_count();

        let err = ShellInstanceSet::activate(&mut stage, owner, 4, None, Some(material)).unwrap_err();
        assert!(matches!(err, ShellError::MissingMesh));
        let err = ShellInstanceSet::activate(&mut stage, owner, 4, Some(mesh), None).unwrap_err();
        assert!(matches!(err, ShellError::MissingMaterial));
        let err = ShellInstanceSet::activate(
            &mut stage,
            owner,
            4,
            Some(MeshHandle(1)),
            Some(material),
        )
        .unwrap_err();
        assert!(matches!(err, ShellError::UnknownMesh(MeshHandle(1))));
        let err = ShellInstanceSet::activate(
            &mut stage,
            owner,
            4,
            Some(mesh),
            Some(MaterialHandle(2)),
        )
        .unwrap_err();
        assert!(matches!(err, ShellError::UnknownMaterial(MaterialHandle(2))));

        assert_eq!(stage.scene.node_count(), nodes);
        assert!(stage.surfaces.instance_tags().is_empty());
        assert!(!stage.assets.get_material(material).unwrap().instancing);
    }

    #[test]
    fn missing_owner_fails_fast() {
        let (mut stage, _, mesh, material) = stage_with_assets();
        let stranger = EntityId::new();
        let err =
            ShellInstanceSet::activate(&mut stage, stranger, 4, Some(mesh), Some(material))
                .unwrap_err();
        assert!(matches!(err, ShellError::OwnerNotFound(id) if id == stranger));
    }

    #[test]
    fn deactivate_leaves_nothing_behind() {
        for n in [1u32, 256] {
            let (mut stage, owner, mesh, material) = stage_with_assets();
            let mut set =
                ShellInstanceSet::activate(&mut stage, owner, n, Some(mesh), Some(material))
                    .unwrap();
            set.deactivate(&mut stage);
            assert!(set.is_empty());
            assert!(!set.is_active());
            assert_eq!(stage.scene.node_count(), 1);
            assert!(stage.components.renderables().is_empty());
            assert!(stage.components.names().is_empty());
            assert!(stage.surfaces.instance_tags().is_empty());
        }
    }

    #[test]
    fn double_deactivate_is_noop() {
        let (mut stage, owner, mesh, material) = stage_with_assets();
        let mut set =
            ShellInstanceSet::activate(&mut stage, owner, 4, Some(mesh), Some(material)).unwrap();
        set.deactivate(&mut stage);
        let writes = stage.surfaces.write_count();
        let events = stage.scene.events().len();
        set.deactivate(&mut stage);
        assert_eq!(stage.surfaces.write_count(), writes);
        assert_eq!(stage.scene.events().len(), events);
    }

    #[test]
    fn deactivate_never_activated_is_noop() {
        let mut stage = Stage::new();
        let mut set = ShellInstanceSet::default();
        set.deactivate(&mut stage);
        assert!(!set.is_active());
        assert_eq!(stage.surfaces.write_count(), 0);
    }

    #[test]
    fn reindex_inactive_writes_nothing() {
        let mut surfaces = ShaderSurfaces::new();
        let mut bank = ParameterBank::new();
        let mut set = ShellInstanceSet::default();
        assert!(!set.reindex(&mut bank, &ParameterSet::default(), &mut surfaces));
        assert_eq!(surfaces.write_count(), 0);
        assert_eq!(bank.publish_count(), 0);
    }

    #[test]
    fn reindex_restores_tags_and_publishes() {
        let (mut stage, owner, mesh, material) = stage_with_assets();
        let mut set =
            ShellInstanceSet::activate(&mut stage, owner, 4, Some(mesh), Some(material)).unwrap();
        set.instances_mut()[2].tag = ShellTag::new(99);

        let mut bank = ParameterBank::new();
        let params = ParameterSet {
            shell_count: 4,
            ..ParameterSet::default()
        };
        assert!(set.reindex(&mut bank, &params, &mut stage.surfaces));
        let third = &set.instances()[2];
        assert_eq!(third.tag(), ShellTag::new(2));
        assert_eq!(stage.surfaces.instance_tag(third.entity()), Some(ShellTag::new(2)));
        assert_eq!(stage.surfaces.global().get_int(props::SHELL_COUNT), Some(4));
    }

    #[test]
    fn reindex_does_not_resize() {
        let (mut stage, owner, mesh, material) = stage_with_assets();
        let mut set =
            ShellInstanceSet::activate(&mut stage, owner, 4, Some(mesh), Some(material)).unwrap();
        let params = ParameterSet {
            shell_count: 8,
            ..ParameterSet::default()
        };
        set.reindex(&mut ParameterBank::new(), &params, &mut stage.surfaces);
        assert_eq!(set.len(), 4);
    }
}
