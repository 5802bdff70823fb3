//! Asset registry: content-addressed meshes and materials.
//!
//! Meshes are immutable once registered and referenced by handle only.
//! Materials are shared resources: the one mutable bit shell rendering
//! needs is the `instancing` flag, which lives on the material itself and
//! is therefore seen by every renderer that references it.

mod mesh;

pub use mesh::{Mesh, MeshVertex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shellfur_common::{Color, MaterialHandle, MeshHandle};
use std::collections::BTreeMap;

/// Name of the built-in shell texturing shader.
pub const SHELL_SHADER: &str = "shellfur/shell";

/// A material: a shader plus the flags the host renderer honours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub shader: String,
    pub base_color: [f32; 4],
    /// GPU instancing enabled. Shared by every renderer using this material.
    pub instancing: bool,
    /// Created at runtime from a shader rather than registered as an asset.
    pub runtime: bool,
}

impl Material {
    pub fn from_shader(shader: impl Into<String>) -> Self {
        let shader = shader.into();
        Self {
            name: format!("{shader} (instance)"),
            shader,
            base_color: Color::WHITE.to_array(),
            instancing: false,
            runtime: true,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "shell".into(),
            shader: SHELL_SHADER.into(),
            base_color: Color::WHITE.to_array(),
            instancing: false,
            runtime: false,
        }
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("mesh not found: {0:?}")]
    MeshNotFound(MeshHandle),
    #[error("material not found: {0:?}")]
    MaterialNotFound(MaterialHandle),
}

/// Content-addressed asset registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetStore {
    meshes: BTreeMap<MeshHandle, Mesh>,
    materials: BTreeMap<MaterialHandle, Material>,
    /// Counter salting runtime material ids so each instantiation is distinct.
    next_runtime: u64,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh and return its handle. Identical meshes share a handle.
    pub fn register_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        let mut hasher = Sha256::new();
        hasher.update(mesh.name.as_bytes());
        hasher.update((mesh.vertices.len() as u64).to_le_bytes());
        hasher.update((mesh.indices.len() as u64).to_le_bytes());
        let handle = MeshHandle(digest_u64(hasher));
        self.meshes.insert(handle, mesh);
        handle
    }

    /// Register a material asset and return its handle.
    pub fn register_material(&mut self, material: Material) -> MaterialHandle {
        let mut hasher = Sha256::new();
        hasher.update(material.name.as_bytes());
        hasher.update(material.shader.as_bytes());
        for c in &material.base_color {
            hasher.update(c.to_le_bytes());
        }
        let handle = MaterialHandle(digest_u64(hasher));
        self.materials.insert(handle, material);
        handle
    }

    /// Create a fresh material from a shader. Every call yields a new handle.
    pub fn instantiate_material(&mut self, shader: &str) -> MaterialHandle {
        let mut hasher = Sha256::new();
        hasher.update(b"runtime:");
        hasher.update(shader.as_bytes());
        hasher.update(self.next_runtime.to_le_bytes());
        self.next_runtime += 1;
        let handle = MaterialHandle(digest_u64(hasher));
        self.materials.insert(handle, Material::from_shader(shader));
        tracing::debug!(?handle, shader, "instantiated runtime material");
        handle
    }

    /// Remove a material, returning it if it was registered.
    pub fn remove_material(&mut self, handle: MaterialHandle) -> Option<Material> {
        self.materials.remove(&handle)
    }

    pub fn get_mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(&handle)
    }

    pub fn get_material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn contains_mesh(&self, handle: MeshHandle) -> bool {
        self.meshes.contains_key(&handle)
    }

    pub fn contains_material(&self, handle: MaterialHandle) -> bool {
        self.materials.contains_key(&handle)
    }

    /// Turn GPU instancing on or off for a shared material.
    pub fn set_instancing(
        &mut self,
        handle: MaterialHandle,
        enabled: bool,
    ) -> Result<(), AssetError> {
        let material = self
            .materials
            .get_mut(&handle)
            .ok_or(AssetError::MaterialNotFound(handle))?;
        material.instancing = enabled;
        Ok(())
    }

    pub fn meshes(&self) -> &BTreeMap<MeshHandle, Mesh> {
        &self.meshes
    }

    pub fn materials(&self) -> &BTreeMap<MaterialHandle, Material> {
        &self.materials
    }

    /// Number of registered assets of both kinds.
    pub fn len(&self) -> usize {
        self.meshes.len() + self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.materials.is_empty()
    }
}

fn digest_u64(hasher: Sha256) -> u64 {
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_mesh_and_material() {
        let mut store = AssetStore::new();
        let mesh = store.register_mesh(Mesh::plane(1.0, 2));
        let material = store.register_material(Material::default());
        assert!(store.get_mesh(mesh).is_some());
        assert!(store.get_material(material).is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn content_addressed_dedup() {
        let mut store = AssetStore::new();
        let a = store.register_mesh(Mesh::uv_sphere(0.5, 16, 8));
        let b = store.register_mesh(Mesh::uv_sphere(0.5, 16, 8));
        assert_eq!(a, b);
        assert_eq!(store.meshes().len(), 1);
    }

    #[test]
    fn instantiated_materials_are_distinct() {
        let mut store = AssetStore::new();
        let a = store.instantiate_material(SHELL_SHADER);
        let b = store.instantiate_material(SHELL_SHADER);
        assert_ne!(a, b);
        let m = store.get_material(a).unwrap();
        assert!(m.runtime);
        assert_eq!(m.shader, SHELL_SHADER);
    }

    #[test]
    fn instancing_flag_is_shared_state() {
        let mut store = AssetStore::new();
        let handle = store.register_material(Material::default());
        assert!(!store.get_material(handle).unwrap().instancing);
        store.set_instancing(handle, true).unwrap();
        assert!(store.get_material(handle).unwrap().instancing);
    }

    #[test]
    fn instancing_on_missing_material_fails() {
        let mut store = AssetStore::new();
        let err = store.set_instancing(MaterialHandle(42), true).unwrap_err();
        assert!(matches!(err, AssetError::MaterialNotFound(MaterialHandle(42))));
    }

    #[test]
    fn remove_material() {
        let mut store = AssetStore::new();
        let handle = store.instantiate_material("custom");
        assert!(store.remove_material(handle).is_some());
        assert!(!store.contains_material(handle));
        assert!(store.remove_material(handle).is_none());
    }
}
