//! Deterministic component storage for scene nodes.
//!
//! Components are stored in BTreeMap for deterministic iteration order.
//! Each component type has its own storage keyed by EntityId.
//!
//! # Invariants
//! - All component mutations produce events.
//! - Iteration order is deterministic (BTreeMap).

use serde::{Deserialize, Serialize};
use shellfur_common::{EntityId, MaterialHandle, MeshHandle};
use std::collections::BTreeMap;

/// Human-readable name component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

/// Renderable component: a mesh drawn with a (possibly shared) material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

/// Events produced by component mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentEvent {
    NameAdded { entity: EntityId, name: String },
    NameRemoved { entity: EntityId, name: String },
    NameUpdated { entity: EntityId, old: String, new: String },
    RenderableAdded { entity: EntityId, renderable: Renderable },
    RenderableRemoved { entity: EntityId, renderable: Renderable },
    RenderableUpdated { entity: EntityId, old: Renderable, new: Renderable },
}

/// Component storage for all component types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentStore {
    names: BTreeMap<EntityId, Name>,
    renderables: BTreeMap<EntityId, Renderable>,
    #[serde(skip)]
    events: Vec<ComponentEvent>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return all pending component events.
    pub fn drain_events(&mut self) -> Vec<ComponentEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only access to pending events.
    pub fn events(&self) -> &[ComponentEvent] {
        &self.events
    }

    // --- Name ---
    pub fn set_name(&mut self, entity: EntityId, name: String) {
        if let Some(old) = self.names.get(&entity) {
            self.events.push(ComponentEvent::NameUpdated {
                entity,
                old: old.0.clone(),
                new: name.clone(),
            });
        } else {
            self.events.push(ComponentEvent::NameAdded {
                entity,
                name: name.clone(),
            });
        }
        self.names.insert(entity, Name(name));
    }

    pub fn remove_name(&mut self, entity: EntityId) -> Option<Name> {
        let removed = self.names.remove(&entity);
        if let Some(ref n) = removed {
            self.events.push(ComponentEvent::NameRemoved {
                entity,
                name: n.0.clone(),
            });
        }
        removed
    }

    pub fn get_name(&self, entity: EntityId) -> Option<&Name> {
        self.names.get(&entity)
    }

    pub fn names(&self) -> &BTreeMap<EntityId, Name> {
        &self.names
    }

    // --- Renderable ---
    pub fn set_renderable(&mut self, entity: EntityId, renderable: Renderable) {
        if let Some(old) = self.renderables.get(&entity) {
            self.events.push(ComponentEvent::RenderableUpdated {
                entity,
                old: *old,
                new: renderable,
            });
        } else {
            self.events.push(ComponentEvent::RenderableAdded {
                entity,
                renderable,
            });
        }
        self.renderables.insert(entity, renderable);
    }

    pub fn remove_renderable(&mut self, entity: EntityId) -> Option<Renderable> {
        let removed = self.renderables.remove(&entity);
        if let Some(r) = removed {
            self.events.push(ComponentEvent::RenderableRemoved {
                entity,
                renderable: r,
            });
        }
        removed
    }

    pub fn get_renderable(&self, entity: EntityId) -> Option<&Renderable> {
        self.renderables.get(&entity)
    }

    pub fn renderables(&self) -> &BTreeMap<EntityId, Renderable> {
        &self.renderables
    }

    /// Entities drawn with the given material.
    pub fn renderables_using(&self, material: MaterialHandle) -> impl Iterator<Item = EntityId> + '_ {
        self.renderables
            .iter()
            .filter(move |(_, r)| r.material == material)
            .map(|(id, _)| *id)
    }

    /// Remove all components for an entity.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.remove_name(entity);
        self.remove_renderable(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderable(mesh: u64, material: u64) -> Renderable {
        Renderable {
            mesh: MeshHandle(mesh),
            material: MaterialHandle(material),
        }
    }

    #[test]
    fn name_add_update_remove() {
        let mut store = ComponentStore::new();
        let id = EntityId::new();
        store.set_name(id, "Shell 0".into());
        store.set_name(id, "Shell 1".into());
        assert_eq!(store.get_name(id).unwrap().0, "Shell 1");

        store.remove_name(id);
        assert!(store.get_name(id).is_none());
        // Add + Update + Remove
        assert_eq!(store.events().len(), 3);
    }

    #[test]
    fn renderable_add_update_remove() {
        let mut store = ComponentStore::new();
        let id = EntityId::new();
        store.set_renderable(id, renderable(1, 2));
        store.set_renderable(id, renderable(1, 3));
        assert_eq!(store.get_renderable(id), Some(&renderable(1, 3)));
        assert!(matches!(
            store.events()[1],
            ComponentEvent::RenderableUpdated { .. }
        ));

        store.remove_renderable(id);
        assert!(store.get_renderable(id).is_none());
    }

    #[test]
    fn renderables_using_filters_by_material() {
        let mut store = ComponentStore::new();
        let a = EntityId::new();
        let b = EntityId::new();
        let c = EntityId::new();
        store.set_renderable(a, renderable(0, 7));
        store.set_renderable(b, renderable(0, 7));
        store.set_renderable(c, renderable(0, 8));
        assert_eq!(store.renderables_using(MaterialHandle(7)).count(), 2);
        assert_eq!(store.renderables_using(MaterialHandle(9)).count(), 0);
    }

    #[test]
    fn remove_entity_clears_all() {
        let mut store = ComponentStore::new();
        let id = EntityId::new();
        store.set_name(id, "Test".into());
        store.set_renderable(id, renderable(0, 0));

        store.remove_entity(id);
        assert!(store.get_name(id).is_none());
        assert!(store.get_renderable(id).is_none());
    }

    #[test]
    fn remove_missing_entity_produces_no_events() {
        let mut store = ComponentStore::new();
        store.remove_entity(EntityId::new());
        assert!(store.events().is_empty());
    }

    #[test]
    fn deterministic_iteration_order() {
        let mut store = ComponentStore::new();
        let mut ids: Vec<EntityId> = (0..50).map(|_| EntityId::new()).collect();
        for (i, id) in ids.iter().enumerate() {
            store.set_name(*id, format!("Shell {i}"));
        }
        ids.sort();
        let stored_keys: Vec<EntityId> = store.names().keys().copied().collect();
        assert_eq!(stored_keys, ids);
    }

    #[test]
    fn drain_events() {
        let mut store = ComponentStore::new();
        store.set_name(EntityId::new(), "Test".into());
        let events = store.drain_events();
        assert_eq!(events.len(), 1);
        assert!(store.events().is_empty());
    }
}
