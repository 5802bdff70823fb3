use serde::{Deserialize, Serialize};
use shellfur_common::{EntityId, Transform};
use std::collections::BTreeMap;

/// An event record produced by every mutation to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// Node was spawned with the given local transform, optionally under a parent.
    Spawned {
        id: EntityId,
        parent: Option<EntityId>,
        transform: Transform,
    },
    /// Node was despawned. Its children were detached and became roots.
    Despawned {
        id: EntityId,
        parent: Option<EntityId>,
        transform: Transform,
    },
    /// Node local transform was updated.
    TransformUpdated {
        id: EntityId,
        old: Transform,
        new: Transform,
    },
    /// One frame elapsed.
    Stepped { frame: u64, dt: f32 },
}

/// Per-node data stored in the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    /// Transform relative to the parent, or to the world for roots.
    pub transform: Transform,
    pub parent: Option<EntityId>,
}

/// The transform hierarchy every renderable hangs off.
///
/// Attachment here is for transform inheritance only. Whoever spawns a node
/// owns it and is responsible for despawning it; despawning a parent never
/// cascades.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    nodes: BTreeMap<EntityId, NodeData>,
    frame: u64,
    elapsed: f64,
    #[serde(skip)]
    event_log: Vec<SceneEvent>,
}

impl Scene {
    /// Create an empty scene at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Accumulated frame time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Read-only access to all nodes (BTreeMap for deterministic iteration).
    pub fn nodes(&self) -> &BTreeMap<EntityId, NodeData> {
        &self.nodes
    }

    /// Spawn a root node. Returns its id.
    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.insert(id, None, transform);
        id
    }

    /// Spawn a node under `parent` with a transform relative to it.
    ///
    /// Returns `None` when the parent does not exist.
    pub fn spawn_child(&mut self, parent: EntityId, local: Transform) -> Option<EntityId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = EntityId::new();
        self.insert(id, Some(parent), local);
        Some(id)
    }

    fn insert(&mut self, id: EntityId, parent: Option<EntityId>, transform: Transform) {
        self.nodes.insert(id, NodeData { transform, parent });
        self.event_log.push(SceneEvent::Spawned {
            id,
            parent,
            transform,
        });
    }

    /// Remove a node. Its children are detached and keep their local transform.
    pub fn despawn(&mut self, id: EntityId) -> Option<NodeData> {
        let data = self.nodes.remove(&id)?;
        let mut detached = 0usize;
        for node in self.nodes.values_mut() {
            if node.parent == Some(id) {
                node.parent = None;
                detached += 1;
            }
        }
        if detached > 0 {
            tracing::trace!(node = %id.short(), detached, "despawned parent, children detached");
        }
        self.event_log.push(SceneEvent::Despawned {
            id,
            parent: data.parent,
            transform: data.transform,
        });
        Some(data)
    }

    pub fn get(&self, id: EntityId) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Direct children of a node, in id order.
    pub fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// Update a node's local transform and log the change.
    pub fn set_transform(&mut self, id: EntityId, new: Transform) -> bool {
        let Some(data) = self.nodes.get_mut(&id) else {
            return false;
        };
        let old = data.transform;
        data.transform = new;
        self.event_log
            .push(SceneEvent::TransformUpdated { id, old, new });
        true
    }

    /// World transform: the local transform composed under every ancestor.
    pub fn world_transform(&self, id: EntityId) -> Option<Transform> {
        let node = self.nodes.get(&id)?;
        let mut world = node.transform;
        let mut cursor = node.parent;
        while let Some(parent_id) = cursor {
            let Some(parent) = self.nodes.get(&parent_id) else {
                break;
            };
            world = parent.transform.mul_transform(&world);
            cursor = parent.parent;
        }
        Some(world)
    }

    /// Advance the scene by one frame of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.frame += 1;
        self.elapsed += f64::from(dt);
        self.event_log.push(SceneEvent::Stepped {
            frame: self.frame,
            dt,
        });
    }

    /// Deterministic hash of the scene for comparing two runs.
    /// Uses canonical (BTreeMap) iteration order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.frame.to_le_bytes());
        for (id, node) in &self.nodes {
            mix(&mut h, id.0.as_bytes());
            if let Some(parent) = node.parent {
                mix(&mut h, parent.0.as_bytes());
            }
            let t = &node.transform;
            for v in t.position.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            for v in t.rotation.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
            for v in t.scale.to_array() {
                mix(&mut h, &v.to_le_bytes());
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn scene_starts_empty() {
        let s = Scene::new();
        assert_eq!(s.frame(), 0);
        assert_eq!(s.node_count(), 0);
    }

    #[test]
    fn spawn_and_despawn() {
        let mut s = Scene::new();
        let id = s.spawn(Transform::default());
        assert_eq!(s.node_count(), 1);
        assert!(s.get(id).is_some());

        assert!(s.despawn(id).is_some());
        assert_eq!(s.node_count(), 0);
        assert!(s.despawn(id).is_none());
    }

    #[test]
    fn spawn_child_requires_parent() {
        let mut s = Scene::new();
        assert!(s.spawn_child(EntityId::new(), Transform::default()).is_none());
        assert_eq!(s.node_count(), 0);
    }

    #[test]
    fn child_world_transform_follows_parent() {
        let mut s = Scene::new();
        let parent = s.spawn(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        let child = s.spawn_child(parent, Transform::default()).unwrap();
        assert_eq!(s.parent(child), Some(parent));
        assert_eq!(s.children(parent), vec![child]);
        assert_eq!(
            s.world_transform(child).unwrap().position,
            Vec3::new(1.0, 0.0, 0.0)
        );

        s.set_transform(parent, Transform::from_position(Vec3::new(0.0, 5.0, 0.0)));
        assert_eq!(
            s.world_transform(child).unwrap().position,
            Vec3::new(0.0, 5.0, 0.0)
        );
    }

    #[test]
    fn nested_children_compose() {
        let mut s = Scene::new();
        let a = s.spawn(Transform::from_position(Vec3::X));
        let b = s
            .spawn_child(a, Transform::from_position(Vec3::Y))
            .unwrap();
        let c = s
            .spawn_child(b, Transform::from_position(Vec3::Z))
            .unwrap();
        assert_eq!(s.world_transform(c).unwrap().position, Vec3::ONE);
    }

    #[test]
    fn despawn_parent_detaches_children() {
        let mut s = Scene::new();
        let parent = s.spawn(Transform::default());
        let child = s.spawn_child(parent, Transform::default()).unwrap();
        s.despawn(parent);
        assert!(s.contains(child));
        assert_eq!(s.parent(child), None);
    }

    #[test]
    fn step_advances_frame_and_time() {
        let mut s = Scene::new();
        s.step(0.5);
        s.step(0.25);
        assert_eq!(s.frame(), 2);
        assert!((s.elapsed() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn events_are_recorded() {
        let mut s = Scene::new();
        let id = s.spawn(Transform::default());
        s.step(0.016);
        s.set_transform(id, Transform::from_position(Vec3::ONE));
        s.despawn(id);
        assert_eq!(s.events().len(), 4);
        let drained = s.drain_events();
        assert_eq!(drained.len(), 4);
        assert!(s.events().is_empty());
    }

    #[test]
    fn set_transform_on_missing_node_is_false() {
        let mut s = Scene::new();
        assert!(!s.set_transform(EntityId::new(), Transform::default()));
        assert!(s.events().is_empty());
    }

    #[test]
    fn state_hash_tracks_transforms() {
        let mut s = Scene::new();
        let id = s.spawn(Transform::default());
        let before = s.state_hash();
        s.set_transform(id, Transform::from_position(Vec3::X));
        assert_ne!(before, s.state_hash());
        s.set_transform(id, Transform::default());
        assert_eq!(before, s.state_hash());
    }
}
