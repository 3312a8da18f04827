//! Renderable scene objects.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;

use lantern_scene::{PointLight, Transform};

use crate::model::Model;

/// Unique identifier of a game object.
pub type GameObjectId = u32;

/// A renderable scene object.
///
/// An object is whatever combination of components it carries: a mesh when
/// `model` is set, a point light when `point_light` is set. Models are
/// shared between objects via `Arc`.
pub struct GameObject {
    id: GameObjectId,
    /// Shared GPU mesh, if this object is drawable.
    pub model: Option<Arc<Model>>,
    /// Base color (mesh tint or light color).
    pub color: Vec3,
    /// World transform.
    pub transform: Transform,
    /// Point light component, if this object emits light.
    pub point_light: Option<PointLight>,
}

impl GameObject {
    fn new(id: GameObjectId) -> Self {
        Self {
            id,
            model: None,
            color: Vec3::ONE,
            transform: Transform::default(),
            point_light: None,
        }
    }

    /// Returns the object's id.
    #[inline]
    pub fn id(&self) -> GameObjectId {
        self.id
    }
}

/// Id-keyed collection of scene objects.
///
/// Iteration order is the id order (insertion order in practice), keeping
/// command recording deterministic across frames.
#[derive(Default)]
pub struct GameObjectMap {
    next_id: GameObjectId,
    objects: BTreeMap<GameObjectId, GameObject>,
}

impl GameObjectMap {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty object and returns a mutable reference to it.
    pub fn spawn(&mut self) -> &mut GameObject {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.entry(id).or_insert_with(|| GameObject::new(id))
    }

    /// Creates a point-light object with the given intensity, visualized
    /// radius, and color.
    pub fn spawn_point_light(
        &mut self,
        intensity: f32,
        radius: f32,
        color: Vec3,
    ) -> &mut GameObject {
        let object = self.spawn();
        object.color = color;
        object.transform.scale.x = radius;
        object.point_light = Some(PointLight::new(intensity));
        object
    }

    /// Looks up an object by id.
    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    /// Looks up an object by id, mutably.
    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    /// Iterates objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    /// Iterates objects in id order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.values_mut()
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_assigns_sequential_ids() {
        let mut map = GameObjectMap::new();
        let a = map.spawn().id();
        let b = map.spawn().id();
        assert_ne!(a, b);
        assert_eq!(b, a + 1);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_spawn_point_light_sets_components() {
        let mut map = GameObjectMap::new();
        let id = map
            .spawn_point_light(2.0, 0.1, Vec3::new(1.0, 0.0, 0.0))
            .id();

        let object = map.get(id).unwrap();
        let light = object.point_light.expect("light component should be set");
        assert_eq!(light.intensity, 2.0);
        assert_eq!(object.transform.scale.x, 0.1);
        assert_eq!(object.color, Vec3::new(1.0, 0.0, 0.0));
        assert!(object.model.is_none());
    }

    #[test]
    fn test_iteration_is_id_ordered() {
        let mut map = GameObjectMap::new();
        for _ in 0..5 {
            map.spawn();
        }
        let ids: Vec<_> = map.iter().map(|o| o.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
