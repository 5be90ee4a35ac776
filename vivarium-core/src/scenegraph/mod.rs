use std::any::{Any, TypeId};
use std::boxed::Box;
use std::collections::HashMap;

use glam::{DMat4, DVec3};
use log::debug;

pub mod components;
pub mod drawable;

pub use components::*;
pub use drawable::*;

pub type Entity = u32;

pub const NULL_ENTITY: Entity = Entity::MAX;

pub trait Component: Sized + 'static {}

impl<T: Sized + 'static> Component for T {}

// Sparse set: `sparse[entity]` indexes into the packed `dense`/`entities` pair.
pub struct VecStorage<T: Component> {
    dense: Vec<T>,
    entities: Vec<Entity>,
    sparse: Vec<Option<u32>>,
}

impl<T: Component> Default for VecStorage<T> {
    fn default() -> Self {
        Self {
            dense: Vec::new(),
            entities: Vec::new(),
            sparse: Vec::new(),
        }
    }
}

impl<T: Component> VecStorage<T> {
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.dense.iter()
    }

    pub fn iter_with_entity(
        &self,
    ) -> std::iter::Zip<std::slice::Iter<Entity>, std::slice::Iter<T>> {
        self.entities.iter().zip(self.dense.iter())
    }

    pub fn iter_with_entity_mut(
        &mut self,
    ) -> std::iter::Zip<std::slice::Iter<Entity>, std::slice::IterMut<T>> {
        self.entities.iter().zip(self.dense.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    fn slot(&self, entity: Entity) -> Option<usize> {
        let idx = (*self.sparse.get(entity as usize)?)? as usize;
        (self.entities.get(idx) == Some(&entity)).then(|| idx)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        let idx = self.slot(entity)?;
        Some(&self.dense[idx])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let idx = self.slot(entity)?;
        Some(&mut self.dense[idx])
    }

    pub fn insert(&mut self, entity: Entity, data: T) {
        if let Some(idx) = self.slot(entity) {
            self.dense[idx] = data;
            return;
        }

        let eidx = entity as usize;
        if self.sparse.len() <= eidx {
            self.sparse.resize(eidx + 1, None);
        }
        self.sparse[eidx] = Some(self.dense.len() as u32);
        self.entities.push(entity);
        self.dense.push(data);
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let idx = self.slot(entity)?;
        let last = *self.entities.last()?;
        self.sparse[last as usize] = Some(idx as u32);
        self.sparse[entity as usize] = None;
        self.entities.swap_remove(idx);
        Some(self.dense.swap_remove(idx))
    }
}

// Type-erased view of a storage so whole entities can be dropped without
// knowing every component type registered on the graph.
trait Resource: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn remove_entity(&mut self, entity: Entity);
}

impl<T: Component> Resource for VecStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }
}

pub struct Builder<'a> {
    entity: Entity,
    scene: &'a mut SceneGraph,
}

impl<'a> Builder<'a> {
    pub fn with<T: Component>(&mut self, component: T) -> &mut Self {
        self.scene.insert(self.entity, component);
        self
    }

    /// Append this entity as the last child of `parent`.
    pub fn attach(&mut self, parent: Entity) -> &mut Self {
        self.scene.link_child(parent, self.entity);
        self
    }

    pub fn build(&self) -> Entity {
        self.entity
    }
}

pub struct SceneGraph {
    components: HashMap<TypeId, Box<dyn Resource>>,
    next_entity: Entity,
    root: Entity,
    selection: Vec<Entity>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut scene = Self {
            components: HashMap::new(),
            next_entity: 0,
            root: 0,
            selection: Vec::new(),
        };

        scene.register::<Transform>();
        scene.register::<SceneNode>();
        scene.register::<Joint>();
        scene.register::<Selection>();
        scene.register::<Shape>();

        scene.root = scene.builder().with(Transform::default()).build();
        scene
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn register<T: Component>(&mut self) {
        self.components
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(VecStorage::<T>::default()));
    }

    /// Allocate a fresh, detached entity.
    pub fn builder(&mut self) -> Builder {
        let entity = self.next_entity;
        self.next_entity += 1;
        self.insert(entity, SceneNode::default());
        Builder {
            entity,
            scene: self,
        }
    }

    pub fn storage<T: Component>(&self) -> Option<&VecStorage<T>> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|r| r.as_any().downcast_ref::<VecStorage<T>>())
    }

    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut VecStorage<T>> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.as_any_mut().downcast_mut::<VecStorage<T>>())
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) {
        self.register::<T>();
        if let Some(storage) = self.storage_mut::<T>() {
            storage.insert(entity, component);
        }
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.storage_mut::<T>()?.remove(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get::<SceneNode>(entity).is_some()
    }

    pub fn entity_count(&self) -> usize {
        self.storage::<SceneNode>().map_or(0, |nodes| nodes.len())
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.get::<SceneNode>(entity)
            .map(|node| node.parent)
            .filter(|&parent| parent != NULL_ENTITY)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        let mut children = Vec::new();
        let mut child_itr = self.get::<SceneNode>(entity).map_or(NULL_ENTITY, |n| n.first);
        while child_itr != NULL_ENTITY {
            children.push(child_itr);
            child_itr = self.get::<SceneNode>(child_itr).map_or(NULL_ENTITY, |n| n.next);
        }
        children
    }

    fn link_child(&mut self, parent: Entity, child: Entity) {
        let parent_node = *self
            .get::<SceneNode>(parent)
            .expect("Parent must have Scene Node component to attach child");

        if let Some(node) = self.get_mut::<SceneNode>(child) {
            node.parent = parent;
            node.prev = parent_node.last;
            node.next = NULL_ENTITY;
        }

        if parent_node.last != NULL_ENTITY {
            if let Some(prev) = self.get_mut::<SceneNode>(parent_node.last) {
                prev.next = child;
            }
        }

        if let Some(node) = self.get_mut::<SceneNode>(parent) {
            if node.first == NULL_ENTITY {
                node.first = child;
            }
            node.last = child;
        }
    }

    fn unlink(&mut self, entity: Entity) {
        let node = match self.get::<SceneNode>(entity) {
            Some(node) => *node,
            None => return,
        };

        if node.prev != NULL_ENTITY {
            if let Some(prev) = self.get_mut::<SceneNode>(node.prev) {
                prev.next = node.next;
            }
        }
        if node.next != NULL_ENTITY {
            if let Some(next) = self.get_mut::<SceneNode>(node.next) {
                next.prev = node.prev;
            }
        }
        if let Some(parent) = self.get_mut::<SceneNode>(node.parent) {
            if parent.first == entity {
                parent.first = node.next;
            }
            if parent.last == entity {
                parent.last = node.prev;
            }
        }
    }

    /// Destroy `entity` together with its whole subtree. Returns false when
    /// the entity is not alive or is the scene root.
    pub fn despawn_recursive(&mut self, entity: Entity) -> bool {
        if entity == self.root || !self.contains(entity) {
            return false;
        }

        let mut doomed = Vec::new();
        self.dfs(entity, |e, _| doomed.push(e));

        self.unlink(entity);
        for &e in &doomed {
            for storage in self.components.values_mut() {
                storage.remove_entity(e);
            }
        }
        self.selection.retain(|e| !doomed.contains(e));
        debug!("despawned entity {} with {} descendants", entity, doomed.len() - 1);
        true
    }
}

// ---------- DFS variants ---------- //

impl SceneGraph {
    /// Pre-order walk, children visited in insertion order.
    pub fn dfs<F>(&self, root: Entity, mut func: F)
    where
        F: FnMut(Entity, &SceneGraph),
    {
        let mut stack = vec![root];
        while let Some(cur) = stack.pop() {
            func(cur, self);
            stack.extend(self.children(cur).into_iter().rev());
        }
    }

    /// Pre-order walk that threads an accumulator from parent to child.
    pub fn dfs_acc<T: Clone, F>(&self, root: Entity, acc_init: T, mut func: F)
    where
        F: FnMut(Entity, &T) -> T,
    {
        let mut stack = vec![(root, acc_init)];
        while let Some((cur_entity, parent_acc)) = stack.pop() {
            let acc = func(cur_entity, &parent_acc);
            for child in self.children(cur_entity).into_iter().rev() {
                stack.push((child, acc.clone()));
            }
        }
    }
}

// ---------- Poses ---------- //

impl SceneGraph {
    /// Transform of `entity` relative to its parent: translation, then the
    /// node's orientation frame, then its u/v/w joint rotation.
    pub fn local_pose(&self, entity: Entity) -> DMat4 {
        let transform = self
            .get::<Transform>(entity)
            .map_or(DMat4::IDENTITY, Transform::to_mat4);
        match self.get::<Joint>(entity) {
            Some(joint) => transform * joint.rotation_matrix(),
            None => transform,
        }
    }

    pub fn world_pose(&self, entity: Entity) -> DMat4 {
        let mut pose = self.local_pose(entity);
        let mut cur = self.parent(entity);
        while let Some(ancestor) = cur {
            pose = self.local_pose(ancestor) * pose;
            cur = self.parent(ancestor);
        }
        pose
    }

    pub fn world_position(&self, entity: Entity) -> DVec3 {
        self.world_pose(entity).transform_point3(DVec3::ZERO)
    }

    pub fn rotate_joint(&mut self, entity: Entity, delta: DVec3) -> Option<JointRotation> {
        self.get_mut::<Joint>(entity).map(|joint| joint.rotate(delta))
    }

    pub fn reset_pose(&mut self, entity: Entity) {
        if let Some(joint) = self.get_mut::<Joint>(entity) {
            joint.reset();
        }
    }
}

// ---------- Selection & drawing ---------- //

impl SceneGraph {
    /// Entities highlighted together when `entity` is selected: the entity
    /// itself, plus its whole subtree if it is chained.
    pub fn selection_group(&self, entity: Entity) -> Vec<Entity> {
        let chained = self
            .get::<Selection>(entity)
            .map_or(false, |selection| selection.chained);
        if !chained {
            return vec![entity];
        }
        let mut group = Vec::new();
        self.dfs(entity, |e, _| group.push(e));
        group
    }

    pub fn select(&mut self, entity: Entity) {
        self.selection = self.selection_group(entity);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_highlighted(&self, entity: Entity) -> bool {
        self.selection.contains(&entity)
    }

    pub fn initialize(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(shapes) = self.storage_mut::<Shape>() {
            for (_, shape) in shapes.iter_with_entity_mut() {
                shape.initialize(backend);
            }
        }
    }

    pub fn draw(&self, root: Entity, backend: &mut dyn RenderBackend) {
        let base = match self.parent(root) {
            Some(parent) => self.world_pose(parent),
            None => DMat4::IDENTITY,
        };
        self.dfs_acc(root, base, |e, parent_pose| {
            let pose = *parent_pose * self.local_pose(e);
            if let Some(shape) = self.get::<Shape>(e) {
                shape.draw(&pose, self.is_highlighted(e), backend);
            }
            pose
        });
    }
}
