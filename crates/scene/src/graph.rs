use glam::{Mat4, Vec3};
use shapez_common::Transform;
use std::sync::Arc;

use crate::material::{Color, Material};
use crate::mesh::Geometry;

/// Index of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A drawable: shared geometry painted with a shared material.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient { color: Color, intensity: f32 },
    /// Shines from the node's world position toward the origin.
    Directional {
        color: Color,
        intensity: f32,
        cast_shadow: bool,
    },
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(MeshInstance),
    Light(Light),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Errors from scene graph edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("scene node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("the scene root cannot be removed")]
    RemoveRoot,
}

/// Arena-backed transform hierarchy with a single root group.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = Node {
            name: "scene".into(),
            transform: Transform::default(),
            kind: NodeKind::Group,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Attach a new node under `parent`.
    pub fn add(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> Result<NodeId, SceneError> {
        if self.get(parent).is_none() {
            return Err(SceneError::UnknownNode(parent));
        }
        let node = Node {
            name: name.into(),
            transform,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// Remove a node and everything below it.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RemoveRoot);
        }
        let parent = self
            .get(id)
            .ok_or(SceneError::UnknownNode(id))?
            .parent;
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        self.free_subtree(id);
        Ok(())
    }

    /// Remove every child subtree of `id`, keeping `id` itself. Returns the
    /// number of direct children removed.
    pub fn clear_children(&mut self, id: NodeId) -> Result<usize, SceneError> {
        let node = self.get_mut(id).ok_or(SceneError::UnknownNode(id))?;
        let children = std::mem::take(&mut node.children);
        for child in &children {
            self.free_subtree(*child);
        }
        Ok(children.len())
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(current.0);
            }
        }
    }

    /// Local-to-world matrix of a node; identity for unknown ids.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.get(id);
        while let Some(node) = current {
            matrix = node.transform.matrix() * matrix;
            current = node.parent.and_then(|p| self.get(p));
        }
        matrix
    }

    /// Depth-first walk from the root, yielding each node with its world matrix.
    pub fn walk(&self) -> Vec<(NodeId, Mat4, &Node)> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_matrix)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            let world = parent_matrix * node.transform.matrix();
            out.push((id, world, node));
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        out
    }

    /// Every mesh reachable from the root with its world matrix.
    pub fn meshes(&self) -> Vec<(Mat4, &MeshInstance)> {
        self.walk()
            .into_iter()
            .filter_map(|(_, world, node)| match &node.kind {
                NodeKind::Mesh(mesh) => Some((world, mesh)),
                _ => None,
            })
            .collect()
    }

    /// Every light reachable from the root with its world position.
    pub fn lights(&self) -> Vec<(Vec3, &Light)> {
        self.walk()
            .into_iter()
            .filter_map(|(_, world, node)| match &node.kind {
                NodeKind::Light(light) => Some((world.w_axis.truncate(), light)),
                _ => None,
            })
            .collect()
    }
}
