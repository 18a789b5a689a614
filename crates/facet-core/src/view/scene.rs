//! Scene container

use std::cell::RefCell;

use crate::clone::{CloneError, CloneNode, CloneRegistry, CloneResult, DeepClone};
use crate::handle::Handle;
use crate::view::item::ItemRef;

/// Axis gizmo drawn at the origin
#[derive(Debug, Clone, PartialEq)]
pub struct AxesHelper {
    /// Axis length
    pub size: f32,
}

/// Node inserted into the scene by a collaborator this crate does not know
#[derive(Debug, Clone)]
pub struct ForeignNode {
    /// Type name, for diagnostics
    pub type_name: String,
}

/// Child of the scene root
#[derive(Debug, Clone)]
pub enum SceneNode {
    /// A scene item
    Item(ItemRef),
    /// Axis helper
    Axes(AxesHelper),
    /// Unknown node
    Foreign(ForeignNode),
}

impl DeepClone for SceneNode {
    fn deep_clone(&self, registry: &mut CloneRegistry) -> CloneResult<Self> {
        match self {
            SceneNode::Item(item) => Ok(SceneNode::Item(item.deep_clone(registry)?)),
            SceneNode::Axes(axes) => Ok(SceneNode::Axes(axes.clone())),
            SceneNode::Foreign(node) => {
                tracing::error!(type_name = %node.type_name, "Cannot snapshot foreign scene node");
                Err(CloneError::Unsupported(node.type_name.clone()))
            }
        }
    }
}

/// Root of the renderable scene
#[derive(Debug, Default)]
pub struct Scene {
    children: RefCell<Vec<SceneNode>>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Handle<Scene> {
        Handle::new(Scene::default())
    }

    /// Append a node
    pub fn add(&self, node: SceneNode) {
        self.children.borrow_mut().push(node);
    }

    /// Append a scene item
    pub fn add_item(&self, item: ItemRef) {
        self.add(SceneNode::Item(item));
    }

    /// Remove a scene item; returns whether it was present
    pub fn remove_item(&self, item: &ItemRef) -> bool {
        let mut children = self.children.borrow_mut();
        let before = children.len();
        children.retain(|node| !matches!(node, SceneNode::Item(i) if i == item));
        children.len() != before
    }

    /// Check if `item` is a child
    pub fn contains_item(&self, item: &ItemRef) -> bool {
        self.children
            .borrow()
            .iter()
            .any(|node| matches!(node, SceneNode::Item(i) if i == item))
    }

    /// Scene items, in insertion order
    pub fn items(&self) -> Vec<ItemRef> {
        self.children
            .borrow()
            .iter()
            .filter_map(|node| match node {
                SceneNode::Item(item) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }

    /// All children
    pub fn children(&self) -> Vec<SceneNode> {
        self.children.borrow().clone()
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    /// Check if the scene is empty
    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    /// Replace all children
    pub fn replace_children(&self, children: Vec<SceneNode>) {
        *self.children.borrow_mut() = children;
    }
}

impl CloneNode for Scene {
    fn shallow_clone(&self, _registry: &mut CloneRegistry) -> CloneResult<Self> {
        Ok(Scene::default())
    }

    fn clone_children(
        source: &Handle<Self>,
        target: &Handle<Self>,
        registry: &mut CloneRegistry,
    ) -> CloneResult<()> {
        let children = source.children().deep_clone(registry)?;
        target.replace_children(children);
        Ok(())
    }
}
