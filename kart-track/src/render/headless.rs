//! A scene backend that only records node states, used when running without any
//! window such as in the simulator and in tests.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;

use super::{MeshId, Scene, SceneNode};


/// A scene keeping track of how many of its nodes are alive.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    live: Rc<Cell<usize>>,
    created: usize,
}

impl HeadlessScene {

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes created by this scene that are not yet dropped.
    pub fn live_nodes(&self) -> usize {
        self.live.get()
    }

    /// Total number of nodes ever created by this scene.
    pub fn created_nodes(&self) -> usize {
        self.created
    }

}

impl Scene for HeadlessScene {

    type Node = HeadlessNode;

    fn add_mesh(&mut self, mesh: MeshId) -> Self::Node {
        self.live.set(self.live.get() + 1);
        self.created += 1;
        HeadlessNode {
            live: Rc::clone(&self.live),
            mesh,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            visible: true,
            culling: false,
        }
    }

}


/// A node of [`HeadlessScene`], it just stores what it has been given.
#[derive(Debug)]
pub struct HeadlessNode {
    live: Rc<Cell<usize>>,
    mesh: MeshId,
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    visible: bool,
    culling: bool,
}

impl HeadlessNode {

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn has_automatic_culling(&self) -> bool {
        self.culling
    }

}

impl SceneNode for HeadlessNode {

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    fn rotation(&self) -> Vec3 {
        self.rotation
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    fn scale(&self) -> Vec3 {
        self.scale
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_mesh(&mut self, mesh: MeshId) {
        self.mesh = mesh;
    }

    fn set_automatic_culling(&mut self, enabled: bool) {
        self.culling = enabled;
    }

}

impl Drop for HeadlessNode {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}
