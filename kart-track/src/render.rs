//! Seam toward the rendering backend. Track objects only use the scene as a sink for
//! their transform and visibility, no geometry logic lives behind these traits.

use std::fmt;

use glam::Vec3;

pub mod headless;


/// Opaque reference to a mesh loaded by the rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}


/// A scene able to create nodes displaying a mesh.
pub trait Scene {

    /// The node type created by this scene.
    type Node: SceneNode;

    /// Add a node displaying the given mesh to the scene. The returned node is owned by
    /// the caller and is removed from the scene when dropped.
    fn add_mesh(&mut self, mesh: MeshId) -> Self::Node;

}

/// A node in the scene, exclusively owned by one track object. The node must release
/// its scene resources when dropped.
pub trait SceneNode {

    fn set_position(&mut self, position: Vec3);

    /// Set the rotation, in degrees, X is the pitch, Y is the heading and Z the roll.
    fn set_rotation(&mut self, rotation: Vec3);

    /// Get the rotation, in degrees, as given to [`Self::set_rotation`].
    fn rotation(&self) -> Vec3;

    fn set_scale(&mut self, scale: Vec3);

    fn scale(&self) -> Vec3;

    fn set_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool;

    /// Change the mesh displayed by this node.
    fn set_mesh(&mut self, mesh: MeshId);

    /// Hint the backend that this node can be culled using its frustum box.
    fn set_automatic_culling(&mut self, enabled: bool);

}
