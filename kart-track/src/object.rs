//! Track objects, either items or static scenery, and the placement records they are
//! built from.

use std::num::{ParseFloatError, ParseIntError};

use glam::Vec3;

use thiserror::Error;
use tracing::trace;

use crate::config::ItemConfig;
use crate::geom::Hpr;
use crate::item::{Item, ItemType};
use crate::render::{MeshId, Scene, SceneNode};


/// A track object, classified as physical or graphical when added, and its body.
#[derive(Debug)]
pub struct TrackObject<N>(pub TrackObjectType, pub ObjectBody<N>);

/// The different type of track objects: physical objects take part in physics and
/// explosions, graphical objects are only eye candy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackObjectType {
    Physical,
    Graphical,
}

#[derive(Debug)]
pub enum ObjectBody<N> {
    Item(Item<N>),
    Scenery(Scenery<N>),
}

/// How a track object reacted to an explosion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExplosionReaction {
    /// The object is not affected.
    Ignored,
    /// The item has been blown away and is now collected.
    BlownAway,
    /// The object body received an impulse.
    Pushed {
        impulse: Vec3,
    },
}

impl<N: SceneNode> TrackObject<N> {

    /// Build a track object from its placement.
    pub fn from_placement<S>(placement: &Placement, id: u32, scene: &mut S, config: &ItemConfig) -> Self
    where
        S: Scene<Node = N>,
    {

        let body = match placement.kind {
            PlacementKind::Item(item_type) => {
                ObjectBody::Item(Item::new(item_type, placement.position, placement.normal, placement.mesh, id, scene, config))
            }
            PlacementKind::Scenery => {
                ObjectBody::Scenery(Scenery::new(placement.position, placement.hpr, placement.mesh, scene))
            }
        };

        let kind = if placement.physical {
            TrackObjectType::Physical
        } else {
            TrackObjectType::Graphical
        };

        Self(kind, body)

    }

    /// Return true if this object takes part in physics and explosions.
    #[inline]
    pub fn is_physical(&self) -> bool {
        self.0 == TrackObjectType::Physical
    }

    /// Post-load setup, physical bodies are registered once.
    pub fn init(&mut self) {
        if let TrackObject(TrackObjectType::Physical, ObjectBody::Scenery(scenery)) = self {
            scenery.register();
        }
    }

    pub fn update(&mut self, dt: f32) {
        match &mut self.1 {
            ObjectBody::Item(item) => item.update(dt),
            ObjectBody::Scenery(_) => {}
        }
    }

    pub fn reset(&mut self, config: &ItemConfig) {
        match &mut self.1 {
            ObjectBody::Item(item) => item.reset(config),
            ObjectBody::Scenery(scenery) => scenery.reset(),
        }
    }

    /// React to an explosion at the given position, the reaction depends on the body.
    pub fn handle_explosion(&mut self, pos: Vec3, config: &ItemConfig) -> ExplosionReaction {
        match &mut self.1 {
            ObjectBody::Item(item) => item.handle_explosion(pos, config),
            ObjectBody::Scenery(scenery) => scenery.handle_explosion(pos, config),
        }
    }

    pub fn item(&self) -> Option<&Item<N>> {
        match &self.1 {
            ObjectBody::Item(item) => Some(item),
            ObjectBody::Scenery(_) => None,
        }
    }

    pub fn item_mut(&mut self) -> Option<&mut Item<N>> {
        match &mut self.1 {
            ObjectBody::Item(item) => Some(item),
            ObjectBody::Scenery(_) => None,
        }
    }

    pub fn scenery(&self) -> Option<&Scenery<N>> {
        match &self.1 {
            ObjectBody::Scenery(scenery) => Some(scenery),
            ObjectBody::Item(_) => None,
        }
    }

}


/// A static mesh placed on the track. When physical, its body accumulates the impulses
/// given by explosions until the next reset.
#[derive(Debug)]
pub struct Scenery<N> {
    position: Vec3,
    hpr: Hpr,
    /// True once the physical body has been registered.
    registered: bool,
    /// Sum of impulses received since last reset.
    impulse: Vec3,
    node: N,
}

impl<N: SceneNode> Scenery<N> {

    pub fn new<S>(position: Vec3, hpr: Hpr, mesh: MeshId, scene: &mut S) -> Self
    where
        S: Scene<Node = N>,
    {

        let mut node = scene.add_mesh(mesh);
        node.set_automatic_culling(true);
        node.set_position(position);
        node.set_rotation(hpr.to_degrees());

        Self {
            position,
            hpr,
            registered: false,
            impulse: Vec3::ZERO,
            node,
        }

    }

    fn register(&mut self) {
        if !self.registered {
            trace!("register physical body at {}", self.position);
            self.registered = true;
        }
    }

    fn reset(&mut self) {
        self.impulse = Vec3::ZERO;
        self.node.set_position(self.position);
        self.node.set_rotation(self.hpr.to_degrees());
        self.node.set_visible(true);
    }

    /// Push the body away from the explosion. The impulse decreases with the square
    /// of the distance, an explosion right on the object pushes it upward.
    fn handle_explosion(&mut self, pos: Vec3, config: &ItemConfig) -> ExplosionReaction {

        let diff = self.position - pos;
        let len2 = diff.length_squared();

        let impulse = if len2 <= f32::EPSILON {
            Vec3::new(0.0, config.explosion_impulse, 0.0)
        } else {
            diff * config.explosion_impulse / len2
        };

        self.impulse += impulse;
        ExplosionReaction::Pushed { impulse }

    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Sum of impulses received since last reset.
    #[inline]
    pub fn impulse(&self) -> Vec3 {
        self.impulse
    }

    #[inline]
    pub fn node(&self) -> &N {
        &self.node
    }

}


/// What a placement record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Item(ItemType),
    Scenery,
}

/// A record describing one object placed on the track, as given by the track loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub kind: PlacementKind,
    pub position: Vec3,
    /// Normal of the surface under the object, used to orient items.
    pub normal: Vec3,
    /// Orientation of scenery objects.
    pub hpr: Hpr,
    pub mesh: MeshId,
    pub physical: bool,
}

impl Placement {

    /// Create a placement for an item laying on a flat surface.
    pub fn item(item_type: ItemType, position: Vec3, mesh: MeshId) -> Self {
        Self {
            kind: PlacementKind::Item(item_type),
            position,
            normal: Vec3::Y,
            hpr: Hpr::ZERO,
            mesh,
            physical: false,
        }
    }

    /// Create a placement for a scenery object.
    pub fn scenery(position: Vec3, mesh: MeshId) -> Self {
        Self {
            kind: PlacementKind::Scenery,
            position,
            normal: Vec3::Y,
            hpr: Hpr::ZERO,
            mesh,
            physical: false,
        }
    }

    /// Set the physical classification of this placement.
    pub fn with_physical(mut self, physical: bool) -> Self {
        self.physical = physical;
        self
    }

    /// Parse a placement from the attributes of its record. The `type` attribute is
    /// either an item name or `object` for scenery. Vectors are given as three numbers
    /// separated by spaces, `hpr` is in degrees. Unrecognized attributes are ignored.
    pub fn from_attrs<'a, I>(attrs: I) -> Result<Self, PlacementError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {

        let mut kind = None;
        let mut position = None;
        let mut mesh = None;
        let mut normal = Vec3::Y;
        let mut hpr = Hpr::ZERO;
        let mut physical = false;

        for (key, value) in attrs {
            match key {
                "type" => {
                    kind = Some(match value {
                        "object" => PlacementKind::Scenery,
                        _ => PlacementKind::Item(value.parse()?),
                    });
                }
                "xyz" => position = Some(parse_vec3(value)?),
                "normal" => normal = parse_vec3(value)?.normalize_or(Vec3::Y),
                "hpr" => hpr = Hpr::from_degrees(parse_vec3(value)?),
                "mesh" => mesh = Some(MeshId(value.trim().parse().map_err(PlacementError::InvalidMesh)?)),
                "physical" => {
                    physical = match value {
                        "true" | "1" | "y" => true,
                        "false" | "0" | "n" => false,
                        _ => return Err(PlacementError::InvalidFlag(value.to_string())),
                    };
                }
                _ => {}
            }
        }

        Ok(Self {
            kind: kind.ok_or(PlacementError::MissingAttribute("type"))?,
            position: position.ok_or(PlacementError::MissingAttribute("xyz"))?,
            normal,
            hpr,
            mesh: mesh.ok_or(PlacementError::MissingAttribute("mesh"))?,
            physical,
        })

    }

}

fn parse_vec3(value: &str) -> Result<Vec3, PlacementError> {

    let mut coords = [0.0f32; 3];
    let mut parts = value.split_whitespace();

    for coord in &mut coords {
        let part = parts.next().ok_or_else(|| PlacementError::InvalidVector(value.to_string()))?;
        *coord = part.parse().map_err(PlacementError::InvalidNumber)?;
    }

    if parts.next().is_some() {
        return Err(PlacementError::InvalidVector(value.to_string()));
    }

    Ok(Vec3::from_array(coords))

}


/// Error while reading a placement record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("missing attribute: {0}")]
    MissingAttribute(&'static str),
    #[error("unknown item type: {0}")]
    UnknownType(String),
    #[error("invalid number: {0}")]
    InvalidNumber(ParseFloatError),
    #[error("invalid vector, expected three numbers: {0}")]
    InvalidVector(String),
    #[error("invalid mesh: {0}")]
    InvalidMesh(ParseIntError),
    #[error("invalid flag: {0}")]
    InvalidFlag(String),
}


#[cfg(test)]
mod tests {

    use crate::render::headless::HeadlessScene;
    use super::*;

    #[test]
    fn parse_placement() {

        let placement = Placement::from_attrs([
            ("type", "banana"),
            ("xyz", "1 2.5 -3"),
            ("mesh", "4"),
            ("physical", "y"),
            ("lod", "far"),
        ]).unwrap();

        assert_eq!(placement.kind, PlacementKind::Item(ItemType::Banana));
        assert_eq!(placement.position, Vec3::new(1.0, 2.5, -3.0));
        assert_eq!(placement.normal, Vec3::Y);
        assert_eq!(placement.mesh, MeshId(4));
        assert!(placement.physical);

        let placement = Placement::from_attrs([
            ("type", "object"),
            ("xyz", "0 0 0"),
            ("hpr", "90 0 0"),
            ("mesh", "1"),
        ]).unwrap();

        assert_eq!(placement.kind, PlacementKind::Scenery);
        assert!(!placement.physical);
        assert!((placement.hpr.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-5);

    }

    #[test]
    fn parse_placement_errors() {
        assert_eq!(Placement::from_attrs([("xyz", "0 0 0"), ("mesh", "1")]), Err(PlacementError::MissingAttribute("type")));
        assert_eq!(Placement::from_attrs([("type", "banana"), ("mesh", "1")]), Err(PlacementError::MissingAttribute("xyz")));
        assert!(matches!(Placement::from_attrs([("type", "anvil")]), Err(PlacementError::UnknownType(_))));
        assert!(matches!(Placement::from_attrs([("type", "banana"), ("xyz", "0 0")]), Err(PlacementError::InvalidVector(_))));
        assert!(matches!(Placement::from_attrs([("type", "banana"), ("xyz", "0 0 0 0")]), Err(PlacementError::InvalidVector(_))));
        assert!(matches!(Placement::from_attrs([("type", "banana"), ("xyz", "0 a 0")]), Err(PlacementError::InvalidNumber(_))));
        assert!(matches!(Placement::from_attrs([("mesh", "-1")]), Err(PlacementError::InvalidMesh(_))));
        assert!(matches!(Placement::from_attrs([("physical", "maybe")]), Err(PlacementError::InvalidFlag(_))));
    }

    #[test]
    fn scenery_explosion() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig { explosion_impulse: 100.0, ..Default::default() };

        let placement = Placement::scenery(Vec3::new(2.0, 0.0, 0.0), MeshId(1)).with_physical(true);
        let mut object = TrackObject::from_placement(&placement, 0, &mut scene, &config);
        assert!(object.is_physical());

        object.init();
        object.init();
        assert!(object.scenery().unwrap().is_registered());

        let reaction = object.handle_explosion(Vec3::ZERO, &config);
        assert_eq!(reaction, ExplosionReaction::Pushed { impulse: Vec3::new(50.0, 0.0, 0.0) });

        let reaction = object.handle_explosion(Vec3::new(2.0, 0.0, 0.0), &config);
        assert_eq!(reaction, ExplosionReaction::Pushed { impulse: Vec3::new(0.0, 100.0, 0.0) });
        assert_eq!(object.scenery().unwrap().impulse(), Vec3::new(50.0, 100.0, 0.0));

        object.reset(&config);
        assert_eq!(object.scenery().unwrap().impulse(), Vec3::ZERO);

    }

    #[test]
    fn graphical_not_registered() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();

        let mut object = TrackObject::from_placement(&Placement::scenery(Vec3::ZERO, MeshId(1)), 0, &mut scene, &config);
        assert!(!object.is_physical());
        object.init();
        assert!(!object.scenery().unwrap().is_registered());

        let object = TrackObject::from_placement(&Placement::item(ItemType::NitroBig, Vec3::ZERO, MeshId(2)), 7, &mut scene, &config);
        assert_eq!(object.item().unwrap().item_id(), 7);
        assert!(object.scenery().is_none());

    }

}
