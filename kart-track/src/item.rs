//! Items placed on the track that karts can drive over, such as bonus boxes, bananas,
//! nitro cans and bubblegums.

use std::str::FromStr;
use std::fmt;

use glam::Vec3;

use tracing::trace;

use crate::geom::{self, Hpr};
use crate::config::ItemConfig;
use crate::kart::{KartId, KartRegistry};
use crate::render::{MeshId, Scene, SceneNode};
use crate::object::{ExplosionReaction, PlacementError};


/// Default delay in seconds before a collected item returns on track.
pub const DEFAULT_RETURN_DELAY: f32 = 2.0;
/// Time during which a kart cannot collect an item it has just dropped.
pub const DROP_DEACTIVATE_TIME: f32 = 1.5;
/// Time during which a bubblegum cannot hit again the kart that just drove over it.
pub const BUBBLEGUM_DEACTIVATE_TIME: f32 = 0.5;
/// Last part of the return delay during which the item grows back to its full size.
pub const GROW_IN_TIME: f32 = 1.0;
/// Speed of the idle spin, in degrees per second.
pub const ROTATION_SPEED: f32 = 180.0;
/// Square of the distance under which a kart hits an item.
pub const HIT_DISTANCE_SQUARED: f32 = 1.5 * 1.5;


/// The different kinds of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    BonusBox,
    Banana,
    NitroBig,
    NitroSmall,
    Bubblegum,
}

impl ItemType {

    /// All item types, in the order of their index.
    pub const ALL: [Self; 5] = [
        Self::BonusBox,
        Self::Banana,
        Self::NitroBig,
        Self::NitroSmall,
        Self::Bubblegum,
    ];

    /// Index of this type, usable to build tables keyed by item type.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Return true if items of this type spin in place when idle. Bubblegums are the
    /// only items laying flat on the ground.
    #[inline]
    pub fn rotates(self) -> bool {
        self != Self::Bubblegum
    }

    /// Get the initial disappear counter of this item type, only bubblegums have one,
    /// the other types have -1.
    #[inline]
    pub fn initial_disappear_counter(self, config: &ItemConfig) -> i32 {
        if self == Self::Bubblegum { config.bubblegum_counter } else { -1 }
    }

    /// Get how items of this type react to a nearby explosion.
    pub fn explosion_policy(self) -> ExplosionPolicy {
        match self {
            Self::Banana |
            Self::Bubblegum => ExplosionPolicy::BlowAway,
            Self::BonusBox |
            Self::NitroBig |
            Self::NitroSmall => ExplosionPolicy::Ignore,
        }
    }

    /// Get the type items of this type become while items are switched.
    pub fn switch_target(self) -> Self {
        match self {
            Self::BonusBox => Self::Banana,
            Self::Banana => Self::BonusBox,
            Self::NitroBig |
            Self::NitroSmall => Self::Banana,
            Self::Bubblegum => Self::Bubblegum,
        }
    }

    /// The name of this type, as used in track placement records.
    pub fn name(self) -> &'static str {
        match self {
            Self::BonusBox => "item",
            Self::Banana => "banana",
            Self::NitroBig => "big-nitro",
            Self::NitroSmall => "small-nitro",
            Self::Bubblegum => "bubblegum",
        }
    }

}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ItemType {

    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "item" | "bonus-box" => Self::BonusBox,
            "banana" => Self::Banana,
            "big-nitro" => Self::NitroBig,
            "small-nitro" => Self::NitroSmall,
            "bubblegum" => Self::Bubblegum,
            _ => return Err(PlacementError::UnknownType(s.to_string())),
        })
    }

}

/// Reaction of an item type to an explosion in its radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplosionPolicy {
    /// The item stays in place.
    Ignore,
    /// The item is removed from the track and returns after the default delay.
    BlowAway,
}


/// An item on the track, it spins in place until a kart collects it, then it stays
/// hidden until its return delay elapses and grows back to full size during the last
/// second before returning.
#[derive(Debug)]
pub struct Item<N> {
    /// Current type of the item.
    item_type: ItemType,
    /// Type to restore when switching back, some only when the item is switched.
    original_type: Option<ItemType>,
    /// Derived from the type, true if the item spins when idle.
    rotate: bool,
    /// Position of the item on the track.
    position: Vec3,
    /// Initial orientation, derived from the surface normal where the item lays.
    hpr: Hpr,
    /// True while the item has been collected and is not yet back.
    collected: bool,
    /// Remaining time before the item returns, only meaningful when collected.
    time_till_return: f32,
    /// Remaining time during which the last kart to interact with this item cannot
    /// trigger it again. This can go negative, only its sign is relevant.
    deactivate_time: f32,
    /// Remaining number of times a bubblegum can be driven over, -1 for other types.
    disappear_counter: i32,
    /// True once a bubblegum has been hit with no disappear counter left.
    used_up: bool,
    /// The last kart that dropped or collected this item.
    event_handler: Option<KartId>,
    /// Identifier given by the owner of this item.
    item_id: u32,
    /// Mesh given at construction, restored when switching back.
    original_mesh: MeshId,
    /// The scene node displaying this item.
    node: N,
}

impl<N: SceneNode> Item<N> {

    /// Create a new item of the given type, placed on a surface with the given normal.
    /// The heading is always zero, the pitch and roll follow the surface.
    pub fn new<S>(
        item_type: ItemType,
        position: Vec3,
        normal: Vec3,
        mesh: MeshId,
        item_id: u32,
        scene: &mut S,
        config: &ItemConfig,
    ) -> Self
    where
        S: Scene<Node = N>,
    {

        let hpr = Hpr::from_normal(0.0, normal);

        let mut node = scene.add_mesh(mesh);
        node.set_automatic_culling(true);
        node.set_position(position);
        node.set_rotation(hpr.to_degrees());

        trace!("new item #{item_id} ({item_type}) at {position}, {hpr}");

        Self {
            item_type,
            original_type: None,
            rotate: item_type.rotates(),
            position,
            hpr,
            collected: false,
            time_till_return: 0.0,
            deactivate_time: 0.0,
            disappear_counter: item_type.initial_disappear_counter(config),
            used_up: false,
            event_handler: None,
            item_id,
            original_mesh: mesh,
            node,
        }

    }

    /// Set the type of this item and its derived properties, the node is untouched.
    pub fn set_type(&mut self, item_type: ItemType) {
        self.item_type = item_type;
        self.rotate = item_type.rotates();
    }

    /// Temporarily change this item to another type, displayed with the given mesh. The
    /// current type is saved to be restored by [`Self::switch_back`]. Switching an item
    /// that is already switched overwrites the saved type, so switching back restores
    /// the type immediately preceding the last switch.
    pub fn switch_to(&mut self, item_type: ItemType, mesh: MeshId) {
        trace!("item #{} switch {} -> {item_type}", self.item_id, self.item_type);
        self.original_type = Some(self.item_type);
        self.set_type(item_type);
        self.node.set_mesh(mesh);
    }

    /// Switch back to the type saved by [`Self::switch_to`] and to the original mesh.
    /// Nothing is done if this item is not switched, this happens for example with a
    /// bubblegum dropped while items are switched.
    pub fn switch_back(&mut self) {

        let Some(original_type) = self.original_type.take() else {
            return;
        };

        trace!("item #{} switch back {} -> {original_type}", self.item_id, self.item_type);
        self.set_type(original_type);
        self.node.set_mesh(self.original_mesh);

    }

    /// Reset the item before a race starts or restarts.
    pub fn reset(&mut self, config: &ItemConfig) {

        self.collected = false;
        self.used_up = false;
        self.time_till_return = 0.0;
        self.deactivate_time = 0.0;

        self.switch_back();
        self.disappear_counter = self.item_type.initial_disappear_counter(config);

        self.node.set_visible(true);
        self.node.set_scale(Vec3::ONE);

    }

    /// Set the kart that dropped this item, this kart cannot collect the item for a
    /// short time.
    pub fn set_parent(&mut self, kart: KartId) {
        self.event_handler = Some(kart);
        self.deactivate_time = DROP_DEACTIVATE_TIME;
    }

    /// Update the item, spinning it when idle or bringing it back on track after being
    /// collected.
    pub fn update(&mut self, dt: f32) {

        if self.deactivate_time > 0.0 {
            self.deactivate_time -= dt;
        }

        if self.collected {

            self.time_till_return -= dt;

            if self.time_till_return < 0.0 {
                self.collected = false;
                self.node.set_scale(Vec3::ONE);
                trace!("item #{} returned", self.item_id);
            } else if self.time_till_return <= GROW_IN_TIME {
                // Grow back from nothing during the last second.
                self.node.set_visible(true);
                self.node.set_scale(Vec3::splat(1.0 - self.time_till_return));
            }

        } else if self.rotate {
            let mut rotation = self.node.rotation();
            rotation.y = geom::advance_degrees(rotation.y, dt * ROTATION_SPEED);
            self.node.set_rotation(rotation);
        }

    }

    /// Called when the given kart hits this item, the item is hidden until the return
    /// delay elapses. Eligibility of the kart is not checked here, see
    /// [`Self::hit_kart`]. A negative delay makes the item return on the next update.
    ///
    /// Bubblegums with a positive disappear counter are instead only driven over: the
    /// counter is decremented and the item stays visible, available again on the next
    /// update but not for this kart until a short delay.
    pub fn collected(&mut self, kart: KartId, return_delay: f32) {

        self.collected = true;
        self.event_handler = Some(kart);

        if self.item_type == ItemType::Bubblegum && self.disappear_counter > 0 {
            self.disappear_counter -= 1;
            self.deactivate_time = BUBBLEGUM_DEACTIVATE_TIME;
            self.time_till_return = -1.0;
            trace!("item #{} driven over by {kart}, {} left", self.item_id, self.disappear_counter);
        } else {
            if self.item_type == ItemType::Bubblegum && self.disappear_counter == 0 {
                self.used_up = true;
            }
            trace!("item #{} collected by {kart}, return in {return_delay}", self.item_id);
            self.hide(return_delay);
        }

    }

    /// React to an explosion at the given position, depending on the item type.
    pub fn handle_explosion(&mut self, pos: Vec3, config: &ItemConfig) -> ExplosionReaction {

        if self.collected {
            return ExplosionReaction::Ignored;
        }

        let radius_squared = config.explosion_radius * config.explosion_radius;
        if self.position.distance_squared(pos) > radius_squared {
            return ExplosionReaction::Ignored;
        }

        match self.item_type.explosion_policy() {
            ExplosionPolicy::Ignore => ExplosionReaction::Ignored,
            ExplosionPolicy::BlowAway => {
                self.collected = true;
                self.hide(DEFAULT_RETURN_DELAY);
                trace!("item #{} blown away", self.item_id);
                ExplosionReaction::BlownAway
            }
        }

    }

    /// Return true if the given kart at the given position hits this item. A kart that
    /// just dropped or drove over this item cannot hit it before its deactivate time
    /// elapsed.
    pub fn hit_kart(&self, kart: KartId, kart_pos: Vec3) -> bool {
        !self.collected
            && (self.event_handler != Some(kart) || self.deactivate_time <= 0.0)
            && self.position.distance_squared(kart_pos) < HIT_DISTANCE_SQUARED
    }

    fn hide(&mut self, return_delay: f32) {
        self.time_till_return = return_delay;
        self.node.set_visible(false);
    }

    #[inline]
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Type that will be restored when switching back, none if not switched.
    #[inline]
    pub fn original_type(&self) -> Option<ItemType> {
        self.original_type
    }

    #[inline]
    pub fn rotates(&self) -> bool {
        self.rotate
    }

    #[inline]
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    #[inline]
    pub fn time_till_return(&self) -> f32 {
        self.time_till_return
    }

    #[inline]
    pub fn deactivate_time(&self) -> f32 {
        self.deactivate_time
    }

    #[inline]
    pub fn disappear_counter(&self) -> i32 {
        self.disappear_counter
    }

    /// Return true if this bubblegum has been hit with its disappear counter already
    /// at zero, it should leave play until the next reset.
    #[inline]
    pub fn is_used_up(&self) -> bool {
        self.used_up
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn hpr(&self) -> Hpr {
        self.hpr
    }

    #[inline]
    pub fn item_id(&self) -> u32 {
        self.item_id
    }

    /// The last kart that dropped or collected this item, as recorded.
    #[inline]
    pub fn event_handler(&self) -> Option<KartId> {
        self.event_handler
    }

    /// The last kart that dropped or collected this item, if still in the race.
    pub fn event_handler_in(&self, karts: &KartRegistry) -> Option<KartId> {
        self.event_handler.filter(|&kart| karts.contains(kart))
    }

    #[inline]
    pub fn node(&self) -> &N {
        &self.node
    }

}


#[cfg(test)]
mod tests {

    use crate::render::headless::{HeadlessScene, HeadlessNode};
    use super::*;

    const MESH: MeshId = MeshId(10);

    fn new_item(scene: &mut HeadlessScene, item_type: ItemType, config: &ItemConfig) -> Item<HeadlessNode> {
        Item::new(item_type, Vec3::new(5.0, 0.0, 5.0), Vec3::Y, MESH, 0, scene, config)
    }

    #[test]
    fn construction() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig { bubblegum_counter: 3, ..Default::default() };

        let item = new_item(&mut scene, ItemType::Banana, &config);
        assert!(!item.is_collected());
        assert_eq!(item.original_type(), None);
        assert_eq!(item.disappear_counter(), -1);
        assert_eq!(item.event_handler(), None);
        assert_eq!(item.node().position(), Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(item.node().mesh(), MESH);
        assert!(item.node().has_automatic_culling());

        let gum = new_item(&mut scene, ItemType::Bubblegum, &config);
        assert_eq!(gum.disappear_counter(), 3);

        assert_eq!(scene.live_nodes(), 2);
        drop(item);
        drop(gum);
        assert_eq!(scene.live_nodes(), 0);

    }

    #[test]
    fn rotate_by_type() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();

        for item_type in ItemType::ALL {
            let item = new_item(&mut scene, item_type, &config);
            assert_eq!(item.rotates(), item_type != ItemType::Bubblegum);
        }

        let mut item = new_item(&mut scene, ItemType::NitroBig, &config);
        item.set_type(ItemType::Bubblegum);
        assert!(!item.rotates());
        item.set_type(ItemType::NitroSmall);
        assert!(item.rotates());

    }

    #[test]
    fn collect_and_return() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();
        let kart = KartRegistry::new().insert();

        let mut item = new_item(&mut scene, ItemType::BonusBox, &config);
        item.collected(kart, 2.0);
        assert!(item.is_collected());
        assert!(!item.node().is_visible());
        assert_eq!(item.event_handler(), Some(kart));

        // 1.75 seconds, still hidden but growing.
        for _ in 0..7 {
            item.update(0.25);
            assert!(item.is_collected());
        }

        // Exactly 2 seconds, the delay is not yet exceeded.
        item.update(0.25);
        assert!(item.is_collected());

        item.update(0.25);
        assert!(!item.is_collected());
        assert_eq!(item.node().scale(), Vec3::ONE);
        assert!(item.node().is_visible());

    }

    #[test]
    fn grow_in() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();
        let kart = KartRegistry::new().insert();

        let mut item = new_item(&mut scene, ItemType::NitroSmall, &config);
        item.collected(kart, 2.0);

        // Still outside of the last second, stay hidden.
        item.update(0.5);
        assert_eq!(item.time_till_return(), 1.5);
        assert!(!item.node().is_visible());

        item.update(0.75);
        assert_eq!(item.time_till_return(), 0.75);
        assert!(item.node().is_visible());
        assert_eq!(item.node().scale(), Vec3::splat(0.25));

        item.update(0.5);
        assert_eq!(item.node().scale(), Vec3::splat(0.75));

    }

    #[test]
    fn negative_return_delay() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();
        let kart = KartRegistry::new().insert();

        let mut item = new_item(&mut scene, ItemType::Banana, &config);
        item.collected(kart, -1.0);
        assert!(item.is_collected());
        item.update(0.0);
        assert!(!item.is_collected());

    }

    #[test]
    fn bubblegum_counter() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig { bubblegum_counter: 2, ..Default::default() };
        let kart = KartRegistry::new().insert();

        let mut gum = new_item(&mut scene, ItemType::Bubblegum, &config);

        for expected in [1, 0] {
            gum.collected(kart, 2.0);
            assert_eq!(gum.disappear_counter(), expected);
            assert_eq!(gum.time_till_return(), -1.0);
            assert_eq!(gum.deactivate_time(), BUBBLEGUM_DEACTIVATE_TIME);
            assert!(gum.node().is_visible());
            gum.update(0.0);
            assert!(!gum.is_collected());
            assert!(!gum.is_used_up());
        }

        // Counter exhausted, the bubblegum is now collected like any other item.
        gum.collected(kart, 2.0);
        assert!(gum.is_used_up());
        assert_eq!(gum.disappear_counter(), 0);
        assert_eq!(gum.time_till_return(), 2.0);
        assert!(!gum.node().is_visible());
        gum.update(1.0);
        assert!(gum.is_collected());

    }

    #[test]
    fn rotation_wraps() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();

        let mut item = new_item(&mut scene, ItemType::BonusBox, &config);
        let mut expected = 0.0;

        for _ in 0..9 {
            item.update(0.5);
            expected = (expected + 90.0) % 360.0;
            let yaw = item.node().rotation().y;
            assert!((0.0..360.0).contains(&yaw));
            assert_eq!(yaw, expected);
        }

        // A single long step spins more than a full turn.
        item.update(2.5);
        assert_eq!(item.node().rotation().y, 180.0);

        // Pitch and roll are never touched by the spin.
        assert!(item.node().rotation().x.abs() < 1e-4);
        assert!(item.node().rotation().z.abs() < 1e-4);

        let mut gum = new_item(&mut scene, ItemType::Bubblegum, &config);
        gum.update(0.5);
        assert_eq!(gum.node().rotation().y, 0.0);

    }

    #[test]
    fn switch_last_write_wins() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();

        let mut item = new_item(&mut scene, ItemType::BonusBox, &config);
        item.switch_to(ItemType::Banana, MeshId(11));
        assert_eq!(item.original_type(), Some(ItemType::BonusBox));
        assert_eq!(item.node().mesh(), MeshId(11));

        item.switch_to(ItemType::Bubblegum, MeshId(12));
        assert!(!item.rotates());

        // Only the type preceding the last switch is remembered.
        item.switch_back();
        assert_eq!(item.item_type(), ItemType::Banana);
        assert_eq!(item.original_type(), None);
        assert_eq!(item.node().mesh(), MESH);
        assert!(item.rotates());

        item.switch_back();
        assert_eq!(item.item_type(), ItemType::Banana);
        assert_eq!(item.original_type(), None);
        assert_eq!(item.node().mesh(), MESH);

    }

    #[test]
    fn reset_pristine() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig { bubblegum_counter: 2, ..Default::default() };
        let kart = KartRegistry::new().insert();

        let mut gum = new_item(&mut scene, ItemType::Bubblegum, &config);
        gum.collected(kart, 2.0);
        gum.collected(kart, 2.0);
        gum.collected(kart, 3.0);
        gum.update(2.5);
        assert!(gum.is_collected());
        assert!(gum.is_used_up());
        assert_ne!(gum.node().scale(), Vec3::ONE);

        gum.reset(&config);
        assert!(!gum.is_collected());
        assert!(!gum.is_used_up());
        assert_eq!(gum.time_till_return(), 0.0);
        assert_eq!(gum.deactivate_time(), 0.0);
        assert_eq!(gum.original_type(), None);
        assert_eq!(gum.disappear_counter(), 2);
        assert_eq!(gum.node().scale(), Vec3::ONE);
        assert!(gum.node().is_visible());

        let mut item = new_item(&mut scene, ItemType::Banana, &config);
        item.switch_to(ItemType::Bubblegum, MeshId(12));
        item.set_parent(kart);
        item.reset(&config);
        assert_eq!(item.item_type(), ItemType::Banana);
        assert_eq!(item.original_type(), None);
        assert_eq!(item.disappear_counter(), -1);
        assert_eq!(item.deactivate_time(), 0.0);
        assert_eq!(item.node().mesh(), MESH);

    }

    #[test]
    fn parent_cannot_hit() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();
        let mut karts = KartRegistry::new();
        let dropper = karts.insert();
        let other = karts.insert();

        let mut gum = new_item(&mut scene, ItemType::Bubblegum, &config);
        let pos = gum.position();
        gum.set_parent(dropper);
        assert_eq!(gum.deactivate_time(), DROP_DEACTIVATE_TIME);

        assert!(!gum.hit_kart(dropper, pos));
        assert!(gum.hit_kart(other, pos));
        assert!(!gum.hit_kart(other, pos + Vec3::new(2.0, 0.0, 0.0)));

        gum.update(1.0);
        assert!(!gum.hit_kart(dropper, pos));
        gum.update(1.0);
        assert!(gum.deactivate_time() < 0.0);
        assert!(gum.hit_kart(dropper, pos));

        // Removing the kart from the race leaves the item without handler.
        assert_eq!(gum.event_handler_in(&karts), Some(dropper));
        karts.remove(dropper);
        assert_eq!(gum.event_handler_in(&karts), None);

    }

    #[test]
    fn explosion_policy() {

        let mut scene = HeadlessScene::new();
        let config = ItemConfig::default();

        let mut banana = new_item(&mut scene, ItemType::Banana, &config);
        let mut boxed = new_item(&mut scene, ItemType::BonusBox, &config);
        let pos = banana.position();

        assert_eq!(banana.handle_explosion(pos + Vec3::new(10.0, 0.0, 0.0), &config), ExplosionReaction::Ignored);
        assert_eq!(boxed.handle_explosion(pos, &config), ExplosionReaction::Ignored);
        assert_eq!(banana.handle_explosion(pos, &config), ExplosionReaction::BlownAway);
        assert!(banana.is_collected());
        assert!(!banana.node().is_visible());
        assert_eq!(banana.handle_explosion(pos, &config), ExplosionReaction::Ignored);

    }

    #[test]
    fn parse_type() {
        assert_eq!("item".parse::<ItemType>().unwrap(), ItemType::BonusBox);
        assert_eq!("small-nitro".parse::<ItemType>().unwrap(), ItemType::NitroSmall);
        for item_type in ItemType::ALL {
            assert_eq!(item_type.name().parse::<ItemType>().unwrap(), item_type);
        }
        assert!(matches!("anvil".parse::<ItemType>(), Err(PlacementError::UnknownType(_))));
    }

}
