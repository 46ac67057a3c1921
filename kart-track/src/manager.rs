//! The manager owning every object placed on a track.

use std::fmt;

use glam::Vec3;
use indexmap::{IndexMap, IndexSet};

use tracing::{debug, trace, instrument};

use crate::config::ItemConfig;
use crate::item::{Item, ItemType, DEFAULT_RETURN_DELAY};
use crate::object::{ExplosionReaction, ObjectBody, Placement, TrackObject, TrackObjectType};
use crate::kart::KartId;
use crate::render::{MeshId, Scene, SceneNode};


/// Unique identifier of an object in a [`TrackObjectManager`], ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


/// Meshes to use for each item type when switching items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemMeshes([MeshId; ItemType::ALL.len()]);

impl ItemMeshes {

    /// Build the table by calling the given function for each item type.
    pub fn from_fn(func: impl FnMut(ItemType) -> MeshId) -> Self {
        Self(ItemType::ALL.map(func))
    }

    #[inline]
    pub fn get(&self, item_type: ItemType) -> MeshId {
        self.0[item_type.index()]
    }

}


/// This structure owns all objects of a track, items and scenery. Objects are kept in
/// insertion order, which is the order used when updating them.
///
/// # Events
///
/// Like the world structure, events can be listened by swapping a `Vec<Event>` into the
/// manager using [`TrackObjectManager::swap_events`], events are disabled by default.
pub struct TrackObjectManager<N> {
    /// When enabled, events that happened since the last swap.
    events: Option<Vec<Event>>,
    /// The configuration given to items on creation and reset.
    config: ItemConfig,
    /// Total objects count added since the manager exists, also used to give objects a
    /// unique id.
    objects_count: u32,
    /// All objects, in insertion order.
    objects: IndexMap<ObjectId, TrackObject<N>>,
    /// Objects dropped during the race, removed on reset.
    dropped: IndexSet<ObjectId>,
    /// Some remaining time while items are switched.
    switch_time: Option<f32>,
}

impl<N: SceneNode> TrackObjectManager<N> {

    pub fn new(config: ItemConfig) -> Self {
        Self {
            events: None,
            config,
            objects_count: 0,
            objects: IndexMap::new(),
            dropped: IndexSet::new(),
            switch_time: None,
        }
    }

    /// This function can be used to swap in a new events queue and return the previous
    /// one if relevant. Giving *None* events queue disable events registration using
    /// the [`Self::push_event`] method.
    pub fn swap_events(&mut self, events: Option<Vec<Event>>) -> Option<Vec<Event>> {
        std::mem::replace(&mut self.events, events)
    }

    /// Push an event in this manager, only if events are enabled.
    #[inline]
    pub fn push_event(&mut self, event: Event) {
        if let Some(events) = &mut self.events {
            events.push(event);
        }
    }

    #[inline]
    pub fn config(&self) -> &ItemConfig {
        &self.config
    }

    fn next_id(&mut self) -> ObjectId {
        let id = self.objects_count;
        self.objects_count = self.objects_count.checked_add(1)
            .expect("object count overflow");
        ObjectId(id)
    }

    fn insert(&mut self, id: ObjectId, object: TrackObject<N>) {
        self.objects.insert(id, object);
        self.push_event(Event::Object { id, inner: ObjectEvent::Add });
    }

    /// Add an object described by the given placement, the object's node is created in
    /// the given scene.
    pub fn add<S>(&mut self, placement: &Placement, scene: &mut S) -> ObjectId
    where
        S: Scene<Node = N>,
    {
        let id = self.next_id();
        trace!("add object {id} ({:?})", placement.kind);
        let object = TrackObject::from_placement(placement, id.0, scene, &self.config);
        self.insert(id, object);
        id
    }

    /// Add an item dropped by a kart during the race, the kart cannot collect it before
    /// a short delay. Dropped items are graphical, they are removed once used up or
    /// when the manager is reset.
    pub fn drop_item<S>(
        &mut self,
        item_type: ItemType,
        position: Vec3,
        normal: Vec3,
        mesh: MeshId,
        kart: KartId,
        scene: &mut S,
    ) -> ObjectId
    where
        S: Scene<Node = N>,
    {
        let id = self.next_id();
        trace!("drop item {id} ({item_type}) by {kart}");
        let mut item = Item::new(item_type, position, normal, mesh, id.0, scene, &self.config);
        item.set_parent(kart);
        self.insert(id, TrackObject(TrackObjectType::Graphical, ObjectBody::Item(item)));
        self.dropped.insert(id);
        id
    }

    /// Post-load setup of every object, this can be called again without effect.
    pub fn init(&mut self) {
        debug!("init {} objects", self.objects.len());
        for object in self.objects.values_mut() {
            object.init();
        }
    }

    /// Update every object with the given time step, in insertion order. This also
    /// switches items back once the switch time has elapsed.
    ///
    /// Used up bubblegums leave play: dropped ones are removed, placed ones stay hidden
    /// until the next reset.
    #[instrument(skip_all)]
    pub fn update(&mut self, dt: f32) {

        let mut returned = Vec::new();
        let mut used_up = Vec::new();

        for (&id, object) in &mut self.objects {
            if object.item().is_some_and(Item::is_used_up) {
                if self.dropped.contains(&id) {
                    used_up.push(id);
                }
                continue;
            }
            let was_collected = object.item().is_some_and(Item::is_collected);
            object.update(dt);
            if was_collected && object.item().is_some_and(|item| !item.is_collected()) {
                returned.push(id);
            }
        }

        for id in returned {
            self.push_event(Event::Object { id, inner: ObjectEvent::Returned });
        }

        for id in used_up {
            trace!("item {id} used up");
            self.remove(id);
        }

        if let Some(switch_time) = &mut self.switch_time {
            *switch_time -= dt;
            if *switch_time < 0.0 {
                self.switch_back();
            }
        }

    }

    /// Reset every object to its state after loading, before a race (re)starts. Items
    /// dropped during the race are removed.
    pub fn reset(&mut self) {

        for id in std::mem::take(&mut self.dropped) {
            self.remove(id);
        }

        debug!("reset {} objects", self.objects.len());

        if self.switch_time.take().is_some() {
            self.push_event(Event::Switch { active: false });
        }

        for object in self.objects.values_mut() {
            object.reset(&self.config);
        }

    }

    /// Notify every physical object, except the source one, of an explosion at the
    /// given position. Graphical objects are never notified. Return the number of
    /// objects notified.
    pub fn handle_explosion(&mut self, pos: Vec3, source: Option<ObjectId>) -> usize {

        trace!("explosion at {pos}, source: {source:?}");

        let mut reactions = Vec::new();

        for (&id, object) in &mut self.objects {
            if !object.is_physical() || source == Some(id) {
                continue;
            }
            let reaction = object.handle_explosion(pos, &self.config);
            reactions.push((id, reaction));
        }

        let notified = reactions.len();
        for (id, reaction) in reactions {
            self.push_event(Event::Object { id, inner: ObjectEvent::Explosion { reaction } });
        }

        notified

    }

    /// Collect every item hit by the given kart at the given position, returning the
    /// ids of these items. Items the kart cannot hit yet are skipped, see
    /// [`Item::hit_kart`].
    pub fn collect_hits(&mut self, kart: KartId, pos: Vec3) -> Vec<ObjectId> {

        let mut hits = Vec::new();

        for (&id, object) in &mut self.objects {
            if let Some(item) = object.item_mut() {
                if item.hit_kart(kart, pos) {
                    item.collected(kart, DEFAULT_RETURN_DELAY);
                    hits.push(id);
                }
            }
        }

        for &id in &hits {
            self.push_event(Event::Object { id, inner: ObjectEvent::Collected { kart } });
        }

        hits

    }

    /// Switch all items to their switch target type, for the configured switch time.
    /// If items are already switched, they are switched back instead.
    pub fn switch_items(&mut self, meshes: &ItemMeshes) {

        if self.switch_time.is_some() {
            self.switch_back();
            return;
        }

        debug!("switch items for {}s", self.config.switch_time);

        for item in self.objects.values_mut().filter_map(TrackObject::item_mut) {
            let item_type = item.item_type();
            let target = item_type.switch_target();
            if target != item_type {
                item.switch_to(target, meshes.get(target));
            }
        }

        self.switch_time = Some(self.config.switch_time);
        self.push_event(Event::Switch { active: true });

    }

    fn switch_back(&mut self) {

        debug!("switch items back");

        for item in self.objects.values_mut().filter_map(TrackObject::item_mut) {
            item.switch_back();
        }

        self.switch_time = None;
        self.push_event(Event::Switch { active: false });

    }

    /// Return true if items are currently switched.
    #[inline]
    pub fn is_switched(&self) -> bool {
        self.switch_time.is_some()
    }

    /// Remove an object, its node is released. Return true if the object was present.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        if self.objects.shift_remove(&id).is_none() {
            return false;
        }
        self.dropped.swap_remove(&id);
        trace!("remove object {id}");
        self.push_event(Event::Object { id, inner: ObjectEvent::Remove });
        true
    }

    /// Remove all objects when the track is torn down.
    pub fn clear(&mut self) {
        debug!("clear {} objects", self.objects.len());
        self.objects.clear();
        self.dropped.clear();
        self.switch_time = None;
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&TrackObject<N>> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut TrackObject<N>> {
        self.objects.get_mut(&id)
    }

    pub fn get_item(&self, id: ObjectId) -> Option<&Item<N>> {
        self.objects.get(&id)?.item()
    }

    pub fn get_item_mut(&mut self, id: ObjectId) -> Option<&mut Item<N>> {
        self.objects.get_mut(&id)?.item_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all objects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &TrackObject<N>)> + '_ {
        self.objects.iter().map(|(&id, object)| (id, object))
    }

    /// Iterate over all items in insertion order.
    pub fn iter_items(&self) -> impl Iterator<Item = (ObjectId, &Item<N>)> + '_ {
        self.objects.iter().filter_map(|(&id, object)| Some((id, object.item()?)))
    }

}


/// An event that happened in the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An event with an object given its id.
    Object {
        /// The id of the object.
        id: ObjectId,
        /// Inner object event.
        inner: ObjectEvent,
    },
    /// Items have been switched, or switched back.
    Switch {
        active: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEvent {
    /// The object has been added.
    Add,
    /// The object has been removed.
    Remove,
    /// The item has been collected by a kart.
    Collected {
        kart: KartId,
    },
    /// The collected item is back on the track.
    Returned,
    /// The object has been notified of an explosion.
    Explosion {
        reaction: ExplosionReaction,
    },
}
