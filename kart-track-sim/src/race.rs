//! A headless race on a circular track, karts drive around and interact with the items
//! placed on it.

use std::f32::consts::TAU;

use glam::Vec3;

use tracing::{debug, info, instrument, trace};

use kart_track::config::ItemConfig;
use kart_track::item::ItemType;
use kart_track::kart::{KartId, KartRegistry};
use kart_track::manager::{Event, ItemMeshes, ObjectEvent, ObjectId, TrackObjectManager};
use kart_track::object::{Placement, PlacementError, PlacementKind};
use kart_track::render::MeshId;
use kart_track::render::headless::{HeadlessNode, HeadlessScene};


/// Fixed simulation step, 60 ticks per second.
pub const DT: f32 = 1.0 / 60.0;

/// Radius of the circle karts are driving on.
const TRACK_RADIUS: f32 = 30.0;
/// Distance behind a kart where it drops its bubblegum.
const DROP_DISTANCE: f32 = 2.0;

const SWITCH_AT: f32 = 10.0;
const EXPLODE_AT: f32 = 25.0;
const ELIMINATE_AT: f32 = 40.0;

/// Placement records of the demo track, as given by a track loader.
pub const TRACK: &[&[(&str, &str)]] = &[
    &[("type", "item"), ("xyz", "30 0 0"), ("mesh", "0")],
    &[("type", "item"), ("xyz", "30 0 1.2"), ("mesh", "0")],
    &[("type", "bubblegum"), ("xyz", "21.21 0 21.21"), ("mesh", "4")],
    &[("type", "banana"), ("xyz", "0 0 30"), ("mesh", "1"), ("physical", "y")],
    &[("type", "small-nitro"), ("xyz", "-30 0 0"), ("mesh", "3")],
    &[("type", "item"), ("xyz", "-21.21 0 -21.21"), ("mesh", "0")],
    &[("type", "big-nitro"), ("xyz", "0 0.5 -30"), ("normal", "0 1 0.2"), ("mesh", "2")],
    &[("type", "object"), ("xyz", "2 0 28"), ("mesh", "10"), ("physical", "y")],
    &[("type", "object"), ("xyz", "-34 0 0"), ("mesh", "10"), ("physical", "y")],
    &[("type", "object"), ("xyz", "0 0 0"), ("hpr", "45 0 0"), ("mesh", "11")],
];


/// A simulated race.
pub struct Race {
    scene: HeadlessScene,
    objects: TrackObjectManager<HeadlessNode>,
    karts: KartRegistry,
    drivers: Vec<Driver>,
    meshes: ItemMeshes,
    /// Physical scenery objects, used as explosion sources.
    rocks: Vec<ObjectId>,
    /// Events buffer swapped with the manager on each tick.
    events: Vec<Event>,
    time: f32,
}

impl Race {

    /// Load the race from the given track records, the race still needs to be started.
    pub fn load(config: ItemConfig, records: &[&[(&str, &str)]]) -> Result<Self, PlacementError> {

        let mut scene = HeadlessScene::new();
        let mut objects = TrackObjectManager::new(config);
        let mut rocks = Vec::new();

        for record in records {
            let placement = Placement::from_attrs(record.iter().copied())?;
            let id = objects.add(&placement, &mut scene);
            if placement.physical && placement.kind == PlacementKind::Scenery {
                rocks.push(id);
            }
        }

        objects.init();
        info!("loaded {} track objects", objects.len());

        let mut karts = KartRegistry::new();
        let drivers = ["tux", "gnu", "nolok", "suzanne"].into_iter()
            .enumerate()
            .map(|(i, name)| Driver::new(karts.insert(), name, i as f32 * -0.05, 20.0 + i as f32 * 2.0))
            .collect();

        Ok(Self {
            scene,
            objects,
            karts,
            drivers,
            meshes: ItemMeshes::from_fn(|item_type| MeshId(item_type.index() as u32)),
            rocks,
            events: Vec::new(),
            time: 0.0,
        })

    }

    /// Start, or restart, the race.
    pub fn start(&mut self) {
        self.objects.reset();
        self.objects.swap_events(Some(Vec::new()));
        self.time = 0.0;
        info!("race started with {} karts", self.karts.len());
    }

    /// Run the race for the given number of ticks.
    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    #[instrument(skip_all)]
    fn tick(&mut self) {
        self.objects.update(DT);
        self.time += DT;
        self.tick_timeline();
        self.tick_drivers();
        self.drain_events();
    }

    /// Return true if the given race time has been reached during the last tick.
    fn reached(&self, at: f32) -> bool {
        self.time >= at && self.time - DT < at
    }

    fn tick_timeline(&mut self) {

        if self.reached(SWITCH_AT) {
            self.objects.switch_items(&self.meshes);
        }

        if self.reached(EXPLODE_AT) {
            let source = self.rocks.first()
                .and_then(|&rock| Some((rock, self.objects.get(rock)?.scenery()?.position())));
            if let Some((rock, pos)) = source {
                let notified = self.objects.handle_explosion(pos, Some(rock));
                info!("explosion at rock {rock}, {notified} objects notified");
            }
        }

        if self.reached(ELIMINATE_AT) {
            if let Some(driver) = self.drivers.pop() {
                self.karts.remove(driver.kart);
                let stale = self.objects.iter_items()
                    .filter(|(_, item)| item.event_handler().is_some() && item.event_handler_in(&self.karts).is_none())
                    .count();
                info!("{} eliminated, {stale} items no longer have a handler", driver.name);
            }
        }

    }

    fn tick_drivers(&mut self) {

        for driver in &mut self.drivers {

            driver.advance(DT);

            for id in self.objects.collect_hits(driver.kart, driver.position()) {
                if let Some(item) = self.objects.get_item(id) {
                    driver.hit(item.item_type());
                }
            }

            if let Some(drop_in) = &mut driver.drop_in {
                *drop_in -= DT;
                if *drop_in <= 0.0 {
                    driver.drop_in = None;
                    let pos = driver.position_at(driver.angle - DROP_DISTANCE / TRACK_RADIUS);
                    let mesh = self.meshes.get(ItemType::Bubblegum);
                    let id = self.objects.drop_item(ItemType::Bubblegum, pos, Vec3::Y, mesh, driver.kart, &mut self.scene);
                    debug!("{} dropped bubblegum {id}", driver.name);
                }
            }

        }

    }

    fn drain_events(&mut self) {

        let mut events = self.objects.swap_events(Some(std::mem::take(&mut self.events)))
            .unwrap_or_default();

        for event in events.drain(..) {
            match event {
                Event::Object { id, inner: ObjectEvent::Collected { kart } } =>
                    debug!("item {id} collected by {kart}"),
                Event::Object { id, inner: ObjectEvent::Returned } =>
                    trace!("item {id} returned"),
                Event::Object { id, inner: ObjectEvent::Explosion { reaction } } =>
                    info!("object {id} explosion reaction: {reaction:?}"),
                Event::Object { id, inner } =>
                    trace!("object {id}: {inner:?}"),
                Event::Switch { active: true } =>
                    info!("items switched at {:.2}s", self.time),
                Event::Switch { active: false } =>
                    info!("items switched back at {:.2}s", self.time),
            }
        }

        self.events = events;

    }

    /// Log the race results.
    pub fn summary(&self) {

        for driver in &self.drivers {
            let stats = &driver.stats;
            info!("{}: {:.1} laps, {} boxes, {} nitros, {} hazards, {} bubblegums dropped",
                driver.name, driver.distance / TAU, stats.boxes, stats.nitros, stats.hazards, stats.dropped);
        }

        let collected = self.objects.iter_items().filter(|(_, item)| item.is_collected()).count();
        info!("{} objects on track, {collected} items collected, {} scene nodes",
            self.objects.len(), self.scene.live_nodes());

    }

}


#[derive(Debug, Default)]
struct DriverStats {
    boxes: u32,
    nitros: u32,
    hazards: u32,
    dropped: u32,
}

/// A kart driving along the track circle.
#[derive(Debug)]
struct Driver {
    kart: KartId,
    name: &'static str,
    /// Angle on the track circle, in radians.
    angle: f32,
    /// Total angle driven since start.
    distance: f32,
    /// Base speed in meters per second.
    speed: f32,
    /// Speed factor applied while the effect time is positive.
    effect_factor: f32,
    effect_time: f32,
    /// Some time before dropping the held bubblegum.
    drop_in: Option<f32>,
    stats: DriverStats,
}

impl Driver {

    fn new(kart: KartId, name: &'static str, angle: f32, speed: f32) -> Self {
        Self {
            kart,
            name,
            angle,
            distance: 0.0,
            speed,
            effect_factor: 1.0,
            effect_time: 0.0,
            drop_in: None,
            stats: DriverStats::default(),
        }
    }

    fn position_at(&self, angle: f32) -> Vec3 {
        let (sin, cos) = angle.sin_cos();
        Vec3::new(cos, 0.0, sin) * TRACK_RADIUS
    }

    fn position(&self) -> Vec3 {
        self.position_at(self.angle)
    }

    fn advance(&mut self, dt: f32) {

        let factor = if self.effect_time > 0.0 {
            self.effect_time -= dt;
            self.effect_factor
        } else {
            1.0
        };

        let delta = self.speed * factor / TRACK_RADIUS * dt;
        self.distance += delta;
        self.angle = (self.angle + delta).rem_euclid(TAU);

    }

    fn hit(&mut self, item_type: ItemType) {
        match item_type {
            ItemType::BonusBox => {
                self.stats.boxes += 1;
                if self.drop_in.is_none() {
                    self.drop_in = Some(1.0);
                    self.stats.dropped += 1;
                }
            }
            ItemType::NitroSmall => {
                self.stats.nitros += 1;
                self.effect(1.3, 1.0);
            }
            ItemType::NitroBig => {
                self.stats.nitros += 1;
                self.effect(1.5, 2.0);
            }
            ItemType::Banana => {
                self.stats.hazards += 1;
                self.effect(0.5, 1.0);
            }
            ItemType::Bubblegum => {
                self.stats.hazards += 1;
                self.effect(0.3, 1.0);
            }
        }
    }

    fn effect(&mut self, factor: f32, time: f32) {
        self.effect_factor = factor;
        self.effect_time = time;
    }

}
