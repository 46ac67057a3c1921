//! Kart identities. Karts are owned elsewhere, track objects only keep a [`KartId`]
//! that can be checked against the registry to know if the kart is still racing.

use std::fmt;


/// A lightweight identifier of a kart, made of a slot index and the generation of that
/// slot. When a kart is removed its slot generation is bumped, so any id referring to
/// the removed kart no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KartId {
    index: u32,
    generation: u32,
}

impl KartId {

    /// The slot index of this kart.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// The generation of the slot when this id was given.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

}

impl fmt::Display for KartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kart#{}v{}", self.index, self.generation)
    }
}


#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Registry of the karts currently in the race, giving each of them a [`KartId`].
#[derive(Debug, Clone, Default)]
pub struct KartRegistry {
    slots: Vec<Slot>,
    /// Indices of free slots, reused before growing the slot list.
    free: Vec<u32>,
}

impl KartRegistry {

    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new kart and return its id.
    pub fn insert(&mut self) -> KartId {

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(!slot.occupied, "free slot should not be occupied");
            slot.occupied = true;
            return KartId { index, generation: slot.generation };
        }

        let index = u32::try_from(self.slots.len()).expect("kart count overflow");
        self.slots.push(Slot { generation: 0, occupied: true });
        KartId { index, generation: 0 }

    }

    /// Remove a kart from the race, for example when it has been eliminated. Return
    /// true if the kart was present.
    pub fn remove(&mut self, id: KartId) -> bool {

        if !self.contains(id) {
            return false;
        }

        let slot = &mut self.slots[id.index as usize];
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        true

    }

    /// Return true if this id refers to a kart still in the race.
    pub fn contains(&self, id: KartId) -> bool {
        self.slots.get(id.index as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == id.generation)
    }

    /// Return the number of karts in the race.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Return true if no kart is in the race.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over ids of all karts in the race, by slot order.
    pub fn iter(&self) -> impl Iterator<Item = KartId> + '_ {
        self.slots.iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(index, slot)| KartId { index: index as u32, generation: slot.generation })
    }

}
