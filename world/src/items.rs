//! Items travelling across the belt network.

use std::collections::BTreeMap;

use glam::Vec3;
use gridforge_core::{EntityId, ItemId, OreKind};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Item {
    pub(crate) ore: OreKind,
    pub(crate) position: Vec3,
    pub(crate) holder: EntityId,
}

/// Owns every live item and allocates item identifiers.
#[derive(Debug)]
pub(crate) struct ItemStore {
    items: BTreeMap<ItemId, Item>,
    next_item_id: ItemId,
}

impl ItemStore {
    pub(crate) fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_item_id: ItemId::new(0),
        }
    }

    pub(crate) fn spawn(&mut self, ore: OreKind, position: Vec3, holder: EntityId) -> ItemId {
        let id = self.next_item_id;
        self.next_item_id = ItemId::new(id.get().saturating_add(1));
        let _ = self.items.insert(
            id,
            Item {
                ore,
                position,
                holder,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub(crate) fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<Item> {
        self.items.remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

/// Moves `current` toward `target` by at most `max_step`, snapping on overshoot.
pub(crate) fn move_towards(current: Vec3, target: Vec3, max_step: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_step
    }
}
