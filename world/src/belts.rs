//! Belt transport engine.
//!
//! Every belt holds at most one item. Before an item leaves, the source belt
//! reserves the downstream slot so that exactly one upstream belt can feed a
//! given belt at a time. Collectors are terminal targets and accept without
//! a reservation. Belts advance on a fixed tick in registration order.

use std::{collections::BTreeMap, time::Duration};

use gridforge_core::{
    BeltSnapshot, BeltState, Capability, Direction, EntityId, Event, GridPosition, ItemId,
    Occupant, OreKind, TransferTarget, WorldPositions,
};
use log::debug;

use crate::{
    grid::Grid,
    items::{move_towards, ItemStore},
    Ledger,
};

#[derive(Clone, Copy, Debug)]
struct Belt {
    id: EntityId,
    position: GridPosition,
    facing: Direction,
    downstream: Option<GridPosition>,
    carried: Option<ItemId>,
    space_taken: bool,
    reserved_by: Option<EntityId>,
    paused: bool,
    state: BeltState,
}

impl Belt {
    fn new(id: EntityId, position: GridPosition, facing: Direction) -> Self {
        Self {
            id,
            position,
            facing,
            downstream: None,
            carried: None,
            space_taken: false,
            reserved_by: None,
            paused: false,
            state: BeltState::Idle,
        }
    }

    fn clear_slot(&mut self) {
        self.carried = None;
        self.space_taken = false;
        self.state = BeltState::Idle;
    }

    fn snapshot(&self) -> BeltSnapshot {
        BeltSnapshot {
            id: self.id,
            position: self.position,
            facing: self.facing,
            downstream: self.downstream,
            carried: self.carried,
            space_taken: self.space_taken,
            reserved_by: self.reserved_by,
            paused: self.paused,
            state: self.state,
        }
    }
}

/// Fixed-step parameters of the transport engine.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TransportParams {
    pub(crate) tick: Duration,
    pub(crate) speed: f32,
    pub(crate) epsilon: f32,
}

/// World state the engine touches while advancing.
pub(crate) struct TransportContext<'a> {
    pub(crate) grid: &'a Grid,
    pub(crate) items: &'a mut ItemStore,
    pub(crate) ledger: &'a mut Ledger,
    pub(crate) positions: &'a dyn WorldPositions,
}

/// Scheduler owning every belt in registration order.
#[derive(Debug, Default)]
pub(crate) struct BeltNetwork {
    belts: BTreeMap<EntityId, Belt>,
    order: Vec<EntityId>,
    accumulator: Duration,
}

impl BeltNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, id: EntityId, position: GridPosition, facing: Direction) {
        if self
            .belts
            .insert(id, Belt::new(id, position, facing))
            .is_none()
        {
            self.order.push(id);
        }
    }

    /// Unregisters a belt, discarding its item and unwinding every transfer touching it.
    pub(crate) fn destroy(&mut self, id: EntityId, items: &mut ItemStore, out: &mut Vec<Event>) {
        let Some(belt) = self.belts.remove(&id) else {
            return;
        };
        self.order.retain(|entity| *entity != id);

        if let Some(item) = belt.carried {
            if items.remove(item).is_some() {
                out.push(Event::ItemDiscarded {
                    item,
                    belt: Some(id),
                });
            }
        }
        self.release_target(&belt);
        self.revert_transfers_into(id);
    }

    /// Returns upstream belts transferring into `entity` to the carrying state.
    pub(crate) fn revert_transfers_into(&mut self, entity: EntityId) {
        for belt in self.belts.values_mut() {
            if let BeltState::Transferring { target } = belt.state {
                if target.entity() == entity {
                    debug!("belt {} lost its transfer target {}", belt.id.get(), entity.get());
                    belt.state = BeltState::Carrying;
                    belt.downstream = None;
                }
            }
        }
    }

    /// Clears the downstream cache of every belt whose position matches `predicate`.
    pub(crate) fn invalidate_where(&mut self, predicate: impl Fn(GridPosition) -> bool) {
        for belt in self.belts.values_mut() {
            if predicate(belt.position) {
                belt.downstream = None;
            }
        }
    }

    /// Places a new item on an empty, unreserved belt.
    pub(crate) fn place_item(
        &mut self,
        id: EntityId,
        ore: OreKind,
        items: &mut ItemStore,
        positions: &dyn WorldPositions,
        out: &mut Vec<Event>,
    ) -> Option<ItemId> {
        let Some(belt) = self.belts.get_mut(&id) else {
            debug!("ignoring item for unknown belt {}", id.get());
            return None;
        };
        if belt.carried.is_some() || belt.space_taken || belt.reserved_by.is_some() {
            debug!("belt {} is not free, item rejected", id.get());
            return None;
        }

        let item = items.spawn(ore, positions.world_position(belt.position), id);
        belt.carried = Some(item);
        belt.space_taken = true;
        belt.state = BeltState::Carrying;
        out.push(Event::ItemPlaced {
            item,
            belt: id,
            ore,
        });
        Some(item)
    }

    /// Destroys an item, aborting any transfer and releasing its reservation.
    pub(crate) fn destroy_item(
        &mut self,
        item: ItemId,
        items: &mut ItemStore,
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(removed) = items.remove(item) else {
            return false;
        };

        let mut holder = None;
        if let Some(mut belt) = self.belts.get(&removed.holder).copied() {
            if belt.carried == Some(item) {
                self.release_target(&belt);
                belt.clear_slot();
                let _ = self.belts.insert(belt.id, belt);
                holder = Some(belt.id);
            }
        }
        out.push(Event::ItemDiscarded { item, belt: holder });
        true
    }

    pub(crate) fn set_paused(&mut self, id: EntityId, paused: bool) -> bool {
        match self.belts.get_mut(&id) {
            Some(belt) => {
                belt.paused = paused;
                true
            }
            None => false,
        }
    }

    /// Re-orients a belt, cancelling an in-flight transfer.
    pub(crate) fn rotate(&mut self, id: EntityId, facing: Direction) {
        let Some(mut belt) = self.belts.get(&id).copied() else {
            return;
        };
        if matches!(belt.state, BeltState::Transferring { .. }) {
            self.release_target(&belt);
        }
        belt.facing = facing;
        belt.downstream = None;
        if belt.carried.is_some() {
            belt.state = BeltState::Carrying;
        }
        let _ = self.belts.insert(id, belt);
    }

    /// Accumulates `dt` and runs as many fixed belt ticks as it covers.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        params: TransportParams,
        context: &mut TransportContext<'_>,
        out: &mut Vec<Event>,
    ) {
        if params.tick.is_zero() {
            return;
        }
        self.accumulator = self.accumulator.saturating_add(dt);
        while self.accumulator >= params.tick {
            self.accumulator -= params.tick;
            let order = self.order.clone();
            for id in order {
                self.step(id, params, context, out);
            }
        }
    }

    fn step(
        &mut self,
        id: EntityId,
        params: TransportParams,
        context: &mut TransportContext<'_>,
        out: &mut Vec<Event>,
    ) {
        let Some(mut belt) = self.belts.get(&id).copied() else {
            return;
        };

        if let Some(item) = belt.carried {
            if !context.items.contains(item) {
                debug!("belt {} dropped vanished item {}", id.get(), item.get());
                self.release_target(&belt);
                belt.clear_slot();
            }
        }

        let Some(item) = belt.carried else {
            belt.state = BeltState::Idle;
            let _ = self.belts.insert(id, belt);
            return;
        };

        if belt.paused {
            let _ = self.belts.insert(id, belt);
            return;
        }

        let downstream = belt
            .downstream
            .unwrap_or_else(|| belt.position.offset(belt.facing));

        let target = match belt.state {
            BeltState::Transferring { target } => target,
            _ => match self.resolve_target(id, downstream, context.grid) {
                Some(target) => {
                    belt.state = BeltState::Transferring { target };
                    target
                }
                None => {
                    belt.downstream = None;
                    belt.state = BeltState::Blocked;
                    let _ = self.belts.insert(id, belt);
                    return;
                }
            },
        };
        belt.downstream = Some(downstream);

        let anchor = context.positions.world_position(downstream);
        let max_step = params.speed * params.tick.as_secs_f32();
        let arrived = match context.items.get_mut(item) {
            Some(carried) => {
                carried.position = move_towards(carried.position, anchor, max_step);
                carried.position.distance(anchor) <= params.epsilon
            }
            None => false,
        };
        if !arrived {
            let _ = self.belts.insert(id, belt);
            return;
        }

        match target {
            TransferTarget::Belt(next) => {
                if let Some(receiver) = self.belts.get_mut(&next) {
                    receiver.carried = Some(item);
                    receiver.space_taken = true;
                    receiver.reserved_by = None;
                    receiver.state = BeltState::Carrying;
                }
                if let Some(carried) = context.items.get_mut(item) {
                    carried.holder = next;
                }
                out.push(Event::ItemTransferred {
                    item,
                    from: id,
                    to: next,
                });
            }
            TransferTarget::Collector(collector) => {
                if let Some(collected) = context.items.remove(item) {
                    context.ledger.credit(collected.ore, 1);
                    out.push(Event::ItemCollected {
                        item,
                        ore: collected.ore,
                        belt: id,
                        collector,
                    });
                }
            }
        }

        belt.clear_slot();
        let _ = self.belts.insert(id, belt);
    }

    fn resolve_target(
        &mut self,
        requester: EntityId,
        downstream: GridPosition,
        grid: &Grid,
    ) -> Option<TransferTarget> {
        let Occupant { entity, kind } = grid.occupant(downstream)?;
        if kind.has(Capability::Collect) {
            return Some(TransferTarget::Collector(entity));
        }
        if !kind.has(Capability::Transport) || entity == requester {
            return None;
        }
        if self.try_reserve(requester, entity) {
            Some(TransferTarget::Belt(entity))
        } else {
            debug!(
                "belt {} could not reserve belt {}",
                requester.get(),
                entity.get()
            );
            None
        }
    }

    /// Claims the slot of `target` for `requester`; fails when reserved or taken.
    fn try_reserve(&mut self, requester: EntityId, target: EntityId) -> bool {
        match self.belts.get_mut(&target) {
            Some(belt) if belt.reserved_by.is_none() && !belt.space_taken => {
                belt.reserved_by = Some(requester);
                true
            }
            _ => false,
        }
    }

    fn release_target(&mut self, belt: &Belt) {
        if let BeltState::Transferring {
            target: TransferTarget::Belt(next),
        } = belt.state
        {
            if let Some(receiver) = self.belts.get_mut(&next) {
                if receiver.reserved_by == Some(belt.id) {
                    receiver.reserved_by = None;
                }
            }
        }
    }

    pub(crate) fn snapshots(&self) -> Vec<BeltSnapshot> {
        self.belts.values().map(Belt::snapshot).collect()
    }
}
