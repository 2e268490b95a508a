//! Desk session: entity lifecycle, moves and queries.
//!
//! # Responsibility
//! - Own the arena of one session and the bag id sequence.
//! - Validate caller preconditions before any mutation.
//! - Drive linkage + aggregate propagation for every structural move.
//!
//! # Invariants
//! - Entities only move between the desk and a bag lying on the desk.
//! - A rejected operation leaves the session unchanged.
//! - The arena is created on first use and dropped whole by `teardown`.

use crate::config::DeskConfig;
use crate::model::handle::{BagId, BagRef, EntityKind, EntityRef, Epoch, ItemRef, Placement};
use crate::model::record::{BagKey, ItemKey, LocationKey};
use crate::service::error::{DeskError, DeskResult};
use crate::store::Store;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

static NEXT_EPOCH: AtomicU32 = AtomicU32::new(0);

fn next_epoch() -> Epoch {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// Direct members of one storage location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contents {
    pub items: Vec<ItemRef>,
    pub bags: Vec<BagRef>,
}

impl Contents {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.bags.is_empty()
    }
}

/// One desk with its nested bags.
///
/// Every mutating call needs `&mut self`; a `Desk` is not meant to be
/// shared across threads without external locking.
#[derive(Debug)]
pub struct Desk {
    config: DeskConfig,
    session_id: Uuid,
    epoch: Epoch,
    store: Option<Store>,
}

impl Default for Desk {
    fn default() -> Self {
        Self::new()
    }
}

impl Desk {
    /// Creates a session with default configuration.
    pub fn new() -> Self {
        Self::with_config(DeskConfig::default())
    }

    /// Creates a session with explicit configuration.
    pub fn with_config(config: DeskConfig) -> Self {
        let desk = Self {
            config,
            session_id: Uuid::new_v4(),
            epoch: next_epoch(),
            store: None,
        };
        debug!(
            "event=desk_open module=desk status=ok session={} epoch={} precondition_checks={} audit_after_mutation={}",
            desk.session_id, desk.epoch, config.precondition_checks, config.audit_after_mutation
        );
        desk
    }

    pub fn config(&self) -> DeskConfig {
        self.config
    }

    /// Stable id used to correlate this session's log events.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Generation stamped on handles issued right now.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Whether the arena exists (it is created lazily on first create).
    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    /// Number of items created since the last teardown.
    pub fn item_len(&self) -> usize {
        self.store.as_ref().map_or(0, Store::item_len)
    }

    /// Number of bags created since the last teardown.
    pub fn bag_len(&self) -> usize {
        self.store.as_ref().map_or(0, Store::bag_len)
    }

    /// Creates an item directly on the desk.
    pub fn create_item(&mut self) -> DeskResult<ItemRef> {
        let epoch = self.epoch;
        let store = self.store_or_init();
        let key = store
            .alloc_item()
            .ok_or(DeskError::CapacityExhausted(EntityKind::Item))?;
        let desk = store.desk();
        store.place_item(key, desk);

        let item = ItemRef { slot: key.0, epoch };
        debug!(
            "event=create_item module=desk status=ok session={} item={}",
            self.session_id,
            item.ordinal()
        );
        self.after_mutation("create_item");
        Ok(item)
    }

    /// Creates an empty bag directly on the desk with the next sequential id.
    pub fn create_bag(&mut self) -> DeskResult<BagRef> {
        let epoch = self.epoch;
        let store = self.store_or_init();
        let key = store
            .alloc_bag()
            .ok_or(DeskError::CapacityExhausted(EntityKind::Bag))?;
        let desk = store.desk();
        store.place_bag(key, desk);

        let bag = BagRef { slot: key.0, epoch };
        debug!(
            "event=create_bag module=desk status=ok session={} bag={}",
            self.session_id,
            bag.id()
        );
        self.after_mutation("create_bag");
        Ok(bag)
    }

    /// Moves an item or bag from the desk into `bag`.
    pub fn insert(&mut self, entity: impl Into<EntityRef>, bag: BagRef) -> DeskResult<()> {
        match entity.into() {
            EntityRef::Item(item) => self.insert_item(item, bag),
            EntityRef::Bag(inner) => self.insert_bag(inner, bag),
        }
    }

    /// Moves an item lying on the desk into a bag lying on the desk.
    ///
    /// # Errors
    /// - `NotOnDesk` / `TargetNotOnDesk` when precondition checks are on.
    /// - `StaleHandle` for handles from another epoch.
    pub fn insert_item(&mut self, item: ItemRef, bag: BagRef) -> DeskResult<()> {
        let checks = self.config.precondition_checks;
        let result = self.live_store_mut(item.into()).and_then(|(epoch, store)| {
            let item_key = resolve_item(store, epoch, item)?;
            let bag_key = resolve_bag(store, epoch, bag)?;
            if checks {
                ensure_on_desk(store, store.item(item_key).location, item.into())?;
                ensure_target_on_desk(store, bag_key, bag)?;
            }

            let former = store.lift_item(item_key);
            let interior = store.bag(bag_key).interior;
            store.place_item(item_key, interior);
            store.propagate(bag_key);
            if let Some(former) = former {
                store.propagate(former);
            }
            Ok(store.location(interior).total_items)
        });
        self.finish_move("insert", item.into(), Some(bag), result)
    }

    /// Moves a bag lying on the desk into another bag lying on the desk.
    ///
    /// The moved bag carries its whole nested total with it.
    ///
    /// # Errors
    /// - `SelfInsert` when `inner == target`.
    /// - `CycleInsert` when `target` is nested inside `inner`.
    /// - `NotOnDesk` / `TargetNotOnDesk` when precondition checks are on.
    /// - `StaleHandle` for handles from another epoch.
    pub fn insert_bag(&mut self, inner: BagRef, target: BagRef) -> DeskResult<()> {
        let checks = self.config.precondition_checks;
        let result = self.live_store_mut(inner.into()).and_then(|(epoch, store)| {
            let inner_key = resolve_bag(store, epoch, inner)?;
            let target_key = resolve_bag(store, epoch, target)?;
            if inner_key == target_key {
                return Err(DeskError::SelfInsert(inner));
            }
            if checks {
                ensure_on_desk(store, store.bag(inner_key).location, inner.into())?;
                ensure_target_on_desk(store, target_key, target)?;
            }
            ensure_not_nested(store, inner_key, target_key, inner, target)?;

            let former = store.lift_bag(inner_key);
            let interior = store.bag(target_key).interior;
            store.place_bag(inner_key, interior);
            store.propagate(target_key);
            if let Some(former) = former {
                store.propagate(former);
            }
            Ok(store.location(interior).total_items)
        });
        self.finish_move("insert", inner.into(), Some(target), result)
    }

    /// Takes an item or bag out of its bag and puts it on the desk.
    pub fn remove(&mut self, entity: impl Into<EntityRef>) -> DeskResult<()> {
        match entity.into() {
            EntityRef::Item(item) => self.remove_item(item),
            EntityRef::Bag(bag) => self.remove_bag(bag),
        }
    }

    /// Takes an item out of a bag lying on the desk.
    ///
    /// # Errors
    /// - `NotInDeskBag` when precondition checks are on.
    /// - `StaleHandle` for handles from another epoch.
    pub fn remove_item(&mut self, item: ItemRef) -> DeskResult<()> {
        let checks = self.config.precondition_checks;
        let result = self.live_store_mut(item.into()).and_then(|(epoch, store)| {
            let item_key = resolve_item(store, epoch, item)?;
            if checks {
                ensure_in_desk_bag(store, store.item(item_key).location, item.into())?;
            }

            let former = store.lift_item(item_key);
            let desk = store.desk();
            store.place_item(item_key, desk);
            if let Some(former) = former {
                store.propagate(former);
            }
            Ok(store.location(desk).total_items)
        });
        self.finish_move("remove", item.into(), None, result)
    }

    /// Takes a bag out of a bag lying on the desk.
    ///
    /// # Errors
    /// - `NotInDeskBag` when precondition checks are on.
    /// - `StaleHandle` for handles from another epoch.
    pub fn remove_bag(&mut self, bag: BagRef) -> DeskResult<()> {
        let checks = self.config.precondition_checks;
        let result = self.live_store_mut(bag.into()).and_then(|(epoch, store)| {
            let bag_key = resolve_bag(store, epoch, bag)?;
            if checks {
                ensure_in_desk_bag(store, store.bag(bag_key).location, bag.into())?;
            }

            let former = store.lift_bag(bag_key);
            let desk = store.desk();
            store.place_bag(bag_key, desk);
            if let Some(former) = former {
                store.propagate(former);
            }
            Ok(store.location(desk).total_items)
        });
        self.finish_move("remove", bag.into(), None, result)
    }

    /// Where an item or bag directly sits.
    pub fn locate(&self, entity: impl Into<EntityRef>) -> DeskResult<Placement> {
        match entity.into() {
            EntityRef::Item(item) => self.locate_item(item),
            EntityRef::Bag(bag) => self.locate_bag(bag),
        }
    }

    /// Bag directly holding `item`, or `Placement::Desk`.
    pub fn locate_item(&self, item: ItemRef) -> DeskResult<Placement> {
        let (epoch, store) = self.live_store(item.into())?;
        let key = resolve_item(store, epoch, item)?;
        Ok(placement_of(store, store.item(key).location))
    }

    /// Bag directly holding `bag`, or `Placement::Desk`.
    pub fn locate_bag(&self, bag: BagRef) -> DeskResult<Placement> {
        let (epoch, store) = self.live_store(bag.into())?;
        let key = resolve_bag(store, epoch, bag)?;
        Ok(placement_of(store, store.bag(key).location))
    }

    /// Items nested in `bag` at any depth.
    pub fn count(&self, bag: BagRef) -> DeskResult<u64> {
        let (epoch, store) = self.live_store(bag.into())?;
        let key = resolve_bag(store, epoch, bag)?;
        Ok(store.location(store.bag(key).interior).total_items)
    }

    /// Items nested anywhere on the desk.
    pub fn desk_total(&self) -> u64 {
        self.store
            .as_ref()
            .map_or(0, |store| store.location(store.desk()).total_items)
    }

    /// Sequential id of `bag`, after checking the handle is live.
    pub fn bag_id(&self, bag: BagRef) -> DeskResult<BagId> {
        let (epoch, store) = self.live_store(bag.into())?;
        let key = resolve_bag(store, epoch, bag)?;
        Ok(store.bag(key).id)
    }

    /// Items and bags lying directly on the desk.
    pub fn desk_contents(&self) -> Contents {
        match &self.store {
            Some(store) => contents_of(store, self.epoch, store.desk()),
            None => Contents::default(),
        }
    }

    /// Items and bags lying directly inside `bag`.
    pub fn contents(&self, bag: BagRef) -> DeskResult<Contents> {
        let (epoch, store) = self.live_store(bag.into())?;
        let key = resolve_bag(store, epoch, bag)?;
        Ok(contents_of(store, epoch, store.bag(key).interior))
    }

    /// Drops every location, item and bag and restarts ids at 0.
    ///
    /// Handles issued before the teardown become stale.
    pub fn teardown(&mut self) {
        let released = self.store.take();
        let previous_epoch = self.epoch;
        self.epoch = next_epoch();
        let (items, bags, locations) = released.as_ref().map_or((0, 0, 0), |store| {
            (store.item_len(), store.bag_len(), store.location_len())
        });
        info!(
            "event=teardown module=desk status=ok session={} items={} bags={} locations={} previous_epoch={} epoch={}",
            self.session_id, items, bags, locations, previous_epoch, self.epoch
        );
    }

    pub(crate) fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    pub(crate) fn live_store(&self, entity: EntityRef) -> DeskResult<(Epoch, &Store)> {
        let epoch = self.epoch;
        match &self.store {
            Some(store) if entity.epoch() == epoch => Ok((epoch, store)),
            _ => Err(stale(entity, epoch)),
        }
    }

    pub(crate) fn live_store_mut(&mut self, entity: EntityRef) -> DeskResult<(Epoch, &mut Store)> {
        let epoch = self.epoch;
        match &mut self.store {
            Some(store) if entity.epoch() == epoch => Ok((epoch, store)),
            _ => Err(stale(entity, epoch)),
        }
    }

    /// Logs the outcome of a mutation and runs the optional audit.
    pub(crate) fn finish_move(
        &self,
        op: &'static str,
        entity: EntityRef,
        target: Option<BagRef>,
        result: DeskResult<u64>,
    ) -> DeskResult<()> {
        let target = target.map_or_else(|| "desk".to_string(), |bag| bag.id().to_string());
        match result {
            Ok(total) => {
                debug!(
                    "event={} module=desk status=ok session={} entity=\"{}\" target={} target_total={}",
                    op, self.session_id, entity, target, total
                );
                self.after_mutation(op);
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event={} module=desk status=rejected session={} entity=\"{}\" target={} error=\"{}\"",
                    op, self.session_id, entity, target, err
                );
                Err(err)
            }
        }
    }

    pub(crate) fn after_mutation(&self, op: &'static str) {
        if !self.config.audit_after_mutation {
            return;
        }
        if let Err(err) = self.audit() {
            error!(
                "event=audit module=desk status=error session={} after={} error=\"{}\"",
                self.session_id, op, err
            );
        }
    }

    fn store_or_init(&mut self) -> &mut Store {
        let session_id = self.session_id;
        let epoch = self.epoch;
        self.store.get_or_insert_with(|| {
            debug!(
                "event=desk_init module=desk status=ok session={} epoch={}",
                session_id, epoch
            );
            Store::new()
        })
    }
}

fn stale(entity: EntityRef, current_epoch: Epoch) -> DeskError {
    DeskError::StaleHandle {
        entity,
        current_epoch,
    }
}

pub(crate) fn resolve_item(store: &Store, epoch: Epoch, item: ItemRef) -> DeskResult<ItemKey> {
    if item.epoch != epoch {
        return Err(stale(item.into(), epoch));
    }
    store
        .item_key(item.slot)
        .ok_or_else(|| stale(item.into(), epoch))
}

pub(crate) fn resolve_bag(store: &Store, epoch: Epoch, bag: BagRef) -> DeskResult<BagKey> {
    if bag.epoch != epoch {
        return Err(stale(bag.into(), epoch));
    }
    store
        .bag_key(bag.slot)
        .ok_or_else(|| stale(bag.into(), epoch))
}

pub(crate) fn placement_of(store: &Store, location: LocationKey) -> Placement {
    match store.holder(location) {
        None => Placement::Desk,
        Some(holder) => Placement::Bag(store.bag(holder).id),
    }
}

pub(crate) fn ensure_on_desk(
    store: &Store,
    location: LocationKey,
    entity: EntityRef,
) -> DeskResult<()> {
    if location == store.desk() {
        return Ok(());
    }
    Err(DeskError::NotOnDesk {
        entity,
        placement: placement_of(store, location),
    })
}

fn ensure_target_on_desk(store: &Store, key: BagKey, bag: BagRef) -> DeskResult<()> {
    let location = store.bag(key).location;
    if location == store.desk() {
        return Ok(());
    }
    Err(DeskError::TargetNotOnDesk {
        bag,
        placement: placement_of(store, location),
    })
}

/// Rejects a target that `inner` holds at any depth.
fn ensure_not_nested(
    store: &Store,
    inner_key: BagKey,
    target_key: BagKey,
    inner: BagRef,
    target: BagRef,
) -> DeskResult<()> {
    let mut current = target_key;
    for _ in 0..store.bag_len() {
        match store.holder(store.bag(current).location) {
            Some(holder) if holder == inner_key => {
                return Err(DeskError::CycleInsert { inner, target })
            }
            Some(holder) => current = holder,
            None => break,
        }
    }
    Ok(())
}

fn ensure_in_desk_bag(store: &Store, location: LocationKey, entity: EntityRef) -> DeskResult<()> {
    match store.holder(location) {
        Some(holder) if store.bag(holder).location == store.desk() => Ok(()),
        _ => Err(DeskError::NotInDeskBag {
            entity,
            placement: placement_of(store, location),
        }),
    }
}

fn contents_of(store: &Store, epoch: Epoch, location: LocationKey) -> Contents {
    Contents {
        items: store
            .members::<ItemKey>(location)
            .map(|key| ItemRef { slot: key.0, epoch })
            .collect(),
        bags: store
            .members::<BagKey>(location)
            .map(|key| BagRef { slot: key.0, epoch })
            .collect(),
    }
}
