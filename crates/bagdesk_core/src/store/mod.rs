//! Arena storage for the containment hierarchy.
//!
//! # Responsibility
//! - Own every storage location, item record and bag record of one session.
//! - Hand out stable arena keys; the desk is just whichever location
//!   `desk` currently names.
//!
//! # Invariants
//! - Records are only appended, never removed, until the whole store drops.
//! - Every key stored inside a record is in bounds for its arena.
//! - Exactly one location has `owner == None`, and it is `desk`.

pub(crate) mod aggregate;
pub(crate) mod linkage;

use crate::model::handle::BagId;
use crate::model::record::{
    BagKey, BagRecord, ItemKey, ItemRecord, Links, LocationKey, StorageLocation,
};

/// Largest number of records one arena accepts.
pub(crate) const MAX_SLOTS: usize = u32::MAX as usize;

#[derive(Debug, Clone)]
pub(crate) struct Store {
    locations: Vec<StorageLocation>,
    items: Vec<ItemRecord>,
    bags: Vec<BagRecord>,
    desk: LocationKey,
}

impl Store {
    /// Creates a store holding only an empty desk.
    pub(crate) fn new() -> Self {
        Self {
            locations: vec![StorageLocation::new(None)],
            items: Vec::new(),
            bags: Vec::new(),
            desk: LocationKey(0),
        }
    }

    #[inline]
    pub(crate) fn desk(&self) -> LocationKey {
        self.desk
    }

    /// Re-targets the desk role. Only inversion may call this.
    #[inline]
    pub(crate) fn set_desk(&mut self, key: LocationKey) {
        self.desk = key;
    }

    #[inline]
    pub(crate) fn location(&self, key: LocationKey) -> &StorageLocation {
        &self.locations[key.index()]
    }

    #[inline]
    pub(crate) fn location_mut(&mut self, key: LocationKey) -> &mut StorageLocation {
        &mut self.locations[key.index()]
    }

    #[inline]
    pub(crate) fn item(&self, key: ItemKey) -> &ItemRecord {
        &self.items[key.index()]
    }

    #[inline]
    pub(crate) fn item_mut(&mut self, key: ItemKey) -> &mut ItemRecord {
        &mut self.items[key.index()]
    }

    #[inline]
    pub(crate) fn bag(&self, key: BagKey) -> &BagRecord {
        &self.bags[key.index()]
    }

    #[inline]
    pub(crate) fn bag_mut(&mut self, key: BagKey) -> &mut BagRecord {
        &mut self.bags[key.index()]
    }

    pub(crate) fn item_len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn bag_len(&self) -> usize {
        self.bags.len()
    }

    pub(crate) fn location_len(&self) -> usize {
        self.locations.len()
    }

    /// Resolves a caller slot to an item key, if it was ever allocated.
    pub(crate) fn item_key(&self, slot: u32) -> Option<ItemKey> {
        ((slot as usize) < self.items.len()).then_some(ItemKey(slot))
    }

    /// Resolves a caller slot to a bag key, if it was ever allocated.
    pub(crate) fn bag_key(&self, slot: u32) -> Option<BagKey> {
        ((slot as usize) < self.bags.len()).then_some(BagKey(slot))
    }

    /// The bag whose interior `key` is, or `None` for the desk.
    #[inline]
    pub(crate) fn holder(&self, key: LocationKey) -> Option<BagKey> {
        self.location(key).owner
    }

    /// Allocates a detached item record.
    ///
    /// The record points at the desk but is not linked into any list; the
    /// caller attaches it.
    pub(crate) fn alloc_item(&mut self) -> Option<ItemKey> {
        if self.items.len() >= MAX_SLOTS {
            return None;
        }
        let key = ItemKey(self.items.len() as u32);
        self.items.push(ItemRecord {
            location: self.desk,
            links: Links::detached(),
        });
        Some(key)
    }

    /// Allocates a detached bag record plus its empty interior location.
    ///
    /// The bag id is the next sequential number, equal to its arena slot.
    pub(crate) fn alloc_bag(&mut self) -> Option<BagKey> {
        if self.bags.len() >= MAX_SLOTS || self.locations.len() >= MAX_SLOTS {
            return None;
        }
        let key = BagKey(self.bags.len() as u32);
        let interior = LocationKey(self.locations.len() as u32);
        self.locations.push(StorageLocation::new(Some(key)));
        self.bags.push(BagRecord {
            id: BagId(key.0),
            location: self.desk,
            interior,
            contribution: 0,
            links: Links::detached(),
        });
        Some(key)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::model::handle::BagId;

    #[test]
    fn new_store_has_only_an_empty_desk() {
        let store = Store::new();
        assert_eq!(store.location_len(), 1);
        assert_eq!(store.item_len(), 0);
        assert_eq!(store.bag_len(), 0);
        let desk = store.location(store.desk());
        assert!(desk.owner.is_none());
        assert_eq!(desk.total_items, 0);
    }

    #[test]
    fn alloc_bag_creates_owned_interior_with_sequential_id() {
        let mut store = Store::new();
        let first = store.alloc_bag().unwrap();
        let second = store.alloc_bag().unwrap();

        assert_eq!(store.bag(first).id, BagId(0));
        assert_eq!(store.bag(second).id, BagId(1));
        let interior = store.bag(second).interior;
        assert_eq!(store.holder(interior), Some(second));
        assert_eq!(store.location_len(), 3);
    }

    #[test]
    fn slot_lookup_rejects_unallocated_slots() {
        let mut store = Store::new();
        store.alloc_item().unwrap();
        assert!(store.item_key(0).is_some());
        assert!(store.item_key(1).is_none());
        assert!(store.bag_key(0).is_none());
    }
}
