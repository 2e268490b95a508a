//! Incremental nested item counts.
//!
//! # Responsibility
//! - Keep `StorageLocation::total_items` equal to the recursive item count.
//! - Keep `BagRecord::contribution` in step with the bag's interior total.
//!
//! # Invariants
//! - Totals are only ever adjusted by deltas, never recomputed by traversal.
//! - `propagate` touches exactly one level: the location where the bag sits.
//!   Moves are limited to the desk and bags lying on it, so no deeper
//!   ancestor exists.

use super::Store;
use crate::model::record::{BagKey, ItemKey, LocationKey};

impl Store {
    #[inline]
    pub(crate) fn add_items(&mut self, location: LocationKey, amount: u64) {
        let total = &mut self.location_mut(location).total_items;
        *total = total.saturating_add(amount);
    }

    #[inline]
    pub(crate) fn sub_items(&mut self, location: LocationKey, amount: u64) {
        let total = &mut self.location_mut(location).total_items;
        *total = total.saturating_sub(amount);
    }

    /// Unlinks an item and removes its single count from its location.
    ///
    /// Returns the bag that directly held it, or `None` if it sat on the desk.
    pub(crate) fn lift_item(&mut self, item: ItemKey) -> Option<BagKey> {
        let location = self.item(item).location;
        self.detach(item);
        self.sub_items(location, 1);
        self.holder(location)
    }

    /// Links an item into `location` and counts it there.
    pub(crate) fn place_item(&mut self, item: ItemKey, location: LocationKey) {
        self.attach(item, location);
        self.add_items(location, 1);
    }

    /// Unlinks a bag and withdraws its contribution from its location.
    ///
    /// Returns the bag that directly held it, or `None` if it sat on the desk.
    pub(crate) fn lift_bag(&mut self, bag: BagKey) -> Option<BagKey> {
        let record = self.bag(bag);
        let location = record.location;
        let contribution = record.contribution;
        self.detach(bag);
        self.sub_items(location, contribution);
        self.holder(location)
    }

    /// Links a bag into `location` and adds its whole interior total there.
    pub(crate) fn place_bag(&mut self, bag: BagKey, location: LocationKey) {
        self.attach(bag, location);
        let total = self.location(self.bag(bag).interior).total_items;
        self.bag_mut(bag).contribution = total;
        self.add_items(location, total);
    }

    /// Pushes a change of `bag`'s interior total one level up.
    ///
    /// Returns the signed delta applied to the bag's location.
    pub(crate) fn propagate(&mut self, bag: BagKey) -> i128 {
        let record = self.bag(bag);
        let location = record.location;
        let previous = record.contribution;
        let current = self.location(record.interior).total_items;
        if current == previous {
            return 0;
        }

        if current > previous {
            self.add_items(location, current - previous);
        } else {
            self.sub_items(location, previous - current);
        }
        self.bag_mut(bag).contribution = current;
        i128::from(current) - i128::from(previous)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::record::{BagKey, ItemKey};
    use crate::store::Store;

    fn new_item(store: &mut Store) -> ItemKey {
        let item = store.alloc_item().unwrap();
        let desk = store.desk();
        store.place_item(item, desk);
        item
    }

    fn new_bag(store: &mut Store) -> BagKey {
        let bag = store.alloc_bag().unwrap();
        let desk = store.desk();
        store.place_bag(bag, desk);
        bag
    }

    fn total(store: &Store, bag: BagKey) -> u64 {
        store.location(store.bag(bag).interior).total_items
    }

    #[test]
    fn item_move_into_desk_bag_keeps_desk_total() {
        let mut store = Store::new();
        let item = new_item(&mut store);
        let bag = new_bag(&mut store);
        assert_eq!(store.location(store.desk()).total_items, 1);

        let interior = store.bag(bag).interior;
        assert_eq!(store.lift_item(item), None);
        store.place_item(item, interior);
        assert_eq!(store.propagate(bag), 1);

        assert_eq!(total(&store, bag), 1);
        assert_eq!(store.bag(bag).contribution, 1);
        assert_eq!(store.location(store.desk()).total_items, 1);
    }

    #[test]
    fn bag_move_carries_its_whole_total() {
        let mut store = Store::new();
        let inner = new_bag(&mut store);
        let outer = new_bag(&mut store);
        for _ in 0..3 {
            let item = new_item(&mut store);
            store.lift_item(item);
            store.place_item(item, store.bag(inner).interior);
            store.propagate(inner);
        }
        assert_eq!(total(&store, inner), 3);

        store.lift_bag(inner);
        store.place_bag(inner, store.bag(outer).interior);
        assert_eq!(store.propagate(outer), 3);

        assert_eq!(total(&store, outer), 3);
        assert_eq!(store.location(store.desk()).total_items, 3);
    }

    #[test]
    fn lift_from_bag_reports_former_holder_and_propagates_loss() {
        let mut store = Store::new();
        let item = new_item(&mut store);
        let bag = new_bag(&mut store);
        store.lift_item(item);
        store.place_item(item, store.bag(bag).interior);
        store.propagate(bag);

        assert_eq!(store.lift_item(item), Some(bag));
        let desk = store.desk();
        store.place_item(item, desk);
        assert_eq!(store.propagate(bag), -1);

        assert_eq!(total(&store, bag), 0);
        assert_eq!(store.location(desk).total_items, 1);
    }

    #[test]
    fn propagate_without_change_is_noop() {
        let mut store = Store::new();
        let bag = new_bag(&mut store);
        assert_eq!(store.propagate(bag), 0);
        assert_eq!(store.location(store.desk()).total_items, 0);
    }
}
