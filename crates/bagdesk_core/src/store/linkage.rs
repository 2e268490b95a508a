//! Intrusive membership lists over the store arenas.
//!
//! # Responsibility
//! - O(1) attach (insert at head) and detach (unlink) of items and bags.
//! - Walk the members of one storage location.
//!
//! # Invariants
//! - Linkage never touches `total_items` or `contribution`; accounting is
//!   the aggregate protocol's job.
//! - A detached record has both links cleared.
//! - Attaching sets the record's `location` to the new holder.

use super::Store;
use crate::model::record::{BagKey, ItemKey, Links, LocationKey, StorageLocation};

/// A record kind that can be linked into a storage location.
pub(crate) trait Member: Copy + Eq {
    fn links(store: &Store, key: Self) -> Links<Self>;
    fn links_mut(store: &mut Store, key: Self) -> &mut Links<Self>;
    fn location(store: &Store, key: Self) -> LocationKey;
    fn set_location(store: &mut Store, key: Self, location: LocationKey);
    fn head(location: &StorageLocation) -> Option<Self>;
    fn head_mut(location: &mut StorageLocation) -> &mut Option<Self>;
}

impl Member for ItemKey {
    #[inline]
    fn links(store: &Store, key: Self) -> Links<Self> {
        store.item(key).links
    }

    #[inline]
    fn links_mut(store: &mut Store, key: Self) -> &mut Links<Self> {
        &mut store.item_mut(key).links
    }

    #[inline]
    fn location(store: &Store, key: Self) -> LocationKey {
        store.item(key).location
    }

    #[inline]
    fn set_location(store: &mut Store, key: Self, location: LocationKey) {
        store.item_mut(key).location = location;
    }

    #[inline]
    fn head(location: &StorageLocation) -> Option<Self> {
        location.first_item
    }

    #[inline]
    fn head_mut(location: &mut StorageLocation) -> &mut Option<Self> {
        &mut location.first_item
    }
}

impl Member for BagKey {
    #[inline]
    fn links(store: &Store, key: Self) -> Links<Self> {
        store.bag(key).links
    }

    #[inline]
    fn links_mut(store: &mut Store, key: Self) -> &mut Links<Self> {
        &mut store.bag_mut(key).links
    }

    #[inline]
    fn location(store: &Store, key: Self) -> LocationKey {
        store.bag(key).location
    }

    #[inline]
    fn set_location(store: &mut Store, key: Self, location: LocationKey) {
        store.bag_mut(key).location = location;
    }

    #[inline]
    fn head(location: &StorageLocation) -> Option<Self> {
        location.first_bag
    }

    #[inline]
    fn head_mut(location: &mut StorageLocation) -> &mut Option<Self> {
        &mut location.first_bag
    }
}

impl Store {
    /// Links a detached record at the head of `location`'s list.
    pub(crate) fn attach<M: Member>(&mut self, key: M, location: LocationKey) {
        let head = M::head(self.location(location));
        M::set_location(self, key, location);
        *M::links_mut(self, key) = Links { prev: None, next: head };
        if let Some(head) = head {
            M::links_mut(self, head).prev = Some(key);
        }
        *M::head_mut(self.location_mut(location)) = Some(key);
    }

    /// Unlinks a record from its current location's list.
    ///
    /// The record keeps its `location` value until the next `attach`.
    pub(crate) fn detach<M: Member>(&mut self, key: M) {
        let Links { prev, next } = M::links(self, key);
        match prev {
            Some(prev) => M::links_mut(self, prev).next = next,
            None => {
                let location = M::location(self, key);
                let head = M::head_mut(self.location_mut(location));
                if *head == Some(key) {
                    *head = next;
                }
            }
        }
        if let Some(next) = next {
            M::links_mut(self, next).prev = prev;
        }
        *M::links_mut(self, key) = Links::detached();
    }

    /// Iterates the records directly linked into `location`.
    pub(crate) fn members<M: Member>(&self, location: LocationKey) -> Members<'_, M> {
        Members {
            store: self,
            cursor: M::head(self.location(location)),
        }
    }
}

/// Iterator over one membership list, most recently attached first.
pub(crate) struct Members<'a, M> {
    store: &'a Store,
    cursor: Option<M>,
}

impl<M: Member> Iterator for Members<'_, M> {
    type Item = M;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;
        self.cursor = M::links(self.store, current).next;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::record::{BagKey, ItemKey, Links};
    use crate::store::Store;

    fn store_with_items(count: usize) -> (Store, Vec<ItemKey>) {
        let mut store = Store::new();
        let desk = store.desk();
        let keys = (0..count)
            .map(|_| {
                let key = store.alloc_item().unwrap();
                store.attach(key, desk);
                key
            })
            .collect();
        (store, keys)
    }

    #[test]
    fn attach_inserts_at_head() {
        let (store, keys) = store_with_items(3);
        let order: Vec<ItemKey> = store.members(store.desk()).collect();
        assert_eq!(order, vec![keys[2], keys[1], keys[0]]);
    }

    #[test]
    fn detach_head_patches_location_head() {
        let (mut store, keys) = store_with_items(3);
        store.detach(keys[2]);

        assert_eq!(store.location(store.desk()).first_item, Some(keys[1]));
        assert_eq!(store.item(keys[1]).links.prev, None);
        assert_eq!(store.item(keys[2]).links, Links::detached());
    }

    #[test]
    fn detach_middle_and_tail_keep_list_consistent() {
        let (mut store, keys) = store_with_items(4);
        store.detach(keys[1]);
        store.detach(keys[0]);

        let order: Vec<ItemKey> = store.members(store.desk()).collect();
        assert_eq!(order, vec![keys[3], keys[2]]);
        assert_eq!(store.item(keys[2]).links.next, None);
        assert_eq!(store.item(keys[2]).links.prev, Some(keys[3]));
    }

    #[test]
    fn detach_twice_is_harmless() {
        let (mut store, keys) = store_with_items(2);
        store.detach(keys[0]);
        store.detach(keys[0]);

        let order: Vec<ItemKey> = store.members(store.desk()).collect();
        assert_eq!(order, vec![keys[1]]);
    }

    #[test]
    fn attach_moves_record_between_locations_without_touching_counts() {
        let mut store = Store::new();
        let desk = store.desk();
        let bag = store.alloc_bag().unwrap();
        store.attach(bag, desk);
        let item = store.alloc_item().unwrap();
        store.attach(item, desk);

        let interior = store.bag(bag).interior;
        store.detach(item);
        store.attach(item, interior);

        assert_eq!(store.item(item).location, interior);
        assert_eq!(store.members::<ItemKey>(desk).count(), 0);
        assert_eq!(store.members::<ItemKey>(interior).collect::<Vec<_>>(), vec![item]);
        assert_eq!(store.members::<BagKey>(desk).collect::<Vec<_>>(), vec![bag]);
        assert_eq!(store.location(desk).total_items, 0);
        assert_eq!(store.location(interior).total_items, 0);
    }
}
