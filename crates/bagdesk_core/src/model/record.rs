//! Arena records for storage locations, items and bags.
//!
//! # Invariants
//! - `StorageLocation::owner == None` only for the current desk.
//! - `BagRecord::contribution` equals the amount this bag adds to
//!   `location.total_items`.
//! - `prev`/`next` links are `None` whenever the record is detached.

use super::handle::BagId;

macro_rules! arena_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub(crate) struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_key!(
    /// Slot of a `StorageLocation` in the store.
    LocationKey
);
arena_key!(
    /// Slot of an `ItemRecord` in the store.
    ItemKey
);
arena_key!(
    /// Slot of a `BagRecord` in the store.
    BagKey
);

/// Intrusive list links embedded in every member record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Links<K> {
    pub(crate) prev: Option<K>,
    pub(crate) next: Option<K>,
}

impl<K> Links<K> {
    pub(crate) const fn detached() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }
}

/// A place that holds items and bags: the desk or one bag's interior.
#[derive(Debug, Clone)]
pub(crate) struct StorageLocation {
    /// Bag whose interior this is. `None` means this location is the desk.
    pub(crate) owner: Option<BagKey>,
    pub(crate) first_item: Option<ItemKey>,
    pub(crate) first_bag: Option<BagKey>,
    /// Items nested here at any depth.
    pub(crate) total_items: u64,
}

impl StorageLocation {
    pub(crate) fn new(owner: Option<BagKey>) -> Self {
        Self {
            owner,
            first_item: None,
            first_bag: None,
            total_items: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ItemRecord {
    pub(crate) location: LocationKey,
    pub(crate) links: Links<ItemKey>,
}

#[derive(Debug, Clone)]
pub(crate) struct BagRecord {
    pub(crate) id: BagId,
    /// Extrinsic position: the location currently holding this bag.
    pub(crate) location: LocationKey,
    /// Intrinsic storage: the location holding this bag's contents.
    pub(crate) interior: LocationKey,
    /// Last `interior.total_items` reported to `location`.
    pub(crate) contribution: u64,
    pub(crate) links: Links<BagKey>,
}
