//! Caller-facing handles and placement results.
//!
//! # Responsibility
//! - Give callers cheap `Copy` handles to items and bags.
//! - Detect handles that outlived a teardown via the session epoch.
//!
//! # Invariants
//! - `BagId` values are assigned sequentially from 0 and reset on teardown.
//! - `Placement::to_raw()` returns `-1` for the desk.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Generation tag stamped on every handle.
///
/// Drawn from a process-wide counter whenever a desk session starts or is
/// torn down, so handles from an older generation or from another `Desk`
/// never resolve.
pub type Epoch = u32;

/// User-visible sequential bag number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BagId(pub u32);

impl BagId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Display for BagId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an item created by a desk session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub(crate) slot: u32,
    pub(crate) epoch: Epoch,
}

impl ItemRef {
    /// Creation ordinal within the issuing epoch (0 for the first item).
    pub fn ordinal(self) -> u32 {
        self.slot
    }

    /// Epoch that issued this handle.
    pub fn epoch(self) -> Epoch {
        self.epoch
    }
}

impl Display for ItemRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "item #{}", self.slot)
    }
}

/// Handle to a bag created by a desk session.
///
/// Bags are never deleted individually, so the arena slot of a bag is also
/// its `BagId` for the lifetime of the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BagRef {
    pub(crate) slot: u32,
    pub(crate) epoch: Epoch,
}

impl BagRef {
    /// Sequential id of the referenced bag.
    pub fn id(self) -> BagId {
        BagId(self.slot)
    }

    /// Epoch that issued this handle.
    pub fn epoch(self) -> Epoch {
        self.epoch
    }
}

impl Display for BagRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "bag {}", self.slot)
    }
}

/// Kind of entity, without identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Item,
    Bag,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item => write!(f, "item"),
            Self::Bag => write!(f, "bag"),
        }
    }
}

/// Either kind of entity, for operations and errors that accept both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Item(ItemRef),
    Bag(BagRef),
}

impl EntityRef {
    pub fn epoch(self) -> Epoch {
        match self {
            Self::Item(item) => item.epoch,
            Self::Bag(bag) => bag.epoch,
        }
    }
}

impl From<ItemRef> for EntityRef {
    fn from(value: ItemRef) -> Self {
        Self::Item(value)
    }
}

impl From<BagRef> for EntityRef {
    fn from(value: BagRef) -> Self {
        Self::Bag(value)
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item(item) => write!(f, "{item}"),
            Self::Bag(bag) => write!(f, "{bag}"),
        }
    }
}

/// Where an entity directly sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Directly on the desk.
    Desk,
    /// Directly inside the bag with this id.
    Bag(BagId),
}

impl Placement {
    /// Sentinel encoding: bag id, or `-1` for the desk.
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Desk => -1,
            Self::Bag(id) => i64::from(id.0),
        }
    }
}

impl Display for Placement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Desk => write!(f, "desk"),
            Self::Bag(id) => write!(f, "bag {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BagId, BagRef, EntityRef, ItemRef, Placement};

    #[test]
    fn placement_raw_encoding_uses_minus_one_for_desk() {
        assert_eq!(Placement::Desk.to_raw(), -1);
        assert_eq!(Placement::Bag(BagId(0)).to_raw(), 0);
        assert_eq!(Placement::Bag(BagId(41)).to_raw(), 41);
    }

    #[test]
    fn bag_ref_id_matches_slot() {
        let bag = BagRef { slot: 7, epoch: 2 };
        assert_eq!(bag.id(), BagId(7));
        assert_eq!(bag.epoch(), 2);
    }

    #[test]
    fn entity_ref_display_names_the_entity() {
        let item: EntityRef = ItemRef { slot: 3, epoch: 0 }.into();
        let bag: EntityRef = BagRef { slot: 1, epoch: 0 }.into();
        assert_eq!(item.to_string(), "item #3");
        assert_eq!(bag.to_string(), "bag 1");
    }

    #[test]
    fn bag_id_serializes_as_plain_number() {
        let json = serde_json::to_value(BagId(5)).unwrap();
        assert_eq!(json, serde_json::json!(5));
        let placement = serde_json::to_value(Placement::Bag(BagId(2))).unwrap();
        assert_eq!(placement, serde_json::json!({ "bag": 2 }));
    }
}
