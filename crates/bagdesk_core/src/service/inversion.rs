//! Constant-time desk/interior inversion.
//!
//! # Responsibility
//! - Exchange the roles of the desk and one bag's interior without moving
//!   any item or nested bag.
//!
//! # Invariants
//! - No item or bag record other than the inverted bag is written.
//! - Afterwards the former interior is the desk (no owner) and the former
//!   desk is the bag's interior (owned by the bag).
//! - The inverted bag ends up directly on the new desk.

use crate::model::handle::BagRef;
use crate::model::record::BagKey;
use crate::service::desk_service::{ensure_on_desk, resolve_bag, Desk};
use crate::service::error::DeskResult;
use crate::store::Store;

impl Desk {
    /// Everything loose on the desk goes into `bag`; everything inside
    /// `bag` becomes the desk.
    ///
    /// O(1) regardless of how many entities either side holds.
    ///
    /// # Errors
    /// - `NotOnDesk` when `bag` is not directly on the desk and precondition
    ///   checks are on.
    /// - `StaleHandle` for handles from another epoch.
    pub fn invert(&mut self, bag: BagRef) -> DeskResult<()> {
        let checks = self.config().precondition_checks;
        let result = self.live_store_mut(bag.into()).and_then(|(epoch, store)| {
            let key = resolve_bag(store, epoch, bag)?;
            if checks {
                ensure_on_desk(store, store.bag(key).location, bag.into())?;
            }
            swap_with_desk(store, key);
            Ok(store.location(store.bag(key).interior).total_items)
        });
        self.finish_move("invert", bag.into(), None, result)
    }
}

/// Swaps which storage location plays the desk and which is `bag`'s interior.
pub(crate) fn swap_with_desk(store: &mut Store, bag: BagKey) {
    if let Some(former) = store.lift_bag(bag) {
        store.propagate(former);
    }

    let old_desk = store.desk();
    let old_interior = store.bag(bag).interior;

    store.set_desk(old_interior);
    store.bag_mut(bag).interior = old_desk;
    store.location_mut(old_interior).owner = None;
    store.location_mut(old_desk).owner = Some(bag);

    store.place_bag(bag, old_interior);
}
