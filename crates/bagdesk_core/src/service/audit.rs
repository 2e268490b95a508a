//! Full-traversal verification of the incremental aggregates.
//!
//! # Responsibility
//! - Recount nested items from the membership lists alone and compare them
//!   with every recorded `total_items` and cached `contribution`.
//! - Verify record back-references against the lists they are linked into.
//! - Verify every created item and bag is reachable from the desk.
//!
//! # Invariants
//! - Read-only; linear in the number of created entities.
//! - Iterative, so arbitrarily deep nesting cannot overflow the stack.

use crate::model::handle::{EntityKind, Placement};
use crate::model::record::{BagKey, ItemKey, LocationKey};
use crate::service::desk_service::Desk;
use crate::service::error::{DeskError, DeskResult};
use crate::store::Store;
use serde::Serialize;

/// Summary of a successful audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Storage locations walked, including the desk.
    pub locations_visited: usize,
    /// Bags reachable from the desk.
    pub bags_visited: usize,
    /// Items reachable from the desk at any depth.
    pub items_counted: u64,
}

impl Desk {
    /// Recounts every aggregate reachable from the desk.
    ///
    /// # Errors
    /// - `AggregateMismatch` / `ContributionMismatch` when a cached count
    ///   differs from the traversal count.
    /// - `MembershipMismatch` when a record's location disagrees with the
    ///   list holding it.
    pub fn audit(&self) -> DeskResult<AuditReport> {
        match self.store() {
            Some(store) => audit_store(store),
            None => Ok(AuditReport {
                locations_visited: 0,
                bags_visited: 0,
                items_counted: 0,
            }),
        }
    }
}

/// Bags reachable from the desk, each listed after the bag holding it.
pub(crate) fn reachable_bags(store: &Store) -> DeskResult<Vec<BagKey>> {
    let mut seen = vec![false; store.bag_len()];
    let mut order = Vec::new();
    let mut pending: Vec<LocationKey> = vec![store.desk()];

    while let Some(location) = pending.pop() {
        for item in store.members::<ItemKey>(location) {
            if store.item(item).location != location {
                return Err(DeskError::MembershipMismatch {
                    kind: EntityKind::Item,
                    slot: item.0,
                });
            }
        }
        for bag in store.members::<BagKey>(location) {
            if store.bag(bag).location != location || seen[bag.index()] {
                return Err(DeskError::MembershipMismatch {
                    kind: EntityKind::Bag,
                    slot: bag.0,
                });
            }
            seen[bag.index()] = true;
            order.push(bag);
            pending.push(store.bag(bag).interior);
        }
    }
    Ok(order)
}

pub(crate) fn audit_store(store: &Store) -> DeskResult<AuditReport> {
    let order = reachable_bags(store)?;
    ensure_all_reachable(store, &order)?;
    let mut counted = vec![0u64; store.bag_len()];

    for &bag in order.iter().rev() {
        let record = store.bag(bag);
        let expected = count_location(store, record.interior, &counted);
        let recorded = store.location(record.interior).total_items;
        if recorded != expected {
            return Err(DeskError::AggregateMismatch {
                at: Placement::Bag(record.id),
                recorded,
                expected,
            });
        }
        if record.contribution != expected {
            return Err(DeskError::ContributionMismatch {
                bag: record.id,
                contribution: record.contribution,
                expected,
            });
        }
        counted[bag.index()] = expected;
    }

    let desk = store.desk();
    let expected = count_location(store, desk, &counted);
    let recorded = store.location(desk).total_items;
    if recorded != expected {
        return Err(DeskError::AggregateMismatch {
            at: Placement::Desk,
            recorded,
            expected,
        });
    }

    Ok(AuditReport {
        locations_visited: order.len() + 1,
        bags_visited: order.len(),
        items_counted: expected,
    })
}

/// Entities are only dropped all at once, so each one must hang off the desk.
fn ensure_all_reachable(store: &Store, order: &[BagKey]) -> DeskResult<()> {
    let mut bag_seen = vec![false; store.bag_len()];
    for &bag in order {
        bag_seen[bag.index()] = true;
    }
    if let Some(slot) = bag_seen.iter().position(|seen| !seen) {
        return Err(DeskError::MembershipMismatch {
            kind: EntityKind::Bag,
            slot: slot as u32,
        });
    }

    let mut item_seen = vec![false; store.item_len()];
    let locations =
        std::iter::once(store.desk()).chain(order.iter().map(|&bag| store.bag(bag).interior));
    for location in locations {
        for item in store.members::<ItemKey>(location) {
            item_seen[item.index()] = true;
        }
    }
    match item_seen.iter().position(|seen| !seen) {
        Some(slot) => Err(DeskError::MembershipMismatch {
            kind: EntityKind::Item,
            slot: slot as u32,
        }),
        None => Ok(()),
    }
}

fn count_location(store: &Store, location: LocationKey, counted: &[u64]) -> u64 {
    let direct = store.members::<ItemKey>(location).count() as u64;
    let nested: u64 = store
        .members::<BagKey>(location)
        .map(|bag| counted[bag.index()])
        .sum();
    direct + nested
}
