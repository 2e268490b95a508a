//! Serializable tree view of a desk session.
//!
//! Items are listed by creation ordinal, bags by id, both ascending, so the
//! output is deterministic regardless of list order.

use crate::model::handle::{BagId, Epoch};
use crate::model::record::{BagKey, ItemKey, LocationKey};
use crate::service::audit::reachable_bags;
use crate::service::desk_service::Desk;
use crate::service::error::DeskResult;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeskSnapshot {
    pub session_id: Uuid,
    pub epoch: Epoch,
    pub total_items: u64,
    pub items: Vec<u32>,
    pub bags: Vec<BagSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagSnapshot {
    pub id: BagId,
    pub total_items: u64,
    pub items: Vec<u32>,
    pub bags: Vec<BagSnapshot>,
}

impl Desk {
    /// Captures the whole hierarchy currently reachable from the desk.
    pub fn snapshot(&self) -> DeskResult<DeskSnapshot> {
        let (total_items, items, bags) = match self.store() {
            Some(store) => {
                let desk = store.desk();
                (
                    store.location(desk).total_items,
                    item_ordinals(store, desk),
                    build_bag_tree(store)?,
                )
            }
            None => (0, Vec::new(), Vec::new()),
        };
        Ok(DeskSnapshot {
            session_id: self.session_id(),
            epoch: self.epoch(),
            total_items,
            items,
            bags,
        })
    }
}

fn item_ordinals(store: &Store, location: LocationKey) -> Vec<u32> {
    let mut ordinals: Vec<u32> = store
        .members::<ItemKey>(location)
        .map(|item| item.0)
        .collect();
    ordinals.sort_unstable();
    ordinals
}

fn build_bag_tree(store: &Store) -> DeskResult<Vec<BagSnapshot>> {
    let order = reachable_bags(store)?;
    let mut nodes: Vec<Option<BagSnapshot>> = (0..store.bag_len()).map(|_| None).collect();
    for &bag in &order {
        let record = store.bag(bag);
        nodes[bag.index()] = Some(BagSnapshot {
            id: record.id,
            total_items: store.location(record.interior).total_items,
            items: item_ordinals(store, record.interior),
            bags: Vec::new(),
        });
    }

    // Children follow their holder in `order`, so walking it backwards
    // finishes every bag before it is moved into its holder.
    let mut roots = Vec::new();
    for &bag in order.iter().rev() {
        let Some(mut node) = nodes[bag.index()].take() else {
            continue;
        };
        node.bags.sort_unstable_by_key(|child| child.id);
        match store.holder(store.bag(bag).location) {
            Some(holder) => attach_child(&mut nodes, holder, node),
            None => roots.push(node),
        }
    }
    roots.sort_unstable_by_key(|root| root.id);
    Ok(roots)
}

fn attach_child(nodes: &mut [Option<BagSnapshot>], holder: BagKey, child: BagSnapshot) {
    if let Some(parent) = nodes[holder.index()].as_mut() {
        parent.bags.push(child);
    }
}
