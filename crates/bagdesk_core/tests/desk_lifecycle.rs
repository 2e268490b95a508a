use bagdesk_core::{BagId, Desk, DeskError, Placement};

#[test]
fn created_entities_start_on_the_desk() {
    let mut desk = Desk::new();
    assert!(!desk.is_initialized());

    let item = desk.create_item().unwrap();
    let bag = desk.create_bag().unwrap();

    assert!(desk.is_initialized());
    assert_eq!(desk.locate(item).unwrap(), Placement::Desk);
    assert_eq!(desk.locate(bag).unwrap(), Placement::Desk);
    assert_eq!(desk.count(bag).unwrap(), 0);
    assert_eq!(desk.desk_total(), 1);
    assert_eq!(desk.item_len(), 1);
    assert_eq!(desk.bag_len(), 1);
}

#[test]
fn bag_ids_are_sequential_from_zero() {
    let mut desk = Desk::new();
    let ids: Vec<BagId> = (0..4)
        .map(|_| desk.create_bag().unwrap().id())
        .collect();
    assert_eq!(ids, vec![BagId(0), BagId(1), BagId(2), BagId(3)]);
}

#[test]
fn bag_id_follows_the_bag_through_moves() {
    let mut desk = Desk::new();
    let first = desk.create_bag().unwrap();
    let second = desk.create_bag().unwrap();
    desk.insert(second, first).unwrap();
    desk.invert(first).unwrap();

    assert_eq!(desk.bag_id(first).unwrap(), BagId(0));
    assert_eq!(desk.bag_id(second).unwrap(), BagId(1));

    let other = Desk::new();
    assert!(matches!(
        other.bag_id(first),
        Err(DeskError::StaleHandle { .. })
    ));
}

#[test]
fn nested_insert_scenario_tracks_counts_and_locations() {
    let mut desk = Desk::new();
    let i1 = desk.create_item().unwrap();
    let b0 = desk.create_bag().unwrap();
    let b1 = desk.create_bag().unwrap();

    desk.insert(i1, b0).unwrap();
    assert_eq!(desk.count(b0).unwrap(), 1);
    assert_eq!(desk.locate(i1).unwrap().to_raw(), 0);

    desk.insert(b0, b1).unwrap();
    assert_eq!(desk.count(b1).unwrap(), 1);
    assert_eq!(desk.locate(b0).unwrap().to_raw(), 1);
    assert_eq!(desk.locate(i1).unwrap().to_raw(), 0);
    assert_eq!(desk.desk_total(), 1);
}

#[test]
fn insert_then_remove_round_trips_for_items_and_bags() {
    let mut desk = Desk::new();
    let target = desk.create_bag().unwrap();
    let item = desk.create_item().unwrap();
    let carried = desk.create_bag().unwrap();
    for _ in 0..3 {
        let inner = desk.create_item().unwrap();
        desk.insert(inner, carried).unwrap();
    }
    let before = desk.count(target).unwrap();

    desk.insert(item, target).unwrap();
    desk.remove(item).unwrap();
    assert_eq!(desk.locate(item).unwrap(), Placement::Desk);
    assert_eq!(desk.count(target).unwrap(), before);

    desk.insert(carried, target).unwrap();
    assert_eq!(desk.count(target).unwrap(), before + 3);
    desk.remove(carried).unwrap();
    assert_eq!(desk.locate(carried).unwrap(), Placement::Desk);
    assert_eq!(desk.count(target).unwrap(), before);
    assert_eq!(desk.count(carried).unwrap(), 3);
    assert_eq!(desk.desk_total(), 4);
    desk.audit().unwrap();
}

#[test]
fn removing_from_a_bag_updates_its_holder_chain() {
    let mut desk = Desk::new();
    let inner = desk.create_bag().unwrap();
    let outer = desk.create_bag().unwrap();
    let a = desk.create_item().unwrap();
    let b = desk.create_item().unwrap();
    desk.insert(a, inner).unwrap();
    desk.insert(b, inner).unwrap();
    desk.insert(inner, outer).unwrap();
    assert_eq!(desk.count(outer).unwrap(), 2);

    // Bring `inner` back to the desk so its items are removable.
    desk.remove(inner).unwrap();
    desk.remove(a).unwrap();
    assert_eq!(desk.count(inner).unwrap(), 1);
    assert_eq!(desk.count(outer).unwrap(), 0);

    desk.insert(inner, outer).unwrap();
    assert_eq!(desk.count(outer).unwrap(), 1);
    assert_eq!(desk.desk_total(), 2);
    desk.audit().unwrap();
}

#[test]
fn contents_list_direct_members_only() {
    let mut desk = Desk::new();
    let bag = desk.create_bag().unwrap();
    let nested = desk.create_bag().unwrap();
    let loose = desk.create_item().unwrap();
    let packed = desk.create_item().unwrap();
    let deep = desk.create_item().unwrap();
    desk.insert(deep, nested).unwrap();
    desk.insert(nested, bag).unwrap();
    desk.insert(packed, bag).unwrap();

    let top = desk.desk_contents();
    assert_eq!(top.items, vec![loose]);
    assert_eq!(top.bags, vec![bag]);

    let inside = desk.contents(bag).unwrap();
    assert_eq!(inside.items, vec![packed]);
    assert_eq!(inside.bags, vec![nested]);
    assert_eq!(desk.count(bag).unwrap(), 2);
}

#[test]
fn teardown_resets_ids_and_invalidates_handles() {
    let mut desk = Desk::new();
    let old_item = desk.create_item().unwrap();
    let old_bag = desk.create_bag().unwrap();
    desk.create_bag().unwrap();
    let old_epoch = desk.epoch();

    desk.teardown();
    assert!(!desk.is_initialized());
    assert_ne!(desk.epoch(), old_epoch);
    assert_eq!(desk.desk_total(), 0);
    assert!(desk.desk_contents().is_empty());

    let fresh = desk.create_bag().unwrap();
    assert_eq!(fresh.id(), BagId(0));
    assert_eq!(desk.bag_id(fresh).unwrap(), BagId(0));

    assert!(matches!(
        desk.count(old_bag),
        Err(DeskError::StaleHandle { .. })
    ));
    assert!(matches!(
        desk.locate(old_item),
        Err(DeskError::StaleHandle { .. })
    ));
    assert!(matches!(
        desk.insert(old_item, fresh),
        Err(DeskError::StaleHandle { .. })
    ));
}

#[test]
fn handles_from_another_desk_are_rejected() {
    let mut first = Desk::new();
    let mut second = Desk::new();
    let foreign = first.create_bag().unwrap();
    second.create_bag().unwrap();

    let err = second.count(foreign).unwrap_err();
    assert!(matches!(err, DeskError::StaleHandle { current_epoch, .. } if current_epoch == second.epoch()));
}

#[test]
fn teardown_on_fresh_desk_is_harmless() {
    let mut desk = Desk::new();
    desk.teardown();
    desk.teardown();
    let item = desk.create_item().unwrap();
    assert_eq!(item.ordinal(), 0);
    assert_eq!(desk.desk_total(), 1);
}
