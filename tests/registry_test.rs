//! End-to-end scenarios for registry, groups, leaves and aggregation.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use device_registry::registry::{
    AggregateRead, AggregateResult, GroupList, LeafCommand, LeafList, ListGroups, ListLeaves,
    Reading, ReadResult, Registered, RegistryCommand, TrackLeaf, WriteAck,
};

mod common;
use common::{probe, spawn_registry};

fn track(group: &str, leaf: &str, reply_to: device_registry::actor::Recipient<Registered>) -> RegistryCommand {
    RegistryCommand::Track(TrackLeaf {
        group_id: group.to_string(),
        leaf_id: leaf.to_string(),
        reply_to,
    })
}

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_track_is_idempotent_per_leaf() {
    let (registry, _shutdown) = spawn_registry();
    let (reply_to, mut registered) = probe::<Registered>();

    registry.tell(track("g1", "d1", reply_to.clone()));
    let first = registered.receive().await.leaf;
    registry.tell(track("g1", "d1", reply_to.clone()));
    let second = registered.receive().await.leaf;
    registry.tell(track("g1", "d2", reply_to));
    let other = registered.receive().await.leaf;

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[tokio::test]
async fn test_groups_listed_and_reclaimed() {
    let (registry, _shutdown) = spawn_registry();
    let (reply_to, mut registered) = probe::<Registered>();
    let (list_to, mut lists) = probe::<GroupList>();

    registry.tell(track("g1", "d1", reply_to.clone()));
    let d1 = registered.receive().await.leaf;
    registry.tell(track("g2", "d2", reply_to));
    registered.receive().await;

    registry.tell(RegistryCommand::ListGroups(ListGroups { request_id: 1, reply_to: list_to.clone() }));
    let list = lists.receive().await;
    assert_eq!(list.request_id, 1);
    assert_eq!(list.ids, ids(&["g1", "g2"]));

    d1.tell(LeafCommand::Passivate);
    d1.terminated().await;

    // Group teardown is asynchronous; poll until g1 is gone.
    let mut request_id = 2;
    loop {
        registry.tell(RegistryCommand::ListGroups(ListGroups { request_id, reply_to: list_to.clone() }));
        let list = lists.receive().await;
        assert_eq!(list.request_id, request_id);
        if list.ids == ids(&["g2"]) {
            break;
        }
        request_id += 1;
        assert!(request_id < 100, "group g1 was never reclaimed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_list_leaves_of_unknown_group_is_empty() {
    let (registry, _shutdown) = spawn_registry();
    let (reply_to, mut lists) = probe::<LeafList>();

    registry.tell(RegistryCommand::ListLeaves(ListLeaves {
        request_id: 7,
        group_id: "nowhere".to_string(),
        reply_to,
    }));
    let list = lists.receive().await;
    assert_eq!(list.request_id, 7);
    assert!(list.ids.is_empty());
}

#[tokio::test]
async fn test_leaf_write_then_read() {
    let (registry, _shutdown) = spawn_registry();
    let (reply_to, mut registered) = probe::<Registered>();
    let (ack_to, mut acks) = probe::<WriteAck>();
    let (read_to, mut reads) = probe::<ReadResult>();

    registry.tell(track("g1", "d1", reply_to));
    let leaf = registered.receive().await.leaf;

    leaf.tell(LeafCommand::Read { request_id: 1, reply_to: read_to.clone() });
    assert_eq!(reads.receive().await.value, None);

    leaf.tell(LeafCommand::Write { request_id: 2, value: 24.0, reply_to: ack_to.clone() });
    assert_eq!(acks.receive().await.request_id, 2);
    leaf.tell(LeafCommand::Write { request_id: 3, value: 55.0, reply_to: ack_to });
    assert_eq!(acks.receive().await.request_id, 3);

    leaf.tell(LeafCommand::Read { request_id: 4, reply_to: read_to });
    let read = reads.receive().await;
    assert_eq!(read.request_id, 4);
    assert_eq!(read.leaf_id, "d1");
    assert_eq!(read.value, Some(55.0));
}

#[tokio::test]
async fn test_aggregate_reports_values_and_unavailable() {
    let (registry, _shutdown) = spawn_registry();
    let (reply_to, mut registered) = probe::<Registered>();
    let (ack_to, mut acks) = probe::<WriteAck>();
    let (result_to, mut results) = probe::<AggregateResult>();

    let mut leaves = Vec::new();
    for id in ["d1", "d2", "d3"] {
        registry.tell(track("g1", id, reply_to.clone()));
        leaves.push(registered.receive().await.leaf);
    }
    leaves[0].tell(LeafCommand::Write { request_id: 1, value: 1.0, reply_to: ack_to.clone() });
    leaves[1].tell(LeafCommand::Write { request_id: 2, value: 2.0, reply_to: ack_to });
    acks.receive().await;
    acks.receive().await;

    registry.tell(RegistryCommand::AggregateRead(
        AggregateRead::new(42, "g1", result_to).with_timeout(Duration::from_secs(2)),
    ));
    let result = results.receive().await;

    let expected: BTreeMap<String, Reading> = [
        ("d1".to_string(), Reading::Value(1.0)),
        ("d2".to_string(), Reading::Value(2.0)),
        ("d3".to_string(), Reading::Unavailable),
    ]
    .into_iter()
    .collect();
    assert_eq!(result.request_id, 42);
    assert_eq!(result.readings, expected);
}

#[tokio::test]
async fn test_aggregate_of_unknown_group_gets_no_reply() {
    let (registry, _shutdown) = spawn_registry();
    let (result_to, mut results) = probe::<AggregateResult>();

    registry.tell(RegistryCommand::AggregateRead(AggregateRead::new(1, "nowhere", result_to)));
    results.expect_no_message(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_passivated_leaf_disappears_from_group() {
    let (registry, _shutdown) = spawn_registry();
    let (reply_to, mut registered) = probe::<Registered>();
    let (list_to, mut lists) = probe::<LeafList>();

    registry.tell(track("g1", "d1", reply_to.clone()));
    let d1 = registered.receive().await.leaf;
    registry.tell(track("g1", "d2", reply_to));
    registered.receive().await;

    d1.tell(LeafCommand::Passivate);
    d1.terminated().await;

    let mut request_id = 1;
    loop {
        registry.tell(RegistryCommand::ListLeaves(ListLeaves {
            request_id,
            group_id: "g1".to_string(),
            reply_to: list_to.clone(),
        }));
        let list = lists.receive().await;
        if list.ids == ids(&["d2"]) {
            break;
        }
        request_id += 1;
        assert!(request_id < 100, "leaf d1 was never removed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_registry_stops_on_shutdown() {
    let (registry, shutdown) = spawn_registry();
    shutdown.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), registry.terminated())
        .await
        .expect("registry did not stop");
}
