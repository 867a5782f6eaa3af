//! Group-scoped balancing

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{TestCluster, server, table};
use proven_groups::{DEFAULT_GROUP, TransitionState};
use proven_groups_coordinator::Error;

#[tokio::test]
async fn test_balance_spreads_each_table_over_group_servers() {
    let (s1, s2, s3) = (server(1), server(2), server(3));
    let test = TestCluster::new(&[s1.clone(), s2.clone(), s3.clone()]).await;
    let (t1, t2) = (table("t1"), table("t2"));
    test.put_group("A", &[s1.clone(), s2.clone()], &[t1.clone(), t2.clone()])
        .await;
    test.spread_regions(&t1, &[s1.clone()], 4);
    test.spread_regions(&t2, &[s2.clone()], 2);

    assert!(test.coordinator.balance_group("A").await.unwrap());

    // Each table is balanced on its own, over A's servers only
    let plans = test.cluster.applied_plans();
    assert_eq!(plans.len(), 3);
    assert!(plans.iter().all(|plan| plan.destination != s3));
    assert_eq!(test.cluster.regions_on(&s1).len(), 3);
    assert_eq!(test.cluster.regions_on(&s2).len(), 3);

    let snapshots = test.balancer.computed_snapshots();
    assert_eq!(snapshots.len(), 2);
    for snapshot in &snapshots {
        assert_eq!(
            snapshot.keys().cloned().collect::<Vec<_>>(),
            vec![s1.clone(), s2.clone()]
        );
    }

    assert_eq!(
        test.observer.events(),
        ["pre_balance_group:A", "post_balance_group:A=true"]
    );
}

#[tokio::test]
async fn test_idle_servers_are_offered_to_the_algorithm() {
    let (s1, s2) = (server(1), server(2));
    let test = TestCluster::new(&[s1.clone(), s2.clone()]).await;
    let t1 = table("t1");
    test.put_group("A", &[s1.clone(), s2.clone()], &[t1.clone()])
        .await;
    test.spread_regions(&t1, &[s1.clone()], 1);

    assert!(!test.coordinator.balance_group("A").await.unwrap());

    let snapshots = test.balancer.computed_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].get(&s2), Some(&Vec::new()));
    assert_eq!(
        test.observer.events().last().map(String::as_str),
        Some("post_balance_group:A=false")
    );
}

#[tokio::test]
async fn test_tables_without_regions_are_skipped() {
    let s1 = server(1);
    let test = TestCluster::new(&[s1.clone(), server(2)]).await;
    test.put_group("A", &[s1], &[table("t1")]).await;

    assert!(!test.coordinator.balance_group("A").await.unwrap());
    assert!(test.balancer.computed_snapshots().is_empty());
}

#[tokio::test]
async fn test_balance_skipped_while_group_regions_in_transition() {
    let (s1, s2) = (server(1), server(2));
    let test = TestCluster::new(&[s1.clone(), s2.clone()]).await;
    let t1 = table("t1");
    test.put_group("A", &[s1.clone(), s2.clone()], &[t1.clone()])
        .await;
    test.spread_regions(&t1, &[s1.clone()], 4);
    let moving = test.cluster.add_region(&t1, "moving", None);
    test.cluster
        .set_in_transition(&moving, &s2, TransitionState::PendingOpen);

    assert!(!test.coordinator.balance_group("A").await.unwrap());
    assert!(test.cluster.applied_plans().is_empty());
    assert!(test.balancer.computed_snapshots().is_empty());

    test.cluster.clear_transition(&moving);
    assert!(test.coordinator.balance_group("A").await.unwrap());
}

#[tokio::test]
async fn test_other_groups_in_transition_do_not_block() {
    let (s1, s2, s3) = (server(1), server(2), server(3));
    let test = TestCluster::new(&[s1.clone(), s2.clone(), s3.clone()]).await;
    let (t1, other) = (table("t1"), table("other"));
    test.put_group("A", &[s1.clone(), s2.clone()], &[t1.clone()])
        .await;
    test.spread_regions(&t1, &[s1.clone()], 4);
    let moving = test.cluster.add_region(&other, "moving", None);
    test.cluster
        .set_in_transition(&moving, &s3, TransitionState::Closing);

    assert!(test.coordinator.balance_group("A").await.unwrap());
}

#[tokio::test]
async fn test_balance_skipped_during_dead_server_recovery() {
    let (s1, s2) = (server(1), server(2));
    let test = TestCluster::new(&[s1.clone(), s2.clone()]).await;
    let t1 = table("t1");
    test.put_group("A", &[s1.clone(), s2.clone()], &[t1.clone()])
        .await;
    test.spread_regions(&t1, &[s1.clone()], 4);
    test.cluster.set_dead_servers_in_progress(true);

    assert!(!test.coordinator.balance_group("A").await.unwrap());
    assert!(test.cluster.applied_plans().is_empty());
}

#[tokio::test]
async fn test_offline_members_are_left_out() {
    let (s1, s2, s3) = (server(1), server(2), server(3));
    let test = TestCluster::new(&[s1.clone(), s2.clone(), s3.clone()]).await;
    let t1 = table("t1");
    test.put_group("A", &[s1.clone(), s2.clone(), s3.clone()], &[t1.clone()])
        .await;
    test.spread_regions(&t1, &[s1.clone()], 4);
    test.cluster.remove_online_server(&s3);

    assert!(test.coordinator.balance_group("A").await.unwrap());
    assert!(test.cluster.regions_on(&s3).is_empty());
    assert_eq!(test.cluster.regions_on(&s2).len(), 2);
}

#[tokio::test]
async fn test_default_group_balances_untracked_tables() {
    let (s1, s2, s3) = (server(1), server(2), server(3));
    let test = TestCluster::new(&[s1.clone(), s2.clone(), s3.clone()]).await;
    let (untracked, t1) = (table("u"), table("t1"));
    test.put_group("A", &[s3.clone()], &[t1.clone()]).await;
    test.spread_regions(&untracked, &[s1.clone()], 4);
    test.spread_regions(&t1, &[s1.clone()], 2);

    assert!(test.coordinator.balance_group(DEFAULT_GROUP).await.unwrap());

    // Only the untracked table is balanced; A's table is not the default's
    let snapshots = test.balancer.computed_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(
        snapshots[0].keys().cloned().collect::<Vec<_>>(),
        vec![s1.clone(), s2.clone()]
    );
    assert_eq!(snapshots[0][&s1].len(), 4);
    assert!(test.cluster.regions_on(&s3).is_empty());
    assert_eq!(test.cluster.regions_on(&s2).len(), 2);
    assert_eq!(test.cluster.regions_on(&s1).len(), 4);
}

#[tokio::test]
async fn test_untracked_regions_in_transition_block_default_balance() {
    let (s1, s2) = (server(1), server(2));
    let test = TestCluster::new(&[s1.clone(), s2.clone()]).await;
    let untracked = table("u");
    test.spread_regions(&untracked, &[s1.clone()], 4);
    let moving = test.cluster.add_region(&untracked, "moving", None);
    test.cluster
        .set_in_transition(&moving, &s2, TransitionState::PendingOpen);

    assert!(!test.coordinator.balance_group(DEFAULT_GROUP).await.unwrap());
    assert!(test.cluster.applied_plans().is_empty());
}

#[tokio::test]
async fn test_balance_missing_group_fails() {
    let test = TestCluster::new(&[server(1)]).await;

    assert_matches!(
        test.coordinator.balance_group("missing").await,
        Err(Error::NotFound(_))
    );
}

#[tokio::test]
async fn test_balance_does_not_wait_for_a_server_move() {
    let (s1, s2, s3) = (server(1), server(2), server(3));
    let test = TestCluster::new(&[s1.clone(), s2.clone(), s3.clone()]).await;
    let t1 = table("t1");
    test.put_group("A", &[s2.clone(), s3.clone()], &[t1.clone()])
        .await;
    test.spread_regions(&t1, &[s2.clone()], 4);
    let slow = test.cluster.add_region(&table("t0"), "slow", Some(&s1));
    test.cluster.pin_region(&slow, 5);
    test.coordinator.add_group("B").await.unwrap();

    let handle = test
        .coordinator
        .start_move_servers(&[s1.clone()].into(), "B")
        .await
        .unwrap();

    // The membership lock is held by the drain, the placement lock is not
    assert!(test.coordinator.balance_group("A").await.unwrap());

    handle.wait().await.unwrap();
}

#[tokio::test]
async fn test_shared_placement_lock_serializes_balance() {
    let (s1, s2) = (server(1), server(2));
    let test = TestCluster::new(&[s1.clone(), s2.clone()]).await;
    let t1 = table("t1");
    test.put_group("A", &[s1.clone(), s2.clone()], &[t1.clone()])
        .await;
    test.spread_regions(&t1, &[s1.clone()], 4);

    let lock = test.coordinator.placement_lock();
    let held = lock.lock().await;

    let coordinator = Arc::clone(&test.coordinator);
    let balance = tokio::spawn(async move { coordinator.balance_group("A").await });
    tokio::task::yield_now().await;
    assert!(!balance.is_finished());
    assert!(test.cluster.applied_plans().is_empty());

    drop(held);
    assert!(balance.await.unwrap().unwrap());
}
