use order_store::{ChangeKind, NewOrder, OrderId, StoreActor, UpdateOutcome};
use tokio::sync::broadcast::error::RecvError;

fn spawn_store() -> order_store::StoreClient {
    let (actor, client) = StoreActor::new(32, 16);
    tokio::spawn(actor.run());
    client
}

#[tokio::test]
async fn test_insert_assigns_sequential_display_numbers() {
    let client = spawn_store();

    let first = client
        .insert(NewOrder::for_customer("Alice", "555-0100").with_item("Taco", 3, 250))
        .await
        .unwrap();
    let second = client
        .insert(NewOrder::for_customer("Bob", "555-0101"))
        .await
        .unwrap();

    assert_eq!(first.display_number, 1);
    assert_eq!(second.display_number, 2);
    assert_ne!(first.id, second.id);
    assert_eq!(first.total_cents, 750);
    assert_eq!(first.status, "pending");

    let fetched = client.get(first.id).await.unwrap().expect("row exists");
    assert_eq!(fetched, first);
}

#[tokio::test]
async fn test_conditional_update_only_applies_once() {
    let client = spawn_store();
    let row = client
        .insert(NewOrder::for_customer("Alice", "555-0100"))
        .await
        .unwrap();

    let first = client
        .update_status(row.id, vec!["pending".into()], "preparing")
        .await
        .unwrap();
    let second = client
        .update_status(row.id, vec!["pending".into()], "cancelled")
        .await
        .unwrap();

    match first {
        UpdateOutcome::Updated(updated) => {
            assert_eq!(updated.status, "preparing");
            assert_eq!(updated.revision, 2);
        }
        other => panic!("Expected Updated, got {other:?}"),
    }
    assert_eq!(
        second,
        UpdateOutcome::Conflict {
            current: "preparing".into()
        }
    );

    let missing = client
        .update_status(OrderId::new(), vec!["pending".into()], "preparing")
        .await
        .unwrap();
    assert_eq!(missing, UpdateOutcome::NotFound);
}

#[tokio::test]
async fn test_concurrent_updates_have_a_single_winner() {
    let client = spawn_store();
    let row = client
        .insert(NewOrder::for_customer("Carol", "555-0102"))
        .await
        .unwrap();

    let mut handles = vec![];
    for target in ["preparing", "cancelled", "preparing", "cancelled"] {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.update_status(row.id, vec!["pending".into()], target).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if let UpdateOutcome::Updated(_) = handle.await.unwrap().unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_list_excludes_statuses_case_insensitively() {
    let client = spawn_store();
    let open = client
        .insert(NewOrder::for_customer("Alice", "555-0100"))
        .await
        .unwrap();
    let done = client
        .insert(NewOrder::for_customer("Bob", "555-0101").with_status("Completed"))
        .await
        .unwrap();

    let rows = client
        .list(vec!["completed".into(), "cancelled".into()])
        .await
        .unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![open.id]);
    assert!(!ids.contains(&done.id));
}

#[tokio::test]
async fn test_feed_publishes_inserts_and_updates() {
    let client = spawn_store();
    let mut feed = client.subscribe().await.unwrap();

    let row = client
        .insert(NewOrder::for_customer("Alice", "555-0100"))
        .await
        .unwrap();
    client.force_status(row.id, "ready").await.unwrap();

    let inserted = feed.recv().await.unwrap();
    assert_eq!(inserted.kind, ChangeKind::Insert);
    assert_eq!(inserted.record.id, row.id);

    let updated = feed.recv().await.unwrap();
    assert_eq!(updated.kind, ChangeKind::Update);
    assert_eq!(updated.record.status, "ready");
    assert_eq!(updated.record.revision, 2);
}

#[tokio::test]
async fn test_dropped_subscribers_miss_events() {
    let client = spawn_store();
    let mut feed = client.subscribe().await.unwrap();

    client.drop_subscribers().await.unwrap();
    client
        .insert(NewOrder::for_customer("Alice", "555-0100"))
        .await
        .unwrap();

    assert!(matches!(feed.recv().await, Err(RecvError::Closed)));

    let mut resumed = client.subscribe().await.unwrap();
    assert!(resumed.try_recv().is_err(), "events from the outage are not redelivered");
}
