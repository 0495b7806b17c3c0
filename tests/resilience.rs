//! Resilience tests for the notification bus
//!
//! These tests verify behavior under failure conditions like:
//! - Subscribers disappearing mid-delivery
//! - Slow consumers with full buffers
//! - Rapid subscribe/unsubscribe cycles while publishing
//! - Concurrent writers against one store

use chrono::Utc;
use notecast::bus::{NoteEventKind, NotificationBus};
use notecast::storage::{MemoryStore, NewUser, Note, NoteStore, UserStore};
use notecast::NoteService;
use std::sync::Arc;

fn note(id: i64) -> Note {
    Note {
        id,
        user_id: 1,
        title: format!("note {}", id),
        content: "body".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Test that publishing tolerates subscribers that went away without unsubscribing
#[tokio::test]
async fn test_subscribers_disappearing_mid_delivery() {
    let bus = NotificationBus::new(10);

    let subs: Vec<_> = (0..100).map(|_| bus.subscribe()).collect();
    let (mut alive, gone): (Vec<_>, Vec<_>) =
        subs.into_iter().enumerate().partition(|(i, _)| i % 2 == 0);
    drop(gone);

    for i in 0..20 {
        bus.publish(NoteEventKind::Created, &note(i)).unwrap();
    }

    // Buffer size is 10, so every live subscriber holds exactly 10
    for (_, sub) in alive.iter_mut() {
        let mut count = 0;
        while sub.try_recv().is_some() {
            count += 1;
        }
        assert_eq!(count, 10);
    }
    assert_eq!(bus.subscriber_count(), 50);
}

/// Test rapid subscribe/unsubscribe cycles don't cause issues
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rapid_subscribe_unsubscribe_cycles() {
    let bus = NotificationBus::new(10);

    let publisher_bus = bus.clone();
    let publisher = tokio::spawn(async move {
        for i in 0..1000 {
            publisher_bus.publish(NoteEventKind::Updated, &note(i)).unwrap();
            if i % 100 == 0 {
                tokio::task::yield_now().await;
            }
        }
    });

    let churn_bus = bus.clone();
    let churner = tokio::spawn(async move {
        for i in 0..500 {
            let sub = churn_bus.subscribe();
            if i % 2 == 0 {
                churn_bus.unsubscribe(sub.id());
            }
            // Odd iterations unsubscribe by drop
        }
    });

    publisher.await.unwrap();
    churner.await.unwrap();

    assert_eq!(bus.subscriber_count(), 0);
}

/// Test that a flooded subscriber keeps what fits and never blocks the publisher
#[tokio::test]
async fn test_slow_consumer_buffer_overflow() {
    let bus = NotificationBus::new(2);
    let mut slow = bus.subscribe();

    let mut delivered = 0;
    for i in 0..100 {
        delivered += bus.publish(NoteEventKind::Created, &note(i)).unwrap();
    }
    assert_eq!(delivered, 2);

    let mut received = Vec::new();
    while let Some(msg) = slow.try_recv() {
        received.push(msg);
    }
    assert_eq!(received.len(), 2);

    // Once drained, delivery resumes
    assert_eq!(bus.publish(NoteEventKind::Deleted, &note(100)).unwrap(), 1);
    assert_eq!(slow.try_recv().unwrap().event, "note_deleted");
}

/// Concurrent edits of one note: every edit succeeds, last writer wins, one event each
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_last_writer_wins() {
    let store = Arc::new(MemoryStore::new());
    let owner = store
        .create_user(NewUser {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();

    let bus = NotificationBus::new(1000);
    let mut listener = bus.subscribe();
    let notes = NoteService::new(store.clone(), bus.clone());
    let created = notes.create(owner.id, "t", "v0").await.unwrap();

    let mut handles = Vec::new();
    for i in 1..=50 {
        let notes = notes.clone();
        handles.push(tokio::spawn(async move {
            notes
                .update(created.id, owner.id, "t", &format!("v{}", i))
                .await
                .unwrap()
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    // The stored note is exactly what the latest update returned
    let latest = results.iter().map(|n| n.updated_at).max().unwrap();
    let stored = store.list_notes(owner.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].updated_at, latest);
    assert!(results
        .iter()
        .filter(|n| n.updated_at == latest)
        .any(|n| *n == stored[0]));

    let mut events = 0;
    while listener.try_recv().is_some() {
        events += 1;
    }
    // 1 create + 50 updates
    assert_eq!(events, 51);
}
