//! Outbox notifier against a temp directory

use scout_channels::{FanoutNotifier, Notification, Notifier, OutboxNotifier};
use std::sync::Arc;

#[tokio::test]
async fn test_outbox_appends_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output").join("alerts.log");
    let outbox = OutboxNotifier::new(&path);

    outbox
        .notify(&Notification::new("First", "3 new listings"))
        .await
        .unwrap();
    outbox
        .notify(&Notification::new("Second", "0 new listings"))
        .await
        .unwrap();

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(content.matches("---\n").count(), 2);
    assert!(content.contains("] First\n3 new listings\n"));
    assert!(content.find("First").unwrap() < content.find("Second").unwrap());
}

#[tokio::test]
async fn test_outbox_through_fanout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alerts.log");
    let fanout = FanoutNotifier::new(vec![Arc::new(OutboxNotifier::new(&path))]);

    assert_eq!(fanout.names(), vec!["outbox"]);
    fanout
        .notify(&Notification::new("Workflow", "done"))
        .await
        .unwrap();
    assert!(path.exists());
}
