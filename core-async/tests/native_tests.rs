//! Integration tests for the executor abstraction.

use core_async::{sync, task, time};
use std::sync::Arc;

#[core_async::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    assert_eq!(handle.await.unwrap(), 42);
}

#[core_async::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[core_async::test]
async fn test_mutex_shared_across_tasks() {
    let mutex = Arc::new(sync::Mutex::new(0));
    let mutex_clone = mutex.clone();

    task::spawn(async move {
        *mutex_clone.lock().await += 1;
    })
    .await
    .unwrap();

    assert_eq!(*mutex.lock().await, 1);
}

#[core_async::test]
async fn test_notify_releases_waiter() {
    let notify = Arc::new(sync::Notify::new());
    let waiter = notify.clone();

    let handle = task::spawn(async move {
        waiter.notified().await;
        "released"
    });

    task::yield_now().await;
    notify.notify_one();
    assert_eq!(handle.await.unwrap(), "released");
}

#[core_async::test]
async fn test_watch_channel_keeps_latest() {
    let (tx, mut rx) = sync::watch::channel(0u8);
    tx.send(1).unwrap();
    tx.send(2).unwrap();

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow(), 2);
}

#[core_async::test]
async fn test_cancellation_token_propagates_to_children() {
    let token = sync::CancellationToken::new();
    let child = token.child_token();

    let handle = task::spawn(async move {
        child.cancelled().await;
        true
    });

    token.cancel();
    assert!(handle.await.unwrap());
}
