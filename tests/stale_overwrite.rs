//! Overlapping mutations: whichever refetch resolves last decides `tasks`.

mod common;

use std::time::Duration;

use common::{harness, task};
use task_dashboard::models::Status;

fn renamed(id: &str, title: &str) -> task_dashboard::models::Task {
    task(id, title, Status::Todo)
}

#[tokio::test(start_paused = true)]
async fn slower_refetch_overwrites_newer_state() {
    let h = harness(vec![renamed("a", "A"), renamed("b", "B")]);
    h.store.fetch_tasks().await.unwrap();

    // The first update's refetch is slow, the second's is fast.
    h.repo
        .queue_list_delays(&[Duration::from_millis(50), Duration::from_millis(10)]);

    let (first, second) = tokio::join!(
        h.store.update_task(renamed("a", "A2")),
        h.store.update_task(renamed("b", "B2")),
    );
    first.unwrap();
    second.unwrap();

    // Both writes reached the backend...
    let stored: Vec<_> = h.repo.stored().into_iter().map(|t| t.title).collect();
    assert_eq!(stored, vec!["A2", "B2"]);

    // ...but the slow refetch, taken before the second write, landed last.
    let visible: Vec<_> = h.store.tasks().into_iter().map(|t| t.title).collect();
    assert_eq!(visible, vec!["A2", "B"]);
    assert!(!h.store.loading());
}

#[tokio::test(start_paused = true)]
async fn faster_first_refetch_leaves_latest_state() {
    let h = harness(vec![renamed("a", "A"), renamed("b", "B")]);
    h.store.fetch_tasks().await.unwrap();

    h.repo
        .queue_list_delays(&[Duration::from_millis(10), Duration::from_millis(50)]);

    let (first, second) = tokio::join!(
        h.store.update_task(renamed("a", "A2")),
        h.store.update_task(renamed("b", "B2")),
    );
    first.unwrap();
    second.unwrap();

    let visible: Vec<_> = h.store.tasks().into_iter().map(|t| t.title).collect();
    assert_eq!(visible, vec!["A2", "B2"]);
}
