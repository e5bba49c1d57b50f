use super::*;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

fn counter_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
    let counter = counter.clone();
    async move {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn runs_task_after_delay() {
    let tasks = ViewTasks::new();
    let fired = Arc::new(AtomicUsize::new(0));
    assert!(tasks.schedule_after(Duration::from_secs(3), counter_task(&fired)));

    tokio::time::sleep(Duration::from_millis(2_999)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(tasks.pending(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(tasks.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_prevents_pending_tasks() {
    let tasks = ViewTasks::new();
    let fired = Arc::new(AtomicUsize::new(0));
    tasks.schedule_after(Duration::from_secs(1), counter_task(&fired));
    tasks.schedule_after(Duration::from_secs(2), counter_task(&fired));

    tasks.cancel_all();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(!tasks.is_closed());
    assert!(tasks.schedule_after(Duration::from_secs(1), counter_task(&fired)));
}

#[tokio::test(start_paused = true)]
async fn closed_view_rejects_new_work() {
    let tasks = ViewTasks::new();
    let fired = Arc::new(AtomicUsize::new(0));
    tasks.schedule_after(Duration::from_secs(1), counter_task(&fired));
    tasks.close();

    assert!(!tasks.schedule_after(Duration::from_secs(1), counter_task(&fired)));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_owner_cancels_tasks() {
    let fired = Arc::new(AtomicUsize::new(0));
    {
        let tasks = ViewTasks::new();
        tasks.schedule_after(Duration::from_secs(1), counter_task(&fired));
    }
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}
