//! Delayed tasks owned by a single view.

use std::{future::Future, sync::Mutex, time::Duration};

use tokio::task::JoinHandle;

use crate::lock_unpoisoned;

struct TaskSet {
    handles: Vec<JoinHandle<()>>,
    closed: bool,
}

/// Cancellable timers tied to a view's lifetime. Nothing scheduled here runs
/// after [`ViewTasks::close`] or after the owner is dropped.
pub struct ViewTasks {
    inner: Mutex<TaskSet>,
}

impl Default for ViewTasks {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTasks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TaskSet {
                handles: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Runs `task` after `delay`. Returns false once the view is closed.
    pub fn schedule_after<F>(&self, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = lock_unpoisoned(&self.inner);
        if inner.closed {
            return false;
        }
        inner.handles.retain(|handle| !handle.is_finished());
        inner.handles.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
        true
    }

    pub fn pending(&self) -> usize {
        lock_unpoisoned(&self.inner)
            .handles
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn cancel_all(&self) {
        let mut inner = lock_unpoisoned(&self.inner);
        for handle in inner.handles.drain(..) {
            handle.abort();
        }
    }

    /// Cancels everything pending and refuses new work.
    pub fn close(&self) {
        let mut inner = lock_unpoisoned(&self.inner);
        inner.closed = true;
        for handle in inner.handles.drain(..) {
            handle.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        lock_unpoisoned(&self.inner).closed
    }
}

impl Drop for ViewTasks {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
