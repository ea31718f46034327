//! Lock-free work queue and the bounded worker pool that drains it.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Work queue distributing items to workers via an atomic cursor.
pub struct WorkQueue<T> {
    items: Vec<T>,
    cursor: AtomicUsize,
}

impl<T> WorkQueue<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Atomically claim the next item.
    pub fn next(&self) -> Option<&T> {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.items.get(i)
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }
}

/// Drain `queue` with `workers` parallel threads, applying `task` to every
/// item. Tasks are independent; isolation of per-item failures is the
/// task's job (return-value based, tasks must not panic).
pub fn run_pool<T, F>(workers: usize, queue: &WorkQueue<T>, task: F)
where
    T: Sync,
    F: Fn(&T) + Sync,
{
    let task = &task;
    rayon::scope(|s| {
        for _ in 0..workers.max(1) {
            s.spawn(move |_| {
                while let Some(item) = queue.next() {
                    task(item);
                }
            });
        }
    });
}
