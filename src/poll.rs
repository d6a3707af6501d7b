use futures::future::BoxFuture;
use log::debug;
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::task::JoinHandle;

pub type PollTask = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

// Poller is the periodic-task registrar. Each registered task runs on its
// own tokio task: run to completion, sleep for the interval, repeat. A slow
// tick therefore delays the next one instead of overlapping it.
#[derive(Clone)]
pub struct Poller {
    interval: Duration,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn add(&self, task: PollTask) {
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                task().await;
            }
        });
        self.lock_tasks().push(handle);
    }

    /// Aborts every registered task.
    pub fn stop(&self) {
        let tasks = std::mem::take(&mut *self.lock_tasks());
        debug!("Stopping {} poll task(s)", tasks.len());
        for task in tasks {
            task.abort();
        }
    }

    // A task that panicked while holding the lock leaves the handle list
    // intact, so poisoning is ignored.
    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    pub fn active(&self) -> usize {
        self.lock_tasks()
            .iter()
            .filter(|t| !t.is_finished())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_task_repeatedly_until_stopped() {
        let poller = Poller::new(Duration::from_millis(5));
        let ticks = Arc::new(AtomicUsize::new(0));
        let t = ticks.clone();
        poller.add(Box::new(move || {
            let t = t.clone();
            async move {
                t.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        }));
        assert_eq!(poller.active(), 1);

        tokio::time::timeout(Duration::from_secs(5), async {
            while ticks.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();

        poller.stop();
        assert_eq!(poller.active(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after);
    }

    #[tokio::test]
    async fn stop_survives_poisoned_lock() {
        let poller = Poller::new(Duration::from_secs(3600));
        poller.add(Box::new(|| async {}.boxed()));
        let tasks = poller.tasks.clone();
        let _ = std::thread::spawn(move || {
            let _guard = tasks.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(poller.tasks.is_poisoned());

        poller.add(Box::new(|| async {}.boxed()));
        assert_eq!(poller.active(), 2);
        poller.stop();
        assert_eq!(poller.active(), 0);
    }

    #[tokio::test]
    async fn ticks_never_overlap() {
        let poller = Poller::new(Duration::from_millis(1));
        let running = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));
        let (r, o, d) = (running.clone(), overlaps.clone(), done.clone());
        poller.add(Box::new(move || {
            let (r, o, d) = (r.clone(), o.clone(), d.clone());
            async move {
                if r.fetch_add(1, Ordering::SeqCst) > 0 {
                    o.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                r.fetch_sub(1, Ordering::SeqCst);
                d.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        }));

        tokio::time::timeout(Duration::from_secs(5), async {
            while done.load(Ordering::SeqCst) < 4 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
        poller.stop();
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }
}
