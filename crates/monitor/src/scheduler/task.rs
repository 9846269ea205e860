use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs an async job on a fixed interval. The job is awaited inside the loop,
/// so two invocations of the same task never overlap.
pub struct PeriodicTask {
    pub name: &'static str,
    pub interval: Duration,
}

pub struct TaskHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl PeriodicTask {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self { name, interval }
    }

    pub fn spawn<F, Fut>(self, job: F) -> TaskHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = self.name;
        let handle = tokio::spawn(async move {
            tracing::info!(task = name, interval_ms = self.interval.as_millis() as u64, "periodic task started");
            loop {
                tokio::time::sleep(self.interval).await;
                job().await;
            }
        });
        TaskHandle { name, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fires_repeatedly_until_aborted() {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let handle = PeriodicTask::new("test", Duration::from_millis(10)).spawn(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();
        let seen = count.load(Ordering::SeqCst);
        assert!(seen >= 2, "only {seen} runs");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
        assert_eq!(handle.name(), "test");
    }

    #[tokio::test(start_paused = true)]
    async fn runs_never_overlap() {
        let active = Arc::new(AtomicU32::new(0));
        let overlapped = Arc::new(AtomicU32::new(0));
        let (a, o) = (active.clone(), overlapped.clone());
        let handle = PeriodicTask::new("slow", Duration::from_millis(10)).spawn(move || {
            let (a, o) = (a.clone(), o.clone());
            async move {
                if a.fetch_add(1, Ordering::SeqCst) > 0 {
                    o.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(35)).await;
                a.fetch_sub(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.abort();
        assert_eq!(overlapped.load(Ordering::SeqCst), 0);
    }
}
