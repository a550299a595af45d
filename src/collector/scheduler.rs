use parking_lot::{Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Flushing,
}

/// Flush policy: the size threshold, the Idle/Flushing latch that keeps
/// flushes from overlapping, and the signal that re-arms the interval timer
/// after every flush.
#[derive(Debug)]
pub struct FlushScheduler {
    flush_size: usize,
    flushing: Mutex<()>,
    rearm: Notify,
}

impl FlushScheduler {
    pub fn new(flush_size: usize) -> Self {
        Self {
            flush_size,
            flushing: Mutex::new(()),
            rearm: Notify::new(),
        }
    }

    pub fn flush_size(&self) -> usize {
        self.flush_size
    }

    pub fn state(&self) -> SchedulerState {
        if self.flushing.is_locked() {
            SchedulerState::Flushing
        } else {
            SchedulerState::Idle
        }
    }

    /// Size trigger.
    pub fn should_flush(&self, queued: usize) -> bool {
        queued >= self.flush_size
    }

    /// Idle -> Flushing. `None` if a flush is already in progress.
    pub fn try_begin(&self) -> Option<FlushGuard<'_>> {
        self.flushing.try_lock().map(|held| FlushGuard {
            held: Some(held),
            rearm: &self.rearm,
        })
    }

    /// Idle -> Flushing, parking until any flush in progress completes. The
    /// window is a drain plus a non-blocking dispatch, so the wait is short.
    pub fn begin(&self) -> FlushGuard<'_> {
        FlushGuard {
            held: Some(self.flushing.lock()),
            rearm: &self.rearm,
        }
    }

    /// Resolves after the next completed flush.
    pub async fn rearmed(&self) {
        self.rearm.notified().await;
    }
}

/// Held for the duration of one flush. Dropping it returns the scheduler to
/// Idle and re-arms the timer.
#[derive(Debug)]
pub struct FlushGuard<'a> {
    held: Option<MutexGuard<'a, ()>>,
    rearm: &'a Notify,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        self.rearm.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_size_threshold() {
        let scheduler = FlushScheduler::new(3);
        assert!(!scheduler.should_flush(2));
        assert!(scheduler.should_flush(3));
        assert!(scheduler.should_flush(4));
    }

    #[test]
    fn test_flush_is_not_reentrant() {
        let scheduler = FlushScheduler::new(1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let guard = scheduler.try_begin().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Flushing);
        assert!(scheduler.try_begin().is_none());

        drop(guard);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.try_begin().is_some());
    }

    #[test]
    fn test_shutdown_waits_for_flush_in_progress() {
        let scheduler = FlushScheduler::new(1);
        let released = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|scope| {
            let guard = scheduler.try_begin().unwrap();
            let waiter = scope.spawn(|| {
                let _shutdown = scheduler.begin();
                released.load(std::sync::atomic::Ordering::SeqCst)
            });

            std::thread::sleep(Duration::from_millis(50));
            released.store(true, std::sync::atomic::Ordering::SeqCst);
            drop(guard);

            assert!(waiter.join().unwrap(), "begin() returned before the flush ended");
        });
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_completed_flush_rearms_timer() {
        let scheduler = FlushScheduler::new(1);
        drop(scheduler.try_begin().unwrap());

        // The permit is stored even if nobody was waiting yet
        tokio::time::timeout(Duration::from_millis(100), scheduler.rearmed())
            .await
            .expect("rearm signal should be pending");
    }
}
