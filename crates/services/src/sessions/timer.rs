use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::SessionError;

/// Whole seconds spent in a session, shared with the ticker task.
#[derive(Debug, Clone, Default)]
pub struct ElapsedCounter(Arc<AtomicU64>);

impl ElapsedCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn seconds(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a session's elapsed time advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticker {
    /// Background task ticking once per period on the current tokio runtime.
    Interval(Duration),
    /// No background task; the owner calls `ExamSession::tick`.
    Manual,
}

impl Ticker {
    /// One tick per second.
    #[must_use]
    pub fn every_second() -> Self {
        Ticker::Interval(Duration::from_secs(1))
    }
}

/// Owns the periodic task that advances an [`ElapsedCounter`].
///
/// The task is aborted by `stop()` or when the timer is dropped, whichever
/// comes first.
#[derive(Debug)]
pub(crate) struct SessionTimer {
    task: Option<JoinHandle<()>>,
}

impl SessionTimer {
    pub(crate) fn start(ticker: Ticker, elapsed: &ElapsedCounter) -> Result<Self, SessionError> {
        match ticker {
            Ticker::Manual => Ok(Self { task: None }),
            Ticker::Interval(period) => {
                let handle = Handle::try_current().map_err(|_| SessionError::TimerUnavailable)?;
                Ok(Self {
                    task: Some(spawn_ticker(&handle, period, elapsed.clone())),
                })
            }
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the ticker. Returns true only for the call that actually stopped it.
    pub(crate) fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                tracing::debug!("session ticker stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_ticker(handle: &Handle, period: Duration, elapsed: ElapsedCounter) -> JoinHandle<()> {
    handle.spawn(async move {
        let mut interval = tokio::time::interval(period);
        // first tick resolves immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            elapsed.tick();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_timer_has_no_task() {
        let elapsed = ElapsedCounter::new();
        let mut timer = SessionTimer::start(Ticker::Manual, &elapsed).unwrap();
        assert!(!timer.is_running());
        assert!(!timer.stop());
    }

    #[test]
    fn interval_timer_requires_runtime() {
        let elapsed = ElapsedCounter::new();
        let err = SessionTimer::start(Ticker::every_second(), &elapsed).unwrap_err();
        assert!(matches!(err, SessionError::TimerUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_timer_counts_seconds_until_stopped() {
        let elapsed = ElapsedCounter::new();
        let mut timer = SessionTimer::start(Ticker::every_second(), &elapsed).unwrap();
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(elapsed.seconds(), 3);

        assert!(timer.stop());
        assert!(!timer.stop());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(elapsed.seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_timer_cancels_task() {
        let elapsed = ElapsedCounter::new();
        let timer = SessionTimer::start(Ticker::every_second(), &elapsed).unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(timer);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(elapsed.seconds(), 1);
    }
}
