//! One-shot scheduler lifecycle and cooperative cancellation.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::watch;

use crate::{BookwatchError, Result};

/// Lifecycle of a [`BroadcastScheduler`](super::BroadcastScheduler).
///
/// `Idle -> Running -> Stopping -> Stopped`, or `Idle -> Stopped` when
/// shutdown is requested before start. There is no way back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct Lifecycle {
    state: AtomicU8,
    cancel: watch::Sender<bool>,
}

/// Shared handle to the scheduler's state and cancellation flag.
///
/// Cloning is cheap; every clone observes the same flag. Other long-running
/// tasks (e.g. the Telegram poller) use it to stop alongside the scheduler.
#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<Lifecycle>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            inner: Arc::new(Lifecycle {
                state: AtomicU8::new(SchedulerState::Idle as u8),
                cancel,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Returns `true` once shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        *self.inner.cancel.borrow()
    }

    /// Requests shutdown: `Running -> Stopping`, or `Idle -> Stopped`.
    ///
    /// Idempotent; later calls and calls after the loop stopped are no-ops.
    pub fn request(&self) {
        let advanced = self
            .inner
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                match SchedulerState::from_u8(raw) {
                    SchedulerState::Idle => Some(SchedulerState::Stopped as u8),
                    SchedulerState::Running => Some(SchedulerState::Stopping as u8),
                    SchedulerState::Stopping | SchedulerState::Stopped => None,
                }
            });
        if advanced.is_ok() {
            self.inner.cancel.send_replace(true);
        }
    }

    /// Resolves once shutdown has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.cancel.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// `Idle -> Running`.
    pub(super) fn begin(&self) -> Result<()> {
        self.inner
            .state
            .compare_exchange(
                SchedulerState::Idle as u8,
                SchedulerState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|raw| {
                BookwatchError::Lifecycle(format!(
                    "cannot start a scheduler that is {}",
                    SchedulerState::from_u8(raw)
                ))
            })
    }

    /// Terminal transition taken by the loop on exit.
    pub(super) fn finish(&self) {
        self.inner
            .state
            .store(SchedulerState::Stopped as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_before_start_is_terminal() {
        let signal = ShutdownSignal::new();
        signal.request();

        assert_eq!(signal.state(), SchedulerState::Stopped);
        assert!(signal.is_requested());
        assert!(signal.begin().is_err());
    }

    #[test]
    fn running_moves_to_stopping_then_stopped() {
        let signal = ShutdownSignal::new();
        signal.begin().unwrap();
        assert_eq!(signal.state(), SchedulerState::Running);
        assert!(!signal.is_requested());

        signal.request();
        assert_eq!(signal.state(), SchedulerState::Stopping);
        signal.request();
        assert_eq!(signal.state(), SchedulerState::Stopping);

        signal.finish();
        assert_eq!(signal.state(), SchedulerState::Stopped);
        signal.request();
        assert_eq!(signal.state(), SchedulerState::Stopped);
    }

    #[test]
    fn cannot_start_twice() {
        let signal = ShutdownSignal::new();
        signal.begin().unwrap();
        let err = signal.begin().unwrap_err();
        assert!(err.to_string().contains("running"));
    }

    #[tokio::test]
    async fn cancelled_resolves_for_every_clone() {
        let signal = ShutdownSignal::new();
        signal.begin().unwrap();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        signal.request();
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("cancellation not observed")
            .unwrap();
    }
}
