//! Recurring large-order broadcast.
//!
//! [`BroadcastScheduler`] runs `fetch -> estimate -> scan -> deliver` for
//! every active subscriber once per period, and exposes the entry points the
//! [`CommandHandler`] uses to change subscriptions or ask for an immediate
//! report while a cycle may be in flight.
//!
//! Each cycle works on a snapshot of the active subscribers taken at its
//! start. A subscriber who unsubscribes while a cycle is running may still
//! receive that cycle's report; the change applies from the next cycle.

pub mod commands;
mod lifecycle;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::Result;
use crate::config::MonitorConfig;
use crate::delivery::Delivery;
use crate::estimator::{estimate, window_start};
use crate::exchange::MarketData;
use crate::models::ChatId;
use crate::report::Report;
use crate::scanner::scan;
use crate::store::SubscriberStore;

pub use commands::{Command, CommandHandler, HelpTopic};
pub use lifecycle::{SchedulerState, ShutdownSignal};

/// Sent instead of a report when an on-demand query cannot be served.
pub const QUERY_FAILURE_NOTICE: &str =
    "Order book data is unavailable right now, try again later.";

/// Counters for one broadcast cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Subscribers that received a full report.
    pub delivered: usize,
    /// Subscribers whose pipeline or delivery failed.
    pub failed: usize,
    /// Subscribers not visited because shutdown was requested.
    pub skipped: usize,
}

struct Inner {
    monitor: MonitorConfig,
    market: Arc<dyn MarketData>,
    delivery: Arc<dyn Delivery>,
    store: Arc<dyn SubscriberStore>,
    shutdown: ShutdownSignal,
}

/// Owns the broadcast loop and the shared subscriber entry points.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct BroadcastScheduler {
    inner: Arc<Inner>,
}

impl BroadcastScheduler {
    /// Creates an idle scheduler. Nothing runs until [`start`](Self::start).
    pub fn new(
        monitor: MonitorConfig,
        market: Arc<dyn MarketData>,
        delivery: Arc<dyn Delivery>,
        store: Arc<dyn SubscriberStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                monitor,
                market,
                delivery,
                store,
                shutdown: ShutdownSignal::new(),
            }),
        }
    }

    pub fn monitor(&self) -> &MonitorConfig {
        &self.inner.monitor
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.shutdown.state()
    }

    /// Handle other tasks can use to observe or trigger shutdown.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.inner.shutdown.clone()
    }

    /// Spawns the broadcast loop (`Idle -> Running`).
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::Lifecycle`](crate::BookwatchError::Lifecycle)
    /// unless the scheduler is idle.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        self.inner.shutdown.begin()?;
        let scheduler = self.clone();
        Ok(tokio::spawn(scheduler.run()))
    }

    /// Asks the loop to stop after the subscriber currently being served.
    pub fn request_shutdown(&self) {
        info!(state = %self.state(), "Shutdown requested");
        self.inner.shutdown.request();
    }

    async fn run(self) {
        let period = self.inner.monitor.period;
        info!(
            pair = %self.inner.monitor.pair,
            period_secs = period.as_secs(),
            "Broadcast loop started"
        );

        while !self.inner.shutdown.is_requested() {
            let summary = self.run_cycle().await;
            info!(
                delivered = summary.delivered,
                failed = summary.failed,
                skipped = summary.skipped,
                "Broadcast cycle finished"
            );

            tokio::select! {
                () = tokio::time::sleep(period) => {}
                () = self.inner.shutdown.cancelled() => {}
            }
        }

        self.inner.shutdown.finish();
        info!("Broadcast loop stopped");
    }

    /// Runs one cycle over a snapshot of the active subscribers.
    ///
    /// Failures are logged per subscriber and never abort the cycle. The
    /// shutdown flag is checked before each subscriber.
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();

        let subscribers = match self.inner.store.list_active().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                error!(error = %e, "Could not read subscribers, skipping cycle");
                return summary;
            }
        };
        let chat_ids: Vec<ChatId> = subscribers
            .iter()
            .filter(|s| s.active)
            .map(|s| s.chat_id)
            .collect();

        for (index, chat_id) in chat_ids.iter().enumerate() {
            if self.inner.shutdown.is_requested() {
                summary.skipped = chat_ids.len() - index;
                info!(skipped = summary.skipped, "Cycle interrupted by shutdown");
                break;
            }

            match self.broadcast_to(*chat_id).await {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    warn!(chat_id = %chat_id, error = %e, "Broadcast to subscriber failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    async fn broadcast_to(&self, chat_id: ChatId) -> Result<()> {
        let report = self.build_report().await?;
        self.deliver(chat_id, &report).await
    }

    /// Runs the pipeline for the configured pair.
    ///
    /// # Errors
    ///
    /// Propagates exchange failures and
    /// [`BookwatchError::InsufficientData`](crate::BookwatchError::InsufficientData)
    /// for an empty candle window.
    pub async fn build_report(&self) -> Result<Report> {
        let monitor = &self.inner.monitor;
        let since_ms = window_start(now_ms(), monitor.window, monitor.utc_offset_hours);

        let book = self.inner.market.order_book(&monitor.pair).await?;
        let candles = self
            .inner
            .market
            .historical_candles(&monitor.pair, monitor.interval, since_ms)
            .await?;
        let threshold = estimate(&candles)?;

        Ok(Report {
            pair: monitor.pair.clone(),
            threshold,
            scan: scan(&book, threshold),
        })
    }

    /// Sends every report line, stopping at the first failed send.
    async fn deliver(&self, chat_id: ChatId, report: &Report) -> Result<()> {
        for line in report.lines() {
            self.inner.delivery.send_text(chat_id, &line).await?;
        }
        Ok(())
    }

    /// Builds and sends a report to `chat_id` right away, outside the cycle.
    ///
    /// Any chat may query, subscribed or not. If the pipeline fails the chat
    /// gets [`QUERY_FAILURE_NOTICE`] instead of a partial report.
    ///
    /// # Errors
    ///
    /// Returns the delivery error if the report or the notice cannot be sent.
    pub async fn query_now(&self, chat_id: ChatId) -> Result<()> {
        match self.build_report().await {
            Ok(report) => self.deliver(chat_id, &report).await,
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "On-demand query failed");
                self.inner
                    .delivery
                    .send_text(chat_id, QUERY_FAILURE_NOTICE)
                    .await
            }
        }
    }

    /// Turns scheduled reports on or off for `chat_id`, registering it if
    /// unknown. Repeating the same call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::StoreUnavailable`](crate::BookwatchError::StoreUnavailable)
    /// if the store rejects the write.
    pub async fn set_active(&self, chat_id: ChatId, active: bool) -> Result<()> {
        self.inner.store.upsert(chat_id, active).await?;
        info!(chat_id = %chat_id, active, "Subscription updated");
        Ok(())
    }

    /// Registers `chat_id` as an active subscriber unless already known.
    /// An existing subscriber's flag is left untouched.
    ///
    /// Returns `true` if the subscriber is new.
    ///
    /// # Errors
    ///
    /// Returns [`BookwatchError::StoreUnavailable`](crate::BookwatchError::StoreUnavailable)
    /// if the store rejects the write.
    pub async fn ensure_registered(&self, chat_id: ChatId) -> Result<bool> {
        let created = self.inner.store.ensure_registered(chat_id).await?;
        if created {
            info!(chat_id = %chat_id, "New subscriber registered");
        }
        Ok(created)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
