//! Shared test doubles for the market data, delivery, and store seams.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bookwatch::config::MonitorConfig;
use bookwatch::delivery::Delivery;
use bookwatch::exchange::MarketData;
use bookwatch::models::{Candle, CandleInterval, ChatId, OrderBookSnapshot, PriceLevel};
use bookwatch::scheduler::BroadcastScheduler;
use bookwatch::store::MemoryStore;
use bookwatch::{BookwatchError, Result};

pub const PAIR: &str = "ALGOUSDT";

type BookHook = Box<dyn Fn(usize) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub fn candle(volume: Decimal) -> Candle {
    Candle {
        open_time: 1_700_000_000_000,
        open: dec!(0.19),
        high: dec!(0.20),
        low: dec!(0.18),
        close: dec!(0.19),
        volume,
        close_time: 1_700_000_299_999,
        trades: 42,
    }
}

pub fn book(bids: &[(Decimal, Decimal)], asks: &[(Decimal, Decimal)]) -> OrderBookSnapshot {
    OrderBookSnapshot {
        last_update_id: 1,
        bids: bids.iter().map(|&(p, q)| PriceLevel::new(p, q)).collect(),
        asks: asks.iter().map(|&(p, q)| PriceLevel::new(p, q)).collect(),
    }
}

/// The order book and candle window from the reference walkthrough:
/// threshold 20, one large order per side.
pub fn reference_market() -> FakeMarket {
    FakeMarket::new(
        book(
            &[(dec!(100), dec!(5)), (dec!(99), dec!(25))],
            &[(dec!(101), dec!(15)), (dec!(102), dec!(22))],
        ),
        vec![candle(dec!(10)), candle(dec!(20)), candle(dec!(30))],
    )
}

pub fn reference_report_lines() -> Vec<String> {
    vec![
        "Pair is ALGOUSDT".to_string(),
        "Avg volume is 20".to_string(),
        "Bid price 99\nVolume 25".to_string(),
        "Ask price 102\nVolume 22".to_string(),
    ]
}

/// Scriptable [`MarketData`] double.
pub struct FakeMarket {
    book: OrderBookSnapshot,
    candles: Vec<Candle>,
    scripted_candles: Mutex<VecDeque<Vec<Candle>>>,
    fail_book: AtomicBool,
    book_calls: AtomicUsize,
    candle_calls: AtomicUsize,
    last_since: Mutex<Option<(CandleInterval, u64)>>,
    hook: OnceLock<BookHook>,
}

impl FakeMarket {
    pub fn new(book: OrderBookSnapshot, candles: Vec<Candle>) -> Self {
        Self {
            book,
            candles,
            scripted_candles: Mutex::new(VecDeque::new()),
            fail_book: AtomicBool::new(false),
            book_calls: AtomicUsize::new(0),
            candle_calls: AtomicUsize::new(0),
            last_since: Mutex::new(None),
            hook: OnceLock::new(),
        }
    }

    /// Queues candle windows returned by the next calls, before falling
    /// back to the default window.
    pub fn script_candles(&self, windows: impl IntoIterator<Item = Vec<Candle>>) {
        self.scripted_candles.lock().unwrap().extend(windows);
    }

    pub fn fail_order_book(&self, fail: bool) {
        self.fail_book.store(fail, Ordering::SeqCst);
    }

    /// Runs `hook(call_number)` inside every order book fetch, 1-based.
    pub fn on_order_book<F, Fut>(&self, hook: F)
    where
        F: Fn(usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: BookHook = Box::new(move |n| Box::pin(hook(n)));
        assert!(self.hook.set(boxed).is_ok(), "hook already set");
    }

    pub fn book_calls(&self) -> usize {
        self.book_calls.load(Ordering::SeqCst)
    }

    pub fn candle_calls(&self) -> usize {
        self.candle_calls.load(Ordering::SeqCst)
    }

    pub fn last_candle_request(&self) -> Option<(CandleInterval, u64)> {
        *self.last_since.lock().unwrap()
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn order_book(&self, pair: &str) -> Result<OrderBookSnapshot> {
        assert_eq!(pair, PAIR);
        let call = self.book_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = self.hook.get() {
            hook(call).await;
        }
        if self.fail_book.load(Ordering::SeqCst) {
            return Err(BookwatchError::Exchange("503 Service Unavailable".to_string()));
        }
        Ok(self.book.clone())
    }

    async fn historical_candles(
        &self,
        pair: &str,
        interval: CandleInterval,
        since_ms: u64,
    ) -> Result<Vec<Candle>> {
        assert_eq!(pair, PAIR);
        self.candle_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_since.lock().unwrap() = Some((interval, since_ms));
        let scripted = self.scripted_candles.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| self.candles.clone()))
    }
}

/// [`Delivery`] double that records every message.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<(ChatId, String)>>,
    buttons: Mutex<Vec<(ChatId, Vec<String>)>>,
    failing: Mutex<HashSet<ChatId>>,
}

impl RecordingDelivery {
    pub fn fail_for(&self, chat_id: ChatId) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    pub fn messages_for(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Chats that received at least one message, in first-delivery order.
    pub fn recipients(&self) -> Vec<ChatId> {
        let mut seen = Vec::new();
        for (id, _) in self.sent.lock().unwrap().iter() {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }

    /// Number of reports (not lines) delivered to `chat_id`.
    pub fn reports_for(&self, chat_id: ChatId) -> usize {
        self.messages_for(chat_id)
            .iter()
            .filter(|line| line.starts_with("Pair is "))
            .count()
    }

    pub fn buttons_for(&self, chat_id: ChatId) -> Vec<Vec<String>> {
        self.buttons
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, labels)| labels.clone())
            .collect()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(BookwatchError::Delivery(format!(
                "Forbidden: bot was blocked by user {chat_id}"
            )));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_with_buttons(
        &self,
        chat_id: ChatId,
        text: &str,
        buttons: &[&str],
    ) -> Result<()> {
        self.send_text(chat_id, text).await?;
        self.buttons
            .lock()
            .unwrap()
            .push((chat_id, buttons.iter().map(|b| b.to_string()).collect()));
        Ok(())
    }
}

pub fn monitor(period: Duration) -> MonitorConfig {
    MonitorConfig {
        pair: PAIR.to_string(),
        period,
        ..MonitorConfig::default()
    }
}

/// Everything a scheduler test needs, wired together.
pub struct Harness {
    pub market: Arc<FakeMarket>,
    pub delivery: Arc<RecordingDelivery>,
    pub store: Arc<MemoryStore>,
    pub scheduler: BroadcastScheduler,
}

impl Harness {
    pub fn new(market: FakeMarket, store: MemoryStore, period: Duration) -> Self {
        let market = Arc::new(market);
        let delivery = Arc::new(RecordingDelivery::default());
        let store = Arc::new(store);
        let scheduler = BroadcastScheduler::new(
            monitor(period),
            market.clone(),
            delivery.clone(),
            store.clone(),
        );
        Self {
            market,
            delivery,
            store,
            scheduler,
        }
    }
}

/// Polls `condition` every few milliseconds until it holds or `limit` passes.
pub async fn eventually(limit: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
