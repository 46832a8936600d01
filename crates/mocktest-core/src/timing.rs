//! Elapsed-time bookkeeping and the one-second ticker.
//!
//! The [`TimeLedger`] is a plain counter: it does not read a clock. Time only
//! moves when the owner feeds it a tick, and every tick is charged to the
//! question on screen at that moment, so coming back to a question keeps
//! adding to its total.
//!
//! The [`Ticker`] produces those ticks from a tokio interval. It is a scoped
//! resource: dropping it aborts the background task.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Seconds spent overall and per question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLedger {
    elapsed_seconds: u64,
    per_question: BTreeMap<usize, u64>,
}

impl TimeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one second against `question`.
    pub fn record_tick(&mut self, question: usize) {
        self.elapsed_seconds += 1;
        *self.per_question.entry(question).or_insert(0) += 1;
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Seconds per question index. Questions never on screen while the
    /// clock ran have no entry.
    pub fn per_question(&self) -> &BTreeMap<usize, u64> {
        &self.per_question
    }

    pub fn seconds_on(&self, question: usize) -> u64 {
        self.per_question.get(&question).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.elapsed_seconds = 0;
        self.per_question.clear();
    }
}

/// Render seconds as `MM:SS`. Minutes keep counting past 59.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// One tick from a [`Ticker`]; `seq` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub seq: u64,
}

/// Background interval that emits a [`Tick`] every `period`.
///
/// Must be created inside a tokio runtime. The first tick fires one full
/// period after spawning.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
    rx: mpsc::Receiver<Tick>,
}

impl Ticker {
    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_interval(period, tx));
        Self { handle, rx }
    }

    /// Wait for the next tick. Returns `None` once the ticker is stopped and
    /// drained.
    pub async fn next(&mut self) -> Option<Tick> {
        self.rx.recv().await
    }

    /// Abort the interval task. Ticks already queued are still returned by
    /// [`Ticker::next`].
    pub fn stop(&mut self) {
        self.handle.abort();
        self.rx.close();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_interval(period: Duration, tx: mpsc::Sender<Tick>) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq = 0u64;
    loop {
        interval.tick().await;
        seq += 1;
        if tx.send(Tick { seq }).await.is_err() {
            tracing::debug!(seq, "tick receiver gone, ticker exiting");
            break;
        }
    }
}
