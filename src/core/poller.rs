/// Metrics polling loop
///
/// Fetches once on start and then every `POLL_INTERVAL`, feeding successful
/// samples into the latest-sample slot and the bounded history. Ticks follow
/// a fixed schedule from activation; each tick runs its fetch in its own task
/// so a slow response never delays the next tick.
///
/// Because fetches can overlap, every fetch gets a sequence number and the
/// `OverlapPolicy` decides what happens to responses that land late.

use chrono::{DateTime, Local};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::Poll;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::fetcher::{FetchError, Fetcher};
use crate::core::history::HistoryBuffer;
use crate::core::logger::PollLogger;
use crate::core::sample::{Capture, HistoryEntry, MetricSample};
use crate::utils::POLL_INTERVAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Apply a response only if it is newer than the last applied one
    #[default]
    Sequenced,
    /// Skip a tick while the previous fetch is still running
    SkipWhileInFlight,
    /// Apply responses in completion order, even if older ones land last
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    Idle,
    Polling,
    Stopped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollerError {
    #[error("metrics poller is already running")]
    AlreadyRunning,

    #[error("metrics poller was stopped and cannot be restarted")]
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollStats {
    pub ticks: u64,
    pub successes: u64,
    pub failures: u64,
    pub skipped_ticks: u64,
    pub stale_discarded: u64,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Local>>,
}

/// What the presentation layer renders: cards read `latest`, the chart reads `history`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub latest: MetricSample,
    pub history: HistoryBuffer,
    pub stats: PollStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Applied,
    /// An older fetch completed after a newer one had been applied
    Stale,
    /// The poller was stopped before the fetch completed
    Closed,
}

/// Shared state written only by fetch completions
#[derive(Debug)]
pub struct PollerState {
    snapshot: DashboardSnapshot,
    last_applied_seq: Option<u64>,
    open: bool,
}

impl PollerState {
    pub fn new() -> Self {
        Self {
            snapshot: DashboardSnapshot::default(),
            last_applied_seq: None,
            open: true,
        }
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_stale(&self, seq: u64) -> bool {
        self.last_applied_seq.map_or(false, |last| seq < last)
    }

    fn note_tick(&mut self, skipped: bool) {
        if !self.open {
            return;
        }
        self.snapshot.stats.ticks += 1;
        if skipped {
            self.snapshot.stats.skipped_ticks += 1;
        }
    }

    pub fn record_success(&mut self, seq: u64, capture: &Capture, policy: OverlapPolicy) -> RecordOutcome {
        if !self.open {
            return RecordOutcome::Closed;
        }

        if policy == OverlapPolicy::Sequenced && self.is_stale(seq) {
            self.snapshot.stats.stale_discarded += 1;
            return RecordOutcome::Stale;
        }

        self.snapshot.latest = capture.sample.clone();
        self.snapshot.history.push(HistoryEntry::from_capture(capture));
        self.last_applied_seq = Some(self.last_applied_seq.map_or(seq, |last| last.max(seq)));

        let stats = &mut self.snapshot.stats;
        stats.successes += 1;
        stats.last_status = Some(capture.status);
        stats.last_error = None;
        stats.last_success_at = Some(capture.captured_at);

        RecordOutcome::Applied
    }

    /// Failures never touch the sample or history, only the counters
    pub fn record_failure(&mut self, seq: u64, error: &FetchError) -> RecordOutcome {
        if !self.open {
            return RecordOutcome::Closed;
        }

        self.snapshot.stats.failures += 1;
        if self.is_stale(seq) {
            return RecordOutcome::Stale;
        }
        self.snapshot.stats.last_error = Some(error.to_string());

        RecordOutcome::Applied
    }
}

impl Default for PollerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one tick needs, cloned into the scheduler and fetch tasks
#[derive(Clone)]
struct PollCycle {
    fetcher: Arc<dyn Fetcher>,
    logger: Arc<dyn PollLogger>,
    state: Arc<RwLock<PollerState>>,
    updates: Option<UnboundedSender<DashboardSnapshot>>,
    policy: OverlapPolicy,
    next_seq: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    // Set by stop() and by Drop, which cannot wait for the state lock
    closed: Arc<AtomicBool>,
}

impl PollCycle {
    fn is_closed(&self, state: &PollerState) -> bool {
        !state.is_open() || self.closed.load(Ordering::SeqCst)
    }

    async fn tick(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        let skip = self.policy == OverlapPolicy::SkipWhileInFlight
            && self.in_flight.load(Ordering::SeqCst) > 0;

        self.state.write().await.note_tick(skip);

        if skip {
            tracing::debug!("previous fetch still in flight, skipping tick");
            return;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let cycle = self.clone();
        tokio::spawn(async move {
            cycle.fetch(seq).await;
        });
    }

    async fn fetch(&self, seq: u64) {
        // The request is started under the read lock, so once stop() has taken
        // the write lock no fetch that has not started yet can start
        let (pending, first_poll) = {
            let state = self.state.read().await;
            if self.is_closed(&state) {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                tracing::debug!(seq, "poll loop stopped before the fetch started, skipping");
                return;
            }

            let mut pending = self.fetcher.fetch();
            let first_poll =
                std::future::poll_fn(|cx| Poll::Ready(pending.as_mut().poll(cx))).await;
            (pending, first_poll)
        };

        let result = match first_poll {
            Poll::Ready(result) => result,
            Poll::Pending => pending.await,
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let snapshot = {
            let mut state = self.state.write().await;
            let outcome = if self.is_closed(&state) {
                RecordOutcome::Closed
            } else {
                match &result {
                    Ok(capture) => state.record_success(seq, capture, self.policy),
                    Err(e) => state.record_failure(seq, e),
                }
            };

            match outcome {
                RecordOutcome::Applied => Some(state.snapshot().clone()),
                RecordOutcome::Stale => {
                    if result.is_ok() {
                        self.logger.warn(&format!(
                            "Discarding out-of-order metrics response #{}",
                            seq
                        ));
                    }
                    Some(state.snapshot().clone())
                }
                RecordOutcome::Closed => {
                    tracing::debug!(seq, "fetch completed after the poll loop stopped, ignoring");
                    None
                }
            }
        };

        if let (Some(snapshot), Some(updates)) = (snapshot, &self.updates) {
            // Receiver gone means nobody is rendering anymore
            let _ = updates.send(snapshot);
        }
    }
}

pub struct MetricsPoller {
    cycle: PollCycle,
    phase: PollerPhase,
    handle: Option<JoinHandle<()>>,
}

impl MetricsPoller {
    pub fn new(fetcher: Arc<dyn Fetcher>, logger: Arc<dyn PollLogger>) -> Self {
        Self {
            cycle: PollCycle {
                fetcher,
                logger,
                state: Arc::new(RwLock::new(PollerState::new())),
                updates: None,
                policy: OverlapPolicy::default(),
                next_seq: Arc::new(AtomicU64::new(0)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicBool::new(false)),
            },
            phase: PollerPhase::Idle,
            handle: None,
        }
    }

    pub fn with_policy(mut self, policy: OverlapPolicy) -> Self {
        self.cycle.policy = policy;
        self
    }

    /// Push a snapshot to `tx` after every fetch completion
    pub fn with_updates(mut self, tx: UnboundedSender<DashboardSnapshot>) -> Self {
        self.cycle.updates = Some(tx);
        self
    }

    pub fn phase(&self) -> PollerPhase {
        self.phase
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.cycle.policy
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.cycle.state.read().await.snapshot().clone()
    }

    /// Fetch immediately, then every `POLL_INTERVAL`. Must run inside a tokio runtime.
    pub fn start(&mut self) -> Result<(), PollerError> {
        match self.phase {
            PollerPhase::Polling => return Err(PollerError::AlreadyRunning),
            PollerPhase::Stopped => return Err(PollerError::Stopped),
            PollerPhase::Idle => {}
        }

        self.cycle.logger.info("Initializing metrics fetch loop...");

        let cycle = self.cycle.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                // first tick completes immediately
                interval.tick().await;
                cycle.tick().await;
            }
        }));
        self.phase = PollerPhase::Polling;

        Ok(())
    }

    /// Cancel the schedule. Fetches already in flight finish but are ignored,
    /// and no new fetch starts once this returns.
    pub async fn stop(&mut self) {
        if self.phase == PollerPhase::Stopped {
            return;
        }

        self.cycle.closed.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Wait for cancellation so no tick can slip in after this point
            let _ = handle.await;
        }

        self.cycle.state.write().await.close();
        self.phase = PollerPhase::Stopped;
        self.cycle.logger.info("Stopped metrics fetch loop.");
    }
}

impl Drop for MetricsPoller {
    fn drop(&mut self) {
        self.cycle.closed.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        if let Ok(mut state) = self.cycle.state.try_write() {
            state.close();
        }
    }
}
