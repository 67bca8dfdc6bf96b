//! Foreground time tracking
//!
//! While a module is open, elapsed seconds are flushed on a fixed interval,
//! when the reader looks away, and when the module is closed. Samples are
//! sent over a channel; the owner of the [`ProgressStore`] applies them.
//!
//! [`ProgressStore`]: crate::progress::ProgressStore

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Whether the reading view is in front of the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Seconds spent on one module since the previous sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSample {
    pub slug: String,
    pub seconds: u64,
}

/// Counts visible time between flushes.
///
/// Only whole seconds are reported; the fractional remainder carries into
/// the next flush while visible and is dropped on hide.
#[derive(Debug, Clone)]
pub struct ForegroundTimer {
    since: Option<Instant>,
}

impl ForegroundTimer {
    pub fn new(now: Instant, visible: bool) -> Self {
        Self { since: visible.then_some(now) }
    }

    pub fn is_running(&self) -> bool {
        self.since.is_some()
    }

    /// Whole seconds since the last flush, if any
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        let since = self.since?;
        let seconds = now.saturating_duration_since(since).as_secs();
        if seconds == 0 {
            return None;
        }
        self.since = Some(since + Duration::from_secs(seconds));
        Some(seconds)
    }

    /// Flush and pause
    pub fn hide(&mut self, now: Instant) -> Option<u64> {
        let seconds = self.poll(now);
        self.since = None;
        seconds
    }

    /// Resume counting from `now`
    pub fn show(&mut self, now: Instant) {
        if self.since.is_none() {
            self.since = Some(now);
        }
    }

    /// Final flush
    pub fn finish(&mut self, now: Instant) -> Option<u64> {
        self.hide(now)
    }
}

fn emit(tx: &mpsc::UnboundedSender<TimeSample>, slug: &str, seconds: Option<u64>) {
    if let Some(seconds) = seconds {
        tracing::debug!("Flushing {}s on {}", seconds, slug);
        // The owner may already be gone during shutdown
        let _ = tx.send(TimeSample { slug: slug.to_string(), seconds });
    }
}

/// Track time on `slug` until `cancel` fires or the visibility sender drops
pub fn spawn_time_tracker(
    slug: String,
    interval: Duration,
    mut visibility: watch::Receiver<Visibility>,
    cancel: CancellationToken,
) -> (JoinHandle<()>, mpsc::UnboundedReceiver<TimeSample>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let now = || tokio::time::Instant::now().into_std();
        let visible = *visibility.borrow_and_update() == Visibility::Visible;
        let mut timer = ForegroundTimer::new(now(), visible);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    emit(&tx, &slug, timer.finish(now()));
                    break;
                }

                changed = visibility.changed() => {
                    if changed.is_err() {
                        emit(&tx, &slug, timer.finish(now()));
                        break;
                    }
                    match *visibility.borrow_and_update() {
                        Visibility::Hidden => emit(&tx, &slug, timer.hide(now())),
                        Visibility::Visible => timer.show(now()),
                    }
                }

                _ = ticker.tick() => {
                    emit(&tx, &slug, timer.poll(now()));
                }
            }
        }

        tracing::debug!("Stopped tracking {}", slug);
    });

    (handle, rx)
}
