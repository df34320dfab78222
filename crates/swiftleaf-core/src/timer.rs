//! One-shot timers for chunk advancement.
//!
//! A scheduled tick carries the scheduler generation it was created for.
//! Ticks from older generations are stale and must be ignored by the receiver.

use crate::cancellation::CancellationToken;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub generation: u64,
}

pub trait Timer {
    /// Arrange for a [`TimerFired`] after `delay`. Cancelling the returned
    /// token suppresses the tick.
    fn schedule(&mut self, delay: Duration, generation: u64) -> CancellationToken;
}

/// Timer backed by the tokio clock; ticks arrive on an unbounded channel.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    tx: mpsc::UnboundedSender<TimerFired>,
}

impl TokioTimer {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Timer for TokioTimer {
    fn schedule(&mut self, delay: Duration, generation: u64) -> CancellationToken {
        let token = CancellationToken::new();
        let observer = token.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if observer.is_cancelled() {
                return;
            }
            // Receiver gone means the reader is shutting down.
            let _ = tx.send(TimerFired { generation });
        });
        token
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledTick {
    pub delay: Duration,
    pub generation: u64,
    pub token: CancellationToken,
}

/// Records ticks instead of sleeping; tests fire them explicitly.
#[derive(Debug, Default)]
pub struct ManualTimer {
    scheduled: Vec<ScheduledTick>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> &[ScheduledTick] {
        &self.scheduled
    }

    /// Ticks that were scheduled and not cancelled or fired yet.
    pub fn live(&self) -> Vec<&ScheduledTick> {
        self.scheduled
            .iter()
            .filter(|tick| !tick.token.is_cancelled())
            .collect()
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.scheduled.last().map(|tick| tick.delay)
    }

    /// Fire the most recent live tick, consuming it.
    pub fn fire_latest(&mut self) -> Option<TimerFired> {
        let position = self
            .scheduled
            .iter()
            .rposition(|tick| !tick.token.is_cancelled())?;
        let tick = self.scheduled.remove(position);
        Some(TimerFired {
            generation: tick.generation,
        })
    }
}

impl Timer for ManualTimer {
    fn schedule(&mut self, delay: Duration, generation: u64) -> CancellationToken {
        let token = CancellationToken::new();
        self.scheduled.push(ScheduledTick {
            delay,
            generation,
            token: token.clone(),
        });
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_delivers_after_delay() {
        let (mut timer, mut rx) = TokioTimer::channel();
        let _token = timer.schedule(Duration::from_millis(240), 7);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        let fired = rx.recv().await.expect("tick delivered");
        assert_eq!(fired, TimerFired { generation: 7 });
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_tokio_timer_stays_silent() {
        let (mut timer, mut rx) = TokioTimer::channel();
        let token = timer.schedule(Duration::from_millis(100), 1);
        token.cancel();
        let _live = timer.schedule(Duration::from_millis(300), 2);

        let fired = rx.recv().await.expect("second tick delivered");
        assert_eq!(fired.generation, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn manual_timer_fires_latest_live_tick() {
        let mut timer = ManualTimer::new();
        let first = timer.schedule(Duration::from_millis(100), 1);
        timer.schedule(Duration::from_millis(200), 2);
        assert_eq!(timer.live().len(), 2);

        assert_eq!(timer.fire_latest(), Some(TimerFired { generation: 2 }));
        first.cancel();
        assert_eq!(timer.fire_latest(), None);
        assert_eq!(timer.last_delay(), Some(Duration::from_millis(100)));
    }
}
