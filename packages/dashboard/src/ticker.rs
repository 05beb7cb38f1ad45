//! Cancellable fixed-interval playback ticker.
//!
//! A spawned task feeds ticks through a bounded [`mpsc`] channel; the host
//! awaits [`PlaybackTicker::next_tick`] and applies each tick to the
//! dashboard on its own task, so all state changes stay single-threaded.
//! Stopping (or dropping) the ticker aborts the task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Ticks buffered ahead of the consumer. One is enough: a slow consumer
/// should skip ticks rather than replay a burst of them.
const TICK_CHANNEL_BUFFER: usize = 1;

/// Repeating timer that runs only while playback is active.
pub struct PlaybackTicker {
    period: Duration,
    task: Option<JoinHandle<()>>,
    ticks: Option<mpsc::Receiver<()>>,
}

impl PlaybackTicker {
    /// Creates a stopped ticker. Must be started from within a tokio
    /// runtime.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            task: None,
            ticks: None,
        }
    }

    /// Interval between ticks.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Starts (or restarts) ticking. The first tick arrives one period
    /// from now.
    pub fn start(&mut self) {
        self.stop();

        let (tx, rx) = mpsc::channel(TICK_CHANNEL_BUFFER);
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        self.task = Some(task);
        self.ticks = Some(rx);
        log::trace!("Playback ticker started ({}ms)", period.as_millis());
    }

    /// Cancels the ticking task. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::trace!("Playback ticker stopped");
        }
        self.ticks = None;
    }

    /// Starts or stops the ticker so it runs exactly while `playing`.
    pub fn sync(&mut self, playing: bool) {
        match (playing, self.is_running()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    /// `true` while the ticking task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Waits for the next tick. Returns `false` immediately when stopped.
    pub async fn next_tick(&mut self) -> bool {
        match self.ticks.as_mut() {
            Some(rx) => rx.recv().await.is_some(),
            None => false,
        }
    }
}

impl Drop for PlaybackTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_while_running() {
        let mut ticker = PlaybackTicker::new(Duration::from_millis(40));
        ticker.start();
        let started = tokio::time::Instant::now();
        for _ in 0..3 {
            assert!(ticker.next_tick().await);
        }
        assert!(started.elapsed() >= Duration::from_millis(120));
        assert!(ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_ticker_yields_nothing() {
        let mut ticker = PlaybackTicker::new(Duration::from_millis(40));
        assert!(!ticker.next_tick().await);

        ticker.start();
        assert!(ticker.next_tick().await);
        ticker.stop();
        assert!(!ticker.is_running());
        assert!(!ticker.next_tick().await);
    }

    #[tokio::test(start_paused = true)]
    async fn sync_follows_play_state() {
        let mut ticker = PlaybackTicker::new(Duration::from_millis(40));
        ticker.sync(true);
        assert!(ticker.is_running());
        ticker.sync(true);
        assert!(ticker.is_running());
        ticker.sync(false);
        assert!(!ticker.is_running());
    }
}
