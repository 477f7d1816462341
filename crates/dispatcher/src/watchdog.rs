//! Watchdog - 事件流存活监测
//!
//! Dispatcher 每收到一个 raddec 就 feed 一次；超过 interval + lenience
//! 未被 feed 时记录一次 `Stalled`，恢复后重新计数。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, WatchdogConfig};
use observability::ErrorSink;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, instrument, warn};

/// Cloneable feed side, held by the dispatcher.
#[derive(Debug, Clone)]
pub struct WatchdogFeed {
    epoch: Instant,
    /// ms since `epoch` of the latest feed
    last_fed_ms: Arc<AtomicU64>,
}

impl WatchdogFeed {
    pub fn feed(&self) {
        let now = self.epoch.elapsed().as_millis() as u64;
        self.last_fed_ms.store(now, Ordering::Relaxed);
    }

    /// Time since the latest feed (or since creation).
    pub fn idle(&self) -> Duration {
        let last = self.last_fed_ms.load(Ordering::Relaxed);
        self.epoch
            .elapsed()
            .saturating_sub(Duration::from_millis(last))
    }
}

pub struct Watchdog {
    feed: WatchdogFeed,
    interval: Duration,
    threshold: Duration,
    stalled: bool,
    errors: ErrorSink,
}

impl Watchdog {
    pub fn new(config: &WatchdogConfig, errors: ErrorSink) -> Self {
        let interval = Duration::from_millis(config.interval_ms);
        Self {
            feed: WatchdogFeed {
                epoch: Instant::now(),
                last_fed_ms: Arc::new(AtomicU64::new(0)),
            },
            interval,
            threshold: interval + Duration::from_millis(config.lenience_ms),
            stalled: false,
            errors,
        }
    }

    pub fn feed_handle(&self) -> WatchdogFeed {
        self.feed.clone()
    }

    /// Evaluate liveness once. Returns whether the stream is currently stalled.
    pub fn check(&mut self) -> bool {
        let idle = self.feed.idle();
        let stalled = idle > self.threshold;

        if stalled && !self.stalled {
            let idle_ms = idle.as_millis() as u64;
            warn!(idle_ms, "Event stream stalled");
            self.errors.record(&ContractError::Stalled { idle_ms });
        } else if !stalled && self.stalled {
            info!("Event stream resumed");
        }

        self.stalled = stalled;
        stalled
    }

    #[instrument(name = "watchdog_run", skip(self))]
    pub async fn run(mut self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            threshold_ms = self.threshold.as_millis() as u64,
            "Watchdog started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一次 tick 立即返回
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.check();
        }
    }

    /// Spawn the watchdog as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WatchdogConfig {
        WatchdogConfig {
            enabled: true,
            interval_ms: 5000,
            lenience_ms: 1000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_recorded_once_per_episode() {
        let errors = ErrorSink::silent();
        let mut watchdog = Watchdog::new(&config(), errors.clone());
        let feed = watchdog.feed_handle();

        tokio::time::advance(Duration::from_millis(5500)).await;
        assert!(!watchdog.check());

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(watchdog.check());
        assert!(watchdog.check());
        assert_eq!(errors.recorded(), 1);

        feed.feed();
        assert!(!watchdog.check());

        tokio::time::advance(Duration::from_millis(7000)).await;
        assert!(watchdog.check());
        assert_eq!(errors.recorded(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regular_feeding_never_stalls() {
        let errors = ErrorSink::silent();
        let mut watchdog = Watchdog::new(&config(), errors.clone());
        let feed = watchdog.feed_handle();

        for _ in 0..10 {
            tokio::time::advance(Duration::from_millis(4000)).await;
            feed.feed();
            assert!(!watchdog.check());
        }
        assert_eq!(errors.recorded(), 0);
    }
}
