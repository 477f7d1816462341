//! TargetResolver - adaptive re-resolution loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, ResolverConfig};
use futures::future::join_all;
use observability::{record_resolution, set_invalid_targets, ErrorSink};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, instrument};

use crate::cell::ResolutionPublisher;
use crate::lookup::HostLookup;

/// Tick intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverIntervals {
    /// Used while any target is invalid
    pub invalid: Duration,
    /// Used while every target is valid
    pub standard: Duration,
}

impl From<ResolverConfig> for ResolverIntervals {
    fn from(config: ResolverConfig) -> Self {
        Self {
            invalid: config.invalid_interval(),
            standard: config.standard_interval(),
        }
    }
}

impl Default for ResolverIntervals {
    fn default() -> Self {
        ResolverConfig::default().into()
    }
}

/// 单个目标：发布端 + 是否有 lookup 仍在进行
#[derive(Debug)]
struct TrackedTarget {
    publisher: ResolutionPublisher,
    pending: AtomicBool,
}

/// Keeps every datagram target's resolution cell current.
///
/// The next delay is chosen from the validity observed *before* a tick's
/// lookups start, so a target that fails on tick N only shortens the
/// interval after tick N+1. Lookups run as detached tasks: a slow host
/// never delays the next tick or the refresh of any other target.
pub struct TargetResolver<L> {
    targets: Vec<Arc<TrackedTarget>>,
    lookup: Arc<L>,
    intervals: ResolverIntervals,
    errors: ErrorSink,
}

impl<L: HostLookup + Send + Sync + 'static> TargetResolver<L> {
    pub fn new(
        targets: Vec<ResolutionPublisher>,
        lookup: L,
        intervals: ResolverIntervals,
        errors: ErrorSink,
    ) -> Self {
        let targets = targets
            .into_iter()
            .map(|publisher| {
                Arc::new(TrackedTarget {
                    publisher,
                    pending: AtomicBool::new(false),
                })
            })
            .collect();

        Self {
            targets,
            lookup: Arc::new(lookup),
            intervals,
            errors,
        }
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Delay until the next tick, from the current validity state.
    pub fn next_delay(&self) -> Duration {
        if self.targets.iter().any(|t| !t.publisher.is_valid()) {
            self.intervals.invalid
        } else {
            self.intervals.standard
        }
    }

    /// One tick, waiting for this tick's lookups to finish.
    ///
    /// Returns the delay chosen before the lookups started.
    pub async fn tick(&self) -> Duration {
        let (delay, lookups) = self.start_tick();
        join_all(lookups).await;
        delay
    }

    /// Pick the next delay, then start one lookup per idle target.
    ///
    /// A target whose previous lookup is still running is skipped this tick.
    #[instrument(name = "resolver_tick", skip(self), fields(targets = self.targets.len()))]
    fn start_tick(&self) -> (Duration, Vec<JoinHandle<()>>) {
        let delay = self.next_delay();

        let invalid = self.targets.iter().filter(|t| !t.publisher.is_valid()).count();
        set_invalid_targets(invalid);

        let mut lookups = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            if target.pending.swap(true, Ordering::AcqRel) {
                debug!(host = target.publisher.host(), "Lookup still in flight, skipped");
                continue;
            }

            let target = Arc::clone(target);
            let lookup = Arc::clone(&self.lookup);
            let errors = self.errors.clone();
            lookups.push(tokio::spawn(async move {
                refresh(lookup.as_ref(), &target.publisher, &errors).await;
                target.pending.store(false, Ordering::Release);
            }));
        }

        debug!(
            invalid,
            started = lookups.len(),
            next_ms = delay.as_millis() as u64,
            "Resolution tick started"
        );
        (delay, lookups)
    }

    /// Run forever, each tick scheduled relative to the start of the previous one.
    #[instrument(name = "resolver_run", skip(self))]
    pub async fn run(self) {
        info!(
            targets = self.targets.len(),
            invalid_ms = self.intervals.invalid.as_millis() as u64,
            standard_ms = self.intervals.standard.as_millis() as u64,
            "Target resolver started"
        );

        loop {
            let started = Instant::now();
            let (delay, _lookups) = self.start_tick();
            sleep_until(started + delay).await;
        }
    }

    /// Spawn the resolver as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

async fn refresh<L: HostLookup>(lookup: &L, target: &ResolutionPublisher, errors: &ErrorSink) {
    match lookup.lookup(target.host(), target.port()).await {
        Ok(address) => {
            if target.current().sendable() != Some(address) {
                info!(host = target.host(), %address, "Target resolved");
            }
            target.publish_resolved(address);
            record_resolution(target.host(), true);
        }
        Err(e) => {
            target.publish_failed();
            record_resolution(target.host(), false);
            errors.record(&ContractError::resolution(target.host(), e.to_string()));
        }
    }
}
