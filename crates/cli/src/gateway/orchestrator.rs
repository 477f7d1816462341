//! Gateway orchestrator - wires sources, resolver, dispatcher and liveness tasks.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{DerivedEvent, GatewayConfig, HealthSignal, Raddec, Signal};
use dispatcher::{DispatcherBuilder, Transports, Watchdog};
use ingestion::{IngestionMetrics, JsonLinesSource, MockRaddecSource};
use observability::{ErrorSink, TracingHealth};
use resolver::{ResolverIntervals, SystemLookup, TargetResolver};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{GatewayStats, PipeAggregator};

const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(500);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Where raddecs come from
#[derive(Debug, Clone)]
pub enum RaddecInput {
    /// JSON lines from a file, FIFO or stdin (`-`)
    JsonLines(PathBuf),
    /// Synthetic raddecs at the given rate (Hz)
    Mock(f64),
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub config: GatewayConfig,
    pub input: RaddecInput,
    pub derived_input: Option<PathBuf>,
    pub aggregator_output: Option<PathBuf>,
    /// Channel buffer size
    pub buffer_size: usize,
    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main relay orchestrator
pub struct Gateway {
    options: GatewayOptions,
}

/// Background tasks that end with the run
struct Background(Vec<JoinHandle<()>>);

impl Drop for Background {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

impl Gateway {
    pub fn new(options: GatewayOptions) -> Self {
        Self { options }
    }

    /// Run until every input ends or `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<GatewayStats> {
        let start_time = Instant::now();
        let config = &self.options.config;

        if let Some(port) = self.options.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let health: Arc<dyn HealthSignal> = Arc::new(TracingHealth);
        let errors = ErrorSink::new(config.gateway.debug, Arc::clone(&health));
        let mut background = Background(Vec::new());

        // Delivery clients
        let transports = Transports::connect(config)
            .await
            .context("Failed to create delivery clients")?;

        let mut builder = DispatcherBuilder::new(config, transports, errors.clone())
            .with_health(Arc::clone(&health));

        // Aggregator
        let mut aggregator_output = None;
        if let Some(path) = &self.options.aggregator_output {
            if config.aggregation_enabled() {
                let (aggregator, task) = PipeAggregator::create(path, self.options.buffer_size)
                    .await
                    .with_context(|| format!("Failed to open aggregator output {}", path.display()))?;
                let aggregator = Arc::new(aggregator);
                builder = builder.with_aggregator(aggregator.clone());
                aggregator_output = Some((aggregator, task));
            } else {
                warn!("Aggregator output given but no derived targets configured, ignoring");
            }
        }

        // Watchdog
        if config.watchdog.enabled {
            let watchdog = Watchdog::new(&config.watchdog, errors.clone());
            builder = builder.with_watchdog(watchdog.feed_handle());
            background.0.push(watchdog.spawn());
        }

        let (dispatcher, publishers) = builder.build().context("Failed to build dispatcher")?;
        let metric_handles = dispatcher.metric_handles();

        // Resolver
        if publishers.is_empty() {
            debug!("No datagram targets, resolver not started");
        } else {
            let resolver = TargetResolver::new(
                publishers,
                SystemLookup,
                ResolverIntervals::from(config.resolver),
                errors.clone(),
            );
            background.0.push(resolver.spawn());
        }

        background.0.push(spawn_heartbeat(Arc::clone(&health)));

        // Sources
        let raddec_metrics = Arc::new(IngestionMetrics::new());
        let derived_metrics = Arc::new(IngestionMetrics::new());
        let (raddec_rx, raddec_source) = self.start_raddec_source(&raddec_metrics).await?;
        let (derived_rx, derived_task) = self.start_derived_source(&derived_metrics).await?;

        info!(
            targets = metric_handles.len(),
            aggregation = config.aggregation_enabled(),
            "Relay running"
        );

        let mut dispatcher_handle = dispatcher.spawn(raddec_rx, derived_rx);

        tokio::select! {
            result = &mut dispatcher_handle => {
                if let Err(e) = result {
                    warn!(error = %e, "Dispatcher task failed");
                }
                info!("All inputs finished");
            }
            _ = shutdown => {
                warn!("Received shutdown signal, stopping relay...");
                raddec_source.stop();
                if let Some(task) = &derived_task {
                    task.abort();
                }
                if tokio::time::timeout(DRAIN_TIMEOUT, &mut dispatcher_handle).await.is_err() {
                    warn!("Dispatcher did not drain in time");
                    dispatcher_handle.abort();
                }
            }
        }

        drop(background);
        let mut aggregator_dropped = 0;
        if let Some((aggregator, task)) = aggregator_output {
            aggregator_dropped = aggregator.dropped();
            // 最后一个 sender 释放后写入任务才会结束
            drop(aggregator);
            match tokio::time::timeout(DRAIN_TIMEOUT, task).await {
                Ok(Ok(Ok(lines))) => debug!(lines, "Aggregator output flushed"),
                Ok(Ok(Err(e))) => warn!(error = %e, "Aggregator output failed"),
                _ => warn!("Aggregator output did not close in time"),
            }
        }

        let raddec_snapshot = raddec_metrics.snapshot();
        let derived_snapshot = derived_metrics.snapshot();
        let stats = GatewayStats {
            raddecs_received: raddec_snapshot.events_received,
            derived_received: derived_snapshot.events_received,
            parse_errors: raddec_snapshot.parse_errors + derived_snapshot.parse_errors,
            errors_recorded: errors.recorded(),
            aggregator_dropped,
            duration: start_time.elapsed(),
            targets: metric_handles
                .into_iter()
                .map(|(name, metrics)| (name, metrics.snapshot()))
                .collect(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rate = format!("{:.2}", stats.rate()),
            "Relay shutdown complete"
        );

        Ok(stats)
    }

    async fn start_raddec_source(
        &self,
        metrics: &Arc<IngestionMetrics>,
    ) -> Result<(mpsc::Receiver<Raddec>, RaddecSource)> {
        match &self.options.input {
            RaddecInput::JsonLines(path) => {
                let source = JsonLinesSource::open(path)
                    .await
                    .with_context(|| format!("Failed to open raddec input {}", path.display()))?;
                let (rx, task) =
                    source.start::<Raddec>(self.options.buffer_size, Some(Arc::clone(metrics)));
                Ok((rx, RaddecSource::JsonLines(task)))
            }
            RaddecInput::Mock(rate) => {
                info!(rate_hz = rate, "Running with MOCK raddec source");
                let source = MockRaddecSource::with_rate(*rate);
                let rx = source.start(self.options.buffer_size, Some(Arc::clone(metrics)));
                Ok((rx, RaddecSource::Mock(source)))
            }
        }
    }

    async fn start_derived_source(
        &self,
        metrics: &Arc<IngestionMetrics>,
    ) -> Result<(mpsc::Receiver<DerivedEvent>, Option<JoinHandle<ingestion::Result<u64>>>)> {
        match &self.options.derived_input {
            Some(path) => {
                let source = JsonLinesSource::open(path)
                    .await
                    .with_context(|| format!("Failed to open derived input {}", path.display()))?;
                let (rx, task) = source
                    .start::<DerivedEvent>(self.options.buffer_size, Some(Arc::clone(metrics)));
                Ok((rx, Some(task)))
            }
            None => {
                // 无 derived 输入：通道立即关闭
                let (_, rx) = mpsc::channel(1);
                Ok((rx, None))
            }
        }
    }
}

enum RaddecSource {
    JsonLines(JoinHandle<ingestion::Result<u64>>),
    Mock(MockRaddecSource),
}

impl RaddecSource {
    fn stop(&self) {
        match self {
            Self::JsonLines(task) => task.abort(),
            Self::Mock(source) => source.stop(),
        }
    }
}

fn spawn_heartbeat(health: Arc<dyn HealthSignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
        loop {
            ticker.tick().await;
            health.signal(Signal::Heartbeat);
        }
    })
}
