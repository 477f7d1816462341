//! Dispatcher - fan-out of raddecs and derived events to targets

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use contracts::{
    Aggregator, ContractError, DerivedEvent, DerivedKind, EncodingOptions, GatewayConfig,
    HealthSignal, NoopHealth, Raddec, Signal, DEFAULT_DERIVED_PATH, DEFAULT_RADDEC_PATH,
};
use observability::{record_datagram_skipped, record_delivery, record_event_received, ErrorSink};
use resolver::ResolutionPublisher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace};

use crate::encoders::{
    derived_document, encode_json, encode_raddec, raddec_document, StoreDocument,
};
use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, TargetMetrics};
use crate::target::{build_targets, Route, Target};
use crate::transport::{Delivery, WebhookRequest};
use crate::watchdog::WatchdogFeed;

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<C> {
    config: GatewayConfig,
    client: C,
    errors: ErrorSink,
    health: Arc<dyn HealthSignal>,
    aggregator: Option<Arc<dyn Aggregator>>,
    watchdog: Option<WatchdogFeed>,
}

impl<C> DispatcherBuilder<C> {
    pub fn new(config: &GatewayConfig, client: C, errors: ErrorSink) -> Self {
        Self {
            config: config.clone(),
            client,
            errors,
            health: Arc::new(NoopHealth),
            aggregator: None,
            watchdog: None,
        }
    }

    pub fn with_health(mut self, health: Arc<dyn HealthSignal>) -> Self {
        self.health = health;
        self
    }

    /// Hand every raddec to `aggregator`; ignored unless a derived list is configured.
    pub fn with_aggregator(mut self, aggregator: Arc<dyn Aggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn with_watchdog(mut self, feed: WatchdogFeed) -> Self {
        self.watchdog = Some(feed);
        self
    }

    /// Build the target lists.
    ///
    /// Returns the dispatcher and the write side of every datagram target's
    /// resolution cell, for the `TargetResolver`.
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(
            raddec_targets = self.config.raddec_targets.len(),
            proximity_targets = self.config.proximity_targets.len(),
            digest_targets = self.config.digest_targets.len(),
        )
    )]
    pub fn build(self) -> Result<(Dispatcher<C>, Vec<ResolutionPublisher>), DispatcherError> {
        let mut publishers = Vec::new();
        let raddec_targets = build_targets(
            "raddec_targets",
            &self.config.raddec_targets,
            DEFAULT_RADDEC_PATH,
            true,
            &mut publishers,
        )?;
        let proximity_targets = build_targets(
            "proximity_targets",
            &self.config.proximity_targets,
            DEFAULT_DERIVED_PATH,
            false,
            &mut publishers,
        )?;
        let digest_targets = build_targets(
            "digest_targets",
            &self.config.digest_targets,
            DEFAULT_DERIVED_PATH,
            false,
            &mut publishers,
        )?;

        let aggregator = if self.config.aggregation_enabled() {
            self.aggregator
        } else {
            if self.aggregator.is_some() {
                debug!("No derived targets configured, aggregator not attached");
            }
            None
        };

        let dispatcher = Dispatcher {
            raddec_targets,
            proximity_targets,
            digest_targets,
            options: self.config.encoding,
            client: self.client,
            errors: self.errors,
            health: self.health,
            aggregator,
            watchdog: self.watchdog,
        };

        Ok((dispatcher, publishers))
    }
}

/// Fans each event out to its target list, in configuration order.
///
/// Dispatch never waits on a delivery: every send runs as its own task and
/// reports failure to the `ErrorSink`.
pub struct Dispatcher<C> {
    raddec_targets: Vec<Target>,
    proximity_targets: Vec<Target>,
    digest_targets: Vec<Target>,
    options: EncodingOptions,
    client: C,
    errors: ErrorSink,
    health: Arc<dyn HealthSignal>,
    aggregator: Option<Arc<dyn Aggregator>>,
    watchdog: Option<WatchdogFeed>,
}

impl<C> Dispatcher<C>
where
    C: Delivery + Clone + Send + Sync + 'static,
{
    /// Get metrics for all targets, labelled `list[index] destination`
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.metric_handles()
            .into_iter()
            .map(|(name, metrics)| (name, metrics.snapshot()))
            .collect()
    }

    /// Shared counters, readable after the dispatcher has been moved into its task
    pub fn metric_handles(&self) -> Vec<(String, Arc<TargetMetrics>)> {
        let lists = [
            ("raddec_targets", &self.raddec_targets),
            ("proximity_targets", &self.proximity_targets),
            ("digest_targets", &self.digest_targets),
        ];
        lists
            .into_iter()
            .flat_map(|(list, targets)| {
                targets.iter().enumerate().map(move |(index, target)| {
                    (
                        format!("{list}[{index}] {}", target.name()),
                        Arc::clone(target.metrics()),
                    )
                })
            })
            .collect()
    }

    pub fn target_count(&self) -> usize {
        self.raddec_targets.len() + self.proximity_targets.len() + self.digest_targets.len()
    }

    /// Issue one send per raddec target, then hand the raddec to the aggregator.
    pub fn dispatch_raddec(&self, raddec: &Raddec) {
        self.health.signal(Signal::ForwardingStarted);
        record_event_received("raddec");
        if let Some(feed) = &self.watchdog {
            feed.feed();
        }

        let mut payloads = RaddecPayloads::new(raddec, self.options);
        for target in &self.raddec_targets {
            match target.route() {
                Route::Datagram(view) => {
                    let Some(address) = view.sendable() else {
                        trace!(host = view.host(), "Datagram target unresolved, skipped");
                        target.metrics().inc_skipped();
                        record_datagram_skipped(view.host());
                        continue;
                    };
                    match payloads.datagram() {
                        Ok(payload) => {
                            let client = self.client.clone();
                            self.spawn_delivery(target, async move {
                                client.send_datagram(payload, address).await
                            });
                        }
                        Err(e) => self.encode_failed(target, e),
                    }
                }
                Route::Webhook { url, use_tls } => match payloads.json() {
                    Ok(body) => self.spawn_post(target, url, *use_tls, body),
                    Err(e) => self.encode_failed(target, e),
                },
                Route::DocumentStore => match payloads.document() {
                    Ok(document) => self.spawn_create(target, document),
                    Err(e) => self.encode_failed(target, e),
                },
            }
        }

        if let Some(aggregator) = &self.aggregator {
            aggregator.handle_raddec(raddec);
        }

        self.health.signal(Signal::ForwardingFinished);
    }

    /// Issue one send per target of the event's kind.
    pub fn dispatch_derived(&self, event: &DerivedEvent) {
        let kind = event.kind();
        record_event_received(kind.as_str());

        let targets = match kind {
            DerivedKind::Proximity => &self.proximity_targets,
            DerivedKind::Digest => &self.digest_targets,
        };

        let mut json = None;
        let mut document = None;
        for target in targets {
            match target.route() {
                Route::Webhook { url, use_tls } => {
                    let body = match json.get_or_insert_with(|| encode_json(event.record())) {
                        Ok(body) => body.clone(),
                        Err(e) => {
                            self.encode_failed(target, clone_encode_error(e));
                            continue;
                        }
                    };
                    self.spawn_post(target, url, *use_tls, body);
                }
                Route::DocumentStore => {
                    let doc = match document.get_or_insert_with(|| derived_document(event)) {
                        Ok(doc) => doc.clone(),
                        Err(e) => {
                            self.encode_failed(target, clone_encode_error(e));
                            continue;
                        }
                    };
                    self.spawn_create(target, doc);
                }
                // 构建时已拒绝
                Route::Datagram(_) => {}
            }
        }
    }

    /// Consume both inbound streams until both are closed.
    #[instrument(name = "dispatcher_run", skip_all)]
    pub async fn run(
        self,
        mut raddecs: mpsc::Receiver<Raddec>,
        mut derived: mpsc::Receiver<DerivedEvent>,
    ) {
        info!(targets = self.target_count(), "Dispatcher started");

        let mut raddec_open = true;
        let mut derived_open = true;
        let mut raddec_count: u64 = 0;
        let mut derived_count: u64 = 0;

        while raddec_open || derived_open {
            tokio::select! {
                event = raddecs.recv(), if raddec_open => match event {
                    Some(raddec) => {
                        raddec_count += 1;
                        self.dispatch_raddec(&raddec);
                        if raddec_count.is_multiple_of(100) {
                            debug!(raddecs = raddec_count, "Dispatcher progress");
                        }
                    }
                    None => raddec_open = false,
                },
                event = derived.recv(), if derived_open => match event {
                    Some(event) => {
                        derived_count += 1;
                        self.dispatch_derived(&event);
                    }
                    None => derived_open = false,
                },
            }
        }

        info!(
            raddecs = raddec_count,
            derived = derived_count,
            errors = self.errors.recorded(),
            "Dispatcher inputs closed, shutting down"
        );
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(
        self,
        raddecs: mpsc::Receiver<Raddec>,
        derived: mpsc::Receiver<DerivedEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(raddecs, derived))
    }

    fn spawn_post(&self, target: &Target, url: &reqwest::Url, use_tls: bool, body: Bytes) {
        let client = self.client.clone();
        let request = WebhookRequest {
            url: url.clone(),
            use_tls,
            body,
        };
        self.spawn_delivery(target, async move { client.post_json(request).await });
    }

    fn spawn_create(&self, target: &Target, document: StoreDocument) {
        let client = self.client.clone();
        self.spawn_delivery(target, async move { client.create_document(document).await });
    }

    fn spawn_delivery<F>(&self, target: &Target, send: F)
    where
        F: Future<Output = Result<(), ContractError>> + Send + 'static,
    {
        let metrics = Arc::clone(target.metrics());
        let errors = self.errors.clone();
        let transport = target.transport();

        metrics.inc_attempted();
        tokio::spawn(async move {
            match send.await {
                Ok(()) => {
                    metrics.inc_delivered();
                    record_delivery(transport, true);
                }
                Err(e) => {
                    metrics.inc_failed();
                    record_delivery(transport, false);
                    errors.record(&e);
                }
            }
        });
    }

    fn encode_failed(&self, target: &Target, error: ContractError) {
        target.metrics().inc_encode_failed();
        self.errors.record(&error);
    }
}

/// Raddec payloads, each encoded at most once per dispatch.
struct RaddecPayloads<'a> {
    raddec: &'a Raddec,
    options: EncodingOptions,
    datagram: Option<Bytes>,
    json: Option<Bytes>,
    document: Option<StoreDocument>,
}

impl<'a> RaddecPayloads<'a> {
    fn new(raddec: &'a Raddec, options: EncodingOptions) -> Self {
        Self {
            raddec,
            options,
            datagram: None,
            json: None,
            document: None,
        }
    }

    fn datagram(&mut self) -> Result<Bytes, ContractError> {
        if let Some(payload) = &self.datagram {
            return Ok(payload.clone());
        }
        let payload = encode_raddec(self.raddec, self.options)?;
        self.datagram = Some(payload.clone());
        Ok(payload)
    }

    fn json(&mut self) -> Result<Bytes, ContractError> {
        if let Some(body) = &self.json {
            return Ok(body.clone());
        }
        let body = encode_json(self.raddec)?;
        self.json = Some(body.clone());
        Ok(body)
    }

    fn document(&mut self) -> Result<StoreDocument, ContractError> {
        if let Some(document) = &self.document {
            return Ok(document.clone());
        }
        let document = raddec_document(self.raddec, self.options)?;
        self.document = Some(document.clone());
        Ok(document)
    }
}

fn clone_encode_error(error: &ContractError) -> ContractError {
    match error {
        ContractError::Encode { transport, message } => {
            ContractError::encode(*transport, message.clone())
        }
        other => ContractError::Other(other.to_string()),
    }
}
