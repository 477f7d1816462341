//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> Dispatcher 构建
//! - Resolver + Dispatcher 协同 (解析失败 / 恢复)
//! - 真实 UDP 回环与 document-store 重复 id

#[cfg(test)]
mod support {
    use std::collections::VecDeque;
    use std::io;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use contracts::{ContractError, IdentifierType, Raddec, RssiSignature};
    use dispatcher::encoders::StoreDocument;
    use dispatcher::{Delivery, WebhookRequest};
    use resolver::HostLookup;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Datagram(SocketAddr, Bytes),
        Post(String),
        Create(&'static str, String),
    }

    /// Records calls in issue order. Creates follow create-only semantics.
    #[derive(Clone, Default)]
    pub struct RecordingDelivery {
        calls: Arc<Mutex<Vec<Call>>>,
        stored: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingDelivery {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn datagrams(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Datagram(..)))
                .count()
        }
    }

    impl Delivery for RecordingDelivery {
        async fn send_datagram(
            &self,
            payload: Bytes,
            address: SocketAddr,
        ) -> Result<(), ContractError> {
            self.calls.lock().unwrap().push(Call::Datagram(address, payload));
            Ok(())
        }

        async fn post_json(&self, request: WebhookRequest) -> Result<(), ContractError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Post(request.url.to_string()));
            Ok(())
        }

        async fn create_document(&self, document: StoreDocument) -> Result<(), ContractError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(document.index, document.id.clone()));
            let key = (document.index.to_string(), document.id.clone());
            let mut stored = self.stored.lock().unwrap();
            if stored.contains(&key) {
                return Err(ContractError::DuplicateDocument {
                    index: key.0,
                    id: key.1,
                });
            }
            stored.push(key);
            Ok(())
        }
    }

    /// Lookup that answers from a script, then repeats the last answer.
    #[derive(Clone)]
    pub struct ScriptedLookup {
        script: Arc<Mutex<VecDeque<Option<SocketAddr>>>>,
    }

    impl ScriptedLookup {
        pub fn new(script: impl IntoIterator<Item = Option<SocketAddr>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into_iter().collect())),
            }
        }
    }

    impl HostLookup for ScriptedLookup {
        async fn lookup(&self, host: &str, _port: u16) -> io::Result<SocketAddr> {
            let mut script = self.script.lock().unwrap();
            let answer = if script.len() > 1 {
                script.pop_front().flatten()
            } else {
                script.front().copied().flatten()
            };
            answer.ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{host}: not found"))
            })
        }
    }

    pub fn raddec(timestamp: u64) -> Raddec {
        Raddec {
            transmitter_id: "fee150bada55".into(),
            transmitter_id_type: IdentifierType::RND48,
            rssi_signature: vec![RssiSignature {
                receiver_id: "001bc50940810000".into(),
                receiver_id_type: IdentifierType::EUI64,
                rssi: -70,
                number_of_decodings: 2,
            }],
            timestamp,
            packets: vec!["0201060303aafe".into()],
        }
    }

    pub async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::DispatcherBuilder;
    use observability::ErrorSink;

    use crate::support::RecordingDelivery;

    const GATEWAY_TOML: &str = r#"
version = "V1"

[gateway]
udp_broadcast = false

[document_store]
node = "http://127.0.0.1:9200"

[[raddec_targets]]
transport = "udp"
host = "collector.local"
port = 50001

[[raddec_targets]]
transport = "webhook"
host = "hooks.local"
port = 8080

[[raddec_targets]]
transport = "elasticsearch"

[[digest_targets]]
transport = "webhook"
host = "hooks.local"
port = 8080
path = "/digests"
"#;

    #[test]
    fn test_config_builds_dispatcher() {
        let config = ConfigLoader::load_from_str(GATEWAY_TOML, ConfigFormat::Toml).unwrap();
        assert!(config.aggregation_enabled());

        let (dispatcher, publishers) =
            DispatcherBuilder::new(&config, RecordingDelivery::default(), ErrorSink::silent())
                .build()
                .unwrap();
        assert_eq!(publishers.len(), 1);
        assert_eq!(publishers[0].host(), "collector.local");

        let names: Vec<String> = dispatcher.metrics().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "raddec_targets[0] udp://collector.local:50001",
                "raddec_targets[1] http://hooks.local:8080/raddecs",
                "raddec_targets[2] document-store",
                "digest_targets[0] http://hooks.local:8080/digests",
            ]
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Cursor;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        DerivedEvent, DocumentStoreConfig, EncodingOptions, GatewayConfig, GatewaySettings,
        TargetConfig,
    };
    use dispatcher::encoders::decode_raddec;
    use dispatcher::{DispatcherBuilder, Transports};
    use ingestion::{IngestionMetrics, JsonLinesSource, MockRaddecSource};
    use observability::ErrorSink;
    use resolver::{ResolverIntervals, TargetResolver};
    use tokio::net::UdpSocket;
    use tokio::sync::mpsc;

    use crate::support::{raddec, settle, Call, RecordingDelivery, ScriptedLookup};

    const INTERVALS: ResolverIntervals = ResolverIntervals {
        invalid: Duration::from_secs(2),
        standard: Duration::from_secs(60),
    };

    fn datagram_config(host: &str, port: u16) -> GatewayConfig {
        GatewayConfig {
            raddec_targets: vec![TargetConfig::Datagram {
                host: host.into(),
                port,
            }],
            ..GatewayConfig::default()
        }
    }

    /// 解析失败期间不发送；恢复后恰好发送一次
    #[tokio::test]
    async fn test_unresolvable_host_then_recovery() {
        let address: SocketAddr = "10.1.2.3:50001".parse().unwrap();
        let client = RecordingDelivery::default();
        let errors = ErrorSink::silent();

        let (dispatcher, publishers) = DispatcherBuilder::new(
            &datagram_config("flaky.local", 50001),
            client.clone(),
            errors.clone(),
        )
        .build()
        .unwrap();
        let resolver = TargetResolver::new(
            publishers,
            ScriptedLookup::new([None, Some(address)]),
            INTERVALS,
            errors.clone(),
        );

        // Tick 1: lookup fails, interval stays short
        assert_eq!(resolver.tick().await, INTERVALS.invalid);
        dispatcher.dispatch_raddec(&raddec(1));
        settle().await;
        assert_eq!(client.datagrams(), 0);
        assert_eq!(errors.recorded(), 1);

        // Tick 2: lookup succeeds; the delay was chosen before it ran
        assert_eq!(resolver.tick().await, INTERVALS.invalid);
        dispatcher.dispatch_raddec(&raddec(2));
        settle().await;

        assert_eq!(client.datagrams(), 1);
        assert!(matches!(client.calls()[0], Call::Datagram(a, _) if a == address));
        assert_eq!(resolver.next_delay(), INTERVALS.standard);

        let metrics = dispatcher.metrics();
        assert_eq!(metrics[0].1.skipped, 1);
        assert_eq!(metrics[0].1.attempted, 1);
    }

    /// 仅 packets 不同的两条 raddec 得到相同 id：第二次 create 失败并记录，后续 target 仍被尝试
    #[tokio::test]
    async fn test_duplicate_document_ids() {
        let config = GatewayConfig {
            raddec_targets: vec![
                TargetConfig::DocumentStore,
                TargetConfig::Webhook {
                    host: "hooks.local".into(),
                    port: 8080,
                    path: None,
                    use_tls: false,
                },
            ],
            document_store: Some(DocumentStoreConfig {
                node: "http://127.0.0.1:9200".into(),
            }),
            ..GatewayConfig::default()
        };
        let client = RecordingDelivery::default();
        let errors = ErrorSink::silent();
        let (dispatcher, _) = DispatcherBuilder::new(&config, client.clone(), errors.clone())
            .build()
            .unwrap();

        // Same timestamp and transmitter, different raw packets
        let first = raddec(42);
        let mut second = raddec(42);
        second.packets = vec!["02010612ff0590".into()];
        assert_ne!(first, second);

        dispatcher.dispatch_raddec(&first);
        dispatcher.dispatch_raddec(&second);
        settle().await;

        let creates: Vec<Call> = client
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create(..)))
            .collect();
        assert_eq!(creates.len(), 2);
        assert_eq!(creates[0], creates[1]);

        assert_eq!(errors.recorded(), 1);
        let posts = client
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Post(_)))
            .count();
        assert_eq!(posts, 2);

        let metrics = dispatcher.metrics();
        assert_eq!(metrics[0].1.failed, 1);
        assert_eq!(metrics[0].1.delivered, 1);
    }

    /// 真实 UDP socket：接收端可解码出原始 raddec
    #[tokio::test]
    async fn test_udp_round_trip() {
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = GatewayConfig {
            gateway: GatewaySettings {
                udp_broadcast: false,
                debug: true,
            },
            encoding: EncodingOptions {
                include_timestamp: true,
                include_packets: true,
            },
            ..datagram_config("127.0.0.1", port)
        };
        let transports = Transports::connect(&config).await.unwrap();
        let errors = ErrorSink::silent();
        let (dispatcher, publishers) = DispatcherBuilder::new(&config, transports, errors.clone())
            .build()
            .unwrap();

        let resolver = TargetResolver::new(
            publishers,
            resolver::SystemLookup,
            INTERVALS,
            errors.clone(),
        );
        resolver.tick().await;

        dispatcher.dispatch_raddec(&raddec(1_700_000_000_000));

        let mut buf = [0u8; 512];
        let (n, _) = tokio::time::timeout(Duration::from_secs(5), listener.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let frame = decode_raddec(&buf[..n]).unwrap();
        assert!(frame.has_timestamp);
        assert_eq!(frame.raddec, raddec(1_700_000_000_000));
        assert_eq!(errors.recorded(), 0);
    }

    /// JSON-lines 输入 -> Dispatcher -> 各自的 target 列表
    #[tokio::test]
    async fn test_json_lines_sources_through_dispatcher() {
        let config = GatewayConfig {
            raddec_targets: vec![TargetConfig::Webhook {
                host: "raddecs.local".into(),
                port: 80,
                path: None,
                use_tls: false,
            }],
            proximity_targets: vec![TargetConfig::Webhook {
                host: "prox.local".into(),
                port: 80,
                path: None,
                use_tls: false,
            }],
            ..GatewayConfig::default()
        };
        let client = RecordingDelivery::default();
        let (dispatcher, _) = DispatcherBuilder::new(&config, client.clone(), ErrorSink::silent())
            .build()
            .unwrap();

        let raddec_lines = format!(
            "{}\nnot json\n{}\n",
            serde_json::to_string(&raddec(1)).unwrap(),
            serde_json::to_string(&raddec(2)).unwrap()
        );
        let derived_lines =
            "{\"proximity\":{\"instanceId\":\"relay-1\",\"timestamp\":5,\"nearest\":[]}}\n";

        let metrics = Arc::new(IngestionMetrics::new());
        let (raddec_rx, raddec_task) =
            JsonLinesSource::new("raddecs", Cursor::new(raddec_lines.into_bytes()))
                .start::<contracts::Raddec>(4, Some(metrics.clone()));
        let (derived_rx, derived_task) = JsonLinesSource::new("derived", Cursor::new(derived_lines))
            .start::<DerivedEvent>(4, None);

        dispatcher.run(raddec_rx, derived_rx).await;
        settle().await;

        assert_eq!(raddec_task.await.unwrap().unwrap(), 2);
        assert_eq!(derived_task.await.unwrap().unwrap(), 1);
        assert_eq!(metrics.snapshot().parse_errors, 1);

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        let prox = calls
            .iter()
            .filter(|c| **c == Call::Post("http://prox.local/".into()))
            .count();
        assert_eq!(prox, 1);
    }

    /// Mock 源 -> Dispatcher，直到收到足够事件后关闭
    #[tokio::test]
    async fn test_mock_source_pipeline() {
        let config = GatewayConfig {
            raddec_targets: vec![TargetConfig::Webhook {
                host: "hooks.local".into(),
                port: 8080,
                path: None,
                use_tls: false,
            }],
            ..GatewayConfig::default()
        };
        let client = RecordingDelivery::default();
        let (dispatcher, _) = DispatcherBuilder::new(&config, client.clone(), ErrorSink::silent())
            .build()
            .unwrap();

        let source = MockRaddecSource::with_rate(200.0);
        let mut mock_rx = source.start(16, None);

        let (tx, rx) = mpsc::channel(16);
        let (derived_tx, derived_rx) = mpsc::channel::<DerivedEvent>(1);
        drop(derived_tx);
        let handle = dispatcher.spawn(rx, derived_rx);

        for _ in 0..5 {
            let raddec = mock_rx.recv().await.unwrap();
            tx.send(raddec).await.unwrap();
        }
        source.stop();
        drop(tx);

        handle.await.unwrap();
        settle().await;
        assert_eq!(client.calls().len(), 5);
    }
}
