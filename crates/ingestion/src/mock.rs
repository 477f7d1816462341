//! Mock raddec 源
//!
//! 用于无射频硬件环境的试运行与测试。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{IdentifierType, Raddec, RssiSignature};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::IngestionMetrics;

/// Mock raddec 源配置
#[derive(Debug, Clone)]
pub struct MockRaddecConfig {
    /// 发送频率 (Hz)
    pub frequency_hz: f64,

    /// 轮换的发射端数量
    pub transmitters: u32,

    /// 每条 raddec 的接收端数量
    pub receivers: u32,

    /// 是否附带原始报文
    pub with_packets: bool,
}

impl Default for MockRaddecConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 10.0,
            transmitters: 4,
            receivers: 2,
            with_packets: true,
        }
    }
}

/// Mock raddec 源
///
/// 按固定频率生成合成 raddec。
pub struct MockRaddecSource {
    config: MockRaddecConfig,
    running: Arc<AtomicBool>,
}

impl MockRaddecSource {
    /// 创建新的 Mock 源
    pub fn new(config: MockRaddecConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 以指定频率创建
    pub fn with_rate(frequency_hz: f64) -> Self {
        Self::new(MockRaddecConfig {
            frequency_hz,
            ..Default::default()
        })
    }

    /// 启动 Mock 源，返回 raddec 接收端
    pub fn start(
        &self,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> mpsc::Receiver<Raddec> {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let config = self.config.clone();
        let running = self.running.clone();
        let metrics = metrics.unwrap_or_default();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let interval = Duration::from_secs_f64(1.0 / config.frequency_hz.max(0.001));
            let mut sequence: u64 = 0;

            debug!(
                frequency_hz = config.frequency_hz,
                transmitters = config.transmitters,
                "mock raddec source started"
            );

            while running.load(Ordering::Relaxed) {
                let raddec = synthesize(&config, sequence);
                sequence += 1;
                metrics.record_received();

                if tx.send(raddec).await.is_err() {
                    debug!("mock raddec channel closed");
                    break;
                }
                trace!(sequence, "mock raddec sent");

                tokio::time::sleep(interval).await;
            }

            debug!("mock raddec source stopped");
        });

        rx
    }

    /// 停止 Mock 源
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 检查是否正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

fn synthesize(config: &MockRaddecConfig, sequence: u64) -> Raddec {
    let transmitter = sequence % u64::from(config.transmitters.max(1));
    let rssi_signature = (0..config.receivers)
        .map(|r| RssiSignature {
            receiver_id: format!("001bc509408{r:05x}"),
            receiver_id_type: IdentifierType::EUI64,
            rssi: -60 - ((sequence + u64::from(r) * 7) % 30) as i16,
            number_of_decodings: 1 + (sequence % 3) as u32,
        })
        .collect();

    let packets = if config.with_packets {
        vec![format!("061b{transmitter:012x}0201060303aafe")]
    } else {
        Vec::new()
    };

    Raddec {
        transmitter_id: format!("{transmitter:012x}"),
        transmitter_id_type: IdentifierType::RND48,
        rssi_signature,
        timestamp: chrono::Utc::now().timestamp_millis().max(0) as u64,
        packets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_raddec_source() {
        let source = MockRaddecSource::new(MockRaddecConfig {
            frequency_hz: 200.0,
            transmitters: 2,
            receivers: 3,
            with_packets: true,
        });
        let mut rx = source.start(10, None);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        let third = rx.recv().await.unwrap();

        assert_eq!(first.rssi_signature.len(), 3);
        assert_eq!(first.packets.len(), 1);
        assert_ne!(first.transmitter_id, second.transmitter_id);
        assert_eq!(first.transmitter_id, third.transmitter_id);
        assert_eq!(first.transmitter_id.len(), 12);
        assert!(source.is_running());

        source.stop();
        assert!(!source.is_running());
    }
}
