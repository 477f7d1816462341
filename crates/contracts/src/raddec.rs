//! Raddec - Ingestion 输出
//!
//! 单次解码观测：发射端标识、接收端 RSSI 签名、可选原始报文。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 标识符类型 (数值编码)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierType(pub u8);

impl IdentifierType {
    pub const UNKNOWN: Self = Self(0);
    pub const EUI64: Self = Self(1);
    pub const EUI48: Self = Self(2);
    pub const RND48: Self = Self(3);
    pub const TID96: Self = Self(4);
    pub const EPC96: Self = Self(5);
    pub const UUID16: Self = Self(6);
    pub const UUID32: Self = Self(7);
    pub const UUID128: Self = Self(8);
    pub const EURID32: Self = Self(9);

    /// Short label used in logs and `info` output.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "EUI-64",
            2 => "EUI-48",
            3 => "RND-48",
            4 => "TID-96",
            5 => "EPC-96",
            6 => "UUID-16",
            7 => "UUID-32",
            8 => "UUID-128",
            9 => "EURID-32",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 单个接收端的观测
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssiSignature {
    /// 接收端标识 (hex)
    pub receiver_id: String,

    /// 接收端标识类型
    pub receiver_id_type: IdentifierType,

    /// 信号强度 (dBm)
    pub rssi: i16,

    /// 该接收端的解码次数
    #[serde(default = "default_decodings")]
    pub number_of_decodings: u32,
}

fn default_decodings() -> u32 {
    1
}

/// Radio decoding: one observation of a transmitting device.
///
/// Produced by the upstream decoding pipeline and treated as immutable
/// by everything downstream of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raddec {
    /// 发射端标识 (hex)
    pub transmitter_id: String,

    /// 发射端标识类型
    pub transmitter_id_type: IdentifierType,

    /// 各接收端观测，通常按 RSSI 降序
    #[serde(default)]
    pub rssi_signature: Vec<RssiSignature>,

    /// 时间戳 (ms since epoch)
    pub timestamp: u64,

    /// 原始报文 (hex)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packets: Vec<String>,
}

impl Raddec {
    /// Signature with the highest RSSI, if any receiver observed the transmitter.
    pub fn strongest_signature(&self) -> Option<&RssiSignature> {
        self.rssi_signature.iter().max_by_key(|s| s.rssi)
    }

    /// Total decodings across all receivers.
    pub fn number_of_decodings(&self) -> u32 {
        self.rssi_signature
            .iter()
            .map(|s| s.number_of_decodings)
            .sum()
    }

    pub fn number_of_receivers(&self) -> usize {
        self.rssi_signature.len()
    }
}
