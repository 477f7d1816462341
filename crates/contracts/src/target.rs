//! Target 配置
//!
//! 每个下游目标的传输类型与连接参数。

use serde::{Deserialize, Serialize};

/// Default callback path for raddec webhooks.
pub const DEFAULT_RADDEC_PATH: &str = "/raddecs";

/// Default callback path for derived-event webhooks.
pub const DEFAULT_DERIVED_PATH: &str = "/";

/// One configured delivery destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum TargetConfig {
    /// UDP datagram to a (re-resolved) host name
    #[serde(alias = "udp")]
    Datagram { host: String, port: u16 },

    /// HTTP(S) JSON POST
    Webhook {
        host: String,
        port: u16,
        /// Callback path; kind-specific default when unset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default)]
        use_tls: bool,
    },

    /// Create-only write to the shared document store
    #[serde(alias = "elasticsearch")]
    DocumentStore,
}

impl TargetConfig {
    /// Transport label used for logs and metrics.
    pub fn transport(&self) -> &'static str {
        match self {
            Self::Datagram { .. } => "datagram",
            Self::Webhook { .. } => "webhook",
            Self::DocumentStore => "document_store",
        }
    }

    /// Human-readable destination.
    pub fn describe(&self) -> String {
        match self {
            Self::Datagram { host, port } => format!("udp://{host}:{port}"),
            Self::Webhook {
                host,
                port,
                path,
                use_tls,
            } => {
                let scheme = if *use_tls { "https" } else { "http" };
                let path = path.as_deref().unwrap_or("<default>");
                format!("{scheme}://{host}:{port}{path}")
            }
            Self::DocumentStore => "document-store".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        targets: Vec<TargetConfig>,
    }

    #[test]
    fn test_legacy_aliases() {
        let parsed: Wrapper = serde_json::from_str(
            r#"{"targets":[
                {"transport":"udp","host":"192.168.1.255","port":50001},
                {"transport":"elasticsearch"},
                {"transport":"webhook","host":"example.org","port":443,"use_tls":true}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            parsed.targets[0],
            TargetConfig::Datagram {
                host: "192.168.1.255".into(),
                port: 50001
            }
        );
        assert_eq!(parsed.targets[1], TargetConfig::DocumentStore);
        assert_eq!(
            parsed.targets[2].describe(),
            "https://example.org:443<default>"
        );
    }
}
