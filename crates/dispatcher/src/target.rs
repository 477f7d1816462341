//! Runtime targets built from `TargetConfig`

use std::sync::Arc;

use contracts::TargetConfig;
use reqwest::Url;
use resolver::{resolution_cell, ResolutionPublisher, ResolutionView};

use crate::encoders::callback_path;
use crate::error::DispatcherError;
use crate::metrics::TargetMetrics;
use crate::transport::webhook_url;

/// Where a target's payload goes.
#[derive(Debug, Clone)]
pub enum Route {
    /// Sent only while the view holds a valid address
    Datagram(ResolutionView),
    Webhook { url: Url, use_tls: bool },
    DocumentStore,
}

/// One entry of a target list, in configuration order.
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    route: Route,
    metrics: Arc<TargetMetrics>,
}

impl Target {
    /// Build a target; datagram targets also yield the resolver's write side.
    pub fn from_config(
        config: &TargetConfig,
        default_path: &str,
    ) -> Result<(Self, Option<ResolutionPublisher>), String> {
        let (route, publisher) = match config {
            TargetConfig::Datagram { host, port } => {
                let (publisher, view) = resolution_cell(host.clone(), *port);
                (Route::Datagram(view), Some(publisher))
            }
            TargetConfig::Webhook {
                host,
                port,
                path,
                use_tls,
            } => {
                let path = callback_path(path.as_deref(), default_path);
                let url = webhook_url(host, *port, path, *use_tls)?;
                (
                    Route::Webhook {
                        url,
                        use_tls: *use_tls,
                    },
                    None,
                )
            }
            TargetConfig::DocumentStore => (Route::DocumentStore, None),
        };

        let name = match &route {
            Route::Webhook { url, .. } => url.to_string(),
            _ => config.describe(),
        };

        Ok((
            Self {
                name,
                route,
                metrics: Arc::new(TargetMetrics::new()),
            },
            publisher,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn transport(&self) -> &'static str {
        match self.route {
            Route::Datagram(_) => "datagram",
            Route::Webhook { .. } => "webhook",
            Route::DocumentStore => "document_store",
        }
    }

    pub fn metrics(&self) -> &Arc<TargetMetrics> {
        &self.metrics
    }
}

/// Build a whole list; the list name is used in errors.
pub(crate) fn build_targets(
    list: &'static str,
    configs: &[TargetConfig],
    default_path: &str,
    allow_datagram: bool,
    publishers: &mut Vec<ResolutionPublisher>,
) -> Result<Vec<Target>, DispatcherError> {
    configs
        .iter()
        .enumerate()
        .map(|(index, config)| {
            if !allow_datagram && matches!(config, TargetConfig::Datagram { .. }) {
                return Err(DispatcherError::invalid_target(
                    list,
                    index,
                    "datagram transport only carries raddecs",
                ));
            }
            let (target, publisher) = Target::from_config(config, default_path)
                .map_err(|message| DispatcherError::invalid_target(list, index, message))?;
            publishers.extend(publisher);
            Ok(target)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DEFAULT_DERIVED_PATH, DEFAULT_RADDEC_PATH};

    #[test]
    fn test_webhook_default_paths() {
        let config = TargetConfig::Webhook {
            host: "hooks.local".into(),
            port: 8080,
            path: None,
            use_tls: false,
        };
        let (raddec, _) = Target::from_config(&config, DEFAULT_RADDEC_PATH).unwrap();
        assert_eq!(raddec.name(), "http://hooks.local:8080/raddecs");

        let (derived, _) = Target::from_config(&config, DEFAULT_DERIVED_PATH).unwrap();
        assert_eq!(derived.name(), "http://hooks.local:8080/");
    }

    #[test]
    fn test_datagram_yields_unresolved_cell() {
        let config = TargetConfig::Datagram {
            host: "collector.local".into(),
            port: 50001,
        };
        let (target, publisher) = Target::from_config(&config, DEFAULT_RADDEC_PATH).unwrap();
        let publisher = publisher.unwrap();
        assert_eq!(publisher.host(), "collector.local");
        match target.route() {
            Route::Datagram(view) => assert!(view.sendable().is_none()),
            other => panic!("unexpected route {other:?}"),
        }
    }

    #[test]
    fn test_datagram_rejected_in_derived_list() {
        let configs = vec![TargetConfig::Datagram {
            host: "collector.local".into(),
            port: 50001,
        }];
        let mut publishers = Vec::new();
        let err = build_targets(
            "proximity_targets",
            &configs,
            DEFAULT_DERIVED_PATH,
            false,
            &mut publishers,
        )
        .unwrap_err();
        assert!(matches!(err, DispatcherError::InvalidTarget { index: 0, .. }));
        assert!(publishers.is_empty());
    }
}
