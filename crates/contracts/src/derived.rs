//! Derived events computed from the raddec stream by an external aggregator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Proximity or digest payload.
///
/// Only `instanceId` and `timestamp` are interpreted by the relay; every
/// other field is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRecord {
    pub instance_id: String,

    /// ms since epoch
    pub timestamp: u64,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A derived event, tagged by kind: `{"proximity": {...}}` / `{"digest": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedEvent {
    Proximity(DerivedRecord),
    Digest(DerivedRecord),
}

/// Derived event kind, used to select a target list and a store index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedKind {
    Proximity,
    Digest,
}

impl DerivedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proximity => "proximity",
            Self::Digest => "digest",
        }
    }
}

impl DerivedEvent {
    pub fn kind(&self) -> DerivedKind {
        match self {
            Self::Proximity(_) => DerivedKind::Proximity,
            Self::Digest(_) => DerivedKind::Digest,
        }
    }

    pub fn record(&self) -> &DerivedRecord {
        match self {
            Self::Proximity(record) | Self::Digest(record) => record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_externally_tagged_round_trip() {
        let line = r#"{"digest":{"instanceId":"a1b2","timestamp":1000,"interactions":{"x":3}}}"#;
        let event: DerivedEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.kind(), DerivedKind::Digest);
        assert_eq!(event.record().instance_id, "a1b2");
        assert_eq!(event.record().fields["interactions"]["x"], 3);
    }
}
