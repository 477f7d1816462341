//! Document-store 文档
//!
//! Raddec 展平为单个文档 (strongest receiver 提升到顶层)；
//! derived 记录原样复制，timestamp 统一为 ISO-8601。

use chrono::{DateTime, SecondsFormat};
use contracts::{ContractError, DerivedEvent, DerivedKind, DerivedRecord, EncodingOptions, Raddec};
use serde_json::{json, Map, Value};

use super::hex;

pub const RADDEC_INDEX: &str = "raddec";
pub const PROXIMITY_INDEX: &str = "diract-proximity";
pub const DIGEST_INDEX: &str = "diract-digest";

const TRANSPORT: &str = "document_store";

/// Create-only document: index, caller-chosen id, JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDocument {
    pub index: &'static str,
    pub id: String,
    pub body: Value,
}

/// `{timestamp}-{transmitterId}-{transmitterIdType}`
pub fn raddec_document_id(raddec: &Raddec) -> String {
    format!(
        "{}-{}-{}",
        raddec.timestamp, raddec.transmitter_id, raddec.transmitter_id_type
    )
}

/// `{timestamp}-{instanceId}`
pub fn derived_document_id(record: &DerivedRecord) -> String {
    format!("{}-{}", record.timestamp, record.instance_id)
}

/// Milliseconds since epoch as RFC 3339 UTC with millisecond precision.
pub fn iso_timestamp(timestamp_ms: u64) -> Result<String, ContractError> {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| {
            ContractError::encode(TRANSPORT, format!("timestamp {timestamp_ms} out of range"))
        })
}

pub fn raddec_document(
    raddec: &Raddec,
    options: EncodingOptions,
) -> Result<StoreDocument, ContractError> {
    let mut body = Map::new();
    body.insert("transmitterId".into(), json!(raddec.transmitter_id));
    body.insert("transmitterIdType".into(), json!(raddec.transmitter_id_type));
    body.insert("timestamp".into(), json!(iso_timestamp(raddec.timestamp)?));
    body.insert("numberOfDecodings".into(), json!(raddec.number_of_decodings()));
    body.insert("numberOfReceivers".into(), json!(raddec.number_of_receivers()));

    if let Some(strongest) = raddec.strongest_signature() {
        body.insert("receiverId".into(), json!(strongest.receiver_id));
        body.insert("receiverIdType".into(), json!(strongest.receiver_id_type));
        body.insert("rssi".into(), json!(strongest.rssi));
    }

    let signature = serde_json::to_value(&raddec.rssi_signature)
        .map_err(|e| ContractError::encode(TRANSPORT, e.to_string()))?;
    body.insert("rssiSignature".into(), signature);

    if options.include_packets && !raddec.packets.is_empty() {
        // 规范化为小写 hex；非法 hex 不入库
        let packets = raddec
            .packets
            .iter()
            .map(|p| hex::decode(p).map(|b| hex::encode(&b)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ContractError::encode(TRANSPORT, e))?;
        body.insert("packets".into(), json!(packets));
    }

    Ok(StoreDocument {
        index: RADDEC_INDEX,
        id: raddec_document_id(raddec),
        body: Value::Object(body),
    })
}

pub fn derived_document(event: &DerivedEvent) -> Result<StoreDocument, ContractError> {
    let record = event.record();
    let index = match event.kind() {
        DerivedKind::Proximity => PROXIMITY_INDEX,
        DerivedKind::Digest => DIGEST_INDEX,
    };

    let mut body = record.fields.clone();
    body.insert("instanceId".into(), json!(record.instance_id));
    // 复制之后再写，保证为 ISO 字符串
    body.insert("timestamp".into(), json!(iso_timestamp(record.timestamp)?));

    Ok(StoreDocument {
        index,
        id: derived_document_id(record),
        body: Value::Object(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{IdentifierType, RssiSignature};

    fn raddec() -> Raddec {
        Raddec {
            transmitter_id: "fee150bada55".into(),
            transmitter_id_type: IdentifierType::RND48,
            rssi_signature: vec![
                RssiSignature {
                    receiver_id: "001bc50940810000".into(),
                    receiver_id_type: IdentifierType::EUI64,
                    rssi: -80,
                    number_of_decodings: 1,
                },
                RssiSignature {
                    receiver_id: "001bc50940810001".into(),
                    receiver_id_type: IdentifierType::EUI64,
                    rssi: -60,
                    number_of_decodings: 3,
                },
            ],
            timestamp: 1_700_000_000_000,
            packets: vec!["0201060303AAFE".into()],
        }
    }

    #[test]
    fn test_raddec_document_shape() {
        let doc = raddec_document(&raddec(), EncodingOptions::default()).unwrap();
        assert_eq!(doc.index, "raddec");
        assert_eq!(doc.id, "1700000000000-fee150bada55-3");
        assert_eq!(doc.body["timestamp"], "2023-11-14T22:13:20.000Z");
        assert_eq!(doc.body["receiverId"], "001bc50940810001");
        assert_eq!(doc.body["rssi"], -60);
        assert_eq!(doc.body["numberOfDecodings"], 4);
        assert_eq!(doc.body["numberOfReceivers"], 2);
        assert_eq!(doc.body["packets"][0], "0201060303aafe");
    }

    #[test]
    fn test_raddec_id_changes_with_each_key_field() {
        let base = raddec_document_id(&raddec());

        let mut other = raddec();
        other.timestamp += 1;
        assert_ne!(raddec_document_id(&other), base);

        let mut other = raddec();
        other.transmitter_id = "fee150bada56".into();
        assert_ne!(raddec_document_id(&other), base);

        let mut other = raddec();
        other.transmitter_id_type = IdentifierType::EUI48;
        assert_ne!(raddec_document_id(&other), base);

        // Packets and signatures are not part of the id
        let mut other = raddec();
        other.packets = vec!["ff".into()];
        other.rssi_signature.pop();
        assert_eq!(raddec_document_id(&other), base);
    }

    #[test]
    fn test_packets_follow_options() {
        let options = EncodingOptions {
            include_timestamp: false,
            include_packets: false,
        };
        let doc = raddec_document(&raddec(), options).unwrap();
        assert!(doc.body.get("packets").is_none());
    }

    #[test]
    fn test_derived_document_normalizes_timestamp() {
        let mut fields = Map::new();
        fields.insert("timestamp".into(), json!(1));
        fields.insert("nearest".into(), json!([{"deviceId": "aa"}]));
        let event = DerivedEvent::Digest(DerivedRecord {
            instance_id: "relay-7".into(),
            timestamp: 1_700_000_000_000,
            fields,
        });

        let doc = derived_document(&event).unwrap();
        assert_eq!(doc.index, "diract-digest");
        assert_eq!(doc.id, "1700000000000-relay-7");
        assert_eq!(doc.body["timestamp"], "2023-11-14T22:13:20.000Z");
        assert_eq!(doc.body["instanceId"], "relay-7");
        assert_eq!(doc.body["nearest"][0]["deviceId"], "aa");
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(iso_timestamp(u64::MAX).is_err());
    }
}
