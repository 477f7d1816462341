//! Datagram 二进制帧
//!
//! 布局 (big-endian):
//!
//! ```text
//! u8   version (0x10)
//! u16  total frame length, checksum included
//! u8   flags (bit0 timestamp, bit1 packets)
//! u8   transmitter id type
//! u8+n transmitter id
//! u8   signature count
//!      per signature: u8 id type, u8+n receiver id, i8 rssi, u8 decodings
//! u64  timestamp               (bit0)
//! u8   packet count            (bit1)
//!      per packet: u8+n packet bytes
//! u8   checksum (wrapping sum of all preceding bytes)
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use contracts::{ContractError, EncodingOptions, IdentifierType, Raddec, RssiSignature};

use super::hex;

pub const RADDEC_FRAME_VERSION: u8 = 0x10;

const FLAG_TIMESTAMP: u8 = 0x01;
const FLAG_PACKETS: u8 = 0x02;
const HEADER_LEN: usize = 5;
const TRANSPORT: &str = "datagram";

/// Decoded frame plus which optional sections it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatagramFrame {
    /// `timestamp` is 0 and `packets` empty when the frame omitted them
    pub raddec: Raddec,
    pub has_timestamp: bool,
    pub has_packets: bool,
}

/// Encode a raddec as a compact binary frame.
pub fn encode_raddec(raddec: &Raddec, options: EncodingOptions) -> Result<Bytes, ContractError> {
    let mut flags = 0u8;
    if options.include_timestamp {
        flags |= FLAG_TIMESTAMP;
    }
    if options.include_packets {
        flags |= FLAG_PACKETS;
    }

    let mut frame = BytesMut::with_capacity(64 + raddec.rssi_signature.len() * 12);
    frame.put_u8(RADDEC_FRAME_VERSION);
    frame.put_u16(0);
    frame.put_u8(flags);
    frame.put_u8(raddec.transmitter_id_type.0);
    put_hex_field(&mut frame, &raddec.transmitter_id, "transmitterId")?;

    frame.put_u8(count_u8(raddec.rssi_signature.len(), "rssiSignature")?);
    for signature in &raddec.rssi_signature {
        frame.put_u8(signature.receiver_id_type.0);
        put_hex_field(&mut frame, &signature.receiver_id, "receiverId")?;
        frame.put_i8(signature.rssi.clamp(i8::MIN as i16, i8::MAX as i16) as i8);
        frame.put_u8(signature.number_of_decodings.min(u8::MAX as u32) as u8);
    }

    if options.include_timestamp {
        frame.put_u64(raddec.timestamp);
    }

    if options.include_packets {
        frame.put_u8(count_u8(raddec.packets.len(), "packets")?);
        for packet in &raddec.packets {
            put_hex_field(&mut frame, packet, "packet")?;
        }
    }

    let total = frame.len() + 1;
    let total = u16::try_from(total).map_err(|_| {
        ContractError::encode(TRANSPORT, format!("frame of {total} bytes exceeds u16 length"))
    })?;
    frame[1..3].copy_from_slice(&total.to_be_bytes());

    let checksum = checksum(&frame);
    frame.put_u8(checksum);

    Ok(frame.freeze())
}

/// Decode a frame produced by [`encode_raddec`].
pub fn decode_raddec(frame: &[u8]) -> Result<DatagramFrame, ContractError> {
    if frame.len() < HEADER_LEN + 1 {
        return Err(malformed(format!("frame too short ({} bytes)", frame.len())));
    }

    let (body, trailer) = frame.split_at(frame.len() - 1);
    if checksum(body) != trailer[0] {
        return Err(malformed("checksum mismatch"));
    }

    let mut buf = body;
    let version = take_u8(&mut buf)?;
    if version != RADDEC_FRAME_VERSION {
        return Err(malformed(format!("unsupported version 0x{version:02x}")));
    }

    let length = buf.try_get_u16().map_err(|e| malformed(e.to_string()))? as usize;
    if length != frame.len() {
        return Err(malformed(format!(
            "length field {length} does not match frame size {}",
            frame.len()
        )));
    }

    let flags = take_u8(&mut buf)?;
    let transmitter_id_type = IdentifierType(take_u8(&mut buf)?);
    let transmitter_id = take_hex_field(&mut buf)?;

    let count = take_u8(&mut buf)?;
    let mut rssi_signature = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let receiver_id_type = IdentifierType(take_u8(&mut buf)?);
        let receiver_id = take_hex_field(&mut buf)?;
        let rssi = buf.try_get_i8().map_err(|e| malformed(e.to_string()))? as i16;
        let number_of_decodings = take_u8(&mut buf)? as u32;
        rssi_signature.push(RssiSignature {
            receiver_id,
            receiver_id_type,
            rssi,
            number_of_decodings,
        });
    }

    let has_timestamp = flags & FLAG_TIMESTAMP != 0;
    let timestamp = if has_timestamp {
        buf.try_get_u64().map_err(|e| malformed(e.to_string()))?
    } else {
        0
    };

    let has_packets = flags & FLAG_PACKETS != 0;
    let mut packets = Vec::new();
    if has_packets {
        let count = take_u8(&mut buf)?;
        for _ in 0..count {
            packets.push(take_hex_field(&mut buf)?);
        }
    }

    if buf.has_remaining() {
        return Err(malformed(format!("{} trailing bytes", buf.remaining())));
    }

    Ok(DatagramFrame {
        raddec: Raddec {
            transmitter_id,
            transmitter_id_type,
            rssi_signature,
            timestamp,
            packets,
        },
        has_timestamp,
        has_packets,
    })
}

fn put_hex_field(frame: &mut BytesMut, value: &str, field: &str) -> Result<(), ContractError> {
    let bytes = hex::decode(value).map_err(|e| ContractError::encode(TRANSPORT, format!("{field}: {e}")))?;
    frame.put_u8(count_u8(bytes.len(), field)?);
    frame.put_slice(&bytes);
    Ok(())
}

fn take_hex_field(buf: &mut &[u8]) -> Result<String, ContractError> {
    let len = take_u8(buf)? as usize;
    if buf.remaining() < len {
        return Err(malformed(format!(
            "field of {len} bytes but only {} remain",
            buf.remaining()
        )));
    }
    let data: &[u8] = *buf;
    let (field, rest) = data.split_at(len);
    let encoded = hex::encode(field);
    *buf = rest;
    Ok(encoded)
}

fn take_u8(buf: &mut &[u8]) -> Result<u8, ContractError> {
    buf.try_get_u8().map_err(|e| malformed(e.to_string()))
}

fn count_u8(len: usize, field: &str) -> Result<u8, ContractError> {
    u8::try_from(len)
        .map_err(|_| ContractError::encode(TRANSPORT, format!("{field} too long ({len} > 255)")))
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

fn malformed(message: impl Into<String>) -> ContractError {
    ContractError::encode(TRANSPORT, message)
}
