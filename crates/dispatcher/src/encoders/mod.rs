//! Encoders - wire representation per (event kind, transport)
//!
//! Pure functions: no I/O, no shared state.

mod datagram;
mod document;
mod hex;
mod webhook;

pub use self::datagram::{decode_raddec, encode_raddec, DatagramFrame, RADDEC_FRAME_VERSION};
pub use self::document::{
    derived_document, derived_document_id, iso_timestamp, raddec_document, raddec_document_id,
    StoreDocument, DIGEST_INDEX, PROXIMITY_INDEX, RADDEC_INDEX,
};
pub use self::webhook::{callback_path, encode_json};
