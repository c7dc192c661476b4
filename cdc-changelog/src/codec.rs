use bincode::{DefaultOptions, Options};

use cdc_common::err::{CResult, ReError};
use cdc_common::record::ChangeRecord;

/// Framing/endianness variants for [`RecordCodec`], mirroring the choices
/// a `bincode::Options` builder exposes.
#[derive(Debug, Clone, Copy)]
pub enum CodecStyle {
    LittleVar,
    BigVar,
}

/// Self-describing encode/decode of a [`ChangeRecord`]. Because
/// `Value` already carries its variant tag, the encoded bytes are
/// self-describing on their own — no side-channel model/schema is needed to
/// reconstruct a record, only to interpret which fields are expected to be
/// present for a given table.
#[derive(Clone)]
pub struct RecordCodec {
    options: DefaultOptions,
}

impl RecordCodec {
    pub fn new() -> Self {
        RecordCodec {
            options: bincode::options(),
        }
    }

    pub fn encode(&self, style: &CodecStyle, record: &ChangeRecord) -> CResult<Vec<u8>> {
        let result = match style {
            CodecStyle::LittleVar => self
                .options
                .with_no_limit()
                .with_little_endian()
                .with_varint_encoding()
                .serialize(record),
            CodecStyle::BigVar => self
                .options
                .with_no_limit()
                .with_big_endian()
                .with_varint_encoding()
                .serialize(record),
        };
        result.map_err(|e| ReError::DecodeCorrupt(format!("record encode failed: {}", e)))
    }

    pub fn decode(&self, style: &CodecStyle, bytes: &[u8]) -> CResult<ChangeRecord> {
        let result = match style {
            CodecStyle::LittleVar => self
                .options
                .with_no_limit()
                .with_little_endian()
                .with_varint_encoding()
                .deserialize(bytes),
            CodecStyle::BigVar => self
                .options
                .with_no_limit()
                .with_big_endian()
                .with_varint_encoding()
                .deserialize(bytes),
        };
        result.map_err(|e| ReError::DecodeCorrupt(format!("record decode failed: {}", e)))
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new()
    }
}
