use cdc_common::err::{CResult, ReError};

use crate::event::{RawValue, SourceTypeTag};

/// Decodes the `Blob` kind: `string` or `binary` source tags, returned as
/// the raw byte sequence.
pub fn decode_blob(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<Vec<u8>> {
    match type_tag {
        SourceTypeTag::String | SourceTypeTag::Binary => raw.as_bytes().map(|b| b.to_vec()).ok_or_else(|| {
            ReError::TypeMismatch(format!(
                "Blob kind expects a string or byte-sequence raw value, got {:?}",
                raw
            ))
        }),
        other => Err(ReError::TypeMismatch(format!(
            "Blob kind does not accept source tag {:?}",
            other
        ))),
    }
}
