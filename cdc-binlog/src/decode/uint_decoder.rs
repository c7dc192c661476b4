use cdc_common::err::{CResult, ReError};

use crate::event::{RawValue, SourceTypeTag};

/// Decodes the `UInt` kind. Requires an unsigned 64-bit source value;
/// unlike `Int`, `UInt` does not attempt to widen a signed value.
pub fn decode_uint(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<u64> {
    if type_tag != SourceTypeTag::Number {
        return Err(ReError::TypeMismatch(format!(
            "UInt kind does not accept source tag {:?}",
            type_tag
        )));
    }
    raw.as_u64_strict().ok_or_else(|| {
        ReError::TypeMismatch(format!(
            "UInt kind requires an unsigned integer raw value, got {:?}",
            raw
        ))
    })
}
