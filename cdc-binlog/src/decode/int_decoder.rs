use cdc_common::err::{CResult, ReError};

use crate::event::{RawValue, SourceTypeTag};

/// Decodes the `Int` kind: any integer width, signed or unsigned up to
/// 64 bits, widened to signed 64-bit. Accepts `number`, `medium_int`, and
/// `bit` source tags.
pub fn decode_int(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<i64> {
    match type_tag {
        SourceTypeTag::Number | SourceTypeTag::MediumInt | SourceTypeTag::Bit => {
            raw.as_i64().ok_or_else(|| {
                ReError::TypeMismatch(format!(
                    "Int kind expects an integer-width raw value, got {:?}",
                    raw
                ))
            })
        }
        other => Err(ReError::TypeMismatch(format!(
            "Int kind does not accept source tag {:?}",
            other
        ))),
    }
}

/// Decodes the `Bool` kind: the raw value read as Int, true iff it equals 1.
pub fn decode_bool(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<bool> {
    Ok(decode_int(raw, type_tag)? == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widens_every_signed_and_unsigned_width() {
        assert_eq!(decode_int(&RawValue::I8(-5), SourceTypeTag::Number).unwrap(), -5);
        assert_eq!(decode_int(&RawValue::U32(70000), SourceTypeTag::Number).unwrap(), 70000);
        assert_eq!(decode_int(&RawValue::I64(i64::MAX), SourceTypeTag::Number).unwrap(), i64::MAX);
    }

    #[test]
    fn rejects_non_integer_tag() {
        assert!(decode_int(&RawValue::I8(1), SourceTypeTag::String).is_err());
    }

    #[test]
    fn bool_true_only_for_exactly_one() {
        assert!(decode_bool(&RawValue::I8(1), SourceTypeTag::Number).unwrap());
        assert!(!decode_bool(&RawValue::I8(0), SourceTypeTag::Number).unwrap());
        assert!(!decode_bool(&RawValue::I8(2), SourceTypeTag::Number).unwrap());
    }
}
