use cdc_common::err::{CResult, ReError};

use crate::event::{RawValue, SourceColumn, SourceTypeTag};

/// Decodes the `String` kind. Accepts char/varchar/text, time-as-string,
/// binary-holding-text, enum, and JSON source tags. For `Enum` the
/// raw value is a 1-based ordinal resolved against the column's declared
/// `EnumValues`; everything else is returned as a string, falling back to
/// UTF-8 decoding of a byte sequence.
pub fn decode_string(raw: &RawValue, column: &SourceColumn) -> CResult<String> {
    match column.type_tag {
        SourceTypeTag::Enum => decode_enum(raw, column),
        SourceTypeTag::String
        | SourceTypeTag::Time
        | SourceTypeTag::Binary
        | SourceTypeTag::Json => decode_plain_string(raw),
        other => Err(ReError::TypeMismatch(format!(
            "String kind does not accept source tag {:?}",
            other
        ))),
    }
}

fn decode_plain_string(raw: &RawValue) -> CResult<String> {
    if let Some(s) = raw.as_str() {
        return Ok(s.to_owned());
    }
    if let RawValue::Bytes(bytes) = raw {
        return String::from_utf8(bytes.clone())
            .map_err(|e| ReError::TypeMismatch(format!("invalid UTF-8 in string column: {}", e)));
    }
    Err(ReError::TypeMismatch(format!(
        "String kind expects a string or byte-sequence raw value, got {:?}",
        raw
    )))
}

/// ENUM ordinal `n` (1-based) resolves to `EnumValues[n-1]`; ordinal 0 is
/// illegal.
fn decode_enum(raw: &RawValue, column: &SourceColumn) -> CResult<String> {
    let ordinal = raw.as_i64().ok_or_else(|| {
        ReError::TypeMismatch(format!("ENUM raw value must be an integer ordinal, got {:?}", raw))
    })?;
    if ordinal == 0 {
        return Err(ReError::TypeMismatch(
            "ENUM ordinal 0 is illegal (ordinals are 1-based)".into(),
        ));
    }
    let values = column.enum_values.as_ref().ok_or_else(|| {
        ReError::SchemaMismatch(format!("column {} has no declared EnumValues", column.name))
    })?;
    let index = (ordinal - 1) as usize;
    values.get(index).cloned().ok_or_else(|| {
        ReError::TypeMismatch(format!(
            "ENUM ordinal {} out of range for {} declared values",
            ordinal,
            values.len()
        ))
    })
}
