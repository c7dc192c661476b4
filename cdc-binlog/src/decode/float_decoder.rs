use cdc_common::err::{CResult, ReError};

use crate::event::{RawValue, SourceTypeTag};

/// Decodes the `Float32` kind: `float` source tag only, direct passthrough.
pub fn decode_float32(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<f32> {
    if type_tag != SourceTypeTag::Float {
        return Err(ReError::TypeMismatch(format!(
            "Float32 kind does not accept source tag {:?}",
            type_tag
        )));
    }
    match raw {
        RawValue::Float32(v) => Ok(*v),
        RawValue::Float64(v) => Ok(*v as f32),
        other => Err(ReError::TypeMismatch(format!(
            "Float32 kind expects a float raw value, got {:?}",
            other
        ))),
    }
}

/// Decodes the `Float64` kind: `float` or `decimal` (when arbitrary
/// precision is disabled) source tags, direct passthrough.
pub fn decode_float64(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<f64> {
    match type_tag {
        SourceTypeTag::Float | SourceTypeTag::Decimal => match raw {
            RawValue::Float64(v) => Ok(*v),
            RawValue::Float32(v) => Ok(*v as f64),
            RawValue::String(s) => s
                .parse::<f64>()
                .map_err(|e| ReError::TypeMismatch(format!("failed to parse float '{}': {}", s, e))),
            other => Err(ReError::TypeMismatch(format!(
                "Float64 kind expects a float raw value, got {:?}",
                other
            ))),
        },
        other => Err(ReError::TypeMismatch(format!(
            "Float64 kind does not accept source tag {:?}",
            other
        ))),
    }
}
