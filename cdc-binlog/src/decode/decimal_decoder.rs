use bigdecimal::BigDecimal;
use std::str::FromStr;

use cdc_common::err::{CResult, ReError};

use crate::event::{RawValue, SourceTypeTag};

/// Decodes the `Decimal` kind (full precision preserved), `decimal` source
/// tag only, when arbitrary precision is enabled for the model.
pub fn decode_decimal(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<BigDecimal> {
    if type_tag != SourceTypeTag::Decimal {
        return Err(ReError::TypeMismatch(format!(
            "Decimal kind does not accept source tag {:?}",
            type_tag
        )));
    }
    match raw {
        RawValue::String(s) => BigDecimal::from_str(s)
            .map_err(|e| ReError::TypeMismatch(format!("failed to parse decimal '{}': {}", s, e))),
        RawValue::Float64(v) => BigDecimal::from_str(&v.to_string())
            .map_err(|e| ReError::TypeMismatch(format!("failed to parse decimal: {}", e))),
        other => Err(ReError::TypeMismatch(format!(
            "Decimal kind expects a string or float raw value, got {:?}",
            other
        ))),
    }
}
