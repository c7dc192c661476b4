use chrono::NaiveDateTime;

use cdc_common::err::{CResult, ReError};

use crate::event::{RawValue, SourceTypeTag};

/// Decodes the `DateTime` kind to Unix nanoseconds. `timestamp`/`datetime`
/// tags parse `YYYY-MM-DD HH:MM:SS`; `date` parses `YYYY-MM-DD`. A parse
/// failure is fatal for the event.
pub fn decode_datetime(raw: &RawValue, type_tag: SourceTypeTag) -> CResult<i64> {
    let text = raw.as_str().ok_or_else(|| {
        ReError::TypeMismatch(format!(
            "DateTime kind expects a string raw value, got {:?}",
            raw
        ))
    })?;
    let naive = match type_tag {
        SourceTypeTag::Timestamp | SourceTypeTag::DateTime => {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map_err(|e| {
                ReError::TypeMismatch(format!("failed to parse datetime '{}': {}", text, e))
            })?
        }
        SourceTypeTag::Date => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|e| ReError::TypeMismatch(format!("failed to parse date '{}': {}", text, e)))?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ReError::Bug("midnight is always a valid time".into()))?,
        other => {
            return Err(ReError::TypeMismatch(format!(
                "DateTime kind does not accept source tag {:?}",
                other
            )))
        }
    };
    Ok(naive.and_utc().timestamp_nanos_opt().ok_or_else(|| {
        ReError::TypeMismatch(format!("datetime '{}' out of representable range", text))
    })?)
}
