pub mod blob_decoder;
pub mod datetime_decoder;
pub mod decimal_decoder;
pub mod float_decoder;
pub mod int_decoder;
pub mod set_decoder;
pub mod string_decoder;
pub mod uint_decoder;

use cdc_common::err::{CResult, ReError};
use cdc_common::model::Model;
use cdc_common::record::RowValues;
use cdc_common::value::{Kind, Value};

use crate::event::{RawValue, SourceEvent};

/// Decodes one row of `event` against `model`'s bindings, producing a
/// column-name-keyed map of values. Column resolution, nullability,
/// and per-kind dispatch all happen here; the caller (the Event Dispatcher)
/// is responsible for the action-specific row-pairing rule and for the
/// "unknown table" skip.
pub fn decode_row(event: &SourceEvent, row_index: usize, model: &Model) -> CResult<RowValues> {
    let row = event.rows.get(row_index).ok_or_else(|| {
        ReError::Bug(format!(
            "row index {} out of range for event with {} rows",
            row_index,
            event.rows.len()
        ))
    })?;

    let mut values = RowValues::new();
    for binding in model.bindings() {
        let column_index = event.column_index(&binding.name).ok_or_else(|| {
            ReError::SchemaMismatch(format!(
                "column {} declared on model {} is absent from the source event",
                binding.name, model.table
            ))
        })?;
        let raw = &row[column_index];
        let column = &event.columns[column_index];

        let value = if raw.is_null() {
            if binding.nullable {
                Value::Absent
            } else {
                binding.kind.default_value()
            }
        } else if binding.json {
            decode_json_field(raw, binding.kind)
        } else {
            decode_typed(raw, column.type_tag, column, binding.kind)?
        };
        values.insert(binding.name.clone(), value);
    }
    Ok(values)
}

fn decode_typed(
    raw: &RawValue,
    type_tag: crate::event::SourceTypeTag,
    column: &crate::event::SourceColumn,
    kind: Kind,
) -> CResult<Value> {
    Ok(match kind {
        Kind::Int => Value::Int(int_decoder::decode_int(raw, type_tag)?),
        Kind::UInt => Value::UInt(uint_decoder::decode_uint(raw, type_tag)?),
        Kind::Str => Value::Str(string_decoder::decode_string(raw, column)?),
        Kind::Bool => Value::Bool(int_decoder::decode_bool(raw, type_tag)?),
        Kind::DateTime => Value::DateTime(datetime_decoder::decode_datetime(raw, type_tag)?),
        Kind::Float32 => Value::Float32(float_decoder::decode_float32(raw, type_tag)?),
        Kind::Float64 => Value::Float64(float_decoder::decode_float64(raw, type_tag)?),
        Kind::Decimal => Value::Decimal(decimal_decoder::decode_decimal(raw, type_tag)?),
        Kind::Blob => Value::Blob(blob_decoder::decode_blob(raw, type_tag)?),
        Kind::Set => {
            let set_values = column.set_values.as_deref().ok_or_else(|| {
                ReError::SchemaMismatch(format!("column {} has no declared SetValues", column.name))
            })?;
            Value::Set(set_decoder::decode_set(raw, set_values)?)
        }
    })
}

/// A JSON-annotated field's wire value is read as string and parsed; a
/// parse failure is non-fatal for the rest of the row and leaves this
/// field at its kind default.
fn decode_json_field(raw: &RawValue, kind: Kind) -> Value {
    let text = match raw.as_str().map(str::to_owned).or_else(|| {
        raw.as_bytes()
            .and_then(|b| std::str::from_utf8(b).ok())
            .map(str::to_owned)
    }) {
        Some(t) => t,
        None => return kind.default_value(),
    };
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(parsed) => Value::Json(parsed),
        Err(e) => {
            tracing::warn!("JSON field failed to parse, leaving at default: {}", e);
            kind.default_value()
        }
    }
}
