use bigdecimal::BigDecimal;

use cdc_common::model::ColumnBinding;
use cdc_common::record::RowValues;
use cdc_common::value::Value;

/// The logical type of one bound parameter, handed to the target driver at
/// `execute` time. The driver owns wire encoding; this only fixes the
/// logical type of each parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParam {
    Int(i64),
    Str(String),
    Bool(bool),
    /// Unix nanoseconds.
    DateTime(i64),
    Float32(f32),
    Float64(f64),
    Decimal(BigDecimal),
    Blob(Vec<u8>),
    /// No native SET type on the target side; bound as its comma-joined
    /// text representation.
    Set(String),
    Json(serde_json::Value),
    Null,
}

/// Numeric adaptation at apply time: a `UInt` whose concrete value
/// exceeds the signed-64 maximum widens to Decimal; otherwise it binds as
/// signed 64-bit. This is a per-value decision, not reflected in the
/// statement text.
pub fn bind_value(value: &Value) -> BoundParam {
    match value {
        Value::Int(v) => BoundParam::Int(*v),
        Value::UInt(v) => {
            if *v > i64::MAX as u64 {
                BoundParam::Decimal(BigDecimal::from(*v))
            } else {
                BoundParam::Int(*v as i64)
            }
        }
        Value::Str(s) => BoundParam::Str(s.clone()),
        Value::Bool(b) => BoundParam::Bool(*b),
        Value::DateTime(ns) => BoundParam::DateTime(*ns),
        Value::Float32(f) => BoundParam::Float32(*f),
        Value::Float64(f) => BoundParam::Float64(*f),
        Value::Decimal(d) => BoundParam::Decimal(d.clone()),
        Value::Blob(b) => BoundParam::Blob(b.clone()),
        Value::Set(items) => BoundParam::Set(items.join(",")),
        Value::Json(v) => BoundParam::Json(v.clone()),
        Value::Absent => BoundParam::Null,
    }
}

/// Binds every `columns`-listed value from `values` in column-declaration
/// order, the order the Statement Builder placed the placeholders in. A
/// column absent from `values` binds `Null` — the decoder always populates
/// every declared column, so this only happens for a hand-built record in
/// a test.
pub fn bind_row(values: &RowValues, columns: &[ColumnBinding]) -> Vec<BoundParam> {
    columns
        .iter()
        .map(|c| values.get(&c.name).map(bind_value).unwrap_or(BoundParam::Null))
        .collect()
}

/// Binds only the primary-key columns from `values`, in declaration order —
/// the WHERE-clause parameters for a PK-based Update/Delete.
pub fn bind_pk(values: &RowValues, columns: &[ColumnBinding]) -> Vec<BoundParam> {
    columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| values.get(&c.name).map(bind_value).unwrap_or(BoundParam::Null))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_at_signed_max_plus_one_widens_to_decimal() {
        let bound = bind_value(&Value::UInt(2u64.pow(63)));
        assert!(matches!(bound, BoundParam::Decimal(_)));
    }

    #[test]
    fn uint_at_signed_max_binds_as_int() {
        let bound = bind_value(&Value::UInt(2u64.pow(63) - 1));
        assert_eq!(bound, BoundParam::Int(i64::MAX));
    }

    #[test]
    fn absent_binds_as_null() {
        assert_eq!(bind_value(&Value::Absent), BoundParam::Null);
    }

    fn columns() -> Vec<ColumnBinding> {
        vec![
            ColumnBinding {
                name: "id".into(),
                nullable: false,
                is_primary_key: true,
                kind: cdc_common::value::Kind::Int,
                json: false,
                binary_column: false,
            },
            ColumnBinding {
                name: "name".into(),
                nullable: false,
                is_primary_key: false,
                kind: cdc_common::value::Kind::Str,
                json: false,
                binary_column: false,
            },
        ]
    }

    #[test]
    fn bind_row_follows_column_declaration_order() {
        let mut values = RowValues::new();
        values.insert("name".into(), Value::Str("新".into()));
        values.insert("id".into(), Value::Int(1));
        let bound = bind_row(&values, &columns());
        assert_eq!(bound, vec![BoundParam::Int(1), BoundParam::Str("新".into())]);
    }

    #[test]
    fn bind_pk_keeps_only_primary_key_columns() {
        let mut values = RowValues::new();
        values.insert("name".into(), Value::Str("新".into()));
        values.insert("id".into(), Value::Int(1));
        let bound = bind_pk(&values, &columns());
        assert_eq!(bound, vec![BoundParam::Int(1)]);
    }
}
