use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// The closed set of logical column kinds the decoder understands.
///
/// Each kind has a "default-valued" reading (used for a non-nullable field,
/// where a source NULL becomes the kind's zero/empty value) and a
/// "nullable" reading (where a source NULL becomes [`Value::Absent`]).
/// Nullability is carried on the [`crate::model::FieldBinding`], not on
/// `Kind` itself, since Rust's `Option<T>` already expresses the
/// nullable/non-nullable distinction without doubling the variant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    Int,
    UInt,
    Str,
    Bool,
    DateTime,
    Float32,
    Float64,
    Decimal,
    Blob,
    Set,
}

impl Kind {
    /// The zero/empty value a non-nullable field takes when the source
    /// value is NULL.
    pub fn default_value(self) -> Value {
        match self {
            Kind::Int => Value::Int(0),
            Kind::UInt => Value::UInt(0),
            Kind::Str => Value::Str(String::new()),
            Kind::Bool => Value::Bool(false),
            Kind::DateTime => Value::DateTime(0),
            Kind::Float32 => Value::Float32(0.0),
            Kind::Float64 => Value::Float64(0.0),
            Kind::Decimal => Value::Decimal(BigDecimal::from(0)),
            Kind::Blob => Value::Blob(Vec::new()),
            Kind::Set => Value::Set(Vec::new()),
        }
    }
}

/// A decoded column value.
///
/// `DateTime` is stored as Unix nanoseconds (per the round-trip law's
/// "Unix-ns equal" equality rule). `Absent` is the sentinel a nullable kind
/// maps a source NULL to; it never appears for a non-nullable field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Str(String),
    Bool(bool),
    DateTime(i64),
    Float32(f32),
    Float64(f64),
    Decimal(BigDecimal),
    Blob(Vec<u8>),
    Set(Vec<String>),
    /// A JSON-annotated field's parsed shape.
    Json(serde_json::Value),
    /// The "not present" reading of a nullable kind's source NULL.
    Absent,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Float32(a), Float32(b)) => a == b,
            (Float64(a), Float64(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (Blob(a), Blob(b)) => a == b,
            (Set(a), Set(b)) => a == b,
            (Json(a), Json(b)) => a == b,
            (Absent, Absent) => true,
            _ => false,
        }
    }
}

impl Value {
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Value::Int(_) => Some(Kind::Int),
            Value::UInt(_) => Some(Kind::UInt),
            Value::Str(_) => Some(Kind::Str),
            Value::Bool(_) => Some(Kind::Bool),
            Value::DateTime(_) => Some(Kind::DateTime),
            Value::Float32(_) => Some(Kind::Float32),
            Value::Float64(_) => Some(Kind::Float64),
            Value::Decimal(_) => Some(Kind::Decimal),
            Value::Blob(_) => Some(Kind::Blob),
            Value::Set(_) => Some(Kind::Set),
            Value::Json(_) | Value::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}
