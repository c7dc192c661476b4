use cdc_common::record::Action;

/// The source protocol's type tag for one column, as the replication
/// driver (out of scope here) reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTypeTag {
    Number,
    MediumInt,
    Bit,
    Float,
    Decimal,
    String,
    Binary,
    Time,
    Timestamp,
    DateTime,
    Date,
    Enum,
    Set,
    Json,
}

/// Metadata for one column of the event's table, as exposed by the source
/// driver.
#[derive(Debug, Clone)]
pub struct SourceColumn {
    pub name: String,
    pub type_tag: SourceTypeTag,
    pub enum_values: Option<Vec<String>>,
    pub set_values: Option<Vec<String>>,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, type_tag: SourceTypeTag) -> Self {
        SourceColumn {
            name: name.into(),
            type_tag,
            enum_values: None,
            set_values: None,
        }
    }

    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_set_values(mut self, values: Vec<String>) -> Self {
        self.set_values = Some(values);
        self
    }
}

/// The raw runtime value handed over for one (row, column) cell. The
/// driver has already parsed the wire bytes; widths/signedness mirror
/// what the source protocol's client library would hand back, which is
/// why there are several integer widths instead of one.
#[derive(Debug, Clone)]
pub enum RawValue {
    Null,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Float32(f32),
    Float64(f64),
    /// Used for CHAR/VARCHAR/TEXT/TIME-as-string/ENUM-ordinal(as string repr
    /// is never used for enum -- enum ordinals arrive as an integer, see
    /// below)/JSON-as-string/DECIMAL-as-string (arbitrary precision) values.
    String(String),
    Bytes(Vec<u8>),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Widens any integer-width raw value to i64. Returns `None` for
    /// non-integer variants.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::I8(v) => Some(*v as i64),
            RawValue::I16(v) => Some(*v as i64),
            RawValue::I32(v) => Some(*v as i64),
            RawValue::I64(v) => Some(*v),
            RawValue::U8(v) => Some(*v as i64),
            RawValue::U16(v) => Some(*v as i64),
            RawValue::U32(v) => Some(*v as i64),
            RawValue::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// The concrete unsigned 64-bit value, if this raw value is an
    /// unsigned integer width (used by the `UInt` kind, which requires
    /// unsigned 64-bit and does not widen signed values).
    pub fn as_u64_strict(&self) -> Option<u64> {
        match self {
            RawValue::U8(v) => Some(*v as u64),
            RawValue::U16(v) => Some(*v as u64),
            RawValue::U32(v) => Some(*v as u64),
            RawValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawValue::Bytes(b) => Some(b.as_slice()),
            RawValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

/// One row-change event, as delivered by the source replication driver.
#[derive(Debug, Clone)]
pub struct SourceEvent {
    pub schema: String,
    pub table: String,
    pub action: Action,
    pub columns: Vec<SourceColumn>,
    /// Outer list of rows; for Insert/Delete each entry is one affected
    /// record. For Update, rows come in adjacent pairs: index `2k` is the
    /// pre-image, `2k + 1` is the post-image.
    pub rows: Vec<Vec<RawValue>>,
}

impl SourceEvent {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
