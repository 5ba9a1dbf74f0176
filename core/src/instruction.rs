use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// A scalar bound as a positional `?` parameter.
#[derive(Debug, Clone)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

// Floats compare by bit pattern so WHERE tuples can key a map.
impl PartialEq for SqlValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SqlValue::Null, SqlValue::Null) => true,
            (SqlValue::Int(a), SqlValue::Int(b)) => a == b,
            (SqlValue::UInt(a), SqlValue::UInt(b)) => a == b,
            (SqlValue::Float(a), SqlValue::Float(b)) => a.to_bits() == b.to_bits(),
            (SqlValue::Text(a), SqlValue::Text(b)) => a == b,
            (SqlValue::Bytes(a), SqlValue::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SqlValue {}

impl Hash for SqlValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            SqlValue::Null => {}
            SqlValue::Int(v) => v.hash(state),
            SqlValue::UInt(v) => v.hash(state),
            SqlValue::Float(v) => v.to_bits().hash(state),
            SqlValue::Text(v) => v.hash(state),
            SqlValue::Bytes(v) => v.hash(state),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::UInt(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "'{}'", v),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

macro_rules! impl_from_scalar {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for SqlValue {
                fn from(value: $source) -> Self {
                    SqlValue::$variant(value as $target)
                }
            }
        )+
    };
}

impl_from_scalar!(Int, i64, i8, i16, i32, i64);
impl_from_scalar!(UInt, u64, u8, u16, u32, u64);
impl_from_scalar!(Float, f64, f32, f64);

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// A column paired with the value it is set to or compared against.
///
/// Column names are trusted identifiers. They are backtick-quoted when rendered
/// but never validated; only values travel as parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyValue {
    pub column: String,
    pub value: SqlValue,
}

impl KeyValue {
    pub fn new(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        KeyValue { column: column.into(), value: value.into() }
    }
}

/// Apply the `set` assignments to every row matching all `where_` equalities.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInstruction {
    pub set: Vec<KeyValue>,
    pub where_: Vec<KeyValue>,
}

impl UpdateInstruction {
    pub fn new(set: Vec<KeyValue>, where_: Vec<KeyValue>) -> Self {
        UpdateInstruction { set, where_ }
    }

    pub fn set_columns(&self) -> impl Iterator<Item = &str> {
        self.set.iter().map(|kv| kv.column.as_str())
    }

    pub fn where_columns(&self) -> impl Iterator<Item = &str> {
        self.where_.iter().map(|kv| kv.column.as_str())
    }

    pub fn set_value(&self, column: &str) -> Option<&SqlValue> {
        self.set.iter().find(|kv| kv.column == column).map(|kv| &kv.value)
    }

    pub fn where_value(&self, column: &str) -> Option<&SqlValue> {
        self.where_.iter().find(|kv| kv.column == column).map(|kv| &kv.value)
    }
}
