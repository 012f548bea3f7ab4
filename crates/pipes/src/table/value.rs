use arcstr::ArcStr;
use pipes_types::Literal;
use serde::Serialize;
use std::fmt::{Display, Error as FmtError, Formatter};

/// Declared type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Float64,
    Int64,
    String,
    /// Milliseconds since the Unix epoch.
    DateTime,
    Bool,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Float64 | Self::Int64)
    }

    /// Common type of two non-null columns, if any.
    ///
    /// Identical types unify with themselves; `Int64` and `Float64` unify to
    /// `Float64`.
    pub fn unify(self, other: Self) -> Option<Self> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Self::Int64, Self::Float64) | (Self::Float64, Self::Int64) => Some(Self::Float64),
            _ => None,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(match self {
            Self::Float64 => "float64",
            Self::Int64 => "int64",
            Self::String => "string",
            Self::DateTime => "datetime",
            Self::Bool => "bool",
        })
    }
}

/// A single, possibly null, cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Null,
    Float64(f64),
    Int64(i64),
    String(ArcStr),
    DateTime(i64),
    Bool(bool),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type of the value; `None` for null, which belongs to every type.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Float64(_) => Some(DataType::Float64),
            Self::Int64(_) => Some(DataType::Int64),
            Self::String(_) => Some(DataType::String),
            Self::DateTime(_) => Some(DataType::DateTime),
            Self::Bool(_) => Some(DataType::Bool),
        }
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::Null => f.write_str("null"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::DateTime(v) => write!(f, "datetime({v})"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&Literal> for ScalarValue {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Null => Self::Null,
            Literal::Bool(b) => Self::Bool(*b),
            Literal::Int64(i) => Self::Int64(*i),
            Literal::Float64(f) => Self::Float64(*f),
            Literal::String(s) => Self::String(ArcStr::from(s.as_str())),
        }
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::String(ArcStr::from(value))
    }
}

impl<T> From<Option<T>> for ScalarValue
where
    T: Into<ScalarValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
