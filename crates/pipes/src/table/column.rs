use crate::table::{DataType, KeyValue, ScalarValue};
use arcstr::ArcStr;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// Shared, immutable column payload.
pub type ArrayRef = Arc<ColumnData>;

/// Typed values of a column.  Every value is nullable.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Float64(Vec<Option<f64>>),
    Int64(Vec<Option<i64>>),
    String(Vec<Option<ArcStr>>),
    DateTime(Vec<Option<i64>>),
    Bool(Vec<Option<bool>>),
}

/// Applies `$body` to the values vector of `$data`, whatever its type, and
/// wraps the result back into the same variant.
macro_rules! map_values {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            ColumnData::Float64($values) => ColumnData::Float64($body),
            ColumnData::Int64($values) => ColumnData::Int64($body),
            ColumnData::String($values) => ColumnData::String($body),
            ColumnData::DateTime($values) => ColumnData::DateTime($body),
            ColumnData::Bool($values) => ColumnData::Bool($body),
        }
    };
}

/// Evaluates `$body` on the values vector of `$data`, whatever its type.
macro_rules! with_values {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            ColumnData::Float64($values) => $body,
            ColumnData::Int64($values) => $body,
            ColumnData::String($values) => $body,
            ColumnData::DateTime($values) => $body,
            ColumnData::Bool($values) => $body,
        }
    };
}

impl ColumnData {
    /// A column of `len` nulls.
    pub fn nulls(data_type: DataType, len: usize) -> Self {
        match data_type {
            DataType::Float64 => Self::Float64(vec![None; len]),
            DataType::Int64 => Self::Int64(vec![None; len]),
            DataType::String => Self::String(vec![None; len]),
            DataType::DateTime => Self::DateTime(vec![None; len]),
            DataType::Bool => Self::Bool(vec![None; len]),
        }
    }

    /// `value` repeated `len` times.  A null scalar carries no type and
    /// yields an all-null `Float64` column, which unifies with any type.
    pub fn broadcast(value: &ScalarValue, len: usize) -> Self {
        match value {
            ScalarValue::Null => Self::nulls(DataType::Float64, len),
            ScalarValue::Float64(v) => Self::Float64(vec![Some(*v); len]),
            ScalarValue::Int64(v) => Self::Int64(vec![Some(*v); len]),
            ScalarValue::String(v) => Self::String(vec![Some(v.clone()); len]),
            ScalarValue::DateTime(v) => Self::DateTime(vec![Some(*v); len]),
            ScalarValue::Bool(v) => Self::Bool(vec![Some(*v); len]),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Float64(_) => DataType::Float64,
            Self::Int64(_) => DataType::Int64,
            Self::String(_) => DataType::String,
            Self::DateTime(_) => DataType::DateTime,
            Self::Bool(_) => DataType::Bool,
        }
    }

    pub fn len(&self) -> usize {
        with_values!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        with_values!(self, values => values[row].is_none())
    }

    pub fn null_count(&self) -> usize {
        with_values!(self, values => values.iter().filter(|v| v.is_none()).count())
    }

    /// True if the column holds no non-null value (including when empty).
    pub fn is_all_null(&self) -> bool {
        with_values!(self, values => values.iter().all(Option::is_none))
    }

    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn value(&self, row: usize) -> ScalarValue {
        match self {
            Self::Float64(values) => values[row].into(),
            Self::Int64(values) => values[row].into(),
            Self::String(values) => values[row]
                .clone()
                .map_or(ScalarValue::Null, ScalarValue::String),
            Self::DateTime(values) => values[row].map_or(ScalarValue::Null, ScalarValue::DateTime),
            Self::Bool(values) => values[row].into(),
        }
    }

    /// Hashable view of a value, used for join keys and partitioning.
    pub fn key(&self, row: usize) -> KeyValue<'_> {
        match self {
            Self::Float64(values) => values[row].map_or(KeyValue::Null, |v| KeyValue::Float64(OrderedFloat(v))),
            Self::Int64(values) => values[row].map_or(KeyValue::Null, KeyValue::Int64),
            Self::String(values) => values[row].as_deref().map_or(KeyValue::Null, KeyValue::String),
            Self::DateTime(values) => values[row].map_or(KeyValue::Null, KeyValue::DateTime),
            Self::Bool(values) => values[row].map_or(KeyValue::Null, KeyValue::Bool),
        }
    }

    /// Gathers the rows at `indices`, in order.
    pub fn take(&self, indices: &[usize]) -> Self {
        map_values!(self, values => indices.iter().map(|&i| values[i].clone()).collect())
    }

    /// Gathers rows like [`Self::take`]; `None` produces a null.
    pub fn take_opt(&self, indices: &[Option<usize>]) -> Self {
        map_values!(self, values => indices
            .iter()
            .map(|i| i.and_then(|i| values[i].clone()))
            .collect())
    }

    /// Keeps the rows whose `mask` entry is true.
    pub fn filter(&self, mask: &[bool]) -> Self {
        map_values!(self, values => values
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(v, _)| v.clone())
            .collect())
    }

    /// Row-wise `self` where non-null, else `other`.  Both columns must
    /// have the same type and length.
    pub fn coalesce(&self, other: &Self) -> Option<Self> {
        macro_rules! zip_or {
            ($a:expr, $b:expr) => {
                $a.iter().zip($b).map(|(a, b)| a.clone().or_else(|| b.clone())).collect()
            };
        }
        Some(match (self, other) {
            (Self::Float64(a), Self::Float64(b)) => Self::Float64(zip_or!(a, b)),
            (Self::Int64(a), Self::Int64(b)) => Self::Int64(zip_or!(a, b)),
            (Self::String(a), Self::String(b)) => Self::String(zip_or!(a, b)),
            (Self::DateTime(a), Self::DateTime(b)) => Self::DateTime(zip_or!(a, b)),
            (Self::Bool(a), Self::Bool(b)) => Self::Bool(zip_or!(a, b)),
            _ => return None,
        })
    }

    /// Values of `self` followed by values of `other`, if the types agree.
    pub fn concat(&self, other: &Self) -> Option<Self> {
        macro_rules! chain {
            ($a:expr, $b:expr) => {
                $a.iter().chain($b).cloned().collect()
            };
        }
        Some(match (self, other) {
            (Self::Float64(a), Self::Float64(b)) => Self::Float64(chain!(a, b)),
            (Self::Int64(a), Self::Int64(b)) => Self::Int64(chain!(a, b)),
            (Self::String(a), Self::String(b)) => Self::String(chain!(a, b)),
            (Self::DateTime(a), Self::DateTime(b)) => Self::DateTime(chain!(a, b)),
            (Self::Bool(a), Self::Bool(b)) => Self::Bool(chain!(a, b)),
            _ => return None,
        })
    }

    /// Converts the column to `data_type` if that loses nothing: the type is
    /// unchanged, `Int64` widens to `Float64`, or the column is all null.
    pub fn retype(&self, data_type: DataType) -> Option<Self> {
        if self.data_type() == data_type {
            return Some(self.clone());
        }
        if self.is_all_null() {
            return Some(Self::nulls(data_type, self.len()));
        }
        match (self, data_type) {
            (Self::Int64(values), DataType::Float64) => Some(Self::Float64(
                values.iter().map(|v| v.map(|v| v as f64)).collect(),
            )),
            _ => None,
        }
    }
}

impl From<Vec<Option<f64>>> for ColumnData {
    fn from(values: Vec<Option<f64>>) -> Self {
        Self::Float64(values)
    }
}

impl From<Vec<Option<i64>>> for ColumnData {
    fn from(values: Vec<Option<i64>>) -> Self {
        Self::Int64(values)
    }
}

impl From<Vec<Option<bool>>> for ColumnData {
    fn from(values: Vec<Option<bool>>) -> Self {
        Self::Bool(values)
    }
}

impl From<Vec<Option<&str>>> for ColumnData {
    fn from(values: Vec<Option<&str>>) -> Self {
        Self::String(values.into_iter().map(|v| v.map(ArcStr::from)).collect())
    }
}

impl From<Vec<Option<String>>> for ColumnData {
    fn from(values: Vec<Option<String>>) -> Self {
        Self::String(
            values
                .into_iter()
                .map(|v| v.map(|s| ArcStr::from(s.as_str())))
                .collect(),
        )
    }
}

/// A named column.  Cloning and renaming share the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    data: ArrayRef,
}

impl Column {
    pub fn new(name: impl Into<String>, data: impl Into<ColumnData>) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(data.into()),
        }
    }

    pub fn from_array(name: impl Into<String>, data: ArrayRef) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn array(&self) -> &ArrayRef {
        &self.data
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn value(&self, row: usize) -> ScalarValue {
        self.data.value(row)
    }

    /// The same values under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: self.data.clone(),
        }
    }
}
